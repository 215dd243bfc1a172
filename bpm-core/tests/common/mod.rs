#![allow(dead_code)]

use bpm_core::binreader::Guid;
use flate2::{write::ZlibEncoder, Compression};
use std::io::Write;

pub const MANIFEST_MAGIC: u32 = 0x44BE_C00C;
pub const CHUNK_MAGIC: u32 = 0xB1FE_3AA2;
/// magic + three sizes + sha + storage byte + version
pub const MANIFEST_HEADER_SIZE: i32 = 4 + 4 + 4 + 4 + 20 + 1 + 4;
/// magic, version, header size, data size, guid, hash, storage byte, sha, hash type
pub const CHUNK_HEADER_SIZE: u32 = 4 + 4 + 4 + 4 + 16 + 8 + 1 + 20 + 4;

/// Little-endian byte builder for fixtures.
#[derive(Default)]
pub struct Wire {
    pub buf: Vec<u8>,
}

impl Wire {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }
    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn bytes(&mut self, b: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(b);
        self
    }
    pub fn fstring(&mut self, s: &str) -> &mut Self {
        if s.is_empty() {
            return self.u32(0);
        }
        self.u32(s.len() as u32 + 1).bytes(s.as_bytes()).u8(0)
    }
    pub fn fstrings(&mut self, items: &[&str]) -> &mut Self {
        self.u32(items.len() as u32);
        for s in items {
            self.fstring(s);
        }
        self
    }
    /// GUID as four big-endian words, the way the format stores it.
    pub fn guid(&mut self, words: [u32; 4]) -> &mut Self {
        for w in words {
            self.buf.extend_from_slice(&w.to_be_bytes());
        }
        self
    }
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// The GUID the decoder must produce for `words`.
pub fn guid(words: [u32; 4]) -> Guid {
    let mut out = [0u8; 16];
    for (i, w) in words.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&w.to_le_bytes());
    }
    Guid::from_bytes(out)
}

pub fn sha(seed: u8) -> [u8; 20] {
    let mut s = [0u8; 20];
    for (i, b) in s.iter_mut().enumerate() {
        *b = seed.wrapping_add(i as u8);
    }
    s
}

/// Wrap a section body with its size and version prefix. `padding` extra
/// bytes are appended and counted in the declared size.
pub fn section(data_version: u8, body: &[u8], padding: usize) -> Vec<u8> {
    let size = 4 + 1 + body.len() + padding;
    let mut w = Wire::new();
    w.u32(size as u32).u8(data_version).bytes(body).bytes(&vec![0xEEu8; padding]);
    w.take()
}

pub struct TestMeta {
    pub data_version: u8,
    pub feature_level: i32,
    pub app_name: &'static str,
    pub build_version: &'static str,
    pub prereq_ids: Vec<&'static str>,
    pub build_id: &'static str,
}

impl Default for TestMeta {
    fn default() -> Self {
        Self {
            data_version: 1,
            feature_level: 17,
            app_name: "TestApp",
            build_version: "1.0.0-CL-42",
            prereq_ids: vec!["prereq-a"],
            build_id: "build-xyz",
        }
    }
}

pub fn meta_section(m: &TestMeta, padding: usize) -> Vec<u8> {
    let mut w = Wire::new();
    w.i32(m.feature_level)
        .u8(0)
        .i32(7)
        .fstring(m.app_name)
        .fstring(m.build_version)
        .fstring("Game/Binaries/Game.exe")
        .fstring("-launch")
        .fstrings(&m.prereq_ids)
        .fstring("Prereqs")
        .fstring("Prereq/setup.exe")
        .fstring("/quiet");
    if m.data_version >= 1 {
        w.fstring(m.build_id);
    }
    section(m.data_version, &w.take(), padding)
}

#[derive(Clone)]
pub struct TestChunk {
    pub words: [u32; 4],
    pub hash: u64,
    pub sha: [u8; 20],
    pub group: u8,
    pub window_size: u32,
    pub file_size: u64,
}

pub fn test_chunk(n: u32) -> TestChunk {
    TestChunk {
        words: [n, n + 0x100, n + 0x200, n + 0x300],
        hash: 0x0123_4567_89AB_CDEF ^ u64::from(n),
        sha: sha(n as u8),
        group: (n % 100) as u8,
        window_size: 1024 * 1024,
        file_size: 1000 + u64::from(n),
    }
}

pub fn chunk_section(chunks: &[TestChunk], padding: usize) -> Vec<u8> {
    let mut w = Wire::new();
    w.u32(chunks.len() as u32);
    for c in chunks {
        w.guid(c.words);
    }
    for c in chunks {
        w.u64(c.hash);
    }
    for c in chunks {
        w.bytes(&c.sha);
    }
    for c in chunks {
        w.u8(c.group);
    }
    for c in chunks {
        w.u32(c.window_size);
    }
    for c in chunks {
        w.u64(c.file_size);
    }
    section(0, &w.take(), padding)
}

#[derive(Clone)]
pub struct TestPart {
    pub words: [u32; 4],
    pub offset: u32,
    pub size: u32,
}

#[derive(Clone)]
pub struct TestFile {
    pub name: &'static str,
    pub symlink: &'static str,
    pub sha: [u8; 20],
    pub flags: u8,
    pub tags: Vec<&'static str>,
    pub parts: Vec<TestPart>,
}

pub fn file_section(files: &[TestFile], padding: usize) -> Vec<u8> {
    let mut w = Wire::new();
    w.u32(files.len() as u32);
    for f in files {
        w.fstring(f.name);
    }
    for f in files {
        w.fstring(f.symlink);
    }
    for f in files {
        w.bytes(&f.sha);
    }
    for f in files {
        w.u8(f.flags);
    }
    for f in files {
        w.fstrings(&f.tags);
    }
    for f in files {
        w.u32(f.parts.len() as u32);
        for p in &f.parts {
            w.u32(28).guid(p.words).u32(p.offset).u32(p.size);
        }
    }
    section(0, &w.take(), padding)
}

pub fn custom_section(pairs: &[(&str, &str)], padding: usize) -> Vec<u8> {
    let mut w = Wire::new();
    w.u32(pairs.len() as u32);
    for (k, _) in pairs {
        w.fstring(k);
    }
    for (_, v) in pairs {
        w.fstring(v);
    }
    section(0, &w.take(), padding)
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// Full manifest file around `body`. `declared_uncompressed` overrides the
/// size written in the header.
pub fn manifest_file(
    body: &[u8],
    stored_as: u8,
    declared_uncompressed: Option<i32>,
) -> Vec<u8> {
    let stored = if stored_as & 0x01 != 0 { zlib(body) } else { body.to_vec() };
    let mut w = Wire::new();
    w.u32(MANIFEST_MAGIC)
        .i32(MANIFEST_HEADER_SIZE)
        .i32(declared_uncompressed.unwrap_or(body.len() as i32))
        .i32(stored.len() as i32)
        .bytes(&sha(0xA0))
        .u8(stored_as)
        .i32(17)
        .bytes(&stored);
    w.take()
}

/// Three chunks A, B, C and two files; `game.pak` spans B then A,
/// `readme.txt` lives in C.
pub fn sample_chunks() -> Vec<TestChunk> {
    vec![test_chunk(0xA), test_chunk(0xB), test_chunk(0xC)]
}

pub fn sample_files() -> Vec<TestFile> {
    let [a, b, c] = [test_chunk(0xA).words, test_chunk(0xB).words, test_chunk(0xC).words];
    vec![
        TestFile {
            name: "Game/Content/game.pak",
            symlink: "",
            sha: sha(1),
            flags: 0,
            tags: vec!["", "chunk0"],
            parts: vec![
                TestPart { words: b, offset: 16, size: 100 },
                TestPart { words: a, offset: 0, size: 50 },
            ],
        },
        TestFile {
            name: "readme.txt",
            symlink: "docs/readme.txt",
            sha: sha(2),
            flags: 4,
            tags: vec![],
            parts: vec![TestPart { words: c, offset: 8, size: 12 }],
        },
    ]
}

pub fn sample_body(padding: usize) -> Vec<u8> {
    let mut body = meta_section(&TestMeta::default(), padding);
    body.extend(chunk_section(&sample_chunks(), padding));
    body.extend(file_section(&sample_files(), padding));
    body.extend(custom_section(&[("BuildLabel", "Live"), ("CloudDir", "cdn")], padding));
    body
}

/// Chunk file with the standard header followed by `stored` bytes.
pub fn chunk_file(version: u32, stored_as: u8, words: [u32; 4], stored: &[u8]) -> Vec<u8> {
    chunk_file_with_header_size(version, stored_as, words, stored, CHUNK_HEADER_SIZE)
}

/// Like [`chunk_file`] but with a larger header, zero padded.
pub fn chunk_file_with_header_size(
    version: u32,
    stored_as: u8,
    words: [u32; 4],
    stored: &[u8],
    header_size: u32,
) -> Vec<u8> {
    let mut w = Wire::new();
    w.u32(CHUNK_MAGIC)
        .u32(version)
        .u32(header_size)
        .u32(stored.len() as u32)
        .guid(words)
        .u64(0xDEAD_BEEF)
        .u8(stored_as)
        .bytes(&sha(0x33))
        .u32(1);
    let pad = header_size as usize - w.buf.len();
    w.bytes(&vec![0u8; pad]).bytes(stored);
    w.take()
}

/// Deterministic payload for a chunk.
pub fn payload(seed: u64, len: usize) -> Vec<u8> {
    use rand::{rngs::StdRng, Rng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}
