use crate::error::{DecodeError, Result};
use std::io::{Read, Seek, SeekFrom};

/// 128-bit chunk identifier.
pub type Guid = uuid::Uuid;

/// Byte order applied to every fixed-width read except GUIDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Cursor-based typed reader over a seekable stream.
///
/// Manifest and chunk files are little-endian throughout; the one exception is
/// [`BinReader::read_guid`], which always reads big-endian words.
pub struct BinReader<R> {
    inner: R,
    order: ByteOrder,
}

macro_rules! read_int {
    ($name:ident, $ty:ty, $n:literal) => {
        pub fn $name(&mut self) -> Result<$ty> {
            let b = self.read_array::<$n>()?;
            Ok(match self.order {
                ByteOrder::Little => <$ty>::from_le_bytes(b),
                ByteOrder::Big => <$ty>::from_be_bytes(b),
            })
        }
    };
}

impl<R: Read + Seek> BinReader<R> {
    pub fn new(inner: R, order: ByteOrder) -> Self {
        Self { inner, order }
    }

    pub fn le(inner: R) -> Self {
        Self::new(inner, ByteOrder::Little)
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.inner.seek(pos)?)
    }

    /// Read up to `count` bytes, stopping early only at end of stream.
    /// Returns the bytes actually read; grows the buffer as data arrives so a
    /// bogus length cannot force a huge allocation up front.
    fn read_up_to(&mut self, count: u64) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        (&mut self.inner).take(count).read_to_end(&mut out)?;
        Ok(out)
    }

    /// Read exactly `count` bytes. Negative counts are rejected; zero yields an
    /// empty buffer without touching the stream.
    pub fn read_bytes(&mut self, count: i64) -> Result<Vec<u8>> {
        if count < 0 {
            return Err(DecodeError::NegativeLength(count));
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        let out = self.read_up_to(count as u64)?;
        if (out.len() as u64) < count as u64 {
            return Err(DecodeError::UnexpectedEof { wanted: count as usize });
        }
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => DecodeError::UnexpectedEof { wanted: N },
            _ => DecodeError::Io(e),
        })?;
        Ok(buf)
    }

    /// Read `count` bytes and step back over whatever was consumed.
    ///
    /// The cursor is restored even when the stream ends early; the short read
    /// is then reported as [`DecodeError::UnexpectedEof`].
    pub fn peek(&mut self, count: i64) -> Result<Vec<u8>> {
        if count < 0 {
            return Err(DecodeError::NegativeLength(count));
        }
        let out = self.read_up_to(count as u64)?;
        self.inner.seek(SeekFrom::Current(-(out.len() as i64)))?;
        if (out.len() as u64) < count as u64 {
            return Err(DecodeError::UnexpectedEof { wanted: count as usize });
        }
        Ok(out)
    }

    /// Everything from the cursor to end of stream.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.inner.read_to_end(&mut out)?;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    read_int!(read_u16, u16, 2);
    read_int!(read_u32, u32, 4);
    read_int!(read_u64, u64, 8);
    read_int!(read_i16, i16, 2);
    read_int!(read_i32, i32, 4);
    read_int!(read_i64, i64, 8);

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Length-prefixed, NUL-terminated string (`u32` length includes the NUL).
    pub fn read_fstring(&mut self) -> Result<String> {
        let len = self.read_u32()?;
        if len == 0 {
            return Ok(String::new());
        }
        let mut buf = self.read_bytes(i64::from(len))?;
        if buf.pop() != Some(0) {
            return Err(DecodeError::MalformedString { len });
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// `u32` count followed by that many [`read_fstring`](Self::read_fstring) values.
    pub fn read_fstring_array(&mut self) -> Result<Vec<String>> {
        let count = self.read_u32()?;
        let mut out = Vec::new();
        for _ in 0..count {
            out.push(self.read_fstring()?);
        }
        Ok(out)
    }

    /// GUID stored as four big-endian `u32` words. Each word is re-packed
    /// little-endian into its 4-byte slot of the identifier.
    pub fn read_guid(&mut self) -> Result<Guid> {
        let raw = self.read_array::<16>()?;
        Ok(guid_from_wire(raw))
    }

    pub fn read_sha(&mut self) -> Result<[u8; 20]> {
        self.read_array::<20>()
    }
}

/// Apply the on-disk GUID word swap to 16 raw bytes.
pub fn guid_from_wire(raw: [u8; 16]) -> Guid {
    let mut out = [0u8; 16];
    for (src, dst) in raw.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
        let word = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
        dst.copy_from_slice(&word.to_le_bytes());
    }
    Guid::from_bytes(out)
}
