// Bounds-checked typed access to a fixed window of a byte buffer.
// Every accessor takes an offset relative to the window start and fails
// instead of clamping; writes never change the window length.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("out of bounds: {size} bytes at offset {offset:#x} exceed region length {len:#x}")]
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },
}

#[derive(Debug)]
pub struct Region<B> {
    buf: B,
    base: usize,
    len: usize,
}

impl<B: AsRef<[u8]>> Region<B> {
    /// Window `[base, base + len)` over `buf`; fails if the buffer is too short.
    pub fn new(buf: B, base: usize, len: usize) -> Result<Self, RegionError> {
        let have = buf.as_ref().len();
        match base.checked_add(len) {
            Some(end) if end <= have => Ok(Self { buf, base, len }),
            _ => Err(RegionError::OutOfBounds {
                offset: base,
                size: len,
                len: have,
            }),
        }
    }

    /// Window covering the whole buffer.
    pub fn whole(buf: B) -> Self {
        let len = buf.as_ref().len();
        Self { buf, base: 0, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn base(&self) -> usize {
        self.base
    }

    fn span(&self, offset: usize, size: usize) -> Result<std::ops::Range<usize>, RegionError> {
        match offset.checked_add(size) {
            Some(end) if end <= self.len => Ok(self.base + offset..self.base + end),
            _ => Err(RegionError::OutOfBounds {
                offset,
                size,
                len: self.len,
            }),
        }
    }

    pub fn slice(&self, offset: usize, size: usize) -> Result<&[u8], RegionError> {
        let r = self.span(offset, size)?;
        Ok(&self.buf.as_ref()[r])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf.as_ref()[self.base..self.base + self.len]
    }

    pub fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], RegionError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset, N)?);
        Ok(out)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, RegionError> {
        Ok(self.read_array::<1>(offset)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, RegionError> {
        Ok(u16::from_le_bytes(self.read_array(offset)?))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32, RegionError> {
        Ok(u32::from_le_bytes(self.read_array(offset)?))
    }

    /// Narrower window inside this one, sharing the same buffer.
    pub fn sub(&self, offset: usize, size: usize) -> Result<Region<&[u8]>, RegionError> {
        self.span(offset, size)?;
        Ok(Region {
            buf: self.buf.as_ref(),
            base: self.base + offset,
            len: size,
        })
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Region<B> {
    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), RegionError> {
        let r = self.span(offset, bytes.len())?;
        self.buf.as_mut()[r].copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_u8(&mut self, offset: usize, v: u8) -> Result<(), RegionError> {
        self.write_bytes(offset, &[v])
    }

    pub fn write_u16(&mut self, offset: usize, v: u16) -> Result<(), RegionError> {
        self.write_bytes(offset, &v.to_le_bytes())
    }

    pub fn write_u32(&mut self, offset: usize, v: u32) -> Result<(), RegionError> {
        self.write_bytes(offset, &v.to_le_bytes())
    }

    pub fn into_inner(self) -> B {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_window_past_end() {
        let buf = [0u8; 16];
        assert!(Region::new(&buf[..], 8, 8).is_ok());
        assert_eq!(
            Region::new(&buf[..], 9, 8).unwrap_err(),
            RegionError::OutOfBounds {
                offset: 9,
                size: 8,
                len: 16
            }
        );
        assert!(Region::new(&buf[..], usize::MAX, 2).is_err());
    }

    #[test]
    fn typed_reads_are_relative_and_little_endian() {
        let buf: Vec<u8> = (0u8..16).collect();
        let r = Region::new(&buf[..], 4, 8).unwrap();
        assert_eq!(r.read_u8(0).unwrap(), 4);
        assert_eq!(r.read_u16(1).unwrap(), u16::from_le_bytes([5, 6]));
        assert_eq!(r.read_u32(4).unwrap(), u32::from_le_bytes([8, 9, 10, 11]));
        assert!(r.read_u32(5).is_err());
        assert!(r.read_u8(8).is_err());
        assert_eq!(r.read_array::<3>(5).unwrap(), [9, 10, 11]);
    }

    #[test]
    fn writes_stay_inside_the_window() {
        let mut buf = vec![0u8; 12];
        let mut r = Region::new(&mut buf[..], 2, 6).unwrap();
        r.write_u32(2, 0xAABBCCDD).unwrap();
        assert!(r.write_u16(5, 1).is_err());
        assert!(r.write_bytes(4, &[1, 2, 3]).is_err());
        assert_eq!(r.len(), 6);
        assert_eq!(buf, [0, 0, 0, 0, 0xDD, 0xCC, 0xBB, 0xAA, 0, 0, 0, 0]);
    }

    #[test]
    fn sub_region_checks_against_parent() {
        let buf = [1u8; 32];
        let r = Region::new(&buf[..], 8, 16).unwrap();
        let s = r.sub(4, 8).unwrap();
        assert_eq!(s.base(), 12);
        assert_eq!(s.len(), 8);
        assert!(r.sub(10, 8).is_err());
    }
}
