//! MD5 digest over the user-data section of a container.
//!
//! The game rejects a section whose stored digest does not match its bytes,
//! so every write that touches the section refreshes the digest as well.

use std::ops::Range;

use md5::{Digest, Md5};

use crate::error::{PresetError, Result};
use crate::layout::{CHECKSUM_SIZE, SaveLayout};

/// Digest and section ranges of `layout`, checked against a buffer of `len` bytes.
pub(crate) fn checked_ranges(
    layout: &SaveLayout,
    len: usize,
) -> Result<Option<(Range<usize>, Range<usize>)>> {
    let Some((digest, section)) = layout.checksum_ranges() else {
        return Ok(None);
    };
    if digest.end > len || section.end > len {
        return Err(PresetError::structure(format!(
            "checksummed section ends at {:#x} but the file is only {:#x} bytes",
            digest.end.max(section.end),
            len
        )));
    }
    if digest.start < section.end && section.start < digest.end {
        return Err(PresetError::structure("checksum overlaps the section it covers"));
    }
    Ok(Some((digest, section)))
}

fn md5(bytes: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Digest of the section as it currently is, or `None` for layouts without one.
pub fn section_digest(layout: &SaveLayout, data: &[u8]) -> Result<Option<[u8; CHECKSUM_SIZE]>> {
    Ok(checked_ranges(layout, data.len())?.map(|(_, section)| md5(&data[section])))
}

/// True when the stored digest matches the section, or the layout has no digest.
pub fn is_valid(layout: &SaveLayout, data: &[u8]) -> Result<bool> {
    match checked_ranges(layout, data.len())? {
        Some((digest, section)) => Ok(data[digest] == md5(&data[section])),
        None => Ok(true),
    }
}

/// Recompute and store the section digest. Returns false if the layout has none.
pub fn refresh(layout: &SaveLayout, data: &mut [u8]) -> Result<bool> {
    let Some((digest, section)) = checked_ranges(layout, data.len())? else {
        return Ok(false);
    };
    let sum = md5(&data[section]);
    data[digest.clone()].copy_from_slice(&sum);
    tracing::debug!("Refreshed section checksum at {:#x}", digest.start);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SectionChecksum;

    const TINY: SaveLayout = SaveLayout {
        name: "tiny",
        container_magic: None,
        user_data_offset: 0x20,
        version_size: 0,
        identity_size: 0,
        settings_size: 0,
        checksum: Some(SectionChecksum {
            offset: 0x10,
            section_len: 0x40,
        }),
    };

    #[test]
    fn refresh_makes_the_digest_valid() {
        let mut data = vec![0x33u8; 0x80];
        assert!(!is_valid(&TINY, &data).unwrap());
        assert!(refresh(&TINY, &mut data).unwrap());
        assert!(is_valid(&TINY, &data).unwrap());
        data[0x30] ^= 1;
        assert!(!is_valid(&TINY, &data).unwrap());
        // Bytes outside the section do not matter.
        refresh(&TINY, &mut data).unwrap();
        data[0x70] ^= 1;
        assert!(is_valid(&TINY, &data).unwrap());
    }

    #[test]
    fn known_digest() {
        // MD5 of 0x40 zero bytes.
        let data = {
            let mut d = vec![0u8; 0x60];
            d[..0x20].fill(0xFF);
            d
        };
        assert_eq!(
            hex::encode(section_digest(&TINY, &data).unwrap().unwrap()),
            "3b5d3c7d207e37dceeedd301e35e2e58"
        );
    }

    #[test]
    fn short_buffer_is_a_structure_error() {
        let mut data = vec![0u8; 0x50];
        assert!(refresh(&TINY, &mut data).is_err());
    }

    #[test]
    fn layouts_without_digest_are_untouched() {
        let plain = SaveLayout { checksum: None, ..TINY };
        let mut data = vec![7u8; 0x10];
        assert!(!refresh(&plain, &mut data).unwrap());
        assert!(is_valid(&plain, &data).unwrap());
        assert_eq!(data, vec![7u8; 0x10]);
    }
}
