//! Fixed offsets of the save container and of a single preset slot.
//!
//! All container-wide knowledge lives in [`SaveLayout`]; all slot-internal
//! offsets live in [`slot`]. Nothing else in the crate spells out raw offsets.

use std::ops::Range;

use crate::model::SlotNumber;

/// Magic tag of a populated preset slot.
pub const PRESET_MAGIC: [u8; 4] = *b"FACE";

pub const PRESET_TABLE_SIZE: usize = 0x1800;
pub const TABLE_HEADER_SIZE: usize = 8;
pub const SLOT_SIZE: usize = 0x130;
pub const SLOT_COUNT: usize = 15;
pub const TABLE_PADDING_SIZE: usize = PRESET_TABLE_SIZE - TABLE_HEADER_SIZE - SLOT_COUNT * SLOT_SIZE;

/// Where the preset table sits inside a save container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveLayout {
    pub name: &'static str,
    /// Magic expected at offset 0 of the container, if any.
    pub container_magic: Option<&'static [u8]>,
    /// Absolute offset of the section holding version, identity and settings.
    pub user_data_offset: usize,
    pub version_size: usize,
    pub identity_size: usize,
    pub settings_size: usize,
    /// MD5 digest guarding the user-data section, refreshed on every write.
    pub checksum: Option<SectionChecksum>,
}

/// A 16-byte MD5 digest stored at `offset`, covering `section_len` bytes
/// that start at the layout's `user_data_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionChecksum {
    pub offset: usize,
    pub section_len: usize,
}

pub const CHECKSUM_SIZE: usize = 16;

impl SaveLayout {
    /// PC `.sl2` container: BND4 header, ten 0x280010-byte character entries,
    /// then the account-wide section (16-byte checksum + data).
    pub const PC: SaveLayout = SaveLayout {
        name: "pc",
        container_magic: Some(b"BND4"),
        user_data_offset: 0x19003B0,
        version_size: 4,
        identity_size: 8,
        settings_size: 0x140,
        checksum: Some(SectionChecksum {
            offset: 0x19003A0,
            section_len: 0x60000,
        }),
    };

    pub const fn preset_table_offset(&self) -> usize {
        self.user_data_offset + self.version_size + self.identity_size + self.settings_size
    }

    pub const fn preset_table_end(&self) -> usize {
        self.preset_table_offset() + PRESET_TABLE_SIZE
    }

    /// Digest location and the section it covers, if this layout carries one.
    pub fn checksum_ranges(&self) -> Option<(Range<usize>, Range<usize>)> {
        let c = self.checksum?;
        let digest = c.offset..c.offset + CHECKSUM_SIZE;
        let section = self.user_data_offset..self.user_data_offset + c.section_len;
        Some((digest, section))
    }
}

impl Default for SaveLayout {
    fn default() -> Self {
        SaveLayout::PC
    }
}

/// Byte range of a slot measured from the first slot (just past the table header).
pub const fn slot_range(slot: SlotNumber) -> Range<usize> {
    let start = (slot.get() as usize - 1) * SLOT_SIZE;
    start..start + SLOT_SIZE
}

/// Byte range of a slot measured from the start of the preset table.
pub const fn slot_table_range(slot: SlotNumber) -> Range<usize> {
    let r = slot_range(slot);
    r.start + TABLE_HEADER_SIZE..r.end + TABLE_HEADER_SIZE
}

pub const fn table_header_range() -> Range<usize> {
    0..TABLE_HEADER_SIZE
}

pub const fn table_padding_range() -> Range<usize> {
    PRESET_TABLE_SIZE - TABLE_PADDING_SIZE..PRESET_TABLE_SIZE
}

/// Offsets inside one 0x130-byte preset slot.
pub mod slot {
    pub const MAGIC: usize = 0x000;
    pub const HEADER: usize = 0x004;
    pub const HEADER_LEN: usize = 5;
    pub const BODY_TYPE: usize = 0x009;
    pub const HEADER_TAIL: usize = 0x00A;
    pub const HEADER_TAIL_LEN: usize = 6;
    pub const MODELS: usize = 0x010;
    pub const MODEL_COUNT: usize = 8;
    pub const FACIAL_STRUCTURE: usize = 0x030;
    pub const FACIAL_PARAM_COUNT: usize = 68;
    pub const RESERVED: usize = 0x074;
    pub const RESERVED_LEN: usize = 64;
    pub const BODY_PROPORTIONS: usize = 0x0B4;
    pub const BODY_PROPORTION_COUNT: usize = 5;
    pub const COSMETICS: usize = 0x0B9;
    pub const COSMETICS_LEN: usize = 88;
    pub const EYEPATCH_COLOR: usize = 0x111;
    pub const COSMETICS_RESERVED: usize = 0x114;
    pub const COSMETICS_RESERVED_LEN: usize = 18;
    pub const PADDING: usize = 0x126;
    pub const PADDING_LEN: usize = 10;

    const _: () = assert!(HEADER + HEADER_LEN == BODY_TYPE);
    const _: () = assert!(HEADER_TAIL + HEADER_TAIL_LEN == MODELS);
    const _: () = assert!(MODELS + MODEL_COUNT * 4 == FACIAL_STRUCTURE);
    const _: () = assert!(FACIAL_STRUCTURE + FACIAL_PARAM_COUNT == RESERVED);
    const _: () = assert!(RESERVED + RESERVED_LEN == BODY_PROPORTIONS);
    const _: () = assert!(BODY_PROPORTIONS + BODY_PROPORTION_COUNT == COSMETICS);
    const _: () = assert!(COSMETICS + COSMETICS_LEN == EYEPATCH_COLOR);
    const _: () = assert!(EYEPATCH_COLOR + 3 == COSMETICS_RESERVED);
    const _: () = assert!(COSMETICS_RESERVED + COSMETICS_RESERVED_LEN == PADDING);
    const _: () = assert!(PADDING + PADDING_LEN == super::SLOT_SIZE);
}

const _: () = assert!(TABLE_PADDING_SIZE == 0x628);
