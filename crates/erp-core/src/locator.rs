use std::ops::Range;

use crate::error::{PresetError, Result};
use crate::layout::{
    PRESET_MAGIC, PRESET_TABLE_SIZE, SaveLayout, slot_table_range, table_header_range,
    table_padding_range,
};
use crate::model::SlotNumber;

/// The located preset table: absolute byte offsets inside the save buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetTable {
    start: usize,
}

impl PresetTable {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.start + PRESET_TABLE_SIZE
    }

    pub fn header_range(&self) -> Range<usize> {
        self.shift(table_header_range())
    }

    pub fn padding_range(&self) -> Range<usize> {
        self.shift(table_padding_range())
    }

    pub fn slot_range(&self, slot: SlotNumber) -> Range<usize> {
        self.shift(slot_table_range(slot))
    }

    fn shift(&self, r: Range<usize>) -> Range<usize> {
        self.start + r.start..self.start + r.end
    }
}

/// Find the preset table in a full save buffer and check it looks like one.
pub fn locate(data: &[u8], layout: &SaveLayout) -> Result<PresetTable> {
    if let Some(magic) = layout.container_magic
        && !data.starts_with(magic)
    {
        return Err(PresetError::structure(format!(
            "container magic mismatch for {} layout: expected {:?}",
            layout.name,
            String::from_utf8_lossy(magic)
        )));
    }

    let table = PresetTable {
        start: layout.preset_table_offset(),
    };
    let end = layout.preset_table_end();
    if data.len() < end {
        return Err(PresetError::structure(format!(
            "save buffer too short: preset table ends at {end:#x}, buffer is {:#x} bytes",
            data.len()
        )));
    }

    let mut populated = 0usize;
    let mut blank = 0usize;
    for n in SlotNumber::all() {
        let r = table.slot_range(n);
        let magic = &data[r.start..r.start + PRESET_MAGIC.len()];
        if magic == PRESET_MAGIC {
            populated += 1;
        } else if magic.iter().all(|b| *b == 0) {
            blank += 1;
        }
    }
    if populated == 0 && blank != SlotNumber::all().count() {
        return Err(PresetError::structure(format!(
            "no preset table at {:#x}: no slot carries the FACE magic and not all slots are blank",
            table.start
        )));
    }
    tracing::debug!(
        layout = layout.name,
        start = table.start,
        populated,
        "located preset table"
    );
    Ok(table)
}
