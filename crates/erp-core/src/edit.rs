// Operations composed from the locator, the codec and the save manager:
// walking all slots, copying a preset between files, importing from JSON.
use std::iter::FusedIterator;
use std::path::Path;

use crate::codec::{decode, encode};
use crate::error::{PresetError, Result};
use crate::json::ExportDocument;
use crate::locator::PresetTable;
use crate::model::{PresetRecord, SlotNumber};
use crate::save::{SaveBuffer, SaveManager, WriteReport, read_slot_at};

/// Decoded slots of one buffer in ascending slot order. Each call to
/// [`SaveManager::presets`] starts a fresh walk over the same buffer.
pub struct Presets<'a> {
    buf: &'a SaveBuffer,
    table: PresetTable,
    slots: std::ops::RangeInclusive<i64>,
}

impl Iterator for Presets<'_> {
    type Item = (SlotNumber, Result<Option<PresetRecord>>);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.slots.next()?;
        let slot = SlotNumber::new(n).ok()?;
        let bytes = read_slot_at(self.buf, &self.table, slot);
        Some((slot, decode(&bytes)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl FusedIterator for Presets<'_> {}

impl SaveManager {
    /// Walk all 15 slots. Fails up front if the buffer holds no preset table.
    pub fn presets<'a>(&self, buf: &'a SaveBuffer) -> Result<Presets<'a>> {
        let table = self.locate(buf)?;
        Ok(Presets {
            buf,
            table,
            slots: 1..=crate::layout::SLOT_COUNT as i64,
        })
    }

    /// Decode one slot of an already loaded buffer.
    pub fn decode_slot(&self, buf: &SaveBuffer, slot: i64) -> Result<Option<PresetRecord>> {
        decode(&self.read_slot(buf, slot)?)
    }

    /// Copy the preset in `src_slot` of `src` into `dst_slot` of `dst`.
    ///
    /// Both slot numbers are checked before any file is read, and an empty
    /// source slot is rejected before the destination is touched. Copying a
    /// slot onto itself still performs the backup and write.
    pub fn copy_slot(
        &mut self,
        src: &Path,
        src_slot: i64,
        dst: &Path,
        dst_slot: i64,
    ) -> Result<WriteReport> {
        let from = SlotNumber::new(src_slot)?;
        SlotNumber::new(dst_slot)?;

        let source = self.load(src)?;
        let record = self
            .decode_slot(&source, src_slot)?
            .ok_or(PresetError::EmptySlot { slot: from.get() })?;
        let bytes = encode(&record)?;
        tracing::info!(
            "Copying preset {:?} slot {} -> {:?} slot {}",
            src,
            src_slot,
            dst,
            dst_slot
        );
        self.write_slot(dst, dst_slot, &bytes)
    }

    /// Write entry `entry` of an exported document into `dst_slot` of `dst`.
    /// Entries are counted from 1 in ascending source-slot order.
    pub fn import_preset(
        &mut self,
        json: &Path,
        entry: usize,
        dst: &Path,
        dst_slot: i64,
    ) -> Result<WriteReport> {
        SlotNumber::new(dst_slot)?;
        let doc = ExportDocument::read(json)?;
        let available = doc.presets.len();
        let picked = entry
            .checked_sub(1)
            .and_then(|i| doc.presets.values().nth(i))
            .ok_or_else(|| PresetError::Import {
                reason: format!("entry {entry} not found ({available} preset(s) in {})", json.display()),
            })?;
        let bytes = encode(picked)?;
        tracing::info!("Importing entry {} of {:?} into {:?} slot {}", entry, json, dst, dst_slot);
        self.write_slot(dst, dst_slot, &bytes)
    }
}

/// One-shot copy using the PC layout and a fresh session.
pub fn copy_slot(src: &Path, src_slot: i64, dst: &Path, dst_slot: i64) -> Result<WriteReport> {
    SaveManager::default().copy_slot(src, src_slot, dst, dst_slot)
}
