//! Loading save files and writing preset slots back with a backup.
//!
//! A [`SaveManager`] is one editing session. The first time it mutates a path
//! it writes `<path>.backup` from the bytes it just loaded; later writes to
//! the same path in that session reuse that backup. Backups are never removed.
//!
//! Write-back goes through `<path>.tmp` and a rename, so a failure before the
//! rename leaves the original file untouched. An existing `<path>.tmp` is never
//! overwritten; the write fails instead.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::checksum;
use crate::error::{PresetError, Result};
use crate::layout::{SLOT_SIZE, SaveLayout};
use crate::locator::{PresetTable, locate};
use crate::model::SlotNumber;

/// The whole save file, held in memory for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveBuffer {
    data: Vec<u8>,
}

impl SaveBuffer {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Read a whole save file into memory.
pub fn load(path: &Path) -> Result<SaveBuffer> {
    let data = fs::read(path).map_err(|e| PresetError::io(path, e))?;
    tracing::debug!("Loaded {} bytes from {:?}", data.len(), path);
    Ok(SaveBuffer::from_bytes(data))
}

/// `<path>.backup`, next to the save file.
pub fn backup_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".backup")
}

fn temp_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".tmp")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// What a successful slot write did on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub slot: SlotNumber,
    pub backup: PathBuf,
    /// False when an earlier write in the same session already made the backup.
    pub backup_created: bool,
    /// Whether the section digest was recomputed.
    pub checksum_refreshed: bool,
}

#[derive(Debug, Default)]
pub struct SaveManager {
    layout: SaveLayout,
    backed_up: HashSet<PathBuf>,
}

impl SaveManager {
    pub fn new(layout: SaveLayout) -> Self {
        Self {
            layout,
            backed_up: HashSet::new(),
        }
    }

    pub fn layout(&self) -> &SaveLayout {
        &self.layout
    }

    pub fn load(&self, path: &Path) -> Result<SaveBuffer> {
        load(path)
    }

    pub fn locate(&self, buf: &SaveBuffer) -> Result<PresetTable> {
        locate(buf.as_bytes(), &self.layout)
    }

    /// Copy out the raw bytes of one slot.
    pub fn read_slot(&self, buf: &SaveBuffer, slot: i64) -> Result<[u8; SLOT_SIZE]> {
        let slot = SlotNumber::new(slot)?;
        let table = self.locate(buf)?;
        Ok(read_slot_at(buf, &table, slot))
    }

    /// Replace one slot on disk. Apart from the section digest, which is
    /// recomputed when the layout has one, every other byte stays as it was.
    pub fn write_slot(&mut self, path: &Path, slot: i64, new_slot: &[u8]) -> Result<WriteReport> {
        let slot = SlotNumber::new(slot)?;
        if new_slot.len() != SLOT_SIZE {
            return Err(PresetError::SizeMismatch {
                expected: SLOT_SIZE,
                actual: new_slot.len(),
            });
        }

        let original = load(path)?;
        let table = self.locate(&original)?;
        checksum::checked_ranges(&self.layout, original.len())?;
        let backup = backup_path(path);
        let backup_created = self.ensure_backup(path, &backup, original.as_bytes())?;

        let mut working = original.into_bytes();
        working[table.slot_range(slot)].copy_from_slice(new_slot);
        let checksum_refreshed = checksum::refresh(&self.layout, &mut working)?;
        replace_file(path, &working)?;

        tracing::info!("Wrote preset slot {} to {:?}", slot, path);
        Ok(WriteReport {
            path: path.to_path_buf(),
            slot,
            backup,
            backup_created,
            checksum_refreshed,
        })
    }

    fn ensure_backup(&mut self, path: &Path, backup: &Path, original: &[u8]) -> Result<bool> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.backed_up.contains(&key) && backup.exists() {
            tracing::debug!("Reusing backup {:?}", backup);
            return Ok(false);
        }
        fs::write(backup, original).map_err(|e| PresetError::io(backup, e))?;
        let check = fs::read(backup).map_err(|e| PresetError::io(backup, e))?;
        if check != original {
            return Err(PresetError::io(
                backup,
                std::io::Error::other("backup verification failed"),
            ));
        }
        tracing::info!("Created backup {:?}", backup);
        self.backed_up.insert(key);
        Ok(true)
    }
}

pub(crate) fn read_slot_at(buf: &SaveBuffer, table: &PresetTable, slot: SlotNumber) -> [u8; SLOT_SIZE] {
    let mut out = [0u8; SLOT_SIZE];
    out.copy_from_slice(&buf.as_bytes()[table.slot_range(slot)]);
    out
}

// Write to a temp sibling, sync, then rename over the target.
fn replace_file(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp)
        .map_err(|e| PresetError::io(&tmp, e))?;
    let written = file
        .write_all(data)
        .and_then(|()| file.flush())
        .and_then(|()| file.sync_all());
    drop(file);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(PresetError::io(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(PresetError::io(path, e));
    }
    tracing::debug!("Saved {} bytes to {:?}", data.len(), path);
    Ok(())
}
