//! erp-core: locate, decode, validate and rewrite the character preset table
//! of an Elden Ring save container.
//!
//! Layers, leaf first:
//! - `region`: bounds-checked typed views over byte buffers
//! - `codec`: one 0x130-byte slot <-> [`PresetRecord`], lossless
//! - `locator`: where the preset table sits in a container ([`SaveLayout`])
//! - `checksum`: MD5 digest guarding the user-data section
//! - `save`: load, read a slot, write a slot back with a backup
//! - `edit` / `json`: list, info, export, import and copy between files
//!
pub mod checksum;
pub mod codec;
pub mod edit;
pub mod error;
pub mod fixture;
pub mod json;
pub mod layout;
pub mod locator;
pub mod model;
pub mod region;
pub mod save;
pub mod saves;

pub use codec::{decode, encode, is_empty_slot};
pub use edit::{Presets, copy_slot};
pub use error::{ErrorKind, PresetError, Result};
pub use json::{ExportDocument, SlotSummary};
pub use layout::{
    PRESET_MAGIC, PRESET_TABLE_SIZE, SLOT_COUNT, SLOT_SIZE, SaveLayout, SectionChecksum,
};
pub use locator::{PresetTable, locate};
pub use model::{BodyType, FacialStructure, PresetRecord, Rgb, SlotNumber};
pub use region::{Region, RegionError};
pub use save::{SaveBuffer, SaveManager, WriteReport, backup_path, load};
