use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PresetError, Result};
use crate::model::{BodyType, PresetRecord, Rgb, SlotNumber};
use crate::save::SaveManager;

/// Short per-slot view used by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub slot: SlotNumber,
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_type: Option<BodyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_model: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_model: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_age: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skin_color: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<Rgb>,
}

impl SlotSummary {
    pub fn new(slot: SlotNumber, record: Option<&PresetRecord>) -> Self {
        SlotSummary {
            slot,
            empty: record.is_none(),
            body_type: record.map(|p| p.body_type),
            face_model: record.map(|p| p.models.face),
            hair_model: record.map(|p| p.models.hair),
            apparent_age: record.map(|p| p.apparent_age()),
            skin_color: record.map(|p| p.cosmetics.skin.color),
            hair_color: record.map(|p| p.cosmetics.hair.color),
        }
    }
}

/// On-disk export format: populated slots keyed by slot number (`"1"`..`"15"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub exported_at: Option<String>,
    pub presets: BTreeMap<SlotNumber, PresetRecord>,
}

impl ExportDocument {
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| PresetError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let s = serde_json::to_string_pretty(self)?;
        fs::write(path, s).map_err(|e| PresetError::io(path, e))
    }
}

impl SaveManager {
    /// Summaries of all 15 slots of the save at `path`.
    pub fn list(&self, path: &Path) -> Result<Vec<SlotSummary>> {
        let buf = self.load(path)?;
        self.presets(&buf)?
            .map(|(slot, decoded)| -> Result<SlotSummary> {
                Ok(SlotSummary::new(slot, decoded?.as_ref()))
            })
            .collect()
    }

    /// Full record of one slot; an empty slot is an error.
    pub fn info(&self, path: &Path, slot: i64) -> Result<PresetRecord> {
        let n = SlotNumber::new(slot)?;
        let buf = self.load(path)?;
        self.decode_slot(&buf, slot)?
            .ok_or(PresetError::EmptySlot { slot: n.get() })
    }

    /// Build the export document for the save at `path`.
    pub fn export_document(&self, path: &Path) -> Result<ExportDocument> {
        let buf = self.load(path)?;
        let mut presets = BTreeMap::new();
        for (slot, decoded) in self.presets(&buf)? {
            if let Some(preset) = decoded? {
                presets.insert(slot, preset);
            }
        }
        Ok(ExportDocument {
            source: Some(path.to_path_buf()),
            exported_at: Some(chrono::Local::now().to_rfc3339()),
            presets,
        })
    }

    /// Export every populated slot of `path` to `out`; returns how many were written.
    pub fn export(&self, path: &Path, out: &Path) -> Result<usize> {
        let doc = self.export_document(path)?;
        doc.write(out)?;
        tracing::info!("Exported {} preset(s) to {:?}", doc.presets.len(), out);
        Ok(doc.presets.len())
    }
}
