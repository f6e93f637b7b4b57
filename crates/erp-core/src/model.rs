// Decoded preset record and its building blocks.
// Values are plain copies of slot bytes; nothing here refers back into a save buffer.
use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PresetError;
use crate::layout::{SLOT_COUNT, slot};

/// A validated 1-based preset slot number (1..=15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotNumber(u8);

impl SlotNumber {
    pub fn new(n: i64) -> Result<Self, PresetError> {
        if (1..=SLOT_COUNT as i64).contains(&n) {
            Ok(SlotNumber(n as u8))
        } else {
            Err(PresetError::InvalidSlot { slot: n })
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// All slot numbers in ascending order.
    pub fn all() -> impl Iterator<Item = SlotNumber> {
        (1..=SLOT_COUNT as u8).map(SlotNumber)
    }
}

impl<'de> Deserialize<'de> for SlotNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = i64::deserialize(deserializer)?;
        SlotNumber::new(n).map_err(D::Error::custom)
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    TypeA,
    TypeB,
}

impl BodyType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(BodyType::TypeA),
            1 => Some(BodyType::TypeB),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            BodyType::TypeA => 0,
            BodyType::TypeB => 1,
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyType::TypeA => f.write_str("Type A"),
            BodyType::TypeB => f.write_str("Type B"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({:>3}, {:>3}, {:>3})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Models {
    pub face: u32,
    pub hair: u32,
    pub eye: u32,
    pub eyebrow: u32,
    pub beard: u32,
    pub eyepatch: u32,
    pub decal: u32,
    pub eyelash: u32,
}

/// Names of the facial-structure parameters, in slot order. Entries whose
/// meaning is unknown are named after their offset inside the slot.
pub const FACIAL_PARAM_NAMES: [&str; slot::FACIAL_PARAM_COUNT] = [
    "apparent_age",
    "facial_aesthetic",
    "form_emphasis",
    "unk_0x33",
    "brow_ridge_height",
    "inner_brow_ridge",
    "outer_brow_ridge",
    "cheekbone_height",
    "cheekbone_depth",
    "cheekbone_width",
    "cheekbone_protrusion",
    "cheeks",
    "chin_tip_position",
    "chin_length",
    "chin_protrusion",
    "chin_depth",
    "chin_size",
    "chin_height",
    "chin_width",
    "eye_position",
    "eye_size",
    "eye_slant",
    "eye_spacing",
    "nose_size",
    "nose_forehead_ratio",
    "unk_0x49",
    "face_protrusion",
    "vertical_face_ratio",
    "facial_feature_slant",
    "horizontal_face_ratio",
    "unk_0x4e",
    "forehead_depth",
    "forehead_protrusion",
    "unk_0x51",
    "jaw_protrusion",
    "jaw_width",
    "lower_jaw",
    "jaw_contour",
    "lip_shape",
    "lip_size",
    "lip_fullness",
    "mouth_expression",
    "lip_protrusion",
    "lip_thickness",
    "mouth_protrusion",
    "mouth_slant",
    "occlusion",
    "mouth_position",
    "mouth_width",
    "mouth_chin_distance",
    "nose_ridge_depth",
    "nose_ridge_length",
    "nose_position",
    "nose_tip_height",
    "nostril_slant",
    "nostril_size",
    "nostril_width",
    "nose_protrusion",
    "nose_bridge_height",
    "bridge_protrusion1",
    "bridge_protrusion2",
    "nose_bridge_width",
    "nose_height",
    "nose_slant",
    "unk_0x70",
    "unk_0x71",
    "unk_0x72",
    "unk_0x73",
];

/// The 68 facial-structure sliders, kept as raw bytes and addressed by name.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FacialStructure(pub [u8; slot::FACIAL_PARAM_COUNT]);

impl FacialStructure {
    pub fn get(&self, name: &str) -> Option<u8> {
        let idx = FACIAL_PARAM_NAMES.iter().position(|n| *n == name)?;
        Some(self.0[idx])
    }

    pub fn set(&mut self, name: &str, value: u8) -> bool {
        match FACIAL_PARAM_NAMES.iter().position(|n| *n == name) {
            Some(idx) => {
                self.0[idx] = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u8)> + '_ {
        FACIAL_PARAM_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl Default for FacialStructure {
    fn default() -> Self {
        FacialStructure([0; slot::FACIAL_PARAM_COUNT])
    }
}

impl fmt::Debug for FacialStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Serialize for FacialStructure {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(slot::FACIAL_PARAM_COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FacialStructure {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, u8>::deserialize(d)?;
        let mut out = FacialStructure::default();
        for (i, name) in FACIAL_PARAM_NAMES.iter().enumerate() {
            out.0[i] = *map
                .get(*name)
                .ok_or_else(|| D::Error::custom(format!("missing facial parameter {name}")))?;
        }
        if let Some(extra) = map.keys().find(|k| !FACIAL_PARAM_NAMES.contains(&k.as_str())) {
            return Err(D::Error::custom(format!("unknown facial parameter {extra}")));
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyProportions {
    pub head: u8,
    pub chest: u8,
    pub abdomen: u8,
    pub arms: u8,
    pub legs: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skin {
    pub color: Rgb,
    pub luster: u8,
    pub pores: u8,
    pub stubble: u8,
}

/// Intensity plus colour, shared by make-up style layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tint {
    pub intensity: u8,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TattooMark {
    pub horizontal: u8,
    pub vertical: u8,
    pub angle: u8,
    pub expansion: u8,
    pub color: Rgb,
    pub reserved: u8,
    pub flip: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeColors {
    pub iris_color: Rgb,
    pub iris_size: u8,
    pub clouding: u8,
    pub clouding_color: Rgb,
    pub white_color: Rgb,
    pub position: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HairColors {
    pub color: Rgb,
    pub luster: u8,
    pub root_darkness: u8,
    pub white_hairs: u8,
}

/// The 88-byte skin and cosmetics block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cosmetics {
    pub skin: Skin,
    pub dark_circles: Tint,
    pub cheeks: Tint,
    pub eye_liner: Tint,
    pub eye_shadow_lower: Tint,
    pub eye_shadow_upper: Tint,
    pub lip_stick: Tint,
    pub tattoo_mark: TattooMark,
    pub body_hair: Tint,
    pub right_eye: EyeColors,
    pub left_eye: EyeColors,
    pub hair: HairColors,
    pub beard: HairColors,
    pub eyebrows: HairColors,
    pub eyelash_color: Rgb,
}

/// One decoded preset slot. Opaque blocks are carried verbatim so encoding
/// reproduces the original bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetRecord {
    #[serde(with = "hex_bytes")]
    pub header: [u8; slot::HEADER_LEN],
    pub body_type: BodyType,
    #[serde(with = "hex_bytes")]
    pub header_tail: [u8; slot::HEADER_TAIL_LEN],
    pub models: Models,
    pub facial_structure: FacialStructure,
    #[serde(with = "hex_bytes")]
    pub reserved: [u8; slot::RESERVED_LEN],
    pub body: BodyProportions,
    pub cosmetics: Cosmetics,
    pub eyepatch_color: Rgb,
    #[serde(with = "hex_bytes")]
    pub cosmetics_reserved: [u8; slot::COSMETICS_RESERVED_LEN],
    #[serde(with = "hex_bytes")]
    pub padding: [u8; slot::PADDING_LEN],
}

impl PresetRecord {
    /// A populated record with every field zeroed apart from the body type.
    pub fn blank(body_type: BodyType) -> Self {
        PresetRecord {
            header: [0; slot::HEADER_LEN],
            body_type,
            header_tail: [0; slot::HEADER_TAIL_LEN],
            models: Models::default(),
            facial_structure: FacialStructure::default(),
            reserved: [0; slot::RESERVED_LEN],
            body: BodyProportions::default(),
            cosmetics: Cosmetics::default(),
            eyepatch_color: Rgb::default(),
            cosmetics_reserved: [0; slot::COSMETICS_RESERVED_LEN],
            padding: [0; slot::PADDING_LEN],
        }
    }

    pub fn apparent_age(&self) -> u8 {
        self.facial_structure.0[0]
    }
}

/// Fixed-size byte arrays as lowercase hex strings.
mod hex_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(bytes: &[u8; N], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(d: D) -> Result<[u8; N], D::Error> {
        let text = String::deserialize(d)?;
        let mut out = [0u8; N];
        hex::decode_to_slice(text.trim(), &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}
