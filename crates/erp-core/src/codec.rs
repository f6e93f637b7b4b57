//! Decoding and encoding of a single 0x130-byte preset slot.
//!
//! Decoding only validates what decides the shape of the result: the magic
//! tag (empty or not) and the body-type byte. Cosmetic values are carried
//! as-is, out-of-range or not.

use crate::error::{PresetError, Result};
use crate::layout::{PRESET_MAGIC, SLOT_SIZE, slot};
use crate::model::{
    BodyProportions, BodyType, Cosmetics, EyeColors, FacialStructure, HairColors, Models,
    PresetRecord, Rgb, Skin, TattooMark, Tint,
};
use crate::region::{Region, RegionError};

/// True when the slot does not carry the `FACE` magic (including all-zero slots).
pub fn is_empty_slot(slot_bytes: &[u8]) -> bool {
    slot_bytes.get(..PRESET_MAGIC.len()) != Some(&PRESET_MAGIC[..])
}

/// Decode one slot. `Ok(None)` means the slot is empty.
pub fn decode(slot_bytes: &[u8]) -> Result<Option<PresetRecord>> {
    if slot_bytes.len() != SLOT_SIZE {
        return Err(PresetError::SizeMismatch {
            expected: SLOT_SIZE,
            actual: slot_bytes.len(),
        });
    }
    let r = Region::whole(slot_bytes);
    if r.read_array::<4>(slot::MAGIC)? != PRESET_MAGIC {
        return Ok(None);
    }

    let raw_body = r.read_u8(slot::BODY_TYPE)?;
    let body_type = BodyType::from_byte(raw_body).ok_or_else(|| PresetError::Decode {
        offset: slot::BODY_TYPE,
        reason: format!("unknown body type {raw_body}"),
    })?;

    let m = r.sub(slot::MODELS, slot::MODEL_COUNT * 4)?;
    let models = Models {
        face: m.read_u32(0)?,
        hair: m.read_u32(4)?,
        eye: m.read_u32(8)?,
        eyebrow: m.read_u32(12)?,
        beard: m.read_u32(16)?,
        eyepatch: m.read_u32(20)?,
        decal: m.read_u32(24)?,
        eyelash: m.read_u32(28)?,
    };

    let b = r.read_array::<{ slot::BODY_PROPORTION_COUNT }>(slot::BODY_PROPORTIONS)?;
    let body = BodyProportions {
        head: b[0],
        chest: b[1],
        abdomen: b[2],
        arms: b[3],
        legs: b[4],
    };

    let mut cur = FieldReader::new(r.sub(slot::COSMETICS, slot::COSMETICS_LEN)?);
    let cosmetics = cur.cosmetics()?;
    let eyepatch_color = FieldReader::new(r.sub(slot::EYEPATCH_COLOR, 3)?).rgb()?;

    Ok(Some(PresetRecord {
        header: r.read_array(slot::HEADER)?,
        body_type,
        header_tail: r.read_array(slot::HEADER_TAIL)?,
        models,
        facial_structure: FacialStructure(r.read_array(slot::FACIAL_STRUCTURE)?),
        reserved: r.read_array(slot::RESERVED)?,
        body,
        cosmetics,
        eyepatch_color,
        cosmetics_reserved: r.read_array(slot::COSMETICS_RESERVED)?,
        padding: r.read_array(slot::PADDING)?,
    }))
}

/// Encode a record back into a full slot image.
pub fn encode(record: &PresetRecord) -> Result<[u8; SLOT_SIZE]> {
    let mut r = Region::whole([0u8; SLOT_SIZE]);
    r.write_bytes(slot::MAGIC, &PRESET_MAGIC)?;
    r.write_bytes(slot::HEADER, &record.header)?;
    r.write_u8(slot::BODY_TYPE, record.body_type.to_byte())?;
    r.write_bytes(slot::HEADER_TAIL, &record.header_tail)?;

    let m = &record.models;
    for (i, id) in [m.face, m.hair, m.eye, m.eyebrow, m.beard, m.eyepatch, m.decal, m.eyelash]
        .into_iter()
        .enumerate()
    {
        r.write_u32(slot::MODELS + i * 4, id)?;
    }

    r.write_bytes(slot::FACIAL_STRUCTURE, &record.facial_structure.0)?;
    r.write_bytes(slot::RESERVED, &record.reserved)?;
    let b = &record.body;
    r.write_bytes(slot::BODY_PROPORTIONS, &[b.head, b.chest, b.abdomen, b.arms, b.legs])?;

    let mut w = FieldWriter::with_capacity(slot::COSMETICS_LEN);
    w.cosmetics(&record.cosmetics);
    let block = w.finish(slot::COSMETICS_LEN)?;
    r.write_bytes(slot::COSMETICS, &block)?;

    let mut w = FieldWriter::with_capacity(3);
    w.rgb(record.eyepatch_color);
    r.write_bytes(slot::EYEPATCH_COLOR, &w.finish(3)?)?;

    r.write_bytes(slot::COSMETICS_RESERVED, &record.cosmetics_reserved)?;
    r.write_bytes(slot::PADDING, &record.padding)?;
    Ok(r.into_inner())
}

// Sequential reader over a sub-region; the cosmetics block is a packed run of
// bytes so walking it in order is clearer than spelling out 88 offsets.
struct FieldReader<'a> {
    region: Region<&'a [u8]>,
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(region: Region<&'a [u8]>) -> Self {
        Self { region, pos: 0 }
    }

    fn u8(&mut self) -> Result<u8, RegionError> {
        let v = self.region.read_u8(self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    fn rgb(&mut self) -> Result<Rgb, RegionError> {
        Ok(Rgb::new(self.u8()?, self.u8()?, self.u8()?))
    }

    fn tint(&mut self) -> Result<Tint, RegionError> {
        Ok(Tint {
            intensity: self.u8()?,
            color: self.rgb()?,
        })
    }

    fn eye(&mut self) -> Result<EyeColors, RegionError> {
        Ok(EyeColors {
            iris_color: self.rgb()?,
            iris_size: self.u8()?,
            clouding: self.u8()?,
            clouding_color: self.rgb()?,
            white_color: self.rgb()?,
            position: self.u8()?,
        })
    }

    fn hair(&mut self) -> Result<HairColors, RegionError> {
        Ok(HairColors {
            color: self.rgb()?,
            luster: self.u8()?,
            root_darkness: self.u8()?,
            white_hairs: self.u8()?,
        })
    }

    fn cosmetics(&mut self) -> Result<Cosmetics, RegionError> {
        Ok(Cosmetics {
            skin: Skin {
                color: self.rgb()?,
                luster: self.u8()?,
                pores: self.u8()?,
                stubble: self.u8()?,
            },
            dark_circles: self.tint()?,
            cheeks: self.tint()?,
            eye_liner: self.tint()?,
            eye_shadow_lower: self.tint()?,
            eye_shadow_upper: self.tint()?,
            lip_stick: self.tint()?,
            tattoo_mark: TattooMark {
                horizontal: self.u8()?,
                vertical: self.u8()?,
                angle: self.u8()?,
                expansion: self.u8()?,
                color: self.rgb()?,
                reserved: self.u8()?,
                flip: self.u8()?,
            },
            body_hair: self.tint()?,
            right_eye: self.eye()?,
            left_eye: self.eye()?,
            hair: self.hair()?,
            beard: self.hair()?,
            eyebrows: self.hair()?,
            eyelash_color: self.rgb()?,
        })
    }
}

struct FieldWriter {
    out: Vec<u8>,
}

impl FieldWriter {
    fn with_capacity(n: usize) -> Self {
        Self {
            out: Vec::with_capacity(n),
        }
    }

    fn u8(&mut self, v: u8) {
        self.out.push(v);
    }

    fn rgb(&mut self, c: Rgb) {
        self.out.extend_from_slice(&[c.r, c.g, c.b]);
    }

    fn tint(&mut self, t: &Tint) {
        self.u8(t.intensity);
        self.rgb(t.color);
    }

    fn eye(&mut self, e: &EyeColors) {
        self.rgb(e.iris_color);
        self.u8(e.iris_size);
        self.u8(e.clouding);
        self.rgb(e.clouding_color);
        self.rgb(e.white_color);
        self.u8(e.position);
    }

    fn hair(&mut self, h: &HairColors) {
        self.rgb(h.color);
        self.u8(h.luster);
        self.u8(h.root_darkness);
        self.u8(h.white_hairs);
    }

    fn cosmetics(&mut self, c: &Cosmetics) {
        self.rgb(c.skin.color);
        self.u8(c.skin.luster);
        self.u8(c.skin.pores);
        self.u8(c.skin.stubble);
        for t in [
            &c.dark_circles,
            &c.cheeks,
            &c.eye_liner,
            &c.eye_shadow_lower,
            &c.eye_shadow_upper,
            &c.lip_stick,
        ] {
            self.tint(t);
        }
        let m = &c.tattoo_mark;
        self.out
            .extend_from_slice(&[m.horizontal, m.vertical, m.angle, m.expansion]);
        self.rgb(m.color);
        self.u8(m.reserved);
        self.u8(m.flip);
        self.tint(&c.body_hair);
        self.eye(&c.right_eye);
        self.eye(&c.left_eye);
        self.hair(&c.hair);
        self.hair(&c.beard);
        self.hair(&c.eyebrows);
        self.rgb(c.eyelash_color);
    }

    fn finish(self, expected: usize) -> Result<Vec<u8>> {
        if self.out.len() != expected {
            return Err(PresetError::SizeMismatch {
                expected,
                actual: self.out.len(),
            });
        }
        Ok(self.out)
    }
}
