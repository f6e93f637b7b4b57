// Builders for synthetic save containers, used by tests and by anyone who
// wants to exercise the editor without a real game save.
use crate::checksum;
use crate::codec::encode;
use crate::error::Result;
use crate::layout::{PRESET_TABLE_SIZE, SaveLayout, TABLE_HEADER_SIZE, slot_table_range};
use crate::model::{BodyType, PresetRecord, Rgb, SlotNumber};

/// Same section sizes as the PC layout, but with the user-data section right
/// after a 0x40-byte container header so buffers stay small. It has no section
/// digest, so a slot write changes nothing but the slot.
pub const COMPACT_LAYOUT: SaveLayout = SaveLayout {
    name: "compact",
    container_magic: Some(b"BND4"),
    user_data_offset: 0x40,
    version_size: 4,
    identity_size: 8,
    settings_size: 0x140,
    checksum: None,
};

/// Bytes after the preset table in a built container.
pub const TRAILER_LEN: usize = 0x100;

/// A full container for `layout` with the given presets placed in their slots.
/// Bytes outside the slots carry a position-dependent filler so stray writes show up.
/// The container always reaches past the checksummed section, whose digest is valid.
pub fn build_save_bytes(layout: &SaveLayout, presets: &[(SlotNumber, &PresetRecord)]) -> Result<Vec<u8>> {
    let table = layout.preset_table_offset();
    let section_end = layout
        .checksum_ranges()
        .map_or(0, |(digest, section)| digest.end.max(section.end));
    let len = (layout.preset_table_end() + TRAILER_LEN).max(section_end);
    let mut data: Vec<u8> = (0..len)
        .map(|i| (i % 251) as u8 ^ 0x5A)
        .collect();
    if let Some(magic) = layout.container_magic {
        data[..magic.len()].copy_from_slice(magic);
    }
    let header = table..table + TABLE_HEADER_SIZE;
    data[header].copy_from_slice(&[0x02, 0x00, 0x0F, 0x00, 0x00, 0x18, 0x00, 0x00]);
    for n in SlotNumber::all() {
        let r = slot_table_range(n);
        data[table + r.start..table + r.end].fill(0);
    }
    for (n, record) in presets {
        let r = slot_table_range(*n);
        data[table + r.start..table + r.end].copy_from_slice(&encode(record)?);
    }
    checksum::refresh(layout, &mut data)?;
    debug_assert!(data.len() >= table + PRESET_TABLE_SIZE);
    Ok(data)
}

/// A populated record with recognisable values in every block, opaque ones included.
pub fn sample_record() -> PresetRecord {
    let mut p = PresetRecord::blank(BodyType::TypeA);
    p.header = [0x04, 0x00, 0x00, 0x00, 0x20];
    p.header_tail = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
    p.models.face = 12;
    p.models.hair = 5;
    p.models.eye = 1;
    p.models.eyebrow = 7;
    p.models.beard = 3;
    p.models.eyepatch = 0;
    p.models.decal = 2;
    p.models.eyelash = 4;
    for (i, v) in p.facial_structure.0.iter_mut().enumerate() {
        *v = (i as u8).wrapping_mul(3).wrapping_add(40);
    }
    for (i, v) in p.reserved.iter_mut().enumerate() {
        *v = 0xA0 ^ i as u8;
    }
    p.body.head = 128;
    p.body.chest = 140;
    p.body.abdomen = 110;
    p.body.arms = 150;
    p.body.legs = 135;
    p.cosmetics.skin.color = Rgb::new(205, 180, 165);
    p.cosmetics.skin.luster = 60;
    p.cosmetics.skin.pores = 20;
    p.cosmetics.skin.stubble = 5;
    p.cosmetics.lip_stick.intensity = 30;
    p.cosmetics.lip_stick.color = Rgb::new(150, 40, 50);
    p.cosmetics.tattoo_mark.flip = 1;
    p.cosmetics.right_eye.iris_color = Rgb::new(70, 90, 140);
    p.cosmetics.left_eye.iris_color = Rgb::new(70, 90, 141);
    p.cosmetics.hair.color = Rgb::new(45, 35, 30);
    p.cosmetics.hair.luster = 80;
    p.cosmetics.beard.color = Rgb::new(40, 30, 25);
    p.cosmetics.eyebrows.color = Rgb::new(50, 40, 35);
    p.cosmetics.eyelash_color = Rgb::new(20, 20, 20);
    p.eyepatch_color = Rgb::new(10, 11, 12);
    p.cosmetics_reserved = [0xEE; 18];
    p.padding = [0, 0, 0, 0, 0, 0, 0, 0, 0x13, 0x37];
    p
}
