use std::path::Path;

use erp_core::checksum;
use erp_core::fixture::{COMPACT_LAYOUT, TRAILER_LEN, build_save_bytes, sample_record};
use erp_core::layout::{
    PRESET_TABLE_SIZE, SLOT_COUNT, SLOT_SIZE, TABLE_HEADER_SIZE, TABLE_PADDING_SIZE, slot_range,
    slot_table_range, table_header_range, table_padding_range,
};
use erp_core::{
    BodyType, ErrorKind, ExportDocument, PresetError, PresetRecord, Rgb, SaveBuffer, SaveLayout,
    SaveManager, SlotNumber, backup_path, decode, encode, locate,
};
use tempfile::tempdir;

fn slot(n: i64) -> SlotNumber {
    SlotNumber::new(n).unwrap()
}

fn manager() -> SaveManager {
    SaveManager::new(COMPACT_LAYOUT)
}

fn write_save(path: &Path, presets: &[(SlotNumber, &PresetRecord)]) -> Vec<u8> {
    let bytes = build_save_bytes(&COMPACT_LAYOUT, presets).unwrap();
    std::fs::write(path, &bytes).unwrap();
    bytes
}

#[test]
fn round_trip_reproduces_slot_bytes() {
    let bytes = encode(&sample_record()).unwrap();
    assert_eq!(&bytes[..4], b"FACE");
    let decoded = decode(&bytes).unwrap().expect("populated");
    assert_eq!(decoded, sample_record());
    assert_eq!(encode(&decoded).unwrap(), bytes);

    // Arbitrary content everywhere except the magic and body-type byte.
    let mut raw = [0u8; SLOT_SIZE];
    for (i, b) in raw.iter_mut().enumerate() {
        *b = (i as u8).wrapping_mul(37).wrapping_add(11);
    }
    raw[..4].copy_from_slice(b"FACE");
    raw[9] = 1;
    let decoded = decode(&raw).unwrap().expect("populated");
    assert_eq!(decoded.body_type, BodyType::TypeB);
    assert_eq!(encode(&decoded).unwrap(), raw);
}

#[test]
fn decodes_known_offsets() {
    let mut raw = [0u8; SLOT_SIZE];
    raw[..4].copy_from_slice(b"FACE");
    raw[0x10..0x14].copy_from_slice(&12u32.to_le_bytes());
    raw[0x14..0x18].copy_from_slice(&5u32.to_le_bytes());
    raw[0x30] = 33;
    raw[0xB4] = 200;
    raw[0xB9..0xBC].copy_from_slice(&[205, 180, 165]);
    raw[0xB9 + 67..0xB9 + 70].copy_from_slice(&[45, 35, 30]);
    raw[0x111..0x114].copy_from_slice(&[1, 2, 3]);
    raw[0x12F] = 0x99;
    let p = decode(&raw).unwrap().unwrap();
    assert_eq!(p.body_type, BodyType::TypeA);
    assert_eq!(p.models.face, 12);
    assert_eq!(p.models.hair, 5);
    assert_eq!(p.apparent_age(), 33);
    assert_eq!(p.facial_structure.get("apparent_age"), Some(33));
    assert_eq!(p.body.head, 200);
    assert_eq!(p.cosmetics.skin.color, Rgb::new(205, 180, 165));
    assert_eq!(p.cosmetics.hair.color, Rgb::new(45, 35, 30));
    assert_eq!(p.eyepatch_color, Rgb::new(1, 2, 3));
    assert_eq!(p.padding[9], 0x99);
}

#[test]
fn empty_slots_decode_to_none() {
    assert_eq!(decode(&[0u8; SLOT_SIZE]).unwrap(), None);

    let mut junk = encode(&sample_record()).unwrap();
    junk[..4].copy_from_slice(b"FACF");
    junk[9] = 0x7F; // would be a bad body type if the slot were populated
    assert_eq!(decode(&junk).unwrap(), None);
    assert!(erp_core::is_empty_slot(&junk));
}

#[test]
fn unknown_body_type_is_a_decode_error() {
    let mut raw = encode(&sample_record()).unwrap();
    raw[9] = 2;
    let err = decode(&raw).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(matches!(err, PresetError::Decode { offset: 9, .. }));
}

#[test]
fn decode_rejects_wrong_length() {
    let err = decode(&[0u8; SLOT_SIZE - 1]).unwrap_err();
    assert!(matches!(
        err,
        PresetError::SizeMismatch {
            expected: SLOT_SIZE,
            actual
        } if actual == SLOT_SIZE - 1
    ));
}

#[test]
fn exported_json_keeps_opaque_blocks() {
    let p = sample_record();
    let text = serde_json::to_string(&p).unwrap();
    assert!(text.contains("\"apparent_age\""));
    let back: PresetRecord = serde_json::from_str(&text).unwrap();
    assert_eq!(back, p);
    assert_eq!(encode(&back).unwrap(), encode(&p).unwrap());
}

#[test]
fn slot_ranges_tile_the_table() {
    let mut covered = vec![0u8; PRESET_TABLE_SIZE];
    for r in [table_header_range(), table_padding_range()] {
        for b in &mut covered[r] {
            *b += 1;
        }
    }
    assert_eq!(SlotNumber::all().count(), SLOT_COUNT);
    for n in SlotNumber::all() {
        let rel = slot_range(n);
        assert_eq!(rel.start, (n.get() as usize - 1) * 0x130);
        assert_eq!(rel.end - rel.start, 0x130);
        let abs = slot_table_range(n);
        assert_eq!(abs.start, rel.start + TABLE_HEADER_SIZE);
        for b in &mut covered[abs] {
            *b += 1;
        }
    }
    assert!(covered.iter().all(|c| *c == 1));
    assert_eq!(TABLE_PADDING_SIZE, 0x628);
}

#[test]
fn slot_number_bounds() {
    for bad in [0, 16, -1] {
        let err = SlotNumber::new(bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSlot);
    }
    assert_eq!(slot(1).get(), 1);
    assert_eq!(slot(15).get(), 15);
    assert_eq!(SlotNumber::all().count(), 15);
}

#[test]
fn read_and_write_slot_validate_slot_number() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let r = sample_record();
    let original = write_save(&p, &[(slot(1), &r), (slot(15), &r)]);
    let buf = SaveBuffer::from_bytes(original.clone());
    let mut m = manager();

    for bad in [0, 16, -1] {
        assert!(matches!(m.read_slot(&buf, bad), Err(PresetError::InvalidSlot { .. })));
        let err = m.write_slot(&p, bad, &[0u8; SLOT_SIZE]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSlot);
    }
    assert_eq!(m.read_slot(&buf, 1).unwrap(), encode(&r).unwrap());
    assert_eq!(m.read_slot(&buf, 15).unwrap(), encode(&r).unwrap());

    // Nothing was written and no backup was made by the rejected calls.
    assert_eq!(std::fs::read(&p).unwrap(), original);
    assert!(!backup_path(&p).exists());

    m.write_slot(&p, 15, &[0u8; SLOT_SIZE]).unwrap();
    m.write_slot(&p, 1, &[0u8; SLOT_SIZE]).unwrap();
}

#[test]
fn write_slot_rejects_wrong_size() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let original = write_save(&p, &[]);
    let err = manager().write_slot(&p, 3, &[0u8; 100]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);
    assert_eq!(std::fs::read(&p).unwrap(), original);
    assert!(!backup_path(&p).exists());
}

#[test]
fn write_slot_only_touches_its_range() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let original = write_save(&p, &[]);
    let new = encode(&sample_record()).unwrap();
    let report = manager().write_slot(&p, 7, &new).unwrap();
    assert!(report.backup_created);
    assert_eq!(report.slot, slot(7));

    let after = std::fs::read(&p).unwrap();
    assert_eq!(after.len(), original.len());
    let start = COMPACT_LAYOUT.preset_table_offset() + slot_table_range(slot(7)).start;
    for (i, (a, b)) in original.iter().zip(after.iter()).enumerate() {
        if (start..start + SLOT_SIZE).contains(&i) {
            assert_eq!(*b, new[i - start]);
        } else {
            assert_eq!(a, b, "byte {i:#x} changed");
        }
    }
    assert_eq!(std::fs::read(backup_path(&p)).unwrap(), original);
}

#[test]
fn backup_is_made_once_per_session() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let original = write_save(&p, &[]);
    let stale = b"an old backup".to_vec();
    std::fs::write(backup_path(&p), &stale).unwrap();

    let new = encode(&sample_record()).unwrap();
    let mut m = manager();
    assert!(m.write_slot(&p, 1, &new).unwrap().backup_created);
    assert!(!m.write_slot(&p, 2, &new).unwrap().backup_created);
    // The backup still holds the bytes from before the first write.
    assert_eq!(std::fs::read(backup_path(&p)).unwrap(), original);

    // A new session backs up the current state again.
    let before_second = std::fs::read(&p).unwrap();
    assert!(manager().write_slot(&p, 3, &new).unwrap().backup_created);
    assert_eq!(std::fs::read(backup_path(&p)).unwrap(), before_second);
}

#[test]
fn copy_preserves_content_and_backs_up() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src.sl2");
    let dst = dir.path().join("dst.sl2");
    let r = sample_record();
    assert_eq!(r.body_type, BodyType::TypeA);
    assert_eq!(r.models.face, 12);
    assert_eq!(r.models.hair, 5);
    write_save(&src, &[(slot(1), &r)]);
    let dst_before = write_save(&dst, &[(slot(4), &r)]);

    let report = manager().copy_slot(&src, 1, &dst, 2).unwrap();
    assert_eq!(report.backup, backup_path(&dst));

    let m = manager();
    let buf = m.load(&dst).unwrap();
    let copied = m.decode_slot(&buf, 2).unwrap().expect("populated");
    assert_eq!(copied, r);
    assert_eq!(copied.cosmetics.skin.color, Rgb::new(205, 180, 165));
    assert_eq!(copied.cosmetics.hair.color, Rgb::new(45, 35, 30));
    assert_eq!(std::fs::read(backup_path(&dst)).unwrap(), dst_before);
    assert!(!backup_path(&src).exists());
}

#[test]
fn copy_onto_itself_still_writes() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let original = write_save(&p, &[(slot(5), &sample_record())]);
    let report = manager().copy_slot(&p, 5, &p, 5).unwrap();
    assert!(report.backup_created);
    assert_eq!(std::fs::read(&p).unwrap(), original);
    assert_eq!(std::fs::read(backup_path(&p)).unwrap(), original);
}

#[test]
fn copy_from_empty_slot_is_rejected() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src.sl2");
    let dst = dir.path().join("dst.sl2");
    write_save(&src, &[(slot(1), &sample_record())]);
    let dst_before = write_save(&dst, &[]);

    let err = manager().copy_slot(&src, 2, &dst, 1).unwrap_err();
    assert!(matches!(err, PresetError::EmptySlot { slot: 2 }));
    assert_eq!(err.kind(), ErrorKind::EmptySlot);
    assert_eq!(std::fs::read(&dst).unwrap(), dst_before);
    assert!(!backup_path(&dst).exists());

    let err = manager().copy_slot(&src, 1, &dst, 16).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSlot);
    assert!(!backup_path(&dst).exists());
}

#[test]
fn missing_file_is_reported_as_not_found() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.sl2");
    let err = manager().list(&missing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
    let err = manager().copy_slot(&missing, 1, &missing, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
}

#[test]
fn export_all_is_ordered_and_complete() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let r = sample_record();
    write_save(&p, &[(slot(9), &r), (slot(1), &r), (slot(4), &r)]);

    let m = manager();
    let buf = m.load(&p).unwrap();
    let entries: Vec<_> = m
        .presets(&buf)
        .unwrap()
        .map(|(n, d)| (n.get(), d.unwrap().is_some()))
        .collect();
    assert_eq!(entries.len(), 15);
    let used: Vec<u8> = entries.iter().filter(|(_, full)| *full).map(|(n, _)| *n).collect();
    assert_eq!(used, vec![1, 4, 9]);
    assert_eq!(entries.iter().filter(|(_, full)| !*full).count(), 12);
    assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));

    // Restartable: a second walk yields the same sequence.
    let again: Vec<_> = m
        .presets(&buf)
        .unwrap()
        .map(|(n, d)| (n.get(), d.unwrap().is_some()))
        .collect();
    assert_eq!(again, entries);
}

#[test]
fn list_and_info_report_slots() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let r = sample_record();
    let original = write_save(&p, &[(slot(3), &r)]);
    let m = manager();

    let slots = m.list(&p).unwrap();
    assert_eq!(slots.len(), 15);
    let third = &slots[2];
    assert!(!third.empty);
    assert_eq!(third.body_type, Some(BodyType::TypeA));
    assert_eq!(third.face_model, Some(12));
    assert_eq!(third.hair_color, Some(Rgb::new(45, 35, 30)));
    assert!(slots[0].empty && slots[0].body_type.is_none());

    assert_eq!(m.info(&p, 3).unwrap(), r);
    assert_eq!(m.info(&p, 4).unwrap_err().kind(), ErrorKind::EmptySlot);
    assert_eq!(m.info(&p, 0).unwrap_err().kind(), ErrorKind::InvalidSlot);

    // Read-only operations leave the file alone.
    assert_eq!(std::fs::read(&p).unwrap(), original);
    assert!(!backup_path(&p).exists());
}

#[test]
fn export_then_import_into_another_save() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src.sl2");
    let dst = dir.path().join("dst.sl2");
    let out = dir.path().join("presets.json");
    let mut other = sample_record();
    other.body_type = BodyType::TypeB;
    other.models.face = 99;
    write_save(&src, &[(slot(2), &sample_record()), (slot(11), &other)]);
    write_save(&dst, &[]);

    let count = manager().export(&src, &out).unwrap();
    assert_eq!(count, 2);
    let doc = ExportDocument::read(&out).unwrap();
    assert_eq!(doc.presets.keys().copied().collect::<Vec<_>>(), vec![slot(2), slot(11)]);
    assert_eq!(doc.presets[&slot(11)], other);
    assert!(doc.exported_at.is_some());

    // Presets are keyed by slot number in the file itself.
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let keyed = raw["presets"].as_object().unwrap();
    assert_eq!(keyed.len(), 2);
    assert!(keyed.contains_key("2") && keyed.contains_key("11"));

    let mut m = manager();
    m.import_preset(&out, 2, &dst, 6).unwrap();
    let buf = m.load(&dst).unwrap();
    assert_eq!(m.decode_slot(&buf, 6).unwrap(), Some(other));

    let err = m.import_preset(&out, 3, &dst, 6).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Document);
    let err = m.import_preset(&out, 0, &dst, 6).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Document);
}

#[test]
fn truncated_buffer_is_a_structure_error() {
    let full = build_save_bytes(&COMPACT_LAYOUT, &[(slot(1), &sample_record())]).unwrap();
    let end = COMPACT_LAYOUT.preset_table_end();
    assert_eq!(full.len(), end + TRAILER_LEN);
    assert!(locate(&full[..end], &COMPACT_LAYOUT).is_ok());

    let short = SaveBuffer::from_bytes(full[..end - 1].to_vec());
    let m = manager();
    assert_eq!(m.locate(&short).unwrap_err().kind(), ErrorKind::Structure);
    assert_eq!(m.read_slot(&short, 1).unwrap_err().kind(), ErrorKind::Structure);
    assert_eq!(m.presets(&short).err().map(|e| e.kind()), Some(ErrorKind::Structure));
}

#[test]
fn locator_rejects_foreign_data() {
    let mut data = build_save_bytes(&COMPACT_LAYOUT, &[]).unwrap();
    // All-blank table is fine.
    assert!(locate(&data, &COMPACT_LAYOUT).is_ok());

    let table = COMPACT_LAYOUT.preset_table_offset();
    let r = slot_table_range(slot(3));
    data[table + r.start..table + r.start + 4].copy_from_slice(b"JUNK");
    assert_eq!(
        locate(&data, &COMPACT_LAYOUT).unwrap_err().kind(),
        ErrorKind::Structure
    );

    let r = slot_table_range(slot(8));
    data[table + r.start..table + r.start + 4].copy_from_slice(b"FACE");
    assert!(locate(&data, &COMPACT_LAYOUT).is_ok());

    data[..4].copy_from_slice(b"XXXX");
    assert_eq!(
        locate(&data, &COMPACT_LAYOUT).unwrap_err().kind(),
        ErrorKind::Structure
    );
}

#[test]
fn pc_layout_offsets() {
    let pc = SaveLayout::PC;
    assert_eq!(pc.preset_table_offset(), 0x19004FC);
    assert_eq!(pc.preset_table_end(), 0x19004FC + 0x1800);

    let data = build_save_bytes(&pc, &[(slot(15), &sample_record())]).unwrap();
    let table = locate(&data, &pc).unwrap();
    assert_eq!(table.start(), 0x19004FC);
    assert_eq!(table.slot_range(slot(1)).start, 0x19004FC + 8);
    let buf = SaveBuffer::from_bytes(data);
    let m = SaveManager::default();
    assert_eq!(m.decode_slot(&buf, 15).unwrap(), Some(sample_record()));
}

#[test]
fn discovers_save_files() {
    let dir = tempdir().unwrap();
    let acct = dir.path().join("76561197960521364");
    std::fs::create_dir_all(&acct).unwrap();
    std::fs::write(acct.join("ER0000.sl2"), b"x").unwrap();
    std::fs::write(acct.join("ER0000.sl2.backup"), b"x").unwrap();
    std::fs::write(acct.join("notes.txt"), b"x").unwrap();
    let found = erp_core::saves::find_save_files(dir.path());
    assert_eq!(found, vec![acct.join("ER0000.sl2")]);
}

#[test]
fn export_rejects_out_of_range_slot_keys() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src.sl2");
    let out = dir.path().join("presets.json");
    write_save(&src, &[(slot(3), &sample_record())]);
    manager().export(&src, &out).unwrap();

    let mut raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let presets = raw["presets"].as_object_mut().unwrap();
    let p = presets.remove("3").unwrap();
    presets.insert("16".to_string(), p);
    std::fs::write(&out, serde_json::to_string(&raw).unwrap()).unwrap();

    assert_eq!(ExportDocument::read(&out).unwrap_err().kind(), ErrorKind::Document);
}

#[test]
fn pc_copy_keeps_section_checksum_valid() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src.sl2");
    let dst = dir.path().join("dst.sl2");
    let pc = SaveLayout::PC;
    let mut other = sample_record();
    other.models.hair = 31;
    std::fs::write(&src, build_save_bytes(&pc, &[(slot(1), &other)]).unwrap()).unwrap();
    let original = build_save_bytes(&pc, &[(slot(4), &sample_record())]).unwrap();
    std::fs::write(&dst, &original).unwrap();
    assert!(checksum::is_valid(&pc, &original).unwrap());

    let report = SaveManager::default().copy_slot(&src, 1, &dst, 2).unwrap();
    assert!(report.checksum_refreshed);

    let after = std::fs::read(&dst).unwrap();
    assert!(checksum::is_valid(&pc, &after).unwrap());
    assert_ne!(after[0x19003A0..0x19003B0], original[0x19003A0..0x19003B0]);

    // Only the slot and the digest changed.
    let table = locate(&after, &pc).unwrap();
    let slot_bytes = table.slot_range(slot(2));
    let digest = 0x19003A0..0x19003B0;
    assert_eq!(after.len(), original.len());
    let stray = original
        .iter()
        .zip(after.iter())
        .enumerate()
        .find(|(i, (a, b))| a != b && !slot_bytes.contains(i) && !digest.contains(i));
    assert_eq!(stray, None);

    let buf = SaveBuffer::from_bytes(after);
    assert_eq!(SaveManager::default().decode_slot(&buf, 2).unwrap(), Some(other));
    assert_eq!(std::fs::read(backup_path(&dst)).unwrap(), original);
}

#[test]
fn pc_write_to_short_file_is_a_structure_error() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let mut data = build_save_bytes(&SaveLayout::PC, &[]).unwrap();
    data.truncate(0x1910000);
    std::fs::write(&p, &data).unwrap();

    let err = SaveManager::default()
        .write_slot(&p, 1, &encode(&sample_record()).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structure);
    assert_eq!(std::fs::read(&p).unwrap(), data);
    assert!(!backup_path(&p).exists());
}

#[test]
fn failed_write_back_keeps_original_and_backup() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let original = write_save(&p, &[(slot(1), &sample_record())]);
    // A directory where the temp file should go makes the final write fail.
    let tmp = dir.path().join("ER0000.sl2.tmp");
    std::fs::create_dir(&tmp).unwrap();

    let err = manager()
        .write_slot(&p, 5, &encode(&sample_record()).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(std::fs::read(&p).unwrap(), original);
    assert_eq!(std::fs::read(backup_path(&p)).unwrap(), original);
    assert!(tmp.is_dir());
}

#[test]
fn existing_temp_file_is_not_overwritten() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    let original = write_save(&p, &[]);
    let tmp = dir.path().join("ER0000.sl2.tmp");
    std::fs::write(&tmp, b"not ours").unwrap();

    let err = manager()
        .write_slot(&p, 2, &encode(&sample_record()).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(std::fs::read(&tmp).unwrap(), b"not ours");
    assert_eq!(std::fs::read(&p).unwrap(), original);
}

#[test]
fn successful_write_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("ER0000.sl2");
    write_save(&p, &[]);
    let report = manager().write_slot(&p, 9, &encode(&sample_record()).unwrap()).unwrap();
    assert!(!report.checksum_refreshed);
    assert!(!dir.path().join("ER0000.sl2.tmp").exists());
}
