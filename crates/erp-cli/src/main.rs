use clap::{Args as ClapArgs, Parser, Subcommand};
use erp_core::{ErrorKind, PresetError, PresetRecord, SaveManager, SlotSummary, WriteReport};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "erp",
    about = "List, export, import and copy Elden Ring character presets",
    version
)]
struct Cli {
    /// More log output (repeat for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List all 15 preset slots of a save file
    List(ListArgs),
    /// Show every field of one preset slot
    Info(InfoArgs),
    /// Export all populated slots to a JSON file
    Export(ExportArgs),
    /// Write a preset from an exported JSON file into a slot
    Import(ImportArgs),
    /// Copy a preset slot from one save file to another
    Copy(CopyArgs),
    /// Find save files below a directory
    Discover(DiscoverArgs),
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Save file (.sl2)
    save: PathBuf,
    /// Print JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct InfoArgs {
    /// Save file (.sl2)
    save: PathBuf,
    /// Slot number, 1-15
    #[arg(allow_negative_numbers = true)]
    slot: i64,
    /// Print JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct ExportArgs {
    /// Save file (.sl2)
    save: PathBuf,
    /// Output JSON path
    output: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct ImportArgs {
    /// JSON file produced by `export`
    input: PathBuf,
    /// Destination save file
    save: PathBuf,
    /// Destination slot, 1-15
    #[arg(allow_negative_numbers = true)]
    slot: i64,
    /// Which preset of the JSON file to import (1-based)
    #[arg(long, default_value_t = 1)]
    entry: usize,
}

#[derive(ClapArgs, Debug)]
struct CopyArgs {
    /// Source save file
    source: PathBuf,
    /// Source slot, 1-15
    #[arg(allow_negative_numbers = true)]
    source_slot: i64,
    /// Destination save file
    dest: PathBuf,
    /// Destination slot, 1-15
    #[arg(allow_negative_numbers = true)]
    dest_slot: i64,
}

#[derive(ClapArgs, Debug)]
struct DiscoverArgs {
    /// Directory to search (defaults to %APPDATA%/EldenRing)
    #[arg(env = "ERP_SAVE_DIR")]
    dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let res = match cli.cmd {
        Cmd::List(a) => cmd_list(a),
        Cmd::Info(a) => cmd_info(a),
        Cmd::Export(a) => cmd_export(a),
        Cmd::Import(a) => cmd_import(a),
        Cmd::Copy(a) => cmd_copy(a),
        Cmd::Discover(a) => cmd_discover(a),
    };
    if let Err(e) = res {
        eprintln!("error: {}", e);
        std::process::exit(exit_code(&e));
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(e: &PresetError) -> i32 {
    match e.kind() {
        ErrorKind::FileNotFound => 2,
        ErrorKind::Structure => 3,
        ErrorKind::InvalidSlot => 4,
        ErrorKind::EmptySlot => 5,
        ErrorKind::Decode | ErrorKind::SizeMismatch => 6,
        ErrorKind::Io | ErrorKind::Document => 1,
    }
}

fn cmd_list(args: ListArgs) -> Result<(), PresetError> {
    let slots = SaveManager::default().list(&args.save)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&slots)?);
        return Ok(());
    }
    let used = slots.iter().filter(|s| !s.empty).count();
    println!("Character Presets ({}/{} slots used):", used, slots.len());
    println!("{}", "=".repeat(60));
    for s in slots.iter().filter(|s| !s.empty) {
        print_summary(s);
    }
    if used == 0 {
        println!("No presets found in this save file");
    }
    Ok(())
}

fn print_summary(s: &SlotSummary) {
    println!("\nSlot {}:", s.slot);
    if let Some(b) = s.body_type {
        println!("  Body Type:    {}", b);
    }
    if let (Some(face), Some(hair)) = (s.face_model, s.hair_model) {
        println!("  Face Model:   {}", face);
        println!("  Hair Model:   {}", hair);
    }
    if let Some(age) = s.apparent_age {
        println!("  Apparent Age: {}", age);
    }
    if let Some(c) = s.skin_color {
        println!("  Skin Color:   {}", c);
    }
    if let Some(c) = s.hair_color {
        println!("  Hair Color:   {}", c);
    }
}

fn cmd_info(args: InfoArgs) -> Result<(), PresetError> {
    let record = SaveManager::default().info(&args.save, args.slot)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(args.slot, &record);
    }
    Ok(())
}

fn print_record(slot: i64, p: &PresetRecord) {
    println!("{}", "=".repeat(60));
    println!("PRESET SLOT {}", slot);
    println!("{}", "=".repeat(60));
    println!("Body Type: {}", p.body_type);

    let m = &p.models;
    println!("\nMODELS:");
    for (name, id) in [
        ("Face", m.face),
        ("Hair", m.hair),
        ("Eye", m.eye),
        ("Eyebrow", m.eyebrow),
        ("Beard", m.beard),
        ("Eye Patch", m.eyepatch),
        ("Decal", m.decal),
        ("Eyelash", m.eyelash),
    ] {
        println!("  {:<10} {}", name, id);
    }

    println!("\nFACIAL STRUCTURE:");
    for (name, v) in p.facial_structure.iter() {
        println!("  {:<24} {}", name, v);
    }

    let b = &p.body;
    println!("\nBODY PROPORTIONS:");
    println!("  Head:    {}", b.head);
    println!("  Chest:   {}", b.chest);
    println!("  Abdomen: {}", b.abdomen);
    println!("  Arms:    {}", b.arms);
    println!("  Legs:    {}", b.legs);

    let c = &p.cosmetics;
    println!("\nCOLORS:");
    println!("  Skin:      {}  luster {}  pores {}", c.skin.color, c.skin.luster, c.skin.pores);
    for (name, h) in [("Hair", &c.hair), ("Beard", &c.beard), ("Eyebrows", &c.eyebrows)] {
        println!(
            "  {:<10} {}  luster {}  root darkness {}  white hairs {}",
            format!("{}:", name),
            h.color,
            h.luster,
            h.root_darkness,
            h.white_hairs
        );
    }
    println!("  Eyelashes: {}", c.eyelash_color);
    println!("  Eye Patch: {}", p.eyepatch_color);
    for (name, e) in [("Right Eye", &c.right_eye), ("Left Eye", &c.left_eye)] {
        println!(
            "  {:<10} {}  iris size {}  clouding {} {}  white {}  position {}",
            format!("{}:", name),
            e.iris_color,
            e.iris_size,
            e.clouding,
            e.clouding_color,
            e.white_color,
            e.position
        );
    }

    println!("\nCOSMETICS:");
    println!("  Stubble: {}", c.skin.stubble);
    for (name, t) in [
        ("Dark Circles", &c.dark_circles),
        ("Cheeks", &c.cheeks),
        ("Eye Liner", &c.eye_liner),
        ("Eye Shadow (Lower)", &c.eye_shadow_lower),
        ("Eye Shadow (Upper)", &c.eye_shadow_upper),
        ("Lip Stick", &c.lip_stick),
        ("Body Hair", &c.body_hair),
    ] {
        if t.intensity > 0 {
            println!("  {:<20} {}  {}", name, t.intensity, t.color);
        } else {
            println!("  {:<20} {}", name, t.intensity);
        }
    }

    let t = &c.tattoo_mark;
    println!("\nTATTOO/MARK:");
    println!("  Position:  {} / {}", t.horizontal, t.vertical);
    println!("  Angle:     {}", t.angle);
    println!("  Expansion: {}", t.expansion);
    println!("  Color:     {}", t.color);
    println!("  Flip:      {}", t.flip);
}

fn cmd_export(args: ExportArgs) -> Result<(), PresetError> {
    let count = SaveManager::default().export(&args.save, &args.output)?;
    if count > 0 {
        println!("Exported {} preset(s) to {}", count, args.output.display());
    } else {
        println!("No active presets found to export");
    }
    Ok(())
}

fn cmd_import(args: ImportArgs) -> Result<(), PresetError> {
    let report = SaveManager::default().import_preset(&args.input, args.entry, &args.save, args.slot)?;
    print_write_report(&report);
    println!("Imported entry {} into slot {} of {}", args.entry, report.slot, report.path.display());
    Ok(())
}

fn print_write_report(report: &WriteReport) {
    if report.backup_created {
        println!("Backup: {}", report.backup.display());
    }
    if report.checksum_refreshed {
        println!("Section checksum updated");
    }
}

fn cmd_copy(args: CopyArgs) -> Result<(), PresetError> {
    let report = SaveManager::default().copy_slot(&args.source, args.source_slot, &args.dest, args.dest_slot)?;
    print_write_report(&report);
    println!(
        "Copied slot {} of {} to slot {} of {}",
        args.source_slot,
        args.source.display(),
        report.slot,
        report.path.display()
    );
    Ok(())
}

fn cmd_discover(args: DiscoverArgs) -> Result<(), PresetError> {
    let root = erp_core::saves::resolve_save_root(args.dir)?;
    let files = erp_core::saves::find_save_files(&root);
    if files.is_empty() {
        println!("No save files found under {}", root.display());
    }
    for f in files {
        println!("{}", f.display());
    }
    Ok(())
}
