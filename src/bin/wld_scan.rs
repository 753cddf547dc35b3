use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

use wld_scanner::scan::{display_name, resolve_tile, scan_paths, DetectionReport, DEFAULT_TARGET};
use wld_scanner::world::{Block, TileRecord, WorldEncoder, WorldSpec};
use wld_scanner::{TileCensus, TileScanner, WorldFile};

#[derive(Parser)]
#[command(name = "wld-scan")]
#[command(about = "Inspect world saves and search them for a tile type")]
struct Cli {
    /// Log decoder progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search worlds for a tile type. Exits 0 if any world matched, 1 if
    /// none did, 2 if a world failed to decode.
    Scan {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Tile id or known name
        #[arg(long, default_value_t = DEFAULT_TARGET.to_string())]
        tile: String,
        #[arg(long, default_value_t = 1)]
        min_count: u64,
        /// List every matching coordinate
        #[arg(long)]
        all_matches: bool,
        #[arg(long)]
        json: bool,
    },
    /// Count blocks of every tile type.
    Census {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the decoded header.
    Info {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write a small synthetic world of air with optional target blocks.
    Synth {
        out: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Place a target block at X,Y (repeatable)
        #[arg(long, value_parser = parse_point)]
        plant: Vec<(u32, u32)>,
        #[arg(long, default_value_t = DEFAULT_TARGET.to_string())]
        tile: String,
    },
}

fn parse_point(s: &str) -> Result<(u32, u32), String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad X in {s:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y in {s:?}: {e}"))?;
    Ok((x, y))
}

fn parse_tile(input: &str) -> Result<u16, Box<dyn std::error::Error>> {
    resolve_tile(input).ok_or_else(|| format!("unknown tile {input:?}").into())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Scan { paths, tile, min_count, all_matches, json } => {
            run_scan(&paths, &tile, min_count, all_matches, json)
        }
        Commands::Census { path, json } => run_census(&path, json).map(|()| ExitCode::SUCCESS),
        Commands::Info { path, json } => run_info(&path, json).map(|()| ExitCode::SUCCESS),
        Commands::Synth { out, width, height, plant, tile } => {
            run_synth(&out, width, height, &plant, &tile).map(|()| ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run_scan(
    paths: &[PathBuf],
    tile: &str,
    min_count: u64,
    all_matches: bool,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let target = parse_tile(tile)?;
    let scanner = TileScanner::new(target)
        .collect_matches(all_matches)
        .min_matches(min_count);
    debug!(target, files = paths.len(), "scanning");

    let mut reports = Vec::new();
    let mut failed = false;
    for (path, result) in scan_paths(paths, &scanner) {
        match result {
            Ok(result) => {
                let report = DetectionReport::new(result);
                reports.push(if paths.len() > 1 { report.with_path(&path) } else { report });
            }
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                failed = true;
            }
        }
    }

    if let Some(out) = render_scan(&reports, paths.len() > 1, json)? {
        println!("{out}");
    }

    Ok(if failed {
        ExitCode::from(2)
    } else if reports.iter().any(|r| r.found) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Text or JSON for the successful reports. A single path renders its report
/// alone, or nothing when it failed. Several paths render a JSON array.
fn render_scan(
    reports: &[DetectionReport],
    many: bool,
    json: bool,
) -> serde_json::Result<Option<String>> {
    if json && many {
        return serde_json::to_string_pretty(reports).map(Some);
    }
    if reports.is_empty() {
        return Ok(None);
    }
    if json {
        return reports[0].to_json().map(Some);
    }
    let texts: Vec<String> = reports.iter().map(DetectionReport::render_text).collect();
    Ok(Some(texts.join("\n\n")))
}

fn run_census(path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let file = WorldFile::open(path)?;
    let reader = file.reader()?;
    let census = TileCensus::from_stream(reader.tiles()?)?;

    if json {
        let rows: Vec<_> = census
            .iter()
            .map(|(id, count)| serde_json::json!({ "id": id, "name": display_name(id), "count": count }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{}: {} cells, {} blocks, {} tile types",
        reader.header().name(),
        census.cells(),
        census.blocks(),
        census.distinct()
    );
    for (id, count) in census.iter() {
        println!("{id:>5}  {count:>10}  {}", display_name(id));
    }
    Ok(())
}

fn run_info(path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let file = WorldFile::open(path)?;
    let reader = file.reader()?;
    let header = reader.header();

    if json {
        let out = serde_json::json!({ "header": header, "profile": reader.profile() });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let props = &header.properties;
    println!("Name:       {}", props.name);
    println!("Version:    {}", header.version);
    if let Some(meta) = &header.metadata {
        println!("Revision:   {}", meta.revision);
    }
    if let Some(seed) = &props.seed {
        println!("Seed:       {seed}");
    }
    println!("World id:   {}", props.world_id);
    println!("Size:       {} x {}", props.width, props.height);
    println!("Sections:   {}", header.sections.len());
    println!("Tile types: {}", reader.frames().len());
    println!(
        "Profile:    {}-byte tile ids, {}-byte wall ids, {} extension bytes",
        reader.profile().tile_id_width.bytes(),
        reader.profile().wall_id_width.bytes(),
        reader.profile().max_extension_bytes
    );
    Ok(())
}

fn run_synth(
    out: &Path,
    width: u32,
    height: u32,
    plant: &[(u32, u32)],
    tile: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = parse_tile(tile)?;
    if width == 0 || height == 0 {
        return Err("width and height must be at least 1".into());
    }
    let mut encoder = WorldEncoder::new(WorldSpec::new(width, height));
    let mut block = Block::new(target);
    if encoder.frames().is_frame_important(target) {
        block = block.with_frame(0, 0);
    }

    for &(x, y) in plant {
        if x >= width || y >= height {
            return Err(format!("plant point {x},{y} is outside a {width}x{height} world").into());
        }
        encoder.set(x, y, TileRecord::with_block(block));
    }

    let data = encoder.finish()?;
    std::fs::write(out, &data)?;
    eprintln!("Wrote {} ({} bytes, {} {} blocks)", out.display(), data.len(), plant.len(), display_name(target));
    Ok(())
}
