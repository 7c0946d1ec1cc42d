//! CLI binary for drawtile.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! [`TilingConfig`] and writes fragment artifacts to disk.

use anyhow::{bail, Context, Result};
use clap::Parser;
use drawtile::{
    document_from_image, FragmentRecord, NormalizeLimits, TileLayout, TilingConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Tile one scan into the default 2x2 grid
  drawtile sheet.png

  # A 5x4 grid with 10% overlap, keep blank tiles too
  drawtile --grid 5x4 --overlap 0.1 --threshold 0 sheet.png

  # Fixed 1024px tiles across a whole batch, with overlay previews
  drawtile --tile-size 1024x1024 --visualize -o out/ scans/*.jpg

OUTPUT LAYOUT (per input file):
  <out-dir>/<stem>/fragment-001.jpg     one JPEG per surviving tile
  <out-dir>/<stem>/manifest.json        index, file name, [x1,y1,x2,y2] bbox
  <out-dir>/<stem>/overlay.jpg          fragment boxes drawn on the page
                                        (only with --visualize)

A corrupt or unreadable input is logged and skipped; the rest of the batch
still runs. The command fails only when no input produced any output.

ENVIRONMENT VARIABLES:
  DRAWTILE_OUT_DIR      Default output directory
  DRAWTILE_OVERLAP      Default overlap ratio
  DRAWTILE_THRESHOLD    Default complexity threshold
"#;

/// Fragment scanned engineering drawings into overlapping tiles.
#[derive(Parser, Debug)]
#[command(
    name = "drawtile",
    version,
    about = "Fragment scanned engineering drawings into overlapping tiles",
    long_about = "Cut scanned drawings (P&ID sheets, plans, large raster scans) into \
overlapping rectangular fragments sized for vision-model consumption. Each fragment is \
emitted as a JPEG alongside a manifest tracing it back onto the page.",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input raster scans (.jpg, .jpeg, .png).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory to write fragment artifacts into.
    #[arg(short, long, env = "DRAWTILE_OUT_DIR", default_value = "fragments")]
    out_dir: PathBuf,

    /// Grid layout as COLUMNSxROWS (e.g. 5x4). Mutually exclusive with --tile-size.
    #[arg(long, value_parser = parse_pair, conflicts_with = "tile_size")]
    grid: Option<(u32, u32)>,

    /// Fixed tile size as WIDTHxHEIGHT pixels (e.g. 1024x1024).
    #[arg(long, value_parser = parse_pair)]
    tile_size: Option<(u32, u32)>,

    /// Overlap between adjacent tiles as a fraction of tile size [0, 1).
    #[arg(long, env = "DRAWTILE_OVERLAP", default_value_t = drawtile::DEFAULT_OVERLAP_RATIO)]
    overlap: f32,

    /// Minimum visual-complexity score a tile must reach; 0 keeps everything.
    #[arg(long, env = "DRAWTILE_THRESHOLD", default_value_t = drawtile::DEFAULT_COMPLEXITY_THRESHOLD)]
    threshold: f32,

    /// Maximum page width after normalization, in pixels.
    #[arg(long, default_value_t = 2048)]
    max_width: u32,

    /// Maximum page height after normalization, in pixels.
    #[arg(long, default_value_t = 2048)]
    max_height: u32,

    /// Also write an overlay image with the fragment boxes drawn in.
    #[arg(long)]
    visualize: bool,

    /// Outline thickness for --visualize, in pixels.
    #[arg(long, default_value_t = 2)]
    line_thickness: u32,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_pair(s: &str) -> Result<(u32, u32), String> {
    let (a, b) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w = a.trim().parse().map_err(|_| format!("bad number '{a}'"))?;
    let h = b.trim().parse().map_err(|_| format!("bad number '{b}'"))?;
    Ok((w, h))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let layout = match (cli.grid, cli.tile_size) {
        (Some((columns, rows)), None) => TileLayout::Grid { columns, rows },
        (None, Some((width, height))) => TileLayout::FixedSize { width, height },
        (None, None) => TileLayout::default(),
        (Some(_), Some(_)) => unreachable!("clap rejects --grid with --tile-size"),
    };
    let config = TilingConfig::builder()
        .layout(layout)
        .overlap_ratio(cli.overlap)
        .complexity_threshold(cli.threshold)
        .build()
        .context("Invalid tiling parameters")?;
    let limits = NormalizeLimits {
        max_width: cli.max_width,
        max_height: cli.max_height,
    };

    // ── Process the batch ────────────────────────────────────────────────
    let bar = if cli.quiet || cli.no_progress || cli.inputs.len() < 2 {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(cli.inputs.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    };

    let mut succeeded = 0usize;
    let mut total_fragments = 0usize;
    for input in &cli.inputs {
        bar.set_message(input.display().to_string());
        match process_file(input, &cli, &config, &limits) {
            Ok(count) => {
                succeeded += 1;
                total_fragments += count;
                if !cli.quiet {
                    bar.println(format!("  ✓ {}  {} fragments", input.display(), count));
                }
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "skipping input");
                bar.println(format!("  ✗ {}  {e:#}", input.display()));
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    if succeeded == 0 {
        bail!("all {} input(s) failed", cli.inputs.len());
    }
    if !cli.quiet {
        eprintln!(
            "{succeeded}/{} files fragmented, {total_fragments} fragments written to {}",
            cli.inputs.len(),
            cli.out_dir.display()
        );
    }
    Ok(())
}

/// Fragment one input file and write its artifacts. Returns the fragment count.
fn process_file(
    input: &Path,
    cli: &Cli,
    config: &TilingConfig,
    limits: &NormalizeLimits,
) -> Result<usize> {
    let mut doc = document_from_image(input, limits)
        .with_context(|| format!("Failed to load '{}'", input.display()))?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    let target = cli.out_dir.join(stem);
    std::fs::create_dir_all(&target)
        .with_context(|| format!("Failed to create '{}'", target.display()))?;

    let mut written = 0usize;
    for page in doc.pages_mut() {
        let fragments = page.fragment(config)?;

        let mut records = Vec::with_capacity(fragments.len());
        for (i, fragment) in fragments.iter().enumerate() {
            let file = format!("fragment-{:03}.jpg", i + 1);
            std::fs::write(target.join(&file), fragment.content())
                .with_context(|| format!("Failed to write '{}'", target.join(&file).display()))?;
            records.push(FragmentRecord {
                index: i + 1,
                file,
                bbox: fragment.bbox(),
            });
        }
        written += records.len();

        let manifest = serde_json::to_string_pretty(&records)
            .context("Failed to serialize fragment manifest")?;
        std::fs::write(target.join("manifest.json"), manifest)
            .with_context(|| format!("Failed to write manifest in '{}'", target.display()))?;

        if cli.visualize {
            let overlay = page.visualize_fragments(cli.line_thickness)?;
            std::fs::write(target.join("overlay.jpg"), overlay)
                .with_context(|| format!("Failed to write overlay in '{}'", target.display()))?;
        }
    }
    Ok(written)
}
