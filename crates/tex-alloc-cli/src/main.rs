use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tex_alloc_core::prelude::*;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "tex-alloc",
    about = "Simulate and visualize runtime texture atlas allocation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a seeded random allocate/free workload and report occupancy
    Simulate(SimulateArgs),
    /// Print the merged allocator configuration (after file/CLI) and exit
    PrintConfig(PrintConfigArgs),
}

#[derive(Parser, Debug, Clone)]
struct AllocatorArgs {
    /// JSON or YAML allocator config file (CLI options below override it)
    #[arg(long, help_heading = "Allocator")]
    config: Option<PathBuf>,
    /// Initial surface size: N or WxH (powers of two)
    #[arg(long, value_parser = parse_size, help_heading = "Allocator")]
    min_size: Option<Size>,
    /// Final surface size: N or WxH (powers of two)
    #[arg(long, value_parser = parse_size, help_heading = "Allocator")]
    max_size: Option<Size>,
    /// Added to every quantized row height
    #[arg(long, help_heading = "Allocator")]
    bias: Option<u32>,
    /// Released row records kept for reuse
    #[arg(long, help_heading = "Allocator")]
    pool_limit: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
struct SimulateArgs {
    #[command(flatten)]
    allocator: AllocatorArgs,

    // Workload
    /// Number of operations (allocations and frees)
    #[arg(long, default_value_t = 2000, help_heading = "Workload")]
    ops: usize,
    /// Smallest requested side
    #[arg(long, default_value_t = 4, help_heading = "Workload")]
    min_item: u32,
    /// Largest requested side
    #[arg(long, default_value_t = 64, help_heading = "Workload")]
    max_item: u32,
    /// Probability that an operation frees a random live placement
    #[arg(long, default_value_t = 0.3, help_heading = "Workload")]
    free_ratio: f64,
    /// RNG seed
    #[arg(long, default_value_t = 1, help_heading = "Workload")]
    seed: u64,

    // Output
    /// Print the report as JSON instead of a summary line
    #[arg(long, default_value_t = false, help_heading = "Output")]
    json: bool,
    /// Export the report (JSON) to this file
    #[arg(long, help_heading = "Output")]
    export_stats: Option<PathBuf>,
    /// Render areas, rows and live placements to a PNG
    #[arg(long, help_heading = "Output")]
    png: Option<PathBuf>,
    /// Show a progress bar
    #[arg(long, default_value_t = false, help_heading = "Output")]
    progress: bool,
}

#[derive(Parser, Debug, Clone)]
struct PrintConfigArgs {
    #[command(flatten)]
    allocator: AllocatorArgs,
    /// Output format: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"])]
    format: String,
}

#[derive(Debug, Serialize)]
struct SimReport {
    config: AllocatorConfig,
    seed: u64,
    ops: usize,
    requests: usize,
    failed: usize,
    frees: usize,
    elapsed_us: u64,
    stats: AllocatorStats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Simulate(args) => run_simulate(args, !cli.quiet),
        Commands::PrintConfig(args) => run_print_config(args),
    }
}

fn run_print_config(args: &PrintConfigArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.allocator)?;
    match args.format.as_str() {
        "yaml" => print!("{}", serde_yaml::to_string(&cfg)?),
        _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
    }
    Ok(())
}

fn run_simulate(args: &SimulateArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = load_config(&args.allocator)?;
    anyhow::ensure!(
        args.min_item >= 1 && args.min_item <= args.max_item,
        "invalid item range {}..={}",
        args.min_item,
        args.max_item
    );
    anyhow::ensure!(
        (0.0..1.0).contains(&args.free_ratio),
        "free_ratio must be in [0, 1), got {}",
        args.free_ratio
    );
    let mut atlas: AtlasAllocator =
        AtlasAllocator::from_config(&cfg).context("build allocator")?;
    info!(
        areas = atlas.area_count(),
        max_alloc = ?atlas.max_alloc_size(),
        "allocator ready"
    );

    let bar = make_progress(args.ops as u64, show_progress && args.progress);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut live: Vec<Placement> = Vec::new();
    let (mut requests, mut failed, mut frees) = (0usize, 0usize, 0usize);
    let start = Instant::now();
    for _ in 0..args.ops {
        if !live.is_empty() && rng.gen_bool(args.free_ratio) {
            let i = rng.gen_range(0..live.len());
            let p = live.swap_remove(i);
            if !atlas.free(p) {
                warn!(?p, "placement was not live");
            }
            frees += 1;
        } else {
            let w = rng.gen_range(args.min_item..=args.max_item);
            let h = rng.gen_range(args.min_item..=args.max_item);
            requests += 1;
            match atlas.try_allocate(w, h) {
                Some(p) => live.push(p),
                None => {
                    debug!(w, h, "allocation failed");
                    failed += 1;
                }
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    let elapsed = start.elapsed();
    if let Some(b) = &bar {
        b.finish_and_clear();
    }

    let report = SimReport {
        config: cfg,
        seed: args.seed,
        ops: args.ops,
        requests,
        failed,
        frees,
        elapsed_us: elapsed.as_micros() as u64,
        stats: atlas.stats(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "requests={} failed={} frees={} time={}",
            report.requests,
            report.failed,
            report.frees,
            fmt_dur(elapsed)
        );
        println!("{}", report.stats.summary());
    }
    if let Some(path) = &args.export_stats {
        let s = serde_json::to_string_pretty(&report)?;
        fs::write(path, s).with_context(|| format!("write stats {}", path.display()))?;
        info!(path = %path.display(), "wrote stats");
    }
    if let Some(path) = &args.png {
        render_png(&atlas, &live, path)?;
        info!(path = %path.display(), "wrote layout image");
    }
    Ok(())
}

fn load_config(args: &AllocatorArgs) -> anyhow::Result<AllocatorConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            parse_config(path, &text)?
        }
        None => AllocatorConfig::default(),
    };
    if let Some(v) = args.min_size {
        cfg.min_size = v;
    }
    if let Some(v) = args.max_size {
        cfg.max_size = v;
    }
    if let Some(v) = args.bias {
        cfg.row_height_bias = v;
    }
    if let Some(v) = args.pool_limit {
        cfg.pool_limit = v;
    }
    cfg.validate().context("invalid allocator configuration")?;
    Ok(cfg)
}

fn parse_config(path: &Path, text: &str) -> anyhow::Result<AllocatorConfig> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let cfg = if is_json {
        serde_json::from_str(text).with_context(|| format!("parse JSON {}", path.display()))?
    } else {
        serde_yaml::from_str(text).with_context(|| format!("parse YAML {}", path.display()))?
    };
    Ok(cfg)
}

fn parse_size(s: &str) -> Result<Size, String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid size component '{v}': {e}"))
    };
    match s.split_once(['x', 'X']) {
        Some((w, h)) => Ok(Size::new(parse(w)?, parse(h)?)),
        None => Ok(Size::splat(parse(s)?)),
    }
}

fn make_progress(len: u64, enabled: bool) -> Option<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};
    if !enabled {
        return None;
    }
    let b = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} simulating {pos}/{len} [{elapsed_precise}]")
    {
        b.set_style(style);
    }
    Some(b)
}

const BACKGROUND: Rgba<u8> = Rgba([16, 16, 20, 255]);
const AREA_EDGE: Rgba<u8> = Rgba([90, 90, 110, 255]);
const ROW_FILL: Rgba<u8> = Rgba([40, 44, 60, 255]);

fn render_png(atlas: &AtlasAllocator, live: &[Placement], path: &Path) -> anyhow::Result<()> {
    let size = atlas.max_size();
    let mut img = RgbaImage::from_pixel(size.width, size.height, BACKGROUND);
    for row in atlas.rows() {
        fill_rect(&mut img, row.rect, ROW_FILL);
    }
    for (i, p) in live.iter().enumerate() {
        fill_rect(&mut img, p.rect, placement_color(i));
    }
    for area in atlas.areas() {
        outline_rect(&mut img, area, AREA_EDGE);
    }
    img.save(path)
        .with_context(|| format!("write png {}", path.display()))?;
    Ok(())
}

fn placement_color(i: usize) -> Rgba<u8> {
    // cheap integer hash for stable, distinct-ish colors
    let h = (i as u32).wrapping_mul(2_654_435_761);
    Rgba([
        96 + (h >> 24) as u8 % 160,
        96 + (h >> 16) as u8 % 160,
        96 + (h >> 8) as u8 % 160,
        255,
    ])
}

fn fill_rect(img: &mut RgbaImage, r: Rect, color: Rgba<u8>) {
    for y in r.y..r.y_max().min(img.height()) {
        for x in r.x..r.x_max().min(img.width()) {
            img.put_pixel(x, y, color);
        }
    }
}

fn outline_rect(img: &mut RgbaImage, r: Rect, color: Rgba<u8>) {
    if r.is_empty() {
        return;
    }
    let x2 = (r.x_max() - 1).min(img.width() - 1);
    let y2 = (r.y_max() - 1).min(img.height() - 1);
    for x in r.x..=x2 {
        img.put_pixel(x, r.y, color);
        img.put_pixel(x, y2, color);
    }
    for y in r.y..=y2 {
        img.put_pixel(r.x, y, color);
        img.put_pixel(x2, y, color);
    }
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
