use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use paint_by_numbers_wasm::{PaletteSource, PipelineParams, extract_palette_bytes, paint_by_numbers_bytes};
use anyhow::Context;
use anyhow::Result;
use log::info;

/// Turn images into paint-by-numbers templates (native wrapper around the WASM library).
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON file with pipeline parameters; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of colors for median cut
    #[arg(short = 'k', long)]
    n_colors: Option<usize>,

    /// Regions smaller than this many pixels get no number
    #[arg(short = 'a', long)]
    min_region_area: Option<usize>,

    /// Number label size recorded in the JSON report. Numbers are not drawn
    /// into the outline PNG; place them from the report's region centroids
    #[arg(short = 'f', long)]
    font_size: Option<u32>,

    /// Classify against the curated (deduplicated) palette instead of the raw one
    #[arg(long)]
    curated: bool,

    /// Only print the curated palette and its complementary colors
    #[arg(long)]
    palette_only: bool,

    /// Output directory
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Output filename prefix (ignored when --out-dir supplied)
    #[arg(short = 'p', long, default_value = "pbn_")]
    prefix: String,
}

fn resolve_params(args: &Args) -> Result<PipelineParams> {
    let mut params = match &args.config {
        Some(path) => PipelineParams::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineParams::default(),
    };
    if let Some(k) = args.n_colors {
        params.color_count = k;
    }
    if let Some(area) = args.min_region_area {
        params.min_region_area = area;
    }
    if let Some(size) = args.font_size {
        params.font_size = size;
    }
    if args.curated {
        params.palette_source = PaletteSource::Curated;
    }
    params.validate()?;
    Ok(params)
}

fn output_base(args: &Args, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    match &args.out_dir {
        Some(dir) => dir.join(&*stem),
        None => PathBuf::from(format!("{}{}", args.prefix, stem)),
    }
}

// `Path::with_extension` would eat anything after a dot in the stem.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let params = resolve_params(&args)?;

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

        if args.palette_only {
            let swatches = extract_palette_bytes(&bytes).context("palette extraction failed")?;
            println!("{}", input.display());
            for swatch in swatches {
                match swatch.complementary {
                    Some(comp) => println!("  {}  complementary {}", swatch.hex, comp),
                    None => println!("  {}", swatch.hex),
                }
            }
            continue;
        }

        let output = paint_by_numbers_bytes(&bytes, &params).context("paint by numbers processing failed")?;

        let base = output_base(&args, input);
        if let Some(parent) = base.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let outline_path = with_suffix(&base, ".outline.png");
        let preview_path = with_suffix(&base, ".preview.png");
        let report_path = with_suffix(&base, ".json");

        fs::write(&outline_path, &output.outline_png)?;
        fs::write(&preview_path, &output.preview_png)?;
        fs::write(&report_path, serde_json::to_string_pretty(&output.report)?)?;

        info!(
            "{}: {} colors, {} numbered regions",
            input.display(),
            output.report.palette.len(),
            output.report.regions.len()
        );
        println!("Saved → {}", outline_path.display());
        println!("Saved → {}", preview_path.display());
        println!("Saved → {}", report_path.display());
    }

    Ok(())
}
