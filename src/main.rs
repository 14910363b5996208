use clap::{Parser, Subcommand};
use recipe_images::{
    ImageOptimizer, OptimizationOptions, OptimizationRequest, OptimizedImageResult, OutputFormat,
    PresetKind, TracingLogger, batch, config, is_valid_image_format, logging, naming, output,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the optimized files go and what they are called.
#[derive(clap::Args, Clone)]
struct TargetArgs {
    /// Uploaded image to optimize (never modified)
    source: PathBuf,

    /// Destination directory (created if missing)
    #[arg(long, short)]
    dest: PathBuf,

    /// Output name without extension (default: source file stem)
    #[arg(long, short)]
    name: Option<String>,

    /// Delete the source once the optimized file is written
    #[arg(long)]
    cleanup: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
#[command(name = "recipe-images")]
#[command(about = "Resize, re-encode and thumbnail uploaded recipe images")]
#[command(long_about = "\
Resize, re-encode and thumbnail uploaded recipe images

Presets:

  recipe   fit inside 1200x800, JPEG quality 85, 400x300 JPEG thumbnail
  avatar   crop to cover 300x300, JPEG quality 90, no thumbnail

Images are never enlarged. Output names are <name>.<ext> and
<name>_thumb.jpg inside the destination directory.

Run 'recipe-images gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file (stock defaults if missing)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize one image with explicit options
    Optimize {
        #[command(flatten)]
        target: TargetArgs,

        /// Maximum width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Maximum height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Encoding quality, 1-100 (PNG ignores it)
        #[arg(long)]
        quality: Option<u32>,

        /// Output format: jpeg, png or webp
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Crop to cover the width x height box instead of fitting inside it
        #[arg(long)]
        crop: bool,

        /// Also write a 400x300 JPEG thumbnail
        #[arg(long)]
        thumbnail: bool,
    },
    /// Optimize one image with the recipe preset
    Recipe(TargetArgs),
    /// Optimize one image with the avatar preset
    Avatar(TargetArgs),
    /// Optimize every image under a directory with a preset
    Batch {
        /// Directory to scan recursively
        source: PathBuf,

        /// Destination directory; sub-directories are mirrored
        dest: PathBuf,

        /// Preset to apply: recipe or avatar
        #[arg(long, default_value = "recipe")]
        preset: PresetKind,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check MIME types against the upload allow-list (exit 1 if any is rejected)
    CheckMime {
        #[arg(required = true)]
        mime_types: Vec<String>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match cli.command {
        Command::Optimize {
            target,
            width,
            height,
            quality,
            format,
            crop,
            thumbnail,
        } => {
            let optimizer = load_optimizer(&cli.config)?;
            let options = OptimizationOptions {
                width,
                height,
                quality,
                format,
                maintain_aspect_ratio: Some(!crop),
            };
            let request = OptimizationRequest::new(
                &target.source,
                &target.dest,
                base_name(&target.source, target.name.as_deref()),
            )
            .with_options(options)
            .with_thumbnail(thumbnail);
            let result = optimizer.optimize_image(request).await?;
            finish(&optimizer, &target, &result).await?;
        }
        Command::Recipe(target) => {
            run_preset(&cli.config, PresetKind::Recipe, &target).await?;
        }
        Command::Avatar(target) => {
            run_preset(&cli.config, PresetKind::Avatar, &target).await?;
        }
        Command::Batch {
            source,
            dest,
            preset,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            let threads = config::effective_threads(&config.processing);
            let optimizer = ImageOptimizer::from_config(&config, Arc::new(TracingLogger));
            let (src, dst) = (source.clone(), dest.clone());
            let report = tokio::task::spawn_blocking(move || {
                batch::optimize_directory(&optimizer, &src, &dst, preset, threads)
            })
            .await??;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_batch_report(&report, &source);
            }
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Command::CheckMime { mime_types } => {
            let mut all_accepted = true;
            for mime in &mime_types {
                let accepted = is_valid_image_format(mime);
                all_accepted &= accepted;
                println!("{}", output::format_mime_check(mime, accepted));
            }
            if !all_accepted {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_optimizer(config_path: &Path) -> Result<ImageOptimizer, config::ConfigError> {
    let config = config::load_config(config_path)?;
    Ok(ImageOptimizer::from_config(&config, Arc::new(TracingLogger)))
}

async fn run_preset(
    config_path: &Path,
    kind: PresetKind,
    target: &TargetArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let optimizer = load_optimizer(config_path)?;
    let result = optimizer
        .optimize_with_preset(
            kind,
            &target.source,
            &target.dest,
            base_name(&target.source, target.name.as_deref()),
        )
        .await?;
    finish(&optimizer, target, &result).await
}

async fn finish(
    optimizer: &ImageOptimizer,
    target: &TargetArgs,
    result: &OptimizedImageResult,
) -> Result<(), Box<dyn std::error::Error>> {
    if target.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        output::print_result(result);
    }
    if target.cleanup {
        optimizer.cleanup_temp_file(&target.source).await;
    }
    Ok(())
}

/// Explicit name, else the source file name without its extension.
fn base_name(source: &Path, explicit: Option<&str>) -> String {
    match explicit {
        Some(name) => name.to_string(),
        None => {
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            naming::filename_stem(&file_name).to_string()
        }
    }
}
