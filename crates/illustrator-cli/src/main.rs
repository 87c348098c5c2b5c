use anyhow::Result;
use clap::{Parser, Subcommand};
use illustrator_core::{GenerateOptions, SingleOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "illustrator", version, about = "Generate illustrations for the sections of a markdown document")]
struct Cli {
    /// Show debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Illustrate every section of a document
    Generate {
        /// Markdown document to illustrate
        document: PathBuf,
        /// Heading level to illustrate at (h2, h3, h4)
        #[arg(long)]
        level: Option<String>,
        /// Style preset (gradient-glass, ticket, vector-illustration)
        #[arg(long, conflicts_with = "style_file")]
        style: Option<String>,
        /// Use a style file instead of a preset
        #[arg(long, value_name = "PATH")]
        style_file: Option<PathBuf>,
        /// Directory holding the preset style files
        #[arg(long, value_name = "DIR")]
        styles_dir: Option<PathBuf>,
        /// Image resolution (2K, 4K)
        #[arg(long)]
        resolution: Option<String>,
        /// Aspect ratio (16:9, 3:4)
        #[arg(long)]
        aspect_ratio: Option<String>,
        /// Output directory (default: images/ next to the document)
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Stop after verification and list the images that would be generated
        #[arg(long)]
        dry_run: bool,
    },
    /// Show structure, merged sections and coverage without generating
    Analyze {
        document: PathBuf,
        #[arg(long)]
        level: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Generate a single image from a title and content
    Single {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, conflicts_with = "style_file")]
        style: Option<String>,
        #[arg(long, value_name = "PATH")]
        style_file: Option<PathBuf>,
        #[arg(long, value_name = "DIR")]
        styles_dir: Option<PathBuf>,
        /// Output image path
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
        /// Use the cover prompt (summarises a whole document)
        #[arg(long)]
        cover: bool,
        #[arg(long)]
        resolution: Option<String>,
        #[arg(long)]
        aspect_ratio: Option<String>,
    },
    /// List style presets
    Styles {
        #[arg(long, value_name = "DIR")]
        styles_dir: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = illustrator_core::config::load_config_with_precedence()?;
    tracing::debug!(?config, "resolved configuration");

    match cli.cmd {
        Command::Generate {
            document,
            level,
            style,
            style_file,
            styles_dir,
            resolution,
            aspect_ratio,
            output,
            dry_run,
        } => {
            let opts = GenerateOptions {
                document,
                level,
                style,
                style_file,
                styles_dir,
                resolution,
                aspect_ratio,
                output,
                dry_run,
            };
            illustrator_core::cmd_generate(&config, &opts, Box::new(illustrator_render::connect))?;
        }
        Command::Analyze { document, level, json } => {
            illustrator_core::cmd_analyze(&config, &document, level.as_deref(), json)?
        }
        Command::Single {
            title,
            content,
            style,
            style_file,
            styles_dir,
            output,
            cover,
            resolution,
            aspect_ratio,
        } => {
            let opts = SingleOptions {
                title,
                content,
                style,
                style_file,
                styles_dir,
                resolution,
                aspect_ratio,
                output,
                cover,
            };
            illustrator_core::cmd_single(&config, &opts, Box::new(illustrator_render::connect))?;
        }
        Command::Styles { styles_dir } => illustrator_core::cmd_styles(&config, styles_dir.as_deref())?,
    }
    Ok(())
}
