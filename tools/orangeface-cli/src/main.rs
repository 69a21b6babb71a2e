//! Orangeface CLI: offline face-landmark compositing.
//!
//! Usage:
//!   orangeface replay <FRAMES_DIR> --detections <JSONL>   Run the detection loop over a frame directory
//!   orangeface render <IMAGE> --detections <JSONL>        Compose a single frame
//!   orangeface config                                     Show the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orangeface_face_model::DetectorVariant;
use orangeface_runtime::AppConfig;

mod commands;
mod presenter;

#[derive(Parser)]
#[command(
    name = "orangeface",
    about = "Hide a face behind an overlay, keeping the eyes and mouth live",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detection loop over a directory of frames
    Replay {
        /// Directory of image frames, played in file-name order
        frames: PathBuf,

        /// Recorded detections (JSONL, one frame per line)
        #[arg(short, long)]
        detections: PathBuf,

        /// Directory for rendered frames
        #[arg(short, long, default_value = "out")]
        output: PathBuf,

        /// Show the raw video, markers, and info panel
        #[arg(long)]
        debug: bool,

        /// Detector variant: fast|accurate
        #[arg(long)]
        detector: Option<DetectorVariant>,

        /// Overlay image (defaults to the configured path)
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// TrueType font for debug text
        #[arg(long)]
        font: Option<PathBuf>,

        /// Only write the last rendered frame
        #[arg(long)]
        last_only: bool,
    },

    /// Compose a single frame and save it as PNG
    Render {
        /// Source image
        image: PathBuf,

        /// Recorded detections (JSONL)
        #[arg(short, long)]
        detections: PathBuf,

        /// Frame index to take detections from
        #[arg(long, default_value = "0")]
        frame: u64,

        /// Output PNG path
        #[arg(short, long, default_value = "orange-face.png")]
        output: PathBuf,

        /// Show the raw video, markers, and info panel
        #[arg(long)]
        debug: bool,

        /// Detector variant: fast|accurate
        #[arg(long)]
        detector: Option<DetectorVariant>,

        /// Overlay image (defaults to the configured path)
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// TrueType font for debug text
        #[arg(long)]
        font: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        write_default: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    orangeface_common::logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Replay {
            frames,
            detections,
            output,
            debug,
            detector,
            overlay,
            font,
            last_only,
        } => {
            let args = commands::replay::ReplayArgs {
                frames,
                detections,
                output,
                debug,
                detector,
                overlay,
                font,
                last_only,
            };
            commands::replay::run(args, config).await
        }
        Commands::Render {
            image,
            detections,
            frame,
            output,
            debug,
            detector,
            overlay,
            font,
        } => {
            let args = commands::render::RenderArgs {
                image,
                detections,
                frame,
                output,
                debug,
                detector,
                overlay,
                font,
            };
            commands::render::run(args, config).await
        }
        Commands::Config { write_default } => commands::config::run(&config, write_default),
    }
}
