//! EVM CLI: Eulerian Video Magnification over PNG frame sequences.
//!
//! Usage:
//!   evm magnify <INPUT_DIR> -o <OUTPUT_DIR>   Magnify motion or color changes
//!   evm synth <OUTPUT_DIR>                    Write a synthetic pulsing sequence
//!   evm spectrum <INPUT_DIR> --x X --y Y      Show one pixel's temporal spectrum
//!   evm config                                Print default parameters

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use evm_common::config::AppConfig;
use evm_core::ModeKind;

mod commands;
mod frames;

#[derive(Parser)]
#[command(
    name = "evm",
    about = "Eulerian Video Magnification for PNG frame sequences",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// Laplacian pyramid + IIR band-pass (streaming)
    Motion,
    /// Gaussian pyramid + ideal band-pass (whole sequence)
    Color,
}

impl From<ModeArg> for ModeKind {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Motion => ModeKind::Motion,
            ModeArg::Color => ModeKind::Color,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Magnify a PNG frame sequence
    Magnify {
        /// Directory of input frames (*.png, sorted by name)
        input: PathBuf,

        /// Directory for output frames
        #[arg(short, long)]
        output: PathBuf,

        /// Processing mode
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Input frame rate (defaults to the app config value)
        #[arg(long)]
        fps: Option<f64>,

        /// Pyramid depth
        #[arg(long)]
        levels: Option<usize>,

        /// Amplification factor
        #[arg(long)]
        alpha: Option<f64>,

        /// Spatial cutoff wavelength in pixels
        #[arg(long)]
        lambda_c: Option<f64>,

        /// IIR fast rate (motion mode)
        #[arg(long)]
        r1: Option<f64>,

        /// IIR slow rate (motion mode)
        #[arg(long)]
        r2: Option<f64>,

        /// Low cutoff in Hz (color mode)
        #[arg(long)]
        fl: Option<f64>,

        /// High cutoff in Hz (color mode)
        #[arg(long)]
        fh: Option<f64>,

        /// Chroma gain on the amplified signal [0.0, 1.0]
        #[arg(long)]
        chrom_attenuation: Option<f64>,

        /// JSON parameter file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a synthetic sequence with a pulsing disc
    Synth {
        /// Output directory
        output: PathBuf,

        /// Frame width
        #[arg(long, default_value = "64")]
        width: usize,

        /// Frame height
        #[arg(long, default_value = "64")]
        height: usize,

        /// Number of frames
        #[arg(long, default_value = "64")]
        frames: usize,

        /// Frame rate of the sequence
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Pulse frequency in Hz
        #[arg(long, default_value = "2.5")]
        freq: f64,

        /// Pulse amplitude in intensity units
        #[arg(long, default_value = "0.01")]
        amplitude: f64,
    },

    /// Print the temporal spectrum of one pixel's luma
    Spectrum {
        /// Directory of input frames
        input: PathBuf,

        /// Pixel column
        #[arg(long)]
        x: usize,

        /// Pixel row
        #[arg(long)]
        y: usize,

        /// Input frame rate
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Print default magnification parameters as JSON
    Config {
        /// Mode whose defaults to print
        #[arg(long, value_enum, default_value = "motion")]
        mode: ModeArg,

        /// Also write the default app config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let app = AppConfig::load();

    // Initialize logging
    let mut logging = app.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    evm_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Magnify {
            input,
            output,
            mode,
            fps,
            levels,
            alpha,
            lambda_c,
            r1,
            r2,
            fl,
            fh,
            chrom_attenuation,
            config,
        } => {
            let overrides = commands::magnify::Overrides {
                mode: mode.map(ModeKind::from),
                levels,
                alpha,
                lambda_c,
                r1,
                r2,
                fl,
                fh,
                chrom_attenuation,
            };
            let fps = fps.unwrap_or(app.frames.fps);
            commands::magnify::run(
                input,
                output,
                fps,
                &app.frames.output_prefix,
                config,
                overrides,
            )
            .await
        }
        Commands::Synth {
            output,
            width,
            height,
            frames,
            fps,
            freq,
            amplitude,
        } => commands::synth::run(
            output,
            &app.frames.output_prefix,
            width,
            height,
            frames,
            fps,
            freq,
            amplitude,
        ),
        Commands::Spectrum { input, x, y, fps } => {
            commands::spectrum::run(input, x, y, fps.unwrap_or(app.frames.fps))
        }
        Commands::Config { mode, init } => commands::config::run(mode.into(), init),
    }
}
