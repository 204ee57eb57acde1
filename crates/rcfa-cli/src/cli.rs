//! CLI definition using clap

use clap::{Args, Parser, Subcommand};
use rcfa_types::{AnalysisContext, BearingType, MotorMounting, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bearing-rcfa")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Bearing failure root-cause analysis from photos using a vision model")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model name override (e.g. gemini-2.5-flash)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging to stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// What is known about the bearing before the photo is looked at
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Bearing construction
    #[arg(long, short = 't', value_enum)]
    pub bearing_type: Option<BearingType>,

    /// Whether the bearing was mounted on an electric motor
    #[arg(long, value_enum)]
    pub motor: Option<MotorMounting>,

    /// Application (e.g. "Industrial pump")
    #[arg(long, short = 'a')]
    pub application: Option<String>,

    /// Free-form operating context (e.g. "High-speed operation, 24/7 usage")
    #[arg(long, short = 'c')]
    pub context: Option<String>,
}

impl ContextArgs {
    pub fn to_context(&self) -> AnalysisContext {
        AnalysisContext {
            bearing_type: self.bearing_type,
            motor_mounting: self.motor.unwrap_or_default(),
            application: self.application.clone(),
            additional_context: self.context.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a single bearing image
    Analyze {
        /// Path to image file
        image: PathBuf,

        #[command(flatten)]
        context: ContextArgs,

        /// Skip cache lookup (overrides config)
        #[arg(long)]
        no_cache: bool,
    },

    /// Batch analyze images in a folder
    Batch {
        /// Path to folder containing images
        folder: PathBuf,

        #[command(flatten)]
        context: ContextArgs,

        /// Output file for results
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Skip cache lookup (overrides config)
        #[arg(long)]
        no_cache: bool,

        /// Number of parallel analyses. 0 = auto (CPU count). Uses 4 if not specified.
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
    },

    /// Print the expert prompt that would be sent for a context
    Prompt {
        #[command(flatten)]
        context: ContextArgs,
    },

    /// Parse a saved model response without calling the model
    Parse {
        /// Text file containing the raw model response
        file: PathBuf,
    },

    /// Show whether the analyzer is ready (API key, model)
    Status,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set API key
        #[arg(long)]
        set_api_key: Option<String>,

        /// Set model
        #[arg(long)]
        set_model: Option<String>,

        /// Set API base URL
        #[arg(long)]
        set_base_url: Option<String>,

        /// Set model call timeout in seconds
        #[arg(long)]
        set_timeout: Option<u64>,

        /// Enable/disable cache
        #[arg(long)]
        set_cache: Option<bool>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },

    /// Manage cache
    Cache {
        /// Clear all cache
        #[arg(long)]
        clear: bool,

        /// Show cache statistics
        #[arg(long)]
        stats: bool,
    },
}
