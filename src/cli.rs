use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "xray-intake",
    version,
    about = "Chest X-ray intake: content gating, inference and result normalization"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Print single-line JSON instead of pretty output")]
    pub compact: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide whether an upload carries imaging content
    Classify {
        file: PathBuf,
        #[arg(long, help = "Declared media type (guessed from the extension when omitted)")]
        media_type: Option<String>,
    },
    /// Turn raw inference output into a clinical result
    Normalize {
        #[arg(help = "File holding the raw output (stdin when omitted)")]
        file: Option<PathBuf>,
    },
    /// Run the full intake pipeline on one upload
    Analyze {
        file: PathBuf,
        #[arg(long)]
        media_type: Option<String>,
        #[arg(long, help = "Scan reference number (XR-YYMMDD-NNNN generated when omitted)")]
        reference: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long = "symptom", help = "Reported symptom (repeatable)")]
        symptoms: Vec<String>,
        #[arg(long, default_value_t = false, help = "Answer with a simulated verdict")]
        mock: bool,
        #[arg(long, default_value_t = false, help = "Enter simulation mode before answering")]
        force_simulation: bool,
    },
    /// Inspect or change the persisted simulation flag
    Simulation {
        #[command(subcommand)]
        command: SimulationCommands,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationCommands {
    Status,
    On,
    Off,
}
