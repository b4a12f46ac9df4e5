use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use xray_intake::config::IntakeConfig;
use xray_intake::models::{PatientContext, UploadedFile};
use xray_intake::pipeline::inference::{FileFlagStore, InferOptions, SimulationFlagStore};
use xray_intake::{classify, normalize, IntakePipeline, IntakeRequest, RawInferenceOutput};

mod cli;

use cli::{Cli, Commands, SimulationCommands};

fn main() -> Result<()> {
    xray_intake::init_tracing();
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Classify { file, media_type } => {
            let upload = read_upload(&file, media_type)?;
            print_json(&classify(&upload.bytes, &upload.media_type), cli.compact)
        }
        Commands::Normalize { file } => {
            let body = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading stdin")?;
                    buf
                }
            };
            print_json(&normalize(&RawInferenceOutput::from_body(&body)), cli.compact)
        }
        Commands::Analyze {
            file,
            media_type,
            reference,
            name,
            age,
            gender,
            symptoms,
            mock,
            force_simulation,
        } => {
            let pipeline = IntakePipeline::from_config(&load_config()?)?;
            let request = IntakeRequest {
                file: read_upload(&file, media_type)?,
                patient: PatientContext {
                    name,
                    age,
                    gender,
                    reference_number: reference,
                },
                symptoms,
                options: InferOptions {
                    use_mock: mock,
                    force_simulation,
                },
            };
            print_json(&pipeline.run(request), cli.compact)
        }
        Commands::Simulation { command } => {
            let store = FileFlagStore::new(&load_config()?.simulation_flag_path);
            match command {
                SimulationCommands::Status => {}
                SimulationCommands::On => store.save(true)?,
                SimulationCommands::Off => store.save(false)?,
            }
            let status = SimulationStatus {
                simulation_forced: store.load()?,
                flag_path: store.path().display().to_string(),
            };
            print_json(&status, cli.compact)
        }
    }
}

/// Only commands that talk to the service or its state read the environment.
fn load_config() -> Result<IntakeConfig> {
    IntakeConfig::from_env().context("invalid configuration")
}

#[derive(Serialize)]
struct SimulationStatus {
    simulation_forced: bool,
    flag_path: String,
}

fn read_upload(path: &Path, media_type: Option<String>) -> Result<UploadedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let media_type = media_type.unwrap_or_else(|| {
        mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    });
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedFile::new(bytes, media_type, file_name))
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{out}");
    Ok(())
}
