//! Command-line front end for the breath-sound classifier.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use breathscan::analysis::schema::FeatureSchema;
use breathscan::{InferenceError, ModelHandle, PipelineConfig, PredictionResult, Predictor, logging};
use serde::Serialize;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Predict { audio: Vec<PathBuf>, model: PathBuf },
    Features { audio: PathBuf },
    Schema,
    ShowConfig,
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    command: Command,
    config_path: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let config = load_config(options.config_path.as_deref())?;

    match options.command {
        Command::Predict { audio, model } => {
            let handle = Arc::new(ModelHandle::eager(model).map_err(|err| err.to_string())?);
            let predictor = Predictor::new(config, handle).map_err(|err| err.to_string())?;
            if let [single] = audio.as_slice() {
                let result = predictor.predict_file(single).map_err(|err| err.to_string())?;
                print_json(&result)
            } else {
                let results = predictor.predict_files(&audio);
                let entries = batch_entries(&audio, results);
                print_json(&entries)?;
                let failed = entries.iter().filter(|entry| entry.error.is_some()).count();
                if failed > 0 {
                    return Err(format!("{failed} of {} files failed", entries.len()));
                }
                Ok(())
            }
        }
        Command::Features { audio } => {
            let predictor = Predictor::features_only(config).map_err(|err| err.to_string())?;
            let vector = predictor
                .feature_vector(&audio)
                .map_err(|err| err.to_string())?;
            print_json(&vector)
        }
        Command::Schema => {
            for name in FeatureSchema::from_config(&config).names() {
                println!("{name}");
            }
            Ok(())
        }
        Command::ShowConfig => {
            let text = config.to_toml().map_err(|err| err.to_string())?;
            print!("{text}");
            Ok(())
        }
    }
}

/// One line of multi-file `predict` output; exactly one of `prediction` and `error` is set.
#[derive(Debug, Serialize)]
struct BatchEntry<'a> {
    path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    prediction: Option<PredictionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn batch_entries(
    paths: &[PathBuf],
    results: Vec<Result<PredictionResult, InferenceError>>,
) -> Vec<BatchEntry<'_>> {
    paths
        .iter()
        .zip(results)
        .map(|(path, result)| match result {
            Ok(prediction) => BatchEntry {
                path,
                prediction: Some(prediction),
                error: None,
            },
            Err(err) => BatchEntry {
                path,
                prediction: None,
                error: Some(err.to_string()),
            },
        })
        .collect()
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, String> {
    match path {
        Some(path) => PipelineConfig::load(path),
        None => PipelineConfig::load_or_default(),
    }
    .map_err(|err| err.to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let Some(subcommand) = args.first() else {
        return Err(help_text());
    };
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut model_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                model_path = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            value => positional.push(PathBuf::from(value)),
        }
        idx += 1;
    }

    let command = match subcommand.as_str() {
        "-h" | "--help" | "help" => return Err(help_text()),
        "predict" => {
            if positional.is_empty() {
                return Err("predict requires at least one audio path".to_string());
            }
            let model = model_path.ok_or_else(|| "--model is required".to_string())?;
            Command::Predict {
                audio: positional,
                model,
            }
        }
        "features" => {
            let [audio] = <[PathBuf; 1]>::try_from(positional)
                .map_err(|_| "features requires exactly one audio path".to_string())?;
            Command::Features { audio }
        }
        "schema" | "show-config" if !positional.is_empty() => {
            return Err(format!("{subcommand} takes no positional arguments"));
        }
        "schema" => Command::Schema,
        "show-config" => Command::ShowConfig,
        unknown => return Err(format!("Unknown command: {unknown}\n\n{}", help_text())),
    };
    if model_path_given_without_predict(&command, &args) {
        return Err("--model is only valid with predict".to_string());
    }
    Ok(CliOptions {
        command,
        config_path,
    })
}

fn model_path_given_without_predict(command: &Command, args: &[String]) -> bool {
    !matches!(command, Command::Predict { .. }) && args.iter().any(|arg| arg == "--model")
}

fn help_text() -> String {
    [
        "breathscan",
        "",
        "Usage:",
        "  breathscan predict <audio>... --model <model.json> [--config <pipeline.toml>]",
        "  breathscan features <audio> [--config <pipeline.toml>]",
        "  breathscan schema [--config <pipeline.toml>]",
        "  breathscan show-config [--config <pipeline.toml>]",
        "",
        "Without --config, pipeline.toml is read from the application directory",
        "(override with BREATHSCAN_CONFIG_HOME) or built-in defaults are used.",
    ]
    .join("\n")
}
