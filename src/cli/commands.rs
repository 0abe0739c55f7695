//! CLI command definitions

use clap::Args;
use serde_json::Value;

/// Run one or more pipelines
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to a pipeline YAML file (repeatable)
    #[arg(short, long, required = true)]
    pub file: Vec<String>,

    /// Run only the pipeline with this name
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Initial context values (key=value, value parsed as JSON when possible)
    #[arg(long, value_parser = parse_key_value)]
    pub var: Vec<(String, Value)>,

    /// Print the final status as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the order in which jobs would run
#[derive(Debug, Args, Clone)]
pub struct OrderCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid key=value pair: {}", s))?;
    if key.is_empty() {
        return Err(format!("Missing key in: {}", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
