use anyhow::Context;
use assistant_core::{Assistant, AssistantConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SAMPLE_REQUESTS: &[&str] = &[
    "Need a sunset-view table for two tonight; gluten-free menu a must",
    "Book a cab to the airport",
    "Find a gift for my friend's birthday",
    "Update my Aadhar address",
];

/// Classify requests and print the structured result as JSON
#[derive(Debug, Parser)]
#[command(name = "assistant", version)]
struct Args {
    /// Requests to process (runs a few sample requests when omitted)
    inputs: Vec<String>,

    /// Override MODEL_NAME
    #[arg(long)]
    model: Option<String>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = AssistantConfig::from_env().context("loading configuration")?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    let assistant = Assistant::from_config(config)?;

    let inputs: Vec<String> = if args.inputs.is_empty() {
        SAMPLE_REQUESTS.iter().map(|s| s.to_string()).collect()
    } else {
        args.inputs
    };

    for input in &inputs {
        info!(input = %input, "processing request");
        let items = assistant.process_input(input)?;
        let rendered = if args.compact {
            serde_json::to_string(&items)?
        } else {
            serde_json::to_string_pretty(&items)?
        };
        println!("{rendered}");
    }

    Ok(())
}
