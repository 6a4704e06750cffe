//! `output-as-input` CLI - run the Output as Input node without a host.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use output_as_input::{Config, NodeOutput, OutputAsInput};

/// Pick a previously generated image and load it as image and mask tensors.
#[derive(Parser, Debug)]
#[command(name = "output-as-input")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory the host writes generated images to.
    #[arg(short, long, default_value = "output", value_name = "DIR", global = true)]
    output_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List selectable images, newest first.
    List,

    /// Load an image the way the node does and describe the resulting tensors.
    Load {
        /// File name inside the output directory. Defaults to the newest image.
        #[arg(value_name = "IMAGE")]
        image: Option<String>,

        /// Fail instead of falling back to placeholder tensors.
        #[arg(long)]
        strict: bool,
    },

    /// Print the node definition and current inputs as JSON.
    Info,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("output_as_input={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let config = Config {
        output_dir: args.output_dir.clone(),
        ..Config::default()
    };

    let node = OutputAsInput::new(&config).context("Failed to initialize node")?;

    match &args.command {
        Command::List => list(&node),
        Command::Load { image, strict } => load(&node, image.as_deref(), *strict),
        Command::Info => info(&node),
    }
}

fn list(node: &OutputAsInput) -> Result<()> {
    let inputs = node.input_types().context("Failed to list output directory")?;
    let choices = &inputs.required[OutputAsInput::IMAGE_INPUT];

    if choices.is_empty() {
        tracing::info!(
            "No images found in {}",
            node.output_dir().root().display()
        );
    }

    for option in &choices.options {
        let marker = if *option == choices.default { "*" } else { " " };
        println!("{marker} {option}");
    }

    Ok(())
}

fn load(node: &OutputAsInput, image: Option<&str>, strict: bool) -> Result<()> {
    let selection = match image {
        Some(name) => name.to_string(),
        None => {
            let inputs = node.input_types().context("Failed to list output directory")?;
            inputs.required[OutputAsInput::IMAGE_INPUT].default.clone()
        }
    };

    let output = if strict {
        node.try_load(&selection)
            .with_context(|| format!("Failed to load {selection}"))?
    } else {
        node.load_image_and_mask(&selection)
    };

    describe(&selection, &output);
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn describe(selection: &str, output: &NodeOutput) {
    let coverage = if output.mask.is_empty() {
        0.0
    } else {
        output.mask.sum() / output.mask.len() as f32
    };

    println!("selection: {selection}");
    println!("image_out: {:?}", output.image.shape());
    println!("mask_out:  {:?} (mean opacity {coverage:.3})", output.mask.shape());
}

fn info(node: &OutputAsInput) -> Result<()> {
    let info = node.info().context("Failed to list output directory")?;
    let json = serde_json::to_string_pretty(&info).context("Failed to serialize node info")?;
    println!("{json}");
    Ok(())
}
