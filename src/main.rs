use anyhow::{Context, Result};
use clap::Parser;
use image_generator::cli;
use image_generator::controller::GenerationController;
use image_generator::models::{load_endpoints, Config};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "image-generator")]
#[command(about = "Generate images from text prompts with hosted models")]
struct CliArgs {
    /// Model to use, by display name (e.g. "Flux").
    #[arg(short, long)]
    model: Option<String>,

    /// Prompt for a single generation; starts an interactive session when omitted.
    #[arg(short, long)]
    prompt: Option<String>,

    /// Directory the generated image is saved to.
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// JSON file with a custom list of models.
    #[arg(long, value_name = "FILE")]
    endpoints: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "image_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = &args.endpoints {
        let endpoints = load_endpoints(path)
            .with_context(|| format!("Failed to load endpoints from {}", path.display()))?;
        config = config.with_endpoints(endpoints);
    }
    if let Some(dir) = &args.output_dir {
        config = config.with_download_dir(dir.clone());
    }

    let mut controller = GenerationController::from_config(config);
    if let Some(model) = &args.model {
        controller.select_endpoint_by_name(model)?;
    }

    match args.prompt {
        Some(prompt) => {
            controller.set_prompt(prompt);
            match controller.submit().await {
                Ok(handle) => {
                    if let Some(path) = controller.download(Some(&handle))? {
                        println!("{}", path.display());
                    }
                    info!("Generation completed successfully");
                    Ok(())
                }
                Err(e) => {
                    error!("Generation failed: {}", e);
                    if let Some(message) = &controller.state().last_error {
                        eprintln!("{}", message);
                    }
                    std::process::exit(1);
                }
            }
        }
        None => {
            cli::run_interactive(&mut controller).await?;
            Ok(())
        }
    }
}
