//! Command line front end over the library facade. Prints JSON so the
//! output can be piped straight into other tools.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pictor::{GenerateRequest, GenerationParams, ProviderUpdate, Studio};

#[derive(Parser)]
#[command(name = "pictor", about = "AI image generation workbench", version)]
struct Cli {
    /// Directory holding configuration, history, and persisted images.
    #[arg(long, global = true, default_value = ".pictor")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List configured providers (credentials never shown).
    Providers,
    /// Generate images from a prompt.
    Generate {
        #[arg(long)]
        prompt: String,
        /// Provider id; defaults to the configured active provider.
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        size: Option<String>,
        /// Local reference image file, repeatable.
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// Skip persisting results and appending a history record.
        #[arg(long)]
        no_record: bool,
    },
    /// Update a provider's credentials and defaults.
    Configure {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        default_model: Option<String>,
        /// Make this the active provider.
        #[arg(long)]
        activate: bool,
    },
    /// Inspect or prune the generation history.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
    /// Persist a data URI or remote URL into the local image store.
    Persist { source: String },
}

#[derive(Subcommand)]
enum HistoryCommand {
    List,
    /// Delete a record and any local image files only it references.
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let studio = Studio::open(&cli.data_dir).await?;

    match cli.command {
        Command::Providers => {
            let providers = studio.providers().await?;
            println!("{}", serde_json::to_string_pretty(&providers)?);
        }
        Command::Generate {
            prompt,
            provider,
            model,
            size,
            images,
            no_record,
        } => {
            let provider = match provider {
                Some(provider) => provider,
                None => studio.config().load().await?.active_provider,
            };

            let mut request = GenerateRequest::new(prompt, provider);
            request.model = model;
            request.size = size;
            for path in &images {
                request
                    .images
                    .push(studio.images().read_as_data_uri(path).await?);
            }

            let response = if no_record {
                studio.generate(&request).await?
            } else {
                studio.generate_and_record(&request).await?
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.success {
                std::process::exit(1);
            }
        }
        Command::Configure {
            provider,
            api_key,
            base_url,
            default_model,
            activate,
        } => {
            let update = ProviderUpdate {
                api_key,
                base_url,
                default_model,
                set_active: activate,
            };
            studio.config().update_provider(&provider, &update).await?;
            let masked = studio.config().masked().await?;
            println!("{}", serde_json::to_string_pretty(&masked)?);
        }
        Command::History { command } => match command {
            HistoryCommand::List => {
                let records = studio.history().load().await?;
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
            HistoryCommand::Delete { id } => {
                studio.history().remove(&id).await?;
            }
        },
        Command::Persist { source } => {
            let path = studio
                .persist_and_record(&source, GenerationParams::default())
                .await?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
