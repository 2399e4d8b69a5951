use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hyperbind::metadata::validate::{is_valid_href, parse_action_method};
use hyperbind::{Config, HypermediaClient, RelationKind, Resource, ResourceBinding};

/// hyperbind - inspect and drive a hypermedia JSON API
#[derive(Parser)]
#[command(name = "hyperbind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/hyperbind/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL for relative hrefs, overriding the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a resource and print it as JSON
    Get {
        /// Resource URL or href
        url: String,
    },

    /// List the links, actions and sockets a resource advertises
    Relations {
        /// Resource URL or href
        url: String,
    },

    /// Load a resource and execute one of its actions
    Invoke {
        /// Resource URL or href
        url: String,

        /// Action relation name
        action: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    hyperbind::logging::init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let client = HypermediaClient::from_config(&config).context("Failed to build HTTP client")?;

    match cli.command {
        Commands::Get { url } => cmd_get(&client, &url).await,
        Commands::Relations { url } => cmd_relations(&client, &url).await,
        Commands::Invoke { url, action } => cmd_invoke(&client, &url, &action).await,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(base_url) = &cli.base_url {
        config.client.base_url = Some(base_url.clone());
        config.validate()?;
    }
    tracing::info!(base_url = ?config.client.base_url, "Configuration loaded");
    Ok(config)
}

async fn load(client: &HypermediaClient, url: &str) -> Result<ResourceBinding> {
    let binding = client.resource("resource");
    binding
        .load_from_url(Some(url), false)
        .await
        .with_context(|| format!("Failed to load '{}'", url))?;
    Ok(binding)
}

fn print_json(resource: &Resource) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(resource)?);
    Ok(())
}

async fn cmd_get(client: &HypermediaClient, url: &str) -> Result<()> {
    let binding = load(client, url).await?;
    print_json(&binding.value())
}

async fn cmd_relations(client: &HypermediaClient, url: &str) -> Result<()> {
    let resource = load(client, url).await?.value();
    let metadata = client.metadata();

    println!("links:");
    for name in metadata.relation_names(&resource, RelationKind::Link) {
        if let Some(link) = metadata.link_lookup(&resource, &name) {
            println!("  {:<20} {}", name, link.href);
        }
    }

    println!("actions:");
    for name in metadata.relation_names(&resource, RelationKind::Action) {
        if let Some(action) = metadata.action_lookup(&resource, &name) {
            let usable =
                is_valid_href(&action.href) && parse_action_method(&action.method).is_some();
            println!(
                "  {:<20} {:<7} {}{}",
                name,
                action.method,
                action.href,
                if usable { "" } else { "  (unavailable)" }
            );
        }
    }

    println!("sockets:");
    for name in metadata.relation_names(&resource, RelationKind::Socket) {
        if let Some(socket) = client.socket(&resource, &name) {
            println!("  {:<20} {:<7} {}", name, socket.method, socket.href);
        }
    }
    Ok(())
}

async fn cmd_invoke(client: &HypermediaClient, url: &str, action: &str) -> Result<()> {
    let binding = load(client, url).await?;
    let executor = client.action(action, action);
    executor.connect(&binding.data());

    let state = executor.state();
    if !state.is_available {
        bail!("Action '{}' is not available on '{}'", action, url);
    }
    tracing::info!(action, method = ?state.method, href = ?state.href, "Invoking action");

    let response = executor
        .execute()
        .await
        .with_context(|| format!("Action '{}' failed", action))?;
    match response.body {
        Some(body) => print_json(&body),
        None => {
            println!("{} (no content)", response.status);
            Ok(())
        }
    }
}
