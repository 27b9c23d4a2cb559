use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use futures::FutureExt;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use folio::cards::{Card, CardStore, InMemoryCardStore, PROJECTS, SKILLS_AND_EXPERIENCE};
use folio::{ChannelNotifier, Config, Core, CoreEvent, FolioConfig, ProxyClient, default_tools};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file; overrides the connection flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the chat proxy
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,

    /// Path appended to the base URL
    #[arg(long, default_value = "chat")]
    endpoint: String,

    /// Model to request
    #[arg(long, default_value = "gpt-4")]
    model: String,

    /// Maximum transport calls per answer
    #[arg(long, default_value = "10")]
    max_turns: u32,
}

fn sample_store() -> Result<InMemoryCardStore> {
    Ok(InMemoryCardStore::new()
        .with_collection(
            PROJECTS,
            [
                Card::new("Raytracer", "A toy path tracer written over a weekend."),
                Card::new("Chess engine", "Bitboard move generation and alpha-beta search."),
                Card::new("Portfolio", "This site, with a chat assistant that rearranges it."),
            ],
        )?
        .with_collection(
            SKILLS_AND_EXPERIENCE,
            [
                Card::new("Rust", "Four years of systems and backend work."),
                Card::new("TypeScript", "Front-end work on several production apps."),
            ],
        )?)
}

fn print_layout(store: &dyn CardStore) -> Result<()> {
    for name in store.collection_names() {
        let collection = store.list_collection(&name)?;
        let cards: Vec<String> = collection
            .cards
            .iter()
            .map(|card| {
                if card.is_expanded {
                    format!("[{}]", card.title)
                } else {
                    card.title.clone()
                }
            })
            .collect();
        println!("  {name}: {}", cards.join(", "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let store = Arc::new(sample_store()?);
    let (notifier, mut alerts) = ChannelNotifier::channel();
    tokio::spawn(async move {
        while let Some(alert) = alerts.recv().await {
            println!("*** {alert} ***");
        }
    });

    let core = if let Some(path) = &args.config {
        let config = FolioConfig::load(path)?;
        let registry = config.default_tools(store.clone(), Arc::new(notifier));
        Core::from_config(&config, registry)?
    } else {
        let config = Config::new(&args.model)
            .with_base_url(&args.base_url)
            .with_endpoint(&args.endpoint);
        let registry = default_tools(store.clone(), Arc::new(notifier), false);
        Core::new(ProxyClient::new(config)?, registry)
            .with_max_turns(args.max_turns)
            .with_request_timeout(Duration::from_secs(60))
    };

    let core = core.with_event_callback(|event| {
        async move {
            if let CoreEvent::ToolResult { name, result, .. } = event {
                info!("{name} -> {result}");
            }
        }
        .boxed()
    });

    info!("Portfolio chat");
    info!("Max turns: {}", core.max_turns());
    print_layout(store.as_ref())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        core.append_user_message(line).await?;
        match core.generate_response().await {
            Ok(reply) => println!("{}", reply.content),
            Err(e) => warn!("No answer: {e}"),
        }
        print_layout(store.as_ref())?;
    }

    Ok(())
}
