//! inbox CLI: trigger a Facebook message sync for one conversation, or
//! register a connected page. Config from env and optional CLI args.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facebook_graph::GraphClient;
use inbox_core::init_tracing;
use inbox_sync::{SyncConfig, SyncService};
use storage::{
    ChannelRecord, ChannelRepository, ConversationRepository, MessageRepository,
    SqlitePoolManager,
};
use tracing::error;

#[derive(Parser)]
#[command(name = "inbox")]
#[command(about = "Inbox sync CLI: sync Facebook messages, manage channels", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync one conversation's Facebook messages into the local inbox.
    Sync {
        #[arg(long)]
        company_id: String,
        #[arg(long)]
        conversation_id: String,
        /// Overrides DATABASE_URL.
        #[arg(long)]
        database_url: Option<String>,
    },
    /// Register (or refresh) a connected Facebook page and its access token.
    AddChannel {
        #[arg(long)]
        page_id: String,
        #[arg(long)]
        company_id: String,
        #[arg(long)]
        page_name: String,
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        database_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            company_id,
            conversation_id,
            database_url,
        } => handle_sync(company_id, conversation_id, database_url).await,
        Commands::AddChannel {
            page_id,
            company_id,
            page_name,
            access_token,
            database_url,
        } => handle_add_channel(page_id, company_id, page_name, access_token, database_url).await,
    }
}

struct Repos {
    conversations: ConversationRepository,
    channels: ChannelRepository,
    messages: MessageRepository,
}

async fn open_repos(config: &SyncConfig) -> Result<Repos> {
    let pool = SqlitePoolManager::new(&config.database_url)
        .await
        .context("Failed to open database")?;
    let conversations = ConversationRepository::new(pool.clone())
        .await
        .context("Failed to init conversations table")?;
    let channels = ChannelRepository::new(pool.clone())
        .await
        .context("Failed to init channels table")?;
    let messages = MessageRepository::new(pool)
        .await
        .context("Failed to init messages table")?;
    Ok(Repos {
        conversations,
        channels,
        messages,
    })
}

async fn handle_sync(
    company_id: String,
    conversation_id: String,
    database_url: Option<String>,
) -> Result<()> {
    let config = SyncConfig::load(database_url)?;
    config.validate()?;
    init_tracing(&config.log_file)?;

    let repos = open_repos(&config).await?;
    let api = Arc::new(GraphClient::with_base_url(
        config.graph_api_url.clone(),
        config.graph_api_version.clone(),
    ));
    let service = SyncService::new(repos.conversations, repos.channels, repos.messages, api);

    match service.sync_conversation(&company_id, &conversation_id).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => {
            error!(
                status = err.http_status(),
                "Sync failed: {}", err
            );
            Err(err).with_context(|| {
                format!("Sync failed for conversation {}", conversation_id)
            })
        }
    }
}

async fn handle_add_channel(
    page_id: String,
    company_id: String,
    page_name: String,
    access_token: String,
    database_url: Option<String>,
) -> Result<()> {
    let config = SyncConfig::load(database_url)?;
    init_tracing(&config.log_file)?;

    let repos = open_repos(&config).await?;
    let channel = ChannelRecord::new(page_id.clone(), company_id, page_name, access_token);
    repos
        .channels
        .save(&channel)
        .await
        .context("Failed to save channel")?;

    println!("Channel {} registered", page_id);
    Ok(())
}
