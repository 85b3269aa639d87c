//! Safar CLI
//!
//! Command-line client for the Safar API:
//! - Browse feed topics and articles
//! - Read and post articles
//! - Read, send and follow chat messages
//! - Run deal analytics reports

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand, ValueEnum};
use safar::analytics::Report;
use safar::chat::{format_age, ChatError, ChatPanel, DEFAULT_HISTORY_LIMIT};
use safar::client::ApiClient;
use safar::feed::{ArticleAction, ArticleDraft, FeedController, FeedError};
use safar::store::ChatMessage;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "safar")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Shark Tank India feed, chat and deal analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, env = "SAFAR_API_URL", default_value = "http://localhost:8082", global = true)]
    pub api_url: String,

    /// Bearer token of a configured user
    #[arg(long, env = "SAFAR_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List active feed topics
    Topics,

    /// List articles, newest first
    Articles,

    /// Read an article (login required)
    Read {
        /// Article id
        id: String,
    },

    /// Post an article (login required)
    Post {
        #[arg(short, long)]
        title: String,
        /// Import from an external URL
        #[arg(short, long, conflicts_with = "write", required_unless_present = "write")]
        link: Option<String>,
        /// Write the article body in place
        #[arg(short, long)]
        write: Option<String>,
        #[arg(short, long)]
        summary: Option<String>,
    },

    /// Community chat (login required)
    Chat {
        #[command(subcommand)]
        command: ChatCommand,
    },

    /// Run a deal analytics report
    Analytics {
        /// overview, industries, insights, trends or startups
        report: String,
        /// Restrict to one season
        #[arg(short, long)]
        season: Option<u32>,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ChatCommand {
    /// Show recent messages
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Send a message
    Send {
        text: String,
    },
    /// Follow the room live until Ctrl+C
    Watch {
        /// Messages of history to show first
        #[arg(short, long)]
        limit: Option<usize>,
        /// Refetch interval in milliseconds
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Arc::new(ApiClient::new(&cli.api_url, cli.token.clone()));

    match cli.command {
        Commands::Topics => {
            let mut feed = FeedController::new(Arc::clone(&client));
            feed.load().await.map_err(feed_error)?;
            emit(cli.format, feed.topics(), |topics| {
                if topics.is_empty() {
                    println!("No topics yet.");
                    return;
                }
                println!("{:<4} {:<32} {:<14} {}", "", "Title", "Category", "Description");
                println!("{}", "-".repeat(80));
                for topic in topics {
                    println!(
                        "{:<4} {:<32} {:<14} {}",
                        topic.icon,
                        topic.title,
                        topic.category,
                        topic.description.as_deref().unwrap_or("-")
                    );
                }
            })?;
        }

        Commands::Articles => {
            let mut feed = FeedController::new(Arc::clone(&client));
            feed.load().await.map_err(feed_error)?;
            emit(cli.format, feed.articles(), |articles| {
                if articles.is_empty() {
                    println!("No articles yet.");
                    println!();
                    println!("Post the first one with:");
                    println!("  safar post --title \"...\" --link https://...");
                    return;
                }
                println!("{:<36} {:<10} {:<18} {}", "ID", "Kind", "Author", "Title");
                println!("{}", "-".repeat(100));
                for article in articles {
                    let kind = if article.is_internal() { "written" } else { "link" };
                    println!(
                        "{:<36} {:<10} {:<18} {}",
                        article.id, kind, article.author_name, article.title
                    );
                }
            })?;
        }

        Commands::Read { id } => {
            let session = client.session().await?;
            let mut feed = FeedController::new(Arc::clone(&client));
            feed.load().await.map_err(feed_error)?;

            let action = feed
                .open_article(session.as_ref(), &id)
                .map_err(feed_error)?;
            let article = feed
                .articles()
                .iter()
                .find(|a| a.id == id)
                .with_context(|| format!("Article {} disappeared", id))?;

            let data = serde_json::json!({ "article": article, "content": action });
            emit(cli.format, &data, |_| {
                println!("{}", article.title);
                println!("by {}", article.author_name);
                println!();
                match &action {
                    ArticleAction::OpenExternal { url } => println!("Read at: {}", url),
                    ArticleAction::Expanded { body } => println!("{}", body),
                    ArticleAction::Collapsed => {}
                }
            })?;
        }

        Commands::Post {
            title,
            link,
            write,
            summary,
        } => {
            let mut draft = match (link, write) {
                (Some(link), _) => ArticleDraft::link(title, link),
                (None, Some(body)) => ArticleDraft::write(title, body),
                (None, None) => bail!("Either --link or --write is required"),
            };
            if let Some(summary) = summary {
                draft = draft.summary(summary);
            }

            let session = client.session().await?;
            let mut feed = FeedController::new(Arc::clone(&client));
            let article = feed
                .submit(session.as_ref(), &mut draft)
                .await
                .map_err(feed_error)?;

            emit(cli.format, article, |article| {
                println!("Posted \"{}\" ({})", article.title, article.id);
            })?;
        }

        Commands::Chat { command } => match command {
            ChatCommand::History { limit } => {
                let session = client.session().await?;
                let mut panel = ChatPanel::with_history_limit(
                    Arc::clone(&client),
                    limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
                );
                panel.open(session.as_ref()).await.map_err(chat_error)?;
                let messages = panel.messages();
                panel.close();

                emit(cli.format, &messages, |messages| {
                    if messages.is_empty() {
                        println!("No messages yet. Say hello!");
                        return;
                    }
                    let now = Local::now();
                    for message in messages {
                        print_message(message, &now);
                    }
                })?;
            }

            ChatCommand::Send { text } => {
                let session = client.session().await?;
                let mut panel = ChatPanel::new(Arc::clone(&client));
                let mut input = text;
                let message = panel
                    .send(session.as_ref(), &mut input)
                    .await
                    .map_err(chat_error)?;

                emit(cli.format, &message, |message| {
                    println!("Sent as {}", message.user_name);
                })?;
            }

            ChatCommand::Watch { limit, interval_ms } => {
                let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
                let client = Arc::new(
                    ApiClient::new(&cli.api_url, cli.token.clone())
                        .poll_interval(Duration::from_millis(interval_ms))
                        .history_limit(limit),
                );
                let session = client.session().await?;

                let mut panel = ChatPanel::with_history_limit(Arc::clone(&client), limit);
                panel.open(session.as_ref()).await.map_err(chat_error)?;

                for message in panel.messages() {
                    watch_line(cli.format, &message)?;
                }
                if cli.format == Format::Table {
                    println!("-- live, Ctrl+C to leave --");
                }

                loop {
                    tokio::select! {
                        next = panel.next_message() => match next.map_err(chat_error)? {
                            Some(message) => watch_line(cli.format, &message)?,
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
                panel.close();
            }
        },

        Commands::Analytics { report, season } => {
            let report: Report = report.parse().map_err(anyhow::Error::msg)?;
            let path = match season {
                Some(season) => format!("/analytics/{}?season={}", report, season),
                None => format!("/analytics/{}", report),
            };
            let data: Value = client.get_json(&path).await?;
            emit(cli.format, &data, |data| print_report(report, data))?;
        }

        Commands::Status => {
            let health: Value = client.health().await.with_context(|| {
                format!(
                    "Cannot connect to Safar API at {}. Start it with: cargo run --bin safar",
                    cli.api_url
                )
            })?;

            emit(cli.format, &health, |health| {
                println!("Safar v{}", str_field(health, "version"));
                println!();
                println!("API Status: {}", str_field(health, "status"));
                println!("Store: {}", str_field(health, "store"));
                println!("Deals loaded: {}", health["deals_loaded"]);
                println!("WebSocket connections: {}", health["ws_connections"]);
                println!("Live subscriptions: {}", health["active_subscriptions"]);
                if let Some(uptime) = health["uptime_seconds"].as_u64() {
                    println!();
                    println!("Uptime: {}", format_duration(uptime));
                }
            })?;
        }

        Commands::Config { output } => {
            let config = safar::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

const TOKEN_HINT: &str = "pass --token or set SAFAR_TOKEN";

fn feed_error(e: FeedError) -> anyhow::Error {
    match e {
        FeedError::LoginRequired(message) => anyhow!("{} ({})", message, TOKEN_HINT),
        other => other.into(),
    }
}

fn chat_error(e: ChatError) -> anyhow::Error {
    match e {
        ChatError::LoginRequired(message) => anyhow!("{} ({})", message, TOKEN_HINT),
        other => other.into(),
    }
}

fn print_message(message: &ChatMessage, now: &DateTime<Local>) {
    let age = format_age(&message.created_at.with_timezone(&Local), now);
    println!("[{:>11}] {}: {}", age, message.user_name, message.message);
}

/// One message per line: the table row, or compact JSON
fn watch_line(format: Format, message: &ChatMessage) -> anyhow::Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(message)?),
        Format::Table => print_message(message, &Local::now()),
    }
    Ok(())
}

fn emit<T: Serialize + ?Sized>(
    format: Format,
    data: &T,
    table: impl FnOnce(&T),
) -> anyhow::Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(data)?),
        Format::Table => table(data),
    }
    Ok(())
}

fn as_rows(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or("-")
}

fn print_report(report: Report, data: &Value) {
    match report {
        Report::Overview => {
            println!("Total deals:   {}", data["total_deals"]);
            println!("Total funding: {}", str_field(data, "total_funding_display"));
            println!("Average deal:  {}", str_field(data, "avg_deal_display"));
            println!("Sharks:        {}", data["total_sharks"]);
        }
        Report::Industries => {
            println!(
                "{:<24} {:>6} {:>14} {:>14} {:>8}",
                "Industry", "Deals", "Invested", "Avg valuation", "Funded"
            );
            println!("{}", "-".repeat(70));
            for row in as_rows(data) {
                println!(
                    "{:<24} {:>6} {:>14} {:>14} {:>7.0}%",
                    str_field(row, "name"),
                    row["deals"],
                    str_field(row, "total_investment_display"),
                    str_field(row, "avg_valuation_display"),
                    row["funded_ratio"].as_f64().unwrap_or(0.0) * 100.0
                );
            }
        }
        Report::Insights => {
            println!("Average deal size: {}", str_field(data, "avg_deal_size_display"));
            println!("Top industry:      {}", str_field(data, "top_industry"));
            println!(
                "Success rate:      {:.0}%",
                data["success_rate"].as_f64().unwrap_or(0.0)
            );
            println!(
                "Market fit:        {:.0}%",
                data["market_fit"].as_f64().unwrap_or(0.0)
            );
            println!("Scalability:       {}", str_field(data, "scalability"));
            println!("Team experience:   {}", str_field(data, "team_experience"));
            println!("Preferred stage:   {}", str_field(data, "preferred_stage"));
            println!("Equity range:      {}", str_field(data, "equity_range"));
        }
        Report::Trends => {
            println!("{:<10} {:>6} {:>16}", "Season", "Deals", "Invested (Cr)");
            println!("{}", "-".repeat(34));
            for row in as_rows(data) {
                println!(
                    "{:<10} {:>6} {:>16.1}",
                    str_field(row, "label"),
                    row["deals"],
                    row["investment_crore"].as_f64().unwrap_or(0.0)
                );
            }
        }
        Report::Startups => {
            println!(
                "{:<24} {:<20} {:>7} {:>12} {}",
                "Startup", "Industry", "Season", "Valuation", "Status"
            );
            println!("{}", "-".repeat(80));
            for row in as_rows(data) {
                println!(
                    "{:<24} {:<20} {:>7} {:>12} {}",
                    str_field(row, "name"),
                    str_field(row, "industry"),
                    row["season"],
                    str_field(row, "valuation_display"),
                    str_field(row, "status")
                );
            }
        }
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
