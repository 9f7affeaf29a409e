//! sendq - command-line presenter for the sendq daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sendq_sdk::{EnqueueRequest, QueueItem, SendqClient};
use std::io::{BufRead, Write};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9531";
const PREVIEW_CHARS: usize = 40;

#[derive(Parser)]
#[command(name = "sendq")]
#[command(about = "Outbound message queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "SENDQ_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show queued messages
    Status,

    /// Queue a message
    Send {
        /// Channel or conversation id
        destination: String,

        /// Message text
        content: String,

        /// Text-to-speech flag
        #[arg(long)]
        tts: bool,

        /// Go through composer interception (honours queue_on_enter)
        #[arg(long)]
        submit: bool,
    },

    /// Toggle the paused state
    Pause,

    /// Remove every queued message
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show queue settings
    Settings,

    /// Update one setting, e.g. `sendq set delay_ms 1500`
    Set {
        key: String,

        /// JSON value; bare words are sent as strings
        value: String,
    },

    /// Show recent notifications
    Notifications {
        /// Only entries newer than this sequence number
        #[arg(long)]
        after: Option<u64>,
    },

    /// Show queue counters
    Stats,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    position: usize,
    id: String,
    destination: String,
    status: String,
    attempts: u32,
    content: String,
    last_error: String,
}

impl ItemRow {
    fn new(position: usize, item: QueueItem) -> Self {
        Self {
            position,
            id: item.id,
            destination: item.destination,
            status: item.status,
            attempts: item.attempts,
            content: preview(&item.payload.content),
            last_error: item.last_error.unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct SettingRow {
    key: &'static str,
    value: String,
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", head)
}

fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = SendqClient::connect(&cli.rpc_url)
        .await
        .context("Failed to connect to daemon")?;

    match cli.command {
        Commands::Status => {
            let snapshot = client.snapshot().await?;
            let state = if snapshot.paused {
                "PAUSED".yellow()
            } else {
                "RUNNING".green()
            };
            println!("{} {}", "Queue".cyan().bold(), state);
            println!();

            if snapshot.items.is_empty() {
                println!("{}", "Queue is empty".dimmed());
            } else {
                let rows: Vec<ItemRow> = snapshot
                    .items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| ItemRow::new(i + 1, item))
                    .collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Send {
            destination,
            content,
            tts,
            submit,
        } => {
            let request = EnqueueRequest {
                destination,
                content,
                tts,
            };

            if submit {
                let response = client.submit(request).await?;
                match response.item_id {
                    Some(id) => println!("{} {}", "✓ Queued".green().bold(), id),
                    None => println!(
                        "{}",
                        "○ Not intercepted (queue_on_enter or disabled); send it directly".yellow()
                    ),
                }
            } else {
                match client.enqueue(request).await {
                    Ok(response) => println!(
                        "{} {} ({} total)",
                        "✓ Queued".green().bold(),
                        response.item_id,
                        response.queue_len
                    ),
                    Err(e) if e.is_capacity_exceeded() => {
                        println!("{} {}", "✗".red(), e);
                        std::process::exit(2);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Commands::Pause => {
            let response = client.toggle_pause().await?;
            if response.paused {
                println!("{}", "Queue paused".yellow().bold());
            } else {
                println!("{}", "Queue resumed".green().bold());
            }
        }

        Commands::Clear { yes } => {
            let count = client.snapshot().await?.items.len();
            if count == 0 {
                println!("{}", "Queue is already empty".dimmed());
                return Ok(());
            }
            if !yes && !confirm(&format!("Clear all {} messages from queue? [y/N]", count))? {
                println!("Aborted");
                return Ok(());
            }
            let response = client.clear(true).await?;
            println!(
                "{}",
                format!("✓ Cleared {} messages", response.removed).green().bold()
            );
        }

        Commands::Settings => {
            let s = client.settings().await?;
            let rows = vec![
                SettingRow { key: "enabled", value: s.enabled.to_string() },
                SettingRow { key: "delay_ms", value: s.delay_ms.to_string() },
                SettingRow { key: "max_queue_size", value: s.max_queue_size.to_string() },
                SettingRow { key: "auto_send", value: s.auto_send.to_string() },
                SettingRow { key: "show_notifications", value: s.show_notifications.to_string() },
                SettingRow { key: "queue_on_enter", value: s.queue_on_enter.to_string() },
            ];
            println!("{}", Table::new(rows));
        }

        Commands::Set { key, value } => {
            let value = parse_value(&value);
            client.update_setting(key.clone(), value.clone()).await?;
            println!("{} {} = {}", "✓".green(), key.bold(), value);
        }

        Commands::Notifications { after } => {
            let response = client.notifications(after).await?;
            if response.entries.is_empty() {
                println!("{}", "No notifications".dimmed());
            }
            for entry in response.entries {
                let message = match entry.severity.as_str() {
                    "success" => entry.message.green(),
                    "failure" => entry.message.red(),
                    _ => entry.message.normal(),
                };
                println!("{:>5}  {}", entry.seq.to_string().dimmed(), message);
            }
        }

        Commands::Stats => {
            println!("{}", "Queue Stats".cyan().bold());
            println!();
            match client.stats().await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Version:".bold(), stats.version);
                    println!("  {} {}", "Paused:".bold(), stats.paused);
                    println!();
                    println!("  {} {}", "Total:".bold(), stats.total);
                    println!("  {} {}", "Pending:".bold(), stats.pending);
                    println!("  {} {}", "Sending:".bold(), stats.sending);
                    println!("  {} {}", "Failed:".bold(), stats.failed);
                    println!();
                    println!("  {} {} seconds", "Uptime:".bold(), stats.uptime_seconds);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("1500"), serde_json::json!(1500));
        assert_eq!(parse_value("false"), serde_json::json!(false));
        assert_eq!(parse_value("hello"), serde_json::json!("hello"));
    }

    #[test]
    fn test_preview_truncates_long_content() {
        assert_eq!(preview("short"), "short");
        let long = "x".repeat(PREVIEW_CHARS + 10);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 1);
        assert!(shown.ends_with('…'));
    }
}
