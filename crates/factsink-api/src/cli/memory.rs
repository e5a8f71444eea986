//! Memory record CLI commands: list, put.
//!
//! Works against whichever store the global flags select, so
//! `factsink --sqlite ./m.db memory list` inspects a local replay.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use factsink_core::memory::store::MemoryStore;
use factsink_types::memory::{MemoryContent, MemoryRecord, ROOT_NAMESPACE};

#[derive(Subcommand)]
pub enum MemoryCommand {
    /// List records under a namespace, newest first.
    #[command(alias = "ls")]
    List {
        /// Namespace prefix to list.
        #[arg(long, default_value = ROOT_NAMESPACE)]
        namespace: String,

        /// Maximum number of records.
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Write one record directly (bypasses extraction).
    Put {
        /// Request identifier, e.g. `<sessionId>-<key>`.
        request_id: String,

        /// Record text, e.g. `name: Ann`.
        text: String,

        /// Namespace to store the record under.
        #[arg(long, default_value = ROOT_NAMESPACE)]
        namespace: String,
    },
}

pub async fn run(store: &impl MemoryStore, action: MemoryCommand, json: bool) -> Result<()> {
    match action {
        MemoryCommand::List { namespace, limit } => list_records(store, &namespace, limit, json).await,
        MemoryCommand::Put {
            request_id,
            text,
            namespace,
        } => put_record(store, request_id, text, namespace, json).await,
    }
}

pub async fn list_records(
    store: &impl MemoryStore,
    namespace: &str,
    limit: usize,
    json: bool,
) -> Result<()> {
    let records = store
        .list(namespace, limit)
        .await
        .with_context(|| format!("Failed to list records under '{namespace}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        println!(
            "  {} No records under '{}'.",
            style("i").blue().bold(),
            style(namespace).cyan(),
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Record").fg(Color::White),
        Cell::new("Text").fg(Color::White),
        Cell::new("Namespaces").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for record in &records {
        table.add_row(vec![
            Cell::new(&record.memory_record_id).fg(Color::Cyan),
            Cell::new(truncate(&record.content.text, 60)).fg(Color::White),
            Cell::new(record.namespaces.join(", ")).fg(Color::DarkGrey),
            Cell::new(record.created_at.format("%Y-%m-%d %H:%M:%S").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} record{}",
        style(records.len()).bold(),
        if records.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

pub async fn put_record(
    store: &impl MemoryStore,
    request_id: String,
    text: String,
    namespace: String,
    json: bool,
) -> Result<()> {
    let record = MemoryRecord {
        request_identifier: request_id,
        namespaces: vec![namespace],
        content: MemoryContent { text },
        timestamp: Utc::now(),
    };

    let outcome = store
        .batch_create(std::slice::from_ref(&record))
        .await
        .context("Failed to write record")?;

    if let Some(failed) = outcome.failed.first() {
        anyhow::bail!(
            "Record '{}' was rejected: {}",
            failed.request_identifier,
            failed.error_message.as_deref().unwrap_or("no reason given")
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!();
        println!(
            "  {} Stored '{}'",
            style("✓").green().bold(),
            style(&record.request_identifier).cyan(),
        );
        println!();
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
