//! `factsink process`: run the handler once on a captured event.

use anyhow::{Context, Result};
use console::style;
use tokio::io::AsyncReadExt;

use factsink_core::message::{InboundEvent, decode_event};

use crate::state::AppState;

pub async fn process_file(state: &AppState, input: &str, json: bool) -> Result<()> {
    let body = read_input(input).await?;

    let notifications = match decode_event(&body)? {
        InboundEvent::Notifications(notifications) => notifications,
        InboundEvent::SubscriptionConfirmation { subscribe_url, .. } => {
            anyhow::bail!(
                "'{input}' is a subscription confirmation (SubscribeURL: {subscribe_url}); nothing to process"
            );
        }
        InboundEvent::UnsubscribeConfirmation { .. } => {
            anyhow::bail!("'{input}' is an unsubscribe confirmation; nothing to process");
        }
    };

    let outcome = state
        .processor
        .process_all(&notifications)
        .await
        .with_context(|| format!("Processing '{input}' failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Processed {} notification{}, stored {} record{}",
        style("✓").green().bold(),
        style(notifications.len()).bold(),
        if notifications.len() == 1 { "" } else { "s" },
        style(outcome.stored).cyan().bold(),
        if outcome.stored == 1 { "" } else { "s" },
    );
    println!();
    Ok(())
}

async fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("Failed to read event from stdin")?;
        return Ok(buf);
    }
    tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read event file '{input}'"))
}
