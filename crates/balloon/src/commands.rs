// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balloon trending` and `balloon status` implementations.

use std::io::IsTerminal;
use std::sync::Arc;

use balloon_config::BalloonConfig;
use balloon_core::{BalloonError, StorageAdapter, SystemClock, UserId};
use balloon_exchange::{Exchange, trending};
use balloon_storage::SqliteStorage;
use colored::Colorize;
use serde::Serialize;

/// Structured output of `balloon status --json`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub user: String,
    pub known: bool,
    pub credits: Option<u32>,
}

/// Open the configured database and wrap it in an exchange.
pub async fn open_exchange(
    config: &BalloonConfig,
) -> Result<(Exchange, Arc<dyn StorageAdapter + Send + Sync>), BalloonError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter + Send + Sync> = Arc::new(storage);
    let exchange = Exchange::new(storage.clone(), Arc::new(SystemClock), config);
    Ok((exchange, storage))
}

pub async fn run_trending(config: &BalloonConfig) -> Result<(), BalloonError> {
    let (exchange, storage) = open_exchange(config).await?;
    let top = exchange.trending().await?;
    storage.close().await?;

    if top.is_empty() {
        println!("{}", "nothing trending yet".dimmed());
        return Ok(());
    }
    for line in trending::render(&top) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_status(
    config: &BalloonConfig,
    platform: &str,
    native_id: &str,
    json: bool,
) -> Result<(), BalloonError> {
    let user = UserId::new(platform, native_id);
    let (exchange, storage) = open_exchange(config).await?;
    let credits = exchange.credits(&user).await?;
    storage.close().await?;

    let response = StatusResponse {
        user: user.to_string(),
        known: credits.is_some(),
        credits,
    };
    if json {
        let out = serde_json::to_string_pretty(&response)
            .map_err(|e| BalloonError::Internal(format!("failed to serialize status: {e}")))?;
        println!("{out}");
    } else {
        print_status(&response, std::io::stdout().is_terminal());
    }
    Ok(())
}

fn print_status(response: &StatusResponse, color: bool) {
    let line = match response.credits {
        Some(credits) => format!("{}: {credits} credits", response.user),
        None => format!("{}: unknown user", response.user),
    };
    if color && response.credits == Some(0) {
        println!("{}", line.yellow());
    } else {
        println!("{line}");
    }
}
