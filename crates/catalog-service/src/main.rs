// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! NFT Catalog Service
//!
//! Checks collaborator health and runs the configured distribution draw.

use anyhow::Result;
use catalog_service::{CatalogService, ServiceConfig, ServiceError};
use nft_catalog::metrics;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting NFT catalog service");

    let config = ServiceConfig::from_env()?;
    let service = CatalogService::from_config(config).await?;

    let health = service.health().await;
    match health.overall() {
        status if status.is_down() => {
            error!(reason = status.description(), "collaborator down");
        }
        status => info!(status = status.description(), "health check complete"),
    }

    let cancellation_token = CancellationToken::new();
    let signal_token = cancellation_token.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!(error = %e, "failed to listen for CTRL+C");
                    return;
                }
                warn!("Received CTRL+C signal, cancelling");
                signal_token.cancel();
            }
            () = signal_token.cancelled() => {}
        }
    });

    let outcome = match service.config().draw.clone() {
        Some(draw) => match service.run_draw(&draw, &cancellation_token).await {
            Ok(outcome) => {
                info!(
                    location = %outcome.location,
                    assigned = outcome.assignment.assigned_count(),
                    unassigned = outcome.assignment.unassigned.len(),
                    "distribution written"
                );
                Ok(())
            }
            Err(ServiceError::Cancelled) => {
                warn!("draw cancelled before completion");
                Ok(())
            }
            Err(e) => Err(e),
        },
        None => {
            info!("no draw configured");
            Ok(())
        }
    };
    cancellation_token.cancel();

    service.publish_metrics();
    match metrics::render() {
        Ok(text) => debug!(metrics = %text, "final metrics"),
        Err(e) => warn!(error = %e, "could not render metrics"),
    }

    outcome?;
    Ok(())
}
