// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server bootstrap: configuration, storage, services, router.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use food_ordering_core::application::seed::seed_demo_data;
use food_ordering_core::application::{create_repositories, Services};
use food_ordering_core::domain::config::ServerConfig;
use food_ordering_core::domain::events::PolicyEvent;
use food_ordering_core::domain::repository::RepositoryError;
use food_ordering_core::infrastructure::event_bus::{DomainEvent, EventBus, EventBusError};
use food_ordering_core::infrastructure::JwtIdentityProvider;
use food_ordering_core::presentation::api::{app, AppState};

use crate::commands::seed::print_tokens;

pub async fn start_server(config_path: Option<PathBuf>, port: Option<u16>, seed: bool) -> Result<()> {
    let mut config = ServerConfig::load_or_default(config_path).context("Failed to load configuration")?;
    if let Some(port) = port {
        config.spec.server.port = port;
    }
    config.validate().context("Configuration validation failed")?;

    info!("Food ordering server starting (PID: {})", std::process::id());

    let repositories = create_repositories(&config.storage_backend()).await?;
    let event_bus = EventBus::new(config.spec.server.event_capacity);
    spawn_event_logger(&event_bus);
    let services = Services::new(repositories, event_bus);

    let identity = Arc::new(JwtIdentityProvider::new(
        &config.spec.auth.jwt_secret,
        config.spec.auth.token_ttl_minutes,
        services.repositories.users.clone(),
    ));

    if seed {
        match seed_demo_data(&services.repositories).await {
            Ok(data) => print_tokens(&identity, &data.users)?,
            Err(RepositoryError::Conflict(reason)) => warn!("Skipping demo seed: {}", reason),
            Err(e) => return Err(e).context("Failed to seed demo data"),
        }
    }

    let router = app(AppState::new(services, identity));

    let addr = config.listen_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shutting down");
    Ok(())
}

/// Writes every published domain event to the log until the bus closes.
fn spawn_event_logger(event_bus: &EventBus) {
    let mut receiver = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(DomainEvent::Policy(PolicyEvent::AccessDenied {
                    actor_id,
                    role,
                    action,
                    resource,
                    ..
                })) => {
                    info!(%actor_id, %role, %action, %resource, "audit: access denied");
                }
                Ok(DomainEvent::Order(event)) => info!("audit: {:?}", event),
                Ok(DomainEvent::Payment(event)) => info!("audit: {:?}", event),
                Err(EventBusError::Lagged(n)) => warn!("Event logger skipped {} events", n),
                Err(EventBusError::Closed) => break,
                Err(EventBusError::Empty) => {}
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
