// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{sync::Arc, time::Duration};

use alloy::signers::local::PrivateKeySigner;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use encrypted_debt_register::{
    api::router,
    config::{Config, LogFormat, DEFAULT_LOG_FILTER},
    coprocessor::MockCoprocessor,
    state::AppState,
    storage::LedgerDb,
};

/// Time in-flight requests get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("Invalid configuration");
    init_tracing(config.log_format);

    // Open the ledger (file-backed when DATA_DIR is set)
    let db = match config.ledger_path() {
        Some(path) => {
            tracing::info!(path = %path.display(), "Opening ledger database");
            // Plaintexts and grants of the mock co-processor stay in memory,
            // so amounts recorded before a restart cannot be decrypted after it.
            tracing::warn!(
                "Co-processor state is not persisted; stored amount handles become undecryptable after a restart"
            );
            LedgerDb::open(&path).expect("Failed to open ledger database")
        }
        None => {
            tracing::warn!("DATA_DIR not set, ledger is in memory and will not survive restarts");
            LedgerDb::in_memory().expect("Failed to create in-memory ledger")
        }
    };

    let signer = match config.coprocessor_signer_key.as_deref() {
        Some(key) => key
            .parse::<PrivateKeySigner>()
            .expect("COPROCESSOR_SIGNER_KEY is not a valid private key"),
        None => {
            tracing::warn!("COPROCESSOR_SIGNER_KEY not set, using a random signer");
            PrivateKeySigner::random()
        }
    };
    let coprocessor = Arc::new(MockCoprocessor::new(signer, config.chain_id));

    let state = AppState::build(db, coprocessor, config.contract_address, config.auth_mode);
    let app = router(state);

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    tracing::info!(
        contract = %config.contract_address,
        chain_id = config.chain_id,
        auth_mode = ?config.auth_mode,
        "Encrypted debt register starting"
    );

    match config.tls {
        Some(tls) => {
            // Install the ring crypto provider for rustls (must be done before any TLS operations)
            rustls::crypto::ring::default_provider()
                .install_default()
                .expect("Failed to install rustls crypto provider");

            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .expect("Failed to load TLS certificate or key");

            tracing::info!(addr = %config.bind_addr, "Listening on https (docs at /docs)");
            axum_server::bind_rustls(config.bind_addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            tracing::info!(addr = %config.bind_addr, "Listening on http (docs at /docs)");
            axum_server::bind(config.bind_addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTP server failed");
        }
    }

    tracing::info!("Server stopped");
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Wait for Ctrl-C or SIGTERM, then start a graceful shutdown.
async fn shutdown_signal(handle: Handle<std::net::SocketAddr>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
