//! Web server for Arquivista.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{Config, WebConfig};
use crate::file::FileStore;
use crate::{ArquivistaError, Database, Result};

use super::handlers::AppState;
use super::router::create_router;

/// Web server for the file organizer.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    web_config: WebConfig,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: Database, store: FileStore) -> Result<Self> {
        let addr = format!("{}:{}", config.web.host, config.web.port)
            .parse()
            .map_err(|e| {
                ArquivistaError::Config(format!(
                    "invalid web server address {}:{}: {}",
                    config.web.host, config.web.port, e
                ))
            })?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(db, store, config)),
            web_config: config.web.clone(),
        })
    }

    /// Get the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the router without binding a socket.
    pub fn router(&self) -> Router {
        create_router(self.app_state.clone(), &self.web_config)
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;

        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.router();
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
