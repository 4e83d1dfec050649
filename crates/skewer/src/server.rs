//! The Skewer server: one WebSocket listener for gameplay, one HTTP
//! listener for the lobby endpoints, one coordinator task behind both.

use std::net::SocketAddr;

use skewer_coordinator::{spawn_coordinator, CoordinatorConfig, CoordinatorHandle};
use skewer_engine::ChessRules;
use skewer_transport::{Transport, WebSocketTransport};
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::{handler, http};

/// Commands queued ahead of the coordinator before senders start waiting.
const COORDINATOR_CHANNEL_CAPACITY: usize = 256;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address for the WebSocket gameplay listener.
    pub ws_addr: String,
    /// Address for the HTTP lobby listener.
    pub http_addr: String,
    /// Coordinator timing.
    pub coordinator: CoordinatorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_addr: "0.0.0.0:8080".to_string(),
            http_addr: "0.0.0.0:8000".to_string(),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads overrides from `SKEWER_WS_ADDR` and `SKEWER_HTTP_ADDR`,
    /// falling back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("SKEWER_WS_ADDR") {
            config.ws_addr = addr;
        }
        if let Ok(addr) = std::env::var("SKEWER_HTTP_ADDR") {
            config.http_addr = addr;
        }
        config
    }
}

/// A bound but not yet running server.
///
/// Binding is separate from running so callers (tests in particular) can
/// bind port 0 and read the real addresses back before starting the loops.
pub struct Server {
    transport: WebSocketTransport,
    http_listener: TcpListener,
    coordinator: CoordinatorHandle,
}

impl Server {
    /// Binds both listeners and spawns the coordinator task.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let transport = WebSocketTransport::bind(&config.ws_addr).await?;
        let http_listener = TcpListener::bind(&config.http_addr).await?;
        let coordinator =
            spawn_coordinator(ChessRules, config.coordinator, COORDINATOR_CHANNEL_CAPACITY);
        Ok(Self {
            transport,
            http_listener,
            coordinator,
        })
    }

    /// The bound WebSocket address.
    pub fn ws_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The bound HTTP address.
    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http_listener.local_addr()
    }

    /// A handle to the coordinator task.
    pub fn coordinator(&self) -> CoordinatorHandle {
        self.coordinator.clone()
    }

    /// Serves both listeners until the process stops.
    pub async fn run(self) -> Result<(), ServerError> {
        let Server {
            mut transport,
            http_listener,
            coordinator,
        } = self;

        let http_addr = http_listener.local_addr()?;
        let router = http::router(coordinator.clone());
        tokio::spawn(async move {
            tracing::info!(%http_addr, "HTTP listener serving");
            if let Err(error) = axum::serve(http_listener, router).await {
                tracing::error!(%error, "HTTP listener stopped");
            }
        });

        loop {
            match transport.accept().await {
                Ok(connection) => {
                    tokio::spawn(handler::drive_connection(connection, coordinator.clone()));
                }
                Err(error) => {
                    // A single failed handshake is routine; keep accepting.
                    tracing::warn!(%error, "failed to accept connection");
                }
            }
        }
    }
}
