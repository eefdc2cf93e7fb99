//! Desktop-side client for the bridge.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use sushi_core::{
    BRIDGE_PATH, BridgeStatus, DEFAULT_PORT, HealthResponse, ImportRequest, QueuedResponse,
};

use crate::error::ClientError;

const SEND_TIMEOUT: Duration = Duration::from_secs(3);
const PING_TIMEOUT: Duration = Duration::from_secs(1);

/// HTTP client that submits import requests to a bridge on this machine.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    url: String,
    http: reqwest::Client,
}

impl BridgeClient {
    /// Client for the bridge on the default port.
    pub fn new() -> Result<Self, ClientError> {
        Self::with_port(DEFAULT_PORT)
    }

    /// Client for a bridge on another loopback port.
    pub fn with_port(port: u16) -> Result<Self, ClientError> {
        Self::with_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
    }

    /// Client for a bridge at an explicit address.
    pub fn with_addr(addr: SocketAddr) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            url: format!("http://{addr}{BRIDGE_PATH}"),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submit files for import and return the bridge's acknowledgement.
    pub async fn import(&self, files: Vec<String>) -> Result<QueuedResponse, ClientError> {
        let response = self
            .http
            .post(&self.url)
            .timeout(SEND_TIMEOUT)
            .json(&ImportRequest::import(files))
            .send()
            .await
            .map_err(ClientError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        response.json().await.map_err(ClientError::Decode)
    }

    /// Fetch the health check body.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self
            .http
            .get(&self.url)
            .timeout(PING_TIMEOUT)
            .send()
            .await
            .map_err(ClientError::Unreachable)?;
        response.json().await.map_err(ClientError::Decode)
    }

    /// Send files for import, folding every failure into a status the UI can show.
    pub async fn send_files(&self, files: Vec<String>) -> BridgeStatus {
        match self.import(files).await {
            // Queued; the acknowledgement body is informational.
            Ok(_) | Err(ClientError::Decode(_)) => BridgeStatus::connected(),
            Err(ClientError::Rejected { status, body }) => {
                BridgeStatus::rejected(format!("Blender returned {status}: {body}"))
            }
            Err(_) => BridgeStatus::disconnected(
                "Blender addon not running. Open Blender and enable the Sushi addon.",
            ),
        }
    }

    /// Check whether a bridge answers at all.
    pub async fn ping(&self) -> BridgeStatus {
        match self
            .http
            .get(&self.url)
            .timeout(PING_TIMEOUT)
            .send()
            .await
        {
            Ok(_) => BridgeStatus::connected(),
            Err(_) => BridgeStatus::disconnected("Blender addon not reachable"),
        }
    }
}
