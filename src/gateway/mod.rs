//! Typed access to the spreadsheet-backed board API.
//!
//! Every operation is one [`GatewayRequest`] variant. The remote API answers
//! with an [`Envelope`]; `success: false` becomes [`GatewayError::Rejected`]
//! carrying the server's message.

pub mod local;
pub mod remote;

use crate::config::Config;
use crate::models::{CheckRequest, DeleteRequest, DirectoryEntry, ShiftRecord};
use crate::time::format_text;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use local::LocalStore;
pub use remote::RemoteClient;

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayRequest {
    ReadShifts,
    WriteShifts(Vec<ShiftRecord>),
    ReadDirectory,
    AddEntry(DirectoryEntry),
    UpdateEntry(DirectoryEntry),
    DeleteEntry { name: String },
    UpdateCheck { name: String, checked: bool },
}

impl GatewayRequest {
    /// Value of the `action` query parameter.
    pub fn action(&self) -> &'static str {
        match self {
            GatewayRequest::ReadShifts => "getShiftData",
            GatewayRequest::WriteShifts(_) => "updateShiftData",
            GatewayRequest::ReadDirectory => "getUrlData",
            GatewayRequest::AddEntry(_) => "addUrlData",
            GatewayRequest::UpdateEntry(_) => "updateUrlData",
            GatewayRequest::DeleteEntry { .. } => "deleteUrlData",
            GatewayRequest::UpdateCheck { .. } => "updateCheckStatus",
        }
    }

    /// JSON body for write operations; reads carry none.
    pub fn body(&self) -> Result<Option<Value>, GatewayError> {
        let body = match self {
            GatewayRequest::ReadShifts | GatewayRequest::ReadDirectory => return Ok(None),
            GatewayRequest::WriteShifts(shifts) => json!({ "data": shifts }),
            GatewayRequest::AddEntry(entry) | GatewayRequest::UpdateEntry(entry) => {
                serde_json::to_value(entry).map_err(|err| GatewayError::Decode(err.to_string()))?
            }
            GatewayRequest::DeleteEntry { name } => json!(DeleteRequest { name: name.clone() }),
            GatewayRequest::UpdateCheck { name, checked } => json!(CheckRequest {
                name: name.clone(),
                checked: *checked,
            }),
        };
        Ok(Some(body))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn data(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn into_reply(self) -> Result<Reply, GatewayError> {
        if self.success {
            return Ok(Reply {
                data: self.data,
                message: self.message,
            });
        }
        let reason = self
            .error
            .or(self.message)
            .unwrap_or_else(|| "request was rejected".to_string());
        Err(GatewayError::Rejected(reason))
    }
}

/// Payload of a successful call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub data: Option<Value>,
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl GatewayError {
    /// Text for a toast: the server's own words when it refused, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            GatewayError::Rejected(reason) => reason.clone(),
            _ => fallback.to_string(),
        }
    }
}

pub enum Gateway {
    Remote(RemoteClient),
    Local(LocalStore),
}

impl Gateway {
    /// Remote client when an endpoint is configured, the JSON file otherwise.
    pub async fn from_config(config: &Config) -> Result<Self, GatewayError> {
        match &config.api_url {
            Some(endpoint) => {
                info!("using remote board API at {endpoint}");
                Ok(Gateway::Remote(RemoteClient::new(endpoint.clone(), config.timeout)?))
            }
            None => {
                info!("using local board file {}", config.data_path.display());
                Ok(Gateway::Local(LocalStore::open(config.data_path.clone()).await))
            }
        }
    }

    pub async fn send(&self, request: GatewayRequest) -> Result<Reply, GatewayError> {
        let action = request.action();
        debug!(action, "gateway call");
        let envelope = match self {
            Gateway::Remote(client) => client.send(&request).await?,
            Gateway::Local(store) => store.handle(request).await?,
        };
        envelope
            .into_reply()
            .inspect_err(|err| warn!(action, "gateway call rejected: {err}"))
    }

    pub async fn read_shifts(&self) -> Result<Vec<ShiftRecord>, GatewayError> {
        let reply = self.send(GatewayRequest::ReadShifts).await?;
        let mut shifts: Vec<ShiftRecord> = decode_list(reply.data)?;
        // Time cells come back as timestamps once the sheet has typed them.
        for shift in &mut shifts {
            shift.time = format_text(&shift.time);
        }
        Ok(shifts)
    }

    pub async fn write_shifts(&self, shifts: Vec<ShiftRecord>) -> Result<Reply, GatewayError> {
        self.send(GatewayRequest::WriteShifts(shifts)).await
    }

    pub async fn read_directory(&self) -> Result<Vec<DirectoryEntry>, GatewayError> {
        let reply = self.send(GatewayRequest::ReadDirectory).await?;
        decode_list(reply.data)
    }

    pub async fn add_entry(&self, entry: DirectoryEntry) -> Result<Reply, GatewayError> {
        self.send(GatewayRequest::AddEntry(entry)).await
    }

    pub async fn update_entry(&self, entry: DirectoryEntry) -> Result<Reply, GatewayError> {
        self.send(GatewayRequest::UpdateEntry(entry)).await
    }

    pub async fn delete_entry(&self, name: &str) -> Result<Reply, GatewayError> {
        self.send(GatewayRequest::DeleteEntry {
            name: name.to_string(),
        })
        .await
    }

    pub async fn update_check(&self, name: &str, checked: bool) -> Result<Reply, GatewayError> {
        self.send(GatewayRequest::UpdateCheck {
            name: name.to_string(),
            checked,
        })
        .await
    }
}

fn decode_list<T: DeserializeOwned>(data: Option<Value>) -> Result<Vec<T>, GatewayError> {
    match data {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(|err| GatewayError::Decode(err.to_string())),
    }
}
