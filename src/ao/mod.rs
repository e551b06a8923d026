/// AO process network
///
/// Spawning processes, sending signed messages and reading evaluation
/// results from the compute unit.

pub mod client;

pub use client::AoClient;

use crate::{error::UploadResult, tags::Tag, wallet::DataItemSigner};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Spawn a new process from a module on a scheduler
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub module: String,
    pub scheduler: String,
    pub tags: Vec<Tag>,
    pub data: Vec<u8>,
}

/// Message addressed to an existing process
#[derive(Debug, Clone)]
pub struct MessageRequest {
    pub process: String,
    pub tags: Vec<Tag>,
    pub data: Vec<u8>,
}

impl MessageRequest {
    /// Message carrying a single `Action` tag
    pub fn action(process: impl Into<String>, action: &str, data: impl Into<Vec<u8>>) -> Self {
        Self {
            process: process.into(),
            tags: vec![Tag::new(crate::tags::keys::ACTION, action)],
            data: data.into(),
        }
    }
}

/// Result of evaluating a message, as reported by the compute unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvalResult {
    #[serde(default)]
    pub output: serde_json::Value,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    #[serde(default)]
    pub spawns: Vec<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl EvalResult {
    /// False when the process reported an evaluation error
    pub fn is_ok(&self) -> bool {
        match &self.error {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        if self.is_ok() {
            return None;
        }
        self.error.as_ref().map(|e| match e {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Process network client
#[async_trait]
pub trait ProcessClient: Send + Sync {
    /// Spawn a process; returns the process id
    async fn spawn(&self, request: SpawnRequest, signer: &dyn DataItemSigner) -> UploadResult<String>;

    /// Send a message; returns the message id
    async fn message(
        &self,
        request: MessageRequest,
        signer: &dyn DataItemSigner,
    ) -> UploadResult<String>;

    /// Read the evaluation result of a message
    async fn result(&self, message: &str, process: &str) -> UploadResult<EvalResult>;
}
