//! Line-delimited JSON bridge between the voice-agent framework and the
//! function registry.
//!
//! One request per line in, one response per line out. A bad request gets
//! an error response; the loop only stops at end of input.

use crate::error::{AgentError, AgentResult};
use crate::functions::FunctionRegistry;
use crate::session::{parse_identity, SessionContext};
use crate::workflows::AgentServices;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeRequest {
    /// Echoed back so callers can match responses to requests
    #[serde(default)]
    pub id: Option<Value>,
    pub identity: String,
    pub function: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BridgeError>,
}

impl BridgeResponse {
    fn from_result(id: Option<Value>, result: AgentResult<String>) -> Self {
        match result {
            Ok(output) => Self {
                id,
                ok: true,
                output: Some(output),
                error: None,
            },
            Err(e) => Self {
                id,
                ok: false,
                output: None,
                error: Some(BridgeError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                }),
            },
        }
    }
}

/// Dispatches calls and keeps one session per participant.
pub struct Bridge {
    services: AgentServices,
    registry: FunctionRegistry,
    sessions: HashMap<Uuid, SessionContext>,
}

impl Bridge {
    pub fn new(services: AgentServices) -> Self {
        Self {
            services,
            registry: FunctionRegistry::new(),
            sessions: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Runs one function for `identity`, binding its session on first use.
    pub async fn invoke(
        &mut self,
        identity: &str,
        function: &str,
        arguments: Value,
    ) -> AgentResult<String> {
        let user_id = parse_identity(identity)?;
        if self.registry.get(function).is_none() {
            return Err(AgentError::Validation(format!("Unknown function: '{}'", function)));
        }

        if !self.sessions.contains_key(&user_id) {
            let session = SessionContext::bind(self.services.repo.as_ref(), user_id).await?;
            self.sessions.insert(user_id, session);
        }
        let session = self
            .sessions
            .get(&user_id)
            .ok_or_else(|| AgentError::Validation(format!("No session for '{}'", identity)))?;

        let result = self
            .registry
            .call(&self.services, session, function, arguments)
            .await;

        // A new category changes what the user may file tasks under.
        if function == "createCategory" && result.is_ok() {
            self.sessions.remove(&user_id);
        }
        result
    }

    pub async fn handle(&mut self, request: BridgeRequest) -> BridgeResponse {
        let result = self
            .invoke(&request.identity, &request.function, request.arguments)
            .await;
        BridgeResponse::from_result(request.id, result)
    }

    /// Serves requests until `reader` reaches end of input.
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> AgentResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<BridgeRequest>(&line) {
                Ok(request) => self.handle(request).await,
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable bridge request");
                    BridgeResponse::from_result(
                        None,
                        Err(AgentError::Validation(format!("Parse error: {}", e))),
                    )
                }
            };

            let encoded = serde_json::to_string(&response).map_err(std::io::Error::from)?;
            writer.write_all(encoded.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        tracing::info!("bridge input closed");
        Ok(())
    }
}
