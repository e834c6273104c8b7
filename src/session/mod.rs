pub mod feedback;
pub mod sources;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::environment::Environment;
use crate::orchestrator::models::{ChatRequest, ChatResponse, HistoryEntry, Source};
use crate::orchestrator::{ApiError, OrchestratorApi};

pub use crate::orchestrator::models::FeedbackType;
pub use feedback::{FeedbackPolicy, PendingForm, ReactionStep};
pub use sources::SourceView;

/// Shown in place of an answer when the round trip fails.
pub const ERROR_REPLY: &str =
    "I apologize, but I encountered an error. Please ensure your environment is deployed and running.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A user's verdict on one assistant answer. Present at most once per
/// message; once written the message accepts no further feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "type")]
    pub kind: FeedbackType,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

impl Message {
    fn user(content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.to_string(),
            timestamp: Utc::now(),
            sources: Vec::new(),
            feedback: None,
        }
    }

    fn assistant(content: &str, sources: Vec<Source>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.to_string(),
            timestamp: Utc::now(),
            sources,
            feedback: None,
        }
    }
}

/// Everything captured at the start of a send: the epoch it belongs to, the
/// endpoint it was addressed to, and the request body. Completion applies
/// against this snapshot, never against re-read session state.
pub struct PreparedSend {
    epoch: u64,
    endpoint: String,
    request: ChatRequest,
}

impl PreparedSend {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request(&self) -> &ChatRequest {
        &self.request
    }
}

/// One conversation with an environment's orchestrator: the append-only
/// message timeline, the continuity token the orchestrator issued for it,
/// and the in-flight state of the current send.
pub struct ChatSession {
    messages: Vec<Message>,
    conversation_id: Option<String>,
    loading: bool,
    epoch: u64,
    sources_selection: Option<Uuid>,
    policy: FeedbackPolicy,
    pending_form: Option<PendingForm>,
}

impl ChatSession {
    pub fn new(policy: FeedbackPolicy) -> Self {
        Self {
            messages: Vec::new(),
            conversation_id: None,
            loading: false,
            epoch: 0,
            sources_selection: None,
            policy,
            pending_form: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn policy(&self) -> FeedbackPolicy {
        self.policy
    }

    /// Send one user turn and wait for the orchestrator's answer.
    pub async fn send_message(
        &mut self,
        content: &str,
        environment: &Environment,
        api: &dyn OrchestratorApi,
    ) {
        let Some(prepared) = self.prepare_send(content, environment) else {
            return;
        };
        let outcome = api.chat(prepared.endpoint(), prepared.request()).await;
        self.complete_send(prepared, outcome);
    }

    /// The synchronous half of a send: validate, append the user message so
    /// it is visible before any network latency, raise the loading flag and
    /// snapshot everything the completion will need. Returns `None` (and
    /// leaves the session untouched) for empty content, an in-flight send,
    /// or an unresolvable environment.
    pub fn prepare_send(
        &mut self,
        content: &str,
        environment: &Environment,
    ) -> Option<PreparedSend> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        if self.loading {
            warn!("send rejected: a request is already in flight");
            return None;
        }
        let endpoint = match environment.endpoint() {
            Ok(endpoint) => endpoint.to_string(),
            Err(e) => {
                warn!("send rejected: {}", e);
                return None;
            }
        };

        let history: Vec<HistoryEntry> = self
            .messages
            .iter()
            .map(|m| HistoryEntry {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();

        self.messages.push(Message::user(content));
        self.loading = true;

        Some(PreparedSend {
            epoch: self.epoch,
            endpoint,
            request: ChatRequest {
                message: content.to_string(),
                conversation_id: self.conversation_id.clone(),
                history,
            },
        })
    }

    /// Apply the outcome of a send. Success appends the assistant answer and
    /// adopts the orchestrator's continuity token; failure appends the fixed
    /// error reply and leaves the token alone. A completion whose epoch
    /// predates the current chat is dropped wholesale. The loading flag is
    /// lowered on every path.
    pub fn complete_send(
        &mut self,
        prepared: PreparedSend,
        outcome: Result<ChatResponse, ApiError>,
    ) {
        if prepared.epoch != self.epoch {
            info!("discarding reply addressed to a superseded chat");
            self.loading = false;
            return;
        }

        match outcome {
            Ok(response) => {
                if let Some(error) = &response.error {
                    warn!("orchestrator flagged the answer: {}", error);
                }
                self.messages
                    .push(Message::assistant(&response.answer, response.sources));
                self.conversation_id = Some(response.conversation_id);
            }
            Err(e) => {
                warn!("chat request failed: {}", e);
                self.messages.push(Message::assistant(ERROR_REPLY, Vec::new()));
            }
        }

        self.loading = false;
    }

    /// Reset to an empty conversation. An outstanding send keeps running but
    /// its completion lands in a stale epoch and is discarded.
    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.conversation_id = None;
        self.sources_selection = None;
        self.pending_form = None;
        self.epoch += 1;
    }

    /// Open the sources panel for a message. Ignored unless the message
    /// exists and actually carries sources.
    pub fn select_sources(&mut self, id: Uuid) -> bool {
        match self.message(id) {
            Some(m) if !m.sources.is_empty() => {
                self.sources_selection = Some(id);
                true
            }
            _ => false,
        }
    }

    pub fn sources_selection(&self) -> Option<&Message> {
        self.sources_selection.and_then(|id| self.message(id))
    }

    pub fn clear_sources_selection(&mut self) {
        self.sources_selection = None;
    }
}
