use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::environment::Environment;
use crate::orchestrator::models::{FeedbackRequest, FeedbackType, OrchestratorSettings};
use crate::orchestrator::{ApiError, OrchestratorApi};

use super::{ChatSession, Feedback, Role};

/// What the session may collect for an answer, resolved once from the
/// orchestrator's settings and fixed for the session's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct FeedbackPolicy {
    pub enabled: bool,
    /// When set, a reaction opens a star-rating form instead of submitting
    /// right away.
    pub detailed_rating: bool,
}

impl From<OrchestratorSettings> for FeedbackPolicy {
    fn from(settings: OrchestratorSettings) -> Self {
        Self {
            enabled: settings.enable_user_feedback,
            detailed_rating: settings.user_feedback_rating,
        }
    }
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        OrchestratorSettings::default().into()
    }
}

/// An open detailed-rating form for one assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingForm {
    pub message_id: Uuid,
    pub kind: FeedbackType,
}

/// Snapshot of a feedback submission taken at call start, mirroring
/// `PreparedSend` on the chat side.
pub struct PreparedFeedback {
    endpoint: String,
    message_id: Uuid,
    request: FeedbackRequest,
}

impl PreparedFeedback {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request(&self) -> &FeedbackRequest {
        &self.request
    }
}

/// What a reaction resolved to.
pub enum ReactionStep {
    /// A precondition failed; nothing happened.
    Ignored,
    /// Detailed rating is required: the form is now open, no network yet.
    FormOpened,
    /// Quick reaction: ready to submit with no rating or comment.
    Submit(PreparedFeedback),
}

impl ChatSession {
    pub fn pending_form(&self) -> Option<PendingForm> {
        self.pending_form
    }

    /// Thumbs up / thumbs down on an assistant answer. Submits immediately,
    /// or opens the rating form first when the policy demands one.
    pub async fn react(
        &mut self,
        message_id: Uuid,
        kind: FeedbackType,
        environment: &Environment,
        api: &dyn OrchestratorApi,
    ) {
        match self.prepare_reaction(message_id, kind, environment) {
            ReactionStep::Ignored | ReactionStep::FormOpened => {}
            ReactionStep::Submit(prepared) => {
                let outcome = api.feedback(prepared.endpoint(), prepared.request()).await;
                self.complete_feedback(prepared, outcome);
            }
        }
    }

    pub fn prepare_reaction(
        &mut self,
        message_id: Uuid,
        kind: FeedbackType,
        environment: &Environment,
    ) -> ReactionStep {
        if !self.policy.enabled {
            return ReactionStep::Ignored;
        }
        let Some(conversation_id) = self.conversation_id.clone() else {
            warn!("feedback ignored: no conversation established yet");
            return ReactionStep::Ignored;
        };
        if !self.accepts_feedback(message_id) {
            return ReactionStep::Ignored;
        }
        let endpoint = match environment.endpoint() {
            Ok(endpoint) => endpoint.to_string(),
            Err(e) => {
                warn!("feedback ignored: {}", e);
                return ReactionStep::Ignored;
            }
        };

        if self.policy.detailed_rating {
            self.pending_form = Some(PendingForm { message_id, kind });
            return ReactionStep::FormOpened;
        }

        ReactionStep::Submit(PreparedFeedback {
            endpoint,
            message_id,
            request: FeedbackRequest {
                conversation_id,
                message_id: message_id.to_string(),
                feedback_type: kind,
                rating: None,
                comment: None,
            },
        })
    }

    /// Submit the open rating form for a message.
    pub async fn submit_form(
        &mut self,
        message_id: Uuid,
        rating: u8,
        comment: Option<String>,
        environment: &Environment,
        api: &dyn OrchestratorApi,
    ) {
        let Some(prepared) = self.prepare_form_submission(message_id, rating, comment, environment)
        else {
            return;
        };
        let outcome = api.feedback(prepared.endpoint(), prepared.request()).await;
        self.complete_feedback(prepared, outcome);
    }

    /// Only valid from an open form on this message, with a star rating in
    /// 1..=5; the UI enforces both, and they are re-validated here.
    pub fn prepare_form_submission(
        &mut self,
        message_id: Uuid,
        rating: u8,
        comment: Option<String>,
        environment: &Environment,
    ) -> Option<PreparedFeedback> {
        let form = match self.pending_form {
            Some(form) if form.message_id == message_id => form,
            _ => {
                warn!("feedback ignored: no rating form is open for this message");
                return None;
            }
        };
        if !(1..=5).contains(&rating) {
            warn!("feedback ignored: rating must be between 1 and 5");
            return None;
        }
        let conversation_id = self.conversation_id.clone()?;
        if !self.accepts_feedback(message_id) {
            return None;
        }
        let endpoint = match environment.endpoint() {
            Ok(endpoint) => endpoint.to_string(),
            Err(e) => {
                warn!("feedback ignored: {}", e);
                return None;
            }
        };

        let comment = comment.filter(|c| !c.trim().is_empty());
        Some(PreparedFeedback {
            endpoint,
            message_id,
            request: FeedbackRequest {
                conversation_id,
                message_id: message_id.to_string(),
                feedback_type: form.kind,
                rating: Some(rating),
                comment,
            },
        })
    }

    /// Apply the outcome of a feedback call. Success writes the feedback
    /// record onto the message, closing it, and clears the form; failure
    /// writes nothing so the user can try again.
    pub fn complete_feedback(&mut self, prepared: PreparedFeedback, outcome: Result<(), ApiError>) {
        let PreparedFeedback {
            message_id,
            request,
            ..
        } = prepared;

        match outcome {
            Ok(()) => {
                if let Some(message) = self.messages.iter_mut().find(|m| m.id == message_id) {
                    message.feedback = Some(Feedback {
                        kind: request.feedback_type,
                        rating: request.rating,
                        comment: request.comment,
                        timestamp: Utc::now(),
                    });
                }
                if self.pending_form.is_some_and(|f| f.message_id == message_id) {
                    self.pending_form = None;
                }
            }
            Err(e) => {
                warn!("feedback request failed: {}", e);
            }
        }
    }

    /// Discard the open rating form without submitting anything.
    pub fn cancel_feedback(&mut self, message_id: Uuid) {
        if self.pending_form.is_some_and(|f| f.message_id == message_id) {
            self.pending_form = None;
        }
    }

    fn accepts_feedback(&self, message_id: Uuid) -> bool {
        match self.message(message_id) {
            Some(m) => m.role == Role::Assistant && m.feedback.is_none(),
            None => false,
        }
    }
}
