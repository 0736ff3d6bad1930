//! Client side of the comment form
//!
//! One form instance moves from `Editing` to `Submitted` at most once.
//! Validation failures never reach the network; a failed request is logged
//! and the form stays open for another try.

use async_trait::async_trait;
use thiserror::Error;

use super::form::{CommentForm, FieldErrors};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("comment was already submitted")]
    AlreadySubmitted,

    #[error("form has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),

    #[error("failed to send comment: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("comment endpoint answered HTTP {0}")]
    Rejected(u16),
}

/// Carries one submission to the comment endpoint
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn send(&self, form: &CommentForm) -> Result<(), SubmitError>;
}

/// Posts the form as JSON to the comment endpoint
#[derive(Debug, Clone)]
pub struct HttpCommentSink {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCommentSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CommentSink for HttpCommentSink {
    async fn send(&self, form: &CommentForm) -> Result<(), SubmitError> {
        let response = self.http.post(&self.endpoint).json(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

/// What the form currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    /// Form visible, with inline messages for invalid fields
    Editing { errors: FieldErrors },
    /// "Submitted, pending approval" panel; the form is gone
    Submitted,
}

/// State of one rendered comment form
#[derive(Debug)]
pub struct CommentSubmission {
    state: SubmissionState,
}

impl Default for CommentSubmission {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentSubmission {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Editing {
                errors: FieldErrors::default(),
            },
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_submitted(&self) -> bool {
        self.state == SubmissionState::Submitted
    }

    /// Validate and send `form` through `sink`
    pub async fn submit<S>(&mut self, form: &CommentForm, sink: &S) -> Result<(), SubmitError>
    where
        S: CommentSink + ?Sized,
    {
        if self.is_submitted() {
            return Err(SubmitError::AlreadySubmitted);
        }

        if let Err(errors) = form.validate() {
            self.state = SubmissionState::Editing {
                errors: errors.clone(),
            };
            return Err(SubmitError::Invalid(errors));
        }

        match sink.send(form).await {
            Ok(()) => {
                tracing::info!("Comment submitted for post {}", form.post_id);
                self.state = SubmissionState::Submitted;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Comment submission failed: {}", e);
                self.state = SubmissionState::Editing {
                    errors: FieldErrors::default(),
                };
                Err(e)
            }
        }
    }
}
