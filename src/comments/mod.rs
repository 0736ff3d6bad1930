//! Comment submission: form validation, the client-side flow and the
//! server-side handler that forwards comments to the CMS.

mod form;
mod submission;

pub use form::{CommentForm, Field, FieldErrors, NewComment, EMAIL_PATTERN};
pub use submission::{
    CommentSink, CommentSubmission, HttpCommentSink, SubmissionState, SubmitError,
};

use thiserror::Error;

use crate::sanity::{ContentError, ContentSource};

#[derive(Debug, Error)]
pub enum CreateCommentError {
    #[error("invalid comment form")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Validate `form` and store it as an unapproved comment
pub async fn create_comment<S>(source: &S, form: &CommentForm) -> Result<NewComment, CreateCommentError>
where
    S: ContentSource + ?Sized,
{
    let comment = form.validate().map_err(CreateCommentError::Invalid)?;
    source.create_comment(&comment).await?;
    tracing::info!(
        "Stored comment from {} on post {} for moderation",
        comment.name,
        comment.post_id
    );
    Ok(comment)
}
