//! Input aggregation for the details-collection states
//!
//! Free-form input arrives over several messages: text fragments, photos
//! and documents, optionally captioned. The aggregator folds each message
//! into the session and decides whether the dialogue may move on to the
//! contact step:
//!
//! - attachment with a caption → advance
//! - attachment without a caption → stay, ask for a comment
//! - text → stay until `min_comment_turns` text turns were seen
//! - anything else → stay, nothing recorded

use std::sync::Arc;

use intake_bot_core::{Attachment, BlobStore, CapabilityError, EventKind, Session, Transport};

use crate::prompts::Prompt;

/// Result of folding one message into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregation {
    /// Move on to the contact step
    pub advance: bool,
    pub prompt: Prompt,
}

impl Aggregation {
    fn stay(prompt: Prompt) -> Self {
        Self {
            advance: false,
            prompt,
        }
    }

    fn advance(prompt: Prompt) -> Self {
        Self {
            advance: true,
            prompt,
        }
    }
}

pub struct InputAggregator {
    transport: Arc<dyn Transport>,
    blobs: Arc<dyn BlobStore>,
    min_comment_turns: u32,
}

impl InputAggregator {
    pub fn new(
        transport: Arc<dyn Transport>,
        blobs: Arc<dyn BlobStore>,
        min_comment_turns: u32,
    ) -> Self {
        Self {
            transport,
            blobs,
            min_comment_turns: min_comment_turns.max(1),
        }
    }

    /// Fold one message into `session`.
    ///
    /// On error the session is left untouched.
    pub async fn aggregate(
        &self,
        session: &mut Session,
        kind: &EventKind,
    ) -> Result<Aggregation, CapabilityError> {
        match kind {
            EventKind::Attachment { attachment } => self.add_attachment(session, attachment).await,
            EventKind::Text { text } => {
                session.append_comment(text);
                session.comment_turns += 1;
                tracing::debug!(
                    user_id = %session.user_id,
                    turns = session.comment_turns,
                    "Comment fragment added"
                );
                if session.comment_turns >= self.min_comment_turns {
                    Ok(Aggregation::advance(Prompt::CommentSavedSendPhone))
                } else {
                    Ok(Aggregation::stay(Prompt::AddMoreDetails))
                }
            }
            _ => Ok(Aggregation::stay(Prompt::UnsupportedContent)),
        }
    }

    async fn add_attachment(
        &self,
        session: &mut Session,
        attachment: &Attachment,
    ) -> Result<Aggregation, CapabilityError> {
        // both calls complete before the session is touched
        let bytes = self.transport.fetch_attachment(attachment).await?;
        let reference = self
            .blobs
            .store(&session.user_id, &bytes, &attachment.suggested_name())
            .await?;

        tracing::info!(
            user_id = %session.user_id,
            reference = %reference,
            size = bytes.len(),
            "Attachment stored"
        );
        session.add_file(reference);

        match attachment.caption() {
            Some(caption) => {
                session.append_comment(caption);
                Ok(Aggregation::advance(Prompt::FilesSavedSendPhone))
            }
            None => Ok(Aggregation::stay(Prompt::AskFileComment)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use intake_bot_core::{AttachmentKind, Reply, UserId};
    use intake_bot_persistence::InMemoryBlobStore;

    struct FakeTransport {
        fail_fetch: bool,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, _to: &UserId, _reply: Reply) -> Result<(), CapabilityError> {
            Ok(())
        }

        async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>, CapabilityError> {
            if self.fail_fetch {
                return Err(CapabilityError::Transport("download failed".into()));
            }
            Ok(attachment.file_id.as_bytes().to_vec())
        }

        async fn send_file(
            &self,
            _to: &UserId,
            _file_name: &str,
            _bytes: Vec<u8>,
        ) -> Result<(), CapabilityError> {
            Ok(())
        }
    }

    fn aggregator(fail_fetch: bool) -> (InputAggregator, Arc<InMemoryBlobStore>) {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let aggregator =
            InputAggregator::new(Arc::new(FakeTransport { fail_fetch }), blobs.clone(), 2);
        (aggregator, blobs)
    }

    fn photo(caption: Option<&str>) -> EventKind {
        EventKind::Attachment {
            attachment: Attachment {
                kind: AttachmentKind::Photo,
                file_id: "p1".into(),
                file_name: None,
                caption: caption.map(String::from),
            },
        }
    }

    fn text(value: &str) -> EventKind {
        EventKind::Text { text: value.into() }
    }

    #[tokio::test]
    async fn test_two_text_turns_advance() {
        let (aggregator, _) = aggregator(false);
        let mut session = Session::new(UserId::from(1));

        let first = aggregator.aggregate(&mut session, &text("granite")).await.unwrap();
        assert_eq!(first, Aggregation::stay(Prompt::AddMoreDetails));

        let second = aggregator.aggregate(&mut session, &text("1.2m")).await.unwrap();
        assert_eq!(second, Aggregation::advance(Prompt::CommentSavedSendPhone));
        assert_eq!(session.combined_comment, "granite\n1.2m");
        assert_eq!(session.comment_turns, 2);
    }

    #[tokio::test]
    async fn test_captioned_attachment_advances() {
        let (aggregator, blobs) = aggregator(false);
        let mut session = Session::new(UserId::from(1));

        let result = aggregator
            .aggregate(&mut session, &photo(Some(" granite ")))
            .await
            .unwrap();
        assert!(result.advance);
        assert_eq!(result.prompt, Prompt::FilesSavedSendPhone);
        assert_eq!(session.combined_comment, "granite");
        assert_eq!(session.file_list.len(), 1);
        assert_eq!(blobs.len(), 1);
        assert_eq!(session.comment_turns, 0);
    }

    #[tokio::test]
    async fn test_uncaptioned_attachment_asks_for_comment() {
        let (aggregator, _) = aggregator(false);
        let mut session = Session::new(UserId::from(1));

        let result = aggregator.aggregate(&mut session, &photo(None)).await.unwrap();
        assert_eq!(result, Aggregation::stay(Prompt::AskFileComment));
        assert_eq!(session.file_list.len(), 1);
        assert!(session.combined_comment.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_content_records_nothing() {
        let (aggregator, _) = aggregator(false);
        let mut session = Session::new(UserId::from(1));
        let before = session.clone();

        let result = aggregator
            .aggregate(
                &mut session,
                &EventKind::Unsupported {
                    content: "sticker".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(result, Aggregation::stay(Prompt::UnsupportedContent));
        assert_eq!(session, before);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_session_untouched() {
        let (aggregator, blobs) = aggregator(true);
        let mut session = Session::new(UserId::from(1));
        session.append_comment("earlier");
        let before = session.clone();

        let err = aggregator
            .aggregate(&mut session, &photo(Some("caption")))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Transport(_)));
        assert_eq!(session, before);
        assert!(blobs.is_empty());
    }
}
