use async_trait::async_trait;

use crate::error::CapabilityError;
use crate::event::Attachment;
use crate::reply::Reply;
use crate::session::UserId;

/// Chat transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a reply to a user (or the operator chat)
    async fn send(&self, to: &UserId, reply: Reply) -> Result<(), CapabilityError>;

    /// Download the bytes behind an attachment reference
    async fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>, CapabilityError>;

    /// Send raw bytes as a document
    async fn send_file(
        &self,
        to: &UserId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), CapabilityError>;
}
