//! Event dispatch
//!
//! Events for the same user are processed one at a time, in arrival order;
//! events for different users run concurrently.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use intake_bot_core::{
    Command, EventKind, InboundEvent, OperatorAction, Reply, Transport, UserId,
};

use crate::dialogue::{DialogueEngine, Outcome};
use crate::operator::OperatorDesk;

pub struct Dispatcher {
    engine: DialogueEngine,
    desk: OperatorDesk,
    transport: Arc<dyn Transport>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl Dispatcher {
    pub fn new(engine: DialogueEngine, desk: OperatorDesk, transport: Arc<dyn Transport>) -> Self {
        Self {
            engine,
            desk,
            transport,
            locks: DashMap::new(),
        }
    }

    pub fn engine(&self) -> &DialogueEngine {
        &self.engine
    }

    /// Handle one event under the sender's lock
    pub async fn dispatch(&self, event: InboundEvent) -> Outcome {
        let lock = self
            .locks
            .entry(event.user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let outcome = {
            let _guard = lock.lock().await;
            self.route(&event).await
        };

        drop(lock);
        // forget idle users; a lock still held elsewhere has extra references
        self.locks
            .remove_if(&event.user_id, |_, lock| Arc::strong_count(lock) == 1);

        tracing::debug!(
            user_id = %event.user_id,
            event = event.kind_label(),
            outcome = ?outcome,
            "Event dispatched"
        );
        outcome
    }

    async fn route(&self, event: &InboundEvent) -> Outcome {
        if !self.desk.is_operator(&event.user_id) {
            return self.engine.handle(event).await;
        }

        let result = match &event.kind {
            EventKind::Choice { payload } => match OperatorAction::parse(payload) {
                Some(OperatorAction::Details {
                    category,
                    client_id,
                }) => {
                    self.desk
                        .handle_details(&event.user_id, category, &client_id)
                        .await
                }
                None => return self.engine.handle(event).await,
            },
            EventKind::Command {
                command: Command::Sheet,
            } => self.desk.handle_sheet(&event.user_id).await,
            _ => return self.engine.handle(event).await,
        };

        match result {
            Ok(()) => Outcome::Operator,
            Err(e) => {
                tracing::error!(user_id = %event.user_id, error = %e, "Operator action failed");
                let reply = Reply::text(self.desk.error_text());
                if let Err(e) = self.transport.send(&event.user_id, reply).await {
                    tracing::warn!(user_id = %event.user_id, error = %e, "Error message not delivered");
                }
                Outcome::Failed
            }
        }
    }

    /// Number of users with a live lock entry
    pub fn active_users(&self) -> usize {
        self.locks.len()
    }
}
