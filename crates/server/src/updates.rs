//! Update processing shared by the webhook and the polling loop

use std::sync::Arc;

use intake_bot_agent::{Dispatcher, Outcome};
use intake_bot_transport::{TelegramClient, TelegramUpdate};

/// Acknowledge a callback query (if any) and dispatch the update.
///
/// Returns `None` for updates that carry nothing the dialogue reads.
pub async fn process_update(
    dispatcher: Arc<Dispatcher>,
    telegram: Arc<TelegramClient>,
    update: TelegramUpdate,
) -> Option<Outcome> {
    let update_id = update.update_id;

    if let Some(callback_id) = update.callback_query_id() {
        // stops the client-side spinner on the pressed button
        if let Err(e) = telegram.answer_callback_query(callback_id).await {
            tracing::warn!(update_id, error = %e, "Failed to answer callback query");
        }
    }

    let Some(event) = update.into_event() else {
        tracing::debug!(update_id, "Update carries no event, skipped");
        return None;
    };

    Some(dispatcher.dispatch(event).await)
}
