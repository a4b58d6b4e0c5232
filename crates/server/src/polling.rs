//! Long-polling runner
//!
//! Used when no public webhook URL is available. Each update is dispatched
//! on its own task; the dispatcher keeps per-user order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use intake_bot_agent::Dispatcher;
use intake_bot_transport::TelegramClient;

use crate::metrics::record_update;
use crate::updates::process_update;
use crate::ServerError;

/// Pause after a failed `getUpdates` before polling again
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Poll for updates until `shutdown` resolves
pub async fn run_polling<F>(
    telegram: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
    timeout_secs: u64,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    telegram.delete_webhook().await?;
    tracing::info!(timeout_secs, "Long polling started");

    tokio::pin!(shutdown);
    let mut offset: i64 = 0;

    loop {
        let batch = tokio::select! {
            _ = &mut shutdown => break,
            batch = telegram.get_updates(offset, timeout_secs) => batch,
        };

        match batch {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    record_update("polling");
                    tokio::spawn(process_update(
                        dispatcher.clone(),
                        telegram.clone(),
                        update,
                    ));
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed, retrying");
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }
    }

    tracing::info!("Long polling stopped");
    Ok(())
}
