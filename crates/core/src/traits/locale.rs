use async_trait::async_trait;

use crate::error::CapabilityError;
use crate::session::UserId;

/// Message catalog
///
/// Lookups never fail: a key missing in `locale` falls back to the base
/// locale, then to the key itself.
pub trait Localizer: Send + Sync {
    fn text(&self, locale: &str, key: &str) -> String;

    /// Locale used when nothing else applies
    fn base_locale(&self) -> &str;

    /// Whether the catalog has messages for `locale`
    fn supports(&self, locale: &str) -> bool;
}

/// Remembered locale per user
#[async_trait]
pub trait LocalePreferences: Send + Sync {
    async fn load(&self, user_id: &UserId) -> Result<Option<String>, CapabilityError>;
    async fn save(&self, user_id: &UserId, locale: &str) -> Result<(), CapabilityError>;
}
