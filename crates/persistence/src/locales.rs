//! Message catalog and per-user locale preferences

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use intake_bot_core::{CapabilityError, LocalePreferences, Localizer, UserId};

use crate::PersistenceError;

/// Built-in catalog
const EMBEDDED_LOCALES: &str = include_str!("../locales.json");

type Catalog = HashMap<String, HashMap<String, String>>;

/// JSON message catalog: `{ "<locale>": { "<key>": "<text>" } }`
pub struct JsonLocaleCatalog {
    catalog: Catalog,
    base_locale: String,
    supported: Vec<String>,
}

impl JsonLocaleCatalog {
    pub fn from_json(
        json: &str,
        base_locale: impl Into<String>,
        supported: Vec<String>,
    ) -> Result<Self, PersistenceError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        let base_locale = base_locale.into();
        if !catalog.contains_key(&base_locale) {
            tracing::warn!(locale = %base_locale, "Base locale has no messages in the catalog");
        }
        Ok(Self {
            catalog,
            base_locale,
            supported,
        })
    }

    /// Catalog compiled into the binary
    pub fn embedded(
        base_locale: impl Into<String>,
        supported: Vec<String>,
    ) -> Result<Self, PersistenceError> {
        Self::from_json(EMBEDDED_LOCALES, base_locale, supported)
    }

    pub async fn from_file(
        path: impl AsRef<Path>,
        base_locale: impl Into<String>,
        supported: Vec<String>,
    ) -> Result<Self, PersistenceError> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&json, base_locale, supported)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.catalog.keys().map(String::as_str)
    }
}

impl Localizer for JsonLocaleCatalog {
    fn text(&self, locale: &str, key: &str) -> String {
        self.catalog
            .get(locale)
            .and_then(|messages| messages.get(key))
            .or_else(|| {
                self.catalog
                    .get(&self.base_locale)
                    .and_then(|messages| messages.get(key))
            })
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    fn base_locale(&self) -> &str {
        &self.base_locale
    }

    fn supports(&self, locale: &str) -> bool {
        self.supported.iter().any(|l| l == locale)
    }
}

#[derive(Default)]
pub struct InMemoryLocalePreferences {
    prefs: RwLock<HashMap<UserId, String>>,
}

impl InMemoryLocalePreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalePreferences for InMemoryLocalePreferences {
    async fn load(&self, user_id: &UserId) -> Result<Option<String>, CapabilityError> {
        Ok(self.prefs.read().get(user_id).cloned())
    }

    async fn save(&self, user_id: &UserId, locale: &str) -> Result<(), CapabilityError> {
        self.prefs
            .write()
            .insert(user_id.clone(), locale.to_string());
        Ok(())
    }
}

/// Preferences kept in one JSON object file (`{"<user_id>": "<locale>"}`)
pub struct FileLocalePreferences {
    path: PathBuf,
    // serializes read-modify-write of the file
    write_lock: Mutex<()>,
}

impl FileLocalePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_one(&self, user_id: &UserId, locale: &str) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.read_all().await?;
        all.insert(user_id.to_string(), locale.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&all)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl LocalePreferences for FileLocalePreferences {
    async fn load(&self, user_id: &UserId) -> Result<Option<String>, CapabilityError> {
        let all = self
            .read_all()
            .await
            .map_err(|e| e.into_capability(CapabilityError::Locale))?;
        Ok(all.get(user_id.as_str()).cloned())
    }

    async fn save(&self, user_id: &UserId, locale: &str) -> Result<(), CapabilityError> {
        self.write_one(user_id, locale)
            .await
            .map_err(|e| e.into_capability(CapabilityError::Locale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> Vec<String> {
        ["ru", "uk", "pl", "en"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_embedded_catalog_has_all_locales() {
        let catalog = JsonLocaleCatalog::embedded("en", supported()).unwrap();
        let mut locales: Vec<_> = catalog.locales().collect();
        locales.sort();
        assert_eq!(locales, vec!["en", "pl", "ru", "uk"]);
        assert_eq!(catalog.text("ru", "btn_wholesale"), "Оптовый");
        assert!(catalog.supports("uk"));
        assert!(!catalog.supports("de"));
    }

    #[test]
    fn test_text_fallback_chain() {
        let json = r#"{
            "en": { "greeting": "Hello", "thank_you": "Thanks" },
            "ru": { "greeting": "Привет" }
        }"#;
        let catalog = JsonLocaleCatalog::from_json(json, "en", supported()).unwrap();
        assert_eq!(catalog.text("ru", "greeting"), "Привет");
        assert_eq!(catalog.text("ru", "thank_you"), "Thanks");
        assert_eq!(catalog.text("de", "greeting"), "Hello");
        assert_eq!(catalog.text("ru", "missing_key"), "missing_key");
    }

    #[test]
    fn test_invalid_catalog() {
        assert!(JsonLocaleCatalog::from_json("[1,2]", "en", supported()).is_err());
    }

    #[tokio::test]
    async fn test_file_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FileLocalePreferences::new(dir.path().join("data/user_languages.json"));
        let user = UserId::from(12);

        assert_eq!(prefs.load(&user).await.unwrap(), None);
        prefs.save(&user, "uk").await.unwrap();
        prefs.save(&UserId::from(13), "pl").await.unwrap();
        prefs.save(&user, "ru").await.unwrap();

        let reopened = FileLocalePreferences::new(dir.path().join("data/user_languages.json"));
        assert_eq!(reopened.load(&user).await.unwrap().as_deref(), Some("ru"));
        assert_eq!(
            reopened.load(&UserId::from(13)).await.unwrap().as_deref(),
            Some("pl")
        );
    }

    #[tokio::test]
    async fn test_in_memory_preferences() {
        let prefs = InMemoryLocalePreferences::new();
        let user = UserId::from("u");
        prefs.save(&user, "pl").await.unwrap();
        assert_eq!(prefs.load(&user).await.unwrap().as_deref(), Some("pl"));
    }
}
