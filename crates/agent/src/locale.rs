//! Locale resolution

use intake_bot_core::Localizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocale {
    pub locale: String,
    /// A hint was given but is not supported and nothing better was known,
    /// so the base locale is used
    pub fell_back: bool,
}

/// Language part of a transport hint (`"de-DE"` → `"de"`)
fn language_of(hint: &str) -> Option<String> {
    let language: String = hint.trim().chars().take(2).collect::<String>().to_lowercase();
    (!language.is_empty()).then_some(language)
}

/// Pick the locale for a user: the locale the ongoing dialogue already
/// uses, then a supported transport hint, then the stored preference, then
/// the base locale. Unsupported candidates are skipped.
pub fn resolve_locale(
    current: Option<&str>,
    hint: Option<&str>,
    stored: Option<&str>,
    localizer: &dyn Localizer,
) -> ResolvedLocale {
    let hint = hint.and_then(language_of);
    let candidate = current
        .filter(|l| localizer.supports(l))
        .or_else(|| hint.as_deref().filter(|l| localizer.supports(l)))
        .or_else(|| stored.filter(|l| localizer.supports(l)));

    match candidate {
        Some(locale) => ResolvedLocale {
            locale: locale.to_string(),
            fell_back: false,
        },
        None => ResolvedLocale {
            locale: localizer.base_locale().to_string(),
            fell_back: hint.is_some(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Catalog;

    impl Localizer for Catalog {
        fn text(&self, _locale: &str, key: &str) -> String {
            key.to_string()
        }

        fn base_locale(&self) -> &str {
            "en"
        }

        fn supports(&self, locale: &str) -> bool {
            ["ru", "uk", "pl", "en"].contains(&locale)
        }
    }

    #[test]
    fn test_supported_hint_wins() {
        let resolved = resolve_locale(None, Some("uk-UA"), Some("pl"), &Catalog);
        assert_eq!(resolved.locale, "uk");
        assert!(!resolved.fell_back);
    }

    #[test]
    fn test_unsupported_hint_uses_stored() {
        let resolved = resolve_locale(None, Some("de"), Some("pl"), &Catalog);
        assert_eq!(resolved.locale, "pl");
        assert!(!resolved.fell_back);
    }

    #[test]
    fn test_unsupported_hint_falls_back_to_base() {
        let resolved = resolve_locale(None, Some("de-DE"), None, &Catalog);
        assert_eq!(resolved.locale, "en");
        assert!(resolved.fell_back);
    }

    #[test]
    fn test_no_hint() {
        let resolved = resolve_locale(None, None, Some("xx"), &Catalog);
        assert_eq!(resolved.locale, "en");
        assert!(!resolved.fell_back);

        let resolved = resolve_locale(None, Some("  "), None, &Catalog);
        assert!(!resolved.fell_back);
    }

    #[test]
    fn test_hint_is_case_insensitive() {
        assert_eq!(resolve_locale(None, Some("RU"), None, &Catalog).locale, "ru");
    }

    #[test]
    fn test_dialogue_locale_wins() {
        let resolved = resolve_locale(Some("pl"), Some("ru"), Some("uk"), &Catalog);
        assert_eq!(resolved.locale, "pl");
        assert!(!resolved.fell_back);
    }

    #[test]
    fn test_unsupported_dialogue_locale_is_skipped() {
        let resolved = resolve_locale(Some("de"), None, Some("uk"), &Catalog);
        assert_eq!(resolved.locale, "uk");

        let resolved = resolve_locale(Some("de"), Some("fr"), None, &Catalog);
        assert_eq!(resolved.locale, "en");
        assert!(resolved.fell_back);
    }
}
