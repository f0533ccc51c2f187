//! Localization setup.
//!
//! Message catalogs are nested JSON objects embedded at compile time, one per
//! locale. Messages are looked up by dot path (`"auth.login.title"`); a key
//! missing from the active locale falls back to English, and a key missing
//! everywhere is returned as-is so gaps are visible in the UI.
//!
//! The preferred locale is read once from the `"locale"` storage key.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::storage::{LOCALE_STORAGE_KEY, Storage};
use crate::error::StorageError;

const EN_CATALOG: &str = include_str!("../locales/en.json");
const SK_CATALOG: &str = include_str!("../locales/sk.json");

/// Supported UI locales.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English, the fallback locale
    #[default]
    En,
    /// Slovak
    Sk,
}

impl Locale {
    /// Locale used when a message is missing from the active catalog.
    pub const FALLBACK: Locale = Locale::En;

    /// All supported locales.
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Sk];

    /// Returns the locale code (`"en"`, `"sk"`).
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Sk => "sk",
        }
    }

    fn catalog_source(&self) -> &'static str {
        match self {
            Locale::En => EN_CATALOG,
            Locale::Sk => SK_CATALOG,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned for unsupported locale codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported locale: {0}")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "sk" => Ok(Locale::Sk),
            other => Err(UnknownLocale(other.to_string())),
        }
    }
}

/// Active locale plus the loaded catalogs.
pub struct I18n {
    locale: Locale,
    catalogs: HashMap<Locale, Value>,
    storage: Option<Arc<dyn Storage>>,
}

impl I18n {
    /// Creates an instance fixed to `locale`, without persistence.
    pub fn new(locale: Locale) -> Self {
        let catalogs = Locale::ALL
            .iter()
            .map(|&locale| (locale, load_catalog(locale)))
            .collect();

        Self {
            locale,
            catalogs,
            storage: None,
        }
    }

    /// Reads the locale preference from `storage`.
    ///
    /// Falls back to `default` when nothing is stored or the stored code is
    /// not supported. Later [`set_locale`](Self::set_locale) calls are
    /// persisted to the same storage.
    pub fn from_storage(storage: Arc<dyn Storage>, default: Locale) -> Self {
        let locale = match storage.get(LOCALE_STORAGE_KEY) {
            Some(code) => code.parse::<Locale>().unwrap_or_else(|e: UnknownLocale| {
                tracing::warn!("{}, using {}", e, default);
                default
            }),
            None => default,
        };
        tracing::trace!("Active locale: {}", locale);

        let mut i18n = Self::new(locale);
        i18n.storage = Some(storage);
        i18n
    }

    /// Returns the active locale.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Switches the active locale and persists the preference.
    pub fn set_locale(&mut self, locale: Locale) -> Result<(), StorageError> {
        self.locale = locale;
        if let Some(storage) = &self.storage {
            storage.set(LOCALE_STORAGE_KEY, locale.code())?;
        }
        tracing::trace!("Locale switched to {}", locale);
        Ok(())
    }

    /// Looks up `key` in the active locale, then in the fallback locale.
    ///
    /// Returns `key` itself when no catalog has it.
    pub fn t(&self, key: &str) -> String {
        self.lookup(self.locale, key)
            .or_else(|| self.lookup(Locale::FALLBACK, key))
            .map(str::to_string)
            .unwrap_or_else(|| {
                tracing::trace!("Missing message for key {}", key);
                key.to_string()
            })
    }

    /// Like [`t`](Self::t), replacing `{name}` placeholders with `params`.
    ///
    /// ```
    /// # use portal_client::i18n::{I18n, Locale};
    /// let i18n = I18n::new(Locale::En);
    /// assert_eq!(i18n.t_with("auth.welcome", &[("username", "alice")]), "Welcome, alice!");
    /// ```
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        params
            .iter()
            .fold(self.t(key), |message, (name, value)| {
                message.replace(&format!("{{{}}}", name), value)
            })
    }

    /// Returns true if `key` exists in the active or fallback catalog.
    pub fn has(&self, key: &str) -> bool {
        self.lookup(self.locale, key).is_some() || self.lookup(Locale::FALLBACK, key).is_some()
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        key.split('.')
            .try_fold(self.catalogs.get(&locale)?, |node, segment| node.get(segment))?
            .as_str()
    }
}

fn load_catalog(locale: Locale) -> Value {
    match serde_json::from_str(locale.catalog_source()) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("Message catalog for {} is malformed: {}", locale, e);
            Value::Object(Default::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryStorage;

    #[test]
    fn test_catalogs_are_valid_json_objects() {
        for locale in Locale::ALL {
            let catalog: Value = serde_json::from_str(locale.catalog_source()).unwrap();
            assert!(catalog.is_object(), "{} catalog is not an object", locale);
        }
    }

    #[test]
    fn test_locale_parse_and_display() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!(" SK ".parse::<Locale>().unwrap(), Locale::Sk);
        assert_eq!(
            "de".parse::<Locale>().unwrap_err(),
            UnknownLocale("de".to_string())
        );
        assert_eq!(Locale::Sk.to_string(), "sk");
    }

    #[test]
    fn test_locale_serialization() {
        assert_eq!(serde_json::to_string(&Locale::Sk).unwrap(), r#""sk""#);
        let locale: Locale = serde_json::from_str(r#""en""#).unwrap();
        assert_eq!(locale, Locale::En);
    }

    #[test]
    fn test_lookup_in_active_locale() {
        let i18n = I18n::new(Locale::Sk);
        assert_eq!(i18n.t("auth.login.submit"), "Prihlásiť sa");
        assert_eq!(I18n::new(Locale::En).t("auth.login.submit"), "Sign in");
    }

    #[test]
    fn test_missing_key_falls_back_to_english() {
        let i18n = I18n::new(Locale::Sk);
        assert_eq!(i18n.t("footer.poweredBy"), "Powered by EduPage");
        assert!(i18n.has("footer.poweredBy"));
    }

    #[test]
    fn test_unknown_key_returns_key() {
        let i18n = I18n::new(Locale::En);
        assert_eq!(i18n.t("does.not.exist"), "does.not.exist");
        assert!(!i18n.has("does.not.exist"));
    }

    #[test]
    fn test_non_leaf_key_returns_key() {
        let i18n = I18n::new(Locale::En);
        assert_eq!(i18n.t("auth.login"), "auth.login");
    }

    #[test]
    fn test_interpolation() {
        let i18n = I18n::new(Locale::Sk);
        assert_eq!(
            i18n.t_with("auth.welcome", &[("username", "jan")]),
            "Vitajte, jan!"
        );
    }

    #[test]
    fn test_from_storage_defaults_to_en() {
        let i18n = I18n::from_storage(Arc::new(MemoryStorage::new()), Locale::En);
        assert_eq!(i18n.locale(), Locale::En);
    }

    #[test]
    fn test_from_storage_reads_preference() {
        let storage = MemoryStorage::with_entries([(LOCALE_STORAGE_KEY, "sk")]);
        let i18n = I18n::from_storage(Arc::new(storage), Locale::En);
        assert_eq!(i18n.locale(), Locale::Sk);
    }

    #[test]
    fn test_from_storage_unknown_code_uses_default() {
        let storage = MemoryStorage::with_entries([(LOCALE_STORAGE_KEY, "fr")]);
        let i18n = I18n::from_storage(Arc::new(storage), Locale::En);
        assert_eq!(i18n.locale(), Locale::En);
    }

    #[test]
    fn test_set_locale_persists() {
        let storage = MemoryStorage::new();
        let mut i18n = I18n::from_storage(Arc::new(storage.clone()), Locale::En);

        i18n.set_locale(Locale::Sk).unwrap();

        assert_eq!(i18n.locale(), Locale::Sk);
        assert_eq!(storage.get(LOCALE_STORAGE_KEY).as_deref(), Some("sk"));
        assert_eq!(i18n.t("nav.lunches"), "Obedy");
    }

    #[test]
    fn test_set_locale_without_storage() {
        let mut i18n = I18n::new(Locale::En);
        i18n.set_locale(Locale::Sk).unwrap();
        assert_eq!(i18n.locale(), Locale::Sk);
    }
}
