//! Localized string lookup.
//!
//! `Nls` keeps per-locale dictionaries and resolves message keys through a
//! fallback chain: current locale, then the default locale, then the key
//! itself. Translations may contain `{{name}}` placeholders which are filled
//! from a substitution map, so message templates like
//! `"at least {{min}} chars"` work without any formatting logic at the call
//! site.
//!
//! The validation rules receive a shared `Arc<Nls>` at construction and a
//! default `Nls` already carries the dictionary entries their messages use.

use std::collections::HashMap;
use std::sync::RwLock;

use regex::Regex;

/// Locale used as the final dictionary fallback.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Localized string service.
///
/// Cheap to share behind an `Arc`; locale switching and dictionary extension
/// go through interior locking so every holder sees the same state.
///
/// # Example
///
/// ```
/// use formwork::nls::Nls;
///
/// let nls = Nls::default();
/// nls.extend_dictionary("en-US", [("greeting", "{{a}} loves {{b}}")]);
///
/// let text = nls.translate("greeting", &[("a", "developer".into()), ("b", "coding".into())]);
/// assert_eq!(text, "developer loves coding");
/// ```
pub struct Nls {
    inner: RwLock<NlsInner>,
}

struct NlsInner {
    locale: String,
    dictionaries: HashMap<String, HashMap<String, String>>,
}

impl Nls {
    /// Create an empty service with no dictionaries registered.
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(NlsInner {
                locale: DEFAULT_LOCALE.to_string(),
                dictionaries: HashMap::new(),
            }),
        }
    }

    /// Set the current locale identifier (e.g. `"en-US"`).
    ///
    /// Underscores are normalized to dashes, so `"en_US"` works too.
    pub fn set_locale(&self, locale: &str) {
        if let Ok(mut guard) = self.inner.write() {
            guard.locale = locale.replace('_', "-");
        }
    }

    /// Get the current locale identifier.
    pub fn locale(&self) -> String {
        self.inner
            .read()
            .map(|guard| guard.locale.clone())
            .unwrap_or_else(|_| DEFAULT_LOCALE.to_string())
    }

    /// List the locales that have a registered dictionary.
    pub fn supported_locales(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|guard| guard.dictionaries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Merge translations into a locale's dictionary, creating it if needed.
    pub fn extend_dictionary<K, V>(&self, locale: &str, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let locale = locale.replace('_', "-");
        if let Ok(mut guard) = self.inner.write() {
            let dictionary = guard.dictionaries.entry(locale).or_default();
            for (key, text) in entries {
                dictionary.insert(key.into(), text.into());
            }
        }
    }

    /// Translate `key` into the current locale and apply substitutions.
    ///
    /// Lookup order: current locale dictionary, default locale dictionary,
    /// the key itself. Each `(name, value)` pair replaces every
    /// `{{ name }}` placeholder (whitespace inside the braces is tolerated).
    pub fn translate(&self, key: &str, substitutions: &[(&str, String)]) -> String {
        let mut translation = self
            .inner
            .read()
            .map(|guard| {
                guard
                    .dictionaries
                    .get(&guard.locale)
                    .and_then(|dic| dic.get(key))
                    .or_else(|| {
                        guard
                            .dictionaries
                            .get(DEFAULT_LOCALE)
                            .and_then(|dic| dic.get(key))
                    })
                    .cloned()
                    .unwrap_or_else(|| key.to_string())
            })
            .unwrap_or_else(|_| key.to_string());

        for (name, value) in substitutions {
            let pattern = format!(r"\{{\{{\s*{}\s*\}}\}}", regex::escape(name));
            if let Ok(re) = Regex::new(&pattern) {
                translation = re
                    .replace_all(&translation, regex::NoExpand(value.as_str()))
                    .into_owned();
            }
        }

        translation
    }
}

impl Default for Nls {
    /// An `Nls` preloaded with the validation message dictionaries for
    /// `en-US` and `ru-RU`.
    fn default() -> Self {
        let nls = Self::empty();
        nls.extend_dictionary(
            "en-US",
            [
                ("validate-required-message", "This field is required"),
                (
                    "validate-length-message-min-max",
                    "The value length should be between {{min}} and {{max}}",
                ),
                (
                    "validate-length-message-min",
                    "The value length should be at least {{min}} chars",
                ),
                (
                    "validate-length-message-max",
                    "The value length should be {{max}} chars max",
                ),
                (
                    "validate-range-message-min-max",
                    "The value should be between {{min}} and {{max}}",
                ),
                (
                    "validate-range-message-min",
                    "The value should be at least {{min}}",
                ),
                (
                    "validate-range-message-max",
                    "The value should be {{max}} max",
                ),
                ("validate-regexp-message", "Invalid format"),
                (
                    "validate-email-message",
                    "Invalid format (e.g. user@domain.com)",
                ),
                (
                    "validate-password-complexity-message-min-length",
                    "The password should be at least {{min_length}} chars long",
                ),
                (
                    "validate-password-complexity-message-lowercase",
                    "The password should contain lowercase chars",
                ),
                (
                    "validate-password-complexity-message-uppercase",
                    "The password should contain uppercase chars",
                ),
                (
                    "validate-password-complexity-message-digits",
                    "The password should contain digits",
                ),
                (
                    "validate-password-complexity-message-non-alphanumeric",
                    "The password should contain non-alphanumeric chars",
                ),
                (
                    "validate-password-complexity-message-low-complexity",
                    "Entered password has low complexity",
                ),
                (
                    "validate-password-complexity-message-username-parts",
                    "Entered password contains parts of username",
                ),
                (
                    "validate-password-repeat-message",
                    "Entered passwords do not match",
                ),
                ("validate-custom-message", "Entered value is invalid"),
                ("validate-async-message", "Entered value is invalid"),
                ("validate-async-checking", "Checking..."),
            ],
        );
        nls.extend_dictionary(
            "ru-RU",
            [
                (
                    "validate-required-message",
                    "Данное поле обязательно для заполнения",
                ),
                (
                    "validate-length-message-min-max",
                    "Длина значения должна быть от {{min}} до {{max}} символов",
                ),
                (
                    "validate-length-message-min",
                    "Длина значения должна быть не менее {{min}} символов",
                ),
                (
                    "validate-length-message-max",
                    "Длина значения должна быть не более {{max}} символов",
                ),
                (
                    "validate-range-message-min-max",
                    "Значение должно быть в рамках от {{min}} до {{max}}",
                ),
                (
                    "validate-range-message-min",
                    "Значение должно быть не менее {{min}}",
                ),
                (
                    "validate-range-message-max",
                    "Значение должно быть не более {{max}}",
                ),
                ("validate-regexp-message", "Некорректный формат"),
                (
                    "validate-email-message",
                    "Некорректный формат (user@domain.com)",
                ),
                (
                    "validate-password-complexity-message-min-length",
                    "Пароль должен быть не короче {{min_length}} символов",
                ),
                (
                    "validate-password-complexity-message-lowercase",
                    "Пароль должен содержать символы в нижнем регистре",
                ),
                (
                    "validate-password-complexity-message-uppercase",
                    "Пароль должен содержать символы в верхнем регистре",
                ),
                (
                    "validate-password-complexity-message-digits",
                    "Пароль должен содержать цифры",
                ),
                (
                    "validate-password-complexity-message-non-alphanumeric",
                    "Пароль должен содержать специальные символы (~!@#$%...)",
                ),
                (
                    "validate-password-complexity-message-low-complexity",
                    "Введенный пароль не достаточно сложен",
                ),
                (
                    "validate-password-complexity-message-username-parts",
                    "Введенный пароль содержит части логина",
                ),
                (
                    "validate-password-repeat-message",
                    "Введенные пароли не совпадают",
                ),
                ("validate-custom-message", "Введенные данные неверны"),
                ("validate-async-message", "Введенные данные неверны"),
                ("validate-async-checking", "Проверка..."),
            ],
        );
        nls
    }
}
