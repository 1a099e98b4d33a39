//! Password rules: complexity requirements and repeat-field matching.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;
use serde_json::Value;

use super::{pick, resolve_message, ValidationRule};
use crate::nls::Nls;
use crate::validation::field::FormField;
use crate::validation::{MessageKind, Verdict};
use crate::value;

fn class_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("character class pattern is valid"))
}

fn has_lowercase(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    class_regex(&RE, "[a-zа-яё]").is_match(text)
}

fn has_uppercase(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    class_regex(&RE, "[A-ZА-ЯЁ]").is_match(text)
}

fn has_digits(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    class_regex(&RE, r"\d").is_match(text)
}

fn has_non_alnum(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    class_regex(&RE, r"[^\w\s]").is_match(text)
}

/// Split a username on non-word runs and report whether any fragment occurs
/// inside the password. Empty fragments are ignored.
fn contains_username_fragment(password: &str, username: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    class_regex(&RE, r"\W+")
        .split(username)
        .filter(|fragment| !fragment.is_empty())
        .any(|fragment| password.contains(fragment))
}

/// Configuration for [`PasswordComplexityRule`].
#[derive(Clone, Default)]
pub struct PasswordComplexityConfig {
    /// Message shown on failure; overrides the per-check message.
    pub message: Option<String>,
    /// Message shown during async validation (kept for the common shape).
    pub async_message: Option<String>,
    /// Whether the rule is evaluated at all.
    pub is_active: Option<bool>,
    /// Minimum password length.
    pub min_length: Option<usize>,
    /// Require lowercase characters.
    pub lowercase: Option<bool>,
    /// Require uppercase characters.
    pub uppercase: Option<bool>,
    /// Require digits.
    pub digits: Option<bool>,
    /// Require non-alphanumeric characters.
    pub non_alnum: Option<bool>,
    /// Number of character classes (of the four above) the password must
    /// satisfy. When set, the individual class flags are ignored.
    pub min_complexity: Option<usize>,
    /// Field holding the username; no fragment of it may appear in the
    /// password.
    pub username_field: Option<FormField>,
}

impl fmt::Debug for PasswordComplexityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordComplexityConfig")
            .field("message", &self.message)
            .field("is_active", &self.is_active)
            .field("min_length", &self.min_length)
            .field("lowercase", &self.lowercase)
            .field("uppercase", &self.uppercase)
            .field("digits", &self.digits)
            .field("non_alnum", &self.non_alnum)
            .field("min_complexity", &self.min_complexity)
            .field("username_field", &self.username_field.is_some())
            .finish()
    }
}

impl From<&str> for PasswordComplexityConfig {
    fn from(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Default::default()
        }
    }
}

impl From<bool> for PasswordComplexityConfig {
    fn from(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

impl From<()> for PasswordComplexityConfig {
    fn from((): ()) -> Self {
        Self::default()
    }
}

/// Checks password strength: minimum length, character-class requirements
/// (individually flagged or counted via `min_complexity`), and exclusion of
/// username fragments.
///
/// The failing check's message key is recorded during `validate`, so
/// `message` reports the reason for the most recent evaluation.
pub struct PasswordComplexityRule {
    nls: Arc<Nls>,
    user: PasswordComplexityConfig,
    defaults: PasswordComplexityConfig,
    failure: Mutex<Option<&'static str>>,
}

impl PasswordComplexityRule {
    /// Create a complexity rule; `config` accepts a full
    /// [`PasswordComplexityConfig`], a message (`&str`), an activity flag
    /// (`bool`), or `()` for defaults.
    pub fn new(nls: Arc<Nls>, config: impl Into<PasswordComplexityConfig>) -> Self {
        Self {
            nls,
            user: config.into(),
            defaults: PasswordComplexityConfig {
                message: None,
                async_message: None,
                is_active: Some(true),
                min_length: Some(6),
                lowercase: Some(false),
                uppercase: Some(false),
                digits: Some(false),
                non_alnum: Some(false),
                min_complexity: None,
                username_field: None,
            },
            failure: Mutex::new(None),
        }
    }

    /// Effective configuration: user values merged over defaults.
    pub fn config(&self) -> PasswordComplexityConfig {
        PasswordComplexityConfig {
            message: pick(&self.user.message, &self.defaults.message),
            async_message: pick(&self.user.async_message, &self.defaults.async_message),
            is_active: pick(&self.user.is_active, &self.defaults.is_active),
            min_length: pick(&self.user.min_length, &self.defaults.min_length),
            lowercase: pick(&self.user.lowercase, &self.defaults.lowercase),
            uppercase: pick(&self.user.uppercase, &self.defaults.uppercase),
            digits: pick(&self.user.digits, &self.defaults.digits),
            non_alnum: pick(&self.user.non_alnum, &self.defaults.non_alnum),
            min_complexity: pick(&self.user.min_complexity, &self.defaults.min_complexity),
            username_field: pick(&self.user.username_field, &self.defaults.username_field),
        }
    }

    fn failing_check(config: &PasswordComplexityConfig, password: &str) -> Option<&'static str> {
        if let Some(min_length) = config.min_length {
            if min_length > 0 && password.chars().count() < min_length {
                return Some("validate-password-complexity-message-min-length");
            }
        }

        if let Some(username_field) = &config.username_field {
            let username = value::coerce_string(&username_field.value());
            if contains_username_fragment(password, &username) {
                return Some("validate-password-complexity-message-username-parts");
            }
        }

        let classes = [
            (has_lowercase(password), config.lowercase),
            (has_uppercase(password), config.uppercase),
            (has_digits(password), config.digits),
            (has_non_alnum(password), config.non_alnum),
        ];

        if let Some(min_complexity) = config.min_complexity {
            let satisfied = classes.iter().filter(|(present, _)| *present).count();
            if satisfied < min_complexity {
                return Some("validate-password-complexity-message-low-complexity");
            }
            return None;
        }

        let keys = [
            "validate-password-complexity-message-lowercase",
            "validate-password-complexity-message-uppercase",
            "validate-password-complexity-message-digits",
            "validate-password-complexity-message-non-alphanumeric",
        ];
        for ((present, required), key) in classes.into_iter().zip(keys) {
            if required.unwrap_or(false) && !present {
                return Some(key);
            }
        }
        None
    }
}

impl ValidationRule for PasswordComplexityRule {
    fn validate(&self, val: &Value) -> Verdict {
        let config = self.config();
        let mut failure = self.failure.lock().unwrap_or_else(|e| e.into_inner());
        *failure = None;

        if !config.is_active.unwrap_or(true) {
            return Verdict::Valid;
        }

        let password = value::coerce_string(val);
        *failure = Self::failing_check(&config, &password);
        failure.is_none().into()
    }

    fn message(&self, kind: MessageKind) -> String {
        let config = self.config();
        let substitutions = [(
            "min_length",
            config.min_length.unwrap_or_default().to_string(),
        )];

        match kind {
            MessageKind::Message => {
                let stored = self.failure.lock().unwrap_or_else(|e| e.into_inner());
                let key = match config.message.as_deref() {
                    Some(message) if !message.is_empty() => message,
                    _ => stored.unwrap_or(""),
                };
                self.nls.translate(key, &substitutions)
            }
            MessageKind::AsyncMessage => resolve_message(
                &self.nls,
                config.async_message.as_deref(),
                &substitutions,
            ),
        }
    }
}

/// Configuration for [`PasswordRepeatRule`].
#[derive(Clone, Default)]
pub struct PasswordRepeatConfig {
    /// Message shown on failure.
    pub message: Option<String>,
    /// Message shown during async validation (kept for the common shape).
    pub async_message: Option<String>,
    /// Whether the rule is evaluated at all.
    pub is_active: Option<bool>,
    /// The paired field whose value must match.
    pub repeat: Option<FormField>,
}

impl fmt::Debug for PasswordRepeatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordRepeatConfig")
            .field("message", &self.message)
            .field("is_active", &self.is_active)
            .field("repeat", &self.repeat.is_some())
            .finish()
    }
}

impl From<FormField> for PasswordRepeatConfig {
    fn from(repeat: FormField) -> Self {
        Self {
            repeat: Some(repeat),
            ..Default::default()
        }
    }
}

impl From<&FormField> for PasswordRepeatConfig {
    fn from(repeat: &FormField) -> Self {
        Self {
            repeat: Some(repeat.clone()),
            ..Default::default()
        }
    }
}

impl From<bool> for PasswordRepeatConfig {
    fn from(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

/// Passes when the value strictly equals the paired field's current value.
///
/// With no paired field configured there is nothing to compare, so the rule
/// passes.
pub struct PasswordRepeatRule {
    nls: Arc<Nls>,
    user: PasswordRepeatConfig,
    defaults: PasswordRepeatConfig,
}

impl PasswordRepeatRule {
    /// Create a repeat rule; `config` accepts a full
    /// [`PasswordRepeatConfig`], the paired [`FormField`] directly, or an
    /// activity flag (`bool`).
    pub fn new(nls: Arc<Nls>, config: impl Into<PasswordRepeatConfig>) -> Self {
        Self {
            nls,
            user: config.into(),
            defaults: PasswordRepeatConfig {
                message: Some("validate-password-repeat-message".to_string()),
                async_message: None,
                is_active: Some(true),
                repeat: None,
            },
        }
    }

    /// Effective configuration: user values merged over defaults.
    pub fn config(&self) -> PasswordRepeatConfig {
        PasswordRepeatConfig {
            message: pick(&self.user.message, &self.defaults.message),
            async_message: pick(&self.user.async_message, &self.defaults.async_message),
            is_active: pick(&self.user.is_active, &self.defaults.is_active),
            repeat: pick(&self.user.repeat, &self.defaults.repeat),
        }
    }
}

impl ValidationRule for PasswordRepeatRule {
    fn validate(&self, val: &Value) -> Verdict {
        let config = self.config();
        if !config.is_active.unwrap_or(true) {
            return Verdict::Valid;
        }
        let Some(repeat) = &config.repeat else {
            return Verdict::Valid;
        };
        (*val == repeat.value()).into()
    }

    fn message(&self, kind: MessageKind) -> String {
        let config = self.config();
        let configured = match kind {
            MessageKind::Message => config.message,
            MessageKind::AsyncMessage => config.async_message,
        };
        resolve_message(&self.nls, configured.as_deref(), &[])
    }
}
