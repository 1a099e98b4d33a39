//! Length rule: the value's length must fall inside configured bounds.

use std::sync::Arc;

use serde_json::Value;

use super::{pick, ValidationRule};
use crate::nls::Nls;
use crate::validation::{MessageKind, Verdict};
use crate::value;

/// Configuration for [`LengthRule`].
///
/// An unset `max` means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LengthConfig {
    /// Message shown on failure; overrides the auto-selected one.
    pub message: Option<String>,
    /// Message shown during async validation (kept for the common shape).
    pub async_message: Option<String>,
    /// Whether the rule is evaluated at all.
    pub is_active: Option<bool>,
    /// Minimum length, inclusive.
    pub min: Option<usize>,
    /// Maximum length, inclusive.
    pub max: Option<usize>,
}

impl From<bool> for LengthConfig {
    fn from(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

impl From<()> for LengthConfig {
    fn from((): ()) -> Self {
        Self::default()
    }
}

/// Checks `min <= value.length <= max`.
///
/// Strings count characters, arrays count elements; values without a length
/// are never length-valid.
pub struct LengthRule {
    nls: Arc<Nls>,
    user: LengthConfig,
    defaults: LengthConfig,
}

impl LengthRule {
    /// Create a length rule.
    pub fn new(nls: Arc<Nls>, config: impl Into<LengthConfig>) -> Self {
        Self {
            nls,
            user: config.into(),
            defaults: LengthConfig {
                message: None,
                async_message: None,
                is_active: Some(true),
                min: Some(0),
                max: None,
            },
        }
    }

    /// Effective configuration: user values merged over defaults.
    pub fn config(&self) -> LengthConfig {
        LengthConfig {
            message: pick(&self.user.message, &self.defaults.message),
            async_message: pick(&self.user.async_message, &self.defaults.async_message),
            is_active: pick(&self.user.is_active, &self.defaults.is_active),
            min: pick(&self.user.min, &self.defaults.min),
            max: pick(&self.user.max, &self.defaults.max),
        }
    }

    /// Dictionary key matching which bounds are configured.
    fn auto_message_key(config: &LengthConfig) -> &'static str {
        let min = config.min.unwrap_or(0);
        match (min > 0, config.max) {
            (true, None) => "validate-length-message-min",
            (false, Some(_)) => "validate-length-message-max",
            _ => "validate-length-message-min-max",
        }
    }

    fn substitutions(config: &LengthConfig) -> Vec<(&'static str, String)> {
        let mut substitutions = vec![("min", config.min.unwrap_or(0).to_string())];
        if let Some(max) = config.max {
            substitutions.push(("max", max.to_string()));
        }
        substitutions
    }
}

impl ValidationRule for LengthRule {
    fn validate(&self, val: &Value) -> Verdict {
        let config = self.config();
        if !config.is_active.unwrap_or(true) {
            return Verdict::Valid;
        }
        let Some(len) = value::length_of(val) else {
            return Verdict::Invalid;
        };
        let min_ok = len >= config.min.unwrap_or(0);
        let max_ok = config.max.is_none_or(|max| len <= max);
        (min_ok && max_ok).into()
    }

    fn message(&self, kind: MessageKind) -> String {
        let config = self.config();
        let substitutions = Self::substitutions(&config);
        match kind {
            MessageKind::Message => {
                let key = match config.message.as_deref() {
                    Some(message) if !message.is_empty() => message,
                    _ => Self::auto_message_key(&config),
                };
                self.nls.translate(key, &substitutions)
            }
            MessageKind::AsyncMessage => self
                .nls
                .translate(config.async_message.as_deref().unwrap_or(""), &substitutions),
        }
    }
}
