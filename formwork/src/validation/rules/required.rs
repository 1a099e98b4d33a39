//! Required rule: the value must be truthy.

use std::sync::Arc;

use serde_json::Value;

use super::{pick, resolve_message, ValidationRule};
use crate::nls::Nls;
use crate::validation::{MessageKind, Verdict};
use crate::value;

/// Configuration for [`RequiredRule`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredConfig {
    /// Message shown on failure; a dictionary key or literal text.
    pub message: Option<String>,
    /// Message shown during async validation (unused by this rule, kept for
    /// the common config shape).
    pub async_message: Option<String>,
    /// Whether the rule is evaluated at all.
    pub is_active: Option<bool>,
}

impl From<&str> for RequiredConfig {
    fn from(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Default::default()
        }
    }
}

impl From<String> for RequiredConfig {
    fn from(message: String) -> Self {
        Self {
            message: Some(message),
            ..Default::default()
        }
    }
}

impl From<bool> for RequiredConfig {
    fn from(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

impl From<()> for RequiredConfig {
    fn from((): ()) -> Self {
        Self::default()
    }
}

/// Fails on empty/falsy values: empty strings and arrays, zero, `false`,
/// null.
pub struct RequiredRule {
    nls: Arc<Nls>,
    user: RequiredConfig,
    defaults: RequiredConfig,
}

impl RequiredRule {
    /// Create a required rule; `config` accepts a full [`RequiredConfig`],
    /// a message (`&str`), an activity flag (`bool`), or `()` for defaults.
    pub fn new(nls: Arc<Nls>, config: impl Into<RequiredConfig>) -> Self {
        Self {
            nls,
            user: config.into(),
            defaults: RequiredConfig {
                message: Some("validate-required-message".to_string()),
                async_message: None,
                is_active: Some(true),
            },
        }
    }

    /// Effective configuration: user values merged over defaults.
    pub fn config(&self) -> RequiredConfig {
        RequiredConfig {
            message: pick(&self.user.message, &self.defaults.message),
            async_message: pick(&self.user.async_message, &self.defaults.async_message),
            is_active: pick(&self.user.is_active, &self.defaults.is_active),
        }
    }
}

impl ValidationRule for RequiredRule {
    fn validate(&self, val: &Value) -> Verdict {
        let config = self.config();
        if !config.is_active.unwrap_or(true) {
            return Verdict::Valid;
        }
        value::is_truthy(val).into()
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(config: impl Into<RequiredConfig>) -> RequiredRule {
        RequiredRule::new(Arc::new(Nls::default()), config)
    }

    #[test]
    fn test_truthy_values_pass() {
        let rule = rule(());
        assert_eq!(rule.validate(&json!("x")), Verdict::Valid);
        assert_eq!(rule.validate(&json!(1)), Verdict::Valid);
        assert_eq!(rule.validate(&json!(["a"])), Verdict::Valid);
    }

    #[test]
    fn test_falsy_values_fail() {
        let rule = rule(());
        assert_eq!(rule.validate(&json!("")), Verdict::Invalid);
        assert_eq!(rule.validate(&json!(0)), Verdict::Invalid);
        assert_eq!(rule.validate(&Value::Null), Verdict::Invalid);
        assert_eq!(rule.validate(&json!([])), Verdict::Invalid);
    }

    #[test]
    fn test_inactive_always_passes() {
        let rule = rule(false);
        assert_eq!(rule.validate(&json!("")), Verdict::Valid);
        assert_eq!(rule.validate(&Value::Null), Verdict::Valid);
    }

    #[test]
    fn test_default_message() {
        let rule = rule(());
        assert_eq!(rule.message(MessageKind::Message), "This field is required");
    }

    #[test]
    fn test_message_shorthand() {
        let rule = rule("Fill this in");
        assert_eq!(rule.message(MessageKind::Message), "Fill this in");
    }

    #[test]
    fn test_config_merge_is_idempotent() {
        let rule = rule("Fill this in");
        assert_eq!(rule.config(), rule.config());
    }
}
