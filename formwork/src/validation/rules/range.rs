//! Range rule: the numeric value must satisfy every configured comparison.

use std::sync::Arc;

use serde_json::Value;

use super::{pick, ValidationRule};
use crate::nls::Nls;
use crate::validation::{MessageKind, Verdict};
use crate::value;

/// Configuration for [`RangeRule`].
///
/// Any combination of the four comparisons may be set; all configured ones
/// must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeConfig {
    /// Message shown on failure; overrides the auto-selected one.
    pub message: Option<String>,
    /// Message shown during async validation (kept for the common shape).
    pub async_message: Option<String>,
    /// Whether the rule is evaluated at all.
    pub is_active: Option<bool>,
    /// Greater-or-equal bound.
    pub ge: Option<f64>,
    /// Strictly-greater bound.
    pub gt: Option<f64>,
    /// Less-or-equal bound.
    pub le: Option<f64>,
    /// Strictly-less bound.
    pub lt: Option<f64>,
}

impl From<bool> for RangeConfig {
    fn from(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

impl From<()> for RangeConfig {
    fn from((): ()) -> Self {
        Self::default()
    }
}

/// Checks the value against `ge`/`gt`/`le`/`lt` bounds.
///
/// Non-numeric values fail any configured comparison; with no bounds
/// configured the rule passes.
pub struct RangeRule {
    nls: Arc<Nls>,
    user: RangeConfig,
    defaults: RangeConfig,
}

impl RangeRule {
    /// Create a range rule with an arbitrary combination of bounds.
    pub fn new(nls: Arc<Nls>, config: impl Into<RangeConfig>) -> Self {
        Self {
            nls,
            user: config.into(),
            defaults: RangeConfig {
                message: None,
                async_message: None,
                is_active: Some(true),
                ge: None,
                gt: None,
                le: None,
                lt: None,
            },
        }
    }

    /// Greater-or-equal shorthand: `RangeRule::ge(nls, 18.0)`.
    pub fn ge(nls: Arc<Nls>, bound: f64) -> Self {
        Self::new(
            nls,
            RangeConfig {
                ge: Some(bound),
                ..Default::default()
            },
        )
    }

    /// Strictly-greater shorthand.
    pub fn gt(nls: Arc<Nls>, bound: f64) -> Self {
        Self::new(
            nls,
            RangeConfig {
                gt: Some(bound),
                ..Default::default()
            },
        )
    }

    /// Less-or-equal shorthand.
    pub fn le(nls: Arc<Nls>, bound: f64) -> Self {
        Self::new(
            nls,
            RangeConfig {
                le: Some(bound),
                ..Default::default()
            },
        )
    }

    /// Strictly-less shorthand.
    pub fn lt(nls: Arc<Nls>, bound: f64) -> Self {
        Self::new(
            nls,
            RangeConfig {
                lt: Some(bound),
                ..Default::default()
            },
        )
    }

    /// Effective configuration: user values merged over defaults.
    pub fn config(&self) -> RangeConfig {
        RangeConfig {
            message: pick(&self.user.message, &self.defaults.message),
            async_message: pick(&self.user.async_message, &self.defaults.async_message),
            is_active: pick(&self.user.is_active, &self.defaults.is_active),
            ge: pick(&self.user.ge, &self.defaults.ge),
            gt: pick(&self.user.gt, &self.defaults.gt),
            le: pick(&self.user.le, &self.defaults.le),
            lt: pick(&self.user.lt, &self.defaults.lt),
        }
    }

    /// Lower/upper bounds for message substitution: `gt` overrides `ge`,
    /// `lt` overrides `le`.
    fn message_bounds(config: &RangeConfig) -> (Option<f64>, Option<f64>) {
        (config.gt.or(config.ge), config.lt.or(config.le))
    }
}

impl ValidationRule for RangeRule {
    fn validate(&self, val: &Value) -> Verdict {
        let config = self.config();
        if !config.is_active.unwrap_or(true) {
            return Verdict::Valid;
        }

        let number = value::as_number(val);
        let holds = |check: fn(f64, f64) -> bool, bound: Option<f64>| match bound {
            Some(bound) => number.is_some_and(|n| check(n, bound)),
            None => true,
        };

        let valid = holds(|n, b| n >= b, config.ge)
            && holds(|n, b| n > b, config.gt)
            && holds(|n, b| n <= b, config.le)
            && holds(|n, b| n < b, config.lt);
        valid.into()
    }

    fn message(&self, kind: MessageKind) -> String {
        let config = self.config();
        let (min, max) = Self::message_bounds(&config);

        let mut substitutions = Vec::new();
        if let Some(min) = min {
            substitutions.push(("min", value::format_number(min)));
        }
        if let Some(max) = max {
            substitutions.push(("max", value::format_number(max)));
        }

        match kind {
            MessageKind::Message => {
                let key = match config.message.as_deref() {
                    Some(message) if !message.is_empty() => message,
                    _ => match (min, max) {
                        (Some(_), None) => "validate-range-message-min",
                        (None, Some(_)) => "validate-range-message-max",
                        _ => "validate-range-message-min-max",
                    },
                };
                self.nls.translate(key, &substitutions)
            }
            MessageKind::AsyncMessage => self
                .nls
                .translate(config.async_message.as_deref().unwrap_or(""), &substitutions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nls() -> Arc<Nls> {
        Arc::new(Nls::default())
    }

    #[test]
    fn test_ge_le_window() {
        let rule = RangeRule::new(
            nls(),
            RangeConfig {
                ge: Some(5.0),
                le: Some(10.0),
                ..Default::default()
            },
        );
        assert_eq!(rule.validate(&json!(7)), Verdict::Valid);
        assert_eq!(rule.validate(&json!(4)), Verdict::Invalid);
        assert_eq!(rule.validate(&json!(11)), Verdict::Invalid);
    }

    #[test]
    fn test_strict_bounds() {
        let rule = RangeRule::gt(nls(), 0.0);
        assert_eq!(rule.validate(&json!(0)), Verdict::Invalid);
        assert_eq!(rule.validate(&json!(1)), Verdict::Valid);

        let rule = RangeRule::lt(nls(), 10.0);
        assert_eq!(rule.validate(&json!(10)), Verdict::Invalid);
        assert_eq!(rule.validate(&json!(9)), Verdict::Valid);
    }

    #[test]
    fn test_numeric_strings() {
        let rule = RangeRule::ge(nls(), 5.0);
        assert_eq!(rule.validate(&json!("7")), Verdict::Valid);
        assert_eq!(rule.validate(&json!("3")), Verdict::Invalid);
    }

    #[test]
    fn test_non_numeric_fails_configured_bound() {
        let rule = RangeRule::ge(nls(), 5.0);
        assert_eq!(rule.validate(&json!("abc")), Verdict::Invalid);
    }

    #[test]
    fn test_no_bounds_passes() {
        let rule = RangeRule::new(nls(), ());
        assert_eq!(rule.validate(&json!("abc")), Verdict::Valid);
    }

    #[test]
    fn test_inactive_always_passes() {
        let rule = RangeRule::new(
            nls(),
            RangeConfig {
                is_active: Some(false),
                ge: Some(5.0),
                ..Default::default()
            },
        );
        assert_eq!(rule.validate(&json!(1)), Verdict::Valid);
    }

    #[test]
    fn test_auto_message_selection() {
        assert_eq!(
            RangeRule::ge(nls(), 5.0).message(MessageKind::Message),
            "The value should be at least 5"
        );
        assert_eq!(
            RangeRule::le(nls(), 10.0).message(MessageKind::Message),
            "The value should be 10 max"
        );
        let window = RangeRule::new(
            nls(),
            RangeConfig {
                ge: Some(5.0),
                le: Some(10.0),
                ..Default::default()
            },
        );
        assert_eq!(
            window.message(MessageKind::Message),
            "The value should be between 5 and 10"
        );
    }

    #[test]
    fn test_config_merge_is_idempotent() {
        let rule = RangeRule::ge(nls(), 5.0);
        assert_eq!(rule.config(), rule.config());
    }
}
