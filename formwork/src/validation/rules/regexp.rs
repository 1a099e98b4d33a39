//! Regexp rule and its email variant.

use std::sync::{Arc, OnceLock};

use log::warn;
use regex::Regex;
use serde_json::Value;

use super::{pick, resolve_message, ValidationRule};
use crate::nls::Nls;
use crate::validation::{MessageKind, Verdict};
use crate::value;

/// RFC-ish email pattern used as the email variant's default.
const EMAIL_PATTERN: &str = r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}\.?$";

/// Parse a pattern in `/pattern/flags` notation, or as a bare pattern.
///
/// Supported flags: `i`, `m`, `s` (mapped onto inline flags); `g`, `u` and
/// `y` have no equivalent and are ignored. A malformed pattern yields
/// `None`, which the rule treats as "no pattern configured".
pub fn parse_regexp(pattern: &str) -> Option<Regex> {
    let (body, flags) = match slash_form(pattern) {
        Some((body, flags)) => (body, flags),
        None => (pattern, ""),
    };

    let inline: String = flags.chars().filter(|f| "ims".contains(*f)).collect();
    let full = if inline.is_empty() {
        body.to_string()
    } else {
        format!("(?{inline}){body}")
    };

    match Regex::new(&full) {
        Ok(re) => Some(re),
        Err(err) => {
            warn!("invalid validation pattern {pattern:?}: {err}");
            None
        }
    }
}

/// Split `/pattern/flags` notation into its parts.
fn slash_form(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let slash = rest.rfind('/')?;
    let flags = &rest[slash + 1..];
    if flags.chars().all(|f| f.is_ascii_alphabetic()) {
        Some((&rest[..slash], flags))
    } else {
        None
    }
}

/// Configuration for [`RegexpRule`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegexpConfig {
    /// Message shown on failure; a dictionary key or literal text.
    pub message: Option<String>,
    /// Message shown during async validation (kept for the common shape).
    pub async_message: Option<String>,
    /// Whether the rule is evaluated at all.
    pub is_active: Option<bool>,
    /// Pattern to test, in bare or `/pattern/flags` notation.
    pub regexp: Option<String>,
    /// When `true`, validation passes if the value does NOT match.
    pub forbid: Option<bool>,
}

impl From<&str> for RegexpConfig {
    fn from(regexp: &str) -> Self {
        Self {
            regexp: Some(regexp.to_string()),
            ..Default::default()
        }
    }
}

impl From<String> for RegexpConfig {
    fn from(regexp: String) -> Self {
        Self {
            regexp: Some(regexp),
            ..Default::default()
        }
    }
}

impl From<bool> for RegexpConfig {
    fn from(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

impl From<()> for RegexpConfig {
    fn from((): ()) -> Self {
        Self::default()
    }
}

/// Tests the string coercion of the value against a pattern, optionally
/// inverted via `forbid`.
///
/// A missing or malformed pattern passes (nothing is configured to check).
pub struct RegexpRule {
    nls: Arc<Nls>,
    user: RegexpConfig,
    defaults: RegexpConfig,
    compiled: OnceLock<Option<Regex>>,
}

impl RegexpRule {
    /// Create a regexp rule; `config` accepts a full [`RegexpConfig`], a
    /// pattern (`&str`), an activity flag (`bool`), or `()`.
    pub fn new(nls: Arc<Nls>, config: impl Into<RegexpConfig>) -> Self {
        Self::with_defaults(
            nls,
            config.into(),
            RegexpConfig {
                message: Some("validate-regexp-message".to_string()),
                async_message: None,
                is_active: Some(true),
                regexp: None,
                forbid: Some(false),
            },
        )
    }

    /// Email variant: preloads an RFC-ish pattern and the email failure
    /// message. A user-supplied `regexp` still overrides the pattern, and
    /// a bare `&str` config is the failure message rather than a pattern.
    pub fn email(nls: Arc<Nls>, config: impl Into<EmailConfig>) -> Self {
        Self::with_defaults(
            nls,
            config.into().0,
            RegexpConfig {
                message: Some("validate-email-message".to_string()),
                async_message: None,
                is_active: Some(true),
                regexp: Some(EMAIL_PATTERN.to_string()),
                forbid: Some(false),
            },
        )
    }

    fn with_defaults(nls: Arc<Nls>, user: RegexpConfig, defaults: RegexpConfig) -> Self {
        Self {
            nls,
            user,
            defaults,
            compiled: OnceLock::new(),
        }
    }

    /// Effective configuration: user values merged over defaults.
    pub fn config(&self) -> RegexpConfig {
        RegexpConfig {
            message: pick(&self.user.message, &self.defaults.message),
            async_message: pick(&self.user.async_message, &self.defaults.async_message),
            is_active: pick(&self.user.is_active, &self.defaults.is_active),
            regexp: pick(&self.user.regexp, &self.defaults.regexp),
            forbid: pick(&self.user.forbid, &self.defaults.forbid),
        }
    }

    fn regex(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| self.config().regexp.as_deref().and_then(parse_regexp))
            .as_ref()
    }
}

impl ValidationRule for RegexpRule {
    fn validate(&self, val: &Value) -> Verdict {
        let config = self.config();
        if !config.is_active.unwrap_or(true) {
            return Verdict::Valid;
        }
        let Some(re) = self.regex() else {
            return Verdict::Valid;
        };

        let text = value::coerce_string(val);
        let matched = re.is_match(&text);
        let valid = if config.forbid.unwrap_or(false) {
            !matched
        } else {
            matched
        };
        valid.into()
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

/// User config for the email variant, where a bare `&str` means the failure
/// message instead of a pattern.
pub struct EmailConfig(RegexpConfig);

impl From<RegexpConfig> for EmailConfig {
    fn from(config: RegexpConfig) -> Self {
        Self(config)
    }
}

impl From<&str> for EmailConfig {
    fn from(message: &str) -> Self {
        Self(RegexpConfig {
            message: Some(message.to_string()),
            ..Default::default()
        })
    }
}

impl From<String> for EmailConfig {
    fn from(message: String) -> Self {
        Self(RegexpConfig {
            message: Some(message),
            ..Default::default()
        })
    }
}

impl From<bool> for EmailConfig {
    fn from(is_active: bool) -> Self {
        Self(RegexpConfig {
            is_active: Some(is_active),
            ..Default::default()
        })
    }
}

impl From<()> for EmailConfig {
    fn from((): ()) -> Self {
        Self(RegexpConfig::default())
    }
}
