//! Validation rules.
//!
//! One rule is one configurable, independently evaluable check attached to a
//! field. Rules are registered explicitly on a [`FormField`](crate::validation::field::FormField)
//! in evaluation order; the required rule is referenced separately because it
//! always runs first.
//!
//! Every rule follows the same configuration model: a user config struct
//! whose fields are all optional, merged over the rule's defaults by
//! `config()`, with user values winning. Scalar shorthands map onto the
//! rule's most significant field through `From` conversions (`&str` for the
//! message, `f64` for a bound, `bool` for `is_active`), so
//! `RequiredRule::new(nls, "Fill in {{label}}")` and
//! `RangeRule::ge(nls, 18.0)` both read naturally.

mod api;
mod custom;
mod length;
mod password;
mod range;
mod regexp;
mod required;

pub use api::{ApiConfig, ApiRule, UrlBuilder, URL_VALUE_PLACEHOLDER};
pub use custom::{
    AsyncCallback, AsyncConfig, AsyncPredicate, AsyncResolver, AsyncRule, CustomConfig, CustomRule,
    SyncPredicate,
};
pub use length::{LengthConfig, LengthRule};
pub use password::{
    PasswordComplexityConfig, PasswordComplexityRule, PasswordRepeatConfig, PasswordRepeatRule,
};
pub use range::{RangeConfig, RangeRule};
pub use regexp::{parse_regexp, EmailConfig, RegexpConfig, RegexpRule};
pub use required::{RequiredConfig, RequiredRule};

use serde_json::Value;

use crate::nls::Nls;
use crate::validation::field::FormField;
use crate::validation::{MessageKind, Verdict};

/// A configurable validation check.
///
/// `validate` must consult the effective `is_active` first: an inactive rule
/// reports [`Verdict::Valid`] for any value without evaluating the rule body
/// or touching async machinery. Evaluation never panics and never returns an
/// error; failures of any kind become [`Verdict::Invalid`].
///
/// Rules that derive their message from evaluation state (the password
/// complexity rule stores the failing check) must record it during
/// `validate`, since `message` cannot re-run the evaluation.
pub trait ValidationRule: Send + Sync {
    /// Evaluate the rule against a field value.
    fn validate(&self, value: &Value) -> Verdict;

    /// Resolve the configured message of the given kind through the
    /// translation service, with the rule's config fields as substitutions.
    fn message(&self, kind: MessageKind) -> String;

    /// Called when the rule is attached to a field. Async rules keep a weak
    /// handle so a resolved check can re-trigger the field's validation.
    fn bind(&self, _field: &FormField) {}
}

/// Merge one optional config field over its default.
pub(crate) fn pick<T: Clone>(user: &Option<T>, default: &Option<T>) -> Option<T> {
    user.clone().or_else(|| default.clone())
}

/// Resolve a configured message text or key through the translation service.
///
/// An unset or empty message resolves to the empty string, matching the
/// lookup chain's key-is-its-own-fallback behavior.
pub(crate) fn resolve_message(
    nls: &Nls,
    configured: Option<&str>,
    substitutions: &[(&str, String)],
) -> String {
    nls.translate(configured.unwrap_or(""), substitutions)
}
