//! Whole-form aggregation over registered fields.

use std::collections::HashMap;

use log::debug;

use crate::validation::field::{FieldState, FormField};
use crate::validation::Verdict;

/// Group validation over an ordered collection of fields.
///
/// Fields are evaluated in registration order and every field is always
/// evaluated, so each one's displayed state and message update even after
/// an earlier failure.
///
/// # Example
///
/// ```ignore
/// let form = FormValidator::new()
///     .with_field(username.clone())
///     .with_field(email.clone());
///
/// if !form.valid() {
///     // Every invalid field now displays its message.
/// }
/// ```
#[derive(Debug, Default)]
pub struct FormValidator {
    fields: Vec<FormField>,
}

impl FormValidator {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field, builder style.
    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    /// Register a field.
    pub fn register(&mut self, field: FormField) {
        self.fields.push(field);
    }

    /// Registered fields, in registration order.
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Look up a registered field by name.
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Validate every registered field and combine the verdicts; any
    /// non-valid field makes the form non-valid, with pending checks
    /// propagating as [`Verdict::Pending`].
    ///
    /// `silent` is accepted for host-form signature compatibility; field
    /// states and messages update regardless, so even a silent read
    /// refreshes what every field displays.
    pub fn validate(&self, silent: bool) -> Verdict {
        let mut verdict = Verdict::Valid;
        for field in &self.fields {
            verdict = verdict.and(field.validate());
        }
        debug!(
            "form validation over {} fields (silent: {silent}): {verdict:?}",
            self.fields.len()
        );
        verdict
    }

    /// Whether every field currently validates.
    ///
    /// Reading this re-runs every field's validation and updates their
    /// displayed state.
    pub fn valid(&self) -> bool {
        self.validate(true).is_valid()
    }

    /// Force fields named in `messages` into the invalid state with the
    /// given message, overriding their own last verdicts. Used to surface
    /// server-side validation failures after a submit.
    pub fn show_errors(&self, messages: &HashMap<String, String>) {
        for field in &self.fields {
            if let Some(message) = messages.get(&field.name()) {
                field.set_state(FieldState::Invalid, message.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nls::Nls;
    use crate::validation::rules::{CustomRule, RequiredRule};
    use serde_json::json;
    use std::sync::Arc;

    fn nls() -> Arc<Nls> {
        Arc::new(Nls::default())
    }

    fn required_field(name: &str) -> FormField {
        FormField::new(name).with_required(RequiredRule::new(nls(), ()))
    }

    #[test]
    fn test_all_fields_always_evaluated() {
        let first = required_field("first");
        let second = required_field("second");
        let form = FormValidator::new()
            .with_field(first.clone())
            .with_field(second.clone());

        assert_eq!(form.validate(false), Verdict::Invalid);
        // The second field was still evaluated and shows its message.
        assert_eq!(second.state(), FieldState::Invalid);
        assert_eq!(second.message(), "This field is required");
    }

    #[test]
    fn test_valid_when_all_fields_pass() {
        let first = required_field("first");
        let second = required_field("second");
        let form = FormValidator::new()
            .with_field(first.clone())
            .with_field(second.clone());

        first.set_value(json!("a"));
        second.set_value(json!("b"));
        assert!(form.valid());
    }

    #[test]
    fn test_valid_read_updates_field_state() {
        let field = required_field("name");
        let form = FormValidator::new().with_field(field.clone());

        assert_eq!(field.state(), FieldState::Clean);
        let _ = form.valid();
        assert_eq!(field.state(), FieldState::Invalid);
    }

    #[test]
    fn test_show_errors_overrides_field_verdict() {
        let email = FormField::new("email").with_rule(CustomRule::new(nls(), |_| true));
        email.set_value(json!("user@domain.com"));
        assert_eq!(email.state(), FieldState::Valid);

        let form = FormValidator::new().with_field(email.clone());
        let messages = HashMap::from([("email".to_string(), "taken".to_string())]);
        form.show_errors(&messages);

        assert_eq!(email.state(), FieldState::Invalid);
        assert_eq!(email.message(), "taken");
    }

    #[test]
    fn test_show_errors_ignores_unknown_names() {
        let field = required_field("name");
        let form = FormValidator::new().with_field(field.clone());
        form.show_errors(&HashMap::from([("other".to_string(), "nope".to_string())]));
        assert_eq!(field.state(), FieldState::Clean);
    }

    #[test]
    fn test_field_lookup() {
        let form = FormValidator::new()
            .with_field(FormField::new("a"))
            .with_field(FormField::new("b"));
        assert!(form.field("b").is_some());
        assert!(form.field("missing").is_none());
    }
}
