//! Per-field validation state.

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use log::trace;
use serde_json::Value;

use crate::validation::rules::ValidationRule;
use crate::validation::{MessageKind, Verdict};
use crate::value;

/// Displayed validation state of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldState {
    /// Untouched.
    #[default]
    Clean,
    /// The value passes all active rules.
    Valid,
    /// The value fails at least one rule.
    Invalid,
    /// An asynchronous check is in flight.
    Progress,
}

struct FieldInner {
    name: String,
    label: String,
    hint: String,
    value: Value,
    state: FieldState,
    message: String,
    required: Option<Arc<dyn ValidationRule>>,
    rules: Vec<Arc<dyn ValidationRule>>,
}

/// A single tracked input: one value, one state machine, zero or more rules.
///
/// Cheap to clone; clones share state, which is how async rules and paired
/// rules (password repeat, username exclusion) observe the field later.
/// Rules are attached in evaluation order; the required rule is attached
/// separately because it always runs first.
///
/// # Example
///
/// ```ignore
/// let field = FormField::new("age")
///     .with_label("Age")
///     .with_required(RequiredRule::new(nls.clone(), ()))
///     .with_rule(RangeRule::ge(nls.clone(), 18.0));
///
/// field.set_value(json!(17));
/// assert_eq!(field.state(), FieldState::Invalid);
/// ```
#[derive(Clone)]
pub struct FormField {
    inner: Arc<RwLock<FieldInner>>,
}

impl FormField {
    /// Create a clean field with no rules and a null value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(FieldInner {
                name: name.into(),
                label: String::new(),
                hint: String::new(),
                value: Value::Null,
                state: FieldState::Clean,
                message: String::new(),
                required: None,
                rules: Vec::new(),
            })),
        }
    }

    /// Set the label shown next to the input.
    pub fn with_label(self, label: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.label = label.into();
        }
        self
    }

    /// Set the hint shown while the field is not invalid or in progress.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.inner.write() {
            guard.hint = hint.into();
        }
        self
    }

    /// Attach the required rule; it is evaluated before all other rules and
    /// an empty value never reaches the rest.
    pub fn with_required(self, rule: impl ValidationRule + 'static) -> Self {
        let rule: Arc<dyn ValidationRule> = Arc::new(rule);
        rule.bind(&self);
        if let Ok(mut guard) = self.inner.write() {
            guard.required = Some(rule);
        }
        self
    }

    /// Attach a rule at the end of the evaluation order.
    pub fn with_rule(self, rule: impl ValidationRule + 'static) -> Self {
        let rule: Arc<dyn ValidationRule> = Arc::new(rule);
        rule.bind(&self);
        if let Ok(mut guard) = self.inner.write() {
            guard.rules.push(rule);
        }
        self
    }

    /// Field name, used for server-side error injection.
    pub fn name(&self) -> String {
        self.inner
            .read()
            .map(|guard| guard.name.clone())
            .unwrap_or_default()
    }

    /// Field label.
    pub fn label(&self) -> String {
        self.inner
            .read()
            .map(|guard| guard.label.clone())
            .unwrap_or_default()
    }

    /// Field hint.
    pub fn hint(&self) -> String {
        self.inner
            .read()
            .map(|guard| guard.hint.clone())
            .unwrap_or_default()
    }

    /// Current value.
    pub fn value(&self) -> Value {
        self.inner
            .read()
            .map(|guard| guard.value.clone())
            .unwrap_or(Value::Null)
    }

    /// Current displayed state.
    pub fn state(&self) -> FieldState {
        self.inner
            .read()
            .map(|guard| guard.state)
            .unwrap_or_default()
    }

    /// Current displayed message.
    pub fn message(&self) -> String {
        self.inner
            .read()
            .map(|guard| guard.message.clone())
            .unwrap_or_default()
    }

    /// Update the value and run a validation pass — the value-change
    /// trigger.
    pub fn set_value(&self, value: Value) {
        if let Ok(mut guard) = self.inner.write() {
            guard.value = value;
        }
        self.validate();
    }

    /// Force the displayed state and message, overriding whatever the rules
    /// last computed. Used for server-side error injection.
    pub fn set_state(&self, state: FieldState, message: impl Into<String>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.state = state;
            guard.message = message.into();
        }
    }

    /// Run all attached rules and update the displayed state.
    ///
    /// The required rule runs first; when it fails, no other rule is
    /// evaluated. An empty value short-circuits past the remaining rules:
    /// an optional empty field is valid. Otherwise every rule is evaluated
    /// in attachment order and each verdict rewrites the displayed state,
    /// so the final rule's verdict owns the display while the returned
    /// aggregate keeps the first non-valid verdict.
    pub fn validate(&self) -> Verdict {
        let (required, rules, value) = {
            let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
            (guard.required.clone(), guard.rules.clone(), guard.value.clone())
        };
        trace!("validating field {:?}", self.name());

        let required_verdict = match &required {
            Some(rule) => self.perform(rule.as_ref(), &value),
            None => Verdict::Valid,
        };
        if required.is_some() && required_verdict == Verdict::Invalid {
            return Verdict::Invalid;
        }

        if !value::is_truthy(&value) {
            if required.is_none() {
                self.set_state(FieldState::Valid, "");
            }
            return required_verdict;
        }

        let mut verdict = required_verdict;
        for rule in &rules {
            verdict = verdict.and(self.perform(rule.as_ref(), &value));
        }
        verdict
    }

    /// Evaluate one rule and map its verdict onto the displayed state.
    fn perform(&self, rule: &dyn ValidationRule, value: &Value) -> Verdict {
        let verdict = rule.validate(value);
        match verdict {
            Verdict::Valid => self.set_state(FieldState::Valid, ""),
            Verdict::Invalid => {
                self.set_state(FieldState::Invalid, rule.message(MessageKind::Message));
            }
            Verdict::Pending => {
                self.set_state(FieldState::Progress, rule.message(MessageKind::AsyncMessage));
            }
        }
        verdict
    }

    /// Weak handle for async rules; does not keep the field alive.
    pub fn downgrade(&self) -> WeakField {
        WeakField {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormField")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("message", &self.message())
            .finish()
    }
}

/// Weak reference to a [`FormField`].
#[derive(Clone)]
pub struct WeakField {
    inner: Weak<RwLock<FieldInner>>,
}

impl WeakField {
    /// Upgrade back to a [`FormField`] if it is still alive.
    pub fn upgrade(&self) -> Option<FormField> {
        self.inner.upgrade().map(|inner| FormField { inner })
    }
}
