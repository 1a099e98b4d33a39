//! Caller-supplied validation: synchronous predicates and debounced
//! asynchronous checks.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::trace;
use serde_json::Value;

use super::{pick, ValidationRule};
use crate::nls::Nls;
use crate::validation::cache::{AsyncCache, CacheEntry, Debouncer};
use crate::validation::field::{FormField, WeakField};
use crate::validation::{MessageKind, Verdict};
use crate::value;

/// Synchronous validation predicate.
pub type SyncPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Asynchronous validation predicate. Receives the value and a single-shot
/// [`AsyncResolver`] it must eventually resolve, exactly once.
pub type AsyncPredicate = Arc<dyn Fn(Value, AsyncResolver) + Send + Sync>;

/// Completion hook invoked after an asynchronous check resolves.
pub type AsyncCallback = Arc<dyn Fn(&Value, bool, Option<&str>) + Send + Sync>;

/// Configuration for [`CustomRule`].
#[derive(Clone, Default)]
pub struct CustomConfig {
    /// Message shown on failure.
    pub message: Option<String>,
    /// Message shown during async validation (kept for the common shape).
    pub async_message: Option<String>,
    /// Whether the rule is evaluated at all.
    pub is_active: Option<bool>,
    /// The predicate; with none configured the rule passes.
    pub validate: Option<SyncPredicate>,
}

impl fmt::Debug for CustomConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomConfig")
            .field("message", &self.message)
            .field("is_active", &self.is_active)
            .field("validate", &self.validate.is_some())
            .finish()
    }
}

impl From<bool> for CustomConfig {
    fn from(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

impl From<()> for CustomConfig {
    fn from((): ()) -> Self {
        Self::default()
    }
}

/// Evaluates a caller-supplied synchronous predicate.
pub struct CustomRule {
    nls: Arc<Nls>,
    user: CustomConfig,
    defaults: CustomConfig,
}

impl CustomRule {
    /// Create a custom rule from a bare predicate.
    pub fn new<F>(nls: Arc<Nls>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::with_config(
            nls,
            CustomConfig {
                validate: Some(Arc::new(predicate)),
                ..Default::default()
            },
        )
    }

    /// Create a custom rule from a full config.
    pub fn with_config(nls: Arc<Nls>, config: impl Into<CustomConfig>) -> Self {
        Self {
            nls,
            user: config.into(),
            defaults: CustomConfig {
                message: Some("validate-custom-message".to_string()),
                async_message: None,
                is_active: Some(true),
                validate: None,
            },
        }
    }

    /// Effective configuration: user values merged over defaults.
    pub fn config(&self) -> CustomConfig {
        CustomConfig {
            message: pick(&self.user.message, &self.defaults.message),
            async_message: pick(&self.user.async_message, &self.defaults.async_message),
            is_active: pick(&self.user.is_active, &self.defaults.is_active),
            validate: pick(&self.user.validate, &self.defaults.validate),
        }
    }
}

impl ValidationRule for CustomRule {
    fn validate(&self, val: &Value) -> Verdict {
        let config = self.config();
        if !config.is_active.unwrap_or(true) {
            return Verdict::Valid;
        }
        match &config.validate {
            Some(predicate) => predicate(val).into(),
            None => Verdict::Valid,
        }
    }

    fn message(&self, kind: MessageKind) -> String {
        let config = self.config();
        let configured = match kind {
            MessageKind::Message => config.message,
            MessageKind::AsyncMessage => config.async_message,
        };
        super::resolve_message(&self.nls, configured.as_deref(), &[])
    }
}

/// Configuration for [`AsyncRule`].
#[derive(Clone, Default)]
pub struct AsyncConfig {
    /// Message shown on failure when the resolution carried none.
    pub message: Option<String>,
    /// Message shown while the check is in flight.
    pub async_message: Option<String>,
    /// Whether the rule is evaluated at all.
    pub is_active: Option<bool>,
    /// The asynchronous predicate.
    pub validate: Option<AsyncPredicate>,
    /// Completion hook invoked after each resolution.
    pub callback: Option<AsyncCallback>,
    /// Serve resolved verdicts from the cache (default `true`).
    pub use_cache: Option<bool>,
    /// Debounce window before the predicate is dispatched (default 0).
    pub delay: Option<Duration>,
}

impl fmt::Debug for AsyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncConfig")
            .field("message", &self.message)
            .field("async_message", &self.async_message)
            .field("is_active", &self.is_active)
            .field("validate", &self.validate.is_some())
            .field("callback", &self.callback.is_some())
            .field("use_cache", &self.use_cache)
            .field("delay", &self.delay)
            .finish()
    }
}

impl From<&str> for AsyncConfig {
    fn from(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Default::default()
        }
    }
}

impl From<bool> for AsyncConfig {
    fn from(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

/// Single-shot handle for delivering an asynchronous verdict.
///
/// Consuming `resolve` stores the verdict under the resolved value's own
/// cache key (stale resolutions for superseded values are harmless),
/// re-runs the bound field's validation pass so the UI leaves the progress
/// state, and finally invokes the configured completion hook.
pub struct AsyncResolver {
    cache: AsyncCache,
    callback: Option<AsyncCallback>,
    field: Option<WeakField>,
}

impl AsyncResolver {
    /// Deliver the verdict for `value`.
    pub fn resolve(self, value: &Value, is_valid: bool, message: Option<&str>) {
        trace!("async validation resolved: valid = {is_valid}");
        self.cache.insert(
            value::cache_key(value),
            CacheEntry::resolved(is_valid, message.map(str::to_string)),
        );
        if let Some(field) = self.field.as_ref().and_then(WeakField::upgrade) {
            field.validate();
        }
        if let Some(callback) = &self.callback {
            callback(value, is_valid, message);
        }
    }
}

/// Debounced asynchronous validation with result caching.
///
/// While a dispatch is scheduled or in flight the rule reports
/// [`Verdict::Pending`], which the owning field displays as its progress
/// state. Validation must happen inside a Tokio runtime.
pub struct AsyncRule {
    nls: Arc<Nls>,
    user: AsyncConfig,
    defaults: AsyncConfig,
    cache: AsyncCache,
    debounce: Debouncer,
    field: Mutex<Option<WeakField>>,
    last_key: Mutex<Option<String>>,
}

impl AsyncRule {
    /// Create an async rule from a bare predicate.
    pub fn new<F>(nls: Arc<Nls>, predicate: F) -> Self
    where
        F: Fn(Value, AsyncResolver) + Send + Sync + 'static,
    {
        Self::with_config(
            nls,
            AsyncConfig {
                validate: Some(Arc::new(predicate)),
                ..Default::default()
            },
        )
    }

    /// Create an async rule from a full config.
    pub fn with_config(nls: Arc<Nls>, config: impl Into<AsyncConfig>) -> Self {
        Self {
            nls,
            user: config.into(),
            defaults: AsyncConfig {
                message: Some("validate-async-message".to_string()),
                async_message: Some("validate-async-checking".to_string()),
                is_active: Some(true),
                validate: None,
                callback: None,
                use_cache: Some(true),
                delay: Some(Duration::ZERO),
            },
            cache: AsyncCache::new(),
            debounce: Debouncer::new(),
            field: Mutex::new(None),
            last_key: Mutex::new(None),
        }
    }

    /// Effective configuration: user values merged over defaults.
    pub fn config(&self) -> AsyncConfig {
        AsyncConfig {
            message: pick(&self.user.message, &self.defaults.message),
            async_message: pick(&self.user.async_message, &self.defaults.async_message),
            is_active: pick(&self.user.is_active, &self.defaults.is_active),
            validate: pick(&self.user.validate, &self.defaults.validate),
            callback: pick(&self.user.callback, &self.defaults.callback),
            use_cache: pick(&self.user.use_cache, &self.defaults.use_cache),
            delay: pick(&self.user.delay, &self.defaults.delay),
        }
    }

    /// The rule's result cache.
    pub fn cache(&self) -> &AsyncCache {
        &self.cache
    }

    fn remember_key(&self, key: &str) {
        let mut last_key = self.last_key.lock().unwrap_or_else(|e| e.into_inner());
        *last_key = Some(key.to_string());
    }

    /// Message delivered with the most recent resolution, if any.
    fn resolved_message(&self) -> Option<String> {
        let last_key = self.last_key.lock().unwrap_or_else(|e| e.into_inner());
        let key = last_key.as_deref()?;
        self.cache.get(key)?.message
    }
}

impl ValidationRule for AsyncRule {
    fn validate(&self, val: &Value) -> Verdict {
        let config = self.config();
        if !config.is_active.unwrap_or(true) {
            return Verdict::Valid;
        }
        let Some(predicate) = config.validate.clone() else {
            return Verdict::Valid;
        };

        let key = value::cache_key(val);
        self.remember_key(&key);

        if let Some(entry) = self.cache.get(&key) {
            if let Some(is_valid) = entry.is_valid {
                if !config.use_cache.unwrap_or(true) {
                    // Serve the fresh verdict once, then force a re-check on
                    // the next trigger.
                    self.cache.remove(&key);
                }
                return is_valid.into();
            }
            // Dispatched and awaiting resolution.
            return Verdict::Pending;
        }

        let delay = config.delay.unwrap_or(Duration::ZERO);
        let cache = self.cache.clone();
        let callback = config.callback.clone();
        let field = self
            .field
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let value = val.clone();

        trace!("async validation dispatch scheduled in {delay:?}");
        self.debounce.schedule(delay, move || {
            cache.insert(value::cache_key(&value), CacheEntry::pending());
            let resolver = AsyncResolver {
                cache,
                callback,
                field,
            };
            predicate(value, resolver);
        });

        Verdict::Pending
    }

    fn message(&self, kind: MessageKind) -> String {
        let config = self.config();
        match kind {
            MessageKind::Message => {
                if let Some(resolved) = self.resolved_message() {
                    return self.nls.translate(&resolved, &[]);
                }
                super::resolve_message(&self.nls, config.message.as_deref(), &[])
            }
            MessageKind::AsyncMessage => {
                super::resolve_message(&self.nls, config.async_message.as_deref(), &[])
            }
        }
    }

    fn bind(&self, field: &FormField) {
        let mut bound = self.field.lock().unwrap_or_else(|e| e.into_inner());
        *bound = Some(field.downgrade());
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
    fn test_custom_predicate() {
        let rule = CustomRule::new(nls(), |value| value::as_number(value).unwrap_or(0.0) > 5000.0);
        assert_eq!(rule.validate(&json!(6000)), Verdict::Valid);
        assert_eq!(rule.validate(&json!(4000)), Verdict::Invalid);
    }

    #[test]
    fn test_custom_without_predicate_passes() {
        let rule = CustomRule::with_config(nls(), ());
        assert_eq!(rule.validate(&json!("anything")), Verdict::Valid);
    }

    #[test]
    fn test_custom_inactive_always_passes() {
        let rule = CustomRule::with_config(
            nls(),
            CustomConfig {
                is_active: Some(false),
                validate: Some(Arc::new(|_| false)),
                ..Default::default()
            },
        );
        assert_eq!(rule.validate(&json!("anything")), Verdict::Valid);
    }

    #[test]
    fn test_custom_default_message() {
        let rule = CustomRule::new(nls(), |_| false);
        assert_eq!(
            rule.message(MessageKind::Message),
            "Entered value is invalid"
        );
    }

    #[test]
    fn test_async_inactive_never_dispatches() {
        // No runtime here: an inactive rule must not touch the machinery.
        let rule = AsyncRule::with_config(
            nls(),
            AsyncConfig {
                is_active: Some(false),
                validate: Some(Arc::new(|_, _| panic!("must not dispatch"))),
                ..Default::default()
            },
        );
        assert_eq!(rule.validate(&json!("x")), Verdict::Valid);
        assert!(rule.cache().is_empty());
    }

    #[test]
    fn test_async_without_predicate_passes() {
        let rule = AsyncRule::with_config(nls(), AsyncConfig::default());
        assert_eq!(rule.validate(&json!("x")), Verdict::Valid);
    }

    #[test]
    fn test_async_serves_resolved_cache_without_runtime() {
        let rule = AsyncRule::new(nls(), |_, _| {});
        rule.cache()
            .insert("bob", CacheEntry::resolved(false, Some("taken".into())));
        assert_eq!(rule.validate(&json!("bob")), Verdict::Invalid);
        assert_eq!(rule.message(MessageKind::Message), "taken");
    }

    #[test]
    fn test_async_default_messages() {
        let rule = AsyncRule::new(nls(), |_, _| {});
        assert_eq!(
            rule.message(MessageKind::Message),
            "Entered value is invalid"
        );
        assert_eq!(rule.message(MessageKind::AsyncMessage), "Checking...");
    }
}
