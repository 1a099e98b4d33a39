//! API-backed validation: an async rule whose predicate calls the request
//! capability.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use serde_json::Value;

use super::custom::{AsyncCallback, AsyncConfig, AsyncPredicate, AsyncResolver, AsyncRule};
use super::ValidationRule;
use crate::nls::Nls;
use crate::transport::{RequestOptions, Transport};
use crate::validation::cache::AsyncCache;
use crate::validation::field::FormField;
use crate::validation::{MessageKind, Verdict};
use crate::value;

/// Token replaced with the percent-encoded value in a URL template.
pub const URL_VALUE_PLACEHOLDER: &str = "{value}";

/// Builds the request URL from the validated value.
pub type UrlBuilder = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Configuration for [`ApiRule`].
#[derive(Clone, Default)]
pub struct ApiConfig {
    /// Message shown on failure when the response carried none.
    pub message: Option<String>,
    /// Message shown while the check is in flight.
    pub async_message: Option<String>,
    /// Whether the rule is evaluated at all.
    pub is_active: Option<bool>,
    /// URL template; [`URL_VALUE_PLACEHOLDER`] is replaced with the
    /// percent-encoded value. Ignored when `build_url` is set.
    pub url: Option<String>,
    /// URL builder taking precedence over the template.
    pub build_url: Option<UrlBuilder>,
    /// Completion hook invoked after each resolution.
    pub callback: Option<AsyncCallback>,
    /// Serve resolved verdicts from the cache (default `true`).
    pub use_cache: Option<bool>,
    /// Debounce window before the request fires (default 500 ms).
    pub delay: Option<Duration>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("message", &self.message)
            .field("is_active", &self.is_active)
            .field("url", &self.url)
            .field("build_url", &self.build_url.is_some())
            .field("use_cache", &self.use_cache)
            .field("delay", &self.delay)
            .finish()
    }
}

impl From<&str> for ApiConfig {
    fn from(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Default::default()
        }
    }
}

impl From<String> for ApiConfig {
    fn from(url: String) -> Self {
        Self {
            url: Some(url),
            ..Default::default()
        }
    }
}

impl From<bool> for ApiConfig {
    fn from(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

/// Remote validation against an API endpoint.
///
/// Shares the async rule's debounce and cache machinery with a 500 ms
/// default delay. The response is interpreted through the envelope
/// convention: a falsy `code` means the value is valid, and the response
/// `message` becomes the validation message. Transport failures resolve to
/// invalid with the error text; they are never propagated.
pub struct ApiRule {
    inner: AsyncRule,
}

impl ApiRule {
    /// Create an api rule; `config` accepts a full [`ApiConfig`], a URL
    /// template (`&str`), or an activity flag (`bool`).
    pub fn new(
        nls: Arc<Nls>,
        transport: Arc<dyn Transport>,
        config: impl Into<ApiConfig>,
    ) -> Self {
        let config = config.into();
        let predicate = Self::predicate(transport, config.url.clone(), config.build_url.clone());

        let inner = AsyncRule::with_config(
            nls,
            AsyncConfig {
                message: config.message,
                async_message: config.async_message,
                is_active: config.is_active,
                validate: Some(predicate),
                callback: config.callback,
                use_cache: config.use_cache,
                delay: Some(config.delay.unwrap_or(Duration::from_millis(500))),
            },
        );
        Self { inner }
    }

    /// The rule's result cache.
    pub fn cache(&self) -> &AsyncCache {
        self.inner.cache()
    }

    fn predicate(
        transport: Arc<dyn Transport>,
        url_template: Option<String>,
        build_url: Option<UrlBuilder>,
    ) -> AsyncPredicate {
        Arc::new(move |value: Value, resolver: AsyncResolver| {
            let url = match (&build_url, &url_template) {
                (Some(builder), _) => builder(&value),
                (None, Some(template)) => template.replace(
                    URL_VALUE_PLACEHOLDER,
                    &urlencoding::encode(&value::coerce_string(&value)),
                ),
                (None, None) => {
                    // Nothing configured to call; nothing to fail.
                    resolver.resolve(&value, true, None);
                    return;
                }
            };

            let transport = transport.clone();
            tokio::spawn(async move {
                match transport.request(&url, RequestOptions::default()).await {
                    Ok(response) => {
                        let message = (!response.message.is_empty())
                            .then(|| response.message.clone());
                        resolver.resolve(&value, response.is_success(), message.as_deref());
                    }
                    Err(err) => {
                        warn!("api validation request failed: {err}");
                        resolver.resolve(&value, false, Some(&err.to_string()));
                    }
                }
            });
        })
    }
}

impl ValidationRule for ApiRule {
    fn validate(&self, val: &Value) -> Verdict {
        self.inner.validate(val)
    }

    fn message(&self, kind: MessageKind) -> String {
        self.inner.message(kind)
    }

    fn bind(&self, field: &FormField) {
        self.inner.bind(field);
    }
}
