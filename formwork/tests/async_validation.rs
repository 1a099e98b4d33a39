//! Integration tests for debounced, cached and API-backed validation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use formwork::nls::Nls;
use formwork::transport::{ApiResponse, RequestOptions, Transport, TransportError};
use formwork::validation::cache::CacheEntry;
use formwork::validation::field::{FieldState, FormField};
use formwork::validation::rules::{ApiConfig, ApiRule, AsyncConfig, AsyncRule, ValidationRule};
use formwork::validation::Verdict;

fn nls() -> Arc<Nls> {
    Arc::new(Nls::default())
}

/// Records every dispatched value and resolves immediately with a fixed
/// verdict.
fn recording_rule(
    delay: Duration,
    is_valid: bool,
    dispatched: Arc<Mutex<Vec<Value>>>,
) -> AsyncRule {
    AsyncRule::with_config(
        nls(),
        AsyncConfig {
            delay: Some(delay),
            validate: Some(Arc::new(move |value, resolver| {
                dispatched
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(value.clone());
                resolver.resolve(&value, is_valid, None);
            })),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_debounce_coalesces_to_last_value() {
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let field = FormField::new("username").with_rule(recording_rule(
        Duration::from_millis(40),
        true,
        dispatched.clone(),
    ));

    field.set_value(json!("b"));
    field.set_value(json!("bo"));

    tokio::time::sleep(Duration::from_millis(120)).await;

    let dispatched = dispatched.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(*dispatched, vec![json!("bo")]);
}

#[tokio::test]
async fn test_field_shows_progress_then_resolves() {
    let field = FormField::new("username").with_rule(AsyncRule::with_config(
        nls(),
        AsyncConfig {
            delay: Some(Duration::from_millis(10)),
            validate: Some(Arc::new(|value, resolver| {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(40)).await;
                    resolver.resolve(&value, false, Some("taken"));
                });
            })),
            ..Default::default()
        },
    ));

    field.set_value(json!("bob"));
    assert_eq!(field.state(), FieldState::Progress);
    assert_eq!(field.message(), "Checking...");

    tokio::time::sleep(Duration::from_millis(120)).await;

    // The resolution re-ran the field's validation pass.
    assert_eq!(field.state(), FieldState::Invalid);
    assert_eq!(field.message(), "taken");
    assert_eq!(field.validate(), Verdict::Invalid);
}

#[tokio::test]
async fn test_resolved_cache_entry_skips_dispatch() {
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let rule = recording_rule(Duration::from_millis(10), false, dispatched.clone());
    rule.cache()
        .insert("bob", CacheEntry::resolved(false, Some("taken".into())));

    // A known-bad value resolves synchronously without dispatching.
    assert_eq!(rule.validate(&json!("bob")), Verdict::Invalid);
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(dispatched.lock().unwrap_or_else(|e| e.into_inner()).is_empty());
}

#[tokio::test]
async fn test_distinct_values_cache_separately() {
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let field = FormField::new("username").with_rule(recording_rule(
        Duration::from_millis(10),
        true,
        dispatched.clone(),
    ));

    field.set_value(json!("alice"));
    tokio::time::sleep(Duration::from_millis(60)).await;
    field.set_value(json!("carol"));
    tokio::time::sleep(Duration::from_millis(60)).await;

    // Each value dispatched once; re-entering a cached value does not.
    field.set_value(json!("alice"));
    assert_eq!(field.state(), FieldState::Valid);

    let dispatched = dispatched.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(*dispatched, vec![json!("alice"), json!("carol")]);
}

#[tokio::test]
async fn test_without_cache_revalidation_dispatches_again() {
    let dispatches = Arc::new(AtomicUsize::new(0));
    let counter = dispatches.clone();
    let field = FormField::new("username").with_rule(AsyncRule::with_config(
        nls(),
        AsyncConfig {
            delay: Some(Duration::from_millis(10)),
            use_cache: Some(false),
            validate: Some(Arc::new(move |value, resolver| {
                counter.fetch_add(1, Ordering::SeqCst);
                resolver.resolve(&value, true, None);
            })),
            ..Default::default()
        },
    ));

    field.set_value(json!("bob"));
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(dispatches.load(Ordering::SeqCst), 1);
    assert_eq!(field.state(), FieldState::Valid);

    // Same value again: the verdict was served once and evicted, so the
    // check runs remotely again.
    field.set_value(json!("bob"));
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(dispatches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_completion_callback_invoked() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let field = FormField::new("username").with_rule(AsyncRule::with_config(
        nls(),
        AsyncConfig {
            delay: Some(Duration::from_millis(10)),
            validate: Some(Arc::new(|value, resolver| {
                resolver.resolve(&value, false, Some("nope"));
            })),
            callback: Some(Arc::new(move |value, is_valid, message| {
                sink.lock().unwrap_or_else(|e| e.into_inner()).push((
                    value.clone(),
                    is_valid,
                    message.map(str::to_string),
                ));
            })),
            ..Default::default()
        },
    ));

    field.set_value(json!("bob"));
    tokio::time::sleep(Duration::from_millis(60)).await;

    let seen = seen.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(*seen, vec![(json!("bob"), false, Some("nope".to_string()))]);
}

/// Transport stub answering from a fixed table of taken names.
struct TakenNames {
    requests: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transport for TakenNames {
    async fn request(
        &self,
        url: &str,
        _options: RequestOptions,
    ) -> Result<ApiResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
        if url.ends_with("name=taken") {
            Ok(ApiResponse {
                payload: Value::Null,
                code: json!(1),
                message: "Name is taken".into(),
            })
        } else {
            Ok(ApiResponse::default())
        }
    }
}

#[tokio::test]
async fn test_api_rule_interprets_response_code() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let transport = Arc::new(TakenNames {
        requests: requests.clone(),
    });

    let field = FormField::new("username").with_rule(ApiRule::new(
        nls(),
        transport,
        ApiConfig {
            url: Some("https://api/check?name={value}".into()),
            delay: Some(Duration::from_millis(10)),
            ..Default::default()
        },
    ));

    field.set_value(json!("free"));
    assert_eq!(field.state(), FieldState::Progress);
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(field.state(), FieldState::Valid);

    field.set_value(json!("taken"));
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(field.state(), FieldState::Invalid);
    assert_eq!(field.message(), "Name is taken");

    let requests = requests.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(
        *requests,
        vec![
            "https://api/check?name=free".to_string(),
            "https://api/check?name=taken".to_string(),
        ]
    );
}

/// Transport stub that always fails.
struct Unreachable;

#[async_trait]
impl Transport for Unreachable {
    async fn request(
        &self,
        _url: &str,
        _options: RequestOptions,
    ) -> Result<ApiResponse, TransportError> {
        Err(TransportError::Status {
            status: 503,
            body: "unavailable".into(),
        })
    }
}

#[tokio::test]
async fn test_api_rule_surfaces_transport_failure_as_invalid() {
    let field = FormField::new("username").with_rule(ApiRule::new(
        nls(),
        Arc::new(Unreachable),
        ApiConfig {
            url: Some("https://api/check?name={value}".into()),
            delay: Some(Duration::from_millis(10)),
            ..Default::default()
        },
    ));

    field.set_value(json!("bob"));
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(field.state(), FieldState::Invalid);
    assert_eq!(field.message(), "HTTP 503: unavailable");
}

#[tokio::test]
async fn test_api_rule_url_builder_wins_over_template() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let transport = Arc::new(TakenNames {
        requests: requests.clone(),
    });

    let field = FormField::new("username").with_rule(ApiRule::new(
        nls(),
        transport,
        ApiConfig {
            url: Some("https://ignored/{value}".into()),
            build_url: Some(Arc::new(|value| {
                format!("https://api/exists/{}", value.as_str().unwrap_or_default())
            })),
            delay: Some(Duration::from_millis(10)),
            ..Default::default()
        },
    ));

    field.set_value(json!("bob"));
    tokio::time::sleep(Duration::from_millis(80)).await;

    let requests = requests.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(*requests, vec!["https://api/exists/bob".to_string()]);
}
