//! HTTP-request executor.
//!
//! Makes one outbound HTTP call and records the response under the
//! `httpResponse` context key as `{status, statusText, data}`.  The request
//! itself runs inside a single `step.run("http-request", …)` so a resumed
//! execution replays the captured response instead of calling out again.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::traits::{Context, NodeExecutor, NodeInvocation};
use crate::NodeError;

/// Context key the response is stored under.  A downstream HTTP node
/// overwrites it; the later response wins.
pub const HTTP_RESPONSE_KEY: &str = "httpResponse";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Allowed HTTP methods.  Anything else in the node's `data` is a
/// configuration error, not a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }

    /// Only these methods carry a request body; for the rest a configured
    /// body is ignored.
    fn allows_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

/// Configuration decoded from the node's `data` field.
#[derive(Debug, Clone, Deserialize)]
struct HttpRequestConfig {
    #[serde(default)]
    endpoint: String,
    #[serde(default)]
    method: HttpMethod,
    #[serde(default)]
    body: Option<String>,
}

pub struct HttpRequestExecutor {
    client: reqwest::Client,
}

impl HttpRequestExecutor {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpRequestExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeExecutor for HttpRequestExecutor {
    async fn execute(&self, invocation: NodeInvocation<'_>) -> Result<Context, NodeError> {
        let NodeInvocation { data, node_id, mut context, step } = invocation;

        let config: HttpRequestConfig = serde_json::from_value(data.clone()).map_err(|err| {
            NodeError::Config(format!("HTTP Request node: invalid configuration: {err}"))
        })?;

        debug!(node_id, method = ?config.method, endpoint = %config.endpoint, "dispatching HTTP request node");

        let client = self.client.clone();
        let response = step
            .run(
                "http-request",
                Box::pin(async move { Ok(perform_request(&client, config).await?) }),
            )
            .await
            .map_err(NodeError::from_step)?;

        context.insert(HTTP_RESPONSE_KEY.to_string(), response);
        Ok(context)
    }
}

async fn perform_request(
    client: &reqwest::Client,
    config: HttpRequestConfig,
) -> Result<Value, NodeError> {
    let endpoint = config.endpoint.trim();
    if endpoint.is_empty() {
        return Err(NodeError::Config(
            "HTTP Request node: No endpoint configured".into(),
        ));
    }

    let mut request = client.request(config.method.as_reqwest(), endpoint);
    if config.method.allows_body() {
        if let Some(body) = config.body {
            request = request.body(body);
        }
    }

    let response = request
        .send()
        .await
        .map_err(|err| NodeError::Transient(format!("HTTP request to {endpoint} failed: {err}")))?;

    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(NodeError::Transient(format!(
            "HTTP request to {endpoint} returned status {status}"
        )));
    }

    let status_text = status.canonical_reason().unwrap_or("").to_string();
    let is_json = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false);

    let data = if is_json {
        response
            .json::<Value>()
            .await
            .map_err(|err| NodeError::Transient(format!("failed to decode JSON response: {err}")))?
    } else {
        Value::String(
            response
                .text()
                .await
                .map_err(|err| NodeError::Transient(format!("failed to read response body: {err}")))?,
        )
    };

    Ok(json!({
        "status": status.as_u16(),
        "statusText": status_text,
        "data": data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::InMemoryStep;
    use axum::extract::Json;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Bind a fixture server on an ephemeral port and return its base URL.
    async fn spawn_fixture(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn context_of(value: Value) -> Context {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    async fn run_node(data: Value, context: Context, step: &InMemoryStep) -> Result<Context, NodeError> {
        HttpRequestExecutor::new()
            .execute(NodeInvocation {
                data: &data,
                node_id: "http-node",
                context,
                step,
            })
            .await
    }

    #[tokio::test]
    async fn json_response_is_decoded() {
        let base = spawn_fixture(
            Router::new().route("/a", get(|| async { Json(json!({"x": 42})) })),
        )
        .await;

        let step = InMemoryStep::new();
        let out = run_node(
            json!({"endpoint": format!("{base}/a"), "method": "GET"}),
            context_of(json!({"seed": 1})),
            &step,
        )
        .await
        .expect("request should succeed");

        assert_eq!(out["seed"], json!(1));
        assert_eq!(
            out[HTTP_RESPONSE_KEY],
            json!({"status": 200, "statusText": "OK", "data": {"x": 42}})
        );
    }

    #[tokio::test]
    async fn non_json_response_is_kept_as_text() {
        let base =
            spawn_fixture(Router::new().route("/plain", get(|| async { "hello" }))).await;

        let step = InMemoryStep::new();
        let out = run_node(
            json!({"endpoint": format!("{base}/plain")}),
            Context::new(),
            &step,
        )
        .await
        .unwrap();

        assert_eq!(out[HTTP_RESPONSE_KEY]["data"], json!("hello"));
    }

    #[tokio::test]
    async fn missing_endpoint_is_a_config_error() {
        let step = InMemoryStep::new();
        let err = run_node(json!({}), Context::new(), &step)
            .await
            .unwrap_err();

        assert!(!err.is_retriable());
        assert!(
            err.to_string().contains("No endpoint configured"),
            "unexpected message: {err}"
        );
    }

    #[tokio::test]
    async fn unknown_method_is_a_config_error() {
        let step = InMemoryStep::new();
        let err = run_node(
            json!({"endpoint": "http://127.0.0.1:1/x", "method": "TELEPORT"}),
            Context::new(),
            &step,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, NodeError::Config(_)));
    }

    #[tokio::test]
    async fn error_status_is_retriable() {
        let base = spawn_fixture(
            Router::new().route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE })),
        )
        .await;

        let step = InMemoryStep::new();
        let err = run_node(
            json!({"endpoint": format!("{base}/down")}),
            Context::new(),
            &step,
        )
        .await
        .unwrap_err();

        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn connection_failure_is_retriable() {
        let step = InMemoryStep::new();
        let err = run_node(
            json!({"endpoint": "http://127.0.0.1:1/unreachable"}),
            Context::new(),
            &step,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, NodeError::Transient(_)));
    }

    #[tokio::test]
    async fn body_is_forwarded_only_for_body_bearing_methods() {
        let base = spawn_fixture(
            Router::new()
                .route("/echo", post(|body: String| async move { body }))
                .route("/check", get(|body: String| async move { body })),
        )
        .await;

        let step = InMemoryStep::new();
        let out = run_node(
            json!({"endpoint": format!("{base}/echo"), "method": "POST", "body": "ping"}),
            Context::new(),
            &step,
        )
        .await
        .unwrap();
        assert_eq!(out[HTTP_RESPONSE_KEY]["data"], json!("ping"));

        let step = InMemoryStep::new();
        let out = run_node(
            json!({"endpoint": format!("{base}/check"), "method": "GET", "body": "ignored"}),
            Context::new(),
            &step,
        )
        .await
        .unwrap();
        assert_eq!(out[HTTP_RESPONSE_KEY]["data"], json!(""));
    }

    #[tokio::test]
    async fn checkpoint_prevents_a_second_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let base = spawn_fixture(Router::new().route(
            "/counted",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"ok": true}))
                }
            }),
        ))
        .await;

        let step = InMemoryStep::new();
        let data = json!({"endpoint": format!("{base}/counted")});

        let first = run_node(data.clone(), Context::new(), &step).await.unwrap();
        let second = run_node(data, Context::new(), &step).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(first[HTTP_RESPONSE_KEY], second[HTTP_RESPONSE_KEY]);
    }
}
