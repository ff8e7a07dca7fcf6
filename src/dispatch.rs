//! Outbound call dispatch against the Vapi API
//!
//! Dispatch is deliberately at-most-once: one POST, a bounded timeout, no
//! retries. Retrying a call-creation request risks placing duplicate phone
//! calls, which is worse than surfacing the failure to the client.

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::prompt::{self, TaskRequest};
use serde_json::{json, Value};
use std::time::Duration;

/// Bound on the provider round-trip
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// LLM backing the assistant on the provider side
const MODEL_PROVIDER: &str = "anthropic";
const MODEL_NAME: &str = "claude-3-sonnet-20240229";

/// Instruction the provider uses to produce a post-call summary
const SUMMARY_PROMPT: &str = "Write a short natural-language summary of what happened on the call, clearly stating whether the task was completed or what the outcome was.";

/// Outcome of a single dispatch attempt
#[derive(Debug, Clone)]
pub struct CallDispatchResult {
    /// Call accepted by the provider
    pub success: bool,
    /// Provider-assigned call identifier, when present in the response
    pub provider_call_id: Option<String>,
    /// Parsed provider response body
    pub provider_response: Value,
}

/// Submits call-creation requests to the provider
pub struct CallDispatcher {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl CallDispatcher {
    /// Create a dispatcher with a bounded-timeout HTTP client.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DISPATCH_TIMEOUT)
            .build()?;
        Ok(Self { config, client })
    }

    /// Build the provider call-creation body.
    ///
    /// Single seam for provider-schema changes: the payload shape has varied
    /// across Vapi API versions, so every field the provider sees is
    /// assembled here and nowhere else.
    pub fn build_payload(&self, request: &TaskRequest, phone_number_id: &str) -> Value {
        let mut assistant = json!({
            "model": {
                "provider": MODEL_PROVIDER,
                "model": MODEL_NAME,
                "messages": [
                    {
                        "role": "system",
                        "content": prompt::render(request),
                    }
                ],
            },
            "firstMessage": prompt::first_message(request),
            "summaryPrompt": SUMMARY_PROMPT,
            "analysisPlan": {
                "structuredDataPlan": {
                    "enabled": true,
                    "schema": outcome_schema(),
                },
            },
        });

        if let Some(url) = &self.config.callback_url {
            assistant["server"] = json!({ "url": url });
        }

        json!({
            "phoneNumberId": phone_number_id,
            "customer": {
                "number": request.phone_number,
            },
            "assistant": assistant,
        })
    }

    /// Dispatch one call-creation request.
    ///
    /// Fails fast on missing configuration (no network call is made), maps
    /// non-2xx provider responses to [`Error::Provider`] and network-level
    /// failures to [`Error::Transport`].
    pub async fn dispatch(&self, request: &TaskRequest) -> Result<CallDispatchResult> {
        let api_key = require(&self.config.api_key, "VAPI_API_KEY")?;
        let phone_number_id = require(&self.config.phone_number_id, "VAPI_PHONE_NUMBER_ID")?;

        let payload = self.build_payload(request, phone_number_id);
        let url = format!("{}/call", self.config.base_url.trim_end_matches('/'));

        tracing::info!(phone = %request.phone_number, "Dispatching call to provider");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read provider response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let provider_response: Value = serde_json::from_str(&body)
            .map_err(|e| Error::Internal(format!("Provider returned non-JSON body: {}", e)))?;
        let provider_call_id = provider_response
            .get("id")
            .and_then(Value::as_str)
            .map(String::from);

        tracing::info!(call_id = ?provider_call_id, "Call accepted by provider");

        Ok(CallDispatchResult {
            success: true,
            provider_call_id,
            provider_response,
        })
    }
}

/// JSON schema for the structured outcome the provider extracts post-call.
fn outcome_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "status": {
                "type": "string",
                "enum": ["completed", "failed", "transferred", "in_progress"],
            },
            "action_taken": { "type": "string" },
            "follow_up_required": { "type": "boolean" },
            "notes": { "type": "string" },
        },
    })
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::Config(format!("{} not configured", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::routing::post;
    use axum::Router;

    fn sample_request() -> TaskRequest {
        TaskRequest {
            phone_number: "+15551234567".to_string(),
            raw_intent: "confirm restaurant reservation for 7pm".to_string(),
            user_name: Some("Alex".to_string()),
            target_name: None,
            location: None,
            time: None,
        }
    }

    fn configured(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: Some("test-key".to_string()),
            phone_number_id: Some("pn-1".to_string()),
            base_url: base_url.to_string(),
            callback_url: None,
        }
    }

    /// Spawn a one-route provider stub on an ephemeral port, returning its
    /// base URL.
    async fn spawn_stub(status: StatusCode, body: &'static str) -> String {
        let app = Router::new().route(
            "/call",
            post(move || async move {
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let config = ProviderConfig {
            api_key: None,
            phone_number_id: Some("pn-1".to_string()),
            // Unroutable: proves no network call is attempted
            base_url: "http://192.0.2.1".to_string(),
            callback_url: None,
        };
        let dispatcher = CallDispatcher::new(config).unwrap();

        let err = dispatcher.dispatch(&sample_request()).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("VAPI_API_KEY"));
    }

    #[tokio::test]
    async fn test_missing_phone_number_id_fails_fast() {
        let config = ProviderConfig {
            api_key: Some("test-key".to_string()),
            phone_number_id: None,
            base_url: "http://192.0.2.1".to_string(),
            callback_url: None,
        };
        let dispatcher = CallDispatcher::new(config).unwrap();

        let err = dispatcher.dispatch(&sample_request()).await.unwrap_err();
        assert!(err.to_string().contains("VAPI_PHONE_NUMBER_ID"));
    }

    #[tokio::test]
    async fn test_dispatch_success_maps_response() {
        let base_url = spawn_stub(StatusCode::OK, r#"{"id":"abc","status":"queued"}"#).await;
        let dispatcher = CallDispatcher::new(configured(&base_url)).unwrap();

        let result = dispatcher.dispatch(&sample_request()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.provider_call_id.as_deref(), Some("abc"));
        assert_eq!(result.provider_response["id"], "abc");
    }

    #[tokio::test]
    async fn test_dispatch_provider_rejection_preserves_status() {
        let base_url = spawn_stub(StatusCode::PAYMENT_REQUIRED, r#"{"error":"quota"}"#).await;
        let dispatcher = CallDispatcher::new(configured(&base_url)).unwrap();

        let err = dispatcher.dispatch(&sample_request()).await.unwrap_err();
        match &err {
            Error::Provider { status, body } => {
                assert_eq!(*status, 402);
                assert!(body.contains("quota"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
        assert!(err.to_string().contains("402"));
    }

    #[tokio::test]
    async fn test_dispatch_transport_failure() {
        // Nothing listens on this port
        let dispatcher = CallDispatcher::new(configured("http://127.0.0.1:9")).unwrap();

        let err = dispatcher.dispatch(&sample_request()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn test_payload_shape() {
        let dispatcher = CallDispatcher::new(configured("http://127.0.0.1:9")).unwrap();
        let payload = dispatcher.build_payload(&sample_request(), "pn-1");

        assert_eq!(payload["phoneNumberId"], "pn-1");
        assert_eq!(payload["customer"]["number"], "+15551234567");
        assert_eq!(payload["assistant"]["model"]["messages"][0]["role"], "system");
        let system_prompt = payload["assistant"]["model"]["messages"][0]["content"]
            .as_str()
            .unwrap();
        assert!(system_prompt.contains("confirm restaurant reservation for 7pm"));
        assert!(payload["assistant"]["firstMessage"]
            .as_str()
            .unwrap()
            .contains("Alex"));
        let schema = &payload["assistant"]["analysisPlan"]["structuredDataPlan"]["schema"];
        assert_eq!(schema["properties"]["status"]["enum"][0], "completed");
        // No callback configured, so no server block
        assert!(payload["assistant"].get("server").is_none());
    }

    #[test]
    fn test_payload_includes_callback_url_when_configured() {
        let mut config = configured("http://127.0.0.1:9");
        config.callback_url = Some("https://relay.example.com/webhook".to_string());
        let dispatcher = CallDispatcher::new(config).unwrap();

        let payload = dispatcher.build_payload(&sample_request(), "pn-1");
        assert_eq!(
            payload["assistant"]["server"]["url"],
            "https://relay.example.com/webhook"
        );
    }
}
