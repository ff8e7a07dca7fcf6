//! Provider webhook ingestion
//!
//! Vapi pushes call-outcome notifications here after calls progress or end.
//! The payload shape has changed across provider API versions (analysis
//! fields moved between `message.call` and `message.call.analysis`), so
//! extraction is a table of known paths tried in order rather than a rigid
//! schema. Ingestion never fails: absent fields become `None`.
//!
//! Known gap: payloads are not verified against any provider signing scheme,
//! so any caller can inject synthetic events.

use crate::updates::SubscriberRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Known provider-version paths per extracted field, newest shape first.
const CALL_ID_PATHS: &[&str] = &["message.call.id", "message.id", "call.id"];
const STATUS_PATHS: &[&str] = &["message.call.status", "message.status", "call.status"];
const SUMMARY_PATHS: &[&str] = &[
    "message.call.analysis.summary",
    "message.analysis.summary",
    "message.call.summary",
    "message.summary",
];
const STRUCTURED_DATA_PATHS: &[&str] = &[
    "message.call.analysis.structuredData",
    "message.analysis.structuredData",
    "message.structuredData",
];

/// Normalized subset of a provider call-event payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallUpdate {
    /// Provider call identifier
    pub call_id: Option<String>,
    /// Natural-language call summary
    pub summary: Option<String>,
    /// Provider-reported call status
    pub status: Option<String>,
    /// Structured outcome data extracted by the provider
    pub structured_data: Option<Value>,
}

/// Extract the normalized subset from an arbitrary provider payload.
pub fn normalize(payload: &Value) -> CallUpdate {
    CallUpdate {
        call_id: lookup_str(payload, CALL_ID_PATHS),
        summary: lookup_str(payload, SUMMARY_PATHS),
        status: lookup_str(payload, STATUS_PATHS),
        structured_data: lookup(payload, STRUCTURED_DATA_PATHS).cloned(),
    }
}

/// Ingest one provider notification: normalize it and fan it out.
///
/// Best-effort by contract — the provider always gets an ack, and delivery
/// problems stay inside the registry.
pub async fn handle(registry: &SubscriberRegistry, payload: Value) {
    let update = normalize(&payload);
    tracing::info!(
        call_id = ?update.call_id,
        status = ?update.status,
        "Webhook event received"
    );

    registry
        .broadcast(json!({
            "type": "call_update",
            "call_id": update.call_id,
            "summary": update.summary,
            "status": update.status,
            "structured_data": update.structured_data,
            "received_at": chrono::Utc::now().to_rfc3339(),
            "raw": payload,
        }))
        .await;
}

/// Resolve the first of `paths` (dotted keys) present in `payload`.
fn lookup<'a>(payload: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .find_map(|path| path.split('.').try_fold(payload, |v, key| v.get(key)))
}

fn lookup_str(payload: &Value, paths: &[&str]) -> Option<String> {
    lookup(payload, paths)
        .and_then(Value::as_str)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updates::SubscriberRegistry;

    #[test]
    fn test_normalize_nested_call_shape() {
        let payload = json!({"message": {"call": {"id": "x", "summary": "done"}}});
        let update = normalize(&payload);
        assert_eq!(update.call_id.as_deref(), Some("x"));
        assert_eq!(update.summary.as_deref(), Some("done"));
        assert!(update.status.is_none());
    }

    #[test]
    fn test_normalize_analysis_shape_wins_over_flat_summary() {
        let payload = json!({
            "message": {
                "call": {
                    "id": "call-1",
                    "status": "ended",
                    "summary": "old-shape summary",
                    "analysis": {
                        "summary": "analysis summary",
                        "structuredData": {"status": "completed"},
                    },
                },
            },
        });
        let update = normalize(&payload);
        assert_eq!(update.summary.as_deref(), Some("analysis summary"));
        assert_eq!(update.status.as_deref(), Some("ended"));
        assert_eq!(update.structured_data.unwrap()["status"], "completed");
    }

    #[test]
    fn test_normalize_empty_payload() {
        let update = normalize(&json!({}));
        assert!(update.call_id.is_none());
        assert!(update.summary.is_none());
        assert!(update.status.is_none());
        assert!(update.structured_data.is_none());
    }

    #[test]
    fn test_normalize_tolerates_wrong_types() {
        // id is a number, summary an object: extraction degrades to None
        let payload = json!({"message": {"call": {"id": 42, "summary": {"text": "hi"}}}});
        let update = normalize(&payload);
        assert!(update.call_id.is_none());
        assert!(update.summary.is_none());
    }

    #[tokio::test]
    async fn test_handle_broadcasts_normalized_update() {
        let registry = SubscriberRegistry::new();
        let (tx, mut rx) = SubscriberRegistry::channel();
        registry.add(tx).await;

        let payload = json!({"message": {"call": {"id": "x", "summary": "done"}}});
        handle(&registry, payload.clone()).await;

        let message = rx.recv().await.unwrap();
        assert_eq!(message["type"], "call_update");
        assert_eq!(message["call_id"], "x");
        assert_eq!(message["summary"], "done");
        assert_eq!(message["raw"], payload);
    }

    #[tokio::test]
    async fn test_handle_empty_payload_still_broadcasts() {
        let registry = SubscriberRegistry::new();
        let (tx, mut rx) = SubscriberRegistry::channel();
        registry.add(tx).await;

        handle(&registry, json!({})).await;

        let message = rx.recv().await.unwrap();
        assert_eq!(message["call_id"], Value::Null);
        assert_eq!(message["summary"], Value::Null);
    }
}
