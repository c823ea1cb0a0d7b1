use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::data::generator::RecordGenerator;
use crate::domain::record::{LiveRecord, Record};

pub fn router(generator: RecordGenerator) -> Router {
    Router::new()
        .route("/live", get(live))
        .route("/test", get(test_mode))
        .route("/health", get(super::health))
        .with_state(Arc::new(generator))
}

/// Encoding only; the label stays hidden like production traffic.
async fn live(State(generator): State<Arc<RecordGenerator>>) -> Json<LiveRecord> {
    let record = generator.generate(&mut rand::thread_rng());
    tracing::debug!(len = record.content.len(), "served live record");
    Json(record.into_live())
}

async fn test_mode(State(generator): State<Arc<RecordGenerator>>) -> Json<Record> {
    let record = generator.generate(&mut rand::thread_rng());
    tracing::debug!(flag = record.flag, "served test record '{}'", record.value);
    Json(record)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{categories::CategorySet, record::encode};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let categories = CategorySet::new(["pug", "husky"]).unwrap();
        router(RecordGenerator::new(categories))
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_test_mode_returns_full_record() {
        for _ in 0..20 {
            let (status, body) = get_body(app(), "/test").await;
            assert_eq!(status, StatusCode::OK);
            let record: Record = serde_json::from_slice(&body).unwrap();
            assert_eq!(record.content, encode(&record.value));
            if record.flag {
                assert!(record.value == "pug" || record.value == "husky");
            }
        }
    }

    #[tokio::test]
    async fn test_live_mode_withholds_label() {
        let (status, body) = get_body(app(), "/live").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj["content"].is_array());
    }

    #[tokio::test]
    async fn test_health_and_unknown_route() {
        let (status, body) = get_body(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");

        let (status, _) = get_body(app(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
