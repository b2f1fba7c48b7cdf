//! API route configuration.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/address/:address", get(handlers::get_address))
        .route("/transaction/:hash", get(handlers::get_transaction))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use explorer_cache::MemoryCache;
    use explorer_core::traits::{CacheStore, DataProvider};
    use explorer_core::types::AddressInfo;
    use explorer_provider::{BlockCypherConfig, BlockCypherProvider};

    use crate::service::tests::{sample_tx, FaultyCache, StubProvider, ADDRESS, TX_HASH};
    use crate::state::ApiConfig;

    fn app_with(provider: Arc<dyn DataProvider>, cache: Arc<dyn CacheStore>) -> Router {
        create_router(Arc::new(AppState::new(ApiConfig::default(), provider, cache)))
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app_with(Arc::new(StubProvider::default()), Arc::new(MemoryCache::new()));

        let response = get(app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider"], "stub");
        assert_eq!(body["cache_reachable"], true);
    }

    #[tokio::test]
    async fn test_address_lookup_then_cache_hit() {
        let provider = Arc::new(StubProvider::with_address(AddressInfo::from_satoshis(
            ADDRESS,
            5_000_000_000,
            3,
        )));
        let app = app_with(provider.clone(), Arc::new(MemoryCache::new()));
        let uri = format!("/address/{}", ADDRESS);

        let first = get(app.clone(), &uri).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["x-cache"], "MISS");
        assert_eq!(
            body_json(first).await,
            json!({ "address": ADDRESS, "balance": 50.0, "transaction_count": 3 })
        );

        let second = get(app, &uri).await;
        assert_eq!(second.headers()["x-cache"], "HIT");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_transaction_body_shape() {
        let app = app_with(
            Arc::new(StubProvider::with_transaction(sample_tx(-1))),
            Arc::new(MemoryCache::new()),
        );

        let response = get(app, &format!("/transaction/{}", TX_HASH)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["hash"], TX_HASH);
        assert_eq!(body["transaction_index"], -1);
        assert_eq!(body["inputs"][0]["address"], ADDRESS);
        assert_eq!(body["block_time"], "2024-04-20T00:09:27.04Z");
    }

    #[tokio::test]
    async fn test_invalid_identifiers_are_bad_requests() {
        let provider = Arc::new(StubProvider::default());
        let app = app_with(provider.clone(), Arc::new(MemoryCache::new()));

        let response = get(app.clone(), "/address/not-an-address").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": { "code": "BAD_REQUEST", "message": "Invalid Bitcoin address" } })
        );

        let response = get(app, &format!("/transaction/{}", &TX_HASH[..63])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["message"], "Invalid transaction hash");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_entities_are_not_found() {
        let app = app_with(Arc::new(StubProvider::default()), Arc::new(MemoryCache::new()));

        let response = get(app.clone(), &format!("/address/{}", ADDRESS)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Address information could not be retrieved"
        );

        let response = get(app, &format!("/transaction/{}", TX_HASH)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Transaction information could not be retrieved"
        );
    }

    #[tokio::test]
    async fn test_broken_cache_still_serves_lookups() {
        let cache = Arc::new(FaultyCache {
            fail_get: true,
            fail_set: true,
            ..Default::default()
        });
        let provider = Arc::new(StubProvider::with_transaction(sample_tx(840_000)));
        let app = app_with(provider.clone(), cache);
        let uri = format!("/transaction/{}", TX_HASH);

        assert_eq!(get(app.clone(), &uri).await.status(), StatusCode::OK);
        assert_eq!(get(app, &uri).await.status(), StatusCode::OK);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_closed_cache_degrades_health() {
        let cache = Arc::new(MemoryCache::new());
        cache.close().await.unwrap();
        let app = app_with(Arc::new(StubProvider::default()), cache);

        let health = body_json(get(app, "/health").await).await;
        assert_eq!(health["status"], "degraded");
        assert_eq!(health["cache_reachable"], false);
    }

    #[tokio::test]
    async fn test_end_to_end_against_mock_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/txs/{}", TX_HASH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "block_height": -1,
                "hash": TX_HASH,
                "fees": 10_000,
                "received": "2024-04-20T00:09:27.04Z",
                "inputs": [{ "addresses": [ADDRESS], "output_value": 60_000_000 }],
                "outputs": [{ "addresses": ["3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy"], "value": 59_990_000 }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = BlockCypherProvider::with_config(BlockCypherConfig::with_base_url(server.uri())).unwrap();
        let cache = Arc::new(MemoryCache::new());
        let app = app_with(Arc::new(provider), cache.clone());
        let uri = format!("/transaction/{}", TX_HASH);

        let body = body_json(get(app.clone(), &uri).await).await;
        assert_eq!(body["fee"], 0.0001);
        assert_eq!(body["outputs"][0]["value"], 0.5999);
        assert_eq!(cache.configured_ttl(TX_HASH), Some(Some(Duration::from_secs(600))));

        // Served from cache; the mock expects exactly one upstream call
        let response = get(app, &uri).await;
        assert_eq!(response.headers()["x-cache"], "HIT");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = app_with(Arc::new(StubProvider::default()), Arc::new(MemoryCache::new()));
        let response = get(app, "/blocks/1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
