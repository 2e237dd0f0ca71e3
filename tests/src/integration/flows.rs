//! # Integration Test Flows
//!
//! The real `AssetStoreService` behind the real router, driven request by
//! request. Covers the full login → upload → download → delete cycle and
//! the token/IP binding across every endpoint.

#[cfg(test)]
mod tests {
    use super::super::*;
    use av_01_asset_store::Token;

    // =============================================================================
    // END-TO-END
    // =============================================================================

    #[tokio::test]
    async fn test_full_asset_lifecycle() {
        let gateway = memory_gateway().await;
        let router = router_for(gateway);

        let token = login(&router, "alice", "wonderland", IP_A).await;

        let (status, body) = call(
            &router,
            "POST",
            "/api/upload-asset/x",
            Some(&token),
            IP_A,
            b"\x00original bytes\xff".to_vec(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), serde_json::json!({ "status": "ok" }));

        let (status, body) = call(&router, "GET", "/api/asset/x", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"\x00original bytes\xff");

        let (status, _) = call(&router, "GET", "/api/asset/x", Some(&token), IP_B, Body::empty()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(&router, "DELETE", "/api/asset/x", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), serde_json::json!({ "status": "ok" }));

        let (status, body) = call(&router, "GET", "/api/asset/x", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json(&body), serde_json::json!({ "error": "not found" }));
    }

    #[tokio::test]
    async fn test_list_starts_empty_then_sorted() {
        let router = router_for(memory_gateway().await);
        let token = login(&router, "alice", "wonderland", IP_A).await;

        let (status, body) = call(&router, "GET", "/api/asset", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), serde_json::json!({ "assets": [] }));

        for name in ["b", "c", "a"] {
            let uri = format!("/api/upload-asset/{}", name);
            let (status, _) = call(&router, "POST", &uri, Some(&token), IP_A, "data").await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = call(&router, "GET", "/api/asset", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(json(&body), serde_json::json!({ "assets": ["a", "b", "c"] }));
    }

    // =============================================================================
    // AUTHORIZATION
    // =============================================================================

    #[tokio::test]
    async fn test_token_from_other_ip_is_unauthorized_everywhere() {
        let gateway = memory_gateway().await;
        let router = router_for(gateway.clone());
        let token = login(&router, "alice", "wonderland", IP_A).await;
        call(&router, "POST", "/api/upload-asset/x", Some(&token), IP_A, "data").await;

        assert!(!gateway.check_token(&Token::new(token.clone()), IP_B).await.unwrap());

        let requests = [
            ("POST", "/api/upload-asset/y"),
            ("GET", "/api/asset/x"),
            ("DELETE", "/api/asset/x"),
            ("GET", "/api/asset"),
        ];
        for (method, uri) in requests {
            let (status, body) = call(&router, method, uri, Some(&token), IP_B, "data").await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
            assert_eq!(json(&body), serde_json::json!({ "error": "unauthorized" }));
        }

        // The rejected delete left the asset in place.
        let (status, _) = call(&router, "GET", "/api/asset/x", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let router = router_for(memory_gateway().await);

        for (login, password) in [("alice", "wrong"), ("mallory", "wonderland")] {
            let body = serde_json::json!({ "login": login, "password": password }).to_string();
            let (status, bytes) = call(&router, "POST", "/api/auth", None, IP_A, body).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(
                json(&bytes),
                serde_json::json!({ "error": "invalid login/password" })
            );
        }
    }

    #[tokio::test]
    async fn test_disabled_account_loses_access() {
        let gateway = memory_gateway().await;
        let router = router_for(gateway.clone());
        let token = login(&router, "alice", "wonderland", IP_A).await;

        gateway.disable_user("alice").await.unwrap();

        let (status, _) = call(&router, "GET", "/api/asset", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let body = serde_json::json!({ "login": "alice", "password": "wonderland" }).to_string();
        let (status, _) = call(&router, "POST", "/api/auth", None, IP_A, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let gateway = memory_gateway().await;
        gateway.provision_user("bob", "builder").await.unwrap();
        let router = router_for(gateway);

        let alice = login(&router, "alice", "wonderland", IP_A).await;
        let bob = login(&router, "bob", "builder", IP_B).await;

        call(&router, "POST", "/api/upload-asset/shared-name", Some(&alice), IP_A, "alice's").await;

        let (status, _) = call(&router, "GET", "/api/asset/shared-name", Some(&bob), IP_B, Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&router, "POST", "/api/upload-asset/shared-name", Some(&bob), IP_B, "bob's").await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&router, "GET", "/api/asset/shared-name", Some(&alice), IP_A, Body::empty()).await;
        assert_eq!(body, b"alice's");
    }

    // =============================================================================
    // UPLOAD REJECTIONS
    // =============================================================================

    #[tokio::test]
    async fn test_duplicate_upload_cannot_be_created() {
        let router = router_for(memory_gateway().await);
        let token = login(&router, "alice", "wonderland", IP_A).await;

        let (status, _) = call(&router, "POST", "/api/upload-asset/x", Some(&token), IP_A, "v1").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&router, "POST", "/api/upload-asset/x", Some(&token), IP_A, "v2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body), serde_json::json!({ "status": "cannot create asset" }));

        let (_, body) = call(&router, "GET", "/api/asset/x", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(body, b"v1");
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let router = router_for(memory_gateway().await);
        let token = login(&router, "alice", "wonderland", IP_A).await;
        let too_big = vec![7u8; StoreConfig::for_testing().max_asset_size + 1];

        let (status, body) = call(&router, "POST", "/api/upload-asset/big", Some(&token), IP_A, too_big).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(json(&body)["error"].is_string());

        let (status, _) = call(&router, "GET", "/api/asset/big", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    // =============================================================================
    // BACKEND FAILURE
    // =============================================================================

    #[tokio::test]
    async fn test_closed_store_surfaces_internal_error() {
        let gateway = memory_gateway().await;
        let router = router_for(gateway.clone());
        let token = login(&router, "alice", "wonderland", IP_A).await;

        gateway.close().await.unwrap();

        let (status, body) = call(&router, "GET", "/api/asset", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json(&body),
            serde_json::json!({ "error": "asset store is closed" })
        );

        let (status, _) = call(&router, "GET", "/health", None, IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
    }
}
