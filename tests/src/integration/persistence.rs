//! RocksDB-backed flows: accounts, tokens and assets survive a reopen.

#[cfg(test)]
mod tests {
    use super::super::*;
    use av_01_asset_store::{RocksDbConfig, RocksDbStore};
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> Arc<AssetStoreService<RocksDbStore>> {
        let store = RocksDbStore::open(RocksDbConfig::for_testing(dir.path())).expect("open rocksdb");
        Arc::new(AssetStoreService::new(store, StoreConfig::for_testing()))
    }

    #[tokio::test]
    async fn test_asset_and_token_survive_reopen() {
        let dir = TempDir::new().unwrap();

        let token = {
            let gateway = open(&dir);
            gateway.provision_user("alice", "wonderland").await.unwrap();
            let router = router_for(gateway.clone());

            let token = login(&router, "alice", "wonderland", IP_A).await;
            let (status, _) =
                call(&router, "POST", "/api/upload-asset/kept", Some(&token), IP_A, "durable").await;
            assert_eq!(status, StatusCode::OK);

            gateway.close().await.unwrap();
            token
        };

        let gateway = open(&dir);
        let router = router_for(gateway.clone());

        let (status, body) =
            call(&router, "GET", "/api/asset/kept", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"durable");

        let (_, body) = call(&router, "GET", "/api/asset", Some(&token), IP_A, Body::empty()).await;
        assert_eq!(json(&body), serde_json::json!({ "assets": ["kept"] }));

        gateway.close().await.unwrap();
    }
}
