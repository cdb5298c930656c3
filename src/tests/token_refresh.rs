// Credential cache behavior against a mock metadata endpoint:
//  - first acquisition performs exactly one provider call
//  - acquisitions inside the refresh interval reuse the cached token
//  - acquisitions after the interval refresh exactly once
//  - provider failures propagate without corrupting stored state
//  - concurrent cold-start acquisitions are single-flight

#[cfg(test)]
mod test {

    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use crate::tests::common::test_token_manager;
    use crate::utils::constants::TOKEN_REFRESH_INTERVAL_SECS;

    #[tokio::test]
    async fn first_acquisition_calls_provider_exactly_once() {
        let metadata = MockServer::start_async().await;
        let token_mock = metadata
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/token")
                    .header("Metadata-Flavor", "Google");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "access_token": "tok-1",
                        "expires_in": 3600,
                        "token_type": "Bearer"
                    }));
            })
            .await;

        let manager = test_token_manager(&metadata.url("/token"));

        let token = manager.acquire_token().await.expect("acquire");
        assert_eq!(token, "tok-1");
        token_mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn acquisition_within_interval_reuses_cached_token() {
        let metadata = MockServer::start_async().await;
        let token_mock = metadata
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "tok-1", "expires_in": 3600}));
            })
            .await;

        let manager = test_token_manager(&metadata.url("/token"));

        let first = manager.acquire_token().await.expect("first acquire");
        let second = manager.acquire_token().await.expect("second acquire");

        assert_eq!(first, second);
        token_mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn acquisition_after_interval_refreshes_once() {
        let metadata = MockServer::start_async().await;
        let first_mock = metadata
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "tok-1", "expires_in": 3600}));
            })
            .await;

        let manager = test_token_manager(&metadata.url("/token"));
        assert_eq!(manager.acquire_token().await.expect("acquire"), "tok-1");

        // supersede the provider response, then age the cached credential
        first_mock.delete_async().await;
        let second_mock = metadata
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "tok-2", "expires_in": 3600}));
            })
            .await;
        manager
            .rewind_last_refresh(TOKEN_REFRESH_INTERVAL_SECS + 1)
            .await;

        assert_eq!(manager.acquire_token().await.expect("refresh"), "tok-2");
        second_mock.assert_hits_async(1).await;

        // refreshed timestamp is current again, so the next call is cached
        assert_eq!(manager.acquire_token().await.expect("cached"), "tok-2");
        second_mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn provider_failure_propagates_and_cache_recovers() {
        let metadata = MockServer::start_async().await;
        let failing_mock = metadata
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(500).body("credential backend down");
            })
            .await;

        let manager = test_token_manager(&metadata.url("/token"));

        let err = manager.acquire_token().await.unwrap_err();
        assert!(err.to_string().contains("metadata token request failed"));

        // the cache was not poisoned by the failure: once the provider
        // recovers, acquisition succeeds
        failing_mock.delete_async().await;
        metadata
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "tok-after-outage", "expires_in": 3600}));
            })
            .await;

        assert_eq!(
            manager.acquire_token().await.expect("recovered"),
            "tok-after-outage"
        );
    }

    #[tokio::test]
    async fn failed_refresh_keeps_prior_token_intact() {
        let metadata = MockServer::start_async().await;
        let first_mock = metadata
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "tok-1", "expires_in": 3600}));
            })
            .await;

        let manager = test_token_manager(&metadata.url("/token"));
        assert_eq!(manager.acquire_token().await.expect("acquire"), "tok-1");

        first_mock.delete_async().await;
        let failing_mock = metadata
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(503).body("unavailable");
            })
            .await;
        manager
            .rewind_last_refresh(TOKEN_REFRESH_INTERVAL_SECS + 1)
            .await;

        manager.acquire_token().await.unwrap_err();

        // prior token survived the failed refresh and is served again once
        // the provider recovers
        failing_mock.delete_async().await;
        metadata
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "tok-2", "expires_in": 3600}));
            })
            .await;

        assert_eq!(manager.acquire_token().await.expect("retry"), "tok-2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cold_start_acquisitions_fetch_once() {
        let metadata = MockServer::start_async().await;
        let token_mock = metadata
            .mock_async(|when, then| {
                when.method(GET).path("/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"access_token": "tok-1", "expires_in": 3600}))
                    .delay(Duration::from_millis(200));
            })
            .await;

        let manager = test_token_manager(&metadata.url("/token"));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(
                async move { manager.acquire_token().await },
            ));
        }
        for handle in handles {
            let token = handle.await.expect("join").expect("acquire");
            assert_eq!(token, "tok-1");
        }

        token_mock.assert_hits_async(1).await;
    }
}
