//! Aptos node REST API data source implementation
//!
//! Single-attempt GET requests against the `/v1` API. A 404 maps to
//! `Error::NotFound`; any other non-success status maps to
//! `Error::Transport` carrying the status and body.

use super::cache::DataSourceCache;
use super::{
    AccountAddress, MoveResource, ResourceResolver, Transaction, TransactionSource, VersionOrHash,
};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Aptos REST API client
#[derive(Debug, Clone)]
pub struct AptosClient {
    base_url: String,
    http: reqwest::Client,
    cache: Option<Arc<DataSourceCache>>,
}

impl AptosClient {
    /// Create a new client for the given base URL (e.g. `https://api.mainnet.aptoslabs.com/v1`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(Error::Config("rpc url cannot be empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            http,
            cache: None,
        })
    }

    /// Set cache
    pub fn with_cache(mut self, cache: DataSourceCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET a path and return the body of a successful response
    async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.endpoint(path);
        tracing::debug!("GET {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!("GET {}: {}", path, body)));
        }
        if !status.is_success() {
            return Err(Error::transport(format!(
                "API error (status {}): {}",
                status.as_u16(),
                body
            )));
        }

        Ok(body)
    }

    /// GET a path, answering from the response cache when possible
    ///
    /// Fresh bodies are not saved here. Callers decode them first and then
    /// call `remember`.
    async fn get_json_cached(&self, path: &str, cache_key: &str) -> Result<Fetched> {
        if let Some(ref cache) = self.cache
            && let Some(content) = cache.get_text(cache_key).await
        {
            match serde_json::from_str(&content) {
                Ok(value) => return Ok(Fetched { value, body: None }),
                Err(e) => tracing::warn!("Failed to deserialize cached response: {}", e),
            }
        }

        let body = self.get_text(path).await?;
        let value: Value = serde_json::from_str(&body)?;
        Ok(Fetched {
            value,
            body: Some(body),
        })
    }

    /// Save a freshly fetched body once it decoded into a final answer
    async fn remember(&self, cache_key: &str, fetched: Fetched) {
        if let (Some(cache), Some(body)) = (&self.cache, fetched.body) {
            cache.save_text(cache_key, &body).await;
        }
    }
}

/// A decoded response body; `body` is set only when it came from the network
struct Fetched {
    value: Value,
    body: Option<String>,
}

#[async_trait]
impl TransactionSource for AptosClient {
    async fn get_transaction(&self, id: &VersionOrHash) -> Result<Transaction> {
        let path = match id {
            VersionOrHash::Version(version) => format!("/transactions/by_version/{}", version),
            VersionOrHash::Hash(hash) => format!("/transactions/by_hash/{}", hash),
        };

        let cache_key = DataSourceCache::transaction_key(&id.to_string());
        let fetched = self
            .get_json_cached(&path, &cache_key)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::not_found(format!("transaction {}", id)),
                other => other,
            })?;

        // Pending transactions have no version and are rejected here, so
        // only committed ones reach the cache.
        let tx = Transaction::from_json(&fetched.value)?;
        self.remember(&cache_key, fetched).await;
        Ok(tx)
    }
}

#[async_trait]
impl ResourceResolver for AptosClient {
    async fn get_resource(
        &self,
        address: &str,
        resource_type: &str,
        version: u64,
    ) -> Result<Option<MoveResource>> {
        let address = AccountAddress::parse_relaxed(address)?.to_string();
        let path = format!(
            "/accounts/{}/resource/{}?ledger_version={}",
            address,
            urlencoding::encode(resource_type),
            version
        );
        let cache_key = DataSourceCache::resource_key(&address, resource_type, version);

        match self.get_json_cached(&path, &cache_key).await {
            Ok(fetched) => {
                let resource = MoveResource::deserialize(&fetched.value)?;
                self.remember(&cache_key, fetched).await;
                Ok(Some(resource))
            }
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{FUNGIBLE_STORE, OBJECT_CORE};
    use mockito::{Matcher, Server};
    fn client_for(server: &Server) -> AptosClient {
        AptosClient::new(&format!("{}/v1/", server.url()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_empty_url_rejected() {
        let err = AptosClient::new("   ", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_get_transaction_by_version() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/transactions/by_version/42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"version":"42","hash":"0xaa","changes":[],"events":[]}"#)
            .create_async()
            .await;

        let tx = client_for(&server)
            .get_transaction(&VersionOrHash::Version(42))
            .await
            .unwrap();
        assert_eq!(tx.version, 42);
        assert_eq!(tx.hash, "0xaa");
    }

    #[tokio::test]
    async fn test_get_transaction_by_hash_not_found() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/transactions/by_hash/0xdead")
            .with_status(404)
            .with_body(r#"{"message":"not found","error_code":"transaction_not_found"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_transaction(&VersionOrHash::Hash("0xdead".to_string()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_server_error_is_transport() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/transactions/by_version/7")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let err = client_for(&server)
            .get_transaction(&VersionOrHash::Version(7))
            .await
            .unwrap_err();
        match err {
            Error::Transport(msg) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("upstream unavailable"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_resource_at_version() {
        let mut server = Server::new_async().await;
        let address = "0x000000000000000000000000000000000000000000000000000000000000000a";
        let _m = server
            .mock(
                "GET",
                Matcher::Regex(format!(r"^/v1/accounts/{}/resource/0x1%3A%3Aobject%3A%3AObjectCore", address)),
            )
            .match_query(Matcher::UrlEncoded("ledger_version".into(), "99".into()))
            .with_status(200)
            .with_body(r#"{"type":"0x1::object::ObjectCore","data":{"owner":"0xb"}}"#)
            .create_async()
            .await;

        let resource = client_for(&server)
            .get_resource("0xa", OBJECT_CORE, 99)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resource.object_owner(), Some("0xb".to_string()));
    }

    #[tokio::test]
    async fn test_missing_resource_is_none() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", Matcher::Regex(r"^/v1/accounts/.*/resource/".to_string()))
            .with_status(404)
            .with_body(r#"{"error_code":"resource_not_found"}"#)
            .create_async()
            .await;

        let resource = client_for(&server)
            .get_resource("0xa", FUNGIBLE_STORE, 5)
            .await
            .unwrap();
        assert!(resource.is_none());
    }

    #[tokio::test]
    async fn test_invalid_address_not_requested() {
        let client = AptosClient::new("http://127.0.0.1:1/v1", Duration::from_secs(1)).unwrap();
        let err = client.get_resource("not-hex", OBJECT_CORE, 1).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_cached_transaction_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/transactions/by_version/9")
            .with_status(200)
            .with_body(r#"{"version":"9","hash":"0x99"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server).with_cache(DataSourceCache::new(
            Duration::from_secs(60),
            Some(dir.path().to_path_buf()),
        ));

        for _ in 0..2 {
            let tx = client
                .get_transaction(&VersionOrHash::Version(9))
                .await
                .unwrap();
            assert_eq!(tx.hash, "0x99");
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_pending_transaction_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = Server::new_async().await;
        let pending = server
            .mock("GET", "/v1/transactions/by_hash/0xab")
            .with_status(200)
            .with_body(r#"{"type":"pending_transaction","hash":"0xab"}"#)
            .create_async()
            .await;

        let client = client_for(&server).with_cache(DataSourceCache::new(
            Duration::from_secs(60),
            Some(dir.path().to_path_buf()),
        ));
        let id = VersionOrHash::Hash("0xab".to_string());

        let err = client.get_transaction(&id).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));

        pending.remove_async().await;
        let _committed = server
            .mock("GET", "/v1/transactions/by_hash/0xab")
            .with_status(200)
            .with_body(r#"{"type":"user_transaction","version":"77","hash":"0xab"}"#)
            .create_async()
            .await;

        let tx = client.get_transaction(&id).await.unwrap();
        assert_eq!(tx.version, 77);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport() {
        let client = AptosClient::new("http://127.0.0.1:1/v1", Duration::from_secs(1)).unwrap();
        let err = client
            .get_transaction(&VersionOrHash::Version(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
