//! Azure Blob Storage over its REST API.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use reqwest::StatusCode;
use std::time::Duration;

use super::sas::{BlobSasPermissions, SharedKey, SAS_VERSION};
use super::{BlobProperties, BlobStore};
use crate::config::{require, BlobConfig};

/// Lifetime of the SAS that authorizes a single HEAD or PUT.
const REQUEST_SAS_TTL: Duration = Duration::from_secs(15 * 60);

/// The parts of a storage connection string this crate uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub account_name: String,
    pub account_key: Option<String>,
    pub blob_endpoint: String,
}

impl ConnectionString {
    /// Parse `Key=Value;Key=Value` pairs. `BlobEndpoint` wins over the endpoint derived
    /// from `DefaultEndpointsProtocol`, `AccountName` and `EndpointSuffix`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut account_name = None;
        let mut account_key = None;
        let mut protocol = "https".to_string();
        let mut suffix = "core.windows.net".to_string();
        let mut blob_endpoint = None;

        for pair in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                bail!("malformed connection string segment: {pair}");
            };
            match key {
                "AccountName" => account_name = Some(value.to_string()),
                "AccountKey" => account_key = Some(value.to_string()),
                "DefaultEndpointsProtocol" => protocol = value.to_string(),
                "EndpointSuffix" => suffix = value.to_string(),
                "BlobEndpoint" => blob_endpoint = Some(value.trim_end_matches('/').to_string()),
                _ => {}
            }
        }

        let account_name = account_name.context("connection string has no AccountName")?;
        let blob_endpoint = blob_endpoint
            .unwrap_or_else(|| format!("{protocol}://{account_name}.blob.{suffix}"));

        Ok(Self {
            account_name,
            account_key,
            blob_endpoint,
        })
    }
}

/// One container of an Azure storage account.
pub struct AzureBlobStore {
    client: reqwest::Client,
    endpoint: String,
    container: String,
    signer: SharedKey,
}

impl AzureBlobStore {
    pub fn new(config: &BlobConfig) -> Result<Self> {
        let raw = require(&config.connection_string, "AZURE_BLOB_CONNECTION_STRING")?;
        let container = require(&config.container_name, "AZURE_BLOB_CONTAINER_NAME")?;
        let conn = ConnectionString::parse(raw)?;

        let account_key = match conn.account_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => require(&config.account_key, "AZURE_BLOB_ACCOUNT_KEY")?,
        };
        let signer = SharedKey::new(&conn.account_name, account_key)?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: conn.blob_endpoint,
            container: container.to_string(),
            signer,
        })
    }

    fn signed_url(
        &self,
        name: &str,
        permissions: BlobSasPermissions,
        ttl: Duration,
    ) -> Result<String> {
        let expiry = Utc::now() + chrono::Duration::from_std(ttl).context("SAS lifetime too long")?;
        let token = self
            .signer
            .blob_sas(&self.container, name, permissions, expiry)?;
        Ok(format!("{}?{token}", self.blob_url(name)))
    }
}

/// Percent-encode each path segment of a blob name, keeping `/` separators.
fn encode_blob_name(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn header_string(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn properties(&self, name: &str) -> Result<Option<BlobProperties>> {
        let url = self.signed_url(name, BlobSasPermissions::READ, REQUEST_SAS_TTL)?;
        let response = self
            .client
            .head(&url)
            .header("x-ms-version", SAS_VERSION)
            .send()
            .await
            .with_context(|| format!("blob lookup failed for {name}"))?;

        match response.status() {
            StatusCode::OK => {
                let headers = response.headers();
                Ok(Some(BlobProperties {
                    size: header_string(headers, CONTENT_LENGTH).and_then(|v| v.parse().ok()),
                    etag: header_string(headers, ETAG),
                    last_modified: header_string(headers, LAST_MODIFIED),
                    content_type: header_string(headers, CONTENT_TYPE),
                }))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => bail!("blob lookup for {name} returned HTTP {status}"),
        }
    }

    async fn upload(&self, name: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        let url = self.signed_url(name, BlobSasPermissions::CREATE_WRITE, REQUEST_SAS_TTL)?;
        let response = self
            .client
            .put(&url)
            .header("x-ms-version", SAS_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .with_context(|| format!("blob upload failed for {name}"))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            bail!("blob upload for {name} returned HTTP {status}: {body}");
        }
        Ok(())
    }

    fn blob_url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.container, encode_blob_name(name))
    }

    fn signed_read_url(&self, name: &str, ttl: Duration) -> Result<String> {
        self.signed_url(name, BlobSasPermissions::READ, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "c2VjcmV0LWtleS1mb3ItdGVzdHM=";

    #[test]
    fn parse_account_connection_string() {
        let conn = ConnectionString::parse(&format!(
            "DefaultEndpointsProtocol=https;AccountName=shop;AccountKey={KEY};EndpointSuffix=core.windows.net"
        ))
        .unwrap();
        assert_eq!(conn.account_name, "shop");
        assert_eq!(conn.account_key.as_deref(), Some(KEY));
        assert_eq!(conn.blob_endpoint, "https://shop.blob.core.windows.net");
    }

    #[test]
    fn explicit_blob_endpoint_wins() {
        let conn = ConnectionString::parse(
            "AccountName=devstoreaccount1;BlobEndpoint=http://127.0.0.1:10000/devstoreaccount1/;",
        )
        .unwrap();
        assert_eq!(conn.blob_endpoint, "http://127.0.0.1:10000/devstoreaccount1");
        assert_eq!(conn.account_key, None);
    }

    #[test]
    fn missing_account_name_is_an_error() {
        assert!(ConnectionString::parse("AccountKey=abc").is_err());
        assert!(ConnectionString::parse("garbage").is_err());
    }

    #[test]
    fn falls_back_to_separate_account_key() {
        let config = BlobConfig {
            connection_string: "AccountName=shop".into(),
            account_key: KEY.into(),
            container_name: "products".into(),
            ..Default::default()
        };
        let store = AzureBlobStore::new(&config).unwrap();
        assert_eq!(
            store.blob_url("red sneakers.jpg"),
            "https://shop.blob.core.windows.net/products/red%20sneakers.jpg"
        );
    }

    #[test]
    fn signed_read_url_is_fresh_and_read_only() {
        let config = BlobConfig {
            connection_string: format!("AccountName=shop;AccountKey={KEY}"),
            container_name: "products".into(),
            ..Default::default()
        };
        let store = AzureBlobStore::new(&config).unwrap();
        let url = store
            .signed_read_url("shoe.jpg", Duration::from_secs(3600))
            .unwrap();
        assert!(url.starts_with("https://shop.blob.core.windows.net/products/shoe.jpg?"));
        assert!(url.contains("sp=r&"));
    }
}
