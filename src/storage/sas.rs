//! Service SAS tokens for individual blobs, signed with the storage account key.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Storage service version the tokens are signed for.
pub const SAS_VERSION: &str = "2021-08-06";

/// Subset of blob SAS permissions this crate grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobSasPermissions {
    pub read: bool,
    pub create: bool,
    pub write: bool,
}

impl BlobSasPermissions {
    pub const READ: Self = Self {
        read: true,
        create: false,
        write: false,
    };

    pub const CREATE_WRITE: Self = Self {
        read: false,
        create: true,
        write: true,
    };

    /// Permission letters in the order the service requires.
    pub fn as_string(&self) -> String {
        let mut s = String::with_capacity(3);
        if self.read {
            s.push('r');
        }
        if self.create {
            s.push('c');
        }
        if self.write {
            s.push('w');
        }
        s
    }
}

/// An account name plus its decoded shared key.
#[derive(Clone)]
pub struct SharedKey {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKey")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKey {
    /// `account_key` is the base64 key shown in the storage account's access keys.
    pub fn new(account: &str, account_key: &str) -> Result<Self> {
        let key = STANDARD
            .decode(account_key.trim())
            .context("storage account key is not valid base64")?;
        Ok(Self {
            account: account.to_string(),
            key,
        })
    }

    /// Query string (without leading `?`) granting `permissions` on one blob until `expiry`.
    pub fn blob_sas(
        &self,
        container: &str,
        blob: &str,
        permissions: BlobSasPermissions,
        expiry: DateTime<Utc>,
    ) -> Result<String> {
        let permissions = permissions.as_string();
        let expiry = format_expiry(expiry);
        let to_sign = string_to_sign(&self.account, container, blob, &permissions, &expiry);
        let signature = self.sign(&to_sign)?;

        Ok(format!(
            "sv={SAS_VERSION}&se={}&sr=b&sp={permissions}&sig={}",
            urlencoding::encode(&expiry),
            urlencoding::encode(&signature),
        ))
    }

    fn sign(&self, to_sign: &str) -> Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| anyhow::anyhow!("invalid signing key: {e}"))?;
        mac.update(to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ`, the form the service expects for `se`.
pub fn format_expiry(expiry: DateTime<Utc>) -> String {
    expiry.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Canonical string-to-sign for a blob service SAS. Unused optional fields stay empty.
fn string_to_sign(
    account: &str,
    container: &str,
    blob: &str,
    permissions: &str,
    expiry: &str,
) -> String {
    let resource = format!("/blob/{account}/{container}/{blob}");
    [
        permissions,
        "", // start
        expiry,
        resource.as_str(),
        "", // identifier
        "", // ip
        "", // protocol
        SAS_VERSION,
        "b",
        "", // snapshot time
        "", // encryption scope
        "", // cache-control
        "", // content-disposition
        "", // content-encoding
        "", // content-language
        "", // content-type
    ]
    .join("\n")
}
