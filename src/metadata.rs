//! Profile metadata resolution and encoding.
//!
//! Callers may hand the factory pre-encoded bytes, a structured profile
//! object, or a URI (content-addressed URIs included). Objects are uploaded
//! through the [`MetadataStore`] collaborator and URIs resolved through the
//! [`MetadataFetcher`] collaborator; both are black boxes to the core.

use alloy_primitives::{Bytes, keccak256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::constants::JSON_URL_HASH_ID;
use crate::error::{FactoryError, FactoryResult};

/// A link published as part of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLink {
    /// Display title.
    pub title: String,
    /// Link target.
    pub url: String,
}

/// Structured profile document, encoded canonically before upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    /// Profile display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Published links.
    #[serde(default)]
    pub links: Vec<ProfileLink>,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Profile metadata in one of the accepted input forms.
#[derive(Debug, Clone)]
pub enum ProfileMetadata {
    /// Already-encoded storage value, written verbatim.
    Encoded(Bytes),
    /// Structured document; uploaded, then encoded as hash + URI.
    Object(ProfileData),
    /// URI of existing content; fetched, then encoded as hash + URI.
    Url(String),
}

/// Resolves a URI (including content-addressed ones) to raw bytes.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetches the content behind `url`.
    async fn fetch(&self, url: &str) -> FactoryResult<Vec<u8>>;
}

/// Uploads raw bytes and returns a URI for them.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Stores `bytes`, returning the URI under which they are retrievable.
    async fn store(&self, bytes: Vec<u8>) -> FactoryResult<String>;
}

/// Packs content into the stored metadata value: hash-scheme id, keccak256
/// of the content, then the UTF-8 URI.
pub fn encode_json_url(content: &[u8], url: &str) -> Bytes {
    let hash = keccak256(content);
    let mut out = Vec::with_capacity(4 + 32 + url.len());
    out.extend_from_slice(&JSON_URL_HASH_ID);
    out.extend_from_slice(hash.as_slice());
    out.extend_from_slice(url.as_bytes());
    Bytes::from(out)
}

/// Resolves caller-supplied metadata to the final storage value.
///
/// Returns `None` when no metadata was requested. Fetch and store failures
/// surface as [`FactoryError::Metadata`]; a missing collaborator for a form
/// that needs one is reported the same way before any I/O happens.
pub async fn resolve_metadata(
    metadata: Option<ProfileMetadata>,
    fetcher: Option<&dyn MetadataFetcher>,
    store: Option<&dyn MetadataStore>,
) -> FactoryResult<Option<Bytes>> {
    let Some(metadata) = metadata else {
        return Ok(None);
    };

    match metadata {
        ProfileMetadata::Encoded(bytes) => Ok(Some(bytes)),
        ProfileMetadata::Object(data) => {
            let store = store.ok_or_else(|| {
                FactoryError::Metadata("no metadata store configured".to_string())
            })?;
            let content = serde_json::to_vec(&data)
                .map_err(|e| FactoryError::Metadata(format!("profile encoding failed: {e}")))?;
            let url = store.store(content.clone()).await?;
            Ok(Some(encode_json_url(&content, &url)))
        }
        ProfileMetadata::Url(url) => {
            let fetcher = fetcher.ok_or_else(|| {
                FactoryError::Metadata("no metadata fetcher configured".to_string())
            })?;
            let content = fetcher.fetch(&url).await?;
            Ok(Some(encode_json_url(&content, &url)))
        }
    }
}
