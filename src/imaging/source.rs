//! Loading crop sources.
//!
//! A record's URL is either an embedded `data:` URL, a same-origin path, a
//! path under the application's upload storage, or a genuinely remote URL.
//! Only the last kind needs an anonymous cross-origin request; asking for
//! CORS on the others costs a handshake for nothing, and skipping it on a
//! remote source would taint the pixels.

use crate::bridge::{DataUrlError, decode_data_url, is_embedded};
use futures::future::LocalBoxFuture;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// How a source URL must be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Plain fetch: same origin, embedded, or local upload storage.
    SameOrigin,
    /// Anonymous cross-origin request.
    Anonymous,
}

/// Decide the fetch policy for `url`.
pub fn fetch_policy(url: &str, local_upload_prefixes: &[String]) -> FetchPolicy {
    let same_origin_path = url.starts_with('/') && !url.starts_with("//");
    let relative = !url.contains("://") && !url.starts_with("//") && !url.contains(':');
    let local_upload = local_upload_prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && url.contains(prefix.as_str()));

    if same_origin_path || relative || is_embedded(url) || local_upload {
        FetchPolicy::SameOrigin
    } else {
        FetchPolicy::Anonymous
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid embedded image: {0}")]
    DataUrl(#[from] DataUrlError),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot fetch {0}: no loader for remote sources")]
    Unsupported(String),
}

/// Fetches the bytes a URL addresses.
pub trait SourceLoader {
    fn load<'a>(
        &'a self,
        url: &'a str,
        policy: FetchPolicy,
    ) -> LocalBoxFuture<'a, Result<Arc<[u8]>, LoadError>>;
}

/// Loader for embedded data URLs and paths under a local root directory.
///
/// Same-origin paths (`/uploads/a.jpg`) and relative paths resolve against
/// `root`. Remote URLs are refused; callers that crop remote images supply
/// their own [`SourceLoader`].
pub struct LocalSourceLoader {
    root: PathBuf,
}

impl LocalSourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn load_now(&self, url: &str, policy: FetchPolicy) -> Result<Arc<[u8]>, LoadError> {
        if url.starts_with("data:") {
            return Ok(decode_data_url(url)?.bytes.into());
        }
        if policy == FetchPolicy::Anonymous || url.starts_with("blob:") {
            return Err(LoadError::Unsupported(url.to_string()));
        }
        let path = self.root.join(url.trim_start_matches('/'));
        std::fs::read(&path)
            .map(Into::into)
            .map_err(|source| LoadError::Io { path, source })
    }
}

impl SourceLoader for LocalSourceLoader {
    fn load<'a>(
        &'a self,
        url: &'a str,
        policy: FetchPolicy,
    ) -> LocalBoxFuture<'a, Result<Arc<[u8]>, LoadError>> {
        Box::pin(async move { self.load_now(url, policy) })
    }
}
