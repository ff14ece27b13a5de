// SPDX-License-Identifier: GPL-3.0-only

//! Preview handles
//!
//! A preview handle lets a view render bytes without re-reading the source.
//! Handles are issued by a [`PreviewBackend`] and released exactly once,
//! when the [`PreviewHandle`] is dropped.

use super::MediaBlob;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Issues and releases preview URLs
pub trait PreviewBackend: Send + Sync {
    /// Register bytes and return a process-local URL for them
    fn create(&self, blob: &MediaBlob) -> String;

    /// Release a URL previously returned by [`create`](Self::create)
    fn revoke(&self, url: &str);
}

/// Shared entry point for creating preview handles
#[derive(Clone)]
pub struct Previews {
    backend: Arc<dyn PreviewBackend>,
}

impl Previews {
    pub fn new(backend: impl PreviewBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_arc(backend: Arc<dyn PreviewBackend>) -> Self {
        Self { backend }
    }

    /// Register a blob and wrap its URL in an owning handle
    pub fn create(&self, blob: &MediaBlob) -> PreviewHandle {
        let url = self.backend.create(blob);
        debug!(url = %url, name = blob.name(), "Preview handle created");
        PreviewHandle {
            url,
            backend: Arc::clone(&self.backend),
        }
    }
}

impl fmt::Debug for Previews {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Previews")
    }
}

/// Owning reference to a registered preview
///
/// Not `Clone`: there is exactly one owner, and dropping it revokes the URL.
pub struct PreviewHandle {
    url: String,
    backend: Arc<dyn PreviewBackend>,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PreviewHandle({})", self.url)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        debug!(url = %self.url, "Preview handle released");
        self.backend.revoke(&self.url);
    }
}

/// In-memory object URL table
///
/// URLs look like `blob:postcam/<uuid>` and resolve back to their blob while
/// live. Clones share the same table.
#[derive(Clone, Default)]
pub struct ObjectUrlStore {
    entries: Arc<Mutex<HashMap<String, MediaBlob>>>,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of URLs that have been created and not yet revoked
    pub fn live_count(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Look up the blob behind a live URL
    pub fn resolve(&self, url: &str) -> Option<MediaBlob> {
        self.entries.lock().ok()?.get(url).cloned()
    }
}

impl PreviewBackend for ObjectUrlStore {
    fn create(&self, blob: &MediaBlob) -> String {
        let url = format!("blob:postcam/{}", uuid::Uuid::new_v4());
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(url.clone(), blob.clone());
        }
        url
    }

    fn revoke(&self, url: &str) {
        let removed = self
            .entries
            .lock()
            .map(|mut entries| entries.remove(url).is_some())
            .unwrap_or(false);
        if !removed {
            warn!(url, "Revoking unknown preview URL");
        }
    }
}

impl fmt::Debug for ObjectUrlStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectUrlStore({} live)", self.live_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_unique_and_revoked_on_drop() {
        let store = ObjectUrlStore::new();
        let previews = Previews::new(store.clone());
        let blob = MediaBlob::new(vec![0u8; 4], "image/png", "x.png");

        let a = previews.create(&blob);
        let b = previews.create(&blob);
        assert_ne!(a.url(), b.url());
        assert!(a.url().starts_with("blob:postcam/"));
        assert_eq!(store.live_count(), 2);

        drop(a);
        assert_eq!(store.live_count(), 1);
        assert_eq!(store.resolve(b.url()), Some(blob));
        drop(b);
        assert_eq!(store.live_count(), 0);
    }
}
