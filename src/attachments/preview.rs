use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

const PREVIEW_SCHEME: &str = "blob:eco-echo/";

/// Renderable content behind a live preview reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewContent {
    pub content_type: String,
    pub bytes: Arc<Vec<u8>>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    entries: HashMap<String, PreviewContent>,
    created: u64,
    revoked: u64,
}

/// Issues and resolves preview references for local attachments.
///
/// Counters are kept so callers can verify that every reference created was
/// revoked exactly once.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    inner: Mutex<RegistryInner>,
}

impl PreviewRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // Entries stay consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a reference for `bytes`. It stays resolvable until the
    /// returned handle is revoked or dropped.
    pub fn create(self: &Arc<Self>, content_type: &str, bytes: Vec<u8>) -> PreviewHandle {
        let url = format!("{}{}", PREVIEW_SCHEME, uuid::Uuid::new_v4());

        {
            let mut inner = self.lock();
            inner.entries.insert(
                url.clone(),
                PreviewContent {
                    content_type: content_type.to_string(),
                    bytes: Arc::new(bytes),
                },
            );
            inner.created += 1;
        }

        debug!("Preview created: {}", url);

        PreviewHandle {
            url,
            registry: Arc::clone(self),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<PreviewContent> {
        self.lock().entries.get(url).cloned()
    }

    fn revoke(&self, url: &str) {
        let mut inner = self.lock();
        if inner.entries.remove(url).is_some() {
            inner.revoked += 1;
            debug!("Preview revoked: {}", url);
        } else {
            warn!("Preview {} revoked twice or never issued", url);
        }
    }

    pub fn created(&self) -> u64 {
        self.lock().created
    }

    pub fn revoked(&self) -> u64 {
        self.lock().revoked
    }

    /// References currently resolvable
    pub fn live(&self) -> usize {
        self.lock().entries.len()
    }
}

/// Owning handle to one preview reference. Revoked exactly once: either by
/// [`PreviewHandle::revoke`] or when dropped.
#[derive(Debug)]
pub struct PreviewHandle {
    url: String,
    registry: Arc<PreviewRegistry>,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn revoke(self) {
        drop(self);
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}
