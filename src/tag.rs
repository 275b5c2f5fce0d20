//! Unique tag minting for the observed-remove set.
//!
//! Every [`ORSet`](crate::ORSet) add/remove operation is identified by an
//! opaque [`Tag`]. Tags come from an explicit registry, the [`TagMinter`]:
//! a tag minted from a caller-supplied label is memoized (the same label
//! always yields the same tag, which is what lets a serialized set be
//! reconstructed), while anonymous mints draw labels from a strictly
//! increasing counter. Tags from different registries are never comparable;
//! merging sets minted by different registries fails.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque token identifying one add or remove operation in an
/// [`ORSet`](crate::ORSet).
///
/// Tags are only meaningful relative to the [`TagMinter`] that minted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(u64);

#[derive(Debug, Default)]
struct Registry {
    by_label: BTreeMap<String, Tag>,
    labels: Vec<String>,
    next_anon: u64,
}

impl Registry {
    fn mint(&mut self, label: &str) -> Tag {
        if let Some(&tag) = self.by_label.get(label) {
            return tag;
        }
        let tag = Tag(self.labels.len() as u64);
        self.labels.push(label.to_string());
        self.by_label.insert(label.to_string(), tag);
        tag
    }
}

/// An explicit tag registry shared by the replicas that intend to merge.
///
/// Cloning the handle shares the underlying registry; two clones have the
/// same identity and their tags are mutually comparable. A registry built
/// with [`TagMinter::new`] (or [`Default`]) has a fresh, process-unique
/// identity.
///
/// # Example
///
/// ```
/// use lattice_kit::TagMinter;
///
/// let minter = TagMinter::new();
/// assert_eq!(minter.mint("a"), minter.mint("a"));
/// assert_ne!(minter.mint_fresh(), minter.mint_fresh());
/// ```
#[derive(Debug, Clone)]
pub struct TagMinter {
    id: u64,
    registry: Arc<Mutex<Registry>>,
}

impl TagMinter {
    /// Create a registry with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Mint the tag for a label, memoized: repeated calls with the same
    /// label yield the same tag.
    pub fn mint(&self, label: &str) -> Tag {
        self.lock().mint(label)
    }

    /// Mint a fresh anonymous tag from the monotonic counter.
    pub fn mint_fresh(&self) -> Tag {
        let mut registry = self.lock();
        let label = registry.next_anon.to_string();
        registry.next_anon += 1;
        registry.mint(&label)
    }

    /// The wire label of a tag minted by this registry.
    pub(crate) fn label_of(&self, tag: Tag) -> String {
        let registry = self.lock();
        registry
            .labels
            .get(tag.0 as usize)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether two handles share one registry, and thus comparable tags.
    #[must_use]
    pub fn same_registry(&self, other: &Self) -> bool {
        self.id == other.id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TagMinter {
    fn default() -> Self {
        Self::new()
    }
}
