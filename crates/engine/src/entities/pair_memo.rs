//! Pair memo entity - resolved pairs and the element list, backed by the store.
//!
//! Lookups try both orders of a pair. Records are insert-only and written
//! through to the store before they become visible in memory, so a crash
//! never leaves an in-memory result that is missing on disk.

use std::collections::HashMap;
use std::sync::Arc;

use alchemy_domain::{ElementImage, ElementName, PairKey};
use tokio::sync::{Mutex, RwLock};

use crate::infrastructure::ports::{ElementStorePort, PairMemoEntry, StoreError};

#[derive(Default)]
struct MemoState {
    /// Insertion order, as persisted
    entries: Vec<PairMemoEntry>,
    index: HashMap<PairKey, ElementName>,
    names: Vec<ElementName>,
}

impl MemoState {
    fn lookup(&self, key: &PairKey) -> Option<&ElementName> {
        key.both_orders().iter().find_map(|k| self.index.get(k))
    }
}

pub struct PairMemo {
    store: Arc<dyn ElementStorePort>,
    state: RwLock<MemoState>,
    /// Serializes every write to the store.
    persist: Mutex<()>,
}

impl PairMemo {
    /// Read the memo and element list from the store.
    ///
    /// Entries whose result has no stored image are dropped; the pair will be
    /// generated again on its next merge.
    pub async fn load(store: Arc<dyn ElementStorePort>) -> Result<Self, StoreError> {
        let mut names: Vec<ElementName> = Vec::new();
        for name in store.load_element_names().await? {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        let mut state = MemoState::default();
        for entry in store.load_pair_memo().await? {
            if !store.has_image(&entry.result).await? {
                tracing::warn!(
                    pair = %entry.key,
                    result = %entry.result,
                    "Dropping memo entry without a stored image"
                );
                continue;
            }
            if state.lookup(&entry.key).is_some() {
                tracing::warn!(pair = %entry.key, "Dropping duplicate memo entry");
                continue;
            }
            state.index.insert(entry.key.clone(), entry.result.clone());
            state.entries.push(entry);
        }
        state.names = names;

        tracing::info!(
            elements = state.names.len(),
            pairs = state.entries.len(),
            "Loaded pair memo"
        );

        Ok(Self {
            store,
            state: RwLock::new(state),
            persist: Mutex::new(()),
        })
    }

    /// Result of a previously resolved pair, in either order.
    pub async fn lookup(&self, first: &ElementName, second: &ElementName) -> Option<ElementName> {
        let key = PairKey::new(first.clone(), second.clone());
        self.state.read().await.lookup(&key).cloned()
    }

    /// Insert `key -> result` in the exact order given and flush memo and
    /// element list to the store.
    ///
    /// Returns `false` without touching anything when the pair (in either
    /// order) is already resolved.
    pub async fn record(&self, key: PairKey, result: ElementName) -> Result<bool, StoreError> {
        let _guard = self.persist.lock().await;

        let (entries, names) = {
            let state = self.state.read().await;
            if state.lookup(&key).is_some() {
                tracing::debug!(pair = %key, "Pair already resolved, keeping existing result");
                return Ok(false);
            }
            let mut entries = state.entries.clone();
            entries.push(PairMemoEntry::new(key.clone(), result.clone()));
            (entries, state.names.clone())
        };

        self.store.save_pair_memo(&entries).await?;
        self.store.save_element_names(&names).await?;

        let mut state = self.state.write().await;
        state.index.insert(key.clone(), result.clone());
        state.entries = entries;
        tracing::info!(pair = %key, result = %result, "Recorded pair");
        Ok(true)
    }

    /// Append a name to the element list and flush it. No-op when present.
    pub async fn append_element(&self, name: &ElementName) -> Result<bool, StoreError> {
        let _guard = self.persist.lock().await;

        let names = {
            let state = self.state.read().await;
            if state.names.contains(name) {
                return Ok(false);
            }
            let mut names = state.names.clone();
            names.push(name.clone());
            names
        };

        self.store.save_element_names(&names).await?;
        self.state.write().await.names = names;
        tracing::debug!(name = %name, "Appended element");
        Ok(true)
    }

    pub async fn element_names(&self) -> Vec<ElementName> {
        self.state.read().await.names.clone()
    }

    pub async fn contains_element(&self, name: &ElementName) -> bool {
        self.state.read().await.names.contains(name)
    }

    pub async fn pair_count(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn save_image(
        &self,
        name: &ElementName,
        image: &ElementImage,
    ) -> Result<(), StoreError> {
        self.store.save_image(name, image).await
    }

    pub async fn load_image(&self, name: &ElementName) -> Result<Option<ElementImage>, StoreError> {
        self.store.load_image(name).await
    }

    /// Wipe every save file and forget all pairs and elements.
    pub async fn reset(&self) -> Result<(), StoreError> {
        let _guard = self.persist.lock().await;
        self.store.clear().await?;
        *self.state.write().await = MemoState::default();
        tracing::info!("Cleared pair memo and element list");
        Ok(())
    }
}
