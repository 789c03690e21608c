//! In-memory element store for scenario tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use alchemy_domain::{ElementImage, ElementName};

use crate::infrastructure::ports::{ElementStorePort, PairMemoEntry, StoreError};

#[derive(Default)]
struct Saved {
    names: Vec<ElementName>,
    memo: Vec<PairMemoEntry>,
    images: HashMap<ElementName, ElementImage>,
    credential: Option<String>,
    /// Element list saves still to go before one fails.
    name_saves_until_failure: Option<usize>,
}

/// Behaves like the file store, minus the files.
#[derive(Default)]
pub struct InMemoryElementStore {
    saved: Mutex<Saved>,
}

impl InMemoryElementStore {
    fn saved(&self) -> MutexGuard<'_, Saved> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_names(&self, names: Vec<ElementName>) {
        self.saved().names = names;
    }

    pub fn seed_pair_memo(&self, entries: Vec<PairMemoEntry>) {
        self.saved().memo = entries;
    }

    pub fn seed_image(&self, name: &ElementName, image: ElementImage) {
        self.saved().images.insert(name.clone(), image);
    }

    /// Let `successes` more element list saves through, then fail the next one.
    pub fn fail_name_save_after(&self, successes: usize) {
        self.saved().name_saves_until_failure = Some(successes);
    }

    pub fn element_names(&self) -> Vec<ElementName> {
        self.saved().names.clone()
    }

    pub fn pair_memo(&self) -> Vec<PairMemoEntry> {
        self.saved().memo.clone()
    }

    pub fn image(&self, name: &ElementName) -> Option<ElementImage> {
        self.saved().images.get(name).cloned()
    }
}

#[async_trait]
impl ElementStorePort for InMemoryElementStore {
    async fn load_element_names(&self) -> Result<Vec<ElementName>, StoreError> {
        Ok(self.saved().names.clone())
    }

    async fn save_element_names(&self, names: &[ElementName]) -> Result<(), StoreError> {
        let mut saved = self.saved();
        match saved.name_saves_until_failure {
            Some(0) => {
                saved.name_saves_until_failure = None;
                return Err(StoreError::io("save_element_names", "disk full"));
            }
            Some(n) => saved.name_saves_until_failure = Some(n - 1),
            None => {}
        }
        saved.names = names.to_vec();
        Ok(())
    }

    async fn load_pair_memo(&self) -> Result<Vec<PairMemoEntry>, StoreError> {
        Ok(self.saved().memo.clone())
    }

    async fn save_pair_memo(&self, entries: &[PairMemoEntry]) -> Result<(), StoreError> {
        self.saved().memo = entries.to_vec();
        Ok(())
    }

    async fn save_image(&self, name: &ElementName, image: &ElementImage) -> Result<(), StoreError> {
        self.saved().images.insert(name.clone(), image.clone());
        Ok(())
    }

    async fn load_image(&self, name: &ElementName) -> Result<Option<ElementImage>, StoreError> {
        Ok(self.saved().images.get(name).cloned())
    }

    async fn has_image(&self, name: &ElementName) -> Result<bool, StoreError> {
        Ok(self.saved().images.contains_key(name))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut saved = self.saved();
        saved.names.clear();
        saved.memo.clear();
        saved.images.clear();
        Ok(())
    }

    async fn load_credential(&self) -> Result<Option<String>, StoreError> {
        Ok(self.saved().credential.clone())
    }

    async fn save_credential(&self, credential: &str) -> Result<(), StoreError> {
        self.saved().credential = Some(credential.to_string());
        Ok(())
    }
}
