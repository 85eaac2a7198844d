use crate::core::io::Storage;
use crate::core::model::Carousel;
use anyhow::Result;
use log::{error, info, warn};

pub const LIBRARY_SLOT: &str = "carousel_library.json";

/// Ordered collection of saved carousel snapshots, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    entries: Vec<Carousel>,
}

impl Library {
    pub fn new(entries: Vec<Carousel>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Carousel] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Carousel> {
        self.entries.iter().find(|c| c.id == id)
    }

    /// Replaces the entry with the same id in place, otherwise prepends.
    pub fn save(&mut self, carousel: Carousel) {
        match self.entries.iter_mut().find(|c| c.id == carousel.id) {
            Some(existing) => *existing = carousel,
            None => self.entries.insert(0, carousel),
        }
    }

    /// Returns whether an entry was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|c| c.id != id);
        self.entries.len() != before
    }

    /// Corrupt or unreadable content is logged and treated as an empty library.
    pub async fn load(storage: &dyn Storage, slot: &str) -> Self {
        let exists = match storage.exists(slot).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Could not probe library slot {}: {}", slot, e);
                false
            }
        };
        if !exists {
            return Self::default();
        }

        let bytes = match storage.read(slot).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to read library: {}", e);
                return Self::default();
            }
        };

        match serde_json::from_slice::<Vec<Carousel>>(&bytes) {
            Ok(entries) => {
                info!("Loaded {} carousel(s) from library", entries.len());
                Self { entries }
            }
            Err(e) => {
                error!("Library content is corrupt, starting empty: {}", e);
                Self::default()
            }
        }
    }

    pub async fn persist(&self, storage: &dyn Storage, slot: &str) -> Result<()> {
        let content = serde_json::to_vec(&self.entries)?;
        storage.write(slot, &content).await
    }
}
