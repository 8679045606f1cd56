//! Market book state with JSON persistence

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::config::MarketConfig;
use super::errors::MarketResult;
use super::types::Listing;

/// Persistent market book: every active listing plus the id counter
///
/// Ids are issued by `next_id` and never reused, even after a listing is
/// bought and deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketBook {
    /// Active listings keyed by item id
    #[serde(default)]
    pub items: BTreeMap<u64, Listing>,

    /// Next id to issue; strictly greater than every id ever issued
    #[serde(default = "default_next_id")]
    pub next_id: u64,
}

fn default_next_id() -> u64 {
    1
}

impl MarketBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: default_next_id(),
        }
    }

    /// Issue the next item id
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Whether the user already has an active listing from this group
    pub fn has_listing_by(&self, group_id: &str, user_id: &str) -> bool {
        self.items
            .values()
            .any(|item| item.is_owned_by(group_id, user_id))
    }

    pub fn get(&self, item_id: u64) -> Option<&Listing> {
        self.items.get(&item_id)
    }

    pub fn insert(&mut self, item_id: u64, listing: Listing) {
        self.items.insert(item_id, listing);
    }

    pub fn remove(&mut self, item_id: u64) -> Option<Listing> {
        self.items.remove(&item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Load the book from a file
    pub fn load_from_file(path: impl AsRef<Path>) -> MarketResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let book: Self = serde_json::from_str(&content)?;
        Ok(book)
    }

    /// Save the book atomically (write to temp, then rename), creating any
    /// missing parent directory
    pub fn save_to_file_atomic(&self, path: impl AsRef<Path>) -> MarketResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = path.with_extension("tmp");
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, path)?;

        Ok(())
    }
}

impl Default for MarketBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle over the market book
///
/// Mutating operations hold the write guard for their whole
/// check-then-mutate-then-persist span, so list/buy/recycle cannot
/// interleave on the shared book.
pub struct StateManager {
    book: Arc<RwLock<MarketBook>>,
    save_path: Option<PathBuf>,
}

impl StateManager {
    pub fn new(book: MarketBook, save_path: Option<PathBuf>) -> Self {
        Self {
            book: Arc::new(RwLock::new(book)),
            save_path,
        }
    }

    /// Load the book from the configured file, or start empty
    ///
    /// An absent file starts an empty book; a malformed one is warn-logged
    /// and replaced with an empty book rather than treated as fatal.
    pub fn load_or_create(config: &MarketConfig) -> Self {
        let book = if let Some(path) = &config.state_file {
            if path.exists() {
                match MarketBook::load_from_file(path) {
                    Ok(book) => {
                        info!(
                            "Loaded market book: {} listings, next_id={}",
                            book.len(),
                            book.next_id
                        );
                        book
                    }
                    Err(e) => {
                        warn!("Failed to load market book: {}, starting empty", e);
                        MarketBook::new()
                    }
                }
            } else {
                info!("No existing market book at {:?}, starting empty", path);
                MarketBook::new()
            }
        } else {
            MarketBook::new()
        };

        Self::new(book, config.state_file.clone())
    }

    /// Get read access to the book
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, MarketBook> {
        self.book.read().await
    }

    /// Get write access to the book
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, MarketBook> {
        self.book.write().await
    }

    /// Persist best-effort: a failed save is logged and swallowed, the
    /// in-memory book stands
    pub fn persist(&self, book: &MarketBook) {
        if let Some(path) = &self.save_path {
            if let Err(e) = book.save_to_file_atomic(path) {
                error!("Failed to save market book to {:?}: {}", path, e);
            }
        }
    }
}
