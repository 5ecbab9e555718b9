use crate::data::{Author, Photo, ReactionStatus};
use gloo_storage::{LocalStorage, Storage};
use log::warn;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

pub const STATUSES_KEY: &str = "tinder-statuses";
pub const COUNTS_KEY: &str = "tinder-photos";
pub const FOXES_KEY: &str = "tinderfox-foxes";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to serialize reactions: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String-keyed, string-valued persistent store.
pub trait BlobStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Browser `localStorage`, scoped to the page origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBlobStore;

impl BlobStore for LocalBlobStore {
    fn read(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| StoreError::Unavailable(format!("{:?}", err)))
    }
}

/// In-memory store. Clones share the same contents, so a clone handed to a
/// second `ReactionStore` behaves like the same origin after a reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub likes: u32,
    pub dislikes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCounts {
    id: String,
    likes: u32,
    dislikes: u32,
}

/// A photo added after the catalog load, kept so it can be re-appended on
/// the next visit. Counts and status live under the other two keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFox {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    full: String,
    #[serde(default)]
    author: Author,
    #[serde(default)]
    likes: u32,
    #[serde(default)]
    dislikes: u32,
}

impl From<&Photo> for StoredFox {
    fn from(photo: &Photo) -> Self {
        Self {
            id: photo.id.clone(),
            name: photo.name.clone(),
            date: photo.date.clone(),
            thumbnail: photo.thumbnail.clone(),
            full: photo.full.clone(),
            author: photo.author.clone(),
            likes: photo.likes,
            dislikes: photo.dislikes,
        }
    }
}

impl From<StoredFox> for Photo {
    fn from(fox: StoredFox) -> Self {
        Photo {
            id: fox.id,
            name: fox.name,
            date: fox.date,
            thumbnail: fox.thumbnail,
            full: fox.full,
            author: fox.author,
            likes: fox.likes,
            dislikes: fox.dislikes,
            status: ReactionStatus::None,
            image_loaded: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredReactions {
    pub counts: HashMap<String, Counts>,
    pub statuses: HashMap<String, ReactionStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct ReactionStore<S> {
    blobs: S,
}

impl<S: BlobStore> ReactionStore<S> {
    pub fn new(blobs: S) -> Self {
        Self { blobs }
    }

    pub fn load(&self) -> StoredReactions {
        StoredReactions {
            counts: self.load_counts(),
            statuses: self.load_statuses(),
        }
    }

    pub fn save(&self, photos: &[Photo]) -> Result<(), StoreError> {
        let counts: Vec<StoredCounts> = photos
            .iter()
            .map(|photo| StoredCounts {
                id: photo.id.clone(),
                likes: photo.likes,
                dislikes: photo.dislikes,
            })
            .collect();
        let statuses: HashMap<&str, ReactionStatus> = photos
            .iter()
            .filter(|photo| photo.status != ReactionStatus::None)
            .map(|photo| (photo.id.as_str(), photo.status))
            .collect();

        self.blobs
            .write(COUNTS_KEY, &serde_json::to_string(&counts)?)?;
        self.blobs
            .write(STATUSES_KEY, &serde_json::to_string(&statuses)?)?;
        Ok(())
    }

    /// Photos appended after the catalog load, in the order they were added.
    pub fn load_appended(&self) -> Vec<Photo> {
        let Some(text) = self.blobs.read(FOXES_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<StoredFox>>(&text) {
            Ok(foxes) => foxes
                .into_iter()
                .filter(|fox| !fox.id.is_empty())
                .map(Photo::from)
                .collect(),
            Err(err) => {
                warn!("Ignoring malformed '{}' entry: {}", FOXES_KEY, err);
                Vec::new()
            }
        }
    }

    pub fn save_appended<'a>(
        &self,
        photos: impl IntoIterator<Item = &'a Photo>,
    ) -> Result<(), StoreError> {
        let foxes: Vec<StoredFox> = photos.into_iter().map(StoredFox::from).collect();
        self.blobs
            .write(FOXES_KEY, &serde_json::to_string(&foxes)?)
    }

    fn load_counts(&self) -> HashMap<String, Counts> {
        let Some(text) = self.blobs.read(COUNTS_KEY) else {
            return HashMap::new();
        };
        match serde_json::from_str::<Vec<StoredCounts>>(&text) {
            Ok(entries) => entries
                .into_iter()
                .map(|entry| {
                    (
                        entry.id,
                        Counts {
                            likes: entry.likes,
                            dislikes: entry.dislikes,
                        },
                    )
                })
                .collect(),
            Err(err) => {
                warn!("Ignoring malformed '{}' entry: {}", COUNTS_KEY, err);
                HashMap::new()
            }
        }
    }

    fn load_statuses(&self) -> HashMap<String, ReactionStatus> {
        let Some(text) = self.blobs.read(STATUSES_KEY) else {
            return HashMap::new();
        };
        match serde_json::from_str::<HashMap<String, ReactionStatus>>(&text) {
            Ok(statuses) => statuses,
            Err(err) => {
                warn!("Ignoring malformed '{}' entry: {}", STATUSES_KEY, err);
                HashMap::new()
            }
        }
    }
}

/// Overlays persisted counts and statuses onto freshly loaded photos.
/// Entries for ids that are not in `photos` are ignored.
pub fn merge_stored(photos: &mut [Photo], stored: &StoredReactions) {
    for photo in photos.iter_mut() {
        if let Some(counts) = stored.counts.get(&photo.id) {
            photo.likes = counts.likes;
            photo.dislikes = counts.dislikes;
        }
        photo.status = stored
            .statuses
            .get(&photo.id)
            .copied()
            .unwrap_or(ReactionStatus::None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Author;

    fn photo(id: &str, likes: u32, dislikes: u32, status: ReactionStatus) -> Photo {
        Photo {
            id: id.to_owned(),
            name: id.to_owned(),
            date: String::new(),
            thumbnail: String::new(),
            full: String::new(),
            author: Author::default(),
            likes,
            dislikes,
            status,
            image_loaded: false,
        }
    }

    #[test]
    fn empty_store_loads_empty_maps() {
        let store = ReactionStore::new(MemoryBlobStore::new());
        assert_eq!(store.load(), StoredReactions::default());
    }

    #[test]
    fn malformed_blobs_are_treated_as_absent() {
        let blobs = MemoryBlobStore::new();
        blobs.write(COUNTS_KEY, "{broken").unwrap();
        blobs.write(STATUSES_KEY, "[1, 2]").unwrap();

        let stored = ReactionStore::new(blobs).load();
        assert!(stored.counts.is_empty());
        assert!(stored.statuses.is_empty());
    }

    #[test]
    fn save_writes_counts_for_all_and_statuses_for_reacted() {
        let blobs = MemoryBlobStore::new();
        let store = ReactionStore::new(blobs.clone());
        let photos = vec![
            photo("a", 5, 1, ReactionStatus::Liked),
            photo("b", 2, 0, ReactionStatus::None),
        ];
        store.save(&photos).unwrap();

        let counts: Vec<serde_json::Value> =
            serde_json::from_str(&blobs.read(COUNTS_KEY).unwrap()).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0]["id"], "a");
        assert_eq!(counts[0]["likes"], 5);

        let statuses: HashMap<String, String> =
            serde_json::from_str(&blobs.read(STATUSES_KEY).unwrap()).unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses["a"], "liked");
    }

    #[test]
    fn merge_applies_known_ids_and_ignores_unknown() {
        let blobs = MemoryBlobStore::new();
        let store = ReactionStore::new(blobs);
        store
            .save(&[
                photo("a", 9, 4, ReactionStatus::Disliked),
                photo("gone", 1, 1, ReactionStatus::Liked),
            ])
            .unwrap();

        let mut fresh = vec![
            photo("a", 100, 10, ReactionStatus::None),
            photo("c", 7, 7, ReactionStatus::None),
        ];
        merge_stored(&mut fresh, &store.load());

        assert_eq!((fresh[0].likes, fresh[0].dislikes), (9, 4));
        assert_eq!(fresh[0].status, ReactionStatus::Disliked);
        assert_eq!((fresh[1].likes, fresh[1].dislikes), (7, 7));
        assert_eq!(fresh[1].status, ReactionStatus::None);
    }

    #[test]
    fn later_save_overwrites_earlier_state() {
        let blobs = MemoryBlobStore::new();
        let store = ReactionStore::new(blobs.clone());
        store
            .save(&[photo("a", 1, 0, ReactionStatus::Liked)])
            .unwrap();
        store
            .save(&[photo("a", 0, 0, ReactionStatus::None)])
            .unwrap();

        let stored = ReactionStore::new(blobs).load();
        assert!(stored.statuses.is_empty());
        assert_eq!(
            stored.counts["a"],
            Counts {
                likes: 0,
                dislikes: 0
            }
        );
    }

    #[test]
    fn appended_photos_keep_their_refs_and_drop_bad_entries() {
        let blobs = MemoryBlobStore::new();
        let store = ReactionStore::new(blobs.clone());
        let mut fox = photo("fox-1", 4, 2, ReactionStatus::Liked);
        fox.full = "https://randomfox.ca/images/1.jpg".to_owned();
        fox.author.channel = "https://randomfox.ca/?i=1".to_owned();
        store.save_appended([&fox]).unwrap();

        let restored = store.load_appended();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].full, fox.full);
        assert_eq!(restored[0].author, fox.author);
        assert_eq!(restored[0].status, ReactionStatus::None);

        blobs
            .write(FOXES_KEY, r#"[{"id": ""}, {"id": "fox-2"}]"#)
            .unwrap();
        let ids: Vec<_> = store.load_appended().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["fox-2".to_owned()]);

        blobs.write(FOXES_KEY, "{broken").unwrap();
        assert!(store.load_appended().is_empty());
    }
}
