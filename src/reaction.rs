use crate::data::{Photo, ReactionStatus};
use crate::storage::{merge_stored, BlobStore, ReactionStore};
use log::{debug, warn};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Liked,
    Disliked,
}

impl Reaction {
    pub fn status(self) -> ReactionStatus {
        match self {
            Reaction::Liked => ReactionStatus::Liked,
            Reaction::Disliked => ReactionStatus::Disliked,
        }
    }
}

/// Applies one reaction to `photo`.
///
/// Repeating the current reaction undoes it. Switching reactions first
/// reverses the previous counter, so at most one counter ever carries the
/// user's vote. Counters never drop below zero.
pub fn apply(photo: &mut Photo, reaction: Reaction) {
    let target = reaction.status();

    if photo.status == target {
        retract(photo, target);
        photo.status = ReactionStatus::None;
        return;
    }

    let previous = photo.status;
    retract(photo, previous);
    match reaction {
        Reaction::Liked => photo.likes = photo.likes.saturating_add(1),
        Reaction::Disliked => photo.dislikes = photo.dislikes.saturating_add(1),
    }
    photo.status = target;
}

fn retract(photo: &mut Photo, status: ReactionStatus) {
    match status {
        ReactionStatus::Liked => photo.likes = photo.likes.saturating_sub(1),
        ReactionStatus::Disliked => photo.dislikes = photo.dislikes.saturating_sub(1),
        ReactionStatus::None => {}
    }
}

/// The session's photo list together with the store it is persisted to.
#[derive(Debug)]
pub struct Reactions<S> {
    photos: Vec<Photo>,
    appended: HashSet<String>,
    store: ReactionStore<S>,
}

impl<S: BlobStore> Reactions<S> {
    pub fn new(store: ReactionStore<S>) -> Self {
        Self {
            photos: Vec::new(),
            appended: HashSet::new(),
            store,
        }
    }

    /// Replaces the photo list with a freshly loaded catalog, re-appending
    /// photos added on earlier visits and restoring any persisted counts and
    /// statuses.
    pub fn load(&mut self, mut photos: Vec<Photo>) {
        self.appended.clear();
        for photo in self.store.load_appended() {
            if photos.iter().any(|existing| existing.id == photo.id) {
                continue;
            }
            self.appended.insert(photo.id.clone());
            photos.push(photo);
        }

        let stored = self.store.load();
        merge_stored(&mut photos, &stored);
        debug!(
            "Loaded {} photos, {} with a saved reaction",
            photos.len(),
            photos
                .iter()
                .filter(|photo| photo.status != ReactionStatus::None)
                .count()
        );
        self.photos = photos;
    }

    /// Adds a photo that arrived after the initial load and persists it so
    /// the next visit shows it again. Photos whose id is already present are
    /// ignored.
    pub fn append(&mut self, photo: Photo) -> bool {
        if self.photos.iter().any(|existing| existing.id == photo.id) {
            return false;
        }
        self.appended.insert(photo.id.clone());
        self.photos.push(photo);

        let appended = self
            .photos
            .iter()
            .filter(|photo| self.appended.contains(&photo.id));
        if let Err(err) = self.store.save_appended(appended) {
            warn!("Failed to persist appended photo: {}", err);
        }
        true
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn get(&self, id: &str) -> Option<&Photo> {
        self.photos.iter().find(|photo| photo.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Photo> {
        self.photos.iter_mut().find(|photo| photo.id == id)
    }

    /// Applies `reaction` to the photo with `id` and persists the whole list
    /// before returning.
    pub fn react(&mut self, id: &str, reaction: Reaction) -> Option<&Photo> {
        let index = self.photos.iter().position(|photo| photo.id == id)?;
        apply(&mut self.photos[index], reaction);

        if let Err(err) = self.store.save(&self.photos) {
            warn!("Failed to persist reactions: {}", err);
        }

        self.photos.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Author;
    use crate::storage::MemoryBlobStore;

    fn photo(id: &str, likes: u32, dislikes: u32) -> Photo {
        Photo {
            id: id.to_owned(),
            name: id.to_owned(),
            date: String::new(),
            thumbnail: format!("{id}-thumb.jpg"),
            full: format!("{id}.jpg"),
            author: Author::default(),
            likes,
            dislikes,
            status: ReactionStatus::None,
            image_loaded: false,
        }
    }

    fn snapshot(photo: &Photo) -> (u32, u32, ReactionStatus) {
        (photo.likes, photo.dislikes, photo.status)
    }

    #[test]
    fn like_undo_dislike_scenario() {
        let mut f1 = photo("f1", 100, 10);

        apply(&mut f1, Reaction::Liked);
        assert_eq!(snapshot(&f1), (101, 10, ReactionStatus::Liked));

        apply(&mut f1, Reaction::Liked);
        assert_eq!(snapshot(&f1), (100, 10, ReactionStatus::None));

        apply(&mut f1, Reaction::Disliked);
        assert_eq!(snapshot(&f1), (100, 11, ReactionStatus::Disliked));
    }

    #[test]
    fn switching_moves_the_vote() {
        let mut p = photo("p", 20, 5);
        apply(&mut p, Reaction::Liked);
        apply(&mut p, Reaction::Disliked);
        assert_eq!(snapshot(&p), (20, 6, ReactionStatus::Disliked));

        apply(&mut p, Reaction::Liked);
        assert_eq!(snapshot(&p), (21, 5, ReactionStatus::Liked));
    }

    #[test]
    fn counters_never_go_negative() {
        let mut p = photo("p", 0, 0);
        p.status = ReactionStatus::Liked;
        apply(&mut p, Reaction::Liked);
        assert_eq!(snapshot(&p), (0, 0, ReactionStatus::None));

        p.status = ReactionStatus::Disliked;
        apply(&mut p, Reaction::Liked);
        assert_eq!(snapshot(&p), (1, 0, ReactionStatus::Liked));
    }

    #[test]
    fn vote_is_attributed_at_most_once_for_any_sequence() {
        let actions = [Reaction::Liked, Reaction::Disliked];
        // Every sequence of up to six actions.
        for len in 0..=6u32 {
            for mask in 0..(1u32 << len) {
                let mut p = photo("p", 50, 50);
                for step in 0..len {
                    let action = actions[((mask >> step) & 1) as usize];
                    apply(&mut p, action);
                    let liked = p.likes as i64 - 50;
                    let disliked = p.dislikes as i64 - 50;
                    match p.status {
                        ReactionStatus::None => assert_eq!((liked, disliked), (0, 0)),
                        ReactionStatus::Liked => assert_eq!((liked, disliked), (1, 0)),
                        ReactionStatus::Disliked => assert_eq!((liked, disliked), (0, 1)),
                    }
                }
            }
        }
    }

    #[test]
    fn react_persists_and_survives_reload() {
        let blobs = MemoryBlobStore::new();
        let mut session = Reactions::new(ReactionStore::new(blobs.clone()));
        session.load(vec![photo("a", 10, 1), photo("b", 3, 3), photo("c", 0, 0)]);

        session.react("a", Reaction::Liked);
        session.react("b", Reaction::Liked);
        session.react("b", Reaction::Disliked);
        session.react("c", Reaction::Disliked);
        session.react("c", Reaction::Disliked);

        let expected: Vec<_> = session.photos().iter().map(snapshot).collect();

        let mut reloaded = Reactions::new(ReactionStore::new(blobs));
        reloaded.load(vec![photo("a", 77, 77), photo("b", 77, 77), photo("c", 77, 77)]);
        let actual: Vec<_> = reloaded.photos().iter().map(snapshot).collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn unknown_id_is_ignored() {
        let blobs = MemoryBlobStore::new();
        let mut session = Reactions::new(ReactionStore::new(blobs.clone()));
        session.load(vec![photo("a", 1, 1)]);

        assert!(session.react("missing", Reaction::Liked).is_none());
        assert!(blobs.read(crate::storage::COUNTS_KEY).is_none());
    }

    #[test]
    fn append_rejects_duplicate_ids() {
        let mut session = Reactions::new(ReactionStore::new(MemoryBlobStore::new()));
        session.load(vec![photo("a", 1, 1)]);

        assert!(session.append(photo("fox-1", 5, 5)));
        assert!(!session.append(photo("a", 0, 0)));
        assert_eq!(session.photos().len(), 2);
        assert_eq!(session.get("fox-1").map(|p| p.likes), Some(5));
    }

    #[test]
    fn appended_fox_survives_reload_with_its_reaction() {
        let blobs = MemoryBlobStore::new();
        let mut session = Reactions::new(ReactionStore::new(blobs.clone()));
        session.load(vec![photo("a", 1, 1)]);

        assert!(session.append(photo("fox-1", 5, 5)));
        session.react("fox-1", Reaction::Liked);
        session.react("a", Reaction::Disliked);

        let mut reloaded = Reactions::new(ReactionStore::new(blobs.clone()));
        reloaded.load(vec![photo("a", 40, 40)]);

        let ids: Vec<_> = reloaded.photos().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "fox-1"]);
        assert_eq!(
            reloaded.get("fox-1").map(snapshot),
            Some((6, 5, ReactionStatus::Liked))
        );
        assert_eq!(reloaded.get("fox-1").map(|p| p.full.as_str()), Some("fox-1.jpg"));
        assert_eq!(
            reloaded.get("a").map(snapshot),
            Some((1, 2, ReactionStatus::Disliked))
        );

        // A catalog that now ships the same id keeps the catalog entry only.
        let mut third = Reactions::new(ReactionStore::new(blobs));
        third.load(vec![photo("a", 0, 0), photo("fox-1", 0, 0)]);
        assert_eq!(third.photos().len(), 2);
        assert_eq!(third.get("fox-1").map(snapshot), Some((6, 5, ReactionStatus::Liked)));
    }
}
