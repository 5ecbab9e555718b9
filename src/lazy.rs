use crate::config::LoadDelay;
use crate::data::Photo;
use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;

/// Transparent 1x1 gif shown until a card's real image is swapped in.
pub const PLACEHOLDER_SRC: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

pub trait VisibilityObserver {
    fn observe(&self, id: &str);
    fn unobserve(&self, id: &str);
    fn disconnect(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePhase {
    /// Showing the placeholder, waiting to become visible.
    Observed,
    /// Became visible, the simulated network delay is running.
    Waiting,
    /// Real source in place. No longer observed.
    Swapped,
}

#[derive(Debug, Clone, Default)]
pub struct LazyImageLoader {
    delay: LoadDelay,
    phases: HashMap<String, ImagePhase>,
}

impl LazyImageLoader {
    pub fn new(delay: LoadDelay) -> Self {
        Self {
            delay,
            phases: HashMap::new(),
        }
    }

    pub fn phase(&self, id: &str) -> Option<ImagePhase> {
        self.phases.get(id).copied()
    }

    /// Starts observing a card. Cards that were already tracked keep their
    /// phase, so re-rendering never resets a swap.
    pub fn track(&mut self, id: &str, observer: &impl VisibilityObserver) {
        if self.phases.contains_key(id) {
            return;
        }
        self.phases.insert(id.to_owned(), ImagePhase::Observed);
        observer.observe(id);
    }

    /// Handles a visibility notification. Returns the delay to wait before
    /// calling [`swap`](Self::swap), only for the first time a card shows up.
    pub fn on_visibility(
        &mut self,
        id: &str,
        intersecting: bool,
        rng: &mut impl Rng,
    ) -> Option<Duration> {
        if !intersecting {
            return None;
        }
        let phase = self.phases.get_mut(id)?;
        if *phase != ImagePhase::Observed {
            return None;
        }
        *phase = ImagePhase::Waiting;
        Some(self.delay.sample(rng))
    }

    /// Swaps in the real source once the delay has elapsed and stops
    /// observing the card. A photo without any image reference has nothing
    /// to load, so it is marked loaded on the spot.
    pub fn swap(&mut self, photo: &mut Photo, observer: &impl VisibilityObserver) -> bool {
        match self.phases.get_mut(&photo.id) {
            Some(phase) if *phase == ImagePhase::Waiting => {
                *phase = ImagePhase::Swapped;
                observer.unobserve(&photo.id);
            }
            _ => return false,
        }
        if photo.display_ref().is_none() {
            self.finish(photo);
        }
        true
    }

    /// Called when the real image finished loading or failed to. Either way
    /// the card counts as loaded; failures are not retried.
    pub fn finish(&self, photo: &mut Photo) -> bool {
        if photo.image_loaded || self.phase(&photo.id) != Some(ImagePhase::Swapped) {
            return false;
        }
        photo.image_loaded = true;
        true
    }

    pub fn source<'a>(&self, photo: &'a Photo) -> &'a str {
        match self.phase(&photo.id) {
            Some(ImagePhase::Swapped) => photo.display_ref().unwrap_or(PLACEHOLDER_SRC),
            _ => PLACEHOLDER_SRC,
        }
    }

    /// Drops every subscription. Pending timers may still fire; their swaps
    /// then find nothing to do.
    pub fn teardown(&mut self, observer: &impl VisibilityObserver) {
        observer.disconnect();
        self.phases.clear();
    }
}
