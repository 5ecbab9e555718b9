const MIN_SCALE_FACTOR: f64 = 0.5;
const MIN_OPACITY: f64 = 0.3;

/// Horizontal extent of one card in scroll-content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardBox {
    pub left: f64,
    pub width: f64,
}

impl CardBox {
    pub fn center(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_left: f64,
    pub viewport_width: f64,
}

impl ScrollMetrics {
    pub fn center(&self) -> f64 {
        self.scroll_left + self.viewport_width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardEmphasis {
    pub scale: f64,
    pub opacity: f64,
    pub centered: bool,
}

impl Default for CardEmphasis {
    fn default() -> Self {
        Self {
            scale: 1.0,
            opacity: 1.0,
            centered: false,
        }
    }
}

impl CardEmphasis {
    pub fn style(&self) -> String {
        format!(
            "transform: scale({:.3}); opacity: {:.3};",
            self.scale, self.opacity
        )
    }
}

pub trait ViewportSurface {
    fn scroll_metrics(&self) -> ScrollMetrics;
    fn card_boxes(&self) -> Vec<CardBox>;
    fn scroll_to(&self, scroll_left: f64, smooth: bool);
}

/// Distance of `card` from the viewport center, normalized by half the
/// viewport width and clamped to `[0, 1]`.
pub fn normalized_distance(card: &CardBox, metrics: &ScrollMetrics) -> f64 {
    let distance = (card.center() - metrics.center()).abs();
    let half = metrics.viewport_width / 2.0;
    if half <= 0.0 {
        return if distance == 0.0 { 0.0 } else { 1.0 };
    }
    (distance / half).clamp(0.0, 1.0)
}

/// Index of the card whose center is closest to the viewport center. Ties go
/// to the leftmost card.
pub fn centered_index(cards: &[CardBox], metrics: &ScrollMetrics) -> Option<usize> {
    let center = metrics.center();
    let mut best: Option<(usize, f64)> = None;
    for (index, card) in cards.iter().enumerate() {
        let distance = (card.center() - center).abs();
        match best {
            Some((_, closest)) if distance >= closest => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

pub fn emphasis(cards: &[CardBox], metrics: &ScrollMetrics) -> Vec<CardEmphasis> {
    let centered = centered_index(cards, metrics);
    cards
        .iter()
        .enumerate()
        .map(|(index, card)| {
            let scale = 1.0 - MIN_SCALE_FACTOR * normalized_distance(card, metrics);
            CardEmphasis {
                scale,
                opacity: MIN_OPACITY + (1.0 - MIN_OPACITY) * scale,
                centered: centered == Some(index),
            }
        })
        .collect()
}

/// Width of the leading and trailing spacers that let the first and last
/// cards reach the exact center.
pub fn edge_spacer(viewport_width: f64, card_width: f64) -> f64 {
    (viewport_width / 2.0 - card_width / 2.0).max(0.0)
}

/// Scroll offset that puts the center of `card` at the viewport center.
pub fn scroll_target(card: &CardBox, viewport_width: f64) -> f64 {
    (card.center() - viewport_width / 2.0).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Previous,
    Next,
}

impl NavKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(NavKey::Previous),
            "ArrowRight" => Some(NavKey::Next),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CenteringEngine {
    current_index: usize,
    emphasis: Vec<CardEmphasis>,
}

impl CenteringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn card_count(&self) -> usize {
        self.emphasis.len()
    }

    pub fn emphasis_for(&self, index: usize) -> CardEmphasis {
        self.emphasis.get(index).copied().unwrap_or_default()
    }

    /// Recomputes emphasis and the current card from the surface. Runs on
    /// every scroll event.
    pub fn refresh(&mut self, surface: &impl ViewportSurface) -> usize {
        let metrics = surface.scroll_metrics();
        let cards = surface.card_boxes();
        self.emphasis = emphasis(&cards, &metrics);
        if let Some(index) = centered_index(&cards, &metrics) {
            self.current_index = index;
        } else {
            self.current_index = 0;
        }
        self.current_index
    }

    /// Resize handler: recomputes emphasis and returns the edge spacer width
    /// for the new viewport.
    pub fn resize(&mut self, surface: &impl ViewportSurface, card_width: f64) -> f64 {
        self.refresh(surface);
        edge_spacer(surface.scroll_metrics().viewport_width, card_width)
    }

    pub fn next(&mut self, surface: &impl ViewportSurface) -> usize {
        let target = self.current_index.saturating_add(1);
        self.go_to(target, surface)
    }

    pub fn previous(&mut self, surface: &impl ViewportSurface) -> usize {
        let target = self.current_index.saturating_sub(1);
        self.go_to(target, surface)
    }

    /// Makes `index` current (clamped to the card range) and asks the
    /// surface to smooth-scroll it to the center.
    pub fn go_to(&mut self, index: usize, surface: &impl ViewportSurface) -> usize {
        let cards = surface.card_boxes();
        if cards.is_empty() {
            self.current_index = 0;
            return 0;
        }
        let target = index.min(cards.len() - 1);
        self.current_index = target;
        let metrics = surface.scroll_metrics();
        surface.scroll_to(scroll_target(&cards[target], metrics.viewport_width), true);
        target
    }

    /// Arrow-key navigation. Ignored entirely while an overlay is open.
    pub fn handle_key(
        &mut self,
        key: &str,
        overlay_open: bool,
        surface: &impl ViewportSurface,
    ) -> Option<usize> {
        if overlay_open {
            return None;
        }
        match NavKey::from_key(key)? {
            NavKey::Previous => Some(self.previous(surface)),
            NavKey::Next => Some(self.next(surface)),
        }
    }
}
