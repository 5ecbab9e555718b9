use log::warn;
use serde::Deserialize;
use std::ops::Range;
use std::time::Duration;

pub const CATALOG_URL: &str = "assets/photos.json";
pub const FOX_URL: &str = "https://randomfox.ca/floof/";
pub const CONFIG_ELEMENT_ID: &str = "swipe-fox-config";

const PRELOAD_MARGIN_PX: u32 = 200;
const LOAD_DELAY_MIN_MS: u64 = 200;
const LOAD_DELAY_MAX_MS: u64 = 800;
const CARD_WIDTH_PX: f64 = 280.0;
const TOAST_MS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for LoadDelay {
    fn default() -> Self {
        Self {
            min_ms: LOAD_DELAY_MIN_MS,
            max_ms: LOAD_DELAY_MAX_MS,
        }
    }
}

impl LoadDelay {
    /// Half-open range of milliseconds to sample from. An inverted or empty
    /// range collapses to `min_ms`.
    pub fn range(&self) -> Range<u64> {
        if self.max_ms > self.min_ms {
            self.min_ms..self.max_ms
        } else {
            self.min_ms..self.min_ms + 1
        }
    }

    pub fn sample(&self, rng: &mut impl rand::Rng) -> Duration {
        Duration::from_millis(rng.gen_range(self.range()))
    }
}

/// Timer length for a sampled delay. Browser timers take `u32`
/// milliseconds, so longer delays are capped instead of wrapping.
pub fn timer_millis(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis()).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub catalog_url: String,
    pub fox_url: String,
    pub preload_margin_px: u32,
    pub load_delay_ms: LoadDelay,
    pub card_width_px: f64,
    pub toast_ms: u32,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            catalog_url: CATALOG_URL.to_owned(),
            fox_url: FOX_URL.to_owned(),
            preload_margin_px: PRELOAD_MARGIN_PX,
            load_delay_ms: LoadDelay::default(),
            card_width_px: CARD_WIDTH_PX,
            toast_ms: TOAST_MS,
        }
    }
}

impl WidgetConfig {
    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<WidgetConfig>(text) {
            Ok(config) => config,
            Err(err) => {
                warn!("Ignoring malformed widget config: {}", err);
                WidgetConfig::default()
            }
        }
    }

    pub fn root_margin(&self) -> String {
        format!("{}px", self.preload_margin_px)
    }
}

/// Reads the optional JSON override embedded in the host page.
pub fn load_config() -> WidgetConfig {
    let text = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|element| element.text_content());

    match text {
        Some(text) if !text.trim().is_empty() => WidgetConfig::from_json(&text),
        _ => WidgetConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn partial_override_keeps_defaults() {
        let config = WidgetConfig::from_json(r#"{"preload_margin_px": 50}"#);
        assert_eq!(config.preload_margin_px, 50);
        assert_eq!(config.catalog_url, CATALOG_URL);
        assert_eq!(config.root_margin(), "50px");
    }

    #[test]
    fn malformed_config_falls_back() {
        assert_eq!(WidgetConfig::from_json("{not json"), WidgetConfig::default());
    }

    #[test]
    fn delay_sample_stays_in_bounds() {
        let delay = LoadDelay {
            min_ms: 10,
            max_ms: 20,
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let sampled = delay.sample(&mut rng).as_millis() as u64;
            assert!((10..20).contains(&sampled));
        }
    }

    #[test]
    fn inverted_delay_collapses_to_min() {
        let delay = LoadDelay {
            min_ms: 30,
            max_ms: 5,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(delay.sample(&mut rng), Duration::from_millis(30));
    }

    #[test]
    fn oversized_delay_caps_the_timer() {
        assert_eq!(timer_millis(Duration::from_millis(450)), 450);

        let config = WidgetConfig::from_json(
            r#"{"load_delay_ms": {"min_ms": 5000000000, "max_ms": 5000000001}}"#,
        );
        let mut rng = StdRng::seed_from_u64(3);
        let delay = config.load_delay_ms.sample(&mut rng);
        assert_eq!(timer_millis(delay), u32::MAX);
    }
}
