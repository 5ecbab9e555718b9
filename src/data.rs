use gloo_net::http::Request;
use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use thiserror::Error;

pub const DEFAULT_LIKES: Range<u32> = 50..350;
pub const DEFAULT_DISLIKES: Range<u32> = 0..60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionStatus {
    #[default]
    None,
    Liked,
    Disliked,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub name: String,
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub id: String,
    pub name: String,
    pub date: String,
    pub thumbnail: String,
    pub full: String,
    pub author: Author,
    pub likes: u32,
    pub dislikes: u32,
    pub status: ReactionStatus,
    pub image_loaded: bool,
}

impl Photo {
    /// Best image reference for display: thumbnail, else full.
    pub fn display_ref(&self) -> Option<&str> {
        [self.thumbnail.as_str(), self.full.as_str()]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
    }

    /// Best image reference for sharing: full, else thumbnail.
    pub fn share_ref(&self) -> Option<&str> {
        [self.full.as_str(), self.thumbnail.as_str()]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
    }

    /// Share of likes among all reactions, rounded to a whole percent.
    pub fn approval_percent(&self) -> u32 {
        let total = self.likes as u64 + self.dislikes as u64;
        if total == 0 {
            return 0;
        }
        ((self.likes as u64 * 100 + total / 2) / total) as u32
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed catalog: {0}")]
    Parse(String),
    #[error("catalog does not contain any photos")]
    Empty,
}

impl DataError {
    fn network<E: std::fmt::Display>(err: E) -> Self {
        Self::Network(err.to_string())
    }

    fn parse<E: std::fmt::Display>(err: E) -> Self {
        Self::Parse(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCatalog {
    Wrapped { photos: Vec<RawPhoto> },
    Bare(Vec<RawPhoto>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPhoto {
    id: String,
    name: String,
    date: String,
    thumbnail: String,
    full: String,
    author: Option<Author>,
    likes: Option<u32>,
    dislikes: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Floof {
    image: String,
    link: String,
}

pub async fn fetch_catalog(url: &str, rng: &mut impl Rng) -> Result<Vec<Photo>, DataError> {
    let text = fetch_text(url).await?;
    parse_catalog(&text, rng)
}

/// Fetches one random fox and turns it into a fresh photo with a new id.
pub async fn fetch_random_fox(url: &str, rng: &mut impl Rng) -> Result<Photo, DataError> {
    let text = fetch_text(url).await?;
    let floof: Floof = serde_json::from_str(&text).map_err(DataError::parse)?;
    if floof.image.is_empty() {
        return Err(DataError::Parse("fox response has no image".to_owned()));
    }
    Ok(fox_photo(floof, rng))
}

async fn fetch_text(url: &str) -> Result<String, DataError> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(DataError::network)?;

    if !response.ok() {
        return Err(DataError::Network(format!(
            "HTTP {} while fetching {}",
            response.status(),
            url
        )));
    }

    response.text().await.map_err(DataError::network)
}

pub fn parse_catalog(text: &str, rng: &mut impl Rng) -> Result<Vec<Photo>, DataError> {
    let raw = match serde_json::from_str::<RawCatalog>(text).map_err(DataError::parse)? {
        RawCatalog::Wrapped { photos } => photos,
        RawCatalog::Bare(photos) => photos,
    };

    let mut seen = HashSet::new();
    let mut photos = Vec::with_capacity(raw.len());

    for (index, entry) in raw.into_iter().enumerate() {
        let id = entry.id.trim().to_owned();
        if id.is_empty() {
            warn!("Skipping catalog entry {} without an id", index);
            continue;
        }
        if !seen.insert(id.clone()) {
            warn!("Skipping duplicate catalog id '{}'", id);
            continue;
        }

        let name = if entry.name.trim().is_empty() {
            display_name(&id)
        } else {
            entry.name
        };

        photos.push(Photo {
            name,
            date: entry.date,
            thumbnail: entry.thumbnail,
            full: entry.full,
            author: entry.author.unwrap_or_default(),
            likes: entry
                .likes
                .unwrap_or_else(|| rng.gen_range(DEFAULT_LIKES)),
            dislikes: entry
                .dislikes
                .unwrap_or_else(|| rng.gen_range(DEFAULT_DISLIKES)),
            status: ReactionStatus::None,
            image_loaded: false,
            id,
        });
    }

    if photos.is_empty() {
        return Err(DataError::Empty);
    }

    Ok(photos)
}

fn fox_photo(floof: Floof, rng: &mut impl Rng) -> Photo {
    let id = format!("fox-{:016x}", rng.gen::<u64>());
    Photo {
        name: display_name(floof.image.rsplit('/').next().unwrap_or("fox")),
        date: String::new(),
        thumbnail: floof.image.clone(),
        full: floof.image,
        author: Author {
            name: "randomfox.ca".to_owned(),
            channel: floof.link,
        },
        likes: rng.gen_range(DEFAULT_LIKES),
        dislikes: rng.gen_range(DEFAULT_DISLIKES),
        status: ReactionStatus::None,
        image_loaded: false,
        id,
    }
}

fn display_name(id: &str) -> String {
    let stem = id.split('.').next().unwrap_or(id);
    stem.split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>()
                    + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
