use crate::data::Photo;
use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareData {
    pub title: String,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShareError {
    #[error("{0} is not available")]
    Unavailable(&'static str),
    #[error("share was cancelled")]
    Cancelled,
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTier {
    Clipboard,
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Copied(CopyTier),
    Failed,
}

impl ShareOutcome {
    /// Toast text for the widget. Both copy tiers read the same.
    pub fn notice(&self) -> &'static str {
        match self {
            ShareOutcome::Shared => "Shared!",
            ShareOutcome::Copied(_) => "Link copied to clipboard",
            ShareOutcome::Failed => "Could not copy the link",
        }
    }
}

/// Platform share sheet and clipboard.
#[allow(async_fn_in_trait)]
pub trait SharePlatform {
    fn can_share(&self) -> bool;
    async fn share(&self, data: &ShareData) -> Result<(), ShareError>;
    fn has_clipboard(&self) -> bool;
    async fn write_clipboard(&self, text: &str) -> Result<(), ShareError>;
    /// Off-screen text field plus the legacy copy command.
    fn legacy_copy(&self, text: &str) -> Result<(), ShareError>;
}

pub fn share_data(photo: &Photo, page_url: &str) -> ShareData {
    let url = photo.share_ref().unwrap_or(page_url).to_owned();
    let text = if photo.author.name.is_empty() {
        format!("Check out {}", photo.name)
    } else {
        format!("Check out {} by {}", photo.name, photo.author.name)
    };
    ShareData {
        title: photo.name.clone(),
        text,
        url,
    }
}

pub async fn share_photo(
    platform: &impl SharePlatform,
    photo: &Photo,
    page_url: &str,
) -> ShareOutcome {
    let data = share_data(photo, page_url);

    if platform.can_share() {
        match platform.share(&data).await {
            Ok(()) => return ShareOutcome::Shared,
            Err(ShareError::Cancelled) => info!("Share of '{}' cancelled, copying", photo.id),
            Err(err) => warn!("Share of '{}' failed, copying: {}", photo.id, err),
        }
    }

    copy_text(platform, &data.url).await
}

pub async fn copy_text(platform: &impl SharePlatform, text: &str) -> ShareOutcome {
    if platform.has_clipboard() {
        match platform.write_clipboard(text).await {
            Ok(()) => return ShareOutcome::Copied(CopyTier::Clipboard),
            Err(err) => warn!("Clipboard write failed: {}", err),
        }
    }

    match platform.legacy_copy(text) {
        Ok(()) => ShareOutcome::Copied(CopyTier::Legacy),
        Err(err) => {
            warn!("Legacy copy failed: {}", err);
            ShareOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Author, ReactionStatus};
    use futures::executor::block_on;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakePlatform {
        share: Option<Result<(), ShareError>>,
        clipboard: Option<Result<(), ShareError>>,
        legacy: Option<Result<(), ShareError>>,
        calls: RefCell<Vec<String>>,
    }

    impl SharePlatform for FakePlatform {
        fn can_share(&self) -> bool {
            self.share.is_some()
        }

        async fn share(&self, data: &ShareData) -> Result<(), ShareError> {
            self.calls.borrow_mut().push(format!("share {}", data.url));
            self.share.clone().unwrap_or(Err(ShareError::Unavailable("share")))
        }

        fn has_clipboard(&self) -> bool {
            self.clipboard.is_some()
        }

        async fn write_clipboard(&self, text: &str) -> Result<(), ShareError> {
            self.calls.borrow_mut().push(format!("clipboard {text}"));
            self.clipboard
                .clone()
                .unwrap_or(Err(ShareError::Unavailable("clipboard")))
        }

        fn legacy_copy(&self, text: &str) -> Result<(), ShareError> {
            self.calls.borrow_mut().push(format!("legacy {text}"));
            self.legacy
                .clone()
                .unwrap_or(Err(ShareError::Failed("copy command rejected".to_owned())))
        }
    }

    fn photo(full: &str, thumbnail: &str) -> Photo {
        Photo {
            id: "f1".to_owned(),
            name: "Red Fox".to_owned(),
            date: String::new(),
            thumbnail: thumbnail.to_owned(),
            full: full.to_owned(),
            author: Author {
                name: "Ann".to_owned(),
                channel: String::new(),
            },
            likes: 0,
            dislikes: 0,
            status: ReactionStatus::None,
            image_loaded: false,
        }
    }

    #[test]
    fn share_data_prefers_full_then_thumbnail_then_page() {
        let page = "https://example.test/";
        assert_eq!(share_data(&photo("f.jpg", "t.jpg"), page).url, "f.jpg");
        assert_eq!(share_data(&photo("", "t.jpg"), page).url, "t.jpg");
        let data = share_data(&photo("", ""), page);
        assert_eq!(data.url, page);
        assert_eq!(data.title, "Red Fox");
        assert_eq!(data.text, "Check out Red Fox by Ann");
    }

    #[test]
    fn uses_share_sheet_when_available() {
        let platform = FakePlatform {
            share: Some(Ok(())),
            clipboard: Some(Ok(())),
            ..Default::default()
        };
        let outcome = block_on(share_photo(&platform, &photo("f.jpg", ""), "page"));
        assert_eq!(outcome, ShareOutcome::Shared);
        assert_eq!(*platform.calls.borrow(), vec!["share f.jpg".to_owned()]);
    }

    #[test]
    fn cancelled_share_falls_back_to_clipboard() {
        let platform = FakePlatform {
            share: Some(Err(ShareError::Cancelled)),
            clipboard: Some(Ok(())),
            ..Default::default()
        };
        let outcome = block_on(share_photo(&platform, &photo("f.jpg", ""), "page"));
        assert_eq!(outcome, ShareOutcome::Copied(CopyTier::Clipboard));
        assert_eq!(
            *platform.calls.borrow(),
            vec!["share f.jpg".to_owned(), "clipboard f.jpg".to_owned()]
        );
    }

    #[test]
    fn without_share_or_clipboard_uses_legacy_copy() {
        let platform = FakePlatform {
            legacy: Some(Ok(())),
            ..Default::default()
        };
        let outcome = block_on(share_photo(&platform, &photo("", "t.jpg"), "page"));
        assert_eq!(outcome, ShareOutcome::Copied(CopyTier::Legacy));
        assert_eq!(*platform.calls.borrow(), vec!["legacy t.jpg".to_owned()]);
    }

    #[test]
    fn failed_clipboard_falls_through_to_legacy() {
        let platform = FakePlatform {
            clipboard: Some(Err(ShareError::Failed("denied".to_owned()))),
            legacy: Some(Ok(())),
            ..Default::default()
        };
        assert_eq!(
            block_on(copy_text(&platform, "x")),
            ShareOutcome::Copied(CopyTier::Legacy)
        );
    }

    #[test]
    fn total_failure_is_reported_not_raised() {
        let platform = FakePlatform {
            share: Some(Err(ShareError::Failed("boom".to_owned()))),
            clipboard: Some(Err(ShareError::Failed("denied".to_owned()))),
            ..Default::default()
        };
        let outcome = block_on(share_photo(&platform, &photo("f.jpg", ""), "page"));
        assert_eq!(outcome, ShareOutcome::Failed);
        assert_eq!(outcome.notice(), "Could not copy the link");
        assert_eq!(platform.calls.borrow().len(), 3);
    }
}
