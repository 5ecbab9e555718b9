use crate::centering::{CardBox, ScrollMetrics, ViewportSurface};
use crate::lazy::VisibilityObserver;
use crate::share::{ShareData, ShareError, SharePlatform};
use js_sys::{Array, Function, Object, Promise, Reflect};
use log::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    window, Element, HtmlDocument, HtmlElement, HtmlTextAreaElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, ScrollBehavior, ScrollToOptions,
};

pub const PHOTO_ID_ATTR: &str = "data-photo-id";
pub const CARD_INDEX_ATTR: &str = "data-card-index";

pub fn js_err(value: JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            Reflect::get(&value, &JsValue::from_str("message"))
                .ok()
                .and_then(|message| message.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

pub fn page_url() -> String {
    window()
        .and_then(|window| window.location().href().ok())
        .unwrap_or_default()
}

fn card_selector(id: &str) -> String {
    format!(
        "[{}=\"{}\"]",
        PHOTO_ID_ATTR,
        id.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// The horizontally scrolling card row. Cards are the children carrying
/// [`CARD_INDEX_ATTR`]; the row must be their offset parent.
#[derive(Debug, Clone)]
pub struct DomViewport {
    row: HtmlElement,
}

impl DomViewport {
    pub fn new(row: HtmlElement) -> Self {
        Self { row }
    }
}

impl ViewportSurface for DomViewport {
    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_left: self.row.scroll_left() as f64,
            viewport_width: self.row.client_width() as f64,
        }
    }

    fn card_boxes(&self) -> Vec<CardBox> {
        let children = self.row.children();
        (0..children.length())
            .filter_map(|index| children.item(index))
            .filter(|element| element.has_attribute(CARD_INDEX_ATTR))
            .filter_map(|element| element.dyn_into::<HtmlElement>().ok())
            .map(|card| CardBox {
                left: card.offset_left() as f64,
                width: card.offset_width() as f64,
            })
            .collect()
    }

    fn scroll_to(&self, scroll_left: f64, smooth: bool) {
        let options = ScrollToOptions::new();
        options.set_left(scroll_left);
        options.set_behavior(if smooth {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Instant
        });
        self.row.scroll_to_with_scroll_to_options(&options);
    }
}

/// `IntersectionObserver` over the cards of one row, keyed by photo id.
pub struct DomVisibilityObserver {
    row: Element,
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array, IntersectionObserver)>,
}

impl DomVisibilityObserver {
    pub fn new<F>(row: Element, root_margin: &str, mut on_change: F) -> Result<Self, JsValue>
    where
        F: FnMut(String, bool) + 'static,
    {
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let entry: IntersectionObserverEntry = entry.unchecked_into();
                    if let Some(id) = entry.target().get_attribute(PHOTO_ID_ATTR) {
                        on_change(id, entry.is_intersecting());
                    }
                }
            },
        );

        let options = IntersectionObserverInit::new();
        options.set_root_margin(root_margin);
        // `root` takes an Element or a Document.
        Reflect::set(&options, &JsValue::from_str("root"), row.as_ref())?;

        let observer = IntersectionObserver::new_with_options(
            callback.as_ref().unchecked_ref(),
            &options,
        )?;

        Ok(Self {
            row,
            observer,
            _callback: callback,
        })
    }

    fn card(&self, id: &str) -> Option<Element> {
        self.row.query_selector(&card_selector(id)).ok().flatten()
    }
}

impl VisibilityObserver for DomVisibilityObserver {
    fn observe(&self, id: &str) {
        match self.card(id) {
            Some(card) => self.observer.observe(&card),
            None => debug!("No card element for '{}' to observe", id),
        }
    }

    fn unobserve(&self, id: &str) {
        if let Some(card) = self.card(id) {
            self.observer.unobserve(&card);
        }
    }

    fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for DomVisibilityObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Web Share API with clipboard fallbacks. Capabilities are probed at call
/// time since browsers ship them unevenly.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserShare;

impl BrowserShare {
    fn navigator() -> Option<JsValue> {
        window().map(|window| window.navigator().into())
    }

    fn method(target: &JsValue, name: &str) -> Option<Function> {
        Reflect::get(target, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
    }

    fn clipboard() -> Option<JsValue> {
        let navigator = Self::navigator()?;
        let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard")).ok()?;
        if clipboard.is_undefined() || clipboard.is_null() {
            return None;
        }
        Some(clipboard)
    }

    async fn call_promise(
        target: &JsValue,
        method: &str,
        arg: &JsValue,
    ) -> Result<JsValue, JsValue> {
        let function = Self::method(target, method)
            .ok_or_else(|| JsValue::from_str(&format!("{method} is not a function")))?;
        let promise: Promise = function.call1(target, arg)?.dyn_into()?;
        JsFuture::from(promise).await
    }
}

impl SharePlatform for BrowserShare {
    fn can_share(&self) -> bool {
        Self::navigator()
            .and_then(|navigator| Self::method(&navigator, "share"))
            .is_some()
    }

    async fn share(&self, data: &ShareData) -> Result<(), ShareError> {
        let navigator = Self::navigator().ok_or(ShareError::Unavailable("navigator"))?;
        let payload = Object::new();
        for (key, value) in [("title", &data.title), ("text", &data.text), ("url", &data.url)] {
            Reflect::set(&payload, &JsValue::from_str(key), &JsValue::from_str(value))
                .map_err(|err| ShareError::Failed(js_err(err)))?;
        }

        match Self::call_promise(&navigator, "share", &payload).await {
            Ok(_) => Ok(()),
            Err(err) => {
                let name = Reflect::get(&err, &JsValue::from_str("name"))
                    .ok()
                    .and_then(|name| name.as_string());
                if name.as_deref() == Some("AbortError") {
                    Err(ShareError::Cancelled)
                } else {
                    Err(ShareError::Failed(js_err(err)))
                }
            }
        }
    }

    fn has_clipboard(&self) -> bool {
        Self::clipboard()
            .and_then(|clipboard| Self::method(&clipboard, "writeText"))
            .is_some()
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), ShareError> {
        let clipboard = Self::clipboard().ok_or(ShareError::Unavailable("clipboard"))?;
        Self::call_promise(&clipboard, "writeText", &JsValue::from_str(text))
            .await
            .map(|_| ())
            .map_err(|err| ShareError::Failed(js_err(err)))
    }

    fn legacy_copy(&self, text: &str) -> Result<(), ShareError> {
        let document = window()
            .and_then(|window| window.document())
            .ok_or(ShareError::Unavailable("document"))?;
        let body = document.body().ok_or(ShareError::Unavailable("document body"))?;

        let field: HtmlTextAreaElement = document
            .create_element("textarea")
            .and_then(|element| element.dyn_into::<HtmlTextAreaElement>().map_err(Into::into))
            .map_err(|err| ShareError::Failed(js_err(err)))?;
        field.set_value(text);
        field
            .set_attribute("readonly", "")
            .and_then(|()| {
                field.set_attribute("style", "position: fixed; left: -9999px; top: 0;")
            })
            .map_err(|err| ShareError::Failed(js_err(err)))?;

        body.append_child(&field)
            .map_err(|err| ShareError::Failed(js_err(err)))?;
        field.select();
        let copied = document
            .dyn_into::<HtmlDocument>()
            .map_err(|_| ShareError::Unavailable("HTML document"))
            .and_then(|document| {
                document
                    .exec_command("copy")
                    .map_err(|err| ShareError::Failed(js_err(err)))
            });
        field.remove();

        match copied? {
            true => Ok(()),
            false => Err(ShareError::Failed("copy command was rejected".to_owned())),
        }
    }
}
