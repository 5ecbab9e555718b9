pub mod centering;
pub mod config;
pub mod data;
pub mod lazy;
pub mod reaction;
pub mod share;
pub mod storage;
pub mod web;

use centering::CenteringEngine;
use config::{load_config, timer_millis, WidgetConfig};
use data::{fetch_catalog, fetch_random_fox, Photo, ReactionStatus};
use gloo_events::EventListener;
use gloo_timers::future::TimeoutFuture;
use lazy::LazyImageLoader;
use log::{error, info, warn};
use reaction::{Reaction, Reactions};
use share::share_photo;
use std::cell::RefCell;
use std::rc::Rc;
use storage::{LocalBlobStore, ReactionStore};
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web::{page_url, BrowserShare, DomViewport, DomVisibilityObserver};
use web_sys::{window, HtmlElement, KeyboardEvent};
use yew::prelude::*;

type SharedReactions = Rc<RefCell<Reactions<LocalBlobStore>>>;
type SharedLoader = Rc<RefCell<LazyImageLoader>>;
type SharedEngine = Rc<RefCell<CenteringEngine>>;
type SharedObserver = Rc<RefCell<Option<DomVisibilityObserver>>>;

#[derive(PartialEq, Clone, Copy)]
enum FetchStatus {
    Loading,
    Idle,
}

#[derive(Properties, PartialEq, Clone, Default)]
pub struct AppProps {
    #[prop_or_default]
    pub config: WidgetConfig,
}

#[derive(Clone, PartialEq)]
enum CardAction {
    React(String, Reaction),
    Inspect(String),
    Share(String),
    ImageDone(String),
}

fn viewport(row: &NodeRef) -> Option<DomViewport> {
    row.cast::<HtmlElement>().map(DomViewport::new)
}

#[function_component(App)]
pub fn app(props: &AppProps) -> Html {
    let config = props.config.clone();
    let status = use_state(|| FetchStatus::Loading);
    let reactions: SharedReactions =
        use_mut_ref(|| Reactions::new(ReactionStore::new(LocalBlobStore)));
    let load_delay = config.load_delay_ms;
    let loader: SharedLoader = use_mut_ref(move || LazyImageLoader::new(load_delay));
    let engine: SharedEngine = use_mut_ref(CenteringEngine::new);
    let observer: SharedObserver = use_mut_ref(|| None);
    let spacer = use_state(|| 0.0_f64);
    let selected = use_state(|| None::<String>);
    let toast = use_state(|| None::<String>);
    let fox_loading = use_state(|| false);
    let row_ref = use_node_ref();
    let redraw = use_force_update();

    let photo_count = reactions.borrow().photos().len();
    let is_idle = *status == FetchStatus::Idle;

    {
        let status = status.clone();
        let reactions = reactions.clone();
        let catalog_url = config.catalog_url.clone();

        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    let mut rng = rand::thread_rng();
                    match fetch_catalog(&catalog_url, &mut rng).await {
                        Ok(photos) => {
                            info!("Loaded {} photos from {}", photos.len(), catalog_url);
                            reactions.borrow_mut().load(photos);
                        }
                        Err(err) => {
                            error!("Failed to load catalog from {}: {}", catalog_url, err);
                            reactions.borrow_mut().load(Vec::new());
                        }
                    }
                    status.set(FetchStatus::Idle);
                });
                || ()
            },
            (),
        );
    }

    {
        let row_ref = row_ref.clone();
        let observer = observer.clone();
        let loader = loader.clone();
        let reactions = reactions.clone();
        let redraw = redraw.clone();
        let root_margin = config.root_margin();

        use_effect_with_deps(
            move |idle: &bool| {
                if *idle {
                    if let Some(row) = row_ref.cast::<web_sys::Element>() {
                        let on_change = {
                            let observer = observer.clone();
                            let loader = loader.clone();
                            move |id: String, intersecting: bool| {
                                let delay = loader.borrow_mut().on_visibility(
                                    &id,
                                    intersecting,
                                    &mut rand::thread_rng(),
                                );
                                let Some(delay) = delay else {
                                    return;
                                };
                                let observer = observer.clone();
                                let loader = loader.clone();
                                let reactions = reactions.clone();
                                let redraw = redraw.clone();
                                spawn_local(async move {
                                    TimeoutFuture::new(timer_millis(delay)).await;
                                    let mut reactions = reactions.borrow_mut();
                                    let swapped = match (
                                        observer.borrow().as_ref(),
                                        reactions.get_mut(&id),
                                    ) {
                                        (Some(observer), Some(photo)) => {
                                            loader.borrow_mut().swap(photo, observer)
                                        }
                                        _ => false,
                                    };
                                    drop(reactions);
                                    if swapped {
                                        redraw.force_update();
                                    }
                                });
                            }
                        };
                        match DomVisibilityObserver::new(row, &root_margin, on_change) {
                            Ok(created) => *observer.borrow_mut() = Some(created),
                            Err(err) => warn!(
                                "Lazy loading unavailable, images stay as placeholders: {}",
                                web::js_err(err)
                            ),
                        }
                    }
                }

                move || {
                    if let Some(active) = observer.borrow_mut().take() {
                        loader.borrow_mut().teardown(&active);
                    }
                }
            },
            is_idle,
        );
    }

    {
        let reactions = reactions.clone();
        let loader = loader.clone();
        let observer = observer.clone();
        let engine = engine.clone();
        let row_ref = row_ref.clone();
        let spacer = spacer.clone();
        let card_width = config.card_width_px;

        use_effect_with_deps(
            move |_| {
                if let Some(active) = observer.borrow().as_ref() {
                    let mut loader = loader.borrow_mut();
                    for photo in reactions.borrow().photos() {
                        loader.track(&photo.id, active);
                    }
                }
                if let Some(surface) = viewport(&row_ref) {
                    spacer.set(engine.borrow_mut().resize(&surface, card_width));
                }
                || ()
            },
            (is_idle, photo_count),
        );
    }

    {
        let engine = engine.clone();
        let row_ref = row_ref.clone();
        let redraw = redraw.clone();

        use_effect_with_deps(
            move |_| {
                if let Some(surface) = viewport(&row_ref) {
                    engine.borrow_mut().refresh(&surface);
                    redraw.force_update();
                }
                || ()
            },
            *spacer,
        );
    }

    {
        let engine = engine.clone();
        let row_ref = row_ref.clone();
        let spacer = spacer.clone();
        let redraw = redraw.clone();
        let card_width = config.card_width_px;

        use_effect_with_deps(
            move |_| {
                let listener = window().map(|window| {
                    EventListener::new(&window, "resize", move |_| {
                        if let Some(surface) = viewport(&row_ref) {
                            spacer.set(engine.borrow_mut().resize(&surface, card_width));
                            redraw.force_update();
                        }
                    })
                });
                move || drop(listener)
            },
            (),
        );
    }

    {
        let engine = engine.clone();
        let row_ref = row_ref.clone();
        let selected = selected.clone();
        let redraw = redraw.clone();
        let overlay_open = selected.is_some();

        use_effect_with_deps(
            move |overlay_open: &bool| {
                let overlay_open = *overlay_open;
                let listener = window().map(|window| {
                    EventListener::new(&window, "keydown", move |event| {
                        let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                            return;
                        };
                        let key = event.key();
                        if overlay_open && key == "Escape" {
                            selected.set(None);
                            return;
                        }
                        let Some(surface) = viewport(&row_ref) else {
                            return;
                        };
                        if engine
                            .borrow_mut()
                            .handle_key(&key, overlay_open, &surface)
                            .is_some()
                        {
                            event.prevent_default();
                            redraw.force_update();
                        }
                    })
                });
                move || drop(listener)
            },
            overlay_open,
        );
    }

    let on_scroll = {
        let engine = engine.clone();
        let row_ref = row_ref.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: Event| {
            if let Some(surface) = viewport(&row_ref) {
                engine.borrow_mut().refresh(&surface);
                redraw.force_update();
            }
        })
    };

    let on_navigate = {
        let engine = engine.clone();
        let row_ref = row_ref.clone();
        let redraw = redraw.clone();
        Callback::from(move |forward: bool| {
            let Some(surface) = viewport(&row_ref) else {
                return;
            };
            let mut engine = engine.borrow_mut();
            if forward {
                engine.next(&surface);
            } else {
                engine.previous(&surface);
            }
            redraw.force_update();
        })
    };

    let on_card_action = {
        let reactions = reactions.clone();
        let loader = loader.clone();
        let selected = selected.clone();
        let toast = toast.clone();
        let redraw = redraw.clone();
        let toast_ms = config.toast_ms;

        Callback::from(move |action: CardAction| match action {
            CardAction::React(id, reaction) => {
                if reactions.borrow_mut().react(&id, reaction).is_some() {
                    redraw.force_update();
                }
            }
            CardAction::Inspect(id) => selected.set(Some(id)),
            CardAction::ImageDone(id) => {
                let finished = match reactions.borrow_mut().get_mut(&id) {
                    Some(photo) => loader.borrow().finish(photo),
                    None => false,
                };
                if finished {
                    redraw.force_update();
                }
            }
            CardAction::Share(id) => {
                let Some(photo) = reactions.borrow().get(&id).cloned() else {
                    return;
                };
                let toast = toast.clone();
                spawn_local(async move {
                    let outcome = share_photo(&BrowserShare, &photo, &page_url()).await;
                    toast.set(Some(outcome.notice().to_owned()));
                    TimeoutFuture::new(toast_ms).await;
                    toast.set(None);
                });
            }
        })
    };

    let on_load_fox = {
        let reactions = reactions.clone();
        let fox_loading = fox_loading.clone();
        let fox_url = config.fox_url.clone();

        Callback::from(move |_: MouseEvent| {
            if *fox_loading {
                return;
            }
            fox_loading.set(true);
            let reactions = reactions.clone();
            let fox_loading = fox_loading.clone();
            let fox_url = fox_url.clone();
            spawn_local(async move {
                let mut rng = rand::thread_rng();
                match fetch_random_fox(&fox_url, &mut rng).await {
                    Ok(photo) => {
                        reactions.borrow_mut().append(photo);
                    }
                    Err(err) => error!("Error fetching fox: {}", err),
                }
                fox_loading.set(false);
            });
        })
    };

    let close_overlay = {
        let selected = selected.clone();
        Callback::from(move |_: MouseEvent| selected.set(None))
    };

    let reactions_ref = reactions.borrow();
    let photos = reactions_ref.photos();
    let engine_ref = engine.borrow();
    let loader_ref = loader.borrow();

    let overlay = (*selected)
        .as_ref()
        .and_then(|id| photos.iter().find(|photo| &photo.id == id))
        .map(|photo| render_overlay(photo, &on_card_action, close_overlay.clone()))
        .unwrap_or_else(|| html! {});

    let spacer_style = format!("flex: 0 0 {:.0}px;", *spacer);
    let prev_click = {
        let on_navigate = on_navigate.clone();
        Callback::from(move |_: MouseEvent| on_navigate.emit(false))
    };
    let next_click = {
        let on_navigate = on_navigate.clone();
        Callback::from(move |_: MouseEvent| on_navigate.emit(true))
    };

    let view = html! {
        <div class="swipe-fox">
            <div class="toolbar">
                <button class="load-fox" onclick={on_load_fox} disabled={*fox_loading}>
                    { if *fox_loading { "Loading…" } else { "Load another fox" } }
                </button>
            </div>
            {
                match *status {
                    FetchStatus::Loading => html! { <p class="placeholder">{ "Loading photos…" }</p> },
                    FetchStatus::Idle if photos.is_empty() => {
                        html! { <p class="placeholder">{ "No photos to show." }</p> }
                    }
                    FetchStatus::Idle => html! {},
                }
            }
            <div class="carousel">
                <button class="nav prev" onclick={prev_click}
                    disabled={photos.is_empty() || engine_ref.current_index() == 0}>{ "‹" }</button>
                <div class="card-row" ref={row_ref.clone()} onscroll={on_scroll}>
                    <div class="edge-spacer" style={spacer_style.clone()}></div>
                    { for photos.iter().enumerate().map(|(index, photo)| {
                        render_card(index, photo, &engine_ref, &loader_ref, &on_card_action)
                    }) }
                    <div class="edge-spacer" style={spacer_style}></div>
                </div>
                <button class="nav next" onclick={next_click}
                    disabled={photos.is_empty() || engine_ref.current_index() + 1 >= photos.len()}>{ "›" }</button>
            </div>
            { overlay }
            {
                match &*toast {
                    Some(message) => html! { <div class="toast">{ message }</div> },
                    None => html! {},
                }
            }
        </div>
    };
    view
}

fn render_card(
    index: usize,
    photo: &Photo,
    engine: &CenteringEngine,
    loader: &LazyImageLoader,
    on_action: &Callback<CardAction>,
) -> Html {
    let weight = engine.emphasis_for(index);
    let class = classes!(
        "card",
        if weight.centered { Some("centered") } else { None },
        if photo.image_loaded { None } else { Some("loading") }
    );

    let emit = |action: CardAction| {
        let on_action = on_action.clone();
        Callback::from(move |_: MouseEvent| on_action.emit(action.clone()))
    };
    let image_done = {
        let on_action = on_action.clone();
        let id = photo.id.clone();
        Callback::from(move |_: Event| on_action.emit(CardAction::ImageDone(id.clone())))
    };

    html! {
        <div key={photo.id.clone()} class={class} style={weight.style()}
            data-photo-id={photo.id.clone()} data-card-index={index.to_string()}>
            <div class="image-frame">
                if !photo.image_loaded {
                    <div class="spinner"></div>
                }
                <img src={loader.source(photo).to_owned()} alt={photo.name.clone()}
                    onload={image_done.clone()} onerror={image_done} />
            </div>
            <h3 class="card-title">{ &photo.name }</h3>
            { render_stats(photo) }
            <div class="controls">
                { render_reaction_buttons(photo, on_action) }
                <button class="info" onclick={emit(CardAction::Inspect(photo.id.clone()))}>{ "ℹ" }</button>
                <button class="share" onclick={emit(CardAction::Share(photo.id.clone()))}>{ "↗" }</button>
            </div>
        </div>
    }
}

fn render_reaction_buttons(photo: &Photo, on_action: &Callback<CardAction>) -> Html {
    let button = |reaction: Reaction, label: &'static str, class: &'static str| {
        let active = photo.status == reaction.status();
        let onclick = {
            let on_action = on_action.clone();
            let id = photo.id.clone();
            Callback::from(move |event: MouseEvent| {
                event.stop_propagation();
                on_action.emit(CardAction::React(id.clone(), reaction));
            })
        };
        html! {
            <button class={classes!(class, if active { Some("active") } else { None })}
                aria-pressed={active.to_string()} onclick={onclick}>{ label }</button>
        }
    };

    html! {
        <>
            { button(Reaction::Liked, "👍", "like") }
            { button(Reaction::Disliked, "👎", "dislike") }
        </>
    }
}

fn render_stats(photo: &Photo) -> Html {
    let verdict = match photo.status {
        ReactionStatus::Liked => "You liked this",
        ReactionStatus::Disliked => "You disliked this",
        ReactionStatus::None => "",
    };
    html! {
        <div class="stats">
            <span class="likes">{ format!("👍 {}", photo.likes) }</span>
            <span class="dislikes">{ format!("👎 {}", photo.dislikes) }</span>
            <span class="approval">{ format!("{}% approval", photo.approval_percent()) }</span>
            if !verdict.is_empty() {
                <span class="verdict">{ verdict }</span>
            }
        </div>
    }
}

fn render_overlay(
    photo: &Photo,
    on_action: &Callback<CardAction>,
    on_close: Callback<MouseEvent>,
) -> Html {
    let stop_click = Callback::from(|event: MouseEvent| event.stop_propagation());
    let image = photo.share_ref().unwrap_or_default().to_owned();
    let author = if photo.author.channel.is_empty() {
        html! { <span>{ &photo.author.name }</span> }
    } else {
        let label = if photo.author.name.is_empty() {
            photo.author.channel.clone()
        } else {
            photo.author.name.clone()
        };
        html! {
            <a href={photo.author.channel.clone()} target="_blank" rel="noopener">{ label }</a>
        }
    };

    html! {
        <div class="overlay" onclick={on_close.clone()}>
            <div class="overlay-content" onclick={stop_click}>
                <button class="overlay-close" onclick={on_close}>{ "×" }</button>
                if !image.is_empty() {
                    <img src={image} alt={photo.name.clone()} />
                }
                <h2>{ &photo.name }</h2>
                <dl class="details">
                    <dt>{ "Author" }</dt>
                    <dd>{ author }</dd>
                    <dt>{ "Date" }</dt>
                    <dd>{ if photo.date.is_empty() { "Unknown" } else { photo.date.as_str() } }</dd>
                </dl>
                { render_stats(photo) }
                <div class="controls">
                    { render_reaction_buttons(photo, on_action) }
                </div>
            </div>
        </div>
    }
}

#[wasm_bindgen(start)]
pub fn run_app() {
    wasm_logger::init(wasm_logger::Config::default());
    let config = load_config();
    yew::Renderer::<App>::with_props(AppProps { config }).render();
}
