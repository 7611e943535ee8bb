// src/components/image_panel.rs
//
// Facsimile panel. Shows the folio the reading view is currently on, with
// zoom/pan and keyboard navigation. The panel itself holds no load state:
// load and error completions are reported upward with the folio label they
// were requested for, and the shell's sync controller decides whether they
// are still current before the `loaded`/`failed` props change. Missing or
// failing images degrade to a visible placeholder without blocking the
// text panel.

use gloo::events::EventListener;
use gloo_utils::document;
use wasm_bindgen::JsCast;
use web_sys::{KeyboardEvent, MouseEvent, WheelEvent};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ImagePanelProps {
    /// Current folio label, None before the first anchor is known.
    pub page: Option<String>,
    /// Resolved image URL; None when the mapping has no entry for the page.
    pub image_url: Option<String>,
    /// The current folio's image finished loading.
    pub loaded: bool,
    /// The current folio's image failed to load.
    pub failed: bool,
    pub on_prev: Callback<()>,
    pub on_next: Callback<()>,
    /// Load completion, tagged with the folio it was requested for.
    pub on_loaded: Callback<String>,
    pub on_failed: Callback<String>,
}

pub enum ImagePanelMsg {
    Zoom(f32),
    ResetView,
    StartDrag(MouseEvent),
    Drag(MouseEvent),
    EndDrag,
    Key(KeyboardEvent),
}

pub struct ImagePanel {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    dragging: bool,
    last_mouse: (f32, f32),
    _kbd: EventListener,
}

impl Component for ImagePanel {
    type Message = ImagePanelMsg;
    type Properties = ImagePanelProps;

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        let kbd = EventListener::new(&document(), "keydown", move |event| {
            if let Some(e) = event.dyn_ref::<KeyboardEvent>() {
                link.send_message(ImagePanelMsg::Key(e.clone()));
            }
        });
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            dragging: false,
            last_mouse: (0.0, 0.0),
            _kbd: kbd,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            ImagePanelMsg::Zoom(factor) => {
                self.scale = (self.scale * factor).clamp(0.2, 8.0);
                true
            }
            ImagePanelMsg::ResetView => {
                self.scale = 1.0;
                self.offset_x = 0.0;
                self.offset_y = 0.0;
                true
            }
            ImagePanelMsg::StartDrag(event) => {
                self.dragging = true;
                self.last_mouse = (event.client_x() as f32, event.client_y() as f32);
                false
            }
            ImagePanelMsg::Drag(event) => {
                if self.dragging {
                    let (lx, ly) = self.last_mouse;
                    let (cx, cy) = (event.client_x() as f32, event.client_y() as f32);
                    self.offset_x += cx - lx;
                    self.offset_y += cy - ly;
                    self.last_mouse = (cx, cy);
                    true
                } else {
                    false
                }
            }
            ImagePanelMsg::EndDrag => {
                self.dragging = false;
                false
            }
            ImagePanelMsg::Key(event) => {
                match event.key().as_str() {
                    "ArrowRight" => {
                        ctx.props().on_next.emit(());
                        event.prevent_default();
                    }
                    "ArrowLeft" => {
                        ctx.props().on_prev.emit(());
                        event.prevent_default();
                    }
                    "+" | "=" => self.scale = (self.scale * 1.2).min(8.0),
                    "-" | "_" => self.scale = (self.scale / 1.2).max(0.2),
                    "r" | "R" => {
                        self.scale = 1.0;
                        self.offset_x = 0.0;
                        self.offset_y = 0.0;
                    }
                    _ => return false,
                }
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let props = ctx.props();
        let caption = props
            .page
            .as_ref()
            .map(|p| format!("Folio {}", p))
            .unwrap_or_else(|| "—".to_string());

        html! {
            <div class="image-panel">
                { self.render_controls(ctx) }
                <div class="image-caption">{ caption }</div>
                { self.render_image(ctx) }
            </div>
        }
    }
}

impl ImagePanel {
    fn render_controls(&self, ctx: &Context<Self>) -> Html {
        let on_prev = ctx.props().on_prev.clone();
        let on_next = ctx.props().on_next.clone();
        let zoom_in = ctx.link().callback(|_| ImagePanelMsg::Zoom(1.2));
        let zoom_out = ctx.link().callback(|_| ImagePanelMsg::Zoom(1.0 / 1.2));
        let reset = ctx.link().callback(|_| ImagePanelMsg::ResetView);

        html! {
            <div class="image-controls">
                <button onclick={Callback::from(move |_| on_prev.emit(()))} title="Previous folio (←)">{"← Prev"}</button>
                <button onclick={Callback::from(move |_| on_next.emit(()))} title="Next folio (→)">{"Next →"}</button>
                <button onclick={zoom_in} title="Zoom in (+)">{"🔍 +"}</button>
                <button onclick={zoom_out} title="Zoom out (-)">{"🔍 -"}</button>
                <button onclick={reset} title="Reset view (R)">{"⟲"}</button>
                <span class="zoom-level">{ format!("{}%", (self.scale * 100.0) as i32) }</span>
            </div>
        }
    }

    fn render_image(&self, ctx: &Context<Self>) -> Html {
        let props = ctx.props();

        let (page, url) = match (&props.page, &props.image_url) {
            (Some(page), Some(url)) => (page.clone(), url.clone()),
            (Some(_), None) | (None, _) => return Self::render_placeholder(),
        };
        if props.failed {
            return Self::render_placeholder();
        }

        let onwheel = ctx.link().callback(|e: WheelEvent| {
            e.prevent_default();
            ImagePanelMsg::Zoom(if e.delta_y() < 0.0 { 1.1 } else { 0.9 })
        });
        let onmousedown = ctx.link().callback(|e: MouseEvent| {
            e.prevent_default();
            ImagePanelMsg::StartDrag(e)
        });
        let onmousemove = ctx.link().callback(ImagePanelMsg::Drag);
        let onmouseup = ctx.link().callback(|_: MouseEvent| ImagePanelMsg::EndDrag);
        let onmouseleave = ctx.link().callback(|_: MouseEvent| ImagePanelMsg::EndDrag);

        let onload = {
            let on_loaded = props.on_loaded.clone();
            let page = page.clone();
            Callback::from(move |_: Event| on_loaded.emit(page.clone()))
        };
        let onerror = {
            let on_failed = props.on_failed.clone();
            let page = page.clone();
            Callback::from(move |_: Event| on_failed.emit(page.clone()))
        };

        let transform = format!(
            "transform-origin: 0 0; transform: translate({}px, {}px) scale({});",
            self.offset_x, self.offset_y, self.scale
        );
        let img_class = if props.loaded {
            "facsimile"
        } else {
            "facsimile loading"
        };

        html! {
            <div
                class="image-container"
                {onwheel}
                {onmousedown}
                {onmousemove}
                {onmouseup}
                {onmouseleave}
            >
                <img
                    class={img_class}
                    src={url}
                    alt={format!("Facsimile of folio {}", page)}
                    style={transform}
                    {onload}
                    {onerror}
                />
            </div>
        }
    }

    fn render_placeholder() -> Html {
        html! {
            <div class="image-placeholder">
                <p>{"No facsimile available"}</p>
            </div>
        }
    }
}
