// src/main.rs
mod components;
mod export;
mod index;
mod model;
mod navigate;
mod search;
mod sync;
mod tei;
mod utils;

use components::edition_viewer::EditionViewer;
use gloo_net::http::Request;
use index::EditionContext;
use yew::prelude::*;

pub enum AppMsg {
    EditionLoaded(EditionContext),
    EditionLoadFailed(String),
}

pub struct App {
    context: Option<EditionContext>,
    error: Option<String>,
    loading: bool,
}

impl Component for App {
    type Message = AppMsg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        ctx.link().send_future(async {
            match load_edition().await {
                Ok(context) => AppMsg::EditionLoaded(context),
                Err(e) => AppMsg::EditionLoadFailed(e),
            }
        });

        Self {
            context: None,
            error: None,
            loading: true,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AppMsg::EditionLoaded(context) => {
                log::info!(
                    "loaded edition: {} poems, {} lines, {} folios",
                    context.edition.poem_count(),
                    context.edition.all_lines().count(),
                    context.index.ordered_pages.len()
                );
                self.context = Some(context);
                self.loading = false;
                true
            }
            AppMsg::EditionLoadFailed(error) => {
                log::error!("failed to load edition: {}", error);
                self.error = Some(error);
                self.loading = false;
                true
            }
        }
    }

    fn view(&self, _ctx: &Context<Self>) -> Html {
        if self.loading {
            return html! {
                <div class="app-container">
                    { header(None) }
                    <main class="app-main">
                        <div class="loading">{"Loading the edition…"}</div>
                    </main>
                </div>
            };
        }

        let Some(context) = &self.context else {
            let detail = self
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            return html! {
                <div class="app-container">
                    { header(None) }
                    <main class="app-main">
                        <div class="error">
                            <p>{"Failed to load edition data."}</p>
                            <p class="error-detail">{ detail }</p>
                        </div>
                    </main>
                </div>
            };
        };

        html! {
            <div class="app-container">
                { header(Some(context)) }
                <main class="app-main">
                    <EditionViewer context={context.clone()} />
                </main>
                <footer class="app-footer">
                    <p>{"Aurelius Laurentius Albrisius, Lucina · Pavia 1474, Cod. 1459"}</p>
                </footer>
            </div>
        }
    }
}

fn header(context: Option<&EditionContext>) -> Html {
    let (title, author) = match context {
        Some(c) => (c.edition.title.clone(), c.edition.author.clone()),
        None => ("Lucina".to_string(), String::new()),
    };
    html! {
        <header class="app-header">
            <h1>{ title }</h1>
            { if author.is_empty() { html!{} } else { html! { <p class="subtitle">{ author }</p> } } }
        </header>
    }
}

async fn load_edition() -> Result<EditionContext, String> {
    let url = utils::edition_url();
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("fetch {}: {}", url, e))?;
    if !resp.ok() {
        return Err(format!("fetch {}: HTTP {}", url, resp.status()));
    }
    let xml = resp
        .text()
        .await
        .map_err(|e| format!("read {}: {}", url, e))?;
    let edition = tei::parse_edition(&xml).map_err(|e| e.to_string())?;
    EditionContext::new(edition).map_err(|e| e.to_string())
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
