// src/components/edition_viewer.rs
//
// Rendering and navigation shell. Owns the view mode, the search state,
// the facet filter, the page-sync controller and the deep-link retry; all
// document data comes in read-only through the `EditionContext` prop.

use crate::components::image_panel::ImagePanel;
use crate::components::toc::Toc;
use crate::export;
use crate::index::{EditionContext, Entity};
use crate::model::{Genre, Line, Meter, Poem, Relation, Seg};
use crate::navigate::{folio_dom_id, parse_route, retry_delays, Target};
use crate::search::{find_all, search_edition, Facets, SearchCursor, SearchHit};
use crate::sync::{AnchorHit, PageSync};
use crate::utils::facsimile_url;
use gloo::events::EventListener;
use gloo_timers::callback::Timeout;
use std::collections::{HashMap, HashSet};
use wasm_bindgen::JsCast;
use web_sys::{
    Element, HtmlElement, HtmlInputElement, HtmlSelectElement, ScrollBehavior,
    ScrollIntoViewOptions, ScrollLogicalPosition,
};
use yew::prelude::*;

const LINK_RETRIES: u32 = 8;
const LINK_RETRY_BASE_MS: u32 = 50;

#[derive(Properties, PartialEq)]
pub struct EditionViewerProps {
    pub context: EditionContext,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Diplomatic,
    Normalized,
    Translation,
    Commentary,
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Diplomatic => "Diplomatic",
            ViewMode::Normalized => "Normalized",
            ViewMode::Translation => "Translation",
            ViewMode::Commentary => "Commentary",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Text,
    Json,
    Records,
}

pub enum EditionViewerMsg {
    SetMode(ViewMode),
    QueryChanged(String),
    NextMatch,
    PrevMatch,
    MeterFacet(String),
    GenreFacet(String),
    ClearFacets,
    Anchors(Vec<AnchorHit>),
    SelectPage(String),
    StepPage(i32),
    ImageLoaded(String),
    ImageFailed(String),
    SelectPoem(String),
    JumpTo(String),
    ShowEntity(String),
    CloseEntity,
    ShowExport(ExportKind),
    CloseExport,
    RetryLink,
}

pub struct EditionViewer {
    mode: ViewMode,
    sync: PageSync,
    query: String,
    hits: Vec<SearchHit>,
    hits_by_line: HashMap<String, Vec<(usize, usize)>>,
    poems_with_hits: HashSet<String>,
    cursor: SearchCursor,
    facets: Facets,
    selected_poem: Option<String>,
    selected_entity: Option<String>,
    export_view: Option<(ExportKind, String)>,
    /// Explicit `page=` folio still waiting for its first-render scroll.
    initial_page: Option<String>,
    loaded_page: Option<String>,
    failed_page: Option<String>,
    pending_link: Option<Target>,
    retries: Vec<u32>,
    retry_timer: Option<Timeout>,
    text_ref: NodeRef,
    _scroll: Option<EventListener>,
}

impl Component for EditionViewer {
    type Message = EditionViewerMsg;
    type Properties = EditionViewerProps;

    fn create(ctx: &Context<Self>) -> Self {
        let context = &ctx.props().context;
        let mut sync = PageSync::new(&context.index.ordered_pages);

        let (hash, search) = match web_sys::window() {
            Some(w) => {
                let loc = w.location();
                (
                    loc.hash().unwrap_or_default(),
                    loc.search().unwrap_or_default(),
                )
            }
            None => Default::default(),
        };
        let route = parse_route(&hash, &search);
        if let Some(page) = &route.page {
            sync.select(page);
        }

        let mut viewer = Self {
            mode: ViewMode::Diplomatic,
            sync,
            query: String::new(),
            hits: Vec::new(),
            hits_by_line: HashMap::new(),
            poems_with_hits: HashSet::new(),
            cursor: SearchCursor::default(),
            facets: Facets::default(),
            selected_poem: None,
            selected_entity: None,
            export_view: None,
            initial_page: route.page,
            loaded_page: None,
            failed_page: None,
            pending_link: route.target,
            retries: retry_delays(LINK_RETRIES, LINK_RETRY_BASE_MS),
            retry_timer: None,
            text_ref: NodeRef::default(),
            _scroll: None,
        };
        if let Some(query) = route.query {
            viewer.apply_query(context, query);
        }
        viewer
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        let context = ctx.props().context.clone();
        match msg {
            EditionViewerMsg::SetMode(mode) => {
                self.mode = mode;
                true
            }
            EditionViewerMsg::QueryChanged(query) => {
                self.apply_query(&context, query);
                true
            }
            EditionViewerMsg::NextMatch => {
                if let Some(pos) = self.cursor.next() {
                    self.focus_hit(&context, pos);
                }
                true
            }
            EditionViewerMsg::PrevMatch => {
                if let Some(pos) = self.cursor.prev() {
                    self.focus_hit(&context, pos);
                }
                true
            }
            EditionViewerMsg::MeterFacet(value) => {
                self.facets.meter = if value.is_empty() {
                    None
                } else {
                    Some(Meter::parse(&value))
                };
                // the hit list follows the facet filter
                self.apply_query(&context, self.query.clone());
                true
            }
            EditionViewerMsg::GenreFacet(value) => {
                self.facets.genre = if value.is_empty() {
                    None
                } else {
                    Some(Genre::parse(&value))
                };
                self.apply_query(&context, self.query.clone());
                true
            }
            EditionViewerMsg::ClearFacets => {
                self.facets = Facets::default();
                self.apply_query(&context, self.query.clone());
                true
            }
            EditionViewerMsg::Anchors(hits) => self.sync.observe(&hits).is_some(),
            EditionViewerMsg::SelectPage(page) => self.sync.select(&page).is_some(),
            EditionViewerMsg::StepPage(step) => {
                let next = self
                    .sync
                    .current()
                    .and_then(|cur| context.neighbour_page(cur, step))
                    .map(String::from);
                match next {
                    Some(page) => self.sync.select(&page).is_some(),
                    None => false,
                }
            }
            EditionViewerMsg::ImageLoaded(page) => {
                if self.sync.accept_load(&page) {
                    self.loaded_page = Some(page);
                    true
                } else {
                    log::debug!("stale facsimile load for folio {} dropped", page);
                    false
                }
            }
            EditionViewerMsg::ImageFailed(page) => {
                if self.sync.accept_load(&page) {
                    log::warn!("facsimile for folio {} failed to load", page);
                    self.failed_page = Some(page);
                    true
                } else {
                    false
                }
            }
            EditionViewerMsg::SelectPoem(id) => {
                self.selected_poem = Some(id.clone());
                scroll_to_element(&id);
                true
            }
            EditionViewerMsg::JumpTo(id) => {
                scroll_to_element(&id);
                false
            }
            EditionViewerMsg::ShowEntity(id) => {
                self.selected_entity = Some(id);
                true
            }
            EditionViewerMsg::CloseEntity => {
                self.selected_entity = None;
                true
            }
            EditionViewerMsg::ShowExport(kind) => {
                let content = match kind {
                    ExportKind::Text => export::plain_text(&context.edition),
                    ExportKind::Records => export::poem_records(&context.edition),
                    ExportKind::Json => match export::to_json(&context.edition) {
                        Ok(json) => json,
                        Err(e) => {
                            log::error!("JSON export failed: {}", e);
                            return false;
                        }
                    },
                };
                self.export_view = Some((kind, content));
                true
            }
            EditionViewerMsg::CloseExport => {
                self.export_view = None;
                true
            }
            EditionViewerMsg::RetryLink => self.try_deep_link(ctx),
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if !first_render {
            return;
        }
        if let Some(panel) = self.text_ref.cast::<HtmlElement>() {
            let link = ctx.link().clone();
            let target = panel.clone();
            self._scroll = Some(EventListener::new(&panel, "scroll", move |_| {
                link.send_message(EditionViewerMsg::Anchors(collect_anchor_hits(&target)));
            }));
            if let Some(page) = self.initial_page.take() {
                // an explicit `page=` already selected the folio; scrolling
                // the text panel to its anchor keeps both panels in step
                // without the seed observation overriding the request
                scroll_to_element(&folio_dom_id(&page));
            } else if let Some(el) = self.text_ref.cast::<Element>() {
                // seed the controller from the initial layout
                ctx.link()
                    .send_message(EditionViewerMsg::Anchors(collect_anchor_hits(&el)));
            }
        }
        if self.pending_link.is_some() {
            ctx.link().send_message(EditionViewerMsg::RetryLink);
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let context = &ctx.props().context;
        let current_page = self.sync.current().map(String::from);
        let image_url = self
            .sync
            .current()
            .and_then(|p| context.image_for_page(p))
            .map(facsimile_url);

        let on_prev = ctx.link().callback(|_| EditionViewerMsg::StepPage(-1));
        let on_next = ctx.link().callback(|_| EditionViewerMsg::StepPage(1));
        let on_loaded = ctx.link().callback(EditionViewerMsg::ImageLoaded);
        let on_failed = ctx.link().callback(EditionViewerMsg::ImageFailed);
        let loaded = current_page.is_some() && self.loaded_page == current_page;
        let failed = current_page.is_some() && self.failed_page == current_page;

        html! {
            <div class="edition-viewer">
                { self.render_controls(ctx) }
                <div class="viewer-content">
                    <Toc
                        context={context.clone()}
                        facets={self.facets.clone()}
                        selected_poem={self.selected_poem.clone()}
                        on_select={ctx.link().callback(EditionViewerMsg::SelectPoem)}
                    />
                    <section class="text-panel" ref={self.text_ref.clone()}>
                        { self.render_front(ctx) }
                        { for context.edition.books.iter().map(|book| self.render_book(ctx, book)) }
                    </section>
                    <ImagePanel
                        page={current_page}
                        image_url={image_url}
                        {loaded}
                        {failed}
                        on_prev={on_prev}
                        on_next={on_next}
                        on_loaded={on_loaded}
                        on_failed={on_failed}
                    />
                </div>
                { self.render_entity_panel(ctx) }
                { self.render_export_popup(ctx) }
            </div>
        }
    }
}

impl EditionViewer {
    fn apply_query(&mut self, context: &EditionContext, query: String) {
        let hits = search_edition(&context.edition, &query);
        // match navigation must only visit poems the facet filter shows
        self.hits = self.facets.filter_hits(&context.edition, hits);
        self.hits_by_line.clear();
        self.poems_with_hits.clear();
        for hit in &self.hits {
            if let Some(line_id) = &hit.line_id {
                self.hits_by_line
                    .entry(line_id.clone())
                    .or_default()
                    .push((hit.offset, hit.len));
            }
            if !hit.poem_id.is_empty() {
                self.poems_with_hits.insert(hit.poem_id.clone());
            }
        }
        self.cursor = SearchCursor::new(self.hits.len());
        self.query = query;
    }

    /// Free-text search and facet filter compose with AND.
    fn poem_visible(&self, poem: &Poem) -> bool {
        if !self.facets.matches(poem) {
            return false;
        }
        if self.query.trim().is_empty() {
            return true;
        }
        self.poems_with_hits.contains(&poem.id)
    }

    /// Scroll the current match into view and track its owning poem.
    fn focus_hit(&mut self, context: &EditionContext, pos: usize) {
        let Some(hit) = self.hits.get(pos) else {
            return;
        };
        let owner = match &hit.line_id {
            Some(line_id) => context.poem_of_line(line_id).map(|p| p.id.clone()),
            None => None,
        };
        // front-matter hits carry no poem id
        self.selected_poem = owner.or_else(|| {
            if hit.poem_id.is_empty() {
                None
            } else {
                Some(hit.poem_id.clone())
            }
        });
        let id = hit.line_id.as_deref().unwrap_or(hit.poem_id.as_str());
        scroll_to_element(id);
    }

    /// One bounded deep-link attempt; reschedules itself until the target
    /// element exists or the retry budget runs out.
    fn try_deep_link(&mut self, ctx: &Context<Self>) -> bool {
        let Some(target) = self.pending_link.clone() else {
            return false;
        };
        let id = target.element_id();
        let found = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .is_some();
        if found {
            scroll_to_element(id);
            if let Target::Poem(poem_id) = &target {
                self.selected_poem = Some(poem_id.clone());
            }
            self.pending_link = None;
            self.retry_timer = None;
            return true;
        }
        if self.retries.is_empty() {
            log::warn!("deep link target '{}' not found, giving up", id);
            self.pending_link = None;
            self.retry_timer = None;
            return false;
        }
        let delay = self.retries.remove(0);
        let link = ctx.link().clone();
        self.retry_timer = Some(Timeout::new(delay, move || {
            link.send_message(EditionViewerMsg::RetryLink);
        }));
        false
    }

    fn render_controls(&self, ctx: &Context<Self>) -> Html {
        let mode_button = |mode: ViewMode| {
            let onclick = ctx.link().callback(move |_| EditionViewerMsg::SetMode(mode));
            let class = if self.mode == mode { "active" } else { "" };
            html! { <button {class} {onclick}>{ mode.label() }</button> }
        };

        let oninput = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            EditionViewerMsg::QueryChanged(input.value())
        });
        let next = ctx.link().callback(|_| EditionViewerMsg::NextMatch);
        let prev = ctx.link().callback(|_| EditionViewerMsg::PrevMatch);

        let match_label = if self.query.trim().is_empty() {
            String::new()
        } else {
            match self.cursor.position() {
                Some(pos) => format!("{}/{}", pos + 1, self.hits.len()),
                None => format!("{} matches", self.hits.len()),
            }
        };

        let on_meter = ctx.link().callback(|e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            EditionViewerMsg::MeterFacet(select.value())
        });
        let on_genre = ctx.link().callback(|e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            EditionViewerMsg::GenreFacet(select.value())
        });

        let export_button = |kind: ExportKind, label: &str| {
            let onclick = ctx
                .link()
                .callback(move |_| EditionViewerMsg::ShowExport(kind));
            html! { <button {onclick}>{ label }</button> }
        };

        html! {
            <div class="controls-panel">
                <div class="view-toggles">
                    { mode_button(ViewMode::Diplomatic) }
                    { mode_button(ViewMode::Normalized) }
                    { mode_button(ViewMode::Translation) }
                    { mode_button(ViewMode::Commentary) }
                </div>
                <div class="search-controls">
                    <input
                        type="search"
                        placeholder="Search the edition…"
                        value={self.query.clone()}
                        {oninput}
                    />
                    <button onclick={prev} disabled={self.hits.is_empty()}>{"↑"}</button>
                    <button onclick={next} disabled={self.hits.is_empty()}>{"↓"}</button>
                    <span class="match-count">{ match_label }</span>
                </div>
                <div class="filter-controls">
                    <select onchange={on_meter}>
                        <option value="" selected={self.facets.meter.is_none()}>{"All meters"}</option>
                        { for [Meter::Elegiac, Meter::Sapphic, Meter::Hendecasyllabic, Meter::Other, Meter::Uncertain]
                            .iter().map(|m| html! {
                                <option value={m.label()} selected={self.facets.meter == Some(*m)}>{ m.label() }</option>
                            }) }
                    </select>
                    <select onchange={on_genre}>
                        <option value="" selected={self.facets.genre.is_none()}>{"All genres"}</option>
                        { for [Genre::Dedication, Genre::Praise, Genre::Invective, Genre::Epitaph,
                               Genre::Love, Genre::Religious, Genre::Consolation, Genre::Occasional,
                               Genre::Other]
                            .iter().map(|g| html! {
                                <option value={g.label()} selected={self.facets.genre == Some(*g)}>{ g.label() }</option>
                            }) }
                    </select>
                    { if self.facets.is_empty() { html!{} } else {
                        let onclick = ctx.link().callback(|_| EditionViewerMsg::ClearFacets);
                        html! { <button class="clear-facets" {onclick}>{"Clear filters"}</button> }
                    } }
                </div>
                <div class="export-controls">
                    { export_button(ExportKind::Text, "Text") }
                    { export_button(ExportKind::Json, "JSON") }
                    { export_button(ExportKind::Records, "CSV") }
                </div>
            </div>
        }
    }

    fn render_front(&self, ctx: &Context<Self>) -> Html {
        let Some(front) = &ctx.props().context.edition.front else {
            return html! {};
        };
        html! {
            <section class="front-matter">
                { for front.heads.iter().map(|h| html! { <h2 class="front-head">{ h }</h2> }) }
                { for front.lines.iter().map(|line| self.render_line(ctx, line, false)) }
            </section>
        }
    }

    fn render_book(&self, ctx: &Context<Self>, book: &crate::model::Book) -> Html {
        html! {
            <section class="book" id={book.id.clone()}>
                <h2 class="book-label">{ &book.label }</h2>
                { for book.poems.iter().map(|poem| self.render_poem(ctx, poem)) }
            </section>
        }
    }

    fn render_poem(&self, ctx: &Context<Self>, poem: &Poem) -> Html {
        let style = if self.poem_visible(poem) {
            ""
        } else {
            "display:none"
        };
        html! {
            <article class="poem" id={poem.id.clone()} {style}>
                { for poem.rubrics.iter().map(|r| html! { <div class="poem-rubric">{ r }</div> }) }
                { self.render_dedication(ctx, poem) }
                { self.render_poem_body(ctx, poem) }
                { self.render_poem_meta(poem) }
            </article>
        }
    }

    fn render_dedication(&self, ctx: &Context<Self>, poem: &Poem) -> Html {
        let Some(dedicatee) = &poem.dedicatee else {
            return html! {};
        };
        match &poem.dedicatee_ref {
            Some(target) => {
                let onclick = {
                    let id = target.clone();
                    ctx.link()
                        .callback(move |_| EditionViewerMsg::ShowEntity(id.clone()))
                };
                html! { <div class="poem-dedication"><span class="person-ref" {onclick}>{ dedicatee }</span></div> }
            }
            None => html! { <div class="poem-dedication">{ dedicatee }</div> },
        }
    }

    fn render_poem_body(&self, ctx: &Context<Self>, poem: &Poem) -> Html {
        match self.mode {
            ViewMode::Diplomatic | ViewMode::Normalized => html! {
                { for poem.groups.iter().map(|group| html! {
                    <div class={classes!("line-group", format!("lg-{}", group.kind))}>
                        { for group.lines.iter().map(|line| {
                            self.render_line(ctx, line, self.mode == ViewMode::Normalized)
                        }) }
                    </div>
                }) }
            },
            ViewMode::Translation => {
                self.render_side_table(ctx, poem, true)
            }
            ViewMode::Commentary => {
                self.render_side_table(ctx, poem, false)
            }
        }
    }

    /// Translation and commentary come from side tables keyed by poem id;
    /// a missing entry is a placeholder, never an error.
    fn render_side_table(&self, ctx: &Context<Self>, poem: &Poem, translation: bool) -> Html {
        let edition = &ctx.props().context.edition;
        let (table, missing) = if translation {
            (&edition.translations, "No translation available for this poem.")
        } else {
            (&edition.commentary, "No commentary available for this poem.")
        };
        match table.get(&poem.id) {
            Some(text) => html! { <p class="prose">{ text }</p> },
            None => html! { <p class="prose missing">{ missing }</p> },
        }
    }

    fn render_line(&self, ctx: &Context<Self>, line: &Line, normalized: bool) -> Html {
        let folio = match &line.page_break {
            Some(pb) => {
                let onclick = {
                    let label = pb.label.clone();
                    ctx.link()
                        .callback(move |_| EditionViewerMsg::SelectPage(label.clone()))
                };
                html! {
                    <span
                        class="folio-anchor"
                        id={folio_dom_id(&pb.label)}
                        data-page={pb.label.clone()}
                        title={format!("folio {}", pb.label)}
                        {onclick}
                    >
                        { format!("[{}]", pb.label) }
                    </span>
                }
            }
            None => html! {},
        };

        let text_class = if line.indent {
            "line-text indented"
        } else {
            "line-text"
        };

        let body = if normalized {
            let shown = line.norm.as_deref().unwrap_or(&line.text);
            if self.hits_by_line.contains_key(&line.id) {
                // offsets from the search index are byte positions in the
                // diplomatic text; rescan the displayed form instead
                render_highlighted(shown, &find_all(shown, self.query.trim()))
            } else {
                html! { <>{ shown.to_string() }</> }
            }
        } else if let Some(ranges) = self.hits_by_line.get(&line.id) {
            render_highlighted(&line.text, ranges)
        } else {
            self.render_segments(ctx, line)
        };

        html! {
            <div class="verse-line" id={line.id.clone()}>
                <span class="line-number">{ line.n }</span>
                { folio }
                <span class={text_class}>{ body }</span>
            </div>
        }
    }

    fn render_segments(&self, ctx: &Context<Self>, line: &Line) -> Html {
        html! {
            { for line.segments.iter().map(|seg| match seg {
                Seg::Plain { text } => html! { <>{ text }</> },
                Seg::Parenthesis { text } => html! { <span class="parenthesis">{ text }</span> },
                Seg::Speech { text } => html! { <span class="speech">{ text }</span> },
                Seg::PersonRef { target, text } => {
                    let onclick = {
                        let id = target.clone();
                        ctx.link().callback(move |_| EditionViewerMsg::ShowEntity(id.clone()))
                    };
                    html! { <span class="person-ref" {onclick}>{ text }</span> }
                }
                Seg::PlaceRef { target, text } => {
                    let onclick = {
                        let id = target.clone();
                        ctx.link().callback(move |_| EditionViewerMsg::ShowEntity(id.clone()))
                    };
                    html! { <span class="place-ref" {onclick}>{ text }</span> }
                }
            }) }
        }
    }

    fn render_poem_meta(&self, poem: &Poem) -> Html {
        let genres = poem
            .genres
            .iter()
            .map(|g| g.label())
            .collect::<Vec<_>>()
            .join(", ");
        html! {
            <div class="poem-meta">
                <span class="meter">{ poem.meter.label() }</span>
                { if genres.is_empty() { html!{} } else { html! { <span class="genres">{ genres }</span> } } }
                <span class="line-count">{ format!("{} lines", poem.line_count()) }</span>
            </div>
        }
    }

    fn render_entity_panel(&self, ctx: &Context<Self>) -> Html {
        let Some(id) = &self.selected_entity else {
            return html! {};
        };
        let context = &ctx.props().context;
        let on_close = ctx.link().callback(|_| EditionViewerMsg::CloseEntity);

        let body = match context.entity(id) {
            Some(Entity::Person(person)) => {
                let relations: Vec<&Relation> = context
                    .edition
                    .stand_off
                    .relations
                    .iter()
                    .filter(|r| r.from == *id || r.to == *id)
                    .collect();
                html! {
                    <>
                        <h3>{ &person.name }</h3>
                        { for person.alt_names.iter().map(|a| html! { <p class="alt-name">{ a }</p> }) }
                        <dl>
                            { render_field("Birth", person.birth.as_deref()) }
                            { render_field("Death", person.death.as_deref()) }
                            { render_field("Occupation", person.occupation.as_deref()) }
                            { render_field("Note", person.note.as_deref()) }
                        </dl>
                        { if relations.is_empty() { html!{} } else { html! {
                            <>
                                <h4>{"Relations"}</h4>
                                <ul>
                                    { for relations.iter().map(|r| {
                                        let other = if r.from == *id { &r.to } else { &r.from };
                                        let other_name = context.entity(other)
                                            .map(|e| e.name().to_string())
                                            .unwrap_or_else(|| other.clone());
                                        let arrow = if r.mutual { "↔" } else { "→" };
                                        html! { <li>{ format!("{} {} {}", r.name, arrow, other_name) }</li> }
                                    }) }
                                </ul>
                            </>
                        } } }
                        { self.render_mentions(ctx, id) }
                    </>
                }
            }
            Some(Entity::Place(place)) => html! {
                <>
                    <h3>{ &place.name }</h3>
                    <dl>{ render_field("Note", place.note.as_deref()) }</dl>
                    { self.render_mentions(ctx, id) }
                </>
            },
            None => html! { <p>{ format!("Unknown entity: {}", id) }</p> },
        };

        html! {
            <aside class="entity-panel">
                <button class="close-btn" onclick={on_close}>{"×"}</button>
                { body }
            </aside>
        }
    }

    fn render_mentions(&self, ctx: &Context<Self>, id: &str) -> Html {
        let context = &ctx.props().context;
        let Some(line_ids) = context.index.refs_by_entity.get(id) else {
            return html! {};
        };
        html! {
            <>
                <h4>{ format!("Mentioned in {} lines", line_ids.len()) }</h4>
                <ul class="mentions">
                    { for line_ids.iter().map(|line_id| {
                        let onclick = {
                            let id = line_id.clone();
                            ctx.link().callback(move |_| EditionViewerMsg::JumpTo(id.clone()))
                        };
                        html! { <li class="mention" {onclick}>{ line_id }</li> }
                    }) }
                </ul>
            </>
        }
    }

    fn render_export_popup(&self, ctx: &Context<Self>) -> Html {
        let Some((kind, content)) = &self.export_view else {
            return html! {};
        };
        let title = match kind {
            ExportKind::Text => "Plain text",
            ExportKind::Json => "Structured document (JSON)",
            ExportKind::Records => "Poem records (CSV)",
        };
        let on_close = ctx.link().callback(|_| EditionViewerMsg::CloseExport);
        html! {
            <div class="export-popup-overlay">
                <div class="export-popup">
                    <div class="export-popup-header">
                        <h2>{ title }</h2>
                        <button class="close-btn" onclick={on_close}>{"×"}</button>
                    </div>
                    <pre class="export-content">{ content }</pre>
                </div>
            </div>
        }
    }
}

fn render_field(label: &str, value: Option<&str>) -> Html {
    match value {
        Some(v) => html! { <><dt>{ label }</dt><dd>{ v }</dd></> },
        None => html! {},
    }
}

fn render_highlighted(text: &str, ranges: &[(usize, usize)]) -> Html {
    let mut parts = Vec::new();
    let mut pos = 0;
    for &(start, len) in ranges {
        if start > pos {
            parts.push(html! { <>{ text[pos..start].to_string() }</> });
        }
        parts.push(html! { <mark>{ text[start..start + len].to_string() }</mark> });
        pos = start + len;
    }
    if pos < text.len() {
        parts.push(html! { <>{ text[pos..].to_string() }</> });
    }
    html! { <>{ for parts.into_iter() }</> }
}

/// Anchors currently intersecting the text panel's viewport, with their
/// offsets from the panel top. Feeds the page-sync controller.
fn collect_anchor_hits(panel: &Element) -> Vec<AnchorHit> {
    let mut hits = Vec::new();
    let panel_rect = panel.get_bounding_client_rect();
    let top = panel_rect.top();
    let bottom = panel_rect.bottom();
    if let Ok(nodes) = panel.query_selector_all(".folio-anchor") {
        for i in 0..nodes.length() {
            let Some(node) = nodes.item(i) else { continue };
            let Ok(el) = node.dyn_into::<Element>() else {
                continue;
            };
            let rect = el.get_bounding_client_rect();
            if rect.bottom() < top || rect.top() > bottom {
                continue;
            }
            if let Some(page) = el.get_attribute("data-page") {
                hits.push(AnchorHit {
                    page,
                    top: rect.top() - top,
                });
            }
        }
    }
    hits
}

fn scroll_to_element(id: &str) {
    let Some(el) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(id))
    else {
        return;
    };
    let opts = ScrollIntoViewOptions::new();
    opts.set_behavior(ScrollBehavior::Smooth);
    opts.set_block(ScrollLogicalPosition::Start);
    el.scroll_into_view_with_scroll_into_view_options(&opts);
}
