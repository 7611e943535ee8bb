// src/components/toc.rs
use crate::index::EditionContext;
use crate::model::Poem;
use crate::search::Facets;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct TocProps {
    pub context: EditionContext,
    /// Facet filter from the shell; poems failing it are greyed out.
    pub facets: Facets,
    pub selected_poem: Option<String>,
    pub on_select: Callback<String>,
}

/// Table of contents: one entry per book, expandable to per-poem entries
/// labeled by ordinal and dedicatee.
#[function_component(Toc)]
pub fn toc(props: &TocProps) -> Html {
    let expanded = use_state(|| 0usize);

    let books = &props.context.edition.books;
    html! {
        <nav class="toc">
            <h2>{"Contents"}</h2>
            { for books.iter().enumerate().map(|(bi, book)| {
                let is_open = *expanded == bi;
                let toggle = {
                    let expanded = expanded.clone();
                    Callback::from(move |_| expanded.set(bi))
                };
                html! {
                    <div class="toc-book">
                        <div class="toc-book-header" onclick={toggle}>
                            { format!("{} ({} poems)", book.label, book.poems.len()) }
                        </div>
                        { if is_open {
                            html! {
                                <ul class="toc-poems">
                                    { for book.poems.iter().map(|poem| render_entry(props, book.n, poem)) }
                                </ul>
                            }
                        } else {
                            html! {}
                        } }
                    </div>
                }
            }) }
        </nav>
    }
}

fn render_entry(props: &TocProps, book_n: u32, poem: &Poem) -> Html {
    let label = match &poem.dedicatee {
        Some(dedicatee) => format!("{}.{} — {}", book_n, poem.n, dedicatee),
        None => format!("{}.{}", book_n, poem.n),
    };
    let mut class = classes!("toc-poem");
    if props.selected_poem.as_deref() == Some(poem.id.as_str()) {
        class.push("active");
    }
    if !props.facets.matches(poem) {
        class.push("filtered-out");
    }
    let onclick = {
        let on_select = props.on_select.clone();
        let id = poem.id.clone();
        Callback::from(move |_| on_select.emit(id.clone()))
    };
    html! {
        <li {class} {onclick}>{ label }</li>
    }
}
