// src/navigate.rs
//
// Deep-link URL contract: the fragment names a poem or line, optional query
// parameters carry a search term and an explicit folio. Rendering is
// asynchronous, so the shell walks a bounded retry schedule until the
// target element exists in the DOM; exhausting the budget is a reported
// "target not found", never an open-ended timer.

/// Parsed fragment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Poem(String),
    Line(String),
}

impl Target {
    /// The DOM id the rendered element carries.
    pub fn element_id(&self) -> &str {
        match self {
            Target::Poem(id) | Target::Line(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub target: Option<Target>,
    /// `q=` free-text search term.
    pub query: Option<String>,
    /// `page=` explicit folio label.
    pub page: Option<String>,
}

/// Parse `location.hash` + `location.search` into a route. Unknown
/// parameters are ignored; an empty fragment yields no target.
pub fn parse_route(fragment: &str, search: &str) -> Route {
    let fragment = fragment.trim_start_matches('#');
    let target = if fragment.is_empty() {
        None
    } else if fragment.starts_with("poem-") {
        Some(Target::Poem(fragment.to_string()))
    } else {
        Some(Target::Line(fragment.to_string()))
    };

    let mut query = None;
    let mut page = None;
    for pair in search.trim_start_matches('?').split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = percent_decode(value);
        if value.is_empty() {
            continue;
        }
        match key {
            "q" => query = Some(value),
            "page" => page = Some(value),
            _ => {}
        }
    }
    Route {
        target,
        query,
        page,
    }
}

/// Minimal decoder for the two query parameters we accept: `+` and the
/// common percent escapes. Invalid escapes pass through verbatim.
fn percent_decode(raw: &str) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hex = bytes.get(i + 1..i + 3);
                match hex.and_then(|h| u8::from_str_radix(std::str::from_utf8(h).ok()?, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// DOM id carried by a folio anchor element, so an explicit `page=`
/// parameter can scroll the text panel to the folio's position.
pub fn folio_dom_id(label: &str) -> String {
    format!("folio-{}", label)
}

/// Bounded backoff schedule in milliseconds: doubling from `base_ms`,
/// capped at one second per attempt.
pub fn retry_delays(attempts: u32, base_ms: u32) -> Vec<u32> {
    (0..attempts)
        .map(|i| base_ms.saturating_mul(1 << i.min(10)).min(1_000))
        .collect()
}
