// src/model.rs
//
// Immutable document tree for the Lucina edition. The whole tree is built
// once by the TEI loader and never mutated afterwards; standoff entities
// (persons, places, relations) are referenced by id only, so the tree stays
// a strict DAG and the prosopographical back-references live in the index.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors fatal to a load attempt. Resource-level problems (a missing
/// facsimile image, an absent translation entry) are not represented here;
/// those degrade to placeholders at render time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("<{element}> is not allowed under <{parent}>")]
    MalformedHierarchy {
        element: String,
        parent: &'static str,
    },
    #[error("reference '{target}' in {origin} does not resolve to a standoff entity")]
    DanglingRef { origin: String, target: String },
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("document contains no books")]
    EmptyDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edition {
    pub title: String,
    pub author: String,
    pub front: Option<Front>,
    pub books: Vec<Book>,
    pub stand_off: StandOff,
    /// Prose translation per poem id, from back matter. Absent entries render
    /// as a placeholder in translation mode.
    pub translations: HashMap<String, String>,
    /// Editorial commentary per poem id, from back matter.
    pub commentary: HashMap<String, String>,
}

/// Front matter before Book I: prefatory headings and prose, with its own
/// page breaks so the first folios participate in facsimile sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Front {
    pub heads: Vec<String>,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub label: String,
    pub n: u32,
    pub poems: Vec<Poem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poem {
    pub id: String,
    pub n: u32,
    pub dedicatee: Option<String>,
    /// Person id of the dedicatee, when the dedication head carries @corresp.
    pub dedicatee_ref: Option<String>,
    pub rubrics: Vec<String>,
    pub meter: Meter,
    pub genres: Vec<Genre>,
    pub groups: Vec<LineGroup>,
}

impl Poem {
    pub fn line_count(&self) -> usize {
        self.groups.iter().map(|g| g.lines.len()).sum()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.groups.iter().flat_map(|g| g.lines.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineGroup {
    /// Metrical type tag from lg/@type, e.g. "elegiac".
    pub kind: String,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    pub n: u32,
    /// Diplomatic text, concatenation of the segments.
    pub text: String,
    /// Normalized reading where the transcription supplies one.
    pub norm: Option<String>,
    /// Pentameter position in an elegiac couplet.
    pub indent: bool,
    pub segments: Vec<Seg>,
    /// A folio boundary falling on this line (may occur mid-poem).
    pub page_break: Option<PageBreak>,
}

/// Inline span of a verse line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Seg {
    Plain { text: String },
    Parenthesis { text: String },
    Speech { text: String },
    PersonRef { target: String, text: String },
    PlaceRef { target: String, text: String },
}

impl Seg {
    pub fn text(&self) -> &str {
        match self {
            Seg::Plain { text }
            | Seg::Parenthesis { text }
            | Seg::Speech { text }
            | Seg::PersonRef { text, .. }
            | Seg::PlaceRef { text, .. } => text,
        }
    }

    /// Standoff id this segment points at, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Seg::PersonRef { target, .. } | Seg::PlaceRef { target, .. } => Some(target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBreak {
    /// Folio label, e.g. "6.2".
    pub label: String,
    /// Facsimile image file for this folio.
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Meter {
    Elegiac,
    Sapphic,
    Hendecasyllabic,
    Other,
    Uncertain,
}

impl Meter {
    pub fn parse(value: &str) -> Meter {
        match value.trim().to_ascii_lowercase().as_str() {
            "elegiac" => Meter::Elegiac,
            "sapphic" => Meter::Sapphic,
            "hendecasyllabic" => Meter::Hendecasyllabic,
            "" | "uncertain" => Meter::Uncertain,
            _ => Meter::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Meter::Elegiac => "elegiac",
            Meter::Sapphic => "sapphic",
            Meter::Hendecasyllabic => "hendecasyllabic",
            Meter::Other => "other",
            Meter::Uncertain => "uncertain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Dedication,
    Praise,
    Invective,
    Epitaph,
    Love,
    Religious,
    Consolation,
    Occasional,
    Other,
}

impl Genre {
    /// Parse one `#token` from a poem's @ana attribute.
    pub fn parse(token: &str) -> Genre {
        match token.trim_start_matches('#').to_ascii_lowercase().as_str() {
            "dedication" => Genre::Dedication,
            "praise" | "panegyric" => Genre::Praise,
            "invective" => Genre::Invective,
            "epitaph" | "funerary" => Genre::Epitaph,
            "love" | "erotic" => Genre::Love,
            "religious" | "devotional" => Genre::Religious,
            "consolation" => Genre::Consolation,
            "occasional" => Genre::Occasional,
            _ => Genre::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Genre::Dedication => "dedication",
            Genre::Praise => "praise",
            Genre::Invective => "invective",
            Genre::Epitaph => "epitaph",
            Genre::Love => "love",
            Genre::Religious => "religious",
            Genre::Consolation => "consolation",
            Genre::Occasional => "occasional",
            Genre::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandOff {
    pub persons: Vec<Person>,
    pub places: Vec<Place>,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub alt_names: Vec<String>,
    pub birth: Option<String>,
    pub death: Option<String>,
    pub occupation: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub note: Option<String>,
}

/// Link between two persons from standOff/listRelation. Directed unless
/// `mutual` is set (e.g. friendship vs. patronage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub from: String,
    pub to: String,
    pub mutual: bool,
}

impl Edition {
    /// All lines in document order: front matter first, then every book.
    pub fn all_lines(&self) -> impl Iterator<Item = &Line> {
        let front = self.front.iter().flat_map(|f| f.lines.iter());
        let body = self
            .books
            .iter()
            .flat_map(|b| b.poems.iter())
            .flat_map(|p| p.lines());
        front.chain(body)
    }

    pub fn poem_count(&self) -> usize {
        self.books.iter().map(|b| b.poems.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_parsing() {
        assert_eq!(Meter::parse("elegiac"), Meter::Elegiac);
        assert_eq!(Meter::parse("Sapphic"), Meter::Sapphic);
        assert_eq!(Meter::parse(""), Meter::Uncertain);
        assert_eq!(Meter::parse("iambic"), Meter::Other);
    }

    #[test]
    fn genre_parsing_strips_hash() {
        assert_eq!(Genre::parse("#praise"), Genre::Praise);
        assert_eq!(Genre::parse("epitaph"), Genre::Epitaph);
        assert_eq!(Genre::parse("#strange"), Genre::Other);
    }

    #[test]
    fn segment_text_and_target() {
        let seg = Seg::PersonRef {
            target: "person-cydonius".into(),
            text: "Cydoni".into(),
        };
        assert_eq!(seg.text(), "Cydoni");
        assert_eq!(seg.target(), Some("person-cydonius"));
        let plain = Seg::Plain { text: "ad".into() };
        assert_eq!(plain.target(), None);
    }

    #[test]
    fn load_error_messages_name_the_offender() {
        let err = LoadError::DanglingRef {
            origin: "poem-I.1".into(),
            target: "person-ghost".into(),
        };
        assert!(err.to_string().contains("person-ghost"));
        assert!(err.to_string().contains("poem-I.1"));
    }
}
