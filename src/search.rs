// src/search.rs
//
// Linear substring search over the edition corpus: every verse line plus
// poem metadata (dedicatee, rubrics). Matches come back in document order
// with byte offsets valid into the original text, so highlight rendering
// can slice without touching the model. Facet filtering is a separate
// exact-match predicate over poem metadata and composes with free-text
// search by logical AND.

use crate::model::{Edition, Genre, Meter, Poem};
use std::collections::HashSet;

/// Metadata field a poem-level match was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Dedicatee,
    Rubric,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub poem_id: String,
    /// Line the match occurred in; None for poem metadata matches.
    pub line_id: Option<String>,
    pub field: Option<MetaField>,
    /// Byte offset of the match in the original text.
    pub offset: usize,
    /// Byte length of the matched substring.
    pub len: usize,
}

/// Case-insensitive scan, document order. A query that is empty or
/// whitespace-only clears the search (empty result).
pub fn search_edition(edition: &Edition, query: &str) -> Vec<SearchHit> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let mut hits = Vec::new();

    if let Some(front) = &edition.front {
        for line in &front.lines {
            for (offset, len) in find_all(&line.text, query) {
                hits.push(SearchHit {
                    poem_id: String::new(),
                    line_id: Some(line.id.clone()),
                    field: None,
                    offset,
                    len,
                });
            }
        }
    }

    for book in &edition.books {
        for poem in &book.poems {
            if let Some(dedicatee) = &poem.dedicatee {
                for (offset, len) in find_all(dedicatee, query) {
                    hits.push(SearchHit {
                        poem_id: poem.id.clone(),
                        line_id: None,
                        field: Some(MetaField::Dedicatee),
                        offset,
                        len,
                    });
                }
            }
            for rubric in &poem.rubrics {
                for (offset, len) in find_all(rubric, query) {
                    hits.push(SearchHit {
                        poem_id: poem.id.clone(),
                        line_id: None,
                        field: Some(MetaField::Rubric),
                        offset,
                        len,
                    });
                }
            }
            for line in poem.lines() {
                for (offset, len) in find_all(&line.text, query) {
                    hits.push(SearchHit {
                        poem_id: poem.id.clone(),
                        line_id: Some(line.id.clone()),
                        field: None,
                        offset,
                        len,
                    });
                }
            }
        }
    }
    hits
}

/// All case-insensitive occurrences of `needle` in `haystack` as
/// (byte offset, byte length) pairs. Non-overlapping, left to right.
pub fn find_all(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut at = 0;
    let bytes_len = haystack.len();
    while at < bytes_len {
        if !haystack.is_char_boundary(at) {
            at += 1;
            continue;
        }
        match match_len_at(&haystack[at..], needle) {
            Some(len) => {
                out.push((at, len));
                at += len.max(1);
            }
            None => at += 1,
        }
    }
    out
}

/// If `haystack` starts with `needle` ignoring case, the byte length the
/// match covers in `haystack`. Folds char-by-char, so Latin text with the
/// occasional accented form compares correctly.
fn match_len_at(haystack: &str, needle: &str) -> Option<usize> {
    let mut hay = haystack.char_indices();
    let mut consumed = 0;
    let mut pending: Vec<char> = Vec::new();
    for nc in needle.chars().flat_map(char::to_lowercase) {
        let hc = match pending.pop() {
            Some(c) => c,
            None => {
                let (i, c) = hay.next()?;
                consumed = i + c.len_utf8();
                let mut folded: Vec<char> = c.to_lowercase().collect();
                folded.reverse();
                let first = folded.pop()?;
                pending = folded;
                first
            }
        };
        if hc != nc {
            return None;
        }
    }
    if pending.is_empty() {
        Some(consumed)
    } else {
        None
    }
}

/// Cyclic cursor over an ordered match list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchCursor {
    len: usize,
    pos: Option<usize>,
}

impl SearchCursor {
    pub fn new(len: usize) -> SearchCursor {
        SearchCursor { len, pos: None }
    }

    pub fn position(&self) -> Option<usize> {
        self.pos
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let next = match self.pos {
            Some(p) => (p + 1) % self.len,
            None => 0,
        };
        self.pos = Some(next);
        self.pos
    }

    pub fn prev(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let prev = match self.pos {
            Some(0) | None => self.len - 1,
            Some(p) => p - 1,
        };
        self.pos = Some(prev);
        self.pos
    }
}

/// Structured facet filter; every set field must match exactly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Facets {
    pub meter: Option<Meter>,
    pub genre: Option<Genre>,
    pub dedicatee: Option<String>,
}

impl Facets {
    pub fn is_empty(&self) -> bool {
        self.meter.is_none() && self.genre.is_none() && self.dedicatee.is_none()
    }

    /// Drop hits whose poem the facet filter excludes, so match navigation
    /// never lands inside a hidden poem. Front-matter hits carry no poem id
    /// and always pass.
    pub fn filter_hits(&self, edition: &Edition, mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
        if self.is_empty() {
            return hits;
        }
        let visible: HashSet<&str> = edition
            .books
            .iter()
            .flat_map(|b| b.poems.iter())
            .filter(|p| self.matches(p))
            .map(|p| p.id.as_str())
            .collect();
        hits.retain(|h| h.poem_id.is_empty() || visible.contains(h.poem_id.as_str()));
        hits
    }

    pub fn matches(&self, poem: &Poem) -> bool {
        if let Some(meter) = self.meter {
            if poem.meter != meter {
                return false;
            }
        }
        if let Some(genre) = self.genre {
            if !poem.genres.contains(&genre) {
                return false;
            }
        }
        if let Some(dedicatee) = &self.dedicatee {
            if poem.dedicatee.as_deref() != Some(dedicatee.as_str()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn poem_with(lines: &[(&str, &str)], dedicatee: Option<&str>) -> Poem {
        Poem {
            id: "poem-I.1".into(),
            n: 1,
            dedicatee: dedicatee.map(String::from),
            dedicatee_ref: None,
            rubrics: vec!["Incipit".into()],
            meter: Meter::Elegiac,
            genres: vec![Genre::Praise],
            groups: vec![LineGroup {
                kind: "elegiac".into(),
                lines: lines
                    .iter()
                    .enumerate()
                    .map(|(i, (id, text))| Line {
                        id: (*id).into(),
                        n: i as u32 + 1,
                        text: (*text).into(),
                        norm: None,
                        indent: false,
                        segments: vec![Seg::Plain { text: (*text).into() }],
                        page_break: None,
                    })
                    .collect(),
            }],
        }
    }

    fn edition_with(poem: Poem) -> Edition {
        Edition {
            title: "Lucina".into(),
            author: "Albrisius".into(),
            front: None,
            books: vec![Book {
                id: "book-1".into(),
                label: "Liber I".into(),
                n: 1,
                poems: vec![poem],
            }],
            stand_off: StandOff::default(),
            translations: Default::default(),
            commentary: Default::default(),
        }
    }

    #[test]
    fn single_match_offset_slices_back_to_query() {
        let ed = edition_with(poem_with(
            &[("l1", "Aspice Cydoni munera parva"), ("l2", "quae tibi mittimus")],
            None,
        ));
        let hits = search_edition(&ed, "cydoni");
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.line_id.as_deref(), Some("l1"));
        let line = "Aspice Cydoni munera parva";
        let sliced = &line[hit.offset..hit.offset + hit.len];
        assert!(sliced.eq_ignore_ascii_case("cydoni"));
    }

    #[test]
    fn matches_come_back_in_document_order() {
        let ed = edition_with(poem_with(
            &[("l1", "arma virumque"), ("l2", "arma iterum"), ("l3", "pax")],
            Some("Ad Armam"),
        ));
        let hits = search_edition(&ed, "arma");
        let ids: Vec<_> = hits
            .iter()
            .map(|h| h.line_id.clone().unwrap_or_else(|| "meta".into()))
            .collect();
        // dedicatee metadata precedes the poem's lines in document order
        assert_eq!(ids, vec!["meta", "l1", "l2"]);
        assert_eq!(hits[0].field, Some(MetaField::Dedicatee));
    }

    #[test]
    fn whitespace_query_clears_search() {
        let ed = edition_with(poem_with(&[("l1", "arma")], None));
        assert!(search_edition(&ed, "").is_empty());
        assert!(search_edition(&ed, "   ").is_empty());
    }

    #[test]
    fn case_insensitive_both_directions() {
        assert_eq!(find_all("Arma ARMA arma", "ArMa").len(), 3);
        assert_eq!(find_all("ARMA", "arma"), vec![(0, 4)]);
    }

    #[test]
    fn multiple_hits_in_one_line() {
        let hits = find_all("rosa rosam rosae", "rosa");
        assert_eq!(hits, vec![(0, 4), (5, 4), (11, 4)]);
    }

    #[test]
    fn cursor_cycles_both_ways() {
        let mut cur = SearchCursor::new(3);
        assert_eq!(cur.next(), Some(0));
        assert_eq!(cur.next(), Some(1));
        assert_eq!(cur.next(), Some(2));
        assert_eq!(cur.next(), Some(0));
        assert_eq!(cur.prev(), Some(2));
        let mut empty = SearchCursor::new(0);
        assert_eq!(empty.next(), None);
        assert_eq!(empty.prev(), None);
    }

    #[test]
    fn highlight_ranges_follow_the_displayed_form() {
        // diplomatic and normalized spellings differ, so offsets computed
        // against one form do not slice the other; each form is scanned on
        // its own
        let diplomatic = "Aspice quae tibi mittimus";
        let normalized = "Aspice que tibi mittimus";
        assert_eq!(find_all(diplomatic, "tibi"), vec![(12, 4)]);
        assert_eq!(find_all(normalized, "tibi"), vec![(11, 4)]);
    }

    #[test]
    fn facet_filter_drops_hits_in_hidden_poems() {
        let mut ed = edition_with(poem_with(&[("l1", "arma virumque")], None));
        let mut sapphic = poem_with(&[("l2", "arma iterum")], None);
        sapphic.id = "poem-I.2".into();
        sapphic.meter = Meter::Sapphic;
        ed.books[0].poems.push(sapphic);

        let hits = search_edition(&ed, "arma");
        assert_eq!(hits.len(), 2);

        let mut facets = Facets::default();
        assert_eq!(facets.filter_hits(&ed, hits.clone()).len(), 2);

        facets.meter = Some(Meter::Elegiac);
        let kept = facets.filter_hits(&ed, hits);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].poem_id, "poem-I.1");
    }

    #[test]
    fn facets_match_exactly_and_compose() {
        let poem = poem_with(&[("l1", "arma")], Some("Ad Cydonium"));
        let mut facets = Facets::default();
        assert!(facets.is_empty());
        assert!(facets.matches(&poem));

        facets.meter = Some(Meter::Elegiac);
        facets.genre = Some(Genre::Praise);
        assert!(facets.matches(&poem));

        facets.dedicatee = Some("Ad Cydonium".into());
        assert!(facets.matches(&poem));

        facets.meter = Some(Meter::Sapphic);
        assert!(!facets.matches(&poem));
    }
}
