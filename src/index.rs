// src/index.rs
//
// Lookup structures derived from the loaded edition. The maps hold tree
// positions, never clones of tree nodes; `EditionContext` bundles the tree
// with its index and is passed by reference to every component, replacing
// the ambient globals of earlier generations of this edition.

use crate::model::{Edition, Line, Place, Poem, Person, LoadError};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Position of a poem in the tree: (book index, poem index).
pub type PoemPos = (usize, usize);

/// Position of a line. Front-matter lines have no poem position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePos {
    Front(usize),
    Body {
        book: usize,
        poem: usize,
        group: usize,
        line: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPos {
    Person(usize),
    Place(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entity<'a> {
    Person(&'a Person),
    Place(&'a Place),
}

impl<'a> Entity<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Entity::Person(p) => &p.name,
            Entity::Place(p) => &p.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditionIndex {
    pub poems_by_id: HashMap<String, PoemPos>,
    pub lines_by_id: HashMap<String, LinePos>,
    /// Folio label -> facsimile image file. Total over every declared break.
    pub page_to_image: HashMap<String, String>,
    /// Folio labels in document order, for next/previous navigation.
    pub ordered_pages: Vec<String>,
    pub entities_by_id: HashMap<String, EntityPos>,
    /// Entity id -> line ids mentioning it, in document order.
    pub refs_by_entity: HashMap<String, Vec<String>>,
}

impl EditionIndex {
    /// Walk the tree once and build every map. Any duplicate id is a hard
    /// error; silently overwriting an entry would corrupt navigation. Poem
    /// and line ids share one namespace (both become DOM element ids), so a
    /// poem id reused by a line is a duplicate too.
    pub fn build(edition: &Edition) -> Result<EditionIndex, LoadError> {
        let mut index = EditionIndex::default();
        let mut element_ids: HashSet<String> = HashSet::new();

        let mut index_line = |index: &mut EditionIndex,
                              element_ids: &mut HashSet<String>,
                              line: &Line,
                              pos: LinePos|
         -> Result<(), LoadError> {
            if !element_ids.insert(line.id.clone()) {
                return Err(LoadError::DuplicateId {
                    kind: "line",
                    id: line.id.clone(),
                });
            }
            index.lines_by_id.insert(line.id.clone(), pos);
            if let Some(pb) = &line.page_break {
                if index
                    .page_to_image
                    .insert(pb.label.clone(), pb.image.clone())
                    .is_some()
                {
                    return Err(LoadError::DuplicateId {
                        kind: "page",
                        id: pb.label.clone(),
                    });
                }
                index.ordered_pages.push(pb.label.clone());
            }
            for seg in &line.segments {
                if let Some(target) = seg.target() {
                    let refs = index.refs_by_entity.entry(target.to_string()).or_default();
                    if refs.last().map(String::as_str) != Some(line.id.as_str()) {
                        refs.push(line.id.clone());
                    }
                }
            }
            Ok(())
        };

        if let Some(front) = &edition.front {
            for (i, line) in front.lines.iter().enumerate() {
                index_line(&mut index, &mut element_ids, line, LinePos::Front(i))?;
            }
        }

        for (bi, book) in edition.books.iter().enumerate() {
            for (pi, poem) in book.poems.iter().enumerate() {
                if !element_ids.insert(poem.id.clone()) {
                    return Err(LoadError::DuplicateId {
                        kind: "poem",
                        id: poem.id.clone(),
                    });
                }
                index.poems_by_id.insert(poem.id.clone(), (bi, pi));
                for (gi, group) in poem.groups.iter().enumerate() {
                    for (li, line) in group.lines.iter().enumerate() {
                        index_line(
                            &mut index,
                            &mut element_ids,
                            line,
                            LinePos::Body {
                                book: bi,
                                poem: pi,
                                group: gi,
                                line: li,
                            },
                        )?;
                    }
                }
            }
        }

        for (i, person) in edition.stand_off.persons.iter().enumerate() {
            if index
                .entities_by_id
                .insert(person.id.clone(), EntityPos::Person(i))
                .is_some()
            {
                return Err(LoadError::DuplicateId {
                    kind: "entity",
                    id: person.id.clone(),
                });
            }
        }
        for (i, place) in edition.stand_off.places.iter().enumerate() {
            if index
                .entities_by_id
                .insert(place.id.clone(), EntityPos::Place(i))
                .is_some()
            {
                return Err(LoadError::DuplicateId {
                    kind: "entity",
                    id: place.id.clone(),
                });
            }
        }

        Ok(index)
    }
}

/// Loaded edition plus its index, shared read-only across components.
#[derive(Debug, Clone, PartialEq)]
pub struct EditionContext {
    pub edition: Rc<Edition>,
    pub index: Rc<EditionIndex>,
}

impl EditionContext {
    pub fn new(edition: Edition) -> Result<EditionContext, LoadError> {
        let index = EditionIndex::build(&edition)?;
        Ok(EditionContext {
            edition: Rc::new(edition),
            index: Rc::new(index),
        })
    }

    pub fn poem(&self, id: &str) -> Option<&Poem> {
        let &(bi, pi) = self.index.poems_by_id.get(id)?;
        Some(&self.edition.books[bi].poems[pi])
    }

    pub fn line(&self, id: &str) -> Option<&Line> {
        match *self.index.lines_by_id.get(id)? {
            LinePos::Front(i) => self.edition.front.as_ref().map(|f| &f.lines[i]),
            LinePos::Body {
                book,
                poem,
                group,
                line,
            } => Some(&self.edition.books[book].poems[poem].groups[group].lines[line]),
        }
    }

    pub fn entity(&self, id: &str) -> Option<Entity<'_>> {
        match *self.index.entities_by_id.get(id)? {
            EntityPos::Person(i) => Some(Entity::Person(&self.edition.stand_off.persons[i])),
            EntityPos::Place(i) => Some(Entity::Place(&self.edition.stand_off.places[i])),
        }
    }

    /// Image file for a folio label, if the mapping declares one.
    pub fn image_for_page(&self, label: &str) -> Option<&str> {
        self.index.page_to_image.get(label).map(String::as_str)
    }

    /// Poem that owns a body line; None for front-matter lines.
    pub fn poem_of_line(&self, line_id: &str) -> Option<&Poem> {
        match *self.index.lines_by_id.get(line_id)? {
            LinePos::Front(_) => None,
            LinePos::Body { book, poem, .. } => Some(&self.edition.books[book].poems[poem]),
        }
    }

    /// Neighbouring folio in document order: +1 for next, -1 for previous.
    pub fn neighbour_page(&self, label: &str, step: i32) -> Option<&str> {
        let pos = self
            .index
            .ordered_pages
            .iter()
            .position(|p| p == label)? as i32;
        let target = pos + step;
        if target < 0 {
            return None;
        }
        self.index
            .ordered_pages
            .get(target as usize)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn line(id: &str, n: u32, text: &str, pb: Option<(&str, &str)>) -> Line {
        Line {
            id: id.into(),
            n,
            text: text.into(),
            norm: None,
            indent: n % 2 == 0,
            segments: vec![Seg::Plain { text: text.into() }],
            page_break: pb.map(|(label, image)| PageBreak {
                label: label.into(),
                image: image.into(),
            }),
        }
    }

    fn poem(id: &str, n: u32, lines: Vec<Line>) -> Poem {
        Poem {
            id: id.into(),
            n,
            dedicatee: None,
            dedicatee_ref: None,
            rubrics: Vec::new(),
            meter: Meter::Elegiac,
            genres: Vec::new(),
            groups: vec![LineGroup {
                kind: "elegiac".into(),
                lines,
            }],
        }
    }

    fn edition(books: Vec<Book>) -> Edition {
        Edition {
            title: "Lucina".into(),
            author: "Albrisius".into(),
            front: None,
            books,
            stand_off: StandOff::default(),
            translations: Default::default(),
            commentary: Default::default(),
        }
    }

    fn sample() -> Edition {
        let mut ed = edition(vec![Book {
            id: "book-1".into(),
            label: "Liber I".into(),
            n: 1,
            poems: vec![
                poem(
                    "poem-I.1",
                    1,
                    vec![
                        line("l-1.1.1", 1, "primus", Some(("2.1", "f2r.jpg"))),
                        line("l-1.1.2", 2, "secundus", None),
                    ],
                ),
                poem(
                    "poem-I.2",
                    2,
                    vec![line("l-1.2.1", 1, "tertius", Some(("2.2", "f2v.jpg")))],
                ),
            ],
        }]);
        ed.stand_off.persons.push(Person {
            id: "person-a".into(),
            name: "Aulus".into(),
            alt_names: Vec::new(),
            birth: None,
            death: None,
            occupation: None,
            note: None,
        });
        ed.books[0].poems[0].groups[0].lines[0]
            .segments
            .push(Seg::PersonRef {
                target: "person-a".into(),
                text: "Aule".into(),
            });
        ed
    }

    #[test]
    fn builds_all_maps() {
        let ed = sample();
        let idx = EditionIndex::build(&ed).unwrap();
        assert_eq!(idx.poems_by_id.len(), 2);
        assert_eq!(idx.lines_by_id.len(), 3);
        assert_eq!(idx.ordered_pages, vec!["2.1".to_string(), "2.2".to_string()]);
        assert_eq!(idx.page_to_image["2.1"], "f2r.jpg");
        assert_eq!(idx.refs_by_entity["person-a"], vec!["l-1.1.1".to_string()]);
    }

    #[test]
    fn load_is_idempotent() {
        let ed = sample();
        let a = EditionIndex::build(&ed).unwrap();
        let b = EditionIndex::build(&ed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_poem_id_aborts() {
        let mut ed = sample();
        ed.books[0].poems[1].id = "poem-I.1".into();
        match EditionIndex::build(&ed) {
            Err(LoadError::DuplicateId { kind, id }) => {
                assert_eq!(kind, "poem");
                assert_eq!(id, "poem-I.1");
            }
            other => panic!("expected DuplicateId, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_line_id_aborts() {
        let mut ed = sample();
        ed.books[0].poems[1].groups[0].lines[0].id = "l-1.1.2".into();
        assert!(matches!(
            EditionIndex::build(&ed),
            Err(LoadError::DuplicateId { kind: "line", .. })
        ));
    }

    #[test]
    fn poem_id_reused_by_line_aborts() {
        let mut ed = sample();
        // poems and lines share the element-id namespace
        ed.books[0].poems[1].groups[0].lines[0].id = "poem-I.1".into();
        match EditionIndex::build(&ed) {
            Err(LoadError::DuplicateId { kind: "line", id }) => {
                assert_eq!(id, "poem-I.1");
            }
            other => panic!("expected DuplicateId, got {:?}", other),
        }
    }

    #[test]
    fn context_accessors_resolve_positions() {
        let ctx = EditionContext::new(sample()).unwrap();
        assert_eq!(ctx.poem("poem-I.2").unwrap().n, 2);
        assert_eq!(ctx.line("l-1.2.1").unwrap().text, "tertius");
        assert_eq!(ctx.poem_of_line("l-1.2.1").unwrap().id, "poem-I.2");
        assert_eq!(ctx.entity("person-a").unwrap().name(), "Aulus");
        assert!(ctx.poem("poem-IX.9").is_none());
    }

    #[test]
    fn page_navigation_walks_document_order() {
        let ctx = EditionContext::new(sample()).unwrap();
        assert_eq!(ctx.neighbour_page("2.1", 1), Some("2.2"));
        assert_eq!(ctx.neighbour_page("2.2", -1), Some("2.1"));
        assert_eq!(ctx.neighbour_page("2.2", 1), None);
        assert_eq!(ctx.neighbour_page("2.1", -1), None);
    }

    #[test]
    fn three_book_scenario_counts() {
        let mut books = Vec::new();
        let mut page = 0;
        for (bi, poems_n) in [(1u32, 43usize), (2, 37), (3, 47)] {
            let mut poems = Vec::new();
            for p in 1..=poems_n {
                page += 1;
                poems.push(poem(
                    &format!("poem-{}.{}", bi, p),
                    p as u32,
                    vec![line(
                        &format!("l-{}.{}.1", bi, p),
                        1,
                        "versus",
                        Some((&format!("f{}", page), "img.jpg")),
                    )],
                ));
            }
            books.push(Book {
                id: format!("book-{}", bi),
                label: format!("Liber {}", bi),
                n: bi,
                poems,
            });
        }
        let idx = EditionIndex::build(&edition(books)).unwrap();
        assert_eq!(idx.poems_by_id.len(), 127);
        assert_eq!(idx.ordered_pages.len(), 127);
        let mut sorted = idx.ordered_pages.clone();
        sorted.dedup();
        assert_eq!(sorted.len(), 127);
    }
}
