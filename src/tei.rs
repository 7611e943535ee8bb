// src/tei.rs
//
// quick-xml based loader for the edition TEI. Element local names are
// compared as strings; only the subset of TEI the viewer needs is
// recognized (header title/author, front, body books/poems/line groups,
// back-matter translation/commentary tables, standOff lists). Optional
// sections load as empty collections; structural problems and dangling
// standoff references abort the load with a `LoadError` naming the
// offending node.

use crate::model::*;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{HashMap, HashSet};

/// Parse a TEI document into the edition tree, then validate every
/// `ref`/`corresp`/relation endpoint against the standoff lists.
pub fn parse_edition(xml: &str) -> Result<Edition, LoadError> {
    let edition = parse_tree(xml)?;
    if edition.books.is_empty() {
        return Err(LoadError::EmptyDocument);
    }
    validate_refs(&edition)?;
    Ok(edition)
}

/// Which inline span of a verse line is currently open.
enum SpanKind {
    Plain,
    Parenthesis,
    Speech,
    Person(String),
    Place(String),
}

/// Accumulates one <l> (or front-matter <p>) while its events stream by.
struct LineBuilder {
    id: String,
    n: u32,
    indent: bool,
    segments: Vec<Seg>,
    span_kind: SpanKind,
    span_buf: String,
    norm_buf: String,
    saw_reg: bool,
    in_orig: bool,
    in_reg: bool,
    page_break: Option<PageBreak>,
}

impl LineBuilder {
    fn new(id: String, n: u32, indent: bool) -> Self {
        Self {
            id,
            n,
            indent,
            segments: Vec::new(),
            span_kind: SpanKind::Plain,
            span_buf: String::new(),
            norm_buf: String::new(),
            saw_reg: false,
            in_orig: false,
            in_reg: false,
            page_break: None,
        }
    }

    fn push_text(&mut self, t: &str) {
        if self.in_reg {
            self.norm_buf.push_str(t);
            self.saw_reg = true;
        } else if self.in_orig {
            self.span_buf.push_str(t);
        } else {
            self.span_buf.push_str(t);
            self.norm_buf.push_str(t);
        }
    }

    fn open_span(&mut self, kind: SpanKind) {
        self.flush_span();
        self.span_kind = kind;
    }

    fn close_span(&mut self) {
        self.flush_span();
        self.span_kind = SpanKind::Plain;
    }

    fn flush_span(&mut self) {
        let text = tidy(&self.span_buf);
        self.span_buf.clear();
        if text.trim().is_empty() {
            // keep a bare space between words split by markup
            if !text.is_empty() {
                if let Some(last) = self.segments.last_mut() {
                    if let Seg::Plain { text: t } = last {
                        if !t.ends_with(' ') {
                            t.push(' ');
                        }
                        return;
                    }
                }
                self.segments.push(Seg::Plain { text });
            }
            return;
        }
        let seg = match std::mem::replace(&mut self.span_kind, SpanKind::Plain) {
            SpanKind::Plain => Seg::Plain { text },
            SpanKind::Parenthesis => Seg::Parenthesis { text },
            SpanKind::Speech => Seg::Speech { text },
            SpanKind::Person(target) => Seg::PersonRef { target, text },
            SpanKind::Place(target) => Seg::PlaceRef { target, text },
        };
        self.segments.push(seg);
    }

    fn build(mut self) -> Line {
        self.flush_span();
        let text = self
            .segments
            .iter()
            .map(Seg::text)
            .collect::<String>()
            .trim()
            .to_string();
        let norm = if self.saw_reg {
            Some(tidy(&self.norm_buf).trim().to_string())
        } else {
            None
        };
        Line {
            id: self.id,
            n: self.n,
            text,
            norm,
            indent: self.indent,
            segments: self.segments,
            page_break: self.page_break,
        }
    }
}

fn parse_tree(xml: &str) -> Result<Edition, LoadError> {
    let mut reader = Reader::from_str(xml);
    reader.expand_empty_elements(false);

    let mut title = String::new();
    let mut author = String::new();
    let mut front: Option<Front> = None;
    let mut books: Vec<Book> = Vec::new();
    let mut stand_off = StandOff::default();
    let mut translations: HashMap<String, String> = HashMap::new();
    let mut commentary: HashMap<String, String> = HashMap::new();

    // section flags
    let mut in_title_stmt = false;
    let mut in_front = false;
    let mut in_body = false;
    let mut in_standoff = false;
    let mut in_list_person = false;
    let mut in_list_place = false;

    // builders
    let mut current_book: Option<Book> = None;
    let mut current_poem: Option<Poem> = None;
    let mut current_group: Option<LineGroup> = None;
    let mut current_line: Option<LineBuilder> = None;
    let mut current_person: Option<Person> = None;
    let mut current_place: Option<Place> = None;
    // folio break seen between lines, attached to the next line opened
    let mut pending_pb: Option<PageBreak> = None;
    // back-matter side table being captured: (is_translation, poem id)
    let mut back_target: Option<(bool, String)> = None;
    let mut back_buf = String::new();
    let mut dedication_ref: Option<String> = None;
    let mut head_type = String::new();
    let mut front_line_seq: u32 = 0;
    let mut alt_pers_name = false;
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref());
                match name.as_str() {
                    "titleStmt" => in_title_stmt = true,
                    "front" => {
                        in_front = true;
                        front = Some(Front {
                            heads: Vec::new(),
                            lines: Vec::new(),
                        });
                    }
                    "body" => in_body = true,
                    "standOff" => in_standoff = true,
                    "listPerson" => in_list_person = true,
                    "listPlace" => in_list_place = true,
                    "div" if in_body => {
                        let div_type = attr_val(e, "type").unwrap_or_default();
                        match div_type.as_str() {
                            "book" => {
                                let n = require_ordinal(e, "div", "n")?;
                                let id = attr_val(e, "xml:id")
                                    .unwrap_or_else(|| format!("book-{}", n));
                                current_book = Some(Book {
                                    id,
                                    label: format!("Liber {}", n),
                                    n,
                                    poems: Vec::new(),
                                });
                            }
                            "poem" => {
                                if current_book.is_none() {
                                    return Err(LoadError::MalformedHierarchy {
                                        element: "div[poem]".into(),
                                        parent: "div[book]",
                                    });
                                }
                                let id = attr_val(e, "xml:id").ok_or(
                                    LoadError::MissingAttribute {
                                        element: "div[poem]",
                                        attribute: "xml:id",
                                    },
                                )?;
                                let n = require_ordinal(e, "div[poem]", "n")?;
                                let meter =
                                    Meter::parse(&attr_val(e, "met").unwrap_or_default());
                                let genres = attr_val(e, "ana")
                                    .unwrap_or_default()
                                    .split_whitespace()
                                    .map(Genre::parse)
                                    .collect();
                                current_poem = Some(Poem {
                                    id,
                                    n,
                                    dedicatee: None,
                                    dedicatee_ref: None,
                                    rubrics: Vec::new(),
                                    meter,
                                    genres,
                                    groups: Vec::new(),
                                });
                            }
                            _ => {}
                        }
                    }
                    "div" if !in_body && !in_front && !in_standoff => {
                        // back matter side tables
                        let div_type = attr_val(e, "type").unwrap_or_default();
                        if div_type == "translation" || div_type == "commentary" {
                            if let Some(target) = attr_val(e, "corresp") {
                                back_target = Some((
                                    div_type == "translation",
                                    target.trim_start_matches('#').to_string(),
                                ));
                                back_buf.clear();
                            }
                        }
                    }
                    "lg" => {
                        if current_poem.is_some() {
                            current_group = Some(LineGroup {
                                kind: attr_val(e, "type").unwrap_or_default(),
                                lines: Vec::new(),
                            });
                        }
                    }
                    "l" => {
                        if current_group.is_none() {
                            return Err(LoadError::MalformedHierarchy {
                                element: "l".into(),
                                parent: "lg",
                            });
                        }
                        let id = attr_val(e, "xml:id").ok_or(LoadError::MissingAttribute {
                            element: "l",
                            attribute: "xml:id",
                        })?;
                        let n = require_ordinal(e, "l", "n")?;
                        let indent = attr_val(e, "rend")
                            .map(|r| r.split_whitespace().any(|t| t == "indent"))
                            .unwrap_or(false);
                        let mut lb = LineBuilder::new(id, n, indent);
                        lb.page_break = pending_pb.take();
                        current_line = Some(lb);
                    }
                    "p" if in_front => {
                        front_line_seq += 1;
                        let mut lb = LineBuilder::new(
                            format!("front-{}", front_line_seq),
                            front_line_seq,
                            false,
                        );
                        lb.page_break = pending_pb.take();
                        current_line = Some(lb);
                    }
                    "head" => {
                        head_type = attr_val(e, "type").unwrap_or_default();
                        dedication_ref =
                            attr_val(e, "corresp").map(|c| c.trim_start_matches('#').to_string());
                        text_buf.clear();
                    }
                    "persName" if current_line.is_some() => {
                        if let (Some(lb), Some(target)) =
                            (current_line.as_mut(), attr_val(e, "ref"))
                        {
                            lb.open_span(SpanKind::Person(
                                target.trim_start_matches('#').to_string(),
                            ));
                        }
                    }
                    "placeName" if current_line.is_some() => {
                        if let (Some(lb), Some(target)) =
                            (current_line.as_mut(), attr_val(e, "ref"))
                        {
                            lb.open_span(SpanKind::Place(
                                target.trim_start_matches('#').to_string(),
                            ));
                        }
                    }
                    "seg" if current_line.is_some() => {
                        let seg_type = attr_val(e, "type").unwrap_or_default();
                        if let Some(lb) = current_line.as_mut() {
                            match seg_type.as_str() {
                                "parenthesis" => lb.open_span(SpanKind::Parenthesis),
                                "speech" => lb.open_span(SpanKind::Speech),
                                _ => {}
                            }
                        }
                    }
                    "orig" => {
                        if let Some(lb) = current_line.as_mut() {
                            lb.in_orig = true;
                        }
                    }
                    "reg" => {
                        if let Some(lb) = current_line.as_mut() {
                            lb.in_reg = true;
                        }
                    }
                    "person" if in_list_person => {
                        let id = attr_val(e, "xml:id").ok_or(LoadError::MissingAttribute {
                            element: "person",
                            attribute: "xml:id",
                        })?;
                        current_person = Some(Person {
                            id,
                            name: String::new(),
                            alt_names: Vec::new(),
                            birth: None,
                            death: None,
                            occupation: None,
                            note: None,
                        });
                    }
                    "place" if in_list_place => {
                        let id = attr_val(e, "xml:id").ok_or(LoadError::MissingAttribute {
                            element: "place",
                            attribute: "xml:id",
                        })?;
                        current_place = Some(Place {
                            id,
                            name: String::new(),
                            note: None,
                        });
                    }
                    "persName" if current_person.is_some() => {
                        alt_pers_name = attr_val(e, "type").as_deref() == Some("alt");
                        text_buf.clear();
                    }
                    _ => text_buf.clear(),
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name().as_ref());
                match name.as_str() {
                    "pb" => {
                        let label = attr_val(e, "n").ok_or(LoadError::MissingAttribute {
                            element: "pb",
                            attribute: "n",
                        })?;
                        // absent @facs falls back to the folio-named file, the
                        // same convention the facsimile directory uses
                        let image =
                            attr_val(e, "facs").unwrap_or_else(|| format!("{}.jpg", label));
                        let pb = PageBreak { label, image };
                        match current_line.as_mut() {
                            Some(lb) if lb.page_break.is_none() => lb.page_break = Some(pb),
                            _ => pending_pb = Some(pb),
                        }
                    }
                    "relation" if in_standoff => {
                        let rel_name = attr_val(e, "name").unwrap_or_default();
                        if let Some(pair) = attr_val(e, "mutual") {
                            let ids: Vec<String> = pair
                                .split_whitespace()
                                .map(|s| s.trim_start_matches('#').to_string())
                                .collect();
                            if ids.len() == 2 {
                                stand_off.relations.push(Relation {
                                    name: rel_name,
                                    from: ids[0].clone(),
                                    to: ids[1].clone(),
                                    mutual: true,
                                });
                            }
                        } else if let (Some(active), Some(passive)) =
                            (attr_val(e, "active"), attr_val(e, "passive"))
                        {
                            stand_off.relations.push(Relation {
                                name: rel_name,
                                from: active.trim_start_matches('#').to_string(),
                                to: passive.trim_start_matches('#').to_string(),
                                mutual: false,
                            });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                let t = e
                    .unescape()
                    .map_err(|err| xml_error(&reader, err))?
                    .to_string();
                if let Some(lb) = current_line.as_mut() {
                    lb.push_text(&t);
                } else if back_target.is_some() {
                    back_buf.push_str(&t);
                } else {
                    text_buf.push_str(&t);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = local_name(e.name().as_ref());
                match name.as_str() {
                    "titleStmt" => in_title_stmt = false,
                    "front" => {
                        in_front = false;
                        if let (Some(f), Some(lb)) = (front.as_mut(), current_line.take()) {
                            f.lines.push(lb.build());
                        }
                    }
                    "body" => in_body = false,
                    "standOff" => in_standoff = false,
                    "listPerson" => in_list_person = false,
                    "listPlace" => in_list_place = false,
                    "title" if in_title_stmt => title = tidy(&text_buf).trim().to_string(),
                    "author" if in_title_stmt => author = tidy(&text_buf).trim().to_string(),
                    "head" => {
                        let text = tidy(&text_buf).trim().to_string();
                        text_buf.clear();
                        if text.is_empty() {
                            head_type.clear();
                        } else if let Some(poem) = current_poem.as_mut() {
                            match head_type.as_str() {
                                "dedication" => {
                                    poem.dedicatee = Some(text);
                                    poem.dedicatee_ref = dedication_ref.take();
                                }
                                "rubric" => poem.rubrics.push(text),
                                _ => {}
                            }
                        } else if let Some(book) = current_book.as_mut() {
                            book.label = text;
                        } else if in_front {
                            if let Some(f) = front.as_mut() {
                                f.heads.push(text);
                            }
                        }
                        dedication_ref = None;
                    }
                    "l" => {
                        if let (Some(group), Some(lb)) =
                            (current_group.as_mut(), current_line.take())
                        {
                            group.lines.push(lb.build());
                        }
                    }
                    "p" if in_front => {
                        if let (Some(f), Some(lb)) = (front.as_mut(), current_line.take()) {
                            let line = lb.build();
                            if !line.text.is_empty() || line.page_break.is_some() {
                                f.lines.push(line);
                            } else {
                                front_line_seq -= 1;
                            }
                        }
                    }
                    "lg" => {
                        if let (Some(poem), Some(group)) =
                            (current_poem.as_mut(), current_group.take())
                        {
                            if !group.lines.is_empty() {
                                poem.groups.push(group);
                            }
                        }
                    }
                    "div" => {
                        if let Some((is_translation, poem_id)) = back_target.take() {
                            let text = tidy(&back_buf).trim().to_string();
                            if !text.is_empty() {
                                if is_translation {
                                    translations.insert(poem_id, text);
                                } else {
                                    commentary.insert(poem_id, text);
                                }
                            }
                        } else if let Some(poem) = current_poem.take() {
                            if let Some(book) = current_book.as_mut() {
                                book.poems.push(poem);
                            }
                        } else if let Some(book) = current_book.take() {
                            books.push(book);
                        }
                    }
                    "persName" => {
                        let text = tidy(&text_buf).trim().to_string();
                        text_buf.clear();
                        if let Some(person) = current_person.as_mut() {
                            if text.is_empty() {
                            } else if person.name.is_empty() && !alt_pers_name {
                                person.name = text;
                            } else {
                                person.alt_names.push(text);
                            }
                        }
                        alt_pers_name = false;
                    }
                    "placeName" => {
                        let text = tidy(&text_buf).trim().to_string();
                        text_buf.clear();
                        if let Some(place) = current_place.as_mut() {
                            if place.name.is_empty() {
                                place.name = text;
                            }
                        }
                    }
                    "birth" | "death" | "occupation" | "note" => {
                        let text = tidy(&text_buf).trim().to_string();
                        text_buf.clear();
                        if text.is_empty() {
                        } else if let Some(person) = current_person.as_mut() {
                            match name.as_str() {
                                "birth" => person.birth = Some(text),
                                "death" => person.death = Some(text),
                                "occupation" => person.occupation = Some(text),
                                "note" => person.note = Some(text),
                                _ => unreachable!(),
                            }
                        } else if let Some(place) = current_place.as_mut() {
                            if name == "note" {
                                place.note = Some(text);
                            }
                        }
                    }
                    "orig" => {
                        if let Some(lb) = current_line.as_mut() {
                            lb.in_orig = false;
                        }
                    }
                    "reg" => {
                        if let Some(lb) = current_line.as_mut() {
                            lb.in_reg = false;
                        }
                    }
                    "seg" => {
                        if let Some(lb) = current_line.as_mut() {
                            lb.close_span();
                        }
                    }
                    "person" => {
                        if let Some(person) = current_person.take() {
                            stand_off.persons.push(person);
                        }
                    }
                    "place" => {
                        if let Some(place) = current_place.take() {
                            stand_off.places.push(place);
                        }
                    }
                    _ => {}
                }
                // inline refs close their span; the arms above only handled
                // the standoff capture side of these tag names
                if matches!(name.as_str(), "persName" | "placeName") {
                    if let Some(lb) = current_line.as_mut() {
                        lb.close_span();
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error(&reader, err)),
            _ => {}
        }
    }

    Ok(Edition {
        title,
        author,
        front,
        books,
        stand_off,
        translations,
        commentary,
    })
}

/// Every ref in the tree must point at a declared standoff entity.
fn validate_refs(edition: &Edition) -> Result<(), LoadError> {
    let persons: HashSet<&str> = edition
        .stand_off
        .persons
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    let places: HashSet<&str> = edition
        .stand_off
        .places
        .iter()
        .map(|p| p.id.as_str())
        .collect();

    for book in &edition.books {
        for poem in &book.poems {
            if let Some(target) = &poem.dedicatee_ref {
                if !persons.contains(target.as_str()) {
                    return Err(LoadError::DanglingRef {
                        origin: poem.id.clone(),
                        target: target.clone(),
                    });
                }
            }
            for line in poem.lines() {
                for seg in &line.segments {
                    match seg {
                        Seg::PersonRef { target, .. } if !persons.contains(target.as_str()) => {
                            return Err(LoadError::DanglingRef {
                                origin: line.id.clone(),
                                target: target.clone(),
                            });
                        }
                        Seg::PlaceRef { target, .. } if !places.contains(target.as_str()) => {
                            return Err(LoadError::DanglingRef {
                                origin: line.id.clone(),
                                target: target.clone(),
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
    }
    for rel in &edition.stand_off.relations {
        for endpoint in [&rel.from, &rel.to] {
            if !persons.contains(endpoint.as_str()) {
                return Err(LoadError::DanglingRef {
                    origin: format!("relation '{}'", rel.name),
                    target: endpoint.clone(),
                });
            }
        }
    }
    Ok(())
}

fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

fn attr_val(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return Some(String::from_utf8_lossy(&attr.value).into_owned());
        }
    }
    None
}

fn require_ordinal(
    e: &BytesStart,
    element: &'static str,
    attribute: &'static str,
) -> Result<u32, LoadError> {
    let raw = attr_val(e, attribute).ok_or(LoadError::MissingAttribute { element, attribute })?;
    parse_ordinal(&raw).ok_or(LoadError::MissingAttribute { element, attribute })
}

/// Ordinals in the source appear both as arabic digits and roman numerals.
pub fn parse_ordinal(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    // roman numerals, additive/subtractive
    let mut total: u32 = 0;
    let mut prev: u32 = 0;
    for c in s.to_ascii_uppercase().chars() {
        let v = match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        if prev < v {
            // prev was added as a subtractive prefix, take it back twice
            total = total.checked_add(v)?.checked_sub(2 * prev)?;
        } else {
            total += v;
        }
        prev = v;
    }
    Some(total)
}

/// Collapse runs of whitespace to single spaces, keeping one boundary space
/// so words split by inline markup do not fuse.
fn tidy(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return if raw.is_empty() { String::new() } else { " ".to_string() };
    }
    let mut out = String::new();
    if raw.starts_with(|c: char| c.is_whitespace()) {
        out.push(' ');
    }
    out.push_str(&collapsed);
    if raw.ends_with(|c: char| c.is_whitespace()) {
        out.push(' ');
    }
    out
}

fn xml_error(reader: &Reader<&[u8]>, err: quick_xml::Error) -> LoadError {
    LoadError::Xml {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc>
      <titleStmt>
        <title>Lucina</title>
        <author>Aurelius Laurentius Albrisius</author>
      </titleStmt>
    </fileDesc>
  </teiHeader>
  <text>
    <front>
      <head>Praefatio</head>
      <p><pb n="1.1" facs="f1r.jpg"/>Ad lectorem benevolum.</p>
    </front>
    <body>
      <div type="book" n="1" xml:id="book-1">
        <head>Liber primus</head>
        <div type="poem" xml:id="poem-I.1" n="1" met="elegiac" ana="#dedication #praise">
          <head type="dedication" corresp="#person-cydonius">Ad Cydonium</head>
          <head type="rubric">Incipit feliciter</head>
          <lg type="elegiac">
            <l n="1" xml:id="l-1.1.1">Aspice <persName ref="#person-cydonius">Cydoni</persName> munera parva</l>
            <l n="2" xml:id="l-1.1.2" rend="indent">quae tibi <pb n="1.2" facs="f1v.jpg"/>de <placeName ref="#place-ticinum">Ticino</placeName> mittimus</l>
          </lg>
          <lg type="elegiac">
            <l n="3" xml:id="l-1.1.3">tertius <seg type="parenthesis">(ut aiunt)</seg> versus</l>
            <l n="4" xml:id="l-1.1.4" rend="indent"><choice><orig>quartvs</orig><reg>quartus</reg></choice> ordine flexo</l>
          </lg>
        </div>
        <div type="poem" xml:id="poem-I.2" n="2" met="sapphic">
          <lg type="sapphic">
            <l n="1" xml:id="l-1.2.1">Altera carmina sine dedicatione</l>
          </lg>
        </div>
      </div>
    </body>
    <back>
      <div type="translation" corresp="#poem-I.1"><p>Behold, Cydonius, the small gifts we send you from Pavia.</p></div>
      <div type="commentary" corresp="#poem-I.1"><p>The opening couplet reworks a Martial motif.</p></div>
    </back>
  </text>
  <standOff>
    <listPerson>
      <person xml:id="person-cydonius">
        <persName>Cydonius</persName>
        <persName type="alt">Cidonio</persName>
        <birth>c. 1440</birth>
        <occupation>secretary</occupation>
        <note>Dedicatee of the first book.</note>
      </person>
      <person xml:id="person-sforza">
        <persName>Galeazzo Maria Sforza</persName>
      </person>
    </listPerson>
    <listPlace>
      <place xml:id="place-ticinum">
        <placeName>Ticinum</placeName>
        <note>Pavia.</note>
      </place>
    </listPlace>
    <listRelation>
      <relation name="patronage" active="#person-sforza" passive="#person-cydonius"/>
      <relation name="friendship" mutual="#person-cydonius #person-sforza"/>
    </listRelation>
  </standOff>
</TEI>"##;

    #[test]
    fn parses_header_and_structure() {
        let ed = parse_edition(SAMPLE).unwrap();
        assert_eq!(ed.title, "Lucina");
        assert_eq!(ed.author, "Aurelius Laurentius Albrisius");
        assert_eq!(ed.books.len(), 1);
        assert_eq!(ed.books[0].label, "Liber primus");
        assert_eq!(ed.books[0].poems.len(), 2);

        let poem = &ed.books[0].poems[0];
        assert_eq!(poem.id, "poem-I.1");
        assert_eq!(poem.meter, Meter::Elegiac);
        assert_eq!(poem.genres, vec![Genre::Dedication, Genre::Praise]);
        assert_eq!(poem.dedicatee.as_deref(), Some("Ad Cydonium"));
        assert_eq!(poem.dedicatee_ref.as_deref(), Some("person-cydonius"));
        assert_eq!(poem.rubrics, vec!["Incipit feliciter".to_string()]);
        assert_eq!(poem.groups.len(), 2);
        assert_eq!(poem.line_count(), 4);
    }

    #[test]
    fn line_text_and_segments() {
        let ed = parse_edition(SAMPLE).unwrap();
        let poem = &ed.books[0].poems[0];
        let l1 = &poem.groups[0].lines[0];
        assert_eq!(l1.text, "Aspice Cydoni munera parva");
        assert!(l1
            .segments
            .iter()
            .any(|s| s.target() == Some("person-cydonius")));
        assert!(!l1.indent);

        let l2 = &poem.groups[0].lines[1];
        assert!(l2.indent);
        assert_eq!(l2.page_break.as_ref().unwrap().label, "1.2");
        assert_eq!(l2.page_break.as_ref().unwrap().image, "f1v.jpg");
        assert!(l2.text.contains("Ticino"));
    }

    #[test]
    fn parenthesis_and_normalization() {
        let ed = parse_edition(SAMPLE).unwrap();
        let poem = &ed.books[0].poems[0];
        let l3 = &poem.groups[1].lines[0];
        assert!(l3
            .segments
            .iter()
            .any(|s| matches!(s, Seg::Parenthesis { text } if text.contains("ut aiunt"))));

        let l4 = &poem.groups[1].lines[1];
        assert!(l4.text.starts_with("quartvs"));
        assert_eq!(l4.norm.as_deref(), Some("quartus ordine flexo"));
    }

    #[test]
    fn front_matter_carries_page_breaks() {
        let ed = parse_edition(SAMPLE).unwrap();
        let front = ed.front.unwrap();
        assert_eq!(front.heads, vec!["Praefatio".to_string()]);
        assert_eq!(front.lines.len(), 1);
        assert_eq!(front.lines[0].page_break.as_ref().unwrap().label, "1.1");
        assert_eq!(front.lines[0].text, "Ad lectorem benevolum.");
    }

    #[test]
    fn standoff_entities_and_relations() {
        let ed = parse_edition(SAMPLE).unwrap();
        assert_eq!(ed.stand_off.persons.len(), 2);
        let cyd = &ed.stand_off.persons[0];
        assert_eq!(cyd.name, "Cydonius");
        assert_eq!(cyd.alt_names, vec!["Cidonio".to_string()]);
        assert_eq!(cyd.birth.as_deref(), Some("c. 1440"));
        assert_eq!(cyd.occupation.as_deref(), Some("secretary"));

        assert_eq!(ed.stand_off.places.len(), 1);
        assert_eq!(ed.stand_off.places[0].name, "Ticinum");

        assert_eq!(ed.stand_off.relations.len(), 2);
        assert!(!ed.stand_off.relations[0].mutual);
        assert!(ed.stand_off.relations[1].mutual);
    }

    #[test]
    fn back_matter_side_tables() {
        let ed = parse_edition(SAMPLE).unwrap();
        assert!(ed.translations["poem-I.1"].contains("Pavia"));
        assert!(ed.commentary["poem-I.1"].contains("Martial"));
        assert!(!ed.translations.contains_key("poem-I.2"));
    }

    #[test]
    fn dangling_reference_is_a_load_error() {
        let bad = SAMPLE.replace("#person-cydonius\">Cydoni", "#person-nobody\">Cydoni");
        match parse_edition(&bad) {
            Err(LoadError::DanglingRef { origin, target }) => {
                assert_eq!(origin, "l-1.1.1");
                assert_eq!(target, "person-nobody");
            }
            other => panic!("expected DanglingRef, got {:?}", other),
        }
    }

    #[test]
    fn missing_poem_id_is_a_load_error() {
        let bad = SAMPLE.replace("xml:id=\"poem-I.2\" ", "");
        match parse_edition(&bad) {
            Err(LoadError::MissingAttribute { element, attribute }) => {
                assert_eq!(element, "div[poem]");
                assert_eq!(attribute, "xml:id");
            }
            other => panic!("expected MissingAttribute, got {:?}", other),
        }
    }

    #[test]
    fn optional_sections_default_to_empty() {
        let minimal = r#"<TEI><teiHeader><fileDesc><titleStmt><title>T</title></titleStmt></fileDesc></teiHeader>
<text><body><div type="book" n="1"><div type="poem" xml:id="p1" n="1">
<lg type="elegiac"><l n="1" xml:id="l1">unus versus</l></lg>
</div></div></body></text></TEI>"#;
        let ed = parse_edition(minimal).unwrap();
        assert!(ed.front.is_none());
        assert!(ed.stand_off.persons.is_empty());
        assert!(ed.translations.is_empty());
        assert_eq!(ed.poem_count(), 1);
    }

    #[test]
    fn document_without_books_is_rejected() {
        let empty = "<TEI><text><body/></text></TEI>";
        assert_eq!(parse_edition(empty), Err(LoadError::EmptyDocument));
    }

    #[test]
    fn roman_and_arabic_ordinals() {
        assert_eq!(parse_ordinal("3"), Some(3));
        assert_eq!(parse_ordinal("III"), Some(3));
        assert_eq!(parse_ordinal("IV"), Some(4));
        assert_eq!(parse_ordinal("IX"), Some(9));
        assert_eq!(parse_ordinal("xiv"), Some(14));
        assert_eq!(parse_ordinal("XL"), Some(40));
        assert_eq!(parse_ordinal("CXXVII"), Some(127));
        assert_eq!(parse_ordinal("abc"), None);
        assert_eq!(parse_ordinal(""), None);
    }
}
