// src/export.rs
//
// Read-only projections of the loaded edition: plain text for reading
// offline, the structured document as JSON, and one CSV record per poem
// for spreadsheet work. None of these touch the tree.

use crate::model::Edition;

/// Plain-text rendition: headings, rubrics, dedications, numbered verse
/// lines with pentameter indentation, folio markers inline.
pub fn plain_text(edition: &Edition) -> String {
    let mut out = String::new();
    out.push_str(&edition.title);
    out.push('\n');
    out.push_str(&edition.author);
    out.push_str("\n\n");

    if let Some(front) = &edition.front {
        for head in &front.heads {
            out.push_str(head);
            out.push('\n');
        }
        for line in &front.lines {
            push_folio(&mut out, line);
            out.push_str(&line.text);
            out.push('\n');
        }
        out.push('\n');
    }

    for book in &edition.books {
        out.push_str(&book.label);
        out.push_str("\n\n");
        for poem in &book.poems {
            for rubric in &poem.rubrics {
                out.push_str(rubric);
                out.push('\n');
            }
            if let Some(dedicatee) = &poem.dedicatee {
                out.push_str(dedicatee);
                out.push('\n');
            }
            for line in poem.lines() {
                push_folio(&mut out, line);
                if line.indent {
                    out.push_str("    ");
                }
                out.push_str(&line.text);
                out.push('\n');
            }
            out.push('\n');
        }
    }
    out
}

fn push_folio(out: &mut String, line: &crate::model::Line) {
    if let Some(pb) = &line.page_break {
        out.push_str(&format!("[folio {}]\n", pb.label));
    }
}

/// The structured document itself, pretty-printed JSON.
pub fn to_json(edition: &Edition) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(edition)
}

/// One CSV record per poem: id, book, ordinal, dedicatee, meter, genres,
/// line count.
pub fn poem_records(edition: &Edition) -> String {
    let mut out = String::from("id,book,n,dedicatee,meter,genres,lines\n");
    for book in &edition.books {
        for poem in &book.poems {
            let genres = poem
                .genres
                .iter()
                .map(|g| g.label())
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                csv_field(&poem.id),
                book.n,
                poem.n,
                csv_field(poem.dedicatee.as_deref().unwrap_or("")),
                poem.meter.label(),
                csv_field(&genres),
                poem.line_count()
            ));
        }
    }
    out
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn sample() -> Edition {
        Edition {
            title: "Lucina".into(),
            author: "Albrisius".into(),
            front: None,
            books: vec![Book {
                id: "book-1".into(),
                label: "Liber primus".into(),
                n: 1,
                poems: vec![Poem {
                    id: "poem-I.1".into(),
                    n: 1,
                    dedicatee: Some("Ad Cydonium, virum doctum".into()),
                    dedicatee_ref: None,
                    rubrics: vec!["Incipit".into()],
                    meter: Meter::Elegiac,
                    genres: vec![Genre::Dedication, Genre::Praise],
                    groups: vec![LineGroup {
                        kind: "elegiac".into(),
                        lines: vec![
                            Line {
                                id: "l-1.1.1".into(),
                                n: 1,
                                text: "Aspice munera parva".into(),
                                norm: None,
                                indent: false,
                                segments: vec![],
                                page_break: Some(PageBreak {
                                    label: "1.1".into(),
                                    image: "f1r.jpg".into(),
                                }),
                            },
                            Line {
                                id: "l-1.1.2".into(),
                                n: 2,
                                text: "quae tibi mittimus".into(),
                                norm: None,
                                indent: true,
                                segments: vec![],
                                page_break: None,
                            },
                        ],
                    }],
                }],
            }],
            stand_off: StandOff::default(),
            translations: Default::default(),
            commentary: Default::default(),
        }
    }

    #[test]
    fn plain_text_keeps_structure() {
        let text = plain_text(&sample());
        assert!(text.starts_with("Lucina\nAlbrisius\n"));
        assert!(text.contains("Liber primus"));
        assert!(text.contains("[folio 1.1]\nAspice munera parva\n"));
        assert!(text.contains("    quae tibi mittimus"));
    }

    #[test]
    fn json_round_trips() {
        let ed = sample();
        let json = to_json(&ed).unwrap();
        let back: Edition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ed);
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        let csv = poem_records(&sample());
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "id,book,n,dedicatee,meter,genres,lines");
        let record = lines.next().unwrap();
        assert!(record.contains("\"Ad Cydonium, virum doctum\""));
        assert!(record.contains("dedication praise"));
        assert!(record.ends_with(",2"));
    }

    #[test]
    fn export_does_not_mutate() {
        let ed = sample();
        let before = ed.clone();
        let _ = plain_text(&ed);
        let _ = poem_records(&ed);
        let _ = to_json(&ed);
        assert_eq!(ed, before);
    }
}
