//! Row-collection and detail markup parsing.
//!
//! The row reload endpoint answers with a table-body fragment in which every
//! paper is a `<tr data-paper-id="...">` immediately followed by its detail
//! `<tr>`. Classification cells carry `data-field="<field name>"`; the other
//! cells carry `data-col="<column>"`. A paper row without a detail row is
//! accepted and gets an empty detail. Cells naming a field outside the
//! vocabulary are skipped, never counted.
//!
//! Detail markup is reduced to searchable text; subtrees marked
//! `.trace-content` are kept apart as traces and never searched.

use crate::error::{Error, Result};
use crate::field::{Field, FieldKind, PdfStatus, Provenance};
use crate::record::{DetailContent, DetailRow, PaperRow};
use crate::store::RowEntry;
use scraper::{ElementRef, Html, Selector};

const TRACE_SELECTOR: &str = ".trace-content";

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Markup(format!("bad selector '{}': {:?}", css, e)))
}

/// Parse a table-body fragment into paired row entries, in document order.
pub fn parse_rows(fragment: &str) -> Result<Vec<RowEntry>> {
    let document = Html::parse_fragment(&format!("<table><tbody>{}</tbody></table>", fragment));
    let tbody_sel = selector("tbody")?;
    let trace_sel = selector(TRACE_SELECTOR)?;

    let tbody = match document.select(&tbody_sel).next() {
        Some(tbody) => tbody,
        None => return Ok(Vec::new()),
    };

    let mut entries: Vec<RowEntry> = Vec::new();
    let mut awaiting_detail = false;

    for tr in tbody
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "tr")
    {
        if let Some(id) = tr.value().attr("data-paper-id") {
            let row = parse_paper_row(id, tr)?;
            entries.push(RowEntry::new(row, DetailRow::default()));
            awaiting_detail = true;
        } else if awaiting_detail {
            if let Some(entry) = entries.last_mut() {
                entry.detail = parse_detail_row(tr, &trace_sel);
            }
            awaiting_detail = false;
        } else {
            log::debug!("skipping table row without a preceding paper row");
        }
    }

    Ok(entries)
}

/// Parse detail markup returned by the detail endpoint.
pub fn parse_detail(html: &str) -> Result<DetailContent> {
    let document = Html::parse_fragment(html);
    let trace_sel = selector(TRACE_SELECTOR)?;
    let mut text = String::new();
    let mut traces = Vec::new();
    collect_text(document.root_element(), &trace_sel, &mut text, &mut traces);
    Ok(DetailContent {
        text: normalize(&text),
        traces,
    })
}

fn parse_detail_row(tr: ElementRef<'_>, trace_sel: &Selector) -> DetailRow {
    let mut text = String::new();
    let mut traces = Vec::new();
    collect_text(tr, trace_sel, &mut text, &mut traces);
    let text = normalize(&text);

    let expanded = tr
        .value()
        .attr("class")
        .map(|c| c.split_whitespace().any(|class| class == "expanded"))
        .unwrap_or(false);

    // An untouched placeholder has no content yet
    let content = if text.is_empty() && traces.is_empty() {
        None
    } else {
        Some(DetailContent { text, traces })
    };

    DetailRow {
        content,
        error: None,
        expanded,
    }
}

fn parse_paper_row(id: &str, tr: ElementRef<'_>) -> Result<PaperRow> {
    let mut row = PaperRow::new(id);

    for cell in tr.children().filter_map(ElementRef::wrap) {
        let text = normalize(&cell.text().collect::<String>());

        if let Some(name) = cell.value().attr("data-field") {
            let field = match Field::from_name(name) {
                Some(field) => field,
                None => {
                    log::warn!("skipping unknown field '{}' of row {}", name, id);
                    continue;
                }
            };
            row.set_field(name, &text)?;
            if field.kind() == FieldKind::Provenance {
                apply_model_name(&mut row, field, cell);
            }
            continue;
        }

        let column = match cell.value().attr("data-col") {
            Some(column) => column,
            None => continue,
        };
        match column {
            "title" => row.title = text,
            "authors" => row.authors = text,
            "journal" => row.journal = text,
            "year" => row.year = text,
            "page_count" => row.page_count = text,
            "type" => {
                row.type_title = first_title(cell);
                row.pub_type = text;
            }
            "pdf" => row.pdf = PdfStatus::parse(&text),
            "keywords" => row.keywords = text,
            "research_area" => row.research_area = text,
            "estimated_score" => row.estimated_score = text,
            "relevance" => row.relevance = text,
            "changed" => row.changed = text,
            "features_other" => row.features_other = text,
            "model" => row.model = text,
            other => log::debug!("ignoring unknown column '{}' of row {}", other, id),
        }
    }

    Ok(row)
}

/// The computer symbol carries the model name in its tooltip
fn apply_model_name(row: &mut PaperRow, field: Field, cell: ElementRef<'_>) {
    let model = match first_title(cell) {
        Some(model) => model,
        None => return,
    };
    let slot = match field {
        Field::ChangedBy => &mut row.changed_by,
        Field::VerifiedBy => &mut row.verified_by,
        _ => return,
    };
    if matches!(slot, Provenance::Computer(name) if name.is_empty()) {
        *slot = Provenance::Computer(model);
    }
}

/// `title` attribute of the cell itself or its first descendant carrying one
fn first_title(cell: ElementRef<'_>) -> Option<String> {
    if let Some(title) = cell.value().attr("title") {
        return Some(title.to_string());
    }
    cell.descendants()
        .filter_map(ElementRef::wrap)
        .find_map(|e| e.value().attr("title").map(str::to_string))
}

fn collect_text(
    element: ElementRef<'_>,
    trace_sel: &Selector,
    text: &mut String,
    traces: &mut Vec<String>,
) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if trace_sel.matches(&child_element) {
                let trace = normalize(&child_element.text().collect::<String>());
                if !trace.is_empty() {
                    traces.push(trace);
                }
            } else {
                collect_text(child_element, trace_sel, text, traces);
            }
        } else if let Some(fragment) = child.value().as_text() {
            text.push_str(fragment);
            text.push(' ');
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
