/// PaperTable Sort Engine
///
/// Orders the visible rows by a single column. The value compared depends on
/// the column category: numeric columns parse the cell text (0 when it does
/// not parse), categorical columns compare trimmed text, and status columns
/// compare ordinal weights of their symbols.
///
/// Equal primary values are ordered by row id ascending. The direction flips
/// only the primary comparison, never the tiebreak, so the result is a total
/// order independent of the rows' previous positions.
///
/// # Examples
///
/// ```
/// use papertable::{SortColumn, SortDirection, SortState};
///
/// let mut state = SortState::default();
/// state.click(SortColumn::from_key("year").unwrap());
/// assert_eq!(state.direction(), Some(SortDirection::Descending));
///
/// state.click(SortColumn::from_key("year").unwrap());
/// assert_eq!(state.direction(), Some(SortDirection::Ascending));
///
/// state.click(SortColumn::from_key("pdf-link").unwrap());
/// assert_eq!(state.direction(), Some(SortDirection::Descending));
/// ```

use crate::error::{Error, Result};
use crate::field::Field;
use crate::record::PaperRow;
use crate::store::RowStore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A sortable column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Title,
    Journal,
    Year,
    PageCount,
    EstimatedScore,
    Relevance,
    Type,
    Changed,
    ResearchArea,
    /// Verified, comment state and the provenance columns, compared by their
    /// rendered symbol
    Categorical(Field),
    /// PDF availability (header key `pdf-link`)
    Pdf,
    /// Any other tri-state column, compared by symbol weight
    Status(Field),
}

impl SortColumn {
    /// Resolve a column header key
    pub fn from_key(key: &str) -> Result<SortColumn> {
        let column = match key {
            "title" => SortColumn::Title,
            "journal" => SortColumn::Journal,
            "year" => SortColumn::Year,
            "page_count" => SortColumn::PageCount,
            "estimated_score" => SortColumn::EstimatedScore,
            "relevance" => SortColumn::Relevance,
            "type" => SortColumn::Type,
            "changed" => SortColumn::Changed,
            "research_area" => SortColumn::ResearchArea,
            "pdf-link" => SortColumn::Pdf,
            other => match Field::from_name(other) {
                Some(
                    field @ (Field::Verified
                    | Field::VerifiedBy
                    | Field::ChangedBy
                    | Field::UserCommentState),
                ) => SortColumn::Categorical(field),
                Some(field) => SortColumn::Status(field),
                None => return Err(Error::UnknownSortColumn(other.to_string())),
            },
        };
        Ok(column)
    }

    /// Header key of the column
    pub fn key(&self) -> &'static str {
        match self {
            SortColumn::Title => "title",
            SortColumn::Journal => "journal",
            SortColumn::Year => "year",
            SortColumn::PageCount => "page_count",
            SortColumn::EstimatedScore => "estimated_score",
            SortColumn::Relevance => "relevance",
            SortColumn::Type => "type",
            SortColumn::Changed => "changed",
            SortColumn::ResearchArea => "research_area",
            SortColumn::Pdf => "pdf-link",
            SortColumn::Categorical(field) | SortColumn::Status(field) => field.name(),
        }
    }

    /// Extract the comparable value of this column from a row
    pub fn value(&self, row: &PaperRow) -> SortValue {
        match self {
            SortColumn::Title => SortValue::Text(row.title.trim().to_string()),
            SortColumn::Journal => SortValue::Text(row.journal.trim().to_string()),
            SortColumn::Year => SortValue::number(&row.year),
            SortColumn::PageCount => SortValue::number(&row.page_count),
            SortColumn::EstimatedScore => SortValue::number(&row.estimated_score),
            SortColumn::Relevance => SortValue::number(&row.relevance),
            SortColumn::Type => SortValue::Text(row.pub_type.trim().to_string()),
            SortColumn::Changed => SortValue::Text(row.changed.trim().to_string()),
            SortColumn::ResearchArea => SortValue::Text(row.research_area.trim().to_string()),
            SortColumn::Categorical(field) => SortValue::Text(row.field_symbol(*field).to_string()),
            SortColumn::Pdf => SortValue::Weight(row.pdf.sort_weight()),
            SortColumn::Status(field) => SortValue::Weight(row.mark(*field).sort_weight()),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for SortColumn {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for SortColumn {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        SortColumn::from_key(&key).map_err(serde::de::Error::custom)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(&self) -> SortDirection {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Header indicator
    pub fn indicator(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Comparable value extracted from a cell
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
    Weight(u8),
}

impl SortValue {
    /// Parse a leading float; unparseable text sorts as 0
    fn number(text: &str) -> SortValue {
        SortValue::Number(leading_float(text.trim()).unwrap_or(0.0))
    }
}

/// Longest prefix of `text` that parses as a float ("12 pages" -> 12)
fn leading_float(text: &str) -> Option<f64> {
    let mut end = 0;
    let mut best = None;
    for (idx, ch) in text.char_indices() {
        if !(ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E')) {
            break;
        }
        end = idx + ch.len_utf8();
        if let Ok(value) = text[..end].parse::<f64>() {
            best = Some(value);
        }
    }
    best.filter(|v| v.is_finite())
}

fn compare_values(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Number(a), SortValue::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
        (SortValue::Weight(a), SortValue::Weight(b)) => a.cmp(b),
        // A column yields a single variant; mixed values only compare equal
        _ => Ordering::Equal,
    }
}

/// Current sort column and direction; no sort until the first click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    active: Option<(SortColumn, SortDirection)>,
}

impl SortState {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        SortState {
            active: Some((column, direction)),
        }
    }

    pub fn column(&self) -> Option<SortColumn> {
        self.active.map(|(column, _)| column)
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.active.map(|(_, direction)| direction)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Header click: the same column flips direction, a new column starts
    /// descending.
    pub fn click(&mut self, column: SortColumn) -> SortDirection {
        let direction = match self.active {
            Some((current, direction)) if current == column => direction.reversed(),
            _ => SortDirection::Descending,
        };
        self.active = Some((column, direction));
        direction
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

/// Order rows by `column`, ties broken by ascending id
pub fn sort<'a>(rows: &mut [&'a PaperRow], column: SortColumn, direction: SortDirection) {
    let mut keyed: Vec<(SortValue, &'a PaperRow)> =
        rows.iter().map(|row| (column.value(row), *row)).collect();

    keyed.sort_by(|(va, a), (vb, b)| {
        let primary = match direction {
            SortDirection::Ascending => compare_values(va, vb),
            SortDirection::Descending => compare_values(va, vb).reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    });

    for (slot, (_, row)) in rows.iter_mut().zip(keyed) {
        *slot = row;
    }
}

/// Sort the visible rows of the store in place. Hidden rows are moved ahead
/// of the visible ones; details travel with their rows.
pub fn sort_store(store: &mut RowStore, column: SortColumn, direction: SortDirection) {
    let order: Vec<String> = {
        let mut rows: Vec<&PaperRow> = store.visible().map(|e| &e.row).collect();
        sort(&mut rows, column, direction);
        rows.into_iter().map(|row| row.id.clone()).collect()
    };
    log::debug!("sorted {} visible rows by {} {:?}", order.len(), column, direction);
    store.reorder_visible(&order);
}
