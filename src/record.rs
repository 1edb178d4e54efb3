/// PaperTable Record Implementation
///
/// A `PaperRow` is one paper of the literature-review dataset. Each row is
/// paired 1:1 with a `DetailRow` carrying extended content that is fetched
/// lazily and may be missing.
///
/// Numeric columns (year, page count, scores) are kept as the raw cell text:
/// a malformed or missing number is a legal value that the filter and sort
/// engines interpret per column, never an error.
///
/// # Examples
///
/// ```
/// use papertable::{Field, Mark, PaperRow};
///
/// let json = r#"{
///     "id": "42",
///     "title": "Solder joint inspection with CNNs",
///     "year": 2021,
///     "page_count": "",
///     "fields": { "is_survey": "no", "features_solder_void": "✔️", "verified_by": "user" }
/// }"#;
/// let row: PaperRow = serde_json::from_str(json).unwrap();
///
/// assert_eq!(row.year_value(), Some(2021));
/// assert_eq!(row.page_count_value(), None);
/// assert_eq!(row.mark(Field::FeaturesSolderVoid), Mark::Yes);
/// assert!(row.counts_toward(Field::VerifiedBy));
/// ```

use crate::error::{Error, Result};
use crate::field::{Field, FieldKind, Mark, PdfStatus, Provenance, COUNT_FIELDS};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::convert::TryFrom;

/// One paper record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawPaperRow", into = "RawPaperRow")]
pub struct PaperRow {
    /// Stable row identifier
    pub id: String,
    pub title: String,
    pub authors: String,
    /// Journal or conference name
    pub journal: String,
    /// Publication type cell text (e.g. an emoji or "article")
    pub pub_type: String,
    /// Display title of the type cell, preferred over `pub_type` when present
    pub type_title: Option<String>,
    pub year: String,
    pub page_count: String,
    pub keywords: String,
    pub research_area: String,
    pub estimated_score: String,
    pub relevance: String,
    /// Last-changed timestamp text
    pub changed: String,
    pub pdf: PdfStatus,
    pub changed_by: Provenance,
    pub verified_by: Provenance,
    /// Free-text "other" features, `;`-separated
    pub features_other: String,
    /// Model names, `;`-separated
    pub model: String,
    marks: BTreeMap<Field, Mark>,
}

impl PaperRow {
    pub fn new(id: impl Into<String>) -> Self {
        PaperRow {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Tri-state value of a field. Fields never set read as Unknown.
    pub fn mark(&self, field: Field) -> Mark {
        self.marks.get(&field).copied().unwrap_or_default()
    }

    /// Set a tri-state field. Provenance fields are rejected.
    pub fn set_mark(&mut self, field: Field, mark: Mark) -> Result<()> {
        if field.kind() != FieldKind::Mark {
            return Err(Error::UnknownField(format!("{} (not a tri-state field)", field)));
        }
        self.marks.insert(field, mark);
        Ok(())
    }

    /// Builder-style variant of `set_mark` for tri-state fields
    pub fn with_mark(mut self, field: Field, mark: Mark) -> Self {
        if field.kind() == FieldKind::Mark {
            self.marks.insert(field, mark);
        }
        self
    }

    pub fn provenance(&self, field: Field) -> Option<&Provenance> {
        match field {
            Field::ChangedBy => Some(&self.changed_by),
            Field::VerifiedBy => Some(&self.verified_by),
            _ => None,
        }
    }

    /// Set any vocabulary field from its stored or rendered value.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<()> {
        let field = Field::from_name(name).ok_or_else(|| Error::UnknownField(name.to_string()))?;
        match field {
            Field::ChangedBy => self.changed_by = Provenance::parse(raw),
            Field::VerifiedBy => self.verified_by = Provenance::parse(raw),
            _ => {
                self.marks.insert(field, Mark::parse(raw));
            }
        }
        Ok(())
    }

    /// Advance a field to its next value, as a click on the cell does.
    pub fn cycle_field(&mut self, field: Field) {
        match field {
            Field::ChangedBy => self.changed_by = self.changed_by.cycle(),
            Field::VerifiedBy => self.verified_by = self.verified_by.cycle(),
            _ => {
                let next = self.mark(field).cycle();
                self.marks.insert(field, next);
            }
        }
    }

    /// Whether this row increments the counter of `field`: "yes" for
    /// tri-state fields, "user" for provenance fields.
    pub fn counts_toward(&self, field: Field) -> bool {
        match field.kind() {
            FieldKind::Mark => self.mark(field).is_yes(),
            FieldKind::Provenance => self.provenance(field).map(Provenance::is_user).unwrap_or(false),
        }
    }

    /// Rendered symbol of a field cell
    pub fn field_symbol(&self, field: Field) -> &'static str {
        match self.provenance(field) {
            Some(prov) => prov.symbol(),
            None => self.mark(field).symbol(),
        }
    }

    pub fn year_value(&self) -> Option<i32> {
        self.year.trim().parse().ok()
    }

    pub fn page_count_value(&self) -> Option<i64> {
        self.page_count.trim().parse().ok()
    }

    /// Publication type as displayed: the cell's title when present, else its text
    pub fn display_type(&self) -> &str {
        match self.type_title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title,
            _ => self.pub_type.trim(),
        }
    }

    /// Concatenated text of the row's visible cells
    pub fn visible_text(&self) -> String {
        [
            self.id.as_str(),
            self.pdf.symbol(),
            self.title.as_str(),
            self.authors.as_str(),
            self.year.as_str(),
            self.journal.as_str(),
            self.display_type(),
            self.page_count.as_str(),
            self.research_area.as_str(),
            self.changed.as_str(),
        ]
        .join(" ")
    }
}

/// Serialized form of a paper row
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct RawPaperRow {
    #[serde(deserialize_with = "text_or_number")]
    id: String,
    title: String,
    authors: String,
    journal: String,
    #[serde(rename = "type")]
    pub_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_title: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    year: String,
    #[serde(deserialize_with = "text_or_number")]
    page_count: String,
    keywords: String,
    research_area: String,
    #[serde(deserialize_with = "text_or_number")]
    estimated_score: String,
    #[serde(deserialize_with = "text_or_number")]
    relevance: String,
    changed: String,
    #[serde(deserialize_with = "pdf_status")]
    pdf: PdfStatus,
    features_other: String,
    model: String,
    #[serde(deserialize_with = "field_values")]
    fields: BTreeMap<String, String>,
}

impl TryFrom<RawPaperRow> for PaperRow {
    type Error = Error;

    fn try_from(raw: RawPaperRow) -> Result<Self> {
        let mut row = PaperRow {
            id: raw.id,
            title: raw.title,
            authors: raw.authors,
            journal: raw.journal,
            pub_type: raw.pub_type,
            type_title: raw.type_title,
            year: raw.year,
            page_count: raw.page_count,
            keywords: raw.keywords,
            research_area: raw.research_area,
            estimated_score: raw.estimated_score,
            relevance: raw.relevance,
            changed: raw.changed,
            pdf: raw.pdf,
            features_other: raw.features_other,
            model: raw.model,
            ..Default::default()
        };
        for (name, value) in &raw.fields {
            row.set_field(name, value)?;
        }
        Ok(row)
    }
}

impl From<PaperRow> for RawPaperRow {
    fn from(row: PaperRow) -> Self {
        let mut fields = BTreeMap::new();
        for field in COUNT_FIELDS {
            let value = match field {
                Field::ChangedBy => provenance_value(&row.changed_by),
                Field::VerifiedBy => provenance_value(&row.verified_by),
                _ => match row.marks.get(&field) {
                    Some(mark) => mark_value(*mark).to_string(),
                    None => continue,
                },
            };
            fields.insert(field.name().to_string(), value);
        }

        RawPaperRow {
            id: row.id,
            title: row.title,
            authors: row.authors,
            journal: row.journal,
            pub_type: row.pub_type,
            type_title: row.type_title,
            year: row.year,
            page_count: row.page_count,
            keywords: row.keywords,
            research_area: row.research_area,
            estimated_score: row.estimated_score,
            relevance: row.relevance,
            changed: row.changed,
            pdf: row.pdf,
            features_other: row.features_other,
            model: row.model,
            fields,
        }
    }
}

fn mark_value(mark: Mark) -> &'static str {
    match mark {
        Mark::Yes => "yes",
        Mark::No => "no",
        Mark::Unknown => "unknown",
    }
}

fn provenance_value(prov: &Provenance) -> String {
    match prov {
        Provenance::User => "user".to_string(),
        Provenance::Unknown => String::new(),
        Provenance::Computer(model) if model.is_empty() => "computer".to_string(),
        Provenance::Computer(model) => model.clone(),
    }
}

fn value_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Accept strings, numbers or null for text columns
fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(value_text)
}

/// Field values as stored by the database (`1`/`0`, booleans, null) or as
/// rendered symbols; the text is parsed per field kind afterwards.
fn field_values<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(name, value)| (name, value_text(value))).collect())
}

/// PDF status from a symbol, a stored word ("PDF") or null
fn pdf_status<'de, D>(deserializer: D) -> std::result::Result<PdfStatus, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(|value| PdfStatus::parse(&value_text(value)))
}

/// Loaded content of a detail row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailContent {
    /// Searchable text
    pub text: String,
    /// Trace subtrees, shown but excluded from search
    pub traces: Vec<String>,
}

/// The expandable detail row paired with each paper row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetailRow {
    pub content: Option<DetailContent>,
    /// Inline message shown when the last fetch failed
    pub error: Option<String>,
    pub expanded: bool,
}

impl DetailRow {
    pub fn with_content(content: DetailContent) -> Self {
        DetailRow {
            content: Some(content),
            ..Default::default()
        }
    }

    pub fn searchable_text(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.text.as_str())
    }
}

/// Response envelope of the per-row detail endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DetailEnvelope {
    pub status: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DetailEnvelope {
    /// The detail markup on success, or the server's message as a fetch error
    pub fn into_result(self) -> Result<String> {
        match (self.status.as_str(), self.html) {
            ("success", Some(html)) => Ok(html),
            _ => Err(Error::Fetch(
                self.message.unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }
}
