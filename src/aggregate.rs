/// PaperTable Aggregator
///
/// Scans the visible rows once per pass and produces the global field counts
/// and the per-year breakdowns consumed by the stats layer. Results are
/// rebuilt from scratch on every call; nothing is patched or memoised.
///
/// # Examples
///
/// ```
/// use papertable::{aggregate, Field, Mark, PaperRow, PdfStatus};
///
/// let mut a = PaperRow::new("a").with_mark(Field::IsSurvey, Mark::Yes);
/// a.year = "2020".to_string();
/// a.pdf = PdfStatus::Annotated;
/// let mut b = PaperRow::new("b");
/// b.year = "2020".to_string();
///
/// let (counts, yearly) = aggregate([&a, &b]);
/// assert_eq!(counts.get(Field::IsSurvey), 1);
/// assert_eq!(counts.pdf_present, 1);
/// assert_eq!(counts.pdf_annotated, 1);
///
/// let split = yearly.bucket(2020).unwrap().split;
/// assert_eq!((split.survey, split.implementation), (1, 1));
/// ```

use crate::field::{Field, Mark, PdfStatus, COUNT_FIELDS, FEATURE_FIELDS, TECHNIQUE_FIELDS};
use crate::record::PaperRow;
use crate::store::RowStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field counts over the visible rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCounts {
    /// Rows in the store
    pub total: usize,
    /// Rows that passed the filter
    pub visible: usize,
    /// Rows with a PDF (annotated included)
    pub pdf_present: u64,
    pub pdf_annotated: u64,
    pub pdf_paywalled: u64,
    fields: BTreeMap<Field, u64>,
}

impl Default for AggregateCounts {
    fn default() -> Self {
        AggregateCounts {
            total: 0,
            visible: 0,
            pdf_present: 0,
            pdf_annotated: 0,
            pdf_paywalled: 0,
            fields: COUNT_FIELDS.iter().map(|f| (*f, 0)).collect(),
        }
    }
}

impl AggregateCounts {
    pub fn get(&self, field: Field) -> u64 {
        self.fields.get(&field).copied().unwrap_or(0)
    }

    /// Count by field name; None for names outside the vocabulary
    pub fn get_by_name(&self, name: &str) -> Option<u64> {
        Field::from_name(name).map(|f| self.get(f))
    }

    pub fn fields(&self) -> impl Iterator<Item = (Field, u64)> + '_ {
        self.fields.iter().map(|(f, c)| (*f, *c))
    }

    fn record(&mut self, row: &PaperRow) {
        self.visible += 1;

        if row.pdf.has_pdf() {
            self.pdf_present += 1;
        }
        if row.pdf == PdfStatus::Annotated {
            self.pdf_annotated += 1;
        }
        if row.pdf == PdfStatus::Paywalled {
            self.pdf_paywalled += 1;
        }

        for field in COUNT_FIELDS {
            if row.counts_toward(field) {
                *self.fields.entry(field).or_insert(0) += 1;
            }
        }
    }
}

/// Survey vs. implementation papers of one year
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySplit {
    pub survey: u64,
    pub implementation: u64,
}

/// Counters of one publication year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBucket {
    pub split: SurveySplit,
    pub techniques: BTreeMap<Field, u64>,
    pub features: BTreeMap<Field, u64>,
    /// Publication types discovered in this year's rows
    pub pub_types: BTreeMap<String, u64>,
}

impl YearBucket {
    /// A fresh bucket has every technique and feature counter at zero
    fn new() -> Self {
        YearBucket {
            split: SurveySplit::default(),
            techniques: TECHNIQUE_FIELDS.iter().map(|f| (*f, 0)).collect(),
            features: FEATURE_FIELDS.iter().map(|f| (*f, 0)).collect(),
            pub_types: BTreeMap::new(),
        }
    }

    fn record(&mut self, row: &PaperRow) {
        // Unknown counts as implementation
        if row.mark(Field::IsSurvey) == Mark::Yes {
            self.split.survey += 1;
        } else {
            self.split.implementation += 1;
        }

        for (field, count) in self.techniques.iter_mut() {
            if row.counts_toward(*field) {
                *count += 1;
            }
        }
        for (field, count) in self.features.iter_mut() {
            if row.counts_toward(*field) {
                *count += 1;
            }
        }

        let pub_type = row.display_type();
        if !pub_type.is_empty() {
            *self.pub_types.entry(pub_type.to_string()).or_insert(0) += 1;
        }
    }
}

/// Per-year counters, keyed by year in ascending order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyBreakdown {
    years: BTreeMap<i32, YearBucket>,
}

impl YearlyBreakdown {
    pub fn bucket(&self, year: i32) -> Option<&YearBucket> {
        self.years.get(&year)
    }

    /// Years with at least one visible row, ascending
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    pub fn buckets(&self) -> impl Iterator<Item = (i32, &YearBucket)> {
        self.years.iter().map(|(y, b)| (*y, b))
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Every publication type seen in any year, sorted
    pub fn pub_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .years
            .values()
            .flat_map(|b| b.pub_types.keys().cloned())
            .collect();
        types.sort();
        types.dedup();
        types
    }

    fn record(&mut self, row: &PaperRow) {
        // Rows without a usable year cannot be bucketed
        if let Some(year) = row.year_value() {
            self.years.entry(year).or_insert_with(YearBucket::new).record(row);
        }
    }
}

/// Count the given rows. `visible` and field counts cover exactly these rows;
/// `total` is left at zero for the caller to fill in.
pub fn aggregate<'a, I>(rows: I) -> (AggregateCounts, YearlyBreakdown)
where
    I: IntoIterator<Item = &'a PaperRow>,
{
    let mut counts = AggregateCounts::default();
    let mut yearly = YearlyBreakdown::default();

    for row in rows {
        counts.record(row);
        yearly.record(row);
    }

    (counts, yearly)
}

/// Count the visible rows of a store
pub fn aggregate_store(store: &RowStore) -> (AggregateCounts, YearlyBreakdown) {
    let (mut counts, yearly) = aggregate(store.visible().map(|e| &e.row));
    counts.total = store.len();
    (counts, yearly)
}
