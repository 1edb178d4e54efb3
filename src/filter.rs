//! Filter evaluation for paper rows.
//!
//! A `FilterState` is an immutable snapshot of the filter controls. It is
//! compiled into a list of active predicates which are AND'ed together; the
//! PCB/Solder/PCBA inclusion group is a single predicate that ORs across the
//! groups that are switched on.
//!
//! Missing or malformed values never raise: each predicate documents which
//! way an absent value falls.

use crate::field::{
    Field, Mark, ALL_FEATURES, PCBA_FEATURES, PCB_FEATURES, SOLDER_FEATURES,
};
use crate::record::{DetailRow, PaperRow};
use crate::store::RowStore;
use serde::{Deserialize, Serialize};

/// Snapshot of the filter controls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Free-text search term
    pub search: String,
    pub hide_offtopic: bool,
    pub hide_xray: bool,
    /// Hide rows already verified
    pub hide_approved: bool,
    pub only_survey: bool,
    /// Keep only rows with no feature marked
    pub only_no_features: bool,
    pub show_pcb: bool,
    pub show_solder: bool,
    pub show_pcba: bool,
    pub min_page_count: Option<i64>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

/// A single row test
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Hide when the field is "yes"
    HideWhenYes(Field),
    /// Hide when the field is explicitly "no"; unknown passes
    HideWhenNo(Field),
    /// Hide when the page count is numeric and below the threshold
    MinPageCount(i64),
    /// Hide when the year is missing, malformed or out of range
    YearRange { from: Option<i32>, to: Option<i32> },
    /// Lowercased search term matched against row and detail text
    Search(String),
    /// Keep rows with any "yes" feature in at least one of the groups
    AnyGroup(Vec<&'static [Field]>),
    /// Hide rows with any feature filled in
    NoFeatures,
}

impl Predicate {
    pub fn passes(&self, row: &PaperRow, detail: Option<&DetailRow>) -> bool {
        match self {
            Predicate::HideWhenYes(field) => row.mark(*field) != Mark::Yes,
            Predicate::HideWhenNo(field) => row.mark(*field) != Mark::No,
            Predicate::MinPageCount(min) => match row.page_count_value() {
                Some(pages) => pages >= *min,
                None => true,
            },
            Predicate::YearRange { from, to } => match row.year_value() {
                Some(year) => {
                    from.map(|f| year >= f).unwrap_or(true) && to.map(|t| year <= t).unwrap_or(true)
                }
                None => false,
            },
            Predicate::Search(term) => {
                row.visible_text().to_lowercase().contains(term.as_str())
                    || detail
                        .and_then(DetailRow::searchable_text)
                        .map(|text| text.to_lowercase().contains(term.as_str()))
                        .unwrap_or(false)
            }
            Predicate::AnyGroup(groups) => groups
                .iter()
                .any(|group| group.iter().any(|field| row.mark(*field).is_yes())),
            Predicate::NoFeatures => !ALL_FEATURES.iter().any(|field| row.mark(*field).is_yes()),
        }
    }
}

/// The active predicates of a filter state, in evaluation order
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    predicates: Vec<Predicate>,
}

impl CompiledFilter {
    pub fn new(state: &FilterState) -> Self {
        let mut predicates = Vec::new();

        if state.hide_offtopic {
            predicates.push(Predicate::HideWhenYes(Field::IsOfftopic));
        }
        if state.hide_xray {
            predicates.push(Predicate::HideWhenYes(Field::IsXRay));
        }
        if state.only_survey {
            predicates.push(Predicate::HideWhenNo(Field::IsSurvey));
        }
        if state.hide_approved {
            predicates.push(Predicate::HideWhenYes(Field::Verified));
        }
        if let Some(min) = state.min_page_count {
            predicates.push(Predicate::MinPageCount(min));
        }
        if state.year_from.is_some() || state.year_to.is_some() {
            predicates.push(Predicate::YearRange {
                from: state.year_from,
                to: state.year_to,
            });
        }

        let mut groups: Vec<&'static [Field]> = Vec::new();
        if state.show_pcb {
            groups.push(&PCB_FEATURES);
        }
        if state.show_solder {
            groups.push(&SOLDER_FEATURES);
        }
        if state.show_pcba {
            groups.push(&PCBA_FEATURES);
        }
        if !groups.is_empty() {
            predicates.push(Predicate::AnyGroup(groups));
        }

        if state.only_no_features {
            predicates.push(Predicate::NoFeatures);
        }

        // Search last: it is the most expensive test
        let term = state.search.trim();
        if !term.is_empty() {
            predicates.push(Predicate::Search(term.to_lowercase()));
        }

        CompiledFilter { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// True when every active predicate passes; stops at the first failure
    pub fn matches(&self, row: &PaperRow, detail: Option<&DetailRow>) -> bool {
        self.predicates.iter().all(|p| p.passes(row, detail))
    }
}

/// Whether `row` is visible under `state`
pub fn visible(row: &PaperRow, detail: Option<&DetailRow>, state: &FilterState) -> bool {
    CompiledFilter::new(state).matches(row, detail)
}

/// Set the hidden marker of every row in the store. Returns the visible count.
pub fn apply(store: &mut RowStore, state: &FilterState) -> usize {
    let filter = CompiledFilter::new(state);
    let mut shown = 0;
    for entry in store.iter_mut() {
        entry.hidden = !filter.matches(&entry.row, Some(&entry.detail));
        if !entry.hidden {
            shown += 1;
        }
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DetailContent;

    fn row_with(field: Field, mark: Mark) -> PaperRow {
        PaperRow::new("r").with_mark(field, mark)
    }

    #[test]
    fn test_empty_state_shows_everything() {
        let state = FilterState::default();
        assert!(CompiledFilter::new(&state).is_empty());
        assert!(visible(&PaperRow::new("x"), None, &state));
    }

    #[test]
    fn test_hide_toggles() {
        let state = FilterState {
            hide_offtopic: true,
            hide_xray: true,
            hide_approved: true,
            ..Default::default()
        };
        assert!(!visible(&row_with(Field::IsOfftopic, Mark::Yes), None, &state));
        assert!(!visible(&row_with(Field::IsXRay, Mark::Yes), None, &state));
        assert!(!visible(&row_with(Field::Verified, Mark::Yes), None, &state));
        assert!(visible(&row_with(Field::IsXRay, Mark::Unknown), None, &state));
        assert!(visible(&row_with(Field::Verified, Mark::No), None, &state));
    }

    #[test]
    fn test_only_survey_keeps_unknown() {
        let state = FilterState {
            only_survey: true,
            ..Default::default()
        };
        assert!(visible(&row_with(Field::IsSurvey, Mark::Unknown), None, &state));
        assert!(visible(&row_with(Field::IsSurvey, Mark::Yes), None, &state));
        assert!(!visible(&row_with(Field::IsSurvey, Mark::No), None, &state));
    }

    #[test]
    fn test_min_page_count_never_hides_non_numeric() {
        let state = FilterState {
            min_page_count: Some(5),
            ..Default::default()
        };
        let mut row = PaperRow::new("r");
        assert!(visible(&row, None, &state));
        row.page_count = "xii".to_string();
        assert!(visible(&row, None, &state));
        row.page_count = "4".to_string();
        assert!(!visible(&row, None, &state));
        row.page_count = "5".to_string();
        assert!(visible(&row, None, &state));
    }

    #[test]
    fn test_year_range() {
        let state = FilterState {
            year_from: Some(2018),
            year_to: Some(2020),
            ..Default::default()
        };
        let mut row = PaperRow::new("r");
        assert!(!visible(&row, None, &state), "missing year is hidden");
        row.year = "2019".to_string();
        assert!(visible(&row, None, &state));
        row.year = "2021".to_string();
        assert!(!visible(&row, None, &state));

        let open_top = FilterState {
            year_from: Some(2018),
            ..Default::default()
        };
        row.year = "2030".to_string();
        assert!(visible(&row, None, &open_top));
    }

    #[test]
    fn test_search_row_and_detail() {
        let state = FilterState {
            search: "  X-RAY ".to_string(),
            ..Default::default()
        };
        let mut row = PaperRow::new("r");
        row.title = "Automated x-ray inspection".to_string();
        assert!(visible(&row, None, &state));

        let plain = PaperRow::new("q");
        let detail = DetailRow::with_content(DetailContent {
            text: "uses X-ray imaging".to_string(),
            traces: vec![],
        });
        assert!(visible(&plain, Some(&detail), &state));

        let traced = DetailRow::with_content(DetailContent {
            text: "nothing here".to_string(),
            traces: vec!["x-ray mentioned in trace".to_string()],
        });
        assert!(!visible(&plain, Some(&traced), &state));
        assert!(!visible(&plain, None, &state));
    }

    #[test]
    fn test_group_filter_is_or_across_active_groups() {
        let solder = row_with(Field::FeaturesSolderVoid, Mark::Yes);
        let pcb = row_with(Field::FeaturesHoles, Mark::Yes);
        let none = PaperRow::new("n");

        let pcb_only = FilterState {
            show_pcb: true,
            ..Default::default()
        };
        assert!(visible(&pcb, None, &pcb_only));
        assert!(!visible(&solder, None, &pcb_only));
        assert!(!visible(&none, None, &pcb_only));

        let pcb_or_solder = FilterState {
            show_pcb: true,
            show_solder: true,
            ..Default::default()
        };
        assert!(visible(&pcb, None, &pcb_or_solder));
        assert!(visible(&solder, None, &pcb_or_solder));
        assert!(!visible(&none, None, &pcb_or_solder));
    }

    #[test]
    fn test_no_features_filter() {
        let state = FilterState {
            only_no_features: true,
            ..Default::default()
        };
        assert!(visible(&row_with(Field::FeaturesCosmetic, Mark::No), None, &state));
        assert!(!visible(&row_with(Field::FeaturesSolderOther, Mark::Yes), None, &state));
    }

    #[test]
    fn test_visible_is_deterministic() {
        let state = FilterState {
            only_survey: true,
            search: "pcb".to_string(),
            ..Default::default()
        };
        let mut row = PaperRow::new("r").with_mark(Field::IsSurvey, Mark::Yes);
        row.journal = "PCB Journal".to_string();
        let first = visible(&row, None, &state);
        for _ in 0..5 {
            assert_eq!(visible(&row, None, &state), first);
        }
    }

    #[test]
    fn test_apply_marks_store() {
        let offtopic = PaperRow::new("a").with_mark(Field::IsOfftopic, Mark::Yes);
        let mut store = RowStore::from_rows(vec![offtopic, PaperRow::new("b")]).unwrap();
        let state = FilterState {
            hide_offtopic: true,
            ..Default::default()
        };
        assert_eq!(apply(&mut store, &state), 1);
        assert!(store.get("a").unwrap().hidden);
        assert!(!store.get("b").unwrap().hidden);
    }
}
