/// PaperTable Session
///
/// A `TableSession` owns the row store together with the filter and sort
/// state and the last computed `Snapshot`. It is the single writer of all of
/// them: every input goes through a session method and every output is read
/// from the snapshot.
///
/// A recomputation pass runs filter, sort (when a sort is active), aggregation
/// and shading, in that order, over the whole store. Passes are synchronous,
/// rebuild everything from scratch and are idempotent.
///
/// # Examples
///
/// ```
/// use papertable::{Field, FilterState, Mark, PaperRow, RowEntry, DetailRow, TableSession, ViewConfig};
///
/// let rows = vec![
///     PaperRow::new("1").with_mark(Field::IsOfftopic, Mark::Yes),
///     PaperRow::new("2").with_mark(Field::IsSurvey, Mark::Yes),
/// ];
/// let entries = rows.into_iter().map(|r| RowEntry::new(r, DetailRow::default())).collect();
///
/// let mut session = TableSession::with_entries(ViewConfig::default(), entries).unwrap();
/// assert_eq!(session.snapshot().visible, 2);
///
/// session.set_filter(FilterState { hide_offtopic: true, ..Default::default() });
/// let snapshot = session.snapshot();
/// assert_eq!(snapshot.visible, 1);
/// assert_eq!(snapshot.total, 2);
/// assert_eq!(snapshot.counts.get(Field::IsSurvey), 1);
/// ```

use crate::aggregate::{aggregate_store, AggregateCounts, YearlyBreakdown};
use crate::config::ViewConfig;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::filter::{self, FilterState};
use crate::markup;
use crate::record::{DetailContent, DetailEnvelope};
use crate::schedule::{RecomputeScheduler, ReloadTicket, Trigger};
use crate::shading::{shade_store, ShadingPlan};
use crate::sort::{sort_store, SortColumn, SortDirection, SortState};
use crate::stats::{chart_stats, list_stats, StatsReport};
use crate::store::{RowEntry, RowStore};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Output of one recomputation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Visible row ids in display order
    pub order: Vec<String>,
    pub counts: AggregateCounts,
    pub yearly: YearlyBreakdown,
    pub shading: ShadingPlan,
    pub filter: FilterState,
    pub sort: SortState,
    /// Footer totals
    pub total: usize,
    pub visible: usize,
}

impl Snapshot {
    /// Distinct titles shown more than once
    pub fn duplicate_titles(&self) -> usize {
        self.shading.duplicate_titles
    }
}

pub struct TableSession {
    store: RowStore,
    filter: FilterState,
    sort: SortState,
    config: ViewConfig,
    scheduler: RecomputeScheduler,
    snapshot: Snapshot,
    last_error: Option<String>,
    passes: u64,
}

impl TableSession {
    /// An empty session. The configured initial sort is applied descending.
    pub fn new(config: ViewConfig) -> Self {
        let mut sort = SortState::default();
        if let Some(key) = config.initial_sort.as_deref() {
            match SortColumn::from_key(key) {
                Ok(column) => sort = SortState::new(column, SortDirection::Descending),
                Err(e) => log::warn!("ignoring initial sort: {}", e),
            }
        }

        let mut session = TableSession {
            store: RowStore::new(),
            filter: FilterState::default(),
            sort,
            scheduler: RecomputeScheduler::from_config(&config.debounce),
            config,
            snapshot: Snapshot::default(),
            last_error: None,
            passes: 0,
        };
        session.recompute();
        session
    }

    pub fn with_entries(config: ViewConfig, entries: Vec<RowEntry>) -> Result<Self> {
        let mut session = TableSession::new(config);
        session.load_entries(entries)?;
        Ok(session)
    }

    /// Session over a row-collection markup fragment
    pub fn from_markup(config: ViewConfig, fragment: &str) -> Result<Self> {
        let entries = markup::parse_rows(fragment)?;
        Self::with_entries(config, entries)
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Message of the last failed reload, cleared by the next successful one
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// A row reload is in flight
    pub fn is_busy(&self) -> bool {
        self.scheduler.is_busy()
    }

    /// Number of passes run so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Replace every row and recompute. On error the current rows are kept.
    pub fn load_entries(&mut self, entries: Vec<RowEntry>) -> Result<&Snapshot> {
        self.store.replace(entries)?;
        log::info!("loaded {} rows", self.store.len());
        Ok(self.recompute())
    }

    pub fn load_markup(&mut self, fragment: &str) -> Result<&Snapshot> {
        let entries = markup::parse_rows(fragment)?;
        self.load_entries(entries)
    }

    /// Run the full pass now: filter, sort, aggregate, shade.
    pub fn recompute(&mut self) -> &Snapshot {
        let visible = filter::apply(&mut self.store, &self.filter);

        if let (Some(column), Some(direction)) = (self.sort.column(), self.sort.direction()) {
            sort_store(&mut self.store, column, direction);
        }

        let (counts, yearly) = aggregate_store(&self.store);
        let shading = shade_store(&self.store, &self.config.shading);

        self.snapshot = Snapshot {
            order: self.store.visible().map(|e| e.id().to_string()).collect(),
            counts,
            yearly,
            shading,
            filter: self.filter.clone(),
            sort: self.sort,
            total: self.store.len(),
            visible,
        };
        self.passes += 1;

        log::debug!(
            "pass {}: {} of {} rows visible",
            self.passes,
            self.snapshot.visible,
            self.snapshot.total
        );
        &self.snapshot
    }

    /// Replace the filter state and recompute immediately
    pub fn set_filter(&mut self, state: FilterState) -> &Snapshot {
        self.filter = state;
        self.recompute()
    }

    /// Replace the filter state and schedule a debounced pass. A change of
    /// the search text alone uses the search delay. Returns the due time.
    pub fn submit_filter(&mut self, state: FilterState, now: Instant) -> Instant {
        let search_only = FilterState {
            search: state.search.clone(),
            ..self.filter.clone()
        } == state
            && state.search != self.filter.search;
        self.filter = state;
        let trigger = if search_only {
            Trigger::Search
        } else {
            Trigger::Toggle
        };
        self.scheduler.submit(trigger, now)
    }

    /// Update only the search text, debounced with the search delay
    pub fn submit_search(&mut self, search: impl Into<String>, now: Instant) -> Instant {
        self.filter.search = search.into();
        self.scheduler.submit(Trigger::Search, now)
    }

    /// Run the pending pass if it is due
    pub fn poll(&mut self, now: Instant) -> Option<&Snapshot> {
        match self.scheduler.poll(now) {
            Some(trigger) => {
                log::debug!("running {:?} pass", trigger);
                Some(self.recompute())
            }
            None => None,
        }
    }

    /// Run the pending pass now, whether or not it is due
    pub fn flush(&mut self) -> Option<&Snapshot> {
        match self.scheduler.flush() {
            Some(trigger) => {
                log::debug!("flushing {:?} pass", trigger);
                Some(self.recompute())
            }
            None => None,
        }
    }

    /// Due time of the pending pass
    pub fn next_due(&self) -> Option<Instant> {
        self.scheduler.next_due()
    }

    /// Header click on `key`; sorts and recomputes immediately
    pub fn click_sort(&mut self, key: &str) -> Result<SortDirection> {
        let column = SortColumn::from_key(key)?;
        let direction = self.sort.click(column);
        self.recompute();
        Ok(direction)
    }

    pub fn clear_sort(&mut self) -> &Snapshot {
        self.sort.clear();
        self.recompute()
    }

    /// Start a row reload; earlier reloads still in flight become stale
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.scheduler.begin_reload()
    }

    /// Apply the outcome of a reload. Stale tickets are ignored; failures are
    /// recorded and leave the current rows in place. Returns whether the rows
    /// were replaced.
    pub fn finish_reload(&mut self, ticket: ReloadTicket, result: Result<Vec<RowEntry>>) -> bool {
        if !self.scheduler.finish_reload(&ticket) {
            return false;
        }

        let outcome = result.and_then(|entries| self.store.replace(entries));
        match outcome {
            Ok(()) => {
                log::info!("reload {} accepted: {} rows", ticket.generation(), self.store.len());
                self.last_error = None;
                // Input submitted during the reload is covered by this pass
                self.scheduler.cancel();
                self.recompute();
                true
            }
            Err(e) => {
                log::warn!("reload {} failed: {}", ticket.generation(), e);
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// `finish_reload` for a markup response
    pub fn finish_reload_markup(&mut self, ticket: ReloadTicket, result: Result<String>) -> bool {
        let entries = result.and_then(|fragment| markup::parse_rows(&fragment));
        self.finish_reload(ticket, entries)
    }

    /// Store fetched detail content, or the inline error message on failure.
    /// Returns false when no row has this id.
    pub fn apply_detail(&mut self, id: &str, result: Result<DetailContent>) -> bool {
        let entry = match self.store.get_mut(id) {
            Some(entry) => entry,
            None => return false,
        };

        match result {
            Ok(content) => {
                entry.detail.content = Some(content);
                entry.detail.error = None;
            }
            Err(e) => {
                let message = match e {
                    Error::Fetch(message) => message,
                    other => other.to_string(),
                };
                log::warn!("detail fetch for {} failed: {}", id, message);
                entry.detail.error = Some(format!("Error loading details: {}", message));
            }
        }

        // Detail text takes part in search
        if !self.filter.search.trim().is_empty() {
            self.recompute();
        }
        true
    }

    /// `apply_detail` for a raw detail endpoint response
    pub fn apply_detail_envelope(&mut self, id: &str, envelope: DetailEnvelope) -> bool {
        let content = envelope
            .into_result()
            .and_then(|html| markup::parse_detail(&html));
        self.apply_detail(id, content)
    }

    pub fn toggle_detail(&mut self, id: &str) -> Option<bool> {
        let entry = self.store.get_mut(id)?;
        entry.detail.expanded = !entry.detail.expanded;
        Some(entry.detail.expanded)
    }

    /// Set a classification field from its stored or rendered value.
    /// Returns false when no row has this id.
    pub fn set_field(&mut self, id: &str, name: &str, raw: &str) -> Result<bool> {
        let entry = match self.store.get_mut(id) {
            Some(entry) => entry,
            None => return Ok(false),
        };
        entry.row.set_field(name, raw)?;
        self.recompute();
        Ok(true)
    }

    /// Advance a field to its next value, as a click on the cell does
    pub fn cycle_field(&mut self, id: &str, name: &str) -> Result<bool> {
        let field = Field::from_name(name).ok_or_else(|| Error::UnknownField(name.to_string()))?;
        let entry = match self.store.get_mut(id) {
            Some(entry) => entry,
            None => return Ok(false),
        };
        entry.row.cycle_field(field);
        self.recompute();
        Ok(true)
    }

    /// Charts from the last snapshot plus lists over the visible rows
    pub fn stats(&self) -> StatsReport {
        StatsReport {
            charts: chart_stats(&self.snapshot.counts, &self.snapshot.yearly),
            lists: list_stats(self.store.visible().map(|e| &e.row)),
        }
    }
}

impl Default for TableSession {
    fn default() -> Self {
        TableSession::new(ViewConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Mark;
    use crate::record::{DetailRow, PaperRow};
    use crate::shading::Shade;
    use std::time::Duration;

    fn entries(rows: Vec<PaperRow>) -> Vec<RowEntry> {
        rows.into_iter()
            .map(|r| RowEntry::new(r, DetailRow::default()))
            .collect()
    }

    fn unsorted() -> ViewConfig {
        ViewConfig {
            initial_sort: None,
            ..Default::default()
        }
    }

    fn sample() -> Vec<PaperRow> {
        let mut rows = Vec::new();
        for (id, year, journal) in [
            ("1", "2020", "X"),
            ("2", "2021", "X"),
            ("3", "2019", "Y"),
            ("4", "", "X"),
        ] {
            let mut row = PaperRow::new(id);
            row.year = year.to_string();
            row.journal = journal.to_string();
            rows.push(row);
        }
        rows[2] = rows[2].clone().with_mark(Field::IsOfftopic, Mark::Yes);
        rows
    }

    #[test]
    fn test_initial_sort_from_config() {
        let commented = PaperRow::new("a").with_mark(Field::UserCommentState, Mark::Yes);
        let session =
            TableSession::with_entries(ViewConfig::default(), entries(vec![PaperRow::new("b"), commented]))
                .unwrap();
        assert_eq!(
            session.sort_state().column(),
            Some(SortColumn::Categorical(Field::UserCommentState))
        );
        assert_eq!(session.sort_state().direction(), Some(SortDirection::Descending));
        assert_eq!(session.snapshot().order.len(), 2);
    }

    #[test]
    fn test_bad_initial_sort_is_ignored() {
        let config = ViewConfig {
            initial_sort: Some("nonsense".to_string()),
            ..Default::default()
        };
        assert!(!TableSession::new(config).sort_state().is_active());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        session.click_sort("year").unwrap();
        let first = session.snapshot().clone();
        let second = session.recompute().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_then_shading_parity() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        session.set_filter(FilterState {
            hide_offtopic: true,
            ..Default::default()
        });

        let snapshot = session.snapshot();
        assert_eq!(snapshot.order, vec!["1", "2", "4"]);
        assert_eq!(snapshot.shading.get("4").unwrap().shade, Shade::A);
        assert!(snapshot.shading.get("3").is_none());
        assert_eq!(snapshot.counts.get(Field::IsOfftopic), 0);
        assert_eq!(snapshot.total, 4);
    }

    #[test]
    fn test_click_sort_twice() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        assert_eq!(session.click_sort("year").unwrap(), SortDirection::Descending);
        assert_eq!(session.snapshot().order, vec!["2", "1", "3", "4"]);
        assert_eq!(session.click_sort("year").unwrap(), SortDirection::Ascending);
        assert_eq!(session.snapshot().order, vec!["4", "3", "1", "2"]);
        assert!(session.click_sort("authors").is_err());
    }

    #[test]
    fn test_debounced_filter() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        let t0 = Instant::now();

        let due = session.submit_search("x", t0);
        assert_eq!(due, t0 + Duration::from_millis(300));
        assert!(session.poll(t0 + Duration::from_millis(100)).is_none());
        assert_eq!(session.snapshot().visible, 4, "not applied before due");

        let snapshot = session.poll(due).unwrap();
        assert_eq!(snapshot.visible, 3);
    }

    #[test]
    fn test_flush_runs_pending_pass_early() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        let t0 = Instant::now();
        session.submit_filter(
            FilterState {
                hide_offtopic: true,
                ..Default::default()
            },
            t0,
        );
        assert_eq!(session.snapshot().visible, 4);

        let passes = session.passes();
        assert_eq!(session.flush().unwrap().visible, 3);
        assert_eq!(session.passes(), passes + 1);
        assert!(session.next_due().is_none());
        assert!(session.flush().is_none());
        assert!(session.poll(t0 + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_submit_filter_picks_trigger_delay() {
        let mut session = TableSession::new(unsorted());
        let t0 = Instant::now();
        let search_due = session.submit_filter(
            FilterState {
                search: "pcb".to_string(),
                ..Default::default()
            },
            t0,
        );
        assert_eq!(search_due, t0 + Duration::from_millis(300));
        session.poll(search_due);

        let t1 = search_due;
        let toggle_due = session.submit_filter(
            FilterState {
                search: "pcb".to_string(),
                hide_xray: true,
                ..Default::default()
            },
            t1,
        );
        assert_eq!(toggle_due, t1 + Duration::from_millis(200));
    }

    #[test]
    fn test_stale_reload_does_not_overwrite() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        let old = session.begin_reload();
        let new = session.begin_reload();
        assert!(session.is_busy());

        assert!(session.finish_reload(new, Ok(entries(vec![PaperRow::new("fresh")]))));
        assert!(!session.finish_reload(old, Ok(entries(vec![PaperRow::new("stale")]))));
        assert_eq!(session.snapshot().order, vec!["fresh"]);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_failed_reload_keeps_rows() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        let ticket = session.begin_reload();
        let applied = session.finish_reload(ticket, Err(Error::Fetch("timeout".to_string())));
        assert!(!applied);
        assert_eq!(session.snapshot().total, 4);
        assert_eq!(session.last_error(), Some("fetch failed: timeout"));
    }

    #[test]
    fn test_reload_applies_pending_filter() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        let ticket = session.begin_reload();
        session.submit_filter(
            FilterState {
                hide_offtopic: true,
                ..Default::default()
            },
            Instant::now(),
        );
        assert!(session.finish_reload(ticket, Ok(entries(sample()))));
        assert_eq!(session.snapshot().visible, 3);
        assert!(session.next_due().is_none());
    }

    #[test]
    fn test_detail_error_message() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        let envelope = DetailEnvelope {
            status: "error".to_string(),
            html: None,
            message: Some("Paper not found".to_string()),
        };
        assert!(session.apply_detail_envelope("1", envelope));
        assert_eq!(
            session.store().get("1").unwrap().detail.error.as_deref(),
            Some("Error loading details: Paper not found")
        );
        assert!(!session.apply_detail("missing", Ok(DetailContent::default())));
    }

    #[test]
    fn test_detail_text_becomes_searchable() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        session.set_filter(FilterState {
            search: "thermography".to_string(),
            ..Default::default()
        });
        assert_eq!(session.snapshot().visible, 0);

        let envelope = DetailEnvelope {
            status: "success".to_string(),
            html: Some("<p>Uses thermography</p>".to_string()),
            message: None,
        };
        session.apply_detail_envelope("2", envelope);
        assert_eq!(session.snapshot().order, vec!["2"]);
    }

    #[test]
    fn test_field_edits_recount() {
        let mut session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        assert!(session.set_field("1", "verified_by", "👤").unwrap());
        assert_eq!(session.snapshot().counts.get(Field::VerifiedBy), 1);

        assert!(session.cycle_field("2", "is_survey").unwrap());
        assert_eq!(session.snapshot().counts.get(Field::IsSurvey), 1);

        assert!(session.set_field("1", "features_lasers", "yes").is_err());
        assert!(!session.cycle_field("nope", "is_survey").unwrap());
    }

    #[test]
    fn test_stats_from_snapshot() {
        let session = TableSession::with_entries(unsorted(), entries(sample())).unwrap();
        let stats = session.stats();
        assert_eq!(stats.lists.journals[0].name, "X");
        assert_eq!(stats.lists.journals[0].count, 3);
        assert_eq!(stats.charts.survey_vs_implementation.years, vec![2019, 2020, 2021]);
    }
}
