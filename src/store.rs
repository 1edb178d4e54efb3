/// PaperTable Row Store
///
/// The Row Store owns the rows currently materialised in the table, in their
/// storage (display) order. Every paper row travels together with its detail
/// row and its hidden marker; sorting moves the pair as one unit.
///
/// The store is replaced wholesale on reload, never patched.
///
/// # Examples
///
/// ```
/// use papertable::{PaperRow, RowStore};
///
/// let mut store = RowStore::new();
/// store.append(PaperRow::new("a")).unwrap();
/// store.append(PaperRow::new("b")).unwrap();
///
/// assert_eq!(store.len(), 2);
/// assert!(store.append(PaperRow::new("a")).is_err());
/// assert_eq!(store.position("b"), Some(1));
/// ```

use crate::error::{Error, Result};
use crate::record::{DetailRow, PaperRow};
use std::collections::{HashMap, HashSet};

/// A paper row, its paired detail row and its visibility marker
#[derive(Debug, Clone, PartialEq)]
pub struct RowEntry {
    pub row: PaperRow,
    pub detail: DetailRow,
    /// Marker applied to both the row and its detail row
    pub hidden: bool,
}

impl RowEntry {
    pub fn new(row: PaperRow, detail: DetailRow) -> Self {
        RowEntry {
            row,
            detail,
            hidden: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.row.id
    }
}

/// Ordered collection of row entries with lookup by id
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    entries: Vec<RowEntry>,
    /// id -> position in `entries`
    index: HashMap<String, usize>,
    /// Incremented every time the rows are replaced
    generation: u64,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from rows without detail content
    pub fn from_rows(rows: Vec<PaperRow>) -> Result<Self> {
        let mut store = RowStore::new();
        for row in rows {
            store.append(row)?;
        }
        Ok(store)
    }

    /// Build a store from pre-paired entries (e.g. parsed row markup)
    pub fn from_entries(entries: Vec<RowEntry>) -> Result<Self> {
        let mut store = RowStore::new();
        for entry in entries {
            store.push_entry(entry)?;
        }
        Ok(store)
    }

    /// Parse a JSON array of rows
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<PaperRow> = serde_json::from_str(json)?;
        Self::from_rows(rows)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn append(&mut self, row: PaperRow) -> Result<()> {
        self.push_entry(RowEntry::new(row, DetailRow::default()))
    }

    fn push_entry(&mut self, entry: RowEntry) -> Result<()> {
        if self.index.contains_key(entry.id()) {
            return Err(Error::DuplicateRow(entry.id().to_string()));
        }
        self.index.insert(entry.id().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Replace every row at once. On error the current rows are kept.
    pub fn replace(&mut self, entries: Vec<RowEntry>) -> Result<()> {
        let fresh = RowStore::from_entries(entries)?;
        self.entries = fresh.entries;
        self.index = fresh.index;
        self.generation += 1;
        Ok(())
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&RowEntry> {
        self.position(id).map(|pos| &self.entries[pos])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut RowEntry> {
        match self.position(id) {
            Some(pos) => Some(&mut self.entries[pos]),
            None => None,
        }
    }

    pub fn entries(&self) -> &[RowEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RowEntry> {
        self.entries.iter_mut()
    }

    /// Visible entries in storage order
    pub fn visible(&self) -> impl Iterator<Item = &RowEntry> {
        self.entries.iter().filter(|e| !e.hidden)
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    /// Reorder storage so the visible rows follow `order`.
    ///
    /// Hidden rows keep their relative order and are placed before the
    /// visible ones. Ids in `order` that are unknown or hidden are ignored,
    /// and visible rows missing from `order` keep their relative order after
    /// the ordered ones.
    pub fn reorder_visible(&mut self, order: &[String]) {
        let mut slots: Vec<Option<RowEntry>> = self.entries.drain(..).map(Some).collect();
        let mut reordered = Vec::with_capacity(slots.len());

        for slot in slots.iter_mut() {
            if slot.as_ref().map(|e| e.hidden).unwrap_or(false) {
                reordered.extend(slot.take());
            }
        }

        let mut seen = HashSet::new();
        for id in order {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let Some(&pos) = self.index.get(id) {
                if slots[pos].as_ref().map(|e| !e.hidden).unwrap_or(false) {
                    reordered.extend(slots[pos].take());
                }
            }
        }

        reordered.extend(slots.into_iter().flatten());

        self.entries = reordered;
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, entry) in self.entries.iter().enumerate() {
            self.index.insert(entry.id().to_string(), pos);
        }
    }
}
