//! Shading pass over the visible, ordered rows.
//!
//! Alternating shade is assigned by parity of the position among visible
//! rows only, so hiding one row flips the shade of every visible row after
//! it. Journal cells shared by two or more visible rows get a blue whose
//! lightness darkens with the journal's frequency; duplicated titles get a
//! single flat red.

use crate::record::PaperRow;
use crate::store::RowStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Alternating row shade, shared by a row and its detail row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shade {
    A,
    B,
}

impl Shade {
    pub fn for_position(visible_index: usize) -> Shade {
        if visible_index % 2 == 0 {
            Shade::A
        } else {
            Shade::B
        }
    }

    /// CSS class of the shade
    pub fn class(&self) -> &'static str {
        match self {
            Shade::A => "alt-shade-1",
            Shade::B => "alt-shade-2",
        }
    }
}

/// An HSL background colour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Palette of the duplicate shading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    pub journal_hue: f64,
    pub journal_saturation: f64,
    /// Lightness of the least frequent duplicate journal (lightest)
    pub journal_min_lightness: f64,
    /// Lightness of the most frequent journal (darkest)
    pub journal_max_lightness: f64,
    pub title_hue: f64,
    pub title_saturation: f64,
    pub title_lightness: f64,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        ShadingConfig {
            journal_hue: 210.0,
            journal_saturation: 66.0,
            journal_min_lightness: 96.0,
            journal_max_lightness: 84.0,
            title_hue: 0.0,
            title_saturation: 66.0,
            title_lightness: 94.0,
        }
    }
}

impl ShadingConfig {
    /// Background of a journal seen `count` times when the most frequent
    /// journal is seen `max_count` times. None below two occurrences.
    pub fn journal_color(&self, count: usize, max_count: usize) -> Option<Hsl> {
        if count < 2 {
            return None;
        }
        let lightness = if max_count <= 1 {
            self.journal_min_lightness
        } else {
            let rank = 1.0 - (count as f64 - 1.0) / (max_count as f64 - 1.0);
            let raw = self.journal_max_lightness
                + (self.journal_min_lightness - self.journal_max_lightness) * rank;
            let (low, high) = ordered(self.journal_max_lightness, self.journal_min_lightness);
            raw.max(low).min(high)
        };
        Some(Hsl {
            hue: self.journal_hue,
            saturation: self.journal_saturation,
            lightness,
        })
    }

    pub fn title_color(&self) -> Hsl {
        Hsl {
            hue: self.title_hue,
            saturation: self.title_saturation,
            lightness: self.title_lightness,
        }
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Shading of one visible row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowShading {
    pub shade: Shade,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<Hsl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Hsl>,
}

/// Result of a shading pass; hidden rows have no entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadingPlan {
    rows: BTreeMap<String, RowShading>,
    /// Distinct non-empty titles seen at least twice
    pub duplicate_titles: usize,
}

impl ShadingPlan {
    pub fn get(&self, id: &str) -> Option<&RowShading> {
        self.rows.get(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowShading)> {
        self.rows.iter().map(|(id, shading)| (id.as_str(), shading))
    }
}

fn frequencies<'a, I>(values: I) -> HashMap<&'a str, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Number of distinct non-empty titles appearing at least twice
pub fn duplicate_title_count<'a, I>(titles: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    frequencies(titles.into_iter().map(str::trim))
        .into_iter()
        .filter(|(title, count)| !title.is_empty() && *count >= 2)
        .count()
}

/// Shade rows given in visible display order
pub fn shade<'a, I>(visible: I, config: &ShadingConfig) -> ShadingPlan
where
    I: IntoIterator<Item = &'a PaperRow>,
{
    let rows: Vec<&PaperRow> = visible.into_iter().collect();

    let journals = frequencies(rows.iter().map(|r| r.journal.trim()));
    let titles = frequencies(rows.iter().map(|r| r.title.trim()));
    let max_journal = journals.values().copied().max().unwrap_or(0);

    let mut plan = ShadingPlan {
        rows: BTreeMap::new(),
        duplicate_titles: duplicate_title_count(rows.iter().map(|r| r.title.as_str())),
    };

    for (index, row) in rows.iter().enumerate() {
        let journal = row.journal.trim();
        let title = row.title.trim();

        let journal_color = if journal.is_empty() {
            None
        } else {
            config.journal_color(journals.get(journal).copied().unwrap_or(0), max_journal)
        };
        let title_color = if !title.is_empty() && titles.get(title).copied().unwrap_or(0) >= 2 {
            Some(config.title_color())
        } else {
            None
        };

        plan.rows.insert(
            row.id.clone(),
            RowShading {
                shade: Shade::for_position(index),
                journal: journal_color,
                title: title_color,
            },
        );
    }

    plan
}

/// Shade the visible rows of a store in storage order
pub fn shade_store(store: &RowStore, config: &ShadingConfig) -> ShadingPlan {
    shade(store.visible().map(|e| &e.row), config)
}
