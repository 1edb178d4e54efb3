/// PaperTable Stats Data
///
/// Turns the aggregator's output into chart-ready series and builds the
/// frequency lists of the stats panel. Nothing here reads rendered text: the
/// counts come straight from `AggregateCounts` and `YearlyBreakdown`.
///
/// # Examples
///
/// ```
/// use papertable::{aggregate, chart_stats, Field, Mark, PaperRow};
///
/// let mut row = PaperRow::new("1").with_mark(Field::TechniqueHybrid, Mark::Yes);
/// row.year = "2022".to_string();
///
/// let (counts, yearly) = aggregate([&row]);
/// let charts = chart_stats(&counts, &yearly);
///
/// assert_eq!(charts.techniques.labels[0], "Hybrid");
/// assert_eq!(charts.survey_vs_implementation.years, vec![2022]);
/// ```

use crate::aggregate::{AggregateCounts, YearBucket, YearlyBreakdown};
use crate::field::{Field, FEATURE_FIELDS, TECHNIQUE_FIELDS};
use crate::record::PaperRow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Feature colour groups of the features-per-year chart
pub const FEATURE_COLOR_GROUPS: [(&str, &[Field]); 5] = [
    ("PCB Features", &[Field::FeaturesTracks, Field::FeaturesHoles]),
    (
        "Solder Defects",
        &[
            Field::FeaturesSolderInsufficient,
            Field::FeaturesSolderExcess,
            Field::FeaturesSolderVoid,
            Field::FeaturesSolderCrack,
        ],
    ),
    (
        "PCBA Issues",
        &[
            Field::FeaturesOrientation,
            Field::FeaturesWrongComponent,
            Field::FeaturesMissingComponent,
        ],
    ),
    ("Cosmetic", &[Field::FeaturesCosmetic]),
    ("Other", &[Field::FeaturesOtherState]),
];

/// Labelled values of a pie/bar chart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

/// One line of a per-year chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    /// One value per entry of the chart's `years`
    pub data: Vec<u64>,
}

/// A per-year line chart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyChart {
    /// Ascending
    pub years: Vec<i32>,
    pub series: Vec<Series>,
}

/// Every chart of the stats panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartStats {
    /// Features in fixed chart order
    pub features: Distribution,
    /// Techniques without datasets, largest first
    pub techniques: Distribution,
    pub survey_vs_implementation: YearlyChart,
    pub techniques_per_year: YearlyChart,
    /// Feature counts summed per colour group
    pub features_per_year: YearlyChart,
    pub pub_types_per_year: YearlyChart,
}

pub fn chart_stats(counts: &AggregateCounts, yearly: &YearlyBreakdown) -> ChartStats {
    let features = Distribution {
        labels: FEATURE_FIELDS.iter().map(|f| f.label().to_string()).collect(),
        values: FEATURE_FIELDS.iter().map(|f| counts.get(*f)).collect(),
    };

    // Stable sort keeps the vocabulary order among equal counts
    let mut technique_counts: Vec<(Field, u64)> =
        TECHNIQUE_FIELDS.iter().map(|f| (*f, counts.get(*f))).collect();
    technique_counts.sort_by(|a, b| b.1.cmp(&a.1));
    let techniques = Distribution {
        labels: technique_counts.iter().map(|(f, _)| f.label().to_string()).collect(),
        values: technique_counts.iter().map(|(_, c)| *c).collect(),
    };

    let years: Vec<i32> = yearly.years().collect();
    let chart = |series: Vec<Series>| YearlyChart {
        years: years.clone(),
        series,
    };

    let survey_vs_implementation = chart(vec![
        yearly_series(yearly, "Survey", |b| b.split.survey),
        yearly_series(yearly, "Implementation", |b| b.split.implementation),
    ]);

    let techniques_per_year = chart(
        TECHNIQUE_FIELDS
            .iter()
            .map(|field| {
                yearly_series(yearly, field.label(), |b| {
                    b.techniques.get(field).copied().unwrap_or(0)
                })
            })
            .collect(),
    );

    let features_per_year = chart(
        FEATURE_COLOR_GROUPS
            .iter()
            .map(|(label, fields)| {
                yearly_series(yearly, label, |b| {
                    fields.iter().map(|f| b.features.get(f).copied().unwrap_or(0)).sum()
                })
            })
            .collect(),
    );

    let pub_types_per_year = chart(
        yearly
            .pub_types()
            .iter()
            .map(|pub_type| {
                yearly_series(yearly, pub_type, |b| {
                    b.pub_types.get(pub_type).copied().unwrap_or(0)
                })
            })
            .collect(),
    );

    ChartStats {
        features,
        techniques,
        survey_vs_implementation,
        techniques_per_year,
        features_per_year,
        pub_types_per_year,
    }
}

/// One value per year of the breakdown, in ascending year order
fn yearly_series<F>(yearly: &YearlyBreakdown, label: &str, read: F) -> Series
where
    F: Fn(&YearBucket) -> u64,
{
    Series {
        label: label.to_string(),
        data: yearly.buckets().map(|(_, bucket)| read(bucket)).collect(),
    }
}

/// A name and how many visible rows carry it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: u64,
}

/// Frequency lists of the stats panel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListStats {
    /// Repeated entries only (count > 1)
    pub journals: Vec<NameCount>,
    pub keywords: Vec<NameCount>,
    pub authors: Vec<NameCount>,
    pub research_areas: Vec<NameCount>,
    /// Every non-empty entry
    pub other_features: Vec<NameCount>,
    pub model_names: Vec<NameCount>,
}

#[derive(Default)]
struct Counter<'a> {
    counts: HashMap<&'a str, u64>,
}

impl<'a> Counter<'a> {
    fn add(&mut self, value: &'a str) {
        let value = value.trim();
        if !value.is_empty() {
            *self.counts.entry(value).or_insert(0) += 1;
        }
    }

    fn add_split(&mut self, values: &'a str) {
        for value in values.split(';') {
            self.add(value);
        }
    }

    /// Sorted by count descending, then name ascending
    fn into_list(self, min_count: u64) -> Vec<NameCount> {
        let mut list: Vec<NameCount> = self
            .counts
            .into_iter()
            .filter(|(_, count)| *count >= min_count)
            .map(|(name, count)| NameCount {
                name: name.to_string(),
                count,
            })
            .collect();
        list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        list
    }
}

/// Build the frequency lists over the given (visible) rows
pub fn list_stats<'a, I>(rows: I) -> ListStats
where
    I: IntoIterator<Item = &'a PaperRow>,
{
    let mut journals = Counter::default();
    let mut keywords = Counter::default();
    let mut authors = Counter::default();
    let mut research_areas = Counter::default();
    let mut other_features = Counter::default();
    let mut model_names = Counter::default();

    for row in rows {
        journals.add(&row.journal);
        keywords.add_split(&row.keywords);
        authors.add_split(&row.authors);
        research_areas.add(&row.research_area);
        other_features.add_split(&row.features_other);
        model_names.add_split(&row.model);
    }

    ListStats {
        journals: journals.into_list(2),
        keywords: keywords.into_list(2),
        authors: authors.into_list(2),
        research_areas: research_areas.into_list(2),
        other_features: other_features.into_list(1),
        model_names: model_names.into_list(1),
    }
}

/// Charts and lists together, as published by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub charts: ChartStats,
    pub lists: ListStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::field::Mark;

    fn paper(id: &str, year: &str) -> PaperRow {
        let mut row = PaperRow::new(id);
        row.year = year.to_string();
        row
    }

    #[test]
    fn test_features_distribution_keeps_chart_order() {
        let row = paper("1", "2020").with_mark(Field::FeaturesCosmetic, Mark::Yes);
        let (counts, yearly) = aggregate([&row]);
        let charts = chart_stats(&counts, &yearly);

        assert_eq!(charts.features.labels.len(), 11);
        assert_eq!(charts.features.labels[0], "Tracks");
        assert_eq!(charts.features.labels[9], "Cosmetic");
        assert_eq!(charts.features.values[9], 1);
    }

    #[test]
    fn test_techniques_sorted_by_count() {
        let a = paper("a", "2020")
            .with_mark(Field::TechniqueHybrid, Mark::Yes)
            .with_mark(Field::TechniqueDlOther, Mark::Yes)
            .with_mark(Field::TechniqueAvailableDataset, Mark::Yes);
        let b = paper("b", "2021").with_mark(Field::TechniqueHybrid, Mark::Yes);
        let (counts, yearly) = aggregate([&a, &b]);
        let charts = chart_stats(&counts, &yearly);

        assert_eq!(charts.techniques.labels.len(), 8, "datasets excluded");
        assert_eq!(charts.techniques.labels[0], "Hybrid");
        assert_eq!(charts.techniques.labels[1], "Other DL");
        assert_eq!(charts.techniques.values[..2], [2, 1]);
        // ties keep vocabulary order
        assert_eq!(charts.techniques.labels[2], "Classic CV");
    }

    #[test]
    fn test_yearly_charts() {
        let mut a = paper("a", "2021")
            .with_mark(Field::IsSurvey, Mark::Yes)
            .with_mark(Field::FeaturesSolderVoid, Mark::Yes)
            .with_mark(Field::FeaturesSolderCrack, Mark::Yes);
        a.pub_type = "article".to_string();
        let mut b = paper("b", "2019");
        b.pub_type = "inproceedings".to_string();
        let (counts, yearly) = aggregate([&a, &b]);
        let charts = chart_stats(&counts, &yearly);

        let survey = &charts.survey_vs_implementation;
        assert_eq!(survey.years, vec![2019, 2021]);
        assert_eq!(survey.series[0].data, vec![0, 1]);
        assert_eq!(survey.series[1].data, vec![1, 0]);

        let solder = charts
            .features_per_year
            .series
            .iter()
            .find(|s| s.label == "Solder Defects")
            .unwrap();
        assert_eq!(solder.data, vec![0, 2]);
        assert_eq!(charts.features_per_year.series.len(), 5);
        assert_eq!(charts.techniques_per_year.series.len(), 8);

        let labels: Vec<&str> = charts
            .pub_types_per_year
            .series
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["article", "inproceedings"]);
        assert_eq!(charts.pub_types_per_year.series[0].data, vec![0, 1]);
    }

    #[test]
    fn test_list_stats() {
        let mut a = PaperRow::new("a");
        a.journal = "IEEE Access".to_string();
        a.authors = "Li, X.; Chen, Y.".to_string();
        a.keywords = "AOI; deep learning".to_string();
        a.features_other = "scratches".to_string();
        a.model = "YOLOv5; ResNet".to_string();
        let mut b = PaperRow::new("b");
        b.journal = "IEEE Access".to_string();
        b.authors = "Chen, Y.".to_string();
        b.keywords = "AOI;".to_string();
        b.model = "YOLOv5".to_string();
        let mut c = PaperRow::new("c");
        c.journal = "Sensors".to_string();
        c.research_area = "Engineering".to_string();

        let lists = list_stats([&a, &b, &c]);
        assert_eq!(
            lists.journals,
            vec![NameCount {
                name: "IEEE Access".to_string(),
                count: 2
            }]
        );
        assert_eq!(lists.authors.len(), 1);
        assert_eq!(lists.authors[0].name, "Chen, Y.");
        assert_eq!(lists.keywords[0].name, "AOI");
        assert!(lists.research_areas.is_empty());
        assert_eq!(lists.other_features.len(), 1);

        let models: Vec<(&str, u64)> = lists
            .model_names
            .iter()
            .map(|n| (n.name.as_str(), n.count))
            .collect();
        assert_eq!(models, vec![("YOLOv5", 2), ("ResNet", 1)]);
    }
}
