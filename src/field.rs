/// PaperTable Field Vocabulary
///
/// Every classification attribute a paper row carries is drawn from the closed
/// vocabulary defined here (`COUNT_FIELDS`). Most fields are tri-state marks
/// (yes / no / unknown); `changed_by` and `verified_by` are provenance fields
/// (user / computer / unknown) that share the same counting mechanism.
///
/// # Examples
///
/// ```
/// use papertable::{Field, FieldKind, Mark};
///
/// let field = Field::from_name("technique_dl_cnn_classifier").unwrap();
/// assert_eq!(field.kind(), FieldKind::Mark);
/// assert_eq!(field.label(), "CNN Classifier");
/// assert!(Field::from_name("features_lasers").is_none());
///
/// assert_eq!(Mark::parse("✔️"), Mark::Yes);
/// assert_eq!(Mark::parse("garbage"), Mark::Unknown);
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a field's value is matched when counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Tri-state field, counted when "yes"
    Mark,
    /// Ownership field, counted when "user"
    Provenance,
}

/// Closed vocabulary of classification fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    IsOfftopic,
    IsSurvey,
    IsThroughHole,
    IsSmt,
    IsXRay,
    FeaturesTracks,
    FeaturesHoles,
    FeaturesBarePcbOther,
    FeaturesSolderInsufficient,
    FeaturesSolderExcess,
    FeaturesSolderVoid,
    FeaturesSolderCrack,
    FeaturesSolderOther,
    FeaturesOrientation,
    FeaturesMissingComponent,
    FeaturesWrongComponent,
    FeaturesComponentOther,
    FeaturesCosmetic,
    FeaturesOtherState,
    TechniqueClassicCvBased,
    TechniqueMlTraditional,
    TechniqueDlCnnClassifier,
    TechniqueDlCnnDetector,
    TechniqueDlRcnnDetector,
    TechniqueDlTransformer,
    TechniqueDlOther,
    TechniqueHybrid,
    TechniqueAvailableDataset,
    Verified,
    UserCommentState,
    ChangedBy,
    VerifiedBy,
}

/// Every field the aggregator counts. Defined once; nothing outside this list
/// is countable.
pub const COUNT_FIELDS: [Field; 32] = [
    Field::IsOfftopic,
    Field::IsSurvey,
    Field::IsThroughHole,
    Field::IsSmt,
    Field::IsXRay,
    Field::FeaturesTracks,
    Field::FeaturesHoles,
    Field::FeaturesBarePcbOther,
    Field::FeaturesSolderInsufficient,
    Field::FeaturesSolderExcess,
    Field::FeaturesSolderVoid,
    Field::FeaturesSolderCrack,
    Field::FeaturesSolderOther,
    Field::FeaturesOrientation,
    Field::FeaturesMissingComponent,
    Field::FeaturesWrongComponent,
    Field::FeaturesComponentOther,
    Field::FeaturesCosmetic,
    Field::FeaturesOtherState,
    Field::TechniqueClassicCvBased,
    Field::TechniqueMlTraditional,
    Field::TechniqueDlCnnClassifier,
    Field::TechniqueDlCnnDetector,
    Field::TechniqueDlRcnnDetector,
    Field::TechniqueDlTransformer,
    Field::TechniqueDlOther,
    Field::TechniqueHybrid,
    Field::TechniqueAvailableDataset,
    Field::Verified,
    Field::UserCommentState,
    Field::ChangedBy,
    Field::VerifiedBy,
];

/// Feature fields tracked per year and in the features distribution, in chart order
pub const FEATURE_FIELDS: [Field; 11] = [
    Field::FeaturesTracks,
    Field::FeaturesHoles,
    Field::FeaturesSolderInsufficient,
    Field::FeaturesSolderExcess,
    Field::FeaturesSolderVoid,
    Field::FeaturesSolderCrack,
    Field::FeaturesOrientation,
    Field::FeaturesWrongComponent,
    Field::FeaturesMissingComponent,
    Field::FeaturesCosmetic,
    Field::FeaturesOtherState,
];

/// Technique fields tracked per year (datasets excluded)
pub const TECHNIQUE_FIELDS: [Field; 8] = [
    Field::TechniqueClassicCvBased,
    Field::TechniqueMlTraditional,
    Field::TechniqueDlCnnClassifier,
    Field::TechniqueDlCnnDetector,
    Field::TechniqueDlRcnnDetector,
    Field::TechniqueDlTransformer,
    Field::TechniqueDlOther,
    Field::TechniqueHybrid,
];

/// Bare-board defects
pub const PCB_FEATURES: [Field; 3] = [
    Field::FeaturesTracks,
    Field::FeaturesHoles,
    Field::FeaturesBarePcbOther,
];

pub const SOLDER_FEATURES: [Field; 5] = [
    Field::FeaturesSolderInsufficient,
    Field::FeaturesSolderExcess,
    Field::FeaturesSolderVoid,
    Field::FeaturesSolderCrack,
    Field::FeaturesSolderOther,
];

/// Assembled-board (component placement) defects
pub const PCBA_FEATURES: [Field; 6] = [
    Field::FeaturesOrientation,
    Field::FeaturesMissingComponent,
    Field::FeaturesWrongComponent,
    Field::FeaturesComponentOther,
    Field::FeaturesCosmetic,
    Field::FeaturesOtherState,
];

/// Fields inspected by the "no features" filter
pub const ALL_FEATURES: [Field; 14] = [
    Field::FeaturesTracks,
    Field::FeaturesHoles,
    Field::FeaturesBarePcbOther,
    Field::FeaturesSolderInsufficient,
    Field::FeaturesSolderExcess,
    Field::FeaturesSolderVoid,
    Field::FeaturesSolderCrack,
    Field::FeaturesSolderOther,
    Field::FeaturesMissingComponent,
    Field::FeaturesWrongComponent,
    Field::FeaturesComponentOther,
    Field::FeaturesOrientation,
    Field::FeaturesCosmetic,
    Field::FeaturesOtherState,
];

impl Field {
    /// Wire/markup name of the field (the `data-field` attribute)
    pub fn name(&self) -> &'static str {
        match self {
            Field::IsOfftopic => "is_offtopic",
            Field::IsSurvey => "is_survey",
            Field::IsThroughHole => "is_through_hole",
            Field::IsSmt => "is_smt",
            Field::IsXRay => "is_x_ray",
            Field::FeaturesTracks => "features_tracks",
            Field::FeaturesHoles => "features_holes",
            Field::FeaturesBarePcbOther => "features_bare_pcb_other",
            Field::FeaturesSolderInsufficient => "features_solder_insufficient",
            Field::FeaturesSolderExcess => "features_solder_excess",
            Field::FeaturesSolderVoid => "features_solder_void",
            Field::FeaturesSolderCrack => "features_solder_crack",
            Field::FeaturesSolderOther => "features_solder_other",
            Field::FeaturesOrientation => "features_orientation",
            Field::FeaturesMissingComponent => "features_missing_component",
            Field::FeaturesWrongComponent => "features_wrong_component",
            Field::FeaturesComponentOther => "features_component_other",
            Field::FeaturesCosmetic => "features_cosmetic",
            Field::FeaturesOtherState => "features_other_state",
            Field::TechniqueClassicCvBased => "technique_classic_cv_based",
            Field::TechniqueMlTraditional => "technique_ml_traditional",
            Field::TechniqueDlCnnClassifier => "technique_dl_cnn_classifier",
            Field::TechniqueDlCnnDetector => "technique_dl_cnn_detector",
            Field::TechniqueDlRcnnDetector => "technique_dl_rcnn_detector",
            Field::TechniqueDlTransformer => "technique_dl_transformer",
            Field::TechniqueDlOther => "technique_dl_other",
            Field::TechniqueHybrid => "technique_hybrid",
            Field::TechniqueAvailableDataset => "technique_available_dataset",
            Field::Verified => "verified",
            Field::UserCommentState => "user_comment_state",
            Field::ChangedBy => "changed_by",
            Field::VerifiedBy => "verified_by",
        }
    }

    /// Look a field up by name. Names outside the vocabulary return None.
    pub fn from_name(name: &str) -> Option<Field> {
        COUNT_FIELDS.iter().copied().find(|f| f.name() == name)
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::ChangedBy | Field::VerifiedBy => FieldKind::Provenance,
            _ => FieldKind::Mark,
        }
    }

    /// Human-readable label used by charts and headers
    pub fn label(&self) -> &'static str {
        match self {
            Field::IsOfftopic => "Off-topic",
            Field::IsSurvey => "Survey",
            Field::IsThroughHole => "Through-hole",
            Field::IsSmt => "SMT",
            Field::IsXRay => "X-Ray",
            Field::FeaturesTracks => "Tracks",
            Field::FeaturesHoles => "Holes",
            Field::FeaturesBarePcbOther => "Other Bare PCB",
            Field::FeaturesSolderInsufficient => "Insufficient Solder",
            Field::FeaturesSolderExcess => "Excess Solder",
            Field::FeaturesSolderVoid => "Solder Voids",
            Field::FeaturesSolderCrack => "Solder Cracks",
            Field::FeaturesSolderOther => "Other Solder",
            Field::FeaturesOrientation => "Orientation/Polarity",
            Field::FeaturesMissingComponent => "Missing Component",
            Field::FeaturesWrongComponent => "Wrong Component",
            Field::FeaturesComponentOther => "Other Component",
            Field::FeaturesCosmetic => "Cosmetic",
            Field::FeaturesOtherState => "Other",
            Field::TechniqueClassicCvBased => "Classic CV",
            Field::TechniqueMlTraditional => "Traditional ML",
            Field::TechniqueDlCnnClassifier => "CNN Classifier",
            Field::TechniqueDlCnnDetector => "CNN Detector",
            Field::TechniqueDlRcnnDetector => "R-CNN Detector",
            Field::TechniqueDlTransformer => "Transformer",
            Field::TechniqueDlOther => "Other DL",
            Field::TechniqueHybrid => "Hybrid",
            Field::TechniqueAvailableDataset => "Datasets",
            Field::Verified => "Verified",
            Field::UserCommentState => "Commented",
            Field::ChangedBy => "Changed By",
            Field::VerifiedBy => "Verified By",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tri-state classification value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Yes,
    No,
    #[default]
    Unknown,
}

impl Mark {
    /// Parse a cell symbol or stored value. Anything unrecognised is Unknown.
    pub fn parse(raw: &str) -> Mark {
        match raw.trim() {
            "✔️" | "✔" | "yes" | "true" | "1" => Mark::Yes,
            "❌" | "no" | "false" | "0" => Mark::No,
            _ => Mark::Unknown,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Mark::Yes => "✔️",
            Mark::No => "❌",
            Mark::Unknown => "❔",
        }
    }

    /// Ordinal used by the sort engine: yes > no > unknown
    pub fn sort_weight(&self) -> u8 {
        match self {
            Mark::Yes => 2,
            Mark::No => 1,
            Mark::Unknown => 0,
        }
    }

    /// Next value when a user clicks the cell (❔ → ✔️ → ❌ → ❔)
    pub fn cycle(&self) -> Mark {
        match self {
            Mark::Unknown => Mark::Yes,
            Mark::Yes => Mark::No,
            Mark::No => Mark::Unknown,
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Mark::Yes)
    }
}

/// Who last changed or verified a row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "by", content = "model")]
pub enum Provenance {
    User,
    /// Set by an automated classifier; carries the model name when known
    Computer(String),
    #[default]
    Unknown,
}

impl Provenance {
    /// Parse a stored value or cell symbol. Any other non-empty string is
    /// taken as the name of the model that produced the value.
    pub fn parse(raw: &str) -> Provenance {
        match raw.trim() {
            "user" | "👤" => Provenance::User,
            "" | "unknown" | "❔" => Provenance::Unknown,
            "🖥️" | "🖥" | "computer" => Provenance::Computer(String::new()),
            model => Provenance::Computer(model.to_string()),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Provenance::User => "👤",
            Provenance::Computer(_) => "🖥️",
            Provenance::Unknown => "❔",
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Provenance::User)
    }

    /// Next value when a user clicks the cell. A computer value is taken over
    /// by the user rather than cycled back to computer.
    pub fn cycle(&self) -> Provenance {
        match self {
            Provenance::User => Provenance::Unknown,
            Provenance::Unknown | Provenance::Computer(_) => Provenance::User,
        }
    }
}

/// Availability of the paper's PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfStatus {
    #[default]
    None,
    Present,
    Annotated,
    Paywalled,
}

impl PdfStatus {
    pub fn parse(raw: &str) -> PdfStatus {
        match raw.trim() {
            "📗" | "annotated" => PdfStatus::Annotated,
            "📕" | "PDF" | "pdf" | "present" => PdfStatus::Present,
            "💰" | "paywalled" => PdfStatus::Paywalled,
            _ => PdfStatus::None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            PdfStatus::None => "❔",
            PdfStatus::Present => "📕",
            PdfStatus::Annotated => "📗",
            PdfStatus::Paywalled => "💰",
        }
    }

    /// Ordinal used by the sort engine: annotated > present > none > paywalled
    pub fn sort_weight(&self) -> u8 {
        match self {
            PdfStatus::Annotated => 3,
            PdfStatus::Present => 2,
            PdfStatus::None => 1,
            PdfStatus::Paywalled => 0,
        }
    }

    /// Annotated PDFs are also present
    pub fn has_pdf(&self) -> bool {
        matches!(self, PdfStatus::Present | PdfStatus::Annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_names_round_trip() {
        for field in COUNT_FIELDS {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::from_name("is_offtopic "), None);
        assert_eq!(Field::from_name("features_lasers"), None);
    }

    #[test]
    fn test_vocabulary_has_no_duplicates() {
        let mut names: Vec<&str> = COUNT_FIELDS.iter().map(|f| f.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), COUNT_FIELDS.len());
    }

    #[test]
    fn test_serde_names_match_markup_names() {
        for field in COUNT_FIELDS {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.name()));
        }
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(Field::ChangedBy.kind(), FieldKind::Provenance);
        assert_eq!(Field::VerifiedBy.kind(), FieldKind::Provenance);
        assert_eq!(Field::Verified.kind(), FieldKind::Mark);
        assert_eq!(Field::IsSurvey.kind(), FieldKind::Mark);
    }

    #[test]
    fn test_groups_are_features() {
        for field in PCB_FEATURES.iter().chain(&SOLDER_FEATURES).chain(&PCBA_FEATURES) {
            assert!(ALL_FEATURES.contains(field), "{} missing", field);
        }
        assert!(!TECHNIQUE_FIELDS.contains(&Field::TechniqueAvailableDataset));
    }

    #[test]
    fn test_mark_parse_and_cycle() {
        assert_eq!(Mark::parse(" ✔️ "), Mark::Yes);
        assert_eq!(Mark::parse("false"), Mark::No);
        assert_eq!(Mark::parse(""), Mark::Unknown);
        assert_eq!(Mark::Unknown.cycle(), Mark::Yes);
        assert_eq!(Mark::Yes.cycle(), Mark::No);
        assert_eq!(Mark::No.cycle(), Mark::Unknown);
        assert!(Mark::Yes.sort_weight() > Mark::No.sort_weight());
        assert!(Mark::No.sort_weight() > Mark::Unknown.sort_weight());
    }

    #[test]
    fn test_provenance_parse() {
        assert_eq!(Provenance::parse("user"), Provenance::User);
        assert_eq!(Provenance::parse(""), Provenance::Unknown);
        assert_eq!(
            Provenance::parse("gpt-4o-mini"),
            Provenance::Computer("gpt-4o-mini".to_string())
        );
        assert_eq!(Provenance::Computer("x".to_string()).cycle(), Provenance::User);
        assert_eq!(Provenance::User.cycle(), Provenance::Unknown);
    }

    #[test]
    fn test_pdf_weights() {
        let mut statuses = vec![
            PdfStatus::Paywalled,
            PdfStatus::Annotated,
            PdfStatus::None,
            PdfStatus::Present,
        ];
        statuses.sort_by_key(|s| s.sort_weight());
        assert_eq!(
            statuses,
            vec![PdfStatus::Paywalled, PdfStatus::None, PdfStatus::Present, PdfStatus::Annotated]
        );
        assert!(PdfStatus::Annotated.has_pdf());
        assert!(!PdfStatus::Paywalled.has_pdf());
        assert_eq!(PdfStatus::parse("📗"), PdfStatus::Annotated);
    }
}
