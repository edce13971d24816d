use serde::Serialize;

use crate::document::{CompositeCell, DocumentQuery, HtmlDocument};
use crate::zwiftpower::{CATEGORY_LABEL, CATEGORY_SPAN_PREFIX, FTP_LABEL, RACING_SCORE_LABEL};

pub const NOT_FOUND: &str = "Not found";
pub const NO_CATEGORY: &str = "No category found";
pub const PROFILE_NOT_FOUND: &str = "Profile not found";
pub const NO_RACES: &str = "0";

/// Marker text rendered next to the race count.
const INFO_MARKER: &str = "Info";

/// One output row's worth of rider stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiderRecord {
    pub identifier: String,
    pub category: String,
    pub race_count: String,
    pub threshold_power: String,
    pub racing_score: String,
}

impl RiderRecord {
    /// Record for a rider whose profile page could not be fetched.
    pub fn profile_not_found(identifier: &str) -> Self {
        RiderRecord {
            identifier: identifier.to_string(),
            category: PROFILE_NOT_FOUND.to_string(),
            race_count: PROFILE_NOT_FOUND.to_string(),
            threshold_power: PROFILE_NOT_FOUND.to_string(),
            racing_score: PROFILE_NOT_FOUND.to_string(),
        }
    }

    /// Values in output column order: Category, Races, zFTP, ZwiftRacingScore.
    pub fn values(&self) -> [&str; 4] {
        [
            self.category.as_str(),
            self.race_count.as_str(),
            self.threshold_power.as_str(),
            self.racing_score.as_str(),
        ]
    }
}

/// Pulls the tracked fields out of a profile page. Never fails; gaps become sentinels.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileExtractor;

impl ProfileExtractor {
    pub fn new() -> Self {
        ProfileExtractor
    }

    pub fn extract(&self, identifier: &str, html: &str) -> RiderRecord {
        let document = HtmlDocument::parse(html);
        self.extract_from(identifier, &document)
    }

    pub fn extract_from<D: DocumentQuery + ?Sized>(&self, identifier: &str, doc: &D) -> RiderRecord {
        let (category, race_count) = match doc.find_composite_cell(CATEGORY_LABEL, CATEGORY_SPAN_PREFIX) {
            Some(cell) => split_category_and_races(&cell),
            None => (NO_CATEGORY.to_string(), NO_RACES.to_string()),
        };

        RiderRecord {
            identifier: identifier.to_string(),
            category,
            race_count,
            threshold_power: labeled_or_sentinel(doc, FTP_LABEL),
            racing_score: labeled_or_sentinel(doc, RACING_SCORE_LABEL),
        }
    }
}

fn labeled_or_sentinel<D: DocumentQuery + ?Sized>(doc: &D, label: &str) -> String {
    doc.find_labeled_value(label)
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

/// Category comes from the span; the race count is the first token of what is
/// left once the category and the info marker are removed, if it is all digits.
pub fn split_category_and_races(cell: &CompositeCell) -> (String, String) {
    let category = cell
        .span_text
        .clone()
        .unwrap_or_else(|| NO_CATEGORY.to_string());

    let mut remainder = cell.cell_text.clone();
    if !category.is_empty() {
        remainder = remainder.replace(&category, "");
    }
    let remainder = remainder.replace(INFO_MARKER, "");

    let races = remainder
        .split_whitespace()
        .next()
        .filter(|token| token.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(NO_RACES)
        .to_string();

    (category, races)
}
