//! Statistical type detection per column.
//!
//! Every column is scored against a fixed catalog of semantic types. Each
//! tester that matches a sampled value contributes its weight to that type's
//! running score; header substrings boost selected types; scores are
//! normalized to sum to 1.0 and the column resolves to the argmax, ties
//! broken by catalog declaration order.
//!
//! Testers run in a fixed precedence: pure-regex numeric testers first, then
//! token and geographic lookups, with a datetime/date parse attempted only
//! for values nothing else matched. A value that matches no tester counts
//! toward `String` (or `Text` when long), so mixed columns degrade to the
//! free-form types instead of whatever matched last.

use std::{collections::BTreeMap, str::FromStr, sync::LazyLock};

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::{
    config::EngineConfig,
    dataset::{Column, Dataset, is_empty_marker},
    geo,
};

/// The semantic type catalog. Declaration order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldType {
    Integer,
    Decimal,
    String,
    Boolean,
    Datetime,
    Date,
    Year,
    Month,
    Day,
    Latitude,
    Longitude,
    City,
    CountryCode2,
    CountryCode3,
    CountryName,
    ContinentName,
    Url,
    Text,
}

pub const CATALOG: &[FieldType] = &[
    FieldType::Integer,
    FieldType::Decimal,
    FieldType::String,
    FieldType::Boolean,
    FieldType::Datetime,
    FieldType::Date,
    FieldType::Year,
    FieldType::Month,
    FieldType::Day,
    FieldType::Latitude,
    FieldType::Longitude,
    FieldType::City,
    FieldType::CountryCode2,
    FieldType::CountryCode3,
    FieldType::CountryName,
    FieldType::ContinentName,
    FieldType::Url,
    FieldType::Text,
];

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Datetime => "datetime",
            FieldType::Date => "date",
            FieldType::Year => "year",
            FieldType::Month => "month",
            FieldType::Day => "day",
            FieldType::Latitude => "latitude",
            FieldType::Longitude => "longitude",
            FieldType::City => "city",
            FieldType::CountryCode2 => "country_code_2",
            FieldType::CountryCode3 => "country_code_3",
            FieldType::CountryName => "country_name",
            FieldType::ContinentName => "continent_name",
            FieldType::Url => "url",
            FieldType::Text => "text",
        }
    }

    /// Coarse bucket used by the enumerator. Datetime-like types land in the
    /// quantitative bucket so they can feed aggregation; see DESIGN.md for
    /// why `Temporal` exists but is not produced by this mapping.
    pub fn general_type(&self) -> GeneralType {
        match self {
            FieldType::Integer
            | FieldType::Decimal
            | FieldType::Datetime
            | FieldType::Date
            | FieldType::Year
            | FieldType::Month
            | FieldType::Day
            | FieldType::Latitude
            | FieldType::Longitude => GeneralType::Quantitative,
            FieldType::String
            | FieldType::Boolean
            | FieldType::City
            | FieldType::CountryCode2
            | FieldType::CountryCode3
            | FieldType::CountryName
            | FieldType::ContinentName
            | FieldType::Url
            | FieldType::Text => GeneralType::Categorical,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeneralType {
    Quantitative,
    Categorical,
    Temporal,
}

impl GeneralType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneralType::Quantitative => "q",
            GeneralType::Categorical => "c",
            GeneralType::Temporal => "t",
        }
    }
}

impl std::fmt::Display for GeneralType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for GeneralType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One entry of the data-driven tester table.
struct TypeTester {
    field_type: FieldType,
    weight: f64,
    matches: fn(&str) -> bool,
}

/// Evaluation precedence: numeric regexes, token lookups, geographic
/// lookups, URL. Datetime/date run separately as a parse fallback.
const TESTERS: &[TypeTester] = &[
    TypeTester {
        field_type: FieldType::Integer,
        weight: 1.0,
        matches: is_integer_token,
    },
    TypeTester {
        field_type: FieldType::Decimal,
        weight: 1.0,
        matches: is_decimal_token,
    },
    TypeTester {
        field_type: FieldType::Year,
        weight: 1.0,
        matches: is_year_token,
    },
    TypeTester {
        field_type: FieldType::Latitude,
        weight: 1.0,
        matches: is_latitude_token,
    },
    TypeTester {
        field_type: FieldType::Longitude,
        weight: 1.0,
        matches: is_longitude_token,
    },
    TypeTester {
        field_type: FieldType::Boolean,
        weight: 1.0,
        matches: is_boolean_token,
    },
    TypeTester {
        field_type: FieldType::Month,
        weight: 1.0,
        matches: is_month_token,
    },
    TypeTester {
        field_type: FieldType::Day,
        weight: 1.0,
        matches: is_day_token,
    },
    TypeTester {
        field_type: FieldType::CountryCode2,
        weight: 1.0,
        matches: is_country_code_2_token,
    },
    TypeTester {
        field_type: FieldType::CountryCode3,
        weight: 1.0,
        matches: is_country_code_3_token,
    },
    TypeTester {
        field_type: FieldType::CountryName,
        weight: 1.0,
        matches: geo::is_country_name,
    },
    TypeTester {
        field_type: FieldType::ContinentName,
        weight: 1.0,
        matches: geo::is_continent_name,
    },
    TypeTester {
        field_type: FieldType::City,
        weight: 1.0,
        matches: geo::is_city_name,
    },
    TypeTester {
        field_type: FieldType::Url,
        weight: 1.0,
        matches: is_url_token,
    },
];

/// Header substrings that boost a type's score when it already has value
/// evidence. The boost never invents a type from the header alone.
const HEADER_BOOSTS: &[(&str, FieldType)] = &[
    ("year", FieldType::Year),
    ("month", FieldType::Month),
    ("day", FieldType::Day),
    ("date", FieldType::Date),
    ("time", FieldType::Datetime),
    ("lat", FieldType::Latitude),
    ("lon", FieldType::Longitude),
    ("lng", FieldType::Longitude),
    ("country", FieldType::CountryName),
    ("city", FieldType::City),
    ("url", FieldType::Url),
    ("link", FieldType::Url),
];

const HEADER_BOOST_FACTOR: f64 = 2.0;
const FALLBACK_WEIGHT: f64 = 1.0;
const TEXT_LENGTH_THRESHOLD: usize = 100;

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+|\d{1,3}(,\d{3})+)$").expect("integer regex"));
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+|\d{1,3}(,\d{3})+)\.\d+$").expect("decimal regex"));
static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(1[0-9]{3}|20[0-9]{2})$").expect("year regex"));
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://|www\.)[^\s]+$").expect("url regex")
});

fn is_integer_token(value: &str) -> bool {
    INTEGER_RE.is_match(value)
}

fn is_decimal_token(value: &str) -> bool {
    DECIMAL_RE.is_match(value) && Decimal::from_str(&value.replace(',', "")).is_ok()
}

fn is_year_token(value: &str) -> bool {
    YEAR_RE.is_match(value)
}

fn coordinate_value(value: &str) -> Option<f64> {
    if !value.contains('.') {
        return None;
    }
    value.parse::<f64>().ok()
}

fn is_latitude_token(value: &str) -> bool {
    coordinate_value(value).is_some_and(|v| (-90.0..=90.0).contains(&v))
}

fn is_longitude_token(value: &str) -> bool {
    coordinate_value(value).is_some_and(|v| (-180.0..=180.0).contains(&v))
}

fn is_boolean_token(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "false" | "t" | "f" | "yes" | "no" | "y" | "n"
    )
}

const MONTH_TOKENS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec",
];

const DAY_TOKENS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "mon", "tue",
    "tues", "wed", "thu", "thur", "thurs", "fri", "sat", "sun",
];

fn is_month_token(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    MONTH_TOKENS.contains(&lowered.as_str())
}

fn is_day_token(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    DAY_TOKENS.contains(&lowered.as_str())
}

fn is_country_code_2_token(value: &str) -> bool {
    geo::is_country_code_2(value)
}

fn is_country_code_3_token(value: &str) -> bool {
    geo::is_country_code_3(value)
}

fn is_url_token(value: &str) -> bool {
    URL_RE.is_match(value)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

pub fn parse_date_token(value: &str) -> Option<chrono::NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| chrono::NaiveDate::parse_from_str(value, fmt).ok())
}

pub fn parse_datetime_token(value: &str) -> Option<chrono::NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Resolved classification for one column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnClassification {
    pub field_type: FieldType,
    pub general_type: GeneralType,
    /// Normalized confidence of the winning type.
    pub score: f64,
    /// Normalized score per type; sums to 1.0 when any value was sampled.
    pub type_scores: BTreeMap<FieldType, f64>,
}

pub fn classify_columns(dataset: &Dataset, config: &EngineConfig) -> Vec<ColumnClassification> {
    dataset
        .columns()
        .iter()
        .map(|column| classify_column(column, config.type_sample_size))
        .collect()
}

/// Scores one column over the first `sample_size` non-empty values in row
/// order. An entirely empty column resolves to `String` at zero confidence.
pub fn classify_column(column: &Column, sample_size: usize) -> ColumnClassification {
    let mut raw: BTreeMap<FieldType, f64> = BTreeMap::new();
    let mut sampled = 0usize;

    for value in column.non_empty() {
        if sample_size > 0 && sampled >= sample_size {
            break;
        }
        let trimmed = value.trim();
        if trimmed.is_empty() || is_empty_marker(trimmed) {
            continue;
        }
        sampled += 1;

        let mut matched = false;
        for tester in TESTERS {
            if (tester.matches)(trimmed) {
                *raw.entry(tester.field_type).or_insert(0.0) += tester.weight;
                matched = true;
            }
        }
        if matched {
            continue;
        }

        // Datetime parse fallback, only reached when no tester claimed the
        // value; chrono parsing is the most expensive check in the chain.
        if parse_datetime_token(trimmed).is_some() {
            *raw.entry(FieldType::Datetime).or_insert(0.0) += FALLBACK_WEIGHT;
        } else if parse_date_token(trimmed).is_some() {
            *raw.entry(FieldType::Date).or_insert(0.0) += FALLBACK_WEIGHT;
        } else if trimmed.len() >= TEXT_LENGTH_THRESHOLD {
            *raw.entry(FieldType::Text).or_insert(0.0) += FALLBACK_WEIGHT;
        } else {
            *raw.entry(FieldType::String).or_insert(0.0) += FALLBACK_WEIGHT;
        }
    }

    if sampled == 0 {
        return ColumnClassification {
            field_type: FieldType::String,
            general_type: FieldType::String.general_type(),
            score: 0.0,
            type_scores: BTreeMap::new(),
        };
    }

    apply_header_boosts(&column.name, &mut raw);

    let total: f64 = raw.values().sum();
    let mut type_scores = raw;
    if total > 0.0 {
        for score in type_scores.values_mut() {
            *score /= total;
        }
    }

    let field_type = resolve_type(&type_scores);
    let score = type_scores.get(&field_type).copied().unwrap_or(0.0);
    ColumnClassification {
        field_type,
        general_type: field_type.general_type(),
        score,
        type_scores,
    }
}

fn apply_header_boosts(header: &str, raw: &mut BTreeMap<FieldType, f64>) {
    let lowered = header.to_ascii_lowercase();
    for (needle, field_type) in HEADER_BOOSTS {
        if lowered.contains(needle)
            && let Some(score) = raw.get_mut(field_type)
            && *score > 0.0
        {
            *score *= HEADER_BOOST_FACTOR;
        }
    }
}

/// Argmax over normalized scores, ties broken by catalog declaration order.
fn resolve_type(scores: &BTreeMap<FieldType, f64>) -> FieldType {
    let mut best = FieldType::String;
    let mut best_score = f64::NEG_INFINITY;
    for field_type in CATALOG {
        if let Some(score) = scores.get(field_type)
            && *score > best_score
        {
            best = *field_type;
            best_score = *score;
        }
    }
    if best_score <= 0.0 { FieldType::String } else { best }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::normalize_cell;

    fn column(name: &str, values: &[&str]) -> Column {
        Column::new(name, values.iter().map(|v| normalize_cell(v)).collect())
    }

    fn classify(name: &str, values: &[&str]) -> ColumnClassification {
        classify_column(&column(name, values), 100)
    }

    #[test]
    fn integer_column_scores_one() {
        let result = classify("count", &["1", "42", "-7", "1,000"]);
        assert_eq!(result.field_type, FieldType::Integer);
        assert!((result.score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn type_scores_sum_to_one() {
        let result = classify("mixed", &["1", "apple", "2.5", "banana"]);
        let sum: f64 = result.type_scores.values().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
    }

    #[test]
    fn empty_column_defaults_to_string_with_zero_confidence() {
        let result = classify("blank", &["", "  ", "NA"]);
        assert_eq!(result.field_type, FieldType::String);
        assert_eq!(result.score, 0.0);
        assert!(result.type_scores.is_empty());
    }

    #[test]
    fn year_header_boost_beats_integer_tie() {
        let values = ["2001", "2005", "2010", "1999"];
        let plain = classify("code", &values);
        assert_eq!(plain.field_type, FieldType::Integer);

        let boosted = classify("fiscal_year", &values);
        assert_eq!(boosted.field_type, FieldType::Year);
    }

    #[test]
    fn country_codes_resolve_before_string() {
        let result = classify("origin", &["US", "CA", "MX", "BR"]);
        assert_eq!(result.field_type, FieldType::CountryCode2);
    }

    #[test]
    fn month_names_resolve_to_month() {
        let result = classify("m", &["January", "feb", "March"]);
        assert_eq!(result.field_type, FieldType::Month);
        assert_eq!(result.general_type, GeneralType::Quantitative);
    }

    #[test]
    fn dates_use_the_parse_fallback() {
        let result = classify("when", &["2024-01-02", "2024-02-03"]);
        assert_eq!(result.field_type, FieldType::Date);
    }

    #[test]
    fn long_values_resolve_to_text() {
        let long = "a".repeat(120);
        let result = classify("notes", &[long.as_str(), long.as_str()]);
        assert_eq!(result.field_type, FieldType::Text);
    }

    #[test]
    fn ties_break_by_catalog_order() {
        // Every value matches integer and year equally with no header boost;
        // integer is declared first in the catalog.
        let result = classify("v", &["2001", "2002"]);
        assert_eq!(result.field_type, FieldType::Integer);
    }
}
