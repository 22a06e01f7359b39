// src/matching/state_codes.rs
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static STATE_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,3}$").expect("state code pattern is valid"));

const STATE_NAMES: [(&str, &str); 69] = [
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
    ("district of columbia", "DC"),
    ("washington dc", "DC"),
    ("puerto rico", "PR"),
    ("guam", "GU"),
    ("us virgin islands", "VI"),
    ("american samoa", "AS"),
    ("northern mariana islands", "MP"),
    ("alberta", "AB"),
    ("british columbia", "BC"),
    ("manitoba", "MB"),
    ("new brunswick", "NB"),
    ("newfoundland and labrador", "NL"),
    ("nova scotia", "NS"),
    ("ontario", "ON"),
    ("prince edward island", "PE"),
    ("quebec", "QC"),
    ("saskatchewan", "SK"),
    ("northwest territories", "NT"),
    ("yukon", "YT"),
];

static STATE_CODES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| STATE_NAMES.iter().copied().collect());

/// Maps a full region name to its postal code. Unknown values are trimmed and
/// upper-cased, so values that are already codes pass through.
pub fn normalize_state(raw: &str) -> String {
    let key = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('.', "")
        .to_lowercase();
    match STATE_CODES.get(key.as_str()) {
        Some(code) => code.to_string(),
        None => raw.trim().to_uppercase(),
    }
}

/// True when every non-empty value is already an upper-case short code and
/// at least one value is present.
pub fn uses_state_codes<'a>(values: impl IntoIterator<Item = &'a str>) -> bool {
    let mut seen_any = false;
    for value in values.into_iter().map(str::trim).filter(|v| !v.is_empty()) {
        if !STATE_CODE_PATTERN.is_match(value) {
            return false;
        }
        seen_any = true;
    }
    seen_any
}
