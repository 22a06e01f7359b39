// src/matching/normalize.rs - Field canonicalization ahead of similarity scoring
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::columns;
use crate::models::RecordSet;

static WORD_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\-_/&]+").expect("separator pattern is valid"));
static NON_COMPARABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\s\p{L}\p{N}]+").expect("punctuation pattern is valid"));

pub const MULTI_VALUE_JOINER: &str = ", ";

/// How a column is canonicalized before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text: names, street addresses, regions.
    Text,
    /// Delimited list of email addresses.
    EmailList,
    /// Delimited list of person names.
    NameList,
}

/// Columns the engine canonicalizes, with their kind. Columns missing from a
/// set are skipped for that set only.
pub const NORMALIZED_COLUMNS: [(&str, FieldKind); 5] = [
    (columns::NAME, FieldKind::Text),
    (columns::EMAILS, FieldKind::EmailList),
    (columns::ADDRESS, FieldKind::Text),
    (columns::DOCTORS, FieldKind::NameList),
    (columns::STATE, FieldKind::Text),
];

pub fn normalize_field(kind: FieldKind, value: &str) -> String {
    match kind {
        FieldKind::Text => normalize_text(value),
        FieldKind::EmailList => normalize_multi_valued(value, normalize_email_token),
        FieldKind::NameList => normalize_multi_valued(value, normalize_text),
    }
}

/// Lower-cases, strips accents and punctuation, and collapses whitespace.
/// Letters and digits from any script are kept.
/// Hyphens, underscores, slashes and ampersands split words rather than join them.
pub fn normalize_text(value: &str) -> String {
    let folded: String = strip_accents(value).to_lowercase();
    let spaced = WORD_SEPARATORS.replace_all(&folded, " ");
    let kept = NON_COMPARABLE.replace_all(&spaced, "");
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Email addresses keep the punctuation that is part of the address.
pub fn normalize_email_token(token: &str) -> String {
    strip_accents(token.trim())
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '-' | '+'))
        .collect()
}

/// Splits on commas, semicolons and whitespace runs, canonicalizes each token,
/// then rejoins the distinct tokens in sorted order so that ordering and
/// repetition in the input do not affect comparison.
pub fn normalize_multi_valued(value: &str, normalize_token: fn(&str) -> String) -> String {
    let tokens: BTreeSet<String> = value
        .split(is_list_delimiter)
        .map(normalize_token)
        .filter(|t| !t.is_empty())
        .collect();
    tokens.into_iter().collect::<Vec<_>>().join(MULTI_VALUE_JOINER)
}

fn is_list_delimiter(c: char) -> bool {
    c == ',' || c == ';' || c.is_whitespace()
}

fn strip_accents(value: &str) -> String {
    value.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Returns a canonicalized copy of `set`; the input is left untouched.
pub fn normalize_record_set(set: &RecordSet) -> RecordSet {
    let mut normalized = set.clone();
    for (column, kind) in NORMALIZED_COLUMNS {
        normalized.map_column(column, |value| normalize_field(kind, value));
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_normalization() {
        assert_eq!(normalize_text("  Acme   Dental, P.C. "), "acme dental pc");
        assert_eq!(normalize_text("Smith-Jones Family Dentistry"), "smith jones family dentistry");
        assert_eq!(normalize_text("Clínica Dental Peña"), "clinica dental pena");
        assert_eq!(normalize_text("123 Main St., Suite #4"), "123 main st suite 4");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_letters_without_decomposition_survive() {
        assert_eq!(normalize_text("Łódź Dental"), "łodz dental");
        assert_eq!(normalize_text("Søren Ørtoft"), "søren ørtoft");
        assert_eq!(normalize_text("北京牙科诊所"), "北京牙科诊所");
        assert_eq!(normalize_text("Стоматология №1"), "стоматология 1");
    }

    #[test]
    fn test_email_lists_are_order_and_duplicate_insensitive() {
        let a = normalize_field(FieldKind::EmailList, "a@x.com, B@Y.com");
        let b = normalize_field(FieldKind::EmailList, "b@y.com ; a@x.com");
        assert_eq!(a, b);
        assert_eq!(a, "a@x.com, b@y.com");

        let repeated = normalize_field(FieldKind::EmailList, "a@x.com;a@x.com,,  A@X.COM");
        assert_eq!(repeated, "a@x.com");
    }

    #[test]
    fn test_doctor_lists_are_tokenized() {
        let a = normalize_field(FieldKind::NameList, "Dr. Jane Doe, John Smith");
        let b = normalize_field(FieldKind::NameList, "john smith; jane doe; dr");
        assert_eq!(a, b);
        assert_eq!(a, "doe, dr, jane, john, smith");
    }

    #[test]
    fn test_record_set_normalization_leaves_input_unchanged() {
        let original = RecordSet::from_rows(
            ["SourceID", "Name", "Emails"],
            vec![vec![
                "1".to_string(),
                "ACME Dental".to_string(),
                "Front@Acme.com".to_string(),
            ]],
        );
        let normalized = normalize_record_set(&original);

        assert_eq!(normalized.get(0, "Name"), Some("acme dental"));
        assert_eq!(normalized.get(0, "Emails"), Some("front@acme.com"));
        assert_eq!(normalized.get(0, "SourceID"), Some("1"));
        assert_eq!(original.get(0, "Name"), Some("ACME Dental"));
    }
}
