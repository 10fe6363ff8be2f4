//! Nutrition annotation parsing and dish-line formatting.
//!
//! The upstream meal API encodes nutrition facts as one free-text blob of
//! `label: value(unit)` segments separated by literal `<br/>` markers, with
//! either a half-width or full-width colon. The parser here is the single
//! implementation used by both the day view and the month aggregation.

use shared::Nutrient;

/// Segment delimiter inside both the nutrition annotation and dish listing
const BREAK_TAG: &str = "<br/>";

/// Escaped-newline token that sometimes appears inside dish listings
const NEWLINE_TOKEN: &str = "/n";

/// Parse one nutrition annotation into (nutrient, amount) pairs, restricted
/// to the three-nutrient allow-list. Order follows the annotation.
///
/// Per segment:
/// - split on the first colon (half- or full-width); anything other than
///   exactly two parts is discarded (ambiguous segments are dropped, not
///   repaired)
/// - strip the parenthesized unit suffix from the label and trim
/// - take the first contiguous numeric token of the value part; a segment
///   without one is discarded
#[must_use]
pub fn parse_nutrition(raw: &str) -> Vec<(Nutrient, f64)> {
    let mut pairs = Vec::new();

    for segment in raw.split(BREAK_TAG) {
        if segment.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = segment.split([':', '：']).collect();
        if parts.len() != 2 {
            continue;
        }

        let label = strip_unit_suffix(parts[0]);
        let Some(nutrient) = Nutrient::from_label(label.trim()) else {
            continue;
        };

        if let Some(amount) = first_numeric_token(parts[1]) {
            pairs.push((nutrient, amount));
        }
    }

    pairs
}

/// Format a raw dish listing into display lines: break markers become real
/// newlines, digits and `(` `)` `.` are stripped, blank lines dropped.
/// Input order is preserved.
#[must_use]
pub fn format_dish_lines(raw: &str) -> Vec<String> {
    let normalized = raw.replace(BREAK_TAG, "\n").replace(NEWLINE_TOKEN, "\n");

    normalized
        .lines()
        .map(|line| {
            line.chars()
                .filter(|c| !c.is_ascii_digit() && !matches!(c, '(' | ')' | '.'))
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Remove a parenthesized suffix like "(g)" from a label
fn strip_unit_suffix(label: &str) -> &str {
    match label.find('(') {
        Some(idx) => &label[..idx],
        None => label,
    }
}

/// First contiguous run of digits/periods that parses as a number
fn first_numeric_token(value: &str) -> Option<f64> {
    let start = value.find(|c: char| c.is_ascii_digit() || c == '.')?;
    let rest = &value[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}
