//! Phone number comparison and formatting helpers
//!
//! Canonical comparison here is deliberately loose: two numbers dial the same
//! destination when the shorter one is a suffix of the longer one and the
//! longer one's extra prefix is an international access or trunk prefix.
//! Carrier formatting differences ("+65 9123 4567" vs "6591234567") compare
//! equal; genuinely different subscribers do not.

use serde::Serialize;

/// Minimum trailing digits that must agree before two numbers are considered
/// the same destination.
const MIN_MATCH: usize = 7;

/// Sentinel stored by the call log when the network withheld the number.
pub const UNKNOWN_NUMBER: &str = "-1";
/// Sentinel for caller-id suppressed calls.
pub const PRIVATE_NUMBER: &str = "-2";
/// Sentinel for payphone calls.
pub const PAYPHONE_NUMBER: &str = "-3";

/// Drop separator characters, keeping only dialable content.
pub fn strip_separators(number: &str) -> String {
    number
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+' || *c == '*' || *c == '#')
        .collect()
}

fn trailing_digits(number: &str) -> Vec<u8> {
    number
        .chars()
        .filter(|c| c.is_ascii_digit())
        .map(|c| c as u8)
        .collect()
}

/// Loose canonical comparison: do `a` and `b` dial the same destination?
///
/// Strips separators, then requires the shorter digit sequence to be a suffix
/// of the longer with at least [`MIN_MATCH`] digits in common. The longer
/// number's extra prefix must be an international access prefix ("+CC", "00",
/// "011") or the trunk "0". Numbers like "+6591234567" vs "0891234567" are
/// NOT equal here (the extra "08" is neither) — callers wanting that match
/// need the sloppy suffix fallback.
pub fn numbers_dial_same(a: &str, b: &str) -> bool {
    let sa = strip_separators(a);
    let sb = strip_separators(b);

    if sa.is_empty() || sb.is_empty() {
        return false;
    }
    if sa == sb {
        return true;
    }

    let da = trailing_digits(&sa);
    let db = trailing_digits(&sb);

    let mut matched = 0;
    while matched < da.len()
        && matched < db.len()
        && da[da.len() - 1 - matched] == db[db.len() - 1 - matched]
    {
        matched += 1;
    }

    let shorter = da.len().min(db.len());

    if matched < shorter || matched < MIN_MATCH {
        return false;
    }
    if da.len() == db.len() {
        // Same digits, only separators differed
        return true;
    }

    let (longer_stripped, longer_digits) = if da.len() > db.len() {
        (&sa, &da)
    } else {
        (&sb, &db)
    };
    let extra: String = longer_digits[..longer_digits.len() - matched]
        .iter()
        .map(|d| *d as char)
        .collect();

    // "+" marks a country code; otherwise the extra digits must themselves be
    // a recognized dialing prefix.
    longer_stripped.starts_with('+')
        || extra == "0"
        || extra == "00"
        || extra.starts_with("011")
}

/// Display formatting for a phone number.
///
/// North-American shapes get grouped; anything else (including "+" numbers)
/// is returned stripped of separators. Computed lazily by callers that cache
/// the result, so this stays allocation-simple rather than locale-aware.
pub fn format_number(number: &str) -> String {
    let stripped = strip_separators(number);
    let digits: String = stripped.chars().filter(|c| c.is_ascii_digit()).collect();

    if stripped.starts_with('+') || digits.len() != stripped.len() {
        return stripped;
    }

    match digits.len() {
        7 => format!("{}-{}", &digits[..3], &digits[3..]),
        10 => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
        11 if digits.starts_with('1') => {
            format!("{} ({}) {}-{}", &digits[..1], &digits[1..4], &digits[4..7], &digits[7..])
        }
        _ => stripped,
    }
}

/// Classification of a call-log number, for presentation layers to localize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumberClass {
    Regular,
    Unknown,
    Private,
    Payphone,
    Voicemail,
}

/// Classify a number against the call log's sentinels and the configured
/// voicemail number.
pub fn classify(number: &str, voicemail_number: Option<&str>) -> NumberClass {
    match number {
        UNKNOWN_NUMBER => NumberClass::Unknown,
        PRIVATE_NUMBER => NumberClass::Private,
        PAYPHONE_NUMBER => NumberClass::Payphone,
        _ => match voicemail_number {
            Some(vm) if !vm.is_empty() && number == vm => NumberClass::Voicemail,
            _ => NumberClass::Regular,
        },
    }
}

/// Whether a number can be dialed at all.
pub fn is_callable(number: &str, voicemail_number: Option<&str>) -> bool {
    !number.is_empty()
        && !matches!(
            classify(number, voicemail_number),
            NumberClass::Unknown | NumberClass::Private | NumberClass::Payphone
        )
}

/// Whether the directory's stored number should be preferred over the number
/// the call log recorded. Caller-id often arrives unqualified while the
/// contact carries the internationally dialable form.
pub fn prefer_contact_number(record_number: &str, contact_number: &str) -> bool {
    !contact_number.is_empty()
        && (contact_number.starts_with('+') || contact_number.len() > record_number.len())
}
