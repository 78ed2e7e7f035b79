//! Caller equivalence decisions for the merge pass

use crate::telephony;

/// How many trailing characters of the stripped numbers the sloppy fallback
/// compares, and the minimum stripped length for it to apply at all.
const SLOPPY_SUFFIX_LEN: usize = 8;

/// The identity a record or entry presents for merge purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerRef<'a> {
    pub number: &'a str,
    pub contact_id: i64,
}

/// Decide whether two caller references denote the same caller.
///
/// Rules in priority order, first hit wins:
/// 1. both contact ids known (≥ 0) and equal;
/// 2. the numbers dial the same destination under canonical comparison;
/// 3. sloppy suffix fallback (see [`sloppy_suffix_match`]).
pub fn equivalent(a: &CallerRef<'_>, b: &CallerRef<'_>) -> bool {
    if a.contact_id >= 0 && b.contact_id >= 0 && a.contact_id == b.contact_id {
        return true;
    }
    if telephony::numbers_dial_same(a.number, b.number) {
        return true;
    }
    sloppy_suffix_match(a.number, b.number)
}

/// Suffix heuristic covering numbers canonical comparison misses, such as
/// "+6591234567" vs "0891234567" (same subscriber reached through an IP
/// dialing prefix). Both numbers, stripped of separators, must be at least
/// 8 characters long and share their last 8. False positives are possible
/// for unrelated numbers sharing an 8-digit suffix; that is an accepted
/// approximation.
pub fn sloppy_suffix_match(a: &str, b: &str) -> bool {
    let sa = telephony::strip_separators(a);
    let sb = telephony::strip_separators(b);

    if sa.len() < SLOPPY_SUFFIX_LEN || sb.len() < SLOPPY_SUFFIX_LEN {
        return false;
    }

    sa[sa.len() - SLOPPY_SUFFIX_LEN..] == sb[sb.len() - SLOPPY_SUFFIX_LEN..]
}
