//! Numeric utilities: lenient integer parsing for query-string values and
//! centralized integer conversions.
//!
//! Guidelines
//! - Query-string numbers are parsed leniently: leading whitespace and an optional sign,
//!   then base-10 digits up to the first non-digit (`"10abc"` is 10, `"abc"` is nothing).
//! - Prefer saturating conversions where clamping is safer than truncating.

/// Parses the leading base-10 integer of `s`, the way a browser-side `parseInt(s, 10)` does.
///
/// Returns `None` when no digit follows the optional sign, and saturates on overflow.
#[must_use]
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let t = s.trim_start();
    let (negative, digits) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    let mut acc: i64 = 0;
    for b in digits[..end].bytes() {
        let d = i64::from(b - b'0');
        acc = acc.saturating_mul(10).saturating_add(d);
    }
    Some(if negative { -acc } else { acc })
}

#[inline]
#[must_use]
pub fn u64_to_usize_saturating(v: u64) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

#[inline]
#[must_use]
pub fn usize_to_u64(v: usize) -> u64 {
    v as u64
}

#[inline]
#[must_use]
pub fn u128_to_u64_saturating(v: u128) -> u64 {
    if v > u128::from(u64::MAX) { u64::MAX } else { v as u64 }
}
