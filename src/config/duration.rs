use std::time::Duration;

const UNITS: [(&str, u128); 8] = [
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

// Digits past nanosecond precision of the largest unit carry no weight
const MAX_FRACTION_DIGITS: usize = 18;

/// Parse a duration string like "30s", "1m30s", "500ms" or "1.5h"
///
/// The value is a sequence of `<decimal><unit>` elements whose sum is the
/// duration. Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`; each
/// number may carry a fraction (".5s", "2.25m"). A leading `+` is accepted.
///
/// Returns `None` for anything that is not strictly positive, for a missing
/// unit, and for totals that overflow a signed 64-bit nanosecond count.
///
/// Used for `--scaninterval` and for the node group grace/cool-down periods.
pub fn parse_duration(duration_str: &str) -> Option<Duration> {
    let trimmed = duration_str.trim();
    let mut rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if rest.is_empty() {
        return None;
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)?;
        total = total.checked_add(element_nanos(number, scale)?)?;
        rest = tail;
    }

    if total == 0 || total > i64::MAX as u128 {
        return None;
    }
    Some(Duration::from_nanos(total as u64))
}

/// Nanoseconds in one `<decimal><unit>` element
fn element_nanos(number: &str, scale: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(scale)?;

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let digits: u128 = fraction.parse().ok()?;
        let divisor = 10u128.pow(fraction.len() as u32);
        nanos = nanos.checked_add(digits * scale / divisor)?;
    }
    Some(nanos)
}
