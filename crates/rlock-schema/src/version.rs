use std::cmp::Ordering;

/// Compare two version strings in canonical lock order.
///
/// Version strings in provenance records are not semver: `1.0.1`, `2024a`,
/// `0.10rc1` and `1.1.1w` all occur in real environments. Both inputs are
/// split on the common separators and compared segment by segment: numeric
/// segments order by magnitude (so `1.2` sorts before `1.10`), non-numeric
/// segments order byte-wise, and a non-numeric segment sorts before any
/// numeric one (so the suffixed `1.0a` sorts before the plain `1.0`). Ties
/// fall through to segment count and finally the raw string, which keeps the
/// relation a total order across separator variants.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = segments(a);
    let right = segments(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (is_numeric(l), is_numeric(r)) {
            (true, true) => compare_numeric(l, r),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => l.cmp(r),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    // All shared segments equal: fewer segments sorts first, then the raw
    // string keeps the order total across separator variants.
    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

fn segments(version: &str) -> Vec<&str> {
    version
        .split(['.', '-', '_', '+'])
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_numeric(segment: &str) -> bool {
    segment.bytes().all(|b| b.is_ascii_digit())
}

// Magnitude order without an integer width limit: after stripping leading
// zeros, a longer digit string is larger, and equal lengths compare byte-wise.
fn compare_numeric(l: &str, r: &str) -> Ordering {
    let l = l.trim_start_matches('0');
    let r = r.trim_start_matches('0');
    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
}
