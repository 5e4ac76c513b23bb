use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::storage::types::DriveItem;

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)").expect("static regex"))
}

/// Ordering used for folder and file listings: names with a numeric prefix
/// sort numerically ("2 x" before "10 x"), numeric-prefixed names before
/// plain ones, everything else case-insensitive lexicographic.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let num_a = leading_number()
        .captures(&a)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok());
    let num_b = leading_number()
        .captures(&b)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok());

    match (num_a, num_b) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(&b),
    }
}

pub fn sort_items(items: &mut [DriveItem]) {
    items.sort_by(|a, b| natural_cmp(&a.name, &b.name));
}
