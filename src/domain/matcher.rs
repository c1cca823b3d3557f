use super::SharedEntry;

/// Maximum number of ranked entries shown at once.
pub const RESULT_LIMIT: usize = 15;

/// Ranks `entries` whose display name contains `key` (case-insensitive).
///
/// Earlier match positions rank higher; ties keep input order. An empty key or
/// an empty input yields an empty list.
pub fn match_entries(entries: &[SharedEntry], key: &str, limit: usize) -> Vec<SharedEntry> {
    if key.is_empty() || entries.is_empty() {
        return Vec::new();
    }

    let key = key.to_lowercase();

    let mut ranked: Vec<(usize, &SharedEntry)> = entries
        .iter()
        .filter_map(|entry| match_position(entry.name(), &key).map(|pos| (pos, entry)))
        .collect();

    // sort_by_key is stable, so equal positions stay in input order
    ranked.sort_by_key(|(pos, _)| *pos);

    ranked
        .into_iter()
        .take(limit)
        .map(|(_, entry)| SharedEntry::clone(entry))
        .collect()
}

/// Extends a ranked view with entries appended after everything it was
/// ranked from.
///
/// `ranked` must be the result of ranking the earlier entries against the same
/// `key` and `limit`. The outcome equals [`match_entries`] over the earlier
/// entries followed by `batch`, while only looking at `ranked` and `batch`.
pub fn merge_matches(
    ranked: &[SharedEntry],
    batch: &[SharedEntry],
    key: &str,
    limit: usize,
) -> Vec<SharedEntry> {
    if key.is_empty() {
        return Vec::new();
    }

    let key = key.to_lowercase();

    // earlier entries precede the batch, so a stable sort keeps input order on ties
    let mut merged: Vec<(usize, &SharedEntry)> = ranked
        .iter()
        .chain(batch)
        .filter_map(|entry| match_position(entry.name(), &key).map(|pos| (pos, entry)))
        .collect();
    merged.sort_by_key(|(pos, _)| *pos);

    merged
        .into_iter()
        .take(limit)
        .map(|(_, entry)| SharedEntry::clone(entry))
        .collect()
}

/// Character offset of the first occurrence of `key_lower` in `name`.
fn match_position(name: &str, key_lower: &str) -> Option<usize> {
    let name_lower = name.to_lowercase();
    name_lower
        .find(key_lower)
        .map(|byte_pos| name_lower[..byte_pos].chars().count())
}

/// Structural equality: same paths in the same order.
pub fn same_paths(a: &[SharedEntry], b: &[SharedEntry]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.path() == y.path())
}

/// Picks the selection for `next` given the selection in `previous`.
///
/// Follows the previously selected entry by path when it survived, otherwise
/// selects the first entry, or nothing when `next` is empty.
pub fn follow_selection(
    previous: &[SharedEntry],
    previous_index: Option<usize>,
    next: &[SharedEntry],
) -> Option<usize> {
    if next.is_empty() {
        return None;
    }

    previous_index
        .and_then(|i| previous.get(i))
        .and_then(|selected| next.iter().position(|e| e.path() == selected.path()))
        .or(Some(0))
}
