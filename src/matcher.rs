//! Key-based matching of entities between two models.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::diff::{CategoryDiff, DuplicateKey, EntityDiff, EntryStatus, Side};

/// Entities of one collection, indexed by key.
struct KeyedItems<'a, T> {
    /// Keys in order of first appearance.
    keys: Vec<&'a str>,

    /// Map of key to the last item with that key.
    items: FxHashMap<&'a str, &'a T>,
}

impl<'a, T> KeyedItems<'a, T> {
    fn new(
        category: &str,
        side: Side,
        items: &'a [T],
        key: &impl Fn(&T) -> &str,
        duplicates: &mut Vec<DuplicateKey>,
    ) -> Self {
        let mut keys = Vec::with_capacity(items.len());
        let mut map = FxHashMap::default();
        map.reserve(items.len());

        for item in items {
            let item_key = key(item);
            if map.insert(item_key, item).is_some() {
                warn!(
                    category,
                    key = item_key,
                    side = ?side,
                    "duplicate key, the last entry will be compared"
                );
                duplicates.push(DuplicateKey {
                    side,
                    key: item_key.to_string(),
                });
            } else {
                keys.push(item_key);
            }
        }

        KeyedItems { keys, items: map }
    }
}

/// Match two collections of entities by key and classify each key.
///
/// - Keys only in `items1` are [`EntryStatus::Removed`].
/// - Keys only in `items2` are [`EntryStatus::Added`].
/// - Keys in both are passed to `compare`, which returns `Some(diff)` if the
///   entities differ ([`EntryStatus::Modified`]) or `None` otherwise
///   ([`EntryStatus::Unchanged`]).
///
/// If a key occurs more than once in a collection, the last entity with that
/// key is used and the duplicate is recorded in the result. `category` is
/// used only in log messages.
pub fn match_entities<T, D>(
    category: &str,
    items1: &[T],
    items2: &[T],
    key: impl Fn(&T) -> &str,
    compare: impl Fn(&T, &T) -> Option<D>,
) -> CategoryDiff<T, D>
where
    T: Clone,
{
    let mut duplicates = Vec::new();
    let keyed1 = KeyedItems::new(category, Side::Model1, items1, &key, &mut duplicates);
    let keyed2 = KeyedItems::new(category, Side::Model2, items2, &key, &mut duplicates);

    let mut entries = Vec::with_capacity(keyed1.keys.len().max(keyed2.keys.len()));
    for &item_key in &keyed1.keys {
        let item1 = keyed1.items[item_key];
        let status = match keyed2.items.get(item_key) {
            Some(&item2) => match compare(item1, item2) {
                Some(diff) => EntryStatus::Modified(diff),
                None => EntryStatus::Unchanged,
            },
            None => EntryStatus::Removed(item1.clone()),
        };
        entries.push(EntityDiff {
            key: item_key.to_string(),
            status,
        });
    }

    for &item_key in &keyed2.keys {
        if keyed1.items.contains_key(item_key) {
            continue;
        }
        entries.push(EntityDiff {
            key: item_key.to_string(),
            status: EntryStatus::Added(keyed2.items[item_key].clone()),
        });
    }

    CategoryDiff {
        model1_count: items1.len(),
        model2_count: items2.len(),
        entries,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::match_entities;
    use crate::diff::{DuplicateKey, EntryStatus, Side};

    type Item = (&'static str, i32);

    fn compare(a: &Item, b: &Item) -> Option<(i32, i32)> {
        (a.1 != b.1).then_some((a.1, b.1))
    }

    #[test]
    fn test_match_entities() {
        let items1: Vec<Item> = vec![("a", 1), ("b", 2), ("c", 3)];
        let items2: Vec<Item> = vec![("d", 4), ("b", 5), ("a", 1)];

        let diff = match_entities("test", &items1, &items2, |item| item.0, compare);

        assert_eq!(diff.model1_count, 3);
        assert_eq!(diff.model2_count, 3);
        let keys: Vec<_> = diff.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c", "d"]);

        assert_eq!(diff.get("a"), Some(&EntryStatus::Unchanged));
        assert_eq!(diff.get("b"), Some(&EntryStatus::Modified((2, 5))));
        assert_eq!(diff.get("c"), Some(&EntryStatus::Removed(("c", 3))));
        assert_eq!(diff.get("d"), Some(&EntryStatus::Added(("d", 4))));
        assert!(diff.duplicates.is_empty());
    }

    #[test]
    fn test_match_empty_collections() {
        let items: Vec<Item> = Vec::new();
        let diff = match_entities("test", &items, &items, |item| item.0, compare);
        assert!(diff.entries.is_empty());
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_match_duplicate_keys() {
        let items1: Vec<Item> = vec![("a", 1), ("b", 2), ("a", 3)];
        let items2: Vec<Item> = vec![("a", 3), ("b", 2)];

        let diff = match_entities("test", &items1, &items2, |item| item.0, compare);

        // The last entry with a duplicate key is compared, at the position
        // where the key was first seen.
        let keys: Vec<_> = diff.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(diff.get("a"), Some(&EntryStatus::Unchanged));
        assert_eq!(diff.model1_count, 3);
        assert_eq!(
            diff.duplicates,
            [DuplicateKey {
                side: Side::Model1,
                key: "a".into(),
            }]
        );
    }

    #[test]
    fn test_match_is_symmetric() {
        let items1: Vec<Item> = vec![("a", 1), ("b", 2)];
        let items2: Vec<Item> = vec![("b", 3), ("c", 4)];

        let forward = match_entities("test", &items1, &items2, |item| item.0, compare);
        let reverse = match_entities("test", &items2, &items1, |item| item.0, compare);

        assert_eq!(forward.get("a"), Some(&EntryStatus::Removed(("a", 1))));
        assert_eq!(reverse.get("a"), Some(&EntryStatus::Added(("a", 1))));
        assert_eq!(forward.get("b"), Some(&EntryStatus::Modified((2, 3))));
        assert_eq!(reverse.get("b"), Some(&EntryStatus::Modified((3, 2))));
        assert_eq!(forward.get("c"), Some(&EntryStatus::Added(("c", 4))));
        assert_eq!(reverse.get("c"), Some(&EntryStatus::Removed(("c", 4))));
    }
}
