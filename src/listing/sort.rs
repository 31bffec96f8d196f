//! Listing order.
//!
//! Directories first, then (optionally) timestamps, then names compared
//! character by character: case-insensitive first, case-sensitive to break
//! ties. The resulting order is total, so `sort_by` is deterministic.

use std::cmp::Ordering;

use super::ListingEntry;
use crate::config::{ListingConfig, SortDirection};

fn directed(direction: SortDirection, ordering: Ordering) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// How listing entries are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortPolicy {
    pub date: Option<SortDirection>,
    pub name: SortDirection,
    /// Shorter names sort first before any character is compared.
    pub numeric: bool,
}

impl SortPolicy {
    pub fn from_config(config: &ListingConfig) -> Self {
        Self {
            date: config.sort_date,
            name: config.sort_name,
            numeric: config.sort_numeric,
        }
    }

    pub fn compare(&self, a: &ListingEntry, b: &ListingEntry) -> Ordering {
        match (a.is_directory(), b.is_directory()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }

        if let Some(direction) = self.date {
            if a.last_modified != b.last_modified {
                return directed(direction, a.last_modified.cmp(&b.last_modified));
            }
        }

        directed(self.name, self.compare_names(&a.name, &b.name))
    }

    fn compare_names(&self, a: &str, b: &str) -> Ordering {
        let (a_len, b_len) = (a.chars().count(), b.chars().count());
        if self.numeric && a_len != b_len {
            return a_len.cmp(&b_len);
        }

        for (x, y) in a.chars().zip(b.chars()) {
            let folded = x.to_lowercase().cmp(y.to_lowercase());
            if folded != Ordering::Equal {
                return folded;
            }
            if x != y {
                return x.cmp(&y);
            }
        }
        a_len.cmp(&b_len)
    }

    pub fn sort(&self, entries: &mut [ListingEntry]) {
        entries.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn names(entries: &[ListingEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn files(names: &[&str]) -> Vec<ListingEntry> {
        names.iter().map(|n| ListingEntry::file(*n, 1, None)).collect()
    }

    fn sorted(policy: SortPolicy, input: &[&str]) -> Vec<String> {
        let mut entries = files(input);
        policy.sort(&mut entries);
        entries.into_iter().map(|e| e.name).collect()
    }

    #[test]
    fn test_lexicographic_ascending() {
        let policy = SortPolicy::default();
        assert_eq!(sorted(policy, &["3", "1", "2"]), ["1", "2", "3"]);
        assert_eq!(sorted(policy, &["20", "101", "10"]), ["10", "101", "20"]);
        assert_eq!(sorted(policy, &["200/10", "10/2", "101/1"]), ["10/2", "101/1", "200/10"]);
    }

    #[test]
    fn test_numeric_ascending() {
        let policy = SortPolicy {
            numeric: true,
            ..Default::default()
        };
        assert_eq!(sorted(policy, &["3", "1", "2"]), ["1", "2", "3"]);
        assert_eq!(sorted(policy, &["20", "101", "10"]), ["10", "20", "101"]);
    }

    #[test]
    fn test_descending_reverses_names() {
        let policy = SortPolicy {
            name: SortDirection::Desc,
            ..Default::default()
        };
        assert_eq!(sorted(policy, &["a", "ab", "b"]), ["b", "ab", "a"]);
    }

    #[test]
    fn test_case_folding_then_exact() {
        let policy = SortPolicy::default();
        assert_eq!(sorted(policy, &["b", "B", "a", "A"]), ["A", "a", "B", "b"]);
    }

    #[test]
    fn test_directories_first() {
        let mut entries = vec![ListingEntry::file("b.txt", 3, None), ListingEntry::directory("a/")];
        SortPolicy::default().sort(&mut entries);
        assert_eq!(names(&entries), ["a/", "b.txt"]);

        // even when the directory name sorts later
        let mut entries = vec![ListingEntry::file("a.txt", 3, None), ListingEntry::directory("z/")];
        SortPolicy::default().sort(&mut entries);
        assert_eq!(names(&entries), ["z/", "a.txt"]);
    }

    #[test]
    fn test_date_sort() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut entries = vec![
            ListingEntry::file("a", 1, Some(late)),
            ListingEntry::file("b", 1, Some(early)),
            ListingEntry::file("c", 1, Some(early)),
        ];

        let asc = SortPolicy {
            date: Some(SortDirection::Asc),
            ..Default::default()
        };
        asc.sort(&mut entries);
        assert_eq!(names(&entries), ["b", "c", "a"]);

        let desc = SortPolicy {
            date: Some(SortDirection::Desc),
            ..Default::default()
        };
        desc.sort(&mut entries);
        assert_eq!(names(&entries), ["a", "b", "c"]);
    }

    #[test]
    fn test_resort_is_idempotent() {
        let policy = SortPolicy {
            numeric: true,
            ..Default::default()
        };
        let mut entries = files(&["x10", "X1", "x2", "a/", "x1", "b"]);
        entries.push(ListingEntry::directory("A/"));
        policy.sort(&mut entries);
        let first = entries.clone();
        policy.sort(&mut entries);
        assert_eq!(entries, first);
        assert_eq!(names(&entries)[..2], ["A/", "a/"]);
    }
}
