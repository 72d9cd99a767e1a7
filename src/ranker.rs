//! Ordering of listed resources for display and selection

use crate::models::Resource;
use std::cmp::Reverse;

/// Key used to rank resources, always descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Largest first
    Size,
    /// Most recently modified first; resources without a timestamp go last
    Date,
}

/// Return a ranked copy of `records`.
///
/// The sort is stable: records with equal keys keep their relative order,
/// which also makes ranking idempotent.
pub fn rank<R: Resource + Clone>(records: &[R], key: SortKey) -> Vec<R> {
    let mut ranked = records.to_vec();
    match key {
        SortKey::Size => ranked.sort_by_key(|r| Reverse(r.size_bytes())),
        SortKey::Date => ranked.sort_by_key(|r| Reverse(r.modified_time())),
    }
    ranked
}

/// Ranked copy truncated to the first `limit` records
pub fn top<R: Resource + Clone>(records: &[R], key: SortKey, limit: usize) -> Vec<R> {
    let mut ranked = rank(records, key);
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DriveFile;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    const MB: u64 = 1024 * 1024;

    fn file(id: &str, size_bytes: u64, day: Option<u32>) -> DriveFile {
        DriveFile {
            id: id.to_string(),
            name: format!("{}.bin", id),
            mime_type: "application/octet-stream".to_string(),
            size_bytes,
            modified_time: day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_rank_by_size_top_two() {
        let files = vec![
            file("ten", 10 * MB, Some(1)),
            file("fifty", 50 * MB, Some(2)),
            file("five", 5 * MB, Some(3)),
        ];

        let ranked = top(&files, SortKey::Size, 2);
        let ids: Vec<&str> = ranked.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["fifty", "ten"]);
    }

    #[test]
    fn test_rank_by_size_is_stable_on_ties() {
        let files = vec![file("a", MB, None), file("b", 2 * MB, None), file("c", MB, None)];
        let ids: Vec<String> = rank(&files, SortKey::Size).into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_rank_by_date_puts_missing_last() {
        let files = vec![
            file("undated", MB, None),
            file("old", MB, Some(1)),
            file("new", MB, Some(20)),
        ];
        let ids: Vec<String> = rank(&files, SortKey::Date).into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[test]
    fn test_rank_empty() {
        let files: Vec<DriveFile> = Vec::new();
        assert!(rank(&files, SortKey::Size).is_empty());
        assert!(top(&files, SortKey::Date, 10).is_empty());
    }

    fn arb_files() -> impl Strategy<Value = Vec<DriveFile>> {
        prop::collection::vec((0u64..5, prop::option::of(1u32..28)), 0..40).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (size, day))| file(&format!("f{}", i), size, day))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_size_rank_is_sorted_permutation(files in arb_files()) {
            let ranked = rank(&files, SortKey::Size);
            prop_assert_eq!(ranked.len(), files.len());
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].size_bytes >= pair[1].size_bytes);
                if pair[0].size_bytes == pair[1].size_bytes {
                    let a: usize = pair[0].id[1..].parse().unwrap();
                    let b: usize = pair[1].id[1..].parse().unwrap();
                    prop_assert!(a < b);
                }
            }
            let mut original: Vec<String> = files.iter().map(|f| f.id.clone()).collect();
            let mut permuted: Vec<String> = ranked.iter().map(|f| f.id.clone()).collect();
            original.sort();
            permuted.sort();
            prop_assert_eq!(original, permuted);
        }

        #[test]
        fn prop_rank_is_idempotent(files in arb_files()) {
            for key in [SortKey::Size, SortKey::Date] {
                let once = rank(&files, key);
                let twice = rank(&once, key);
                prop_assert_eq!(once, twice);
            }
        }
    }
}
