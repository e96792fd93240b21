use std::collections::HashSet;

use crate::record::ClassRecord;

/// Keeps, in input order, the records whose class name occurs more
/// than once. Every member of a group is retained.
pub fn reduce_to_duplicates(records: Vec<ClassRecord>) -> Vec<ClassRecord> {
    tracing::debug!(
        "Analyzing {} Java classes for duplicate names",
        records.len()
    );

    let duplicated: HashSet<String> = {
        let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
        let mut duplicated = HashSet::new();
        for record in &records {
            if !seen.insert(record.name.as_str()) {
                duplicated.insert(record.name.clone());
            }
        }
        duplicated
    };

    if duplicated.is_empty() {
        return Vec::new();
    }

    records
        .into_iter()
        .filter(|r| duplicated.contains(&r.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(name: &str, archive: &str, size: u64) -> ClassRecord {
        ClassRecord {
            name: name.to_string(),
            display_name: name.to_string(),
            size,
            modified: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            version: None,
            archive: archive.to_string(),
        }
    }

    #[test]
    fn keeps_every_member_of_a_group_in_order() {
        let input = vec![
            record("a.A", "1.jar", 1),
            record("b.B", "1.jar", 2),
            record("a.A", "2.jar", 3),
            record("c.C", "2.jar", 4),
            record("a.A", "3.jar", 5),
            record("c.C", "3.jar", 6),
        ];

        let out = reduce_to_duplicates(input);
        let keys: Vec<(&str, &str)> = out
            .iter()
            .map(|r| (r.name.as_str(), r.archive.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a.A", "1.jar"),
                ("a.A", "2.jar"),
                ("c.C", "2.jar"),
                ("a.A", "3.jar"),
                ("c.C", "3.jar"),
            ]
        );
    }

    #[test]
    fn differing_size_and_archive_still_count() {
        let out = reduce_to_duplicates(vec![record("x.Foo", "a.jar", 10), record("x.Foo", "b.jar", 99)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn no_duplicates_yields_empty() {
        let out = reduce_to_duplicates(vec![record("a.A", "1.jar", 1), record("b.B", "1.jar", 1)]);
        assert!(out.is_empty());
        assert!(reduce_to_duplicates(Vec::new()).is_empty());
    }

    #[test]
    fn reduction_is_idempotent() {
        let input = vec![
            record("a.A", "1.jar", 1),
            record("b.B", "1.jar", 2),
            record("a.A", "2.jar", 3),
        ];
        let once = reduce_to_duplicates(input);
        let twice = reduce_to_duplicates(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn key_is_full_name_not_truncated_display() {
        let mut a = record("p.VeryLongNameOne", "1.jar", 1);
        let mut b = record("p.VeryLongNameTwo", "1.jar", 1);
        a.display_name = "p.Very...".to_string();
        b.display_name = "p.Very...".to_string();
        assert!(reduce_to_duplicates(vec![a, b]).is_empty());
    }
}
