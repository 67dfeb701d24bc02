//! Record merger.
//!
//! Groups partial records by identity key and folds each group field by
//! field in strategy-priority order. Output order is the first-seen order
//! of each identity.

use std::collections::HashMap;

use crate::records::{Record, ScalarConflict};

/// A candidate record tagged with the strategy that produced it.
///
/// Lower `priority` values win scalar conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partial<R> {
    pub record: R,
    pub priority: usize,
    pub strategy: &'static str,
}

impl<R> Partial<R> {
    pub fn new(record: R, priority: usize, strategy: &'static str) -> Self {
        Self {
            record,
            priority,
            strategy,
        }
    }
}

/// Merge a pool of partials into one record per identity key.
///
/// Candidates without an identity key are dropped. The surviving record
/// keeps the priority and strategy name of its highest-priority
/// contributor. A weakly identified record (see [`Record::weak_key`]) is
/// folded into the one strongly identified record sharing its weak key;
/// with two or more such records it stays apart. Passes repeat until one
/// merges nothing, so output keys are distinct even if absorbing a field
/// re-keys a record, and `merge(merge(p)) == merge(p)`.
pub fn merge<R: Record>(partials: Vec<Partial<R>>, policy: ScalarConflict) -> Vec<Partial<R>> {
    let mut current = attach_weak(merge_pass(partials, policy), policy);
    loop {
        let before = current.len();
        current = attach_weak(merge_pass(current, policy), policy);
        if current.len() == before {
            return current;
        }
    }
}

/// Lower priority value wins; ties go to `first`.
fn combine<R: Record>(first: Partial<R>, second: Partial<R>, policy: ScalarConflict) -> Partial<R> {
    let (mut head, tail) = if second.priority < first.priority {
        (second, first)
    } else {
        (first, second)
    };
    head.record.absorb(&tail.record, policy);
    head
}

fn attach_weak<R: Record>(partials: Vec<Partial<R>>, policy: ScalarConflict) -> Vec<Partial<R>> {
    let mut strong: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, partial) in partials.iter().enumerate() {
        if partial.record.has_strong_identity()
            && let Some(key) = partial.record.weak_key()
        {
            strong.entry(key).or_default().push(i);
        }
    }
    if strong.is_empty() {
        return partials;
    }

    let mut slots: Vec<Option<Partial<R>>> = partials.into_iter().map(Some).collect();
    for i in 0..slots.len() {
        let Some(key) = slots[i]
            .as_ref()
            .filter(|p| !p.record.has_strong_identity())
            .and_then(|p| p.record.weak_key())
        else {
            continue;
        };
        let Some(&[j]) = strong.get(&key).map(Vec::as_slice) else {
            continue;
        };
        if slots[j].is_none() {
            continue;
        }
        let (lo, hi) = (i.min(j), i.max(j));
        if let (Some(first), Some(second)) = (slots[lo].take(), slots[hi].take()) {
            slots[lo] = Some(combine(first, second, policy));
        }
    }
    slots.into_iter().flatten().collect()
}

fn merge_pass<R: Record>(partials: Vec<Partial<R>>, policy: ScalarConflict) -> Vec<Partial<R>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<Partial<R>>> = Vec::new();

    for partial in partials {
        let Some(key) = partial.record.identity_key() else {
            continue;
        };
        match index.get(&key) {
            Some(&slot) => groups[slot].push(partial),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![partial]);
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|mut group| {
            // Stable: equal priorities keep first-seen order.
            group.sort_by_key(|p| p.priority);
            let mut members = group.into_iter();
            let mut head = members.next()?;
            for other in members {
                head.record.absorb(&other.record, policy);
            }
            Some(head)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{NewsItem, ResearchGroup, StaffMember};

    fn news(title: &str, content: &str, url: Option<&str>) -> NewsItem {
        NewsItem {
            title: title.into(),
            content: content.into(),
            url: url.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn lower_priority_fills_missing_fields_only() {
        let merged = merge(
            vec![
                Partial::new(news("Open Day", "", None), 1, "heading"),
                Partial::new(news("open day!", "Short", Some("/a")), 0, "container"),
                Partial::new(news("OPEN DAY", "A much longer body", Some("/b")), 2, "text"),
            ],
            ScalarConflict::PreferHigherPriority,
        );
        assert_eq!(merged.len(), 1);
        let only = &merged[0];
        assert_eq!(only.strategy, "container");
        assert_eq!(only.priority, 0);
        assert_eq!(only.record.title, "open day!");
        assert_eq!(only.record.content, "Short");
        assert_eq!(only.record.url.as_deref(), Some("/a"));
    }

    #[test]
    fn prefer_longer_policy_is_honoured() {
        let merged = merge(
            vec![
                Partial::new(news("Open Day", "Short", None), 0, "container"),
                Partial::new(news("Open Day", "A much longer body", None), 1, "heading"),
            ],
            ScalarConflict::PreferLonger,
        );
        assert_eq!(merged[0].record.content, "A much longer body");
        assert_eq!(merged[0].strategy, "container");
    }

    #[test]
    fn list_fields_are_concatenated() {
        let group = |researchers: &[&str]| ResearchGroup {
            name: "Analog Design".into(),
            researchers: researchers.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let merged = merge(
            vec![
                Partial::new(group(&["Ana", "Luis"]), 0, "container"),
                Partial::new(group(&["luis", "Marta"]), 1, "heading"),
            ],
            ScalarConflict::default(),
        );
        assert_eq!(merged[0].record.researchers, vec!["Ana", "Luis", "Marta"]);
    }

    #[test]
    fn first_seen_order_and_keyless_drop() {
        let merged = merge(
            vec![
                Partial::new(news("B", "", None), 1, "heading"),
                Partial::new(news("", "orphan", None), 0, "container"),
                Partial::new(news("A", "", None), 0, "container"),
                Partial::new(news("b", "x", None), 0, "container"),
            ],
            ScalarConflict::default(),
        );
        let titles: Vec<_> = merged.iter().map(|p| p.record.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "A"]);
    }

    #[test]
    fn namesakes_with_different_emails_stay_apart() {
        let staff = |email: &str| StaffMember {
            name: "Juan García".into(),
            email: Some(email.into()),
            ..Default::default()
        };
        let merged = merge(
            vec![
                Partial::new(staff("jgarcia@example.org"), 0, "container"),
                Partial::new(staff("juan.garcia@example.org"), 1, "table"),
                Partial::new(staff("JGarcia@Example.org"), 1, "table"),
            ],
            ScalarConflict::default(),
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].record.email.as_deref(), Some("jgarcia@example.org"));
    }

    fn person(name: &str, email: Option<&str>, position: Option<&str>) -> StaffMember {
        StaffMember {
            name: name.into(),
            email: email.map(Into::into),
            position: position.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn row_without_email_joins_the_only_namesake() {
        let merged = merge(
            vec![
                Partial::new(person("Ana Pérez", Some("ana@example.org"), None), 0, "container"),
                Partial::new(person("Luis Gómez", None, Some("Technician")), 1, "table"),
                Partial::new(person("ana pérez", None, Some("Professor")), 1, "table"),
            ],
            ScalarConflict::default(),
        );
        assert_eq!(merged.len(), 2);
        let ana = &merged[0].record;
        assert_eq!(ana.name, "Ana Pérez");
        assert_eq!(ana.email.as_deref(), Some("ana@example.org"));
        assert_eq!(ana.position.as_deref(), Some("Professor"));
        assert_eq!(merged[0].strategy, "container");
        assert_eq!(merged[1].record.name, "Luis Gómez");
    }

    #[test]
    fn higher_priority_row_without_email_still_leads() {
        let merged = merge(
            vec![
                Partial::new(person("Ana Pérez", Some("ana@example.org"), Some("PhD")), 2, "text"),
                Partial::new(person("Ana Pérez", None, Some("Professor")), 0, "container"),
            ],
            ScalarConflict::default(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].strategy, "container");
        assert_eq!(merged[0].record.position.as_deref(), Some("Professor"));
        assert_eq!(merged[0].record.email.as_deref(), Some("ana@example.org"));
    }

    #[test]
    fn ambiguous_namesakes_keep_the_row_apart() {
        let merged = merge(
            vec![
                Partial::new(person("Juan García", Some("jg@example.org"), None), 0, "container"),
                Partial::new(person("Juan García", Some("juan@example.org"), None), 0, "container"),
                Partial::new(person("Juan García", None, Some("Professor")), 1, "table"),
            ],
            ScalarConflict::default(),
        );
        assert_eq!(merged.len(), 3);
        assert_eq!(merge(merged.clone(), ScalarConflict::default()), merged);
    }
}
