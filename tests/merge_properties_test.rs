//! Property tests for the record merger.

use std::collections::HashSet;

use institute_scrape::page_extractor::{Partial, merge};
use institute_scrape::{NewsItem, Record, ScalarConflict, StaffMember};
use proptest::prelude::*;

const STRATEGIES: &[&str] = &["container", "heading", "text"];

fn policy() -> impl Strategy<Value = ScalarConflict> {
    prop_oneof![
        Just(ScalarConflict::PreferHigherPriority),
        Just(ScalarConflict::PreferLonger),
    ]
}

fn news_partial() -> impl Strategy<Value = Partial<NewsItem>> {
    (
        prop::sample::select(vec!["Open day", "open  DAY", "Award", "New lab", ""]),
        prop::option::of("[a-z ]{0,12}"),
        "[a-z ]{0,20}",
        0..STRATEGIES.len(),
    )
        .prop_map(|(title, date_text, content, priority)| {
            Partial::new(
                NewsItem {
                    title: title.to_string(),
                    date_text,
                    content,
                    ..NewsItem::default()
                },
                priority,
                STRATEGIES[priority],
            )
        })
}

fn staff_partial() -> impl Strategy<Value = Partial<StaffMember>> {
    (
        prop::sample::select(vec!["Ana Pérez", "ana pérez", "Luis Gómez"]),
        prop::option::of(prop::sample::select(vec![
            "ana@example.org",
            "ANA@example.org",
            "luis@example.org",
        ])),
        prop::option::of("[A-Za-z ]{1,10}"),
        0..STRATEGIES.len(),
    )
        .prop_map(|(name, email, position, priority)| {
            Partial::new(
                StaffMember {
                    name: name.to_string(),
                    email: email.map(str::to_string),
                    position,
                    ..StaffMember::default()
                },
                priority,
                STRATEGIES[priority],
            )
        })
}

fn keys<R: Record>(merged: &[Partial<R>]) -> Vec<Option<String>> {
    merged.iter().map(|p| p.record.identity_key()).collect()
}

proptest! {
    #[test]
    fn news_merge_is_idempotent(
        partials in prop::collection::vec(news_partial(), 0..12),
        policy in policy(),
    ) {
        let once = merge(partials, policy);
        let twice = merge(once.clone(), policy);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn news_merge_keys_are_unique(
        partials in prop::collection::vec(news_partial(), 0..12),
        policy in policy(),
    ) {
        let merged = merge(partials, policy);
        let keys = keys(&merged);
        prop_assert!(keys.iter().all(Option::is_some));
        let distinct: HashSet<_> = keys.iter().collect();
        prop_assert_eq!(distinct.len(), keys.len());
    }

    #[test]
    fn staff_merge_keys_are_unique_and_stable(
        partials in prop::collection::vec(staff_partial(), 0..12),
        policy in policy(),
    ) {
        let merged = merge(partials, policy);
        let keys = keys(&merged);
        let distinct: HashSet<_> = keys.iter().collect();
        prop_assert_eq!(distinct.len(), keys.len());
        prop_assert_eq!(merge(merged.clone(), policy), merged);
    }

    #[test]
    fn merged_record_keeps_best_priority(
        partials in prop::collection::vec(news_partial(), 1..12),
    ) {
        let merged = merge(partials.clone(), ScalarConflict::PreferHigherPriority);
        for survivor in &merged {
            let key = survivor.record.identity_key();
            let best = partials
                .iter()
                .filter(|p| p.record.identity_key() == key)
                .map(|p| p.priority)
                .min();
            prop_assert_eq!(Some(survivor.priority), best);
            prop_assert_eq!(survivor.strategy, STRATEGIES[survivor.priority]);
        }
    }
}
