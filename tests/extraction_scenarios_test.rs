//! Fallback chain and strategy attribution scenarios.

use institute_scrape::page_extractor::news::{NewsContainerStrategy, NewsHeadingStrategy};
use institute_scrape::page_extractor::sections::LinkDensityStrategy;
use institute_scrape::page_extractor::staff::StaffTableStrategy;
use institute_scrape::page_extractor::{news, sections, staff};
use institute_scrape::{Extractor, FetchResult, NewsItem, Section, StaffMember};
use url::Url;

mod common;

use common::{BASE, create_test_html, staff_table};

fn base() -> Url {
    Url::parse(BASE).unwrap()
}

#[test]
fn test_three_row_staff_table_uses_table_strategy() {
    let html = create_test_html(
        "People",
        &staff_table(&[
            ("Ana Pérez", "ana@example.org", "+34 954 466 601"),
            ("Luis Gómez", "luis@example.org", "954 466 602"),
            ("Marta Ruiz", "marta@example.org", "954-466-603"),
        ]),
    );
    let page = FetchResult::new(format!("{BASE}en/people"), html);
    let members = staff::extractor()
        .extract_attributed(&page, &base())
        .unwrap();

    assert_eq!(members.len(), 3);
    assert!(members.iter().all(|p| p.strategy == "table"));
    let records: Vec<&StaffMember> = members.iter().map(|p| &p.record).collect();
    assert_eq!(
        records.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        vec!["Ana Pérez", "Luis Gómez", "Marta Ruiz"]
    );
    assert_eq!(
        records.iter().map(|m| m.phone.as_deref()).collect::<Vec<_>>(),
        vec![Some("+34954466601"), Some("954466602"), Some("954466603")]
    );
    for member in &records {
        assert!(member.email.is_some());
        assert_eq!(member.position, None);
        assert_eq!(member.department, None);
        assert_eq!(member.source_url, "https://inst.example.org/en/people");
    }
}

#[test]
fn test_staff_fallback_matches_table_strategy_alone() {
    let html = create_test_html(
        "People",
        &staff_table(&[
            ("Ana Pérez", "ana@example.org", "954 466 601"),
            ("Luis Gómez", "luis@example.org", "954 466 602"),
        ]),
    );
    let page = FetchResult::new(format!("{BASE}en/people"), html);
    let full: Vec<StaffMember> = staff::extractor().extract(&page, &base()).unwrap();
    let alone: Vec<StaffMember> = Extractor::new(vec![Box::new(StaffTableStrategy)])
        .extract(&page, &base())
        .unwrap();
    assert!(!full.is_empty());
    assert_eq!(full, alone);
}

#[test]
fn test_sections_fallback_matches_link_density_alone() {
    let html = create_test_html(
        "Home",
        r#"<div>
            <ul><li><a href="/a">A page</a></li></ul>
            <ul>
                <li><a href="/research">Research</a></li>
                <li><a href="/projects">Projects</a></li>
                <li><a href="/contact">Contact</a></li>
            </ul>
        </div>"#,
    );
    let page = FetchResult::new(BASE, html);
    let full: Vec<Section> = sections::extractor().extract(&page, &base()).unwrap();
    let alone: Vec<Section> = Extractor::new(vec![Box::new(LinkDensityStrategy)])
        .extract(&page, &base())
        .unwrap();
    assert_eq!(full.len(), 3);
    assert_eq!(full, alone);
}

#[test]
fn test_mixed_news_blocks_are_attributed_per_strategy() {
    let html = create_test_html(
        "News",
        r#"<main>
            <div class="blog">
                <div class="item">
                    <h2><a href="/news/1">New cleanroom opens</a></h2>
                    <span class="date">12/03/2024</span>
                    <p>The cleanroom opens next month.</p>
                </div>
            </div>
            <h3>Award for the analog group</h3>
            <p>5 March 2024</p>
            <p>The group received the best paper award.</p>
        </main>"#,
    );
    let page = FetchResult::new(format!("{BASE}en/news"), html);
    let items = news::extractor().extract_attributed(&page, &base()).unwrap();

    let got: Vec<(&str, &str)> = items
        .iter()
        .map(|p| (p.record.title.as_str(), p.strategy))
        .collect();
    assert_eq!(
        got,
        vec![
            ("New cleanroom opens", "container"),
            ("Award for the analog group", "heading"),
        ]
    );
    assert_eq!(items[1].record.date.as_deref(), Some("2024-03-05"));
}

#[test]
fn test_strategy_order_is_priority_order() {
    let extractor: Extractor<NewsItem> = Extractor::new(vec![
        Box::new(NewsHeadingStrategy),
        Box::new(NewsContainerStrategy::default()),
    ]);
    assert_eq!(extractor.strategy_names(), vec!["heading", "container"]);
    assert_eq!(
        news::extractor().strategy_names(),
        vec!["container", "heading", "text"]
    );
}

#[test]
fn test_card_and_table_row_for_one_person_merge() {
    let html = create_test_html(
        "People",
        r#"<main>
            <div class="person">
                <h3>Ana Pérez</h3>
                <a href="mailto:ana@example.org">email</a>
                <span class="phone">ext. n/a</span>
            </div>
            <table>
                <tr><th>Name</th><th>Position</th><th>Phone</th></tr>
                <tr><td>Ana Pérez</td><td>Professor</td><td>954 466 601</td></tr>
                <tr><td>Luis Gómez</td><td>Technician</td><td>954 466 602</td></tr>
            </table>
        </main>"#,
    );
    let page = FetchResult::new(format!("{BASE}en/people"), html);
    let members = staff::extractor()
        .extract_attributed(&page, &base())
        .unwrap();

    assert_eq!(members.len(), 2);
    let ana = &members[0];
    assert_eq!(ana.strategy, "container");
    assert_eq!(ana.record.name, "Ana Pérez");
    assert_eq!(ana.record.email.as_deref(), Some("ana@example.org"));
    assert_eq!(ana.record.position.as_deref(), Some("Professor"));
    assert_eq!(ana.record.phone.as_deref(), Some("954466601"));
    assert_eq!(members[1].record.name, "Luis Gómez");
    assert_eq!(members[1].strategy, "table");
}
