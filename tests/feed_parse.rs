// tests/feed_parse.rs
use news_digest_bot::config::FeedSource;
use news_digest_bot::feed::parser::parse_feed;

fn source(name: &str) -> FeedSource {
    FeedSource {
        name: name.to_string(),
        url: "https://example.com/feed".to_string(),
        category: "technology".to_string(),
        enabled: true,
    }
}

#[test]
fn rss_entry_without_link_is_dropped() {
    let xml = include_str!("fixtures/feed_rss.xml");
    let articles = parse_feed(&source("Example Tech Feed"), xml).expect("rss parse");

    // three items in the fixture, one has no link
    assert_eq!(articles.len(), 2);
    assert!(articles.iter().all(|a| !a.link.is_empty() && !a.title.is_empty()));
    assert!(articles.iter().all(|a| a.source == "Example Tech Feed"));
}

#[test]
fn rss_fields_are_normalized() {
    let xml = include_str!("fixtures/feed_rss.xml");
    let articles = parse_feed(&source("Feed"), xml).expect("rss parse");

    let dated = &articles[0];
    assert_eq!(dated.link, "https://example.com/articles/ml-software");
    assert_eq!(dated.author.as_deref(), Some("Jamie Reporter"));
    let ts = dated.published_at.expect("pubDate parsed");
    assert_eq!(ts.to_rfc3339(), "2025-08-04T10:00:00+00:00");

    let undated = &articles[1];
    assert!(undated.published_at.is_none());
    assert_eq!(undated.published_key(), "");
}

#[test]
fn rss_ids_are_stable_across_refetches() {
    let xml = include_str!("fixtures/feed_rss.xml");
    let first = parse_feed(&source("Feed"), xml).expect("parse");
    let second = parse_feed(&source("Feed"), xml).expect("parse");
    assert_eq!(first[0].id, second[0].id);
}

#[test]
fn atom_feed_parses_with_published_or_updated() {
    let xml = include_str!("fixtures/feed_atom.xml");
    let articles = parse_feed(&source("Atom Feed"), xml).expect("atom parse");

    assert_eq!(articles.len(), 2);
    assert_eq!(
        articles[0].published_at.expect("published").to_rfc3339(),
        "2025-08-04T09:30:00+00:00"
    );
    // second entry has no <published>; falls back to <updated>
    assert_eq!(
        articles[1].published_at.expect("updated").to_rfc3339(),
        "2025-08-03T08:00:00+00:00"
    );
    assert_eq!(articles[0].author.as_deref(), Some("Alex Writer"));
}

#[test]
fn garbage_is_an_error_not_a_panic() {
    assert!(parse_feed(&source("Bad"), "this is not xml at all").is_err());
}
