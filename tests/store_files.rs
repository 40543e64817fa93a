// tests/store_files.rs
use chrono::Utc;
use news_digest_bot::feed::types::Article;
use news_digest_bot::store::{Store, SummaryRecord, UserPreference};

fn scratch_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::new(dir.path());
    (dir, store)
}

#[test]
fn missing_files_yield_empty_defaults() {
    let (_dir, store) = scratch_store();
    assert!(store.load_articles().articles.is_empty());
    assert!(store.load_summaries().summaries.is_empty());
    assert!(store.load_users().users.is_empty());
}

#[test]
fn corrupt_document_yields_default_instead_of_error() {
    let (dir, store) = scratch_store();
    std::fs::write(dir.path().join("articles.json"), "{ not json").expect("write");
    assert!(store.load_articles().articles.is_empty());
}

#[test]
fn articles_round_trip_with_metadata() {
    let (_dir, store) = scratch_store();
    let mut a = Article::new("Round trip headline", "https://example.com/rt", "Feed");
    a.category = Some("technology".to_string());
    a.relevance = 0.4;
    a.key_points = vec!["one".to_string(), "two".to_string()];

    store.save_articles(vec![a.clone()]).expect("save");
    let doc = store.load_articles();
    assert_eq!(doc.articles, vec![a]);
    assert_eq!(doc.total_articles, 1);
    assert!(doc.last_updated.is_some());
}

#[test]
fn summaries_round_trip() {
    let (_dir, store) = scratch_store();
    let record = SummaryRecord {
        article_id: "abc".to_string(),
        summary: "A short summary.".to_string(),
        generated_at: Utc::now(),
        model: "test-model".to_string(),
        word_count: 3,
    };
    let mut map = std::collections::BTreeMap::new();
    map.insert(record.article_id.clone(), record.clone());

    store.save_summaries(map).expect("save");
    let loaded = store.load_summaries();
    assert_eq!(loaded.summaries.get("abc"), Some(&record));
    assert_eq!(loaded.total_summaries, 1);
}

#[test]
fn unknown_user_gets_lazy_defaults() {
    let (_dir, store) = scratch_store();
    let prefs = store.load_user(42);
    assert_eq!(prefs.preferred_category, "technology");
    assert_eq!(prefs.max_articles, 5);
    assert_eq!(prefs.articles_read, 0);
    assert!(prefs.saved_articles.is_empty());
}

#[test]
fn save_user_is_read_modify_write() {
    let (_dir, store) = scratch_store();

    let mut alice = UserPreference::default();
    alice.preferred_category = "science".to_string();
    store.save_user(1, alice).expect("save alice");

    let mut bob = UserPreference::default();
    bob.articles_read = 7;
    store.save_user(2, bob).expect("save bob");

    // saving bob must not clobber alice
    assert_eq!(store.load_user(1).preferred_category, "science");
    assert_eq!(store.load_user(2).articles_read, 7);
    assert_eq!(store.load_users().total_users, 2);
}

#[test]
fn no_tmp_files_left_behind() {
    let (dir, store) = scratch_store();
    store.save_articles(Vec::new()).expect("save");
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
