// tests/presenter_chunking.rs
use news_digest_bot::bot::presenter::{chunk_message, MAX_MESSAGE_CHARS};

#[test]
fn short_text_is_a_single_chunk() {
    let chunks = chunk_message("hello world", 100);
    assert_eq!(chunks, vec!["hello world"]);
}

#[test]
fn no_chunk_exceeds_the_limit() {
    let paragraphs: Vec<String> = (0..40)
        .map(|i| format!("Paragraph {i} with a little bit of body text to pack."))
        .collect();
    let text = paragraphs.join("\n\n");

    for limit in [40, 64, 100, 333, MAX_MESSAGE_CHARS] {
        for chunk in chunk_message(&text, limit) {
            assert!(
                chunk.chars().count() <= limit,
                "chunk of {} chars exceeds limit {limit}",
                chunk.chars().count()
            );
        }
    }
}

#[test]
fn paragraph_splits_round_trip() {
    let paragraphs: Vec<String> = (0..12)
        .map(|i| format!("Paragraph number {i} carrying some payload."))
        .collect();
    let text = paragraphs.join("\n\n");

    // a limit big enough that no single paragraph needs a hard split:
    // every boundary is a paragraph boundary, so rejoining with the
    // separator reproduces the input
    let chunks = chunk_message(&text, 120);
    assert!(chunks.len() > 1);
    assert_eq!(chunks.join("\n\n"), text);
}

#[test]
fn hard_split_round_trips_by_concatenation() {
    let text = "abcdefghij".repeat(10); // one 100-char paragraph
    let chunks = chunk_message(&text, 30);
    assert_eq!(chunks.concat(), text);
    assert!(chunks.iter().all(|c| c.chars().count() <= 30));
}

#[test]
fn order_is_preserved() {
    let text = "first\n\nsecond\n\nthird\n\nfourth";
    let chunks = chunk_message(text, 14);
    let joined = chunks.join("\n\n");
    let f = joined.find("first").unwrap();
    let s = joined.find("second").unwrap();
    let t = joined.find("third").unwrap();
    let q = joined.find("fourth").unwrap();
    assert!(f < s && s < t && t < q);
}

#[test]
fn multibyte_text_is_split_on_char_boundaries() {
    let text = "héllo wörld ünïcode çhäracters".repeat(5);
    let chunks = chunk_message(&text, 10);
    assert_eq!(chunks.concat(), text);
    assert!(chunks.iter().all(|c| c.chars().count() <= 10));
}

#[test]
fn empty_input_gives_no_chunks() {
    assert!(chunk_message("", 10).is_empty());
}
