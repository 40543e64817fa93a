// src/feed/mod.rs
pub mod fetcher;
pub mod parser;
pub mod types;

/// Normalize feed text: decode HTML entities, strip tags, collapse
/// whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize curly quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 2000 chars
    if out.chars().count() > 2000 {
        out = out.chars().take(2000).collect();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_tags_and_entities() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b></p>  ";
        assert_eq!(normalize_text(s), "Hello, world");
    }

    #[test]
    fn normalize_caps_length() {
        let s = "x".repeat(5000);
        assert_eq!(normalize_text(&s).chars().count(), 2000);
    }
}
