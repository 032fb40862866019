// tests/ingest_normalize.rs
use finsight::ingest::normalize::{parse_published, strip_markup};

#[test]
fn empty_is_ok() {
    assert_eq!(strip_markup(""), "");
}

#[test]
fn strips_html_and_unescapes() {
    let s = "<p>Hello&nbsp;<b>world</b> &ldquo;ok&rdquo;</p>";
    assert_eq!(strip_markup(s), "Hello world \u{201C}ok\u{201D}");
}

#[test]
fn escaped_tags_are_stripped_too() {
    let s = "&lt;a href=&quot;x&quot;&gt;Nifty&lt;/a&gt; slips";
    assert_eq!(strip_markup(s), "Nifty slips");
}

#[test]
fn folds_whitespace_and_nbsp() {
    let s = "A\u{00A0}\n\tB   C";
    assert_eq!(strip_markup(s), "A B C");
}

#[test]
fn offsets_are_converted_to_utc() {
    let a = parse_published("Tue, 02 Jan 2024 11:15:00 +0530").unwrap();
    let b = parse_published("2024-01-02T05:45:00Z").unwrap();
    assert_eq!(a, b);
}
