// tests/ingest_normalize.rs
use post_impact_monitor::ingest::{normalize_text, MAX_TEXT_CHARS};

#[test]
fn empty_is_ok() {
    assert_eq!(normalize_text(""), "");
}

#[test]
fn strips_html_and_unescapes() {
    let s = "<p>Hello&nbsp;<b>world</b> &ldquo;ok&rdquo; &amp; more</p>";
    let n = normalize_text(s);
    assert_eq!(n, "Hello world \u{201C}ok\u{201D} & more");
}

#[test]
fn line_breaks_become_spaces() {
    let s = "Line one<br>Line two<br/>Line three";
    assert_eq!(normalize_text(s), "Line one Line two Line three");
}

#[test]
fn folds_whitespace_and_nbsp() {
    let s = "A\u{00A0}\n\tB   C";
    assert_eq!(normalize_text(s), "A B C");
}

#[test]
fn length_cap_applies() {
    let s = "x".repeat(MAX_TEXT_CHARS + 500);
    let n = normalize_text(&s);
    assert_eq!(n.chars().count(), MAX_TEXT_CHARS);
}

#[test]
fn cleaning_clean_text_changes_nothing() {
    let samples = [
        "",
        "plain words",
        "THE DOW IS UP 2,000 POINTS!!! $SPY",
        "rates < 5% > 3%",
        "ünïcödé “quotes” and emoji 🚀",
        "https://example.com/path?a=1&b=2",
    ];
    for s in samples {
        let once = normalize_text(s);
        assert_eq!(normalize_text(&once), once, "not idempotent for {s:?}");
    }
}

#[test]
fn cleaning_twice_equals_cleaning_once_for_markup() {
    let html = r#"<p><span class="h-card"><a href="https://x.test/@a" class="u-url mention">@<span>someone</span></a></span> Big news for <a href="https://x.test/tags/oil">#oil</a></p><p>Stay tuned</p>"#;
    let once = normalize_text(html);
    assert_eq!(once, "@someone Big news for #oil Stay tuned");
    assert_eq!(normalize_text(&once), once);
}
