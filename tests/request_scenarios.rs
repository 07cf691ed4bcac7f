//! End-to-end templating scenarios through the public API

use std::sync::Arc;

use og_image::fonts::FontAssets;
use og_image::template::{Composer, ComposerConfig};
use og_image::{parse_request, FileType, RequestDescriptor, Theme};

fn composer() -> Composer {
    Composer::new(
        Arc::new(FontAssets::from_bytes(b"regular-font", b"bold-font")),
        ComposerConfig::default(),
    )
}

#[test]
fn hello_png_without_query() {
    let d = parse_request("/Hello.png", "localhost").unwrap();
    assert_eq!(d.text, "Hello");
    assert_eq!(d.file_type, FileType::Png);
    assert_eq!(d.theme, Theme::Light);
    assert!(!d.markdown_enabled);
    assert_eq!(d.font_size, "96px");
    assert!(d.images.is_empty());
}

#[test]
fn encoded_plus_with_dark_markdown_jpeg() {
    let d = parse_request("/a%2Bb.jpeg?theme=Dark&md=1", "example.com").unwrap();
    assert_eq!(d.text, "a+b");
    assert_eq!(d.file_type, FileType::Jpeg);
    assert_eq!(d.theme, Theme::Dark);
    assert!(d.markdown_enabled);
}

#[test]
fn path_without_extension() {
    let d = parse_request("/plain-text", "localhost").unwrap();
    assert_eq!(d.file_type, FileType::Png);
    assert_eq!(d.text, "plain-text");
}

#[test]
fn two_images_one_width() {
    let d = parse_request("/x.png?images=a&images=b&widths=10", "localhost").unwrap();
    let html = composer().compose(&d);
    let body = html.as_str();

    assert_eq!(body.matches(r#"<img class="logo""#).count(), 2);
    assert!(body.contains(r#"src="a" width="10" height="225""#));
    assert!(body.contains(r#"src="b" width="auto" height="225""#));
}

#[test]
fn enums_are_always_valid_for_odd_input() {
    let urls = [
        "/.png",
        "/...",
        "/x.PnG?theme=",
        "/x.webp?theme=DARKER&md=2",
        "/%E0%A4%A.jpeg",
        "/?images=&widths=&heights=",
        "/a.b.c.d",
    ];
    for url in urls {
        let d = parse_request(url, "localhost").unwrap_or_else(|e| panic!("{url}: {e}"));
        assert!(matches!(d.file_type, FileType::Png | FileType::Jpeg));
        assert!(matches!(d.theme, Theme::Light | Theme::Dark));
    }
}

#[test]
fn injected_markup_never_reaches_the_document() {
    let d = parse_request(
        "/%3Cimg%20src%3Dx%20onerror%3Dalert(1)%3E.png?md=1&fontSize=%3C%2Fstyle%3E&images=%22%3E%3Cscript%3E",
        "localhost",
    )
    .unwrap();
    let html = composer().compose(&d);
    let body = html.as_str();

    assert!(!body.contains("<img src=x"));
    assert!(!body.contains("<script>"));
    assert_eq!(body.matches("</style>").count(), 1);
}

#[test]
fn compose_is_byte_identical_across_calls() {
    let mut d = RequestDescriptor::new("**Ship it** 🚀");
    d.markdown_enabled = true;
    d.theme = Theme::Dark;
    d.images = vec!["https://example.com/logo.svg".into(), "https://example.com/b.png".into()];
    d.heights = vec!["100".into()];

    let c = composer();
    let first = c.compose(&d);
    for _ in 0..3 {
        assert_eq!(c.compose(&d).fingerprint(), first.fingerprint());
    }
    // a second composer over the same fonts produces the same bytes
    assert_eq!(composer().compose(&d), first);
}
