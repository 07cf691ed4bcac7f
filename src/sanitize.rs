//! HTML escaping for untrusted request fragments

/// Escape `raw` so it can be placed in an HTML text node or a quoted
/// attribute value without leaving that context.
///
/// ```
/// use og_image::sanitize::sanitize_html;
///
/// assert_eq!(sanitize_html("<b>\"hi\"</b>"), "&lt;b&gt;&quot;hi&quot;&lt;&#x2F;b&gt;");
/// ```
pub fn sanitize_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_markup_characters() {
        let out = sanitize_html(r#"<script>alert('x' & "y")</script>"#);
        for bad in ['<', '>', '"', '\''] {
            assert!(!out.contains(bad), "{bad} survived in {out}");
        }
        // every remaining '&' starts an entity
        for (i, _) in out.match_indices('&') {
            let rest = &out[i..];
            assert!(rest.find(';').is_some_and(|end| end <= 6), "bare & in {out}");
        }
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(sanitize_html("Hello, world! 96px"), "Hello, world! 96px");
    }

    #[test]
    fn double_escaping_only_reencodes_ampersands() {
        let once = sanitize_html("a<b");
        assert_eq!(once, "a&lt;b");
        assert_eq!(sanitize_html(&once), "a&amp;lt;b");
    }

    #[test]
    fn attribute_breakout_is_neutralized() {
        let out = sanitize_html(r#"x" onerror="alert(1)"#);
        assert!(!out.contains('"'));
        assert!(out.starts_with("x&quot; onerror=&quot;"));
    }
}
