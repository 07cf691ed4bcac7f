//! Emoji substitution: replaces emoji sequences with twemoji `<img>` markup.
//!
//! Sequences are recognized the way UTS #51 composes them:
//! - single emoji-presentation characters (🚀)
//! - text-default symbols forced to emoji with VS16 (❤️)
//! - skin tone modifier sequences (👋🏽)
//! - ZWJ sequences (👨‍👩‍👧)
//! - regional indicator pairs (🇰🇷)
//! - keycaps (1️⃣) and tag sequences (🏴󠁧󠁢󠁳󠁣󠁴󠁿)
//!
//! Everything else, including lone text-default symbols such as `©`, passes
//! through unchanged.

use std::iter::Peekable;
use std::ops::Range;
use std::str::CharIndices;

/// twemoji SVG asset root used when no other base is configured.
pub const DEFAULT_EMOJI_BASE: &str = "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/svg/";

const ZWJ: char = '\u{200D}';
const VS16: char = '\u{FE0F}';
const VS15: char = '\u{FE0E}';
const KEYCAP: char = '\u{20E3}';
const BLACK_FLAG: char = '\u{1F3F4}';
const CANCEL_TAG: char = '\u{E007F}';

// Emoji_Presentation=Yes, excluding regional indicators (handled as pairs).
const PRESENTATION_RANGES: &[(u32, u32)] = &[
    (0x231A, 0x231B),
    (0x23E9, 0x23EC),
    (0x23F0, 0x23F0),
    (0x23F3, 0x23F3),
    (0x25FD, 0x25FE),
    (0x2614, 0x2615),
    (0x2648, 0x2653),
    (0x267F, 0x267F),
    (0x2693, 0x2693),
    (0x26A1, 0x26A1),
    (0x26AA, 0x26AB),
    (0x26BD, 0x26BE),
    (0x26C4, 0x26C5),
    (0x26CE, 0x26CE),
    (0x26D4, 0x26D4),
    (0x26EA, 0x26EA),
    (0x26F2, 0x26F3),
    (0x26F5, 0x26F5),
    (0x26FA, 0x26FA),
    (0x26FD, 0x26FD),
    (0x2705, 0x2705),
    (0x270A, 0x270B),
    (0x2728, 0x2728),
    (0x274C, 0x274C),
    (0x274E, 0x274E),
    (0x2753, 0x2755),
    (0x2757, 0x2757),
    (0x2795, 0x2797),
    (0x27B0, 0x27B0),
    (0x27BF, 0x27BF),
    (0x2B1B, 0x2B1C),
    (0x2B50, 0x2B50),
    (0x2B55, 0x2B55),
    (0x1F004, 0x1F004),
    (0x1F0CF, 0x1F0CF),
    (0x1F18E, 0x1F18E),
    (0x1F191, 0x1F19A),
    (0x1F201, 0x1F201),
    (0x1F21A, 0x1F21A),
    (0x1F22F, 0x1F22F),
    (0x1F232, 0x1F236),
    (0x1F238, 0x1F23A),
    (0x1F250, 0x1F251),
    (0x1F300, 0x1F320),
    (0x1F32D, 0x1F335),
    (0x1F337, 0x1F37C),
    (0x1F37E, 0x1F393),
    (0x1F3A0, 0x1F3CA),
    (0x1F3CF, 0x1F3D3),
    (0x1F3E0, 0x1F3F0),
    (0x1F3F4, 0x1F3F4),
    (0x1F3F8, 0x1F43E),
    (0x1F440, 0x1F440),
    (0x1F442, 0x1F4FC),
    (0x1F4FF, 0x1F53D),
    (0x1F54B, 0x1F54E),
    (0x1F550, 0x1F567),
    (0x1F57A, 0x1F57A),
    (0x1F595, 0x1F596),
    (0x1F5A4, 0x1F5A4),
    (0x1F5FB, 0x1F64F),
    (0x1F680, 0x1F6C5),
    (0x1F6CC, 0x1F6CC),
    (0x1F6D0, 0x1F6D2),
    (0x1F6D5, 0x1F6D7),
    (0x1F6DC, 0x1F6DF),
    (0x1F6EB, 0x1F6EC),
    (0x1F6F4, 0x1F6FC),
    (0x1F7E0, 0x1F7EB),
    (0x1F7F0, 0x1F7F0),
    (0x1F90C, 0x1F93A),
    (0x1F93C, 0x1F945),
    (0x1F947, 0x1F9FF),
    (0x1FA70, 0x1FA7C),
    (0x1FA80, 0x1FA89),
    (0x1FA8F, 0x1FAC6),
    (0x1FACE, 0x1FADC),
    (0x1FADF, 0x1FAE9),
    (0x1FAF0, 0x1FAF8),
];

// Symbols that render as text unless followed by VS16.
const TEXT_DEFAULT_RANGES: &[(u32, u32)] = &[
    (0x00A9, 0x00A9),
    (0x00AE, 0x00AE),
    (0x203C, 0x203C),
    (0x2049, 0x2049),
    (0x2122, 0x2122),
    (0x2139, 0x2139),
    (0x2194, 0x21AA),
    (0x2328, 0x2328),
    (0x23CF, 0x23FA),
    (0x24C2, 0x24C2),
    (0x25AA, 0x25FE),
    (0x2600, 0x27BF),
    (0x2934, 0x2935),
    (0x2B05, 0x2B55),
    (0x3030, 0x3030),
    (0x303D, 0x303D),
    (0x3297, 0x3297),
    (0x3299, 0x3299),
    (0x1F000, 0x1FAFF),
];

fn in_ranges(c: char, ranges: &[(u32, u32)]) -> bool {
    let cp = c as u32;
    ranges
        .binary_search_by(|&(lo, hi)| {
            if hi < cp {
                std::cmp::Ordering::Less
            } else if lo > cp {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

pub fn is_emoji_presentation(c: char) -> bool {
    !c.is_ascii() && in_ranges(c, PRESENTATION_RANGES)
}

pub fn is_text_default_emoji(c: char) -> bool {
    !c.is_ascii() && !is_emoji_presentation(c) && in_ranges(c, TEXT_DEFAULT_RANGES)
}

pub fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

pub fn is_skin_tone_modifier(c: char) -> bool {
    ('\u{1F3FB}'..='\u{1F3FF}').contains(&c)
}

fn is_keycap_base(c: char) -> bool {
    matches!(c, '0'..='9' | '*' | '#')
}

fn is_tag_character(c: char) -> bool {
    ('\u{E0020}'..='\u{E007F}').contains(&c)
}

type Chars<'a> = Peekable<CharIndices<'a>>;

fn peek_is(chars: &mut Chars<'_>, want: char) -> bool {
    chars.peek().is_some_and(|&(_, c)| c == want)
}

/// Byte ranges of every emoji sequence found in `text`, in order.
pub fn find_emoji(text: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    if text.is_ascii() {
        return found;
    }

    let mut chars = text.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        let end = if is_keycap_base(ch) {
            parse_keycap(&mut chars)
        } else if is_regional_indicator(ch) {
            Some(parse_flag(&mut chars, start + ch.len_utf8()))
        } else if ch == BLACK_FLAG {
            Some(parse_tags(&mut chars, start + ch.len_utf8()))
        } else if is_emoji_presentation(ch) {
            Some(parse_continuations(&mut chars, start + ch.len_utf8()))
        } else if is_text_default_emoji(ch) && peek_is(&mut chars, VS16) {
            Some(parse_continuations(&mut chars, start + ch.len_utf8()))
        } else {
            None
        };

        if let Some(end) = end {
            found.push(start..end);
        }
    }
    found
}

/// `#`, `*` or a digit, an optional VS16, then U+20E3.
fn parse_keycap(chars: &mut Chars<'_>) -> Option<usize> {
    let mut probe = chars.clone();
    if peek_is(&mut probe, VS16) {
        probe.next();
    }
    match probe.next() {
        Some((idx, KEYCAP)) => {
            *chars = probe;
            Some(idx + KEYCAP.len_utf8())
        }
        _ => None,
    }
}

/// A lone regional indicator is still drawn as an emoji letter.
fn parse_flag(chars: &mut Chars<'_>, end: usize) -> usize {
    match chars.peek() {
        Some(&(idx, c)) if is_regional_indicator(c) => {
            chars.next();
            idx + c.len_utf8()
        }
        _ => end,
    }
}

fn parse_tags(chars: &mut Chars<'_>, mut end: usize) -> usize {
    while let Some(&(idx, c)) = chars.peek() {
        if !is_tag_character(c) {
            break;
        }
        chars.next();
        end = idx + c.len_utf8();
        if c == CANCEL_TAG {
            return end;
        }
    }
    parse_continuations(chars, end)
}

/// Extend a base emoji with VS16, skin tones and ZWJ-joined emoji.
fn parse_continuations(chars: &mut Chars<'_>, mut end: usize) -> usize {
    while let Some(&(idx, c)) = chars.peek() {
        if c == VS16 || is_skin_tone_modifier(c) {
            chars.next();
            end = idx + c.len_utf8();
            continue;
        }
        if c == ZWJ {
            let mut probe = chars.clone();
            probe.next();
            match probe.peek() {
                Some(&(next_idx, next)) if is_emoji_presentation(next) || is_text_default_emoji(next) => {
                    probe.next();
                    *chars = probe;
                    end = next_idx + next.len_utf8();
                    continue;
                }
                _ => break,
            }
        }
        break;
    }
    end
}

/// twemoji file stem for a sequence: lowercase hex code points joined by `-`.
/// VS16 is dropped unless the sequence contains a ZWJ.
///
/// ```
/// use og_image::emoji::code_point_name;
///
/// assert_eq!(code_point_name("❤\u{FE0F}"), "2764");
/// assert_eq!(code_point_name("1\u{FE0F}\u{20E3}"), "31-20e3");
/// ```
pub fn code_point_name(sequence: &str) -> String {
    let keep_vs16 = sequence.contains(ZWJ);
    sequence
        .chars()
        .filter(|&c| keep_vs16 || (c != VS16 && c != VS15))
        .map(|c| format!("{:x}", c as u32))
        .collect::<Vec<_>>()
        .join("-")
}

/// Replaces emoji with inline `<img class="emoji">` references.
#[derive(Debug, Clone)]
pub struct Emojifier {
    base_url: String,
}

impl Default for Emojifier {
    fn default() -> Self {
        Self::new(DEFAULT_EMOJI_BASE)
    }
}

impl Emojifier {
    /// `base_url` is the folder holding `<codepoints>.svg` files.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn emojify(&self, text: &str) -> String {
        let spans = find_emoji(text);
        if spans.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len() + spans.len() * 96);
        let mut cursor = 0;
        for span in spans {
            out.push_str(&text[cursor..span.start]);
            let raw = &text[span.clone()];
            out.push_str(&format!(
                r#"<img class="emoji" draggable="false" alt="{}" src="{}{}.svg"/>"#,
                raw,
                self.base_url,
                code_point_name(raw)
            ));
            cursor = span.end;
        }
        out.push_str(&text[cursor..]);
        out
    }
}

/// [`Emojifier::emojify`] with the default twemoji base.
pub fn emojify(text: &str) -> String {
    Emojifier::default().emojify(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(text: &str) -> Vec<&str> {
        find_emoji(text).into_iter().map(|r| &text[r]).collect()
    }

    #[test]
    fn tables_are_sorted() {
        for table in [PRESENTATION_RANGES, TEXT_DEFAULT_RANGES] {
            for pair in table.windows(2) {
                assert!(pair[0].1 < pair[1].0, "{:x?} overlaps {:x?}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn finds_single_emoji() {
        assert_eq!(spans("Hello 🚀 World"), vec!["🚀"]);
    }

    #[test]
    fn ascii_and_plain_symbols_pass_through() {
        assert!(spans("Hello 123 #tag *star*").is_empty());
        assert!(spans("© 2024 ❤ 한국어").is_empty());
        assert_eq!(emojify("© 한국어"), "© 한국어");
    }

    #[test]
    fn text_default_symbol_needs_vs16() {
        assert_eq!(spans("I ❤\u{FE0F} Rust"), vec!["❤\u{FE0F}"]);
    }

    #[test]
    fn modifier_and_zwj_sequences_stay_together() {
        assert_eq!(spans("👋🏽"), vec!["👋🏽"]);
        assert_eq!(spans("👨\u{200D}👩\u{200D}👧"), vec!["👨\u{200D}👩\u{200D}👧"]);
        assert_eq!(
            spans("🏃\u{200D}♀\u{FE0F}!"),
            vec!["🏃\u{200D}♀\u{FE0F}"]
        );
    }

    #[test]
    fn flags_and_keycaps() {
        assert_eq!(spans("🇰🇷🇺🇸"), vec!["🇰🇷", "🇺🇸"]);
        assert_eq!(spans("1\u{FE0F}\u{20E3} go"), vec!["1\u{FE0F}\u{20E3}"]);
    }

    #[test]
    fn code_points_follow_twemoji_naming() {
        assert_eq!(code_point_name("🚀"), "1f680");
        assert_eq!(code_point_name("👋🏽"), "1f44b-1f3fd");
        assert_eq!(code_point_name("🇰🇷"), "1f1f0-1f1f7");
        assert_eq!(
            code_point_name("🏃\u{200D}♀\u{FE0F}"),
            "1f3c3-200d-2640-fe0f"
        );
    }

    #[test]
    fn emojify_replaces_only_emoji() {
        let out = Emojifier::new("https://cdn.test/svg").emojify("<b>hi 🚀</b>");
        assert_eq!(
            out,
            r#"<b>hi <img class="emoji" draggable="false" alt="🚀" src="https://cdn.test/svg/1f680.svg"/></b>"#
        );
    }

    #[test]
    fn text_without_emoji_is_returned_verbatim() {
        let text = "&lt;b&gt; plain &amp; simple";
        assert_eq!(emojify(text), text);
    }
}
