//! A deliberately tiny inline Markdown subset: bold and italic only.
//!
//! The input is expected to be sanitized already, so the generated `<b>` and
//! `<i>` tags are the only markup in the output.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD_STARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid markdown pattern"));
static BOLD_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__(.+?)__").expect("valid markdown pattern"));
static ITALIC_STAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*(.+?)\*").expect("valid markdown pattern"));
static ITALIC_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(.+?)_").expect("valid markdown pattern"));

/// Expand `**X**`, `__X__` into `<b>X</b>` and `*X*`, `_X_` into `<i>X</i>`.
///
/// The four substitutions run in that order, each taking the shortest span.
///
/// ```
/// use og_image::markdown::expand;
///
/// assert_eq!(expand("**Hello** _world_"), "<b>Hello</b> <i>world</i>");
/// ```
pub fn expand(sanitized: &str) -> String {
    let text = BOLD_STARS.replace_all(sanitized, "<b>$1</b>");
    let text = BOLD_UNDERSCORES.replace_all(&text, "<b>$1</b>");
    let text = ITALIC_STAR.replace_all(&text, "<i>$1</i>");
    ITALIC_UNDERSCORE.replace_all(&text, "<i>$1</i>").into_owned()
}

/// Apply [`expand`] only when markdown was requested.
pub fn expand_if(enabled: bool, sanitized: &str) -> String {
    if enabled {
        expand(sanitized)
    } else {
        sanitized.to_string()
    }
}
