//! Request parsing: raw URL + host header into a normalized [`RequestDescriptor`]
//!
//! Parsing is lenient by policy. Only a URL that cannot be built at all is an
//! error; every enum-like query value that is missing or unrecognized falls
//! back to its default.

use std::fmt;

use log::info;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use url::Url;

use crate::{Error, Result};

/// Default CSS font size of the heading.
pub const DEFAULT_FONT_SIZE: &str = "96px";

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Png,
    Jpeg,
}

impl FileType {
    /// Match a (case-folded) extension; anything unknown yields `None`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(FileType::Png),
            "jpeg" => Some(FileType::Jpeg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Png => "png",
            FileType::Jpeg => "jpeg",
        }
    }

    /// MIME type handed to the transport layer.
    pub fn content_type(&self) -> &'static str {
        match self {
            FileType::Png => "image/png",
            FileType::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Card color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// `dark` in any case selects the dark theme; everything else is light.
    pub fn from_param(value: &str) -> Self {
        if value.eq_ignore_ascii_case("dark") {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Normalized description of one render request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    /// Percent-decoded heading text (not yet sanitized)
    pub text: String,
    pub file_type: FileType,
    pub theme: Theme,
    pub markdown_enabled: bool,
    /// Free-form CSS length taken from the caller
    pub font_size: String,
    /// Image URLs in request order
    pub images: Vec<String>,
    /// Widths by image position; may be shorter than `images`
    pub widths: Vec<String>,
    /// Heights by image position; may be shorter than `images`
    pub heights: Vec<String>,
}

impl RequestDescriptor {
    /// Descriptor for `text` with every other field at its default.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file_type: FileType::default(),
            theme: Theme::default(),
            markdown_enabled: false,
            font_size: DEFAULT_FONT_SIZE.to_string(),
            images: Vec::new(),
            widths: Vec::new(),
            heights: Vec::new(),
        }
    }

    /// Width for the image at `index`, if the caller supplied one.
    pub fn width_at(&self, index: usize) -> Option<&str> {
        self.widths.get(index).map(String::as_str)
    }

    /// Height for the image at `index`, if the caller supplied one.
    pub fn height_at(&self, index: usize) -> Option<&str> {
        self.heights.get(index).map(String::as_str)
    }
}

/// Parse a request path (with query) and host header into a descriptor.
///
/// Fails with [`Error::MalformedRequest`] only when `http://{host}{raw_url}`
/// is not a valid absolute URL.
///
/// ```
/// use og_image::request::{parse_request, FileType, Theme};
///
/// let d = parse_request("/a%2Bb.jpeg?theme=Dark&md=1", "localhost").unwrap();
/// assert_eq!(d.text, "a+b");
/// assert_eq!(d.file_type, FileType::Jpeg);
/// assert_eq!(d.theme, Theme::Dark);
/// assert!(d.markdown_enabled);
/// ```
pub fn parse_request(raw_url: &str, host: &str) -> Result<RequestDescriptor> {
    if raw_url.is_empty() {
        return Err(Error::MalformedRequest("request URL is empty".into()));
    }

    let absolute = format!("http://{}{}", host, raw_url);
    let url = Url::parse(&absolute)
        .map_err(|e| Error::MalformedRequest(format!("{}: {}", absolute, e)))?;

    info!("HTTP {}", raw_url);

    let mut font_size = None;
    let mut theme = None;
    let mut md = None;
    let mut images = Vec::new();
    let mut widths = Vec::new();
    let mut heights = Vec::new();

    // first occurrence wins for single-valued keys
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "fontSize" => set_once(&mut font_size, value.into_owned()),
            "theme" => set_once(&mut theme, value.into_owned()),
            "md" => set_once(&mut md, value.into_owned()),
            "images" => images.push(value.into_owned()),
            "widths" => widths.push(value.into_owned()),
            "heights" => heights.push(value.into_owned()),
            _ => {}
        }
    }

    let (raw_text, file_type) = split_path(url.path());

    Ok(RequestDescriptor {
        text: percent_decode_str(&raw_text).decode_utf8_lossy().into_owned(),
        file_type,
        theme: theme.as_deref().map(Theme::from_param).unwrap_or_default(),
        markdown_enabled: md.as_deref().is_some_and(parse_flag),
        font_size: font_size
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_FONT_SIZE.to_string()),
        images,
        widths,
        heights,
    })
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// `1` or `true` (any case) enable a flag; all other values disable it.
fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Split a URL path into still-encoded text and file type.
///
/// The last `.` segment is the extension candidate. An unrecognized
/// extension still selects PNG and is dropped from the text.
fn split_path(path: &str) -> (String, FileType) {
    let trimmed = path.trim_start_matches('/');
    let mut segments: Vec<&str> = trimmed.split('.').collect();

    let extension = if segments.len() > 1 {
        segments.pop().map(str::to_ascii_lowercase)
    } else {
        None
    };

    let file_type = extension
        .as_deref()
        .and_then(FileType::from_extension)
        .unwrap_or_default();

    (segments.join("."), file_type)
}
