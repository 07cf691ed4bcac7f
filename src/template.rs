//! Template composer: builds the self-contained HTML card from a descriptor
//!
//! Every caller-controlled value goes through [`sanitize_html`] before it is
//! placed in the document. The heading is processed as
//! sanitize -> markdown (optional) -> emoji, so generated tags are never
//! re-escaped.

use std::fmt::Write as _;
use std::sync::Arc;

use log::debug;
use sha2::{Digest, Sha256};

use crate::emoji::Emojifier;
use crate::fonts::FontAssets;
use crate::markdown;
use crate::request::{RequestDescriptor, Theme};
use crate::sanitize::sanitize_html;

pub const DEFAULT_IMAGE_WIDTH: &str = "auto";
pub const DEFAULT_IMAGE_HEIGHT: &str = "225";

/// Colors for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub foreground: &'static str,
    pub radial: &'static str,
}

pub const LIGHT: Palette = Palette {
    background: "white",
    foreground: "black",
    radial: "lightgray",
};

pub const DARK: Palette = Palette {
    background: "black",
    foreground: "white",
    radial: "dimgray",
};

impl Palette {
    pub fn for_theme(theme: Theme) -> Palette {
        match theme {
            Theme::Dark => DARK,
            Theme::Light => LIGHT,
        }
    }
}

/// A complete HTML document ready to hand to the rendering session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    html: String,
}

impl RenderedDocument {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    /// Hex SHA-256 of the document, stable across calls.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.html.as_bytes()))
    }
}

/// Composer settings
#[derive(Debug, Clone, Default)]
pub struct ComposerConfig {
    /// twemoji asset base; `None` uses [`crate::emoji::DEFAULT_EMOJI_BASE`]
    pub emoji_base: Option<String>,
}

/// Builds documents; cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Composer {
    fonts: Arc<FontAssets>,
    emojifier: Emojifier,
}

impl Composer {
    pub fn new(fonts: Arc<FontAssets>, config: ComposerConfig) -> Self {
        let emojifier = match config.emoji_base {
            Some(base) => Emojifier::new(base),
            None => Emojifier::default(),
        };
        Self { fonts, emojifier }
    }

    pub fn compose(&self, req: &RequestDescriptor) -> RenderedDocument {
        debug!("Composing card with images {:?}", req.images);

        let heading = self.heading(req);
        let css = self.css(Palette::for_theme(req.theme), &req.font_size);
        let image_section = if req.images.is_empty() {
            String::new()
        } else {
            image_section(req)
        };

        let html = format!(
            r#"<!DOCTYPE html>
<html lang="ko">
  <head>
    <meta charset="utf-8">
    <title>Generated Image</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
{css}
    </style>
  </head>
  <body>
    <div>
      <div class="spacer">
        {image_section}
        <div class="spacer"></div>
        <div class="heading">{heading}</div>
      </div>
    </div>
  </body>
</html>
"#
        );

        RenderedDocument { html }
    }

    fn heading(&self, req: &RequestDescriptor) -> String {
        let sanitized = sanitize_html(&req.text);
        let expanded = markdown::expand_if(req.markdown_enabled, &sanitized);
        self.emojifier.emojify(&expanded)
    }

    fn css(&self, palette: Palette, font_size: &str) -> String {
        format!(
            r#"      @font-face {{
        font-family: 'Pretendard';
        font-style: normal;
        font-weight: normal;
        src: url(data:font/woff2;charset=utf-8;base64,{regular}) format('woff2');
      }}

      @font-face {{
        font-family: 'Pretendard_Bold';
        font-style: normal;
        font-weight: bold;
        src: url(data:font/woff2;charset=utf-8;base64,{bold}) format('woff2');
      }}

      body {{
        background: {background};
        background-image: radial-gradient(circle at 25px 25px, {radial} 2%, transparent 0%),
                          radial-gradient(circle at 75px 75px, {radial} 2%, transparent 0%);
        background-size: 100px 100px;
        height: 100vh;
        display: flex;
        text-align: center;
        align-items: center;
        justify-content: center;
      }}

      code {{
        color: #D400FF;
        font-family: 'Pretendard', sans-serif;
        white-space: pre-wrap;
        letter-spacing: -5px;
      }}

      code::before, code::after {{
        content: '`';
      }}

      .logo-wrapper {{
        display: flex;
        align-items: center;
        justify-content: center;
      }}

      .logo {{
        margin: 0 75px;
      }}

      .plus {{
        color: #BBB;
        font-family: Times New Roman, Verdana;
        font-size: 100px;
      }}

      .spacer {{
        margin: 150px;
      }}

      .emoji {{
        height: 1em;
        width: 1em;
        margin: 0 0.05em 0 0.1em;
        vertical-align: -0.1em;
      }}

      .heading {{
        font-family: 'Pretendard_Bold', sans-serif;
        font-size: {font_size};
        font-style: normal;
        color: {foreground};
        line-height: 1.8;
      }}"#,
            regular = self.fonts.regular_base64(),
            bold = self.fonts.bold_base64(),
            background = palette.background,
            foreground = palette.foreground,
            radial = palette.radial,
            font_size = sanitize_html(font_size),
        )
    }
}

fn image_section(req: &RequestDescriptor) -> String {
    let mut row = String::from(r#"<div class="logo-wrapper">"#);
    for (i, src) in req.images.iter().enumerate() {
        if i != 0 {
            row.push_str(r#"<div class="plus">+</div>"#);
        }
        let width = req.width_at(i).unwrap_or(DEFAULT_IMAGE_WIDTH);
        let height = req.height_at(i).unwrap_or(DEFAULT_IMAGE_HEIGHT);
        let _ = write!(
            row,
            r#"<img class="logo" alt="Generated Image" src="{}" width="{}" height="{}" />"#,
            sanitize_html(src),
            sanitize_html(width),
            sanitize_html(height),
        );
    }
    row.push_str("</div>");
    row
}
