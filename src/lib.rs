//! og-image
//!
//! Turns a URL-encoded description of a short heading (optionally Markdown,
//! optionally decorated with images and emoji) into a PNG or JPEG social
//! preview card.
//!
//! The work happens in two halves:
//!
//! - **Templating** (pure, synchronous): [`request::parse_request`] builds a
//!   [`RequestDescriptor`], and [`template::Composer`] turns it into a
//!   self-contained HTML document.
//! - **Rendering**: a [`session::RenderSession`] owns one headless browser
//!   and one page, loads the document and captures a screenshot. The
//!   [`async_api::Renderer`] puts the session behind a request queue so
//!   renders never interleave on the shared page.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use og_image::fonts::FontAssets;
//! use og_image::template::{Composer, ComposerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fonts = FontAssets::global(std::path::Path::new("assets/fonts"))?;
//! let composer = Composer::new(fonts, ComposerConfig::default());
//!
//! let req = og_image::parse_request("/**Hello** 👋.png?md=1&theme=dark", "localhost")?;
//! let doc = composer.compose(&req);
//! println!("{}", doc.fingerprint());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod emoji;
pub mod fonts;
pub mod markdown;
pub mod request;
pub mod sanitize;
pub mod template;

pub mod session;

#[cfg(feature = "cdp")]
pub mod cdp;

// Browser-less backend for tests and dry runs
pub mod noop;

// Worker-thread render queue with an async facade
pub mod async_api;

pub mod config;
pub mod pipeline;
pub mod server;

pub use async_api::Renderer;
pub use pipeline::{Pipeline, PipelineOutput, RenderedImage};
pub use request::{parse_request, FileType, RequestDescriptor, Theme};
pub use template::{Composer, RenderedDocument};

/// Configuration for the rendering session
///
/// Defaults match the card format: a 2048×1170 viewport, JPEG quality 80, a
/// 30 second bound on load + capture and a 500ms network quiet period.
///
/// # Examples
///
/// ```
/// let cfg = og_image::SessionConfig::default();
/// assert_eq!(cfg.viewport.width, 2048);
/// assert_eq!(cfg.jpeg_quality, 80);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Viewport dimensions applied before every render
    pub viewport: Viewport,
    /// Timeout for loading the document and capturing it, in milliseconds
    pub timeout_ms: u64,
    /// Network quiet period required before capture, in milliseconds
    pub settle_ms: u64,
    /// Quality used for JPEG captures (1-100)
    pub jpeg_quality: u32,
    /// How to start the browser
    pub launch: LaunchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            timeout_ms: 30000,
            settle_ms: 500,
            jpeg_quality: 80,
            launch: LaunchConfig::default(),
        }
    }
}

/// Browser launch options supplied by the environment
#[derive(Debug, Clone)]
pub struct LaunchConfig {
    /// Chrome/Chromium executable; `None` lets the backend search for one
    pub chrome_path: Option<PathBuf>,
    /// Run Chrome with its sandbox (disable inside some containers)
    pub sandbox: bool,
    pub headless: bool,
    /// Close the browser connection after this much inactivity
    pub idle_timeout_ms: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            sandbox: true,
            headless: true,
            // long-lived server: effectively never idle out
            idle_timeout_ms: 24 * 60 * 60 * 1000,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 2048,
            height: 1170,
        }
    }
}
