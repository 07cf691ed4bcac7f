//! Embedded font assets
//!
//! The browser that rasterizes the card cannot see the server's filesystem,
//! so both weights are shipped inside the document as base64 data URLs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as Base64Engine;
use log::info;
use once_cell::sync::OnceCell;

use crate::{Error, Result};

/// Registered as the normal-weight `Pretendard` face; cards use the heavier cut.
pub const REGULAR_FILE: &str = "Pretendard_ExtraBold.woff2";
pub const BOLD_FILE: &str = "Pretendard_Bold.woff2";

static GLOBAL_FONTS: OnceCell<Arc<FontAssets>> = OnceCell::new();

/// Regular and bold woff2 blobs, base64-encoded once at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAssets {
    regular_b64: String,
    bold_b64: String,
}

impl FontAssets {
    pub fn from_bytes(regular: &[u8], bold: &[u8]) -> Self {
        let b64 = &base64::engine::general_purpose::STANDARD;
        Self {
            regular_b64: b64.encode(regular),
            bold_b64: b64.encode(bold),
        }
    }

    /// Read [`REGULAR_FILE`] and [`BOLD_FILE`] from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let regular = read_font(dir.join(REGULAR_FILE))?;
        let bold = read_font(dir.join(BOLD_FILE))?;
        info!(
            "Loaded fonts from {} ({} + {} bytes)",
            dir.display(),
            regular.len(),
            bold.len()
        );
        Ok(Self::from_bytes(&regular, &bold))
    }

    /// Process-wide cache: the first successful call loads from `dir`, later
    /// calls return the same assets regardless of their argument.
    pub fn global(dir: &Path) -> Result<Arc<Self>> {
        GLOBAL_FONTS
            .get_or_try_init(|| Self::load(dir).map(Arc::new))
            .cloned()
    }

    pub fn regular_base64(&self) -> &str {
        &self.regular_b64
    }

    pub fn bold_base64(&self) -> &str {
        &self.bold_b64
    }
}

fn read_font(path: PathBuf) -> Result<Vec<u8>> {
    std::fs::read(&path).map_err(|e| Error::Asset(format!("{}: {}", path.display(), e)))
}
