//! Browser-less backend
//!
//! Implements the session traits without launching anything. Captures return
//! the image magic bytes followed by the loaded HTML, which is enough for
//! tests and dry runs of the pipeline. Shared [`NoopStats`] let tests observe
//! and steer the lifecycle (kill the browser, fail the next launch or capture).

use std::sync::{Arc, Mutex, MutexGuard};

use crate::request::FileType;
use crate::session::{BrowserLauncher, BrowserProcess, LoadOptions, RenderPage, ScreenshotOptions};
use crate::{Error, Result, SessionConfig, Viewport};

pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
pub const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF";

#[derive(Debug, Default)]
struct NoopState {
    launches: usize,
    pages_opened: usize,
    pages_closed: usize,
    closes: usize,
    browser_alive: bool,
    fail_next_launch: bool,
    fail_next_capture: bool,
    last_viewport: Option<Viewport>,
    last_html: Option<String>,
    last_screenshot: Option<ScreenshotOptions>,
}

/// Shared view of what the noop backend has been asked to do
#[derive(Debug, Clone, Default)]
pub struct NoopStats {
    inner: Arc<Mutex<NoopState>>,
}

impl NoopStats {
    fn lock(&self) -> MutexGuard<'_, NoopState> {
        // a panicking test thread must not hide the counters from the others
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn launches(&self) -> usize {
        self.lock().launches
    }

    pub fn pages_opened(&self) -> usize {
        self.lock().pages_opened
    }

    pub fn pages_closed(&self) -> usize {
        self.lock().pages_closed
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    pub fn last_viewport(&self) -> Option<Viewport> {
        self.lock().last_viewport
    }

    pub fn last_html(&self) -> Option<String> {
        self.lock().last_html.clone()
    }

    pub fn last_screenshot(&self) -> Option<ScreenshotOptions> {
        self.lock().last_screenshot
    }

    /// Simulate a browser crash between renders.
    pub fn kill_browser(&self) {
        self.lock().browser_alive = false;
    }

    pub fn fail_next_launch(&self) {
        self.lock().fail_next_launch = true;
    }

    pub fn fail_next_capture(&self) {
        self.lock().fail_next_capture = true;
    }
}

/// Launcher producing [`NoopBrowser`]s
#[derive(Debug, Clone, Default)]
pub struct NoopLauncher {
    stats: NoopStats,
}

impl NoopLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> NoopStats {
        self.stats.clone()
    }
}

impl BrowserLauncher for NoopLauncher {
    type Browser = NoopBrowser;

    fn launch(&self, _config: &SessionConfig) -> Result<NoopBrowser> {
        let mut state = self.stats.lock();
        if state.fail_next_launch {
            state.fail_next_launch = false;
            return Err(Error::RenderFailure("noop launch refused".into()));
        }
        state.launches += 1;
        state.browser_alive = true;
        Ok(NoopBrowser {
            stats: self.stats.clone(),
        })
    }
}

pub struct NoopBrowser {
    stats: NoopStats,
}

impl BrowserProcess for NoopBrowser {
    type Page = NoopPage;

    fn new_page(&self) -> Result<NoopPage> {
        self.stats.lock().pages_opened += 1;
        Ok(NoopPage {
            stats: self.stats.clone(),
        })
    }

    fn is_alive(&self) -> bool {
        self.stats.lock().browser_alive
    }

    fn close(self) -> Result<()> {
        let mut state = self.stats.lock();
        state.closes += 1;
        state.browser_alive = false;
        Ok(())
    }
}

pub struct NoopPage {
    stats: NoopStats,
}

impl RenderPage for NoopPage {
    fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.stats.lock().last_viewport = Some(viewport);
        Ok(())
    }

    fn set_content(&self, html: &str, _options: &LoadOptions) -> Result<()> {
        self.stats.lock().last_html = Some(html.to_string());
        Ok(())
    }

    fn screenshot(&self, options: &ScreenshotOptions) -> Result<Vec<u8>> {
        let mut state = self.stats.lock();
        if state.fail_next_capture {
            state.fail_next_capture = false;
            return Err(Error::RenderFailure("noop capture refused".into()));
        }
        state.last_screenshot = Some(*options);

        let magic = match options.file_type {
            FileType::Png => PNG_MAGIC,
            FileType::Jpeg => JPEG_MAGIC,
        };
        let html = state.last_html.as_deref().unwrap_or_default();
        let mut bytes = Vec::with_capacity(magic.len() + html.len());
        bytes.extend_from_slice(magic);
        bytes.extend_from_slice(html.as_bytes());
        Ok(bytes)
    }

    fn close(self) -> Result<()> {
        self.stats.lock().pages_closed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_echoes_loaded_html_behind_magic() {
        let launcher = NoopLauncher::new();
        let browser = launcher.launch(&SessionConfig::default()).unwrap();
        let page = browser.new_page().unwrap();
        let load = LoadOptions {
            timeout: std::time::Duration::from_secs(1),
            settle: std::time::Duration::from_millis(10),
        };
        page.set_content("<p>hi</p>", &load).unwrap();

        let png = page
            .screenshot(&ScreenshotOptions::for_file_type(FileType::Png, 80))
            .unwrap();
        assert!(png.starts_with(PNG_MAGIC));
        assert!(png.ends_with(b"<p>hi</p>"));

        let jpeg = page
            .screenshot(&ScreenshotOptions::for_file_type(FileType::Jpeg, 80))
            .unwrap();
        assert!(jpeg.starts_with(JPEG_MAGIC));
        assert_eq!(launcher.stats().last_screenshot().unwrap().quality, Some(80));
    }

    #[test]
    fn close_marks_browser_dead() {
        let launcher = NoopLauncher::new();
        let browser = launcher.launch(&SessionConfig::default()).unwrap();
        assert!(browser.is_alive());
        browser.close().unwrap();
        assert_eq!(launcher.stats().closes(), 1);
    }
}
