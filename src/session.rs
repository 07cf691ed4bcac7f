//! Rendering session: a single-slot pool holding one browser and one page
//!
//! ```text
//! Uninitialized -> Launching -> Ready -> (render cycles) -> ShuttingDown -> Closed
//!                      ^                                                     |
//!                      +---------------- next render relaunches -------------+
//! ```
//!
//! The session is a plain owned value. It is not synchronized: whoever owns
//! it must drive one render to completion before starting the next. The
//! [`crate::async_api::Renderer`] does that by owning the session on a worker
//! thread that consumes a request queue.

use std::time::Duration;

use log::{error, info, warn};

use crate::request::FileType;
use crate::{Error, Result, SessionConfig, Viewport};

/// Lifecycle tag of a [`RenderSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Launching,
    /// A browser is up. The page slot may be empty after a failed render;
    /// the next acquire refills it without relaunching.
    Ready,
    ShuttingDown,
    Closed,
}

/// Screenshot parameters for one capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotOptions {
    pub file_type: FileType,
    /// JPEG quality; always `None` for PNG
    pub quality: Option<u32>,
    /// Capture the whole document height rather than just the viewport
    pub full_page: bool,
}

impl ScreenshotOptions {
    pub fn for_file_type(file_type: FileType, jpeg_quality: u32) -> Self {
        Self {
            file_type,
            quality: match file_type {
                FileType::Png => None,
                FileType::Jpeg => Some(jpeg_quality),
            },
            full_page: true,
        }
    }
}

/// How long to wait for a document and its subresources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Upper bound for loading plus network settle
    pub timeout: Duration,
    /// Quiet period with no new network activity before capture
    pub settle: Duration,
}

/// Starts browser processes
pub trait BrowserLauncher {
    type Browser: BrowserProcess;

    fn launch(&self, config: &SessionConfig) -> Result<Self::Browser>;
}

/// A running browser process
pub trait BrowserProcess {
    type Page: RenderPage;

    fn new_page(&self) -> Result<Self::Page>;

    /// Whether the process still answers; used to detect crashed browsers.
    fn is_alive(&self) -> bool;

    /// Terminate the process.
    fn close(self) -> Result<()>;
}

/// A page (tab) that can load HTML and capture it
pub trait RenderPage {
    fn set_viewport(&self, viewport: Viewport) -> Result<()>;

    /// Replace the page document with `html` and wait for network settle.
    fn set_content(&self, html: &str, options: &LoadOptions) -> Result<()>;

    fn screenshot(&self, options: &ScreenshotOptions) -> Result<Vec<u8>>;

    /// Close the page in the browser.
    fn close(self) -> Result<()>;
}

/// Owner of the memoized browser and page handles
pub struct RenderSession<L: BrowserLauncher> {
    launcher: L,
    config: SessionConfig,
    state: SessionState,
    browser: Option<L::Browser>,
    page: Option<<L::Browser as BrowserProcess>::Page>,
}

impl<L: BrowserLauncher> RenderSession<L> {
    /// Create an idle session; nothing is launched until the first render.
    pub fn new(launcher: L, config: SessionConfig) -> Self {
        Self {
            launcher,
            config,
            state: SessionState::Uninitialized,
            browser: None,
            page: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Make sure a live browser and a page exist, launching when needed.
    pub fn acquire(&mut self) -> Result<&<L::Browser as BrowserProcess>::Page> {
        if let Some(browser) = &self.browser {
            if !browser.is_alive() {
                warn!("Browser process is no longer responding; relaunching");
                self.page = None;
                if let Some(dead) = self.browser.take() {
                    let _ = dead.close();
                }
            }
        }

        if self.browser.is_none() {
            self.state = SessionState::Launching;
            match self.launcher.launch(&self.config) {
                Ok(browser) => {
                    info!("Browser launched");
                    self.browser = Some(browser);
                }
                Err(e) => {
                    self.state = SessionState::Uninitialized;
                    return Err(as_render_failure(e, "launch browser"));
                }
            }
        }

        if self.page.is_none() {
            let opened = match &self.browser {
                Some(browser) => browser.new_page(),
                None => return Err(Error::RenderFailure("browser handle missing".into())),
            };
            match opened {
                Ok(page) => self.page = Some(page),
                Err(e) => {
                    self.state = SessionState::Uninitialized;
                    return Err(as_render_failure(e, "open page"));
                }
            }
        }

        self.state = SessionState::Ready;
        self.page
            .as_ref()
            .ok_or_else(|| Error::RenderFailure("page handle missing".into()))
    }

    /// Close and drop the page; the browser stays up and the next
    /// [`acquire`](Self::acquire) opens a fresh page.
    pub fn release(&mut self) {
        if let Some(page) = self.page.take() {
            match page.close() {
                Ok(()) => info!("Released page handle"),
                Err(e) => warn!("Failed to close released page: {}", e),
            }
        }
    }

    /// Render `html` and return encoded image bytes.
    pub fn render(&mut self, html: &str, file_type: FileType) -> Result<Vec<u8>> {
        let viewport = self.config.viewport;
        let load = LoadOptions {
            timeout: Duration::from_millis(self.config.timeout_ms),
            settle: Duration::from_millis(self.config.settle_ms),
        };
        let shot = ScreenshotOptions::for_file_type(file_type, self.config.jpeg_quality);

        let result = self.acquire().and_then(|page| {
            page.set_viewport(viewport)?;
            page.set_content(html, &load)?;
            page.screenshot(&shot)
        });

        match result {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                error!("Screenshot failed: {}", e);
                self.release();
                Err(as_render_failure(e, "render"))
            }
        }
    }

    /// Close the browser if one exists and clear both handles. Idempotent.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.browser.is_none() && self.page.is_none() {
            self.state = SessionState::Closed;
            return Ok(());
        }

        self.state = SessionState::ShuttingDown;
        self.page = None;
        let res = match self.browser.take() {
            Some(browser) => browser.close(),
            None => Ok(()),
        };
        self.state = SessionState::Closed;
        info!("Rendering session closed");
        res.map_err(|e| as_render_failure(e, "close browser"))
    }
}

impl<L: BrowserLauncher> Drop for RenderSession<L> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Failed to close browser on drop: {}", e);
        }
    }
}

fn as_render_failure(err: Error, what: &str) -> Error {
    if err.is_render_failure() {
        err
    } else {
        Error::RenderFailure(format!("{}: {}", what, err))
    }
}
