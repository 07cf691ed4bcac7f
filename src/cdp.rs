//! Chrome DevTools Protocol backend (uses the `headless_chrome` crate)

use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::{Page, Runtime};
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use serde::Deserialize;

use crate::request::FileType;
use crate::session::{BrowserLauncher, BrowserProcess, LoadOptions, RenderPage, ScreenshotOptions};
use crate::{Error, Result, SessionConfig, Viewport};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

// Snapshot of load progress, serialized by the page so CDP hands back a string.
const SETTLE_PROBE: &str = r#"JSON.stringify({
    ready: document.readyState === 'complete',
    pending: Array.from(document.images).filter(function (img) { return !img.complete; }).length,
    resources: performance.getEntriesByType('resource').length
})"#;

const CONTENT_SIZE_PROBE: &str = r#"JSON.stringify({
    height: Math.ceil(Math.max(
        document.documentElement.scrollHeight,
        document.body ? document.body.scrollHeight : 0
    ))
})"#;

#[derive(Debug, Deserialize)]
struct SettleProbe {
    ready: bool,
    pending: u32,
    resources: u32,
}

#[derive(Debug, Deserialize)]
struct ContentSize {
    height: u32,
}

/// Launches headless Chrome
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    pub fn new() -> Self {
        ChromeLauncher
    }
}

impl BrowserLauncher for ChromeLauncher {
    type Browser = ChromeBrowser;

    fn launch(&self, config: &SessionConfig) -> Result<ChromeBrowser> {
        let launch = &config.launch;
        let launch_options = LaunchOptions::default_builder()
            .headless(launch.headless)
            .sandbox(launch.sandbox)
            .path(launch.chrome_path.clone())
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .idle_browser_timeout(Duration::from_millis(launch.idle_timeout_ms))
            .build()
            .map_err(|e| Error::RenderFailure(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::RenderFailure(format!("Failed to launch browser: {}", e)))?;

        Ok(ChromeBrowser {
            browser,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }
}

/// A running Chrome process
pub struct ChromeBrowser {
    browser: Browser,
    timeout: Duration,
}

impl BrowserProcess for ChromeBrowser {
    type Page = ChromePage;

    fn new_page(&self) -> Result<ChromePage> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| Error::RenderFailure(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(self.timeout);

        // Runtime events carry uncaught page exceptions
        tab.call_method(Runtime::Enable(None))
            .map_err(|e| Error::RenderFailure(format!("Failed to enable runtime: {}", e)))?;

        // Page errors are diagnostics only; they never fail a render.
        tab.add_event_listener(Arc::new(|event: &Event| match event {
            Event::RuntimeExceptionThrown(e) => {
                let details = &e.params.exception_details;
                let description = details
                    .exception
                    .as_ref()
                    .and_then(|ex| ex.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                warn!("Page error: {}", description);
            }
            Event::InspectorTargetCrashed(_) => warn!("Page error: target crashed"),
            _ => {}
        }))
        .map_err(|e| Error::RenderFailure(format!("Failed to attach page listener: {}", e)))?;

        tab.navigate_to("about:blank")
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| Error::RenderFailure(format!("Failed to open blank page: {}", e)))?;

        Ok(ChromePage {
            tab,
            viewport: Cell::new(Viewport::default()),
        })
    }

    fn is_alive(&self) -> bool {
        self.browser.get_version().is_ok()
    }

    fn close(self) -> Result<()> {
        // Dropping the handle terminates the child process.
        drop(self.browser);
        Ok(())
    }
}

/// The single tab used for rendering
pub struct ChromePage {
    tab: Arc<Tab>,
    viewport: Cell<Viewport>,
}

impl ChromePage {
    fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.tab
            .set_bounds(Bounds::Normal {
                left: None,
                top: None,
                width: Some(width as f64),
                height: Some(height as f64),
            })
            .map_err(|e| Error::RenderFailure(format!("Failed to set viewport: {}", e)))?;
        Ok(())
    }

    fn evaluate_json<T: for<'de> Deserialize<'de>>(&self, expression: &str) -> Result<T> {
        let remote = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| Error::RenderFailure(format!("Evaluation failed: {}", e)))?;

        let raw = match remote.value {
            Some(serde_json::Value::String(s)) => s,
            other => {
                return Err(Error::RenderFailure(format!(
                    "Unexpected evaluation result: {:?}",
                    other
                )))
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| Error::RenderFailure(format!("Bad probe payload {}: {}", raw, e)))
    }

    /// Wait until the document is complete, no image is pending and the
    /// resource count has not moved for `settle`.
    fn wait_for_network_settle(&self, options: &LoadOptions) -> Result<()> {
        let started = Instant::now();
        let mut last_resources = None;
        let mut quiet_since = Instant::now();

        loop {
            let probe: SettleProbe = self.evaluate_json(SETTLE_PROBE)?;

            if last_resources != Some(probe.resources) || !probe.ready || probe.pending > 0 {
                last_resources = Some(probe.resources);
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= options.settle {
                debug!(
                    "Network settled after {}ms ({} resources)",
                    started.elapsed().as_millis(),
                    probe.resources
                );
                return Ok(());
            }

            if started.elapsed() >= options.timeout {
                return Err(Error::Timeout(options.timeout.as_millis() as u64));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl RenderPage for ChromePage {
    fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.resize(viewport.width, viewport.height)?;
        self.viewport.set(viewport);
        Ok(())
    }

    fn set_content(&self, html: &str, options: &LoadOptions) -> Result<()> {
        let literal = serde_json::to_string(html)
            .map_err(|e| Error::RenderFailure(format!("Failed to encode document: {}", e)))?;
        let script = format!("document.open(); document.write({}); document.close();", literal);

        self.tab
            .evaluate(&script, false)
            .map_err(|e| Error::RenderFailure(format!("Failed to load document: {}", e)))?;

        self.wait_for_network_settle(options)
    }

    fn screenshot(&self, options: &ScreenshotOptions) -> Result<Vec<u8>> {
        let viewport = self.viewport.get();
        let mut resized = false;

        if options.full_page {
            let size: ContentSize = self.evaluate_json(CONTENT_SIZE_PROBE)?;
            if size.height > viewport.height {
                self.resize(viewport.width, size.height)?;
                resized = true;
            }
        }

        let format = match options.file_type {
            FileType::Png => Page::CaptureScreenshotFormatOption::Png,
            FileType::Jpeg => Page::CaptureScreenshotFormatOption::Jpeg,
        };
        let shot = self
            .tab
            .capture_screenshot(format, options.quality, None, true)
            .map_err(|e| Error::RenderFailure(format!("Screenshot failed: {}", e)));

        if resized {
            if let Err(e) = self.resize(viewport.width, viewport.height) {
                warn!("Failed to restore viewport: {}", e);
            }
        }

        shot
    }

    fn close(self) -> Result<()> {
        self.tab
            .close(false)
            .map_err(|e| Error::RenderFailure(format!("Failed to close tab: {}", e)))?;
        Ok(())
    }
}
