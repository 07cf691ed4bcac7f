//! Pipeline entry point: request URL + host header in, image bytes out

use std::sync::Arc;

use log::error;

use crate::async_api::Renderer;
use crate::request::{parse_request, FileType, RequestDescriptor};
use crate::template::{Composer, RenderedDocument};
use crate::Result;

/// Encoded image plus the content type the transport should advertise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub file_type: FileType,
    /// Fingerprint of the document the image was rendered from
    pub fingerprint: String,
}

impl RenderedImage {
    pub fn content_type(&self) -> &'static str {
        self.file_type.content_type()
    }
}

/// What the pipeline produced for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutput {
    Image(RenderedImage),
    /// Debug bypass: the composed document, never sent to the browser
    Html(RenderedDocument),
}

/// Parser -> Composer -> rendering session
#[derive(Clone)]
pub struct Pipeline {
    composer: Arc<Composer>,
    renderer: Renderer,
    html_debug: bool,
}

impl Pipeline {
    pub fn new(composer: Arc<Composer>, renderer: Renderer) -> Self {
        Self {
            composer,
            renderer,
            html_debug: false,
        }
    }

    /// Return composed HTML instead of rendering it.
    pub fn with_html_debug(mut self, enabled: bool) -> Self {
        self.html_debug = enabled;
        self
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Parse and compose without rendering.
    pub fn compose(&self, raw_url: &str, host: &str) -> Result<(RequestDescriptor, RenderedDocument)> {
        let req = parse_request(raw_url, host)?;
        let doc = self.composer.compose(&req);
        Ok((req, doc))
    }

    /// Run one request to completion. No partial output on failure.
    pub async fn run(&self, raw_url: &str, host: &str) -> Result<PipelineOutput> {
        let (req, doc) = self.compose(raw_url, host)?;

        if self.html_debug {
            return Ok(PipelineOutput::Html(doc));
        }

        let fingerprint = doc.fingerprint();
        let bytes = self
            .renderer
            .render(doc.into_string(), req.file_type)
            .await
            .map_err(|e| {
                error!("Error processing request {}: {}", raw_url, e);
                e
            })?;

        Ok(PipelineOutput::Image(RenderedImage {
            bytes,
            file_type: req.file_type,
            fingerprint,
        }))
    }
}
