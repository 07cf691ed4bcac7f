//! Minimal HTTP handler in front of the pipeline (`tiny_http`)
//!
//! Maps pipeline results onto responses: image bytes with a long-lived cache
//! directive on success, the composed HTML in debug mode, and a generic 500
//! page on any failure.

use std::sync::Arc;
use std::thread;

use log::{error, info};
use tiny_http::{Header, Request, Response, Server};
use tokio::runtime::Handle;

use crate::pipeline::{Pipeline, PipelineOutput};
use crate::{Error, Result};

pub const CACHE_CONTROL: &str = "public, immutable, no-transform, s-maxage=31536000, max-age=31536000";
pub const ERROR_BODY: &str = "<h1>Internal Error</h1><p>Sorry, there was a problem</p>";

/// Status, headers and body of a handled request, before it is written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn into_response(self) -> Response<std::io::Cursor<Vec<u8>>> {
        let mut response = Response::from_data(self.body).with_status_code(self.status);
        for (name, value) in self.headers {
            if let Ok(h) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(h);
            }
        }
        response
    }
}

/// Turn a pipeline result into an HTTP reply.
pub fn reply_for(result: Result<PipelineOutput>) -> HttpReply {
    match result {
        Ok(PipelineOutput::Image(img)) => HttpReply {
            status: 200,
            headers: vec![
                ("Content-Type", img.content_type().to_string()),
                ("Cache-Control", CACHE_CONTROL.to_string()),
                ("ETag", format!("\"{}\"", img.fingerprint)),
            ],
            body: img.bytes,
        },
        Ok(PipelineOutput::Html(doc)) => HttpReply {
            status: 200,
            headers: vec![("Content-Type", "text/html".to_string())],
            body: doc.into_string().into_bytes(),
        },
        Err(e) => {
            error!("Error processing request: {}", e);
            HttpReply {
                status: 500,
                headers: vec![("Content-Type", "text/html".to_string())],
                body: ERROR_BODY.as_bytes().to_vec(),
            }
        }
    }
}

/// Handle one request through the pipeline.
pub async fn handle(pipeline: &Pipeline, url: &str, host: Option<&str>) -> HttpReply {
    reply_for(pipeline.run(url, host.unwrap_or("localhost")).await)
}

fn host_header(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Host"))
        .map(|h| h.value.as_str().to_string())
}

/// Running HTTP server
pub struct HttpServer {
    server: Arc<Server>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl HttpServer {
    /// Bind `addr` and start `workers` accept threads. Each request is driven
    /// on `runtime`; renders still queue on the single render worker.
    pub fn start(addr: &str, workers: usize, pipeline: Pipeline, runtime: Handle) -> Result<Self> {
        let server = Server::http(addr).map_err(|e| Error::Config(format!("cannot bind {}: {}", addr, e)))?;
        let server = Arc::new(server);
        info!("Listening on http://{}", server.server_addr());

        let workers = (0..workers.max(1))
            .map(|i| {
                let server = Arc::clone(&server);
                let pipeline = pipeline.clone();
                let runtime = runtime.clone();
                thread::Builder::new()
                    .name(format!("og-http-{}", i))
                    .spawn(move || {
                        for request in server.incoming_requests() {
                            let host = host_header(&request);
                            let url = request.url().to_string();
                            let reply = runtime.block_on(handle(&pipeline, &url, host.as_deref()));
                            if let Err(e) = request.respond(reply.into_response()) {
                                error!("Failed to write response for {}: {}", url, e);
                            }
                        }
                    })
                    .map_err(Error::from)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { server, workers })
    }

    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Stop accepting and wait for in-flight requests.
    pub fn stop(self) {
        for _ in &self.workers {
            self.server.unblock();
        }
        for w in self.workers {
            let _ = w.join();
        }
    }
}
