//! HTTP handler over a real socket, backed by the browser-less renderer

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use og_image::fonts::FontAssets;
use og_image::noop::{NoopLauncher, JPEG_MAGIC};
use og_image::server::{HttpServer, CACHE_CONTROL, ERROR_BODY};
use og_image::template::{Composer, ComposerConfig};
use og_image::{Pipeline, Renderer, SessionConfig};

struct Reply {
    head: String,
    body: Vec<u8>,
}

fn get(addr: std::net::SocketAddr, path: &str, host: &str) -> Reply {
    let mut stream = TcpStream::connect(addr).expect("connect");
    write!(
        stream,
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host
    )
    .unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).unwrap();
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header terminator");
    Reply {
        head: String::from_utf8_lossy(&raw[..split]).into_owned(),
        body: raw[split + 4..].to_vec(),
    }
}

fn start(launcher: NoopLauncher, html_debug: bool) -> (tokio::runtime::Runtime, HttpServer) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let composer = Composer::new(
        Arc::new(FontAssets::from_bytes(b"r", b"b")),
        ComposerConfig::default(),
    );
    let renderer = Renderer::spawn(launcher, SessionConfig::default()).unwrap();
    let pipeline = Pipeline::new(Arc::new(composer), renderer).with_html_debug(html_debug);
    let server = HttpServer::start("127.0.0.1:0", 2, pipeline, rt.handle().clone()).unwrap();
    (rt, server)
}

#[test]
fn serves_cacheable_images() {
    let (_rt, server) = start(NoopLauncher::new(), false);
    let addr = server.local_addr().unwrap();

    let reply = get(addr, "/Hello.jpeg?theme=dark", "cards.example.com");
    assert!(reply.head.starts_with("HTTP/1.1 200"), "{}", reply.head);
    assert!(reply.head.contains("Content-Type: image/jpeg"));
    assert!(reply.head.contains(CACHE_CONTROL));
    assert!(reply.head.contains("ETag: \""));
    assert!(reply.body.starts_with(JPEG_MAGIC));

    server.stop();
}

#[test]
fn render_failures_map_to_500() {
    let launcher = NoopLauncher::new();
    launcher.stats().fail_next_launch();
    let (_rt, server) = start(launcher, false);
    let addr = server.local_addr().unwrap();

    let reply = get(addr, "/Hello.png", "localhost");
    assert!(reply.head.starts_with("HTTP/1.1 500"), "{}", reply.head);
    assert_eq!(reply.body, ERROR_BODY.as_bytes());

    // the session recovers for the next request
    let reply = get(addr, "/Hello.png", "localhost");
    assert!(reply.head.starts_with("HTTP/1.1 200"), "{}", reply.head);

    server.stop();
}

#[test]
fn html_debug_returns_the_document() {
    let launcher = NoopLauncher::new();
    let stats = launcher.stats();
    let (_rt, server) = start(launcher, true);
    let addr = server.local_addr().unwrap();

    let reply = get(addr, "/Debug%20me.png", "localhost");
    assert!(reply.head.starts_with("HTTP/1.1 200"));
    assert!(reply.head.contains("Content-Type: text/html"));
    let body = String::from_utf8(reply.body).unwrap();
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains(">Debug me</div>"));
    assert_eq!(stats.launches(), 0);

    server.stop();
}
