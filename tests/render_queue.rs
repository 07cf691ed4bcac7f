//! Pipeline + render queue behavior on the browser-less backend

use std::sync::Arc;

use og_image::fonts::FontAssets;
use og_image::noop::{NoopLauncher, PNG_MAGIC};
use og_image::session::SessionState;
use og_image::template::{Composer, ComposerConfig};
use og_image::{Pipeline, PipelineOutput, Renderer, SessionConfig};

fn pipeline(launcher: NoopLauncher) -> Pipeline {
    let composer = Composer::new(
        Arc::new(FontAssets::from_bytes(b"r", b"b")),
        ComposerConfig {
            emoji_base: Some("https://emoji.test/svg/".into()),
        },
    );
    let renderer = Renderer::spawn(launcher, SessionConfig::default()).expect("spawn renderer");
    Pipeline::new(Arc::new(composer), renderer)
}

#[tokio::test]
async fn image_bytes_and_content_type() {
    let p = pipeline(NoopLauncher::new());
    let out = p.run("/Hello%20%F0%9F%91%8B.png", "localhost").await.unwrap();
    let PipelineOutput::Image(img) = out else {
        panic!("expected image output");
    };
    assert_eq!(img.content_type(), "image/png");
    assert!(img.bytes.starts_with(PNG_MAGIC));
    let html = String::from_utf8_lossy(&img.bytes[PNG_MAGIC.len()..]).into_owned();
    assert!(html.contains("https://emoji.test/svg/1f44b.svg"));
}

#[tokio::test]
async fn concurrent_requests_get_their_own_cards() {
    let launcher = NoopLauncher::new();
    let stats = launcher.stats();
    let p = pipeline(launcher);

    let tasks: Vec<_> = (0..6)
        .map(|i| {
            let p = p.clone();
            tokio::spawn(async move {
                let url = format!("/card-{}.png", i);
                let out = p.run(&url, "localhost").await.unwrap();
                (i, out)
            })
        })
        .collect();

    for t in tasks {
        let (i, out) = t.await.unwrap();
        let PipelineOutput::Image(img) = out else {
            panic!("expected image output");
        };
        let html = String::from_utf8_lossy(&img.bytes);
        assert!(html.contains(&format!(">card-{}</div>", i)));
    }
    assert_eq!(stats.launches(), 1);
}

#[tokio::test]
async fn shutdown_twice_then_render_again() {
    let launcher = NoopLauncher::new();
    let stats = launcher.stats();
    let p = pipeline(launcher);

    p.run("/a.png", "localhost").await.unwrap();
    p.renderer().shutdown().await.unwrap();
    p.renderer().shutdown().await.unwrap();
    assert_eq!(p.renderer().state().await.unwrap(), SessionState::Closed);
    assert_eq!(stats.closes(), 1);

    p.run("/b.png", "localhost").await.unwrap();
    assert_eq!(p.renderer().state().await.unwrap(), SessionState::Ready);
    assert_eq!(stats.launches(), 2);
}

#[tokio::test]
async fn crashed_browser_is_relaunched_on_next_request() {
    let launcher = NoopLauncher::new();
    let stats = launcher.stats();
    let p = pipeline(launcher);

    p.run("/a.png", "localhost").await.unwrap();
    stats.kill_browser();
    p.run("/b.png", "localhost").await.unwrap();
    assert_eq!(stats.launches(), 2);
}
