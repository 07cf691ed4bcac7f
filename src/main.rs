use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use og_image::config::{Cli, Command, RenderArgs};
use og_image::fonts::FontAssets;
use og_image::server::HttpServer;
use og_image::{parse_request, Composer, Pipeline, PipelineOutput, Renderer};

#[cfg(feature = "cdp")]
fn launcher() -> og_image::cdp::ChromeLauncher {
    og_image::cdp::ChromeLauncher::new()
}

// Without Chrome support the binary can still compose and dry-run.
#[cfg(not(feature = "cdp"))]
fn launcher() -> og_image::noop::NoopLauncher {
    og_image::noop::NoopLauncher::new()
}

fn build_pipeline(options: &RenderArgs) -> og_image::Result<Pipeline> {
    let fonts = FontAssets::global(&options.fonts_dir)?;
    let composer = Composer::new(fonts, options.composer_config());
    let renderer = Renderer::spawn(launcher(), options.session_config())?;
    Ok(Pipeline::new(Arc::new(composer), renderer).with_html_debug(options.html_debug))
}

async fn render_once(url: String, host: String, output: Option<PathBuf>, options: RenderArgs) -> og_image::Result<()> {
    let pipeline = build_pipeline(&options)?;
    let result = pipeline.run(&url, &host).await;
    pipeline.renderer().shutdown().await?;

    let (bytes, default_name) = match result? {
        PipelineOutput::Image(img) => {
            let name = format!("card.{}", img.file_type);
            (img.bytes, name)
        }
        PipelineOutput::Html(doc) => (doc.into_string().into_bytes(), "card.html".to_string()),
    };
    let path = output.unwrap_or_else(|| PathBuf::from(default_name));
    std::fs::write(&path, &bytes)?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

async fn serve(bind: String, workers: Option<usize>, options: RenderArgs) -> og_image::Result<()> {
    let pipeline = build_pipeline(&options)?;
    let renderer = pipeline.renderer().clone();
    let workers = workers.unwrap_or_else(num_cpus::get);

    let server = HttpServer::start(&bind, workers, pipeline, tokio::runtime::Handle::current())?;

    wait_for_signal().await;
    info!("Shutting down");

    tokio::task::spawn_blocking(move || server.stop())
        .await
        .map_err(|e| og_image::Error::Other(format!("server stop failed: {}", e)))?;
    renderer.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            error!("Cannot listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Render { url, host, output, options } => render_once(url, host, output, options).await,
        Command::Inspect { url, host } => parse_request(&url, &host).and_then(|req| {
            let json = serde_json::to_string_pretty(&req)
                .map_err(|e| og_image::Error::Other(e.to_string()))?;
            println!("{}", json);
            Ok(())
        }),
        Command::Serve { bind, workers, options } => serve(bind, workers, options).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
