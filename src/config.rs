//! Command line and environment configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::template::ComposerConfig;
use crate::{LaunchConfig, SessionConfig};

#[derive(Debug, Parser)]
#[command(name = "og-image", version, about = "Render open graph cards with headless Chrome")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render one request path (e.g. "/Hello.png?theme=dark") to a file
    Render {
        /// Request path and query, percent-encoded
        url: String,
        #[arg(long, default_value = "localhost")]
        host: String,
        /// Output file; defaults to `card.<ext>` (or `card.html` in debug mode)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        options: RenderArgs,
    },
    /// Print the parsed request as JSON
    Inspect {
        url: String,
        #[arg(long, default_value = "localhost")]
        host: String,
    },
    /// Serve cards over HTTP
    Serve {
        #[arg(long, env = "OG_BIND", default_value = "127.0.0.1:3000")]
        bind: String,
        /// Accept threads; defaults to the number of CPUs
        #[arg(long, env = "OG_WORKERS")]
        workers: Option<usize>,
        #[command(flatten)]
        options: RenderArgs,
    },
}

/// Options shared by every command that renders
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Chrome/Chromium executable
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,
    /// Disable the Chrome sandbox (containers without user namespaces)
    #[arg(long, env = "OG_NO_SANDBOX")]
    pub no_sandbox: bool,
    /// Directory holding the Pretendard woff2 files
    #[arg(long, env = "OG_FONTS_DIR", default_value = "assets/fonts")]
    pub fonts_dir: PathBuf,
    /// Upper bound for document load and capture, in milliseconds
    #[arg(long, env = "OG_TIMEOUT_MS", default_value_t = 30000)]
    pub timeout_ms: u64,
    /// Network quiet period before capture, in milliseconds
    #[arg(long, env = "OG_SETTLE_MS", default_value_t = 500)]
    pub settle_ms: u64,
    /// Return composed HTML instead of an image
    #[arg(long, env = "OG_HTML_DEBUG")]
    pub html_debug: bool,
    /// twemoji SVG base URL
    #[arg(long, env = "OG_EMOJI_BASE")]
    pub emoji_base: Option<String>,
}

impl RenderArgs {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            timeout_ms: self.timeout_ms,
            settle_ms: self.settle_ms,
            launch: LaunchConfig {
                chrome_path: self.chrome_path.clone(),
                sandbox: !self.no_sandbox,
                ..LaunchConfig::default()
            },
            ..SessionConfig::default()
        }
    }

    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            emoji_base: self.emoji_base.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn render_args_map_to_session_config() {
        let cli = Cli::parse_from([
            "og-image",
            "render",
            "/Hello.png",
            "--no-sandbox",
            "--timeout-ms",
            "5000",
            "--chrome-path",
            "/usr/bin/chromium",
        ]);
        let Command::Render { url, host, options, .. } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(url, "/Hello.png");
        assert_eq!(host, "localhost");

        let cfg = options.session_config();
        assert!(!cfg.launch.sandbox);
        assert_eq!(cfg.timeout_ms, 5000);
        assert_eq!(cfg.settle_ms, 500);
        assert_eq!(cfg.viewport.width, 2048);
        assert_eq!(cfg.launch.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::parse_from(["og-image", "serve"]);
        let Command::Serve { bind, workers, options } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(bind, "127.0.0.1:3000");
        assert!(workers.is_none() || std::env::var("OG_WORKERS").is_ok());
        assert_eq!(options.fonts_dir, PathBuf::from("assets/fonts"));
    }
}
