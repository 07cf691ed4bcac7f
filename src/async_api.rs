//! Async-friendly render queue backed by a dedicated worker thread.
//!
//! The worker thread owns the [`RenderSession`] and executes commands in the
//! order they were queued, so concurrent callers never interleave viewport,
//! content and capture steps on the shared page.

use std::sync::mpsc::{self, Sender};
use std::thread;

use log::{debug, info};
use tokio::sync::oneshot;

use crate::request::FileType;
use crate::session::{BrowserLauncher, RenderSession, SessionState};
use crate::{Error, Result, SessionConfig};

enum Command {
    Render(String, FileType, oneshot::Sender<Result<Vec<u8>>>),
    State(oneshot::Sender<SessionState>),
    Shutdown(oneshot::Sender<Result<()>>),
}

/// Cloneable handle to the render worker
///
/// The browser is launched lazily by the first render, not when the worker
/// is spawned. The worker exits once every handle has been dropped.
#[derive(Clone)]
pub struct Renderer {
    cmd_tx: Sender<Command>,
}

impl Renderer {
    /// Spawn the worker thread that owns a session built from `launcher`.
    pub fn spawn<L>(launcher: L, config: SessionConfig) -> Result<Self>
    where
        L: BrowserLauncher + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

        thread::Builder::new()
            .name("og-render".into())
            .spawn(move || {
                let mut session = RenderSession::new(launcher, config);

                // Command loop
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Render(html, file_type, resp) => {
                            debug!("Rendering {} bytes of HTML as {}", html.len(), file_type);
                            let res = session.render(&html, file_type);
                            let _ = resp.send(res);
                        }
                        Command::State(resp) => {
                            let _ = resp.send(session.state());
                        }
                        Command::Shutdown(resp) => {
                            let res = session.shutdown();
                            let _ = resp.send(res);
                        }
                    }
                }

                info!("Render worker exiting");
            })?;

        Ok(Self { cmd_tx })
    }

    /// Queue a render and wait for its bytes.
    pub async fn render(&self, html: String, file_type: FileType) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Render(html, file_type, tx))?;
        rx.await
            .map_err(|e| Error::RenderFailure(format!("Render canceled: {}", e)))?
    }

    /// Current lifecycle state of the session.
    pub async fn state(&self) -> Result<SessionState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::State(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("State query canceled: {}", e)))
    }

    /// Close the browser. Safe to call more than once; a later render
    /// launches a new browser.
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Shutdown canceled: {}", e)))?
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::RenderFailure("render worker is not running".into()))
    }
}
