//! PTY handling for running a command whose output gets rendered.

use std::io::{Read, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use portable_pty::{CommandBuilder, MasterPty, PtySize, native_pty_system};

/// Output of the child process.
#[derive(Debug)]
pub enum PtyEvent {
    Output(Vec<u8>),
    Exited(i32),
}

/// Handle to a running PTY process.
pub struct PtySession {
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    events: mpsc::Receiver<PtyEvent>,
}

impl PtySession {
    /// Spawn `sh -c command` on a `cols` x `rows` PTY.
    pub fn spawn(command: &str, cols: u32, rows: u32) -> anyhow::Result<Self> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(pty_size(cols, rows))
            .context("failed to open pty")?;

        let mut cmd = CommandBuilder::new("sh");
        cmd.arg("-c");
        cmd.arg(command);
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }
        cmd.env("TERM", "xterm-256color");

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("failed to spawn `{command}`"))?;
        // The reader only sees EOF once no slave handle is left open here.
        drop(pair.slave);

        let mut reader = pair.master.try_clone_reader()?;
        let writer = pair.master.take_writer()?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(PtyEvent::Output(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!("PTY read error: {}", e);
                        break;
                    }
                }
            }

            match child.wait() {
                Ok(status) => {
                    let _ = tx.send(PtyEvent::Exited(status.exit_code() as i32));
                }
                Err(e) => {
                    tracing::error!("Failed to wait for child: {}", e);
                    let _ = tx.send(PtyEvent::Exited(1));
                }
            }
        });

        tracing::info!(command, cols, rows, "spawned pty child");

        Ok(Self {
            master: pair.master,
            writer,
            events: rx,
        })
    }

    /// Tell the child about a new terminal size.
    pub fn resize(&self, cols: u32, rows: u32) -> anyhow::Result<()> {
        self.master
            .resize(pty_size(cols, rows))
            .context("failed to resize pty")
    }

    /// Send `bytes` to the child's input.
    pub fn write(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.writer
            .write_all(bytes)
            .and_then(|()| self.writer.flush())
            .context("failed to write to pty")
    }

    /// Block for the next event. `None` once the reader thread is gone.
    pub fn next_event(&self) -> Option<PtyEvent> {
        self.events.recv().ok()
    }
}

fn pty_size(cols: u32, rows: u32) -> PtySize {
    PtySize {
        rows: rows.min(u16::MAX as u32) as u16,
        cols: cols.min(u16::MAX as u32) as u16,
        pixel_width: 0,
        pixel_height: 0,
    }
}
