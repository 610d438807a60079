//! Local command engine (e.g. `mmdc`, `plantuml`, `dot`).
//!
//! Every session gets a private temporary directory. Each diagram is written
//! to a source file there, the command renders it to `<name>.png`, and the
//! directory is removed at shutdown together with anything left behind.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use crate::error::DiagramError;
use crate::renderer::{Diagram, DiagramRenderer, RendererLauncher};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Launches [`CommandRenderer`]s for one program and argument template.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandLauncher {
    /// `args` may contain `{input}`, `{output}` and `{theme}` placeholders.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl RendererLauncher for CommandLauncher {
    fn launch(&self) -> Result<Box<dyn DiagramRenderer>, DiagramError> {
        let workdir = tempfile::Builder::new()
            .prefix("mdocx-diagrams-")
            .tempdir()
            .map_err(|e| DiagramError::Launch(e.to_string()))?;
        tracing::debug!(
            program = %self.program.display(),
            workdir = %workdir.path().display(),
            "starting command renderer"
        );
        Ok(Box::new(CommandRenderer {
            program: self.program.clone(),
            args: self.args.clone(),
            workdir: Some(workdir),
            counter: AtomicUsize::new(0),
            running: Mutex::new(Vec::new()),
        }))
    }
}

pub struct CommandRenderer {
    program: PathBuf,
    args: Vec<String>,
    workdir: Option<TempDir>,
    counter: AtomicUsize,
    /// Process ids of children still running, killed at shutdown.
    running: Mutex<Vec<u32>>,
}

impl CommandRenderer {
    fn workdir(&self) -> Result<&Path, DiagramError> {
        self.workdir
            .as_ref()
            .map(TempDir::path)
            .ok_or_else(|| DiagramError::Launch("renderer already shut down".to_owned()))
    }

    fn expand_args(&self, input: &Path, output: &Path, theme: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input.to_string_lossy())
                    .replace("{output}", &output.to_string_lossy())
                    .replace("{theme}", theme)
            })
            .collect()
    }

    fn track(&self, pid: u32, running: bool) {
        if let Ok(mut pids) = self.running.lock() {
            if running {
                pids.push(pid);
            } else {
                pids.retain(|p| *p != pid);
            }
        }
    }
}

impl DiagramRenderer for CommandRenderer {
    fn render(&self, diagram: &Diagram<'_>) -> Result<Vec<u8>, DiagramError> {
        let dir = self.workdir()?;
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let input = dir.join(format!("diagram-{n}.{}", diagram.language.file_extension()));
        let output = dir.join(format!("diagram-{n}.png"));
        std::fs::write(&input, diagram.source)?;

        let mut child = Command::new(&self.program)
            .args(self.expand_args(&input, &output, diagram.theme))
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DiagramError::Launch(format!("{}: {e}", self.program.display())))?;

        let pid = child.id();
        self.track(pid, true);
        let result = wait_with_timeout(&mut child, diagram.timeout);
        self.track(pid, false);
        result?;

        let bytes = std::fs::read(&output)?;
        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&output);
        Ok(bytes)
    }

    fn shutdown(&mut self) {
        if let Ok(pids) = self.running.get_mut() {
            for pid in pids.drain(..) {
                tracing::warn!(pid, "renderer child still running at shutdown");
                kill_pid(pid);
            }
        }
        if let Some(dir) = self.workdir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(path = %path.display(), "failed to remove renderer workdir: {e}");
            }
        }
    }
}

/// Wait for `child`, killing it once `timeout` elapses.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<(), DiagramError> {
    let stderr = child.stderr.take();
    let reader = thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    });

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DiagramError::Timeout(timeout));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stderr = reader.join().unwrap_or_default();
    if status.success() {
        Ok(())
    } else {
        Err(DiagramError::Process {
            status: status.to_string(),
            stderr: stderr.trim().to_owned(),
        })
    }
}

#[cfg(unix)]
fn kill_pid(pid: u32) {
    let _ = Command::new("kill").arg("-9").arg(pid.to_string()).status();
}

#[cfg(not(unix))]
fn kill_pid(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .status();
}
