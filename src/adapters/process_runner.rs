//! Child-process plumbing shared by the executor and chart renderer.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub(crate) struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// Stdout, followed by a `Stderr:` section when stderr is non-empty.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\nStderr:\n{}", self.stdout, self.stderr)
        }
    }
}

#[derive(Debug)]
pub(crate) enum RunFailure {
    Spawn(std::io::Error),
    TimedOut,
}

/// Run `command` to completion, killing it once `timeout` elapses.
///
/// On Unix the child leads its own process group, and the whole group is
/// killed at the deadline or once the child exits. Output still pending at the
/// deadline is abandoned and its reader thread detached.
pub(crate) fn run_captured(
    command: &mut Command,
    input: Option<&str>,
    timeout: Duration,
) -> Result<Captured, RunFailure> {
    command
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let mut child = command.spawn().map_err(RunFailure::Spawn)?;

    let writer = input.zip(child.stdin.take()).map(|(text, mut stdin)| {
        let text = text.to_string();
        thread::spawn(move || {
            // The child may exit without reading; a broken pipe is expected then.
            let _ = stdin.write_all(text.as_bytes());
        })
    });
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let Some(status) = wait_until(&mut child, deadline) else {
        return Err(RunFailure::TimedOut);
    };
    // Background descendants would otherwise keep the pipes open.
    kill_group(&child);

    if let Some(handle) = writer {
        let _ = handle.join();
    }
    let stdout = collect(stdout, deadline);
    let stderr = collect(stderr, deadline);
    Ok(Captured { status, stdout, stderr })
}

fn wait_until(child: &mut Child, deadline: Instant) -> Option<ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
            _ => {
                kill_group(child);
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
        }
    }
}

/// SIGKILL every process in the child's group.
#[cfg(unix)]
fn kill_group(child: &Child) {
    // The child was spawned with `process_group(0)`, so its pid is the group id.
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        let _ = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = sender.send(buf);
        });
        receiver
    })
}

fn collect(receiver: Option<Receiver<Vec<u8>>>, deadline: Instant) -> String {
    receiver
        .and_then(|receiver| {
            receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())).ok()
        })
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// First executable named `name` on `PATH`.
pub(crate) fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|dir| {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
