//! A single supervised monitor process
//!
//! The process is started on first use and restarted whenever it is found
//! dead or a write to it fails. Writing, checking and restarting all happen
//! under the session lock, so lines from concurrent senders never
//! interleave.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::mem;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use derive_more::{Display, Error, From};
use parking_lot::Mutex;

use crate::config::BridgeConfig;
use crate::monitor::line::{self, END_SESSION};
use crate::predicates::PredicateSet;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Display, From, Error)]
pub enum MonitorError {
    Io(io::Error),
    #[display(fmt = "monitor {} could not be started: {}", program, source)]
    #[from(ignore)]
    Spawn { program: String, source: io::Error },
    #[display(fmt = "monitor has no stdin")]
    NoStdin,
}

type Result<T> = std::result::Result<T, MonitorError>;

/// What happened to one line handed to `send`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The monitor had died and was restarted before the write
    DeliveredAfterRestart,
    /// No monitor could be started, or the session was terminated
    Skipped,
    /// The write failed; a restart was attempted and the line is lost
    Dropped,
}

enum Process {
    Unstarted,
    Running(Child),
    Terminated,
}

struct SessionState {
    process: Process,
    launches: u32,
}

impl SessionState {
    /// Drops a dead or broken process, making sure it is reaped
    fn discard(&mut self) {
        if let Process::Running(mut child) = mem::replace(&mut self.process, Process::Unstarted) {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Readiness {
    Ready,
    Restarted,
}

pub struct MonitorSession {
    tag: String,
    config: BridgeConfig,
    state: Mutex<SessionState>,
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(unix)]
fn request_exit(child: &mut Child) {
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child) {
    let _ = child.kill();
}

/// Sends SIGTERM, waits up to `grace` for the process to exit, then kills it.
fn stop_child(child: &mut Child, grace: Duration) {
    request_exit(child);

    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                log::debug!("monitor {} exited with {}", child.id(), status);
                return;
            }
            Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
            _ => break,
        }
    }

    log::warn!("monitor {} ignored SIGTERM, killing it", child.id());
    let _ = child.kill();
    let _ = child.wait();
}

impl MonitorSession {
    pub fn new(tag: &str, config: BridgeConfig) -> MonitorSession {
        MonitorSession {
            tag: tag.to_string(),
            config,
            state: Mutex::new(SessionState {
                process: Process::Unstarted,
                launches: 0,
            }),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Pid of the running monitor, if any
    pub fn pid(&self) -> Option<u32> {
        match self.state.lock().process {
            Process::Running(ref child) => Some(child.id()),
            _ => None,
        }
    }

    /// Number of times a monitor process has been started
    pub fn launches(&self) -> u32 {
        self.state.lock().launches
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state.lock().process, Process::Terminated)
    }

    fn log_label(&self) -> String {
        let ts = Utc::now().timestamp();
        if self.tag.is_empty() {
            format!("monitor_{}_{}", std::process::id(), ts)
        } else {
            format!("monitor_{}_{}_{}", std::process::id(), self.tag, ts)
        }
    }

    fn launch(&self) -> Result<Child> {
        fs::create_dir_all(&self.config.log_dir)?;

        let label = self.log_label();
        let out = open_log(&self.config.log_dir.join(format!("{}.out", label)))?;
        let err = open_log(&self.config.log_dir.join(format!("{}.err", label)))?;

        let child = Command::new(&self.config.monitor_bin)
            .arg(&self.config.monitor_spec)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(out))
            .stderr(Stdio::from(err))
            .spawn()
            .map_err(|source| MonitorError::Spawn {
                program: self.config.monitor_bin.display().to_string(),
                source,
            })?;

        thread::sleep(self.config.startup_wait());
        log::info!("monitor for {} started with pid {}", self.tag, child.id());

        Ok(child)
    }

    fn start(&self, state: &mut SessionState) -> Result<()> {
        let child = self.launch()?;
        state.process = Process::Running(child);
        state.launches += 1;

        Ok(())
    }

    /// Makes sure a live monitor is attached, starting one if needed.
    fn ensure_running(&self, state: &mut SessionState) -> Result<Readiness> {
        let exited = match state.process {
            Process::Running(ref mut child) => match child.try_wait() {
                Ok(None) => return Ok(Readiness::Ready),
                Ok(Some(status)) => {
                    log::warn!("monitor for {} exited with {}", self.tag, status);
                    true
                }
                Err(e) => {
                    log::warn!("monitor for {} cannot be polled: {}", self.tag, e);
                    true
                }
            },
            _ => false,
        };

        if exited {
            state.discard();
        }

        let restarted = state.launches > 0;
        self.start(state)?;

        Ok(if restarted {
            Readiness::Restarted
        } else {
            Readiness::Ready
        })
    }

    fn write(state: &mut SessionState, line: &str) -> Result<()> {
        let child = match state.process {
            Process::Running(ref mut child) => child,
            _ => return Err(MonitorError::NoStdin),
        };
        let stdin = child.stdin.as_mut().ok_or(MonitorError::NoStdin)?;

        stdin.write_all(line.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;

        Ok(())
    }

    /// Writes one line, restarting the monitor first when it has died.
    pub fn send_line(&self, line: &str) -> SendOutcome {
        let mut state = self.state.lock();

        if let Process::Terminated = state.process {
            log::debug!("monitor for {} terminated, line ignored", self.tag);
            return SendOutcome::Skipped;
        }

        let readiness = match self.ensure_running(&mut state) {
            Ok(readiness) => readiness,
            Err(e) => {
                log::warn!("monitor for {} unavailable, skipping line: {}", self.tag, e);
                return SendOutcome::Skipped;
            }
        };

        match MonitorSession::write(&mut state, line) {
            Ok(()) => match readiness {
                Readiness::Ready => SendOutcome::Delivered,
                Readiness::Restarted => SendOutcome::DeliveredAfterRestart,
            },
            Err(e) => {
                log::warn!("write to monitor for {} failed, restarting: {}", self.tag, e);
                state.discard();
                if let Err(e) = self.start(&mut state) {
                    log::warn!("restart of monitor for {} failed: {}", self.tag, e);
                }
                SendOutcome::Dropped
            }
        }
    }

    /// Sends one predicate set.
    pub fn send(&self, set: &PredicateSet) -> SendOutcome {
        self.send_line(&line::serialize(set))
    }

    /// Tells the monitor the current trace is over.
    pub fn end_session(&self) -> SendOutcome {
        self.send_line(END_SESSION)
    }

    /// Stops the monitor for good. Later sends are skipped.
    pub fn terminate(&self) {
        let mut state = self.state.lock();
        if let Process::Running(mut child) = mem::replace(&mut state.process, Process::Terminated) {
            log::info!("stopping monitor for {} (pid {})", self.tag, child.id());
            stop_child(&mut child, self.config.shutdown_grace());
        }
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        if let Process::Running(ref mut child) = self.state.get_mut().process {
            stop_child(child, self.config.shutdown_grace());
        }
    }
}
