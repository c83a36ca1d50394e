//! Output routing and capture for spawned build processes

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::process::{ChildStderr, ChildStdout, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::error::ProcessError;
use crate::models::OutputSink;

/// Timeout for collecting output from child process pipes once it has exited
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum captured size per stream (10MB)
pub const MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

/// Stdio handles for a child's stdout and stderr according to `sink`
pub(crate) fn stdio_for(sink: &OutputSink) -> Result<(Stdio, Stdio), ProcessError> {
    match sink {
        OutputSink::Inherit => Ok((Stdio::inherit(), Stdio::inherit())),
        OutputSink::Discard => Ok((Stdio::null(), Stdio::null())),
        OutputSink::Capture => Ok((Stdio::piped(), Stdio::piped())),
        OutputSink::File { path, append } => {
            let open = || -> std::io::Result<(File, File)> {
                let mut options = OpenOptions::new();
                options.create(true);
                if *append {
                    options.append(true);
                } else {
                    options.write(true).truncate(true);
                }
                let stdout = options.open(path)?;
                let stderr = stdout.try_clone()?;
                Ok((stdout, stderr))
            };
            let (stdout, stderr) = open().map_err(|source| ProcessError::OutputFile {
                path: path.clone(),
                source,
            })?;
            Ok((Stdio::from(stdout), Stdio::from(stderr)))
        }
    }
}

/// Drains a child's pipes on background threads.
///
/// Reading must start before waiting on the child: a child that fills the
/// pipe buffer (~64KB on Linux) blocks on write() and never exits.
pub(crate) struct OutputCollector {
    stdout: Option<mpsc::Receiver<String>>,
    stderr: Option<mpsc::Receiver<String>>,
}

impl OutputCollector {
    pub(crate) fn start(stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) -> Self {
        Self {
            stdout: stdout.map(spawn_reader),
            stderr: stderr.map(spawn_reader),
        }
    }

    /// Captured (stdout, stderr); `None` for streams that were not piped
    pub(crate) fn finish(self) -> (Option<String>, Option<String>) {
        (collect(self.stdout), collect(self.stderr))
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: R) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(capture_stream(stream));
    });
    rx
}

fn collect(rx: Option<mpsc::Receiver<String>>) -> Option<String> {
    rx.map(|rx| {
        rx.recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
            .unwrap_or_else(|_| "[output collection timed out]".to_string())
    })
}

/// Appended to a capture that hit [`MAX_OUTPUT_SIZE`]
const TRUNCATION_MARKER: &str = "\n[srcbuild: output truncated]";

/// Capture the first [`MAX_OUTPUT_SIZE`] bytes of `stream` as lossy UTF-8.
///
/// Bytes past the cap are still read and thrown away, otherwise the build
/// would block or die on a full pipe. A read error ends the capture early.
pub(crate) fn capture_stream<R: Read>(mut stream: R) -> String {
    let mut kept = Vec::new();
    let cap = MAX_OUTPUT_SIZE as u64;

    let mut read = stream.by_ref().take(cap + 1).read_to_end(&mut kept);
    let overflowed = kept.len() as u64 > cap;
    if overflowed {
        kept.truncate(MAX_OUTPUT_SIZE);
        read = read.and_then(|_| io::copy(&mut stream, &mut io::sink()).map(|_| 0));
    }
    if let Err(e) = read {
        debug!(error = %e, kept = kept.len(), "output stream closed with error");
    }

    let mut text = String::from_utf8_lossy(&kept).into_owned();
    if overflowed {
        text.push_str(TRUNCATION_MARKER);
    }
    text
}
