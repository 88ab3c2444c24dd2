//! Encryption engine backed by the `gpg` command-line tool.
//!
//! Each call spawns one `gpg` process in batch mode against the configured
//! home directory. Input is streamed over stdin, output is collected from
//! stdout, and the last non-empty stderr line becomes the status reported
//! on failure. Passphrases are handled by gpg-agent.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use zeroize::Zeroizing;

use super::{CipherEngine, EngineOutput, Recipient};
use crate::error::{Result, StoreError};

const DEFAULT_PROGRAM: &str = "gpg";

/// Production [`CipherEngine`] driving a `gpg` binary.
#[derive(Debug, Clone)]
pub struct GpgEngine {
    program: PathBuf,
    home: PathBuf,
}

impl GpgEngine {
    /// Use `gpg` from `PATH` with key material under `home`.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            home: home.into(),
        }
    }

    /// Use a specific gpg-compatible binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    fn run(&self, args: &[&str], input: &[u8]) -> Result<EngineOutput> {
        log::debug!("running {} {}", self.program.display(), args.join(" "));

        let mut child = Command::new(&self.program)
            .arg("--homedir")
            .arg(&self.home)
            .args(["--batch", "--yes", "--quiet", "--no-tty"])
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                StoreError::Configuration(format!(
                    "cannot start {}: {e}",
                    self.program.display()
                ))
            })?;

        // Feed stdin from a separate thread so a large output cannot
        // deadlock against a full input pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| StoreError::Io(std::io::Error::other("gpg stdin unavailable")))?;
        let input = Zeroizing::new(input.to_vec());
        let writer = std::thread::spawn(move || stdin.write_all(&input));

        let output = child.wait_with_output()?;
        let write_result = writer
            .join()
            .map_err(|_| StoreError::Io(std::io::Error::other("gpg stdin writer panicked")))?;

        let status = last_line(&output.stderr);
        if !output.status.success() {
            let status = if status.is_empty() {
                format!("gpg exited with {}", output.status)
            } else {
                status
            };
            return Ok(EngineOutput::failure(status, output.stdout));
        }
        // A clean exit after closing stdin early is gpg's call to make.
        if let Err(e) = write_result
            .or_else(|e| match e.kind() {
                std::io::ErrorKind::BrokenPipe => Ok(()),
                _ => Err(e),
            })
        {
            return Ok(EngineOutput::failure(
                format!("gpg closed its input early: {e}"),
                output.stdout,
            ));
        }

        Ok(EngineOutput::success(output.stdout))
    }
}

impl CipherEngine for GpgEngine {
    fn encrypt(&self, plaintext: &[u8], recipient: &Recipient) -> Result<EngineOutput> {
        self.run(
            &["--armor", "--encrypt", "--recipient", recipient.as_str()],
            plaintext,
        )
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<EngineOutput> {
        self.run(&["--decrypt"], ciphertext)
    }
}

fn last_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}
