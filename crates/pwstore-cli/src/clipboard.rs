//! Clipboard output adapter.
//!
//! The record service never depends on this; the CLI resolves a field value
//! and hands it over. The first helper program found on `PATH` wins.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{anyhow, bail, Context, Result};

/// Helper programs tried in order, with their arguments.
const HELPERS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip.exe", &[]),
];

/// Put `value` on the system clipboard.
pub fn copy(value: &str) -> Result<()> {
    for (program, args) in HELPERS {
        let child = Command::new(program)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e).with_context(|| format!("failed to start {program}")),
        };

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("{program} stdin unavailable"))?;
            stdin
                .write_all(value.as_bytes())
                .with_context(|| format!("failed to write to {program}"))?;
        }

        let status = child.wait().with_context(|| format!("{program} did not finish"))?;
        if !status.success() {
            bail!("{program} exited with {status}");
        }
        log::debug!("copied value with {program}");
        return Ok(());
    }

    bail!(
        "no clipboard helper found (install one of: {})",
        HELPERS
            .iter()
            .map(|(p, _)| *p)
            .collect::<Vec<_>>()
            .join(", ")
    )
}
