//! External command execution.
//!
//! Asset bundles may be piped through a third-party filter (a Sass compiler,
//! a JS minifier); this module runs those commands with the bundle on stdin
//! and returns whatever they print on stdout.

use anyhow::{Context, Result, anyhow, bail};
use std::{
    io::Write,
    path::Path,
    process::{Command, Stdio},
    thread,
};

/// Run `cmd` in `root`, feed `input` to its stdin and return its stdout.
///
/// # Errors
/// Returns error if the command cannot be spawned or exits with non-zero status.
/// The command's stderr is included in the error message.
pub fn pipe_through(root: &Path, cmd: &[String], input: &[u8]) -> Result<Vec<u8>> {
    let (name, args) = cmd
        .split_first()
        .ok_or_else(|| anyhow!("Empty command"))?;

    let mut child = Command::new(name)
        .args(args)
        .current_dir(root)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    // Stdin is fed from a separate thread while stdout is drained
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("Failed to open stdin of `{name}`"))?;
    let input = input.to_vec();
    let writer = thread::spawn(move || stdin.write_all(&input));

    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed to wait for `{name}`"))?;

    let written = writer
        .join()
        .map_err(|_| anyhow!("Failed to join stdin writer thread"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("Command `{name}` failed with {}\n{}", output.status, stderr.trim_end());
    }
    written.with_context(|| format!("Failed to write stdin of `{name}`"))?;

    Ok(output.stdout)
}
