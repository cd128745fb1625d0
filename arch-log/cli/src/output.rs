//! Writing results to the terminal.

use std::io;
use std::process::{ExitStatus, Stdio};

use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("writing output: {0}")]
    Write(#[source] io::Error),

    #[error("running PAGER '{command}': {source}")]
    PagerSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("running PAGER '{command}': {status}")]
    PagerStatus { command: String, status: ExitStatus },
}

/// Writes to stdout and flushes.
pub async fn write_stdout(data: &[u8]) -> Result<(), OutputError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(data).await.map_err(OutputError::Write)?;
    stdout.flush().await.map_err(OutputError::Write)
}

/// Splits a `PAGER` value into program and arguments.
///
/// Returns `None` for an empty or blank value.
pub fn pager_command(raw: &str) -> Option<Vec<String>> {
    let args: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
    (!args.is_empty()).then_some(args)
}

/// Shows a PKGBUILD through `$PAGER`, or on stdout if none is set.
pub async fn show_pkgbuild(body: Bytes) -> Result<(), OutputError> {
    let pager = std::env::var("PAGER").ok();
    match pager.as_deref().and_then(pager_command) {
        Some(args) => {
            debug!("'PAGER' set as '{}'", args.join(" "));
            page(&args, body).await
        }
        None => write_stdout(&body).await,
    }
}

/// Pipes `body` into the pager and waits for it to exit.
///
/// The body is written by a detached task and write errors are ignored: a
/// pager may quit before reading everything. Only the pager's exit status
/// decides success.
pub async fn page(args: &[String], body: Bytes) -> Result<(), OutputError> {
    let command = args.join(" ");
    let Some((program, rest)) = args.split_first() else {
        return write_stdout(&body).await;
    };

    let mut child = Command::new(program)
        .args(rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| OutputError::PagerSpawn {
            command: command.clone(),
            source,
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(&body).await {
                debug!("Pager stopped reading: {}", e);
            }
        });
    }

    let status = child
        .wait()
        .await
        .map_err(|source| OutputError::PagerSpawn {
            command: command.clone(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(OutputError::PagerStatus { command, status })
    }
}
