//! External engine processes.

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use tokio::process::Command;

use crate::error::PdfError;

/// Run `program` with `args` to completion. Standard output is discarded and
/// standard error is captured for the failure message.
pub async fn run<I, S>(program: &Path, args: I) -> Result<(), PdfError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program.display().to_string();
    let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    log::info!("Running {name} {}", render_args(&args));

    let output = Command::new(program)
        .args(&args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => PdfError::NotInstalled {
                program: name.clone(),
            },
            _ => PdfError::Spawn {
                program: name.clone(),
                source,
            },
        })?;

    if output.status.success() {
        log::debug!("{name} finished");
        return Ok(());
    }
    Err(PdfError::ProcessFailed {
        program: name,
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

fn render_args(args: &[std::ffi::OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
