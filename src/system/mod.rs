use anyhow::{bail, Context};
use std::path::Path;
use std::process::{Command, Stdio};

/// The command that hands a file to the desktop's default application.
pub fn opener() -> (&'static str, &'static [&'static str]) {
    match std::env::consts::OS {
        "macos" => ("open", &[]),
        "windows" => ("cmd", &["/C", "start", ""]),
        _ => ("xdg-open", &[]),
    }
}

/// Opens `path` in the default browser without waiting for it.
pub fn open_in_browser(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }

    let (program, args) = opener();
    Command::new(program)
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("launch {program} for {}", path.display()))?;
    Ok(())
}
