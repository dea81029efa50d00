use crate::error::Error;
use std::path::Path;
use std::process::Command;

/// Opens an image for the user to look at.
///
/// The orchestration treats viewing as a convenience step; implementations
/// must not block on the viewer closing.
pub trait ImageOpener {
    fn open(&self, path: &Path) -> Result<(), Error>;
}

/// Hands the file to the host's default application: `open` on macOS,
/// `start` on Windows, `xdg-open` everywhere else. Fire-and-forget.
pub struct SystemOpener;

impl ImageOpener for SystemOpener {
    fn open(&self, path: &Path) -> Result<(), Error> {
        let mut command = if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(path);
            cmd
        } else if cfg!(target_os = "windows") {
            // `start` is a cmd builtin; the empty string is the window title.
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(path);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            cmd
        };

        command
            .spawn()
            .map(|_| ())
            .map_err(|source| Error::Viewer {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Opener that does nothing. For headless runs and tests.
pub struct NoopOpener;

impl ImageOpener for NoopOpener {
    fn open(&self, _path: &Path) -> Result<(), Error> {
        Ok(())
    }
}
