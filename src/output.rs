//! Persists the issued artifacts.
//!
//! Both files are first written to hidden temporary siblings and only renamed
//! into place once both were written completely, so a reader never sees a
//! truncated PEM block or a key without its request.
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::CsrKitError;
use crate::issue::IssuedRequest;

/// Default file name of the certification request.
pub const CSR_FILE_NAME: &str = "rsa.csr";

/// Default file name of the private key.
pub const KEY_FILE_NAME: &str = "rsa.key";

/// Locations the artifacts were written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub csr: PathBuf,
    pub key: PathBuf,
}

impl ArtifactPaths {
    /// The default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            csr: dir.join(CSR_FILE_NAME),
            key: dir.join(KEY_FILE_NAME),
        }
    }
}

/// Writes the request and the key to `paths` with the suggested modes.
#[instrument(name = "write_artifacts", skip(issued))]
pub fn write_artifacts(issued: &IssuedRequest, paths: &ArtifactPaths) -> Result<(), CsrKitError> {
    let staged_key = staging_path(&paths.key)?;
    let staged_csr = staging_path(&paths.csr)?;
    // Leftovers of an interrupted run.
    let _ = fs::remove_file(&staged_key);
    let _ = fs::remove_file(&staged_csr);

    let mut key_in_place = false;
    let result = write_new(&staged_key, issued.key_pem.as_bytes(), issued.key_mode)
        .and_then(|()| write_new(&staged_csr, issued.csr_pem.as_bytes(), issued.csr_mode))
        .and_then(|()| {
            fs::rename(&staged_key, &paths.key)?;
            key_in_place = true;
            fs::rename(&staged_csr, &paths.csr)?;
            Ok(())
        });

    if result.is_err() {
        let _ = fs::remove_file(&staged_key);
        let _ = fs::remove_file(&staged_csr);
        if key_in_place {
            let _ = fs::remove_file(&paths.key);
        }
    }
    result?;

    debug!(csr = %paths.csr.display(), key = %paths.key.display(), "wrote artifacts");
    Ok(())
}

fn staging_path(target: &Path) -> Result<PathBuf, CsrKitError> {
    let file_name = target.file_name().ok_or_else(|| {
        CsrKitError::IoError(format!("{} does not name a file", target.display()))
    })?;
    let mut staged = std::ffi::OsString::from(".");
    staged.push(file_name);
    staged.push(".tmp");
    Ok(target.with_file_name(staged))
}

fn write_new(path: &Path, contents: &[u8], mode: u32) -> Result<(), CsrKitError> {
    let mut file = create_with_mode(path, mode)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(unix)]
fn create_with_mode(path: &Path, mode: u32) -> Result<File, CsrKitError> {
    use std::os::unix::fs::OpenOptionsExt;

    Ok(OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)?)
}

#[cfg(not(unix))]
fn create_with_mode(path: &Path, _mode: u32) -> Result<File, CsrKitError> {
    Ok(OpenOptions::new().write(true).create_new(true).open(path)?)
}
