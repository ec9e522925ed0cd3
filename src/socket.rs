//! Listening and connecting endpoints on local socket paths.

use std::fs;
use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;

use crate::error::RelayError;

/// Bind the listening socket, replacing a stale socket file left behind by
/// a previous run.
pub fn bind(path: &Path) -> Result<UnixListener, RelayError> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(RelayError::Bind {
                path: path.to_owned(),
                source,
            })
        }
    }
    UnixListener::bind(path).map_err(|source| RelayError::Bind {
        path: path.to_owned(),
        source,
    })
}

pub fn connect(path: &Path) -> Result<UnixStream, RelayError> {
    UnixStream::connect(path).map_err(|source| RelayError::Connect {
        path: path.to_owned(),
        source,
    })
}
