/// Write a delivered byte stream to a named file.
///
/// The name was already consumed from the hand-off slot, so the caller
/// is that name's only owner; nothing here touches shared state.
use axum::body::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_stream::{Stream, StreamExt};

/// Errors that can occur while saving an upload.
#[derive(Debug)]
pub enum SaveError {
    /// Failed to create the destination file.
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read the next chunk from the upload stream.
    Read { message: String },
    /// Failed to write or flush the destination file.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Create { path, source } => {
                write!(f, "failed to create {}: {}", path.display(), source)
            }
            SaveError::Read { message } => {
                write!(f, "failed to read upload body: {}", message)
            }
            SaveError::Write { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Create { source, .. } => Some(source),
            SaveError::Read { .. } => None,
            SaveError::Write { source, .. } => Some(source),
        }
    }
}

/// Create (or overwrite) `dir/name` and copy the stream into it until
/// exhausted. Returns the resolved absolute path of the saved file.
///
/// A failure aborts the save and may leave a partial file behind; the
/// consumed name is not re-armed, so the operator has to arm it again
/// and have the client retry.
pub async fn save_stream<S, E>(dir: &Path, name: &str, mut body: S) -> Result<PathBuf, SaveError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let path = dir.join(name);
    let mut file = File::create(&path).await.map_err(|e| SaveError::Create {
        path: path.clone(),
        source: e,
    })?;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| SaveError::Read {
            message: e.to_string(),
        })?;
        file.write_all(&chunk).await.map_err(|e| SaveError::Write {
            path: path.clone(),
            source: e,
        })?;
    }

    file.flush().await.map_err(|e| SaveError::Write {
        path: path.clone(),
        source: e,
    })?;

    Ok(resolve(path).await)
}

/// Absolute form of `path` for the saved-file log line. Falls back to
/// joining onto the working directory when `canonicalize` fails.
async fn resolve(path: PathBuf) -> PathBuf {
    match tokio::fs::canonicalize(&path).await {
        Ok(resolved) => resolved,
        Err(_) => match std::env::current_dir() {
            Ok(cwd) => cwd.join(&path),
            Err(_) => path,
        },
    }
}
