//! [`DiskFileStorage`]: attachment bytes kept as flat files in one directory.
//!
//! A handle is `<uuid>.<digest>`, where `<digest>` is the first 16 hex
//! characters of the SHA-256 of the bytes. Every upload gets a fresh uuid, so
//! two documents never share a file even when their bytes are identical, and
//! discarding one attachment cannot break another.

use std::path::{Path, PathBuf};

use docket_core::storage::{FileHandle, FileStorage};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Error, Result};

const DIGEST_LEN: usize = 16;

fn digest(bytes: &[u8]) -> String {
  let mut hex = hex::encode(Sha256::digest(bytes));
  hex.truncate(DIGEST_LEN);
  hex
}

pub struct DiskFileStorage {
  root: PathBuf,
}

impl DiskFileStorage {
  /// Use `root` as the storage directory, creating it if needed.
  pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Resolve `handle` to a path inside the root, refusing anything that is
  /// not exactly `<uuid>.<digest>`.
  fn locate<'h>(&self, handle: &'h FileHandle) -> Result<(PathBuf, &'h str)> {
    let bad = || Error::BadHandle(handle.to_string());
    let (id, digest) = handle.as_str().split_once('.').ok_or_else(bad)?;
    let id = Uuid::try_parse(id).map_err(|_| bad())?;
    if digest.len() != DIGEST_LEN || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
      return Err(bad());
    }
    Ok((self.root.join(format!("{}.{digest}", id.simple())), digest))
  }
}

impl FileStorage for DiskFileStorage {
  type Error = Error;

  async fn store(&self, bytes: Vec<u8>, name: String) -> Result<FileHandle> {
    let handle = FileHandle(format!("{}.{}", Uuid::new_v4().simple(), digest(&bytes)));
    let (path, _) = self.locate(&handle)?;

    // Write beside the target and rename so a crash never leaves a torn file
    // under a valid handle.
    let partial = path.with_extension("partial");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, &path).await?;

    tracing::debug!(%handle, %name, size = bytes.len(), "stored file");
    Ok(handle)
  }

  async fn retrieve(&self, handle: &FileHandle) -> Result<Option<Vec<u8>>> {
    let (path, expected) = self.locate(handle)?;
    let bytes = match tokio::fs::read(&path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };
    if digest(&bytes) != expected {
      return Err(Error::Corrupt(handle.to_string()));
    }
    Ok(Some(bytes))
  }

  async fn delete(&self, handle: &FileHandle) -> Result<()> {
    let (path, _) = self.locate(handle)?;
    match tokio::fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}
