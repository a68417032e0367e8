//! The file-storage collaborator.
//!
//! The core only ever holds a [`FileHandle`]; the bytes live wherever the
//! storage implementation puts them. [`MemoryFileStorage`] keeps them in a
//! map and backs ephemeral deployments and tests.

use std::{
  collections::HashMap,
  fmt,
  future::Future,
  sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
  },
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque reference to stored bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHandle(pub String);

impl FileHandle {
  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for FileHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

pub trait FileStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `bytes` and return a handle to them. `name` is the original
  /// file name, kept only as a hint.
  fn store(
    &self,
    bytes: Vec<u8>,
    name: String,
  ) -> impl Future<Output = Result<FileHandle, Self::Error>> + Send + '_;

  /// Fetch the bytes behind `handle`. Returns `None` if nothing is stored.
  fn retrieve<'a>(
    &'a self,
    handle: &'a FileHandle,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send + 'a;

  /// Remove the bytes behind `handle`. Deleting a missing handle is not an
  /// error.
  fn delete<'a>(
    &'a self,
    handle: &'a FileHandle,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── In-memory implementation ────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("file storage lock poisoned")]
pub struct PoisonedStorage;

#[derive(Debug, Default)]
pub struct MemoryFileStorage {
  next:  AtomicU64,
  files: Mutex<HashMap<FileHandle, Vec<u8>>>,
}

impl MemoryFileStorage {
  pub fn new() -> Self { Self::default() }

  /// Number of files currently held.
  pub fn len(&self) -> usize { self.files.lock().map(|f| f.len()).unwrap_or(0) }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl FileStorage for MemoryFileStorage {
  type Error = PoisonedStorage;

  async fn store(&self, bytes: Vec<u8>, name: String) -> Result<FileHandle, PoisonedStorage> {
    let n = self.next.fetch_add(1, Ordering::Relaxed);
    let handle = FileHandle(format!("mem-{n}-{name}"));
    self
      .files
      .lock()
      .map_err(|_| PoisonedStorage)?
      .insert(handle.clone(), bytes);
    Ok(handle)
  }

  async fn retrieve<'a>(&'a self, handle: &'a FileHandle) -> Result<Option<Vec<u8>>, PoisonedStorage> {
    Ok(self.files.lock().map_err(|_| PoisonedStorage)?.get(handle).cloned())
  }

  async fn delete<'a>(&'a self, handle: &'a FileHandle) -> Result<(), PoisonedStorage> {
    self.files.lock().map_err(|_| PoisonedStorage)?.remove(handle);
    Ok(())
  }
}
