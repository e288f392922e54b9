//! Filesystem-backed blob store.
//!
//! Bytes live at `<root>/<hash>`; metadata lives in a JSON sidecar at
//! `<root>/<hash>.meta.json`. The sidecar carries a generation counter that
//! backs the optimistic-concurrency precondition on metadata writes. This
//! backend targets single-host deployments and tests; a real object store
//! adapter would satisfy the same trait.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::instrument;

use crate::stores::{BlobMetadata, BlobStore, BlobStoreError};

/// On-disk shape of the metadata sidecar.
#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    file_names: BTreeSet<String>,
    size: u64,
    generation: u64,
    updated_at: String,
}

impl Sidecar {
    fn fresh(size: u64) -> Self {
        Self {
            file_names: BTreeSet::new(),
            size,
            generation: 0,
            updated_at: Utc::now().to_rfc3339(),
        }
    }
}

impl From<Sidecar> for BlobMetadata {
    fn from(s: Sidecar) -> Self {
        BlobMetadata {
            file_names: s.file_names,
            size: s.size,
            generation: s.generation,
        }
    }
}

/// Blob store rooted at a local directory.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates a store rooted at the provided path. The directory is
    /// created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.meta.json"))
    }

    async fn read_sidecar(&self, key: &str) -> Result<Option<Sidecar>, BlobStoreError> {
        let path = self.sidecar_path(key);
        match fs::read(&path).await {
            Ok(raw) => {
                let sidecar = serde_json::from_slice(&raw).map_err(|e| BlobStoreError::Backend {
                    message: format!("sidecar decode for {key}: {e}"),
                })?;
                Ok(Some(sidecar))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobStoreError::Backend {
                message: format!("sidecar read for {key}: {e}"),
            }),
        }
    }

    async fn write_sidecar(&self, key: &str, sidecar: &Sidecar) -> Result<(), BlobStoreError> {
        let raw = serde_json::to_vec_pretty(sidecar).map_err(|e| BlobStoreError::Backend {
            message: format!("sidecar encode for {key}: {e}"),
        })?;
        fs::write(self.sidecar_path(key), raw)
            .await
            .map_err(|e| BlobStoreError::Backend {
                message: format!("sidecar write for {key}: {e}"),
            })
    }

    async fn blob_size(&self, key: &str) -> Result<u64, BlobStoreError> {
        let meta = fs::metadata(self.blob_path(key))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => BlobStoreError::NotFound {
                    key: key.to_string(),
                },
                _ => BlobStoreError::Backend {
                    message: format!("stat for {key}: {e}"),
                },
            })?;
        Ok(meta.len())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    #[instrument(skip(self), err)]
    async fn exists(&self, key: &str) -> Result<bool, BlobStoreError> {
        fs::try_exists(self.blob_path(key))
            .await
            .map_err(|e| BlobStoreError::Backend {
                message: format!("exists check for {key}: {e}"),
            })
    }

    #[instrument(skip(self, bytes), fields(len = bytes.len()), err)]
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobStoreError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BlobStoreError::Backend {
                message: format!("create blob root: {e}"),
            })?;
        fs::write(self.blob_path(key), bytes)
            .await
            .map_err(|e| BlobStoreError::Backend {
                message: format!("blob write for {key}: {e}"),
            })?;
        // Seed the sidecar so the first metadata read sees generation 0.
        if self.read_sidecar(key).await?.is_none() {
            self.write_sidecar(key, &Sidecar::fresh(bytes.len() as u64))
                .await?;
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get_metadata(&self, key: &str) -> Result<BlobMetadata, BlobStoreError> {
        match self.read_sidecar(key).await? {
            Some(sidecar) => Ok(sidecar.into()),
            // Blob present but no sidecar (e.g. written out-of-band):
            // synthesize default metadata at generation 0.
            None => Ok(BlobMetadata {
                file_names: BTreeSet::new(),
                size: self.blob_size(key).await?,
                generation: 0,
            }),
        }
    }

    #[instrument(skip(self, file_names), err)]
    async fn set_metadata(
        &self,
        key: &str,
        file_names: BTreeSet<String>,
        if_generation: u64,
    ) -> Result<(), BlobStoreError> {
        let current = match self.read_sidecar(key).await? {
            Some(sidecar) => sidecar,
            None => Sidecar::fresh(self.blob_size(key).await?),
        };
        if current.generation != if_generation {
            return Err(BlobStoreError::PreconditionFailed {
                key: key.to_string(),
            });
        }
        let next = Sidecar {
            file_names,
            size: current.size,
            generation: current.generation + 1,
            updated_at: Utc::now().to_rfc3339(),
        };
        self.write_sidecar(key, &next).await
    }
}
