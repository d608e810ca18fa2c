//! Disk-backed logo byte store

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::debug;

/// Warmed logo bytes keyed by URI, persisted in a fjall partition so logos
/// survive across runs. Store failures are never fatal: opening problems
/// degrade to a process-local memory store, and read/write problems degrade
/// to a miss.
pub struct LogoStore {
    backend: Backend,
}

enum Backend {
    Disk {
        _keyspace: Keyspace,
        partition: PartitionHandle,
    },
    Memory(Mutex<HashMap<String, Vec<u8>>>),
}

impl LogoStore {
    pub fn open(path: &Path) -> Self {
        let opened = fjall::Config::new(path).open().and_then(|keyspace| {
            let partition = keyspace.open_partition("logos", PartitionCreateOptions::default())?;
            Ok(Backend::Disk {
                _keyspace: keyspace,
                partition,
            })
        });
        match opened {
            Ok(backend) => Self { backend },
            Err(error) => {
                debug!(%error, path = %path.display(), "Logo store unavailable, using memory");
                Self::in_memory()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(HashMap::new())),
        }
    }

    pub fn contains(&self, uri: &str) -> bool {
        match &self.backend {
            Backend::Disk { partition, .. } => match partition.contains_key(uri) {
                Ok(found) => found,
                Err(error) => {
                    debug!(%error, "Logo store lookup failed");
                    false
                }
            },
            Backend::Memory(map) => map.lock().unwrap().contains_key(uri),
        }
    }

    pub fn get(&self, uri: &str) -> Option<Vec<u8>> {
        match &self.backend {
            Backend::Disk { partition, .. } => match partition.get(uri) {
                Ok(bytes) => bytes.map(|slice| slice.to_vec()),
                Err(error) => {
                    debug!(%error, "Logo store read failed");
                    None
                }
            },
            Backend::Memory(map) => map.lock().unwrap().get(uri).cloned(),
        }
    }

    pub fn put(&self, uri: &str, bytes: &[u8]) {
        match &self.backend {
            Backend::Disk { partition, .. } => {
                if let Err(error) = partition.insert(uri, bytes) {
                    debug!(%error, "Logo store write failed");
                }
            }
            Backend::Memory(map) => {
                map.lock().unwrap().insert(uri.to_string(), bytes.to_vec());
            }
        }
    }
}
