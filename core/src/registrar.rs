//! Control-plane registration: making the device reachable under a
//! well-known name, and unreachable again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use thiserror::Error;
use tracing::info;

use keystack_utils::{atomic_write, remove_if_exists};

#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("failed to publish endpoint {name}: {source}")]
    Publish { name: String, source: io::Error },
    #[error("failed to withdraw endpoint {name}: {source}")]
    Withdraw { name: String, source: io::Error },
}

/// Publishes and withdraws the endpoint. Both calls must be idempotent.
pub trait Registrar: Send + Sync {
    fn publish(&self, name: &str) -> Result<(), RegistrarError>;
    fn withdraw(&self, name: &str) -> Result<(), RegistrarError>;
}

/// Registrar with no side effects, for in-process use where nothing external
/// needs to discover the endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRegistrar;

impl Registrar for NullRegistrar {
    fn publish(&self, _name: &str) -> Result<(), RegistrarError> {
        Ok(())
    }

    fn withdraw(&self, _name: &str) -> Result<(), RegistrarError> {
        Ok(())
    }
}

/// Publishes an endpoint as a descriptor file `<dir>/<name>`.
///
/// The file appears atomically on publish and is removed on withdraw, so its
/// presence mirrors whether the endpoint is reachable.
#[derive(Debug, Clone)]
pub struct EndpointFileRegistrar {
    dir: PathBuf,
}

impl EndpointFileRegistrar {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn endpoint_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Registrar for EndpointFileRegistrar {
    fn publish(&self, name: &str) -> Result<(), RegistrarError> {
        let path = self.endpoint_path(name);
        let descriptor = format!("name={name}\npid={}\n", process::id());
        fs::create_dir_all(&self.dir)
            .and_then(|()| atomic_write(&path, descriptor.as_bytes()))
            .map_err(|source| RegistrarError::Publish {
                name: name.to_string(),
                source,
            })?;
        info!(path = %path.display(), "Endpoint published");
        Ok(())
    }

    fn withdraw(&self, name: &str) -> Result<(), RegistrarError> {
        let path = self.endpoint_path(name);
        let removed = remove_if_exists(&path).map_err(|source| RegistrarError::Withdraw {
            name: name.to_string(),
            source,
        })?;
        if removed {
            info!(path = %path.display(), "Endpoint withdrawn");
        }
        Ok(())
    }
}
