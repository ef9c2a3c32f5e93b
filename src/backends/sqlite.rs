use std::path::{Path, PathBuf};

use super::BackendDescriptor;
use crate::drivers::SQLITE_DRIVER_ID;
use crate::traits::{BindingMode, ConnectionProvider, ParameterBinder};

/// A SQLite database file, or `:memory:`.
///
/// Each engine call opens its own connection, so `:memory:` databases do not
/// survive between calls.
#[derive(Debug, Clone)]
pub struct Sqlite {
    path: PathBuf,
    descriptor: BackendDescriptor,
    binding_mode: BindingMode,
}

impl Sqlite {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let url = format!("sqlite://{}", path.display());
        Self {
            path,
            descriptor: BackendDescriptor::new(SQLITE_DRIVER_ID, url),
            binding_mode: BindingMode::default(),
        }
    }

    pub fn with_binding_mode(mut self, mode: BindingMode) -> Self {
        self.binding_mode = mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }
}

impl ConnectionProvider for Sqlite {
    fn driver_id(&self) -> &str {
        self.descriptor.driver_id()
    }

    fn connection_url(&self) -> &str {
        self.descriptor.url()
    }
}

impl ParameterBinder for Sqlite {
    fn binding_mode(&self) -> BindingMode {
        self.binding_mode
    }
}
