use std::path::{Path, PathBuf};

use super::BackendDescriptor;
use crate::drivers::MS_ACCESS_DRIVER_ID;
use crate::traits::{BindingMode, ConnectionProvider, ParameterBinder};

/// An MS Access database file (`.mdb` / `.accdb`).
///
/// No driver ships for this backend; register one under
/// [`MS_ACCESS_DRIVER_ID`] before running queries against it.
#[derive(Debug, Clone)]
pub struct MsAccess {
    path: PathBuf,
    descriptor: BackendDescriptor,
    binding_mode: BindingMode,
}

impl MsAccess {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let url = format!("ucanaccess://{}", path.display());
        Self {
            path,
            descriptor: BackendDescriptor::new(MS_ACCESS_DRIVER_ID, url),
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

impl ConnectionProvider for MsAccess {
    fn driver_id(&self) -> &str {
        self.descriptor.driver_id()
    }

    fn connection_url(&self) -> &str {
        self.descriptor.url()
    }
}

impl ParameterBinder for MsAccess {
    fn binding_mode(&self) -> BindingMode {
        self.binding_mode
    }
}
