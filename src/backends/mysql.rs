use super::{network_url, BackendDescriptor};
use crate::drivers::MYSQL_DRIVER_ID;
use crate::error::Result;
use crate::traits::{BindingMode, ConnectionProvider, ParameterBinder};

/// A MySQL server reached over the network.
#[derive(Debug, Clone)]
pub struct MySql {
    descriptor: BackendDescriptor,
    binding_mode: BindingMode,
}

impl MySql {
    /// `server` is `host` or `host:port`.
    pub fn new(server: &str, database: &str, user: &str, password: &str) -> Result<Self> {
        let url = network_url("mysql", server, database, user, password)?;
        Ok(Self {
            descriptor: BackendDescriptor::new(MYSQL_DRIVER_ID, url),
            binding_mode: BindingMode::default(),
        })
    }

    pub fn with_binding_mode(mut self, mode: BindingMode) -> Self {
        self.binding_mode = mode;
        self
    }

    pub fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }
}

impl ConnectionProvider for MySql {
    fn driver_id(&self) -> &str {
        self.descriptor.driver_id()
    }

    fn connection_url(&self) -> &str {
        self.descriptor.url()
    }
}

impl ParameterBinder for MySql {
    fn binding_mode(&self) -> BindingMode {
        self.binding_mode
    }
}
