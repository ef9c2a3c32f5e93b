use super::{MsAccess, MySql, Postgres, Sqlite};
use crate::traits::{BindingMode, ConnectionProvider, ParameterBinder};

/// Any of the built-in backends, chosen at runtime (e.g. from configuration).
#[derive(Debug, Clone)]
pub enum AnyBackend {
    MsAccess(MsAccess),
    MySql(MySql),
    Postgres(Postgres),
    Sqlite(Sqlite),
}

macro_rules! delegate {
    ($self:ident, $backend:ident => $body:expr) => {
        match $self {
            AnyBackend::MsAccess($backend) => $body,
            AnyBackend::MySql($backend) => $body,
            AnyBackend::Postgres($backend) => $body,
            AnyBackend::Sqlite($backend) => $body,
        }
    };
}

impl ConnectionProvider for AnyBackend {
    fn driver_id(&self) -> &str {
        delegate!(self, b => b.driver_id())
    }

    fn connection_url(&self) -> &str {
        delegate!(self, b => b.connection_url())
    }
}

impl ParameterBinder for AnyBackend {
    fn binding_mode(&self) -> BindingMode {
        delegate!(self, b => b.binding_mode())
    }
}

impl From<MsAccess> for AnyBackend {
    fn from(backend: MsAccess) -> Self {
        AnyBackend::MsAccess(backend)
    }
}

impl From<MySql> for AnyBackend {
    fn from(backend: MySql) -> Self {
        AnyBackend::MySql(backend)
    }
}

impl From<Postgres> for AnyBackend {
    fn from(backend: Postgres) -> Self {
        AnyBackend::Postgres(backend)
    }
}

impl From<Sqlite> for AnyBackend {
    fn from(backend: Sqlite) -> Self {
        AnyBackend::Sqlite(backend)
    }
}
