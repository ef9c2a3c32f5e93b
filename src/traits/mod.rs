mod binder;
mod driver;
mod mapper;
mod provider;

pub use binder::{bind_positional, BindReport, BindingMode, ParameterBinder, SkippedArgument};
pub use driver::{Connection, Cursor, Driver, GeneratedKeys, Statement};
pub use mapper::ResultMapper;
pub use provider::ConnectionProvider;

/// A complete backend: where to connect and how to bind arguments.
pub trait Backend: ConnectionProvider + ParameterBinder {}

impl<T: ConnectionProvider + ParameterBinder + ?Sized> Backend for T {}
