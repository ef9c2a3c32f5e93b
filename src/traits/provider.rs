/// Trait identifying how to reach a backend.
pub trait ConnectionProvider {
    /// Identifier of the driver that must be registered before connecting.
    fn driver_id(&self) -> &str;

    /// Fully formed connection URL, credentials embedded when required.
    /// Never log this value.
    fn connection_url(&self) -> &str;
}
