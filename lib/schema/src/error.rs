use logre_driver::DriverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// The configured model framework is unknown.
    #[error("Model framework '{0}' is not supported")]
    ModelFrameworkNotSupported(String),
    /// The model could not be read from the endpoint.
    #[error(transparent)]
    Driver(#[from] DriverError),
}
