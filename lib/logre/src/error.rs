use logre_driver::DriverError;
use logre_model::PrefixError;
use logre_schema::ModelError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// An error raised by a data bundle or the configuration store.
#[derive(Debug, Error)]
pub enum LogreError {
    /// A read operation that needs a named node was given a blank node.
    #[error("Can't get info of blank node {0}")]
    CantGetInfoOfBlankNode(String),
    #[error("Expected a URI, got an empty string")]
    EmptyUri,
    /// A URI that cannot be written in a SPARQL query.
    #[error("'{0}' is not a valid URI")]
    InvalidUri(String),
    /// No data bundle of the configuration uses this endpoint.
    #[error("Endpoint '{0}' does not exist")]
    NotExistingEndpoint(String),
    #[error("Data bundle '{0}' does not exist")]
    NotExistingDataBundle(String),
    /// A graph selector other than `data`, `model` or `metadata`.
    #[error("Unknown graph '{0}', expected 'data', 'model' or 'metadata'")]
    UnknownGraph(String),
    /// A data table column that does not match any card property of the class.
    #[error("Class {class} has no column '{column}'")]
    UnknownColumn { class: String, column: String },
    #[error(transparent)]
    Prefix(#[from] PrefixError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Could not access the configuration file {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid configuration document: {0}")]
    ConfigFormat(#[from] serde_json::Error),
    /// A table could not be written as CSV.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
