use oxttl::TurtleParseError;
use sparesults::QueryResultsParseError;
use thiserror::Error;

/// An error raised while talking to a SPARQL endpoint.
///
/// The driver never retries. Writes that fail in the middle of a chunked operation leave the
/// endpoint partially written.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The endpoint answered with a non-2xx status, or did not answer in time.
    ///
    /// The body often contains the parse error reported by the endpoint.
    #[error("HTTP error {status} ({reason}): {body}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },
    /// The endpoint could not be reached (DNS, TCP, TLS, ...).
    #[error("Could not connect to the endpoint: {0}")]
    Connection(#[source] reqwest::Error),
    /// A CSV document could not be imported.
    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),
    /// The configured endpoint technology is unknown.
    #[error("Endpoint technology '{0}' is not supported")]
    EndpointTechnologyNotSupported(String),
    /// A triple passed to a write operation has an empty position, or an IRI that cannot be
    /// written in SPARQL.
    #[error("Triple has an empty or invalid position: {0}")]
    IncompleteTriple(String),
    /// The SPARQL results returned by the endpoint could not be parsed.
    #[error(transparent)]
    Results(#[from] QueryResultsParseError),
    /// The RDF returned by the endpoint could not be parsed.
    #[error(transparent)]
    Rdf(#[from] TurtleParseError),
}

impl DriverError {
    /// Maps a transport error. Timeouts are reported like gateway timeouts so that callers can
    /// treat them the same way as a failing endpoint.
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            DriverError::Http {
                status: 504,
                reason: "Gateway Timeout".to_owned(),
                body: error.to_string(),
            }
        } else {
            DriverError::Connection(error)
        }
    }

    /// Returns the HTTP status if this is an [`DriverError::Http`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            DriverError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<csv::Error> for DriverError {
    fn from(error: csv::Error) -> Self {
        DriverError::MalformedCsv(error.to_string())
    }
}
