//! SPARQL driver of Logre.
//!
//! A [`SparqlDriver`] talks to one endpoint. The supported back-ends are listed in
//! [`EndpointTechnology`]. They share one contract and only differ in a handful of details
//! (upload URLs, graph parameters, duplicate handling).
//!
//! A [`Graph`] is a handle on a named graph of an endpoint. It scopes queries and writes to that
//! graph and serializes its content.

mod csv_import;
mod driver;
mod error;
mod graph;
mod query;
mod results;
mod technology;

pub use csv_import::*;
pub use driver::*;
pub use error::*;
pub use graph::*;
pub use query::*;
pub use results::*;
pub use technology::*;
