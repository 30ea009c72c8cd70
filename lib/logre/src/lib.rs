//! Logre: model-driven administration of RDF triple stores.
//!
//! A [`DataBundle`] groups a data graph, a model graph and a metadata graph living on one SPARQL
//! endpoint. It loads the [`Model`](logre_schema::Model) of its data and compiles browsing
//! operations (entity cards, statements, paginated data tables) and bulk exports into SPARQL.
//!
//! Data bundles are described in the configuration file managed by the [`ConfigStore`].
//!
//! ```no_run
//! use logre::{ConfigStore, DataTableOptions, Settings};
//!
//! # async fn run() -> Result<(), logre::LogreError> {
//! let store = ConfigStore::load("logre.json", Settings::from_env())?;
//! let bundle = store.build_bundle("People")?;
//! let table = bundle
//!     .get_data_table("crm:E21", &DataTableOptions { limit: Some(10), ..Default::default() })
//!     .await?;
//! println!("{}", table.to_csv()?);
//! # Ok(())
//! # }
//! ```

mod bundle;
mod cache;
mod config;
mod entity;
mod error;
mod export;
mod settings;
mod table;

pub use bundle::{DataBundle, DataBundleOptions, GraphSelector};
pub use config::*;
pub use error::*;
pub use export::*;
pub use settings::*;
pub use table::*;
