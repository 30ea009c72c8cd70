//! Models of Logre.
//!
//! A [`Model`] describes the classes of a data bundle and the properties shown on their cards. It
//! is either extracted from SHACL shapes ([`ModelFramework::Shacl`]) or inferred from the data
//! ([`ModelFramework::NoFramework`]).

mod error;
mod framework;
mod inferred;
mod model;
mod rows;
mod shacl;

pub use error::*;
pub use framework::*;
pub use inferred::{inferred_classes_query, inferred_properties_query, load_inferred};
pub use model::*;
pub use shacl::{load_shacl, shacl_classes_query, shacl_properties_query};
