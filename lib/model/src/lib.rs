//! Core vocabulary of Logre.
//!
//! This crate contains everything that can be expressed without talking to an endpoint:
//! - the [`PrefixTable`] that maps short prefix names to namespaces,
//! - the URI normalizer ([`PrefixTable::normalize`]) that turns user-supplied tokens into
//!   SPARQL-ready operands,
//! - the transient views ([`Resource`], [`Property`], [`Statement`]) produced by queries, and
//! - the [`Triple`] operands accepted by write operations.

mod error;
mod naming;
mod prefix;
mod resource;
mod token;
mod triple;
pub mod vocab;

pub use error::*;
pub use naming::*;
pub use prefix::*;
pub use resource::*;
pub use token::*;
pub use triple::*;
