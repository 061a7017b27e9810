pub mod config;
pub mod document;
pub mod driver;
pub mod entity;
pub mod error;
pub mod query;
pub mod store;

pub use config::Config;
pub use driver::Driver;
pub use entity::{Identifiable, Identity, IDENTIFIER_KEY};
pub use error::{FlatDbError, Result};
pub use query::{Clause, Operators};
pub use store::DocumentStore;
