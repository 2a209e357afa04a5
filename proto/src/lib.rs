pub mod check;
pub mod data;
pub mod error;
pub mod id;
pub mod iri;
pub mod message;
pub mod request;
pub mod transaction;

pub use check::*;
pub use data::*;
pub use error::*;
pub use id::*;
pub use iri::*;
pub use message::*;
pub use request::*;
pub use transaction::*;
