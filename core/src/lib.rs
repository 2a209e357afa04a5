pub mod client;
pub mod connector;
pub mod error;
pub mod storage;
pub mod transaction;
pub mod util;

pub use client::Cabinet;
pub use connector::CabinetConnector;
pub use error::{RequestError, TransactionError};
pub use storage::CabinetStore;
pub use transaction::{Committed, IdMap, Transaction};

pub use cabinet_proto as proto;
pub use tokio_util::sync::CancellationToken;
