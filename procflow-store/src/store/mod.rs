mod trait_store;
mod types;

pub use trait_store::{DocumentStore, StoreError};
pub use types::{Collection, Write, WriteBatch};
