//! Store errors - the error taxonomy shared by every layer

mod store_error;

pub use store_error::{StoreError, StoreResult};
