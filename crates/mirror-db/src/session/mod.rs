//! Write sessions - the only way data enters the store

mod write_session;

pub use write_session::WriteSession;

pub(crate) use write_session::Staged;
