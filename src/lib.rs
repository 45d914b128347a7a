pub mod error;
pub mod extract;
pub mod extractor;
pub mod github;
pub mod language;
pub mod message;
pub mod page;
pub mod session;
pub mod storage;
pub mod sync;
pub mod trigger;

pub use error::{Error, Result};
