//! Account directory implementations

mod http;
mod storage;

pub use http::HttpAccountDirectory;
pub use storage::StoreAccountDirectory;
