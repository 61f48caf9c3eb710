pub mod error;
pub mod session;
pub mod storage;
pub mod utils;
