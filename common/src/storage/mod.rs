pub mod store;

pub use store::{DocumentStore, DynStore};
