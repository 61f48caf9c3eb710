pub mod documents;
pub mod health;
pub mod index;
pub mod lookup;
pub mod query;
