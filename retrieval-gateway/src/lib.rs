pub mod lookup;
pub mod query;

pub use lookup::{
    HttpReferenceSearcher, LookupGateway, LookupOutcome, ReferenceHit, ReferenceSearcher,
};
pub use query::{
    CorpusAnswerer, OpenAIClientType, OpenAiAnswerer, Precondition, QueryError, QueryGateway,
};
