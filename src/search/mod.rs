pub mod retriever;

pub use retriever::{Retriever, ScoredDocument};
