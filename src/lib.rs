//! Embedding-cached document retrieval for RAG question answering.
//!
//! A [`Retriever`] ranks a small, static [`corpus::Document`] collection
//! against a query by cosine similarity of embeddings obtained through an
//! [`EmbeddingProvider`], which memoizes an external
//! [`embed::EmbeddingService`].

pub mod config;
pub mod corpus;
pub mod embed;
pub mod error;
pub mod search;

pub use corpus::{Corpus, Document};
pub use embed::provider::EmbeddingProvider;
pub use error::{RetrievalError, ServiceError};
pub use search::{Retriever, ScoredDocument};
