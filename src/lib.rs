//! ragfuse — multi-modal retrieval fusion and reranking for RAG over a
//! managed vector database.
//!
//! The crate combines dense vector similarity search, lexical full-text
//! search, Reciprocal Rank Fusion, and strategy-dependent reranking (text
//! cross-encoder or multimodal image reranker with graceful fallback) into a
//! single ranked context set handed to a language model. The managed search
//! engine, the object store, and the generator are collaborator traits; the
//! surrounding HTTP layer wires concrete gateways into `RagPipeline`.

pub mod core;
pub mod embedding;
pub mod fusion;
pub mod images;
pub mod logging;
pub mod rag;
pub mod rerank;
pub mod search;

pub use crate::core::config::RetrievalConfig;
pub use crate::core::errors::RagError;
pub use crate::fusion::{reciprocal_rank_fusion, DEFAULT_RRF_K};
pub use crate::rag::{ContextChunk, Generator, RagAnswer, RagPipeline};
pub use crate::rerank::{QueryType, RerankOrchestrator, RerankStrategy};
pub use crate::search::{Candidate, LexicalRetriever, Modality, SearchEngine, VectorRetriever};
