//! Document ingestion, in-memory vector search, and conversation checkpoints.

pub mod conversation;
pub mod document;
pub mod index;
pub mod retriever;

pub use conversation::ConversationStore;
pub use document::{DocumentError, IngestionPipeline};
pub use index::{ChunkIndex, ChunkVector, InMemoryIndex, IndexError, ScoredChunk};
pub use retriever::RetrievalTool;
