use thiserror::Error;

/// Contract violations raised by the engine.
///
/// None of these are expected at runtime: they indicate a caller built a
/// reference, point or mutation that does not match the document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Block not in block store: {0}")]
    BlockNotInBlockStore(String),

    #[error("Content not in content store: {0}")]
    ContentNotInContentStore(String),

    #[error("Block {block_id} is not in content {content_id}")]
    BlockNotInContent {
        block_id: String,
        content_id: String,
    },

    #[error("Content {content_id} is not in embed {embed_id}")]
    ContentNotInEmbed {
        content_id: String,
        embed_id: String,
    },

    #[error("Content {0} has no owning embed")]
    ContentReferenceMissingEmbedReference(String),

    #[error("Node {id} is not of type {expected}")]
    NodeNotOfType { id: String, expected: &'static str },

    #[error("Node {id} should not be of type {unexpected}")]
    NodeOfType {
        id: String,
        unexpected: &'static str,
    },

    #[error("Point is not of type {expected}")]
    PointNotOfType { expected: &'static str },

    #[error("Point should not be of type {unexpected}")]
    PointShouldNotBeOfType { unexpected: &'static str },

    #[error("Block already in document: {0}")]
    BlockAlreadyInDocument(String),

    #[error("Content already in document: {0}")]
    ContentAlreadyInDocument(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Mutation end index {end} precedes start index {start}")]
    MutationNodeEndBeforeStart { start: usize, end: usize },

    #[error("Batch mutation must contain at least one mutation")]
    BatchMutationMustContainMutations,

    #[error("Cannot move nodes into the moved range or one of its descendants")]
    MoveDestinationInsideMovedRange,

    #[error("Unreachable code reached: {0}")]
    UnreachableCode(String),

    #[error("Not implemented: {0}")]
    NotImplementedCode(String),

    #[error("Property already initialized: {0}")]
    AlreadyInitializedProperty(&'static str),
}

pub type EngineResult<T> = Result<T, EngineError>;
