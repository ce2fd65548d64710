use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::model::BlockReference;

/// A position inside one content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Point {
    /// Character offset inside a paragraph, in `0..=len`.
    Paragraph {
        paragraph_reference: BlockReference,
        offset: usize,
    },
    /// An entire block, paragraph or embed.
    Block { block_reference: BlockReference },
    StartOfContent,
    EndOfContent,
}

impl Point {
    pub fn paragraph(paragraph_reference: BlockReference, offset: usize) -> Self {
        Point::Paragraph {
            paragraph_reference,
            offset,
        }
    }

    pub fn block(block_reference: BlockReference) -> Self {
        Point::Block { block_reference }
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self, Point::Paragraph { .. })
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Point::Block { .. })
    }

    /// The block a paragraph or block point names.
    pub fn block_reference(&self) -> Option<&BlockReference> {
        match self {
            Point::Paragraph {
                paragraph_reference,
                ..
            } => Some(paragraph_reference),
            Point::Block { block_reference } => Some(block_reference),
            Point::StartOfContent | Point::EndOfContent => None,
        }
    }

    pub fn as_paragraph(&self) -> EngineResult<(&BlockReference, usize)> {
        match self {
            Point::Paragraph {
                paragraph_reference,
                offset,
            } => Ok((paragraph_reference, *offset)),
            _ => Err(EngineError::PointNotOfType {
                expected: "Paragraph",
            }),
        }
    }
}
