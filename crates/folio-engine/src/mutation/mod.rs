//! Structural edits, applied transactionally and inverted automatically.

mod apply;
mod config_ops;
mod paragraph_ops;
pub mod removal;
pub mod transform;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::model::{BlockReference, ContentFragment, ContentListFragment, ContentReference, Inline, NodeConfig};
use crate::selection::Point;

pub use apply::{apply_mutation, apply_mutation_with_view_delta};
pub use removal::make_remove_range_mutation;
pub use transform::{
    BlockRemoval, CollapseTarget, ContentRemoval, EdgePoints, SelectionRangeTransform, SplitDirection,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    InsertContentsBefore {
        insert_before_content_reference: ContentReference,
        content_list_fragment: ContentListFragment,
    },
    InsertContentsAfter {
        insert_after_content_reference: ContentReference,
        content_list_fragment: ContentListFragment,
    },
    InsertContentsAtEnd {
        embed_reference: BlockReference,
        content_list_fragment: ContentListFragment,
    },
    InsertBlocksBefore {
        insert_before_block_reference: BlockReference,
        content_fragment: ContentFragment,
    },
    InsertBlocksAfter {
        insert_after_block_reference: BlockReference,
        content_fragment: ContentFragment,
    },
    InsertBlocksAtEnd {
        content_reference: ContentReference,
        content_fragment: ContentFragment,
    },
    MoveContentsBefore {
        start_content_reference: ContentReference,
        end_content_reference: ContentReference,
        move_before_content_reference: ContentReference,
    },
    MoveContentsAfter {
        start_content_reference: ContentReference,
        end_content_reference: ContentReference,
        move_after_content_reference: ContentReference,
    },
    MoveContentsAtEnd {
        start_content_reference: ContentReference,
        end_content_reference: ContentReference,
        embed_reference: BlockReference,
    },
    MoveBlocksBefore {
        start_block_reference: BlockReference,
        end_block_reference: BlockReference,
        move_before_block_reference: BlockReference,
    },
    MoveBlocksAfter {
        start_block_reference: BlockReference,
        end_block_reference: BlockReference,
        move_after_block_reference: BlockReference,
    },
    MoveBlocksAtEnd {
        start_block_reference: BlockReference,
        end_block_reference: BlockReference,
        content_reference: ContentReference,
    },
    SplitParagraphBackwards {
        paragraph_point: Point,
        new_paragraph_config: NodeConfig,
        new_paragraph_id: String,
    },
    SplitParagraphForwards {
        paragraph_point: Point,
        new_paragraph_config: NodeConfig,
        new_paragraph_id: String,
    },
    /// Append the second paragraph's children to the first and remove the second.
    JoinParagraphsBackwards {
        first_paragraph_reference: BlockReference,
        second_paragraph_reference: BlockReference,
    },
    /// Prepend the first paragraph's children to the second and remove the first.
    JoinParagraphsForwards {
        first_paragraph_reference: BlockReference,
        second_paragraph_reference: BlockReference,
    },
    RemoveContents {
        start_content_reference: ContentReference,
        end_content_reference: ContentReference,
    },
    RemoveBlocks {
        start_block_reference: BlockReference,
        end_block_reference: BlockReference,
    },
    SpliceParagraph {
        paragraph_point: Point,
        remove_count: usize,
        insert_children: Vec<Inline>,
    },
    /// Both points must be in the same paragraph.
    ChangeTextConfigBetweenPoints {
        start_paragraph_point: Point,
        end_paragraph_point: Point,
        new_config: NodeConfig,
    },
    /// Embeds inside the run are left untouched.
    ChangeParagraphConfigBetweenBlockReferences {
        start_paragraph_reference: BlockReference,
        end_paragraph_reference: BlockReference,
        new_config: NodeConfig,
    },
    ChangeDocumentConfig {
        new_config: NodeConfig,
    },
    ChangeContentConfig {
        content_reference: ContentReference,
        new_config: NodeConfig,
    },
    ChangeEmbedConfig {
        embed_reference: BlockReference,
        new_config: NodeConfig,
    },
    ChangeVoidConfig {
        void_start_point: Point,
        new_config: NodeConfig,
    },
    Batch(BatchMutation),
}

impl Mutation {
    /// Variant name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertContentsBefore { .. } => "InsertContentsBefore",
            Mutation::InsertContentsAfter { .. } => "InsertContentsAfter",
            Mutation::InsertContentsAtEnd { .. } => "InsertContentsAtEnd",
            Mutation::InsertBlocksBefore { .. } => "InsertBlocksBefore",
            Mutation::InsertBlocksAfter { .. } => "InsertBlocksAfter",
            Mutation::InsertBlocksAtEnd { .. } => "InsertBlocksAtEnd",
            Mutation::MoveContentsBefore { .. } => "MoveContentsBefore",
            Mutation::MoveContentsAfter { .. } => "MoveContentsAfter",
            Mutation::MoveContentsAtEnd { .. } => "MoveContentsAtEnd",
            Mutation::MoveBlocksBefore { .. } => "MoveBlocksBefore",
            Mutation::MoveBlocksAfter { .. } => "MoveBlocksAfter",
            Mutation::MoveBlocksAtEnd { .. } => "MoveBlocksAtEnd",
            Mutation::SplitParagraphBackwards { .. } => "SplitParagraphBackwards",
            Mutation::SplitParagraphForwards { .. } => "SplitParagraphForwards",
            Mutation::JoinParagraphsBackwards { .. } => "JoinParagraphsBackwards",
            Mutation::JoinParagraphsForwards { .. } => "JoinParagraphsForwards",
            Mutation::RemoveContents { .. } => "RemoveContents",
            Mutation::RemoveBlocks { .. } => "RemoveBlocks",
            Mutation::SpliceParagraph { .. } => "SpliceParagraph",
            Mutation::ChangeTextConfigBetweenPoints { .. } => "ChangeTextConfigBetweenPoints",
            Mutation::ChangeParagraphConfigBetweenBlockReferences { .. } => {
                "ChangeParagraphConfigBetweenBlockReferences"
            }
            Mutation::ChangeDocumentConfig { .. } => "ChangeDocumentConfig",
            Mutation::ChangeContentConfig { .. } => "ChangeContentConfig",
            Mutation::ChangeEmbedConfig { .. } => "ChangeEmbedConfig",
            Mutation::ChangeVoidConfig { .. } => "ChangeVoidConfig",
            Mutation::Batch(_) => "Batch",
        }
    }

    pub fn remove_blocks(start_block_reference: BlockReference, end_block_reference: BlockReference) -> Self {
        Mutation::RemoveBlocks {
            start_block_reference,
            end_block_reference,
        }
    }

    pub fn splice_paragraph(paragraph_point: Point, remove_count: usize, insert_children: Vec<Inline>) -> Self {
        Mutation::SpliceParagraph {
            paragraph_point,
            remove_count,
            insert_children,
        }
    }
}

/// Ordered, non-empty list of mutations applied as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMutation {
    mutations: Vec<Mutation>,
}

impl BatchMutation {
    pub fn new(mutations: Vec<Mutation>) -> EngineResult<Self> {
        if mutations.is_empty() {
            return Err(EngineError::BatchMutationMustContainMutations);
        }
        Ok(Self { mutations })
    }

    pub fn single(mutation: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
        }
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}

impl From<BatchMutation> for Mutation {
    fn from(batch: BatchMutation) -> Self {
        Mutation::Batch(batch)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    NoChange,
    Changed {
        reverse_mutation: BatchMutation,
        transform: Option<SelectionRangeTransform>,
    },
}

impl MutationOutcome {
    pub fn did_change(&self) -> bool {
        matches!(self, MutationOutcome::Changed { .. })
    }

    pub(crate) fn changed(reverse: Mutation, transform: Option<SelectionRangeTransform>) -> Self {
        MutationOutcome::Changed {
            reverse_mutation: BatchMutation::single(reverse),
            transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_is_rejected() {
        assert_eq!(
            BatchMutation::new(vec![]),
            Err(EngineError::BatchMutationMustContainMutations)
        );
    }

    #[test]
    fn test_mutation_names() {
        let mutation = Mutation::remove_blocks(BlockReference::new("a"), BlockReference::new("b"));
        assert_eq!(mutation.name(), "RemoveBlocks");
        assert_eq!(Mutation::from(BatchMutation::single(mutation)).name(), "Batch");
    }
}
