use log::{debug, trace};

use crate::errors::{EngineError, EngineResult};
use crate::model::{Block, BlockReference, ContentFragment, ContentListFragment, ContentReference, Document};
use crate::mutation::config_ops;
use crate::mutation::paragraph_ops::{self, JoinDirection};
use crate::mutation::transform::{
    BlockRemoval, CollapseTarget, ContentRemoval, EdgePoints, SelectionRangeTransform, SplitDirection,
};
use crate::mutation::{BatchMutation, Mutation, MutationOutcome};
use crate::selection::Point;
use crate::view_delta::ViewDeltaControl;

/// Apply one mutation without recording view deltas.
pub fn apply_mutation(document: &mut Document, mutation: &Mutation) -> EngineResult<MutationOutcome> {
    apply_mutation_with_view_delta(document, mutation, &mut ViewDeltaControl::discarding())
}

pub fn apply_mutation_with_view_delta(
    document: &mut Document,
    mutation: &Mutation,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    trace!("applying mutation {}", mutation.name());
    match mutation {
        Mutation::InsertContentsBefore {
            insert_before_content_reference,
            content_list_fragment,
        } => {
            let embed_reference = document
                .embed_reference_of_content(insert_before_content_reference)?
                .clone();
            let index = document.index_of_content_in_embed(&embed_reference, insert_before_content_reference)?;
            insert_contents(document, &embed_reference, index, content_list_fragment, view_delta)
        }
        Mutation::InsertContentsAfter {
            insert_after_content_reference,
            content_list_fragment,
        } => {
            let embed_reference = document
                .embed_reference_of_content(insert_after_content_reference)?
                .clone();
            let index = document.index_of_content_in_embed(&embed_reference, insert_after_content_reference)?;
            insert_contents(document, &embed_reference, index + 1, content_list_fragment, view_delta)
        }
        Mutation::InsertContentsAtEnd {
            embed_reference,
            content_list_fragment,
        } => {
            let index = document.embed(embed_reference)?.content_references.len();
            insert_contents(document, embed_reference, index, content_list_fragment, view_delta)
        }
        Mutation::InsertBlocksBefore {
            insert_before_block_reference,
            content_fragment,
        } => {
            let content_reference = document
                .content_reference_of_block(insert_before_block_reference)?
                .clone();
            let index = document.index_of_block_in_content(&content_reference, insert_before_block_reference)?;
            insert_blocks(document, &content_reference, index, content_fragment, view_delta)
        }
        Mutation::InsertBlocksAfter {
            insert_after_block_reference,
            content_fragment,
        } => {
            let content_reference = document
                .content_reference_of_block(insert_after_block_reference)?
                .clone();
            let index = document.index_of_block_in_content(&content_reference, insert_after_block_reference)?;
            insert_blocks(document, &content_reference, index + 1, content_fragment, view_delta)
        }
        Mutation::InsertBlocksAtEnd {
            content_reference,
            content_fragment,
        } => {
            let index = document.number_of_blocks_in_content(content_reference)?;
            insert_blocks(document, content_reference, index, content_fragment, view_delta)
        }
        Mutation::MoveContentsBefore {
            start_content_reference,
            end_content_reference,
            move_before_content_reference,
        } => move_contents(
            document,
            start_content_reference,
            end_content_reference,
            ContentDestination::Before(move_before_content_reference),
            view_delta,
        ),
        Mutation::MoveContentsAfter {
            start_content_reference,
            end_content_reference,
            move_after_content_reference,
        } => move_contents(
            document,
            start_content_reference,
            end_content_reference,
            ContentDestination::After(move_after_content_reference),
            view_delta,
        ),
        Mutation::MoveContentsAtEnd {
            start_content_reference,
            end_content_reference,
            embed_reference,
        } => move_contents(
            document,
            start_content_reference,
            end_content_reference,
            ContentDestination::AtEnd(embed_reference),
            view_delta,
        ),
        Mutation::MoveBlocksBefore {
            start_block_reference,
            end_block_reference,
            move_before_block_reference,
        } => move_blocks(
            document,
            start_block_reference,
            end_block_reference,
            BlockDestination::Before(move_before_block_reference),
            view_delta,
        ),
        Mutation::MoveBlocksAfter {
            start_block_reference,
            end_block_reference,
            move_after_block_reference,
        } => move_blocks(
            document,
            start_block_reference,
            end_block_reference,
            BlockDestination::After(move_after_block_reference),
            view_delta,
        ),
        Mutation::MoveBlocksAtEnd {
            start_block_reference,
            end_block_reference,
            content_reference,
        } => move_blocks(
            document,
            start_block_reference,
            end_block_reference,
            BlockDestination::AtEnd(content_reference),
            view_delta,
        ),
        Mutation::SplitParagraphBackwards {
            paragraph_point,
            new_paragraph_config,
            new_paragraph_id,
        } => paragraph_ops::split_paragraph(
            document,
            paragraph_point,
            new_paragraph_config,
            new_paragraph_id,
            SplitDirection::Backwards,
            view_delta,
        ),
        Mutation::SplitParagraphForwards {
            paragraph_point,
            new_paragraph_config,
            new_paragraph_id,
        } => paragraph_ops::split_paragraph(
            document,
            paragraph_point,
            new_paragraph_config,
            new_paragraph_id,
            SplitDirection::Forwards,
            view_delta,
        ),
        Mutation::JoinParagraphsBackwards {
            first_paragraph_reference,
            second_paragraph_reference,
        } => paragraph_ops::join_paragraphs(
            document,
            first_paragraph_reference,
            second_paragraph_reference,
            JoinDirection::Backwards,
            view_delta,
        ),
        Mutation::JoinParagraphsForwards {
            first_paragraph_reference,
            second_paragraph_reference,
        } => paragraph_ops::join_paragraphs(
            document,
            first_paragraph_reference,
            second_paragraph_reference,
            JoinDirection::Forwards,
            view_delta,
        ),
        Mutation::RemoveContents {
            start_content_reference,
            end_content_reference,
        } => remove_contents(document, start_content_reference, end_content_reference, view_delta),
        Mutation::RemoveBlocks {
            start_block_reference,
            end_block_reference,
        } => remove_blocks(document, start_block_reference, end_block_reference, view_delta),
        Mutation::SpliceParagraph {
            paragraph_point,
            remove_count,
            insert_children,
        } => paragraph_ops::splice_paragraph(document, paragraph_point, *remove_count, insert_children, view_delta),
        Mutation::ChangeTextConfigBetweenPoints {
            start_paragraph_point,
            end_paragraph_point,
            new_config,
        } => config_ops::change_text_config(
            document,
            start_paragraph_point,
            end_paragraph_point,
            new_config,
            view_delta,
        ),
        Mutation::ChangeParagraphConfigBetweenBlockReferences {
            start_paragraph_reference,
            end_paragraph_reference,
            new_config,
        } => config_ops::change_paragraph_config(
            document,
            start_paragraph_reference,
            end_paragraph_reference,
            new_config,
            view_delta,
        ),
        Mutation::ChangeDocumentConfig { new_config } => {
            config_ops::change_document_config(document, new_config, view_delta)
        }
        Mutation::ChangeContentConfig {
            content_reference,
            new_config,
        } => config_ops::change_content_config(document, content_reference, new_config, view_delta),
        Mutation::ChangeEmbedConfig {
            embed_reference,
            new_config,
        } => config_ops::change_embed_config(document, embed_reference, new_config, view_delta),
        Mutation::ChangeVoidConfig {
            void_start_point,
            new_config,
        } => config_ops::change_void_config(document, void_start_point, new_config, view_delta),
        Mutation::Batch(batch) => apply_batch(document, batch, view_delta),
    }
}

/// Apply every mutation in order. A failing mutation undoes the ones before
/// it, so the batch changes all or nothing.
fn apply_batch(
    document: &mut Document,
    batch: &BatchMutation,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let mut reverse_batches: Vec<BatchMutation> = Vec::new();
    let mut transforms = Vec::new();
    for mutation in batch.mutations() {
        match apply_mutation_with_view_delta(document, mutation, view_delta) {
            Ok(MutationOutcome::Changed {
                reverse_mutation,
                transform,
            }) => {
                reverse_batches.push(reverse_mutation);
                transforms.extend(transform);
            }
            Ok(MutationOutcome::NoChange) => {}
            Err(error) => {
                debug!(
                    "batch failed at {}, rolling back {} applied mutations",
                    mutation.name(),
                    reverse_batches.len()
                );
                for reverse in reverse_batches.into_iter().rev() {
                    apply_batch(document, &reverse, view_delta).map_err(|rollback_error| {
                        EngineError::UnreachableCode(format!(
                            "rolling back a failed batch failed: {rollback_error}"
                        ))
                    })?;
                }
                return Err(error);
            }
        }
    }
    if reverse_batches.is_empty() {
        return Ok(MutationOutcome::NoChange);
    }
    let reverse_mutations: Vec<Mutation> = reverse_batches
        .into_iter()
        .rev()
        .flat_map(BatchMutation::into_mutations)
        .collect();
    let transform = match transforms.len() {
        0 => None,
        1 => transforms.pop(),
        _ => Some(SelectionRangeTransform::Chain(transforms)),
    };
    Ok(MutationOutcome::Changed {
        reverse_mutation: BatchMutation::new(reverse_mutations)?,
        transform,
    })
}

fn insert_blocks(
    document: &mut Document,
    content_reference: &ContentReference,
    index: usize,
    fragment: &ContentFragment,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    if fragment.is_empty() {
        return Ok(MutationOutcome::NoChange);
    }
    let inserted = document.insert_content_fragment(content_reference, index, fragment, view_delta)?;
    let (Some(first), Some(last)) = (inserted.first(), inserted.last()) else {
        return Err(EngineError::UnreachableCode("non-empty fragment inserted nothing".to_string()));
    };
    Ok(MutationOutcome::changed(
        Mutation::RemoveBlocks {
            start_block_reference: first.clone(),
            end_block_reference: last.clone(),
        },
        None,
    ))
}

fn insert_contents(
    document: &mut Document,
    embed_reference: &BlockReference,
    index: usize,
    fragment: &ContentListFragment,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    if fragment.is_empty() {
        return Ok(MutationOutcome::NoChange);
    }
    let inserted = document.insert_content_list_fragment(embed_reference, index, fragment, view_delta)?;
    let (Some(first), Some(last)) = (inserted.first(), inserted.last()) else {
        return Err(EngineError::UnreachableCode("non-empty fragment inserted nothing".to_string()));
    };
    Ok(MutationOutcome::changed(
        Mutation::RemoveContents {
            start_content_reference: first.clone(),
            end_content_reference: last.clone(),
        },
        None,
    ))
}

/// Points at the very end of a block.
pub(crate) fn end_edge(document: &Document, block_reference: &BlockReference) -> EngineResult<EdgePoints> {
    let block = Point::block(block_reference.clone());
    Ok(match document.block(block_reference)? {
        Block::Paragraph(paragraph) => EdgePoints {
            text: Point::paragraph(block_reference.clone(), paragraph.len()),
            block,
        },
        Block::Embed(_) => EdgePoints {
            text: block.clone(),
            block,
        },
    })
}

/// Points at the very start of a block.
pub(crate) fn start_edge(document: &Document, block_reference: &BlockReference) -> EngineResult<EdgePoints> {
    let block = Point::block(block_reference.clone());
    Ok(match document.block(block_reference)? {
        Block::Paragraph(_) => EdgePoints {
            text: Point::paragraph(block_reference.clone(), 0),
            block,
        },
        Block::Embed(_) => EdgePoints {
            text: block.clone(),
            block,
        },
    })
}

fn remove_blocks(
    document: &mut Document,
    start_block_reference: &BlockReference,
    end_block_reference: &BlockReference,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let (content_reference, start, end) = document.block_run(start_block_reference, end_block_reference)?;
    let block_order = document.content(&content_reference)?.block_references.clone();
    let removed_block_references = block_order[start..=end].to_vec();
    let mut removed_content_ids = Vec::new();
    for block_reference in &removed_block_references {
        removed_content_ids.extend(document.descendant_content_ids_of_block(block_reference)?);
    }
    let previous = start.checked_sub(1).map(|index| block_order[index].clone());
    let next = block_order.get(end + 1).cloned();
    let before = previous
        .as_ref()
        .map(|block_reference| end_edge(document, block_reference))
        .transpose()?;
    let after = next
        .as_ref()
        .map(|block_reference| start_edge(document, block_reference))
        .transpose()?;

    let content_fragment = document.remove_block_run(&content_reference, start, end, view_delta)?;
    let reverse = match (previous, next) {
        (Some(previous), _) => Mutation::InsertBlocksAfter {
            insert_after_block_reference: previous,
            content_fragment,
        },
        (None, Some(next)) => Mutation::InsertBlocksBefore {
            insert_before_block_reference: next,
            content_fragment,
        },
        (None, None) => Mutation::InsertBlocksAtEnd {
            content_reference: content_reference.clone(),
            content_fragment,
        },
    };
    Ok(MutationOutcome::changed(
        reverse,
        Some(SelectionRangeTransform::RemoveBlocks(BlockRemoval {
            content_reference,
            removed_block_references,
            block_order,
            removed_content_ids,
            before,
            after,
        })),
    ))
}

fn content_end_target(document: &Document, content_reference: &ContentReference) -> EngineResult<CollapseTarget> {
    match document.content(content_reference)?.block_references.last() {
        Some(last) => Ok(CollapseTarget::at_edge(content_reference.clone(), &end_edge(document, last)?)),
        None => Ok(CollapseTarget::whole_content(content_reference.clone())),
    }
}

fn content_start_target(document: &Document, content_reference: &ContentReference) -> EngineResult<CollapseTarget> {
    match document.content(content_reference)?.block_references.first() {
        Some(first) => Ok(CollapseTarget::at_edge(content_reference.clone(), &start_edge(document, first)?)),
        None => Ok(CollapseTarget::whole_content(content_reference.clone())),
    }
}

fn remove_contents(
    document: &mut Document,
    start_content_reference: &ContentReference,
    end_content_reference: &ContentReference,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let (embed_reference, start, end) = document.content_run(start_content_reference, end_content_reference)?;
    let content_order = document.embed(&embed_reference)?.content_references.clone();
    let mut removed_content_ids = Vec::new();
    for content_reference in &content_order[start..=end] {
        document.collect_descendant_contents_of_content(content_reference, &mut removed_content_ids)?;
    }
    let previous = start.checked_sub(1).map(|index| content_order[index].clone());
    let next = content_order.get(end + 1).cloned();
    let collapse = match (&previous, &next) {
        (Some(previous), _) => content_end_target(document, previous)?,
        (None, Some(next)) => content_start_target(document, next)?,
        (None, None) => {
            let parent = document.content_reference_of_block(&embed_reference)?.clone();
            let block = Point::block(embed_reference.clone());
            CollapseTarget {
                content_reference: parent,
                text: (block.clone(), block.clone()),
                block: (block.clone(), block),
            }
        }
    };

    let content_list_fragment = document.remove_content_run(&embed_reference, start, end, view_delta)?;
    let reverse = match (previous, next) {
        (Some(previous), _) => Mutation::InsertContentsAfter {
            insert_after_content_reference: previous,
            content_list_fragment,
        },
        (None, Some(next)) => Mutation::InsertContentsBefore {
            insert_before_content_reference: next,
            content_list_fragment,
        },
        (None, None) => Mutation::InsertContentsAtEnd {
            embed_reference,
            content_list_fragment,
        },
    };
    Ok(MutationOutcome::changed(
        reverse,
        Some(SelectionRangeTransform::RemoveContents(ContentRemoval {
            removed_content_ids,
            collapse,
        })),
    ))
}

enum BlockDestination<'a> {
    Before(&'a BlockReference),
    After(&'a BlockReference),
    AtEnd(&'a ContentReference),
}

fn move_blocks(
    document: &mut Document,
    start_block_reference: &BlockReference,
    end_block_reference: &BlockReference,
    destination: BlockDestination<'_>,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let (source_content_reference, start, end) = document.block_run(start_block_reference, end_block_reference)?;
    let block_order = document.content(&source_content_reference)?.block_references.clone();
    let moved = block_order[start..=end].to_vec();

    match destination {
        BlockDestination::Before(anchor) | BlockDestination::After(anchor) if moved.contains(anchor) => {
            let stays = match destination {
                BlockDestination::Before(anchor) => *anchor == block_order[start],
                _ => *anchor == block_order[end],
            };
            if stays {
                return Ok(MutationOutcome::NoChange);
            }
            return Err(EngineError::MoveDestinationInsideMovedRange);
        }
        _ => {}
    }
    let destination_content_reference = match destination {
        BlockDestination::Before(anchor) | BlockDestination::After(anchor) => {
            document.content_reference_of_block(anchor)?.clone()
        }
        BlockDestination::AtEnd(content_reference) => {
            document.content(content_reference)?;
            content_reference.clone()
        }
    };
    for block_reference in &moved {
        if document.is_content_descendant_of_block(&destination_content_reference, block_reference)? {
            return Err(EngineError::MoveDestinationInsideMovedRange);
        }
    }

    let previous = start.checked_sub(1).map(|index| block_order[index].clone());
    let next = block_order.get(end + 1).cloned();
    let stays_in_place = destination_content_reference == source_content_reference
        && match destination {
            BlockDestination::Before(anchor) => next.as_ref() == Some(anchor),
            BlockDestination::After(anchor) => previous.as_ref() == Some(anchor),
            BlockDestination::AtEnd(_) => next.is_none(),
        };
    if stays_in_place {
        return Ok(MutationOutcome::NoChange);
    }

    let before = previous
        .as_ref()
        .map(|block_reference| end_edge(document, block_reference))
        .transpose()?;
    let after = next
        .as_ref()
        .map(|block_reference| start_edge(document, block_reference))
        .transpose()?;
    let reverse = match (previous, next) {
        (Some(previous), _) => Mutation::MoveBlocksAfter {
            start_block_reference: start_block_reference.clone(),
            end_block_reference: end_block_reference.clone(),
            move_after_block_reference: previous,
        },
        (None, Some(next)) => Mutation::MoveBlocksBefore {
            start_block_reference: start_block_reference.clone(),
            end_block_reference: end_block_reference.clone(),
            move_before_block_reference: next,
        },
        (None, None) => Mutation::MoveBlocksAtEnd {
            start_block_reference: start_block_reference.clone(),
            end_block_reference: end_block_reference.clone(),
            content_reference: source_content_reference.clone(),
        },
    };

    document
        .content_mut(&source_content_reference)?
        .block_references
        .drain(start..=end);
    let index = match destination {
        BlockDestination::Before(anchor) => {
            document.index_of_block_in_content(&destination_content_reference, anchor)?
        }
        BlockDestination::After(anchor) => {
            document.index_of_block_in_content(&destination_content_reference, anchor)? + 1
        }
        BlockDestination::AtEnd(_) => document.number_of_blocks_in_content(&destination_content_reference)?,
    };
    document
        .content_mut(&destination_content_reference)?
        .block_references
        .splice(index..index, moved.iter().cloned());
    for block_reference in &moved {
        if let Some(entry) = document.block_store.get_mut(&block_reference.block_id) {
            entry.content_reference = destination_content_reference.clone();
        }
    }
    view_delta.blocks_moved(&source_content_reference, &destination_content_reference, &moved);

    Ok(MutationOutcome::changed(
        reverse,
        Some(SelectionRangeTransform::MoveBlocks {
            destination_content_reference,
            removal: BlockRemoval {
                content_reference: source_content_reference,
                removed_block_references: moved,
                block_order,
                removed_content_ids: Vec::new(),
                before,
                after,
            },
        }),
    ))
}

enum ContentDestination<'a> {
    Before(&'a ContentReference),
    After(&'a ContentReference),
    AtEnd(&'a BlockReference),
}

fn move_contents(
    document: &mut Document,
    start_content_reference: &ContentReference,
    end_content_reference: &ContentReference,
    destination: ContentDestination<'_>,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let (source_embed_reference, start, end) = document.content_run(start_content_reference, end_content_reference)?;
    let content_order = document.embed(&source_embed_reference)?.content_references.clone();
    let moved = content_order[start..=end].to_vec();

    match destination {
        ContentDestination::Before(anchor) | ContentDestination::After(anchor) if moved.contains(anchor) => {
            let stays = match destination {
                ContentDestination::Before(anchor) => *anchor == content_order[start],
                _ => *anchor == content_order[end],
            };
            if stays {
                return Ok(MutationOutcome::NoChange);
            }
            return Err(EngineError::MoveDestinationInsideMovedRange);
        }
        _ => {}
    }
    let destination_embed_reference = match destination {
        ContentDestination::Before(anchor) | ContentDestination::After(anchor) => {
            document.embed_reference_of_content(anchor)?.clone()
        }
        ContentDestination::AtEnd(embed_reference) => {
            document.embed(embed_reference)?;
            embed_reference.clone()
        }
    };
    let destination_parent = document
        .content_reference_of_block(&destination_embed_reference)?
        .clone();
    let destination_ancestors = document.content_ancestors(&destination_parent)?;
    if moved.iter().any(|content_reference| destination_ancestors.contains(content_reference)) {
        return Err(EngineError::MoveDestinationInsideMovedRange);
    }

    let previous = start.checked_sub(1).map(|index| content_order[index].clone());
    let next = content_order.get(end + 1).cloned();
    let stays_in_place = destination_embed_reference == source_embed_reference
        && match destination {
            ContentDestination::Before(anchor) => next.as_ref() == Some(anchor),
            ContentDestination::After(anchor) => previous.as_ref() == Some(anchor),
            ContentDestination::AtEnd(_) => next.is_none(),
        };
    if stays_in_place {
        return Ok(MutationOutcome::NoChange);
    }

    let reverse = match (previous, next) {
        (Some(previous), _) => Mutation::MoveContentsAfter {
            start_content_reference: start_content_reference.clone(),
            end_content_reference: end_content_reference.clone(),
            move_after_content_reference: previous,
        },
        (None, Some(next)) => Mutation::MoveContentsBefore {
            start_content_reference: start_content_reference.clone(),
            end_content_reference: end_content_reference.clone(),
            move_before_content_reference: next,
        },
        (None, None) => Mutation::MoveContentsAtEnd {
            start_content_reference: start_content_reference.clone(),
            end_content_reference: end_content_reference.clone(),
            embed_reference: source_embed_reference.clone(),
        },
    };

    document
        .embed_mut(&source_embed_reference)?
        .content_references
        .drain(start..=end);
    let index = match destination {
        ContentDestination::Before(anchor) => {
            document.index_of_content_in_embed(&destination_embed_reference, anchor)?
        }
        ContentDestination::After(anchor) => {
            document.index_of_content_in_embed(&destination_embed_reference, anchor)? + 1
        }
        ContentDestination::AtEnd(_) => document.embed(&destination_embed_reference)?.content_references.len(),
    };
    document
        .embed_mut(&destination_embed_reference)?
        .content_references
        .splice(index..index, moved.iter().cloned());
    for content_reference in &moved {
        if let Some(entry) = document.content_store.get_mut(&content_reference.content_id) {
            entry.embed_reference = Some(destination_embed_reference.clone());
        }
    }
    let mut moved_content_ids = Vec::new();
    for content_reference in &moved {
        document.collect_descendant_contents_of_content(content_reference, &mut moved_content_ids)?;
    }
    let changes_embed = source_embed_reference != destination_embed_reference;
    view_delta.contents_moved(&source_embed_reference, &destination_embed_reference, &moved);

    Ok(MutationOutcome::changed(
        reverse,
        Some(SelectionRangeTransform::MoveContents {
            moved_content_ids,
            changes_embed,
        }),
    ))
}
