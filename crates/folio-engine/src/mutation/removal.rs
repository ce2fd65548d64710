//! Turns a selected range into the mutation that deletes it.

use std::cmp::Ordering;

use crate::errors::EngineResult;
use crate::model::{BlockReference, ContentReference, Document};
use crate::mutation::{BatchMutation, Mutation};
use crate::selection::{Point, Range, compare_points};

/// Host hook deciding whether a fully selected nested content is removed
/// along with its blocks or only emptied.
pub type CanContentBeRemovedFn = dyn Fn(&Document, &ContentReference) -> bool;

enum Edge {
    /// The block at this index is removed entirely.
    Whole(usize),
    /// Cut inside a paragraph.
    Partial {
        index: usize,
        paragraph_reference: BlockReference,
        offset: usize,
    },
}

fn edge(
    document: &Document,
    content_reference: &ContentReference,
    point: &Point,
    number_of_blocks: usize,
) -> EngineResult<Edge> {
    Ok(match point {
        Point::StartOfContent => Edge::Whole(0),
        Point::EndOfContent => Edge::Whole(number_of_blocks.saturating_sub(1)),
        Point::Block { block_reference } => {
            Edge::Whole(document.index_of_block_in_content(content_reference, block_reference)?)
        }
        Point::Paragraph {
            paragraph_reference,
            offset,
        } => Edge::Partial {
            index: document.index_of_block_in_content(content_reference, paragraph_reference)?,
            paragraph_reference: paragraph_reference.clone(),
            offset: *offset,
        },
    })
}

fn covers_whole_content(document: &Document, range_start: &Point, range_end: &Point, blocks: &[BlockReference]) -> EngineResult<bool> {
    let starts_at_first = match range_start {
        Point::StartOfContent => true,
        Point::Block { block_reference } => blocks.first() == Some(block_reference),
        Point::Paragraph {
            paragraph_reference,
            offset,
        } => blocks.first() == Some(paragraph_reference) && *offset == 0,
        Point::EndOfContent => false,
    };
    let ends_at_last = match range_end {
        Point::EndOfContent => true,
        Point::Block { block_reference } => blocks.last() == Some(block_reference),
        Point::Paragraph {
            paragraph_reference,
            offset,
        } => blocks.last() == Some(paragraph_reference) && *offset == document.paragraph_length(paragraph_reference)?,
        Point::StartOfContent => false,
    };
    Ok(starts_at_first && ends_at_last)
}

fn remove_block_span(blocks: &[BlockReference], start: usize, end: usize) -> Mutation {
    Mutation::remove_blocks(blocks[start].clone(), blocks[end].clone())
}

/// Build the mutation removing everything `range` covers, or `None` when it
/// covers nothing.
pub fn make_remove_range_mutation(
    document: &Document,
    range: &Range,
    can_content_be_removed: &CanContentBeRemovedFn,
) -> EngineResult<Option<Mutation>> {
    let content_reference = &range.content_reference;
    let blocks = document.content(content_reference)?.block_references.clone();
    let order = compare_points(
        document,
        content_reference,
        &range.start_point,
        content_reference,
        &range.end_point,
    )?;
    let (start, end) = if order.to_ordering() == Ordering::Greater {
        (&range.end_point, &range.start_point)
    } else {
        (&range.start_point, &range.end_point)
    };

    if !document.is_root_content(content_reference)
        && covers_whole_content(document, start, end, &blocks)?
        && can_content_be_removed(document, content_reference)
    {
        return Ok(Some(Mutation::RemoveContents {
            start_content_reference: content_reference.clone(),
            end_content_reference: content_reference.clone(),
        }));
    }
    if blocks.is_empty() {
        return Ok(None);
    }

    let start_edge = edge(document, content_reference, start, blocks.len())?;
    let end_edge = edge(document, content_reference, end, blocks.len())?;
    let mut mutations = Vec::new();
    match (start_edge, end_edge) {
        (
            Edge::Partial {
                index: start_index,
                paragraph_reference: start_paragraph,
                offset: start_offset,
            },
            Edge::Partial {
                index: end_index,
                paragraph_reference: end_paragraph,
                offset: end_offset,
            },
        ) => {
            if start_index == end_index {
                if end_offset > start_offset {
                    mutations.push(Mutation::splice_paragraph(
                        Point::paragraph(start_paragraph, start_offset),
                        end_offset - start_offset,
                        Vec::new(),
                    ));
                }
            } else {
                let start_length = document.paragraph_length(&start_paragraph)?;
                if start_length > start_offset {
                    mutations.push(Mutation::splice_paragraph(
                        Point::paragraph(start_paragraph.clone(), start_offset),
                        start_length - start_offset,
                        Vec::new(),
                    ));
                }
                if end_offset > 0 {
                    mutations.push(Mutation::splice_paragraph(
                        Point::paragraph(end_paragraph.clone(), 0),
                        end_offset,
                        Vec::new(),
                    ));
                }
                if end_index > start_index + 1 {
                    mutations.push(remove_block_span(&blocks, start_index + 1, end_index - 1));
                }
                mutations.push(Mutation::JoinParagraphsBackwards {
                    first_paragraph_reference: start_paragraph,
                    second_paragraph_reference: end_paragraph,
                });
            }
        }
        (
            Edge::Partial {
                index: start_index,
                paragraph_reference: start_paragraph,
                offset: start_offset,
            },
            Edge::Whole(end_index),
        ) => {
            let start_length = document.paragraph_length(&start_paragraph)?;
            if start_length > start_offset {
                mutations.push(Mutation::splice_paragraph(
                    Point::paragraph(start_paragraph, start_offset),
                    start_length - start_offset,
                    Vec::new(),
                ));
            }
            if end_index > start_index {
                mutations.push(remove_block_span(&blocks, start_index + 1, end_index));
            }
        }
        (
            Edge::Whole(start_index),
            Edge::Partial {
                index: end_index,
                paragraph_reference: end_paragraph,
                offset: end_offset,
            },
        ) => {
            if end_index > start_index {
                mutations.push(remove_block_span(&blocks, start_index, end_index - 1));
            }
            if end_offset > 0 {
                mutations.push(Mutation::splice_paragraph(
                    Point::paragraph(end_paragraph, 0),
                    end_offset,
                    Vec::new(),
                ));
            }
        }
        (Edge::Whole(start_index), Edge::Whole(end_index)) => {
            mutations.push(remove_block_span(&blocks, start_index, end_index));
        }
    }

    Ok(match mutations.len() {
        0 => None,
        1 => mutations.pop(),
        _ => Some(Mutation::Batch(BatchMutation::new(mutations)?)),
    })
}
