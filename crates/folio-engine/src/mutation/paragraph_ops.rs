//! Split, join and splice of paragraphs.

use crate::errors::{EngineError, EngineResult};
use crate::model::paragraph::split_off_inlines;
use crate::model::{
    BlockFragment, BlockReference, ContentFragment, Document, Inline, NodeConfig, Paragraph, inlines_length,
    normalize_inlines, splice_inlines,
};
use crate::mutation::transform::{SelectionRangeTransform, SplitDirection};
use crate::mutation::{BatchMutation, Mutation, MutationOutcome};
use crate::selection::Point;
use crate::view_delta::ViewDeltaControl;

/// Which of the two joined paragraphs survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinDirection {
    /// The first paragraph survives and absorbs the second.
    Backwards,
    /// The second paragraph survives and absorbs the first.
    Forwards,
}

pub(crate) fn split_paragraph(
    document: &mut Document,
    paragraph_point: &Point,
    new_paragraph_config: &NodeConfig,
    new_paragraph_id: &str,
    direction: SplitDirection,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let (paragraph_reference, offset) = paragraph_point.as_paragraph()?;
    let paragraph_reference = paragraph_reference.clone();
    let length = document.paragraph_length(&paragraph_reference)?;
    if offset > length {
        return Err(EngineError::InvalidBounds(format!(
            "split at {offset} of paragraph with length {length}"
        )));
    }
    let new_paragraph_reference = BlockReference::new(new_paragraph_id);
    if document.has_block(&new_paragraph_reference) {
        return Err(EngineError::BlockAlreadyInDocument(new_paragraph_id.to_string()));
    }
    let content_reference = document.content_reference_of_block(&paragraph_reference)?.clone();
    let block_order = document.content(&content_reference)?.block_references.clone();
    let index = document.index_of_block_in_content(&content_reference, &paragraph_reference)?;

    let paragraph = document.paragraph_mut(&paragraph_reference)?;
    let tail = split_off_inlines(&mut paragraph.children, offset)?;
    let (insert_index, new_children) = match direction {
        SplitDirection::Forwards => (index + 1, tail),
        SplitDirection::Backwards => (index, std::mem::replace(&mut paragraph.children, tail)),
    };
    view_delta.paragraph_children_changed(&paragraph_reference);

    let fragment = ContentFragment::new(vec![BlockFragment::Paragraph(Paragraph::new(
        new_paragraph_id,
        new_paragraph_config.clone(),
        new_children,
    ))]);
    document.insert_content_fragment(&content_reference, insert_index, &fragment, view_delta)?;

    let reverse = match direction {
        SplitDirection::Forwards => Mutation::JoinParagraphsBackwards {
            first_paragraph_reference: paragraph_reference.clone(),
            second_paragraph_reference: new_paragraph_reference.clone(),
        },
        SplitDirection::Backwards => Mutation::JoinParagraphsForwards {
            first_paragraph_reference: new_paragraph_reference.clone(),
            second_paragraph_reference: paragraph_reference.clone(),
        },
    };
    Ok(MutationOutcome::changed(
        reverse,
        Some(SelectionRangeTransform::SplitParagraph {
            paragraph_reference,
            new_paragraph_reference,
            offset,
            direction,
            block_order,
        }),
    ))
}

pub(crate) fn join_paragraphs(
    document: &mut Document,
    first_paragraph_reference: &BlockReference,
    second_paragraph_reference: &BlockReference,
    direction: JoinDirection,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    if first_paragraph_reference == second_paragraph_reference {
        return Err(EngineError::InvalidRange(format!(
            "cannot join paragraph {} with itself",
            first_paragraph_reference.block_id
        )));
    }
    let first = document.paragraph(first_paragraph_reference)?;
    let first_length = first.len();
    let first_config = first.config.clone();
    let second_config = document.paragraph(second_paragraph_reference)?.config.clone();

    let (surviving_reference, removed_reference) = match direction {
        JoinDirection::Backwards => (first_paragraph_reference, second_paragraph_reference),
        JoinDirection::Forwards => (second_paragraph_reference, first_paragraph_reference),
    };
    let surviving_content_reference = document.content_reference_of_block(surviving_reference)?.clone();
    let removed_content_reference = document.content_reference_of_block(removed_reference)?.clone();
    let removed_order = document.content(&removed_content_reference)?.block_references.clone();
    let removed_index = document.index_of_block_in_content(&removed_content_reference, removed_reference)?;
    let first_content_reference = document.content_reference_of_block(first_paragraph_reference)?;
    let second_content_reference = document.content_reference_of_block(second_paragraph_reference)?;
    let adjacent = first_content_reference == second_content_reference
        && document.index_of_block(second_paragraph_reference)? == document.index_of_block(first_paragraph_reference)? + 1;

    let split = match direction {
        JoinDirection::Backwards => Mutation::SplitParagraphForwards {
            paragraph_point: Point::paragraph(first_paragraph_reference.clone(), first_length),
            new_paragraph_config: second_config,
            new_paragraph_id: second_paragraph_reference.block_id.clone(),
        },
        JoinDirection::Forwards => Mutation::SplitParagraphBackwards {
            paragraph_point: Point::paragraph(second_paragraph_reference.clone(), first_length),
            new_paragraph_config: first_config,
            new_paragraph_id: first_paragraph_reference.block_id.clone(),
        },
    };
    let reverse = if adjacent {
        BatchMutation::single(split)
    } else {
        let previous = removed_index.checked_sub(1).map(|index| removed_order[index].clone());
        let next = removed_order.get(removed_index + 1).cloned();
        let move_back = match (previous, next) {
            (Some(previous), _) => Mutation::MoveBlocksAfter {
                start_block_reference: removed_reference.clone(),
                end_block_reference: removed_reference.clone(),
                move_after_block_reference: previous,
            },
            (None, Some(next)) => Mutation::MoveBlocksBefore {
                start_block_reference: removed_reference.clone(),
                end_block_reference: removed_reference.clone(),
                move_before_block_reference: next,
            },
            (None, None) => Mutation::MoveBlocksAtEnd {
                start_block_reference: removed_reference.clone(),
                end_block_reference: removed_reference.clone(),
                content_reference: removed_content_reference.clone(),
            },
        };
        BatchMutation::new(vec![split, move_back])?
    };

    let removed_fragment =
        document.remove_block_run(&removed_content_reference, removed_index, removed_index, view_delta)?;
    let removed_children = match removed_fragment.blocks.into_iter().next() {
        Some(BlockFragment::Paragraph(paragraph)) => paragraph.children,
        _ => {
            return Err(EngineError::UnreachableCode(
                "joined block was not a paragraph".to_string(),
            ));
        }
    };
    let surviving = document.paragraph_mut(surviving_reference)?;
    match direction {
        JoinDirection::Backwards => surviving.children.extend(removed_children),
        JoinDirection::Forwards => {
            let mut children = removed_children;
            children.append(&mut surviving.children);
            surviving.children = children;
        }
    }
    normalize_inlines(&mut surviving.children);
    view_delta.paragraph_children_changed(surviving_reference);

    let (surviving_shift, removed_shift) = match direction {
        JoinDirection::Backwards => (0, first_length),
        JoinDirection::Forwards => (first_length, 0),
    };
    Ok(MutationOutcome::Changed {
        reverse_mutation: reverse,
        transform: Some(SelectionRangeTransform::JoinParagraphs {
            surviving_paragraph_reference: surviving_reference.clone(),
            surviving_content_reference,
            surviving_shift,
            removed_paragraph_reference: removed_reference.clone(),
            removed_content_reference,
            removed_shift,
        }),
    })
}

pub(crate) fn splice_paragraph(
    document: &mut Document,
    paragraph_point: &Point,
    remove_count: usize,
    insert_children: &[Inline],
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let (paragraph_reference, offset) = paragraph_point.as_paragraph()?;
    let mut insert = insert_children.to_vec();
    normalize_inlines(&mut insert);
    let inserted_length = inlines_length(&insert);
    let paragraph = document.paragraph_mut(paragraph_reference)?;
    if remove_count == 0 && inserted_length == 0 {
        // Still reject out-of-range points.
        let length = paragraph.len();
        if offset > length {
            return Err(EngineError::InvalidBounds(format!(
                "splice at {offset} of paragraph with length {length}"
            )));
        }
        return Ok(MutationOutcome::NoChange);
    }
    let removed = splice_inlines(&mut paragraph.children, offset, remove_count, insert.clone())?;
    if removed == insert {
        return Ok(MutationOutcome::NoChange);
    }
    view_delta.paragraph_children_changed(paragraph_reference);
    Ok(MutationOutcome::changed(
        Mutation::SpliceParagraph {
            paragraph_point: paragraph_point.clone(),
            remove_count: inserted_length,
            insert_children: removed,
        },
        Some(SelectionRangeTransform::SpliceParagraph {
            paragraph_reference: paragraph_reference.clone(),
            offset,
            removed_length: remove_count,
            inserted_length,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmbedFragment;
    use crate::model::{ContentListFragment, ContentListFragmentContent};
    use crate::mutation::apply_mutation;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn plain(text: &str) -> Inline {
        Inline::text(json!({}), text)
    }

    fn paragraph(id: &str, text: &str) -> BlockFragment {
        BlockFragment::Paragraph(Paragraph::new(id, json!({}), vec![plain(text)]))
    }

    fn document(blocks: Vec<BlockFragment>) -> Document {
        Document::from_fragment("doc", json!({}), "root", json!({}), &ContentFragment::new(blocks)).unwrap()
    }

    fn text_of(document: &Document, id: &str) -> String {
        document.paragraph(&BlockReference::new(id)).unwrap().text()
    }

    fn order(document: &Document) -> Vec<String> {
        document
            .content(document.root_content_reference())
            .unwrap()
            .block_references
            .iter()
            .map(|reference| reference.block_id.clone())
            .collect()
    }

    fn reverse_of(outcome: MutationOutcome) -> Mutation {
        match outcome {
            MutationOutcome::Changed { reverse_mutation, .. } => Mutation::Batch(reverse_mutation),
            MutationOutcome::NoChange => panic!("expected a change"),
        }
    }

    #[test]
    fn test_split_forwards_and_reverse() {
        let mut doc = document(vec![paragraph("p1", "hello")]);
        let before = doc.clone();
        let outcome = apply_mutation(
            &mut doc,
            &Mutation::SplitParagraphForwards {
                paragraph_point: Point::paragraph(BlockReference::new("p1"), 2),
                new_paragraph_config: json!({ "style": "h1" }),
                new_paragraph_id: "p2".to_string(),
            },
        )
        .unwrap();

        assert_eq!(order(&doc), vec!["p1", "p2"]);
        assert_eq!(text_of(&doc, "p1"), "he");
        assert_eq!(text_of(&doc, "p2"), "llo");

        apply_mutation(&mut doc, &reverse_of(outcome)).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_split_backwards_keeps_tail_in_original() {
        let mut doc = document(vec![paragraph("p1", "hello")]);
        let before = doc.clone();
        let outcome = apply_mutation(
            &mut doc,
            &Mutation::SplitParagraphBackwards {
                paragraph_point: Point::paragraph(BlockReference::new("p1"), 2),
                new_paragraph_config: json!({}),
                new_paragraph_id: "p0".to_string(),
            },
        )
        .unwrap();

        assert_eq!(order(&doc), vec!["p0", "p1"]);
        assert_eq!(text_of(&doc, "p0"), "he");
        assert_eq!(text_of(&doc, "p1"), "llo");

        apply_mutation(&mut doc, &reverse_of(outcome)).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_split_with_existing_id_fails_untouched() {
        let mut doc = document(vec![paragraph("p1", "hello"), paragraph("p2", "x")]);
        let before = doc.clone();
        let result = apply_mutation(
            &mut doc,
            &Mutation::SplitParagraphForwards {
                paragraph_point: Point::paragraph(BlockReference::new("p1"), 2),
                new_paragraph_config: json!({}),
                new_paragraph_id: "p2".to_string(),
            },
        );

        assert!(matches!(result, Err(EngineError::BlockAlreadyInDocument(_))));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_join_forwards_keeps_second() {
        let mut doc = document(vec![
            BlockFragment::Paragraph(Paragraph::new("p1", json!({ "style": "quote" }), vec![plain("ab")])),
            paragraph("p2", "cd"),
        ]);
        let before = doc.clone();
        let outcome = apply_mutation(
            &mut doc,
            &Mutation::JoinParagraphsForwards {
                first_paragraph_reference: BlockReference::new("p1"),
                second_paragraph_reference: BlockReference::new("p2"),
            },
        )
        .unwrap();

        assert_eq!(order(&doc), vec!["p2"]);
        assert_eq!(text_of(&doc, "p2"), "abcd");

        apply_mutation(&mut doc, &reverse_of(outcome)).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_join_non_adjacent_round_trips() {
        let mut doc = document(vec![
            paragraph("p1", "ab"),
            paragraph("p2", "x"),
            paragraph("p3", "cd"),
        ]);
        let before = doc.clone();
        let outcome = apply_mutation(
            &mut doc,
            &Mutation::JoinParagraphsBackwards {
                first_paragraph_reference: BlockReference::new("p1"),
                second_paragraph_reference: BlockReference::new("p3"),
            },
        )
        .unwrap();

        assert_eq!(order(&doc), vec!["p1", "p2"]);
        assert_eq!(text_of(&doc, "p1"), "abcd");

        apply_mutation(&mut doc, &reverse_of(outcome)).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_join_across_contents_round_trips() {
        let mut doc = document(vec![
            paragraph("p1", "ab"),
            BlockFragment::Embed(EmbedFragment {
                id: "table".to_string(),
                config: json!({}),
                contents: ContentListFragment::new(vec![ContentListFragmentContent {
                    id: "cell".to_string(),
                    config: json!({}),
                    fragment: ContentFragment::new(vec![paragraph("cp", "cd")]),
                }]),
            }),
        ]);
        let before = doc.clone();
        let outcome = apply_mutation(
            &mut doc,
            &Mutation::JoinParagraphsBackwards {
                first_paragraph_reference: BlockReference::new("p1"),
                second_paragraph_reference: BlockReference::new("cp"),
            },
        )
        .unwrap();

        assert_eq!(text_of(&doc, "p1"), "abcd");
        assert!(!doc.has_block(&BlockReference::new("cp")));

        apply_mutation(&mut doc, &reverse_of(outcome)).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_join_with_itself_is_invalid() {
        let mut doc = document(vec![paragraph("p1", "ab")]);
        let result = apply_mutation(
            &mut doc,
            &Mutation::JoinParagraphsBackwards {
                first_paragraph_reference: BlockReference::new("p1"),
                second_paragraph_reference: BlockReference::new("p1"),
            },
        );

        assert!(matches!(result, Err(EngineError::InvalidRange(_))));
    }

    #[test]
    fn test_splice_reverse_restores_removed_children() {
        let mut doc = document(vec![paragraph("p1", "hello")]);
        let before = doc.clone();
        let outcome = apply_mutation(
            &mut doc,
            &Mutation::splice_paragraph(Point::paragraph(BlockReference::new("p1"), 1), 3, vec![plain("EY")]),
        )
        .unwrap();

        assert_eq!(text_of(&doc, "p1"), "hEYo");
        let reverse = reverse_of(outcome);
        apply_mutation(&mut doc, &reverse).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_splice_identical_replacement_is_no_change() {
        let mut doc = document(vec![paragraph("p1", "hello")]);
        let outcome = apply_mutation(
            &mut doc,
            &Mutation::splice_paragraph(Point::paragraph(BlockReference::new("p1"), 1), 2, vec![plain("el")]),
        )
        .unwrap();

        assert!(!outcome.did_change());
        assert_eq!(text_of(&doc, "p1"), "hello");
    }

    #[test]
    fn test_empty_splice_is_no_change() {
        let mut doc = document(vec![paragraph("p1", "hello")]);
        let outcome = apply_mutation(
            &mut doc,
            &Mutation::splice_paragraph(Point::paragraph(BlockReference::new("p1"), 5), 0, vec![plain("")]),
        )
        .unwrap();

        assert!(!outcome.did_change());
    }
}
