//! Config changes on text runs, paragraphs, voids, embeds, contents and the
//! document itself.

use crate::errors::{EngineError, EngineResult};
use crate::model::paragraph::{change_text_config as change_inline_config, void_at_mut};
use crate::model::{Block, BlockReference, ContentReference, Document, NodeConfig};
use crate::mutation::{BatchMutation, Mutation, MutationOutcome};
use crate::selection::Point;
use crate::view_delta::{NodeViewDelta, ViewDeltaControl};

pub(crate) fn change_text_config(
    document: &mut Document,
    start_paragraph_point: &Point,
    end_paragraph_point: &Point,
    new_config: &NodeConfig,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let (paragraph_reference, start) = start_paragraph_point.as_paragraph()?;
    let (end_paragraph_reference, end) = end_paragraph_point.as_paragraph()?;
    if paragraph_reference != end_paragraph_reference {
        return Err(EngineError::InvalidRange(format!(
            "text config change spans paragraphs {} and {}",
            paragraph_reference.block_id, end_paragraph_reference.block_id
        )));
    }
    if end < start {
        return Err(EngineError::MutationNodeEndBeforeStart { start, end });
    }
    let paragraph = document.paragraph_mut(paragraph_reference)?;
    let length = paragraph.len();
    if end > length {
        return Err(EngineError::InvalidBounds(format!(
            "text config change {start}..{end} of paragraph with length {length}"
        )));
    }
    let runs = change_inline_config(&mut paragraph.children, start, end, new_config)?;
    if runs.is_empty() {
        return Ok(MutationOutcome::NoChange);
    }
    view_delta.paragraph_children_changed(paragraph_reference);
    let reverse = runs
        .into_iter()
        .map(|run| Mutation::ChangeTextConfigBetweenPoints {
            start_paragraph_point: Point::paragraph(paragraph_reference.clone(), run.start),
            end_paragraph_point: Point::paragraph(paragraph_reference.clone(), run.end),
            new_config: run.previous_config,
        })
        .collect();
    Ok(MutationOutcome::Changed {
        reverse_mutation: BatchMutation::new(reverse)?,
        transform: None,
    })
}

/// Contiguous paragraphs that shared one config before the change.
struct ParagraphConfigRun {
    start: BlockReference,
    end: BlockReference,
    end_index: usize,
    previous_config: NodeConfig,
}

/// Embeds inside the run are left alone.
pub(crate) fn change_paragraph_config(
    document: &mut Document,
    start_paragraph_reference: &BlockReference,
    end_paragraph_reference: &BlockReference,
    new_config: &NodeConfig,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let (content_reference, start, end) = document.block_run(start_paragraph_reference, end_paragraph_reference)?;
    let block_references = document.content(&content_reference)?.block_references[start..=end].to_vec();
    let mut runs: Vec<ParagraphConfigRun> = Vec::new();
    for (index, block_reference) in block_references.iter().enumerate() {
        let Block::Paragraph(paragraph) = document.block_mut(block_reference)? else {
            continue;
        };
        if paragraph.config == *new_config {
            continue;
        }
        let previous_config = std::mem::replace(&mut paragraph.config, new_config.clone());
        view_delta.paragraph(NodeViewDelta::ConfigChanged(block_reference.clone()));
        match runs.last_mut() {
            Some(run) if run.end_index + 1 == index && run.previous_config == previous_config => {
                run.end = block_reference.clone();
                run.end_index = index;
            }
            _ => runs.push(ParagraphConfigRun {
                start: block_reference.clone(),
                end: block_reference.clone(),
                end_index: index,
                previous_config,
            }),
        }
    }
    if runs.is_empty() {
        return Ok(MutationOutcome::NoChange);
    }
    let reverse = runs
        .into_iter()
        .map(|run| Mutation::ChangeParagraphConfigBetweenBlockReferences {
            start_paragraph_reference: run.start,
            end_paragraph_reference: run.end,
            new_config: run.previous_config,
        })
        .collect();
    Ok(MutationOutcome::Changed {
        reverse_mutation: BatchMutation::new(reverse)?,
        transform: None,
    })
}

pub(crate) fn change_document_config(
    document: &mut Document,
    new_config: &NodeConfig,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    if document.config == *new_config {
        return Ok(MutationOutcome::NoChange);
    }
    let previous_config = std::mem::replace(&mut document.config, new_config.clone());
    view_delta.document_config_changed();
    Ok(MutationOutcome::changed(
        Mutation::ChangeDocumentConfig {
            new_config: previous_config,
        },
        None,
    ))
}

pub(crate) fn change_content_config(
    document: &mut Document,
    content_reference: &ContentReference,
    new_config: &NodeConfig,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let content = document.content_mut(content_reference)?;
    if content.config == *new_config {
        return Ok(MutationOutcome::NoChange);
    }
    let previous_config = std::mem::replace(&mut content.config, new_config.clone());
    view_delta.content(NodeViewDelta::ConfigChanged(content_reference.clone()));
    Ok(MutationOutcome::changed(
        Mutation::ChangeContentConfig {
            content_reference: content_reference.clone(),
            new_config: previous_config,
        },
        None,
    ))
}

pub(crate) fn change_embed_config(
    document: &mut Document,
    embed_reference: &BlockReference,
    new_config: &NodeConfig,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let embed = document.embed_mut(embed_reference)?;
    if embed.config == *new_config {
        return Ok(MutationOutcome::NoChange);
    }
    let previous_config = std::mem::replace(&mut embed.config, new_config.clone());
    view_delta.embed(NodeViewDelta::ConfigChanged(embed_reference.clone()));
    Ok(MutationOutcome::changed(
        Mutation::ChangeEmbedConfig {
            embed_reference: embed_reference.clone(),
            new_config: previous_config,
        },
        None,
    ))
}

pub(crate) fn change_void_config(
    document: &mut Document,
    void_start_point: &Point,
    new_config: &NodeConfig,
    view_delta: &mut ViewDeltaControl,
) -> EngineResult<MutationOutcome> {
    let (paragraph_reference, offset) = void_start_point.as_paragraph()?;
    let paragraph = document.paragraph_mut(paragraph_reference)?;
    let Some(void) = void_at_mut(&mut paragraph.children, offset) else {
        return Err(EngineError::NodeNotOfType {
            id: format!("{}@{offset}", paragraph_reference.block_id),
            expected: "Void",
        });
    };
    if void.config == *new_config {
        return Ok(MutationOutcome::NoChange);
    }
    let previous_config = std::mem::replace(&mut void.config, new_config.clone());
    view_delta.paragraph_children_changed(paragraph_reference);
    Ok(MutationOutcome::changed(
        Mutation::ChangeVoidConfig {
            void_start_point: void_start_point.clone(),
            new_config: previous_config,
        },
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockFragment, ContentFragment, EmbedFragment, Inline, Paragraph};
    use crate::model::ContentListFragment;
    use crate::mutation::apply_mutation;
    use crate::view_delta::NodeViewDelta;
    use crate::mutation::apply_mutation_with_view_delta;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn document() -> Document {
        Document::from_fragment(
            "doc",
            json!({}),
            "root",
            json!({}),
            &ContentFragment::new(vec![
                BlockFragment::Paragraph(Paragraph::new(
                    "p1",
                    json!({}),
                    vec![
                        Inline::text(json!({}), "ab"),
                        Inline::void("mention", json!({ "user": 1 })),
                        Inline::text(json!({ "bold": true }), "cd"),
                    ],
                )),
                BlockFragment::Embed(EmbedFragment {
                    id: "image".to_string(),
                    config: json!({ "src": "a.png" }),
                    contents: ContentListFragment::new(vec![]),
                }),
                BlockFragment::Paragraph(Paragraph::new("p2", json!({}), vec![Inline::text(json!({}), "ef")])),
            ]),
        )
        .unwrap()
    }

    fn p(id: &str, offset: usize) -> Point {
        Point::paragraph(BlockReference::new(id), offset)
    }

    fn round_trip(mutation: Mutation) {
        let mut doc = document();
        let before = doc.clone();
        let MutationOutcome::Changed { reverse_mutation, .. } = apply_mutation(&mut doc, &mutation).unwrap() else {
            panic!("expected a change");
        };
        assert_ne!(doc, before);
        apply_mutation(&mut doc, &Mutation::Batch(reverse_mutation)).unwrap();
        assert_eq!(doc, before);
    }

    #[rstest]
    #[case::text(Mutation::ChangeTextConfigBetweenPoints {
        start_paragraph_point: p("p1", 1),
        end_paragraph_point: p("p1", 5),
        new_config: json!({ "italic": true }),
    })]
    #[case::paragraphs(Mutation::ChangeParagraphConfigBetweenBlockReferences {
        start_paragraph_reference: BlockReference::new("p1"),
        end_paragraph_reference: BlockReference::new("p2"),
        new_config: json!({ "style": "h2" }),
    })]
    #[case::document(Mutation::ChangeDocumentConfig { new_config: json!({ "title": "x" }) })]
    #[case::content(Mutation::ChangeContentConfig {
        content_reference: ContentReference::new("root"),
        new_config: json!({ "columns": 2 }),
    })]
    #[case::embed(Mutation::ChangeEmbedConfig {
        embed_reference: BlockReference::new("image"),
        new_config: json!({ "src": "b.png" }),
    })]
    #[case::void(Mutation::ChangeVoidConfig {
        void_start_point: p("p1", 2),
        new_config: json!({ "user": 2 }),
    })]
    fn test_config_change_round_trips(#[case] mutation: Mutation) {
        round_trip(mutation);
    }

    #[rstest]
    #[case::text(Mutation::ChangeTextConfigBetweenPoints {
        start_paragraph_point: p("p1", 0),
        end_paragraph_point: p("p1", 2),
        new_config: json!({}),
    })]
    #[case::document(Mutation::ChangeDocumentConfig { new_config: json!({}) })]
    #[case::embed(Mutation::ChangeEmbedConfig {
        embed_reference: BlockReference::new("image"),
        new_config: json!({ "src": "a.png" }),
    })]
    #[case::void(Mutation::ChangeVoidConfig {
        void_start_point: p("p1", 2),
        new_config: json!({ "user": 1 }),
    })]
    fn test_config_change_to_current_value_is_no_change(#[case] mutation: Mutation) {
        let mut doc = document();
        assert!(!apply_mutation(&mut doc, &mutation).unwrap().did_change());
    }

    #[test]
    fn test_text_config_end_before_start() {
        let mut doc = document();
        let result = apply_mutation(
            &mut doc,
            &Mutation::ChangeTextConfigBetweenPoints {
                start_paragraph_point: p("p1", 3),
                end_paragraph_point: p("p1", 1),
                new_config: json!({}),
            },
        );

        assert_eq!(result, Err(EngineError::MutationNodeEndBeforeStart { start: 3, end: 1 }));
    }

    #[test]
    fn test_void_config_without_void() {
        let mut doc = document();
        let result = apply_mutation(
            &mut doc,
            &Mutation::ChangeVoidConfig {
                void_start_point: p("p1", 1),
                new_config: json!({}),
            },
        );

        assert!(matches!(result, Err(EngineError::NodeNotOfType { expected: "Void", .. })));
    }

    #[test]
    fn test_paragraph_config_skips_embeds() {
        let mut doc = document();
        let mut view_delta = ViewDeltaControl::new();
        apply_mutation_with_view_delta(
            &mut doc,
            &Mutation::ChangeParagraphConfigBetweenBlockReferences {
                start_paragraph_reference: BlockReference::new("p1"),
                end_paragraph_reference: BlockReference::new("p2"),
                new_config: json!({ "style": "h2" }),
            },
            &mut view_delta,
        )
        .unwrap();

        assert_eq!(doc.embed(&BlockReference::new("image")).unwrap().config, json!({ "src": "a.png" }));
        let changed: Vec<_> = view_delta
            .take()
            .paragraphs
            .into_iter()
            .map(|indexed| indexed.delta)
            .collect();
        assert_eq!(
            changed,
            vec![
                NodeViewDelta::ConfigChanged(BlockReference::new("p1")),
                NodeViewDelta::ConfigChanged(BlockReference::new("p2")),
            ]
        );
    }
}
