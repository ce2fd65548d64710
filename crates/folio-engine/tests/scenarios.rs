//! End-to-end editing scenarios on small documents.

mod common;

use common::*;
use folio_engine::{
    BatchMutation, Inline, Mutation, MutationOutcome, Point, Selection, SelectionRangeIntention, apply_mutation,
    keep_selection_range, normalize_selection, NormalizeOptions,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn changed(outcome: MutationOutcome) -> (BatchMutation, Option<folio_engine::SelectionRangeTransform>) {
    match outcome {
        MutationOutcome::Changed {
            reverse_mutation,
            transform,
        } => (reverse_mutation, transform),
        MutationOutcome::NoChange => panic!("expected the mutation to change the document"),
    }
}

fn options() -> NormalizeOptions<'static> {
    NormalizeOptions {
        fix_selection_range: &keep_selection_range,
        max_fix_passes: 16,
    }
}

#[test]
fn test_splice_insert_and_reverse() {
    let mut doc = document(vec![paragraph("p1", "ab")]);

    let (reverse, _) = changed(
        apply_mutation(
            &mut doc,
            &Mutation::splice_paragraph(p("p1", 1), 0, vec![Inline::text(json!({}), "X")]),
        )
        .unwrap(),
    );
    assert_eq!(text_of(&doc, "p1"), "aXb");
    assert_eq!(
        reverse.mutations(),
        &[Mutation::splice_paragraph(p("p1", 1), 1, vec![])]
    );

    apply_mutation(&mut doc, &Mutation::Batch(reverse)).unwrap();
    assert_eq!(text_of(&doc, "p1"), "ab");
}

#[test]
fn test_remove_block_collapses_caret_to_previous_paragraph() {
    let mut doc = document(vec![
        paragraph("p1", "a"),
        paragraph("p2", "b"),
        paragraph("p3", "c"),
    ]);
    let original = doc.clone();
    let selection = caret("root", p("p2", 1));

    let (reverse, transform) = changed(apply_mutation(&mut doc, &Mutation::remove_blocks(block("p2"), block("p2"))).unwrap());
    let transform = transform.unwrap();
    let moved = transform.apply(&selection.selection_ranges[0]).unwrap();

    assert_eq!(moved.ranges[0].start_point, p("p1", 1));
    assert_eq!(moved.ranges[0].end_point, p("p1", 1));
    assert_eq!(moved.id, "caret");
    assert!(matches!(
        reverse.mutations(),
        [Mutation::InsertBlocksAfter { insert_after_block_reference, .. }] if *insert_after_block_reference == block("p1")
    ));

    apply_mutation(&mut doc, &Mutation::Batch(reverse)).unwrap();
    assert_eq!(doc, original);
    assert_eq!(text_of(&doc, "p2"), "b");
}

#[test]
fn test_overlapping_ranges_merge_into_one() {
    let doc = document(vec![paragraph("p1", "abcdefghij")]);
    let first = text_selection_range("s1", "root", p("p1", 2), p("p1", 5));
    let second = text_selection_range("s2", "root", p("p1", 4), p("p1", 8));
    let selection = Selection::new(vec![first, second], Some("s2".to_string())).unwrap();

    let normalized = normalize_selection(&doc, &selection, &options()).unwrap();

    assert_eq!(normalized.selection_ranges.len(), 1);
    let merged = &normalized.selection_ranges[0];
    assert_eq!(merged.ranges.len(), 1);
    assert_eq!(merged.ranges[0].start_point, p("p1", 2));
    assert_eq!(merged.ranges[0].end_point, p("p1", 8));
    assert_eq!(merged.intention, SelectionRangeIntention::Text);
    let anchor = merged.anchor_range().unwrap();
    assert_eq!(anchor.start_point, p("p1", 2));
    assert_eq!(normalized.focus_selection_range_id.as_deref(), Some(merged.id.as_str()));
}

#[test]
fn test_join_forwards_then_reverse_split() {
    let mut doc = document(vec![
        folio_engine::BlockFragment::Paragraph(folio_engine::Paragraph::new(
            "first",
            json!({ "style": "quote" }),
            vec![Inline::text(json!({}), "hello ")],
        )),
        folio_engine::BlockFragment::Paragraph(folio_engine::Paragraph::new(
            "second",
            json!({ "style": "h1" }),
            vec![Inline::text(json!({ "bold": true }), "world")],
        )),
    ]);
    let original = doc.clone();

    let (reverse, _) = changed(
        apply_mutation(
            &mut doc,
            &Mutation::JoinParagraphsForwards {
                first_paragraph_reference: block("first"),
                second_paragraph_reference: block("second"),
            },
        )
        .unwrap(),
    );
    insta::assert_snapshot!(outline(&doc), @r#"
    Document doc
      Content root
        Paragraph second {"style":"h1"} "hello " "world" {"bold":true}
    "#);
    assert_eq!(
        reverse.mutations(),
        &[Mutation::SplitParagraphBackwards {
            paragraph_point: p("second", 6),
            new_paragraph_config: json!({ "style": "quote" }),
            new_paragraph_id: "first".to_string(),
        }]
    );

    apply_mutation(&mut doc, &Mutation::Batch(reverse)).unwrap();
    assert_eq!(doc, original);
}

#[test]
fn test_split_moves_caret_into_new_paragraph() {
    let mut doc = document(vec![paragraph("p1", "hello")]);
    let selection = caret("root", p("p1", 4));

    let (_, transform) = changed(
        apply_mutation(
            &mut doc,
            &Mutation::SplitParagraphForwards {
                paragraph_point: p("p1", 2),
                new_paragraph_config: json!({}),
                new_paragraph_id: "p2".to_string(),
            },
        )
        .unwrap(),
    );
    let moved = transform.unwrap().apply(&selection.selection_ranges[0]).unwrap();

    assert_eq!(moved.ranges[0].start_point, Point::paragraph(block("p2"), 2));
    assert_eq!(text_of(&doc, "p2"), "llo");
}

#[test]
fn test_removing_an_embed_drops_nested_selection() {
    let mut doc = sample_document();
    let inside_cell = text_selection_range("cell", "cell1", p("c1p", 0), p("c1p", 2));
    let outside = text_selection_range("outside", "root", p("p3", 1), p("p3", 1));
    let selection = Selection::new(vec![inside_cell, outside], None).unwrap();

    let (_, transform) = changed(apply_mutation(&mut doc, &Mutation::remove_blocks(block("table"), block("table"))).unwrap());
    let transform = transform.unwrap();

    let cell = transform.apply(&selection.selection_ranges[0]).unwrap();
    assert_eq!(cell.ranges[0].content_reference, content("root"));
    assert_eq!(cell.ranges[0].start_point, p("p2", 3));
    let outside = transform.apply(&selection.selection_ranges[1]).unwrap();
    assert_eq!(outside, selection.selection_ranges[1]);
}
