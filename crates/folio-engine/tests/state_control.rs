//! Batched updates, time travel and selection removal through `StateControl`.

mod common;

use common::*;
use folio_engine::{
    BatchMutation, EngineError, FixPolicy, Inline, Mutation, Range, Selection, SelectionRange, SelectionRangeIntention,
    StateControl, StateControlConfig, StateSnapshot,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run(control: &mut StateControl, mutation: Mutation) -> StateSnapshot {
    control.queue_update(move |delta| delta.apply_mutation(mutation).map(|_| ()));
    control.run_updates().unwrap();
    control.snapshot_state()
}

fn split_p2() -> Mutation {
    Mutation::SplitParagraphForwards {
        paragraph_point: p("p2", 1),
        new_paragraph_config: json!({}),
        new_paragraph_id: "p2b".to_string(),
    }
}

#[test]
fn test_time_travel_across_batches() {
    init_logging();
    let mut control = StateControl::new(StateControlConfig::default(), sample_document(), caret("root", p("p1", 0))).unwrap();
    let start = control.snapshot_state();
    let start_document = control.state_view().document().clone();
    let start_selection = control.state_view().selection().clone();

    let first = run(
        &mut control,
        Mutation::splice_paragraph(p("p1", 0), 0, vec![Inline::text(json!({}), "X")]),
    );
    let first_document = control.state_view().document().clone();
    let second = run(&mut control, split_p2());
    let second_document = control.state_view().document().clone();
    let third = run(&mut control, Mutation::remove_blocks(block("table"), block("table")));

    assert_eq!(third.mutation_id(), 3);
    assert_eq!(*control.document_at(first).unwrap(), first_document);
    assert_eq!(*control.document_at(start).unwrap(), start_document);
    assert_eq!(*control.document_at(second).unwrap(), second_document);
    assert_eq!(*control.document_at(third).unwrap(), *control.state_view().document());
    assert_eq!(control.selection_at(start).unwrap(), start_selection);

    // The live state is untouched by reading the past.
    assert_eq!(text_of(control.state_view().document(), "p1"), "Xabc");
    assert!(!control.state_view().document().has_block(&block("table")));
}

#[test]
fn test_transform_selection_forwards_through_split() {
    let mut control = StateControl::new(StateControlConfig::default(), sample_document(), Selection::empty()).unwrap();
    let before = control.snapshot_state();
    let old_caret = caret("root", p("p2", 2));
    let after = run(&mut control, split_p2());

    for policy in [FixPolicy::NoFix, FixPolicy::FixEvery, FixPolicy::FixAtEnd] {
        let moved = control
            .transform_selection_forwards(&old_caret, before, after, Some(policy))
            .unwrap();
        let range = &moved.selection_ranges[0].ranges[0];
        assert_eq!(range.start_point, p("p2b", 1));
        assert_eq!(range.end_point, p("p2b", 1));
    }
    assert!(
        control
            .transform_selection_forwards(&old_caret, after, before, None)
            .is_err()
    );
}

#[test]
fn test_remove_selection_across_embed() {
    init_logging();
    let selection = Selection::new(
        vec![text_selection_range("s", "root", p("p1", 1), p("p3", 1))],
        Some("s".to_string()),
    )
    .unwrap();
    let mut control = StateControl::new(StateControlConfig::default(), sample_document(), selection).unwrap();
    let before = control.snapshot_state();

    control.queue_update(|delta| {
        assert!(delta.remove_selection_contents()?);
        Ok(())
    });
    control.run_updates().unwrap();

    let document = control.state_view().document();
    insta::assert_snapshot!(outline(document), @r#"
    Document doc
      Content root
        Paragraph p1 "ahi"
    "#);
    let selection = control.state_view().selection();
    assert_eq!(selection.selection_ranges.len(), 1);
    let range = &selection.selection_ranges[0].ranges[0];
    assert_eq!((&range.start_point, &range.end_point), (&p("p1", 1), &p("p1", 1)));
    assert_eq!(control.history().current_mutation_id(), 1);
    assert_eq!(*control.document_at(before).unwrap(), sample_document());
}

#[test]
fn test_remove_collapsed_selection_changes_nothing() {
    let mut control =
        StateControl::new(StateControlConfig::default(), sample_document(), caret("root", p("p2", 1))).unwrap();

    control.queue_update(|delta| {
        assert!(!delta.remove_selection_contents()?);
        Ok(())
    });
    control.run_updates().unwrap();

    assert_eq!(control.history().current_mutation_id(), 0);
    assert_eq!(*control.state_view().document(), sample_document());
}

#[test]
fn test_remove_block_selection_removes_only_selected_block() {
    init_logging();
    let range = Range::new(content("root"), b("p2"), b("p2"), "r").unwrap();
    let selection = Selection::new(
        vec![SelectionRange::from_range(range, SelectionRangeIntention::Block, "s")],
        Some("s".to_string()),
    )
    .unwrap();
    let document = document(vec![paragraph("p1", "a"), paragraph("p2", "b"), paragraph("p3", "c")]);
    let mut control = StateControl::new(StateControlConfig::default(), document, selection).unwrap();

    control.queue_update(|delta| {
        assert!(delta.remove_selection_contents()?);
        Ok(())
    });
    control.run_updates().unwrap();

    insta::assert_snapshot!(outline(control.state_view().document()), @r#"
    Document doc
      Content root
        Paragraph p1 "a"
        Paragraph p3 "c"
    "#);
    assert_eq!(control.history().current_mutation_id(), 1);
    assert_eq!(control.state_view().selection().selection_ranges.len(), 1);
}

#[test]
fn test_remove_every_selection_range_once() {
    let selection = Selection::new(
        vec![
            text_selection_range("s1", "root", p("p2", 0), p("p2", 1)),
            text_selection_range("s2", "root", p("p2", 2), p("p2", 3)),
        ],
        Some("s2".to_string()),
    )
    .unwrap();
    let mut control = StateControl::new(StateControlConfig::default(), sample_document(), selection).unwrap();

    control.queue_update(|delta| {
        assert!(delta.remove_selection_contents()?);
        Ok(())
    });
    control.run_updates().unwrap();

    let document = control.state_view().document();
    assert_eq!(text_of(document, "p1"), "abc");
    assert_eq!(text_of(document, "p2"), "e");
    assert_eq!(text_of(document, "p3"), "ghi");
    assert_eq!(control.history().current_mutation_id(), 2);
}

#[test]
fn test_failing_batch_leaves_document_and_history_untouched() {
    init_logging();
    let mut control = StateControl::new(StateControlConfig::default(), sample_document(), caret("root", p("p1", 0))).unwrap();
    let before = control.snapshot_state();
    let batch = BatchMutation::new(vec![
        Mutation::remove_blocks(block("p2"), block("p2")),
        Mutation::splice_paragraph(p("p1", 99), 0, vec![]),
    ])
    .unwrap();

    control.queue_update(move |delta| delta.apply_mutation(Mutation::Batch(batch)).map(|_| ()));
    assert!(matches!(control.run_updates(), Err(EngineError::InvalidBounds(_))));

    assert_eq!(*control.state_view().document(), sample_document());
    assert_eq!(control.history().current_mutation_id(), 0);
    assert_eq!(*control.document_at(before).unwrap(), sample_document());

    // The failed update is gone and the control accepts new work.
    let after = run(
        &mut control,
        Mutation::splice_paragraph(p("p2", 0), 1, vec![Inline::text(json!({}), "D")]),
    );
    assert_eq!(after.mutation_id(), 1);
    assert_eq!(text_of(control.state_view().document(), "p2"), "Def");
    assert_eq!(*control.document_at(before).unwrap(), sample_document());
}

#[test]
fn test_fix_policy_decides_whether_collapsed_ranges_merge() {
    let selection = Selection::new(
        vec![
            text_selection_range("s1", "root", p("p2", 1), p("p2", 1)),
            text_selection_range("s2", "root", p("p2", 2), p("p2", 2)),
        ],
        Some("s2".to_string()),
    )
    .unwrap();
    let mut control = StateControl::new(StateControlConfig::default(), sample_document(), Selection::empty()).unwrap();
    let before = control.snapshot_state();
    let after = run(&mut control, Mutation::splice_paragraph(p("p2", 0), 3, vec![]));

    let unfixed = control
        .transform_selection_forwards(&selection, before, after, Some(FixPolicy::NoFix))
        .unwrap();
    assert_eq!(unfixed.selection_ranges.len(), 2);
    for selection_range in &unfixed.selection_ranges {
        assert_eq!(selection_range.ranges[0].start_point, p("p2", 0));
    }

    for policy in [FixPolicy::FixEvery, FixPolicy::FixAtEnd] {
        let fixed = control
            .transform_selection_forwards(&selection, before, after, Some(policy))
            .unwrap();
        assert_eq!(fixed.selection_ranges.len(), 1);
        assert_eq!(fixed.selection_ranges[0].ranges[0].start_point, p("p2", 0));
    }
}

#[test]
fn test_selection_at_returns_selection_set_between_mutations() {
    let mut control = StateControl::new(StateControlConfig::default(), sample_document(), caret("root", p("p1", 0))).unwrap();
    let first = run(&mut control, Mutation::splice_paragraph(p("p1", 0), 0, vec![Inline::text(json!({}), "X")]));
    control.queue_update(|delta| delta.set_selection(caret("root", p("p3", 2))));
    control.run_updates().unwrap();
    let moved_caret = control.state_view().selection().clone();

    assert_eq!(control.selection_at(first).unwrap(), moved_caret);
    run(&mut control, split_p2());
    assert_eq!(control.selection_at(first).unwrap(), moved_caret);
}
