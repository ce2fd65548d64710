//! Mutation log and time travel.
//!
//! Past documents are never stored. Reading the document at an older
//! mutation id replays reverse mutations from the nearest known document
//! (the live one or the cached cursor) and caches the result.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use folio_config::FixPolicy;

use crate::errors::{EngineError, EngineResult};
use crate::model::Document;
use crate::mutation::{BatchMutation, Mutation, SelectionRangeTransform, apply_mutation};
use crate::selection::{NormalizeOptions, Selection, normalize_selection};

/// One committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub id: u64,
    pub mutation: Mutation,
    pub reverse_mutation: BatchMutation,
    pub selection_before: Selection,
    pub transform: Option<SelectionRangeTransform>,
}

/// A read-only handle on the state as of one mutation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateSnapshot {
    mutation_id: u64,
}

impl StateSnapshot {
    pub fn mutation_id(&self) -> u64 {
        self.mutation_id
    }
}

#[derive(Debug, Clone)]
struct TimeTravelCursor {
    mutation_id: u64,
    document: Rc<Document>,
}

/// Carry a selection across one mutation, dropping selection ranges that no
/// longer exist.
pub(crate) fn transform_selection(selection: &Selection, transform: Option<&SelectionRangeTransform>) -> Selection {
    let Some(transform) = transform else {
        return selection.clone();
    };
    let selection_ranges: Vec<_> = selection
        .selection_ranges
        .iter()
        .filter_map(|selection_range| transform.apply(selection_range))
        .collect();
    let focus_selection_range_id = selection
        .focus_selection_range_id
        .clone()
        .filter(|id| selection_ranges.iter().any(|selection_range| selection_range.id == *id));
    Selection {
        selection_ranges,
        focus_selection_range_id,
    }
}

#[derive(Debug, Default)]
pub struct History {
    records: Vec<MutationRecord>,
    cursor: RefCell<Option<TimeTravelCursor>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the last committed mutation, 0 before any.
    pub fn current_mutation_id(&self) -> u64 {
        self.records.last().map_or(0, |record| record.id)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            mutation_id: self.current_mutation_id(),
        }
    }

    pub fn records(&self) -> &[MutationRecord] {
        &self.records
    }

    pub(crate) fn push(
        &mut self,
        mutation: Mutation,
        reverse_mutation: BatchMutation,
        selection_before: Selection,
        transform: Option<SelectionRangeTransform>,
    ) -> u64 {
        let id = self.current_mutation_id() + 1;
        self.records.push(MutationRecord {
            id,
            mutation,
            reverse_mutation,
            selection_before,
            transform,
        });
        id
    }

    /// Records with `from < id <= to`.
    pub fn records_between(&self, from: u64, to: u64) -> &[MutationRecord] {
        let start = self.records.partition_point(|record| record.id <= from);
        let end = self.records.partition_point(|record| record.id <= to);
        &self.records[start..end.max(start)]
    }

    fn check_known(&self, mutation_id: u64) -> EngineResult<()> {
        let current = self.current_mutation_id();
        if mutation_id > current {
            return Err(EngineError::InvalidBounds(format!(
                "mutation id {mutation_id} is newer than the live state {current}"
            )));
        }
        Ok(())
    }

    /// The document as it was right after mutation `mutation_id`.
    pub fn document_at(&self, live_document: &Rc<Document>, mutation_id: u64) -> EngineResult<Rc<Document>> {
        self.check_known(mutation_id)?;
        let current = self.current_mutation_id();
        if mutation_id == current {
            return Ok(Rc::clone(live_document));
        }

        let cached = self.cursor.borrow().clone();
        let (start_id, mut document) = match cached {
            Some(cursor) if cursor.mutation_id.abs_diff(mutation_id) < current - mutation_id => {
                (cursor.mutation_id, cursor.document)
            }
            _ => (current, Rc::clone(live_document)),
        };
        if start_id == mutation_id {
            return Ok(document);
        }

        if start_id > mutation_id {
            let records = self.records_between(mutation_id, start_id);
            debug!(
                "time travel back from {start_id} to {mutation_id} ({} mutations)",
                records.len()
            );
            for record in records.iter().rev() {
                apply_mutation(
                    Rc::make_mut(&mut document),
                    &Mutation::Batch(record.reverse_mutation.clone()),
                )?;
            }
        } else {
            let records = self.records_between(start_id, mutation_id);
            debug!(
                "time travel forwards from {start_id} to {mutation_id} ({} mutations)",
                records.len()
            );
            for record in records {
                apply_mutation(Rc::make_mut(&mut document), &record.mutation)?;
            }
        }

        *self.cursor.borrow_mut() = Some(TimeTravelCursor {
            mutation_id,
            document: Rc::clone(&document),
        });
        Ok(document)
    }

    /// The selection in effect at `mutation_id`: the live selection for the
    /// current id, otherwise the selection captured just before the next
    /// mutation was applied. A selection set between two mutations is what
    /// this returns, not the one the earlier mutation produced.
    pub fn selection_at(&self, live_selection: &Selection, mutation_id: u64) -> EngineResult<Selection> {
        self.check_known(mutation_id)?;
        match self.records_between(mutation_id, mutation_id + 1).first() {
            Some(next) => Ok(next.selection_before.clone()),
            None => Ok(live_selection.clone()),
        }
    }

    /// Carry `selection`, valid at `from`, forward to the state at `to`.
    pub fn transform_selection_forwards(
        &self,
        live_document: &Rc<Document>,
        selection: &Selection,
        from: StateSnapshot,
        to: StateSnapshot,
        fix_policy: FixPolicy,
        options: &NormalizeOptions<'_>,
    ) -> EngineResult<Selection> {
        if to.mutation_id < from.mutation_id {
            return Err(EngineError::InvalidBounds(format!(
                "cannot transform a selection backwards from {} to {}",
                from.mutation_id, to.mutation_id
            )));
        }
        self.check_known(to.mutation_id)?;
        let mut selection = selection.clone();
        for record in self.records_between(from.mutation_id, to.mutation_id) {
            selection = transform_selection(&selection, record.transform.as_ref());
            if fix_policy == FixPolicy::FixEvery {
                let document = self.document_at(live_document, record.id)?;
                selection = normalize_selection(&document, &selection, options)?;
            }
        }
        if fix_policy == FixPolicy::FixAtEnd {
            let document = self.document_at(live_document, to.mutation_id)?;
            selection = normalize_selection(&document, &selection, options)?;
        }
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockFragment, BlockReference, ContentFragment, Inline, Paragraph};
    use crate::mutation::MutationOutcome;
    use crate::selection::{Point, keep_selection_range};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn document() -> Document {
        Document::from_fragment(
            "doc",
            json!({}),
            "root",
            json!({}),
            &ContentFragment::new(vec![BlockFragment::Paragraph(Paragraph::new(
                "p1",
                json!({}),
                vec![Inline::text(json!({}), "ab")],
            ))]),
        )
        .unwrap()
    }

    fn insert(text: &str, offset: usize) -> Mutation {
        Mutation::splice_paragraph(
            Point::paragraph(BlockReference::new("p1"), offset),
            0,
            vec![Inline::text(json!({}), text)],
        )
    }

    fn commit(history: &mut History, live: &mut Rc<Document>, mutation: Mutation) {
        let MutationOutcome::Changed {
            reverse_mutation,
            transform,
        } = apply_mutation(Rc::make_mut(live), &mutation).unwrap()
        else {
            panic!("expected a change");
        };
        history.push(mutation, reverse_mutation, Selection::empty(), transform);
    }

    fn text(document: &Document) -> String {
        document.paragraph(&BlockReference::new("p1")).unwrap().text()
    }

    #[test]
    fn test_document_at_replays_reverse_mutations() {
        let mut history = History::new();
        let mut live = Rc::new(document());
        commit(&mut history, &mut live, insert("X", 1));
        commit(&mut history, &mut live, insert("Y", 3));
        commit(&mut history, &mut live, insert("Z", 0));

        assert_eq!(text(&live), "ZaXbY");
        assert_eq!(text(&history.document_at(&live, 0).unwrap()), "ab");
        assert_eq!(text(&history.document_at(&live, 2).unwrap()), "aXbY");
        assert_eq!(text(&history.document_at(&live, 1).unwrap()), "aXb");
        assert_eq!(text(&history.document_at(&live, 3).unwrap()), "ZaXbY");
    }

    #[test]
    fn test_cursor_steps_forwards() {
        let mut history = History::new();
        let mut live = Rc::new(document());
        for (index, letter) in ["1", "2", "3", "4", "5"].iter().enumerate() {
            commit(&mut history, &mut live, insert(letter, index));
        }

        assert_eq!(text(&history.document_at(&live, 0).unwrap()), "ab");
        assert_eq!(text(&history.document_at(&live, 1).unwrap()), "1ab");
        assert_eq!(text(&history.document_at(&live, 2).unwrap()), "12ab");
    }

    #[test]
    fn test_document_at_future_id_fails() {
        let history = History::new();
        let live = Rc::new(document());

        assert!(matches!(history.document_at(&live, 1), Err(EngineError::InvalidBounds(_))));
    }

    #[test]
    fn test_transform_selection_forwards_shifts_caret() {
        let mut history = History::new();
        let mut live = Rc::new(document());
        let from = history.snapshot();
        commit(&mut history, &mut live, insert("XY", 0));
        let to = history.snapshot();
        let caret = Selection::collapsed_in_text(
            live.root_content_reference().clone(),
            Point::paragraph(BlockReference::new("p1"), 1),
            "r",
            "s",
        )
        .unwrap();
        let options = NormalizeOptions {
            fix_selection_range: &keep_selection_range,
            max_fix_passes: 4,
        };

        let moved = history
            .transform_selection_forwards(&live, &caret, from, to, FixPolicy::FixAtEnd, &options)
            .unwrap();

        assert_eq!(
            moved.selection_ranges[0].ranges[0].start_point,
            Point::paragraph(BlockReference::new("p1"), 3)
        );
        assert_eq!(moved.focus_selection_range_id.as_deref(), Some("s"));
    }
}
