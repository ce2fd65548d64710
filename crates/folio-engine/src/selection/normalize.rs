//! Canonical form of a selection: ranges sorted, touching ranges merged,
//! host repairs applied until they stop changing anything.

use std::collections::HashMap;

use log::{debug, warn};

use crate::errors::EngineResult;
use crate::model::{ContentReference, Document, generate_id};
use crate::selection::compare::{CompareKeysResult, PointKey, compare_keys, make_point_key};
use crate::selection::point::Point;
use crate::selection::range::Range;
use crate::selection::selection_range::{Selection, SelectionRange, SelectionRangeIntention};

/// Host repair hook: returns the repaired selection range, or `None` to drop it.
pub type FixSelectionRangeFn = dyn Fn(&Document, &SelectionRange) -> Option<SelectionRange>;

pub struct NormalizeOptions<'a> {
    pub fix_selection_range: &'a FixSelectionRangeFn,
    pub max_fix_passes: usize,
}

struct Entry {
    content_reference: ContentReference,
    sorted_start: Point,
    sorted_end: Point,
    start_key: PointKey,
    end_key: PointKey,
    /// `(selection range index, range id)` of every input range folded into this entry.
    contributors: Vec<(usize, String)>,
}

impl Entry {
    fn is_collapsed(&self) -> bool {
        compare_keys(&self.start_key, &self.end_key).is_eq_any()
    }
}

struct UnionFind {
    parents: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parents: (0..size).collect(),
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parents[index] != index {
            self.parents[index] = self.parents[self.parents[index]];
            index = self.parents[index];
        }
        index
    }

    fn union(&mut self, first: usize, second: usize) {
        let first = self.find(first);
        let second = self.find(second);
        if first != second {
            self.parents[second.max(first)] = second.min(first);
        }
    }
}

fn lowest_common_content(
    document: &Document,
    first: &ContentReference,
    second: &ContentReference,
) -> EngineResult<ContentReference> {
    let second_ancestors = document.content_ancestors(second)?;
    for ancestor in document.content_ancestors(first)? {
        if second_ancestors.contains(&ancestor) {
            return Ok(ancestor);
        }
    }
    Ok(document.root_content_reference().clone())
}

/// Re-express a point of `content_reference` inside the ancestor content
/// `target`, as the block point of the embed that contains it.
fn lift_point(
    document: &Document,
    content_reference: &ContentReference,
    point: &Point,
    target: &ContentReference,
) -> EngineResult<Point> {
    if content_reference == target {
        return Ok(point.clone());
    }
    let mut current = content_reference.clone();
    loop {
        let embed_reference = document.embed_reference_of_content(&current)?.clone();
        let parent = document.content_reference_of_block(&embed_reference)?.clone();
        if parent == *target {
            return Ok(Point::block(embed_reference));
        }
        current = parent;
    }
}

fn lift_entry(document: &Document, entry: &mut Entry, target: &ContentReference) -> EngineResult<()> {
    if entry.content_reference == *target {
        return Ok(());
    }
    entry.sorted_start = lift_point(document, &entry.content_reference, &entry.sorted_start, target)?;
    entry.sorted_end = lift_point(document, &entry.content_reference, &entry.sorted_end, target)?;
    entry.content_reference = target.clone();
    entry.start_key = make_point_key(document, target, &entry.sorted_start)?;
    entry.end_key = make_point_key(document, target, &entry.sorted_end)?;
    Ok(())
}

/// A block point wins over paragraph points inside the same block.
fn covers(block_point: &Point, other: &Point) -> bool {
    match (block_point, other) {
        (Point::Block { block_reference }, Point::Paragraph { paragraph_reference, .. }) => {
            block_reference == paragraph_reference
        }
        _ => false,
    }
}

fn merge_entry(document: &Document, last: &mut Entry, mut next: Entry) -> EngineResult<()> {
    if last.content_reference != next.content_reference {
        let common = lowest_common_content(document, &last.content_reference, &next.content_reference)?;
        lift_entry(document, last, &common)?;
        lift_entry(document, &mut next, &common)?;
    }

    let take_next_start = !covers(&last.sorted_start, &next.sorted_start)
        && (covers(&next.sorted_start, &last.sorted_start)
            || matches!(
                compare_keys(&last.start_key, &next.start_key),
                CompareKeysResult::After | CompareKeysResult::OverlapPreferKey1After
            ));
    if take_next_start {
        last.sorted_start = next.sorted_start;
        last.start_key = next.start_key;
    }

    let take_next_end = !covers(&last.sorted_end, &next.sorted_end)
        && (covers(&next.sorted_end, &last.sorted_end)
            || matches!(
                compare_keys(&last.end_key, &next.end_key),
                CompareKeysResult::Before | CompareKeysResult::OverlapPreferKey1Before
            ));
    if take_next_end {
        last.sorted_end = next.sorted_end;
        last.end_key = next.end_key;
    }

    last.contributors.extend(next.contributors);
    Ok(())
}

fn sort_and_merge(
    document: &Document,
    selection_ranges: &[SelectionRange],
    focus_selection_range_id: Option<&str>,
) -> EngineResult<Vec<SelectionRange>> {
    let mut backwards: HashMap<(usize, &str), bool> = HashMap::new();
    let mut entries = Vec::new();
    for (selection_range_index, selection_range) in selection_ranges.iter().enumerate() {
        for range in &selection_range.ranges {
            let start_key = make_point_key(document, &range.content_reference, &range.start_point)?;
            let end_key = make_point_key(document, &range.content_reference, &range.end_point)?;
            let is_backwards = compare_keys(&start_key, &end_key).to_ordering().is_gt();
            backwards.insert((selection_range_index, range.id.as_str()), is_backwards);
            let (sorted_start, sorted_end, start_key, end_key) = if is_backwards {
                (range.end_point.clone(), range.start_point.clone(), end_key, start_key)
            } else {
                (range.start_point.clone(), range.end_point.clone(), start_key, end_key)
            };
            entries.push(Entry {
                content_reference: range.content_reference.clone(),
                sorted_start,
                sorted_end,
                start_key,
                end_key,
                contributors: vec![(selection_range_index, range.id.clone())],
            });
        }
    }

    entries.sort_by(|first, second| compare_keys(&first.start_key, &second.start_key).to_ordering());

    let mut union_find = UnionFind::new(selection_ranges.len());
    let mut merged: Vec<Entry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(last) = merged.last_mut() {
            let relation = compare_keys(&entry.start_key, &last.end_key);
            let touches = relation.is_le_non_text()
                || (relation == CompareKeysResult::OverlapSameText && (entry.is_collapsed() || last.is_collapsed()));
            if touches {
                union_find.union(last.contributors[0].0, entry.contributors[0].0);
                merge_entry(document, last, entry)?;
                continue;
            }
        }
        merged.push(entry);
    }

    let focus_index = focus_selection_range_id.and_then(|focus_id| {
        selection_ranges
            .iter()
            .position(|selection_range| selection_range.id == focus_id)
    });
    let mut group_order: Vec<usize> = Vec::new();
    let mut groups: HashMap<usize, Vec<Entry>> = HashMap::new();
    for entry in merged {
        let root = union_find.find(entry.contributors[0].0);
        if !groups.contains_key(&root) {
            group_order.push(root);
        }
        groups.entry(root).or_default().push(entry);
    }

    let mut output = Vec::with_capacity(group_order.len());
    for root in group_order {
        let entries = groups.remove(&root).unwrap_or_default();
        let survivor_index = match focus_index {
            Some(focus_index) if union_find.find(focus_index) == root => focus_index,
            _ => root,
        };
        let survivor = &selection_ranges[survivor_index];
        let is_backwards = backwards
            .get(&(survivor_index, survivor.anchor_range_id.as_str()))
            .copied()
            .unwrap_or(false);

        let mut ranges = Vec::with_capacity(entries.len());
        let mut anchor_range_id = None;
        let mut focus_range_id = None;
        for entry in entries {
            let owns = |range_id: &str| {
                entry
                    .contributors
                    .iter()
                    .any(|(index, id)| *index == survivor_index && id == range_id)
            };
            let holds_anchor = owns(&survivor.anchor_range_id);
            let holds_focus = owns(&survivor.focus_range_id);
            let mut id = if holds_anchor {
                survivor.anchor_range_id.clone()
            } else if holds_focus {
                survivor.focus_range_id.clone()
            } else {
                entry
                    .contributors
                    .iter()
                    .find(|(index, _)| *index == survivor_index)
                    .unwrap_or(&entry.contributors[0])
                    .1
                    .clone()
            };
            if ranges.iter().any(|range: &Range| range.id == id) {
                id = generate_id();
            }
            if holds_anchor {
                anchor_range_id = Some(id.clone());
            }
            if holds_focus {
                focus_range_id = Some(id.clone());
            }
            let reversible = entry.sorted_start != Point::StartOfContent && entry.sorted_end != Point::EndOfContent;
            let (start_point, end_point) = if is_backwards && reversible {
                (entry.sorted_end, entry.sorted_start)
            } else {
                (entry.sorted_start, entry.sorted_end)
            };
            ranges.push(Range::new(entry.content_reference, start_point, end_point, id)?);
        }

        let first_id = ranges[0].id.clone();
        let last_id = ranges[ranges.len() - 1].id.clone();
        output.push(SelectionRange::new(
            ranges,
            anchor_range_id.unwrap_or(first_id),
            focus_range_id.unwrap_or(last_id),
            survivor.intention,
            survivor.id.clone(),
        )?);
    }
    Ok(output)
}

/// Any selection range touching a paragraph point is a text selection.
fn fix_selection_intentions(selection_ranges: &mut [SelectionRange]) {
    for selection_range in selection_ranges {
        let touches_text = selection_range
            .ranges
            .iter()
            .any(|range| range.start_point.is_paragraph() || range.end_point.is_paragraph());
        if touches_text {
            selection_range.intention = SelectionRangeIntention::Text;
        }
    }
}

pub fn sort_and_merge_and_fix_selection_ranges(
    document: &Document,
    selection_ranges: Vec<SelectionRange>,
    focus_selection_range_id: Option<String>,
    options: &NormalizeOptions<'_>,
) -> EngineResult<Selection> {
    let mut current = selection_ranges;
    let mut focus = focus_selection_range_id;
    let mut passes = 0;
    let mut merged = loop {
        let merged = sort_and_merge(document, &current, focus.as_deref())?;
        passes += 1;
        if passes > options.max_fix_passes {
            warn!(
                "selection fix hook still changing ranges after {} passes",
                options.max_fix_passes
            );
            break merged;
        }

        let mut changed = false;
        let mut fixed = Vec::with_capacity(merged.len());
        for selection_range in merged {
            match (options.fix_selection_range)(document, &selection_range) {
                None => {
                    changed = true;
                    if focus.as_deref() == Some(selection_range.id.as_str()) {
                        focus = None;
                    }
                }
                Some(replacement) => {
                    if replacement != selection_range {
                        changed = true;
                        if focus.as_deref() == Some(selection_range.id.as_str()) {
                            focus = Some(replacement.id.clone());
                        }
                    }
                    fixed.push(replacement);
                }
            }
        }
        if !changed {
            break fixed;
        }
        current = fixed;
    };
    if passes > 2 {
        debug!("selection normalized after {passes} passes");
    }

    fix_selection_intentions(&mut merged);
    if let Some(focus_id) = &focus {
        if !merged.iter().any(|selection_range| selection_range.id == *focus_id) {
            focus = None;
        }
    }
    Selection::new(merged, focus)
}

pub fn normalize_selection(
    document: &Document,
    selection: &Selection,
    options: &NormalizeOptions<'_>,
) -> EngineResult<Selection> {
    sort_and_merge_and_fix_selection_ranges(
        document,
        selection.selection_ranges.clone(),
        selection.focus_selection_range_id.clone(),
        options,
    )
}

/// Fix hook that keeps every selection range as it is.
pub fn keep_selection_range(_document: &Document, selection_range: &SelectionRange) -> Option<SelectionRange> {
    Some(selection_range.clone())
}
