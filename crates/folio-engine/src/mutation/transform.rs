//! Selection transforms produced by mutations.
//!
//! A transform captures everything it needs when the mutation is applied, so
//! it can later be replayed against selections without the document.

use serde::{Deserialize, Serialize};

use crate::model::{BlockReference, ContentReference};
use crate::selection::{Point, Range, SelectionRange, SelectionRangeIntention};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitDirection {
    /// The new paragraph goes after the original and takes the tail.
    Forwards,
    /// The new paragraph goes before the original and takes the head.
    Backwards,
}

/// Points just outside a removed run, for text and block selections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePoints {
    pub text: Point,
    pub block: Point,
}

impl EdgePoints {
    fn pick(&self, intention: SelectionRangeIntention) -> &Point {
        match intention {
            SelectionRangeIntention::Text => &self.text,
            SelectionRangeIntention::Block => &self.block,
        }
    }
}

/// Where a range lands when everything it pointed into is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseTarget {
    pub content_reference: ContentReference,
    pub text: (Point, Point),
    pub block: (Point, Point),
}

impl CollapseTarget {
    pub(crate) fn at_edge(content_reference: ContentReference, edge: &EdgePoints) -> Self {
        Self {
            content_reference,
            text: (edge.text.clone(), edge.text.clone()),
            block: (edge.block.clone(), edge.block.clone()),
        }
    }

    pub(crate) fn whole_content(content_reference: ContentReference) -> Self {
        let points = (Point::StartOfContent, Point::EndOfContent);
        Self {
            content_reference,
            text: points.clone(),
            block: points,
        }
    }

    fn range(&self, intention: SelectionRangeIntention, id: String) -> Range {
        let (start_point, end_point) = match intention {
            SelectionRangeIntention::Text => self.text.clone(),
            SelectionRangeIntention::Block => self.block.clone(),
        };
        Range {
            content_reference: self.content_reference.clone(),
            start_point,
            end_point,
            id,
        }
    }
}

/// Removal of a contiguous run of blocks from one content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRemoval {
    pub content_reference: ContentReference,
    pub removed_block_references: Vec<BlockReference>,
    /// Order of the content's blocks before the removal.
    pub block_order: Vec<BlockReference>,
    /// Contents nested inside removed embeds.
    pub removed_content_ids: Vec<String>,
    pub before: Option<EdgePoints>,
    pub after: Option<EdgePoints>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRemoval {
    /// Removed contents and every content nested inside them.
    pub removed_content_ids: Vec<String>,
    pub collapse: CollapseTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionRangeTransform {
    SplitParagraph {
        paragraph_reference: BlockReference,
        new_paragraph_reference: BlockReference,
        offset: usize,
        direction: SplitDirection,
        block_order: Vec<BlockReference>,
    },
    JoinParagraphs {
        surviving_paragraph_reference: BlockReference,
        surviving_content_reference: ContentReference,
        surviving_shift: usize,
        removed_paragraph_reference: BlockReference,
        removed_content_reference: ContentReference,
        removed_shift: usize,
    },
    SpliceParagraph {
        paragraph_reference: BlockReference,
        offset: usize,
        removed_length: usize,
        inserted_length: usize,
    },
    RemoveBlocks(BlockRemoval),
    RemoveContents(ContentRemoval),
    MoveBlocks {
        destination_content_reference: ContentReference,
        removal: BlockRemoval,
    },
    /// Contents moved as a run.
    MoveContents {
        /// Moved contents and every content nested inside them.
        moved_content_ids: Vec<String>,
        /// The run left its embed.
        changes_embed: bool,
    },
    Chain(Vec<SelectionRangeTransform>),
}

/// Position of a point in a content, for ordering without a document.
fn order_position(block_order: &[BlockReference], point: &Point) -> Option<(usize, usize)> {
    match point {
        Point::StartOfContent => Some((0, 0)),
        Point::EndOfContent => Some((usize::MAX, 0)),
        Point::Block { block_reference } => block_order
            .iter()
            .position(|candidate| candidate == block_reference)
            .map(|index| (index + 1, 0)),
        Point::Paragraph {
            paragraph_reference,
            offset,
        } => block_order
            .iter()
            .position(|candidate| candidate == paragraph_reference)
            .map(|index| (index + 1, offset + 1)),
    }
}

/// Replace a block point paired with a paragraph point on the same block by
/// a block point at both ends.
fn fix_block_paragraph_pair(range: &mut Range) {
    let same_block = range.start_point.block_reference().is_some()
        && range.start_point.block_reference() == range.end_point.block_reference();
    if same_block && range.start_point.is_block() != range.end_point.is_block() {
        if range.start_point.is_block() {
            range.end_point = range.start_point.clone();
        } else {
            range.start_point = range.end_point.clone();
        }
    }
}

/// Put back `(sorted start, sorted end)` in the range's original orientation
/// when that orientation is still valid.
fn orient(range: &mut Range, sorted_start: Point, sorted_end: Point, backwards: bool) {
    if backwards && sorted_end != Point::EndOfContent && sorted_start != Point::StartOfContent {
        range.start_point = sorted_end;
        range.end_point = sorted_start;
    } else {
        range.start_point = sorted_start;
        range.end_point = sorted_end;
    }
}

/// Keep anchor and focus ids resolvable after ranges were dropped.
fn with_ranges(selection_range: &SelectionRange, ranges: Vec<Range>) -> SelectionRange {
    let resolves = |id: &str| ranges.iter().any(|range| range.id == id);
    let anchor_range_id = if resolves(&selection_range.anchor_range_id) {
        selection_range.anchor_range_id.clone()
    } else {
        ranges[0].id.clone()
    };
    let focus_range_id = if resolves(&selection_range.focus_range_id) {
        selection_range.focus_range_id.clone()
    } else {
        ranges[ranges.len() - 1].id.clone()
    };
    SelectionRange {
        ranges,
        anchor_range_id,
        focus_range_id,
        intention: selection_range.intention,
        id: selection_range.id.clone(),
    }
}

/// Ranges of `selection_range` whose content is not listed in `content_ids`.
fn ranges_outside(selection_range: &SelectionRange, content_ids: &[String]) -> Vec<Range> {
    selection_range
        .ranges
        .iter()
        .filter(|range| !content_ids.contains(&range.content_reference.content_id))
        .cloned()
        .collect()
}

fn collapsed(selection_range: &SelectionRange, target: &CollapseTarget) -> SelectionRange {
    let range = target.range(selection_range.intention, selection_range.anchor_range_id.clone());
    SelectionRange {
        anchor_range_id: range.id.clone(),
        focus_range_id: range.id.clone(),
        ranges: vec![range],
        intention: selection_range.intention,
        id: selection_range.id.clone(),
    }
}

enum Clipped {
    Kept(Range),
    Removed,
}

impl BlockRemoval {
    fn is_removed(&self, point: &Point) -> bool {
        point
            .block_reference()
            .is_some_and(|block_reference| self.removed_block_references.contains(block_reference))
    }

    fn collapse_target(&self) -> CollapseTarget {
        match (&self.before, &self.after) {
            (Some(edge), _) | (None, Some(edge)) => CollapseTarget::at_edge(self.content_reference.clone(), edge),
            (None, None) => CollapseTarget::whole_content(self.content_reference.clone()),
        }
    }

    /// Pick an edge point for an endpoint that fell into the run, preferring
    /// a text point when the opposite end is inside the same paragraph.
    fn edge_point(edge: &EdgePoints, intention: SelectionRangeIntention, other: &Point) -> Point {
        let point = edge.pick(intention);
        if point.is_block() && other.is_paragraph() && point.block_reference() == other.block_reference() {
            edge.text.clone()
        } else {
            point.clone()
        }
    }

    fn clip(&self, range: &Range, intention: SelectionRangeIntention, nested_removed: bool) -> Clipped {
        if nested_removed && self.removed_content_ids.contains(&range.content_reference.content_id) {
            return Clipped::Removed;
        }
        if range.content_reference != self.content_reference {
            return Clipped::Kept(range.clone());
        }
        let start_removed = self.is_removed(&range.start_point);
        let end_removed = self.is_removed(&range.end_point);
        if start_removed && end_removed {
            return Clipped::Removed;
        }
        if !start_removed && !end_removed {
            return Clipped::Kept(range.clone());
        }

        let start_position = order_position(&self.block_order, &range.start_point);
        let end_position = order_position(&self.block_order, &range.end_point);
        let backwards = start_position > end_position;
        let (sorted_start, sorted_end) = if backwards {
            (&range.end_point, &range.start_point)
        } else {
            (&range.start_point, &range.end_point)
        };
        let sorted_start_removed = if backwards { end_removed } else { start_removed };

        let (new_start, new_end) = if sorted_start_removed {
            match (&self.after, &self.before) {
                (Some(after), _) => (Self::edge_point(after, intention, sorted_end), sorted_end.clone()),
                (None, Some(before)) => (Self::edge_point(before, intention, sorted_end), sorted_end.clone()),
                (None, None) => (Point::StartOfContent, Point::EndOfContent),
            }
        } else {
            match (&self.before, &self.after) {
                (Some(before), _) => (sorted_start.clone(), Self::edge_point(before, intention, sorted_start)),
                (None, Some(after)) => (sorted_start.clone(), Self::edge_point(after, intention, sorted_start)),
                (None, None) => (Point::StartOfContent, Point::EndOfContent),
            }
        };

        let mut clipped = range.clone();
        orient(&mut clipped, new_start, new_end, backwards);
        fix_block_paragraph_pair(&mut clipped);
        Clipped::Kept(clipped)
    }

    fn apply(&self, selection_range: &SelectionRange) -> SelectionRange {
        let ranges: Vec<Range> = selection_range
            .ranges
            .iter()
            .filter_map(|range| match self.clip(range, selection_range.intention, true) {
                Clipped::Kept(range) => Some(range),
                Clipped::Removed => None,
            })
            .collect();
        if ranges.is_empty() {
            collapsed(selection_range, &self.collapse_target())
        } else {
            with_ranges(selection_range, ranges)
        }
    }
}

fn split_point(
    point: &Point,
    other_position: Option<(usize, usize)>,
    own_position: Option<(usize, usize)>,
    is_sorted_later: bool,
    paragraph_reference: &BlockReference,
    new_paragraph_reference: &BlockReference,
    offset: usize,
    direction: SplitDirection,
) -> Point {
    let other_strictly_before = other_position < own_position;
    match point {
        Point::Paragraph {
            paragraph_reference: reference,
            offset: point_offset,
        } if reference == paragraph_reference => {
            let point_offset = *point_offset;
            match direction {
                SplitDirection::Forwards => {
                    if point_offset > offset || (point_offset == offset && !other_strictly_before) {
                        Point::paragraph(new_paragraph_reference.clone(), point_offset - offset)
                    } else {
                        point.clone()
                    }
                }
                SplitDirection::Backwards => {
                    if point_offset < offset || (point_offset == offset && other_strictly_before) {
                        Point::paragraph(new_paragraph_reference.clone(), point_offset)
                    } else {
                        Point::paragraph(paragraph_reference.clone(), point_offset - offset)
                    }
                }
            }
        }
        Point::Block { block_reference } if block_reference == paragraph_reference => {
            let moves = match direction {
                SplitDirection::Forwards => is_sorted_later,
                SplitDirection::Backwards => !is_sorted_later,
            };
            if moves {
                Point::block(new_paragraph_reference.clone())
            } else {
                point.clone()
            }
        }
        _ => point.clone(),
    }
}

fn join_point(
    point: &Point,
    surviving_paragraph_reference: &BlockReference,
    surviving_shift: usize,
    removed_paragraph_reference: &BlockReference,
    removed_shift: usize,
) -> (Point, bool) {
    match point {
        Point::Paragraph {
            paragraph_reference,
            offset,
        } if paragraph_reference == removed_paragraph_reference => (
            Point::paragraph(surviving_paragraph_reference.clone(), offset + removed_shift),
            true,
        ),
        Point::Paragraph {
            paragraph_reference,
            offset,
        } if paragraph_reference == surviving_paragraph_reference => (
            Point::paragraph(surviving_paragraph_reference.clone(), offset + surviving_shift),
            false,
        ),
        Point::Block { block_reference } if block_reference == removed_paragraph_reference => {
            (Point::block(surviving_paragraph_reference.clone()), true)
        }
        _ => (point.clone(), false),
    }
}

impl SelectionRangeTransform {
    /// Carry a selection range across the mutation. `None` means it no
    /// longer exists.
    pub fn apply(&self, selection_range: &SelectionRange) -> Option<SelectionRange> {
        match self {
            SelectionRangeTransform::SplitParagraph {
                paragraph_reference,
                new_paragraph_reference,
                offset,
                direction,
                block_order,
            } => {
                let mut transformed = selection_range.clone();
                for range in &mut transformed.ranges {
                    let start_position = order_position(block_order, &range.start_point);
                    let end_position = order_position(block_order, &range.end_point);
                    let start_is_later = start_position > end_position;
                    let start = split_point(
                        &range.start_point,
                        end_position,
                        start_position,
                        start_is_later,
                        paragraph_reference,
                        new_paragraph_reference,
                        *offset,
                        *direction,
                    );
                    let end = split_point(
                        &range.end_point,
                        start_position,
                        end_position,
                        !start_is_later,
                        paragraph_reference,
                        new_paragraph_reference,
                        *offset,
                        *direction,
                    );
                    range.start_point = start;
                    range.end_point = end;
                }
                Some(transformed)
            }
            SelectionRangeTransform::JoinParagraphs {
                surviving_paragraph_reference,
                surviving_content_reference,
                surviving_shift,
                removed_paragraph_reference,
                removed_content_reference,
                removed_shift,
            } => {
                let mut transformed = selection_range.clone();
                for range in &mut transformed.ranges {
                    let (start, start_moved) = join_point(
                        &range.start_point,
                        surviving_paragraph_reference,
                        *surviving_shift,
                        removed_paragraph_reference,
                        *removed_shift,
                    );
                    let (end, end_moved) = join_point(
                        &range.end_point,
                        surviving_paragraph_reference,
                        *surviving_shift,
                        removed_paragraph_reference,
                        *removed_shift,
                    );
                    let changes_content = range.content_reference == *removed_content_reference
                        && removed_content_reference != surviving_content_reference;
                    match (changes_content, start_moved, end_moved) {
                        (true, true, true) => {
                            range.content_reference = surviving_content_reference.clone();
                            range.start_point = start;
                            range.end_point = end;
                        }
                        (true, true, false) => {
                            range.content_reference = surviving_content_reference.clone();
                            range.end_point = start.clone();
                            range.start_point = start;
                        }
                        (true, false, true) => {
                            range.content_reference = surviving_content_reference.clone();
                            range.start_point = end.clone();
                            range.end_point = end;
                        }
                        _ => {
                            range.start_point = start;
                            range.end_point = end;
                        }
                    }
                    fix_block_paragraph_pair(range);
                }
                Some(transformed)
            }
            SelectionRangeTransform::SpliceParagraph {
                paragraph_reference,
                offset,
                removed_length,
                inserted_length,
            } => {
                let mut transformed = selection_range.clone();
                for range in &mut transformed.ranges {
                    for point in [&mut range.start_point, &mut range.end_point] {
                        if let Point::Paragraph {
                            paragraph_reference: reference,
                            offset: point_offset,
                        } = point
                        {
                            if reference == paragraph_reference && *point_offset > *offset {
                                *point_offset = (*point_offset + inserted_length)
                                    .saturating_sub(*removed_length)
                                    .max(*offset);
                            }
                        }
                    }
                }
                Some(transformed)
            }
            SelectionRangeTransform::RemoveBlocks(removal) => Some(removal.apply(selection_range)),
            SelectionRangeTransform::RemoveContents(removal) => {
                let ranges = ranges_outside(selection_range, &removal.removed_content_ids);
                if ranges.is_empty() {
                    Some(collapsed(selection_range, &removal.collapse))
                } else {
                    Some(with_ranges(selection_range, ranges))
                }
            }
            SelectionRangeTransform::MoveContents {
                moved_content_ids,
                changes_embed,
            } => {
                // A selection range wholly inside or wholly outside the run
                // follows its contents by id. One split across the run keeps
                // the part that stayed.
                let ranges = ranges_outside(selection_range, moved_content_ids);
                if !changes_embed || ranges.is_empty() || ranges.len() == selection_range.ranges.len() {
                    Some(selection_range.clone())
                } else {
                    Some(with_ranges(selection_range, ranges))
                }
            }
            SelectionRangeTransform::MoveBlocks {
                destination_content_reference,
                removal,
            } => {
                let ranges: Vec<Range> = selection_range
                    .ranges
                    .iter()
                    .filter_map(|range| {
                        let moved = range.content_reference == removal.content_reference
                            && removal.is_removed(&range.start_point)
                            && removal.is_removed(&range.end_point);
                        if moved {
                            let mut retargeted = range.clone();
                            retargeted.content_reference = destination_content_reference.clone();
                            return Some(retargeted);
                        }
                        match removal.clip(range, selection_range.intention, false) {
                            Clipped::Kept(range) => Some(range),
                            Clipped::Removed => None,
                        }
                    })
                    .collect();
                Some(with_ranges(selection_range, ranges))
            }
            SelectionRangeTransform::Chain(transforms) => {
                let mut current = selection_range.clone();
                for transform in transforms {
                    current = transform.apply(&current)?;
                }
                Some(current)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(id: &str, offset: usize) -> Point {
        Point::paragraph(BlockReference::new(id), offset)
    }

    fn b(id: &str) -> Point {
        Point::block(BlockReference::new(id))
    }

    fn single(start: Point, end: Point, intention: SelectionRangeIntention) -> SelectionRange {
        SelectionRange::from_range(
            Range {
                content_reference: ContentReference::new("c1"),
                start_point: start,
                end_point: end,
                id: "r".to_string(),
            },
            intention,
            "s",
        )
    }

    fn points(selection_range: &SelectionRange) -> Vec<(Point, Point)> {
        selection_range
            .ranges
            .iter()
            .map(|range| (range.start_point.clone(), range.end_point.clone()))
            .collect()
    }

    fn split(direction: SplitDirection) -> SelectionRangeTransform {
        SelectionRangeTransform::SplitParagraph {
            paragraph_reference: BlockReference::new("p1"),
            new_paragraph_reference: BlockReference::new("q"),
            offset: 3,
            direction,
            block_order: vec![BlockReference::new("p0"), BlockReference::new("p1")],
        }
    }

    #[test]
    fn test_caret_at_split_offset_moves_to_new_paragraph() {
        let caret = single(p("p1", 3), p("p1", 3), SelectionRangeIntention::Text);
        let transformed = split(SplitDirection::Forwards).apply(&caret).unwrap();

        assert_eq!(points(&transformed), vec![(p("q", 0), p("q", 0))]);
    }

    #[test]
    fn test_range_ending_at_split_offset_stays_before_split() {
        let range = single(p("p1", 1), p("p1", 3), SelectionRangeIntention::Text);
        let transformed = split(SplitDirection::Forwards).apply(&range).unwrap();

        assert_eq!(points(&transformed), vec![(p("p1", 1), p("p1", 3))]);
    }

    #[test]
    fn test_backwards_split_moves_head_to_new_paragraph() {
        let range = single(p("p1", 1), p("p1", 5), SelectionRangeIntention::Text);
        let transformed = split(SplitDirection::Backwards).apply(&range).unwrap();

        assert_eq!(points(&transformed), vec![(p("q", 1), p("p1", 2))]);
    }

    #[test]
    fn test_split_extends_block_selection_over_new_paragraph() {
        let block = single(b("p1"), b("p1"), SelectionRangeIntention::Block);

        let forwards = split(SplitDirection::Forwards).apply(&block).unwrap();
        assert_eq!(points(&forwards), vec![(b("p1"), b("q"))]);

        let backwards = split(SplitDirection::Backwards).apply(&block).unwrap();
        assert_eq!(points(&backwards), vec![(b("q"), b("p1"))]);
    }

    #[test]
    fn test_join_shifts_points_of_removed_paragraph() {
        let join = SelectionRangeTransform::JoinParagraphs {
            surviving_paragraph_reference: BlockReference::new("p1"),
            surviving_content_reference: ContentReference::new("c1"),
            surviving_shift: 0,
            removed_paragraph_reference: BlockReference::new("p2"),
            removed_content_reference: ContentReference::new("c1"),
            removed_shift: 4,
        };
        let range = single(p("p1", 2), p("p2", 1), SelectionRangeIntention::Text);

        assert_eq!(
            points(&join.apply(&range).unwrap()),
            vec![(p("p1", 2), p("p1", 5))]
        );
    }

    #[test]
    fn test_join_turns_mixed_pair_on_one_block_into_block_range() {
        let join = SelectionRangeTransform::JoinParagraphs {
            surviving_paragraph_reference: BlockReference::new("p1"),
            surviving_content_reference: ContentReference::new("c1"),
            surviving_shift: 0,
            removed_paragraph_reference: BlockReference::new("p2"),
            removed_content_reference: ContentReference::new("c1"),
            removed_shift: 4,
        };
        let range = single(b("p1"), p("p2", 1), SelectionRangeIntention::Block);

        assert_eq!(points(&join.apply(&range).unwrap()), vec![(b("p1"), b("p1"))]);
    }

    #[test]
    fn test_splice_shifts_and_clamps_points() {
        let splice = SelectionRangeTransform::SpliceParagraph {
            paragraph_reference: BlockReference::new("p1"),
            offset: 2,
            removed_length: 3,
            inserted_length: 1,
        };
        let range = single(p("p1", 3), p("p1", 8), SelectionRangeIntention::Text);

        assert_eq!(
            points(&splice.apply(&range).unwrap()),
            vec![(p("p1", 2), p("p1", 6))]
        );
    }

    fn removal() -> BlockRemoval {
        BlockRemoval {
            content_reference: ContentReference::new("c1"),
            removed_block_references: vec![BlockReference::new("p2")],
            block_order: vec![
                BlockReference::new("p1"),
                BlockReference::new("p2"),
                BlockReference::new("p3"),
            ],
            removed_content_ids: vec![],
            before: Some(EdgePoints {
                text: p("p1", 1),
                block: b("p1"),
            }),
            after: Some(EdgePoints {
                text: p("p3", 0),
                block: b("p3"),
            }),
        }
    }

    #[test]
    fn test_remove_collapses_caret_to_end_of_previous_paragraph() {
        let caret = single(p("p2", 1), p("p2", 1), SelectionRangeIntention::Text);
        let transformed = SelectionRangeTransform::RemoveBlocks(removal()).apply(&caret).unwrap();

        assert_eq!(points(&transformed), vec![(p("p1", 1), p("p1", 1))]);
    }

    #[test]
    fn test_remove_collapses_block_selection_to_previous_block() {
        let block = single(b("p2"), b("p2"), SelectionRangeIntention::Block);
        let transformed = SelectionRangeTransform::RemoveBlocks(removal()).apply(&block).unwrap();

        assert_eq!(points(&transformed), vec![(b("p1"), b("p1"))]);
    }

    #[test]
    fn test_remove_clips_partially_covered_range() {
        let forwards = single(p("p1", 0), p("p2", 1), SelectionRangeIntention::Text);
        let transformed = SelectionRangeTransform::RemoveBlocks(removal()).apply(&forwards).unwrap();
        assert_eq!(points(&transformed), vec![(p("p1", 0), p("p1", 1))]);

        let backwards = single(p("p3", 0), p("p2", 1), SelectionRangeIntention::Text);
        let transformed = SelectionRangeTransform::RemoveBlocks(removal()).apply(&backwards).unwrap();
        assert_eq!(points(&transformed), vec![(p("p3", 0), p("p3", 0))]);
    }

    #[test]
    fn test_remove_drops_covered_range_of_multi_range_selection() {
        let selection_range = SelectionRange {
            ranges: vec![
                Range {
                    content_reference: ContentReference::new("c1"),
                    start_point: p("p2", 0),
                    end_point: p("p2", 1),
                    id: "r1".to_string(),
                },
                Range {
                    content_reference: ContentReference::new("cell"),
                    start_point: p("x", 0),
                    end_point: p("x", 1),
                    id: "r2".to_string(),
                },
            ],
            anchor_range_id: "r1".to_string(),
            focus_range_id: "r2".to_string(),
            intention: SelectionRangeIntention::Text,
            id: "s".to_string(),
        };
        let transformed = SelectionRangeTransform::RemoveBlocks(removal())
            .apply(&selection_range)
            .unwrap();

        assert_eq!(transformed.ranges.len(), 1);
        assert_eq!(transformed.anchor_range_id, "r2");
        assert_eq!(transformed.focus_range_id, "r2");
    }

    #[test]
    fn test_move_retargets_ranges_inside_moved_run() {
        let transform = SelectionRangeTransform::MoveBlocks {
            destination_content_reference: ContentReference::new("c2"),
            removal: removal(),
        };
        let range = single(p("p2", 0), p("p2", 1), SelectionRangeIntention::Text);
        let transformed = transform.apply(&range).unwrap();

        assert_eq!(transformed.ranges[0].content_reference, ContentReference::new("c2"));
        assert_eq!(points(&transformed), vec![(p("p2", 0), p("p2", 1))]);
    }

    fn cells(content_ids: &[&str]) -> SelectionRange {
        let ranges: Vec<Range> = content_ids
            .iter()
            .map(|content_id| Range {
                content_reference: ContentReference::new(*content_id),
                start_point: Point::StartOfContent,
                end_point: Point::EndOfContent,
                id: format!("{content_id}-range"),
            })
            .collect();
        SelectionRange {
            anchor_range_id: ranges[0].id.clone(),
            focus_range_id: ranges[ranges.len() - 1].id.clone(),
            ranges,
            intention: SelectionRangeIntention::Block,
            id: "s".to_string(),
        }
    }

    fn move_contents(changes_embed: bool) -> SelectionRangeTransform {
        SelectionRangeTransform::MoveContents {
            moved_content_ids: vec!["cell2".to_string(), "nested".to_string()],
            changes_embed,
        }
    }

    #[test]
    fn test_content_move_keeps_selection_inside_moved_contents() {
        let inside = cells(&["cell2", "nested"]);

        assert_eq!(move_contents(true).apply(&inside), Some(inside));
    }

    #[test]
    fn test_content_move_to_other_embed_drops_ranges_that_left() {
        let transformed = move_contents(true).apply(&cells(&["cell1", "cell2"])).unwrap();

        let content_ids: Vec<&str> = transformed
            .ranges
            .iter()
            .map(|range| range.content_reference.content_id.as_str())
            .collect();
        assert_eq!(content_ids, vec!["cell1"]);
        assert_eq!(transformed.focus_range_id, "cell1-range");
    }

    #[test]
    fn test_content_reorder_inside_embed_keeps_every_range() {
        let spanning = cells(&["cell1", "cell2"]);

        assert_eq!(move_contents(false).apply(&spanning), Some(spanning));
    }
}
