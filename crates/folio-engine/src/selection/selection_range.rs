use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::model::{ContentReference, Document};
use crate::selection::point::Point;
use crate::selection::range::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionRangeIntention {
    Block,
    Text,
}

/// One or more ranges selected together, possibly across nested contents.
///
/// The anchor point is the start of the anchor range and the focus point is
/// the end of the focus range. `id` is stable across transforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub ranges: Vec<Range>,
    pub anchor_range_id: String,
    pub focus_range_id: String,
    pub intention: SelectionRangeIntention,
    pub id: String,
}

impl SelectionRange {
    pub fn new(
        ranges: Vec<Range>,
        anchor_range_id: impl Into<String>,
        focus_range_id: impl Into<String>,
        intention: SelectionRangeIntention,
        id: impl Into<String>,
    ) -> EngineResult<Self> {
        let selection_range = Self {
            ranges,
            anchor_range_id: anchor_range_id.into(),
            focus_range_id: focus_range_id.into(),
            intention,
            id: id.into(),
        };
        selection_range.check_structure()?;
        Ok(selection_range)
    }

    /// A selection range made of a single range, which is both anchor and focus.
    pub fn from_range(range: Range, intention: SelectionRangeIntention, id: impl Into<String>) -> Self {
        Self {
            anchor_range_id: range.id.clone(),
            focus_range_id: range.id.clone(),
            ranges: vec![range],
            intention,
            id: id.into(),
        }
    }

    pub(crate) fn check_structure(&self) -> EngineResult<()> {
        if self.ranges.is_empty() {
            return Err(EngineError::InvalidRange(format!(
                "selection range {} has no ranges",
                self.id
            )));
        }
        for range_id in [&self.anchor_range_id, &self.focus_range_id] {
            if !self.ranges.iter().any(|range| range.id == *range_id) {
                return Err(EngineError::InvalidRange(format!(
                    "selection range {} does not contain range {range_id}",
                    self.id
                )));
            }
        }
        for range in &self.ranges {
            range.check_structure()?;
        }
        Ok(())
    }

    pub fn range(&self, range_id: &str) -> Option<&Range> {
        self.ranges.iter().find(|range| range.id == range_id)
    }

    pub fn anchor_range(&self) -> EngineResult<&Range> {
        self.range(&self.anchor_range_id)
            .ok_or_else(|| EngineError::InvalidRange(format!("missing anchor range {}", self.anchor_range_id)))
    }

    pub fn focus_range(&self) -> EngineResult<&Range> {
        self.range(&self.focus_range_id)
            .ok_or_else(|| EngineError::InvalidRange(format!("missing focus range {}", self.focus_range_id)))
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self.ranges.as_slice(), [range] if range.is_collapsed())
    }
}

/// Anchor and focus points with the content each lives in.
pub fn selection_range_anchor_and_focus(
    selection_range: &SelectionRange,
) -> EngineResult<((&ContentReference, &Point), (&ContentReference, &Point))> {
    let anchor_range = selection_range.anchor_range()?;
    let focus_range = selection_range.focus_range()?;
    Ok((
        (&anchor_range.content_reference, &anchor_range.start_point),
        (&focus_range.content_reference, &focus_range.end_point),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub selection_ranges: Vec<SelectionRange>,
    pub focus_selection_range_id: Option<String>,
}

impl Selection {
    pub fn new(
        selection_ranges: Vec<SelectionRange>,
        focus_selection_range_id: Option<String>,
    ) -> EngineResult<Self> {
        let selection = Self {
            selection_ranges,
            focus_selection_range_id,
        };
        selection.check_structure()?;
        Ok(selection)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A caret inside a paragraph.
    pub fn collapsed_in_text(
        content_reference: ContentReference,
        point: Point,
        range_id: impl Into<String>,
        selection_range_id: impl Into<String>,
    ) -> EngineResult<Self> {
        point.as_paragraph()?;
        let range = Range::collapsed(content_reference, point, range_id)?;
        let selection_range = SelectionRange::from_range(range, SelectionRangeIntention::Text, selection_range_id);
        let focus = Some(selection_range.id.clone());
        Ok(Self {
            selection_ranges: vec![selection_range],
            focus_selection_range_id: focus,
        })
    }

    pub(crate) fn check_structure(&self) -> EngineResult<()> {
        for selection_range in &self.selection_ranges {
            selection_range.check_structure()?;
        }
        if let Some(focus_id) = &self.focus_selection_range_id {
            if self.selection_range(focus_id).is_none() {
                return Err(EngineError::InvalidRange(format!(
                    "selection does not contain focus selection range {focus_id}"
                )));
            }
        }
        Ok(())
    }

    pub fn validate(&self, document: &Document) -> EngineResult<()> {
        self.check_structure()?;
        for selection_range in &self.selection_ranges {
            for range in &selection_range.ranges {
                range.validate(document)?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.selection_ranges.is_empty()
    }

    pub fn selection_range(&self, id: &str) -> Option<&SelectionRange> {
        self.selection_ranges
            .iter()
            .find(|selection_range| selection_range.id == id)
    }

    pub fn focus_selection_range(&self) -> Option<&SelectionRange> {
        self.focus_selection_range_id
            .as_deref()
            .and_then(|id| self.selection_range(id))
    }
}

/// Whether the selection is a single caret inside a paragraph.
pub fn is_selection_collapsed_in_text(selection: &Selection) -> bool {
    match selection.selection_ranges.as_slice() {
        [selection_range] => {
            selection_range.is_collapsed()
                && selection_range.ranges[0].start_point.is_paragraph()
        }
        _ => false,
    }
}
