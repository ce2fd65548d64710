use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::model::{ContentReference, Document};
use crate::selection::compare::{CompareKeysResult, compare_points};
use crate::selection::point::Point;

/// Two points inside one content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub content_reference: ContentReference,
    pub start_point: Point,
    pub end_point: Point,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeDirection {
    Forwards,
    Backwards,
    NeutralText,
    NeutralBlock,
    NeutralEmptyContent,
}

impl Range {
    /// Build a range, rejecting point combinations that can never be valid.
    pub fn new(
        content_reference: ContentReference,
        start_point: Point,
        end_point: Point,
        id: impl Into<String>,
    ) -> EngineResult<Self> {
        let range = Self {
            content_reference,
            start_point,
            end_point,
            id: id.into(),
        };
        range.check_structure()?;
        Ok(range)
    }

    /// A collapsed range at a paragraph or block point.
    pub fn collapsed(content_reference: ContentReference, point: Point, id: impl Into<String>) -> EngineResult<Self> {
        if matches!(point, Point::StartOfContent | Point::EndOfContent) {
            return Err(EngineError::PointShouldNotBeOfType {
                unexpected: "StartOfContent/EndOfContent",
            });
        }
        Self::new(content_reference, point.clone(), point, id)
    }

    pub(crate) fn check_structure(&self) -> EngineResult<()> {
        if self.start_point == Point::EndOfContent {
            return Err(EngineError::InvalidRange(format!(
                "range {} starts at the end of its content",
                self.id
            )));
        }
        if self.end_point == Point::StartOfContent {
            return Err(EngineError::InvalidRange(format!(
                "range {} ends at the start of its content",
                self.id
            )));
        }
        let mixed_kinds = (self.start_point.is_block() && self.end_point.is_paragraph())
            || (self.start_point.is_paragraph() && self.end_point.is_block());
        if mixed_kinds && self.start_point.block_reference() == self.end_point.block_reference() {
            return Err(EngineError::InvalidRange(format!(
                "range {} pairs a block point and a paragraph point on the same block",
                self.id
            )));
        }
        Ok(())
    }

    /// Check that every point resolves inside this range's content.
    pub fn validate(&self, document: &Document) -> EngineResult<()> {
        self.check_structure()?;
        document.content(&self.content_reference)?;
        for point in [&self.start_point, &self.end_point] {
            match point {
                Point::Paragraph {
                    paragraph_reference,
                    offset,
                } => {
                    document.index_of_block_in_content(&self.content_reference, paragraph_reference)?;
                    let length = document.paragraph_length(paragraph_reference)?;
                    if *offset > length {
                        return Err(EngineError::InvalidBounds(format!(
                            "offset {offset} in paragraph {} with length {length}",
                            paragraph_reference.block_id
                        )));
                    }
                }
                Point::Block { block_reference } => {
                    document.index_of_block_in_content(&self.content_reference, block_reference)?;
                }
                Point::StartOfContent | Point::EndOfContent => {}
            }
        }
        Ok(())
    }

    pub fn is_collapsed(&self) -> bool {
        self.start_point == self.end_point
    }
}

pub fn get_range_direction(document: &Document, range: &Range) -> EngineResult<RangeDirection> {
    let result = compare_points(
        document,
        &range.content_reference,
        &range.start_point,
        &range.content_reference,
        &range.end_point,
    )?;
    Ok(match result {
        CompareKeysResult::Before | CompareKeysResult::OverlapPreferKey1Before => RangeDirection::Forwards,
        CompareKeysResult::After | CompareKeysResult::OverlapPreferKey1After => RangeDirection::Backwards,
        CompareKeysResult::OverlapSameText => RangeDirection::NeutralText,
        CompareKeysResult::OverlapSameNonText => {
            if range.start_point.is_block() {
                RangeDirection::NeutralBlock
            } else {
                RangeDirection::NeutralEmptyContent
            }
        }
    })
}
