//! Text segmentation provided by the host (graphemes, words, sentences).

use serde::{Deserialize, Serialize};

use crate::errors::EngineResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Grapheme,
    Word,
    Sentence,
}

/// One segment of a text. `index` is a character offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub segment: String,
    /// Only reported for word granularity.
    pub is_word_like: Option<bool>,
}

impl Segment {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.segment.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.segment.is_empty()
    }
}

pub trait Segmenter {
    fn segments(&self, text: &str) -> Vec<Segment>;

    /// The segment covering the character at `offset`.
    fn containing(&self, text: &str, offset: usize) -> Option<Segment> {
        self.segments(text)
            .into_iter()
            .find(|segment| segment.index <= offset && offset < segment.index + segment.len())
    }
}

pub trait SegmenterFactory {
    fn make(&self, locale: &str, granularity: Granularity) -> EngineResult<Box<dyn Segmenter>>;
}
