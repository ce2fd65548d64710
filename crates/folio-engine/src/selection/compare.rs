//! Ordering of points across the whole document tree.
//!
//! A point is turned into a [`PointKey`]: the `(block index, content index)`
//! steps leading from the root content down to the point's content, plus the
//! point's position inside that content. Keys order like a depth-first walk
//! of the tree, with overlap results where two different points denote the
//! same caret position (start of content next to the first paragraph's
//! offset 0, a block point and offsets inside that block, ...).

use std::cmp::Ordering;

use crate::errors::EngineResult;
use crate::model::{Block, ContentReference, Document};
use crate::selection::point::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareKeysResult {
    Before,
    After,
    /// The points overlap; the first one sorts first.
    OverlapPreferKey1Before,
    /// The points overlap; the first one sorts last.
    OverlapPreferKey1After,
    OverlapSameNonText,
    OverlapSameText,
}

impl CompareKeysResult {
    /// Result of the comparison with the arguments swapped.
    pub fn flip(self) -> Self {
        match self {
            CompareKeysResult::Before => CompareKeysResult::After,
            CompareKeysResult::After => CompareKeysResult::Before,
            CompareKeysResult::OverlapPreferKey1Before => CompareKeysResult::OverlapPreferKey1After,
            CompareKeysResult::OverlapPreferKey1After => CompareKeysResult::OverlapPreferKey1Before,
            same => same,
        }
    }

    pub fn is_eq_any(self) -> bool {
        matches!(
            self,
            CompareKeysResult::OverlapSameText | CompareKeysResult::OverlapSameNonText
        )
    }

    pub fn is_eq_non_text(self) -> bool {
        self == CompareKeysResult::OverlapSameNonText
    }

    pub fn is_le_non_text(self) -> bool {
        matches!(
            self,
            CompareKeysResult::Before
                | CompareKeysResult::OverlapPreferKey1Before
                | CompareKeysResult::OverlapPreferKey1After
                | CompareKeysResult::OverlapSameNonText
        )
    }

    pub fn is_ge_non_text(self) -> bool {
        matches!(
            self,
            CompareKeysResult::After
                | CompareKeysResult::OverlapPreferKey1Before
                | CompareKeysResult::OverlapPreferKey1After
                | CompareKeysResult::OverlapSameNonText
        )
    }

    pub fn to_ordering(self) -> Ordering {
        match self {
            CompareKeysResult::Before | CompareKeysResult::OverlapPreferKey1Before => Ordering::Less,
            CompareKeysResult::After | CompareKeysResult::OverlapPreferKey1After => Ordering::Greater,
            CompareKeysResult::OverlapSameNonText | CompareKeysResult::OverlapSameText => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyPosition {
    Start,
    End,
    Block(usize),
    Paragraph { index: usize, offset: usize, length: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointKey {
    path: Vec<(usize, usize)>,
    number_of_blocks: usize,
    /// The content holds exactly one block and it is an embed or an empty
    /// paragraph, so its start and end touch that block.
    single_coincident: bool,
    position: KeyPosition,
}

pub fn make_point_key(
    document: &Document,
    content_reference: &ContentReference,
    point: &Point,
) -> EngineResult<PointKey> {
    let mut path = Vec::new();
    let mut current = content_reference.clone();
    while !document.is_root_content(&current) {
        let embed_reference = document.embed_reference_of_content(&current)?.clone();
        let content_index = document.index_of_content_in_embed(&embed_reference, &current)?;
        let parent = document.content_reference_of_block(&embed_reference)?.clone();
        let block_index = document.index_of_block_in_content(&parent, &embed_reference)?;
        path.push((block_index, content_index));
        current = parent;
    }
    path.reverse();

    let content = document.content(content_reference)?;
    let number_of_blocks = content.block_references.len();
    let single_coincident = match content.block_references.as_slice() {
        [only] => match document.block(only)? {
            Block::Embed(_) => true,
            Block::Paragraph(paragraph) => paragraph.is_empty(),
        },
        _ => false,
    };

    let position = match point {
        Point::StartOfContent => KeyPosition::Start,
        Point::EndOfContent => KeyPosition::End,
        Point::Block { block_reference } => {
            KeyPosition::Block(document.index_of_block_in_content(content_reference, block_reference)?)
        }
        Point::Paragraph {
            paragraph_reference,
            offset,
        } => KeyPosition::Paragraph {
            index: document.index_of_block_in_content(content_reference, paragraph_reference)?,
            offset: *offset,
            length: document.paragraph_length(paragraph_reference)?,
        },
    };

    Ok(PointKey {
        path,
        number_of_blocks,
        single_coincident,
        position,
    })
}

pub fn compare_keys(key1: &PointKey, key2: &PointKey) -> CompareKeysResult {
    let common = key1
        .path
        .iter()
        .zip(&key2.path)
        .take_while(|(step1, step2)| step1 == step2)
        .count();
    match (key1.path.get(common), key2.path.get(common)) {
        (Some(step1), Some(step2)) => {
            if step1 < step2 {
                CompareKeysResult::Before
            } else {
                CompareKeysResult::After
            }
        }
        (None, Some(&(block_index, _))) => compare_with_descendant(key1, block_index),
        (Some(&(block_index, _)), None) => compare_with_descendant(key2, block_index).flip(),
        (None, None) => compare_in_same_content(key1, key2),
    }
}

/// Compare a key against any point nested inside the embed at `block_index`
/// of the key's own content.
fn compare_with_descendant(key: &PointKey, block_index: usize) -> CompareKeysResult {
    use CompareKeysResult::*;
    match key.position {
        KeyPosition::Start => {
            if block_index == 0 && key.single_coincident {
                OverlapPreferKey1Before
            } else {
                Before
            }
        }
        KeyPosition::End => {
            if block_index + 1 == key.number_of_blocks && key.single_coincident {
                OverlapPreferKey1After
            } else {
                After
            }
        }
        KeyPosition::Block(index) => match index.cmp(&block_index) {
            Ordering::Less => Before,
            Ordering::Greater => After,
            Ordering::Equal => OverlapPreferKey1Before,
        },
        KeyPosition::Paragraph { index, .. } => {
            if index < block_index {
                Before
            } else {
                After
            }
        }
    }
}

fn compare_in_same_content(key1: &PointKey, key2: &PointKey) -> CompareKeysResult {
    use CompareKeysResult::*;
    let number_of_blocks = key1.number_of_blocks;
    let single_coincident = key1.single_coincident;
    match (key1.position, key2.position) {
        (KeyPosition::Start, KeyPosition::Start) | (KeyPosition::End, KeyPosition::End) => OverlapSameNonText,
        (KeyPosition::Start, KeyPosition::End) => {
            if number_of_blocks == 0 {
                OverlapSameNonText
            } else if single_coincident {
                OverlapPreferKey1Before
            } else {
                Before
            }
        }
        (KeyPosition::Start, KeyPosition::Block(index)) => {
            if index == 0 && single_coincident {
                OverlapPreferKey1Before
            } else {
                Before
            }
        }
        (KeyPosition::Start, KeyPosition::Paragraph { index, offset, .. }) => {
            if index == 0 && offset == 0 {
                OverlapPreferKey1Before
            } else {
                Before
            }
        }
        (KeyPosition::End, KeyPosition::Block(index)) => {
            if index + 1 == number_of_blocks && single_coincident {
                OverlapPreferKey1After
            } else {
                After
            }
        }
        (KeyPosition::End, KeyPosition::Paragraph { index, offset, length }) => {
            if index + 1 == number_of_blocks && offset == length {
                OverlapPreferKey1After
            } else {
                After
            }
        }
        (KeyPosition::Block(index1), KeyPosition::Block(index2)) => match index1.cmp(&index2) {
            Ordering::Less => Before,
            Ordering::Greater => After,
            Ordering::Equal => OverlapSameNonText,
        },
        (KeyPosition::Block(block_index), KeyPosition::Paragraph { index, .. }) => {
            match block_index.cmp(&index) {
                Ordering::Less => Before,
                Ordering::Greater => After,
                Ordering::Equal => OverlapPreferKey1Before,
            }
        }
        (
            KeyPosition::Paragraph {
                index: index1,
                offset: offset1,
                ..
            },
            KeyPosition::Paragraph {
                index: index2,
                offset: offset2,
                ..
            },
        ) => match (index1, offset1).cmp(&(index2, offset2)) {
            Ordering::Less => Before,
            Ordering::Greater => After,
            Ordering::Equal => OverlapSameText,
        },
        _ => compare_in_same_content(key2, key1).flip(),
    }
}

/// Build both keys and compare them.
pub fn compare_points(
    document: &Document,
    content_reference1: &ContentReference,
    point1: &Point,
    content_reference2: &ContentReference,
    point2: &Point,
) -> EngineResult<CompareKeysResult> {
    let key1 = make_point_key(document, content_reference1, point1)?;
    let key2 = make_point_key(document, content_reference2, point2)?;
    Ok(compare_keys(&key1, &key2))
}
