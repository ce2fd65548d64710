//! Character-offset algorithms over a paragraph's inline children.
//!
//! Offsets count characters (Unicode scalar values); a void counts as one.
//! Every function that edits a child list leaves it normalized: no empty text
//! runs and no two adjacent text runs with equal config.

use crate::errors::{EngineError, EngineResult};
use crate::model::{Inline, NodeConfig, Text};

pub fn inlines_length(children: &[Inline]) -> usize {
    children.iter().map(Inline::len).sum()
}

/// Byte index of the `char_offset`-th character, or the string length.
fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Drop empty text runs and merge adjacent runs with equal config.
pub fn normalize_inlines(children: &mut Vec<Inline>) {
    let mut normalized: Vec<Inline> = Vec::with_capacity(children.len());
    for child in children.drain(..) {
        if let Inline::Text(text) = &child {
            if text.is_empty() {
                continue;
            }
            if let Some(Inline::Text(previous)) = normalized.last_mut() {
                if previous.config == text.config {
                    previous.text.push_str(&text.text);
                    continue;
                }
            }
        }
        normalized.push(child);
    }
    *children = normalized;
}

/// Make sure a child boundary exists at `offset`, splitting a text run if
/// needed. Returns the index of the first child starting at `offset`.
pub(crate) fn split_children_at(children: &mut Vec<Inline>, offset: usize) -> EngineResult<usize> {
    let mut position = 0;
    for index in 0..children.len() {
        if position == offset {
            return Ok(index);
        }
        let length = children[index].len();
        if offset < position + length {
            let Inline::Text(text) = &mut children[index] else {
                return Err(EngineError::UnreachableCode(
                    "void spans more than one offset".to_string(),
                ));
            };
            let split = byte_index(&text.text, offset - position);
            let tail = text.text.split_off(split);
            let config = text.config.clone();
            children.insert(index + 1, Inline::Text(Text { config, text: tail }));
            return Ok(index + 1);
        }
        position += length;
    }
    if position == offset {
        Ok(children.len())
    } else {
        Err(EngineError::InvalidBounds(format!(
            "offset {offset} is past paragraph length {position}"
        )))
    }
}

/// Copy of the children between two character offsets.
pub fn slice_inlines(children: &[Inline], start: usize, end: usize) -> EngineResult<Vec<Inline>> {
    let length = inlines_length(children);
    if start > end || end > length {
        return Err(EngineError::InvalidBounds(format!(
            "slice {start}..{end} of paragraph with length {length}"
        )));
    }
    let mut sliced = Vec::new();
    let mut position = 0;
    for child in children {
        let child_length = child.len();
        let child_start = position;
        let child_end = position + child_length;
        position = child_end;
        if child_end <= start || child_start >= end {
            continue;
        }
        match child {
            Inline::Void(_) => sliced.push(child.clone()),
            Inline::Text(text) => {
                let from = start.saturating_sub(child_start);
                let to = end.min(child_end) - child_start;
                let from_byte = byte_index(&text.text, from);
                let to_byte = byte_index(&text.text, to);
                sliced.push(Inline::Text(Text {
                    config: text.config.clone(),
                    text: text.text[from_byte..to_byte].to_string(),
                }));
            }
        }
    }
    normalize_inlines(&mut sliced);
    Ok(sliced)
}

/// Replace `remove_count` characters at `offset` with `insert`, returning the
/// removed children.
pub fn splice_inlines(
    children: &mut Vec<Inline>,
    offset: usize,
    remove_count: usize,
    insert: Vec<Inline>,
) -> EngineResult<Vec<Inline>> {
    let length = inlines_length(children);
    let end = offset
        .checked_add(remove_count)
        .filter(|end| *end <= length)
        .ok_or_else(|| {
            EngineError::InvalidBounds(format!(
                "splice {offset}+{remove_count} of paragraph with length {length}"
            ))
        })?;
    let start_index = split_children_at(children, offset)?;
    let end_index = split_children_at(children, end)?;
    let mut removed: Vec<Inline> = children.splice(start_index..end_index, insert).collect();
    normalize_inlines(children);
    normalize_inlines(&mut removed);
    Ok(removed)
}

/// Split the child list at `offset`, returning the tail.
pub(crate) fn split_off_inlines(children: &mut Vec<Inline>, offset: usize) -> EngineResult<Vec<Inline>> {
    let index = split_children_at(children, offset)?;
    let tail = children.split_off(index);
    Ok(tail)
}

/// A contiguous run of text that shared one config before a config change.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextConfigRun {
    pub start: usize,
    pub end: usize,
    pub previous_config: NodeConfig,
}

/// Set the config of every text run between `start` and `end`. Returns the
/// runs whose config actually changed, grouped by their previous config.
pub(crate) fn change_text_config(
    children: &mut Vec<Inline>,
    start: usize,
    end: usize,
    new_config: &NodeConfig,
) -> EngineResult<Vec<TextConfigRun>> {
    let start_index = split_children_at(children, start)?;
    let end_index = split_children_at(children, end)?;
    let mut runs: Vec<TextConfigRun> = Vec::new();
    let mut position = start;
    for child in &mut children[start_index..end_index] {
        let length = child.len();
        if let Inline::Text(text) = child {
            if text.config != *new_config {
                let previous_config = std::mem::replace(&mut text.config, new_config.clone());
                match runs.last_mut() {
                    Some(run) if run.end == position && run.previous_config == previous_config => {
                        run.end = position + length;
                    }
                    _ => runs.push(TextConfigRun {
                        start: position,
                        end: position + length,
                        previous_config,
                    }),
                }
            }
        }
        position += length;
    }
    normalize_inlines(children);
    Ok(runs)
}

/// The void starting exactly at `offset`, if any.
pub(crate) fn void_at_mut(children: &mut [Inline], offset: usize) -> Option<&mut crate::model::Void> {
    let mut position = 0;
    for child in children.iter_mut() {
        if position == offset {
            if let Inline::Void(void) = child {
                return Some(void);
            }
        }
        position += child.len();
        if position > offset {
            break;
        }
    }
    None
}
