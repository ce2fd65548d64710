//! Ordered per-node change records handed to the view layer once per batch.

use serde::{Deserialize, Serialize};

use crate::model::{BlockReference, ContentReference};

/// A change record tagged with its position across all seven lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indexed<T> {
    pub delta_index: u64,
    pub delta: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeViewDelta<R> {
    Created(R),
    Removed(R),
    ConfigChanged(R),
}

pub type ParagraphViewDelta = NodeViewDelta<BlockReference>;
pub type EmbedViewDelta = NodeViewDelta<BlockReference>;
pub type ContentViewDelta = NodeViewDelta<ContentReference>;

/// Inline children of a paragraph changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubParagraphViewDelta {
    pub paragraph: BlockReference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubEmbedViewDelta {
    ContentsInserted {
        embed: BlockReference,
        contents: Vec<ContentReference>,
    },
    ContentsRemoved {
        embed: BlockReference,
        contents: Vec<ContentReference>,
    },
    ContentsMoved {
        from_embed: BlockReference,
        to_embed: BlockReference,
        contents: Vec<ContentReference>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubContentViewDelta {
    BlocksInserted {
        content: ContentReference,
        blocks: Vec<BlockReference>,
    },
    BlocksRemoved {
        content: ContentReference,
        blocks: Vec<BlockReference>,
    },
    BlocksMoved {
        from_content: ContentReference,
        to_content: ContentReference,
        blocks: Vec<BlockReference>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentViewDelta {
    ConfigChanged,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewDelta {
    pub paragraphs: Vec<Indexed<ParagraphViewDelta>>,
    pub sub_paragraphs: Vec<Indexed<SubParagraphViewDelta>>,
    pub embeds: Vec<Indexed<EmbedViewDelta>>,
    pub sub_embeds: Vec<Indexed<SubEmbedViewDelta>>,
    pub contents: Vec<Indexed<ContentViewDelta>>,
    pub sub_contents: Vec<Indexed<SubContentViewDelta>>,
    pub document: Vec<Indexed<DocumentViewDelta>>,
}

impl ViewDelta {
    pub fn len(&self) -> usize {
        self.paragraphs.len()
            + self.sub_paragraphs.len()
            + self.embeds.len()
            + self.sub_embeds.len()
            + self.contents.len()
            + self.sub_contents.len()
            + self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer of the per-batch view deltas.
pub trait ViewControl {
    fn apply_view_delta(&mut self, view_delta: ViewDelta);
}

/// Accumulates one batch worth of view-delta records.
#[derive(Debug, Default)]
pub struct ViewDeltaControl {
    next_index: u64,
    delta: ViewDelta,
    discard: bool,
}

impl ViewDeltaControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// A control that drops every record; used when applying mutations with
    /// no view attached.
    pub fn discarding() -> Self {
        Self {
            discard: true,
            ..Self::default()
        }
    }

    fn next(&mut self) -> u64 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn push<T>(&mut self, select: fn(&mut ViewDelta) -> &mut Vec<Indexed<T>>, delta: T) {
        if self.discard {
            return;
        }
        let delta_index = self.next();
        select(&mut self.delta).push(Indexed { delta_index, delta });
    }

    pub fn paragraph(&mut self, delta: ParagraphViewDelta) {
        self.push(|d| &mut d.paragraphs, delta);
    }

    pub fn embed(&mut self, delta: EmbedViewDelta) {
        self.push(|d| &mut d.embeds, delta);
    }

    pub fn content(&mut self, delta: ContentViewDelta) {
        self.push(|d| &mut d.contents, delta);
    }

    pub fn paragraph_children_changed(&mut self, paragraph: &BlockReference) {
        self.push(
            |d| &mut d.sub_paragraphs,
            SubParagraphViewDelta {
                paragraph: paragraph.clone(),
            },
        );
    }

    pub fn contents_inserted(&mut self, embed: &BlockReference, contents: &[ContentReference]) {
        if contents.is_empty() {
            return;
        }
        self.push(
            |d| &mut d.sub_embeds,
            SubEmbedViewDelta::ContentsInserted {
                embed: embed.clone(),
                contents: contents.to_vec(),
            },
        );
    }

    pub fn contents_removed(&mut self, embed: &BlockReference, contents: &[ContentReference]) {
        if contents.is_empty() {
            return;
        }
        self.push(
            |d| &mut d.sub_embeds,
            SubEmbedViewDelta::ContentsRemoved {
                embed: embed.clone(),
                contents: contents.to_vec(),
            },
        );
    }

    pub fn contents_moved(
        &mut self,
        from_embed: &BlockReference,
        to_embed: &BlockReference,
        contents: &[ContentReference],
    ) {
        self.push(
            |d| &mut d.sub_embeds,
            SubEmbedViewDelta::ContentsMoved {
                from_embed: from_embed.clone(),
                to_embed: to_embed.clone(),
                contents: contents.to_vec(),
            },
        );
    }

    pub fn blocks_inserted(&mut self, content: &ContentReference, blocks: &[BlockReference]) {
        if blocks.is_empty() {
            return;
        }
        self.push(
            |d| &mut d.sub_contents,
            SubContentViewDelta::BlocksInserted {
                content: content.clone(),
                blocks: blocks.to_vec(),
            },
        );
    }

    pub fn blocks_removed(&mut self, content: &ContentReference, blocks: &[BlockReference]) {
        if blocks.is_empty() {
            return;
        }
        self.push(
            |d| &mut d.sub_contents,
            SubContentViewDelta::BlocksRemoved {
                content: content.clone(),
                blocks: blocks.to_vec(),
            },
        );
    }

    pub fn blocks_moved(
        &mut self,
        from_content: &ContentReference,
        to_content: &ContentReference,
        blocks: &[BlockReference],
    ) {
        self.push(
            |d| &mut d.sub_contents,
            SubContentViewDelta::BlocksMoved {
                from_content: from_content.clone(),
                to_content: to_content.clone(),
                blocks: blocks.to_vec(),
            },
        );
    }

    pub fn document_config_changed(&mut self) {
        self.push(|d| &mut d.document, DocumentViewDelta::ConfigChanged);
    }

    pub fn is_empty(&self) -> bool {
        self.delta.is_empty()
    }

    /// Take the accumulated records, leaving the control empty. Indices keep
    /// increasing across takes.
    pub fn take(&mut self) -> ViewDelta {
        std::mem::take(&mut self.delta)
    }
}
