//! Detached snapshots of block runs and content runs.
//!
//! Removal produces a fragment, insertion consumes one; the two together are
//! what makes block and content removal invertible.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::model::document::{BlockStoreEntry, ContentStoreEntry};
use crate::model::paragraph::normalize_inlines;
use crate::model::{
    Block, BlockReference, Content, ContentReference, Document, Embed, NodeConfig, Paragraph,
};
use crate::view_delta::{NodeViewDelta, ViewDeltaControl};

/// A run of blocks, including everything nested inside embeds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentFragment {
    pub blocks: Vec<BlockFragment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockFragment {
    Paragraph(Paragraph),
    Embed(EmbedFragment),
}

impl BlockFragment {
    pub fn id(&self) -> &str {
        match self {
            BlockFragment::Paragraph(paragraph) => &paragraph.id,
            BlockFragment::Embed(embed) => &embed.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFragment {
    pub id: String,
    pub config: NodeConfig,
    pub contents: ContentListFragment,
}

/// A run of contents, each with its blocks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentListFragment {
    pub contents: Vec<ContentListFragmentContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentListFragmentContent {
    pub id: String,
    pub config: NodeConfig,
    pub fragment: ContentFragment,
}

impl ContentFragment {
    pub fn new(blocks: Vec<BlockFragment>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl ContentListFragment {
    pub fn new(contents: Vec<ContentListFragmentContent>) -> Self {
        Self { contents }
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl Document {
    /// Build a document whose root content holds `fragment`.
    pub fn from_fragment(
        id: impl Into<String>,
        config: NodeConfig,
        root_content_id: impl Into<String>,
        root_content_config: NodeConfig,
        fragment: &ContentFragment,
    ) -> EngineResult<Self> {
        let mut document = Document::new(id, config, root_content_id, root_content_config);
        let root = document.root_content_reference().clone();
        document.insert_content_fragment(&root, 0, fragment, &mut ViewDeltaControl::discarding())?;
        Ok(document)
    }

    fn check_content_fragment_ids(&self, fragment: &ContentFragment, seen: &mut HashSet<String>) -> EngineResult<()> {
        for block in &fragment.blocks {
            let id = block.id();
            if self.block_store.contains_key(id) || !seen.insert(format!("b:{id}")) {
                return Err(EngineError::BlockAlreadyInDocument(id.to_string()));
            }
            if let BlockFragment::Embed(embed) = block {
                self.check_content_list_fragment_ids(&embed.contents, seen)?;
            }
        }
        Ok(())
    }

    fn check_content_list_fragment_ids(
        &self,
        fragment: &ContentListFragment,
        seen: &mut HashSet<String>,
    ) -> EngineResult<()> {
        for content in &fragment.contents {
            if self.content_store.contains_key(&content.id) || !seen.insert(format!("c:{}", content.id)) {
                return Err(EngineError::ContentAlreadyInDocument(content.id.clone()));
            }
            self.check_content_fragment_ids(&content.fragment, seen)?;
        }
        Ok(())
    }

    fn register_block_fragment(
        &mut self,
        fragment: &BlockFragment,
        content_reference: &ContentReference,
        view_delta: &mut ViewDeltaControl,
    ) -> BlockReference {
        match fragment {
            BlockFragment::Paragraph(paragraph) => {
                let mut paragraph = paragraph.clone();
                normalize_inlines(&mut paragraph.children);
                let reference = paragraph.reference();
                self.block_store.insert(
                    paragraph.id.clone(),
                    BlockStoreEntry {
                        block: Block::Paragraph(paragraph),
                        content_reference: content_reference.clone(),
                    },
                );
                view_delta.paragraph(NodeViewDelta::Created(reference.clone()));
                reference
            }
            BlockFragment::Embed(embed) => {
                let reference = BlockReference::new(embed.id.clone());
                self.block_store.insert(
                    embed.id.clone(),
                    BlockStoreEntry {
                        block: Block::Embed(Embed {
                            id: embed.id.clone(),
                            config: embed.config.clone(),
                            content_references: Vec::new(),
                        }),
                        content_reference: content_reference.clone(),
                    },
                );
                view_delta.embed(NodeViewDelta::Created(reference.clone()));
                let contents = self.register_content_list_fragment(&embed.contents, &reference, view_delta);
                if let Some(BlockStoreEntry {
                    block: Block::Embed(registered),
                    ..
                }) = self.block_store.get_mut(&embed.id)
                {
                    registered.content_references = contents;
                }
                reference
            }
        }
    }

    fn register_content_list_fragment(
        &mut self,
        fragment: &ContentListFragment,
        embed_reference: &BlockReference,
        view_delta: &mut ViewDeltaControl,
    ) -> Vec<ContentReference> {
        let mut references = Vec::with_capacity(fragment.contents.len());
        for content in &fragment.contents {
            let reference = ContentReference::new(content.id.clone());
            let blocks: Vec<BlockReference> = content
                .fragment
                .blocks
                .iter()
                .map(|block| self.register_block_fragment(block, &reference, view_delta))
                .collect();
            self.content_store.insert(
                content.id.clone(),
                ContentStoreEntry {
                    content: Content {
                        id: content.id.clone(),
                        config: content.config.clone(),
                        block_references: blocks,
                    },
                    embed_reference: Some(embed_reference.clone()),
                },
            );
            view_delta.content(NodeViewDelta::Created(reference.clone()));
            references.push(reference);
        }
        references
    }

    /// Register `fragment` and splice its blocks into a content at `index`.
    pub(crate) fn insert_content_fragment(
        &mut self,
        content_reference: &ContentReference,
        index: usize,
        fragment: &ContentFragment,
        view_delta: &mut ViewDeltaControl,
    ) -> EngineResult<Vec<BlockReference>> {
        let length = self.number_of_blocks_in_content(content_reference)?;
        if index > length {
            return Err(EngineError::InvalidBounds(format!(
                "insert at {index} into content with {length} blocks"
            )));
        }
        self.check_content_fragment_ids(fragment, &mut HashSet::new())?;
        let inserted: Vec<BlockReference> = fragment
            .blocks
            .iter()
            .map(|block| self.register_block_fragment(block, content_reference, view_delta))
            .collect();
        let content = self.content_mut(content_reference)?;
        content
            .block_references
            .splice(index..index, inserted.iter().cloned());
        view_delta.blocks_inserted(content_reference, &inserted);
        Ok(inserted)
    }

    /// Register `fragment` and splice its contents into an embed at `index`.
    pub(crate) fn insert_content_list_fragment(
        &mut self,
        embed_reference: &BlockReference,
        index: usize,
        fragment: &ContentListFragment,
        view_delta: &mut ViewDeltaControl,
    ) -> EngineResult<Vec<ContentReference>> {
        let length = self.embed(embed_reference)?.content_references.len();
        if index > length {
            return Err(EngineError::InvalidBounds(format!(
                "insert at {index} into embed with {length} contents"
            )));
        }
        self.check_content_list_fragment_ids(fragment, &mut HashSet::new())?;
        let inserted = self.register_content_list_fragment(fragment, embed_reference, view_delta);
        let embed = self.embed_mut(embed_reference)?;
        embed
            .content_references
            .splice(index..index, inserted.iter().cloned());
        view_delta.contents_inserted(embed_reference, &inserted);
        Ok(inserted)
    }

    fn unregister_block(&mut self, block_reference: &BlockReference, view_delta: &mut ViewDeltaControl) -> EngineResult<BlockFragment> {
        let entry = self
            .block_store
            .remove(&block_reference.block_id)
            .ok_or_else(|| EngineError::BlockNotInBlockStore(block_reference.block_id.clone()))?;
        match entry.block {
            Block::Paragraph(paragraph) => {
                view_delta.paragraph(NodeViewDelta::Removed(block_reference.clone()));
                Ok(BlockFragment::Paragraph(paragraph))
            }
            Block::Embed(embed) => {
                let contents = self.unregister_contents(&embed.content_references, view_delta)?;
                view_delta.embed(NodeViewDelta::Removed(block_reference.clone()));
                Ok(BlockFragment::Embed(EmbedFragment {
                    id: embed.id,
                    config: embed.config,
                    contents,
                }))
            }
        }
    }

    fn unregister_contents(
        &mut self,
        content_references: &[ContentReference],
        view_delta: &mut ViewDeltaControl,
    ) -> EngineResult<ContentListFragment> {
        let mut contents = Vec::with_capacity(content_references.len());
        for content_reference in content_references {
            let entry = self.content_store.remove(&content_reference.content_id).ok_or_else(|| {
                EngineError::ContentNotInContentStore(content_reference.content_id.clone())
            })?;
            let mut blocks = Vec::with_capacity(entry.content.block_references.len());
            for block_reference in &entry.content.block_references {
                blocks.push(self.unregister_block(block_reference, view_delta)?);
            }
            view_delta.content(NodeViewDelta::Removed(content_reference.clone()));
            contents.push(ContentListFragmentContent {
                id: entry.content.id,
                config: entry.content.config,
                fragment: ContentFragment { blocks },
            });
        }
        Ok(ContentListFragment { contents })
    }

    /// Unregister the blocks `start..=end` of a content, returning them as a fragment.
    pub(crate) fn remove_block_run(
        &mut self,
        content_reference: &ContentReference,
        start: usize,
        end: usize,
        view_delta: &mut ViewDeltaControl,
    ) -> EngineResult<ContentFragment> {
        let removed: Vec<BlockReference> = self
            .content_mut(content_reference)?
            .block_references
            .drain(start..=end)
            .collect();
        view_delta.blocks_removed(content_reference, &removed);
        let mut blocks = Vec::with_capacity(removed.len());
        for block_reference in &removed {
            blocks.push(self.unregister_block(block_reference, view_delta)?);
        }
        Ok(ContentFragment { blocks })
    }

    /// Unregister the contents `start..=end` of an embed, returning them as a fragment.
    pub(crate) fn remove_content_run(
        &mut self,
        embed_reference: &BlockReference,
        start: usize,
        end: usize,
        view_delta: &mut ViewDeltaControl,
    ) -> EngineResult<ContentListFragment> {
        let removed: Vec<ContentReference> = self
            .embed_mut(embed_reference)?
            .content_references
            .drain(start..=end)
            .collect();
        view_delta.contents_removed(embed_reference, &removed);
        self.unregister_contents(&removed, view_delta)
    }

    /// Snapshot blocks without unregistering them.
    pub fn make_content_fragment(&self, block_references: &[BlockReference]) -> EngineResult<ContentFragment> {
        let mut blocks = Vec::with_capacity(block_references.len());
        for block_reference in block_references {
            blocks.push(match self.block(block_reference)? {
                Block::Paragraph(paragraph) => BlockFragment::Paragraph(paragraph.clone()),
                Block::Embed(embed) => BlockFragment::Embed(EmbedFragment {
                    id: embed.id.clone(),
                    config: embed.config.clone(),
                    contents: self.make_content_list_fragment(&embed.content_references)?,
                }),
            });
        }
        Ok(ContentFragment { blocks })
    }

    /// Snapshot contents without unregistering them.
    pub fn make_content_list_fragment(
        &self,
        content_references: &[ContentReference],
    ) -> EngineResult<ContentListFragment> {
        let mut contents = Vec::with_capacity(content_references.len());
        for content_reference in content_references {
            let content = self.content(content_reference)?;
            contents.push(ContentListFragmentContent {
                id: content.id.clone(),
                config: content.config.clone(),
                fragment: self.make_content_fragment(&content.block_references)?,
            });
        }
        Ok(ContentListFragment { contents })
    }
}
