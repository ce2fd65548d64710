use std::collections::HashMap;

use crate::errors::{EngineError, EngineResult};
use crate::model::{
    Block, BlockReference, Content, ContentReference, Embed, NodeConfig, Paragraph,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockStoreEntry {
    pub block: Block,
    pub content_reference: ContentReference,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ContentStoreEntry {
    pub content: Content,
    /// None only for the root content.
    pub embed_reference: Option<BlockReference>,
}

/// Root of the tree: owns every block and content through two id-keyed stores.
///
/// Nodes reference each other only by id, so a block or content is reachable
/// exactly while it is registered in one of the stores.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub config: NodeConfig,
    pub(crate) root_content_reference: ContentReference,
    pub(crate) block_store: HashMap<String, BlockStoreEntry>,
    pub(crate) content_store: HashMap<String, ContentStoreEntry>,
}

impl Document {
    /// Create a document whose root content is empty.
    pub fn new(
        id: impl Into<String>,
        config: NodeConfig,
        root_content_id: impl Into<String>,
        root_content_config: NodeConfig,
    ) -> Self {
        let root_content = Content {
            id: root_content_id.into(),
            config: root_content_config,
            block_references: Vec::new(),
        };
        let root_content_reference = root_content.reference();
        let mut content_store = HashMap::new();
        content_store.insert(
            root_content.id.clone(),
            ContentStoreEntry {
                content: root_content,
                embed_reference: None,
            },
        );
        Self {
            id: id.into(),
            config,
            root_content_reference,
            block_store: HashMap::new(),
            content_store,
        }
    }

    pub fn root_content_reference(&self) -> &ContentReference {
        &self.root_content_reference
    }

    pub fn has_block(&self, block_reference: &BlockReference) -> bool {
        self.block_store.contains_key(&block_reference.block_id)
    }

    pub fn has_content(&self, content_reference: &ContentReference) -> bool {
        self.content_store.contains_key(&content_reference.content_id)
    }

    pub fn block_count(&self) -> usize {
        self.block_store.len()
    }

    pub fn content_count(&self) -> usize {
        self.content_store.len()
    }

    fn block_entry(&self, block_reference: &BlockReference) -> EngineResult<&BlockStoreEntry> {
        self.block_store
            .get(&block_reference.block_id)
            .ok_or_else(|| EngineError::BlockNotInBlockStore(block_reference.block_id.clone()))
    }

    fn content_entry(&self, content_reference: &ContentReference) -> EngineResult<&ContentStoreEntry> {
        self.content_store
            .get(&content_reference.content_id)
            .ok_or_else(|| EngineError::ContentNotInContentStore(content_reference.content_id.clone()))
    }

    pub fn block(&self, block_reference: &BlockReference) -> EngineResult<&Block> {
        Ok(&self.block_entry(block_reference)?.block)
    }

    pub(crate) fn block_mut(&mut self, block_reference: &BlockReference) -> EngineResult<&mut Block> {
        self.block_store
            .get_mut(&block_reference.block_id)
            .map(|entry| &mut entry.block)
            .ok_or_else(|| EngineError::BlockNotInBlockStore(block_reference.block_id.clone()))
    }

    pub fn paragraph(&self, block_reference: &BlockReference) -> EngineResult<&Paragraph> {
        self.block(block_reference)?
            .as_paragraph()
            .ok_or_else(|| EngineError::NodeNotOfType {
                id: block_reference.block_id.clone(),
                expected: "Paragraph",
            })
    }

    pub(crate) fn paragraph_mut(&mut self, block_reference: &BlockReference) -> EngineResult<&mut Paragraph> {
        match self.block_mut(block_reference)? {
            Block::Paragraph(paragraph) => Ok(paragraph),
            Block::Embed(_) => Err(EngineError::NodeNotOfType {
                id: block_reference.block_id.clone(),
                expected: "Paragraph",
            }),
        }
    }

    pub fn embed(&self, block_reference: &BlockReference) -> EngineResult<&Embed> {
        self.block(block_reference)?
            .as_embed()
            .ok_or_else(|| EngineError::NodeNotOfType {
                id: block_reference.block_id.clone(),
                expected: "Embed",
            })
    }

    pub(crate) fn embed_mut(&mut self, block_reference: &BlockReference) -> EngineResult<&mut Embed> {
        match self.block_mut(block_reference)? {
            Block::Embed(embed) => Ok(embed),
            Block::Paragraph(_) => Err(EngineError::NodeNotOfType {
                id: block_reference.block_id.clone(),
                expected: "Embed",
            }),
        }
    }

    pub fn content(&self, content_reference: &ContentReference) -> EngineResult<&Content> {
        Ok(&self.content_entry(content_reference)?.content)
    }

    pub(crate) fn content_mut(&mut self, content_reference: &ContentReference) -> EngineResult<&mut Content> {
        self.content_store
            .get_mut(&content_reference.content_id)
            .map(|entry| &mut entry.content)
            .ok_or_else(|| EngineError::ContentNotInContentStore(content_reference.content_id.clone()))
    }

    /// The content a block lives in.
    pub fn content_reference_of_block(&self, block_reference: &BlockReference) -> EngineResult<&ContentReference> {
        Ok(&self.block_entry(block_reference)?.content_reference)
    }

    /// The embed owning a non-root content.
    pub fn embed_reference_of_content(&self, content_reference: &ContentReference) -> EngineResult<&BlockReference> {
        self.content_entry(content_reference)?
            .embed_reference
            .as_ref()
            .ok_or_else(|| {
                EngineError::ContentReferenceMissingEmbedReference(content_reference.content_id.clone())
            })
    }

    pub fn is_root_content(&self, content_reference: &ContentReference) -> bool {
        *content_reference == self.root_content_reference
    }

    pub fn index_of_block_in_content(
        &self,
        content_reference: &ContentReference,
        block_reference: &BlockReference,
    ) -> EngineResult<usize> {
        self.content(content_reference)?
            .block_references
            .iter()
            .position(|candidate| candidate == block_reference)
            .ok_or_else(|| EngineError::BlockNotInContent {
                block_id: block_reference.block_id.clone(),
                content_id: content_reference.content_id.clone(),
            })
    }

    /// Index of a block within the content it is registered in.
    pub fn index_of_block(&self, block_reference: &BlockReference) -> EngineResult<usize> {
        let content_reference = self.content_reference_of_block(block_reference)?;
        self.index_of_block_in_content(content_reference, block_reference)
    }

    pub fn index_of_content_in_embed(
        &self,
        embed_reference: &BlockReference,
        content_reference: &ContentReference,
    ) -> EngineResult<usize> {
        self.embed(embed_reference)?
            .content_references
            .iter()
            .position(|candidate| candidate == content_reference)
            .ok_or_else(|| EngineError::ContentNotInEmbed {
                content_id: content_reference.content_id.clone(),
                embed_id: embed_reference.block_id.clone(),
            })
    }

    pub fn index_of_content(&self, content_reference: &ContentReference) -> EngineResult<usize> {
        let embed_reference = self.embed_reference_of_content(content_reference)?;
        self.index_of_content_in_embed(embed_reference, content_reference)
    }

    pub fn number_of_blocks_in_content(&self, content_reference: &ContentReference) -> EngineResult<usize> {
        Ok(self.content(content_reference)?.block_references.len())
    }

    pub fn block_reference_at(
        &self,
        content_reference: &ContentReference,
        index: usize,
    ) -> EngineResult<&BlockReference> {
        let content = self.content(content_reference)?;
        content.block_references.get(index).ok_or_else(|| {
            EngineError::InvalidBounds(format!(
                "block index {index} in content {} with {} blocks",
                content.id,
                content.block_references.len()
            ))
        })
    }

    pub fn paragraph_length(&self, block_reference: &BlockReference) -> EngineResult<usize> {
        Ok(self.paragraph(block_reference)?.len())
    }

    /// Contents from `content_reference` (inclusive) up to the root.
    pub fn content_ancestors(&self, content_reference: &ContentReference) -> EngineResult<Vec<ContentReference>> {
        let mut ancestors = vec![content_reference.clone()];
        let mut current = content_reference.clone();
        while let Some(embed_reference) = self.content_entry(&current)?.embed_reference.clone() {
            current = self.content_reference_of_block(&embed_reference)?.clone();
            ancestors.push(current.clone());
        }
        Ok(ancestors)
    }

    /// Whether `content_reference` is nested (at any depth) inside `block_reference`.
    pub fn is_content_descendant_of_block(
        &self,
        content_reference: &ContentReference,
        block_reference: &BlockReference,
    ) -> EngineResult<bool> {
        let mut current = content_reference.clone();
        while let Some(embed_reference) = self.content_entry(&current)?.embed_reference.clone() {
            if embed_reference == *block_reference {
                return Ok(true);
            }
            current = self.content_reference_of_block(&embed_reference)?.clone();
        }
        Ok(false)
    }

    /// Ids of every content nested inside a block, depth first.
    pub fn descendant_content_ids_of_block(&self, block_reference: &BlockReference) -> EngineResult<Vec<String>> {
        let mut ids = Vec::new();
        self.collect_descendant_contents(block_reference, &mut ids)?;
        Ok(ids)
    }

    fn collect_descendant_contents(&self, block_reference: &BlockReference, ids: &mut Vec<String>) -> EngineResult<()> {
        if let Block::Embed(embed) = self.block(block_reference)? {
            for content_reference in &embed.content_references {
                self.collect_descendant_contents_of_content(content_reference, ids)?;
            }
        }
        Ok(())
    }

    pub(crate) fn collect_descendant_contents_of_content(
        &self,
        content_reference: &ContentReference,
        ids: &mut Vec<String>,
    ) -> EngineResult<()> {
        ids.push(content_reference.content_id.clone());
        for block_reference in &self.content(content_reference)?.block_references {
            self.collect_descendant_contents(block_reference, ids)?;
        }
        Ok(())
    }

    /// Resolve an inclusive run of sibling blocks, returning their content and
    /// index bounds.
    pub(crate) fn block_run(
        &self,
        start_block_reference: &BlockReference,
        end_block_reference: &BlockReference,
    ) -> EngineResult<(ContentReference, usize, usize)> {
        let content_reference = self.content_reference_of_block(start_block_reference)?.clone();
        let start = self.index_of_block_in_content(&content_reference, start_block_reference)?;
        let end = self.index_of_block_in_content(&content_reference, end_block_reference)?;
        if end < start {
            return Err(EngineError::MutationNodeEndBeforeStart { start, end });
        }
        Ok((content_reference, start, end))
    }

    /// Resolve an inclusive run of sibling contents, returning their embed and
    /// index bounds.
    pub(crate) fn content_run(
        &self,
        start_content_reference: &ContentReference,
        end_content_reference: &ContentReference,
    ) -> EngineResult<(BlockReference, usize, usize)> {
        let embed_reference = self.embed_reference_of_content(start_content_reference)?.clone();
        let start = self.index_of_content_in_embed(&embed_reference, start_content_reference)?;
        let end = self.index_of_content_in_embed(&embed_reference, end_content_reference)?;
        if end < start {
            return Err(EngineError::MutationNodeEndBeforeStart { start, end });
        }
        Ok((embed_reference, start, end))
    }
}
