use serde::{Deserialize, Serialize};

/// Node metadata. Every node kind carries one of these; the engine only ever
/// compares and clones them, so the schema is left to the host.
pub type NodeConfig = serde_json::Value;

/// Generate a fresh node id for callers building fragments and mutations.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Opaque handle to a block (paragraph or embed).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockReference {
    pub block_id: String,
}

impl BlockReference {
    pub fn new(block_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
        }
    }
}

/// Opaque handle to a content (an ordered list of blocks).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentReference {
    pub content_id: String,
}

impl ContentReference {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
        }
    }
}

/// Inline run of text. Never empty once it is part of a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub config: NodeConfig,
    pub text: String,
}

impl Text {
    pub fn new(config: NodeConfig, text: impl Into<String>) -> Self {
        Self {
            config,
            text: text.into(),
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Atomic inline placeholder of length 1 (mentions, inline images, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Void {
    pub id: String,
    pub config: NodeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    Text(Text),
    Void(Void),
}

impl Inline {
    pub fn text(config: NodeConfig, text: impl Into<String>) -> Self {
        Inline::Text(Text::new(config, text))
    }

    pub fn void(id: impl Into<String>, config: NodeConfig) -> Self {
        Inline::Void(Void {
            id: id.into(),
            config,
        })
    }

    pub fn len(&self) -> usize {
        match self {
            Inline::Text(text) => text.len(),
            Inline::Void(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &NodeConfig {
        match self {
            Inline::Text(text) => &text.config,
            Inline::Void(void) => &void.config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: String,
    pub config: NodeConfig,
    pub children: Vec<Inline>,
}

impl Paragraph {
    pub fn new(id: impl Into<String>, config: NodeConfig, children: Vec<Inline>) -> Self {
        let mut paragraph = Self {
            id: id.into(),
            config,
            children,
        };
        crate::model::paragraph::normalize_inlines(&mut paragraph.children);
        paragraph
    }

    /// Sum of inline lengths.
    pub fn len(&self) -> usize {
        crate::model::paragraph::inlines_length(&self.children)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenated text, with voids rendered as U+FFFC.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .map(|inline| match inline {
                Inline::Text(text) => text.text.clone(),
                Inline::Void(_) => '\u{FFFC}'.to_string(),
            })
            .collect()
    }

    pub fn reference(&self) -> BlockReference {
        BlockReference::new(self.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub id: String,
    pub config: NodeConfig,
    pub content_references: Vec<ContentReference>,
}

impl Embed {
    pub fn reference(&self) -> BlockReference {
        BlockReference::new(self.id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Paragraph(Paragraph),
    Embed(Embed),
}

impl Block {
    pub fn id(&self) -> &str {
        match self {
            Block::Paragraph(paragraph) => &paragraph.id,
            Block::Embed(embed) => &embed.id,
        }
    }

    pub fn reference(&self) -> BlockReference {
        BlockReference::new(self.id())
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    pub fn is_embed(&self) -> bool {
        matches!(self, Block::Embed(_))
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(paragraph) => Some(paragraph),
            Block::Embed(_) => None,
        }
    }

    pub fn as_embed(&self) -> Option<&Embed> {
        match self {
            Block::Embed(embed) => Some(embed),
            Block::Paragraph(_) => None,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        match self {
            Block::Paragraph(paragraph) => &paragraph.config,
            Block::Embed(embed) => &embed.config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub config: NodeConfig,
    pub block_references: Vec<BlockReference>,
}

impl Content {
    pub fn reference(&self) -> ContentReference {
        ContentReference::new(self.id.clone())
    }
}
