//! Indented text dump of a document, one node per line.

use crate::errors::EngineResult;
use crate::model::{Block, ContentReference, Document, Inline, NodeConfig};

fn config_suffix(config: &NodeConfig) -> String {
    match config {
        NodeConfig::Null => String::new(),
        NodeConfig::Object(map) if map.is_empty() => String::new(),
        other => format!(" {other}"),
    }
}

fn format_inline(inline: &Inline) -> String {
    match inline {
        Inline::Text(text) => format!("{:?}{}", text.text, config_suffix(&text.config)),
        Inline::Void(void) => format!("<{}>{}", void.id, config_suffix(&void.config)),
    }
}

fn format_content(
    document: &Document,
    content_reference: &ContentReference,
    indent: usize,
    lines: &mut Vec<String>,
) -> EngineResult<()> {
    let content = document.content(content_reference)?;
    let prefix = "  ".repeat(indent);
    lines.push(format!("{prefix}Content {}{}", content.id, config_suffix(&content.config)));
    for block_reference in &content.block_references {
        match document.block(block_reference)? {
            Block::Paragraph(paragraph) => {
                let mut line = format!("{prefix}  Paragraph {}{}", paragraph.id, config_suffix(&paragraph.config));
                for child in &paragraph.children {
                    line.push(' ');
                    line.push_str(&format_inline(child));
                }
                lines.push(line);
            }
            Block::Embed(embed) => {
                lines.push(format!("{prefix}  Embed {}{}", embed.id, config_suffix(&embed.config)));
                for nested in &embed.content_references {
                    format_content(document, nested, indent + 2, lines)?;
                }
            }
        }
    }
    Ok(())
}

/// Render the whole tree for debugging and snapshot tests.
pub fn format_document(document: &Document) -> EngineResult<String> {
    let mut lines = vec![format!("Document {}{}", document.id, config_suffix(&document.config))];
    format_content(document, document.root_content_reference(), 1, &mut lines)?;
    Ok(lines.join("\n"))
}
