//! Document tree: nodes, id-keyed stores and detached fragments.

pub mod document;
pub mod format;
pub mod fragment;
pub mod nodes;
pub mod paragraph;

pub use document::Document;
pub use format::format_document;
pub use fragment::{
    BlockFragment, ContentFragment, ContentListFragment, ContentListFragmentContent, EmbedFragment,
};
pub use nodes::{
    Block, BlockReference, Content, ContentReference, Embed, Inline, NodeConfig, Paragraph, Text,
    Void, generate_id,
};
pub use paragraph::{inlines_length, normalize_inlines, slice_inlines, splice_inlines};
