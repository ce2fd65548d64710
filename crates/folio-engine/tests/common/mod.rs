//! Document builders shared by the integration tests.
#![allow(dead_code)]

use folio_engine::{
    BlockFragment, BlockReference, ContentFragment, ContentListFragment, ContentListFragmentContent, ContentReference,
    Document, EmbedFragment, Inline, Paragraph, Point, Range, Selection, SelectionRange, SelectionRangeIntention,
    format_document,
};
use serde_json::json;

pub fn paragraph(id: &str, text: &str) -> BlockFragment {
    BlockFragment::Paragraph(Paragraph::new(id, json!({}), vec![Inline::text(json!({}), text)]))
}

pub fn embed(id: &str, contents: Vec<(&str, Vec<BlockFragment>)>) -> BlockFragment {
    BlockFragment::Embed(EmbedFragment {
        id: id.to_string(),
        config: json!({}),
        contents: content_list(contents),
    })
}

pub fn content_list(contents: Vec<(&str, Vec<BlockFragment>)>) -> ContentListFragment {
    ContentListFragment::new(
        contents
            .into_iter()
            .map(|(id, blocks)| ContentListFragmentContent {
                id: id.to_string(),
                config: json!({}),
                fragment: ContentFragment::new(blocks),
            })
            .collect(),
    )
}

pub fn document(blocks: Vec<BlockFragment>) -> Document {
    Document::from_fragment("doc", json!({}), "root", json!({}), &ContentFragment::new(blocks)).unwrap()
}

/// root: p1 "abc", p2 "def", table [cell1: c1p "xy"] [cell2: c2p "zw"], p3 "ghi"
pub fn sample_document() -> Document {
    document(vec![
        paragraph("p1", "abc"),
        paragraph("p2", "def"),
        embed(
            "table",
            vec![
                ("cell1", vec![paragraph("c1p", "xy")]),
                ("cell2", vec![paragraph("c2p", "zw")]),
            ],
        ),
        paragraph("p3", "ghi"),
    ])
}

pub fn block(id: &str) -> BlockReference {
    BlockReference::new(id)
}

pub fn content(id: &str) -> ContentReference {
    ContentReference::new(id)
}

pub fn p(id: &str, offset: usize) -> Point {
    Point::paragraph(block(id), offset)
}

pub fn b(id: &str) -> Point {
    Point::block(block(id))
}

pub fn text_of(document: &Document, id: &str) -> String {
    document.paragraph(&block(id)).unwrap().text()
}

pub fn outline(document: &Document) -> String {
    format_document(document).unwrap()
}

pub fn text_selection_range(id: &str, content_id: &str, start: Point, end: Point) -> SelectionRange {
    let range = Range::new(content(content_id), start, end, format!("{id}-range")).unwrap();
    SelectionRange::from_range(range, SelectionRangeIntention::Text, id)
}

pub fn caret(content_id: &str, point: Point) -> Selection {
    Selection::collapsed_in_text(content(content_id), point, "caret-range", "caret").unwrap()
}
