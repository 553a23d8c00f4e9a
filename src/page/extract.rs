use crate::coordinator::util::truncate_chars;
use crate::page::dom::{Document, Selector};
use serde::{Deserialize, Serialize};

/// A content region must carry more readable text than this to be chosen.
pub const MIN_CONTENT_CHARS: usize = 100;
pub const MAX_CONTENT_CHARS: usize = 5000;
pub const TRUNCATION_MARKER: &str = "...";

/// Probed in order; the first selector with a qualifying element wins even
/// when a later one would yield more text.
pub const CONTENT_SELECTORS: [Selector; 9] = [
    Selector::Tag("article"),
    Selector::Attr("role", "main"),
    Selector::Tag("main"),
    Selector::Class("content"),
    Selector::Class("post-content"),
    Selector::Class("entry-content"),
    Selector::Class("article-body"),
    Selector::Class("main-content"),
    Selector::Id("content"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Selection,
    Content,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub text: String,
    pub length: usize,
    pub source_kind: SourceKind,
}

impl ExtractionResult {
    fn new(text: String, source_kind: SourceKind) -> Self {
        Self {
            length: text.chars().count(),
            text,
            source_kind,
        }
    }

    pub fn none() -> Self {
        Self::new(String::new(), SourceKind::None)
    }

    pub fn is_empty(&self) -> bool {
        self.source_kind == SourceKind::None || self.text.is_empty()
    }
}

/// The active selection exactly as selected, if it has any non-whitespace
/// text.
pub fn selected_text(selection: &str) -> ExtractionResult {
    if selection.trim().is_empty() {
        return ExtractionResult::none();
    }
    ExtractionResult::new(selection.to_string(), SourceKind::Selection)
}

/// Readable text of the first content region in selector-chain order.
pub fn main_content(doc: &Document) -> ExtractionResult {
    for selector in CONTENT_SELECTORS {
        for id in doc.query_all(&selector) {
            let text = doc.readable_text(id);
            if text.chars().count() > MIN_CONTENT_CHARS {
                let text = truncate_chars(&text, MAX_CONTENT_CHARS, TRUNCATION_MARKER);
                return ExtractionResult::new(text, SourceKind::Content);
            }
        }
    }
    ExtractionResult::none()
}

/// Selection first, then the content chain, then nothing.
pub fn extract(doc: &Document, selection: &str) -> ExtractionResult {
    let selected = selected_text(selection);
    if !selected.is_empty() {
        return selected;
    }
    main_content(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::dom::NodeSpec;

    fn paragraph(words: &str, repeat: usize) -> NodeSpec {
        NodeSpec::element("p", vec![NodeSpec::text(words.repeat(repeat))])
    }

    #[test]
    fn selection_wins_regardless_of_page_structure() {
        let doc = Document::from_spec(&NodeSpec::element(
            "article",
            vec![paragraph("article body text ", 20)],
        ));
        let fragment = "The quick brown fox jumps over the lazy dog, twice and then once more.";
        let got = extract(&doc, fragment);
        assert_eq!(got.source_kind, SourceKind::Selection);
        assert_eq!(got.text, fragment);
        assert_eq!(got.length, fragment.chars().count());
    }

    #[test]
    fn selection_is_returned_verbatim_with_surrounding_whitespace() {
        let selection = "  The quick brown fox jumps over the lazy dog, once more.\n";
        let got = extract(&Document::new(), selection);
        assert_eq!(got.source_kind, SourceKind::Selection);
        assert_eq!(got.text, selection);

        let blank = extract(&Document::new(), " \n\t ");
        assert_eq!(blank.source_kind, SourceKind::None);
    }

    #[test]
    fn generic_main_beats_longer_content_class() {
        let doc = Document::from_spec(&NodeSpec::element(
            "body",
            vec![
                NodeSpec::element("div", vec![paragraph("longer content block ", 40)])
                    .with_attr("class", "content"),
                NodeSpec::element("main", vec![paragraph("main region words ", 8)]),
            ],
        ));
        let got = extract(&doc, "");
        assert_eq!(got.source_kind, SourceKind::Content);
        assert!(got.text.starts_with("main region words"));
    }

    #[test]
    fn short_regions_are_skipped_for_the_next_selector() {
        let doc = Document::from_spec(&NodeSpec::element(
            "body",
            vec![
                NodeSpec::element("article", vec![NodeSpec::text("teaser")]),
                NodeSpec::element("div", vec![paragraph("explicit role main ", 10)])
                    .with_attr("role", "main"),
            ],
        ));
        let got = main_content(&doc);
        assert!(got.text.starts_with("explicit role main"));
    }

    #[test]
    fn long_content_is_truncated_with_marker() {
        let doc = Document::from_spec(&NodeSpec::element(
            "article",
            vec![paragraph("abcdefghij", 700)],
        ));
        let got = main_content(&doc);
        assert!(got.text.ends_with(TRUNCATION_MARKER));
        assert_eq!(got.length, MAX_CONTENT_CHARS + TRUNCATION_MARKER.len());
    }

    #[test]
    fn empty_page_yields_none() {
        let doc = Document::from_spec(&NodeSpec::element("div", vec![NodeSpec::text("hi")]));
        assert_eq!(extract(&doc, "   "), ExtractionResult::none());
    }
}
