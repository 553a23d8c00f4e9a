use crate::coordinator::util::char_prefix;
use crate::page::dom::{Document, NON_CONTENT_TAGS, NodeId};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::ops::Range;

pub const MARKER_TAG: &str = "mark";
pub const MARKER_CLASS: &str = "pagebrief-highlight";
/// Only this many leading characters of a fragment are matched.
pub const MAX_PATTERN_CHARS: usize = 50;

/// Tracks the one highlight generation a page may carry.
#[derive(Debug, Default)]
pub struct HighlightEngine {
    generation: u64,
    active: bool,
}

fn literal_pattern(fragment: &str) -> Option<Regex> {
    let prefix = char_prefix(fragment.trim(), MAX_PATTERN_CHARS);
    if prefix.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(prefix))
        .case_insensitive(true)
        .build()
        .ok()
}

fn marker_nodes(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.body(), &[])
        .into_iter()
        .filter(|id| doc.tag(*id) == Some(MARKER_TAG) && doc.has_class(*id, MARKER_CLASS))
        .collect()
}

impl HighlightEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Mark every occurrence of the fragment prefix in the page's text
    /// nodes. Any previous generation is reverted first. Returns the number
    /// of marks inserted.
    pub fn apply(&mut self, doc: &mut Document, fragment: &str) -> usize {
        self.revert(doc);

        let Some(pattern) = literal_pattern(fragment) else {
            return 0;
        };

        // Phase one: collect every match against the unmodified tree.
        let mut plan: Vec<(NodeId, Vec<Range<usize>>)> = Vec::new();
        for id in doc.descendants(doc.body(), &NON_CONTENT_TAGS) {
            let Some(text) = doc.text(id) else {
                continue;
            };
            let ranges: Vec<Range<usize>> = pattern.find_iter(text).map(|m| m.range()).collect();
            if !ranges.is_empty() {
                plan.push((id, ranges));
            }
        }

        // Phase two: rewrite the planned nodes.
        let mut marks = 0usize;
        for (id, ranges) in plan {
            let Some(text) = doc.text(id).map(str::to_string) else {
                continue;
            };
            let mut replacement = Vec::with_capacity(ranges.len() * 2 + 1);
            let mut cursor = 0usize;
            for range in ranges {
                if range.start > cursor {
                    replacement.push(doc.create_text(&text[cursor..range.start]));
                }
                let mut attrs = BTreeMap::new();
                attrs.insert("class".to_string(), MARKER_CLASS.to_string());
                let mark = doc.create_element(MARKER_TAG, attrs);
                let inner = doc.create_text(&text[range.clone()]);
                doc.append_child(mark, inner);
                replacement.push(mark);
                cursor = range.end;
                marks += 1;
            }
            if cursor < text.len() {
                replacement.push(doc.create_text(&text[cursor..]));
            }
            doc.replace_with(id, &replacement);
        }

        if marks > 0 {
            self.generation += 1;
            self.active = true;
        }
        marks
    }

    /// Replace every marker with its plain text. A page without marks is
    /// left untouched. Returns the number of markers removed.
    pub fn revert(&mut self, doc: &mut Document) -> usize {
        let markers = marker_nodes(doc);
        let mut parents = BTreeSet::new();
        for id in &markers {
            let text = doc.text_content(*id);
            let plain = doc.create_text(&text);
            if let Some(parent) = doc.parent(*id) {
                parents.insert(parent);
            }
            doc.replace_with(*id, &[plain]);
        }
        for parent in parents {
            doc.normalize(parent);
        }
        self.active = false;
        markers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::dom::NodeSpec;

    fn page() -> Document {
        Document::from_spec(&NodeSpec::element(
            "body",
            vec![
                NodeSpec::element(
                    "p",
                    vec![NodeSpec::text("Prices rose (sharply) in 2024. Prices rose again.")],
                ),
                NodeSpec::element(
                    "script",
                    vec![NodeSpec::text("const s = 'Prices rose (sharply)';")],
                ),
                NodeSpec::element(
                    "div",
                    vec![
                        NodeSpec::text("Elsewhere, "),
                        NodeSpec::element("b", vec![NodeSpec::text("prices rose (SHARPLY)")]),
                        NodeSpec::text(" too."),
                    ],
                ),
            ],
        ))
    }

    #[test]
    fn apply_then_revert_restores_text_exactly() {
        let mut doc = page();
        let before = doc.text_content(doc.body());
        let mut engine = HighlightEngine::new();

        let marks = engine.apply(&mut doc, "Prices rose (sharply)");
        assert_eq!(marks, 2);
        assert!(engine.is_active());
        assert_eq!(doc.text_content(doc.body()), before);

        assert_eq!(engine.revert(&mut doc), 2);
        assert!(!engine.is_active());
        assert_eq!(doc.text_content(doc.body()), before);
        assert!(marker_nodes(&doc).is_empty());
    }

    #[test]
    fn special_characters_are_matched_literally() {
        let mut doc = page();
        let mut engine = HighlightEngine::new();
        assert_eq!(engine.apply(&mut doc, "(sharply"), 2);
        assert_eq!(engine.apply(&mut doc, "rose.*again"), 0);
    }

    #[test]
    fn script_text_is_never_marked() {
        let mut doc = page();
        let mut engine = HighlightEngine::new();
        engine.apply(&mut doc, "const s");
        assert!(marker_nodes(&doc).is_empty());
    }

    #[test]
    fn second_apply_leaves_only_its_own_marks() {
        let mut doc = page();
        let mut engine = HighlightEngine::new();
        engine.apply(&mut doc, "Prices rose");
        engine.apply(&mut doc, "Elsewhere");

        let marks = marker_nodes(&doc);
        assert_eq!(marks.len(), 1);
        assert_eq!(doc.text_content(marks[0]), "Elsewhere");
        for id in marks {
            assert!(doc.children(id).iter().all(|c| doc.tag(*c).is_none()));
        }
        assert_eq!(engine.generation(), 2);
    }

    #[test]
    fn pattern_is_capped_to_prefix() {
        let sentence = "Memory safety without garbage collection is the headline feature of the language.";
        let mut doc = Document::from_spec(&NodeSpec::element(
            "p",
            vec![NodeSpec::text(sentence)],
        ));
        let mut engine = HighlightEngine::new();
        let fragment = format!("{} and then some words that never appear", &sentence[..50]);
        assert_eq!(engine.apply(&mut doc, &fragment), 1);
        let marks = marker_nodes(&doc);
        assert_eq!(doc.text_content(marks[0]), &sentence[..50]);
    }

    #[test]
    fn revert_without_marks_is_a_no_op() {
        let mut doc = page();
        let before = doc.to_spec();
        let mut engine = HighlightEngine::new();
        assert_eq!(engine.revert(&mut doc), 0);
        assert_eq!(doc.to_spec(), before);
    }
}
