use crate::error::{CareersError, Result};
use kuchiki::traits::*;
use kuchiki::NodeRef;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

// A sentence ends at a period followed by whitespace; the period stays with it.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s+").expect("valid sentence boundary pattern"));

/// Facts derived from a job description body.
///
/// Built once by [`ParsedDescription::parse`] and never changed afterwards, so the
/// same markup always produces an equal value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedDescription {
    third_paragraph_first_sentence: Option<String>,
    second_bullet_by_header: HashMap<String, String>,
}

impl ParsedDescription {
    /// Decodes the HTML-escaped description, walks the resulting tree and
    /// extracts the third-paragraph sentence and the header-keyed bullets.
    ///
    /// The parser recovers from malformed tags the way a browser does. The only
    /// hard failure is a tree without a body to walk; in that case nothing is
    /// returned.
    pub fn parse(raw_markup: &str) -> Result<Self> {
        let decoded = html_escape::decode_html_entities(raw_markup);
        let document = kuchiki::parse_html().one(decoded.as_ref());

        let body = document
            .select_first("body")
            .map_err(|_| CareersError::Parse("document has no body element".to_string()))?;
        let root = body.as_node();

        remove_empty_paragraphs(root);

        Ok(Self {
            third_paragraph_first_sentence: third_paragraph_first_sentence(root),
            second_bullet_by_header: second_bullets_by_header(root),
        })
    }

    pub fn third_paragraph_first_sentence(&self) -> Option<&str> {
        self.third_paragraph_first_sentence.as_deref()
    }

    /// Looks up the second bullet of the list introduced by `header`, ignoring case.
    pub fn second_bullet_for(&self, header: &str) -> Option<&str> {
        self.second_bullet_by_header
            .get(&header.to_lowercase())
            .map(String::as_str)
    }

    /// Lower-cased headers that have a recorded bullet, in no particular order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.second_bullet_by_header.keys().map(String::as_str)
    }
}

// Elements that start a new line when rendered.
const BLOCK_TAGS: [&str; 24] = [
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "li", "ol", "p", "pre", "section", "td", "tr", "ul",
];

/// Text as it reads on screen: line breaks and block boundaries become a single
/// space and whitespace runs collapse.
fn normalized_text(node: &NodeRef) -> String {
    let mut text = String::new();
    push_rendered_text(node, &mut text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_rendered_text(node: &NodeRef, out: &mut String) {
    if let Some(text) = node.as_text() {
        out.push_str(&text.borrow());
        return;
    }
    let breaks = node.as_element().map_or(false, |element| {
        let name = &*element.name.local;
        name == "br" || BLOCK_TAGS.contains(&name)
    });
    if breaks {
        out.push(' ');
    }
    for child in node.children() {
        push_rendered_text(&child, out);
    }
    if breaks {
        out.push(' ');
    }
}

fn remove_empty_paragraphs(root: &NodeRef) {
    let empty: Vec<NodeRef> = match root.select("p") {
        Ok(paragraphs) => paragraphs
            .filter(|p| p.text_contents().trim().is_empty())
            .map(|p| p.as_node().clone())
            .collect(),
        Err(_) => return,
    };
    for paragraph in empty {
        paragraph.detach();
    }
}

fn third_paragraph_first_sentence(root: &NodeRef) -> Option<String> {
    let paragraphs: Vec<String> = root
        .select("p")
        .ok()?
        .map(|p| normalized_text(p.as_node()))
        .filter(|text| !text.is_empty())
        .collect();

    paragraphs.get(2).map(|text| first_sentence(text))
}

pub(crate) fn first_sentence(text: &str) -> String {
    match SENTENCE_BOUNDARY.find(text) {
        Some(boundary) => text[..boundary.start() + 1].trim().to_string(),
        None => text.trim().to_string(),
    }
}

fn second_bullets_by_header(root: &NodeRef) -> HashMap<String, String> {
    let mut bullets = HashMap::new();
    let lists = match root.select("ul") {
        Ok(lists) => lists,
        Err(_) => return bullets,
    };

    for list in lists {
        let list = list.as_node();
        let Some(header) = previous_element_sibling(list) else {
            continue;
        };
        let header = normalized_text(&header);
        if header.is_empty() {
            continue;
        }

        let items: Vec<NodeRef> = list
            .children()
            .filter(|child| {
                child
                    .as_element()
                    .map_or(false, |element| &*element.name.local == "li")
            })
            .collect();

        if let Some(second) = items.get(1) {
            bullets.insert(header.to_lowercase(), normalized_text(second));
        }
    }

    bullets
}

/// Nearest earlier sibling that is an element; text and comment nodes are skipped.
fn previous_element_sibling(node: &NodeRef) -> Option<NodeRef> {
    let mut current = node.previous_sibling();
    while let Some(sibling) = current {
        if sibling.as_element().is_some() {
            return Some(sibling);
        }
        current = sibling.previous_sibling();
    }
    None
}
