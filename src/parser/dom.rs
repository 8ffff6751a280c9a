use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use super::text::normalize;

/// Ancestor levels examined when searching for an enclosing card.
pub const CARD_SEARCH_DEPTH: usize = 8;

static BODY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("input is empty")]
    EmptyInput,
    #[error("document has no content")]
    NoContent,
}

/// Immutable parsed document. All navigation is read-only; extractors share
/// one tree and never mutate it.
pub struct ReportDoc {
    tree: Html,
}

impl ReportDoc {
    /// Parse an HTML string. Lenient HTML parsing never rejects markup, so
    /// the hard-failure cases are empty input and a document whose body
    /// carries neither elements nor text.
    pub fn parse(html: &str) -> Result<Self, ParseError> {
        if html.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }
        let doc = ReportDoc {
            tree: Html::parse_document(html),
        };
        let root = doc.content_root();
        let has_elements = root.0.children().any(|c| c.value().is_element());
        if !has_elements && root.text().is_empty() {
            return Err(ParseError::NoContent);
        }
        Ok(doc)
    }

    /// Body element when present, else the document root.
    pub fn content_root(&self) -> Node<'_> {
        self.tree
            .select(&BODY_SEL)
            .next()
            .map(Node)
            .unwrap_or_else(|| Node(self.tree.root_element()))
    }

    pub fn select(&self, selector: &Selector) -> Vec<Node<'_>> {
        self.tree.select(selector).map(Node).collect()
    }

    pub fn first(&self, selector: &Selector) -> Option<Node<'_>> {
        self.tree.select(selector).next().map(Node)
    }

    /// Whole-document text, whitespace-collapsed.
    pub fn text(&self) -> String {
        self.content_root().text()
    }

    /// The `<title>` text, for capture context.
    pub fn title(&self) -> Option<String> {
        self.first(&TITLE_SEL)
            .map(|n| n.text())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    pub fn tag(&self) -> &'a str {
        self.0.value().name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.0.value().classes().any(|c| c == class)
    }

    /// Subtree text with whitespace runs collapsed to single spaces.
    pub fn text(&self) -> String {
        normalize(&self.0.text().collect::<String>())
    }

    /// Direct text children only, joined with single spaces, ends trimmed.
    /// Inner whitespace is left as-is for downstream cleaning.
    pub fn own_text(&self) -> String {
        let parts: Vec<&str> = self
            .0
            .children()
            .filter_map(|c| c.value().as_text().map(|t| &**t))
            .collect();
        parts.join(" ").trim().to_string()
    }

    pub fn select(&self, selector: &Selector) -> Vec<Node<'a>> {
        self.0.select(selector).map(Node).collect()
    }

    pub fn first(&self, selector: &Selector) -> Option<Node<'a>> {
        self.0.select(selector).next().map(Node)
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.0.parent().and_then(ElementRef::wrap).map(Node)
    }

    /// First following sibling that is an element (label → value hops).
    pub fn next_element(&self) -> Option<Node<'a>> {
        self.0.next_siblings().find_map(ElementRef::wrap).map(Node)
    }

    /// Self, then ancestors, nearest first.
    pub fn ancestors_or_self(&self) -> Vec<Node<'a>> {
        let mut nodes = vec![*self];
        nodes.extend(self.0.ancestors().filter_map(ElementRef::wrap).map(Node));
        nodes
    }

    /// Enclosing card: ascend at most CARD_SEARCH_DEPTH levels looking for
    /// `marker` as a substring of the class attribute; fall back to the
    /// nearest div ancestor-or-self, else self.
    pub fn enclosing_card(&self, marker: &str) -> Node<'a> {
        let mut node = Some(*self);
        for _ in 0..CARD_SEARCH_DEPTH {
            let Some(n) = node else { break };
            if n.attr("class").unwrap_or("").contains(marker) {
                return n;
            }
            node = n.parent();
        }
        self.ancestors_or_self()
            .into_iter()
            .find(|n| n.tag() == "div")
            .unwrap_or(*self)
    }
}

// ── Tests ──
