// Page content handed to the extractor: either plain text or a parsed DOM.
// Text strategies only need `normalized_text`; DOM strategies skip
// themselves when `document` is None.

use crate::core::normalize::{html_to_text, normalize_text};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid selector"));

pub trait PageContent {
    fn normalized_text(&self) -> String;

    fn document(&self) -> Option<&Html> {
        None
    }
}

/// Already-decoded page text.
#[derive(Debug, Clone)]
pub struct TextPage {
    text: String,
}

impl TextPage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Flattens markup without building a DOM.
    pub fn from_html(html: &str) -> Self {
        Self {
            text: html_to_text(html),
        }
    }
}

impl PageContent for TextPage {
    fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }
}

impl PageContent for str {
    fn normalized_text(&self) -> String {
        normalize_text(self)
    }
}

pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }
}

impl PageContent for HtmlPage {
    fn normalized_text(&self) -> String {
        let root = self
            .document
            .select(&BODY)
            .next()
            .unwrap_or_else(|| self.document.root_element());
        normalize_text(&visible_text(root))
    }

    fn document(&self) -> Option<&Html> {
        Some(&self.document)
    }
}

/// Concatenated text nodes, like `textContent`, minus script and style bodies.
pub fn visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"));
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_page_normalizes() {
        let page = TextPage::new("Код\u{00A0}получения   123");
        assert_eq!(page.normalized_text(), "Код получения 123");
        assert!(page.document().is_none());
    }

    #[test]
    fn test_html_page_skips_scripts() {
        let page = HtmlPage::parse(
            "<html><head><title>Заказ</title></head><body><p>Номер</p><script>var x = 1;</script><b> 42 </b></body></html>",
        );
        assert_eq!(page.normalized_text(), "Номер 42");
        assert!(page.document().is_some());
    }
}
