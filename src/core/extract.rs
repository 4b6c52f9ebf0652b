// Tracking-number extraction from noisy order pages.
//
// Each carrier has an ordered list of strategies. A strategy looks for one
// kind of anchor (a label phrase, an emphasised value near the label, a copy
// icon, a trailing phrase, keywords around a digit run) and returns the
// first candidate that validates. The first strategy to produce a valid code
// wins; when all of them come up empty the result is "not found", never an
// error.
//
// DOM strategies are skipped for text-only pages, so the same plan works for
// fetched HTML flattened to text and for a parsed document.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::core::normalize::{clean_digits, is_valid_tracking, normalize_text};
use crate::core::page::PageContent;
use crate::domain::model::Carrier;

const OPERATOR_LABEL: &str = "Назовите этот номер";
const CONTEXT_RADIUS: usize = 120;
const LOCKER_KEYWORDS: [&str; 5] = [
    "постамат",
    "касс",
    "введите код",
    "сообщите код",
    "покажите qr",
];
const BLOCK_KEYWORDS: [&str; 4] = ["постамат", "касс", "код", "qr"];

static OPERATOR_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Назовите\s+этот\s+номер[^0-9]*([0-9][0-9\s]{5,})").expect("valid regex")
});
static LOCKER_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9][0-9\s]{5,20})\s+Посмотреть\s+постамат").expect("valid regex")
});
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9\s]{5,20}").expect("valid regex"));
static DIGIT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9][0-9\s]{5,20}$").expect("valid regex"));

static EMPHASIS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong, b").expect("valid selector"));
static COPY_ICON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"svg[data-icon="copy"], svg[name="copy"]"#).expect("valid selector")
});
static TEXT_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, div, p, strong, b").expect("valid selector"));

/// What a strategy gets to look at.
pub struct PageView<'a> {
    pub text: String,
    pub document: Option<&'a Html>,
}

impl<'a> PageView<'a> {
    pub fn new<P: PageContent + ?Sized>(page: &'a P) -> Self {
        Self {
            text: page.normalized_text(),
            document: page.document(),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&PageView<'_>) -> Option<String>,
}

const OPERATOR_PHRASE_STRATEGY: Strategy = Strategy {
    name: "operator phrase",
    run: operator_phrase,
};
const OPERATOR_LABEL_STRATEGY: Strategy = Strategy {
    name: "operator label emphasis",
    run: operator_label_emphasis,
};
const COPY_ICON_STRATEGY: Strategy = Strategy {
    name: "copy icon",
    run: copy_icon,
};
const LOCKER_PHRASE_STRATEGY: Strategy = Strategy {
    name: "locker phrase",
    run: locker_phrase,
};
const KEYWORD_WINDOW_STRATEGY: Strategy = Strategy {
    name: "keyword window",
    run: keyword_window,
};
const DIGIT_BLOCK_STRATEGY: Strategy = Strategy {
    name: "digit block",
    run: digit_block,
};

/// Strategy order for a carrier hint; `None` means auto-detect.
///
/// Without a hint the locker strategies run after the operator ones, so
/// codes shown without a carrier label are still picked up. The locker-only
/// digit-block scan is reserved for pages known to be locker orders.
pub fn plan(hint: Option<Carrier>) -> &'static [Strategy] {
    const AVITO: [Strategy; 2] = [OPERATOR_PHRASE_STRATEGY, OPERATOR_LABEL_STRATEGY];
    const FIVE_POST: [Strategy; 4] = [
        COPY_ICON_STRATEGY,
        LOCKER_PHRASE_STRATEGY,
        KEYWORD_WINDOW_STRATEGY,
        DIGIT_BLOCK_STRATEGY,
    ];
    const AUTO: [Strategy; 5] = [
        OPERATOR_PHRASE_STRATEGY,
        OPERATOR_LABEL_STRATEGY,
        COPY_ICON_STRATEGY,
        LOCKER_PHRASE_STRATEGY,
        KEYWORD_WINDOW_STRATEGY,
    ];

    match hint {
        Some(Carrier::Avito) => &AVITO,
        Some(Carrier::FivePost) => &FIVE_POST,
        None => &AUTO,
    }
}

/// Runs strategies in order; the first valid result wins.
pub fn run_plan(view: &PageView<'_>, strategies: &[Strategy]) -> Option<String> {
    strategies.iter().find_map(|strategy| {
        let code = (strategy.run)(view).filter(|code| is_valid_tracking(code))?;
        tracing::debug!("Tracking {} found by {}", code, strategy.name);
        Some(code)
    })
}

pub fn find_tracking<P: PageContent + ?Sized>(page: &P, hint: Option<Carrier>) -> Option<String> {
    let view = PageView::new(page);
    if view.text.is_empty() && view.document.is_none() {
        return None;
    }
    run_plan(&view, plan(hint))
}

/// Tracking code for the page, or an empty string when none was found.
pub fn extract<P: PageContent + ?Sized>(page: &P, hint: Option<Carrier>) -> String {
    find_tracking(page, hint).unwrap_or_default()
}

fn valid_digits(raw: &str) -> Option<String> {
    let digits = clean_digits(raw);
    is_valid_tracking(&digits).then_some(digits)
}

fn operator_phrase(view: &PageView<'_>) -> Option<String> {
    let caps = OPERATOR_PHRASE.captures(&view.text)?;
    valid_digits(caps.get(1)?.as_str())
}

fn locker_phrase(view: &PageView<'_>) -> Option<String> {
    let caps = LOCKER_PHRASE.captures(&view.text)?;
    valid_digits(caps.get(1)?.as_str())
}

fn keyword_window(view: &PageView<'_>) -> Option<String> {
    let text = view.text.as_str();
    DIGIT_RUN.find_iter(text).find_map(|m| {
        let digits = valid_digits(m.as_str())?;
        let context = window(text, m.start(), m.end(), CONTEXT_RADIUS).to_lowercase();
        LOCKER_KEYWORDS
            .iter()
            .any(|k| context.contains(k))
            .then_some(digits)
    })
}

/// `radius` characters either side of `start..end`, clipped to the text.
fn window(text: &str, start: usize, end: usize, radius: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[from..to]
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<String>())
}

fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

/// First `strong`/`b` strictly inside `container`, if its digits validate.
fn emphasised_digits(container: ElementRef<'_>) -> Option<String> {
    let strong = container
        .select(&EMPHASIS)
        .find(|el| el.id() != container.id())?;
    valid_digits(&element_text(strong))
}

fn operator_label_emphasis(view: &PageView<'_>) -> Option<String> {
    let document = view.document?;

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !normalize_text(text).contains(OPERATOR_LABEL) {
            continue;
        }
        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };

        if let Some(code) = emphasised_digits(parent) {
            return Some(code);
        }

        let sibling = parent.next_siblings().find_map(ElementRef::wrap);
        if let Some(code) = sibling.and_then(emphasised_digits) {
            return Some(code);
        }

        // Label and value often sit in separate branches of a card; look a
        // few levels up.
        let mut container = parent_element(parent);
        for _ in 0..3 {
            let Some(current) = container else {
                break;
            };
            if let Some(code) = emphasised_digits(current) {
                return Some(code);
            }
            container = parent_element(current);
        }
    }

    None
}

fn copy_icon(view: &PageView<'_>) -> Option<String> {
    let document = view.document?;

    document.select(&COPY_ICON).find_map(|icon| {
        let container = icon
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| matches!(el.value().name(), "span" | "div" | "p"))?;
        valid_digits(&element_text(container))
    })
}

fn digit_block(view: &PageView<'_>) -> Option<String> {
    let document = view.document?;

    document.select(&TEXT_BLOCKS).find_map(|node| {
        let value = element_text(node);
        if !DIGIT_BLOCK.is_match(&value) {
            return None;
        }
        let digits = valid_digits(&value)?;
        let context = parent_element(node)
            .map(|p| element_text(p).to_lowercase())
            .unwrap_or_default();
        BLOCK_KEYWORDS
            .iter()
            .any(|k| context.contains(k))
            .then_some(digits)
    })
}
