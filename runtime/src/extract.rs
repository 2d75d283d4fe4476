// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pull rate panels and tables out of a rendered DOM snapshot.
//!
//! Matching is deliberately literal: the first `div` (in document order)
//! whose visible text contains the panel title is taken, its closest `div`
//! becomes the panel box, and every `span` inside that box whose trimmed
//! text starts with a digit is a value. The rules mirror the target page's
//! markup and should not be made smarter.
//!
//! Extraction never fails. A panel that cannot be located is `None`.

use crate::snapshot::{MetalQuotes, Panel, QuoteBox, Snapshot, SpotQuotes};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static CANDIDATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("valid selector"));
static PANEL_BOX: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("valid selector"));
static VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("valid selector"));
static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));

/// Elements whose text never renders.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Extract a [`Snapshot`] from serialized page HTML.
pub fn extract(html: &str) -> Snapshot {
    let document = Html::parse_document(html);
    extract_document(&document)
}

/// Extract a [`Snapshot`] from an already parsed document.
pub fn extract_document(document: &Html) -> Snapshot {
    let get = |panel: Panel| lookup(document, panel.title());

    Snapshot {
        spots: SpotQuotes {
            gold: get(Panel::GoldSpot),
            silver: get(Panel::SilverSpot),
            inr: get(Panel::InrSpot),
        },
        futures: MetalQuotes {
            gold: get(Panel::GoldFuture),
            silver: get(Panel::SilverFuture),
        },
        next: MetalQuotes {
            gold: get(Panel::GoldNext),
            silver: get(Panel::SilverNext),
        },
        tables: document.select(&TABLE).map(|t| t.html()).collect(),
    }
}

/// Locate the panel titled `title` and read its values.
///
/// Returns `None` when no element carries the title. A located panel with
/// no numeric values is an empty [`QuoteBox`], not `None`.
pub fn lookup(document: &Html, title: &str) -> Option<QuoteBox> {
    let header = document
        .select(&CANDIDATE)
        .find(|el| visible_text(*el).contains(title))?;
    let panel = closest(header, &PANEL_BOX)?;

    let values = panel
        .select(&VALUE)
        .map(|span| visible_text(span).trim().to_string())
        .filter(|text| starts_with_digit(text));

    Some(QuoteBox::from_fields(values))
}

/// Nearest ancestor-or-self matching `selector`.
fn closest<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    if selector.matches(&element) {
        return Some(element);
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| selector.matches(el))
}

/// Elements laid out on their own line.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "ul",
];

/// Rendered text of `element`, approximating `innerText`: whitespace runs
/// collapse to one space, block elements and `<br>` start a new line, and
/// content that never renders is skipped.
fn visible_text(element: ElementRef<'_>) -> String {
    if HIDDEN_TAGS.contains(&element.value().name()) {
        return String::new();
    }
    let mut out = String::new();
    collect_text(element, &mut out);
    out.trim().to_string()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            push_collapsed(out, text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let el = child.value();
        if HIDDEN_TAGS.contains(&el.name()) || el.attr("hidden").is_some() {
            continue;
        }
        if el.name() == "br" {
            break_line(out);
            continue;
        }
        let block = BLOCK_TAGS.contains(&el.name());
        if block {
            break_line(out);
        }
        collect_text(child, out);
        if block {
            break_line(out);
        }
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with([' ', '\n']) {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

fn break_line(out: &mut String) {
    out.truncate(out.trim_end_matches(' ').len());
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn starts_with_digit(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit())
}
