//! Main-content detection in the spirit of Mozilla's Readability.
//!
//! Paragraph-like elements are scored by length and comma count, their
//! scores flow to the parent (full) and grandparent (half), and the best
//! scoring container, discounted by link density, is taken as the article.
//! Siblings that score close to it are kept alongside.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::normalize::collapse_whitespace;

const MIN_PARAGRAPH_CHARS: usize = 25;
const MIN_ARTICLE_CHARS: usize = 140;
const CLASS_WEIGHT: f64 = 25.0;
const SIBLING_RATIO: f64 = 0.2;
const MAX_BYLINE_CHARS: usize = 100;

/// Elements whose contents never count as article text.
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "aside", "footer", "header", "form",
    "iframe", "svg", "button", "select", "textarea",
];

/// Elements rendered with a paragraph break around them.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table", "tr",
    "ul",
];

static PARAGRAPHS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, pre, td, blockquote").expect("valid paragraph selector"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid link selector"));
static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").expect("valid meta selector"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("valid title selector"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid h1 selector"));
static BYLINE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"[rel="author"], [itemprop="author"], [class*="byline"], [id*="byline"], [class*="author"]"#,
    )
    .expect("valid byline selector")
});

static UNLIKELY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote",
    )
    .expect("valid unlikely pattern")
});
static MAYBE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)and|article|body|column|content|main|shadow").expect("valid maybe pattern")
});
static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story")
        .expect("valid positive pattern")
});
static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)-ad-|hidden|^hid$| hid$| hid |^hid |banner|combx|comment|com-|contact|foot|footer|footnote|gdpr|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget",
    )
    .expect("valid negative pattern")
});
static TITLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" [|\-\u{2013}\u{2014}\\/>»] ").expect("valid separator pattern"));

/// Best-effort article structure. Produced only when a content region is found.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub site_name: Option<String>,
    pub excerpt: Option<String>,
    pub text_content: String,
    pub length: usize,
}

#[derive(Clone, Copy)]
struct Candidate<'a> {
    element: ElementRef<'a>,
    score: f64,
}

struct ArticleBody {
    text: String,
    first_paragraph: Option<String>,
}

pub struct Readability<'a> {
    doc: &'a Html,
}

impl<'a> Readability<'a> {
    pub fn new(doc: &'a Html) -> Self {
        Self { doc }
    }

    /// Returns `None` when no main-content region can be identified.
    pub fn parse(&self) -> Option<Parsed> {
        let body = self.grab_article()?;
        let length = body.text.chars().count();

        let excerpt = self
            .meta_content(&["description", "og:description", "twitter:description"])
            .or(body.first_paragraph);

        Some(Parsed {
            title: self.title(),
            byline: self.byline(),
            site_name: self.meta_content(&["og:site_name"]),
            excerpt,
            text_content: body.text,
            length,
        })
    }

    pub fn title(&self) -> Option<String> {
        if let Some(title) = self.meta_content(&["og:title", "twitter:title"]) {
            return Some(title);
        }

        let document_title = self
            .doc
            .select(&TITLE)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty());

        match document_title {
            Some(title) => Some(strip_site_suffix(&title)),
            None => self
                .doc
                .select(&HEADING)
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .find(|t| !t.is_empty()),
        }
    }

    fn byline(&self) -> Option<String> {
        if let Some(author) = self.meta_content(&["author", "article:author"]) {
            if !author.starts_with("http") {
                return Some(author);
            }
        }

        self.doc
            .select(&BYLINE)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .find(|text| !text.is_empty() && text.chars().count() <= MAX_BYLINE_CHARS)
    }

    fn meta_content(&self, keys: &[&str]) -> Option<String> {
        for key in keys {
            let found = self.doc.select(&META).find_map(|el| {
                let meta = el.value();
                let name = meta.attr("property").or_else(|| meta.attr("name"))?;
                if !name.eq_ignore_ascii_case(key) {
                    return None;
                }
                let content = collapse_whitespace(meta.attr("content")?);
                (!content.is_empty()).then_some(content)
            });
            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn grab_article(&self) -> Option<ArticleBody> {
        let mut candidates: Vec<Candidate<'a>> = Vec::new();
        let mut positions = HashMap::new();

        for paragraph in self.doc.select(&PARAGRAPHS) {
            if is_excluded(paragraph) {
                continue;
            }

            let text = paragraph.text().collect::<String>();
            let chars = text.trim().chars().count();
            if chars < MIN_PARAGRAPH_CHARS {
                continue;
            }

            let score = 1.0 + text.matches(',').count() as f64 + (chars / 100).min(3) as f64;

            let ancestors = paragraph.ancestors().filter_map(ElementRef::wrap).take(2);
            for (level, ancestor) in ancestors.enumerate() {
                let pos = *positions.entry(ancestor.id()).or_insert_with(|| {
                    candidates.push(Candidate {
                        element: ancestor,
                        score: initial_score(ancestor),
                    });
                    candidates.len() - 1
                });
                candidates[pos].score += if level == 0 { score } else { score / 2.0 };
            }
        }

        for candidate in &mut candidates {
            candidate.score *= 1.0 - link_density(candidate.element);
        }

        let top = candidates
            .iter()
            .copied()
            .reduce(|best, c| if c.score > best.score { c } else { best })?;

        let parts = self.collect_with_siblings(top, &candidates);
        let text = parts
            .iter()
            .map(|el| render_text(*el))
            .collect::<Vec<_>>()
            .join("\n\n");

        if collapse_whitespace(&text).chars().count() < MIN_ARTICLE_CHARS {
            tracing::debug!(
                "Top candidate <{}> too short for an article",
                top.element.value().name()
            );
            return None;
        }

        let first_paragraph = parts.iter().find_map(|el| {
            el.select(&PARAGRAPHS)
                .map(|p| collapse_whitespace(&p.text().collect::<String>()))
                .find(|t| t.chars().count() >= MIN_PARAGRAPH_CHARS)
        });

        Some(ArticleBody {
            text,
            first_paragraph,
        })
    }

    fn collect_with_siblings(
        &self,
        top: Candidate<'a>,
        candidates: &[Candidate<'a>],
    ) -> Vec<ElementRef<'a>> {
        let Some(parent) = top.element.parent().and_then(ElementRef::wrap) else {
            return vec![top.element];
        };

        let threshold = (top.score * SIBLING_RATIO).max(10.0);
        parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| {
                if sibling.id() == top.element.id() {
                    return true;
                }
                let scored = candidates
                    .iter()
                    .find(|c| c.element.id() == sibling.id())
                    .is_some_and(|c| c.score >= threshold);
                scored || is_standalone_paragraph(*sibling)
            })
            .collect()
    }
}

fn strip_site_suffix(title: &str) -> String {
    let Some(last) = TITLE_SEPARATOR.find_iter(title).last() else {
        return title.to_string();
    };
    let head = title[..last.start()].trim();
    if head.split_whitespace().count() >= 3 {
        head.to_string()
    } else {
        title.to_string()
    }
}

fn is_excluded(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| EXCLUDED_TAGS.contains(&el.value().name()) || is_unlikely(el))
}

fn is_unlikely(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if matches!(value.name(), "html" | "body" | "article" | "main") {
        return false;
    }
    let signature = format!(
        "{} {}",
        value.attr("class").unwrap_or_default(),
        value.id().unwrap_or_default()
    );
    if signature.trim().is_empty() {
        return false;
    }
    UNLIKELY.is_match(&signature) && !MAYBE.is_match(&signature)
}

fn initial_score(element: ElementRef<'_>) -> f64 {
    let base = match element.value().name() {
        "article" => 10.0,
        "section" => 8.0,
        "div" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    base + class_weight(element)
}

fn class_weight(element: ElementRef<'_>) -> f64 {
    let value = element.value();
    [value.attr("class"), value.id()]
        .into_iter()
        .flatten()
        .filter(|attr| !attr.trim().is_empty())
        .map(|attr| {
            let mut weight = 0.0;
            if NEGATIVE.is_match(attr) {
                weight -= CLASS_WEIGHT;
            }
            if POSITIVE.is_match(attr) {
                weight += CLASS_WEIGHT;
            }
            weight
        })
        .sum()
}

fn link_density(element: ElementRef<'_>) -> f64 {
    let total = element.text().map(|t| t.chars().count()).sum::<usize>();
    if total == 0 {
        return 0.0;
    }
    let linked = element
        .select(&LINKS)
        .flat_map(|a| a.text())
        .map(|t| t.chars().count())
        .sum::<usize>();
    linked as f64 / total as f64
}

fn is_standalone_paragraph(element: ElementRef<'_>) -> bool {
    if element.value().name() != "p" || is_excluded(element) {
        return false;
    }
    let text = element.text().collect::<String>();
    let chars = text.trim().chars().count();
    let density = link_density(element);
    (chars > 80 && density < 0.25)
        || (chars > 0 && density == 0.0 && text.trim_end().ends_with('.'))
}

/// Text of an element with paragraph breaks between block elements.
pub fn render_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    render_into(element, &mut out);
    out
}

fn render_into(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        if EXCLUDED_TAGS.contains(&name) {
            continue;
        }
        if name == "br" {
            out.push('\n');
            continue;
        }
        let block = BLOCK_TAGS.contains(&name);
        if block {
            out.push_str("\n\n");
        }
        render_into(child, out);
        if block {
            out.push_str("\n\n");
        }
    }
}
