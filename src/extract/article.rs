use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::ReadableArticle;

use super::normalize::{collapse_whitespace, normalize_text};
use super::readability::Readability;

pub const UNTITLED: &str = "(untitled)";

static NON_CONTENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script, style, noscript, template").expect("valid non-content selector")
});
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid body selector"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("valid title selector"));

/// Turns a fetched HTML document into a `ReadableArticle`.
///
/// The document is parsed twice: readability reads one tree untouched,
/// the fallback strips scripts from the other. Readability text wins when
/// it survives normalization; otherwise the raw body text is used.
pub fn extract_article(html: &str, resolved_url: &str) -> Result<ReadableArticle> {
    let primary = Html::parse_document(html);
    let mut stripped = Html::parse_document(html);

    let parsed = Readability::new(&primary).parse();
    let fallback = normalize_text(&fallback_text(&mut stripped));

    let readable_text = parsed
        .as_ref()
        .map(|p| normalize_text(&p.text_content))
        .unwrap_or_default();

    let used_readability = !readable_text.is_empty();
    let text_content = if used_readability {
        readable_text
    } else {
        tracing::debug!("Readability found nothing at {}, using raw text", resolved_url);
        fallback
    };

    if text_content.is_empty() {
        return Err(AppError::NoContent(resolved_url.to_string()));
    }

    let title = parsed
        .as_ref()
        .and_then(|p| p.title.clone())
        .or_else(|| document_title(&primary))
        .map(|t| collapse_whitespace(&t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let length = match &parsed {
        Some(p) if used_readability => p.length,
        _ => text_content.chars().count(),
    };

    let (byline, site_name, excerpt) = match parsed {
        Some(p) => (p.byline, p.site_name, p.excerpt),
        None => (None, None, None),
    };

    Ok(ReadableArticle {
        title,
        url: resolved_url.to_string(),
        byline,
        site_name,
        excerpt,
        text_content,
        length,
    })
}

/// Body text with script-like nodes detached from the tree first.
fn fallback_text(doc: &mut Html) -> String {
    let doomed: Vec<_> = doc.select(&NON_CONTENT).map(|el| el.id()).collect();
    for id in doomed {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    match doc.select(&BODY).next() {
        Some(body) => body.text().collect(),
        None => doc.root_element().text().collect(),
    }
}

fn document_title(doc: &Html) -> Option<String> {
    doc.select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_raw_text_when_no_article_region() {
        let html = concat!(
            "<html><head><title>  Tiny\n  page </title>",
            "<script>var tracking = \"should never show\";</script></head>",
            "<body><script>document.write(\"nope\")</script>\n",
            "Hello   there.  \r\n\n\n\n",
            "<style>.x { color: red }</style>\n",
            "Second line.\u{a0}\n",
            "</body></html>",
        );

        let article = extract_article(html, "https://example.com/tiny").unwrap();
        assert_eq!(article.text_content, "Hello   there.\n\nSecond line.");
        assert_eq!(article.title, "Tiny page");
        assert_eq!(article.url, "https://example.com/tiny");
        assert_eq!(article.length, article.text_content.chars().count());
        assert!(article.byline.is_none());
        assert!(!article.text_content.contains("nope"));
        assert!(!article.text_content.contains("tracking"));
    }

    #[test]
    fn empty_document_is_no_content() {
        let html = "<html><head><title>Empty</title></head><body> \n\u{a0}<script>x()</script></body></html>";
        let err = extract_article(html, "https://example.com/empty").unwrap_err();
        assert!(matches!(err, AppError::NoContent(ref url) if url == "https://example.com/empty"));
    }

    #[test]
    fn untitled_placeholder_when_no_title() {
        let article = extract_article("<p>just text</p>", "https://example.com").unwrap();
        assert_eq!(article.title, UNTITLED);

        let article =
            extract_article("<title> \n </title><p>just text</p>", "https://example.com").unwrap();
        assert_eq!(article.title, UNTITLED);
    }

    #[test]
    fn readability_text_is_preferred() {
        let paragraph = "This paragraph is long enough to count, has commas, and keeps going for a while.";
        let html = format!(
            r#"<html><head><meta property="og:title" content="Real Title"></head><body>
               <script>var junk = 1;</script>
               <div class="menu">Menu items that are not the article at all</div>
               <div class="entry-content"><p>{paragraph}</p><p>{paragraph}</p><p>{paragraph}</p></div>
               </body></html>"#
        );

        let article = extract_article(&html, "https://example.com/post").unwrap();
        assert_eq!(article.title, "Real Title");
        assert!(article.text_content.starts_with("This paragraph is long enough"));
        assert!(!article.text_content.contains("Menu items"));
        assert!(!article.text_content.contains("junk"));
    }
}
