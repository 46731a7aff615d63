//! HTML to plain text.

use scraper::{ElementRef, Html, Selector};

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Readability-like text extraction: `<article>`, else `<body>`, else the
/// whole document, with script and style content dropped and whitespace
/// collapsed to single spaces.
#[derive(Debug, Default, Clone)]
pub struct HtmlTextExtractor;

impl HtmlTextExtractor {
    pub fn extract_text(&self, html: &str) -> String {
        let doc = Html::parse_document(html);
        let article_sel = Selector::parse("article").ok();
        let body_sel = Selector::parse("body").ok();

        let root = first_match(&doc, &article_sel)
            .or_else(|| first_match(&doc, &body_sel))
            .unwrap_or_else(|| doc.root_element());

        collapse_whitespace(&visible_text(root))
    }

    pub fn extract_bytes(&self, bytes: &[u8]) -> String {
        self.extract_text(&String::from_utf8_lossy(bytes))
    }
}

fn first_match<'a>(doc: &'a Html, selector: &Option<Selector>) -> Option<ElementRef<'a>> {
    selector.as_ref().and_then(|sel| doc.select(sel).next())
}

fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| SKIPPED_ELEMENTS.contains(&el.name()))
                .unwrap_or(false)
        });
        if !hidden {
            parts.push(&**text);
        }
    }
    parts.join(" ")
}

/// Collapse every whitespace run to one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_over_body() {
        let html = r#"<html><head><title>T</title></head><body>
            <nav>Home | About</nav>
            <article><h1>Markets</h1><p>Prices   rose
            sharply.</p></article>
        </body></html>"#;
        assert_eq!(HtmlTextExtractor.extract_text(html), "Markets Prices rose sharply.");
    }

    #[test]
    fn drops_scripts_and_styles() {
        let html = r#"<body><style>p{color:red}</style><p>Hello</p>
            <script>var x = 1;</script><p>world</p></body>"#;
        assert_eq!(HtmlTextExtractor.extract_text(html), "Hello world");
    }

    #[test]
    fn fragment_without_body_still_extracts() {
        assert_eq!(HtmlTextExtractor.extract_bytes(b"<p>Just <b>text</b></p>"), "Just text");
    }

    #[test]
    fn empty_document_yields_empty_text() {
        assert_eq!(HtmlTextExtractor.extract_text("<html><body>  </body></html>"), "");
    }
}
