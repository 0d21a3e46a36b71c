use anyhow::{Context, Result};
use std::io::Cursor;
use tracing::info;
use url::Url;

/// Readable article content isolated from a rendered page.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    /// HTML of the main article content
    pub content: String,
    /// Plain-text rendering of the same content
    pub text: String,
}

/// Run readability extraction over a serialized DOM.
///
/// The page URL is needed so relative links inside the article resolve.
pub fn extract_article(html: &str, url: &str) -> Result<Article> {
    let page_url = Url::parse(url).context("failed to parse article URL")?;
    let mut reader = Cursor::new(html.as_bytes());

    let product = readability::extractor::extract(&mut reader, &page_url)
        .map_err(|e| anyhow::anyhow!("readability extraction failed for {url}: {e}"))?;

    info!(
        "extract: readability isolated {} chars of article HTML from {}",
        product.content.len(),
        url
    );

    Ok(Article {
        title: product.title,
        content: product.content,
        text: product.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_article_body() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head><title>Quarterly Report</title></head>
            <body>
                <nav><a href="/">Home</a><a href="/about">About</a></nav>
                <article>
                    <h1>Quarterly Report</h1>
                    <p>Revenue grew by twelve percent over the previous quarter,
                       driven mostly by the subscription business.</p>
                    <p>Operating costs stayed flat, which the board attributed to
                       the hiring freeze announced in January.</p>
                </article>
                <footer>Copyright 2024</footer>
            </body>
            </html>
        "#;

        let article = extract_article(html, "https://example.com/report").expect("extract");
        assert_eq!(article.title, "Quarterly Report");
        assert!(article.text.contains("Revenue grew"));
        assert!(article.content.contains("subscription business"));
    }

    #[test]
    fn rejects_invalid_url() {
        let err = extract_article("<html></html>", "not a url");
        assert!(err.is_err());
    }
}
