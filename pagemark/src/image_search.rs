use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.google.com/search?tbm=isch&tbs=isz:l&q=";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Run an image search and render the results as Markdown-embeddable tags.
pub async fn search_images_markdown(
    query: &str,
    base_url: &str,
    timeout_secs: u64,
) -> Result<String> {
    let urls = fetch_image_urls(query, base_url, timeout_secs).await?;
    info!("image search: found {} images for '{}'", urls.len(), query);
    Ok(render_image_markdown(&urls))
}

async fn fetch_image_urls(query: &str, base_url: &str, timeout_secs: u64) -> Result<Vec<String>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(crate::scraping::DEFAULT_USER_AGENT)
        .build()
        .context("failed to build reqwest client")?;

    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let request_url = format!("{base_url}{encoded}");

    let response = client
        .get(&request_url)
        .send()
        .await
        .context("image search request failed")?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("image search failed with status: {status}"));
    }

    let body = response
        .text()
        .await
        .context("failed to read image search response")?;
    Ok(extract_image_urls(&body))
}

/// Pull absolute image URLs out of a search results page. Inline data URIs
/// (thumbnail placeholders) are skipped.
fn extract_image_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .filter(|src| src.starts_with("http"))
        .map(str::to_string)
        .collect()
}

fn render_image_markdown(urls: &[String]) -> String {
    urls.iter()
        .map(|url| format!(r#"<img src="{url}" alt="Image" style="max-width:100%; height:auto;" />"#))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_only_absolute_image_urls() {
        let html = r#"
            <html><body>
                <img src="https://img.example.com/a.jpg" />
                <img src="data:image/gif;base64,R0lGOD" />
                <img src="/relative/b.jpg" />
                <img alt="no src" />
                <img src="http://img.example.com/c.png" />
            </body></html>
        "#;
        let urls = extract_image_urls(html);
        assert_eq!(
            urls,
            vec![
                "https://img.example.com/a.jpg".to_string(),
                "http://img.example.com/c.png".to_string(),
            ]
        );
    }

    #[test]
    fn renders_image_tags_separated_by_blank_lines() {
        let urls = vec![
            "https://img.example.com/a.jpg".to_string(),
            "https://img.example.com/b.jpg".to_string(),
        ];
        let markdown = render_image_markdown(&urls);
        let expected = "<img src=\"https://img.example.com/a.jpg\" alt=\"Image\" style=\"max-width:100%; height:auto;\" />\n\n\
                        <img src=\"https://img.example.com/b.jpg\" alt=\"Image\" style=\"max-width:100%; height:auto;\" />";
        assert_eq!(markdown, expected);
    }

    #[test]
    fn empty_results_render_empty_markdown() {
        assert_eq!(render_image_markdown(&[]), "");
    }
}
