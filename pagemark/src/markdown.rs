use anyhow::{Context, Result};
use htmd::{Element, HtmlToMarkdown};
use regex::Regex;
use std::sync::OnceLock;

/// Excerpts are the first 200 characters of the converted Markdown.
pub const EXCERPT_LENGTH: usize = 200;

fn converter() -> &'static HtmlToMarkdown {
    static CONVERTER: OnceLock<HtmlToMarkdown> = OnceLock::new();
    CONVERTER.get_or_init(|| {
        HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style", "noscript"])
            .add_handler(vec!["th", "td"], |el: Element| {
                let cell: String = el.content.split_whitespace().collect::<Vec<_>>().join(" ");
                Some(format!("| {} ", cell.replace('|', "\\|")))
            })
            .add_handler(vec!["tr"], |el: Element| {
                let cells = el.content.replace('\n', " ");
                let cells = cells.trim();
                if cells.is_empty() {
                    return Some(String::new());
                }
                Some(format!("{cells} |\n"))
            })
            .add_handler(vec!["thead", "tbody", "tfoot"], |el: Element| {
                Some(el.content.to_string())
            })
            .add_handler(vec!["table"], |el: Element| Some(pipe_table(&el.content)))
            .build()
    })
}

/// Assemble the row lines emitted by the cell handlers into a GFM pipe table,
/// with the first row as the header.
fn pipe_table(content: &str) -> String {
    let rows: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .collect();
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };
    let columns = header.matches('|').count().saturating_sub(1);
    let mut table = format!("\n\n{header}\n|");
    for _ in 0..columns {
        table.push_str(" --- |");
    }
    for row in body {
        table.push('\n');
        table.push_str(row);
    }
    table.push_str("\n\n");
    table
}

fn skip_anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\[skip to content\]\(#[^)]*\)").expect("valid skip-anchor pattern")
    })
}

/// Convert HTML to Markdown with the fixed post-processing rules applied.
pub fn html_to_markdown(html: &str) -> Result<String> {
    if html.trim().is_empty() {
        anyhow::bail!("Failed to parse article content");
    }
    let markdown = converter()
        .convert(html)
        .context("markdown conversion failed")?;
    Ok(post_process(&markdown))
}

/// Post-processing, in order: escape literal braces, strip "Skip to Content"
/// anchors, collapse runs of blank lines.
fn post_process(markdown: &str) -> String {
    let escaped = markdown.replace('{', "\\{").replace('}', "\\}");
    let stripped = skip_anchor_re().replace_all(&escaped, "");
    collapse_blank_lines(stripped.as_ref())
}

fn collapse_blank_lines(markdown: &str) -> String {
    let mut result = markdown.to_string();
    while result.contains("\n\n\n") {
        result = result.replace("\n\n\n", "\n\n");
    }
    result.trim().to_string()
}

/// Leading excerpt of the converted Markdown, always suffixed with an ellipsis.
pub fn excerpt(markdown: &str) -> String {
    let prefix: String = markdown.chars().take(EXCERPT_LENGTH).collect();
    format!("{prefix}...")
}
