//! Editor: owns the generated code once the pipeline completes.
//!
//! Preview and download both render the same standalone document: the css
//! is injected as a `<style>` element before `</head>` and the js as a
//! `<script>` element before `</body>`.

use crate::models::portfolio::{GeneratedPortfolio, PortfolioEdit};

pub const DEFAULT_FILE_STEM: &str = "portfolio";

/// Sandbox applied to previews so generated scripts cannot reach the app origin.
pub const PREVIEW_CSP: &str = "sandbox allow-scripts";

/// Replaces whichever code strings the edit carries. Returns false for an empty edit.
pub fn apply_edit(portfolio: &mut GeneratedPortfolio, edit: PortfolioEdit) -> bool {
    if edit.is_empty() {
        return false;
    }
    if let Some(html) = edit.html {
        portfolio.html = html;
    }
    if let Some(css) = edit.css {
        portfolio.css = css;
    }
    if let Some(js) = edit.js {
        portfolio.js = js;
    }
    true
}

/// Single self-contained HTML file with css and js inlined.
pub fn standalone_document(portfolio: &GeneratedPortfolio) -> String {
    let mut document = portfolio.html.clone();

    if !portfolio.css.trim().is_empty() {
        let style = format!("<style>\n{}\n</style>\n", portfolio.css);
        insert_before_tag(&mut document, "</head>", &style, false);
    }
    if !portfolio.js.trim().is_empty() {
        let script = format!("<script>\n{}\n</script>\n", portfolio.js);
        insert_before_tag(&mut document, "</body>", &script, true);
    }

    document
}

/// Inserts `snippet` before the first (or last) case-insensitive match of
/// `tag`, appending when the tag is missing.
fn insert_before_tag(document: &mut String, tag: &str, snippet: &str, last: bool) {
    // ASCII lowercasing keeps byte offsets aligned with the original.
    let lower = document.to_ascii_lowercase();
    let found = if last { lower.rfind(tag) } else { lower.find(tag) };

    match found {
        Some(index) => document.insert_str(index, snippet),
        None => {
            if !document.ends_with('\n') {
                document.push('\n');
            }
            document.push_str(snippet);
        }
    }
}

/// `Jane Doe` → `jane-doe.html`; no usable name → `portfolio.html`.
///
/// The slug is ASCII only so it can sit in a `Content-Disposition` header as is.
pub fn download_filename(name: Option<&str>) -> String {
    let mut slug = String::new();
    for c in name.unwrap_or_default().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        format!("{DEFAULT_FILE_STEM}.html")
    } else {
        format!("{slug}.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portfolio(html: &str, css: &str, js: &str) -> GeneratedPortfolio {
        GeneratedPortfolio {
            html: html.to_string(),
            css: css.to_string(),
            js: js.to_string(),
        }
    }

    #[test]
    fn test_css_and_js_are_inlined_before_closing_tags() {
        let doc = standalone_document(&portfolio(
            "<html><HEAD><title>x</title></HEAD><BODY><h1>Hi</h1></BODY></html>",
            "h1 { color: red; }",
            "console.log(1);",
        ));

        let style = doc.find("<style>").unwrap();
        let script = doc.find("<script>").unwrap();
        assert!(style < doc.find("</HEAD>").unwrap());
        assert!(doc.find("<h1>Hi</h1>").unwrap() < script);
        assert!(script < doc.find("</BODY>").unwrap());
        assert!(doc.contains("h1 { color: red; }"));
        assert!(doc.contains("console.log(1);"));
    }

    #[test]
    fn test_missing_tags_append_snippets() {
        let doc = standalone_document(&portfolio("<p>bare</p>", "p {}", "run();"));
        assert!(doc.starts_with("<p>bare</p>\n<style>"));
        assert!(doc.ends_with("<script>\nrun();\n</script>\n"));
    }

    #[test]
    fn test_empty_css_and_js_leave_html_untouched() {
        let html = "<html><head></head><body></body></html>";
        assert_eq!(standalone_document(&portfolio(html, "", "  ")), html);
    }

    #[test]
    fn test_script_goes_before_last_body_close() {
        let html = "<html><body><pre>&lt;/body&gt; </body></pre></body></html>";
        let doc = standalone_document(&portfolio(html, "", "go();"));
        assert!(doc.ends_with("</pre><script>\ngo();\n</script>\n</body></html>"));
    }

    #[test]
    fn test_partial_edit_keeps_other_fields() {
        let mut p = portfolio("<html></html>", "a {}", "x();");
        let changed = apply_edit(
            &mut p,
            PortfolioEdit {
                css: Some("b {}".to_string()),
                ..Default::default()
            },
        );
        assert!(changed);
        assert_eq!(p, portfolio("<html></html>", "b {}", "x();"));
        assert!(!apply_edit(&mut p, PortfolioEdit::default()));
    }

    #[test]
    fn test_download_filename_slugs_name() {
        assert_eq!(download_filename(Some("Jane Doe")), "jane-doe.html");
        assert_eq!(download_filename(Some("  Jose  O'Brien ")), "jose-o-brien.html");
        assert_eq!(download_filename(Some("!!!")), "portfolio.html");
        assert_eq!(download_filename(None), "portfolio.html");
    }

    #[test]
    fn test_download_filename_is_ascii_only() {
        assert_eq!(download_filename(Some("José O'Brien")), "jos-o-brien.html");
        assert_eq!(download_filename(Some("Zoë Ünal")), "zo-nal.html");
        assert_eq!(download_filename(Some("王小明")), "portfolio.html");
    }
}
