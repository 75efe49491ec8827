//! HTML rendering for the single page of the app.

use std::fmt::{self, Write};

use html_escape::{encode_double_quoted_attribute, encode_text};
use sortbin_core::Classification;

const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>sortbin - which bin does it go in?</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 42rem; margin: 2rem auto; padding: 0 1rem; color: #1d2b1f; }
  h1 { color: #2e7d32; }
  form { display: flex; gap: .5rem; margin: 1.5rem 0; }
  img { max-width: 100%; border-radius: .5rem; }
  table { width: 100%; border-collapse: collapse; margin-top: 1rem; }
  td { padding: .35rem .5rem; border-bottom: 1px solid #e0e0e0; }
  td.score { text-align: right; font-variant-numeric: tabular-nums; width: 5rem; }
  .bar { background: #66bb6a; height: .6rem; border-radius: .3rem; }
  tr.best td { font-weight: 600; }
</style>
</head>
<body>
<h1>Which bin does it go in?</h1>
<p>Upload a photo of a piece of waste to see how it scores against each recycling category.</p>
<form method="post" enctype="multipart/form-data">
  <input type="file" name="image" accept="image/*" required>
  <button type="submit">Classify</button>
</form>
"#;

const FOOT: &str = "</body>\n</html>\n";

/// Render the page, with the classification below the form when there is one.
pub fn render(result: Option<&Classification>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str(HEAD);

    if let Some(result) = result {
        if let Err(e) = render_result(&mut html, result) {
            tracing::error!("Failed to render classification: {e}");
        }
    }

    html.push_str(FOOT);
    html
}

fn render_result(html: &mut String, result: &Classification) -> fmt::Result {
    let url = encode_double_quoted_attribute(&result.image_url);
    writeln!(html, "<section>")?;
    writeln!(
        html,
        "<p><img src=\"{url}\" alt=\"Uploaded image\"></p>\n<p><a href=\"{url}\">{}</a></p>",
        encode_text(&result.image_url)
    )?;

    if let Some(best) = result.best() {
        writeln!(
            html,
            "<h2>Most likely: {} ({:.1}%)</h2>",
            encode_text(&best.category),
            best.score * 100.0
        )?;
    }
    if let Some(descriptor) = &result.top_descriptor {
        writeln!(
            html,
            "<p>Closest description: <em>{}</em></p>",
            encode_text(descriptor)
        )?;
    }

    writeln!(html, "<table>")?;
    for (rank, score) in result.scores.iter().enumerate() {
        let width = (score.score.clamp(0.0, 1.0) * 100.0).round();
        writeln!(
            html,
            "<tr{}><td>{}</td><td><div class=\"bar\" style=\"width: {width}%\"></div></td><td class=\"score\">{:.4}</td></tr>",
            if rank == 0 { " class=\"best\"" } else { "" },
            encode_text(&score.category),
            score.score
        )?;
    }
    writeln!(html, "</table>")?;
    writeln!(
        html,
        "<p><small>Classified in {} ms</small></p>\n</section>",
        result.elapsed_ms
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortbin_core::CategoryScore;

    fn classification() -> Classification {
        Classification {
            image_url: "https://i.ibb.co/abc/bottle.jpg".to_string(),
            scores: vec![
                CategoryScore {
                    category: "glass".to_string(),
                    score: 0.8,
                },
                CategoryScore {
                    category: "plastic".to_string(),
                    score: 0.2,
                },
            ],
            top_descriptor: Some("glass bottle".to_string()),
            elapsed_ms: 431,
        }
    }

    #[test]
    fn empty_page_has_form_only() {
        let html = render(None);
        assert!(html.contains("name=\"image\""));
        assert!(html.contains("multipart/form-data"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn result_page_lists_ranked_scores() {
        let html = render(Some(&classification()));
        assert!(html.contains("https://i.ibb.co/abc/bottle.jpg"));
        assert!(html.contains("Most likely: glass (80.0%)"));
        assert!(html.contains("glass bottle"));

        let glass = html.find("<td>glass</td>").unwrap();
        let plastic = html.find("<td>plastic</td>").unwrap();
        assert!(glass < plastic);
        assert!(html.contains("0.8000"));
        assert!(html.contains("0.2000"));
    }

    #[test]
    fn escapes_untrusted_text() {
        let mut result = classification();
        result.image_url = "https://x/\"><script>alert(1)</script>".to_string();
        result.scores[0].category = "<b>glass</b>".to_string();
        result.top_descriptor = Some("bottle & jar".to_string());

        let html = render(Some(&result));
        assert!(!html.contains("<script>"));
        assert!(html.contains("src=\"https://x/&quot;&gt;&lt;script&gt;"));
        assert!(html.contains("&lt;b&gt;glass&lt;/b&gt;"));
        assert!(html.contains("bottle &amp; jar"));
    }
}
