//! Human-readable status page

use std::fmt::Write;

use crate::models::{Basis, PredictionOutcome};

/// Readiness facts shown at the top of the page
#[derive(Debug, Clone)]
pub struct PageContext {
    pub labels_count: usize,
    pub nutrients_loaded: bool,
    /// Model description when real inference is available
    pub inference: Option<String>,
}

/// Render the status page, optionally with a prediction embedded
pub fn status_page(ctx: &PageContext, outcome: Option<&PredictionOutcome>) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>NutriScan</title></head><body>\n",
    );
    html.push_str("<h1>NutriScan</h1>\n<ul>\n");
    let _ = writeln!(html, "<li>Labels loaded: {}</li>", ctx.labels_count);
    let _ = writeln!(
        html,
        "<li>Nutrient table: {}</li>",
        if ctx.nutrients_loaded { "loaded" } else { "missing" }
    );
    match &ctx.inference {
        Some(model) => {
            let _ = writeln!(html, "<li>Inference: {}</li>", escape(model));
        }
        None => html.push_str("<li>Inference: unavailable (no model loaded)</li>\n"),
    }
    html.push_str("</ul>\n");

    if let Some(outcome) = outcome {
        html.push_str(&prediction_fragment(outcome));
    }

    html.push_str(UPLOAD_FORM);
    html.push_str("</body></html>\n");
    html
}

fn prediction_fragment(outcome: &PredictionOutcome) -> String {
    let mut html = String::from("<h2>Prediction</h2>\n<table>\n");
    let _ = writeln!(html, "<tr><th>Label</th><td>{}</td></tr>", escape(outcome.label()));
    let _ = writeln!(
        html,
        "<tr><th>Confidence</th><td>{:.1}%</td></tr>",
        outcome.confidence() * 100.0
    );

    match outcome {
        PredictionOutcome::Nutrients(result) => {
            let scale = &result.serving_or_scale;
            let portion = match (scale.basis, scale.grams) {
                (Basis::Per100g, Some(grams)) => format!("{} g", grams),
                _ => format!("{} x serving", scale.multiplier),
            };
            let _ = writeln!(html, "<tr><th>Portion</th><td>{}</td></tr>", escape(&portion));
            let _ = writeln!(html, "<tr><th>Energy</th><td>{} kcal</td></tr>", result.kcal);
            let _ = writeln!(html, "<tr><th>Protein</th><td>{:.2} g</td></tr>", result.protein_g);
            let _ = writeln!(html, "<tr><th>Fat</th><td>{:.2} g</td></tr>", result.fat_g);
            let _ = writeln!(html, "<tr><th>Carbohydrates</th><td>{:.2} g</td></tr>", result.carbs_g);
            let _ = writeln!(html, "<tr><th>Fiber</th><td>{:.2} g</td></tr>", result.fiber_g);
            html.push_str("</table>\n");
        }
        PredictionOutcome::NoNutrients(result) => {
            html.push_str("</table>\n");
            let _ = writeln!(html, "<p>{}</p>", escape(&result.detail));
        }
    }
    html
}

const UPLOAD_FORM: &str = r#"<h2>Upload</h2>
<form action="/predict" method="post" enctype="multipart/form-data">
<p><input type="file" name="file" accept="image/*" required></p>
<p><label>Grams <input type="text" name="grams" placeholder="optional"></label></p>
<p><label>Servings <input type="text" name="mult" value="1.0"></label></p>
<p><button type="submit">Estimate</button></p>
</form>
"#;

/// Minimal HTML escaping for interpolated text
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UnresolvedNutrients, NO_NUTRIENTS_DETAIL};

    fn ctx() -> PageContext {
        PageContext {
            labels_count: 2,
            nutrients_loaded: false,
            inference: None,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"fish & chips\"</b>"), "&lt;b&gt;&quot;fish &amp; chips&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_status_page_reports_readiness() {
        let html = status_page(&ctx(), None);
        assert!(html.contains("Labels loaded: 2"));
        assert!(html.contains("unavailable"));
        assert!(html.contains("enctype=\"multipart/form-data\""));
        assert!(!html.contains("<h2>Prediction</h2>"));
    }

    #[test]
    fn test_status_page_embeds_escaped_label() {
        let outcome = PredictionOutcome::NoNutrients(UnresolvedNutrients {
            label: "<script>".to_string(),
            confidence: 0.42,
            detail: NO_NUTRIENTS_DETAIL.to_string(),
        });
        let html = status_page(&ctx(), Some(&outcome));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("42.0%"));
        assert!(html.contains(NO_NUTRIENTS_DETAIL));
    }
}
