/// HTML rendering for the upload pages.
///
/// Both services share one template (`assets/index.html`) with `{{TOKEN}}`
/// placeholders. The renderer is a pure function of the page kind and the
/// optional outcome; it never feeds anything back into recognition.
use crate::routing::response::UnifiedResponse;
use crate::script::Script;

const TEMPLATE: &str = include_str!("assets/index.html");

/// Which service the page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// A single-script backend; the form posts that script's field name.
    Backend(Script),
    /// The router; the form carries a script selector.
    Router,
}

pub fn render_page(page: Page, outcome: Option<&UnifiedResponse>) -> String {
    let (title, subtitle, field, select) = match page {
        Page::Backend(script) => (
            format!("{} digit recognition", script.display_name()),
            format!("Upload an image of {} digits written left to right.", script.display_name().to_lowercase()),
            script.field_name(),
            String::new(),
        ),
        Page::Router => (
            "Digit recognition".to_owned(),
            "Choose a numeral script and upload an image of digits written left to right.".to_owned(),
            "image",
            script_select(),
        ),
    };

    let html = TEMPLATE
        .replace("{{TITLE}}", &html_escape(&title))
        .replace("{{SUBTITLE}}", &html_escape(&subtitle))
        .replace("{{FORM_ACTION}}", "/predict")
        .replace("{{FILE_FIELD}}", field)
        .replace("{{SCRIPT_SELECT}}", &select)
        .replace("{{RESULT}}", &outcome.map(result_html).unwrap_or_default());

    blank_remaining(html)
}

fn script_select() -> String {
    let options: String = Script::ALL
        .iter()
        .map(|s| format!("<option value=\"{}\">{}</option>", s.as_str(), s.display_name()))
        .collect();
    format!(
        r#"<label for="model_type">Script</label>
    <select id="model_type" name="model_type">{}</select>"#,
        options
    )
}

fn result_html(outcome: &UnifiedResponse) -> String {
    match outcome {
        UnifiedResponse::Prediction(digits) => format!(
            r#"<div class="result-card"><h2>Prediction</h2><div class="prediction-hero">{}</div></div>"#,
            html_escape(digits)
        ),
        UnifiedResponse::Error(message) => format!(
            r#"<div class="result-card"><h2>Error</h2><div class="error-box">{}</div></div>"#,
            html_escape(message)
        ),
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}

/// Replaces any `{{UPPERCASE_TOKEN}}` that wasn't already substituted with an
/// empty string so a missed token never reaches the browser.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        if let Some(end) = html[start..].find("}}") {
            let abs_end = start + end + 2;
            html.replace_range(start..abs_end, "");
        } else {
            break;
        }
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_page_uses_script_field() {
        let html = render_page(Page::Backend(Script::Decimal), None);
        assert!(html.contains(r#"name="file""#));
        assert!(!html.contains("model_type"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn router_page_offers_both_scripts() {
        let html = render_page(Page::Router, None);
        assert!(html.contains(r#"<option value="decimal">"#));
        assert!(html.contains(r#"<option value="devanagari">"#));
        assert!(html.contains(r#"name="image""#));
    }

    #[test]
    fn outcomes_are_escaped() {
        let html = render_page(Page::Router, Some(&UnifiedResponse::Error("<b>bad</b>".into())));
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(!html.contains("prediction-hero\">"));

        let html = render_page(Page::Backend(Script::Devanagari), Some(&UnifiedResponse::Prediction("123".into())));
        assert!(html.contains(r#"<div class="prediction-hero">123</div>"#));
    }
}
