/// Template rendering for the demo pages.
///
/// All pages share `server/assets/demo.html`, which carries `{{TOKEN}}`
/// placeholders. Navigation state and the model banner are filled here; each
/// handler fills its own page body through the `fill` closure.

const TEMPLATE: &str = include_str!("assets/demo.html");

/// Which page is active; drives the highlighted nav link.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Page {
    Admin,
    Upload,
    Logs,
    Stats,
}

impl Page {
    const ALL: [Page; 4] = [Page::Admin, Page::Upload, Page::Logs, Page::Stats];

    fn nav_token(self) -> &'static str {
        match self {
            Page::Admin  => "{{NAV_ADMIN}}",
            Page::Upload => "{{NAV_UPLOAD}}",
            Page::Logs   => "{{NAV_LOGS}}",
            Page::Stats  => "{{NAV_STATS}}",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Page::Admin  => "Admin",
            Page::Upload => "Classify a leaf",
            Page::Logs   => "Prediction log",
            Page::Stats  => "Statistics",
        }
    }
}

pub fn render_page<F>(page: Page, model_summary: &str, fill: F) -> String
where
    F: FnOnce(String) -> String,
{
    let mut html = TEMPLATE.to_owned();

    for p in Page::ALL {
        html = html.replace(p.nav_token(), if p == page { "active" } else { "" });
    }
    html = html.replace("{{TITLE}}", page.title());
    html = html.replace("{{MODEL_SUMMARY}}", &html_escape(model_summary));

    html = fill(html);
    blank_remaining(html)
}

/// Drops any `{{TOKEN}}` the page did not fill.
fn blank_remaining(mut html: String) -> String {
    while let Some(start) = html.find("{{") {
        match html[start..].find("}}") {
            Some(end) => html.replace_range(start..start + end + 2, ""),
            None => break,
        }
    }
    html
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
     .replace('<', "&lt;")
     .replace('>', "&gt;")
     .replace('"', "&quot;")
}

/// Inline notice box; `kind` is `error` or `info`.
pub fn flash(kind: &str, message: &str) -> String {
    format!(r#"<div class="flash flash-{}">{}</div>"#, kind, html_escape(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_page_is_highlighted_and_tokens_are_cleared() {
        let html = render_page(Page::Logs, "GaussianNB(4 classes, 4 features)", |t| t);
        assert!(html.contains("GaussianNB(4 classes, 4 features)"));
        assert!(html.contains(r#"class="active" href="/demo/logs""#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(html_escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
        assert!(flash("error", "<b>").contains("&lt;b&gt;"));
    }
}
