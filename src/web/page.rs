//! Server-rendered HTML pages for the web UI.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use pulldown_cmark_escape::escape_html as write_escaped;

use crate::domain::SessionRecord;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #fafafa; color: #222; }
header { padding: 1.5rem 2rem; border-bottom: 1px solid #ddd; background: #fff; }
header h1 { margin: 0; font-size: 1.6rem; }
header p { margin: 0.3rem 0 0; color: #666; }
main { display: grid; grid-template-columns: 1fr 2fr; gap: 2rem; padding: 2rem; }
section { background: #fff; border: 1px solid #e3e3e3; border-radius: 10px; padding: 1.2rem; }
input[type=text] { width: 100%; box-sizing: border-box; padding: 0.6rem; font-size: 1rem; }
button { margin-top: 0.8rem; padding: 0.6rem 1rem; font-size: 1rem; cursor: pointer; }
.status { background: #f0f2f6; border-radius: 10px; padding: 10px; }
.status li { margin: 0.2rem 0; }
.info { background: #e8f1fb; border-radius: 6px; padding: 0.7rem; }
.error { background: #fdecea; border-radius: 6px; padding: 0.7rem; }
.agent-tag { background: #2e7d32; color: white; padding: 2px 8px; border-radius: 5px; font-size: 0.8em; }
pre.topology { background: #e8f5e9; padding: 0.8rem; border-radius: 6px; }
"#;

const TOPOLOGY: &str = "\
Draft Producer ──draft──▶ Quality Gate
      ▲                        │
      └───── feedback loop ────┤
                               └──READY──▶ Final Output";

/// Escape text for inclusion in HTML bodies and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    match write_escaped(&mut out, text) {
        Ok(()) => out,
        Err(_) => String::new(),
    }
}

/// Schemes a rendered link or image may point at. Anything else becomes `#`.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Neutralise link targets with a disallowed scheme. Relative targets pass.
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    // Browsers ignore whitespace and control characters inside the scheme
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();

    let scheme = match cleaned.split_once(':') {
        Some((scheme, _)) if !scheme.contains(['/', '?', '#']) => scheme.to_ascii_lowercase(),
        _ => return url,
    };

    if ALLOWED_SCHEMES.contains(&scheme.as_str()) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Render Markdown to HTML. Raw HTML in the source is shown as text and
/// links or images with unsafe schemes are pointed at `#`.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Link {
                link_type,
                dest_url: safe_url(dest_url),
                title,
                id,
            }),
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => Event::Start(Tag::Image {
                link_type,
                dest_url: safe_url(dest_url),
                title,
                id,
            }),
            other => other,
        });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn layout(task: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Draftgate | Multi-Agent Orchestrator</title>
<style>{style}</style>
</head>
<body>
<header>
<h1>Self-Healing Multi-Agent System</h1>
<p>Draft, review, revise: a two-agent reflection loop</p>
</header>
<main>
<section>
<h2>Mission Control</h2>
<form method="post" action="/run">
<label for="task">Enterprise Goal:</label>
<input type="text" id="task" name="task" value="{task}" placeholder="e.g. Analyze 2026 cybersecurity risks for Fintech">
<button type="submit">Trigger Autonomous Workflow</button>
</form>
<details>
<summary>Agent Topology</summary>
<pre class="topology">{topology}</pre>
</details>
</section>
<section>
<h2>Agent Execution Environment</h2>
{body}
</section>
</main>
</body>
</html>
"#,
        style = STYLE,
        task = escape_html(task),
        topology = escape_html(TOPOLOGY),
        body = body,
    )
}

/// Landing page shown before anything has run
pub fn index_page() -> String {
    layout(
        "",
        r#"<p class="info">Awaiting task input to initialize multi-agent nodes...</p>"#,
    )
}

/// Page for a finished run. Both terminal states are presented as verified.
pub fn result_page(session: &SessionRecord) -> String {
    let log_items: String = session
        .log
        .iter()
        .map(|entry| format!("<li>{}</li>\n", escape_html(entry)))
        .collect();

    let body = format!(
        r#"<div class="status">
<p><span class="agent-tag">Workflow Verified &amp; Complete!</span></p>
<ul>
{log_items}</ul>
</div>
<article data-state="{state}">
<h3>Final Verified Report</h3>
<p class="info">Report verified after {iterations} iteration(s).</p>
<div class="report">
{report}
</div>
<form method="post" action="/export">
<input type="hidden" name="report" value="{raw}">
<button type="submit">Export Verified Intelligence</button>
</form>
</article>"#,
        log_items = log_items,
        state = session.state,
        iterations = session.iteration_count,
        report = render_markdown(&session.draft),
        raw = escape_html(&session.draft),
    );

    layout(&session.task, &body)
}

/// Page for a run aborted by a collaborator failure
pub fn error_page(task: &str, message: &str) -> String {
    let body = format!(
        r#"<p class="error"><strong>Workflow failed.</strong> {}</p>"#,
        escape_html(message)
    );
    layout(task, &body)
}
