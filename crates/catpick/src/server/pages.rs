//! HTML pages served by `catpick serve`.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use minijinja::{Environment, context};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::app::concat::FileData;

/// Data shown on the plain and v2 result pages.
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub content: String,
    pub selected_files: Vec<String>,
    pub include_line_numbers: bool,
}

/// Template registry. Names end in `.html` so minijinja escapes interpolated values.
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        for (name, source) in [
            ("layout.html", LAYOUT_TEMPLATE),
            ("index.html", INDEX_TEMPLATE),
            ("result.html", RESULT_TEMPLATE),
            ("result_ai.html", RESULT_AI_TEMPLATE),
            ("result_v2.html", RESULT_V2_TEMPLATE),
        ] {
            env.add_template(name, source)
                .map_err(|err| anyhow!("failed to register template '{name}': {err}"))?;
        }
        Ok(Self { env })
    }

    /// The picker page, optionally carrying an error banner.
    pub fn index(&self, base_dir: &Path, error: Option<&str>) -> Result<String> {
        self.render(
            "index.html",
            context! {
                base_dir => base_dir.display().to_string(),
                error => error,
            },
        )
    }

    pub fn result(&self, view: &ResultView) -> Result<String> {
        self.render(
            "result.html",
            context! { view => view, generated_at => generated_at()? },
        )
    }

    pub fn result_v2(&self, view: &ResultView) -> Result<String> {
        self.render(
            "result_v2.html",
            context! { view => view, generated_at => generated_at()? },
        )
    }

    pub fn result_ai(&self, files: &[FileData]) -> Result<String> {
        self.render("result_ai.html", context! { files => files })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|err| anyhow!("failed to render template '{name}': {err}"))
    }
}

fn generated_at() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format page timestamp")
}

const LAYOUT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{% block title %}catpick{% endblock %}</title>
</head>
<body>
{% block body %}{% endblock %}
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"{% extends "layout.html" %}
{% block title %}catpick: select files{% endblock %}
{% block body %}
<h1>Select files to concatenate</h1>
{% if error %}
<p class="error" id="error">{{ error }}</p>
{% endif %}
<form id="base-dir-form" action="/update_base_dir" method="post">
  <label for="new_base_dir">Base directory</label>
  <input type="text" id="new_base_dir" name="new_base_dir" value="{{ base_dir }}">
  <button type="submit">Update</button>
</form>
<div class="controls">
  <button type="button" id="select-all">Select all</button>
  <button type="button" id="deselect-all">Deselect all</button>
  <label><input type="checkbox" id="include-line-numbers" name="include_line_numbers"> Include line numbers</label>
</div>
<div id="file-explorer"></div>
<div class="actions">
  <button type="button" id="concatenate">Concatenate</button>
  <button type="button" id="concat-with-ai">Concatenate with AI</button>
  <button type="button" id="concatenate-v2">Concatenate (v2)</button>
</div>
{% endblock %}
"#;

const RESULT_TEMPLATE: &str = r#"{% extends "layout.html" %}
{% block title %}catpick: result{% endblock %}
{% block body %}
<h1>Concatenated files</h1>
<p class="meta">Generated at {{ generated_at }}{% if view.include_line_numbers %}, with line numbers{% endif %}.</p>
<ul class="selected-files">
{% for file in view.selected_files %}
  <li>{{ file }}</li>
{% endfor %}
</ul>
<pre id="content">{{ view.content }}</pre>
<p><a href="/">Back</a></p>
{% endblock %}
"#;

const RESULT_V2_TEMPLATE: &str = r#"{% extends "layout.html" %}
{% block title %}catpick: result (v2){% endblock %}
{% block body %}
<h1>Concatenated files (v2)</h1>
<p class="meta">{{ view.selected_files | length }} file(s), generated at {{ generated_at }}.</p>
<textarea id="content" readonly rows="30" cols="120">{{ view.content }}</textarea>
<p><a href="/">Back</a></p>
{% endblock %}
"#;

const RESULT_AI_TEMPLATE: &str = r#"{% extends "layout.html" %}
{% block title %}catpick: AI bundle{% endblock %}
{% block body %}
<h1>Files for AI processing</h1>
{% for file in files %}
<section class="file">
<h2>{{ file.name }}</h2>
<pre>{{ file.contents }}</pre>
</section>
{% endfor %}
<p><a href="/">Back</a></p>
{% endblock %}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_escapes_error_and_exposes_anchors() {
        let pages = Pages::new().unwrap();
        let html = pages
            .index(Path::new("/srv/app"), Some("File not found: <b>.txt"))
            .unwrap();

        assert!(html.contains(r#"id="file-explorer""#));
        assert!(html.contains(r#"id="include-line-numbers""#));
        assert!(html.contains("File not found: &lt;b&gt;.txt"));
        assert!(html.contains(r#"value="&#x2f;srv&#x2f;app""#));
    }

    #[test]
    fn result_lists_selected_files() {
        let pages = Pages::new().unwrap();
        let html = pages
            .result(&ResultView {
                content: "--- a.rs ---\nfn a() {}\n\n\n".into(),
                selected_files: vec!["a.rs".into()],
                include_line_numbers: true,
            })
            .unwrap();

        assert!(html.contains("<li>a.rs</li>"));
        assert!(html.contains("with line numbers"));
        assert!(html.contains("--- a.rs ---"));
    }

    #[test]
    fn ai_result_shows_each_file() {
        let pages = Pages::new().unwrap();
        let html = pages
            .result_ai(&[
                FileData {
                    name: "a.rs".into(),
                    contents: "one".into(),
                },
                FileData {
                    name: "b.rs".into(),
                    contents: "two".into(),
                },
            ])
            .unwrap();

        assert!(html.contains("<h2>a.rs</h2>"));
        assert!(html.contains("<pre>two</pre>"));
    }
}
