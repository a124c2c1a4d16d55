//! Sample resume and theme for testing and demonstration.
//!
//! [`write_sample_theme`] lays out a small but complete theme folder: an
//! HTML format with a transformed page, a copied stylesheet and a symlink,
//! plus plain-text and Markdown formats.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::theme::MANIFEST_FILE;

/// A short resume touching the fields the sample theme reads.
pub fn sample_resume() -> &'static str {
    r##"{
  "name": "Ada Lovelace",
  "contact": {
    "email": "ada@example.com",
    "website": "https://example.com/ada"
  },
  "info": {
    "label": "Analyst & Programmer",
    "brief": "Wrote the *first* published algorithm."
  },
  "employment": {
    "history": [
      {
        "employer": "Analytical Engine Project",
        "position": "Collaborator",
        "start": "1842",
        "end": "1843",
        "summary": "Translated and annotated Menabrea's paper."
      }
    ]
  },
  "skills": {
    "list": [
      { "name": "Mathematics" },
      { "name": "Notes & Diagrams" }
    ]
  }
}
"##
}

fn sample_manifest() -> &'static str {
    r##"{
  "name": "sample",
  "engine": "underscore",
  "formats": {
    "html": {
      "files": [
        { "path": "index.html", "action": "transform", "source": "src/index.html", "css": "src/style.css" },
        { "path": "css/style.css", "action": "copy", "source": "src/style.css" },
        { "path": "notes.txt", "action": "none" }
      ],
      "symLinks": { "assets": "css" }
    },
    "txt": {
      "files": [
        { "path": "resume.txt", "action": "transform", "source": "src/resume.txt" }
      ]
    },
    "md": {
      "files": [
        { "path": "resume.md", "action": "transform", "source": "src/resume.md" }
      ]
    }
  }
}
"##
}

fn sample_html() -> &'static str {
    r##"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{= r.name }}</title>
<style>{{ css.data }}</style>
</head>
<body>
<h1>{{= r.name }}</h1>
<p class="label">{{= r.info.label }}</p>
<p>{{ r.info.brief|mdin }}</p>
<p>{{ r.contact.email|link("mailto:" ~ r.contact.email) }}</p>
<h2>Employment</h2>
{% for job in r.employment.history %}
<div class="job"><h3>{{= job.position }}, {{= job.employer }}</h3>
<p>{{= job.start }} - {{= job.end }}</p>
<p>{{= job.summary }}</p></div>
{% endfor %}
<h2>Skills</h2>
<ul>
{% for s in r.skills.list %}
<li>{{= s.name }}</li>
{% endfor %}
</ul>
</body>
</html>
"##
}

fn sample_css() -> &'static str {
    "body { font-family: Georgia, serif; }\nh1 { margin-bottom: 0; }\n"
}

fn sample_text() -> &'static str {
    r##"{{ r.name }}
{{ r.info.label }}

EMPLOYMENT
{% for job in r.employment.history %}
{{ job.position }}, {{ job.employer }} ({{ job.start }}-{{ job.end }})
{% endfor %}

SKILLS
{% for s in r.skills.list %}
- {{ s.name }}
{% endfor %}
"##
}

fn sample_markdown() -> &'static str {
    r##"# {{ r.name }}

_{{ r.info.label }}_

{{ r.info.brief }}

## Employment
{% for job in r.employment.history %}
- **{{ job.position }}**, {{ job.employer }}
{% endfor %}
"##
}

/// Write the sample theme into `dir/<name>` and return the theme folder.
pub fn write_sample_theme(dir: &Path, name: &str) -> io::Result<PathBuf> {
    let folder = dir.join(name);
    let files = [
        (MANIFEST_FILE, sample_manifest()),
        ("src/index.html", sample_html()),
        ("src/style.css", sample_css()),
        ("src/resume.txt", sample_text()),
        ("src/resume.md", sample_markdown()),
    ];
    for (rel, body) in files {
        let path = folder.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, body)?;
    }
    Ok(folder)
}
