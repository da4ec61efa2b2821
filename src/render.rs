use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::chapter::ChapterRecord;
use crate::cli::RenderArgs;
use crate::config::Config;
use crate::store::RecordStore;

pub const NEW_HEADING: &str = "New Chapters";
pub const ALL_HEADING: &str = "All Chapters";
const LINK_LABEL: &str = "Read";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    New,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub date: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub heading: String,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<!doctype html>\n");
        out.push_str("<html>\n");
        out.push_str("<head>\n");
        out.push_str("  <meta charset=\"utf-8\" />\n");
        out.push_str(&format!("  <title>{}</title>\n", html_escape(&self.title)));
        out.push_str("  <style>\n");
        out.push_str(STYLE_CSS);
        out.push_str("  </style>\n");
        out.push_str("</head>\n");
        out.push_str("<body>\n");
        out.push_str(&format!("  <h1>{}</h1>\n", html_escape(&self.title)));
        for section in &self.sections {
            render_section(&mut out, section);
        }
        out.push_str("</body>\n");
        out.push_str("</html>\n");
        out
    }
}

/// Builds the page model. Records keep the caller's order within each group;
/// the "new" section is left out when nothing is new.
pub fn render(records: &[ChapterRecord], page_title: &str) -> Document {
    let (new, all): (Vec<&ChapterRecord>, Vec<&ChapterRecord>) =
        records.iter().partition(|record| record.is_new);

    let mut sections = Vec::with_capacity(2);
    if !new.is_empty() {
        sections.push(Section {
            kind: SectionKind::New,
            heading: NEW_HEADING.to_owned(),
            entries: new.into_iter().map(entry).collect(),
        });
    }
    sections.push(Section {
        kind: SectionKind::All,
        heading: ALL_HEADING.to_owned(),
        entries: all.into_iter().map(entry).collect(),
    });

    Document {
        title: page_title.to_owned(),
        sections,
    }
}

/// Re-renders the page from the stored snapshot without fetching.
pub fn run(config: &Config, args: RenderArgs) -> anyhow::Result<()> {
    let out_path = args
        .out
        .map(PathBuf::from)
        .unwrap_or_else(|| config.html_path.clone());

    let records = RecordStore::new(&config.snapshot_path)
        .load()
        .context("load snapshot")?;
    let document = render(&records, &config.page_title);
    write_html(&out_path, &document)?;
    tracing::info!(path = %out_path.display(), chapters = records.len(), "rendered page");
    Ok(())
}

pub fn write_html(path: &Path, document: &Document) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create html parent dir: {}", parent.display()))?;
    }
    std::fs::write(path, document.to_html())
        .with_context(|| format!("write html: {}", path.display()))
}

fn entry(record: &ChapterRecord) -> Entry {
    Entry {
        title: record.title.clone(),
        date: record.date.to_string(),
        link: record.link.clone(),
    }
}

fn render_section(out: &mut String, section: &Section) {
    let indent = match section.kind {
        SectionKind::New => {
            out.push_str("  <div class=\"new-section\">\n");
            "    "
        }
        SectionKind::All => "  ",
    };

    out.push_str(&format!("{indent}<h2>{}</h2>\n", html_escape(&section.heading)));
    out.push_str(&format!("{indent}<ul>\n"));
    for entry in &section.entries {
        out.push_str(&format!(
            "{indent}  <li>{} <span class=\"date\">– {}</span>",
            html_escape(&entry.title),
            html_escape(&entry.date)
        ));
        if let Some(link) = entry.link.as_deref() {
            out.push_str(&format!(
                " - <a href=\"{}\" target=\"_blank\" rel=\"noopener\">{LINK_LABEL}</a>",
                html_escape(link)
            ));
        }
        out.push_str("</li>\n");
    }
    out.push_str(&format!("{indent}</ul>\n"));

    if section.kind == SectionKind::New {
        out.push_str("  </div>\n");
    }
}

const STYLE_CSS: &str = r#"    body { font-family: Arial, sans-serif; background-color: #1e1e2f; color: #f0f0f0; margin: 20px; }
    h1 { color: #ff4757; }
    h2 { color: #ffa502; margin-top: 30px; }
    ul { list-style-type: none; padding: 0; }
    li { background-color: #2f3542; margin: 5px 0; padding: 10px; border-radius: 8px; transition: background 0.3s; }
    li:hover { background-color: #57606f; }
    a { color: #70a1ff; text-decoration: none; }
    a:hover { text-decoration: underline; }
    .date { color: #ffa502; margin-left: 10px; }
    .new-section { border: 2px solid #ff4757; padding: 10px; border-radius: 10px; background-color: #2f3542; }
"#;

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
