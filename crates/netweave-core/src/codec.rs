//! Line-oriented weathermap config reader/writer.
//!
//! The grammar is deliberately loose: a non-indented `<COMMAND> <params>`
//! line introduces an object, indented `<ATTR> <value>` lines attach
//! attributes to the most recent object, and anything else is skipped. A
//! reparse of dumped output yields an equivalent document, but byte-for-byte
//! round-tripping is not a goal: the dump is canonical (sections in fixed
//! order, keys sorted).

use crate::document::{Attr, AttrBlock, Document, Section, SectionKind};
use crate::error::{Error, Result};
use regex::Regex;
use std::path::Path;

fn line_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<indent>\s*)(?P<command>[A-Z0-9]+)\s(?P<parameters>.*)$")
            .expect("valid regex")
    })
}

/// Reads a template document. A missing file is not an error: generation
/// then starts from an empty document.
pub fn load(path: &Path) -> Result<Document> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no template, starting from an empty document");
            return Ok(Document::new());
        }
        Err(source) => {
            return Err(Error::TemplateRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(parse(&text))
}

/// Parses document text. Malformed lines are skipped, never fatal.
pub fn parse(text: &str) -> Document {
    let mut doc = Document::new();
    let mut current: Option<(SectionKind, String)> = None;

    for line in text.lines() {
        let Some(caps) = line_regex().captures(line) else {
            continue;
        };
        let command = &caps["command"];
        let parameters = caps["parameters"].trim();

        if caps["indent"].is_empty() {
            let kind = match command {
                "NODE" => SectionKind::Nodes,
                "LINK" => SectionKind::Links,
                _ => SectionKind::Globals,
            };
            let key = format!("{command} {parameters}");
            doc.section_mut(kind).entry(&key);
            current = Some((kind, key));
        } else if let Some((kind, key)) = &current {
            doc.section_mut(*kind).entry(key).set_scalar(command, parameters);
        }
        // An indented line before any object has nothing to attach to.
    }

    doc
}

/// Serializes the document in canonical form: GLOBALS, NODES, LINKS, each
/// section's objects sorted by key, attributes sorted within each block,
/// nested blocks indented four spaces per level.
pub fn dump(doc: &Document) -> String {
    let mut out = String::new();
    render_section(&mut out, &doc.globals);
    render_section(&mut out, &doc.nodes);
    render_section(&mut out, &doc.links);
    out
}

fn render_section(out: &mut String, section: &Section) {
    let mut keys: Vec<&String> = section.keys().collect();
    keys.sort();
    for key in keys {
        let Some(block) = section.get(key) else {
            continue;
        };
        out.push_str(key);
        out.push('\n');
        if !block.is_empty() {
            render_block(out, block, 1);
            out.push('\n');
        }
    }
}

fn render_block(out: &mut String, block: &AttrBlock, depth: usize) {
    let mut entries: Vec<(&String, &Attr)> = block.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let indent = "    ".repeat(depth);
    for (name, attr) in entries {
        out.push_str(&indent);
        out.push_str(name);
        match attr {
            Attr::Block(child) if !child.is_empty() => {
                out.push('\n');
                render_block(out, child, depth + 1);
            }
            Attr::Scalar(value) if !value.is_empty() => {
                out.push(' ');
                out.push_str(value);
                out.push('\n');
            }
            _ => out.push('\n'),
        }
    }
}
