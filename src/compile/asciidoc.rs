//! AsciiDoc-to-HTML compiler.
//!
//! Covers the document subset served as site pages: `=` section titles,
//! `*` bulleted lists, `----` listing blocks and paragraphs, with strong,
//! emphasis and inline-code markup.

use std::path::Path;

use crate::compile::markdown::{escape_html, surround};
use crate::compile::registry::{CompileError, Compiler};

pub struct AsciidocCompiler;

impl Compiler for AsciidocCompiler {
    fn compile(&self, _path: &Path, source: &str) -> Result<String, CompileError> {
        Ok(render(source))
    }

    fn output_extension(&self) -> &'static str {
        "html"
    }
}

fn render(source: &str) -> String {
    let mut out = String::new();
    let mut paragraph = String::new();
    let mut in_list = false;
    let mut in_listing = false;

    for raw_line in source.lines() {
        let line = raw_line.trim_end();
        let trimmed = line.trim();

        if trimmed == "----" {
            flush(&mut out, &mut paragraph, &mut in_list);
            if in_listing {
                out.push_str("</code></pre>\n");
            } else {
                out.push_str("<pre><code>");
            }
            in_listing = !in_listing;
            continue;
        }

        if in_listing {
            out.push_str(&escape_html(line));
            out.push('\n');
            continue;
        }

        if trimmed.is_empty() {
            flush(&mut out, &mut paragraph, &mut in_list);
            continue;
        }

        if let Some((level, text)) = title(trimmed) {
            flush(&mut out, &mut paragraph, &mut in_list);
            out.push_str(&format!("<h{level}>{}</h{level}>\n", inline(text)));
            continue;
        }

        if let Some(item) = trimmed.strip_prefix("* ") {
            flush_paragraph(&mut out, &mut paragraph);
            if !in_list {
                out.push_str("<ul>\n");
                in_list = true;
            }
            out.push_str(&format!("<li>{}</li>\n", inline(item)));
            continue;
        }

        if in_list {
            out.push_str("</ul>\n");
            in_list = false;
        }
        if !paragraph.is_empty() {
            paragraph.push(' ');
        }
        paragraph.push_str(trimmed);
    }

    if in_listing {
        out.push_str("</code></pre>\n");
    }
    flush(&mut out, &mut paragraph, &mut in_list);
    out
}

fn flush(out: &mut String, paragraph: &mut String, in_list: &mut bool) {
    flush_paragraph(out, paragraph);
    if *in_list {
        out.push_str("</ul>\n");
        *in_list = false;
    }
}

fn flush_paragraph(out: &mut String, paragraph: &mut String) {
    if !paragraph.is_empty() {
        out.push_str(&format!("<p>{}</p>\n", inline(paragraph)));
        paragraph.clear();
    }
}

/// Section titles use `=` markers, one per level.
fn title(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '=').count();
    if (1..=6).contains(&level) {
        line.get(level..)?.strip_prefix(' ').map(|text| (level, text))
    } else {
        None
    }
}

fn inline(text: &str) -> String {
    let html = escape_html(text);
    let html = surround(&html, "*", "<strong>", "</strong>");
    let html = surround(&html, "_", "<em>", "</em>");
    surround(&html, "`", "<code>", "</code>")
}
