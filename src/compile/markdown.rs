//! Markdown-to-HTML compiler.
//!
//! Deliberately small and deterministic: ATX headings, paragraphs, fenced
//! code blocks, unordered lists, strong/emphasis, inline code and links.
//! Each block-level element is emitted on its own line.

use std::path::Path;

use crate::compile::registry::{CompileError, Compiler};

pub struct MarkdownCompiler;

impl Compiler for MarkdownCompiler {
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
    let mut in_code = false;

    for raw_line in source.lines() {
        let line = raw_line.trim_end();
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            flush(&mut out, &mut paragraph, &mut in_list);
            if in_code {
                out.push_str("</code></pre>\n");
            } else {
                out.push_str("<pre><code>");
            }
            in_code = !in_code;
            continue;
        }

        if in_code {
            out.push_str(&escape_html(line));
            out.push('\n');
            continue;
        }

        if trimmed.is_empty() {
            flush(&mut out, &mut paragraph, &mut in_list);
            continue;
        }

        if let Some((level, text)) = heading(trimmed) {
            flush(&mut out, &mut paragraph, &mut in_list);
            out.push_str(&format!("<h{level}>{}</h{level}>\n", inline(text)));
            continue;
        }

        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
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

    if in_code {
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

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&level) {
        line.get(level..)?.strip_prefix(' ').map(|text| (level, text))
    } else {
        None
    }
}

fn inline(text: &str) -> String {
    let html = escape_html(text);
    let html = links(&html);
    let html = surround(&html, "**", "<strong>", "</strong>");
    let html = surround(&html, "*", "<em>", "</em>");
    surround(&html, "`", "<code>", "</code>")
}

/// Replaces balanced pairs of `marker` with an open/close tag pair.
pub(super) fn surround(text: &str, marker: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(marker) {
        let after = start + marker.len();
        let Some(len) = rest.get(after..).and_then(|tail| tail.find(marker)) else {
            break;
        };
        out.push_str(rest.get(..start).unwrap_or_default());
        out.push_str(open);
        out.push_str(rest.get(after..after + len).unwrap_or_default());
        out.push_str(close);
        rest = rest.get(after + len + marker.len()..).unwrap_or_default();
    }
    out.push_str(rest);
    out
}

/// Rewrites `[text](url)` into an anchor.
fn links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('[') {
        let Some((label, after_label)) = rest
            .get(start + 1..)
            .and_then(|tail| tail.split_once(']'))
        else {
            break;
        };
        let Some((url, tail)) = after_label
            .strip_prefix('(')
            .and_then(|t| t.split_once(')'))
        else {
            break;
        };
        out.push_str(rest.get(..start).unwrap_or_default());
        out.push_str(&format!("<a href=\"{url}\">{label}</a>"));
        rest = tail;
    }
    out.push_str(rest);
    out
}

pub(super) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> String {
        MarkdownCompiler
            .compile(Path::new("doc.md"), source)
            .unwrap()
    }

    #[test]
    fn paragraph() {
        assert_eq!(compile("Hello"), "<p>Hello</p>\n");
    }

    #[test]
    fn headings() {
        assert_eq!(compile("# Title"), "<h1>Title</h1>\n");
        assert_eq!(compile("### Sub"), "<h3>Sub</h3>\n");
    }

    #[test]
    fn multi_line_paragraphs_join_with_spaces() {
        assert_eq!(
            compile("first line\nsecond line\n\nnext"),
            "<p>first line second line</p>\n<p>next</p>\n"
        );
    }

    #[test]
    fn unordered_list() {
        assert_eq!(
            compile("- one\n- two"),
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n"
        );
    }

    #[test]
    fn inline_markup() {
        assert_eq!(
            compile("a **bold** and *soft* `code`"),
            "<p>a <strong>bold</strong> and <em>soft</em> <code>code</code></p>\n"
        );
    }

    #[test]
    fn link() {
        assert_eq!(
            compile("see [docs](/help.md)"),
            "<p>see <a href=\"/help.md\">docs</a></p>\n"
        );
    }

    #[test]
    fn fenced_code_is_escaped_verbatim() {
        assert_eq!(
            compile("```\nif a < b\n```"),
            "<pre><code>if a &lt; b\n</code></pre>\n"
        );
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(compile("<script>"), "<p>&lt;script&gt;</p>\n");
    }
}
