//! Compiles a small CoffeeScript-style assignment dialect to JavaScript.
//!
//! Supported input is a sequence of `name = value` statements (values are
//! numeric, string, boolean or identifier literals) plus `#` comments.
//! Output matches the canonical coffee emitter for that subset: one `var`
//! declaration listing every assigned name, then the assignments.
//! `.litcoffee` sources are literate: only indented lines are code.

use std::path::Path;

use crate::compile::registry::{CompileError, Compiler};

pub struct CoffeeCompiler;

impl Compiler for CoffeeCompiler {
    fn compile(&self, path: &Path, source: &str) -> Result<String, CompileError> {
        let literate = path.to_string_lossy().ends_with(".litcoffee");

        let mut names: Vec<String> = Vec::new();
        let mut statements: Vec<(String, String)> = Vec::new();

        for (index, raw_line) in source.lines().enumerate() {
            let line = if literate {
                match literate_code_line(raw_line) {
                    Some(code) => code,
                    None => continue,
                }
            } else {
                raw_line
            };

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (name, value) = parse_assignment(line).ok_or_else(|| {
                CompileError::source(
                    path,
                    format!("line {}: expected `name = value`, found `{line}`", index + 1),
                )
            })?;

            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
            statements.push((name.to_string(), value.to_string()));
        }

        if statements.is_empty() {
            return Ok("\n".to_string());
        }

        let mut out = format!("var {};\n", names.join(", "));
        for (name, value) in &statements {
            out.push_str(&format!("\n{name} = {value};\n"));
        }
        Ok(out)
    }

    fn output_extension(&self) -> &'static str {
        "js"
    }
}

/// In literate mode only lines indented by four spaces or a tab are code.
fn literate_code_line(line: &str) -> Option<&str> {
    line.strip_prefix("    ").or_else(|| line.strip_prefix('\t'))
}

fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once('=')?;
    let name = name.trim_end();
    let value = value.trim_start();
    // `==` is a comparison, not an assignment
    if value.starts_with('=') || !is_identifier(name) || !is_literal(value) {
        return None;
    }
    Some((name, value))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn is_literal(text: &str) -> bool {
    if matches!(text, "true" | "false" | "null") || is_identifier(text) {
        return true;
    }
    if is_number(text) {
        return true;
    }
    is_quoted(text, '\'') || is_quoted(text, '"')
}

fn is_number(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    !unsigned.is_empty()
        && unsigned.chars().all(|c| c.is_ascii_digit() || c == '.')
        && unsigned.chars().filter(|&c| c == '.').count() <= 1
}

fn is_quoted(text: &str, quote: char) -> bool {
    text.len() >= 2
        && text.starts_with(quote)
        && text.ends_with(quote)
        && text
            .get(1..text.len() - 1)
            .is_some_and(|inner| !inner.contains(quote))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(name: &str, source: &str) -> Result<String, CompileError> {
        CoffeeCompiler.compile(Path::new(name), source)
    }

    #[test]
    fn empty() {
        assert_eq!(compile("empty.coffee", "").unwrap(), "\n");
    }

    #[test]
    fn comments_only() {
        assert_eq!(compile("doc.coffee", "# just a comment\n").unwrap(), "\n");
    }

    #[test]
    fn to_javascript() {
        let js = compile("file.coffee", "life=42").unwrap();

        assert_eq!(js, "var life;\n\nlife = 42;\n");
    }

    #[test]
    fn multiple_assignments_share_one_declaration() {
        let js = compile("file.coffee", "a = 1\nb = 'two'\na = 3").unwrap();

        assert_eq!(js, "var a, b;\n\na = 1;\n\nb = 'two';\n\na = 3;\n");
    }

    #[test]
    fn invalid_script() {
        let err = compile("invalid.coffee", "===").unwrap_err();

        assert!(err.to_string().contains("unable to compile"));
        assert!(err.to_string().contains("invalid.coffee"));
    }

    #[test]
    fn literate_ignores_prose() {
        let source = "Some prose explaining the script.\n\n    life = 42\n";
        let js = compile("file.litcoffee", source).unwrap();

        assert_eq!(js, "var life;\n\nlife = 42;\n");
    }
}
