//! Less-to-CSS compiler, plus the source-map endpoint for its output.
//!
//! Supports the variable subset of Less: `@name: value;` declarations are
//! collected (eagerly, so a value may reference earlier variables) and
//! substituted into the remaining stylesheet, which otherwise passes through
//! verbatim. A reference to an undeclared variable fails the compile instead
//! of reaching the browser as literal text.

use std::path::Path;

use crate::compile::registry::{CompileError, Compiler};

/// CSS at-rule keywords that are legitimate `@` tokens in the output.
const AT_RULES: &[&str] = &[
    "charset",
    "font-face",
    "import",
    "keyframes",
    "media",
    "page",
    "supports",
];

pub struct LessCompiler;

impl Compiler for LessCompiler {
    fn compile(&self, path: &Path, source: &str) -> Result<String, CompileError> {
        let mut variables: Vec<(String, String)> = Vec::new();
        let mut out = String::new();

        for line in source.lines() {
            if let Some((name, value)) = parse_declaration(line) {
                let resolved = substitute(value, &variables);
                if let Some(entry) = variables.iter_mut().find(|(n, _)| n == name) {
                    entry.1 = resolved;
                } else {
                    variables.push((name.to_string(), resolved));
                }
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }

        let css = substitute(&out, &variables);
        check_unresolved(path, &css)?;
        Ok(css)
    }

    fn output_extension(&self) -> &'static str {
        "css"
    }
}

/// Source map endpoint for a compiled stylesheet: `style.css.map` describes
/// how `style.css` was produced from `style.less`.
pub struct LessSourceMapCompiler;

impl Compiler for LessSourceMapCompiler {
    fn compile(&self, path: &Path, source: &str) -> Result<String, CompileError> {
        // the map is only served for a stylesheet that actually compiles
        LessCompiler.compile(path, source)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.strip_suffix(".css.map").unwrap_or(&name);
        let map = serde_json::json!({
            "version": 3,
            "file": format!("{stem}.css"),
            "sources": [format!("{stem}.less")],
            "mappings": "",
        });
        serde_json::to_string(&map).map_err(|e| CompileError::source(path, e.to_string()))
    }

    fn output_extension(&self) -> &'static str {
        "map"
    }
}

/// A variable declaration: `@name: value;` with an identifier name. At-rules
/// (`@media`, `@import url(...)`) never parse as one.
fn parse_declaration(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim().strip_prefix('@')?;
    let (name, value) = rest.split_once(':')?;
    if name.is_empty() || !name.chars().all(is_identifier_char) {
        return None;
    }
    let value = value.trim().strip_suffix(';')?;
    Some((name, value.trim()))
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Replaces `@name` references, longest name first so `@color` never
/// clobbers a `@color-dark` reference.
fn substitute(text: &str, variables: &[(String, String)]) -> String {
    let mut ordered: Vec<&(String, String)> = variables.iter().collect();
    ordered.sort_by_key(|(name, _)| core::cmp::Reverse(name.len()));

    let mut out = text.to_string();
    for (name, value) in ordered {
        out = out.replace(&format!("@{name}"), value);
    }
    out
}

fn check_unresolved(path: &Path, css: &str) -> Result<(), CompileError> {
    let mut rest = css;
    while let Some(pos) = rest.find('@') {
        let tail = rest.get(pos + 1..).unwrap_or_default();
        let end = tail
            .find(|c: char| !is_identifier_char(c))
            .unwrap_or(tail.len());
        let ident = tail.get(..end).unwrap_or_default();
        if !ident.is_empty() && !AT_RULES.contains(&ident) {
            return Err(CompileError::source(
                path,
                format!("unknown variable @{ident}"),
            ));
        }
        rest = tail;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(name: &str, source: &str) -> Result<String, CompileError> {
        LessCompiler.compile(Path::new(name), source)
    }

    #[test]
    fn variables_are_substituted() {
        let css = compile("style.less", "@color: #336699;\na { color: @color; }\n").unwrap();

        assert_eq!(css, "a { color: #336699; }\n");
    }

    #[test]
    fn value_may_reference_an_earlier_variable() {
        let source = "@base: 4px;\n@pad: @base;\n.m { padding: @pad; }\n";

        assert_eq!(compile("style.less", source).unwrap(), ".m { padding: 4px; }\n");
    }

    #[test]
    fn longer_variable_names_are_not_clobbered() {
        let source = "@color: red;\n@color-dark: maroon;\na { color: @color-dark; }\n";

        assert_eq!(
            compile("style.less", source).unwrap(),
            "a { color: maroon; }\n"
        );
    }

    #[test]
    fn at_rules_pass_through() {
        let source = "@media screen {\n  a { color: red; }\n}\n";

        assert_eq!(compile("style.less", source).unwrap(), source);
    }

    #[test]
    fn unknown_variable_is_rejected() {
        let err = compile("bad.less", "a { color: @missing; }\n").unwrap_err();

        assert!(err.to_string().contains("unable to compile bad.less"));
        assert!(err.to_string().contains("@missing"));
    }

    #[test]
    fn source_map_names_the_stylesheet_pair() {
        let map = LessSourceMapCompiler
            .compile(Path::new("css/style.css.map"), "a { color: red; }\n")
            .unwrap();

        assert_eq!(
            map,
            r#"{"file":"style.css","mappings":"","sources":["style.less"],"version":3}"#
        );
    }

    #[test]
    fn source_map_rejects_a_broken_stylesheet() {
        let result =
            LessSourceMapCompiler.compile(Path::new("style.css.map"), "a { color: @nope; }\n");

        assert!(result.is_err());
    }
}
