//! Leading docstring extraction.

use crate::ast::{Expr, Stmt};

/// The docstring of a function, class or module body: the first statement,
/// when it is a bare string literal.
pub fn docstring(body: &[Stmt], clean: bool) -> Option<String> {
    let Some(Stmt::Expr(Expr::Str(text))) = body.first() else {
        return None;
    };
    Some(if clean {
        clean_docstring(text)
    } else {
        text.clone()
    })
}

/// Normalize docstring indentation.
///
/// Tabs expand to 8-column stops. The first line loses its leading
/// whitespace; the common indentation of the remaining non-blank lines is
/// removed; blank lines at either end are dropped.
pub fn clean_docstring(text: &str) -> String {
    let expanded = expand_tabs(text);
    let lines: Vec<&str> = expanded.split('\n').collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim_start().is_empty())
        .map(|line| leading_whitespace(line))
        .min();

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first() {
        cleaned.push(first.trim_start().to_string());
    }
    for line in lines.iter().skip(1) {
        let cut = margin.unwrap_or(0).min(leading_whitespace(line));
        let start = line
            .char_indices()
            .nth(cut)
            .map_or(line.len(), |(index, _)| index);
        cleaned.push(line[start..].to_string());
    }

    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }
    let leading_blank = cleaned.iter().take_while(|line| line.is_empty()).count();
    cleaned.drain(..leading_blank);
    cleaned.join("\n")
}

/// Indentation width in characters.
fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn expand_tabs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = 8 - column % 8;
                out.extend(std::iter::repeat_n(' ', pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            c => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_statement_only() {
        let body = vec![
            Stmt::Expr(Expr::name("x")),
            Stmt::Expr(Expr::str("not a docstring")),
        ];
        assert_eq!(docstring(&body, true), None);
        assert_eq!(docstring(&[], true), None);
    }

    #[test]
    fn test_raw_is_untouched() {
        let body = vec![Stmt::Expr(Expr::str("\n    Summary.\n    "))];
        assert_eq!(
            docstring(&body, false).as_deref(),
            Some("\n    Summary.\n    ")
        );
    }

    #[test]
    fn test_clean_removes_common_indent() {
        let text = "Summary.\n\n        Details here.\n          indented more.\n        ";
        assert_eq!(
            clean_docstring(text),
            "Summary.\n\nDetails here.\n  indented more."
        );
    }

    #[test]
    fn test_clean_drops_blank_edges() {
        assert_eq!(clean_docstring("\n\n    Body.\n\n"), "Body.");
        assert_eq!(clean_docstring("   One line.   "), "One line.   ");
    }

    #[test]
    fn test_non_ascii_indent_counts_characters() {
        let text = "S.\n     a\n    \u{a0}\u{a0}b\n    ";
        assert_eq!(clean_docstring(text), "S.\na\n\u{a0}b");
        assert_eq!(clean_docstring("S.\n\u{3000}x\n\u{3000}\u{3000}y"), "S.\nx\n\u{3000}y");
    }

    #[test]
    fn test_tabs_expand() {
        assert_eq!(clean_docstring("Head.\n\tTabbed.\n\t  More."), "Head.\nTabbed.\n  More.");
    }
}
