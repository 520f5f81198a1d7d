//! Line classification for `/* @if(...) */`, `/* @endif */` and the inline
//! `if (/* @if(...) */ false)` form.
//!
//! Only these three shapes are directives. Anything else, including
//! `/* @else */`, is plain text.

use crate::parser::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `/* @if(condition) */` alone on its line.
    IfOpen { condition: &'a str },
    /// `/* @endif */` alone on its line.
    EndifClose,
    /// A line with an inline placeholder, e.g. `if (/* @if(a.b) */ false) {`.
    Inline(InlineConditional<'a>),
    Text,
}

/// The pieces of an inline-conditional line around the placeholder.
/// `before` ends right before the `/*`, `after` starts right after `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineConditional<'a> {
    pub before: &'a str,
    pub condition: &'a str,
    pub after: &'a str,
}

impl InlineConditional<'_> {
    /// The line with the comment and its `false` placeholder replaced by `result`.
    pub fn rewrite(&self, result: bool) -> String {
        format!("{}{}{}", self.before, result, self.after)
    }
}

pub fn scan_line(line: &str) -> Directive<'_> {
    if let Some(body) = comment_body(line) {
        if let Some(condition) = if_condition(body) {
            return Directive::IfOpen { condition };
        }
        if body == "@endif" {
            return Directive::EndifClose;
        }
    }
    match scan_inline(line) {
        Some(inline) => Directive::Inline(inline),
        None => Directive::Text,
    }
}

/// Trimmed content of a line that is exactly one `/* ... */` comment.
fn comment_body(line: &str) -> Option<&str> {
    let body = line
        .trim()
        .strip_prefix("/*")?
        .strip_suffix("*/")?;
    if body.contains("*/") {
        return None;
    }
    Some(body.trim())
}

/// `@if(cond)` with `cond` running to the last `)`.
fn if_condition(body: &str) -> Option<&str> {
    let rest = body.strip_prefix("@if")?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.trim())
}

fn scan_inline(line: &str) -> Option<InlineConditional<'_>> {
    line.match_indices("if")
        .filter(|(idx, _)| {
            !line[..*idx]
                .chars()
                .next_back()
                .is_some_and(Parser::is_ident_char)
        })
        .find_map(|(idx, _)| inline_at(line, idx))
}

fn inline_at(line: &str, start: usize) -> Option<InlineConditional<'_>> {
    let mut p = Parser::new(&line[start..]);
    if !p.consume_keyword("if") {
        return None;
    }
    p.skip_ws();
    if !p.consume_char('(') {
        return None;
    }
    p.skip_ws();
    let comment_start = start + p.pos();
    if !p.consume_str("/*") {
        return None;
    }
    p.skip_ws();
    if !p.consume_str("@if") {
        return None;
    }
    p.skip_ws();
    if !p.consume_char('(') {
        return None;
    }
    let cond_start = start + p.pos();

    // The condition ends at the first `)` followed by the comment close.
    let (cond_end, mut tail) = line[cond_start..].match_indices(')').find_map(|(off, _)| {
        let close = cond_start + off;
        let mut q = Parser::new(&line[close + 1..]);
        q.skip_ws();
        q.consume_str("*/").then_some((close, q))
    })?;
    let tail_start = cond_end + 1;

    tail.skip_ws();
    if !tail.consume_keyword("false") {
        return None;
    }
    let after = tail_start + tail.pos();
    tail.skip_ws();
    if tail.peek_char() != Some(')') {
        return None;
    }
    Some(InlineConditional {
        before: &line[..comment_start],
        condition: line[cond_start..cond_end].trim(),
        after: &line[after..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_open() {
        assert_eq!(
            scan_line("  /* @if(device.isMobile) */"),
            Directive::IfOpen { condition: "device.isMobile" }
        );
        assert_eq!(
            scan_line("/*@if( w < 400 )*/\r"),
            Directive::IfOpen { condition: "w < 400" }
        );
        assert_eq!(
            scan_line("/* @if ((a || b) && c) */"),
            Directive::IfOpen { condition: "(a || b) && c" }
        );
        assert_eq!(
            scan_line("/* @if(experiment.group === \"A\") */"),
            Directive::IfOpen { condition: "experiment.group === \"A\"" }
        );
        // empty conditions still open a block so evaluation can reject them
        assert_eq!(scan_line("/* @if() */"), Directive::IfOpen { condition: "" });
    }

    #[test]
    fn block_close() {
        assert_eq!(scan_line("/* @endif */"), Directive::EndifClose);
        assert_eq!(scan_line("\t/*@endif*/  "), Directive::EndifClose);
    }

    #[test]
    fn near_misses_are_text() {
        for line in [
            "/* @else */",
            "/* @endif */ trailing();",
            "call(); /* @if(a) */",
            "/* @if(a) */ /* b */",
            "/* @ifdef(a) */",
            "/* @if a */",
            "// @if(a)",
            "/* @endif extra */",
            "if (/* @if(a) */ true) {",
            "elif (/* @if(a) */ false) {",
            "if (/* @if(a) */ false || b) {",
            "console.log(\"if (\");",
        ] {
            assert_eq!(scan_line(line), Directive::Text, "{line}");
        }
    }

    #[test]
    fn inline_placeholder() {
        let line = "  if (/* @if(device.screenWidth < 400) */ false) {";
        let Directive::Inline(inline) = scan_line(line) else {
            panic!("expected inline directive");
        };
        assert_eq!(inline.condition, "device.screenWidth < 400");
        assert_eq!(inline.before, "  if (");
        assert_eq!(inline.after, ") {");
        assert_eq!(inline.rewrite(true), "  if (true) {");
    }

    #[test]
    fn inline_keeps_surrounding_text() {
        let line = "} else if ( /*@if(f(x))*/false ) { go(); }";
        let Directive::Inline(inline) = scan_line(line) else {
            panic!("expected inline directive");
        };
        assert_eq!(inline.condition, "f(x)");
        assert_eq!(inline.rewrite(false), "} else if ( false ) { go(); }");
    }

    #[test]
    fn inline_condition_with_parentheses() {
        let line = "if (/* @if((a || b) && c) */ false) return;";
        let Directive::Inline(inline) = scan_line(line) else {
            panic!("expected inline directive");
        };
        assert_eq!(inline.condition, "(a || b) && c");
        assert_eq!(inline.rewrite(true), "if (true) return;");
    }
}
