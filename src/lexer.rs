//! Tokenizer
//!
//! Yields one word at a time from a [`SourceBuffer`], honoring comments,
//! quoted strings, and `$`-substitution. Non-quoted words beginning with
//! `$` are expanded transparently: built-in scope variables resolve
//! directly, user defines rewrite the buffer in place and retokenize from
//! the patch point (so an expansion may itself contain further `$...`
//! references), recursively.

use crate::error::{Result, XmkErrorKind};
use crate::model::Model;
use crate::source::SourceBuffer;

/// Longest word the tokenizer will accept.
pub const MAX_WORD_LEN: usize = 254;

/// A single word returned by the tokenizer, together with whether a
/// newline was crossed since the previous word (used by the list handler
/// to decide between "new entry" and "continuation").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub newline_seen: bool,
}

pub struct Tokenizer {
    cursor: usize,
    line: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self { cursor: 0, line: 1 }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Read the next word, or `None` at end of input.
    #[track_caller]
    pub fn next_word(
        &mut self,
        buf: &mut SourceBuffer,
        model: &Model,
        current_scope: Option<&str>,
    ) -> Result<Option<Word>> {
        let newline_seen = self.skip_trivia(buf);

        let Some(first) = buf.byte_at(self.cursor) else {
            return Ok(None);
        };

        if first == b'"' {
            let text = self.read_quoted(buf)?;
            return Ok(Some(Word { text, newline_seen }));
        }

        let start = self.cursor;
        let raw = self.read_bare(buf);
        if raw.len() > MAX_WORD_LEN {
            return Err(crate::fatal!(XmkErrorKind::Lex {
                message: format!("word exceeds {} bytes", MAX_WORD_LEN),
            }));
        }

        if !raw.starts_with('$') {
            return Ok(Some(Word { text: raw, newline_seen }));
        }

        match self.expand(buf, model, current_scope, start, &raw)? {
            Expansion::Literal(text) => Ok(Some(Word { text, newline_seen })),
            Expansion::Rewritten => {
                // Buffer was patched and the cursor rewound to `start`;
                // retokenize from there. The recursion depth is bounded by
                // how many nested `$name` chains a define table can form.
                self.cursor = start;
                self.next_word(buf, model, current_scope)
            }
        }
    }

    /// Skip whitespace and `#` comments, advancing `self.line` on every
    /// `\n`. Returns whether a newline was crossed.
    fn skip_trivia(&mut self, buf: &mut SourceBuffer) -> bool {
        let mut newline_seen = false;
        loop {
            match buf.byte_at(self.cursor) {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.cursor += 1;
                }
                Some(b'\n') => {
                    self.cursor += 1;
                    self.line += 1;
                    newline_seen = true;
                }
                Some(b'#') => {
                    while let Some(c) = buf.byte_at(self.cursor) {
                        if c == b'\n' {
                            break;
                        }
                        self.cursor += 1;
                    }
                }
                _ => break,
            }
        }
        newline_seen
    }

    fn read_quoted(&mut self, buf: &mut SourceBuffer) -> Result<String> {
        debug_assert_eq!(buf.byte_at(self.cursor), Some(b'"'));
        self.cursor += 1;
        let mut text = Vec::new();
        loop {
            match buf.byte_at(self.cursor) {
                None => {
                    return Err(crate::fatal!(XmkErrorKind::Lex {
                        message: "unterminated quoted string".into(),
                    }))
                }
                Some(b'"') => {
                    self.cursor += 1;
                    break;
                }
                Some(b'\n') => {
                    self.line += 1;
                    text.push(b'\n');
                    self.cursor += 1;
                }
                Some(c) => {
                    text.push(c);
                    self.cursor += 1;
                }
            }
        }
        if text.len() > MAX_WORD_LEN {
            return Err(crate::fatal!(XmkErrorKind::Lex {
                message: format!("word exceeds {} bytes", MAX_WORD_LEN),
            }));
        }
        Ok(String::from_utf8_lossy(&text).into_owned())
    }

    fn read_bare(&mut self, buf: &mut SourceBuffer) -> String {
        let start = self.cursor;
        while let Some(c) = buf.byte_at(self.cursor) {
            if c == b' ' || c == b'\t' || c == b'\r' || c == b'\n' || c == b'#' {
                break;
            }
            self.cursor += 1;
        }
        String::from_utf8_lossy(&buf.as_bytes()[start..self.cursor]).into_owned()
    }

    #[track_caller]
    fn expand(
        &mut self,
        buf: &mut SourceBuffer,
        model: &Model,
        current_scope: Option<&str>,
        start: usize,
        raw: &str,
    ) -> Result<Expansion> {
        if let Some(rest) = raw.strip_prefix("$$") {
            // `$$X` -> literal `$X`, no define lookup.
            return Ok(Expansion::Literal(format!("${}", rest)));
        }

        if raw == "$(target)" || raw == "$(target_name)" || raw == "$(target_ext)" {
            let Some(scope) = current_scope else {
                return Err(crate::fatal!(XmkErrorKind::ScopeViolation { var: raw.to_string() }));
            };
            let text = match raw {
                "$(target)" => scope.to_string(),
                "$(target_name)" => scope.split('.').next().unwrap_or(scope).to_string(),
                "$(target_ext)" => match scope.find('.') {
                    Some(i) => scope[i + 1..].to_string(),
                    None => String::new(),
                },
                _ => unreachable!(),
            };
            return Ok(Expansion::Literal(text));
        }

        if let Some(inner) = raw.strip_prefix("$(dep[").and_then(|s| s.strip_suffix("])")) {
            let Some(scope) = current_scope else {
                return Err(crate::fatal!(XmkErrorKind::ScopeViolation { var: raw.to_string() }));
            };
            let n = parse_autobase(inner).ok_or_else(|| {
                crate::fatal!(XmkErrorKind::Lex { message: format!("invalid index in {}", raw) })
            })?;
            let index = model.target_index(scope).ok_or_else(|| {
                crate::fatal!(XmkErrorKind::ScopeViolation { var: raw.to_string() })
            })?;
            let dep = model.dependency_at(index, n)?;
            return Ok(Expansion::Literal(dep.to_string()));
        }

        if raw.starts_with("$(") {
            return Err(crate::fatal!(XmkErrorKind::Lex {
                message: format!("unrecognized substitution {}", raw),
            }));
        }

        if raw == "$" {
            return Err(crate::fatal!(XmkErrorKind::Lex { message: "stray $".into() }));
        }

        let name = &raw[1..];
        match model.lookup_define(name) {
            Some(value) => {
                buf.expand_at(start, raw.len(), value);
                Ok(Expansion::Rewritten)
            }
            None => Err(crate::fatal!(XmkErrorKind::UndefinedSymbol { name: name.to_string() })),
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

enum Expansion {
    Literal(String),
    Rewritten,
}

/// Parse `N` the way the original grammar does: `0x`/`0X` prefix is hex,
/// a leading `0` with further digits is octal, otherwise decimal.
fn parse_autobase(s: &str) -> Option<usize> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()
    } else if s.len() > 1 && s.starts_with('0') {
        usize::from_str_radix(&s[1..], 8).ok()
    } else {
        s.parse::<usize>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(src: &str, model: &Model, scope: Option<&str>) -> Result<Vec<String>> {
        let mut buf = SourceBuffer::from_text(src);
        let mut tok = Tokenizer::new();
        let mut out = Vec::new();
        while let Some(w) = tok.next_word(&mut buf, model, scope)? {
            out.push(w.text);
        }
        Ok(out)
    }

    #[test]
    fn skips_comments_and_whitespace() {
        let model = Model::new();
        let got = words("  build   out # trailing comment\n", &model, None).unwrap();
        assert_eq!(got, vec!["build", "out"]);
    }

    #[test]
    fn quoted_word_preserves_inner_spaces() {
        let model = Model::new();
        let got = words(r#""hello world""#, &model, None).unwrap();
        assert_eq!(got, vec!["hello world"]);
    }

    #[test]
    fn unterminated_quote_is_fatal() {
        let model = Model::new();
        let err = words(r#""unterminated"#, &model, None).unwrap_err();
        assert!(matches!(err.kind, crate::error::XmkErrorKind::Lex { .. }));
    }

    #[test]
    fn word_of_254_bytes_succeeds_255_is_fatal() {
        let model = Model::new();
        let ok = "a".repeat(254);
        assert!(words(&ok, &model, None).is_ok());

        let bad = "a".repeat(255);
        let err = words(&bad, &model, None).unwrap_err();
        assert!(matches!(err.kind, crate::error::XmkErrorKind::Lex { .. }));
    }

    #[test]
    fn dollar_dollar_escapes_without_lookup() {
        let model = Model::new();
        let got = words("$$foo", &model, None).unwrap();
        assert_eq!(got, vec!["$foo"]);
    }

    #[test]
    fn bare_dollar_is_fatal() {
        let model = Model::new();
        let err = words("$", &model, None).unwrap_err();
        assert!(matches!(err.kind, crate::error::XmkErrorKind::Lex { .. }));
    }

    #[test]
    fn undefined_symbol_is_fatal() {
        let model = Model::new();
        let err = words("$NOPE", &model, None).unwrap_err();
        assert!(matches!(err.kind, crate::error::XmkErrorKind::UndefinedSymbol { .. }));
    }

    #[test]
    fn define_expands_and_may_nest() {
        let mut model = Model::new();
        model.add_define("CC".into(), "gcc".into());
        model.add_define("COMPILE".into(), "$CC -c".into());
        let got = words("$COMPILE", &model, None).unwrap();
        assert_eq!(got, vec!["gcc", "-c"]);
    }

    #[test]
    fn target_vars_require_scope() {
        let model = Model::new();
        let err = words("$(target)", &model, None).unwrap_err();
        assert!(matches!(err.kind, crate::error::XmkErrorKind::ScopeViolation { .. }));
    }

    #[test]
    fn target_name_and_ext_split_on_first_dot() {
        let model = Model::new();
        let got = words("$(target) $(target_name) $(target_ext)", &model, Some("foo.tar.gz")).unwrap();
        assert_eq!(got, vec!["foo.tar.gz", "foo", "tar.gz"]);
    }

    #[test]
    fn target_ext_empty_when_no_dot() {
        let model = Model::new();
        let got = words("$(target_ext)", &model, Some("foo")).unwrap();
        assert_eq!(got, vec![""]);
    }

    #[test]
    fn dep_index_resolves_against_current_scope() {
        let mut model = Model::new();
        let i = model.register_target("app".into()).unwrap();
        model.add_dependency(i, "app.c".into());
        model.add_dependency(i, "app.h".into());
        let got = words("$(dep[0]) $(dep[0x1])", &model, Some("app")).unwrap();
        assert_eq!(got, vec!["app.c", "app.h"]);
    }

    #[test]
    fn dep_zero_on_empty_dependency_list_is_fatal() {
        let mut model = Model::new();
        model.register_target("app".into()).unwrap();
        let err = words("$(dep[0])", &model, Some("app")).unwrap_err();
        assert!(matches!(err.kind, crate::error::XmkErrorKind::IndexOutOfRange { .. }));
    }

    #[test]
    fn macro_expansion_is_idempotent_once_no_dollar_names_remain() {
        let mut model = Model::new();
        model.add_define("FLAGS".into(), "-O2 -Wall".into());
        let first = words("$FLAGS", &model, None).unwrap();
        let reparsed = words(&first.join(" "), &model, None).unwrap();
        assert_eq!(first, reparsed);
    }
}
