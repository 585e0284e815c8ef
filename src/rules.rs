//! Rule Engine
//!
//! Drives the token stream against the five-directive grammar. The grammar
//! itself is kept as data (`RULES`, built from `Step` sequences) separate
//! from the driver, so adding a new directive is mostly a table edit.
//! `RULES` is consulted by tests to pin the grammar shape, while `Parser`'s
//! methods execute the equivalent recursive descent directly. A generic
//! step-interpreter over type-erased callbacks wasn't worth it here: there
//! are exactly five rules and every symbol/list callback needs a
//! differently-typed sink.

use crate::error::{Result, XmkErrorKind};
use crate::lexer::{Tokenizer, Word};
use crate::model::Model;
use crate::source::SourceBuffer;

/// One step of a recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Keyword(&'static str),
    Symbol,
    List,
    NestedRule,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleName {
    Build,
    Target,
    DefineAs,
    CreatedUsing,
    DependsOn,
}

pub struct RuleSpec {
    pub name: RuleName,
    pub keywords: &'static [&'static str],
    pub recipes: &'static [&'static [Step]],
}

pub static RULES: &[RuleSpec] = &[
    RuleSpec {
        name: RuleName::Build,
        keywords: &["build"],
        recipes: &[&[Step::Keyword("build"), Step::Symbol, Step::End]],
    },
    RuleSpec {
        name: RuleName::Target,
        keywords: &["target"],
        recipes: &[&[Step::Keyword("target"), Step::Symbol, Step::NestedRule, Step::End]],
    },
    RuleSpec {
        name: RuleName::DefineAs,
        keywords: &["define", "as"],
        recipes: &[
            &[Step::Keyword("define"), Step::Symbol, Step::Keyword("as"), Step::Symbol, Step::End],
            &[Step::Keyword("define"), Step::List, Step::Keyword("as"), Step::Symbol, Step::End],
        ],
    },
    RuleSpec {
        name: RuleName::CreatedUsing,
        keywords: &["created", "using"],
        recipes: &[&[Step::Keyword("created"), Step::Keyword("using"), Step::List, Step::End]],
    },
    RuleSpec {
        name: RuleName::DependsOn,
        keywords: &["depends", "on"],
        recipes: &[&[Step::Keyword("depends"), Step::Keyword("on"), Step::List, Step::End]],
    },
];

/// Grammar nesting is bounded structurally: `target { ... }` is the only
/// `NestedRule` step, and its body only contains `List` steps, so the call
/// graph itself cannot recurse past this depth.
pub const MAX_NESTING_DEPTH: usize = 2;

pub struct Parser {
    buf: SourceBuffer,
    model: Model,
    tok: Tokenizer,
    current_scope: Option<String>,
    pending: Option<Word>,
}

impl Parser {
    pub fn new(buf: SourceBuffer) -> Self {
        Self { buf, model: Model::new(), tok: Tokenizer::new(), current_scope: None, pending: None }
    }

    /// Consume the whole program, returning the populated model store
    /// together with the fully macro-expanded source text. By the time
    /// parsing reaches end of input, every `$...` reference the tokenizer
    /// walked over has been rewritten into the buffer, so this text is
    /// exactly what `-E`/`preprocess_only` prints.
    pub fn parse(mut self) -> Result<(Model, String)> {
        loop {
            let Some(word) = self.next_token()? else { break };
            match word.text.as_str() {
                "build" => self.parse_build()?,
                "define" => self.parse_define()?,
                "target" => self.parse_target()?,
                other => {
                    return Err(crate::fatal!(XmkErrorKind::Lex {
                        message: format!("unexpected token '{}'", other),
                    }))
                }
            }
        }
        let source = String::from_utf8_lossy(self.buf.as_bytes()).into_owned();
        Ok((self.model, source))
    }

    fn next_token(&mut self) -> Result<Option<Word>> {
        if let Some(w) = self.pending.take() {
            return Ok(Some(w));
        }
        self.tok.next_word(&mut self.buf, &self.model, self.current_scope.as_deref())
    }

    fn peek_token(&mut self) -> Result<Option<&Word>> {
        if self.pending.is_none() {
            self.pending = self.tok.next_word(&mut self.buf, &self.model, self.current_scope.as_deref())?;
        }
        Ok(self.pending.as_ref())
    }

    #[track_caller]
    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        match self.next_token()? {
            Some(w) if w.text == kw => Ok(()),
            Some(w) => Err(crate::fatal!(XmkErrorKind::Lex {
                message: format!("expected '{}', found '{}'", kw, w.text),
            })),
            None => Err(crate::fatal!(XmkErrorKind::Lex {
                message: format!("expected '{}', found end of input", kw),
            })),
        }
    }

    #[track_caller]
    fn expect_symbol(&mut self) -> Result<String> {
        match self.next_token()? {
            Some(w) => Ok(w.text),
            None => Err(crate::fatal!(XmkErrorKind::Lex {
                message: "expected a symbol, found end of input".into(),
            })),
        }
    }

    /// List handler: `{` opens, `}` closes; tokens separated by a newline
    /// become distinct entries, tokens on the same line as the previous
    /// entry are concatenated with a single space.
    #[track_caller]
    fn read_list(&mut self) -> Result<Vec<String>> {
        self.expect_keyword("{")?;
        let mut entries: Vec<String> = Vec::new();
        loop {
            match self.next_token()? {
                Some(w) if w.text == "}" => break,
                Some(w) => {
                    if entries.is_empty() || w.newline_seen {
                        entries.push(w.text);
                    } else {
                        let last = entries.last_mut().expect("checked non-empty above");
                        last.push(' ');
                        last.push_str(&w.text);
                    }
                }
                None => {
                    return Err(crate::fatal!(XmkErrorKind::Lex {
                        message: "unterminated list, expected '}'".into(),
                    }))
                }
            }
        }
        Ok(entries)
    }

    fn parse_build(&mut self) -> Result<()> {
        let name = self.expect_symbol()?;
        self.model.set_build_target(name)
    }

    /// `define X as Y` or `define { A B C } as Y`.
    fn parse_define(&mut self) -> Result<()> {
        let names = if matches!(self.peek_token()?, Some(w) if w.text == "{") {
            self.read_list()?
        } else {
            vec![self.expect_symbol()?]
        };
        self.expect_keyword("as")?;
        let value = self.expect_symbol()?;
        for name in names {
            self.model.add_define(name, value.clone());
        }
        Ok(())
    }

    /// `target NAME { (depends on { ... } | created using { ... })* }`.
    fn parse_target(&mut self) -> Result<()> {
        let name = self.expect_symbol()?;
        self.expect_keyword("{")?;
        let index = self.model.register_target(name.clone())?;
        // Scope is set on entry and deliberately left set after the block
        // closes, so later dependency lookups can still resolve against it.
        self.current_scope = Some(name);
        loop {
            match self.next_token()? {
                Some(w) if w.text == "depends" => {
                    self.expect_keyword("on")?;
                    for dep in self.read_list()? {
                        self.model.add_dependency(index, dep);
                    }
                }
                Some(w) if w.text == "created" => {
                    self.expect_keyword("using")?;
                    for cmd in self.read_list()? {
                        self.model.add_command(index, cmd);
                    }
                }
                Some(w) if w.text == "}" => break,
                Some(w) => {
                    return Err(crate::fatal!(XmkErrorKind::Lex {
                        message: format!("unexpected token '{}' in target block", w.text),
                    }))
                }
                None => {
                    return Err(crate::fatal!(XmkErrorKind::Lex {
                        message: "unexpected end of input in target block".into(),
                    }))
                }
            }
        }
        Ok(())
    }
}

/// Parse a whole program from source text into a populated [`Model`],
/// discarding the expanded source. Callers that need `-E` output should
/// use [`Parser::parse`] directly.
pub fn parse_str(text: &str) -> Result<Model> {
    Parser::new(SourceBuffer::from_text(text)).parse().map(|(model, _)| model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XmkErrorKind;

    #[test]
    fn rule_table_names_five_directives() {
        assert_eq!(RULES.len(), 5);
        assert!(RULES.iter().any(|r| r.name == RuleName::Build));
        assert!(RULES.iter().any(|r| r.name == RuleName::Target));
        assert!(RULES.iter().any(|r| r.name == RuleName::DefineAs));
        assert!(RULES.iter().any(|r| r.name == RuleName::CreatedUsing));
        assert!(RULES.iter().any(|r| r.name == RuleName::DependsOn));
    }

    #[test]
    fn minimal_build_parses() {
        let model = parse_str(
            "build out\ntarget out { depends on { in } created using { cp in out } }",
        )
        .unwrap();
        assert_eq!(model.build_target(), Some("out"));
        let i = model.target_index("out").unwrap();
        assert_eq!(model.dependencies(i), &["in".to_string()]);
        assert_eq!(model.commands(i), &["cp in out".to_string()]);
    }

    #[test]
    fn chained_dependency_preserves_target_order() {
        let model = parse_str(
            "build app\n\
             target app { depends on { app.o } created using { ld -o app app.o } }\n\
             target app.o { depends on { app.c } created using { cc -c app.c -o app.o } }",
        )
        .unwrap();
        assert_eq!(model.target_index("app"), Some(0));
        assert_eq!(model.target_index("app.o"), Some(1));
    }

    #[test]
    fn define_expansion_reaches_command_list() {
        let model = parse_str(
            "define CC as cc\n\
             define FLAGS as -O2\n\
             build foo\n\
             target foo { depends on { foo.c } created using { $CC $FLAGS -o $(target) $(dep[0]) } }",
        )
        .unwrap();
        let i = model.target_index("foo").unwrap();
        assert_eq!(model.commands(i), &["cc -O2 -o foo foo.c".to_string()]);
    }

    #[test]
    fn missing_build_directive_is_detected_by_caller() {
        let model = parse_str("target x { depends on { y } created using { echo x } }").unwrap();
        assert!(model.build_target().is_none());
    }

    #[test]
    fn duplicate_build_is_fatal() {
        let err = parse_str("build a\nbuild b\n").unwrap_err();
        assert!(matches!(err.kind, XmkErrorKind::DuplicateBuild { .. }));
    }

    #[test]
    fn duplicate_target_is_fatal() {
        let err = parse_str(
            "target out { created using { echo hi } }\ntarget out { created using { echo hi } }",
        )
        .unwrap_err();
        assert!(matches!(err.kind, XmkErrorKind::DuplicateTarget { .. }));
    }

    #[test]
    fn define_list_form_defines_each_newline_separated_name() {
        let model = parse_str("define {\nA\nB\n} as shared\n").unwrap();
        assert_eq!(model.lookup_define("A"), Some("shared"));
        assert_eq!(model.lookup_define("B"), Some("shared"));
    }

    #[test]
    fn define_list_form_concatenates_same_line_names() {
        // Two names on one line inside `{ }` concatenate into a single
        // define name, per the shared list-continuation rule.
        let model = parse_str("define {\nA B\n} as shared\n").unwrap();
        assert_eq!(model.lookup_define("A B"), Some("shared"));
        assert_eq!(model.lookup_define("A"), None);
    }

    #[test]
    fn multi_word_command_on_one_line_concatenates() {
        let model = parse_str("target out { created using { echo one\ntwo three } }").unwrap();
        let i = model.target_index("out").unwrap();
        assert_eq!(model.commands(i), &["echo one".to_string(), "two three".to_string()]);
    }

    #[test]
    fn nesting_depth_of_two_parses() {
        let model = parse_str("target out { depends on { a } }").unwrap();
        let i = model.target_index("out").unwrap();
        assert_eq!(model.dependencies(i), &["a".to_string()]);
    }

    #[test]
    fn current_scope_survives_after_target_block_for_later_dep_lookups() {
        // Current scope is not unset on exiting a target block.
        let model = parse_str(
            "target a { depends on { x } created using { echo $(dep[0]) } }",
        )
        .unwrap();
        let i = model.target_index("a").unwrap();
        assert_eq!(model.commands(i), &["echo x".to_string()]);
    }

    #[test]
    fn unexpected_top_level_token_is_fatal() {
        let err = parse_str("frobnicate widgets\n").unwrap_err();
        assert!(matches!(err.kind, XmkErrorKind::Lex { .. }));
    }
}
