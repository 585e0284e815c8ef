//! Error Types
//!
//! One variant per fatal condition the tool can hit. Every constructor is
//! `#[track_caller]` so verbose-mode reporting can print the Rust call
//! site without threading a logging framework through the core.

use std::panic::Location;
use thiserror::Error;

/// A fatal error, tagged with the function and source location that raised
/// it.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct XmkError {
    pub kind: XmkErrorKind,
    site: &'static Location<'static>,
    function: &'static str,
}

impl XmkError {
    /// Build an error tagged with `function` (the enclosing function's
    /// path) and the caller's source location. Raise via the [`fatal!`]
    /// macro rather than calling this directly, so `function` is always
    /// filled in for you.
    #[track_caller]
    pub fn new(kind: XmkErrorKind, function: &'static str) -> Self {
        Self { kind, site: Location::caller(), function }
    }

    /// Exit code this error should produce: a failing command's own exit
    /// code, or 1 for anything else.
    pub fn exit_code(&self) -> i32 {
        match &self.kind {
            XmkErrorKind::CommandFailed { code } => *code,
            _ => 1,
        }
    }

    /// Print `[error] message`, plus a `function (file:line)` site
    /// annotation when verbose.
    pub fn report(&self, verbose: bool) {
        eprintln!("[error] {}", self.kind);
        if verbose {
            eprintln!("  at {} ({}:{})", self.function, self.site.file(), self.site.line());
        }
    }
}

/// Raise an [`XmkError`], capturing both the enclosing function's path and
/// the call site automatically, so every raise site gets the same
/// annotation without having to spell out a function name by hand.
#[macro_export]
macro_rules! fatal {
    ($kind:expr) => {{
        fn __xmk_enclosing_fn() {}
        fn __xmk_type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let __xmk_path = __xmk_type_name_of(__xmk_enclosing_fn);
        let __xmk_function = &__xmk_path[..__xmk_path.len() - "::__xmk_enclosing_fn".len()];
        $crate::error::XmkError::new($kind, __xmk_function)
    }};
}

#[derive(Debug, Error)]
pub enum XmkErrorKind {
    #[error("could not read '{path}': {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("{message}")]
    Lex { message: String },

    #[error("undefined symbol '${name}'")]
    UndefinedSymbol { name: String },

    #[error("'{var}' used outside a target block")]
    ScopeViolation { var: String },

    #[error("$(dep[{index}]) is out of range for target '{target}' ({count} dependencies)")]
    IndexOutOfRange { target: String, index: usize, count: usize },

    #[error("duplicate target '{name}'")]
    DuplicateTarget { name: String },

    #[error("more than one 'build' directive (already set to '{existing}')")]
    DuplicateBuild { existing: String },

    #[error("no 'build' directive in input")]
    MissingBuild,

    #[error("target '{name}' has no dependencies and no commands")]
    EmptyTarget { name: String },

    #[error("command failed with exit code {code}: {command}")]
    CommandFailed { command: String, code: i32 },

    #[error("commands for '{target}' succeeded but the file was not produced")]
    PostBuildMissing { target: String },

    #[error("'{name}' is neither a known target nor an existing file")]
    UnknownTarget { name: String },
}

pub type Result<T> = std::result::Result<T, XmkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn make() -> XmkError {
        crate::fatal!(XmkErrorKind::MissingBuild)
    }

    #[test]
    fn exit_code_defaults_to_one() {
        let e = make();
        assert_eq!(e.exit_code(), 1);
    }

    #[test]
    fn command_failed_propagates_its_own_code() {
        let e = crate::fatal!(XmkErrorKind::CommandFailed { command: "false".into(), code: 7 });
        assert_eq!(e.exit_code(), 7);
    }

    #[test]
    fn display_matches_kind() {
        let e = crate::fatal!(XmkErrorKind::UnknownTarget { name: "foo".into() });
        assert_eq!(e.to_string(), "'foo' is neither a known target nor an existing file");
    }

    #[test]
    fn report_includes_function_and_line_when_verbose() {
        let e = crate::fatal!(XmkErrorKind::MissingBuild);
        assert!(e.function.contains("report_includes_function_and_line_when_verbose"));
    }
}
