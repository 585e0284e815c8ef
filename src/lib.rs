//! xmk: parse a target/dependency/command file and run whatever is out of
//! date, in dependency order.
//!
//! The crate is split the way the language itself is: a [`source`] buffer
//! holds the mutable text, a [`lexer`] walks it one word at a time
//! (expanding `$` references as it goes), [`rules`] drives the token stream
//! against the grammar into a [`model`] store, and [`resolver`] walks that
//! store to decide what actually needs rebuilding.

pub mod config;
pub mod error;
pub mod fileprobe;
pub mod lexer;
pub mod model;
pub mod process;
pub mod resolver;
pub mod rules;
pub mod source;

pub use config::Config;
pub use error::{Result, XmkError, XmkErrorKind};
pub use model::Model;
pub use resolver::Resolver;
pub use rules::Parser;
pub use source::SourceBuffer;
