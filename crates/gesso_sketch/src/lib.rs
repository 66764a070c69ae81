//! Sketch - the first pass over a template.
//!
//! Turns template source into the canvas AST. Parsing never fails: every
//! malformed construct is reported as a [`gesso_canvas::CompilerError`] and
//! the parser carries on with a best-effort tree.
//!
//! # Example
//!
//! ```
//! use gesso_palette::Bump;
//! use gesso_sketch::parse;
//!
//! let allocator = Bump::new();
//! let (root, errors) = parse(&allocator, "<div>{{ msg }}</div>");
//!
//! assert!(errors.is_empty());
//! assert_eq!(root.children.len(), 1);
//! ```

mod directive;
pub mod for_expression;
pub mod parser;
mod scanner;

pub use for_expression::parse_for_expression;
pub use parser::{parse, parse_with_options, Parser};
