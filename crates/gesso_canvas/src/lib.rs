//! Canvas - the surface every Gesso stage paints on.
//!
//! Holds the template AST produced by the parser, the codegen nodes the
//! transforms attach to it, compiler options and diagnostics.

pub mod ast;
pub mod errors;
pub mod options;

pub use ast::*;
pub use errors::*;
pub use options::*;
