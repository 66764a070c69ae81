//! Studio - turns a parsed Gesso template into render code.
//!
//! ```text
//! source -> parse (sketch) -> transform -> hoist_static -> generate
//! ```
//!
//! Platform crates register their own directive transforms on top of
//! [`TransformPlugins::base`] and call [`compile_with_plugins`].

pub mod cache;
pub mod codegen;
pub mod runtime_helpers;
pub mod transform;
pub mod transforms;

pub use cache::CompileCache;
pub use codegen::{generate, CodegenResult};
pub use runtime_helpers::RuntimeHelpers;
pub use transform::{
    transform, Cursor, Diagnostics, DirectiveTransform, DirectiveTransformResult, Exit, NeedRuntime,
    NodeTransform, TransformContext, TransformPlugins,
};

use gesso_canvas::{CompilerError, CompilerOptions};
use gesso_palette::Bump;
use gesso_sketch::parse_with_options;

/// Output of a full compile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileResult {
    pub code: std::string::String,
    pub preamble: std::string::String,
    pub map: Option<std::string::String>,
    /// Parser errors followed by transform errors
    pub errors: std::vec::Vec<CompilerError>,
    pub warnings: std::vec::Vec<CompilerError>,
}

/// Compile with the core plugins
pub fn compile(source: &str, options: CompilerOptions) -> CompileResult {
    let allocator = Bump::new();
    compile_with_plugins(&allocator, source, options, &TransformPlugins::base())
}

/// Compile with a caller-provided plugin set. Errors never abort the
/// pipeline; code is generated for whatever the template yielded.
pub fn compile_with_plugins<'a>(
    allocator: &'a Bump,
    source: &'a str,
    mut options: CompilerOptions,
    plugins: &TransformPlugins<'a>,
) -> CompileResult {
    options.sync();
    let CompilerOptions {
        parser,
        transform: transform_options,
        codegen,
    } = options;

    let (mut root, parse_errors) = parse_with_options(allocator, source, parser);
    let mut errors: std::vec::Vec<CompilerError> = parse_errors.iter().cloned().collect();

    let diagnostics = transform(allocator, &mut root, transform_options, plugins);
    errors.extend(diagnostics.errors);

    let CodegenResult { code, preamble, map } = generate(&root, &codegen);
    tracing::debug!(errors = errors.len(), bytes = code.len(), "compiled");
    CompileResult {
        code,
        preamble,
        map,
        errors,
        warnings: diagnostics.warnings,
    }
}
