//! Studio SSR - compiles Gesso templates into server render functions.
//!
//! The shared transform runs first with `ssr` set, so expressions are
//! prefixed and structural directives become `if`/`for` nodes. A second
//! pass ([`codegen::ssr_codegen_transform`]) then turns the tree into
//! `_push` statements of markup strings.

pub mod codegen;
pub mod options;
pub mod transforms;

pub use codegen::{ssr_codegen_transform, SsrCodegen};
pub use options::SsrCompilerOptions;

use gesso_canvas::{CompilerError, CompilerOptions};
use gesso_palette::Bump;
use gesso_sketch::parse_with_options;
use gesso_studio::{generate, transform, CodegenResult, CompileResult, TransformPlugins};
use gesso_studio_dom::transforms::{ignore_side_effect_tags, warn_transition_children};

/// Core plugins plus the DOM checks that still apply on the server
pub fn ssr_plugins<'a>() -> TransformPlugins<'a> {
    let mut plugins = TransformPlugins::base();
    plugins
        .push_node_transform("ignore-side-effect-tags", ignore_side_effect_tags)
        .push_node_transform("transition", warn_transition_children);
    plugins
}

/// Compile for server rendering
pub fn compile_ssr(source: &str, options: &SsrCompilerOptions) -> CompileResult {
    let allocator = Bump::new();
    compile_ssr_with_allocator(&allocator, source, options)
}

/// Compile into a caller-owned arena
pub fn compile_ssr_with_allocator<'a>(
    allocator: &'a Bump,
    source: &'a str,
    options: &SsrCompilerOptions,
) -> CompileResult {
    tracing::debug!(filename = %options.filename, "compiling SSR template");
    let CompilerOptions {
        parser,
        transform: transform_options,
        codegen,
    } = options.to_compiler_options();
    let plugins = ssr_plugins();

    let (mut root, parse_errors) = parse_with_options(allocator, source, parser);
    let mut errors: std::vec::Vec<CompilerError> = parse_errors.iter().cloned().collect();

    let diagnostics = transform(allocator, &mut root, transform_options.clone(), &plugins);
    errors.extend(diagnostics.errors);
    let mut warnings = diagnostics.warnings;

    let rendered = ssr_codegen_transform(allocator, &mut root, transform_options, &plugins, options);
    errors.extend(rendered.errors);
    warnings.extend(rendered.warnings);

    let CodegenResult { code, preamble, map } = generate(&root, &codegen);
    tracing::debug!(errors = errors.len(), bytes = code.len(), "compiled for the server");
    CompileResult {
        code,
        preamble,
        map,
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_order() {
        assert_eq!(
            ssr_plugins().node_transform_names(),
            [
                "once",
                "if",
                "for",
                "expression",
                "slot-outlet",
                "element",
                "text",
                "ignore-side-effect-tags",
                "transition"
            ]
        );
        assert!(!ssr_plugins().has_directive_transform("show"));
    }

    #[test]
    fn test_side_effect_tags_dropped() {
        let result = compile_ssr("<div><script>x</script><p>a</p></div>", &SsrCompilerOptions::default());
        assert!(!result.code.contains("<script>"));
        assert!(result.code.contains("<p>a</p>"));
    }
}
