//! Studio DOM - compiles Gesso templates for the browser runtime.
//!
//! Adds to the core pipeline:
//! - HTML namespaces, RCDATA/RAWTEXT text modes and the full entity table
//! - `v-html`, `v-text`, `v-show` and native `v-model`
//! - `v-on` event modifiers
//! - static `style` normalization

pub mod options;
pub mod parser_options;
pub mod transforms;

pub use options::DomCompilerOptions;
pub use parser_options::{builtin_component, decode_entities, dom_parser_options, get_namespace, get_text_mode};

use gesso_canvas::{CompilerError, RootNode};
use gesso_palette::{Bump, Vec};
use gesso_studio::{compile_with_plugins, CompileResult, TransformPlugins};

use transforms::*;

/// Core plugins plus the DOM node and directive transforms
pub fn dom_plugins<'a>() -> TransformPlugins<'a> {
    let mut plugins = TransformPlugins::base();
    plugins
        .push_node_transform("ignore-side-effect-tags", ignore_side_effect_tags)
        .push_node_transform("style", transform_style)
        .push_node_transform("transition", warn_transition_children)
        .set_directive_transform("cloak", |_, _, _| gesso_studio::DirectiveTransformResult::empty())
        .set_directive_transform("html", transform_v_html)
        .set_directive_transform("text", transform_v_text)
        .set_directive_transform("model", transform_v_model)
        .set_directive_transform("on", transform_v_on)
        .set_directive_transform("show", transform_v_show);
    plugins
}

/// Parse with the DOM parser settings
pub fn parse_template<'a>(allocator: &'a Bump, source: &'a str) -> (RootNode<'a>, Vec<'a, CompilerError>) {
    gesso_sketch::parse_with_options(allocator, source, dom_parser_options())
}

/// Compile for the browser runtime
pub fn compile_template(source: &str, options: &DomCompilerOptions) -> CompileResult {
    let allocator = Bump::new();
    compile_template_with_allocator(&allocator, source, options)
}

/// Compile into a caller-owned arena
pub fn compile_template_with_allocator<'a>(
    allocator: &'a Bump,
    source: &'a str,
    options: &DomCompilerOptions,
) -> CompileResult {
    tracing::debug!(filename = %options.filename, "compiling DOM template");
    compile_with_plugins(allocator, source, options.to_compiler_options(), &dom_plugins())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesso_canvas::{ErrorCode, Namespace, TemplateChildNode};

    fn compile(source: &str) -> CompileResult {
        compile_template(source, &DomCompilerOptions::default())
    }

    #[test]
    fn test_plugin_order() {
        let names = dom_plugins().node_transform_names();
        assert_eq!(
            names,
            [
                "once",
                "if",
                "for",
                "expression",
                "slot-outlet",
                "element",
                "text",
                "ignore-side-effect-tags",
                "style",
                "transition"
            ]
        );
        assert!(dom_plugins().has_directive_transform("show"));
    }

    #[test]
    fn test_svg_namespace() {
        let allocator = Bump::new();
        let (root, errors) = parse_template(&allocator, "<svg><foreignObject><div/></foreignObject></svg>");
        assert!(errors.is_empty());
        let TemplateChildNode::Element(svg) = &root.children[0] else { panic!("expected element") };
        assert_eq!(svg.ns, Namespace::Svg);
        let foreign = svg.children[0].as_element().unwrap();
        assert_eq!(foreign.ns, Namespace::Svg);
        assert_eq!(foreign.children[0].as_element().unwrap().ns, Namespace::Html);
    }

    #[test]
    fn test_textarea_is_rcdata() {
        let allocator = Bump::new();
        let (root, _) = parse_template(&allocator, "<textarea><div>&amp;</div></textarea>");
        let textarea = root.children[0].as_element().unwrap();
        assert_eq!(textarea.children.len(), 1);
        let TemplateChildNode::Text(text) = &textarea.children[0] else { panic!("expected text") };
        assert_eq!(text.content, "<div>&</div>");
    }

    #[test]
    fn test_side_effect_tags_are_dropped() {
        let result = compile("<div><style>a{}</style><p>x</p></div>");
        let codes: std::vec::Vec<_> = result.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, [ErrorCode::XIgnoredSideEffectTag]);
        assert!(!result.code.contains("\"style\""));
    }

    #[test]
    fn test_transition_with_two_children() {
        let result = compile("<Transition><p>a</p><p>b</p></Transition>");
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::XTransitionInvalidChildren));
        assert!(result.code.contains("_Transition"));
    }
}
