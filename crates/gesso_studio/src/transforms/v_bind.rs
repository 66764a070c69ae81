//! `v-bind` with an argument.
//!
//! The argument-less form (`v-bind="obj"`) is merged by the props builder.

use gesso_canvas::{
    CompoundExpressionNode, CompoundPart, DirectiveNode, ElementNode, ErrorCode, ExpressionNode, JsNode, Property,
    RuntimeHelper, SourceLocation,
};
use gesso_palette::{camelize, format_compact, Box, Bump};

use super::props::bind_shorthand_exp;
use super::transform_expression::process_expression;
use super::utils::static_exp;
use crate::transform::{DirectiveTransformResult, TransformContext};

pub fn transform_bind<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    _el: &ElementNode<'a>,
) -> DirectiveTransformResult<'a> {
    let allocator = ctx.allocator;
    let Some(arg) = &dir.arg else {
        return DirectiveTransformResult::empty();
    };

    let exp = match dir.exp.as_ref().filter(|exp| !exp.is_blank()) {
        Some(exp) => exp.clone_in(allocator),
        None => match bind_shorthand_exp(allocator, dir) {
            // `:foo` reads `foo`
            Some(shorthand) => process_expression(ctx, shorthand),
            None => {
                ctx.on_error(ErrorCode::XVBindNoExpression, Some(&dir.loc));
                return DirectiveTransformResult::with_props(vec![Property {
                    key: arg.clone_in(allocator),
                    value: JsNode::string(allocator, ""),
                    loc: dir.loc.clone(),
                }]);
            }
        },
    };

    let mut key = arg.clone_in(allocator);
    if dir.has_modifier("camel") {
        key = camelize_key(ctx, key);
    }
    if !ctx.ssr() {
        if dir.has_modifier("prop") {
            key = inject_prefix(allocator, key, '.');
        }
        if dir.has_modifier("attr") {
            key = inject_prefix(allocator, key, '^');
        }
    }
    let key = fallback_empty(allocator, key);

    DirectiveTransformResult::with_props(vec![Property {
        key,
        value: JsNode::from_expression(exp),
        loc: dir.loc.clone(),
    }])
}

/// Dynamic keys may evaluate to `null`
fn fallback_empty<'a>(allocator: &'a Bump, key: ExpressionNode<'a>) -> ExpressionNode<'a> {
    match key {
        ExpressionNode::Simple(mut simple) if !simple.is_static => {
            simple.content = format_compact!("{} || \"\"", simple.content);
            ExpressionNode::Simple(simple)
        }
        ExpressionNode::Compound(inner) => {
            let mut wrapped = CompoundExpressionNode::new(allocator, inner.loc.clone());
            wrapped.push_raw("(");
            wrapped.children.push(CompoundPart::Compound(inner));
            wrapped.push_raw(") || \"\"");
            ExpressionNode::Compound(Box::new_in(wrapped, allocator))
        }
        key => key,
    }
}

fn camelize_key<'a>(ctx: &mut TransformContext<'a>, key: ExpressionNode<'a>) -> ExpressionNode<'a> {
    match key {
        ExpressionNode::Simple(mut simple) if simple.is_static => {
            simple.content = camelize(&simple.content);
            ExpressionNode::Simple(simple)
        }
        ExpressionNode::Simple(mut simple) => {
            let helper = ctx.helper_string(RuntimeHelper::Camelize);
            simple.content = format_compact!("{helper}({})", simple.content);
            ExpressionNode::Simple(simple)
        }
        ExpressionNode::Compound(inner) => {
            let helper = ctx.helper(RuntimeHelper::Camelize);
            let mut wrapped = CompoundExpressionNode::new(ctx.allocator, inner.loc.clone());
            wrapped.children.push(CompoundPart::Helper(helper));
            wrapped.push_raw("(");
            wrapped.children.push(CompoundPart::Compound(inner));
            wrapped.push_raw(")");
            ExpressionNode::Compound(Box::new_in(wrapped, ctx.allocator))
        }
    }
}

/// `.prop` and `.attr` force the binding kind with a key prefix
fn inject_prefix<'a>(allocator: &'a Bump, key: ExpressionNode<'a>, prefix: char) -> ExpressionNode<'a> {
    match key {
        ExpressionNode::Simple(simple) if simple.is_static => {
            static_exp(allocator, format_compact!("{prefix}{}", simple.content))
        }
        ExpressionNode::Simple(mut simple) => {
            simple.content = format_compact!("`{prefix}${{{}}}`", simple.content);
            ExpressionNode::Simple(simple)
        }
        ExpressionNode::Compound(inner) => {
            let mut wrapped = CompoundExpressionNode::new(allocator, SourceLocation::STUB);
            wrapped.push_raw(&format_compact!("`{prefix}${{"));
            wrapped.children.push(CompoundPart::Compound(inner));
            wrapped.push_raw("}`");
            ExpressionNode::Compound(Box::new_in(wrapped, allocator))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::transforms::props::{build_props, PropsTarget};
    use crate::transform::{TransformContext, TransformPlugins};
    use gesso_canvas::{ErrorCode, ExpressionNode, JsNode, TransformOptions};
    use gesso_palette::Bump;
    use gesso_sketch::parse;

    fn keys(source: &str) -> (Vec<String>, Vec<ErrorCode>) {
        let allocator = Bump::new();
        let (root, _) = parse(&allocator, source);
        let plugins = TransformPlugins::base();
        let mut ctx = TransformContext::new(&allocator, TransformOptions::default(), &plugins);
        let el = root.children[0].as_element().unwrap();
        let result = build_props(&mut ctx, el, None, PropsTarget::default());
        let keys = match result.props {
            Some(JsNode::Object(object)) => object
                .properties
                .iter()
                .map(|p| match &p.key {
                    ExpressionNode::Simple(s) => s.content.to_string(),
                    ExpressionNode::Compound(_) => "<compound>".to_string(),
                })
                .collect(),
            Some(JsNode::Call(call)) => match call.arguments.first() {
                Some(JsNode::Object(object)) => object
                    .properties
                    .iter()
                    .map(|p| p.static_key().unwrap_or("<dynamic>").to_string())
                    .collect(),
                _ => vec![],
            },
            _ => vec![],
        };
        (keys, ctx.errors.iter().map(|e| e.code).collect())
    }

    #[test]
    fn test_modifiers() {
        let (keys, errors) = keys(r#"<div :foo-bar.camel="a" :value.prop="b" :title.attr="c"/>"#);
        assert_eq!(keys, vec!["fooBar", ".value", "^title"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_same_name_shorthand() {
        let allocator = Bump::new();
        let (root, _) = parse(&allocator, r#"<div :msg-text/>"#);
        let plugins = TransformPlugins::base();
        let mut ctx = TransformContext::new(&allocator, TransformOptions::default(), &plugins);
        let el = root.children[0].as_element().unwrap();
        let result = build_props(&mut ctx, el, None, PropsTarget::default());
        let Some(JsNode::Object(object)) = result.props else { panic!("expected object") };
        let JsNode::Simple(value) = &object.properties[0].value else { panic!() };
        assert_eq!(value.content, "msgText");
        assert_eq!(result.dynamic_prop_names, vec!["msg-text"]);
    }

    #[test]
    fn test_dynamic_arg_falls_back_to_empty() {
        let (keys, _) = keys(r#"<div :[name]="v"/>"#);
        assert_eq!(keys, vec!["<dynamic>"]);
    }

    #[test]
    fn test_dynamic_arg_without_value() {
        let (_, errors) = keys(r#"<div :[name]/>"#);
        assert_eq!(errors, vec![ErrorCode::XVBindNoExpression]);
    }
}
