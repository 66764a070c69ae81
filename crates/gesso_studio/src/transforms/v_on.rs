//! `v-on` with an argument.
//!
//! Produces one `onXxx` property. Inline statements are wrapped in an
//! arrow taking `$event`; with `cache_handlers` the handler lands in the
//! render cache so children do not see a new function on every render.

use gesso_canvas::{
    CompoundExpressionNode, CompoundPart, ConstantType, DirectiveNode, ElementNode, ElementType, ErrorCode,
    ExpressionNode, JsNode, Property, RuntimeHelper,
};
use gesso_palette::{camelize, format_compact, to_handler_key, Box, String};

use super::js_ast::{is_function_expression, is_member_expression, scan_identifiers, scan_statement_identifiers};
use super::transform_expression::{process_expression, process_statements};
use super::utils::{simple_exp, static_exp};
use super::v_slot::expression_refs_scope;
use crate::transform::{DirectiveTransformResult, TransformContext};

pub fn transform_on<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
) -> DirectiveTransformResult<'a> {
    transform_on_with(ctx, dir, el, |_, _, _| {})
}

/// Base `v-on` handling with a platform hook that may rewrite the result
/// (key modifiers, `withModifiers`) before the handler gets cached.
pub fn transform_on_with<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
    augment: impl FnOnce(&mut TransformContext<'a>, &DirectiveNode<'a>, &mut DirectiveTransformResult<'a>),
) -> DirectiveTransformResult<'a> {
    let allocator = ctx.allocator;
    if dir.exp.is_none() && dir.modifiers.is_empty() {
        ctx.on_error(ErrorCode::XVOnNoExpression, Some(&dir.loc));
    }
    let Some(arg) = &dir.arg else {
        return DirectiveTransformResult::empty();
    };
    let key = event_key(ctx, arg, el);

    let mut should_cache = ctx.options.cache_handlers && !ctx.in_v_once;
    let value = match dir.exp.as_ref().filter(|exp| !exp.is_blank()) {
        Some(exp) => {
            let (exp, cache) = handler_value(ctx, exp, el);
            should_cache &= cache;
            exp
        }
        None => simple_exp(allocator, "() => {}"),
    };

    let mut result = DirectiveTransformResult::with_props(vec![Property {
        key,
        value: JsNode::from_expression(value),
        loc: dir.loc.clone(),
    }]);
    augment(ctx, dir, &mut result);

    if should_cache {
        if let Some(first) = result.props.first_mut() {
            let value = std::mem::replace(&mut first.value, JsNode::Child(0));
            first.value = ctx.cache(value, false);
        }
    }
    for property in result.props.iter_mut() {
        match &mut property.key {
            ExpressionNode::Simple(s) => s.is_handler_key = true,
            ExpressionNode::Compound(c) => c.is_handler_key = true,
        }
    }
    result
}

/// `click` -> `onClick`; a dynamic argument goes through `toHandlerKey`
fn event_key<'a>(ctx: &mut TransformContext<'a>, arg: &ExpressionNode<'a>, el: &ElementNode<'a>) -> ExpressionNode<'a> {
    let allocator = ctx.allocator;
    match arg {
        ExpressionNode::Simple(simple) if simple.is_static => {
            let mut raw = simple.content.clone();
            if let Some(hook) = raw.strip_prefix("vue:") {
                raw = format_compact!("vnode-{hook}");
            }
            // native elements keep case-sensitive custom event names
            let name = if el.tag_type != ElementType::Element
                || raw.starts_with("vnode")
                || !raw.bytes().any(|b| b.is_ascii_uppercase())
            {
                to_handler_key(&camelize(&raw))
            } else {
                format_compact!("on:{raw}")
            };
            static_exp(allocator, name)
        }
        dynamic => {
            let helper = ctx.helper(RuntimeHelper::ToHandlerKey);
            let mut key = CompoundExpressionNode::new(allocator, dynamic.loc().clone());
            key.children.push(CompoundPart::Helper(helper));
            key.push_raw("(");
            push_expression(&mut key, dynamic.clone_in(allocator));
            key.push_raw(")");
            ExpressionNode::Compound(Box::new_in(key, allocator))
        }
    }
}

/// The handler expression, and whether it may be cached
fn handler_value<'a>(
    ctx: &mut TransformContext<'a>,
    exp: &ExpressionNode<'a>,
    el: &ElementNode<'a>,
) -> (ExpressionNode<'a>, bool) {
    let allocator = ctx.allocator;
    let source: String = match exp {
        ExpressionNode::Simple(s) => s.content.clone(),
        ExpressionNode::Compound(c) => c.loc.source.clone(),
    };
    let is_member = is_member_expression(&source);
    let is_inline = !(is_member || is_function_expression(&source));
    let multiple_statements = source.contains(';');

    if is_inline {
        ctx.add_identifier("$event");
    }
    let mut exp = if is_inline && multiple_statements {
        process_statements(ctx, exp.clone_in(allocator))
    } else {
        process_expression(ctx, exp.clone_in(allocator))
    };
    if is_inline {
        ctx.remove_identifier("$event");
    }
    let parses = scan_identifiers(&source).is_ok() || (multiple_statements && scan_statement_identifiers(&source).is_ok());
    if !parses {
        // already reported as an invalid expression; emit a no-op instead
        return (simple_exp(allocator, "() => {}"), false);
    }

    // without prefixing nothing is known about scope references
    let cacheable = ctx.prefix_identifiers()
        && !matches!(&exp, ExpressionNode::Simple(s) if s.const_type > ConstantType::NotConstant)
        && !(is_member && el.tag_type == ElementType::Component)
        && !expression_refs_scope(&exp, ctx);
    let should_cache = ctx.options.cache_handlers && !ctx.in_v_once && cacheable;

    if should_cache && is_member {
        // late binding: the cached wrapper calls whatever the member is now
        exp = match exp {
            ExpressionNode::Simple(mut s) => {
                s.content = format_compact!("{0} && {0}(...args)", s.content);
                ExpressionNode::Simple(s)
            }
            ExpressionNode::Compound(c) => {
                let mut guarded = CompoundExpressionNode::new(allocator, c.loc.clone());
                guarded.children.push(CompoundPart::Compound(Box::new_in(c.clone_in(allocator), allocator)));
                guarded.push_raw(" && ");
                guarded.children.push(CompoundPart::Compound(c));
                guarded.push_raw("(...args)");
                ExpressionNode::Compound(Box::new_in(guarded, allocator))
            }
        };
    }

    if is_inline || (should_cache && is_member) {
        let params = if is_inline { "$event" } else { "(...args)" };
        let (open, close) = if multiple_statements { ("{", "}") } else { ("(", ")") };
        let mut wrapped = CompoundExpressionNode::new(allocator, exp.loc().clone());
        wrapped.push_raw(&format_compact!("{params} => {open}"));
        push_expression(&mut wrapped, exp);
        wrapped.push_raw(close);
        exp = ExpressionNode::Compound(Box::new_in(wrapped, allocator));
    }
    (exp, should_cache)
}

fn push_expression<'a>(compound: &mut CompoundExpressionNode<'a>, exp: ExpressionNode<'a>) {
    match exp {
        ExpressionNode::Simple(s) => compound.children.push(CompoundPart::Simple(s)),
        ExpressionNode::Compound(c) => compound.children.push(CompoundPart::Compound(c)),
    }
}
