//! Helpers shared by the transforms.

use gesso_canvas::{
    ConstantType, DirectiveNode, ElementNode, ExpressionNode, JsNode, PropNode, Property,
    RuntimeHelper, SourceLocation, VNodeCall,
};
use gesso_palette::{Box, Bump, String, Vec};

use crate::runtime_helpers::{get_vnode_block_helper, get_vnode_helper};
use crate::transform::TransformContext;

/// Turn a vnode call into a block, rebalancing the helper counts
pub fn convert_to_block<'a>(ctx: &mut TransformContext<'a>, call: &mut VNodeCall<'a>) {
    if call.is_block {
        return;
    }
    call.is_block = true;
    ctx.remove_helper(get_vnode_helper(ctx.ssr(), call.is_component));
    ctx.helper(RuntimeHelper::OpenBlock);
    ctx.helper(get_vnode_block_helper(ctx.ssr(), call.is_component));
}

/// Turn a block back into a plain vnode call
pub fn convert_to_vnode<'a>(ctx: &mut TransformContext<'a>, call: &mut VNodeCall<'a>) {
    if !call.is_block {
        return;
    }
    call.is_block = false;
    ctx.remove_helper(RuntimeHelper::OpenBlock);
    ctx.remove_helper(get_vnode_block_helper(ctx.ssr(), call.is_component));
    ctx.helper(get_vnode_helper(ctx.ssr(), call.is_component));
}

/// Add `prop` in front of a vnode call's props unless a property with the
/// same static key is already present.
pub fn inject_prop<'a>(ctx: &mut TransformContext<'a>, call: &mut VNodeCall<'a>, prop: Property<'a>) {
    let allocator = ctx.allocator;
    let key = prop.static_key().map(String::from);

    match call.props.take() {
        None => {
            let mut properties = Vec::new_in(allocator);
            properties.push(prop);
            call.props = Some(JsNode::object(allocator, properties));
        }
        Some(JsNode::Object(mut object)) => {
            let exists = key.is_some()
                && object
                    .properties
                    .iter()
                    .any(|p| p.static_key() == key.as_deref());
            if !exists {
                object.properties.insert(0, prop);
            }
            call.props = Some(JsNode::Object(object));
        }
        Some(JsNode::Call(mut merge)) if merge.callee == gesso_canvas::Callee::Helper(RuntimeHelper::MergeProps) => {
            match merge.arguments.first_mut() {
                Some(JsNode::Object(first)) => {
                    let exists = key.is_some()
                        && first
                            .properties
                            .iter()
                            .any(|p| p.static_key() == key.as_deref());
                    if !exists {
                        first.properties.insert(0, prop);
                    }
                }
                _ => {
                    let mut properties = Vec::new_in(allocator);
                    properties.push(prop);
                    merge.arguments.insert(0, JsNode::object(allocator, properties));
                }
            }
            call.props = Some(JsNode::Call(merge));
        }
        Some(JsNode::Call(mut normalize))
            if normalize.callee == gesso_canvas::Callee::Helper(RuntimeHelper::NormalizeProps) =>
        {
            // normalizeProps(guardReactiveProps(x)) -> mergeProps({ prop }, x)
            let inner = normalize.arguments.pop();
            ctx.remove_helper(RuntimeHelper::NormalizeProps);
            let inner = match inner {
                Some(JsNode::Call(mut guard))
                    if guard.callee == gesso_canvas::Callee::Helper(RuntimeHelper::GuardReactiveProps) =>
                {
                    ctx.remove_helper(RuntimeHelper::GuardReactiveProps);
                    guard.arguments.pop()
                }
                other => other,
            };
            let mut properties = Vec::new_in(allocator);
            properties.push(prop);
            let mut arguments = Vec::new_in(allocator);
            arguments.push(JsNode::object(allocator, properties));
            arguments.extend(inner);
            let helper = ctx.helper(RuntimeHelper::MergeProps);
            call.props = Some(JsNode::helper_call(allocator, helper, arguments));
        }
        Some(other) => {
            let mut properties = Vec::new_in(allocator);
            properties.push(prop);
            let mut arguments = Vec::new_in(allocator);
            arguments.push(JsNode::object(allocator, properties));
            arguments.push(other);
            let helper = ctx.helper(RuntimeHelper::MergeProps);
            call.props = Some(JsNode::helper_call(allocator, helper, arguments));
        }
    }
}

/// Detach the prop at `index`, which must be a directive
pub fn take_directive<'a>(el: &mut ElementNode<'a>, index: usize) -> Option<Box<'a, DirectiveNode<'a>>> {
    if !matches!(el.props.get(index), Some(PropNode::Directive(_))) {
        return None;
    }
    match el.props.remove(index) {
        PropNode::Directive(dir) => Some(dir),
        PropNode::Attribute(_) => None,
    }
}

/// `my-comp` -> `_component_my_comp`; other non-word characters become
/// their char code.
pub fn to_valid_asset_id(name: &str, kind: &str) -> String {
    let mut out = String::with_capacity(name.len() + kind.len() + 2);
    out.push('_');
    out.push_str(kind);
    out.push('_');
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if c == '-' {
            out.push('_');
        } else {
            out.push_str(&(c as u32).to_string());
        }
    }
    out
}

/// A fresh non-static expression
pub fn simple_exp<'a>(allocator: &'a Bump, content: impl Into<String>) -> ExpressionNode<'a> {
    ExpressionNode::simple(
        allocator,
        content,
        false,
        SourceLocation::STUB,
        ConstantType::NotConstant,
    )
}

/// A fresh static (string) expression
pub fn static_exp<'a>(allocator: &'a Bump, content: impl Into<String>) -> ExpressionNode<'a> {
    ExpressionNode::simple(
        allocator,
        content,
        true,
        SourceLocation::STUB,
        ConstantType::CanStringify,
    )
}

/// Source text of an expression as written, for diagnostics and keys
pub fn expression_source(exp: &ExpressionNode<'_>) -> String {
    match exp {
        ExpressionNode::Simple(s) => s.content.clone(),
        ExpressionNode::Compound(c) => c.loc.source.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformPlugins;
    use gesso_canvas::{TransformOptions, VNodeTag};

    #[test]
    fn test_asset_ids() {
        assert_eq!(to_valid_asset_id("my-comp", "component"), "_component_my_comp");
        assert_eq!(to_valid_asset_id("Foo", "component"), "_component_Foo");
        assert_eq!(to_valid_asset_id("my.dir", "directive"), "_directive_my46dir");
    }

    #[test]
    fn test_inject_prop_variants() {
        let allocator = Bump::new();
        let mut ctx = TransformContext::new(&allocator, TransformOptions::default(), &TransformPlugins::empty());

        let mut call = VNodeCall::new(VNodeTag::Literal(String::from("div")), SourceLocation::STUB);
        inject_prop(&mut ctx, &mut call, Property::named(&allocator, "key", JsNode::string(&allocator, "0")));
        inject_prop(&mut ctx, &mut call, Property::named(&allocator, "key", JsNode::string(&allocator, "1")));
        match &call.props {
            Some(JsNode::Object(obj)) => assert_eq!(obj.properties.len(), 1),
            other => panic!("unexpected props {other:?}"),
        }

        let mut spread = VNodeCall::new(VNodeTag::Literal(String::from("div")), SourceLocation::STUB);
        spread.props = Some(JsNode::simple(&allocator, "attrs", ConstantType::NotConstant));
        inject_prop(&mut ctx, &mut spread, Property::named(&allocator, "key", JsNode::string(&allocator, "0")));
        match &spread.props {
            Some(JsNode::Call(call)) => assert_eq!(call.arguments.len(), 2),
            other => panic!("unexpected props {other:?}"),
        }
        assert!(ctx.helpers.contains(RuntimeHelper::MergeProps));
    }
}
