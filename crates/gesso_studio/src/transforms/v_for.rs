//! `v-for`.
//!
//! Replaces the element with a [`ForNode`] and, on exit, builds
//! `(openBlock(true), createElementBlock(Fragment, null, renderList(source,
//! (item, key, index) => child), flag))`.

use gesso_canvas::{
    Callee, ChildRange, ConstantType, DirectiveNode, ElementNode, ElementType, ErrorCode,
    ExpressionNode, ForNode, ForParseResult, FunctionExpression, JsNode, PropNode, Property,
    RuntimeHelper, TemplateChildNode, VNodeCall, VNodeTag,
};
use gesso_palette::{camelize, Box, Bump, PatchFlags, String, Vec};

use super::js_ast::param_names;
use super::transform_expression::process_expression;
use super::utils::{convert_to_block, convert_to_vnode, inject_prop, simple_exp, take_directive};
use crate::transform::{Cursor, Exit, TransformContext};

pub fn transform_for<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    let Some(el) = cursor.node_mut().as_element_mut() else {
        return Exit::None;
    };
    let Some(index) = el.find_dir("for", true) else {
        return Exit::None;
    };
    if el.is_template_slot() {
        return track_slot_scope(ctx, el, index);
    }

    let Some(mut dir) = take_directive(el, index) else {
        return Exit::None;
    };
    if dir.exp.is_none() {
        ctx.on_error(ErrorCode::XVForNoExpression, Some(&dir.loc));
        return Exit::None;
    }
    let Some(parse_result) = dir.for_parse_result.take() else {
        ctx.on_error(ErrorCode::XVForMalformedExpression, Some(&dir.loc));
        return Exit::None;
    };
    let parse_result = finalize_parse_result(ctx, parse_result);

    let is_template = el.tag_type == ElementType::Template;
    let is_slot_outlet = el.tag_type == ElementType::Slot;
    let has_key = el.find_prop("key", false, true).is_some();

    let names = alias_names(&parse_result);
    ctx.scopes.v_for += 1;
    ctx.add_identifiers(names.iter().map(String::as_str));
    // the key reads the loop aliases
    let key_property = if is_template { template_key(ctx, el) } else { None };

    let allocator = ctx.allocator;
    let loc = dir.loc.clone();
    cursor.replace_with(allocator, |node| match node {
        TemplateChildNode::Element(mut el) => {
            let children = if el.tag_type == ElementType::Template {
                std::mem::replace(&mut el.children, Vec::new_in(allocator))
            } else {
                let mut children = Vec::new_in(allocator);
                children.push(TemplateChildNode::Element(el));
                children
            };
            TemplateChildNode::For(Box::new_in(
                ForNode {
                    source: parse_result.source,
                    value_alias: parse_result.value,
                    key_alias: parse_result.key,
                    object_index_alias: parse_result.index,
                    children,
                    loc,
                    codegen: None,
                },
                allocator,
            ))
        }
        other => other,
    });
    tracing::trace!(aliases = ?names, "v-for");

    Exit::one(move |ctx, node| {
        ctx.scopes.v_for -= 1;
        ctx.remove_identifiers(names.iter().map(String::as_str));
        let TemplateChildNode::For(for_node) = node else { return };
        if is_template {
            check_template_key_placement(ctx, &for_node.children);
        }
        if ctx.ssr() {
            return;
        }
        build_for_codegen(ctx, for_node, is_template, is_slot_outlet, has_key, key_property);
    })
}

/// `<template v-slot v-for>`: the slot builder emits the loop, this only
/// puts the aliases in scope for the template's content.
fn track_slot_scope<'a>(ctx: &mut TransformContext<'a>, el: &mut ElementNode<'a>, index: usize) -> Exit<'a> {
    let PropNode::Directive(dir) = &mut el.props[index] else {
        return Exit::None;
    };
    let Some(parse_result) = dir.for_parse_result.take() else {
        return Exit::None;
    };
    let parse_result = finalize_parse_result(ctx, parse_result);
    let names = alias_names(&parse_result);
    dir.for_parse_result = Some(parse_result);
    ctx.add_identifiers(names.iter().map(String::as_str));
    Exit::one(move |ctx, _| ctx.remove_identifiers(names.iter().map(String::as_str)))
}

fn finalize_parse_result<'a>(ctx: &mut TransformContext<'a>, result: ForParseResult<'a>) -> ForParseResult<'a> {
    ForParseResult {
        source: process_expression(ctx, result.source),
        ..result
    }
}

fn alias_names(result: &ForParseResult<'_>) -> std::vec::Vec<String> {
    [&result.value, &result.key, &result.index]
        .into_iter()
        .flatten()
        .filter_map(|alias| alias.as_simple())
        .flat_map(|alias| param_names(&alias.content).unwrap_or_default())
        .collect()
}

/// `key` of a `<template v-for>`, which is discarded once its children move
/// into the loop
fn template_key<'a>(ctx: &mut TransformContext<'a>, el: &ElementNode<'a>) -> Option<Property<'a>> {
    let allocator = ctx.allocator;
    let index = el.find_prop("key", false, true)?;
    match &el.props[index] {
        PropNode::Attribute(attr) => {
            let value = attr.value.as_ref()?;
            Some(Property::named(allocator, "key", JsNode::string(allocator, value.content.clone())))
        }
        PropNode::Directive(dir) => {
            let exp = bound_key_expression(allocator, dir)?;
            let exp = process_expression(ctx, exp);
            Some(Property::named(allocator, "key", JsNode::from_expression(exp)))
        }
    }
}

/// `:key="x"`, or the `:key` shorthand for `:key="key"`
fn bound_key_expression<'a>(allocator: &'a Bump, dir: &DirectiveNode<'a>) -> Option<ExpressionNode<'a>> {
    match &dir.exp {
        Some(exp) => Some(exp.clone_in(allocator)),
        None => dir.static_arg().map(|arg| simple_exp(allocator, camelize(arg))),
    }
}

fn check_template_key_placement(ctx: &mut TransformContext<'_>, children: &[TemplateChildNode<'_>]) {
    for child in children {
        if let TemplateChildNode::Element(el) = child {
            if let Some(index) = el.find_prop("key", false, true) {
                let loc = el.props[index].loc().clone();
                ctx.on_error(ErrorCode::XVForTemplateKeyPlacement, Some(&loc));
                return;
            }
        }
    }
}

fn build_for_codegen<'a>(
    ctx: &mut TransformContext<'a>,
    for_node: &mut ForNode<'a>,
    is_template: bool,
    is_slot_outlet: bool,
    has_key: bool,
    key_property: Option<Property<'a>>,
) {
    let allocator = ctx.allocator;
    let stable = matches!(&for_node.source, ExpressionNode::Simple(s) if s.const_type > ConstantType::NotConstant);
    let fragment_flag = if stable {
        PatchFlags::STABLE_FRAGMENT
    } else if has_key || key_property.is_some() {
        PatchFlags::KEYED_FRAGMENT
    } else {
        PatchFlags::UNKEYED_FRAGMENT
    };

    let single_element = for_node.children.len() == 1
        && matches!(for_node.children[0], TemplateChildNode::Element(_));
    let slot_child = single_element
        && (is_slot_outlet
            || (is_template
                && for_node.children[0]
                    .as_element()
                    .is_some_and(|el| el.tag_type == ElementType::Slot)));

    let child_block = if slot_child {
        if let (Some(key), Some(TemplateChildNode::Element(el))) = (key_property, for_node.children.first_mut()) {
            if let Some(JsNode::Call(call)) = el.codegen.as_mut() {
                if call.callee == Callee::Helper(RuntimeHelper::RenderSlot) {
                    inject_render_slot_prop(ctx, &mut call.arguments, key);
                }
            }
        }
        JsNode::Child(0)
    } else if !single_element {
        let fragment = ctx.helper(RuntimeHelper::Fragment);
        let mut call = VNodeCall::new(VNodeTag::Helper(fragment), for_node.loc.clone());
        if let Some(key) = key_property {
            let mut properties = Vec::new_in(allocator);
            properties.push(key);
            call.props = Some(JsNode::object(allocator, properties));
        }
        call.children = Some(JsNode::Children(ChildRange::All));
        call.patch_flag = Some(PatchFlags::STABLE_FRAGMENT.into());
        call.is_block = true;
        ctx.helper(RuntimeHelper::OpenBlock);
        ctx.helper(RuntimeHelper::CreateElementBlock);
        JsNode::VNodeCall(Box::new_in(call, allocator))
    } else {
        if let Some(TemplateChildNode::Element(el)) = for_node.children.first_mut() {
            if let Some(call) = el.codegen.as_mut().and_then(JsNode::as_vnode_call_mut) {
                if let Some(key) = key_property {
                    inject_prop(ctx, call, key);
                }
                if stable {
                    convert_to_vnode(ctx, call);
                } else {
                    convert_to_block(ctx, call);
                }
            }
        }
        JsNode::Child(0)
    };

    let mut function = FunctionExpression::new(allocator);
    function.params = for_loop_params(allocator, for_node);
    function.returns = Some(child_block);
    function.newline = true;

    let render_list = ctx.helper(RuntimeHelper::RenderList);
    let mut arguments = Vec::new_in(allocator);
    arguments.push(JsNode::from_expression(for_node.source.clone_in(allocator)));
    arguments.push(JsNode::Function(Box::new_in(function, allocator)));

    let fragment = ctx.helper(RuntimeHelper::Fragment);
    let mut call = VNodeCall::new(VNodeTag::Helper(fragment), for_node.loc.clone());
    call.children = Some(JsNode::helper_call(allocator, render_list, arguments));
    call.patch_flag = Some(fragment_flag.into());
    call.is_block = true;
    call.disable_tracking = !stable;
    ctx.helper(RuntimeHelper::OpenBlock);
    ctx.helper(RuntimeHelper::CreateElementBlock);
    for_node.codegen = Some(JsNode::VNodeCall(Box::new_in(call, allocator)));
}

/// `(value, key, index)` trimmed from the right; gaps become `_`, `__`
fn for_loop_params<'a>(allocator: &'a Bump, for_node: &ForNode<'a>) -> Vec<'a, ExpressionNode<'a>> {
    let aliases = [&for_node.value_alias, &for_node.key_alias, &for_node.object_index_alias];
    let len = aliases.iter().rposition(|a| a.is_some()).map_or(0, |i| i + 1);
    let mut params = Vec::with_capacity_in(len, allocator);
    for (i, alias) in aliases.iter().take(len).enumerate() {
        params.push(match alias {
            Some(alias) => alias.clone_in(allocator),
            None => simple_exp(allocator, "_".repeat(i + 1)),
        });
    }
    params
}

/// Add a prop to a `renderSlot` call's props argument
fn inject_render_slot_prop<'a>(ctx: &mut TransformContext<'a>, arguments: &mut Vec<'a, JsNode<'a>>, prop: Property<'a>) {
    let allocator = ctx.allocator;
    match arguments.get_mut(2) {
        Some(JsNode::Object(object)) => object.properties.insert(0, prop),
        Some(other) => {
            let existing = std::mem::replace(other, JsNode::object(allocator, Vec::new_in(allocator)));
            let mut properties = Vec::new_in(allocator);
            properties.push(prop);
            let mut merge = Vec::new_in(allocator);
            merge.push(JsNode::object(allocator, properties));
            merge.push(existing);
            let helper = ctx.helper(RuntimeHelper::MergeProps);
            *other = JsNode::helper_call(allocator, helper, merge);
        }
        None => {
            let mut properties = Vec::new_in(allocator);
            properties.push(prop);
            arguments.push(JsNode::object(allocator, properties));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::transform::{transform, TransformPlugins};
    use gesso_canvas::{
        ErrorCode, ExpressionNode, ForNode, JsNode, RuntimeHelper, TemplateChildNode, TransformOptions,
    };
    use gesso_palette::Bump;
    use gesso_sketch::parse;

    fn for_node<'r, 'a>(node: &'r TemplateChildNode<'a>) -> &'r ForNode<'a> {
        match node {
            TemplateChildNode::For(n) => n,
            other => panic!("expected for node, got {:?}", other.node_type()),
        }
    }

    fn params(node: &ForNode<'_>) -> std::vec::Vec<std::string::String> {
        let call = node.codegen.as_ref().and_then(JsNode::as_vnode_call).unwrap();
        let Some(JsNode::Call(render_list)) = &call.children else {
            panic!("expected renderList call");
        };
        let JsNode::Function(function) = &render_list.arguments[1] else {
            panic!("expected iterator function");
        };
        function
            .params
            .iter()
            .map(|p| match p {
                ExpressionNode::Simple(s) => s.content.to_string(),
                ExpressionNode::Compound(_) => std::string::String::new(),
            })
            .collect()
    }

    #[test]
    fn test_element_loop() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<ul><li v-for="(item, i) in items" :key="item.id">{{ item }}</li></ul>"#);
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());

        let ul = root.children[0].as_element().unwrap();
        let node = for_node(&ul.children[0]);
        let call = node.codegen.as_ref().and_then(JsNode::as_vnode_call).unwrap();
        assert!(call.is_block);
        assert!(call.disable_tracking);
        assert_eq!(call.patch_flag.map(|f| f.value()), Some(128));
        assert_eq!(params(node), vec!["item", "i"]);

        let li = node.children[0].as_element().unwrap();
        assert!(li.codegen.as_ref().and_then(JsNode::as_vnode_call).unwrap().is_block);
        assert!(root.helpers.contains(&RuntimeHelper::RenderList));
    }

    #[test]
    fn test_param_gaps() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<div v-for="(v, , i) in obj"/>"#);
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        assert_eq!(params(for_node(&root.children[0])), vec!["v", "__", "i"]);
    }

    #[test]
    fn test_constant_source_is_stable() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<div><p v-for="n in 10">{{ n }}</p></div>"#);
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        transform(&allocator, &mut root, options, &TransformPlugins::base());
        let div = root.children[0].as_element().unwrap();
        let node = for_node(&div.children[0]);
        let call = node.codegen.as_ref().and_then(JsNode::as_vnode_call).unwrap();
        assert_eq!(call.patch_flag.map(|f| f.value()), Some(64));
        assert!(!call.disable_tracking);
        let p = node.children[0].as_element().unwrap();
        assert!(!p.codegen.as_ref().and_then(JsNode::as_vnode_call).unwrap().is_block);
    }

    #[test]
    fn test_template_loop() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<template v-for="x in xs" :key="x"><a/><b/></template>"#);
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        let node = for_node(&root.children[0]);
        assert_eq!(node.children.len(), 2);
        let call = node.codegen.as_ref().and_then(JsNode::as_vnode_call).unwrap();
        assert_eq!(call.patch_flag.map(|f| f.value()), Some(128));
    }

    #[test]
    fn test_errors() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<div v-for="items"/><p v-for/>"#);
        let diagnostics = transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        let codes: std::vec::Vec<_> = diagnostics.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::XVForMalformedExpression, ErrorCode::XVForNoExpression]);

        let (mut root, _) = parse(&allocator, r#"<template v-for="x in xs"><a :key="x"/></template>"#);
        let diagnostics = transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        assert_eq!(diagnostics.errors[0].code, ErrorCode::XVForTemplateKeyPlacement);
    }
}
