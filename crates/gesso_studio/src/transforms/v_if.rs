//! `v-if` / `v-else-if` / `v-else`.
//!
//! The `v-if` element is replaced by an [`IfNode`] holding the first branch.
//! Each following `v-else-if`/`v-else` sibling is moved into that node as a
//! new branch and traversed in place. The codegen is a right-leaning chain
//! of conditionals over the branches, rebuilt whenever a branch is added.

use gesso_canvas::{
    Callee, ConditionalExpression, ConstantType, DirectiveNode, ElementNode, ElementType, ErrorCode,
    ExpressionNode, IfBranchNode, IfNode, JsNode, PropNode, Property, RuntimeHelper, SourceLocation,
    TemplateChildNode, UserKey, VNodeCall, VNodeTag,
};
use gesso_palette::{format_compact, Box, Bump, PatchFlags, Vec};

use super::transform_expression::process_expression;
use super::transform_text::{merge_text_children, TextContainer};
use super::utils::{convert_to_block, inject_prop, take_directive};
use crate::transform::{traverse_children, Cursor, Exit, ParentKind, TransformContext};

pub fn transform_if<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    let Some(el) = cursor.node().as_element() else {
        return Exit::None;
    };
    if el.is_template_slot() {
        return Exit::None;
    }
    let Some(index) = el.find_dir_by(|n| matches!(n, "if" | "else-if" | "else"), true) else {
        return Exit::None;
    };
    if el.find_dir("for", true).is_some() {
        ctx.on_error(ErrorCode::WarnVIfVForPrecedence, Some(&el.loc));
    }

    let Some(el) = cursor.node_mut().as_element_mut() else {
        return Exit::None;
    };
    let el_loc = el.loc.clone();
    let Some(mut dir) = take_directive(el, index) else {
        return Exit::None;
    };
    let condition = if dir.name == "else" {
        None
    } else {
        Some(take_condition(ctx, &mut dir, &el_loc))
    };

    if dir.name == "if" {
        enter_if(ctx, cursor, condition)
    } else {
        enter_else(ctx, cursor, &dir, condition);
        Exit::None
    }
}

/// The branch condition, `true` when it is missing
fn take_condition<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &mut DirectiveNode<'a>,
    el_loc: &SourceLocation,
) -> ExpressionNode<'a> {
    match dir.exp.take() {
        Some(exp) if !exp.is_blank() => process_expression(ctx, exp),
        other => {
            ctx.on_error(ErrorCode::XVIfNoExpression, Some(&dir.loc));
            let loc = other.map_or_else(|| el_loc.clone(), |e| e.loc().clone());
            let exp = ExpressionNode::simple(ctx.allocator, "true", false, loc, ConstantType::NotConstant);
            process_expression(ctx, exp)
        }
    }
}

fn enter_if<'a>(
    ctx: &mut TransformContext<'a>,
    cursor: &mut Cursor<'_, 'a>,
    condition: Option<ExpressionNode<'a>>,
) -> Exit<'a> {
    let allocator = ctx.allocator;
    let key_base: u32 = cursor.siblings()[..cursor.index()]
        .iter()
        .map(|sibling| match sibling {
            TemplateChildNode::If(n) => n.branches.len() as u32,
            _ => 0,
        })
        .sum();

    cursor.replace_with(allocator, |node| match node {
        TemplateChildNode::Element(el) => {
            let loc = el.loc.clone();
            let mut branches = Vec::new_in(allocator);
            branches.push(create_branch(allocator, el, condition));
            TemplateChildNode::If(Box::new_in(
                IfNode {
                    branches,
                    key_base,
                    loc,
                    codegen: None,
                },
                allocator,
            ))
        }
        other => other,
    });
    tracing::trace!(key_base, "v-if");

    if ctx.ssr() {
        return Exit::None;
    }
    Exit::one(|ctx, node| {
        let TemplateChildNode::If(if_node) = node else { return };
        merge_text_children(ctx, &mut if_node.branches[0].children, TextContainer::Other);
        build_branch_codegen(ctx, if_node, 0);
        rebuild_if_codegen(ctx, if_node, false);
    })
}

fn enter_else<'a>(
    ctx: &mut TransformContext<'a>,
    cursor: &mut Cursor<'_, 'a>,
    dir: &DirectiveNode<'a>,
    condition: Option<ExpressionNode<'a>>,
) {
    let allocator = ctx.allocator;
    let mut comments: std::vec::Vec<TemplateChildNode<'a>> = std::vec::Vec::new();
    let mut found = None;
    let mut i = cursor.index();
    while i > 0 {
        i -= 1;
        let sibling = &cursor.siblings()[i];
        if matches!(sibling, TemplateChildNode::Comment(_)) {
            comments.insert(0, cursor.remove_before(i));
        } else if sibling.is_whitespace_text() {
            cursor.remove_before(i);
        } else {
            if matches!(sibling, TemplateChildNode::If(_)) {
                found = Some(i);
            }
            break;
        }
    }

    let Some(if_index) = found else {
        let loc = cursor.node().loc().clone();
        ctx.on_error(ErrorCode::XVElseNoAdjacentIf, Some(&loc));
        return;
    };

    let TemplateChildNode::Element(el) = cursor.remove() else {
        return;
    };
    let el_loc = el.loc.clone();
    let mut branch = create_branch(allocator, el, condition);
    if !comments.is_empty() {
        let mut children = Vec::with_capacity_in(comments.len() + branch.children.len(), allocator);
        children.extend(comments);
        children.extend(branch.children.drain(..));
        branch.children = children;
    }

    let TemplateChildNode::If(if_node) = &mut cursor.siblings_mut()[if_index] else {
        return;
    };
    if dir.name == "else-if" && if_node.branches.last().is_some_and(|b| b.condition.is_none()) {
        ctx.on_error(ErrorCode::XVElseNoAdjacentIf, Some(&el_loc));
    }
    if let Some(key) = &branch.user_key {
        if if_node.branches.iter().any(|b| b.user_key.as_ref() == Some(key)) {
            ctx.on_error(ErrorCode::XVIfSameKey, Some(&branch.loc));
        }
    }

    let had_comment_tail = if_node.branches.iter().all(|b| b.condition.is_some());
    if_node.branches.push(branch);
    let index = if_node.branches.len() - 1;
    tracing::trace!(index, "v-else branch");

    traverse_children(ctx, &mut if_node.branches[index].children, ParentKind::IfBranch);
    if ctx.ssr() {
        return;
    }
    merge_text_children(ctx, &mut if_node.branches[index].children, TextContainer::Other);
    build_branch_codegen(ctx, if_node, index);
    rebuild_if_codegen(ctx, if_node, had_comment_tail);
}

fn create_branch<'a>(
    allocator: &'a Bump,
    mut el: Box<'a, ElementNode<'a>>,
    condition: Option<ExpressionNode<'a>>,
) -> IfBranchNode<'a> {
    let is_template_if = el.tag_type == ElementType::Template;
    let user_key = user_key_of(&el);
    let loc = el.loc.clone();
    let children = if is_template_if && el.find_dir("for", true).is_none() {
        std::mem::replace(&mut el.children, Vec::new_in(allocator))
    } else {
        let mut children = Vec::new_in(allocator);
        children.push(TemplateChildNode::Element(el));
        children
    };
    IfBranchNode {
        condition,
        children,
        user_key,
        is_template_if,
        loc,
        codegen: None,
    }
}

fn user_key_of(el: &ElementNode<'_>) -> Option<UserKey> {
    let index = el.find_prop("key", false, false)?;
    match &el.props[index] {
        PropNode::Attribute(attr) => Some(UserKey {
            content: attr.value.as_ref().map(|v| v.content.clone()).unwrap_or_default(),
            is_static: true,
        }),
        PropNode::Directive(dir) => dir.exp.as_ref().map(|exp| UserKey {
            content: super::utils::expression_source(exp),
            is_static: false,
        }),
    }
}

/// Codegen of one branch, keyed `key_base + index`
fn build_branch_codegen<'a>(ctx: &mut TransformContext<'a>, if_node: &mut IfNode<'a>, index: usize) {
    let allocator = ctx.allocator;
    let key = if_node.key_base + index as u32;
    let key_prop = Property::named(
        allocator,
        "key",
        JsNode::simple(allocator, format_compact!("{key}"), ConstantType::CanHoist),
    );
    let branch = &mut if_node.branches[index];

    let single = branch.children.len() == 1;
    let codegen = match branch.children.first_mut() {
        Some(TemplateChildNode::Element(el)) if single => {
            match el.codegen.as_mut() {
                Some(JsNode::Call(call)) if call.callee == Callee::Helper(RuntimeHelper::RenderSlot) => {
                    inject_slot_key(ctx, &mut call.arguments, key_prop);
                }
                Some(codegen) => {
                    if let Some(call) = codegen.as_vnode_call_mut() {
                        convert_to_block(ctx, call);
                        inject_prop(ctx, call, key_prop);
                    }
                }
                None => {}
            }
            JsNode::Child(0)
        }
        Some(TemplateChildNode::For(for_node)) if single => {
            if let Some(call) = for_node.codegen.as_mut().and_then(JsNode::as_vnode_call_mut) {
                inject_prop(ctx, call, key_prop);
            }
            JsNode::Child(0)
        }
        _ => {
            let mut flags = PatchFlags::STABLE_FRAGMENT;
            let non_comments = branch
                .children
                .iter()
                .filter(|c| !matches!(c, TemplateChildNode::Comment(_)))
                .count();
            if !branch.is_template_if && non_comments == 1 {
                flags |= PatchFlags::DEV_ROOT_FRAGMENT;
            }
            let fragment = ctx.helper(RuntimeHelper::Fragment);
            let mut call = VNodeCall::new(VNodeTag::Helper(fragment), branch.loc.clone());
            let mut properties = Vec::new_in(allocator);
            properties.push(key_prop);
            call.props = Some(JsNode::object(allocator, properties));
            call.children = Some(JsNode::Children(gesso_canvas::ChildRange::All));
            call.patch_flag = Some(flags.into());
            call.is_block = true;
            ctx.helper(RuntimeHelper::OpenBlock);
            ctx.helper(RuntimeHelper::CreateElementBlock);
            JsNode::VNodeCall(Box::new_in(call, allocator))
        }
    };
    branch.codegen = Some(codegen);
}

/// `renderSlot($slots, name, props, fallback)`: the key goes into `props`
fn inject_slot_key<'a>(ctx: &mut TransformContext<'a>, arguments: &mut Vec<'a, JsNode<'a>>, key: Property<'a>) {
    let allocator = ctx.allocator;
    match arguments.get_mut(2) {
        None => {
            let mut properties = Vec::new_in(allocator);
            properties.push(key);
            arguments.push(JsNode::object(allocator, properties));
        }
        Some(JsNode::Object(object)) => {
            if !object.properties.iter().any(|p| p.static_key() == Some("key")) {
                object.properties.insert(0, key);
            }
        }
        Some(other) => {
            let existing = std::mem::replace(other, JsNode::object(allocator, Vec::new_in(allocator)));
            let mut properties = Vec::new_in(allocator);
            properties.push(key);
            let mut merge_args = Vec::new_in(allocator);
            merge_args.push(JsNode::object(allocator, properties));
            merge_args.push(existing);
            let helper = ctx.helper(RuntimeHelper::MergeProps);
            *other = JsNode::helper_call(allocator, helper, merge_args);
        }
    }
}

/// Rebuild the conditional chain over all branches. A chain whose last
/// branch has a condition ends in `createCommentVNode("v-if", true)`.
fn rebuild_if_codegen<'a>(ctx: &mut TransformContext<'a>, if_node: &mut IfNode<'a>, had_comment_tail: bool) {
    let allocator = ctx.allocator;
    if had_comment_tail && if_node.codegen.is_some() {
        ctx.remove_helper(RuntimeHelper::CreateComment);
    }

    let mut chain: Option<JsNode<'a>> = None;
    for (i, branch) in if_node.branches.iter().enumerate().rev() {
        chain = Some(match &branch.condition {
            None => JsNode::Branch(i),
            Some(condition) => {
                let alternate = match chain.take() {
                    Some(alternate) => alternate,
                    None => comment_placeholder(ctx, allocator),
                };
                JsNode::Conditional(Box::new_in(
                    ConditionalExpression {
                        test: JsNode::from_expression(condition.clone_in(allocator)),
                        consequent: JsNode::Branch(i),
                        alternate,
                        newline: true,
                    },
                    allocator,
                ))
            }
        });
    }
    let Some(chain) = chain else { return };

    match &mut if_node.codegen {
        Some(JsNode::Cache(cache)) => cache.value = chain,
        slot => *slot = Some(chain),
    }
}

fn comment_placeholder<'a>(ctx: &mut TransformContext<'a>, allocator: &'a Bump) -> JsNode<'a> {
    let helper = ctx.helper(RuntimeHelper::CreateComment);
    let mut arguments = Vec::new_in(allocator);
    arguments.push(JsNode::simple(allocator, "\"v-if\"", ConstantType::CanStringify));
    arguments.push(JsNode::simple(allocator, "true", ConstantType::CanStringify));
    JsNode::helper_call(allocator, helper, arguments)
}

#[cfg(test)]
mod tests {
    use crate::transform::{transform, TransformPlugins};
    use gesso_canvas::{
        ErrorCode, IfNode, JsNode, ParserOptions, RootNode, RuntimeHelper, TemplateChildNode,
        TransformOptions,
    };
    use gesso_palette::Bump;
    use gesso_sketch::{parse, parse_with_options};

    fn run<'a>(allocator: &'a Bump, source: &'a str) -> (RootNode<'a>, crate::transform::Diagnostics) {
        let (mut root, _) = parse(allocator, source);
        let diagnostics = transform(allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        (root, diagnostics)
    }

    fn if_node<'r, 'a>(node: &'r TemplateChildNode<'a>) -> &'r IfNode<'a> {
        match node {
            TemplateChildNode::If(n) => n,
            other => panic!("expected if node, got {:?}", other.node_type()),
        }
    }

    /// The `key` value injected into a branch's element
    fn branch_key(node: &IfNode<'_>, index: usize) -> std::string::String {
        let el = node.branches[index].children[0].as_element().unwrap();
        let call = el.codegen.as_ref().and_then(JsNode::as_vnode_call).unwrap();
        assert!(call.is_block);
        match &call.props {
            Some(JsNode::Object(obj)) => match &obj.properties[0].value {
                JsNode::Simple(s) => s.content.to_string(),
                other => panic!("unexpected key {other:?}"),
            },
            other => panic!("unexpected props {other:?}"),
        }
    }

    #[test]
    fn test_chain_of_three() {
        let allocator = Bump::new();
        let (root, diagnostics) = run(&allocator, r#"<div v-if="a"/><p v-else-if="b"/><span v-else/>"#);
        assert!(diagnostics.errors.is_empty());
        assert_eq!(root.children.len(), 1);

        let node = if_node(&root.children[0]);
        assert_eq!(node.branches.len(), 3);
        assert_eq!(
            (0..3).map(|i| branch_key(node, i)).collect::<Vec<_>>(),
            vec!["0", "1", "2"]
        );

        let Some(JsNode::Conditional(outer)) = &node.codegen else {
            panic!("expected conditional");
        };
        assert!(matches!(outer.consequent, JsNode::Branch(0)));
        let JsNode::Conditional(inner) = &outer.alternate else {
            panic!("expected nested conditional");
        };
        assert!(matches!(inner.consequent, JsNode::Branch(1)));
        assert!(matches!(inner.alternate, JsNode::Branch(2)));
        assert!(!root.helpers.contains(&RuntimeHelper::CreateComment));
    }

    #[test]
    fn test_if_without_else_ends_in_comment() {
        let allocator = Bump::new();
        let (root, _) = run(&allocator, r#"<div v-if="a"/>"#);
        let node = if_node(&root.children[0]);
        let Some(JsNode::Conditional(cond)) = &node.codegen else {
            panic!("expected conditional");
        };
        assert!(matches!(cond.alternate, JsNode::Call(_)));
        assert!(root.helpers.contains(&RuntimeHelper::CreateComment));
    }

    #[test]
    fn test_comments_and_whitespace_between_branches() {
        let allocator = Bump::new();
        let parser_options = ParserOptions {
            comments: true,
            ..Default::default()
        };
        let (mut root, _) = parse_with_options(&allocator, "<div v-if=\"a\"/> <!--c--> <p v-else/>", parser_options);
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        assert_eq!(root.children.len(), 1);
        let node = if_node(&root.children[0]);
        assert!(matches!(node.branches[1].children[0], TemplateChildNode::Comment(_)));
    }

    #[test]
    fn test_keys_continue_across_chains() {
        let allocator = Bump::new();
        let (root, _) = run(&allocator, r#"<div><a v-if="x"/><b v-else/><i v-if="y"/></div>"#);
        let div = root.children[0].as_element().unwrap();
        let second = if_node(&div.children[1]);
        assert_eq!(second.key_base, 2);
        assert_eq!(branch_key(second, 0), "2");
    }

    #[test]
    fn test_template_branch_is_fragment() {
        let allocator = Bump::new();
        let (root, _) = run(&allocator, r#"<template v-if="ok"><a/><b/></template>"#);
        let node = if_node(&root.children[0]);
        let call = node.branches[0].codegen.as_ref().and_then(JsNode::as_vnode_call).unwrap();
        assert!(call.is_block);
        assert_eq!(call.patch_flag.map(|f| f.value()), Some(64));
        assert_eq!(node.branches[0].children.len(), 2);
    }

    #[test]
    fn test_errors() {
        let allocator = Bump::new();
        let (_, diagnostics) = run(&allocator, r#"<div v-else/>"#);
        assert_eq!(diagnostics.errors[0].code, ErrorCode::XVElseNoAdjacentIf);

        let (_, diagnostics) = run(&allocator, r#"<div v-if=""/>"#);
        assert_eq!(diagnostics.errors[0].code, ErrorCode::XVIfNoExpression);

        let (_, diagnostics) = run(&allocator, r#"<a v-if="x" key="k"/><b v-else key="k"/>"#);
        assert_eq!(diagnostics.errors[0].code, ErrorCode::XVIfSameKey);

        let (_, diagnostics) = run(&allocator, r#"<a v-if="x" v-for="i in l"/>"#);
        assert_eq!(diagnostics.warnings[0].code, ErrorCode::WarnVIfVForPrecedence);
    }
}
