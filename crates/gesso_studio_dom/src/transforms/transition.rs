//! `<Transition>` animates exactly one element.

use gesso_canvas::{ElementNode, ElementType, ErrorCode, RuntimeHelper, TemplateChildNode};
use gesso_studio::{Cursor, Exit, TransformContext};

use crate::parser_options::builtin_component;

pub fn warn_transition_children<'a>(_ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    let TemplateChildNode::Element(el) = cursor.node() else {
        return Exit::None;
    };
    if el.tag_type != ElementType::Component || builtin_component(&el.tag) != Some(RuntimeHelper::Transition) {
        return Exit::None;
    }
    Exit::one(|ctx, node| {
        let TemplateChildNode::Element(el) = node else { return };
        if has_multiple_children(&el.children) {
            let loc = el.loc.clone();
            ctx.on_error(ErrorCode::XTransitionInvalidChildren, Some(&loc));
        }
    })
}

fn has_multiple_children(children: &[TemplateChildNode<'_>]) -> bool {
    let mut rendered = children
        .iter()
        .filter(|c| !matches!(c, TemplateChildNode::Comment(_)) && !c.is_whitespace_text());
    let Some(first) = rendered.next() else { return false };
    if rendered.next().is_some() {
        return true;
    }
    match first {
        TemplateChildNode::For(_) => true,
        TemplateChildNode::If(node) => node.branches.iter().any(|b| has_multiple_children(&b.children)),
        TemplateChildNode::Element(el) => is_transparent(el) && has_multiple_children(&el.children),
        _ => false,
    }
}

/// A plain `<template>` renders its children in place
fn is_transparent(el: &ElementNode<'_>) -> bool {
    el.tag_type == ElementType::Template
}
