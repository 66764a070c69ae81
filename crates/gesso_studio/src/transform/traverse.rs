//! Depth-first traversal driving the node transforms.

use gesso_canvas::{RuntimeHelper, TemplateChildNode};
use gesso_palette::{SmallVec, Vec};

use super::{Cursor, Exit, ExitFn, ParentKind, TransformContext};

/// Visit every node of `children` in order
pub fn traverse_children<'a>(
    ctx: &mut TransformContext<'a>,
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    parent: ParentKind,
) {
    ctx.ancestors.push(parent);
    let mut i = 0;
    while i < children.len() {
        let mut cursor = Cursor::new(children, i);
        traverse_node(ctx, &mut cursor);
        i = cursor.next_index();
    }
    ctx.ancestors.pop();
}

/// Run enter plugins, descend, then run the collected exits in reverse
pub fn traverse_node<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) {
    let mut exits: SmallVec<[ExitFn<'a>; 4]> = SmallVec::new();

    for k in 0..ctx.node_transforms.len() {
        let (_, plugin) = ctx.node_transforms[k];
        match plugin(ctx, cursor) {
            Exit::None => {}
            Exit::One(exit) => exits.push(exit),
            Exit::Many(many) => exits.extend(many),
        }
        if cursor.is_removed() {
            return;
        }
    }

    match cursor.node_mut() {
        TemplateChildNode::Comment(_) => {
            if !ctx.ssr() {
                ctx.helper(RuntimeHelper::CreateComment);
            }
        }
        TemplateChildNode::Interpolation(_) => {
            if !ctx.ssr() {
                ctx.helper(RuntimeHelper::ToDisplayString);
            }
        }
        TemplateChildNode::Element(el) => {
            let kind = ParentKind::Element(el.tag_type);
            traverse_children(ctx, &mut el.children, kind);
        }
        TemplateChildNode::If(node) => {
            for branch in node.branches.iter_mut() {
                traverse_children(ctx, &mut branch.children, ParentKind::IfBranch);
            }
        }
        TemplateChildNode::For(node) => {
            traverse_children(ctx, &mut node.children, ParentKind::For);
        }
        _ => {}
    }

    while let Some(exit) = exits.pop() {
        exit(ctx, cursor.node_mut());
    }
}
