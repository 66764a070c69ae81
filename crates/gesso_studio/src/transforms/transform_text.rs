//! Adjacent text merging.
//!
//! Runs of text and interpolations collapse into one compound
//! (`"a" + _toDisplayString(b)`). Unless the text is the container's only
//! child and the container can set `textContent` directly, each merged run
//! then becomes a `createTextVNode(...)` call.

use gesso_canvas::{
    CommentNode, CompoundExpressionNode, CompoundPart, ConstantType, ElementNode, ElementType, JsNode, PropNode,
    RuntimeHelper, SourceLocation, TemplateChildNode, TextCallNode,
};
use gesso_palette::{Box, Bump, PatchFlag, PatchFlags, String, Vec};

use super::hoist_static::text_constant_type;
use crate::transform::{Cursor, Exit, TransformContext};

/// Kind of node owning a children list being merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextContainer {
    Root,
    /// Native element whose directives all compile to props
    PlainElement,
    /// Components, slots, templates, loop bodies and conditional branches
    Other,
}

impl TextContainer {
    pub fn of_element(ctx: &TransformContext<'_>, el: &ElementNode<'_>) -> Self {
        let plain = el.tag_type == ElementType::Element
            && !el.props.iter().any(|p| match p {
                PropNode::Directive(dir) => !ctx.has_directive_transform(&dir.name),
                PropNode::Attribute(_) => false,
            });
        if plain {
            Self::PlainElement
        } else {
            Self::Other
        }
    }

    fn keeps_lone_text(self) -> bool {
        matches!(self, Self::Root | Self::PlainElement)
    }
}

pub fn transform_text<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    if ctx.ssr() || !matches!(cursor.node(), TemplateChildNode::Element(_) | TemplateChildNode::For(_)) {
        return Exit::None;
    }
    Exit::one(|ctx, node| match node {
        TemplateChildNode::Element(el) => {
            let container = TextContainer::of_element(ctx, el);
            merge_text_children(ctx, &mut el.children, container);
        }
        TemplateChildNode::For(node) => merge_text_children(ctx, &mut node.children, TextContainer::Other),
        _ => {}
    })
}

/// Merge adjacent text children in place, then wrap text runs in
/// `createTextVNode` calls where the container needs real vnodes.
pub fn merge_text_children<'a>(
    ctx: &mut TransformContext<'a>,
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    container: TextContainer,
) {
    let allocator = ctx.allocator;
    let mut has_text = false;
    let mut i = 0;
    while i < children.len() {
        if is_text(&children[i]) {
            has_text = true;
            while i + 1 < children.len() && is_text(&children[i + 1]) {
                let next = children.remove(i + 1);
                let current = std::mem::replace(&mut children[i], placeholder(allocator));
                let mut compound = match current {
                    TemplateChildNode::CompoundExpression(compound) => compound,
                    first => {
                        let mut compound = CompoundExpressionNode::new(allocator, first.loc().clone());
                        push_text_part(&mut compound, first);
                        Box::new_in(compound, allocator)
                    }
                };
                compound.push_raw(" + ");
                compound.loc.end = next.loc().end;
                compound.loc.source.push_str(&next.loc().source);
                push_text_part(&mut compound, next);
                children[i] = TemplateChildNode::CompoundExpression(compound);
            }
        }
        i += 1;
    }

    if !has_text || (children.len() == 1 && container.keeps_lone_text()) {
        return;
    }

    for child in children.iter_mut() {
        if !matches!(
            child,
            TemplateChildNode::Text(_) | TemplateChildNode::Interpolation(_) | TemplateChildNode::CompoundExpression(_)
        ) {
            continue;
        }
        let dynamic = text_constant_type(child) == Some(ConstantType::NotConstant);
        let taken = std::mem::replace(child, placeholder(allocator));
        let loc = taken.loc().clone();

        let mut arguments = Vec::new_in(allocator);
        match taken {
            TemplateChildNode::Text(text) if text.content == " " => {}
            TemplateChildNode::Text(text) => arguments.push(JsNode::Text(text)),
            TemplateChildNode::Interpolation(interp) => arguments.push(JsNode::Interpolation(interp)),
            TemplateChildNode::CompoundExpression(compound) => arguments.push(JsNode::Compound(compound)),
            _ => {}
        }
        if dynamic {
            arguments.push(JsNode::simple(allocator, PatchFlag::from(PatchFlags::TEXT).to_code(), ConstantType::CanStringify));
        }
        let helper = ctx.helper(RuntimeHelper::CreateText);
        *child = TemplateChildNode::TextCall(Box::new_in(
            TextCallNode {
                codegen: JsNode::helper_call(allocator, helper, arguments),
                loc,
            },
            allocator,
        ));
    }
}

fn is_text(node: &TemplateChildNode<'_>) -> bool {
    matches!(node, TemplateChildNode::Text(_) | TemplateChildNode::Interpolation(_))
        || matches!(node, TemplateChildNode::CompoundExpression(c) if c.children.iter().all(is_text_part))
}

fn is_text_part(part: &CompoundPart<'_>) -> bool {
    matches!(part, CompoundPart::Text(_) | CompoundPart::Interpolation(_) | CompoundPart::Raw(_))
}

fn push_text_part<'a>(compound: &mut CompoundExpressionNode<'a>, node: TemplateChildNode<'a>) {
    match node {
        TemplateChildNode::Text(text) => compound.children.push(CompoundPart::Text(text)),
        TemplateChildNode::Interpolation(interp) => compound.children.push(CompoundPart::Interpolation(interp)),
        TemplateChildNode::CompoundExpression(mut inner) => compound.children.extend(inner.children.drain(..)),
        _ => {}
    }
}

fn placeholder<'a>(allocator: &'a Bump) -> TemplateChildNode<'a> {
    TemplateChildNode::Comment(Box::new_in(
        CommentNode {
            content: String::const_new(""),
            loc: SourceLocation::STUB,
        },
        allocator,
    ))
}

#[cfg(test)]
mod tests {
    use crate::transform::{transform, TransformPlugins};
    use gesso_canvas::{CompoundPart, JsNode, RuntimeHelper, TemplateChildNode, TransformOptions};
    use gesso_palette::Bump;
    use gesso_sketch::parse;

    #[test]
    fn test_lone_text_stays_plain() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div>hello {{ name }}</div>");
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());

        let div = root.children[0].as_element().unwrap();
        assert_eq!(div.children.len(), 1);
        let TemplateChildNode::CompoundExpression(compound) = &div.children[0] else {
            panic!("expected merged text");
        };
        assert!(matches!(compound.children[0], CompoundPart::Text(_)));
        assert!(matches!(&compound.children[1], CompoundPart::Raw(r) if r == " + "));
        assert!(matches!(compound.children[2], CompoundPart::Interpolation(_)));
        assert!(!root.helpers.contains(&RuntimeHelper::CreateText));
    }

    #[test]
    fn test_mixed_children_become_text_calls() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div>a {{ b }}<span/>c</div>");
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());

        let div = root.children[0].as_element().unwrap();
        assert_eq!(div.children.len(), 3);
        let TemplateChildNode::TextCall(first) = &div.children[0] else {
            panic!("expected text call");
        };
        let JsNode::Call(call) = &first.codegen else { panic!() };
        assert_eq!(call.arguments.len(), 2, "dynamic text carries the TEXT flag");

        let TemplateChildNode::TextCall(last) = &div.children[2] else {
            panic!("expected text call");
        };
        let JsNode::Call(call) = &last.codegen else { panic!() };
        assert_eq!(call.arguments.len(), 1);
        assert!(root.helpers.contains(&RuntimeHelper::CreateText));
    }

    #[test]
    fn test_component_text_is_wrapped() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div v-foo>x</div>");
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        let div = root.children[0].as_element().unwrap();
        assert!(matches!(div.children[0], TemplateChildNode::TextCall(_)));
    }
}
