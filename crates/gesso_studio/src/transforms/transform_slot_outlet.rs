//! `<slot>` outlets: `renderSlot($slots, name, props?, fallback?)`.

use gesso_canvas::{
    ChildRange, ElementNode, ElementType, ErrorCode, ExpressionNode, FunctionExpression, JsNode, PropNode,
    RuntimeHelper, TemplateChildNode,
};
use gesso_palette::{camelize, Box, Vec};

use super::props::{build_props, PropsTarget};
use super::transform_expression::process_expression;
use super::utils::simple_exp;
use crate::transform::{Cursor, Exit, TransformContext};

/// Slot name and props of an outlet
pub struct SlotOutletProps<'a> {
    pub name: JsNode<'a>,
    pub props: Option<JsNode<'a>>,
}

pub fn transform_slot_outlet<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    let TemplateChildNode::Element(el) = cursor.node_mut() else {
        return Exit::None;
    };
    if el.tag_type != ElementType::Slot {
        return Exit::None;
    }

    // the server renderer builds its own `ssrRenderSlot` call
    if ctx.ssr() {
        return Exit::None;
    }
    let allocator = ctx.allocator;
    let outlet = process_slot_outlet(ctx, el, false);

    let mut arguments = Vec::new_in(allocator);
    let slots = if ctx.prefix_identifiers() { "_ctx.$slots" } else { "$slots" };
    arguments.push(JsNode::simple(allocator, slots, Default::default()));
    arguments.push(outlet.name);
    let has_fallback = !el.children.is_empty();
    match outlet.props {
        Some(props) => arguments.push(props),
        None if has_fallback => arguments.push(JsNode::simple(allocator, "{}", Default::default())),
        None => {}
    }
    if has_fallback {
        let mut fallback = FunctionExpression::new(allocator);
        fallback.returns = Some(JsNode::Children(ChildRange::All));
        fallback.loc = el.loc.clone();
        arguments.push(JsNode::Function(Box::new_in(fallback, allocator)));
    }

    let helper = ctx.helper(RuntimeHelper::RenderSlot);
    el.codegen = Some(JsNode::helper_call(allocator, helper, arguments));
    Exit::None
}

/// Pull the slot name out of an outlet's props and build the rest into a
/// props object. Attribute names and static bind arguments are camelized
/// in place.
pub fn process_slot_outlet<'a>(ctx: &mut TransformContext<'a>, el: &mut ElementNode<'a>, ssr: bool) -> SlotOutletProps<'a> {
    let allocator = ctx.allocator;
    let mut name = JsNode::string(allocator, "default");
    let mut others = std::vec::Vec::new();

    for (index, prop) in el.props.iter_mut().enumerate() {
        match prop {
            PropNode::Attribute(attr) => {
                let Some(value) = &attr.value else { continue };
                if attr.name == "name" {
                    name = JsNode::string(allocator, value.content.clone());
                } else {
                    attr.name = camelize(&attr.name);
                    others.push(index);
                }
            }
            PropNode::Directive(dir) if dir.name == "bind" && dir.static_arg() == Some("name") => {
                let exp = match &dir.exp {
                    Some(exp) => exp.clone_in(allocator),
                    None => process_expression(ctx, simple_exp(allocator, "name")),
                };
                name = JsNode::from_expression(exp);
            }
            PropNode::Directive(dir) => {
                if dir.name == "bind" {
                    if let Some(ExpressionNode::Simple(arg)) = &mut dir.arg {
                        if arg.is_static {
                            arg.content = camelize(&arg.content);
                        }
                    }
                }
                others.push(index);
            }
        }
    }

    let props = if others.is_empty() {
        None
    } else {
        let target = PropsTarget {
            ssr,
            ..Default::default()
        };
        let built = build_props(ctx, el, Some(&others), target);
        if let Some(first) = built.directives.first() {
            let loc = el.props[first.index].loc().clone();
            ctx.on_error(ErrorCode::XVSlotUnexpectedDirectiveOnSlotOutlet, Some(&loc));
        }
        built.props
    };
    tracing::trace!(props = others.len(), "slot outlet");
    SlotOutletProps { name, props }
}

#[cfg(test)]
mod tests {
    use crate::transform::{transform, TransformPlugins};
    use gesso_canvas::{Callee, ErrorCode, JsNode, RuntimeHelper, TransformOptions};
    use gesso_palette::Bump;
    use gesso_sketch::parse;

    fn render_slot<'r, 'a>(root: &'r gesso_canvas::RootNode<'a>) -> &'r gesso_canvas::CallExpression<'a> {
        let div = root.children[0].as_element().unwrap();
        match div.children[0].as_element().and_then(|slot| slot.codegen.as_ref()) {
            Some(JsNode::Call(call)) => call,
            _ => panic!("expected renderSlot call"),
        }
    }

    #[test]
    fn test_default_outlet() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div><slot/></div>");
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        let call = render_slot(&root);
        assert_eq!(call.callee, Callee::Helper(RuntimeHelper::RenderSlot));
        assert_eq!(call.arguments.len(), 2);
        assert!(matches!(&call.arguments[1], JsNode::Simple(s) if s.content == "default" && s.is_static));
    }

    #[test]
    fn test_named_outlet_with_props_and_fallback() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<div><slot name="header" foo-bar="x" :item-id="id">fallback</slot></div>"#);
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        let call = render_slot(&root);
        assert_eq!(call.arguments.len(), 4);
        assert!(matches!(&call.arguments[1], JsNode::Simple(s) if s.content == "header" && s.is_static));
        let JsNode::Object(props) = &call.arguments[2] else { panic!("expected props") };
        let keys: Vec<_> = props.properties.iter().filter_map(|p| p.static_key()).collect();
        assert_eq!(keys, vec!["fooBar", "itemId"]);
        assert!(matches!(&call.arguments[3], JsNode::Function(_)));
    }

    #[test]
    fn test_fallback_without_props() {
        let allocator = Bump::new();
        let options = TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        };
        let (mut root, _) = parse(&allocator, r#"<div><slot :name="n">x</slot></div>"#);
        transform(&allocator, &mut root, options, &TransformPlugins::base());
        let call = render_slot(&root);
        assert!(matches!(&call.arguments[0], JsNode::Simple(s) if s.content == "_ctx.$slots"));
        assert!(matches!(&call.arguments[1], JsNode::Simple(s) if s.content == "_ctx.n"));
        assert!(matches!(&call.arguments[2], JsNode::Simple(s) if s.content == "{}"));
    }

    #[test]
    fn test_directive_on_outlet() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<div><slot v-foo/></div>"#);
        let diagnostics = transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        assert_eq!(diagnostics.errors[0].code, ErrorCode::XVSlotUnexpectedDirectiveOnSlotOutlet);
    }
}
