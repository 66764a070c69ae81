//! Components, built-in components and their slots.

use gesso_canvas::{
    ChildRange, ElementNode, ErrorCode, FunctionExpression, JsNode, PropNode, RuntimeHelper, TemplateChildNode,
    VNodeTag,
};
use gesso_palette::{Box, Vec};
use gesso_studio::transforms::props::{build_props, PropsTarget};
use gesso_studio::transforms::transform_element::resolve_component_type;
use gesso_studio::transforms::utils::simple_exp;
use gesso_studio::transforms::v_slot::build_slots;

use crate::codegen::SsrCodegen;

/// Trailing parameters of every server slot function
const SLOT_PARAMS: [&str; 3] = ["_push", "_parent", "_scopeId"];

impl<'a, 'o> SsrCodegen<'a, 'o> {
    pub(crate) fn process_component(&mut self, el: &mut ElementNode<'a>) {
        let allocator = self.allocator();
        let tag = resolve_component_type(&mut self.ctx, el, true);
        match tag {
            VNodeTag::Helper(RuntimeHelper::Teleport) => return self.process_teleport(el),
            VNodeTag::Helper(RuntimeHelper::TransitionGroup) => {
                return self.process_children(&mut el.children, true);
            }
            // transitions, keep-alive and suspense only matter on the client
            VNodeTag::Helper(_) => return self.process_children(&mut el.children, false),
            _ => {}
        }

        let is_dynamic_component = matches!(tag, VNodeTag::Expr(_));
        let result = build_props(
            &mut self.ctx,
            el,
            None,
            PropsTarget {
                is_component: true,
                is_dynamic_component,
                ssr: true,
            },
        );
        let props = if self.takes_fallthrough(el.loc.start.offset) {
            let mut args = std::vec::Vec::new();
            if let Some(props) = result.props {
                self.flatten_merge_args(props, &mut args);
            }
            args.push(self.code("_attrs"));
            if args.len() == 1 {
                args.pop()
            } else {
                Some(self.call(RuntimeHelper::MergeProps, args))
            }
        } else {
            result.props
        };
        let props = props.unwrap_or_else(|| self.code("null"));

        let slots = if el.children.is_empty() {
            self.code("null")
        } else {
            let mut slots = build_slots(&mut self.ctx, el).slots;
            self.fill_slot_bodies(&mut slots, &mut el.children);
            slots
        };

        match tag {
            VNodeTag::Identifier(name) => {
                let component = self.code(&name);
                let parent = self.code("_parent");
                let call = self.call(RuntimeHelper::SsrRenderComponent, [component, props, slots, parent]);
                self.push_rendered(call);
            }
            tag => {
                let tag = match tag {
                    VNodeTag::Expr(exp) => exp,
                    VNodeTag::Literal(name) => JsNode::string(allocator, name),
                    _ => self.code("null"),
                };
                let vnode = self.call(RuntimeHelper::CreateVNode, [tag, props, slots]);
                let push = self.code("_push");
                let parent = self.code("_parent");
                let call = self.call(RuntimeHelper::SsrRenderVNode, [push, vnode, parent]);
                self.push_statement(call);
            }
        }
    }

    /// `_ssrRenderTeleport(_push, (_push) => {..}, to, disabled, _parent)`
    fn process_teleport(&mut self, el: &mut ElementNode<'a>) {
        let allocator = self.allocator();
        let target = match el.find_prop("to", false, false).map(|index| &el.props[index]) {
            Some(PropNode::Attribute(attr)) => attr.value.as_ref().map(|v| JsNode::string(allocator, v.content.clone())),
            Some(PropNode::Directive(dir)) => dir.exp.as_ref().map(|exp| JsNode::from_expression(exp.clone_in(allocator))),
            None => None,
        };
        let Some(target) = target else {
            let loc = el.loc.clone();
            self.ctx.on_error(ErrorCode::XSsrNoTeleportTarget, Some(&loc));
            return;
        };
        let disabled = match el.find_prop("disabled", false, true).map(|index| &el.props[index]) {
            Some(PropNode::Attribute(_)) => self.code("true"),
            Some(PropNode::Directive(dir)) => match &dir.exp {
                Some(exp) => JsNode::from_expression(exp.clone_in(allocator)),
                None => self.code("false"),
            },
            None => self.code("false"),
        };

        let mut content = FunctionExpression::new(allocator);
        content.params.push(simple_exp(allocator, "_push"));
        content.body = Some(self.block(|ssr| ssr.process_children(&mut el.children, false)));
        let push = self.code("_push");
        let parent = self.code("_parent");
        let call = self.call(
            RuntimeHelper::SsrRenderTeleport,
            [push, JsNode::Function(Box::new_in(content, allocator)), target, disabled, parent],
        );
        self.push_statement(call);
    }

    /// Give every slot function in `node` a body that pushes its content.
    /// Slot functions point at `children` of the component.
    fn fill_slot_bodies(&mut self, node: &mut JsNode<'a>, children: &mut [TemplateChildNode<'a>]) {
        match node {
            JsNode::Object(object) => {
                for property in object.properties.iter_mut() {
                    self.fill_slot_bodies(&mut property.value, children);
                }
            }
            JsNode::Call(call) => {
                for argument in call.arguments.iter_mut() {
                    self.fill_slot_bodies(argument, children);
                }
            }
            JsNode::Array(array) => {
                for element in array.elements.iter_mut() {
                    self.fill_slot_bodies(element, children);
                }
            }
            JsNode::Conditional(conditional) => {
                self.fill_slot_bodies(&mut conditional.consequent, children);
                self.fill_slot_bodies(&mut conditional.alternate, children);
            }
            JsNode::Function(function) if function.is_slot => self.fill_slot(function, children),
            JsNode::Function(function) => {
                if let Some(returns) = function.returns.as_mut() {
                    self.fill_slot_bodies(returns, children);
                }
            }
            _ => {}
        }
    }

    fn fill_slot(&mut self, function: &mut FunctionExpression<'a>, children: &mut [TemplateChildNode<'a>]) {
        let allocator = self.allocator();
        let range = match function.returns.take() {
            Some(JsNode::Children(range)) => range,
            other => {
                function.returns = other;
                return;
            }
        };

        if function.params.is_empty() {
            function.params.push(simple_exp(allocator, "_"));
        }
        for param in SLOT_PARAMS {
            function.params.push(simple_exp(allocator, param));
        }

        self.ctx.scopes.v_slot += 1;
        let body = self.block(|ssr| match range {
            ChildRange::All => ssr.process_children(children, false),
            ChildRange::Only(indices) => {
                for index in indices {
                    if let Some(child) = children.get_mut(index) {
                        ssr.process_child(child);
                    }
                }
            }
            ChildRange::Of(index) => {
                if let Some(TemplateChildNode::Element(template)) = children.get_mut(index) {
                    ssr.process_children(&mut template.children, false);
                }
            }
        });
        self.ctx.scopes.v_slot -= 1;
        function.body = Some(body);
    }
}
