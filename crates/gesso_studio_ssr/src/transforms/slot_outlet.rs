use gesso_canvas::{ElementNode, FunctionExpression, JsNode, RuntimeHelper};
use gesso_palette::Box;
use gesso_studio::transforms::transform_slot_outlet::process_slot_outlet;

use crate::codegen::SsrCodegen;

impl<'a, 'o> SsrCodegen<'a, 'o> {
    /// `_ssrRenderSlot(_ctx.$slots, name, props, fallback, _push, _parent)`
    pub(crate) fn process_slot(&mut self, el: &mut ElementNode<'a>) {
        let allocator = self.allocator();
        let outlet = process_slot_outlet(&mut self.ctx, el, true);
        let props = outlet.props.unwrap_or_else(|| self.code("{}"));

        let fallback = if el.children.is_empty() {
            self.code("null")
        } else {
            let mut function = FunctionExpression::new(allocator);
            function.body = Some(self.block(|ssr| ssr.process_children(&mut el.children, false)));
            function.loc = el.loc.clone();
            JsNode::Function(Box::new_in(function, allocator))
        };

        let slots = self.code("_ctx.$slots");
        let push = self.code("_push");
        let parent = self.code("_parent");
        let call = self.call(RuntimeHelper::SsrRenderSlot, [slots, outlet.name, props, fallback, push, parent]);
        self.push_statement(call);
    }
}
