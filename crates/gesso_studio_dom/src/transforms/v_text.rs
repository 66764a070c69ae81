//! `v-text` sets `textContent` and replaces the element's children.

use gesso_canvas::{ConstantType, DirectiveNode, ElementNode, ErrorCode, JsNode, Property, RuntimeHelper};
use gesso_palette::Vec;
use gesso_studio::transforms::hoist_static::expression_constant_type;
use gesso_studio::{DirectiveTransformResult, TransformContext};

pub fn transform_v_text<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
) -> DirectiveTransformResult<'a> {
    let allocator = ctx.allocator;
    let value = match dir.exp.as_ref().filter(|exp| !exp.is_blank()) {
        Some(exp) if expression_constant_type(exp) > ConstantType::NotConstant => {
            JsNode::from_expression(exp.clone_in(allocator))
        }
        Some(exp) => {
            let mut arguments = Vec::new_in(allocator);
            arguments.push(JsNode::from_expression(exp.clone_in(allocator)));
            let helper = ctx.helper(RuntimeHelper::ToDisplayString);
            JsNode::helper_call(allocator, helper, arguments)
        }
        None => {
            ctx.on_error(ErrorCode::XVTextNoExpression, Some(&dir.loc));
            JsNode::string(allocator, "")
        }
    };
    if !el.children.is_empty() {
        ctx.on_error(ErrorCode::XVTextWithChildren, Some(&dir.loc));
    }

    let mut result = DirectiveTransformResult::with_props(vec![Property {
        loc: dir.loc.clone(),
        ..Property::named(allocator, "textContent", value)
    }]);
    result.clears_children = true;
    result
}
