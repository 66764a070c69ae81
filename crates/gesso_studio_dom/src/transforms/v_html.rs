//! `v-html` sets `innerHTML` and replaces the element's children.

use gesso_canvas::{DirectiveNode, ElementNode, ErrorCode, JsNode, Property};
use gesso_studio::{DirectiveTransformResult, TransformContext};

pub fn transform_v_html<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
) -> DirectiveTransformResult<'a> {
    let allocator = ctx.allocator;
    let value = match dir.exp.as_ref().filter(|exp| !exp.is_blank()) {
        Some(exp) => JsNode::from_expression(exp.clone_in(allocator)),
        None => {
            ctx.on_error(ErrorCode::XVHtmlNoExpression, Some(&dir.loc));
            JsNode::string(allocator, "")
        }
    };
    if !el.children.is_empty() {
        ctx.on_error(ErrorCode::XVHtmlWithChildren, Some(&dir.loc));
    }

    let mut result = DirectiveTransformResult::with_props(vec![Property {
        loc: dir.loc.clone(),
        ..Property::named(allocator, "innerHTML", value)
    }]);
    result.clears_children = true;
    result
}
