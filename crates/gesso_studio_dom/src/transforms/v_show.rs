//! `v-show` runs as the runtime `vShow` directive.

use gesso_canvas::{DirectiveNode, ElementNode, ErrorCode, RuntimeHelper};
use gesso_studio::{DirectiveTransformResult, NeedRuntime, TransformContext};

pub fn transform_v_show<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    _el: &ElementNode<'a>,
) -> DirectiveTransformResult<'a> {
    if dir.exp.as_ref().map_or(true, |exp| exp.is_blank()) {
        ctx.on_error(ErrorCode::XVShowNoExpression, Some(&dir.loc));
    }
    let mut result = DirectiveTransformResult::empty();
    result.need_runtime = Some(NeedRuntime::Helper(RuntimeHelper::VShow));
    result
}
