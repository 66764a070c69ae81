//! `<script>` and `<style>` inside a template would run or apply on
//! every render; they are reported and dropped.

use gesso_canvas::{ElementType, ErrorCode, TemplateChildNode};
use gesso_studio::{Cursor, Exit, TransformContext};

pub fn ignore_side_effect_tags<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    let TemplateChildNode::Element(el) = cursor.node() else {
        return Exit::None;
    };
    if el.tag_type == ElementType::Element && matches!(el.tag.as_str(), "script" | "style") {
        let loc = el.loc.clone();
        ctx.on_error(ErrorCode::XIgnoredSideEffectTag, Some(&loc));
        cursor.remove();
    }
    Exit::None
}
