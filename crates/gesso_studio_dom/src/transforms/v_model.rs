//! `v-model` on native form elements.
//!
//! Components keep the core `modelValue` props. Native `input`,
//! `textarea` and `select` drop the value prop and run one of the
//! runtime `vModel*` directives picked from the element's `type`.

use gesso_canvas::{DirectiveNode, ElementNode, ElementType, ErrorCode, PropNode, RuntimeHelper};
use gesso_studio::transforms::v_model::transform_model;
use gesso_studio::{DirectiveTransformResult, NeedRuntime, TransformContext};

pub fn transform_v_model<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
) -> DirectiveTransformResult<'a> {
    let mut result = transform_model(ctx, dir, el);
    if result.props.is_empty() || el.tag_type == ElementType::Component {
        return result;
    }

    if let Some(arg) = &dir.arg {
        ctx.on_error(ErrorCode::XVModelArgOnElement, Some(arg.loc()));
    }

    let tag = el.tag.as_str();
    let is_custom_element = ctx.is_custom_element(tag);
    if !matches!(tag, "input" | "textarea" | "select") && !is_custom_element {
        ctx.on_error(ErrorCode::XVModelOnInvalidElement, Some(&dir.loc));
        return result;
    }

    let helper = match tag {
        "select" => Some(RuntimeHelper::VModelSelect),
        "textarea" => {
            check_duplicated_value(ctx, el);
            Some(RuntimeHelper::VModelText)
        }
        _ => input_helper(ctx, el),
    };

    // the runtime directive owns the value
    result.props.retain(|property| property.static_key() != Some("modelValue"));
    if let Some(helper) = helper {
        result.need_runtime = Some(NeedRuntime::Helper(helper));
    }
    tracing::trace!(tag, ?helper, "native v-model");
    result
}

/// Directive for an `<input>` (or custom element), `None` for file inputs
fn input_helper(ctx: &mut TransformContext<'_>, el: &ElementNode<'_>) -> Option<RuntimeHelper> {
    let type_prop = el.find_prop("type", false, false).map(|index| &el.props[index]);
    match type_prop {
        Some(PropNode::Attribute(attr)) => match attr.value.as_ref().map(|v| v.content.as_str()) {
            Some("radio") => Some(RuntimeHelper::VModelRadio),
            Some("checkbox") => Some(RuntimeHelper::VModelCheckbox),
            Some("file") => {
                ctx.on_error(ErrorCode::XVModelOnFileInputElement, Some(&attr.loc));
                None
            }
            _ => {
                check_duplicated_value(ctx, el);
                Some(RuntimeHelper::VModelText)
            }
        },
        Some(PropNode::Directive(_)) => Some(RuntimeHelper::VModelDynamic),
        None if has_spread_or_dynamic_bind(el) => Some(RuntimeHelper::VModelDynamic),
        None => {
            check_duplicated_value(ctx, el);
            Some(RuntimeHelper::VModelText)
        }
    }
}

/// `v-bind="obj"` or `:[key]` may carry a `type`
fn has_spread_or_dynamic_bind(el: &ElementNode<'_>) -> bool {
    el.has_dynamic_key_v_bind()
        || el
            .props
            .iter()
            .any(|p| matches!(p, PropNode::Directive(dir) if dir.name == "bind" && dir.arg.is_none()))
}

fn check_duplicated_value(ctx: &mut TransformContext<'_>, el: &ElementNode<'_>) {
    if let Some(index) = el.find_prop("value", false, true) {
        let loc = el.props[index].loc().clone();
        ctx.on_error(ErrorCode::XVModelUnnecessaryValue, Some(&loc));
    }
}
