//! `v-on` modifiers for DOM events.
//!
//! Guards (`stop`, `prevent`, system keys, ...) wrap the handler in
//! `withModifiers`, key filters in `withKeys`. `capture`, `once` and
//! `passive` become suffixes of the handler key.

use gesso_canvas::{
    CompoundExpressionNode, CompoundPart, ConstantType, DirectiveNode, ElementNode, ExpressionNode, JsNode,
    RuntimeHelper,
};
use gesso_palette::{capitalize, phf_set, Box, PhfSet, String, Vec};
use gesso_studio::transforms::v_on::transform_on_with;
use gesso_studio::{DirectiveTransformResult, TransformContext};

static EVENT_OPTION_MODIFIERS: PhfSet<&'static str> = phf_set! {
    "passive", "once", "capture",
};

/// Modifiers checked inside the handler rather than by key
static NON_KEY_MODIFIERS: PhfSet<&'static str> = phf_set! {
    "stop", "prevent", "self", "ctrl", "shift", "alt", "meta", "exact", "middle",
};

/// `left` and `right` mean mouse buttons except on keyboard events
static MAYBE_KEY_MODIFIERS: PhfSet<&'static str> = phf_set! {
    "left", "right",
};

static KEYBOARD_EVENTS: PhfSet<&'static str> = phf_set! {
    "onkeyup", "onkeydown", "onkeypress",
};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResolvedModifiers {
    pub key_modifiers: std::vec::Vec<String>,
    pub non_key_modifiers: std::vec::Vec<String>,
    pub event_option_modifiers: std::vec::Vec<String>,
}

/// Sort modifiers by how they are applied. `key` is the static handler key,
/// `None` for a dynamic event name.
pub fn resolve_modifiers(key: Option<&str>, modifiers: &[String]) -> ResolvedModifiers {
    let mut resolved = ResolvedModifiers::default();
    for modifier in modifiers {
        let name = modifier.as_str();
        if EVENT_OPTION_MODIFIERS.contains(name) {
            resolved.event_option_modifiers.push(modifier.clone());
        } else if MAYBE_KEY_MODIFIERS.contains(name) {
            match key {
                Some(key) if is_keyboard_event(key) => resolved.key_modifiers.push(modifier.clone()),
                Some(_) => resolved.non_key_modifiers.push(modifier.clone()),
                None => {
                    resolved.key_modifiers.push(modifier.clone());
                    resolved.non_key_modifiers.push(modifier.clone());
                }
            }
        } else if NON_KEY_MODIFIERS.contains(name) {
            resolved.non_key_modifiers.push(modifier.clone());
        } else {
            resolved.key_modifiers.push(modifier.clone());
        }
    }
    resolved
}

fn is_keyboard_event(key: &str) -> bool {
    KEYBOARD_EVENTS.contains(key.to_ascii_lowercase().as_str())
}

pub fn transform_v_on<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
) -> DirectiveTransformResult<'a> {
    transform_on_with(ctx, dir, el, |ctx, dir, result| {
        if dir.modifiers.is_empty() {
            return;
        }
        let Some(property) = result.props.first_mut() else { return };
        let allocator = ctx.allocator;

        let static_key = property.static_key().map(String::from);
        let resolved = resolve_modifiers(static_key.as_deref(), &dir.modifiers);

        // mouse buttons that fire their own events
        if let Some(key) = static_key.as_deref().filter(|key| key.eq_ignore_ascii_case("onclick")) {
            let renamed = if resolved.non_key_modifiers.iter().any(|m| m == "right") {
                Some("onContextmenu")
            } else if resolved.non_key_modifiers.iter().any(|m| m == "middle") {
                Some("onMouseup")
            } else {
                None
            };
            if let Some(renamed) = renamed {
                tracing::trace!(from = key, to = renamed, "mouse button event");
                property.key = handler_key(allocator, renamed);
            }
        }

        let mut handler = std::mem::replace(&mut property.value, JsNode::Child(0));
        if !resolved.non_key_modifiers.is_empty() {
            handler = wrap(ctx, RuntimeHelper::WithModifiers, handler, &resolved.non_key_modifiers);
        }
        let filters_keys = static_key.as_deref().map_or(true, is_keyboard_event);
        if !resolved.key_modifiers.is_empty() && filters_keys {
            handler = wrap(ctx, RuntimeHelper::WithKeys, handler, &resolved.key_modifiers);
        }
        property.value = handler;

        if !resolved.event_option_modifiers.is_empty() {
            let mut suffix = String::default();
            for modifier in resolved.event_option_modifiers.iter() {
                suffix.push_str(&capitalize(modifier));
            }
            property.key = match std::mem::replace(&mut property.key, handler_key(allocator, "")) {
                ExpressionNode::Simple(simple) if simple.is_static => {
                    handler_key(allocator, &format!("{}{}", simple.content, suffix))
                }
                dynamic => {
                    let mut key = CompoundExpressionNode::new(allocator, dynamic.loc().clone());
                    key.push_raw("(");
                    match dynamic {
                        ExpressionNode::Simple(s) => key.children.push(CompoundPart::Simple(s)),
                        ExpressionNode::Compound(c) => key.children.push(CompoundPart::Compound(c)),
                    }
                    key.push_raw(&format!(") + \"{suffix}\""));
                    ExpressionNode::Compound(Box::new_in(key, allocator))
                }
            };
        }
    })
}

fn handler_key<'a>(allocator: &'a gesso_palette::Bump, name: &str) -> ExpressionNode<'a> {
    ExpressionNode::simple(
        allocator,
        name,
        true,
        gesso_canvas::SourceLocation::STUB,
        ConstantType::CanStringify,
    )
}

/// `helper(handler, ["a","b"])`
fn wrap<'a>(
    ctx: &mut TransformContext<'a>,
    helper: RuntimeHelper,
    handler: JsNode<'a>,
    modifiers: &[String],
) -> JsNode<'a> {
    let allocator = ctx.allocator;
    let names: std::vec::Vec<&str> = modifiers.iter().map(String::as_str).collect();
    let list = serde_json::to_string(&names).unwrap_or_else(|_| std::string::String::from("[]"));
    let mut arguments = Vec::new_in(allocator);
    arguments.push(handler);
    arguments.push(JsNode::simple(allocator, list, ConstantType::CanStringify));
    let helper = ctx.helper(helper);
    JsNode::helper_call(allocator, helper, arguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[String]) -> std::vec::Vec<&str> {
        list.iter().map(String::as_str).collect()
    }

    fn modifiers(list: &[&str]) -> std::vec::Vec<String> {
        list.iter().map(|m| String::from(*m)).collect()
    }

    #[test]
    fn test_resolve_click_modifiers() {
        let resolved = resolve_modifiers(Some("onClick"), &modifiers(&["stop", "right", "once", "enter"]));
        assert_eq!(names(&resolved.non_key_modifiers), ["stop", "right"]);
        assert_eq!(names(&resolved.event_option_modifiers), ["once"]);
        assert_eq!(names(&resolved.key_modifiers), ["enter"]);
    }

    #[test]
    fn test_resolve_keyboard_modifiers() {
        let resolved = resolve_modifiers(Some("onKeyup"), &modifiers(&["left", "ctrl", "enter"]));
        assert_eq!(names(&resolved.key_modifiers), ["left", "enter"]);
        assert_eq!(names(&resolved.non_key_modifiers), ["ctrl"]);
    }

    #[test]
    fn test_dynamic_event_keeps_both_readings() {
        let resolved = resolve_modifiers(None, &modifiers(&["right"]));
        assert_eq!(names(&resolved.key_modifiers), ["right"]);
        assert_eq!(names(&resolved.non_key_modifiers), ["right"]);
    }
}
