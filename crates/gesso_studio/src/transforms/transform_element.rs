//! Element and component codegen.
//!
//! On exit every native element and component gets a [`VNodeCall`]: the
//! resolved tag, props from [`build_props`], children (slots for
//! components) and the patch flag collected along the way.

use gesso_canvas::{
    core_component, ChildRange, ConstantType, ElementNode, ElementType, ErrorCode, JsNode, PropNode,
    RuntimeHelper, TemplateChildNode, VNodeCall, VNodeTag,
};
use gesso_palette::{camelize, capitalize, format_compact, Box, PatchFlags, String, Vec};

use super::hoist_static::text_constant_type;
use super::props::{build_directive_args, build_props, resolve_setup_reference, stringify_dynamic_prop_names, PropsTarget};
use super::transform_expression::process_expression;
use super::utils::{simple_exp, to_valid_asset_id};
use super::v_slot::{build_slots, slot_scope_names};
use crate::runtime_helpers::{get_vnode_block_helper, get_vnode_helper};
use crate::transform::{Cursor, Exit, ParentKind, TransformContext};

pub fn transform_element<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    let TemplateChildNode::Element(el) = cursor.node() else {
        return Exit::None;
    };

    let under_component = ctx.parent() == Some(ParentKind::Element(ElementType::Component));
    // slot templates of a component render through the slot function
    let component_slot = el.is_template_slot() && under_component;
    if el.is_template_slot() && !under_component {
        if let Some(index) = el.find_dir("slot", true) {
            let loc = el.props[index].loc().clone();
            ctx.on_error(ErrorCode::XVSlotMisplaced, Some(&loc));
        }
    }

    // slot props are in scope for the slot content
    let scope = slot_scope_names(el);
    if let Some(names) = &scope {
        ctx.scopes.v_slot += 1;
        ctx.add_identifiers(names.iter().map(String::as_str));
    }

    Exit::one(move |ctx, node| {
        if let Some(names) = &scope {
            ctx.scopes.v_slot -= 1;
            ctx.remove_identifiers(names.iter().map(String::as_str));
        }
        let TemplateChildNode::Element(el) = node else { return };
        if ctx.ssr() {
            return;
        }
        match el.tag_type {
            ElementType::Element | ElementType::Component => {
                let codegen = build_element_codegen(ctx, el);
                el.codegen = Some(codegen);
            }
            // a stray `<template v-slot>` still renders its content
            ElementType::Template if el.codegen.is_none() && !component_slot => {
                el.codegen = Some(fragment_codegen(ctx, el));
            }
            _ => {}
        }
    })
}

fn build_element_codegen<'a>(ctx: &mut TransformContext<'a>, el: &mut ElementNode<'a>) -> JsNode<'a> {
    let allocator = ctx.allocator;
    let is_component = el.tag_type == ElementType::Component;
    let tag = if is_component {
        resolve_component_type(ctx, el, false)
    } else {
        VNodeTag::Literal(el.tag.clone())
    };
    let is_dynamic_component = matches!(&tag, VNodeTag::Expr(_));
    let is_teleport = matches!(tag, VNodeTag::Helper(RuntimeHelper::Teleport));
    let is_keep_alive = matches!(tag, VNodeTag::Helper(RuntimeHelper::KeepAlive));

    let mut should_use_block = is_dynamic_component
        || is_teleport
        || matches!(tag, VNodeTag::Helper(RuntimeHelper::Suspense))
        // nested updates need the right namespace at runtime
        || (!is_component && matches!(el.tag.as_str(), "svg" | "foreignObject" | "math"));

    let mut call = VNodeCall::new(tag, el.loc.clone());
    let mut patch_flag = PatchFlags::empty();

    if !el.props.is_empty() {
        let target = PropsTarget {
            is_component,
            is_dynamic_component,
            ssr: false,
        };
        let built = build_props(ctx, el, None, target);
        call.props = built.props;
        patch_flag = built.patch_flag;
        should_use_block |= built.should_use_block;
        if !built.dynamic_prop_names.is_empty() {
            call.dynamic_props = Some(stringify_dynamic_prop_names(allocator, &built.dynamic_prop_names));
        }
        if !built.directives.is_empty() {
            let mut elements = Vec::new_in(allocator);
            for directive in built.directives.iter() {
                if let PropNode::Directive(dir) = &el.props[directive.index] {
                    elements.push(build_directive_args(ctx, dir, directive.helper));
                }
            }
            call.directives = Some(JsNode::array(allocator, elements));
        }
        if built.clears_children {
            el.children.clear();
        }
    }

    if !el.children.is_empty() {
        if is_keep_alive {
            // raw children, always patched and never collected by a parent block
            should_use_block = true;
            patch_flag |= PatchFlags::DYNAMIC_SLOTS;
            if el.children.len() > 1 {
                let loc = el.loc.clone();
                ctx.on_error(ErrorCode::XKeepAliveInvalidChildren, Some(&loc));
            }
        }

        if is_component && !is_teleport && !is_keep_alive {
            let built = build_slots(ctx, el);
            call.children = Some(built.slots);
            if built.has_dynamic_slots {
                patch_flag |= PatchFlags::DYNAMIC_SLOTS;
            }
        } else if el.children.len() == 1 && !is_teleport {
            let child = &el.children[0];
            let dynamic_text = matches!(
                child,
                TemplateChildNode::Interpolation(_) | TemplateChildNode::CompoundExpression(_)
            );
            if dynamic_text && text_constant_type(child) == Some(ConstantType::NotConstant) {
                patch_flag |= PatchFlags::TEXT;
            }
            call.children = Some(if dynamic_text || matches!(child, TemplateChildNode::Text(_)) {
                JsNode::Child(0)
            } else {
                JsNode::Children(ChildRange::All)
            });
        } else {
            call.children = Some(JsNode::Children(ChildRange::All));
        }
    }

    if !patch_flag.is_empty() {
        call.patch_flag = Some(patch_flag.into());
    }
    call.is_block = should_use_block;
    call.is_component = is_component;
    register_vnode_helpers(ctx, &call);
    JsNode::VNodeCall(Box::new_in(call, allocator))
}

/// Record the helpers a freshly built vnode call will emit
pub fn register_vnode_helpers(ctx: &mut TransformContext<'_>, call: &VNodeCall<'_>) {
    if call.directives.is_some() {
        ctx.helper(RuntimeHelper::WithDirectives);
    }
    if call.is_block {
        ctx.helper(RuntimeHelper::OpenBlock);
        ctx.helper(get_vnode_block_helper(ctx.ssr(), call.is_component));
    } else {
        ctx.helper(get_vnode_helper(ctx.ssr(), call.is_component));
    }
}

fn fragment_codegen<'a>(ctx: &mut TransformContext<'a>, el: &ElementNode<'a>) -> JsNode<'a> {
    let fragment = ctx.helper(RuntimeHelper::Fragment);
    let mut call = VNodeCall::new(VNodeTag::Helper(fragment), el.loc.clone());
    call.children = Some(JsNode::Children(ChildRange::All));
    call.patch_flag = Some(PatchFlags::STABLE_FRAGMENT.into());
    register_vnode_helpers(ctx, &call);
    JsNode::VNodeCall(Box::new_in(call, ctx.allocator))
}

/// Tag of a component vnode: a dynamic `resolveDynamicComponent(...)`, a
/// built-in, a `<script setup>` binding or a resolved asset.
pub fn resolve_component_type<'a>(ctx: &mut TransformContext<'a>, el: &ElementNode<'a>, ssr: bool) -> VNodeTag<'a> {
    let allocator = ctx.allocator;
    let mut tag = el.tag.clone();
    let explicit_dynamic = matches!(tag.as_str(), "component" | "Component");

    if let Some(index) = el.find_prop("is", false, true) {
        match &el.props[index] {
            PropNode::Attribute(attr) if explicit_dynamic => {
                if let Some(value) = &attr.value {
                    let exp = JsNode::string(allocator, value.content.clone());
                    return dynamic_component(ctx, exp);
                }
            }
            PropNode::Directive(dir) if explicit_dynamic => {
                let exp = match &dir.exp {
                    Some(exp) => exp.clone_in(allocator),
                    // `:is` shorthand
                    None => process_expression(ctx, simple_exp(allocator, "is")),
                };
                return dynamic_component(ctx, JsNode::from_expression(exp));
            }
            PropNode::Attribute(attr) => {
                if let Some(name) = attr.value.as_ref().and_then(|v| v.content.strip_prefix("vue:")) {
                    tag = String::from(name);
                }
            }
            PropNode::Directive(_) => {}
        }
    }

    if let Some(builtin) = core_component(&tag).or_else(|| ctx.is_builtin_component(&tag)) {
        if !ssr {
            ctx.helper(builtin);
        }
        return VNodeTag::Helper(builtin);
    }

    if let Some(from_setup) = resolve_setup_reference(ctx, &tag) {
        return VNodeTag::Identifier(from_setup);
    }
    if let Some(dot) = tag.find('.').filter(|&i| i > 0) {
        if let Some(namespace) = resolve_setup_reference(ctx, &tag[..dot]) {
            return VNodeTag::Identifier(format_compact!("{namespace}{}", &tag[dot..]));
        }
    }

    ctx.helper(RuntimeHelper::ResolveComponent);
    let is_self = ctx
        .self_name
        .as_ref()
        .is_some_and(|name| capitalize(&camelize(&tag)) == *name);
    if is_self {
        // `__self` lets codegen pass the maybe-self-reference flag
        ctx.add_component(&format_compact!("{tag}__self"));
    } else {
        ctx.add_component(&tag);
    }
    VNodeTag::Identifier(to_valid_asset_id(&tag, "component"))
}

fn dynamic_component<'a>(ctx: &mut TransformContext<'a>, exp: JsNode<'a>) -> VNodeTag<'a> {
    let allocator = ctx.allocator;
    let helper = ctx.helper(RuntimeHelper::ResolveDynamicComponent);
    let mut arguments = Vec::new_in(allocator);
    arguments.push(exp);
    VNodeTag::Expr(JsNode::helper_call(allocator, helper, arguments))
}

#[cfg(test)]
mod tests {
    use crate::transform::{transform, TransformPlugins};
    use gesso_canvas::{
        BindingMetadata, BindingType, ErrorCode, JsNode, ParserOptions, RuntimeHelper, TransformOptions, VNodeTag,
    };
    use gesso_palette::{is_native_tag, Bump};
    use gesso_sketch::{parse, parse_with_options};

    /// Unknown lowercase tags only resolve as components once native tags are known
    fn run<'a>(allocator: &'a Bump, source: &'a str, options: TransformOptions) -> gesso_canvas::RootNode<'a> {
        let parser = ParserOptions {
            is_native_tag: Some(is_native_tag),
            ..Default::default()
        };
        let (mut root, _) = parse_with_options(allocator, source, parser);
        transform(allocator, &mut root, options, &TransformPlugins::base());
        root
    }

    #[test]
    fn test_dynamic_text_child() {
        let allocator = Bump::new();
        let root = run(&allocator, "<div>{{a}}{{b}}</div>", TransformOptions::default());
        let div = root.children[0].as_element().unwrap();
        assert_eq!(div.children.len(), 1);
        let call = div.codegen.as_ref().and_then(JsNode::as_vnode_call).unwrap();
        assert_eq!(call.patch_flag.map(|f| f.value()), Some(1));
        assert!(matches!(call.children, Some(JsNode::Child(0))));
    }

    #[test]
    fn test_component_resolution() {
        let allocator = Bump::new();
        let root = run(&allocator, "<div><my-comp/><KeepAlive><a/></KeepAlive></div>", TransformOptions::default());
        assert_eq!(root.components.iter().map(|c| c.as_str()).collect::<Vec<_>>(), vec!["my-comp"]);
        assert!(root.helpers.contains(&RuntimeHelper::ResolveComponent));
        assert!(root.helpers.contains(&RuntimeHelper::KeepAlive));

        let div = root.children[0].as_element().unwrap();
        let comp = div.children[0].codegen().and_then(JsNode::as_vnode_call).unwrap();
        assert!(matches!(&comp.tag, VNodeTag::Identifier(id) if id == "_component_my_comp"));
        let keep_alive = div.children[1].codegen().and_then(JsNode::as_vnode_call).unwrap();
        assert!(keep_alive.is_block);
        assert_eq!(keep_alive.patch_flag.map(|f| f.value()), Some(1024));
    }

    #[test]
    fn test_dynamic_component_is_block() {
        let allocator = Bump::new();
        let root = run(&allocator, r#"<div><component :is="view"/></div>"#, TransformOptions::default());
        let div = root.children[0].as_element().unwrap();
        let call = div.children[0].codegen().and_then(JsNode::as_vnode_call).unwrap();
        assert!(matches!(call.tag, VNodeTag::Expr(_)));
        assert!(call.is_block);
        assert!(call.props.is_none());
    }

    #[test]
    fn test_setup_binding_component() {
        let allocator = Bump::new();
        let mut metadata = BindingMetadata {
            is_script_setup: true,
            ..Default::default()
        };
        metadata.bindings.insert("FooBar".into(), BindingType::SetupConst);
        let options = TransformOptions {
            binding_metadata: Some(metadata),
            ..Default::default()
        };
        let root = run(&allocator, "<foo-bar/>", options);
        let call = root.children[0].codegen().and_then(JsNode::as_vnode_call).unwrap();
        assert!(matches!(&call.tag, VNodeTag::Identifier(id) if id == r#"$setup["FooBar"]"#));
        assert!(root.components.is_empty());
    }

    #[test]
    fn test_self_reference() {
        let allocator = Bump::new();
        let options = TransformOptions {
            filename: "components/FooBar.vue".into(),
            ..Default::default()
        };
        let root = run(&allocator, "<div><foo-bar/></div>", options);
        assert_eq!(root.components.iter().map(|c| c.as_str()).collect::<Vec<_>>(), vec!["foo-bar__self"]);
    }

    #[test]
    fn test_runtime_directive() {
        let allocator = Bump::new();
        let root = run(&allocator, "<div><p v-focus:x.y=\"z\"/></div>", TransformOptions::default());
        assert_eq!(root.directives[0], "focus");
        assert!(root.helpers.contains(&RuntimeHelper::WithDirectives));
        assert!(root.helpers.contains(&RuntimeHelper::ResolveDirective));
    }

    #[test]
    fn test_stray_template_slot() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div><template #a>x</template></div>");
        let diagnostics = transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        assert_eq!(diagnostics.errors[0].code, ErrorCode::XVSlotMisplaced);
    }
}
