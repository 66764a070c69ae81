//! Props object construction for elements, components and slot outlets.

use gesso_canvas::{
    BindingType, Callee, ConstantType, DirectiveNode, ElementNode, ErrorCode, ExpressionNode,
    JsNode, PropNode, Property, RuntimeHelper,
};
use gesso_palette::{
    camelize, capitalize, format_compact, is_builtin_directive, is_on, is_reserved_prop, Bump,
    FxHashMap, PatchFlags, String, Vec,
};

use super::hoist_static::compound_constant_type;
use super::utils::{simple_exp, to_valid_asset_id};
use crate::transform::{NeedRuntime, TransformContext};

/// A directive that survives to runtime (`withDirectives`)
#[derive(Debug, Clone, Copy)]
pub struct RuntimeDirective {
    /// Index into the element's props
    pub index: usize,
    /// Built-in runtime directive replacing the resolved one
    pub helper: Option<RuntimeHelper>,
}

#[derive(Debug)]
pub struct PropsBuildResult<'a> {
    pub props: Option<JsNode<'a>>,
    pub directives: std::vec::Vec<RuntimeDirective>,
    pub patch_flag: PatchFlags,
    pub dynamic_prop_names: std::vec::Vec<String>,
    pub should_use_block: bool,
    /// A directive took over the element's content
    pub clears_children: bool,
}

/// Element shape the props are built for
#[derive(Debug, Clone, Copy, Default)]
pub struct PropsTarget {
    pub is_component: bool,
    pub is_dynamic_component: bool,
    pub ssr: bool,
}

#[derive(Default)]
struct PatchAnalysis {
    has_ref: bool,
    has_class_binding: bool,
    has_style_binding: bool,
    has_hydration_event_binding: bool,
    has_dynamic_keys: bool,
    has_vnode_hook: bool,
    dynamic_prop_names: std::vec::Vec<String>,
}

impl PatchAnalysis {
    fn analyze(&mut self, property: &Property<'_>, target: PropsTarget) {
        let Some(name) = property.static_key() else {
            self.has_dynamic_keys = true;
            return;
        };
        let is_event_handler = is_on(name);
        if is_event_handler
            && (!target.is_component || target.is_dynamic_component)
            && !name.eq_ignore_ascii_case("onclick")
            && name != "onUpdate:modelValue"
            && !is_reserved_prop(name)
        {
            self.has_hydration_event_binding = true;
        }
        if is_event_handler && is_reserved_prop(name) {
            self.has_vnode_hook = true;
        }

        // look through `withModifiers(fn, ...)` and friends
        let value = match &property.value {
            JsNode::Call(call) if is_event_handler => call.arguments.first().unwrap_or(&property.value),
            value => value,
        };
        let constant = match value {
            JsNode::Cache(_) => return,
            JsNode::Simple(simple) => simple.const_type,
            JsNode::Compound(compound) => compound_constant_type(compound),
            _ => ConstantType::NotConstant,
        };
        if constant > ConstantType::NotConstant {
            return;
        }

        match name {
            "ref" => self.has_ref = true,
            "class" => self.has_class_binding = true,
            "style" => self.has_style_binding = true,
            "key" => {}
            _ => self.push_dynamic(name),
        }
        if target.is_component && matches!(name, "class" | "style") {
            self.push_dynamic(name);
        }
    }

    fn push_dynamic(&mut self, name: &str) {
        if !self.dynamic_prop_names.iter().any(|n| n == name) {
            self.dynamic_prop_names.push(String::from(name));
        }
    }
}

/// Props pending a flush into an object literal, and the `mergeProps`
/// arguments collected so far
struct MergeState<'a> {
    allocator: &'a Bump,
    properties: std::vec::Vec<Property<'a>>,
    merge_args: std::vec::Vec<JsNode<'a>>,
}

impl<'a> MergeState<'a> {
    fn push_merge_arg(&mut self, arg: Option<JsNode<'a>>) {
        if !self.properties.is_empty() {
            let properties = std::mem::take(&mut self.properties);
            self.merge_args.push(JsNode::object(self.allocator, dedupe_properties(self.allocator, properties)));
        }
        if let Some(arg) = arg {
            self.merge_args.push(arg);
        }
    }
}

/// Build the props of `el`. `only` restricts the walk to the props at those
/// indices (slot outlets leave out `name`).
pub fn build_props<'a>(
    ctx: &mut TransformContext<'a>,
    el: &ElementNode<'a>,
    only: Option<&[usize]>,
    target: PropsTarget,
) -> PropsBuildResult<'a> {
    let allocator = ctx.allocator;
    let has_children = !el.children.is_empty();
    let mut state = MergeState {
        allocator,
        properties: std::vec::Vec::new(),
        merge_args: std::vec::Vec::new(),
    };
    let mut directives = std::vec::Vec::new();
    let mut analysis = PatchAnalysis::default();
    let mut patch_flag = PatchFlags::empty();
    let mut should_use_block = false;
    let mut clears_children = false;
    let is_component_tag = matches!(el.tag.as_str(), "component" | "Component");

    let ref_for_marker = |ctx: &TransformContext<'a>, state: &mut MergeState<'a>| {
        if ctx.scopes.v_for > 0 {
            state
                .properties
                .push(Property::named(allocator, "ref_for", JsNode::simple(allocator, "true", ConstantType::CanStringify)));
        }
    };

    let indices: std::vec::Vec<usize> = match only {
        Some(only) => only.to_vec(),
        None => (0..el.props.len()).collect(),
    };

    for index in indices {
        let Some(prop) = el.props.get(index) else { continue };
        match prop {
            PropNode::Attribute(attr) => {
                let name = attr.name.as_str();
                let mut is_static = true;
                if name == "ref" {
                    analysis.has_ref = true;
                    ref_for_marker(ctx, &mut state);
                    if let Some(value) = attr.value.as_ref().filter(|_| ctx.inline()) {
                        if matches!(
                            ctx.binding(&value.content),
                            Some(BindingType::SetupLet | BindingType::SetupRef | BindingType::SetupMaybeRef)
                        ) {
                            is_static = false;
                            state.properties.push(Property::named(
                                allocator,
                                "ref_key",
                                JsNode::string(allocator, value.content.clone()),
                            ));
                        }
                    }
                }
                if name == "is"
                    && (is_component_tag || attr.value.as_ref().is_some_and(|v| v.content.starts_with("vue:")))
                {
                    continue;
                }
                let content = attr.value.as_ref().map(|v| v.content.clone()).unwrap_or_default();
                let value = if is_static {
                    JsNode::string(allocator, content)
                } else {
                    JsNode::simple(allocator, content, ConstantType::NotConstant)
                };
                state.properties.push(Property::named(allocator, attr.name.clone(), value));
            }
            PropNode::Directive(dir) => {
                let is_bind = dir.name == "bind";
                let is_on_dir = dir.name == "on";
                match dir.name.as_str() {
                    "slot" => {
                        if !target.is_component {
                            ctx.on_error(ErrorCode::XVSlotMisplaced, Some(&dir.loc));
                        }
                        continue;
                    }
                    "once" | "memo" | "is" => continue,
                    _ => {}
                }
                if is_bind && dir.static_arg() == Some("is") && is_component_tag {
                    continue;
                }
                if is_on_dir && target.ssr {
                    continue;
                }

                if (is_bind && dir.static_arg() == Some("key"))
                    || (is_on_dir && has_children && dir.static_arg() == Some("vue:before-update"))
                {
                    should_use_block = true;
                }
                if is_bind && dir.static_arg() == Some("ref") {
                    ref_for_marker(ctx, &mut state);
                }

                if dir.arg.is_none() && (is_bind || is_on_dir) {
                    analysis.has_dynamic_keys = true;
                    match &dir.exp {
                        Some(exp) if is_bind => {
                            ref_for_marker(ctx, &mut state);
                            state.push_merge_arg(None);
                            state.merge_args.push(JsNode::from_expression(exp.clone_in(allocator)));
                        }
                        Some(exp) => {
                            let mut arguments = Vec::new_in(allocator);
                            arguments.push(JsNode::from_expression(exp.clone_in(allocator)));
                            if !target.is_component {
                                arguments.push(JsNode::simple(allocator, "true", ConstantType::CanStringify));
                            }
                            let helper = ctx.helper(RuntimeHelper::ToHandlers);
                            state.push_merge_arg(Some(JsNode::helper_call(allocator, helper, arguments)));
                        }
                        None => {
                            let code = if is_bind {
                                ErrorCode::XVBindNoExpression
                            } else {
                                ErrorCode::XVOnNoExpression
                            };
                            ctx.on_error(code, Some(&dir.loc));
                        }
                    }
                    continue;
                }

                if is_bind && dir.has_modifier("prop") {
                    patch_flag |= PatchFlags::NEED_HYDRATION;
                }

                if let Some(transform) = ctx.directive_transform(&dir.name) {
                    let result = transform(ctx, dir, el);
                    if !target.ssr {
                        for property in result.props.iter() {
                            analysis.analyze(property, target);
                        }
                    }
                    clears_children |= result.clears_children;
                    let dynamic_event = is_on_dir
                        && !matches!(&dir.arg, Some(ExpressionNode::Simple(arg)) if arg.is_static);
                    if dynamic_event {
                        let mut properties = Vec::new_in(allocator);
                        properties.extend(result.props);
                        state.push_merge_arg(Some(JsNode::object(allocator, properties)));
                    } else {
                        state.properties.extend(result.props);
                    }
                    if let Some(need) = result.need_runtime {
                        directives.push(RuntimeDirective {
                            index,
                            helper: match need {
                                NeedRuntime::Helper(helper) => Some(helper),
                                NeedRuntime::Resolve => None,
                            },
                        });
                    }
                } else if !is_builtin_directive(&dir.name) {
                    directives.push(RuntimeDirective { index, helper: None });
                    // custom directives may hook beforeUpdate
                    if has_children {
                        should_use_block = true;
                    }
                }
            }
        }
    }

    let mut props = if !state.merge_args.is_empty() {
        state.push_merge_arg(None);
        if state.merge_args.len() > 1 {
            let mut arguments = Vec::new_in(allocator);
            arguments.extend(state.merge_args);
            let helper = ctx.helper(RuntimeHelper::MergeProps);
            Some(JsNode::helper_call(allocator, helper, arguments))
        } else {
            state.merge_args.pop()
        }
    } else if !state.properties.is_empty() {
        Some(JsNode::object(allocator, dedupe_properties(allocator, state.properties)))
    } else {
        None
    };

    if analysis.has_dynamic_keys {
        patch_flag |= PatchFlags::FULL_PROPS;
    } else {
        if analysis.has_class_binding && !target.is_component {
            patch_flag |= PatchFlags::CLASS;
        }
        if analysis.has_style_binding && !target.is_component {
            patch_flag |= PatchFlags::STYLE;
        }
        if !analysis.dynamic_prop_names.is_empty() {
            patch_flag |= PatchFlags::PROPS;
        }
        if analysis.has_hydration_event_binding {
            patch_flag |= PatchFlags::NEED_HYDRATION;
        }
    }
    if !should_use_block
        && (patch_flag.is_empty() || patch_flag == PatchFlags::NEED_HYDRATION)
        && (analysis.has_ref || analysis.has_vnode_hook || !directives.is_empty())
    {
        patch_flag |= PatchFlags::NEED_PATCH;
    }

    if !ctx.ssr() {
        props = props.map(|props| pre_normalize(ctx, props, analysis.has_style_binding));
    }

    PropsBuildResult {
        props,
        directives,
        patch_flag,
        dynamic_prop_names: analysis.dynamic_prop_names,
        should_use_block,
        clears_children,
    }
}

/// Wrap class/style values (or the whole object) in the runtime
/// normalizers so the runtime can skip normalization.
fn pre_normalize<'a>(ctx: &mut TransformContext<'a>, props: JsNode<'a>, has_style_binding: bool) -> JsNode<'a> {
    let allocator = ctx.allocator;
    match props {
        JsNode::Object(mut object) => {
            let mut class_index = None;
            let mut style_index = None;
            let mut has_dynamic_key = false;
            for (i, property) in object.properties.iter().enumerate() {
                match property.static_key() {
                    Some("class") => class_index = Some(i),
                    Some("style") => style_index = Some(i),
                    Some(_) => {}
                    None => {
                        if !is_handler_key(&property.key) {
                            has_dynamic_key = true;
                        }
                    }
                }
            }
            if has_dynamic_key {
                let mut arguments = Vec::new_in(allocator);
                arguments.push(JsNode::Object(object));
                let helper = ctx.helper(RuntimeHelper::NormalizeProps);
                return JsNode::helper_call(allocator, helper, arguments);
            }
            if let Some(i) = class_index {
                let property = &mut object.properties[i];
                if !matches!(&property.value, JsNode::Simple(s) if s.is_static) {
                    wrap_value(ctx, property, RuntimeHelper::NormalizeClass);
                }
            }
            if let Some(i) = style_index {
                let property = &mut object.properties[i];
                let needs = has_style_binding
                    || matches!(&property.value, JsNode::Simple(s) if s.content.trim_start().starts_with('['))
                    || matches!(property.value, JsNode::Array(_));
                if needs {
                    wrap_value(ctx, property, RuntimeHelper::NormalizeStyle);
                }
            }
            JsNode::Object(object)
        }
        call @ JsNode::Call(_) => call,
        single => {
            let mut inner = Vec::new_in(allocator);
            inner.push(single);
            let guard = ctx.helper(RuntimeHelper::GuardReactiveProps);
            let mut arguments = Vec::new_in(allocator);
            arguments.push(JsNode::helper_call(allocator, guard, inner));
            let normalize = ctx.helper(RuntimeHelper::NormalizeProps);
            JsNode::helper_call(allocator, normalize, arguments)
        }
    }
}

fn wrap_value<'a>(ctx: &mut TransformContext<'a>, property: &mut Property<'a>, helper: RuntimeHelper) {
    let allocator = ctx.allocator;
    let value = std::mem::replace(&mut property.value, JsNode::Child(0));
    let mut arguments = Vec::new_in(allocator);
    arguments.push(value);
    let helper = ctx.helper(helper);
    property.value = JsNode::helper_call(allocator, helper, arguments);
}

fn is_handler_key(key: &ExpressionNode<'_>) -> bool {
    match key {
        ExpressionNode::Simple(s) => s.is_handler_key,
        ExpressionNode::Compound(c) => c.is_handler_key,
    }
}

/// Collapse repeated static keys. `class`, `style` and listeners merge
/// into arrays; any other repeat keeps the first value.
pub fn dedupe_properties<'a>(allocator: &'a Bump, properties: std::vec::Vec<Property<'a>>) -> Vec<'a, Property<'a>> {
    let mut known: FxHashMap<String, usize> = FxHashMap::default();
    let mut deduped: Vec<'a, Property<'a>> = Vec::with_capacity_in(properties.len(), allocator);
    for property in properties {
        let Some(name) = property.static_key().map(String::from) else {
            deduped.push(property);
            continue;
        };
        match known.get(&name) {
            Some(&at) => {
                if name == "class" || name == "style" || is_on(&name) {
                    merge_as_array(allocator, &mut deduped[at], property.value);
                }
            }
            None => {
                known.insert(name, deduped.len());
                deduped.push(property);
            }
        }
    }
    deduped
}

fn merge_as_array<'a>(allocator: &'a Bump, existing: &mut Property<'a>, incoming: JsNode<'a>) {
    if let JsNode::Array(array) = &mut existing.value {
        array.elements.push(incoming);
        return;
    }
    let first = std::mem::replace(&mut existing.value, JsNode::Child(0));
    let mut elements = Vec::new_in(allocator);
    elements.push(first);
    elements.push(incoming);
    existing.value = JsNode::array(allocator, elements);
}

/// `["foo", "bar"]` list handed to the runtime next to PROPS
pub fn stringify_dynamic_prop_names<'a>(allocator: &'a Bump, names: &[String]) -> JsNode<'a> {
    let mut out = String::from("[");
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format_compact!("{:?}", name.as_str()));
    }
    out.push(']');
    JsNode::simple(allocator, out, ConstantType::CanStringify)
}

/// `[dir, exp, arg, modifiers]` argument of `withDirectives`
pub fn build_directive_args<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    runtime: Option<RuntimeHelper>,
) -> JsNode<'a> {
    let allocator = ctx.allocator;
    let mut elements = Vec::new_in(allocator);

    let resolved = match runtime {
        Some(helper) => ctx.helper_string(helper),
        None => match resolve_setup_reference(ctx, &format_compact!("v-{}", dir.name)) {
            Some(from_setup) => from_setup,
            None => {
                ctx.helper(RuntimeHelper::ResolveDirective);
                ctx.add_directive(&dir.name);
                to_valid_asset_id(&dir.name, "directive")
            }
        },
    };
    elements.push(JsNode::simple(allocator, resolved, ConstantType::NotConstant));

    let void = || JsNode::simple(allocator, "void 0", ConstantType::CanStringify);
    if let Some(exp) = &dir.exp {
        elements.push(JsNode::from_expression(exp.clone_in(allocator)));
    }
    if let Some(arg) = &dir.arg {
        if dir.exp.is_none() {
            elements.push(void());
        }
        elements.push(JsNode::from_expression(arg.clone_in(allocator)));
    }
    if !dir.modifiers.is_empty() {
        if dir.arg.is_none() {
            if dir.exp.is_none() {
                elements.push(void());
            }
            elements.push(void());
        }
        let mut properties = Vec::new_in(allocator);
        for modifier in dir.modifiers.iter() {
            properties.push(Property::named(
                allocator,
                modifier.clone(),
                JsNode::simple(allocator, "true", ConstantType::CanStringify),
            ));
        }
        elements.push(JsNode::object(allocator, properties));
    }
    JsNode::array(allocator, elements)
}

/// Code referring to a `<script setup>` binding named like `name`
/// (as written, camelized or PascalCased), if there is one.
pub fn resolve_setup_reference(ctx: &mut TransformContext<'_>, name: &str) -> Option<String> {
    let metadata = ctx.options.binding_metadata.as_ref()?;
    if !metadata.is_script_setup {
        return None;
    }
    let camel = camelize(name);
    let pascal = capitalize(&camel);
    let check = |types: &[BindingType]| -> Option<String> {
        [name, camel.as_str(), pascal.as_str()]
            .into_iter()
            .find(|candidate| metadata.get(candidate).is_some_and(|t| types.contains(&t)))
            .map(String::from)
    };

    let from_const = check(&[BindingType::SetupConst, BindingType::SetupReactiveConst, BindingType::LiteralConst]);
    let from_maybe_ref = check(&[BindingType::SetupLet, BindingType::SetupRef, BindingType::SetupMaybeRef]);
    let from_props = check(&[BindingType::Props]);

    if let Some(found) = from_const {
        return Some(if ctx.inline() {
            found
        } else {
            format_compact!("$setup[{:?}]", found.as_str())
        });
    }
    if let Some(found) = from_maybe_ref {
        return Some(if ctx.inline() {
            let unref = ctx.helper_string(RuntimeHelper::Unref);
            format_compact!("{unref}({found})")
        } else {
            format_compact!("$setup[{:?}]", found.as_str())
        });
    }
    if let Some(found) = from_props {
        let unref = ctx.helper_string(RuntimeHelper::Unref);
        let object = if ctx.inline() { "__props" } else { "$props" };
        return Some(format_compact!("{unref}({object}[{:?}])", found.as_str()));
    }
    None
}

/// `:foo` shorthand: the camelized argument doubles as the expression
pub fn bind_shorthand_exp<'a>(allocator: &'a Bump, dir: &DirectiveNode<'a>) -> Option<ExpressionNode<'a>> {
    dir.static_arg().map(|arg| simple_exp(allocator, camelize(arg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{transform, TransformPlugins};
    use gesso_canvas::TransformOptions;
    use gesso_palette::Bump;
    use gesso_sketch::parse;

    fn build<'a>(allocator: &'a Bump, source: &'a str, options: TransformOptions) -> (PropsBuildResult<'a>, std::vec::Vec<ErrorCode>) {
        let (root, _) = parse(allocator, source);
        let plugins = TransformPlugins::base();
        let mut ctx = TransformContext::new(allocator, options, &plugins);
        let el = root.children[0].as_element().unwrap();
        let is_component = el.is_component();
        let result = build_props(
            &mut ctx,
            el,
            None,
            PropsTarget {
                is_component,
                ..Default::default()
            },
        );
        (result, ctx.errors.iter().map(|e| e.code).collect())
    }

    fn object_keys(props: &JsNode<'_>) -> std::vec::Vec<std::string::String> {
        let JsNode::Object(object) = props else { panic!("expected object") };
        object
            .properties
            .iter()
            .map(|p| p.static_key().unwrap_or("<dynamic>").to_string())
            .collect()
    }

    #[test]
    fn test_class_merge_and_normalize() {
        let allocator = Bump::new();
        let (result, _) = build(&allocator, r#"<div class="a" :class="b"/>"#, TransformOptions::default());
        let props = result.props.unwrap();
        assert_eq!(object_keys(&props), vec!["class"]);
        let JsNode::Object(object) = &props else { unreachable!() };
        let JsNode::Call(call) = &object.properties[0].value else { panic!("expected normalizeClass") };
        assert_eq!(call.callee, Callee::Helper(RuntimeHelper::NormalizeClass));
        assert!(matches!(&call.arguments[0], JsNode::Array(a) if a.elements.len() == 2));
        assert_eq!(result.patch_flag, PatchFlags::CLASS);
    }

    #[test]
    fn test_dynamic_props_listed() {
        let allocator = Bump::new();
        let (result, _) = build(&allocator, r#"<div id="x" :title="t" :foo="f" :key="k"/>"#, TransformOptions::default());
        assert_eq!(result.patch_flag, PatchFlags::PROPS);
        assert_eq!(result.dynamic_prop_names, vec!["title", "foo"]);
        assert!(result.should_use_block);
    }

    #[test]
    fn test_object_spread_uses_merge_props() {
        let allocator = Bump::new();
        let (result, _) = build(&allocator, r#"<div id="a" v-bind="obj" class="c"/>"#, TransformOptions::default());
        let Some(JsNode::Call(call)) = &result.props else { panic!("expected mergeProps") };
        assert_eq!(call.callee, Callee::Helper(RuntimeHelper::MergeProps));
        assert_eq!(call.arguments.len(), 3);
        assert_eq!(result.patch_flag, PatchFlags::FULL_PROPS);
    }

    #[test]
    fn test_lone_object_spread_is_guarded() {
        let allocator = Bump::new();
        let (result, _) = build(&allocator, r#"<div v-bind="obj"/>"#, TransformOptions::default());
        let Some(JsNode::Call(call)) = &result.props else { panic!("expected normalizeProps") };
        assert_eq!(call.callee, Callee::Helper(RuntimeHelper::NormalizeProps));
    }

    #[test]
    fn test_custom_directive_needs_patch() {
        let allocator = Bump::new();
        let (result, _) = build(&allocator, r#"<div v-focus/>"#, TransformOptions::default());
        assert_eq!(result.directives.len(), 1);
        assert_eq!(result.patch_flag, PatchFlags::NEED_PATCH);
    }

    #[test]
    fn test_ref_needs_patch() {
        let allocator = Bump::new();
        let (result, _) = build(&allocator, r#"<div ref="el"/>"#, TransformOptions::default());
        assert_eq!(result.patch_flag, PatchFlags::NEED_PATCH);
    }

    #[test]
    fn test_misplaced_slot_and_missing_bind() {
        let allocator = Bump::new();
        let (_, errors) = build(&allocator, r#"<div v-slot="x" v-bind/>"#, TransformOptions::default());
        assert_eq!(errors, vec![ErrorCode::XVSlotMisplaced, ErrorCode::XVBindNoExpression]);
    }

    #[test]
    fn test_dedupe_keeps_first_plain_value() {
        let allocator = Bump::new();
        let mut properties = std::vec::Vec::new();
        properties.push(Property::named(&allocator, "id", JsNode::string(&allocator, "a")));
        properties.push(Property::named(&allocator, "onClick", JsNode::simple(&allocator, "f", ConstantType::NotConstant)));
        properties.push(Property::named(&allocator, "id", JsNode::string(&allocator, "b")));
        properties.push(Property::named(&allocator, "onClick", JsNode::simple(&allocator, "g", ConstantType::NotConstant)));
        let deduped = dedupe_properties(&allocator, properties);
        assert_eq!(deduped.len(), 2);
        assert!(matches!(&deduped[0].value, JsNode::Simple(s) if s.content == "a"));
        assert!(matches!(&deduped[1].value, JsNode::Array(a) if a.elements.len() == 2));
    }

    #[test]
    fn test_transform_keeps_props_of_component_dynamic() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<Foo :class="c"/>"#);
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        let call = root.children[0].codegen().and_then(JsNode::as_vnode_call).unwrap();
        assert_eq!(call.patch_flag.map(|f| f.value()), Some(PatchFlags::PROPS.bits()));
    }
}
