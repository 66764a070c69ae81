//! Server renderer output tests.

use gesso_canvas::{CodegenMode, ErrorCode};
use gesso_studio::CompileResult;
use gesso_studio_ssr::{compile_ssr, SsrCompilerOptions};

fn ssr(source: &str) -> CompileResult {
    compile_ssr(source, &SsrCompilerOptions::default())
}

/// Generated code, failing on any diagnostic
fn compiled(source: &str) -> String {
    let result = ssr(source);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    result.code
}

fn error_codes(source: &str) -> Vec<ErrorCode> {
    ssr(source).errors.iter().map(|e| e.code).collect()
}

mod render_function {
    use super::*;

    #[test]
    fn root_element_takes_attrs() {
        let code = compiled("<div>hello</div>");
        assert!(code.starts_with("const { ssrRenderAttrs: _ssrRenderAttrs } = require(\"vue/server-renderer\")\n"));
        assert!(code.contains("return function ssrRender(_ctx, _push, _parent, _attrs) {"));
        assert!(code.contains("_push(`<div${_ssrRenderAttrs(_attrs)}>hello</div>`)"));
        assert!(!code.contains("return _push"));
    }

    #[test]
    fn module_mode_imports_helpers() {
        let options = SsrCompilerOptions {
            mode: CodegenMode::Module,
            ..Default::default()
        };
        let code = compile_ssr("<div>{{ msg }}</div>", &options).code;
        assert!(code.contains(
            "import { ssrInterpolate as _ssrInterpolate, ssrRenderAttrs as _ssrRenderAttrs } from \"vue/server-renderer\""
        ));
        assert!(code.contains("export function ssrRender(_ctx, _push, _parent, _attrs) {"));
    }

    #[test]
    fn fragment_root_is_marked() {
        let code = compiled("<p>a</p><p>b</p>");
        assert!(code.contains("_push(`<!--[--><p>a</p><p>b</p><!--]-->`)"));
        assert!(!code.contains("_ssrRenderAttrs"));
    }

    #[test]
    fn text_is_escaped() {
        let code = compiled("<p>a</p><p>&lt;b&gt; &amp; \"q\"</p>");
        assert!(code.contains("<p>&lt;b&gt; &amp; &quot;q&quot;</p>"));
    }

    #[test]
    fn interpolation() {
        let code = compiled("<p>{{ msg }}</p><p>x</p>");
        assert!(code.contains("_ssrInterpolate(_ctx.msg)"));
        assert!(code.contains("ssrInterpolate: _ssrInterpolate"));
    }

    #[test]
    fn scope_id_on_elements() {
        let options = SsrCompilerOptions {
            scope_id: Some("data-v-7ba5bd90".into()),
            ..Default::default()
        };
        let code = compile_ssr("<p>a</p><span></span>", &options).code;
        assert!(code.contains("<p data-v-7ba5bd90>a</p><span data-v-7ba5bd90></span>"));
    }
}

mod structure {
    use super::*;

    #[test]
    fn if_else_chain() {
        let code = compiled(r#"<p v-if="ok">a</p><p v-else-if="other">b</p><p v-else>c</p>"#);
        assert!(code.contains("if (_ctx.ok) {"));
        assert!(code.contains("} else if (_ctx.other) {"));
        assert!(code.contains("} else {"));
        assert!(code.contains("_push(`<p${_ssrRenderAttrs(_attrs)}>c</p>`)"));
        assert!(!code.contains("<!---->"));
    }

    #[test]
    fn if_without_else_renders_placeholder() {
        let code = compiled(r#"<div><p v-if="ok">a</p></div>"#);
        assert!(code.contains("if (_ctx.ok) {"));
        assert!(code.contains("_push(`<p>a</p>`)"));
        assert!(code.contains("_push(`<!---->`)"));
    }

    #[test]
    fn if_branch_with_text_is_a_fragment() {
        let code = compiled(r#"<div><template v-if="ok">a<b>b</b></template></div>"#);
        assert!(code.contains("_push(`<!--[-->a<b>b</b><!--]-->`)"));
    }

    #[test]
    fn for_renders_list_between_markers() {
        let code = compiled(r#"<ul><li v-for="(item, i) in items">{{ item }}</li></ul>"#);
        assert!(code.contains("<!--[-->`)"));
        assert!(code.contains("_ssrRenderList(_ctx.items, (item, i) => {"));
        assert!(code.contains("_ssrInterpolate(item)"));
        assert!(!code.contains("_ctx.item)"));
        assert!(code.contains("_push(`<!--]--></ul>`)"));
    }

    #[test]
    fn for_with_index_only_fills_missing_aliases() {
        let code = compiled(r#"<ul><li v-for="(_, __, index) in rows">{{ index }}</li></ul>"#);
        assert!(code.contains("(_, __, index) => {"));
    }
}

mod attributes {
    use super::*;

    #[test]
    fn static_attributes_are_escaped() {
        let code = compiled(r#"<p>a</p><p id="x" title="a &quot;b&quot;">b</p>"#);
        assert!(code.contains(r#"<p id="x" title="a &quot;b&quot;">b</p>"#));
    }

    #[test]
    fn class_merges_static_and_bound() {
        let code = compiled(r#"<p>a</p><p class="base" :class="extra">b</p>"#);
        assert!(code.contains("class=\"${_ssrRenderClass([_ctx.extra, \"base\"])}\""));
        assert!(!code.contains("class=\"base\""));
    }

    #[test]
    fn bound_attribute_and_boolean() {
        let code = compiled(r#"<p>a</p><button :title="tip" :disabled="off">b</button>"#);
        assert!(code.contains("_ssrRenderAttr(\"title\", _ctx.tip)"));
        assert!(code.contains("(_ssrIncludeBooleanAttr(_ctx.off)) ? \" disabled\" : \"\""));
    }

    #[test]
    fn prop_names_become_attribute_names() {
        let code = compiled(r#"<p>a</p><label :htmlFor="id" :tabIndex="n">b</label>"#);
        assert!(code.contains("_ssrRenderAttr(\"for\", _ctx.id)"));
        assert!(code.contains("_ssrRenderAttr(\"tabindex\", _ctx.n)"));
    }

    #[test]
    fn key_and_ref_are_skipped() {
        let code = compiled(r#"<p>a</p><p key="k" ref="r" :key="id">b</p>"#);
        assert!(code.contains("<p>b</p>"));
    }

    #[test]
    fn v_show_renders_display_none() {
        let code = compiled(r#"<p>a</p><p v-show="ok">b</p>"#);
        assert!(code.contains("style=\"${_ssrRenderStyle((_ctx.ok) ? null : { display: \"none\" })}\""));
    }

    #[test]
    fn static_style_joins_bound_style() {
        let code = compiled(r#"<p>a</p><p style="color: red" :style="extra">b</p>"#);
        assert!(code.contains("_ssrRenderStyle([_ctx.extra, \"color: red\"])"));
        assert!(!code.contains("style=\"color: red\""));
    }

    #[test]
    fn spread_goes_through_merged_attrs() {
        let code = compiled(r#"<p>a</p><p id="x" v-bind="obj">b</p>"#);
        assert!(code.contains("_ssrRenderAttrs(_mergeProps({ id: \"x\" }, _ctx.obj))"));
        assert!(code.contains("mergeProps: _mergeProps } = require(\"vue\")"));
    }

    #[test]
    fn custom_directive_props() {
        let code = compiled(r#"<p>a</p><p v-focus:now.lazy="on">b</p>"#);
        assert!(code.contains("const _directive_focus = _resolveDirective(\"focus\")"));
        assert!(code.contains("_ssrGetDirectiveProps(_ctx, _directive_focus, _ctx.on, \"now\", { lazy: true })"));
    }

    #[test]
    fn html_and_text_content() {
        let code = compiled(r#"<p>a</p><div v-html="raw"></div><span v-text="msg"></span>"#);
        assert!(code.contains("_ctx.raw"));
        assert!(!code.contains("_ssrInterpolate(_ctx.raw)"));
        assert!(code.contains("_ssrInterpolate(_ctx.msg)"));
    }

    #[test]
    fn unsafe_attribute_name() {
        let result = ssr(r#"<p>a</p><p :a'b="x">b</p>"#);
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::XSsrUnsafeAttrName));
        assert!(!result.code.contains("_ssrRenderAttr("));
    }
}

mod model {
    use super::*;

    #[test]
    fn text_input() {
        let code = compiled(r#"<p>a</p><input v-model="text">"#);
        assert!(code.contains("_ssrRenderAttr(\"value\", _ctx.text)"));
        assert!(!code.contains("</input>"));
    }

    #[test]
    fn radio_input() {
        let code = compiled(r#"<p>a</p><input type="radio" value="a" v-model="pick">"#);
        assert!(code.contains("_ssrIncludeBooleanAttr(_ssrLooseEqual(_ctx.pick, \"a\"))"));
        assert!(code.contains("\" checked\""));
    }

    #[test]
    fn checkbox_input() {
        let code = compiled(r#"<p>a</p><input type="checkbox" v-model="done">"#);
        assert!(code.contains("Array.isArray(_ctx.done)"));
        assert!(code.contains("_ssrLooseContain(_ctx.done, null)"));
    }

    #[test]
    fn checkbox_with_true_value() {
        let code = compiled(r#"<p>a</p><input type="checkbox" true-value="yes" v-model="done">"#);
        assert!(code.contains("_ssrLooseEqual(_ctx.done, \"yes\")"));
    }

    #[test]
    fn dynamic_type() {
        let code = compiled(r#"<p>a</p><input :type="kind" v-model="v">"#);
        assert!(code.contains("_ssrRenderDynamicModel(_ctx.kind, _ctx.v, null)"));
    }

    #[test]
    fn textarea_content() {
        let code = compiled(r#"<p>a</p><textarea v-model="body"></textarea>"#);
        assert!(code.contains("_ssrInterpolate(_ctx.body)"));
    }

    #[test]
    fn invalid_usages() {
        assert_eq!(error_codes(r#"<p>a</p><div v-model="x"></div>"#), [ErrorCode::XVModelOnInvalidElement]);
        assert_eq!(error_codes(r#"<p>a</p><input v-model>"#), [ErrorCode::XVModelNoExpression]);
    }
}

mod components {
    use super::*;

    #[test]
    fn root_component_merges_attrs() {
        let code = compiled(r#"<Comp :msg="m" />"#);
        assert!(code.contains("const _component_Comp = _resolveComponent(\"Comp\")"));
        assert!(code.contains("_push(_ssrRenderComponent(_component_Comp, _mergeProps({ msg: _ctx.m }, _attrs), null, _parent))"));
    }

    #[test]
    fn component_without_props() {
        let code = compiled("<p>a</p><Comp />");
        assert!(code.contains("_push(_ssrRenderComponent(_component_Comp, null, null, _parent))"));
    }

    #[test]
    fn default_slot_pushes_content() {
        let code = compiled("<p>a</p><Comp>hi</Comp>");
        assert!(code.contains("default: _withCtx((_, _push, _parent, _scopeId) => {"));
        assert!(code.contains("_push(`hi`)"));
        assert!(code.contains("withCtx: _withCtx"));
    }

    #[test]
    fn scoped_named_slot() {
        let code = compiled(r#"<p>a</p><List><template #row="{ item }">{{ item.name }}</template></List>"#);
        assert!(code.contains("row: _withCtx(({ item }, _push, _parent, _scopeId) => {"));
        assert!(code.contains("_ssrInterpolate(item.name)"));
    }

    #[test]
    fn dynamic_component_renders_vnode() {
        let code = compiled(r#"<p>a</p><component :is="view" />"#);
        assert!(code.contains("_ssrRenderVNode(_push, _createVNode(_resolveDynamicComponent(_ctx.view), null, null), _parent)"));
    }

    #[test]
    fn transition_children_render_inline() {
        let code = compiled("<p>a</p><Transition><p>b</p></Transition>");
        assert!(code.contains("<p>b</p>"));
        assert!(!code.contains("Transition"));
    }

    #[test]
    fn teleport() {
        let code = compiled(r##"<p>a</p><Teleport to="#modal"><p>b</p></Teleport>"##);
        assert!(code.contains("_ssrRenderTeleport(_push, (_push) => {"));
        assert!(code.contains("\"#modal\", false, _parent)"));
    }

    #[test]
    fn teleport_without_target() {
        assert_eq!(error_codes("<p>a</p><Teleport><p>b</p></Teleport>"), [ErrorCode::XSsrNoTeleportTarget]);
    }
}

mod slots {
    use super::*;

    #[test]
    fn outlet_without_fallback() {
        let code = compiled("<p>a</p><slot />");
        assert!(code.contains("_ssrRenderSlot(_ctx.$slots, \"default\", {}, null, _push, _parent)"));
    }

    #[test]
    fn named_outlet_with_props_and_fallback() {
        let code = compiled(r#"<p>a</p><slot name="foot" :count="n">none</slot>"#);
        assert!(code.contains("_ssrRenderSlot(_ctx.$slots, \"foot\", { count: _ctx.n }, () => {"));
        assert!(code.contains("_push(`none`)"));
    }
}
