//! `v-model` as a prop plus an update listener.
//!
//! `v-model="x"` becomes `modelValue: x` and
//! `"onUpdate:modelValue": $event => ((x) = $event)`. Platform transforms
//! build on this for native form elements.

use gesso_canvas::{
    BindingType, CompoundExpressionNode, CompoundPart, ConstantType, DirectiveNode, ElementNode, ElementType,
    ErrorCode, ExpressionNode, JsNode, Property, RuntimeHelper,
};
use gesso_palette::{camelize, format_compact, is_simple_identifier, Box, String};

use super::js_ast::is_member_expression;
use super::utils::{simple_exp, static_exp};
use super::v_slot::expression_refs_scope;
use crate::transform::{DirectiveTransformResult, TransformContext};

pub fn transform_model<'a>(
    ctx: &mut TransformContext<'a>,
    dir: &DirectiveNode<'a>,
    el: &ElementNode<'a>,
) -> DirectiveTransformResult<'a> {
    let allocator = ctx.allocator;
    let Some(exp) = dir.exp.as_ref() else {
        ctx.on_error(ErrorCode::XVModelNoExpression, Some(&dir.loc));
        return DirectiveTransformResult::empty();
    };

    let raw = String::from(exp.loc().source.trim());
    let content = match exp {
        ExpressionNode::Simple(s) => s.content.clone(),
        ExpressionNode::Compound(_) => raw.clone(),
    };
    let binding = ctx.binding(&raw);
    if matches!(binding, Some(BindingType::Props | BindingType::PropsAliased)) {
        ctx.on_error(ErrorCode::XVModelOnProps, Some(exp.loc()));
        return DirectiveTransformResult::empty();
    }

    let maybe_ref = ctx.inline()
        && matches!(
            binding,
            Some(BindingType::SetupLet | BindingType::SetupRef | BindingType::SetupMaybeRef)
        );
    if content.trim().is_empty() || (!is_member_expression(&raw) && !maybe_ref) {
        ctx.on_error(ErrorCode::XVModelMalformedExpression, Some(exp.loc()));
        return DirectiveTransformResult::empty();
    }
    if ctx.prefix_identifiers() && is_simple_identifier(&content) && ctx.is_in_scope(&content) {
        ctx.on_error(ErrorCode::XVModelOnScopeVariable, Some(exp.loc()));
        return DirectiveTransformResult::empty();
    }

    let prop_name = match &dir.arg {
        Some(arg) => arg.clone_in(allocator),
        None => static_exp(allocator, "modelValue"),
    };
    let event_name = match &dir.arg {
        Some(ExpressionNode::Simple(arg)) if arg.is_static => {
            static_exp(allocator, format_compact!("onUpdate:{}", camelize(&arg.content)))
        }
        Some(arg) => {
            let mut name = CompoundExpressionNode::new(allocator, arg.loc().clone());
            name.push_raw("\"onUpdate:\" + ");
            push_expression(&mut name, arg.clone_in(allocator));
            ExpressionNode::Compound(Box::new_in(name, allocator))
        }
        None => static_exp(allocator, "onUpdate:modelValue"),
    };

    let mut assignment = CompoundExpressionNode::new(allocator, dir.loc.clone());
    match binding {
        Some(BindingType::SetupRef) if maybe_ref => {
            assignment.push_raw("$event => ((");
            push_expression(&mut assignment, simple_exp(allocator, raw.clone()));
            assignment.push_raw(").value = $event)");
        }
        _ if maybe_ref => {
            // `let` may be reassigned to a non-ref later
            let is_ref = ctx.helper_string(RuntimeHelper::IsRef);
            let alternate = if binding == Some(BindingType::SetupLet) {
                format_compact!("{raw} = $event")
            } else {
                String::const_new("null")
            };
            assignment.push_raw(&format_compact!("$event => ({is_ref}({raw}) ? ("));
            push_expression(&mut assignment, simple_exp(allocator, raw.clone()));
            assignment.push_raw(&format_compact!(").value = $event : {alternate})"));
        }
        _ => {
            assignment.push_raw("$event => ((");
            push_expression(&mut assignment, exp.clone_in(allocator));
            assignment.push_raw(") = $event)");
        }
    }
    let mut handler = JsNode::Compound(Box::new_in(assignment, allocator));
    if ctx.prefix_identifiers() && !ctx.in_v_once && ctx.options.cache_handlers && !expression_refs_scope(exp, ctx) {
        handler = ctx.cache(handler, false);
    }

    let mut props = vec![
        Property {
            key: prop_name,
            value: JsNode::from_expression(exp.clone_in(allocator)),
            loc: dir.loc.clone(),
        },
        Property {
            key: event_name,
            value: handler,
            loc: dir.loc.clone(),
        },
    ];

    if !dir.modifiers.is_empty() && el.tag_type == ElementType::Component {
        let modifiers = dir
            .modifiers
            .iter()
            .map(|m| {
                if is_simple_identifier(m) {
                    format_compact!("{m}: true")
                } else {
                    format_compact!("{:?}: true", m.as_str())
                }
            })
            .collect::<std::vec::Vec<_>>()
            .join(", ");
        let key = match &dir.arg {
            Some(ExpressionNode::Simple(arg)) if arg.is_static => {
                static_exp(allocator, format_compact!("{}Modifiers", arg.content))
            }
            Some(arg) => {
                let mut key = CompoundExpressionNode::new(allocator, arg.loc().clone());
                push_expression(&mut key, arg.clone_in(allocator));
                key.push_raw(" + \"Modifiers\"");
                ExpressionNode::Compound(Box::new_in(key, allocator))
            }
            None => static_exp(allocator, "modelModifiers"),
        };
        props.push(Property {
            key,
            value: JsNode::simple(allocator, format_compact!("{{ {modifiers} }}"), ConstantType::CanHoist),
            loc: dir.loc.clone(),
        });
    }

    DirectiveTransformResult::with_props(props)
}

fn push_expression<'a>(compound: &mut CompoundExpressionNode<'a>, exp: ExpressionNode<'a>) {
    match exp {
        ExpressionNode::Simple(s) => compound.children.push(CompoundPart::Simple(s)),
        ExpressionNode::Compound(c) => compound.children.push(CompoundPart::Compound(c)),
    }
}

#[cfg(test)]
mod tests {
    use super::transform_model;
    use crate::transform::{TransformContext, TransformPlugins};
    use gesso_canvas::{
        BindingMetadata, BindingType, CompoundPart, ErrorCode, JsNode, PropNode, TransformOptions,
    };
    use gesso_palette::Bump;
    use gesso_sketch::parse;

    fn value_text(node: &JsNode<'_>) -> String {
        match node {
            JsNode::Simple(s) => s.content.to_string(),
            JsNode::Compound(c) => c
                .children
                .iter()
                .map(|part| match part {
                    CompoundPart::Raw(raw) => raw.to_string(),
                    CompoundPart::Simple(s) => s.content.to_string(),
                    _ => String::new(),
                })
                .collect(),
            JsNode::Cache(cache) => format!("cache({})", value_text(&cache.value)),
            _ => "<other>".to_string(),
        }
    }

    /// `(key, value)` pairs, plus errors
    fn model(source: &str, options: TransformOptions) -> (Vec<(String, String)>, Vec<ErrorCode>) {
        let allocator = Bump::new();
        let (root, _) = parse(&allocator, source);
        let plugins = TransformPlugins::base();
        let mut ctx = TransformContext::new(&allocator, options, &plugins);
        let el = root.children[0].as_element().unwrap();
        let dir = el
            .props
            .iter()
            .find_map(|p| match p {
                PropNode::Directive(dir) if dir.name == "model" => Some(dir),
                _ => None,
            })
            .unwrap();
        let result = transform_model(&mut ctx, dir, el);
        let props = result
            .props
            .iter()
            .map(|p| (p.static_key().unwrap_or("<dynamic>").to_string(), value_text(&p.value)))
            .collect();
        (props, ctx.errors.iter().map(|e| e.code).collect())
    }

    #[test]
    fn test_component_model_with_modifiers() {
        let (props, errors) = model(r#"<Comp v-model:title.trim.lazy="doc.title"/>"#, TransformOptions::default());
        assert!(errors.is_empty());
        assert_eq!(
            props,
            vec![
                ("title".to_string(), "doc.title".to_string()),
                ("onUpdate:title".to_string(), "$event => ((doc.title) = $event)".to_string()),
                ("titleModifiers".to_string(), "{ trim: true, lazy: true }".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_model_on_element() {
        let (props, _) = model(r#"<input v-model.trim="text"/>"#, TransformOptions::default());
        assert_eq!(props.len(), 2, "modifiers only become a prop on components");
        assert_eq!(props[0].0, "modelValue");
        assert_eq!(props[1].0, "onUpdate:modelValue");
    }

    #[test]
    fn test_inline_setup_refs() {
        let mut metadata = BindingMetadata {
            is_script_setup: true,
            ..Default::default()
        };
        metadata.bindings.insert("count".into(), BindingType::SetupRef);
        metadata.bindings.insert("maybe".into(), BindingType::SetupLet);
        let options = || TransformOptions {
            inline: true,
            binding_metadata: Some(metadata.clone()),
            ..Default::default()
        };
        let (props, _) = model(r#"<Comp v-model="count"/>"#, options());
        assert_eq!(props[1].1, "$event => ((count).value = $event)");
        let (props, _) = model(r#"<Comp v-model="maybe"/>"#, options());
        assert_eq!(props[1].1, "$event => (_isRef(maybe) ? (maybe).value = $event : maybe = $event)");
    }

    #[test]
    fn test_errors() {
        let (_, errors) = model(r#"<input v-model/>"#, TransformOptions::default());
        assert_eq!(errors, vec![ErrorCode::XVModelNoExpression]);

        let (_, errors) = model(r#"<input v-model="a + b"/>"#, TransformOptions::default());
        assert_eq!(errors, vec![ErrorCode::XVModelMalformedExpression]);

        let (_, errors) = model(r#"<Comp v-model="a b"/>"#, TransformOptions::default());
        assert_eq!(errors, vec![ErrorCode::XVModelMalformedExpression]);

        let mut metadata = BindingMetadata::default();
        metadata.bindings.insert("value".into(), BindingType::Props);
        let options = TransformOptions {
            binding_metadata: Some(metadata),
            ..Default::default()
        };
        let (_, errors) = model(r#"<input v-model="value"/>"#, options);
        assert_eq!(errors, vec![ErrorCode::XVModelOnProps]);
    }

    #[test]
    fn test_cached_update_handler() {
        let options = TransformOptions {
            prefix_identifiers: true,
            cache_handlers: true,
            ..Default::default()
        };
        let (props, _) = model(r#"<Comp v-model="msg"/>"#, options);
        assert_eq!(props[1].1, "cache($event => ((msg) = $event))");
    }
}
