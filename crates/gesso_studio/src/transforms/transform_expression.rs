//! Expression transform.
//!
//! With `prefix_identifiers` on, free identifiers in template expressions are
//! rewritten to property access on the render context (`foo` ->
//! `_ctx.foo`), or to the binding-aware form when script setup metadata is
//! present. Expressions that read something get split into a compound whose
//! identifier parts keep their own location and constancy.

use gesso_canvas::{
    BindingType, CompilerError, CompoundExpressionNode, CompoundPart, ConstantType, ErrorCode,
    ExpressionNode, PropNode, SimpleExpressionNode, TemplateChildNode,
};
use gesso_palette::{
    is_globally_allowed, is_literal_whitelisted, is_simple_identifier, Box, String,
};

use super::js_ast::{scan_identifiers, scan_statement_identifiers};
use crate::transform::{Cursor, Exit, TransformContext};

pub fn transform_expression<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    match cursor.node_mut() {
        TemplateChildNode::Interpolation(interp) => {
            let content = std::mem::replace(&mut interp.content, placeholder(ctx));
            interp.content = process_expression(ctx, content);
        }
        TemplateChildNode::Element(el) => {
            for prop in el.props.iter_mut() {
                let PropNode::Directive(dir) = prop else { continue };
                if dir.name == "for" {
                    continue;
                }
                let skip_exp = dir.name == "slot" || (dir.name == "on" && dir.arg.is_some());
                if let Some(exp) = dir.exp.take() {
                    dir.exp = Some(if skip_exp {
                        exp
                    } else {
                        process_expression(ctx, exp)
                    });
                }
                if let Some(arg) = dir.arg.take() {
                    let dynamic = matches!(&arg, ExpressionNode::Simple(s) if !s.is_static);
                    dir.arg = Some(if dynamic { process_expression(ctx, arg) } else { arg });
                }
            }
        }
        _ => {}
    }
    Exit::None
}

fn placeholder<'a>(ctx: &TransformContext<'a>) -> ExpressionNode<'a> {
    super::utils::simple_exp(ctx.allocator, "")
}

/// Validate an expression and, when prefixing, rewrite its identifiers
pub fn process_expression<'a>(ctx: &mut TransformContext<'a>, exp: ExpressionNode<'a>) -> ExpressionNode<'a> {
    match exp {
        ExpressionNode::Simple(node) => process_simple(ctx, node, false),
        compound @ ExpressionNode::Compound(_) => compound,
    }
}

/// Like [`process_expression`] for a `;` separated handler body
pub fn process_statements<'a>(ctx: &mut TransformContext<'a>, exp: ExpressionNode<'a>) -> ExpressionNode<'a> {
    match exp {
        ExpressionNode::Simple(node) => process_simple(ctx, node, true),
        compound @ ExpressionNode::Compound(_) => compound,
    }
}

fn process_simple<'a>(
    ctx: &mut TransformContext<'a>,
    mut node: Box<'a, SimpleExpressionNode>,
    statements: bool,
) -> ExpressionNode<'a> {
    if node.is_static || node.content.trim().is_empty() {
        return ExpressionNode::Simple(node);
    }

    let raw = node.content.clone();
    let scanned = if statements {
        scan_statement_identifiers(&raw)
    } else {
        scan_identifiers(&raw)
    };
    let ids = match scanned {
        Ok(ids) => ids,
        Err(err) => {
            let detail = format!("{} in `{}`", err.message, raw);
            ctx.report(CompilerError::with_detail(
                ErrorCode::XInvalidExpression,
                Some(node.loc.clone()),
                &detail,
            ));
            return ExpressionNode::Simple(node);
        }
    };
    if !ctx.prefix_identifiers() {
        return ExpressionNode::Simple(node);
    }

    if is_simple_identifier(&raw) {
        let in_scope = ctx.is_in_scope(&raw);
        let literal = is_literal_whitelisted(&raw);
        let binding = ctx.binding(&raw);
        if !in_scope && !literal && (!is_globally_allowed(&raw) || binding.is_some()) {
            if matches!(binding, Some(BindingType::SetupConst | BindingType::LiteralConst)) {
                node.const_type = ConstantType::CanSkipPatch;
            }
            node.content = rewrite_identifier(ctx, &raw);
        } else if !in_scope {
            node.const_type = if literal {
                ConstantType::CanStringify
            } else {
                ConstantType::CanHoist
            };
        }
        return ExpressionNode::Simple(node);
    }

    let bail = bails_constant(&raw);
    if ids.is_empty() {
        node.const_type = if bail {
            ConstantType::NotConstant
        } else {
            ConstantType::CanStringify
        };
        return ExpressionNode::Simple(node);
    }

    let allocator = ctx.allocator;
    let mut compound = CompoundExpressionNode::new(allocator, node.loc.clone());
    let mut last_end = 0;
    for id in &ids {
        let name = &raw[id.start..id.end];
        let local = id.local || ctx.is_in_scope(name);
        let can_prefix = !is_globally_allowed(name) || ctx.binding(name).is_some();
        let prefix = can_prefix && name != "require" && !local;

        let mut leading = String::from(&raw[last_end..id.start]);
        if prefix && id.shorthand {
            leading.push_str(name);
            leading.push_str(": ");
        }
        if !leading.is_empty() {
            compound.children.push(CompoundPart::Raw(leading));
        }

        let (content, const_type) = if prefix {
            (rewrite_identifier(ctx, name), ConstantType::NotConstant)
        } else if local || bail {
            (String::from(name), ConstantType::NotConstant)
        } else {
            (String::from(name), ConstantType::CanStringify)
        };
        compound.children.push(CompoundPart::Simple(Box::new_in(
            SimpleExpressionNode::new(content, false, node.loc.inner(id.start, id.end - id.start), const_type),
            allocator,
        )));
        last_end = id.end;
    }
    if last_end < raw.len() {
        compound.children.push(CompoundPart::Raw(String::from(&raw[last_end..])));
    }
    ExpressionNode::Compound(Box::new_in(compound, allocator))
}

/// Calls and member access keep an expression from being constant: `\w\s*\(`
/// or `\.[^\d]`
fn bails_constant(exp: &str) -> bool {
    let bytes = exp.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'.' && bytes.get(i + 1).is_some_and(|n| !n.is_ascii_digit()) {
            return true;
        }
        if b.is_ascii_alphanumeric() || b == b'_' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if bytes.get(j) == Some(&b'(') {
                return true;
            }
        }
    }
    false
}

/// Access path for a free identifier
pub fn rewrite_identifier(ctx: &mut TransformContext<'_>, raw: &str) -> String {
    let binding = ctx.binding(raw);
    let mut out = String::default();

    if ctx.inline() {
        match binding {
            Some(BindingType::SetupConst | BindingType::SetupReactiveConst | BindingType::LiteralConst) => {
                out.push_str(raw);
            }
            Some(BindingType::SetupRef) => {
                out.push_str(raw);
                out.push_str(".value");
            }
            Some(BindingType::SetupMaybeRef | BindingType::SetupLet) => {
                out.push_str(&ctx.helper_string(gesso_canvas::RuntimeHelper::Unref));
                out.push('(');
                out.push_str(raw);
                out.push(')');
            }
            Some(BindingType::Props) => push_props_access(&mut out, raw),
            Some(BindingType::PropsAliased) => {
                let key = props_alias(ctx, raw);
                push_props_access(&mut out, &key);
            }
            _ => {
                out.push_str("_ctx.");
                out.push_str(raw);
            }
        }
        return out;
    }

    match binding {
        Some(
            BindingType::SetupLet
            | BindingType::SetupMaybeRef
            | BindingType::SetupRef
            | BindingType::SetupReactiveConst
            | BindingType::SetupConst
            | BindingType::LiteralConst,
        ) => out.push_str("$setup."),
        Some(BindingType::PropsAliased) => {
            let key = props_alias(ctx, raw);
            out.push_str("$props['");
            out.push_str(&key);
            out.push_str("']");
            return out;
        }
        Some(BindingType::Props) => out.push_str("$props."),
        Some(BindingType::Data) => out.push_str("$data."),
        Some(BindingType::Options) => out.push_str("$options."),
        None => out.push_str("_ctx."),
    }
    out.push_str(raw);
    out
}

fn props_alias(ctx: &TransformContext<'_>, raw: &str) -> String {
    ctx.options
        .binding_metadata
        .as_ref()
        .and_then(|meta| meta.props_aliases.get(raw))
        .map_or_else(|| String::from(raw), |key| String::from(key.as_str()))
}

fn push_props_access(out: &mut String, key: &str) {
    if is_simple_identifier(key) {
        out.push_str("__props.");
        out.push_str(key);
    } else {
        out.push_str("__props[");
        out.push_str(&format!("{key:?}"));
        out.push(']');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformPlugins;
    use gesso_canvas::{BindingMetadata, SourceLocation, TransformOptions};
    use gesso_palette::Bump;

    fn context(allocator: &Bump, options: TransformOptions) -> TransformContext<'_> {
        TransformContext::new(allocator, options, &TransformPlugins::empty())
    }

    fn prefixing() -> TransformOptions {
        TransformOptions {
            prefix_identifiers: true,
            ..Default::default()
        }
    }

    fn exp<'a>(allocator: &'a Bump, content: &str) -> ExpressionNode<'a> {
        ExpressionNode::simple(
            allocator,
            content,
            false,
            SourceLocation::new(Default::default(), Default::default(), content),
            ConstantType::NotConstant,
        )
    }

    /// Flattened code of a processed expression
    fn code(exp: &ExpressionNode<'_>) -> std::string::String {
        match exp {
            ExpressionNode::Simple(s) => s.content.to_string(),
            ExpressionNode::Compound(c) => c
                .children
                .iter()
                .map(|part| match part {
                    CompoundPart::Raw(s) => s.to_string(),
                    CompoundPart::Simple(s) => s.content.to_string(),
                    _ => std::string::String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_simple_identifier() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator, prefixing());
        let out = process_expression(&mut ctx, exp(&allocator, "foo"));
        assert_eq!(code(&out), "_ctx.foo");

        let out = process_expression(&mut ctx, exp(&allocator, "true"));
        assert_eq!(out.as_simple().unwrap().const_type, ConstantType::CanStringify);

        let out = process_expression(&mut ctx, exp(&allocator, "Math"));
        assert_eq!(code(&out), "Math");
        assert_eq!(out.as_simple().unwrap().const_type, ConstantType::CanHoist);

        ctx.add_identifier("item");
        let out = process_expression(&mut ctx, exp(&allocator, "item"));
        assert_eq!(code(&out), "item");
        assert_eq!(out.as_simple().unwrap().const_type, ConstantType::NotConstant);
    }

    #[test]
    fn test_compound_rewrite() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator, prefixing());
        ctx.add_identifier("item");
        let out = process_expression(&mut ctx, exp(&allocator, "item.id + count * Math.max(a, 1)"));
        assert_eq!(code(&out), "item.id + _ctx.count * Math.max(_ctx.a, 1)");

        let out = process_expression(&mut ctx, exp(&allocator, "{ foo, bar: baz }"));
        assert_eq!(code(&out), "{ foo: _ctx.foo, bar: _ctx.baz }");

        let out = process_expression(&mut ctx, exp(&allocator, "list.map(x => x + y)"));
        assert_eq!(code(&out), "_ctx.list.map(x => x + _ctx.y)");
    }

    #[test]
    fn test_destructuring_assignment_keeps_keys() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator, prefixing());
        let out = process_expression(&mut ctx, exp(&allocator, "({ a = d } = o)"));
        assert_eq!(code(&out), "({ a: _ctx.a = _ctx.d } = _ctx.o)");
        assert!(ctx.errors.is_empty());
    }

    #[test]
    fn test_statement_list() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator, prefixing());
        ctx.add_identifier("$event");
        let out = process_statements(&mut ctx, exp(&allocator, "const t = v; use(t, $event)"));
        assert_eq!(code(&out), "const t = _ctx.v; _ctx.use(t, $event)");
        assert!(ctx.errors.is_empty());

        let out = process_expression(&mut ctx, exp(&allocator, "a; b"));
        assert_eq!(code(&out), "a; b");
        assert_eq!(ctx.errors[0].code, ErrorCode::XInvalidExpression);
    }

    #[test]
    fn test_constant_expressions() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator, prefixing());
        let out = process_expression(&mut ctx, exp(&allocator, "1 + 2"));
        assert_eq!(out.as_simple().unwrap().const_type, ConstantType::CanStringify);
        let out = process_expression(&mut ctx, exp(&allocator, "'a'.toUpperCase()"));
        assert_eq!(out.as_simple().unwrap().const_type, ConstantType::NotConstant);
        assert!(bails_constant("foo ()"));
        assert!(!bails_constant("1.5 + 2"));
    }

    #[test]
    fn test_binding_metadata() {
        let allocator = Bump::new();
        let mut meta = BindingMetadata::default();
        meta.bindings.insert("count".into(), BindingType::SetupRef);
        meta.bindings.insert("maybe".into(), BindingType::SetupMaybeRef);
        meta.bindings.insert("msg".into(), BindingType::Props);
        meta.bindings.insert("helper".into(), BindingType::SetupConst);

        let mut ctx = context(
            &allocator,
            TransformOptions {
                binding_metadata: Some(meta.clone()),
                ..prefixing()
            },
        );
        assert_eq!(rewrite_identifier(&mut ctx, "count"), "$setup.count");
        assert_eq!(rewrite_identifier(&mut ctx, "msg"), "$props.msg");
        assert_eq!(rewrite_identifier(&mut ctx, "other"), "_ctx.other");
        let out = process_expression(&mut ctx, exp(&allocator, "helper"));
        assert_eq!(out.as_simple().unwrap().const_type, ConstantType::CanSkipPatch);

        let mut inline = context(
            &allocator,
            TransformOptions {
                binding_metadata: Some(meta),
                inline: true,
                ..prefixing()
            },
        );
        assert_eq!(rewrite_identifier(&mut inline, "count"), "count.value");
        assert_eq!(rewrite_identifier(&mut inline, "maybe"), "_unref(maybe)");
        assert_eq!(rewrite_identifier(&mut inline, "msg"), "__props.msg");
        assert_eq!(rewrite_identifier(&mut inline, "helper"), "helper");
        assert!(inline.helpers.contains(gesso_canvas::RuntimeHelper::Unref));
    }

    #[test]
    fn test_invalid_expression_reported() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator, TransformOptions::default());
        let out = process_expression(&mut ctx, exp(&allocator, "foo("));
        assert_eq!(code(&out), "foo(");
        assert_eq!(ctx.errors.len(), 1);
        assert_eq!(ctx.errors[0].code, ErrorCode::XInvalidExpression);

        let out = process_expression(&mut ctx, exp(&allocator, "x y"));
        assert_eq!(code(&out), "x y");
        assert_eq!(ctx.errors.len(), 2);
    }

    #[test]
    fn test_function_mode_leaves_expressions() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator, TransformOptions::default());
        let out = process_expression(&mut ctx, exp(&allocator, "a + b"));
        assert_eq!(code(&out), "a + b");
        assert!(ctx.errors.is_empty());
    }
}
