//! Component slots.
//!
//! A component's children compile to a slots object
//! `{ name: withCtx((props) => [...]), _: flag }`. Conditional and iterated
//! `<template v-slot>` entries go through `createSlots(static, [dynamic])`.

use gesso_canvas::{
    ChildRange, CompoundPart, ConditionalExpression, ElementNode, ElementType, ErrorCode,
    ExpressionNode, ForParseResult, FunctionExpression, JsNode, Property, RuntimeHelper,
    SourceLocation, TemplateChildNode,
};
use gesso_palette::{is_simple_identifier, Box, Bump, SlotFlags, SmallVec, String, Vec};

use super::js_ast::param_names;
use super::utils::{simple_exp, static_exp};
use crate::transform::TransformContext;

/// Names introduced by `v-slot="{ item }"` on a component or template,
/// `None` when the element declares no slot
pub fn slot_scope_names(el: &ElementNode<'_>) -> Option<std::vec::Vec<String>> {
    if !matches!(el.tag_type, ElementType::Component | ElementType::Template) {
        return None;
    }
    let index = el.find_dir("slot", true)?;
    let dir = el.props[index].as_directive()?;
    let names = dir
        .exp
        .as_ref()
        .and_then(ExpressionNode::as_simple)
        .map(|exp| param_names(&exp.content).unwrap_or_default())
        .unwrap_or_default();
    Some(names)
}

pub struct BuiltSlots<'a> {
    pub slots: JsNode<'a>,
    pub has_dynamic_slots: bool,
}

/// Build the slots object of component `el`
pub fn build_slots<'a>(ctx: &mut TransformContext<'a>, el: &ElementNode<'a>) -> BuiltSlots<'a> {
    let allocator = ctx.allocator;
    ctx.helper(RuntimeHelper::WithCtx);

    let mut has_dynamic_slots = if ctx.prefix_identifiers() && !ctx.ssr() {
        has_scope_ref_in_element(el, ctx)
    } else {
        ctx.scopes.v_slot > 0 || ctx.scopes.v_for > 0
    };

    let mut properties: Vec<'a, Property<'a>> = Vec::new_in(allocator);
    let mut dynamic_slots: Vec<'a, JsNode<'a>> = Vec::new_in(allocator);

    let on_component = el
        .find_dir("slot", true)
        .and_then(|i| el.props[i].as_directive())
        .map(|dir| (dir.arg.as_ref().map(|a| a.clone_in(allocator)), dir.exp.as_ref().map(|e| e.clone_in(allocator))));
    let has_on_component = on_component.is_some();
    if let Some((arg, exp)) = on_component {
        if matches!(&arg, Some(ExpressionNode::Simple(s)) if !s.is_static) || matches!(arg, Some(ExpressionNode::Compound(_))) {
            has_dynamic_slots = true;
        }
        let name = arg.unwrap_or_else(|| static_exp(allocator, "default"));
        let function = slot_function(allocator, exp, JsNode::Children(ChildRange::All), el.loc.clone());
        properties.push(Property {
            key: name,
            value: function,
            loc: SourceLocation::STUB,
        });
    }

    let mut has_template_slots = false;
    let mut has_named_default = false;
    let mut implicit_default: SmallVec<[usize; 4]> = SmallVec::new();
    let mut seen_names: std::vec::Vec<String> = std::vec::Vec::new();
    let mut branch_index = 0u32;

    for i in 0..el.children.len() {
        let slot_dir_index = match &el.children[i] {
            TemplateChildNode::Element(child) if child.tag_type == ElementType::Template => child.find_dir("slot", true),
            _ => None,
        };
        let Some(slot_dir_index) = slot_dir_index else {
            if !matches!(el.children[i], TemplateChildNode::Comment(_)) {
                implicit_default.push(i);
            }
            continue;
        };
        let Some(template) = el.children[i].as_element() else { continue };
        let Some(slot_dir) = template.props[slot_dir_index].as_directive() else { continue };

        if has_on_component {
            ctx.on_error(ErrorCode::XVSlotMixedSlotUsage, Some(&slot_dir.loc));
            break;
        }
        has_template_slots = true;

        let slot_name = slot_dir
            .arg
            .as_ref()
            .map(|a| a.clone_in(allocator))
            .unwrap_or_else(|| static_exp(allocator, "default"));
        let static_name = match &slot_name {
            ExpressionNode::Simple(s) if s.is_static => Some(s.content.clone()),
            _ => {
                has_dynamic_slots = true;
                None
            }
        };
        let dir_loc = slot_dir.loc.clone();
        let function = slot_function(
            allocator,
            slot_dir.exp.as_ref().map(|e| e.clone_in(allocator)),
            JsNode::Children(ChildRange::Of(i)),
            template.loc.clone(),
        );

        let if_dir = template.find_dir("if", false).and_then(|d| template.props[d].as_directive());
        let else_dir = template
            .find_dir_by(|name| name == "else" || name == "else-if", true)
            .and_then(|d| template.props[d].as_directive());
        let for_dir = template.find_dir("for", true).and_then(|d| template.props[d].as_directive());

        if let Some(if_dir) = if_dir {
            has_dynamic_slots = true;
            let test = if_dir.exp.as_ref().map(|e| e.clone_in(allocator));
            let entry = dynamic_slot(allocator, slot_name, function, Some(branch_index));
            branch_index += 1;
            dynamic_slots.push(conditional(allocator, test, entry));
        } else if let Some(else_dir) = else_dir {
            let previous_is_if = el.children[..i]
                .iter()
                .rev()
                .find(|c| !matches!(c, TemplateChildNode::Comment(_)))
                .and_then(TemplateChildNode::as_element)
                .is_some_and(|prev| {
                    prev.tag_type == ElementType::Template
                        && prev.find_dir_by(|name| name == "if" || name == "else-if", false).is_some()
                });
            let test = else_dir.exp.as_ref().map(|e| e.clone_in(allocator));
            let else_loc = else_dir.loc.clone();
            match dynamic_slots.last_mut() {
                Some(JsNode::Conditional(last)) if previous_is_if => {
                    let entry = dynamic_slot(allocator, slot_name, function, Some(branch_index));
                    branch_index += 1;
                    let alternate = match test {
                        Some(test) => conditional(allocator, Some(test), entry),
                        None => entry,
                    };
                    append_alternate(last, alternate);
                }
                _ => ctx.on_error(ErrorCode::XVElseNoAdjacentIf, Some(&else_loc)),
            }
        } else if let Some(for_dir) = for_dir {
            has_dynamic_slots = true;
            match &for_dir.for_parse_result {
                Some(result) => {
                    let entry = dynamic_slot(allocator, slot_name, function, None);
                    dynamic_slots.push(render_list_slots(ctx, result, entry));
                }
                None => {
                    let loc = for_dir.loc.clone();
                    ctx.on_error(ErrorCode::XVForMalformedExpression, Some(&loc));
                }
            }
        } else {
            if let Some(name) = static_name {
                if seen_names.contains(&name) {
                    ctx.on_error(ErrorCode::XVSlotDuplicateSlotNames, Some(&dir_loc));
                    continue;
                }
                if name == "default" {
                    has_named_default = true;
                }
                seen_names.push(name);
            }
            properties.push(Property {
                key: slot_name,
                value: function,
                loc: SourceLocation::STUB,
            });
        }
    }

    if !has_on_component {
        if !has_template_slots {
            let function = slot_function(allocator, None, JsNode::Children(ChildRange::All), el.loc.clone());
            properties.push(Property::named(allocator, "default", function));
        } else if implicit_default.iter().any(|&i| !el.children[i].is_whitespace_text()) {
            if has_named_default {
                let loc = el.children[implicit_default[0]].loc().clone();
                ctx.on_error(ErrorCode::XVSlotExtraneousDefaultSlotChildren, Some(&loc));
            } else {
                let function = slot_function(allocator, None, JsNode::Children(ChildRange::Only(implicit_default)), el.loc.clone());
                properties.push(Property::named(allocator, "default", function));
            }
        }
    }

    let flag = if has_dynamic_slots {
        SlotFlags::Dynamic
    } else if has_forwarded_slots(&el.children) {
        SlotFlags::Forwarded
    } else {
        SlotFlags::Stable
    };
    tracing::trace!(component = %el.tag, slots = properties.len(), dynamic = dynamic_slots.len(), flag = flag.name(), "slots");
    properties.push(Property::named(
        allocator,
        "_",
        JsNode::simple(allocator, flag.to_code(), gesso_canvas::ConstantType::CanStringify),
    ));

    let mut slots = JsNode::object(allocator, properties);
    if !dynamic_slots.is_empty() {
        let helper = ctx.helper(RuntimeHelper::CreateSlots);
        let mut arguments = Vec::new_in(allocator);
        arguments.push(slots);
        arguments.push(JsNode::array(allocator, dynamic_slots));
        slots = JsNode::helper_call(allocator, helper, arguments);
    }
    BuiltSlots {
        slots,
        has_dynamic_slots,
    }
}

/// Hang `alternate` off the innermost `: undefined` of a conditional chain
fn append_alternate<'a>(conditional: &mut ConditionalExpression<'a>, alternate: JsNode<'a>) {
    match &mut conditional.alternate {
        JsNode::Conditional(next) => append_alternate(next, alternate),
        tail => *tail = alternate,
    }
}

fn slot_function<'a>(
    allocator: &'a Bump,
    params: Option<ExpressionNode<'a>>,
    returns: JsNode<'a>,
    loc: SourceLocation,
) -> JsNode<'a> {
    let mut function = FunctionExpression::new(allocator);
    function.params.extend(params);
    function.returns = Some(returns);
    function.is_slot = true;
    function.loc = loc;
    JsNode::Function(Box::new_in(function, allocator))
}

/// `{ name, fn, key? }` entry of `createSlots`
fn dynamic_slot<'a>(allocator: &'a Bump, name: ExpressionNode<'a>, function: JsNode<'a>, key: Option<u32>) -> JsNode<'a> {
    let mut properties = Vec::new_in(allocator);
    properties.push(Property::named(allocator, "name", JsNode::from_expression(name)));
    properties.push(Property::named(allocator, "fn", function));
    if let Some(key) = key {
        properties.push(Property::named(allocator, "key", JsNode::string(allocator, key.to_string())));
    }
    JsNode::object(allocator, properties)
}

fn conditional<'a>(allocator: &'a Bump, test: Option<ExpressionNode<'a>>, consequent: JsNode<'a>) -> JsNode<'a> {
    let test = test.unwrap_or_else(|| simple_exp(allocator, "true"));
    JsNode::Conditional(Box::new_in(
        ConditionalExpression {
            test: JsNode::from_expression(test),
            consequent,
            alternate: JsNode::simple(allocator, "undefined", gesso_canvas::ConstantType::CanStringify),
            newline: true,
        },
        allocator,
    ))
}

fn render_list_slots<'a>(ctx: &mut TransformContext<'a>, result: &ForParseResult<'a>, entry: JsNode<'a>) -> JsNode<'a> {
    let allocator = ctx.allocator;
    let aliases = [&result.value, &result.key, &result.index];
    let len = aliases.iter().rposition(|a| a.is_some()).map_or(0, |i| i + 1);

    let mut function = FunctionExpression::new(allocator);
    for (i, alias) in aliases.iter().take(len).enumerate() {
        function.params.push(match alias {
            Some(alias) => alias.clone_in(allocator),
            None => simple_exp(allocator, "_".repeat(i + 1)),
        });
    }
    function.returns = Some(entry);
    function.newline = true;

    let helper = ctx.helper(RuntimeHelper::RenderList);
    let mut arguments = Vec::new_in(allocator);
    arguments.push(JsNode::from_expression(result.source.clone_in(allocator)));
    arguments.push(JsNode::Function(Box::new_in(function, allocator)));
    JsNode::helper_call(allocator, helper, arguments)
}

fn has_forwarded_slots(children: &[TemplateChildNode<'_>]) -> bool {
    children.iter().any(|child| match child {
        TemplateChildNode::Element(el) => el.tag_type == ElementType::Slot || has_forwarded_slots(&el.children),
        TemplateChildNode::If(node) => node.branches.iter().any(|b| has_forwarded_slots(&b.children)),
        TemplateChildNode::For(node) => has_forwarded_slots(&node.children),
        _ => false,
    })
}

fn has_scope_ref_in_element(el: &ElementNode<'_>, ctx: &TransformContext<'_>) -> bool {
    if ctx.identifiers.is_empty() {
        return false;
    }
    element_refs_scope(el, ctx)
}

fn element_refs_scope(el: &ElementNode<'_>, ctx: &TransformContext<'_>) -> bool {
    let in_props = el.props.iter().filter_map(|p| p.as_directive()).any(|dir| {
        dir.arg.as_ref().is_some_and(|a| expression_refs_scope(a, ctx))
            || dir.exp.as_ref().is_some_and(|e| expression_refs_scope(e, ctx))
    });
    in_props || el.children.iter().any(|c| node_refs_scope(c, ctx))
}

/// Whether `node` mentions an identifier currently in scope
pub fn node_refs_scope(node: &TemplateChildNode<'_>, ctx: &TransformContext<'_>) -> bool {
    match node {
        TemplateChildNode::Element(el) => element_refs_scope(el, ctx),
        TemplateChildNode::For(node) => {
            expression_refs_scope(&node.source, ctx) || node.children.iter().any(|c| node_refs_scope(c, ctx))
        }
        TemplateChildNode::If(node) => node.branches.iter().any(|branch| {
            branch.condition.as_ref().is_some_and(|c| expression_refs_scope(c, ctx))
                || branch.children.iter().any(|c| node_refs_scope(c, ctx))
        }),
        TemplateChildNode::Interpolation(interp) => expression_refs_scope(&interp.content, ctx),
        TemplateChildNode::CompoundExpression(compound) => compound.children.iter().any(|p| part_refs_scope(p, ctx)),
        TemplateChildNode::TextCall(text) => match &text.codegen {
            JsNode::Call(call) => call.arguments.iter().any(|arg| match arg {
                JsNode::Interpolation(interp) => expression_refs_scope(&interp.content, ctx),
                JsNode::Compound(compound) => compound.children.iter().any(|p| part_refs_scope(p, ctx)),
                _ => false,
            }),
            _ => false,
        },
        TemplateChildNode::Text(_) | TemplateChildNode::Comment(_) => false,
    }
}

pub fn expression_refs_scope(exp: &ExpressionNode<'_>, ctx: &TransformContext<'_>) -> bool {
    match exp {
        ExpressionNode::Simple(s) => !s.is_static && is_simple_identifier(&s.content) && ctx.is_in_scope(&s.content),
        ExpressionNode::Compound(c) => c.children.iter().any(|p| part_refs_scope(p, ctx)),
    }
}

fn part_refs_scope(part: &CompoundPart<'_>, ctx: &TransformContext<'_>) -> bool {
    match part {
        CompoundPart::Simple(s) => !s.is_static && is_simple_identifier(&s.content) && ctx.is_in_scope(&s.content),
        CompoundPart::Interpolation(interp) => expression_refs_scope(&interp.content, ctx),
        CompoundPart::Compound(inner) => inner.children.iter().any(|p| part_refs_scope(p, ctx)),
        CompoundPart::Raw(_) | CompoundPart::Helper(_) | CompoundPart::Text(_) => false,
    }
}
