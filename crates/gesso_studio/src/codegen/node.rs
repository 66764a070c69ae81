//! Emission of codegen and template nodes.
//!
//! Child references (`JsNode::Child`, `JsNode::Children`, `JsNode::Branch`)
//! are resolved against an [`Owner`]: the template node whose codegen is
//! being generated. Crossing into a template child switches the owner to
//! that child.

use gesso_canvas::{
    ArrayExpression, BlockStatement, CacheExpression, CallExpression, Callee, ChildRange, CompoundExpressionNode,
    CompoundPart, ConditionalExpression, ExpressionNode, FunctionExpression, IfAlternate, IfBranchNode, IfStatement,
    InterpolationNode, JsNode, NodeType, ObjectExpression, RuntimeHelper, SimpleExpressionNode, TemplateChildNode,
    TemplateLiteral, TemplatePart, TextNode, VNodeCall, VNodeTag,
};
use gesso_palette::is_simple_identifier;

use super::context::{js_string, CodegenContext};
use crate::runtime_helpers::{get_vnode_block_helper, get_vnode_helper};

/// What child references point into
#[derive(Clone, Copy)]
pub enum Owner<'r, 'a> {
    None,
    Children(&'r [TemplateChildNode<'a>]),
    Branches(&'r [IfBranchNode<'a>]),
}

impl<'r, 'a> Owner<'r, 'a> {
    fn child(self, index: usize) -> Option<&'r TemplateChildNode<'a>> {
        match self {
            Self::Children(children) => children.get(index),
            _ => None,
        }
    }
}

pub fn gen_node<'a>(ctx: &mut CodegenContext<'_>, node: &JsNode<'a>, owner: Owner<'_, 'a>) {
    match node {
        JsNode::VNodeCall(call) => gen_vnode_call(ctx, call, owner),
        JsNode::Call(call) => gen_call(ctx, call, owner),
        JsNode::Object(object) => gen_object(ctx, object, owner),
        JsNode::Array(array) => gen_array(ctx, array, owner),
        JsNode::Function(function) => gen_function(ctx, function, owner),
        JsNode::Conditional(conditional) => gen_conditional(ctx, conditional, owner),
        JsNode::Cache(cache) => gen_cache(ctx, cache, owner),
        JsNode::Simple(simple) => gen_simple(ctx, simple),
        JsNode::Compound(compound) => gen_compound(ctx, compound),
        JsNode::Text(text) => gen_text(ctx, text),
        JsNode::Interpolation(interpolation) => gen_interpolation(ctx, interpolation),
        JsNode::Hoisted(reference) => {
            let name = format!("_hoisted_{}", reference.index + 1);
            if reference.spread {
                ctx.push("[...");
                ctx.push(&name);
                ctx.push("]");
            } else {
                ctx.push(&name);
            }
        }
        JsNode::Child(index) => match owner.child(*index) {
            Some(child) => gen_template_child(ctx, child),
            None => unresolved(ctx, "child"),
        },
        JsNode::Children(range) => gen_children(ctx, range, owner),
        JsNode::Branch(index) => match owner {
            Owner::Branches(branches) => match branches.get(*index) {
                Some(IfBranchNode {
                    codegen: Some(codegen),
                    children,
                    ..
                }) => gen_node(ctx, codegen, Owner::Children(children)),
                _ => unresolved(ctx, "branch"),
            },
            _ => unresolved(ctx, "branch"),
        },
        JsNode::Block(block) => gen_block(ctx, block, owner),
        JsNode::If(statement) => gen_if_statement(ctx, statement, owner),
        JsNode::Assignment(assignment) => {
            ctx.push(&assignment.left);
            ctx.push(" = ");
            gen_node(ctx, &assignment.right, owner);
        }
        JsNode::Sequence(sequence) => {
            ctx.push("(");
            gen_node_list(ctx, &sequence.expressions, owner, false, true);
            ctx.push(")");
        }
        JsNode::Return(statement) => {
            ctx.push("return ");
            gen_node(ctx, &statement.returns, owner);
        }
        JsNode::TemplateLiteral(literal) => gen_template_literal(ctx, literal, owner),
    }
}

fn unresolved(ctx: &mut CodegenContext<'_>, what: &str) {
    debug_assert!(false, "unresolved {what} reference in codegen");
    tracing::error!(what, "unresolved codegen reference");
    ctx.push("null");
}

pub fn gen_template_child<'a>(ctx: &mut CodegenContext<'_>, node: &TemplateChildNode<'a>) {
    match node {
        TemplateChildNode::Element(el) => match &el.codegen {
            Some(codegen) => gen_node(ctx, codegen, Owner::Children(&el.children)),
            None => unresolved(ctx, "element"),
        },
        TemplateChildNode::If(node) => match &node.codegen {
            Some(codegen) => gen_node(ctx, codegen, Owner::Branches(&node.branches)),
            None => unresolved(ctx, "conditional"),
        },
        TemplateChildNode::For(node) => match &node.codegen {
            Some(codegen) => gen_node(ctx, codegen, Owner::Children(&node.children)),
            None => unresolved(ctx, "loop"),
        },
        TemplateChildNode::TextCall(node) => gen_node(ctx, &node.codegen, Owner::None),
        TemplateChildNode::Text(text) => gen_text(ctx, text),
        TemplateChildNode::Interpolation(interpolation) => gen_interpolation(ctx, interpolation),
        TemplateChildNode::CompoundExpression(compound) => gen_compound(ctx, compound),
        TemplateChildNode::Comment(comment) => {
            ctx.push_pure();
            let helper = ctx.helper(RuntimeHelper::CreateComment);
            let code = format!("{helper}({})", js_string(&comment.content));
            ctx.push_mapped(&code, &comment.loc, false);
        }
    }
}

fn gen_children<'a>(ctx: &mut CodegenContext<'_>, range: &ChildRange, owner: Owner<'_, 'a>) {
    let children: std::vec::Vec<&TemplateChildNode<'a>> = match range {
        ChildRange::All => match owner {
            Owner::Children(children) => children.iter().collect(),
            _ => std::vec::Vec::new(),
        },
        ChildRange::Only(indices) => indices.iter().filter_map(|&i| owner.child(i)).collect(),
        ChildRange::Of(index) => match owner.child(*index) {
            Some(TemplateChildNode::Element(el)) => el.children.iter().collect(),
            _ => std::vec::Vec::new(),
        },
    };
    let multilines = children.len() > 3 || children.iter().any(|child| !child.is_text_like());
    ctx.push("[");
    if multilines {
        ctx.indent();
    }
    for (i, child) in children.iter().enumerate() {
        gen_template_child(ctx, child);
        if i + 1 < children.len() {
            if multilines {
                ctx.push(",");
                ctx.newline();
            } else {
                ctx.push(", ");
            }
        }
    }
    if multilines {
        ctx.deindent(true);
    }
    ctx.push("]");
}

pub fn gen_node_list<'a>(
    ctx: &mut CodegenContext<'_>,
    nodes: &[JsNode<'a>],
    owner: Owner<'_, 'a>,
    multilines: bool,
    comma: bool,
) {
    for (i, node) in nodes.iter().enumerate() {
        gen_node(ctx, node, owner);
        if i + 1 < nodes.len() {
            if multilines {
                if comma {
                    ctx.push(",");
                }
                ctx.newline();
            } else if comma {
                ctx.push(", ");
            }
        }
    }
}

fn is_text_node(node: &JsNode<'_>) -> bool {
    matches!(
        node.node_type(),
        NodeType::SimpleExpression | NodeType::Text | NodeType::Interpolation | NodeType::CompoundExpression
    )
}

fn gen_node_list_as_array<'a>(ctx: &mut CodegenContext<'_>, nodes: &[JsNode<'a>], owner: Owner<'_, 'a>) {
    let multilines = nodes.len() > 3 || nodes.iter().any(|node| !is_text_node(node));
    ctx.push("[");
    if multilines {
        ctx.indent();
    }
    gen_node_list(ctx, nodes, owner, multilines, true);
    if multilines {
        ctx.deindent(true);
    }
    ctx.push("]");
}

fn gen_text(ctx: &mut CodegenContext<'_>, text: &TextNode) {
    ctx.push_mapped(&js_string(&text.content), &text.loc, false);
}

pub fn gen_simple(ctx: &mut CodegenContext<'_>, simple: &SimpleExpressionNode) {
    if simple.is_static {
        ctx.push_mapped(&js_string(&simple.content), &simple.loc, false);
    } else {
        ctx.push_mapped(&simple.content, &simple.loc, true);
    }
}

pub fn gen_expression(ctx: &mut CodegenContext<'_>, exp: &ExpressionNode<'_>) {
    match exp {
        ExpressionNode::Simple(simple) => gen_simple(ctx, simple),
        ExpressionNode::Compound(compound) => gen_compound(ctx, compound),
    }
}

fn gen_compound(ctx: &mut CodegenContext<'_>, compound: &CompoundExpressionNode<'_>) {
    for part in compound.children.iter() {
        match part {
            CompoundPart::Raw(code) => ctx.push(code),
            CompoundPart::Helper(helper) => ctx.push_helper(*helper),
            CompoundPart::Simple(simple) => gen_simple(ctx, simple),
            CompoundPart::Text(text) => gen_text(ctx, text),
            CompoundPart::Interpolation(interpolation) => gen_interpolation(ctx, interpolation),
            CompoundPart::Compound(inner) => gen_compound(ctx, inner),
        }
    }
}

fn gen_interpolation(ctx: &mut CodegenContext<'_>, interpolation: &InterpolationNode<'_>) {
    ctx.push_pure();
    ctx.push_helper(RuntimeHelper::ToDisplayString);
    ctx.push("(");
    gen_expression(ctx, &interpolation.content);
    ctx.push(")");
}

fn gen_vnode_call<'a>(ctx: &mut CodegenContext<'_>, call: &VNodeCall<'a>, owner: Owner<'_, 'a>) {
    if call.directives.is_some() {
        ctx.push_helper(RuntimeHelper::WithDirectives);
        ctx.push("(");
    }
    if call.is_block {
        ctx.push("(");
        ctx.push_helper(RuntimeHelper::OpenBlock);
        ctx.push(if call.disable_tracking { "(true), " } else { "(), " });
    }
    ctx.push_pure();
    let helper = if call.is_block {
        get_vnode_block_helper(ctx.options.ssr, call.is_component)
    } else {
        get_vnode_helper(ctx.options.ssr, call.is_component)
    };
    let callee = format!("{}(", ctx.helper(helper));
    ctx.push_mapped(&callee, &call.loc, false);

    // trailing absent arguments are dropped, inner ones become `null`
    let present = [
        true,
        call.props.is_some(),
        call.children.is_some(),
        call.patch_flag.is_some(),
        call.dynamic_props.is_some(),
    ];
    let last = present.iter().rposition(|&p| p).unwrap_or(0);
    for i in 0..=last {
        if i > 0 {
            ctx.push(", ");
        }
        match i {
            0 => match &call.tag {
                VNodeTag::Literal(tag) => ctx.push(&js_string(tag)),
                VNodeTag::Identifier(name) => ctx.push(name),
                VNodeTag::Helper(helper) => ctx.push_helper(*helper),
                VNodeTag::Expr(node) => gen_node(ctx, node, owner),
            },
            1 => gen_optional(ctx, call.props.as_ref(), owner),
            2 => gen_optional(ctx, call.children.as_ref(), owner),
            3 => match call.patch_flag {
                Some(flag) => ctx.push(&flag.to_code()),
                None => ctx.push("null"),
            },
            _ => gen_optional(ctx, call.dynamic_props.as_ref(), owner),
        }
    }
    ctx.push(")");
    if call.is_block {
        ctx.push(")");
    }
    if let Some(directives) = &call.directives {
        ctx.push(", ");
        gen_node(ctx, directives, owner);
        ctx.push(")");
    }
}

fn gen_optional<'a>(ctx: &mut CodegenContext<'_>, node: Option<&JsNode<'a>>, owner: Owner<'_, 'a>) {
    match node {
        Some(node) => gen_node(ctx, node, owner),
        None => ctx.push("null"),
    }
}

fn gen_call<'a>(ctx: &mut CodegenContext<'_>, call: &CallExpression<'a>, owner: Owner<'_, 'a>) {
    ctx.push_pure();
    let mut callee = match &call.callee {
        Callee::Helper(helper) => ctx.helper(*helper).to_string(),
        Callee::Name(name) => name.to_string(),
    };
    callee.push('(');
    ctx.push_mapped(&callee, &call.loc, false);
    gen_node_list(ctx, &call.arguments, owner, false, true);
    ctx.push(")");
}

fn gen_object<'a>(ctx: &mut CodegenContext<'_>, object: &ObjectExpression<'a>, owner: Owner<'_, 'a>) {
    if object.properties.is_empty() {
        ctx.push_mapped("{}", &object.loc, false);
        return;
    }
    let multilines = object.properties.len() > 1
        || object
            .properties
            .iter()
            .any(|p| p.value.node_type() != NodeType::SimpleExpression);
    ctx.push(if multilines { "{" } else { "{ " });
    if multilines {
        ctx.indent();
    }
    for (i, property) in object.properties.iter().enumerate() {
        gen_property_key(ctx, &property.key);
        ctx.push(": ");
        gen_node(ctx, &property.value, owner);
        if i + 1 < object.properties.len() {
            ctx.push(",");
            ctx.newline();
        }
    }
    if multilines {
        ctx.deindent(true);
    }
    ctx.push(if multilines { "}" } else { " }" });
}

fn gen_property_key(ctx: &mut CodegenContext<'_>, key: &ExpressionNode<'_>) {
    match key {
        ExpressionNode::Compound(compound) => {
            ctx.push("[");
            gen_compound(ctx, compound);
            ctx.push("]");
        }
        ExpressionNode::Simple(simple) if simple.is_static => {
            if is_simple_identifier(&simple.content) {
                ctx.push_mapped(&simple.content, &simple.loc, false);
            } else {
                ctx.push_mapped(&js_string(&simple.content), &simple.loc, false);
            }
        }
        ExpressionNode::Simple(simple) => {
            let code = format!("[{}]", simple.content);
            ctx.push_mapped(&code, &simple.loc, false);
        }
    }
}

fn gen_array<'a>(ctx: &mut CodegenContext<'_>, array: &ArrayExpression<'a>, owner: Owner<'_, 'a>) {
    gen_node_list_as_array(ctx, &array.elements, owner);
}

fn gen_function<'a>(ctx: &mut CodegenContext<'_>, function: &FunctionExpression<'a>, owner: Owner<'_, 'a>) {
    if function.is_slot {
        ctx.push_helper(RuntimeHelper::WithCtx);
        ctx.push("(");
    }
    ctx.push_mapped("(", &function.loc, false);
    for (i, param) in function.params.iter().enumerate() {
        if i > 0 {
            ctx.push(", ");
        }
        gen_expression(ctx, param);
    }
    ctx.push(") => ");
    let braces = function.newline || function.body.is_some();
    if braces {
        ctx.push("{");
        ctx.indent();
    }
    if let Some(returns) = &function.returns {
        if function.newline {
            ctx.push("return ");
        }
        gen_node(ctx, returns, owner);
    } else if let Some(body) = &function.body {
        gen_block(ctx, body, owner);
    }
    if braces {
        ctx.deindent(true);
        ctx.push("}");
    }
    if function.is_slot {
        ctx.push(")");
    }
}

fn gen_conditional<'a>(ctx: &mut CodegenContext<'_>, conditional: &ConditionalExpression<'a>, owner: Owner<'_, 'a>) {
    match &conditional.test {
        JsNode::Simple(test) => {
            let parens = !is_simple_identifier(&test.content);
            if parens {
                ctx.push("(");
            }
            gen_simple(ctx, test);
            if parens {
                ctx.push(")");
            }
        }
        test => {
            ctx.push("(");
            gen_node(ctx, test, owner);
            ctx.push(")");
        }
    }

    let newline = conditional.newline;
    if newline {
        ctx.indent();
    }
    ctx.shift(true);
    if !newline {
        ctx.push(" ");
    }
    ctx.push("? ");
    gen_node(ctx, &conditional.consequent, owner);
    ctx.shift(false);
    if newline {
        ctx.newline();
    } else {
        ctx.push(" ");
    }
    ctx.push(": ");
    // `a ? b : c ? d : e` chains stay at one level
    let nested = matches!(conditional.alternate, JsNode::Conditional(_));
    if !nested {
        ctx.shift(true);
    }
    gen_node(ctx, &conditional.alternate, owner);
    if !nested {
        ctx.shift(false);
    }
    if newline {
        ctx.deindent(false);
    }
}

fn gen_cache<'a>(ctx: &mut CodegenContext<'_>, cache: &CacheExpression<'a>, owner: Owner<'_, 'a>) {
    let slot = format!("_cache[{}]", cache.index);
    ctx.push(&slot);
    ctx.push(" || (");
    if cache.is_vnode {
        ctx.indent();
        ctx.push_helper(RuntimeHelper::SetBlockTracking);
        ctx.push("(-1),");
        ctx.newline();
    }
    ctx.push(&slot);
    ctx.push(" = ");
    gen_node(ctx, &cache.value, owner);
    if cache.is_vnode {
        ctx.push(",");
        ctx.newline();
        ctx.push_helper(RuntimeHelper::SetBlockTracking);
        ctx.push("(1),");
        ctx.newline();
        ctx.push(&slot);
        ctx.deindent(true);
    }
    ctx.push(")");
}

pub fn gen_block<'a>(ctx: &mut CodegenContext<'_>, block: &BlockStatement<'a>, owner: Owner<'_, 'a>) {
    gen_node_list(ctx, &block.body, owner, true, false);
}

fn gen_if_statement<'a>(ctx: &mut CodegenContext<'_>, statement: &IfStatement<'a>, owner: Owner<'_, 'a>) {
    ctx.push("if (");
    gen_node(ctx, &statement.test, owner);
    ctx.push(") {");
    ctx.indent();
    gen_block(ctx, &statement.consequent, owner);
    ctx.deindent(true);
    ctx.push("}");
    match &statement.alternate {
        None => {}
        Some(IfAlternate::If(alternate)) => {
            ctx.push(" else ");
            gen_if_statement(ctx, alternate, owner);
        }
        Some(IfAlternate::Block(block)) => {
            ctx.push(" else {");
            ctx.indent();
            gen_block(ctx, block, owner);
            ctx.deindent(true);
            ctx.push("}");
        }
    }
}

fn gen_template_literal<'a>(ctx: &mut CodegenContext<'_>, literal: &TemplateLiteral<'a>, owner: Owner<'_, 'a>) {
    let multilines = literal.elements.len() > 3;
    ctx.push("`");
    for element in literal.elements.iter() {
        match element {
            TemplatePart::Str(text) => ctx.push(&escape_template(text)),
            TemplatePart::Expr(node) => {
                ctx.push("${");
                if multilines {
                    ctx.indent();
                }
                gen_node(ctx, node, owner);
                if multilines {
                    ctx.deindent(true);
                }
                ctx.push("}");
            }
        }
    }
    ctx.push("`");
}

/// Escape the characters that end or interpolate a template literal
pub fn escape_template(text: &str) -> std::string::String {
    let mut out = std::string::String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '`' | '$' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesso_canvas::{CodegenOptions, ConstantType, Property, SourceLocation};
    use gesso_palette::{Box, Bump, PatchFlag, PatchFlags, Vec};

    fn emit(node: &JsNode<'_>) -> std::string::String {
        let options = CodegenOptions::default();
        let mut ctx = CodegenContext::new(&options, None);
        gen_node(&mut ctx, node, Owner::None);
        ctx.code().to_string()
    }

    #[test]
    fn test_vnode_call_arguments() {
        let allocator = Bump::new();
        let mut call = VNodeCall::new(VNodeTag::Literal("div".into()), SourceLocation::STUB);
        call.patch_flag = Some(PatchFlag::from(PatchFlags::TEXT));
        assert_eq!(
            emit(&JsNode::VNodeCall(Box::new_in(call, &allocator))),
            r#"_createElementVNode("div", null, null, 1 /* TEXT */)"#
        );

        let mut call = VNodeCall::new(VNodeTag::Identifier("_component_foo".into()), SourceLocation::STUB);
        call.is_block = true;
        call.is_component = true;
        assert_eq!(
            emit(&JsNode::VNodeCall(Box::new_in(call, &allocator))),
            "(_openBlock(), _createBlock(_component_foo))"
        );
    }

    #[test]
    fn test_object_layout() {
        let allocator = Bump::new();
        let mut properties = Vec::new_in(&allocator);
        properties.push(Property::named(&allocator, "id", JsNode::string(&allocator, "app")));
        let single = JsNode::object(&allocator, properties);
        assert_eq!(emit(&single), r#"{ id: "app" }"#);

        let mut properties = Vec::new_in(&allocator);
        properties.push(Property::named(&allocator, "id", JsNode::string(&allocator, "app")));
        properties.push(Property::named(
            &allocator,
            "data-x",
            JsNode::simple(&allocator, "x", ConstantType::NotConstant),
        ));
        let multi = JsNode::object(&allocator, properties);
        assert_eq!(emit(&multi), "{\n  id: \"app\",\n  \"data-x\": x\n}");
    }

    #[test]
    fn test_conditional_chain() {
        let allocator = Bump::new();
        let inner = JsNode::Conditional(Box::new_in(
            ConditionalExpression {
                test: JsNode::simple(&allocator, "b", ConstantType::NotConstant),
                consequent: JsNode::string(&allocator, "B"),
                alternate: JsNode::string(&allocator, "C"),
                newline: true,
            },
            &allocator,
        ));
        let outer = JsNode::Conditional(Box::new_in(
            ConditionalExpression {
                test: JsNode::simple(&allocator, "a > 1", ConstantType::NotConstant),
                consequent: JsNode::string(&allocator, "A"),
                alternate: inner,
                newline: true,
            },
            &allocator,
        ));
        assert_eq!(
            emit(&outer),
            "(a > 1)\n  ? \"A\"\n  : b\n    ? \"B\"\n    : \"C\""
        );
    }

    #[test]
    fn test_vnode_cache() {
        let allocator = Bump::new();
        let cache = JsNode::Cache(Box::new_in(
            CacheExpression {
                index: 0,
                value: JsNode::simple(&allocator, "v", ConstantType::NotConstant),
                is_vnode: true,
            },
            &allocator,
        ));
        assert_eq!(
            emit(&cache),
            "_cache[0] || (\n  _setBlockTracking(-1),\n  _cache[0] = v,\n  _setBlockTracking(1),\n  _cache[0]\n)"
        );
    }

    #[test]
    fn test_template_literal_escapes() {
        let allocator = Bump::new();
        let mut elements = Vec::new_in(&allocator);
        elements.push(TemplatePart::Str("<p>`$x`\\".into()));
        elements.push(TemplatePart::Expr(JsNode::simple(&allocator, "_ssrInterpolate(a)", ConstantType::NotConstant)));
        elements.push(TemplatePart::Str("</p>".into()));
        let literal = JsNode::TemplateLiteral(Box::new_in(TemplateLiteral { elements }, &allocator));
        assert_eq!(emit(&literal), "`<p>\\`\\$x\\`\\\\${_ssrInterpolate(a)}</p>`");
    }

    #[test]
    fn test_hoisted_spread() {
        let node = JsNode::Hoisted(gesso_canvas::HoistRef { index: 1, spread: true });
        assert_eq!(emit(&node), "[..._hoisted_2]");
    }
}
