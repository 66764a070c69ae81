//! Server render statements.
//!
//! Runs after the shared transform and turns the template into the body of
//! `ssrRender(_ctx, _push, _parent, _attrs)`. Static markup and `${}` holes
//! collect into one template literal, flushed as a `_push(...)` call
//! whenever a statement (a condition, a loop, a component) comes between.
//!
//! ```text
//! <div v-if="ok">{{ msg }}</div>
//!
//! if (_ctx.ok) {
//!   _push(`<div>${_ssrInterpolate(_ctx.msg)}</div>`)
//! } else {
//!   _push(`<!---->`)
//! }
//! ```

use gesso_canvas::{
    BlockStatement, Callee, ConstantType, ElementType, ErrorCode, ForNode, FunctionExpression, IfAlternate, IfNode,
    IfStatement, JsNode, RootNode, RuntimeHelper, TemplateChildNode, TemplateLiteral, TemplatePart, TransformOptions,
};
use gesso_palette::{Box, Bump, FxHashSet, String, Vec};
use gesso_studio::transforms::utils::simple_exp;
use gesso_studio::{Diagnostics, TransformContext, TransformPlugins};

use crate::options::SsrCompilerOptions;

/// Statement builder for one server render function
pub struct SsrCodegen<'a, 'o> {
    pub(crate) ctx: TransformContext<'a>,
    pub(crate) options: &'o SsrCompilerOptions,
    /// Start offsets of the root elements that receive `_attrs`
    fallthrough: FxHashSet<u32>,
    statements: Vec<'a, JsNode<'a>>,
    parts: Vec<'a, TemplatePart<'a>>,
}

/// Build the server render body of a transformed `root` and record the
/// helpers and assets it needs.
pub fn ssr_codegen_transform<'a>(
    allocator: &'a Bump,
    root: &mut RootNode<'a>,
    transform_options: TransformOptions,
    plugins: &TransformPlugins<'a>,
    options: &SsrCompilerOptions,
) -> Diagnostics {
    let mut ssr = SsrCodegen::new(allocator, transform_options, plugins, options);
    ssr.fallthrough = fallthrough_targets(&root.children);

    // several root nodes render as one fragment
    let is_fragment = root.children.len() > 1
        && root
            .children
            .iter()
            .any(|c| !matches!(c, TemplateChildNode::Text(_) | TemplateChildNode::Interpolation(_)));
    let body = ssr.block(|ssr| ssr.process_children(&mut root.children, is_fragment));
    tracing::debug!(statements = body.body.len(), fragment = is_fragment, "ssr body");
    root.codegen = Some(JsNode::Block(Box::new_in(body, allocator)));
    ssr.finish(root)
}

impl<'a, 'o> SsrCodegen<'a, 'o> {
    pub fn new(
        allocator: &'a Bump,
        transform_options: TransformOptions,
        plugins: &TransformPlugins<'a>,
        options: &'o SsrCompilerOptions,
    ) -> Self {
        Self {
            ctx: TransformContext::new(allocator, transform_options, plugins),
            options,
            fallthrough: FxHashSet::default(),
            statements: Vec::new_in(allocator),
            parts: Vec::new_in(allocator),
        }
    }

    #[inline]
    pub(crate) fn allocator(&self) -> &'a Bump {
        self.ctx.allocator
    }

    /// Append markup to the pending template literal
    pub(crate) fn push_str(&mut self, text: &str) {
        if let Some(TemplatePart::Str(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(TemplatePart::Str(String::from(text)));
        }
    }

    /// Append a `${}` hole to the pending template literal
    pub(crate) fn push_expr(&mut self, node: JsNode<'a>) {
        self.parts.push(TemplatePart::Expr(node));
    }

    /// Emit a statement after whatever markup is pending
    pub(crate) fn push_statement(&mut self, statement: JsNode<'a>) {
        self.flush();
        self.statements.push(statement);
    }

    /// `_push(node)` as a statement
    pub(crate) fn push_rendered(&mut self, node: JsNode<'a>) {
        let statement = push_call(self.allocator(), node);
        self.push_statement(statement);
    }

    /// Helper call, registering the helper
    pub(crate) fn call(&mut self, helper: RuntimeHelper, arguments: impl IntoIterator<Item = JsNode<'a>>) -> JsNode<'a> {
        let allocator = self.allocator();
        let mut args = Vec::new_in(allocator);
        args.extend(arguments);
        let helper = self.ctx.helper(helper);
        JsNode::helper_call(allocator, helper, args)
    }

    /// Plain identifier or literal code
    pub(crate) fn code(&self, code: &str) -> JsNode<'a> {
        JsNode::simple(self.allocator(), code, ConstantType::NotConstant)
    }

    fn flush(&mut self) {
        if self.parts.is_empty() {
            return;
        }
        let allocator = self.allocator();
        let elements = std::mem::replace(&mut self.parts, Vec::new_in(allocator));
        let literal = JsNode::TemplateLiteral(Box::new_in(TemplateLiteral { elements }, allocator));
        self.statements.push(push_call(allocator, literal));
    }

    /// Run `build` against an empty statement list and hand back what it
    /// emitted. Pending markup of the enclosing block is left untouched.
    pub(crate) fn block(&mut self, build: impl FnOnce(&mut Self)) -> BlockStatement<'a> {
        let allocator = self.allocator();
        let outer_statements = std::mem::replace(&mut self.statements, Vec::new_in(allocator));
        let outer_parts = std::mem::replace(&mut self.parts, Vec::new_in(allocator));
        build(self);
        self.flush();
        let body = std::mem::replace(&mut self.statements, outer_statements);
        self.parts = outer_parts;
        BlockStatement { body }
    }

    pub(crate) fn takes_fallthrough(&self, offset: u32) -> bool {
        self.fallthrough.contains(&offset)
    }

    pub(crate) fn process_children(&mut self, children: &mut [TemplateChildNode<'a>], as_fragment: bool) {
        if as_fragment {
            self.push_str("<!--[-->");
        }
        for child in children.iter_mut() {
            self.process_child(child);
        }
        if as_fragment {
            self.push_str("<!--]-->");
        }
    }

    pub(crate) fn process_child(&mut self, child: &mut TemplateChildNode<'a>) {
        let allocator = self.allocator();
        match child {
            TemplateChildNode::Element(el) => match el.tag_type {
                ElementType::Element => self.process_element(el),
                ElementType::Component => self.process_component(el),
                ElementType::Slot => self.process_slot(el),
                ElementType::Template => self.process_children(&mut el.children, false),
            },
            TemplateChildNode::Text(text) => {
                self.push_str(&htmlize::escape_all_quotes(text.content.as_str()));
            }
            TemplateChildNode::Comment(comment) => {
                self.push_str("<!--");
                self.push_str(&comment.content);
                self.push_str("-->");
            }
            TemplateChildNode::Interpolation(interpolation) => {
                let exp = JsNode::from_expression(interpolation.content.clone_in(allocator));
                let call = self.call(RuntimeHelper::SsrInterpolate, [exp]);
                self.push_expr(call);
            }
            TemplateChildNode::If(node) => self.process_if(node),
            TemplateChildNode::For(node) => self.process_for(node),
            other => {
                let loc = other.loc().clone();
                self.ctx.on_error(ErrorCode::XSsrInvalidAstNode, Some(&loc));
            }
        }
    }

    /// `if (a) {..} else if (b) {..} else {..}`. A chain without `v-else`
    /// renders an empty comment as its placeholder.
    fn process_if(&mut self, node: &mut IfNode<'a>) {
        let allocator = self.allocator();
        let mut branches: std::vec::Vec<(Option<JsNode<'a>>, BlockStatement<'a>)> = std::vec::Vec::new();
        for branch in node.branches.iter_mut() {
            let test = branch
                .condition
                .as_ref()
                .map(|condition| JsNode::from_expression(condition.clone_in(allocator)));
            let as_fragment = needs_fragment_wrapper(&branch.children);
            let block = self.block(|ssr| ssr.process_children(&mut branch.children, as_fragment));
            branches.push((test, block));
        }
        if branches.iter().all(|(test, _)| test.is_some()) {
            let placeholder = self.block(|ssr| ssr.push_str("<!---->"));
            branches.push((None, placeholder));
        }

        let mut alternate: Option<IfAlternate<'a>> = None;
        for (test, block) in branches.into_iter().rev() {
            alternate = Some(match test {
                Some(test) => IfAlternate::If(Box::new_in(
                    IfStatement {
                        test,
                        consequent: block,
                        alternate: alternate.take(),
                    },
                    allocator,
                )),
                None => IfAlternate::Block(Box::new_in(block, allocator)),
            });
        }
        if let Some(IfAlternate::If(statement)) = alternate {
            self.push_statement(JsNode::If(statement));
        }
    }

    /// `<!--[-->` + `_ssrRenderList(source, (item, key, index) => {..})` + `<!--]-->`
    fn process_for(&mut self, node: &mut ForNode<'a>) {
        let allocator = self.allocator();
        let mut function = FunctionExpression::new(allocator);
        let aliases = [&node.value_alias, &node.key_alias, &node.object_index_alias];
        let len = aliases.iter().rposition(|a| a.is_some()).map_or(0, |i| i + 1);
        for (i, alias) in aliases.iter().take(len).enumerate() {
            function.params.push(match alias {
                Some(alias) => alias.clone_in(allocator),
                None => simple_exp(allocator, "_".repeat(i + 1)),
            });
        }
        let as_fragment = needs_fragment_wrapper(&node.children);
        self.ctx.scopes.v_for += 1;
        function.body = Some(self.block(|ssr| ssr.process_children(&mut node.children, as_fragment)));
        self.ctx.scopes.v_for -= 1;

        let source = JsNode::from_expression(node.source.clone_in(allocator));
        let list = JsNode::Function(Box::new_in(function, allocator));
        let call = self.call(RuntimeHelper::SsrRenderList, [source, list]);
        self.push_str("<!--[-->");
        self.push_statement(call);
        self.push_str("<!--]-->");
    }

    /// Move the collected helpers and assets onto the root
    fn finish(self, root: &mut RootNode<'a>) -> Diagnostics {
        let ctx = self.ctx;
        let mut helpers = ctx.helpers.sorted();
        helpers.extend(root.helpers.iter().copied());
        helpers.sort_unstable();
        helpers.dedup();
        root.helpers.clear();
        root.helpers.extend(helpers);

        for component in ctx.components {
            if !root.components.contains(&component) {
                root.components.push(component);
            }
        }
        for directive in ctx.directives {
            if !root.directives.contains(&directive) {
                root.directives.push(directive);
            }
        }
        tracing::debug!(
            helpers = root.helpers.len(),
            components = root.components.len(),
            errors = ctx.errors.len(),
            "ssr codegen finished"
        );
        Diagnostics {
            errors: ctx.errors,
            warnings: ctx.warnings,
        }
    }
}

fn push_call<'a>(allocator: &'a Bump, node: JsNode<'a>) -> JsNode<'a> {
    let mut arguments = Vec::new_in(allocator);
    arguments.push(node);
    JsNode::call(allocator, Callee::Name(String::const_new("_push")), arguments)
}

/// Anything but a lone element renders between fragment markers
pub(crate) fn needs_fragment_wrapper(children: &[TemplateChildNode<'_>]) -> bool {
    !matches!(children, [TemplateChildNode::Element(_)])
}

/// The elements that get the parent's fallthrough attributes: a lone root
/// element or component, or the lone element of each root branch.
fn fallthrough_targets(children: &[TemplateChildNode<'_>]) -> FxHashSet<u32> {
    let mut targets = FxHashSet::default();
    let mut rendered = children.iter().filter(|c| !matches!(c, TemplateChildNode::Comment(_)));
    let (Some(only), None) = (rendered.next(), rendered.next()) else {
        return targets;
    };
    match only {
        TemplateChildNode::Element(el) if matches!(el.tag_type, ElementType::Element | ElementType::Component) => {
            targets.insert(el.loc.start.offset);
        }
        TemplateChildNode::If(node) => {
            for branch in node.branches.iter() {
                if let [TemplateChildNode::Element(el)] = &branch.children[..] {
                    if matches!(el.tag_type, ElementType::Element | ElementType::Component) {
                        targets.insert(el.loc.start.offset);
                    }
                }
            }
        }
        _ => {}
    }
    targets
}
