//! Transform engine.
//!
//! Walks the template tree depth-first. Every node transform sees each node
//! on the way down (in registration order) and may hand back exit closures
//! that run on the way up, in reverse. Plugins rewrite the tree through a
//! [`Cursor`]; codegen descriptors are attached to nodes on exit.

mod context;
mod cursor;
mod traverse;

pub use context::{ParentKind, Scopes, TransformContext};
pub use cursor::Cursor;
pub use traverse::{traverse_children, traverse_node};

use gesso_canvas::{
    ChildRange, CompilerError, DirectiveNode, ElementNode, ElementType, JsNode, Property,
    RootNode, RuntimeHelper, SourceLocation, TemplateChildNode, TransformOptions, VNodeCall,
    VNodeTag,
};
use gesso_palette::{Box, Bump, FxHashMap, PatchFlags, Vec};

use crate::transforms::{
    hoist_static::hoist_static,
    transform_element::transform_element,
    transform_expression::transform_expression,
    transform_slot_outlet::transform_slot_outlet,
    transform_text::{merge_text_children, transform_text, TextContainer},
    utils::convert_to_block,
    v_bind::transform_bind,
    v_for::transform_for,
    v_if::transform_if,
    v_model::transform_model,
    v_on::transform_on,
    v_once::transform_once,
};

/// Closure run when traversal leaves a node
pub type ExitFn<'a> =
    std::boxed::Box<dyn FnOnce(&mut TransformContext<'a>, &mut TemplateChildNode<'a>) + 'a>;

/// What a node transform hands back on enter
pub enum Exit<'a> {
    None,
    One(ExitFn<'a>),
    Many(std::vec::Vec<ExitFn<'a>>),
}

impl<'a> Exit<'a> {
    pub fn one(f: impl FnOnce(&mut TransformContext<'a>, &mut TemplateChildNode<'a>) + 'a) -> Self {
        Self::One(std::boxed::Box::new(f))
    }
}

/// Node transform plugin
pub type NodeTransform<'a> = fn(&mut TransformContext<'a>, &mut Cursor<'_, 'a>) -> Exit<'a>;

/// Directive transform, consulted by the element builder
pub type DirectiveTransform<'a> =
    fn(&mut TransformContext<'a>, &DirectiveNode<'a>, &ElementNode<'a>) -> DirectiveTransformResult<'a>;

/// Runtime counterpart a directive needs besides its props
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedRuntime {
    /// Resolve a user directive by name
    Resolve,
    /// Built-in runtime directive (`vShow`, `vModelText`, ...)
    Helper(RuntimeHelper),
}

#[derive(Debug)]
pub struct DirectiveTransformResult<'a> {
    pub props: std::vec::Vec<Property<'a>>,
    pub need_runtime: Option<NeedRuntime>,
    /// The directive replaces the element's children (`v-html`, `v-text`)
    pub clears_children: bool,
}

impl<'a> DirectiveTransformResult<'a> {
    pub fn empty() -> Self {
        Self {
            props: std::vec::Vec::new(),
            need_runtime: None,
            clears_children: false,
        }
    }

    pub fn with_props(props: std::vec::Vec<Property<'a>>) -> Self {
        Self {
            props,
            need_runtime: None,
            clears_children: false,
        }
    }
}

/// Registered node and directive transforms
#[derive(Clone, Default)]
pub struct TransformPlugins<'a> {
    pub(crate) node_transforms: std::vec::Vec<(&'static str, NodeTransform<'a>)>,
    pub(crate) directive_transforms: FxHashMap<&'static str, DirectiveTransform<'a>>,
}

impl<'a> TransformPlugins<'a> {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Core plugins: `once, if, for, expression, slot-outlet, element, text`
    /// and the `bind`/`on`/`model` directive transforms.
    pub fn base() -> Self {
        let mut plugins = Self::empty();
        plugins
            .push_node_transform("once", transform_once)
            .push_node_transform("if", transform_if)
            .push_node_transform("for", transform_for)
            .push_node_transform("expression", transform_expression)
            .push_node_transform("slot-outlet", transform_slot_outlet)
            .push_node_transform("element", transform_element)
            .push_node_transform("text", transform_text)
            .set_directive_transform("bind", transform_bind)
            .set_directive_transform("on", transform_on)
            .set_directive_transform("model", transform_model);
        plugins
    }

    pub fn push_node_transform(&mut self, name: &'static str, transform: NodeTransform<'a>) -> &mut Self {
        self.node_transforms.push((name, transform));
        self
    }

    /// Register or override a directive transform
    pub fn set_directive_transform(
        &mut self,
        name: &'static str,
        transform: DirectiveTransform<'a>,
    ) -> &mut Self {
        self.directive_transforms.insert(name, transform);
        self
    }

    /// Plugin names in registration order
    pub fn node_transform_names(&self) -> std::vec::Vec<&'static str> {
        self.node_transforms.iter().map(|(name, _)| *name).collect()
    }

    pub fn has_directive_transform(&self, name: &str) -> bool {
        self.directive_transforms.contains_key(name)
    }
}

/// Diagnostics collected during a transform
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    pub errors: std::vec::Vec<CompilerError>,
    pub warnings: std::vec::Vec<CompilerError>,
}

/// Transform `root` in place: rewrite structural directives, attach codegen,
/// hoist constants and record helpers/assets on the root.
pub fn transform<'a>(
    allocator: &'a Bump,
    root: &mut RootNode<'a>,
    options: TransformOptions,
    plugins: &TransformPlugins<'a>,
) -> Diagnostics {
    let mut ctx = TransformContext::new(allocator, options, plugins);

    traverse_children(&mut ctx, &mut root.children, ParentKind::Root);
    if !ctx.ssr() {
        merge_text_children(&mut ctx, &mut root.children, TextContainer::Root);
    }

    if ctx.options.hoist_static {
        hoist_static(&mut ctx, root);
    }
    if !ctx.ssr() {
        create_root_codegen(&mut ctx, root);
    }

    finish(ctx, root)
}

/// Root codegen: a lone element becomes a block, several children a
/// `Fragment` block.
pub fn create_root_codegen<'a>(ctx: &mut TransformContext<'a>, root: &mut RootNode<'a>) {
    match root.children.len() {
        0 => {}
        1 => {
            if let TemplateChildNode::Element(el) = &mut root.children[0] {
                if el.tag_type != ElementType::Slot {
                    if let Some(JsNode::VNodeCall(call)) = el.codegen.as_mut() {
                        convert_to_block(ctx, call);
                    }
                }
            }
            root.codegen = Some(JsNode::Child(0));
        }
        _ => {
            let mut flags = PatchFlags::STABLE_FRAGMENT;
            let non_comments = root
                .children
                .iter()
                .filter(|c| !matches!(c, TemplateChildNode::Comment(_)))
                .count();
            if non_comments == 1 {
                flags |= PatchFlags::DEV_ROOT_FRAGMENT;
            }
            let fragment = ctx.helper(RuntimeHelper::Fragment);
            let mut call = VNodeCall::new(VNodeTag::Helper(fragment), SourceLocation::STUB);
            call.children = Some(JsNode::Children(ChildRange::All));
            call.patch_flag = Some(flags.into());
            call.is_block = true;
            ctx.helper(RuntimeHelper::OpenBlock);
            ctx.helper(RuntimeHelper::CreateElementBlock);
            root.codegen = Some(JsNode::VNodeCall(Box::new_in(call, ctx.allocator)));
        }
    }
}

/// Move the collected helpers and assets onto the root
fn finish<'a>(ctx: TransformContext<'a>, root: &mut RootNode<'a>) -> Diagnostics {
    let allocator = ctx.allocator;

    let mut helpers = Vec::new_in(allocator);
    helpers.extend(ctx.helpers.sorted());
    root.helpers = helpers;

    let mut components = Vec::new_in(allocator);
    components.extend(ctx.components);
    root.components = components;

    let mut directives = Vec::new_in(allocator);
    directives.extend(ctx.directives);
    root.directives = directives;

    root.cached = ctx.cached;
    root.temps = ctx.temps;
    root.transformed = true;

    tracing::debug!(
        helpers = root.helpers.len(),
        components = root.components.len(),
        hoists = root.hoists.len(),
        cached = root.cached,
        errors = ctx.errors.len(),
        "transform finished"
    );

    Diagnostics {
        errors: ctx.errors,
        warnings: ctx.warnings,
    }
}
