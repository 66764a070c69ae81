//! Template and render-code AST.
//!
//! Template nodes are produced by the parser and rewritten by the transform
//! pipeline. Codegen nodes (`JsNode`) are attached to template nodes on exit
//! and read by the generator. Both share one `NodeType` discriminant space.
//!
//! All nodes live in a bumpalo arena. A codegen node either owns its
//! sub-expressions or refers back to template children by position
//! (`JsNode::Child`, `JsNode::Children`, `JsNode::Branch`); the generator
//! resolves those against the node that owns the descriptor.

use gesso_palette::{Box, Bump, PatchFlag, SmallVec, String, Vec};
use serde::{Deserialize, Serialize};

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Root = 0,
    Element = 1,
    Text = 2,
    Comment = 3,
    SimpleExpression = 4,
    Interpolation = 5,
    Attribute = 6,
    Directive = 7,
    CompoundExpression = 8,
    If = 9,
    IfBranch = 10,
    For = 11,
    TextCall = 12,
    // Codegen nodes
    VNodeCall = 13,
    JsCallExpression = 14,
    JsObjectExpression = 15,
    JsProperty = 16,
    JsArrayExpression = 17,
    JsFunctionExpression = 18,
    JsConditionalExpression = 19,
    JsCacheExpression = 20,
    // Server rendering statements
    JsBlockStatement = 21,
    JsTemplateLiteral = 22,
    JsIfStatement = 23,
    JsAssignmentExpression = 24,
    JsSequenceExpression = 25,
    JsReturnStatement = 26,
}

/// Element kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum ElementType {
    #[default]
    Element = 0,
    Component = 1,
    Slot = 2,
    Template = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum Namespace {
    #[default]
    Html = 0,
    Svg = 1,
    MathMl = 2,
}

/// How inert an expression or subtree is. Higher levels subsume lower ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[repr(u8)]
pub enum ConstantType {
    #[default]
    NotConstant = 0,
    CanSkipPatch = 1,
    CanHoist = 2,
    CanStringify = 3,
}

/// Source position in the template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    /// Byte offset from start of the template
    pub offset: u32,
    /// 1-indexed line number
    pub line: u32,
    /// 1-indexed column number, in characters
    pub column: u32,
}

impl Position {
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Position reached after consuming `text` from here
    pub fn advanced(self, text: &str) -> Self {
        let mut pos = self;
        for c in text.chars() {
            pos.offset += c.len_utf8() as u32;
            if c == '\n' {
                pos.line += 1;
                pos.column = 1;
            } else {
                pos.column += 1;
            }
        }
        pos
    }
}

/// Source location span [start, end)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
    pub source: String,
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::STUB
    }
}

impl SourceLocation {
    /// Location of generated nodes
    pub const STUB: Self = Self {
        start: Position::new(0, 1, 1),
        end: Position::new(0, 1, 1),
        source: String::const_new(""),
    };

    pub fn new(start: Position, end: Position, source: impl Into<String>) -> Self {
        Self {
            start,
            end,
            source: source.into(),
        }
    }

    /// Sub-range `[offset, offset + len)` of this location's source.
    /// Falls back to the whole location when the range does not fit.
    pub fn inner(&self, offset: usize, len: usize) -> Self {
        match self.source.get(offset..offset + len) {
            Some(text) => {
                let start = self.start.advanced(&self.source[..offset]);
                Self {
                    start,
                    end: start.advanced(text),
                    source: String::from(text),
                }
            }
            None => self.clone(),
        }
    }

    pub fn is_stub(&self) -> bool {
        self.start.offset == 0 && self.end.offset == 0 && self.source.is_empty()
    }
}

// ============================================================================
// Root
// ============================================================================

#[derive(Debug)]
pub struct RootNode<'a> {
    pub children: Vec<'a, TemplateChildNode<'a>>,
    /// Helpers with a positive reference count, in emission order
    pub helpers: Vec<'a, RuntimeHelper>,
    pub components: Vec<'a, String>,
    pub directives: Vec<'a, String>,
    pub hoists: Vec<'a, HoistedNode<'a>>,
    pub imports: Vec<'a, ImportItem>,
    /// Number of `_cache` slots in use
    pub cached: u32,
    /// Number of `_temp` variables to declare
    pub temps: u32,
    pub source: String,
    pub loc: SourceLocation,
    pub codegen: Option<JsNode<'a>>,
    pub transformed: bool,
}

impl<'a> RootNode<'a> {
    pub fn new(allocator: &'a Bump, source: impl Into<String>) -> Self {
        Self {
            children: Vec::new_in(allocator),
            helpers: Vec::new_in(allocator),
            components: Vec::new_in(allocator),
            directives: Vec::new_in(allocator),
            hoists: Vec::new_in(allocator),
            imports: Vec::new_in(allocator),
            cached: 0,
            temps: 0,
            source: source.into(),
            loc: SourceLocation::STUB,
            codegen: None,
            transformed: false,
        }
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::Root
    }
}

/// A constant lifted out of the render function.
///
/// `children` holds the template children that the hoisted descriptor's
/// child references resolve against.
#[derive(Debug)]
pub struct HoistedNode<'a> {
    pub codegen: JsNode<'a>,
    pub children: Vec<'a, TemplateChildNode<'a>>,
}

/// Import emitted ahead of the render function in module mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub exp: String,
    pub path: String,
}

// ============================================================================
// Runtime helpers
// ============================================================================

/// Runtime helper symbols. Declaration order is emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum RuntimeHelper {
    Fragment,
    Teleport,
    Suspense,
    KeepAlive,
    BaseTransition,
    Transition,
    TransitionGroup,
    OpenBlock,
    CreateBlock,
    CreateElementBlock,
    CreateVNode,
    CreateElementVNode,
    CreateComment,
    CreateText,
    ResolveComponent,
    ResolveDynamicComponent,
    ResolveDirective,
    WithDirectives,
    RenderList,
    RenderSlot,
    CreateSlots,
    ToDisplayString,
    MergeProps,
    NormalizeClass,
    NormalizeStyle,
    NormalizeProps,
    GuardReactiveProps,
    ToHandlers,
    Camelize,
    Capitalize,
    ToHandlerKey,
    SetBlockTracking,
    WithCtx,
    Unref,
    IsRef,
    VShow,
    VModelText,
    VModelCheckbox,
    VModelRadio,
    VModelSelect,
    VModelDynamic,
    WithModifiers,
    WithKeys,

    // Server rendering helpers
    SsrInterpolate,
    SsrRenderVNode,
    SsrRenderComponent,
    SsrRenderSlot,
    SsrRenderAttrs,
    SsrRenderAttr,
    SsrRenderDynamicAttr,
    SsrIncludeBooleanAttr,
    SsrRenderClass,
    SsrRenderStyle,
    SsrRenderDynamicModel,
    SsrRenderList,
    SsrLooseEqual,
    SsrLooseContain,
    SsrGetDirectiveProps,
    SsrRenderTeleport,
}

impl RuntimeHelper {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fragment => "Fragment",
            Self::Teleport => "Teleport",
            Self::Suspense => "Suspense",
            Self::KeepAlive => "KeepAlive",
            Self::BaseTransition => "BaseTransition",
            Self::Transition => "Transition",
            Self::TransitionGroup => "TransitionGroup",
            Self::OpenBlock => "openBlock",
            Self::CreateBlock => "createBlock",
            Self::CreateElementBlock => "createElementBlock",
            Self::CreateVNode => "createVNode",
            Self::CreateElementVNode => "createElementVNode",
            Self::CreateComment => "createCommentVNode",
            Self::CreateText => "createTextVNode",
            Self::ResolveComponent => "resolveComponent",
            Self::ResolveDynamicComponent => "resolveDynamicComponent",
            Self::ResolveDirective => "resolveDirective",
            Self::WithDirectives => "withDirectives",
            Self::RenderList => "renderList",
            Self::RenderSlot => "renderSlot",
            Self::CreateSlots => "createSlots",
            Self::ToDisplayString => "toDisplayString",
            Self::MergeProps => "mergeProps",
            Self::NormalizeClass => "normalizeClass",
            Self::NormalizeStyle => "normalizeStyle",
            Self::NormalizeProps => "normalizeProps",
            Self::GuardReactiveProps => "guardReactiveProps",
            Self::ToHandlers => "toHandlers",
            Self::Camelize => "camelize",
            Self::Capitalize => "capitalize",
            Self::ToHandlerKey => "toHandlerKey",
            Self::SetBlockTracking => "setBlockTracking",
            Self::WithCtx => "withCtx",
            Self::Unref => "unref",
            Self::IsRef => "isRef",
            Self::VShow => "vShow",
            Self::VModelText => "vModelText",
            Self::VModelCheckbox => "vModelCheckbox",
            Self::VModelRadio => "vModelRadio",
            Self::VModelSelect => "vModelSelect",
            Self::VModelDynamic => "vModelDynamic",
            Self::WithModifiers => "withModifiers",
            Self::WithKeys => "withKeys",
            Self::SsrInterpolate => "ssrInterpolate",
            Self::SsrRenderVNode => "ssrRenderVNode",
            Self::SsrRenderComponent => "ssrRenderComponent",
            Self::SsrRenderSlot => "ssrRenderSlot",
            Self::SsrRenderAttrs => "ssrRenderAttrs",
            Self::SsrRenderAttr => "ssrRenderAttr",
            Self::SsrRenderDynamicAttr => "ssrRenderDynamicAttr",
            Self::SsrIncludeBooleanAttr => "ssrIncludeBooleanAttr",
            Self::SsrRenderClass => "ssrRenderClass",
            Self::SsrRenderStyle => "ssrRenderStyle",
            Self::SsrRenderDynamicModel => "ssrRenderDynamicModel",
            Self::SsrRenderList => "ssrRenderList",
            Self::SsrLooseEqual => "ssrLooseEqual",
            Self::SsrLooseContain => "ssrLooseContain",
            Self::SsrGetDirectiveProps => "ssrGetDirectiveProps",
            Self::SsrRenderTeleport => "ssrRenderTeleport",
        }
    }

    /// Helpers imported from the server renderer module
    pub fn is_ssr(&self) -> bool {
        *self >= Self::SsrInterpolate
    }
}

/// Components built into the core runtime, under either spelling
pub fn core_component(tag: &str) -> Option<RuntimeHelper> {
    match tag {
        "Teleport" | "teleport" => Some(RuntimeHelper::Teleport),
        "Suspense" | "suspense" => Some(RuntimeHelper::Suspense),
        "KeepAlive" | "keep-alive" => Some(RuntimeHelper::KeepAlive),
        "BaseTransition" | "base-transition" => Some(RuntimeHelper::BaseTransition),
        _ => None,
    }
}

// ============================================================================
// Template nodes
// ============================================================================

#[derive(Debug)]
pub enum TemplateChildNode<'a> {
    Element(Box<'a, ElementNode<'a>>),
    Text(Box<'a, TextNode>),
    Comment(Box<'a, CommentNode>),
    Interpolation(Box<'a, InterpolationNode<'a>>),
    If(Box<'a, IfNode<'a>>),
    For(Box<'a, ForNode<'a>>),
    TextCall(Box<'a, TextCallNode<'a>>),
    CompoundExpression(Box<'a, CompoundExpressionNode<'a>>),
}

impl<'a> TemplateChildNode<'a> {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Element(_) => NodeType::Element,
            Self::Text(_) => NodeType::Text,
            Self::Comment(_) => NodeType::Comment,
            Self::Interpolation(_) => NodeType::Interpolation,
            Self::If(_) => NodeType::If,
            Self::For(_) => NodeType::For,
            Self::TextCall(_) => NodeType::TextCall,
            Self::CompoundExpression(_) => NodeType::CompoundExpression,
        }
    }

    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Element(n) => &n.loc,
            Self::Text(n) => &n.loc,
            Self::Comment(n) => &n.loc,
            Self::Interpolation(n) => &n.loc,
            Self::If(n) => &n.loc,
            Self::For(n) => &n.loc,
            Self::TextCall(n) => &n.loc,
            Self::CompoundExpression(n) => &n.loc,
        }
    }

    /// Text, interpolation or an already merged compound
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            Self::Text(_) | Self::Interpolation(_) | Self::CompoundExpression(_)
        )
    }

    /// Text containing only HTML whitespace
    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, Self::Text(t) if t.content.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')))
    }

    pub fn as_element(&self) -> Option<&ElementNode<'a>> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode<'a>> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Codegen slot of nodes that carry one
    pub fn codegen_mut(&mut self) -> Option<&mut Option<JsNode<'a>>> {
        match self {
            Self::Element(el) => Some(&mut el.codegen),
            Self::If(n) => Some(&mut n.codegen),
            Self::For(n) => Some(&mut n.codegen),
            _ => None,
        }
    }

    pub fn codegen(&self) -> Option<&JsNode<'a>> {
        match self {
            Self::Element(el) => el.codegen.as_ref(),
            Self::If(n) => n.codegen.as_ref(),
            Self::For(n) => n.codegen.as_ref(),
            Self::TextCall(n) => Some(&n.codegen),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ElementNode<'a> {
    pub ns: Namespace,
    pub tag: String,
    pub tag_type: ElementType,
    pub props: Vec<'a, PropNode<'a>>,
    pub children: Vec<'a, TemplateChildNode<'a>>,
    pub is_self_closing: bool,
    pub loc: SourceLocation,
    pub codegen: Option<JsNode<'a>>,
}

impl<'a> ElementNode<'a> {
    pub fn new(allocator: &'a Bump, tag: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            ns: Namespace::Html,
            tag: tag.into(),
            tag_type: ElementType::Element,
            props: Vec::new_in(allocator),
            children: Vec::new_in(allocator),
            is_self_closing: false,
            loc,
            codegen: None,
        }
    }

    pub fn is_component(&self) -> bool {
        self.tag_type == ElementType::Component
    }

    /// Index of a directive whose name satisfies `pred`. Directives without
    /// an expression only count when `allow_empty`.
    pub fn find_dir_by(&self, pred: impl Fn(&str) -> bool, allow_empty: bool) -> Option<usize> {
        self.props.iter().position(|p| match p {
            PropNode::Directive(dir) => (allow_empty || dir.exp.is_some()) && pred(&dir.name),
            PropNode::Attribute(_) => false,
        })
    }

    pub fn find_dir(&self, name: &str, allow_empty: bool) -> Option<usize> {
        self.find_dir_by(|n| n == name, allow_empty)
    }

    /// Index of a static attribute `name` (unless `dynamic_only`) or a
    /// `v-bind:name`.
    pub fn find_prop(&self, name: &str, dynamic_only: bool, allow_empty: bool) -> Option<usize> {
        self.props.iter().position(|p| match p {
            PropNode::Attribute(attr) => !dynamic_only && attr.name == name,
            PropNode::Directive(dir) => {
                dir.name == "bind"
                    && (allow_empty || dir.exp.is_some())
                    && dir.arg.as_ref().is_some_and(|arg| arg.is_static_named(name))
            }
        })
    }

    pub fn has_prop(&self, name: &str) -> bool {
        self.find_prop(name, false, true).is_some()
    }

    /// Value of a plain attribute
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.props.iter().find_map(|p| match p {
            PropNode::Attribute(attr) if attr.name == name => {
                Some(attr.value.as_ref().map_or("", |v| v.content.as_str()))
            }
            _ => None,
        })
    }

    /// `v-bind` with a dynamic argument
    pub fn has_dynamic_key_v_bind(&self) -> bool {
        self.props.iter().any(|p| match p {
            PropNode::Directive(dir) => {
                dir.name == "bind"
                    && dir
                        .arg
                        .as_ref()
                        .is_some_and(|arg| !matches!(arg, ExpressionNode::Simple(s) if s.is_static))
            }
            PropNode::Attribute(_) => false,
        })
    }

    /// `<template>` carrying `v-slot`
    pub fn is_template_slot(&self) -> bool {
        self.tag_type == ElementType::Template && self.find_dir("slot", true).is_some()
    }
}

#[derive(Debug)]
pub enum PropNode<'a> {
    Attribute(Box<'a, AttributeNode>),
    Directive(Box<'a, DirectiveNode<'a>>),
}

impl<'a> PropNode<'a> {
    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Attribute(a) => &a.loc,
            Self::Directive(d) => &d.loc,
        }
    }

    pub fn as_directive(&self) -> Option<&DirectiveNode<'a>> {
        match self {
            Self::Directive(d) => Some(d),
            Self::Attribute(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributeNode {
    pub name: String,
    pub name_loc: SourceLocation,
    pub value: Option<TextNode>,
    pub loc: SourceLocation,
}

#[derive(Debug)]
pub struct DirectiveNode<'a> {
    /// Normalized name: `bind` for `:`, `on` for `@`, `slot` for `#`
    pub name: String,
    /// Attribute name as written
    pub raw_name: String,
    pub exp: Option<ExpressionNode<'a>>,
    pub arg: Option<ExpressionNode<'a>>,
    pub modifiers: SmallVec<[String; 2]>,
    /// `v-for` decomposition, filled in by the parser
    pub for_parse_result: Option<ForParseResult<'a>>,
    pub loc: SourceLocation,
}

impl<'a> DirectiveNode<'a> {
    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.iter().any(|m| m == name)
    }

    /// Static argument text
    pub fn static_arg(&self) -> Option<&str> {
        match &self.arg {
            Some(ExpressionNode::Simple(s)) if s.is_static => Some(s.content.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub content: String,
    pub loc: SourceLocation,
}

impl TextNode {
    pub fn new(content: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            content: content.into(),
            loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub content: String,
    pub loc: SourceLocation,
}

#[derive(Debug)]
pub struct InterpolationNode<'a> {
    pub content: ExpressionNode<'a>,
    pub loc: SourceLocation,
}

/// A text-like child turned into `createTextVNode(...)`. The codegen owns
/// the text content as its first argument.
#[derive(Debug)]
pub struct TextCallNode<'a> {
    pub codegen: JsNode<'a>,
    pub loc: SourceLocation,
}

#[derive(Debug)]
pub struct IfNode<'a> {
    pub branches: Vec<'a, IfBranchNode<'a>>,
    /// Branches of earlier conditional chains in the same sibling list
    pub key_base: u32,
    pub loc: SourceLocation,
    pub codegen: Option<JsNode<'a>>,
}

#[derive(Debug)]
pub struct IfBranchNode<'a> {
    /// `None` for `v-else`
    pub condition: Option<ExpressionNode<'a>>,
    pub children: Vec<'a, TemplateChildNode<'a>>,
    pub user_key: Option<UserKey>,
    pub is_template_if: bool,
    pub loc: SourceLocation,
    pub codegen: Option<JsNode<'a>>,
}

/// Explicit `key` written on a conditional branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKey {
    pub content: String,
    pub is_static: bool,
}

#[derive(Debug)]
pub struct ForNode<'a> {
    pub source: ExpressionNode<'a>,
    pub value_alias: Option<ExpressionNode<'a>>,
    pub key_alias: Option<ExpressionNode<'a>>,
    pub object_index_alias: Option<ExpressionNode<'a>>,
    pub children: Vec<'a, TemplateChildNode<'a>>,
    pub loc: SourceLocation,
    pub codegen: Option<JsNode<'a>>,
}

#[derive(Debug)]
pub struct ForParseResult<'a> {
    pub source: ExpressionNode<'a>,
    pub value: Option<ExpressionNode<'a>>,
    pub key: Option<ExpressionNode<'a>>,
    pub index: Option<ExpressionNode<'a>>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug)]
pub enum ExpressionNode<'a> {
    Simple(Box<'a, SimpleExpressionNode>),
    Compound(Box<'a, CompoundExpressionNode<'a>>),
}

impl<'a> ExpressionNode<'a> {
    pub fn simple(
        allocator: &'a Bump,
        content: impl Into<String>,
        is_static: bool,
        loc: SourceLocation,
        const_type: ConstantType,
    ) -> Self {
        Self::Simple(Box::new_in(
            SimpleExpressionNode::new(content, is_static, loc, const_type),
            allocator,
        ))
    }

    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Simple(s) => &s.loc,
            Self::Compound(c) => &c.loc,
        }
    }

    pub fn is_static_named(&self, name: &str) -> bool {
        matches!(self, Self::Simple(s) if s.is_static && s.content == name)
    }

    pub fn as_simple(&self) -> Option<&SimpleExpressionNode> {
        match self {
            Self::Simple(s) => Some(s),
            Self::Compound(_) => None,
        }
    }

    /// Whitespace-only or empty simple expression
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Simple(s) if !s.is_static && s.content.trim().is_empty())
    }

    /// Deep copy into the same arena
    pub fn clone_in(&self, allocator: &'a Bump) -> Self {
        match self {
            Self::Simple(s) => Self::Simple(Box::new_in((**s).clone(), allocator)),
            Self::Compound(c) => Self::Compound(Box::new_in(c.clone_in(allocator), allocator)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleExpressionNode {
    pub content: String,
    pub is_static: bool,
    pub const_type: ConstantType,
    pub loc: SourceLocation,
    /// Already a handler key (`onClick`), no `on` prefixing needed
    pub is_handler_key: bool,
}

impl SimpleExpressionNode {
    pub fn new(
        content: impl Into<String>,
        is_static: bool,
        loc: SourceLocation,
        const_type: ConstantType,
    ) -> Self {
        Self {
            content: content.into(),
            is_static,
            const_type,
            loc,
            is_handler_key: false,
        }
    }
}

#[derive(Debug)]
pub struct CompoundExpressionNode<'a> {
    pub children: Vec<'a, CompoundPart<'a>>,
    pub loc: SourceLocation,
    pub is_handler_key: bool,
}

impl<'a> CompoundExpressionNode<'a> {
    pub fn new(allocator: &'a Bump, loc: SourceLocation) -> Self {
        Self {
            children: Vec::new_in(allocator),
            loc,
            is_handler_key: false,
        }
    }

    pub fn push_raw(&mut self, code: &str) {
        self.children.push(CompoundPart::Raw(String::from(code)));
    }

    pub fn clone_in(&self, allocator: &'a Bump) -> Self {
        let mut children = Vec::with_capacity_in(self.children.len(), allocator);
        for part in self.children.iter() {
            children.push(match part {
                CompoundPart::Raw(s) => CompoundPart::Raw(s.clone()),
                CompoundPart::Helper(h) => CompoundPart::Helper(*h),
                CompoundPart::Simple(s) => CompoundPart::Simple(Box::new_in((**s).clone(), allocator)),
                CompoundPart::Text(t) => CompoundPart::Text(Box::new_in((**t).clone(), allocator)),
                CompoundPart::Interpolation(i) => CompoundPart::Interpolation(Box::new_in(
                    InterpolationNode {
                        content: i.content.clone_in(allocator),
                        loc: i.loc.clone(),
                    },
                    allocator,
                )),
                CompoundPart::Compound(c) => {
                    CompoundPart::Compound(Box::new_in(c.clone_in(allocator), allocator))
                }
            });
        }
        Self {
            children,
            loc: self.loc.clone(),
            is_handler_key: self.is_handler_key,
        }
    }
}

#[derive(Debug)]
pub enum CompoundPart<'a> {
    /// Literal code
    Raw(String),
    Helper(RuntimeHelper),
    Simple(Box<'a, SimpleExpressionNode>),
    Text(Box<'a, TextNode>),
    Interpolation(Box<'a, InterpolationNode<'a>>),
    Compound(Box<'a, CompoundExpressionNode<'a>>),
}

// ============================================================================
// Codegen nodes
// ============================================================================

#[derive(Debug)]
pub enum JsNode<'a> {
    VNodeCall(Box<'a, VNodeCall<'a>>),
    Call(Box<'a, CallExpression<'a>>),
    Object(Box<'a, ObjectExpression<'a>>),
    Array(Box<'a, ArrayExpression<'a>>),
    Function(Box<'a, FunctionExpression<'a>>),
    Conditional(Box<'a, ConditionalExpression<'a>>),
    Cache(Box<'a, CacheExpression<'a>>),
    Simple(Box<'a, SimpleExpressionNode>),
    Compound(Box<'a, CompoundExpressionNode<'a>>),
    Text(Box<'a, TextNode>),
    Interpolation(Box<'a, InterpolationNode<'a>>),
    /// `_hoisted_{index + 1}`
    Hoisted(HoistRef),
    /// The owner's template child at this index
    Child(usize),
    /// An array of the owner's template children
    Children(ChildRange),
    /// Codegen of the owning conditional's branch
    Branch(usize),
    // Server rendering statements
    Block(Box<'a, BlockStatement<'a>>),
    If(Box<'a, IfStatement<'a>>),
    Assignment(Box<'a, AssignmentExpression<'a>>),
    Sequence(Box<'a, SequenceExpression<'a>>),
    Return(Box<'a, ReturnStatement<'a>>),
    TemplateLiteral(Box<'a, TemplateLiteral<'a>>),
}

impl<'a> JsNode<'a> {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::VNodeCall(_) => NodeType::VNodeCall,
            Self::Call(_) => NodeType::JsCallExpression,
            Self::Object(_) => NodeType::JsObjectExpression,
            Self::Array(_) | Self::Children(_) => NodeType::JsArrayExpression,
            Self::Function(_) => NodeType::JsFunctionExpression,
            Self::Conditional(_) => NodeType::JsConditionalExpression,
            Self::Cache(_) => NodeType::JsCacheExpression,
            Self::Simple(_) | Self::Hoisted(_) => NodeType::SimpleExpression,
            Self::Compound(_) => NodeType::CompoundExpression,
            Self::Text(_) => NodeType::Text,
            Self::Interpolation(_) => NodeType::Interpolation,
            Self::Child(_) => NodeType::Element,
            Self::Branch(_) => NodeType::IfBranch,
            Self::Block(_) => NodeType::JsBlockStatement,
            Self::If(_) => NodeType::JsIfStatement,
            Self::Assignment(_) => NodeType::JsAssignmentExpression,
            Self::Sequence(_) => NodeType::JsSequenceExpression,
            Self::Return(_) => NodeType::JsReturnStatement,
            Self::TemplateLiteral(_) => NodeType::JsTemplateLiteral,
        }
    }

    /// Non-static simple expression
    pub fn simple(allocator: &'a Bump, content: impl Into<String>, const_type: ConstantType) -> Self {
        Self::Simple(Box::new_in(
            SimpleExpressionNode::new(content, false, SourceLocation::STUB, const_type),
            allocator,
        ))
    }

    /// Static string literal
    pub fn string(allocator: &'a Bump, content: impl Into<String>) -> Self {
        Self::Simple(Box::new_in(
            SimpleExpressionNode::new(
                content,
                true,
                SourceLocation::STUB,
                ConstantType::CanStringify,
            ),
            allocator,
        ))
    }

    pub fn from_expression(exp: ExpressionNode<'a>) -> Self {
        match exp {
            ExpressionNode::Simple(s) => Self::Simple(s),
            ExpressionNode::Compound(c) => Self::Compound(c),
        }
    }

    pub fn call(allocator: &'a Bump, callee: Callee, arguments: Vec<'a, JsNode<'a>>) -> Self {
        Self::Call(Box::new_in(
            CallExpression {
                callee,
                arguments,
                loc: SourceLocation::STUB,
            },
            allocator,
        ))
    }

    pub fn helper_call(
        allocator: &'a Bump,
        helper: RuntimeHelper,
        arguments: Vec<'a, JsNode<'a>>,
    ) -> Self {
        Self::call(allocator, Callee::Helper(helper), arguments)
    }

    pub fn array(allocator: &'a Bump, elements: Vec<'a, JsNode<'a>>) -> Self {
        Self::Array(Box::new_in(
            ArrayExpression {
                elements,
                loc: SourceLocation::STUB,
            },
            allocator,
        ))
    }

    pub fn object(allocator: &'a Bump, properties: Vec<'a, Property<'a>>) -> Self {
        Self::Object(Box::new_in(
            ObjectExpression {
                properties,
                loc: SourceLocation::STUB,
            },
            allocator,
        ))
    }

    pub fn as_vnode_call(&self) -> Option<&VNodeCall<'a>> {
        match self {
            Self::VNodeCall(v) => Some(v),
            Self::Cache(c) => c.value.as_vnode_call(),
            _ => None,
        }
    }

    /// The VNode call, seeing through a `v-once` cache wrapper
    pub fn as_vnode_call_mut(&mut self) -> Option<&mut VNodeCall<'a>> {
        match self {
            Self::VNodeCall(v) => Some(v),
            Self::Cache(c) => c.value.as_vnode_call_mut(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoistRef {
    pub index: usize,
    /// Shallow copy at render time (`[..._hoisted_N]`)
    pub spread: bool,
}

/// Which of the owner's template children an array reference covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRange {
    All,
    Only(SmallVec<[usize; 4]>),
    /// The children of the owner's child at this index
    Of(usize),
}

#[derive(Debug)]
pub struct VNodeCall<'a> {
    pub tag: VNodeTag<'a>,
    pub props: Option<JsNode<'a>>,
    pub children: Option<JsNode<'a>>,
    pub patch_flag: Option<PatchFlag>,
    /// Static list of dynamic prop names (`["foo", "bar"]`) or a hoisted ref
    pub dynamic_props: Option<JsNode<'a>>,
    /// `[[dir, exp, arg, modifiers], ...]`
    pub directives: Option<JsNode<'a>>,
    pub is_block: bool,
    pub disable_tracking: bool,
    pub is_component: bool,
    pub loc: SourceLocation,
}

impl<'a> VNodeCall<'a> {
    pub fn new(tag: VNodeTag<'a>, loc: SourceLocation) -> Self {
        Self {
            tag,
            props: None,
            children: None,
            patch_flag: None,
            dynamic_props: None,
            directives: None,
            is_block: false,
            disable_tracking: false,
            is_component: false,
            loc,
        }
    }
}

#[derive(Debug)]
pub enum VNodeTag<'a> {
    /// Quoted tag name: `"div"`
    Literal(String),
    /// Resolved asset variable: `_component_foo`
    Identifier(String),
    Helper(RuntimeHelper),
    Expr(JsNode<'a>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    Helper(RuntimeHelper),
    Name(String),
}

#[derive(Debug)]
pub struct CallExpression<'a> {
    pub callee: Callee,
    pub arguments: Vec<'a, JsNode<'a>>,
    pub loc: SourceLocation,
}

#[derive(Debug)]
pub struct ObjectExpression<'a> {
    pub properties: Vec<'a, Property<'a>>,
    pub loc: SourceLocation,
}

#[derive(Debug)]
pub struct Property<'a> {
    pub key: ExpressionNode<'a>,
    pub value: JsNode<'a>,
    pub loc: SourceLocation,
}

impl<'a> Property<'a> {
    /// Property with a static key
    pub fn named(allocator: &'a Bump, key: impl Into<String>, value: JsNode<'a>) -> Self {
        Self {
            key: ExpressionNode::simple(
                allocator,
                key,
                true,
                SourceLocation::STUB,
                ConstantType::CanStringify,
            ),
            value,
            loc: SourceLocation::STUB,
        }
    }

    pub fn static_key(&self) -> Option<&str> {
        match &self.key {
            ExpressionNode::Simple(s) if s.is_static => Some(s.content.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ArrayExpression<'a> {
    pub elements: Vec<'a, JsNode<'a>>,
    pub loc: SourceLocation,
}

#[derive(Debug)]
pub struct FunctionExpression<'a> {
    pub params: Vec<'a, ExpressionNode<'a>>,
    pub returns: Option<JsNode<'a>>,
    pub body: Option<BlockStatement<'a>>,
    pub newline: bool,
    /// Wrapped in `withCtx(...)`
    pub is_slot: bool,
    pub loc: SourceLocation,
}

impl<'a> FunctionExpression<'a> {
    pub fn new(allocator: &'a Bump) -> Self {
        Self {
            params: Vec::new_in(allocator),
            returns: None,
            body: None,
            newline: false,
            is_slot: false,
            loc: SourceLocation::STUB,
        }
    }
}

#[derive(Debug)]
pub struct ConditionalExpression<'a> {
    pub test: JsNode<'a>,
    pub consequent: JsNode<'a>,
    pub alternate: JsNode<'a>,
    pub newline: bool,
}

#[derive(Debug)]
pub struct CacheExpression<'a> {
    pub index: u32,
    pub value: JsNode<'a>,
    /// Suspend block tracking while creating the cached vnode
    pub is_vnode: bool,
}

#[derive(Debug)]
pub struct BlockStatement<'a> {
    pub body: Vec<'a, JsNode<'a>>,
}

impl<'a> BlockStatement<'a> {
    pub fn new(allocator: &'a Bump) -> Self {
        Self {
            body: Vec::new_in(allocator),
        }
    }
}

#[derive(Debug)]
pub struct IfStatement<'a> {
    pub test: JsNode<'a>,
    pub consequent: BlockStatement<'a>,
    pub alternate: Option<IfAlternate<'a>>,
}

#[derive(Debug)]
pub enum IfAlternate<'a> {
    If(Box<'a, IfStatement<'a>>),
    Block(Box<'a, BlockStatement<'a>>),
}

#[derive(Debug)]
pub struct AssignmentExpression<'a> {
    pub left: String,
    pub right: JsNode<'a>,
}

#[derive(Debug)]
pub struct SequenceExpression<'a> {
    pub expressions: Vec<'a, JsNode<'a>>,
}

#[derive(Debug)]
pub struct ReturnStatement<'a> {
    pub returns: JsNode<'a>,
}

#[derive(Debug)]
pub struct TemplateLiteral<'a> {
    pub elements: Vec<'a, TemplatePart<'a>>,
}

#[derive(Debug)]
pub enum TemplatePart<'a> {
    /// Raw literal text, escaped on emission
    Str(String),
    Expr(JsNode<'a>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_location() {
        let loc = SourceLocation::default();
        assert!(loc.is_stub());
        assert_eq!(loc.start.line, 1);
    }

    #[test]
    fn test_advance_and_inner() {
        let start = Position::new(0, 1, 1);
        let end = start.advanced("ab\ncd");
        assert_eq!(end, Position::new(5, 2, 3));

        let loc = SourceLocation::new(Position::new(10, 3, 5), Position::new(23, 3, 18), "item in items");
        let inner = loc.inner(8, 5);
        assert_eq!(inner.source, "items");
        assert_eq!(inner.start, Position::new(18, 3, 13));
        assert_eq!(inner.end, Position::new(23, 3, 18));
        assert_eq!(loc.inner(20, 3), loc);
    }

    #[test]
    fn test_helper_names_and_ssr_split() {
        assert_eq!(RuntimeHelper::CreateComment.name(), "createCommentVNode");
        assert!(!RuntimeHelper::WithKeys.is_ssr());
        assert!(RuntimeHelper::SsrInterpolate.is_ssr());
        assert!(RuntimeHelper::SsrRenderTeleport.is_ssr());
        assert!(RuntimeHelper::OpenBlock < RuntimeHelper::CreateElementBlock);
    }

    #[test]
    fn test_constant_order() {
        assert!(ConstantType::NotConstant < ConstantType::CanSkipPatch);
        assert!(ConstantType::CanHoist < ConstantType::CanStringify);
    }

    #[test]
    fn test_element_prop_lookup() {
        let allocator = Bump::new();
        let mut el = ElementNode::new(&allocator, "div", SourceLocation::STUB);
        el.props.push(PropNode::Attribute(Box::new_in(
            AttributeNode {
                name: String::from("id"),
                name_loc: SourceLocation::STUB,
                value: Some(TextNode::new("app", SourceLocation::STUB)),
                loc: SourceLocation::STUB,
            },
            &allocator,
        )));
        el.props.push(PropNode::Directive(Box::new_in(
            DirectiveNode {
                name: String::from("bind"),
                raw_name: String::from(":title"),
                exp: Some(ExpressionNode::simple(
                    &allocator,
                    "t",
                    false,
                    SourceLocation::STUB,
                    ConstantType::NotConstant,
                )),
                arg: Some(ExpressionNode::simple(
                    &allocator,
                    "title",
                    true,
                    SourceLocation::STUB,
                    ConstantType::CanStringify,
                )),
                modifiers: SmallVec::new(),
                for_parse_result: None,
                loc: SourceLocation::STUB,
            },
            &allocator,
        )));

        assert_eq!(el.find_prop("id", false, false), Some(0));
        assert_eq!(el.find_prop("id", true, false), None);
        assert_eq!(el.find_prop("title", true, false), Some(1));
        assert_eq!(el.find_dir("bind", false), Some(1));
        assert_eq!(el.attribute_value("id"), Some("app"));
        assert!(!el.has_dynamic_key_v_bind());
    }
}
