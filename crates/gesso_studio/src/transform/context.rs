//! Transform context.

use gesso_canvas::{
    BindingType, CacheExpression, CompilerError, ElementType, ErrorCode, HoistRef, HoistedNode,
    JsNode, RuntimeHelper, SourceLocation, TemplateChildNode, TransformOptions,
};
use gesso_palette::{camelize, capitalize, Box, Bump, FxHashMap, FxHashSet, String, Vec};

use crate::runtime_helpers::RuntimeHelpers;

use super::{DirectiveTransform, NodeTransform, TransformPlugins};

/// What kind of container the children being traversed belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Root,
    Element(ElementType),
    IfBranch,
    For,
}

/// Nesting depth of scope-introducing constructs
#[derive(Debug, Default, Clone, Copy)]
pub struct Scopes {
    pub v_for: u32,
    pub v_slot: u32,
    pub v_pre: u32,
    pub v_once: u32,
}

/// State shared by every plugin during one transform call
pub struct TransformContext<'a> {
    pub allocator: &'a Bump,
    pub options: TransformOptions,
    pub helpers: RuntimeHelpers,
    pub components: std::vec::Vec<String>,
    pub directives: std::vec::Vec<String>,
    pub hoists: Vec<'a, HoistedNode<'a>>,
    pub temps: u32,
    pub cached: u32,
    /// In-scope identifiers (v-for aliases, slot props, `$event`) with
    /// their nesting count
    pub identifiers: FxHashMap<String, u32>,
    pub scopes: Scopes,
    pub in_v_once: bool,
    /// Component name inferred from the filename, for self references
    pub self_name: Option<String>,
    pub errors: std::vec::Vec<CompilerError>,
    pub warnings: std::vec::Vec<CompilerError>,
    /// Start offsets of `v-once` elements already wrapped in this call
    pub(crate) once_seen: FxHashSet<u32>,
    pub(crate) ancestors: std::vec::Vec<ParentKind>,
    pub(crate) node_transforms: std::vec::Vec<(&'static str, NodeTransform<'a>)>,
    pub(crate) directive_transforms: FxHashMap<&'static str, DirectiveTransform<'a>>,
}

impl<'a> TransformContext<'a> {
    pub fn new(allocator: &'a Bump, options: TransformOptions, plugins: &TransformPlugins<'a>) -> Self {
        let self_name = self_name_of(&options.filename);
        Self {
            allocator,
            options,
            helpers: RuntimeHelpers::new(),
            components: std::vec::Vec::new(),
            directives: std::vec::Vec::new(),
            hoists: Vec::new_in(allocator),
            temps: 0,
            cached: 0,
            identifiers: FxHashMap::default(),
            scopes: Scopes::default(),
            in_v_once: false,
            self_name,
            errors: std::vec::Vec::new(),
            warnings: std::vec::Vec::new(),
            once_seen: FxHashSet::default(),
            ancestors: std::vec::Vec::new(),
            node_transforms: plugins.node_transforms.clone(),
            directive_transforms: plugins.directive_transforms.clone(),
        }
    }

    #[inline]
    pub fn ssr(&self) -> bool {
        self.options.ssr
    }

    #[inline]
    pub fn prefix_identifiers(&self) -> bool {
        self.options.prefix_identifiers
    }

    #[inline]
    pub fn inline(&self) -> bool {
        self.options.inline
    }

    /// Register a helper usage and hand it back
    pub fn helper(&mut self, helper: RuntimeHelper) -> RuntimeHelper {
        self.helpers.add(helper);
        helper
    }

    pub fn remove_helper(&mut self, helper: RuntimeHelper) {
        self.helpers.remove(helper);
    }

    /// `_name` form used inside raw code strings
    pub fn helper_string(&mut self, helper: RuntimeHelper) -> String {
        self.helpers.add(helper);
        let mut out = String::const_new("_");
        out.push_str(helper.name());
        out
    }

    pub fn add_component(&mut self, name: &str) {
        if !self.components.iter().any(|c| c == name) {
            self.components.push(String::from(name));
        }
    }

    pub fn add_directive(&mut self, name: &str) {
        if !self.directives.iter().any(|d| d == name) {
            self.directives.push(String::from(name));
        }
    }

    /// Lift `codegen` into the hoist table; `children` are the template
    /// nodes its child references resolve against.
    pub fn hoist(&mut self, codegen: JsNode<'a>, children: Vec<'a, TemplateChildNode<'a>>) -> JsNode<'a> {
        self.hoists.push(HoistedNode { codegen, children });
        JsNode::Hoisted(HoistRef {
            index: self.hoists.len() - 1,
            spread: false,
        })
    }

    /// Wrap `value` in the next `_cache` slot
    pub fn cache(&mut self, value: JsNode<'a>, is_vnode: bool) -> JsNode<'a> {
        let index = self.cached;
        self.cached += 1;
        JsNode::Cache(Box::new_in(
            CacheExpression {
                index,
                value,
                is_vnode,
            },
            self.allocator,
        ))
    }

    pub fn add_identifier(&mut self, name: &str) {
        *self.identifiers.entry(String::from(name)).or_insert(0) += 1;
    }

    pub fn add_identifiers<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        for name in names {
            self.add_identifier(name);
        }
    }

    pub fn remove_identifier(&mut self, name: &str) {
        if let Some(count) = self.identifiers.get_mut(name) {
            *count -= 1;
            if *count == 0 {
                self.identifiers.remove(name);
            }
        }
    }

    pub fn remove_identifiers<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        for name in names {
            self.remove_identifier(name);
        }
    }

    pub fn is_in_scope(&self, name: &str) -> bool {
        self.identifiers.contains_key(name)
    }

    pub fn binding(&self, name: &str) -> Option<BindingType> {
        self.options.binding_metadata.as_ref()?.get(name)
    }

    /// Container whose children are currently being traversed
    pub fn parent(&self) -> Option<ParentKind> {
        self.ancestors.last().copied()
    }

    pub fn directive_transform(&self, name: &str) -> Option<DirectiveTransform<'a>> {
        self.directive_transforms.get(name).copied()
    }

    pub fn has_directive_transform(&self, name: &str) -> bool {
        self.directive_transforms.contains_key(name)
    }

    pub fn is_builtin_component(&self, tag: &str) -> Option<RuntimeHelper> {
        self.options.is_builtin_component.and_then(|f| f(tag))
    }

    pub fn is_custom_element(&self, tag: &str) -> bool {
        self.options.is_custom_element.is_some_and(|f| f(tag))
    }

    /// Record an error and forward it to `on_error`
    pub fn on_error(&mut self, code: ErrorCode, loc: Option<&SourceLocation>) {
        self.report(CompilerError::new(code, loc.cloned()));
    }

    pub fn report(&mut self, error: CompilerError) {
        if error.code.is_warning() {
            tracing::warn!(code = ?error.code, "{}", error.message);
            if let Some(on_warn) = self.options.on_warn {
                on_warn(error.clone());
            }
            self.warnings.push(error);
            return;
        }
        tracing::warn!(code = ?error.code, "{}", error.message);
        if let Some(on_error) = self.options.on_error {
            on_error(error.clone());
        }
        self.errors.push(error);
    }
}

/// `my-comp.vue` -> `MyComp`
fn self_name_of(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = base.split('.').next().unwrap_or(base);
    (!stem.is_empty()).then(|| capitalize(&camelize(stem)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(allocator: &Bump) -> TransformContext<'_> {
        TransformContext::new(allocator, TransformOptions::default(), &TransformPlugins::empty())
    }

    #[test]
    fn test_identifier_counts() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator);
        ctx.add_identifiers(["item", "item"]);
        ctx.remove_identifier("item");
        assert!(ctx.is_in_scope("item"));
        ctx.remove_identifier("item");
        assert!(!ctx.is_in_scope("item"));
    }

    #[test]
    fn test_cache_and_hoist_indices() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator);
        let first = ctx.cache(JsNode::simple(&allocator, "a", Default::default()), false);
        let second = ctx.cache(JsNode::simple(&allocator, "b", Default::default()), true);
        assert!(matches!(first, JsNode::Cache(c) if c.index == 0));
        assert!(matches!(second, JsNode::Cache(c) if c.index == 1 && c.is_vnode));

        let hoisted = ctx.hoist(JsNode::string(&allocator, "x"), Vec::new_in(&allocator));
        assert!(matches!(hoisted, JsNode::Hoisted(HoistRef { index: 0, spread: false })));
    }

    #[test]
    fn test_self_name() {
        assert_eq!(self_name_of("src/components/my-comp.vue").as_deref(), Some("MyComp"));
        assert_eq!(self_name_of("Foo.vue").as_deref(), Some("Foo"));
    }

    #[test]
    fn test_error_routing() {
        let allocator = Bump::new();
        let mut ctx = context(&allocator);
        ctx.on_error(ErrorCode::XVIfNoExpression, None);
        ctx.on_error(ErrorCode::WarnVIfVForPrecedence, None);
        assert_eq!(ctx.errors.len(), 1);
        assert_eq!(ctx.warnings.len(), 1);
    }
}
