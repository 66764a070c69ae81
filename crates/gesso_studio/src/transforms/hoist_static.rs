//! Static analysis and hoisting.
//!
//! Constant subtrees are lifted out of the render function into
//! `const _hoisted_N = ...` declarations, so they are created once and
//! skipped by the runtime diff. Elements that cannot hoist as a whole may
//! still hoist their props object and dynamic prop name list.

use gesso_canvas::{
    ChildRange, CompoundExpressionNode, CompoundPart, ConstantType, ElementNode, ElementType,
    ExpressionNode, JsNode, PropNode, RootNode, RuntimeHelper, TemplateChildNode, VNodeCall,
};
use gesso_palette::{FxHashMap, PatchFlag, PatchFlags, Vec};

use super::utils::convert_to_vnode;
use crate::transform::TransformContext;

/// Hoist every eligible node of `root`. Running it again on an already
/// hoisted tree changes nothing.
pub fn hoist_static<'a>(ctx: &mut TransformContext<'a>, root: &mut RootNode<'a>) {
    let allocator = ctx.allocator;
    // continue numbering after hoists from an earlier run
    let existing = std::mem::replace(&mut root.hoists, Vec::new_in(allocator));
    let before = existing.len();
    ctx.hoists.extend(existing);

    let single_root = root.children.len() == 1
        && matches!(&root.children[0], TemplateChildNode::Element(el) if el.tag_type != ElementType::Slot);

    let mut hoister = Hoister {
        ctx: &mut *ctx,
        cache: FxHashMap::default(),
    };
    hoister.walk(&mut root.children, single_root);

    root.hoists = std::mem::replace(&mut ctx.hoists, Vec::new_in(allocator));
    tracing::debug!(hoisted = root.hoists.len() - before, total = root.hoists.len(), "hoist");
}

struct Hoister<'c, 'a> {
    ctx: &'c mut TransformContext<'a>,
    /// Element constancy keyed by start offset
    cache: FxHashMap<u32, ConstantType>,
}

impl<'c, 'a> Hoister<'c, 'a> {
    /// Returns whether every child was hoisted
    fn walk(&mut self, children: &mut Vec<'a, TemplateChildNode<'a>>, do_not_hoist: bool) -> bool {
        let original_count = children.len();
        let mut hoisted_count = 0;

        for child in children.iter_mut() {
            match child {
                TemplateChildNode::Element(el) if el.tag_type == ElementType::Element => {
                    let constant = if do_not_hoist {
                        ConstantType::NotConstant
                    } else {
                        self.element_constant(el)
                    };
                    if constant >= ConstantType::CanHoist {
                        self.hoist_element(el);
                        hoisted_count += 1;
                        continue;
                    }
                    if constant == ConstantType::NotConstant {
                        self.hoist_props(el);
                    }
                }
                TemplateChildNode::TextCall(text) => {
                    if text_call_constant(&text.codegen) >= ConstantType::CanHoist {
                        let codegen = std::mem::replace(&mut text.codegen, JsNode::Child(0));
                        text.codegen = self.ctx.hoist(codegen, Vec::new_in(self.ctx.allocator));
                        hoisted_count += 1;
                    }
                }
                _ => {}
            }

            match child {
                TemplateChildNode::Element(el) => {
                    let all_hoisted = self.walk(&mut el.children, false);
                    if all_hoisted && el.tag_type == ElementType::Element {
                        self.hoist_children_array(el);
                    }
                }
                TemplateChildNode::For(node) => {
                    // a lone loop child must stay a block
                    let single = node.children.len() == 1;
                    self.walk(&mut node.children, single);
                }
                TemplateChildNode::If(node) => {
                    for branch in node.branches.iter_mut() {
                        let single = branch.children.len() == 1;
                        self.walk(&mut branch.children, single);
                    }
                }
                _ => {}
            }
        }

        hoisted_count > 0 && hoisted_count == original_count
    }

    fn hoist_element(&mut self, el: &mut ElementNode<'a>) {
        let Some(mut codegen) = el.codegen.take() else { return };
        if let JsNode::VNodeCall(call) = &mut codegen {
            call.patch_flag = Some(PatchFlag::Hoisted);
        }
        let children = std::mem::replace(&mut el.children, Vec::new_in(self.ctx.allocator));
        tracing::trace!(tag = %el.tag, index = self.ctx.hoists.len(), "hoist element");
        el.codegen = Some(self.ctx.hoist(codegen, children));
    }

    /// Props of an element with dynamic children may still be constant
    fn hoist_props(&mut self, el: &mut ElementNode<'a>) {
        let allocator = self.ctx.allocator;
        let Some(JsNode::VNodeCall(call)) = el.codegen.as_mut() else { return };
        let flag_allows = match call.patch_flag {
            None => true,
            Some(PatchFlag::Dynamic(flags)) => {
                flags.is_empty() || flags == PatchFlags::NEED_PATCH || flags == PatchFlags::TEXT
            }
            Some(_) => false,
        };
        if flag_allows
            && matches!(call.props, Some(JsNode::Object(_)))
            && generated_props_constant(call) >= ConstantType::CanHoist
        {
            if let Some(props) = call.props.take() {
                call.props = Some(self.ctx.hoist(props, Vec::new_in(allocator)));
            }
        }
        if matches!(call.dynamic_props, Some(ref p) if !matches!(p, JsNode::Hoisted(_))) {
            if let Some(names) = call.dynamic_props.take() {
                call.dynamic_props = Some(self.ctx.hoist(names, Vec::new_in(allocator)));
            }
        }
    }

    fn hoist_children_array(&mut self, el: &mut ElementNode<'a>) {
        if !self.ctx.options.hoist_children_arrays {
            return;
        }
        let Some(JsNode::VNodeCall(call)) = el.codegen.as_mut() else { return };
        if !matches!(call.children, Some(JsNode::Children(ChildRange::All))) {
            return;
        }
        let children = std::mem::replace(&mut el.children, Vec::new_in(self.ctx.allocator));
        let mut hoisted = self.ctx.hoist(JsNode::Children(ChildRange::All), children);
        if let JsNode::Hoisted(reference) = &mut hoisted {
            reference.spread = self.ctx.options.hmr;
        }
        call.children = Some(hoisted);
    }

    fn node_constant(&mut self, node: &mut TemplateChildNode<'a>) -> ConstantType {
        match node {
            TemplateChildNode::Element(el) => self.element_constant(el),
            TemplateChildNode::Text(_) | TemplateChildNode::Comment(_) => ConstantType::CanStringify,
            TemplateChildNode::If(_) | TemplateChildNode::For(_) => ConstantType::NotConstant,
            TemplateChildNode::Interpolation(interp) => expression_constant_type(&interp.content),
            TemplateChildNode::TextCall(text) => text_call_constant(&text.codegen),
            TemplateChildNode::CompoundExpression(compound) => compound_constant_type(compound),
        }
    }

    fn element_constant(&mut self, el: &mut ElementNode<'a>) -> ConstantType {
        if el.tag_type != ElementType::Element {
            return ConstantType::NotConstant;
        }
        let key = el.loc.start.offset;
        if let Some(&cached) = self.cache.get(&key) {
            return cached;
        }
        let constant = self.compute_element_constant(el);
        self.cache.insert(key, constant);
        constant
    }

    fn compute_element_constant(&mut self, el: &mut ElementNode<'a>) -> ConstantType {
        let Some(JsNode::VNodeCall(call)) = &el.codegen else {
            return ConstantType::NotConstant;
        };
        let block_root = call.is_block;
        if block_root && !matches!(el.tag.as_str(), "svg" | "foreignObject" | "math") {
            return ConstantType::NotConstant;
        }
        if call.patch_flag.is_some_and(|flag| !flag.is_empty()) {
            return ConstantType::NotConstant;
        }

        // injected keys and cached handlers leave no patch flag behind
        let mut constant = generated_props_constant(call);
        if constant == ConstantType::NotConstant {
            return constant;
        }

        for child in el.children.iter_mut() {
            let child_type = self.node_constant(child);
            if child_type == ConstantType::NotConstant {
                return child_type;
            }
            constant = constant.min(child_type);
        }

        if constant > ConstantType::CanSkipPatch {
            for prop in el.props.iter() {
                let Some(dir) = prop.as_directive() else { continue };
                if dir.name != "bind" {
                    continue;
                }
                if let Some(exp) = &dir.exp {
                    let exp_type = expression_constant_type(exp);
                    if exp_type == ConstantType::NotConstant {
                        return exp_type;
                    }
                    constant = constant.min(exp_type);
                }
            }
        }

        if block_root {
            // a static svg root no longer needs to track descendants
            if el.props.iter().any(|p| matches!(p, PropNode::Directive(_))) {
                return ConstantType::NotConstant;
            }
            if let Some(JsNode::VNodeCall(call)) = el.codegen.as_mut() {
                convert_to_vnode(self.ctx, call);
            }
        }
        constant
    }
}

/// Constancy of the props object an element will be created with
fn generated_props_constant(call: &VNodeCall<'_>) -> ConstantType {
    let Some(JsNode::Object(object)) = &call.props else {
        return ConstantType::CanStringify;
    };
    let mut constant = ConstantType::CanStringify;
    for property in object.properties.iter() {
        let key_type = expression_constant_type(&property.key);
        if key_type == ConstantType::NotConstant {
            return key_type;
        }
        let value_type = match &property.value {
            JsNode::Simple(simple) => simple.const_type,
            JsNode::Compound(compound) => compound_constant_type(compound),
            JsNode::Hoisted(_) => ConstantType::CanHoist,
            call @ JsNode::Call(_) => normalizer_constant(call),
            _ => ConstantType::NotConstant,
        };
        if value_type == ConstantType::NotConstant {
            return value_type;
        }
        constant = constant.min(key_type).min(value_type);
    }
    constant
}

/// `normalizeClass(x)` and friends are as constant as their argument
fn normalizer_constant(node: &JsNode<'_>) -> ConstantType {
    let JsNode::Call(call) = node else {
        return ConstantType::NotConstant;
    };
    let hoistable = matches!(
        call.callee,
        gesso_canvas::Callee::Helper(
            RuntimeHelper::NormalizeClass
                | RuntimeHelper::NormalizeStyle
                | RuntimeHelper::NormalizeProps
                | RuntimeHelper::GuardReactiveProps
        )
    );
    if !hoistable {
        return ConstantType::NotConstant;
    }
    match call.arguments.first() {
        Some(JsNode::Simple(simple)) => simple.const_type,
        Some(inner @ JsNode::Call(_)) => normalizer_constant(inner),
        _ => ConstantType::NotConstant,
    }
}

pub fn expression_constant_type(exp: &ExpressionNode<'_>) -> ConstantType {
    match exp {
        ExpressionNode::Simple(simple) => simple.const_type,
        ExpressionNode::Compound(compound) => compound_constant_type(compound),
    }
}

pub fn compound_constant_type(compound: &CompoundExpressionNode<'_>) -> ConstantType {
    let mut constant = ConstantType::CanStringify;
    for part in compound.children.iter() {
        let part_type = match part {
            CompoundPart::Raw(_) | CompoundPart::Helper(_) => continue,
            CompoundPart::Simple(simple) => simple.const_type,
            CompoundPart::Text(_) => ConstantType::CanStringify,
            CompoundPart::Interpolation(interp) => expression_constant_type(&interp.content),
            CompoundPart::Compound(inner) => compound_constant_type(inner),
        };
        if part_type == ConstantType::NotConstant {
            return part_type;
        }
        constant = constant.min(part_type);
    }
    constant
}

/// Constancy of a text-like child, `None` for anything else
pub fn text_constant_type(node: &TemplateChildNode<'_>) -> Option<ConstantType> {
    match node {
        TemplateChildNode::Text(_) => Some(ConstantType::CanStringify),
        TemplateChildNode::Interpolation(interp) => Some(expression_constant_type(&interp.content)),
        TemplateChildNode::CompoundExpression(compound) => Some(compound_constant_type(compound)),
        TemplateChildNode::TextCall(text) => Some(text_call_constant(&text.codegen)),
        _ => None,
    }
}

/// Constancy of the content of a `createTextVNode(...)` call
fn text_call_constant(codegen: &JsNode<'_>) -> ConstantType {
    let JsNode::Call(call) = codegen else {
        // already hoisted
        return ConstantType::NotConstant;
    };
    match call.arguments.first() {
        None => ConstantType::CanStringify,
        Some(JsNode::Text(_)) => ConstantType::CanStringify,
        Some(JsNode::Interpolation(interp)) => expression_constant_type(&interp.content),
        Some(JsNode::Compound(compound)) => compound_constant_type(compound),
        Some(JsNode::Simple(simple)) => simple.const_type,
        Some(_) => ConstantType::NotConstant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{transform, TransformPlugins};
    use gesso_canvas::{HoistRef, TransformOptions};
    use gesso_palette::Bump;
    use gesso_sketch::parse;

    fn hoisting() -> TransformOptions {
        TransformOptions {
            hoist_static: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_hoists_static_children() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div><span>1</span>abc</div>");
        transform(&allocator, &mut root, hoisting(), &TransformPlugins::base());

        assert_eq!(root.hoists.len(), 2);
        let div = root.children[0].as_element().unwrap();
        assert!(matches!(
            div.children[0].codegen(),
            Some(JsNode::Hoisted(HoistRef { index: 0, spread: false }))
        ));
        assert!(matches!(
            div.children[1].codegen(),
            Some(JsNode::Hoisted(HoistRef { index: 1, spread: false }))
        ));
        let span = root.hoists[0].codegen.as_vnode_call().unwrap();
        assert_eq!(span.patch_flag, Some(PatchFlag::Hoisted));
    }

    #[test]
    fn test_single_root_is_not_hoisted() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div>static</div>");
        transform(&allocator, &mut root, hoisting(), &TransformPlugins::base());
        assert!(root.hoists.is_empty());
        assert!(root.children[0].codegen().and_then(JsNode::as_vnode_call).unwrap().is_block);
    }

    #[test]
    fn test_dynamic_element_hoists_props() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<div><p id="x">{{ msg }}</p></div>"#);
        transform(&allocator, &mut root, hoisting(), &TransformPlugins::base());

        assert_eq!(root.hoists.len(), 1);
        assert!(matches!(root.hoists[0].codegen, JsNode::Object(_)));
        let div = root.children[0].as_element().unwrap();
        let p = div.children[0].codegen().and_then(JsNode::as_vnode_call).unwrap();
        assert!(matches!(p.props, Some(JsNode::Hoisted(_))));
    }

    #[test]
    fn test_children_array_hoist_with_hmr_copy() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div><p>a</p><p>b</p></div>");
        let options = TransformOptions {
            hoist_static: true,
            hoist_children_arrays: true,
            hmr: true,
            ..Default::default()
        };
        transform(&allocator, &mut root, options, &TransformPlugins::base());

        assert_eq!(root.hoists.len(), 3);
        let div = root.children[0].codegen().and_then(JsNode::as_vnode_call).unwrap();
        assert!(matches!(
            div.children,
            Some(JsNode::Hoisted(HoistRef { index: 2, spread: true }))
        ));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<div><span>1</span><p :id="x">{{ y }}</p><b class="c"/></div>"#);
        let plugins = TransformPlugins::base();
        transform(&allocator, &mut root, hoisting(), &plugins);
        let first = root.hoists.len();

        let mut ctx = TransformContext::new(&allocator, hoisting(), &plugins);
        hoist_static(&mut ctx, &mut root);
        assert_eq!(root.hoists.len(), first);
        let div = root.children[0].as_element().unwrap();
        assert!(matches!(div.children[0].codegen(), Some(JsNode::Hoisted(HoistRef { index: 0, .. }))));
    }

    #[test]
    fn test_loop_and_branch_single_children_stay() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, r#"<div><p v-for="i in list">x</p><p v-if="ok">y</p></div>"#);
        transform(&allocator, &mut root, hoisting(), &TransformPlugins::base());
        // only the branch's `{ key: 0 }` props object is lifted
        assert_eq!(root.hoists.len(), 1);
        let JsNode::Object(props) = &root.hoists[0].codegen else {
            panic!("expected a props object");
        };
        assert_eq!(props.properties.len(), 1);
    }
}
