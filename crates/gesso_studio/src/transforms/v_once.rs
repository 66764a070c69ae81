//! `v-once`: render the subtree once and reuse the vnode from `_cache`.

use gesso_canvas::{RuntimeHelper, TemplateChildNode};

use crate::transform::{Cursor, Exit, TransformContext};

pub fn transform_once<'a>(ctx: &mut TransformContext<'a>, cursor: &mut Cursor<'_, 'a>) -> Exit<'a> {
    let TemplateChildNode::Element(el) = cursor.node() else {
        return Exit::None;
    };
    if el.find_dir("once", true).is_none() {
        return Exit::None;
    }
    // v-if/v-for re-enter the node after replacing it
    if !ctx.once_seen.insert(el.loc.start.offset) || ctx.in_v_once || ctx.ssr() {
        return Exit::None;
    }

    ctx.in_v_once = true;
    ctx.scopes.v_once += 1;
    ctx.helper(RuntimeHelper::SetBlockTracking);
    tracing::trace!(offset = el.loc.start.offset, "v-once");

    Exit::one(|ctx, node| {
        ctx.in_v_once = false;
        ctx.scopes.v_once -= 1;
        let Some(slot) = node.codegen_mut() else { return };
        if let Some(codegen) = slot.take() {
            *slot = Some(ctx.cache(codegen, true));
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::transform::{transform, TransformPlugins};
    use gesso_canvas::{JsNode, RuntimeHelper, TransformOptions};
    use gesso_palette::Bump;
    use gesso_sketch::parse;

    #[test]
    fn test_once_caches_element() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div><span v-once>{{ msg }}</span></div>");
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());

        let div = root.children[0].as_element().unwrap();
        let span = div.children[0].as_element().unwrap();
        match &span.codegen {
            Some(JsNode::Cache(cache)) => {
                assert_eq!(cache.index, 0);
                assert!(cache.is_vnode);
            }
            other => panic!("expected cache, got {other:?}"),
        }
        assert_eq!(root.cached, 1);
        assert!(root.helpers.contains(&RuntimeHelper::SetBlockTracking));
    }

    #[test]
    fn test_nested_once_cached_once() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div v-once><p v-once>a</p></div>");
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        assert_eq!(root.cached, 1);
    }

    #[test]
    fn test_once_with_if() {
        let allocator = Bump::new();
        let (mut root, _) = parse(&allocator, "<div v-if=\"ok\" v-once>a</div>");
        transform(&allocator, &mut root, TransformOptions::default(), &TransformPlugins::base());
        assert!(matches!(root.children[0].codegen(), Some(JsNode::Cache(_))));
        assert_eq!(root.cached, 1);
    }
}
