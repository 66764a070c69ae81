//! Reference-counted runtime helper table.

use gesso_canvas::RuntimeHelper;
use gesso_palette::FxHashMap;

/// Helpers referenced by the render code.
///
/// Transforms add a reference whenever they emit a helper and drop it again
/// when they rewrite the emitting node (a vnode call turned into a block, a
/// conditional that gains an `else`). Only helpers with a positive count are
/// imported.
#[derive(Debug, Default, Clone)]
pub struct RuntimeHelpers {
    helpers: FxHashMap<RuntimeHelper, u32>,
}

impl RuntimeHelpers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a helper usage
    pub fn add(&mut self, helper: RuntimeHelper) {
        *self.helpers.entry(helper).or_insert(0) += 1;
    }

    /// Drop one usage. Every removal must follow an add.
    pub fn remove(&mut self, helper: RuntimeHelper) {
        let Some(count) = self.helpers.get_mut(&helper) else {
            debug_assert!(false, "helper {:?} removed more often than added", helper);
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.helpers.remove(&helper);
        }
    }

    pub fn contains(&self, helper: RuntimeHelper) -> bool {
        self.helpers.contains_key(&helper)
    }

    pub fn count(&self, helper: RuntimeHelper) -> u32 {
        self.helpers.get(&helper).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// Used helpers in emission order
    pub fn sorted(&self) -> std::vec::Vec<RuntimeHelper> {
        let mut helpers: std::vec::Vec<_> = self.helpers.keys().copied().collect();
        helpers.sort_unstable();
        helpers
    }

    pub fn clear(&mut self) {
        self.helpers.clear();
    }
}

/// Helper creating a non-block vnode
pub fn get_vnode_helper(ssr: bool, is_component: bool) -> RuntimeHelper {
    if ssr || is_component {
        RuntimeHelper::CreateVNode
    } else {
        RuntimeHelper::CreateElementVNode
    }
}

/// Helper creating a block vnode
pub fn get_vnode_block_helper(ssr: bool, is_component: bool) -> RuntimeHelper {
    if ssr || is_component {
        RuntimeHelper::CreateBlock
    } else {
        RuntimeHelper::CreateElementBlock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers() {
        let mut helpers = RuntimeHelpers::new();

        helpers.add(RuntimeHelper::CreateVNode);
        assert!(helpers.contains(RuntimeHelper::CreateVNode));
        assert_eq!(helpers.count(RuntimeHelper::CreateVNode), 1);

        helpers.add(RuntimeHelper::CreateVNode);
        assert_eq!(helpers.count(RuntimeHelper::CreateVNode), 2);

        helpers.remove(RuntimeHelper::CreateVNode);
        assert_eq!(helpers.count(RuntimeHelper::CreateVNode), 1);

        helpers.remove(RuntimeHelper::CreateVNode);
        assert!(!helpers.contains(RuntimeHelper::CreateVNode));
        assert!(helpers.is_empty());
    }

    #[test]
    fn test_emission_order() {
        let mut helpers = RuntimeHelpers::new();
        helpers.add(RuntimeHelper::ToDisplayString);
        helpers.add(RuntimeHelper::CreateElementBlock);
        helpers.add(RuntimeHelper::OpenBlock);
        assert_eq!(
            helpers.sorted(),
            vec![
                RuntimeHelper::OpenBlock,
                RuntimeHelper::CreateElementBlock,
                RuntimeHelper::ToDisplayString
            ]
        );
    }

    #[test]
    fn test_vnode_helpers() {
        assert_eq!(get_vnode_helper(false, false), RuntimeHelper::CreateElementVNode);
        assert_eq!(get_vnode_helper(false, true), RuntimeHelper::CreateVNode);
        assert_eq!(get_vnode_block_helper(true, false), RuntimeHelper::CreateBlock);
        assert_eq!(get_vnode_block_helper(false, false), RuntimeHelper::CreateElementBlock);
    }
}
