//! Position of the node being transformed within its sibling list.

use gesso_canvas::{CommentNode, SourceLocation, TemplateChildNode};
use gesso_palette::{Box, Bump, String, Vec};

/// Mutable handle on the current node and its siblings.
///
/// Plugins replace or remove the current node through the cursor. Removing
/// earlier siblings shifts the cursor so traversal neither skips nor
/// revisits a node.
pub struct Cursor<'c, 'a> {
    siblings: &'c mut Vec<'a, TemplateChildNode<'a>>,
    index: usize,
    removed: bool,
}

impl<'c, 'a> Cursor<'c, 'a> {
    pub fn new(siblings: &'c mut Vec<'a, TemplateChildNode<'a>>, index: usize) -> Self {
        debug_assert!(index < siblings.len());
        Self {
            siblings,
            index,
            removed: false,
        }
    }

    pub fn node(&self) -> &TemplateChildNode<'a> {
        &self.siblings[self.index]
    }

    pub fn node_mut(&mut self) -> &mut TemplateChildNode<'a> {
        &mut self.siblings[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Put `node` in place of the current node, returning the old one
    pub fn replace(&mut self, node: TemplateChildNode<'a>) -> TemplateChildNode<'a> {
        debug_assert!(!self.removed);
        std::mem::replace(&mut self.siblings[self.index], node)
    }

    /// Rebuild the current node from its owned value
    pub fn replace_with(
        &mut self,
        allocator: &'a Bump,
        f: impl FnOnce(TemplateChildNode<'a>) -> TemplateChildNode<'a>,
    ) {
        let placeholder = TemplateChildNode::Comment(Box::new_in(
            CommentNode {
                content: String::default(),
                loc: SourceLocation::STUB,
            },
            allocator,
        ));
        let current = self.replace(placeholder);
        self.siblings[self.index] = f(current);
    }

    /// Detach the current node. Remaining plugins, descent and exits are
    /// skipped for it.
    pub fn remove(&mut self) -> TemplateChildNode<'a> {
        debug_assert!(!self.removed);
        self.removed = true;
        self.siblings.remove(self.index)
    }

    pub fn siblings(&self) -> &[TemplateChildNode<'a>] {
        self.siblings
    }

    pub fn siblings_mut(&mut self) -> &mut Vec<'a, TemplateChildNode<'a>> {
        self.siblings
    }

    /// Remove an earlier sibling
    pub fn remove_before(&mut self, at: usize) -> TemplateChildNode<'a> {
        debug_assert!(at < self.index);
        self.index -= 1;
        self.siblings.remove(at)
    }

    /// Where traversal continues after this node
    pub(crate) fn next_index(&self) -> usize {
        if self.removed {
            self.index
        } else {
            self.index + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesso_canvas::TextNode;

    fn text<'a>(allocator: &'a Bump, content: &str) -> TemplateChildNode<'a> {
        TemplateChildNode::Text(Box::new_in(TextNode::new(content, SourceLocation::STUB), allocator))
    }

    fn content(node: &TemplateChildNode<'_>) -> std::string::String {
        match node {
            TemplateChildNode::Text(t) => t.content.to_string(),
            _ => std::string::String::new(),
        }
    }

    #[test]
    fn test_remove_before_shifts_index() {
        let allocator = Bump::new();
        let mut siblings = Vec::new_in(&allocator);
        siblings.push(text(&allocator, "a"));
        siblings.push(text(&allocator, "b"));
        siblings.push(text(&allocator, "c"));

        let mut cursor = Cursor::new(&mut siblings, 2);
        cursor.remove_before(1);
        assert_eq!(cursor.index(), 1);
        assert_eq!(content(cursor.node()), "c");
        assert_eq!(cursor.next_index(), 2);

        cursor.remove();
        assert!(cursor.is_removed());
        assert_eq!(cursor.next_index(), 1);
        assert_eq!(siblings.len(), 1);
    }

    #[test]
    fn test_replace_with() {
        let allocator = Bump::new();
        let mut siblings = Vec::new_in(&allocator);
        siblings.push(text(&allocator, "a"));

        let mut cursor = Cursor::new(&mut siblings, 0);
        cursor.replace_with(&allocator, |old| {
            assert_eq!(content(&old), "a");
            text(&allocator, "b")
        });
        assert_eq!(content(cursor.node()), "b");
    }
}
