use std::collections::HashSet;

use super::{NodePath, UiOutlineNode};

/// Expand/collapse and selection state of the outline tree. Keyed by node path so that nodes
/// sharing a sibling id in different branches never alias each other.
#[derive(Debug, Clone, Default)]
pub struct TreeState {
    expanded: HashSet<NodePath>,
    selected: Option<NodePath>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Folder { expanded: bool },
    Leaf,
}

/// One line of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow<'a> {
    pub path: NodePath,
    pub name: &'a str,
    pub kind: RowKind,
    pub selected: bool,
}

impl TreeRow<'_> {
    pub fn depth(&self) -> usize {
        self.path.depth().saturating_sub(1)
    }
}

impl TreeState {
    pub fn is_expanded(&self, path: &NodePath) -> bool {
        self.expanded.contains(path)
    }

    /// Opens or closes the folder at `path`. Leaves and unknown paths are ignored.
    pub fn toggle(&mut self, nodes: &[UiOutlineNode], path: &NodePath) {
        if !UiOutlineNode::find(nodes, path).is_some_and(|n| n.is_folder()) {
            return;
        }
        if !self.expanded.remove(path) {
            self.expanded.insert(path.clone());
        }
    }

    pub fn expand_all(&mut self, nodes: &[UiOutlineNode]) {
        walk(nodes, &NodePath::root(), &mut |path, node| {
            if node.is_folder() {
                self.expanded.insert(path.clone());
            }
        });
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn select(&mut self, path: NodePath) {
        self.selected = Some(path);
    }

    pub fn selected(&self) -> Option<&NodePath> {
        self.selected.as_ref()
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
        self.selected = None;
    }

    /// Drops state for paths that no longer exist after the outline was reloaded.
    pub fn prune(&mut self, nodes: &[UiOutlineNode]) {
        self.expanded
            .retain(|p| UiOutlineNode::find(nodes, p).is_some_and(|n| n.is_folder()));
        if let Some(sel) = &self.selected
            && UiOutlineNode::find(nodes, sel).is_none()
        {
            self.selected = None;
        }
    }

    /// Moves the selection `offset` rows up or down among the currently visible rows.
    pub fn move_selection(&mut self, nodes: &[UiOutlineNode], offset: isize) {
        let rows = visible_rows(nodes, self);
        if rows.is_empty() {
            return;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|sel| rows.iter().position(|r| &r.path == sel));
        let next = match current {
            Some(idx) => idx.saturating_add_signed(offset).min(rows.len() - 1),
            None if offset < 0 => rows.len() - 1,
            None => 0,
        };
        self.selected = Some(rows[next].path.clone());
    }
}

/// Flattens the tree into the rows that are currently visible, in display order. Children of
/// collapsed folders are skipped.
pub fn visible_rows<'a>(nodes: &'a [UiOutlineNode], state: &TreeState) -> Vec<TreeRow<'a>> {
    let mut rows = Vec::new();
    push_rows(nodes, &NodePath::root(), state, &mut rows);
    rows
}

fn push_rows<'a>(
    nodes: &'a [UiOutlineNode],
    parent: &NodePath,
    state: &TreeState,
    rows: &mut Vec<TreeRow<'a>>,
) {
    for (idx, node) in nodes.iter().enumerate() {
        let path = parent.child(idx);
        let selected = state.selected.as_ref() == Some(&path);
        if node.is_folder() {
            let expanded = state.is_expanded(&path);
            rows.push(TreeRow {
                path: path.clone(),
                name: &node.name,
                kind: RowKind::Folder { expanded },
                selected,
            });
            if expanded {
                push_rows(&node.children, &path, state, rows);
            }
        } else {
            rows.push(TreeRow {
                path,
                name: &node.name,
                kind: RowKind::Leaf,
                selected,
            });
        }
    }
}

fn walk(nodes: &[UiOutlineNode], parent: &NodePath, f: &mut impl FnMut(&NodePath, &UiOutlineNode)) {
    for (idx, node) in nodes.iter().enumerate() {
        let path = parent.child(idx);
        f(&path, node);
        walk(&node.children, &path, f);
    }
}
