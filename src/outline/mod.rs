use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

pub mod export;
pub mod extraction;
pub mod loader;
pub mod transform;
pub mod tree;
pub mod widget;

pub const UNTITLED: &str = "Untitled";

/// Default bound on outline nesting. Real documents rarely go past a handful of levels.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A navigation target inside the document, as reported by the pdf backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Zero based page index
    pub page: u32,
}

/// An outline entry exactly as the document backend hands it over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOutlineNode {
    pub title: Option<String>,
    pub dest: Option<Destination>,
    pub url: Option<String>,
    pub items: Option<Vec<RawOutlineNode>>,
}

#[cfg(test)]
impl RawOutlineNode {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_items(mut self, items: Vec<RawOutlineNode>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_dest(mut self, page: u32) -> Self {
        self.dest = Some(Destination { page });
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// What activating an outline entry does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineAction {
    GoTo(Destination),
    OpenUrl(String),
    None,
}

/// A normalized outline entry. The serialized field names are part of the `outline.json` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiOutlineNode {
    pub id: String,
    pub is_selectable: bool,
    pub name: String,
    pub children: Vec<UiOutlineNode>,
    pub dest: Option<Destination>,
    pub url: Option<String>,
}

impl UiOutlineNode {
    pub fn is_folder(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn action(&self) -> OutlineAction {
        match (&self.dest, &self.url) {
            (Some(dest), _) => OutlineAction::GoTo(*dest),
            (None, Some(url)) => OutlineAction::OpenUrl(url.clone()),
            (None, None) => OutlineAction::None,
        }
    }

    /// Looks up a node by its ancestor-index path.
    pub fn find<'a>(nodes: &'a [UiOutlineNode], path: &NodePath) -> Option<&'a UiOutlineNode> {
        let (first, rest) = path.0.split_first()?;
        let mut node = nodes.get(*first)?;
        for idx in rest {
            node = node.children.get(*idx)?;
        }
        Some(node)
    }
}

/// How identifiers are generated for normalized nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum IdScheme {
    /// `item-{i}`, unique among siblings only
    #[default]
    Sibling,
    /// `0/1/2`, unique across the whole tree
    Path,
}

/// The position of a node in the tree, given as the index at each level from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(vec![])
    }

    pub fn child(&self, idx: usize) -> Self {
        let mut out = self.0.clone();
        out.push(idx);
        Self(out)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for idx in &self.0 {
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{idx}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutlineError {
    #[error("Outline is nested deeper than {limit} levels at {path}")]
    TooDeep { limit: usize, path: NodePath },
}
