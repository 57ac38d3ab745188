use std::{fmt::Debug, path::PathBuf};

use anyhow::{Result, anyhow};
use mupdf::{Document, Outline};
use tracing::debug;

use super::{Destination, RawOutlineNode};

/// Anything that can produce the raw outline of a document. `Ok(None)` means the document has no
/// outline at all.
pub trait OutlineSource: Debug + Send + Sync {
    fn fetch_outline(&self) -> Result<Option<Vec<RawOutlineNode>>>;
}

/// Reads the outline of a document on disk through mupdf.
#[derive(Debug, Clone)]
pub struct MupdfSource {
    path: PathBuf,
}

impl MupdfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutlineSource for MupdfSource {
    fn fetch_outline(&self) -> Result<Option<Vec<RawOutlineNode>>> {
        let path = self
            .path
            .to_str()
            .ok_or_else(|| anyhow!("Path {:?} is not valid utf-8", self.path))?;
        let document = Document::open(path)?;
        let outlines = document.outlines()?;
        debug!("{} top level outline entries in {path}", outlines.len());
        if outlines.is_empty() {
            Ok(None)
        } else {
            Ok(Some(outlines.iter().map(convert_outline).collect()))
        }
    }
}

fn convert_outline(outline: &Outline) -> RawOutlineNode {
    raw_node(
        &outline.title,
        outline.page,
        outline.uri.as_deref(),
        outline.down.iter().map(convert_outline).collect(),
    )
}

/// Builds a raw node from the fields mupdf reports for one outline entry.
fn raw_node(
    title: &str,
    page: Option<u32>,
    uri: Option<&str>,
    items: Vec<RawOutlineNode>,
) -> RawOutlineNode {
    RawOutlineNode {
        title: Some(title.to_owned()).filter(|t| !t.is_empty()),
        dest: page.map(|page| Destination { page }),
        url: uri.filter(|uri| is_external(uri)).map(str::to_owned),
        items: Some(items),
    }
}

/// Internal links are reported by mupdf as `#page=..` or `#nameddest=..` fragments and are
/// already covered by the destination.
fn is_external(uri: &str) -> bool {
    !uri.is_empty() && !uri.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_fragments_are_not_urls() {
        assert!(is_external("https://example.com"));
        assert!(is_external("mailto:someone@example.com"));
        assert!(!is_external("#page=5"));
        assert!(!is_external("#nameddest=chapter1"));
        assert!(!is_external(""));
    }

    #[test]
    fn maps_mupdf_fields_to_raw_nodes() {
        let child = raw_node("Section", Some(4), Some("#page=5"), vec![]);
        assert_eq!(child.title.as_deref(), Some("Section"));
        assert_eq!(child.dest, Some(Destination { page: 4 }));
        assert_eq!(child.url, None);
        assert_eq!(child.items, Some(vec![]));

        let node = raw_node("", None, Some("https://example.com"), vec![child.clone()]);
        assert_eq!(node.title, None);
        assert_eq!(node.dest, None);
        assert_eq!(node.url.as_deref(), Some("https://example.com"));
        assert_eq!(node.items, Some(vec![child]));

        let bare = raw_node("Notes", None, None, vec![]);
        assert_eq!(bare.url, None);
        assert_eq!(bare.dest, None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let source = MupdfSource::new("does/not/exist.pdf");
        assert!(source.fetch_outline().is_err());
    }
}
