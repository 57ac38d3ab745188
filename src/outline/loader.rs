use std::{path::PathBuf, sync::Arc};

use anyhow::anyhow;
use tracing::{debug, info, warn};

use super::{
    UiOutlineNode,
    extraction::OutlineSource,
    transform::{TransformOptions, transform_outline},
};

/// Identifies one outline fetch. Only the response to the most recently issued token is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// A fetch the loader wants performed. Produced by the loader, consumed by [`fetch`].
#[derive(Debug, Clone)]
pub struct OutlineRequest {
    pub token: RequestToken,
    pub document: PathBuf,
    pub options: TransformOptions,
}

#[derive(Debug, Clone)]
pub struct OutlineResponse {
    pub token: RequestToken,
    /// Errors are carried as text so the response can travel through ui messages
    pub result: Result<Vec<UiOutlineNode>, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct OutlineLoader {
    document: Option<PathBuf>,
    latest: RequestToken,
    outline: Option<Vec<UiOutlineNode>>,
    status: LoadStatus,
    options: TransformOptions,
}

impl OutlineLoader {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn document(&self) -> Option<&PathBuf> {
        self.document.as_ref()
    }

    /// The current normalized outline, `None` until a load has succeeded.
    pub fn outline(&self) -> Option<&[UiOutlineNode]> {
        self.outline.as_deref()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Points the loader at a new document. Returns the fetch to run, if any. Setting the same
    /// document again does nothing, clearing the document drops any pending fetch and the
    /// current outline.
    pub fn set_document(&mut self, document: Option<PathBuf>) -> Option<OutlineRequest> {
        if document == self.document {
            return None;
        }
        self.document = document;
        match self.document.clone() {
            Some(path) => Some(self.issue(path)),
            None => {
                self.next_token();
                self.outline = None;
                self.status = LoadStatus::Idle;
                debug!("Document cleared, outline reset");
                None
            }
        }
    }

    /// Fetches the outline of the current document again, e.g. after the file changed on disk.
    pub fn reload(&mut self) -> Option<OutlineRequest> {
        let path = self.document.clone()?;
        Some(self.issue(path))
    }

    /// Applies a finished fetch. Returns `false` when the response was stale and got discarded.
    pub fn apply(&mut self, response: OutlineResponse) -> bool {
        if response.token != self.latest {
            debug!(
                "Discarding stale outline response {:?}, latest is {:?}",
                response.token, self.latest
            );
            return false;
        }
        match response.result {
            Ok(outline) => {
                info!("Loaded outline with {} top level entries", outline.len());
                self.outline = Some(outline);
                self.status = LoadStatus::Loaded;
            }
            Err(e) => {
                warn!("Could not load outline: {e}");
                self.status = LoadStatus::Failed(e);
            }
        }
        true
    }

    fn issue(&mut self, document: PathBuf) -> OutlineRequest {
        let token = self.next_token();
        self.status = LoadStatus::Loading;
        debug!("Requesting outline for {:?} as {:?}", document, token);
        OutlineRequest {
            token,
            document,
            options: self.options,
        }
    }

    fn next_token(&mut self) -> RequestToken {
        self.latest = RequestToken(self.latest.0 + 1);
        self.latest
    }
}

/// Runs a fetch on the blocking pool and normalizes the result.
pub async fn fetch(request: OutlineRequest, source: Arc<dyn OutlineSource>) -> OutlineResponse {
    let options = request.options;
    let result = tokio::task::spawn_blocking(move || source.fetch_outline())
        .await
        .map_err(|e| anyhow!("Outline task failed: {e}"))
        .and_then(|r| r)
        .and_then(|raw| Ok(transform_outline(raw.as_deref(), options)?))
        .map_err(|e| format!("{e:#}"));
    OutlineResponse {
        token: request.token,
        result,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{Result, bail};

    use super::*;
    use crate::outline::RawOutlineNode;

    #[derive(Debug, Default)]
    struct FakeSource {
        outline: Option<Vec<RawOutlineNode>>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl OutlineSource for FakeSource {
        fn fetch_outline(&self) -> Result<Option<Vec<RawOutlineNode>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("broken document");
            }
            Ok(self.outline.clone())
        }
    }

    fn source(titles: &[&str]) -> Arc<FakeSource> {
        Arc::new(FakeSource {
            outline: Some(titles.iter().map(|t| RawOutlineNode::titled(*t)).collect()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn loads_outline_for_new_document() {
        let mut loader = OutlineLoader::default();
        let req = loader.set_document(Some("a.pdf".into())).unwrap();
        assert_eq!(loader.status(), &LoadStatus::Loading);

        let response = fetch(req, source(&["One", "Two"])).await;
        assert!(loader.apply(response));
        let names: Vec<_> = loader.outline().unwrap().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["One", "Two"]);
        assert_eq!(loader.status(), &LoadStatus::Loaded);
    }

    #[test]
    fn same_document_is_not_fetched_twice() {
        let mut loader = OutlineLoader::default();
        assert!(loader.set_document(Some("a.pdf".into())).is_some());
        assert!(loader.set_document(Some("a.pdf".into())).is_none());
        assert!(loader.set_document(Some("b.pdf".into())).is_some());
    }

    #[test]
    fn absent_document_never_fetches() {
        let mut loader = OutlineLoader::default();
        assert!(loader.set_document(None).is_none());
        assert!(loader.outline().is_none());
        assert!(loader.reload().is_none());
        assert_eq!(loader.status(), &LoadStatus::Idle);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let mut loader = OutlineLoader::default();
        let first = loader.set_document(Some("a.pdf".into())).unwrap();
        let second = loader.set_document(Some("b.pdf".into())).unwrap();

        let second_response = fetch(second, source(&["B"])).await;
        let first_response = fetch(first, source(&["A"])).await;

        assert!(loader.apply(second_response));
        assert!(!loader.apply(first_response));
        assert_eq!(loader.outline().unwrap()[0].name, "B");
    }

    #[tokio::test]
    async fn clearing_document_invalidates_pending_fetch() {
        let mut loader = OutlineLoader::default();
        let req = loader.set_document(Some("a.pdf".into())).unwrap();
        loader.set_document(None);
        assert!(!loader.apply(fetch(req, source(&["A"])).await));
        assert!(loader.outline().is_none());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_outline() {
        let mut loader = OutlineLoader::default();
        let req = loader.set_document(Some("a.pdf".into())).unwrap();
        loader.apply(fetch(req, source(&["Kept"])).await);

        let broken = Arc::new(FakeSource {
            fail: true,
            ..Default::default()
        });
        let req = loader.reload().unwrap();
        assert!(loader.apply(fetch(req, broken.clone()).await));

        assert_eq!(broken.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.outline().unwrap()[0].name, "Kept");
        assert!(matches!(loader.status(), LoadStatus::Failed(msg) if msg.contains("broken document")));
    }

    #[tokio::test]
    async fn failed_first_fetch_leaves_outline_unset() {
        let mut loader = OutlineLoader::default();
        let req = loader.set_document(Some("a.pdf".into())).unwrap();
        let broken = Arc::new(FakeSource {
            fail: true,
            ..Default::default()
        });
        loader.apply(fetch(req, broken).await);
        assert!(loader.outline().is_none());
    }

    #[tokio::test]
    async fn missing_outline_loads_as_empty() {
        let mut loader = OutlineLoader::default();
        let req = loader.set_document(Some("a.pdf".into())).unwrap();
        loader.apply(fetch(req, Arc::new(FakeSource::default())).await);
        assert_eq!(loader.outline(), Some(&[][..]));
    }

    #[tokio::test]
    async fn too_deep_outline_is_reported_as_failure() {
        let mut raw = RawOutlineNode::titled("leaf");
        for _ in 0..5 {
            raw = RawOutlineNode::titled("x").with_items(vec![raw]);
        }
        let mut loader = OutlineLoader::new(TransformOptions {
            max_depth: 2,
            ..Default::default()
        });
        let req = loader.set_document(Some("deep.pdf".into())).unwrap();
        let src = Arc::new(FakeSource {
            outline: Some(vec![raw]),
            ..Default::default()
        });
        loader.apply(fetch(req, src).await);
        assert!(matches!(loader.status(), LoadStatus::Failed(msg) if msg.contains("deeper than 2")));
    }
}
