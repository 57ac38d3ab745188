use super::{
    DEFAULT_MAX_DEPTH, IdScheme, NodePath, OutlineError, RawOutlineNode, UNTITLED, UiOutlineNode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub id_scheme: IdScheme,
    pub max_depth: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            id_scheme: IdScheme::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Converts the raw outline into the tree the viewer and exporter work with. Sibling order and
/// nesting are preserved. A missing outline is the same as an empty one.
pub fn transform_outline(
    raw: Option<&[RawOutlineNode]>,
    options: TransformOptions,
) -> Result<Vec<UiOutlineNode>, OutlineError> {
    match raw {
        Some(items) => transform_level(items, &NodePath::root(), options),
        None => Ok(Vec::new()),
    }
}

fn transform_level(
    items: &[RawOutlineNode],
    parent: &NodePath,
    options: TransformOptions,
) -> Result<Vec<UiOutlineNode>, OutlineError> {
    if parent.depth() >= options.max_depth {
        return Err(OutlineError::TooDeep {
            limit: options.max_depth,
            path: parent.clone(),
        });
    }

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let path = parent.child(idx);
        let children = match item.items.as_deref() {
            Some(children) if !children.is_empty() => transform_level(children, &path, options)?,
            _ => Vec::new(),
        };
        out.push(UiOutlineNode {
            id: node_id(options.id_scheme, idx, &path),
            is_selectable: true,
            name: display_name(item.title.as_deref()),
            children,
            dest: item.dest,
            url: item.url.clone(),
        });
    }
    Ok(out)
}

fn node_id(scheme: IdScheme, idx: usize, path: &NodePath) -> String {
    match scheme {
        IdScheme::Sibling => format!("item-{idx}"),
        IdScheme::Path => path.to_string(),
    }
}

fn display_name(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.is_empty() => t.to_owned(),
        _ => UNTITLED.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::Destination;

    fn scenario_a() -> Vec<RawOutlineNode> {
        vec![
            RawOutlineNode::titled("Ch.1").with_items(vec![]),
            RawOutlineNode::titled("").with_items(vec![RawOutlineNode::titled("Sec 1.1").with_items(vec![])]),
        ]
    }

    #[test]
    fn transforms_nested_outline() {
        let out = transform_outline(Some(&scenario_a()), TransformOptions::default()).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "item-0");
        assert_eq!(out[0].name, "Ch.1");
        assert!(out[0].children.is_empty());
        assert_eq!(out[1].id, "item-1");
        assert_eq!(out[1].name, "Untitled");
        assert_eq!(out[1].children.len(), 1);
        assert_eq!(out[1].children[0].id, "item-0");
        assert_eq!(out[1].children[0].name, "Sec 1.1");
        assert!(out[1].children[0].children.is_empty());
        assert!(out.iter().all(|n| n.is_selectable));
    }

    #[test]
    fn absent_and_empty_input_give_empty_output() {
        assert!(transform_outline(None, TransformOptions::default()).unwrap().is_empty());
        assert!(transform_outline(Some(&[]), TransformOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn missing_title_becomes_untitled() {
        let raw = vec![RawOutlineNode::default(), RawOutlineNode::titled("  ")];
        let out = transform_outline(Some(&raw), TransformOptions::default()).unwrap();
        assert_eq!(out[0].name, UNTITLED);
        // Only empty titles are replaced, whitespace is kept as the document has it
        assert_eq!(out[1].name, "  ");
    }

    #[test]
    fn sibling_ids_restart_at_every_level() {
        let raw = vec![
            RawOutlineNode::titled("a").with_items(vec![
                RawOutlineNode::titled("a0"),
                RawOutlineNode::titled("a1"),
                RawOutlineNode::titled("a2"),
            ]),
            RawOutlineNode::titled("b").with_items(vec![RawOutlineNode::titled("b0")]),
        ];
        let out = transform_outline(Some(&raw), TransformOptions::default()).unwrap();
        let ids: Vec<_> = out[0].children.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["item-0", "item-1", "item-2"]);
        assert_eq!(out[1].children[0].id, "item-0");
    }

    #[test]
    fn path_ids_are_globally_unique() {
        let raw = vec![
            RawOutlineNode::titled("a").with_items(vec![RawOutlineNode::titled("a0")]),
            RawOutlineNode::titled("b").with_items(vec![
                RawOutlineNode::titled("b0").with_items(vec![RawOutlineNode::titled("b00")]),
            ]),
        ];
        let options = TransformOptions {
            id_scheme: IdScheme::Path,
            ..Default::default()
        };
        let out = transform_outline(Some(&raw), options).unwrap();
        assert_eq!(out[0].id, "0");
        assert_eq!(out[0].children[0].id, "0/0");
        assert_eq!(out[1].children[0].id, "1/0");
        assert_eq!(out[1].children[0].children[0].id, "1/0/0");
    }

    #[test]
    fn dest_and_url_are_copied_through() {
        let raw = vec![
            RawOutlineNode::titled("page").with_dest(7),
            RawOutlineNode::titled("web").with_url("https://example.com"),
            RawOutlineNode::titled("none"),
        ];
        let out = transform_outline(Some(&raw), TransformOptions::default()).unwrap();
        assert_eq!(out[0].dest, Some(Destination { page: 7 }));
        assert_eq!(out[0].url, None);
        assert_eq!(out[1].url.as_deref(), Some("https://example.com"));
        assert_eq!(out[2].dest, None);
        assert_eq!(out[2].url, None);
    }

    #[test]
    fn order_and_depth_are_preserved() {
        let raw: Vec<_> = (0..5)
            .map(|i| {
                RawOutlineNode::titled(format!("n{i}"))
                    .with_items((0..i).map(|j| RawOutlineNode::titled(format!("n{i}.{j}"))).collect())
            })
            .collect();
        let out = transform_outline(Some(&raw), TransformOptions::default()).unwrap();
        for (i, node) in out.iter().enumerate() {
            assert_eq!(node.name, format!("n{i}"));
            assert_eq!(node.children.len(), i);
            for (j, child) in node.children.iter().enumerate() {
                assert_eq!(child.name, format!("n{i}.{j}"));
            }
        }
    }

    #[test]
    fn nesting_past_the_limit_fails() {
        let mut raw = RawOutlineNode::titled("leaf");
        for i in 0..10 {
            raw = RawOutlineNode::titled(format!("level {i}")).with_items(vec![raw]);
        }
        let options = TransformOptions {
            max_depth: 4,
            ..Default::default()
        };
        let err = transform_outline(Some(&[raw.clone()]), options).unwrap_err();
        let OutlineError::TooDeep { limit, path } = err;
        assert_eq!(limit, 4);
        assert_eq!(path, NodePath(vec![0, 0, 0, 0]));

        let deep_enough = TransformOptions {
            max_depth: 11,
            ..Default::default()
        };
        assert!(transform_outline(Some(&[raw]), deep_enough).is_ok());
    }
}
