//! Structural views: tree listing and file diffs.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::error::FsResult;
use crate::links::Follow;
use crate::path::{self, ROOT};
use crate::storage::Node;
use crate::types::NodeType;
use crate::vfs::FsState;

/// One node of a rendered directory tree.
///
/// Serializes as `{"name": .., "type": .., "children": [..]}`, with
/// `children` present only for directories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    fn leaf(name: &str, kind: NodeType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            children: None,
        }
    }

    fn directory(name: &str, mut children: Vec<TreeNode>) -> Self {
        // directories first, then everything else; names ascending within each group
        children.sort_by(|a, b| {
            (a.kind != NodeType::Directory)
                .cmp(&(b.kind != NodeType::Directory))
                .then_with(|| a.name.cmp(&b.name))
        });
        Self {
            name: name.to_string(),
            kind: NodeType::Directory,
            children: Some(children),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeType::Directory
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Indented listing, one entry per line, directories marked with a
/// trailing `/`.
impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack: Vec<(&TreeNode, usize)> = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            let marker = if node.is_dir() && node.name != ROOT { "/" } else { "" };
            writeln!(f, "{:indent$}{}{}", "", node.name, marker, indent = depth * 2)?;
            if let Some(children) = &node.children {
                stack.extend(children.iter().rev().map(|child| (child, depth + 1)));
            }
        }
        Ok(())
    }
}

impl FsState {
    pub(crate) fn tree(&self, path: &str) -> FsResult<TreeNode> {
        let (root, node) = self.lookup(path, Follow::All)?;
        let root_name = if path::is_root(&root) { ROOT } else { path::basename(&root) };
        if !node.is_dir() {
            return Ok(TreeNode::leaf(root_name, node.kind()));
        }

        // Deepest entries first, so every directory's children are complete
        // by the time the directory itself is assembled.
        let mut entries: Vec<(&str, &Node)> = self.ns.descendants(&root).collect();
        entries.sort_by_key(|(p, _)| Reverse(path::segments(p).count()));

        let mut pending: HashMap<&str, Vec<TreeNode>> = HashMap::new();
        for (p, node) in entries {
            let name = path::basename(p);
            let built = if node.is_dir() {
                TreeNode::directory(name, pending.remove(p).unwrap_or_default())
            } else {
                TreeNode::leaf(name, node.kind())
            };
            if let Some(parent) = path::parent_of(p) {
                pending.entry(parent).or_default().push(built);
            }
        }

        let children = pending.remove(root.as_str()).unwrap_or_default();
        Ok(TreeNode::directory(root_name, children))
    }

    pub(crate) fn diff(&self, a: &str, b: &str) -> FsResult<String> {
        let (left_path, left) = self.readable_content(a)?;
        let (right_path, right) = self.readable_content(b)?;
        if left == right {
            return Ok(String::new());
        }

        let old = String::from_utf8_lossy(left);
        let new = String::from_utf8_lossy(right);
        let diff = TextDiff::from_lines(&*old, &*new);

        let mut out = format!("--- {}\n+++ {}\n", left_path, right_path);
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            out.push_str(&format!("{}{}", sign, change));
        }
        Ok(out)
    }
}
