//! Domain models for the directory tree, selections, and submissions.

use serde::{Deserialize, Serialize};

/// One node of the server-supplied directory description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    File {
        name: String,
        path: String,
    },
    Folder {
        name: String,
        #[serde(default)]
        path: String,
        #[serde(default)]
        children: Vec<TreeNode>,
    },
    /// Inert message node; never selectable and never has children.
    Error { name: String },
}

impl TreeNode {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        TreeNode::File {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn folder(
        name: impl Into<String>,
        path: impl Into<String>,
        children: Vec<TreeNode>,
    ) -> Self {
        TreeNode::Folder {
            name: name.into(),
            path: path.into(),
            children,
        }
    }

    pub fn error(name: impl Into<String>) -> Self {
        TreeNode::Error { name: name.into() }
    }

    /// Display label of the node.
    pub fn name(&self) -> &str {
        match self {
            TreeNode::File { name, .. }
            | TreeNode::Folder { name, .. }
            | TreeNode::Error { name } => name,
        }
    }

    /// Class name the renderer attaches to the node's list item.
    pub fn kind(&self) -> &'static str {
        match self {
            TreeNode::File { .. } => "file",
            TreeNode::Folder { .. } => "folder",
            TreeNode::Error { .. } => "error",
        }
    }
}

/// Collect every `file` path of the tree in pre-order.
pub fn file_paths(nodes: &[TreeNode]) -> Vec<String> {
    let mut paths = Vec::new();
    collect_file_paths(nodes, &mut paths);
    paths
}

fn collect_file_paths(nodes: &[TreeNode], out: &mut Vec<String>) {
    for node in nodes {
        match node {
            TreeNode::File { path, .. } => out.push(path.clone()),
            TreeNode::Folder { children, .. } => collect_file_paths(children, out),
            TreeNode::Error { .. } => {}
        }
    }
}

/// Ordered, duplicate-free collection of selected file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SelectionSet {
    paths: Vec<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|existing| existing == path)
    }

    /// Append `path` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Remove every occurrence of `path`. Returns whether anything was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.paths.len();
        self.paths.retain(|existing| existing != path);
        self.paths.len() != before
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }
}

impl From<Vec<String>> for SelectionSet {
    fn from(paths: Vec<String>) -> Self {
        paths.into_iter().collect()
    }
}

impl From<SelectionSet> for Vec<String> {
    fn from(set: SelectionSet) -> Self {
        set.paths
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SelectionSet::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

/// Selected files plus the formatting flag sent to a server action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub selected_files: Vec<String>,
    pub include_line_numbers: bool,
}

impl SubmissionPayload {
    /// Form fields in submission order: one `selected_files` entry per path, then the flag.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = self
            .selected_files
            .iter()
            .map(|path| ("selected_files", path.clone()))
            .collect();
        fields.push((
            "include_line_numbers",
            self.include_line_numbers.to_string(),
        ));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_server_tree() {
        let json = r#"[
            {"type": "folder", "name": "src", "path": "src", "children": [
                {"type": "file", "name": "main.rs", "path": "src/main.rs"}
            ]},
            {"type": "folder", "name": "empty", "children": []},
            {"type": "error", "name": "Permission denied"}
        ]"#;
        let nodes: Vec<TreeNode> = serde_json::from_str(json).unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].kind(), "folder");
        assert_eq!(nodes[1], TreeNode::folder("empty", "", Vec::new()));
        assert_eq!(nodes[2], TreeNode::error("Permission denied"));
        assert_eq!(file_paths(&nodes), vec!["src/main.rs".to_string()]);
    }

    #[test]
    fn file_paths_follow_pre_order() {
        let tree = vec![
            TreeNode::file("z.txt", "z.txt"),
            TreeNode::folder(
                "a",
                "a",
                vec![
                    TreeNode::folder("b", "a/b", vec![TreeNode::file("c.txt", "a/b/c.txt")]),
                    TreeNode::file("d.txt", "a/d.txt"),
                ],
            ),
            TreeNode::error("Directory not found"),
            TreeNode::file("e.txt", "e.txt"),
        ];
        assert_eq!(
            file_paths(&tree),
            vec!["z.txt", "a/b/c.txt", "a/d.txt", "e.txt"]
        );
    }

    #[test]
    fn selection_set_rejects_duplicates() {
        let mut set = SelectionSet::new();
        assert!(set.insert("a.txt"));
        assert!(!set.insert("a.txt"));
        assert!(set.insert("b.txt"));
        assert_eq!(set.as_slice(), ["a.txt", "b.txt"]);

        assert!(set.remove("a.txt"));
        assert!(!set.remove("a.txt"));
        assert_eq!(set.as_slice(), ["b.txt"]);
    }

    #[test]
    fn selection_set_deduplicates_when_deserialized() {
        let set: SelectionSet = serde_json::from_str(r#"["a", "b", "a"]"#).unwrap();
        assert_eq!(set.as_slice(), ["a", "b"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn payload_fields_repeat_selected_files() {
        let payload = SubmissionPayload {
            selected_files: vec!["src/main.js".into(), "src/util.js".into()],
            include_line_numbers: true,
        };
        assert_eq!(
            payload.form_fields(),
            vec![
                ("selected_files", "src/main.js".to_string()),
                ("selected_files", "src/util.js".to_string()),
                ("include_line_numbers", "true".to_string()),
            ]
        );
    }
}
