//! Tree rendering into the explorer element arena.
//!
//! The explorer is the widget's document: an ordered tree of elements that mirrors the nested
//! list markup of the file picker. Files become checkbox items, folders become a toggle label
//! followed by a nested list that starts hidden, and error nodes become inert text.

use std::collections::{BTreeSet, HashMap};

use crate::domain::model::TreeNode;

/// Handle to an element inside an [`Explorer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Element variants produced by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// The mount point supplied by the page.
    Container,
    /// A list of items; nested lists start hidden.
    List { visible: bool },
    /// One rendered tree node.
    Item,
    /// File checkbox keyed by the file path.
    Checkbox {
        id: String,
        value: String,
        checked: bool,
    },
    /// Label bound to a checkbox via its generated id.
    Label { html_for: String, text: String },
    /// Clickable folder label.
    FolderToggle { text: String },
    /// Inert text.
    Text(String),
}

#[derive(Debug, Clone)]
struct Element {
    kind: ElementKind,
    classes: BTreeSet<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One visible line of the explorer, used by front ends to draw the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub item: NodeId,
    pub depth: usize,
    pub kind: RowKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    File {
        checkbox: NodeId,
        label: String,
        checked: bool,
    },
    Folder {
        toggle: NodeId,
        label: String,
        expanded: bool,
        has_children: bool,
    },
    Error(String),
}

/// In-memory document holding the rendered file tree.
#[derive(Debug, Clone)]
pub struct Explorer {
    elements: Vec<Element>,
    root: NodeId,
    /// Folder toggles that carry a click binding, mapped to the list they reveal.
    toggles: HashMap<NodeId, NodeId>,
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Explorer {
    /// Create an explorer holding only the empty mount point.
    pub fn new() -> Self {
        let mut explorer = Self {
            elements: Vec::new(),
            root: NodeId(0),
            toggles: HashMap::new(),
        };
        explorer.root = explorer.create(ElementKind::Container, None);
        explorer
    }

    /// The mount point element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Render `nodes` as a list appended to `mount`, returning the created list.
    pub fn render(&mut self, nodes: &[TreeNode], mount: NodeId) -> NodeId {
        self.render_list(nodes, mount, "")
    }

    fn render_list(&mut self, nodes: &[TreeNode], parent: NodeId, current_path: &str) -> NodeId {
        let list = self.create(ElementKind::List { visible: true }, Some(parent));
        for node in nodes {
            let item = self.create(ElementKind::Item, Some(list));
            self.add_class(item, node.kind());

            match node {
                TreeNode::File { name, path } => {
                    let id = checkbox_id(current_path, name);
                    self.create(
                        ElementKind::Checkbox {
                            id: id.clone(),
                            value: path.clone(),
                            checked: false,
                        },
                        Some(item),
                    );
                    self.create(
                        ElementKind::Label {
                            html_for: id,
                            text: name.clone(),
                        },
                        Some(item),
                    );
                }
                TreeNode::Folder {
                    name,
                    path,
                    children,
                } => {
                    let toggle =
                        self.create(ElementKind::FolderToggle { text: name.clone() }, Some(item));
                    self.add_class(toggle, "folder-toggle");
                    if !children.is_empty() {
                        let nested = self.render_list(children, item, path);
                        self.set_list_visible(nested, false);
                        self.toggles.insert(toggle, nested);
                    }
                }
                TreeNode::Error { name } => {
                    self.create(ElementKind::Text(name.clone()), Some(item));
                }
            }
        }
        list
    }

    /// Handle a click on a folder label. Folders without children have no binding.
    ///
    /// Returns whether the nested list is now visible.
    pub fn click_folder(&mut self, toggle: NodeId) -> Option<bool> {
        let nested = *self.toggles.get(&toggle)?;
        let open = !self.is_list_visible(nested);
        self.set_list_visible(nested, open);
        if open {
            self.add_class(toggle, "open");
        } else {
            self.remove_class(toggle, "open");
        }
        Some(open)
    }

    pub fn kind(&self, id: NodeId) -> Option<&ElementKind> {
        self.elements.get(id.0).map(|element| &element.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.elements.get(id.0).and_then(|element| element.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.elements
            .get(id.0)
            .map(|element| element.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.elements
            .get(id.0)
            .is_some_and(|element| element.classes.contains(class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(element) = self.elements.get_mut(id.0) {
            element.classes.insert(class.to_owned());
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(element) = self.elements.get_mut(id.0) {
            element.classes.remove(class);
        }
    }

    pub fn is_list_visible(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(ElementKind::List { visible: true }))
    }

    pub fn set_list_visible(&mut self, id: NodeId, value: bool) {
        if let Some(Element {
            kind: ElementKind::List { visible },
            ..
        }) = self.elements.get_mut(id.0)
        {
            *visible = value;
        }
    }

    /// First list element directly below `item`, if any.
    pub fn nested_list(&self, item: NodeId) -> Option<NodeId> {
        self.children(item)
            .iter()
            .copied()
            .find(|child| matches!(self.kind(*child), Some(ElementKind::List { .. })))
    }

    /// All elements below `scope` in document order.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Checkboxes below `scope` in document order.
    pub fn checkboxes(&self, scope: NodeId) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| matches!(self.kind(*id), Some(ElementKind::Checkbox { .. })))
            .collect()
    }

    /// Folder toggles below `scope` in document order.
    pub fn folder_toggles(&self, scope: NodeId) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| matches!(self.kind(*id), Some(ElementKind::FolderToggle { .. })))
            .collect()
    }

    /// First checkbox whose value equals `value`.
    pub fn checkbox_by_value(&self, value: &str) -> Option<NodeId> {
        self.checkboxes(self.root).into_iter().find(|id| {
            matches!(self.kind(*id), Some(ElementKind::Checkbox { value: v, .. }) if v == value)
        })
    }

    pub fn checkbox_value(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(ElementKind::Checkbox { value, .. }) => Some(value),
            _ => None,
        }
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            Some(ElementKind::Checkbox { checked: true, .. })
        )
    }

    pub fn set_checked(&mut self, id: NodeId, value: bool) {
        if let Some(Element {
            kind: ElementKind::Checkbox { checked, .. },
            ..
        }) = self.elements.get_mut(id.0)
        {
            *checked = value;
        }
    }

    /// Values of every checkbox in document order.
    pub fn file_values(&self) -> Vec<String> {
        self.checkboxes(self.root)
            .into_iter()
            .filter_map(|id| self.checkbox_value(id).map(str::to_owned))
            .collect()
    }

    /// Values of the checked checkboxes in document order.
    pub fn checked_values(&self) -> Vec<String> {
        self.checkboxes(self.root)
            .into_iter()
            .filter(|id| self.is_checked(*id))
            .filter_map(|id| self.checkbox_value(id).map(str::to_owned))
            .collect()
    }

    /// Rows currently visible, skipping the contents of hidden lists.
    pub fn visible_rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for list in self.children(self.root) {
            self.collect_rows(*list, 0, &mut rows);
        }
        rows
    }

    fn collect_rows(&self, list: NodeId, depth: usize, rows: &mut Vec<Row>) {
        if !self.is_list_visible(list) {
            return;
        }
        for item in self.children(list) {
            let item = *item;
            let mut nested = None;
            for child in self.children(item) {
                match self.kind(*child) {
                    Some(ElementKind::Checkbox { checked, .. }) => {
                        let label = self
                            .children(item)
                            .iter()
                            .find_map(|sibling| match self.kind(*sibling) {
                                Some(ElementKind::Label { text, .. }) => Some(text.clone()),
                                _ => None,
                            })
                            .unwrap_or_default();
                        rows.push(Row {
                            item,
                            depth,
                            kind: RowKind::File {
                                checkbox: *child,
                                label,
                                checked: *checked,
                            },
                        });
                    }
                    Some(ElementKind::FolderToggle { text }) => {
                        let list = self.nested_list(item);
                        rows.push(Row {
                            item,
                            depth,
                            kind: RowKind::Folder {
                                toggle: *child,
                                label: text.clone(),
                                expanded: list.is_some_and(|list| self.is_list_visible(list)),
                                has_children: list.is_some(),
                            },
                        });
                        nested = list;
                    }
                    Some(ElementKind::Text(text)) => rows.push(Row {
                        item,
                        depth,
                        kind: RowKind::Error(text.clone()),
                    }),
                    _ => {}
                }
            }
            if let Some(list) = nested {
                self.collect_rows(list, depth + 1, rows);
            }
        }
    }

    fn create(&mut self, kind: ElementKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.elements.len());
        self.elements.push(Element {
            kind,
            classes: BTreeSet::new(),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent
            && let Some(element) = self.elements.get_mut(parent.0)
        {
            element.children.push(id);
        }
        id
    }
}

/// Stable checkbox id derived from the accumulated folder path and the file name.
fn checkbox_id(current_path: &str, name: &str) -> String {
    format!("file-{current_path}/{name}").replace('/', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::model::file_paths;

    fn sample_tree() -> Vec<TreeNode> {
        vec![
            TreeNode::folder(
                "src",
                "src",
                vec![
                    TreeNode::file("main.rs", "src/main.rs"),
                    TreeNode::folder("util", "src/util", vec![TreeNode::file("io.rs", "src/util/io.rs")]),
                ],
            ),
            TreeNode::folder("empty", "empty", Vec::new()),
            TreeNode::error("Permission denied"),
            TreeNode::file("README.md", "README.md"),
        ]
    }

    #[test]
    fn rendered_files_follow_tree_pre_order() {
        let tree = sample_tree();
        let mut explorer = Explorer::new();
        let root = explorer.root();
        explorer.render(&tree, root);

        assert_eq!(explorer.file_values(), file_paths(&tree));
    }

    #[test]
    fn checkbox_ids_are_stable_across_renders() {
        let tree = sample_tree();
        let ids = |explorer: &Explorer| -> Vec<String> {
            explorer
                .checkboxes(explorer.root())
                .into_iter()
                .filter_map(|id| match explorer.kind(id) {
                    Some(ElementKind::Checkbox { id, .. }) => Some(id.clone()),
                    _ => None,
                })
                .collect()
        };

        let mut first = Explorer::new();
        let root = first.root();
        first.render(&tree, root);
        let mut second = Explorer::new();
        let root = second.root();
        second.render(&tree, root);

        assert_eq!(ids(&first), ids(&second));
        assert_eq!(
            ids(&first),
            vec!["file-src-main.rs", "file-src-util-io.rs", "file--README.md"]
        );
    }

    #[test]
    fn labels_are_bound_to_checkboxes() {
        let mut explorer = Explorer::new();
        let root = explorer.root();
        explorer.render(&[TreeNode::file("a.txt", "a.txt")], root);

        let checkbox = explorer.checkbox_by_value("a.txt").unwrap();
        let item = explorer.parent(checkbox).unwrap();
        assert!(explorer.has_class(item, "file"));
        let label = explorer.children(item)[1];
        assert_eq!(
            explorer.kind(label),
            Some(&ElementKind::Label {
                html_for: "file--a.txt".into(),
                text: "a.txt".into()
            })
        );
    }

    #[test]
    fn nested_lists_start_hidden_and_toggle_on_click() {
        let mut explorer = Explorer::new();
        let root = explorer.root();
        explorer.render(&sample_tree(), root);

        let src = explorer.folder_toggles(root)[0];
        let item = explorer.parent(src).unwrap();
        let nested = explorer.nested_list(item).unwrap();
        assert!(!explorer.is_list_visible(nested));

        assert_eq!(explorer.click_folder(src), Some(true));
        assert!(explorer.is_list_visible(nested));
        assert!(explorer.has_class(src, "open"));

        assert_eq!(explorer.click_folder(src), Some(false));
        assert!(!explorer.is_list_visible(nested));
        assert!(!explorer.has_class(src, "open"));
    }

    #[test]
    fn empty_folders_have_no_nested_list_or_binding() {
        let mut explorer = Explorer::new();
        let root = explorer.root();
        explorer.render(&sample_tree(), root);

        let empty = explorer.folder_toggles(root)[2];
        assert_eq!(
            explorer.kind(empty),
            Some(&ElementKind::FolderToggle {
                text: "empty".into()
            })
        );
        assert!(explorer.nested_list(explorer.parent(empty).unwrap()).is_none());
        assert_eq!(explorer.click_folder(empty), None);
    }

    #[test]
    fn error_nodes_render_as_inert_text() {
        let mut explorer = Explorer::new();
        let root = explorer.root();
        explorer.render(&[TreeNode::error("Directory not found")], root);

        assert!(explorer.checkboxes(root).is_empty());
        assert!(explorer.folder_toggles(root).is_empty());
        let rows = explorer.visible_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, RowKind::Error("Directory not found".into()));
        assert!(explorer.has_class(rows[0].item, "error"));
    }

    #[test]
    fn visible_rows_skip_collapsed_folders() {
        let mut explorer = Explorer::new();
        let root = explorer.root();
        explorer.render(&sample_tree(), root);

        assert_eq!(explorer.visible_rows().len(), 4);

        let src = explorer.folder_toggles(root)[0];
        explorer.click_folder(src);
        let rows = explorer.visible_rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[1].depth, 1);
        assert!(matches!(
            &rows[0].kind,
            RowKind::Folder { expanded: true, has_children: true, .. }
        ));
    }
}
