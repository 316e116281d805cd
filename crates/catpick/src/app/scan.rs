//! Building the directory description served to the file picker.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::domain::model::TreeNode;
use crate::infra::config::{Config, Ignore};

const CATPICK_IGNORE: &str = ".catpickignore";

/// Inputs for a single scan.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub root: PathBuf,
    /// Deepest level whose entries are listed; root entries are level 0.
    pub max_depth: usize,
    pub max_files: usize,
    pub ignore_extensions: BTreeSet<String>,
    pub show_hidden: bool,
    pub ignore: Ignore,
}

impl ScannerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.scan.base_dir(),
            max_depth: config.scan.max_depth(),
            max_files: config.scan.max_files(),
            ignore_extensions: config.scan.ignore_extensions(),
            show_hidden: config.scan.show_hidden(),
            ignore: config.ignore.clone(),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_files(mut self, files: usize) -> Self {
        self.max_files = files;
        self
    }
}

/// Walks a base directory into a [`TreeNode`] forest.
#[derive(Debug, Default)]
pub struct Scanner;

struct OpenFolder {
    depth: usize,
    name: String,
    path: String,
    children: Vec<TreeNode>,
}

impl Scanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan `cfg.root` in sorted name order.
    ///
    /// Unreadable directories contribute an `error` node in place of their contents. The walk
    /// stops once `max_files` files have been listed.
    pub fn scan(&self, cfg: &ScannerConfig) -> Result<Vec<TreeNode>> {
        let matcher = build_ignore_matcher(&cfg.root, cfg)?;
        let mut builder = WalkBuilder::new(&cfg.root);
        builder
            .standard_filters(false)
            .hidden(!cfg.show_hidden)
            .max_depth(Some(cfg.max_depth + 1))
            .sort_by_file_name(|a, b| a.cmp(b));

        let root = cfg.root.clone();
        let extensions = cfg.ignore_extensions.clone();
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            !matcher.should_skip(rel) && !has_ignored_extension(entry.path(), &extensions)
        });

        let mut top: Vec<TreeNode> = Vec::new();
        let mut stack: Vec<OpenFolder> = Vec::new();
        let mut file_count = 0usize;

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "scanner error");
                    let node = TreeNode::error(error_label(err.io_error()));
                    push_node(&mut top, &mut stack, node);
                    continue;
                }
            };
            let depth = entry.depth();
            if depth == 0 {
                continue;
            }

            close_folders(&mut top, &mut stack, depth);
            if file_count >= cfg.max_files {
                break;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            let path = relative_path(&cfg.root, entry.path());
            if entry.file_type().is_some_and(|kind| kind.is_dir()) {
                stack.push(OpenFolder {
                    depth,
                    name,
                    path,
                    children: Vec::new(),
                });
            } else if entry.path().is_file() {
                push_node(&mut top, &mut stack, TreeNode::file(name, path));
                file_count += 1;
            }
        }

        close_folders(&mut top, &mut stack, 0);
        tracing::debug!(root = %cfg.root.display(), files = file_count, "scan complete");
        Ok(top)
    }
}

/// Attach every open folder at `depth` or deeper to its parent.
fn close_folders(top: &mut Vec<TreeNode>, stack: &mut Vec<OpenFolder>, depth: usize) {
    while stack.last().is_some_and(|folder| folder.depth >= depth) {
        if let Some(folder) = stack.pop() {
            let node = TreeNode::folder(folder.name, folder.path, folder.children);
            push_node(top, stack, node);
        }
    }
}

fn push_node(top: &mut Vec<TreeNode>, stack: &mut [OpenFolder], node: TreeNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

fn error_label(err: Option<&io::Error>) -> String {
    match err.map(io::Error::kind) {
        Some(io::ErrorKind::PermissionDenied) => "Permission denied".to_owned(),
        Some(io::ErrorKind::NotFound) => "Directory not found".to_owned(),
        Some(_) => err.map(ToString::to_string).unwrap_or_default(),
        None => "Unreadable entry".to_owned(),
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn has_ignored_extension(path: &Path, extensions: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&format!(".{}", ext.to_ascii_lowercase())))
}

#[derive(Debug, Clone)]
struct IgnoreMatcher {
    globs: Option<GlobSet>,
}

impl IgnoreMatcher {
    fn should_skip(&self, rel: &Path) -> bool {
        self.globs.as_ref().is_some_and(|set| set.is_match(rel))
    }
}

fn build_ignore_matcher(root: &Path, cfg: &ScannerConfig) -> Result<IgnoreMatcher> {
    let mut builder = GlobSetBuilder::new();

    for pattern in &cfg.ignore.paths {
        for expanded in expand_dir_pattern(pattern) {
            let glob = Glob::new(&expanded).context("invalid ignore path pattern")?;
            builder.add(glob);
        }
    }

    for glob in &cfg.ignore.globs {
        let glob = Glob::new(glob).context("invalid ignore glob")?;
        builder.add(glob);
    }

    for pattern in load_catpickignore(root)? {
        for expanded in expand_dir_pattern(&pattern) {
            let glob = Glob::new(&expanded).context("invalid .catpickignore pattern")?;
            builder.add(glob);
        }
    }

    builder.add(Glob::new(CATPICK_IGNORE)?);

    let globs = builder.build().context("failed to build ignore matcher")?;

    Ok(IgnoreMatcher { globs: Some(globs) })
}

fn expand_dir_pattern(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![
        trimmed.to_owned(),
        format!("{trimmed}/**"),
        format!("**/{trimmed}"),
        format!("**/{trimmed}/**"),
    ]
}

fn load_catpickignore(root: &Path) -> Result<Vec<String>> {
    let path = root.join(CATPICK_IGNORE);
    if !path.is_file() {
        return Ok(Vec::new());
    }

    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut patterns = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        patterns.push(trimmed.to_owned());
    }
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::domain::model::file_paths;

    fn scanner_config(root: &Path) -> ScannerConfig {
        let mut config = Config::default();
        config.ignore.paths.clear();
        ScannerConfig::from_config(&config).with_root(root)
    }

    #[test]
    fn builds_sorted_nested_tree() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("src/util"))?;
        fs::create_dir_all(root.join("docs"))?;
        fs::write(root.join("src/main.rs"), "fn main() {}")?;
        fs::write(root.join("src/util/io.rs"), "")?;
        fs::write(root.join("README.md"), "# hi")?;

        let tree = Scanner::new().scan(&scanner_config(root))?;

        assert_eq!(
            tree,
            vec![
                TreeNode::file("README.md", "README.md"),
                TreeNode::folder("docs", "docs", Vec::new()),
                TreeNode::folder(
                    "src",
                    "src",
                    vec![
                        TreeNode::file("main.rs", "src/main.rs"),
                        TreeNode::folder(
                            "util",
                            "src/util",
                            vec![TreeNode::file("io.rs", "src/util/io.rs")]
                        ),
                    ]
                ),
            ]
        );
        Ok(())
    }

    #[test]
    fn folders_past_max_depth_are_listed_empty() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("a/b/c"))?;
        fs::write(root.join("a/one.txt"), "")?;
        fs::write(root.join("a/b/two.txt"), "")?;
        fs::write(root.join("a/b/c/three.txt"), "")?;

        let tree = Scanner::new().scan(&scanner_config(root).with_max_depth(1))?;

        assert_eq!(file_paths(&tree), vec!["a/one.txt"]);
        let TreeNode::Folder { children, .. } = &tree[0] else {
            panic!("expected folder");
        };
        assert_eq!(children[0], TreeNode::folder("b", "a/b", Vec::new()));
        Ok(())
    }

    #[test]
    fn stops_after_max_files() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
            fs::write(root.join(name), "")?;
        }

        let tree = Scanner::new().scan(&scanner_config(root).with_max_files(2))?;

        assert_eq!(file_paths(&tree), vec!["a.txt", "b.txt"]);
        Ok(())
    }

    #[test]
    fn nothing_is_listed_after_max_files() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::write(root.join("a.txt"), "")?;
        fs::create_dir_all(root.join("b"))?;
        fs::create_dir_all(root.join("c"))?;
        fs::write(root.join("c/inner.txt"), "")?;
        fs::write(root.join("d.txt"), "")?;

        let tree = Scanner::new().scan(&scanner_config(root).with_max_files(1))?;

        assert_eq!(tree, vec![TreeNode::file("a.txt", "a.txt")]);
        Ok(())
    }

    #[test]
    fn skips_ignored_extensions_and_globs() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("generated"))?;
        fs::write(root.join("keep.rs"), "")?;
        fs::write(root.join("debug.LOG"), "")?;
        fs::write(root.join("old.bak"), "")?;
        fs::write(root.join("Cargo.lock"), "")?;
        fs::write(root.join("generated/out.rs"), "")?;
        fs::write(root.join(CATPICK_IGNORE), "generated/\n")?;

        let mut cfg = scanner_config(root);
        cfg.ignore.globs.push("*.lock".into());
        let tree = Scanner::new().scan(&cfg)?;

        assert_eq!(file_paths(&tree), vec!["keep.rs"]);
        assert_eq!(tree.len(), 1);
        Ok(())
    }

    #[test]
    fn missing_root_yields_error_node() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let cfg = scanner_config(&temp.path().join("nope"));

        let tree = Scanner::new().scan(&cfg)?;

        assert_eq!(tree, vec![TreeNode::error("Directory not found")]);
        Ok(())
    }
}
