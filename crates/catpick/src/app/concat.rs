//! Joining the selected files into a single text bundle.

use std::fmt::Write as _;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::domain::errors::ConcatError;

/// Name and full contents of one file handed to the AI result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileData {
    pub name: String,
    pub contents: String,
}

/// Concatenate `files` below `base_dir` in request order.
///
/// Each file gets a `--- path ---` header followed by its lines and a blank separator. Missing
/// or unreadable files leave a message in their place instead of failing the whole bundle.
pub fn concatenate(base_dir: &Path, files: &[String], include_line_numbers: bool) -> String {
    let mut content = String::new();
    for file in files {
        let Some(path) = resolve(base_dir, file) else {
            let _ = write!(content, "File not found: {file}\n\n");
            continue;
        };

        let _ = writeln!(content, "--- {file} ---");
        match fs::read(&path) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                for (index, line) in text.lines().enumerate() {
                    if include_line_numbers {
                        let _ = writeln!(content, "{:4} | {line}", index + 1);
                    } else {
                        let _ = writeln!(content, "{line}");
                    }
                }
                content.push_str("\n\n");
            }
            Err(err) => {
                tracing::warn!(file, error = %err, "failed to read selected file");
                let _ = write!(content, "Error reading file {file}: {err}\n\n");
            }
        }
    }
    content
}

/// Load every file of `files` whole. The first missing file aborts the collection.
pub fn collect_for_ai(base_dir: &Path, files: &[String]) -> Result<Vec<FileData>, ConcatError> {
    if files.is_empty() {
        return Err(ConcatError::NoFiles);
    }

    let mut collected = Vec::with_capacity(files.len());
    for file in files {
        let path = resolve(base_dir, file).ok_or_else(|| ConcatError::NotFound(file.clone()))?;
        let bytes = fs::read(&path).map_err(|_| ConcatError::NotFound(file.clone()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.clone());
        collected.push(FileData {
            name,
            contents: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    Ok(collected)
}

/// Resolve a requested relative path to an existing file inside `base_dir`.
fn resolve(base_dir: &Path, file: &str) -> Option<PathBuf> {
    let relative = Path::new(file);
    let escapes = relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if escapes || file.is_empty() {
        return None;
    }
    let path = base_dir.join(relative);
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;

    fn files(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|path| path.to_string()).collect()
    }

    #[test]
    fn concatenates_with_headers_and_separators() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("src"))?;
        fs::write(temp.path().join("a.txt"), "alpha\nbeta\n")?;
        fs::write(temp.path().join("src/b.rs"), "fn b() {}")?;

        let content = concatenate(temp.path(), &files(&["src/b.rs", "a.txt"]), false);

        assert_eq!(
            content,
            "--- src/b.rs ---\nfn b() {}\n\n\n--- a.txt ---\nalpha\nbeta\n\n\n"
        );
        Ok(())
    }

    #[test]
    fn numbers_lines_right_aligned() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let body: String = (1..=10).map(|n| format!("l{n}\n")).collect();
        fs::write(temp.path().join("n.txt"), body)?;

        let content = concatenate(temp.path(), &files(&["n.txt"]), true);

        assert!(content.starts_with("--- n.txt ---\n   1 | l1\n"));
        assert!(content.contains("  10 | l10\n"));
        Ok(())
    }

    #[test]
    fn missing_and_escaping_paths_are_reported_inline() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::write(temp.path().join("ok.txt"), "ok")?;

        let content = concatenate(
            temp.path(),
            &files(&["gone.txt", "../ok.txt", "ok.txt"]),
            false,
        );

        assert_eq!(
            content,
            "File not found: gone.txt\n\nFile not found: ../ok.txt\n\n--- ok.txt ---\nok\n\n\n"
        );
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_replaced() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::write(temp.path().join("bin"), [b'a', 0xff, b'b'])?;

        let content = concatenate(temp.path(), &files(&["bin"]), false);

        assert!(content.contains("a\u{fffd}b\n"));
        Ok(())
    }

    #[test]
    fn collect_for_ai_uses_file_names() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("src"))?;
        fs::write(temp.path().join("src/lib.rs"), "pub mod a;\n")?;

        let data = collect_for_ai(temp.path(), &files(&["src/lib.rs"]))?;

        assert_eq!(
            data,
            vec![FileData {
                name: "lib.rs".into(),
                contents: "pub mod a;\n".into(),
            }]
        );
        Ok(())
    }

    #[test]
    fn collect_for_ai_stops_at_first_missing_file() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::write(temp.path().join("a"), "")?;

        let err = collect_for_ai(temp.path(), &files(&["a", "b", "c"])).unwrap_err();
        assert_eq!(err, ConcatError::NotFound("b".into()));
        assert_eq!(err.to_string(), "File not found: b");

        let err = collect_for_ai(temp.path(), &[]).unwrap_err();
        assert_eq!(err, ConcatError::NoFiles);
        Ok(())
    }
}
