use std::fs;

use catpick::app::concat;
use insta::assert_snapshot;

#[test]
fn numbered_concatenation_renders() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(temp.path().join("src")).unwrap();
    fs::write(
        temp.path().join("src/lib.rs"),
        "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n",
    )
    .unwrap();
    fs::write(temp.path().join("notes.txt"), "first\nsecond\n").unwrap();

    let files = vec![
        "src/lib.rs".to_string(),
        "missing.md".to_string(),
        "notes.txt".to_string(),
    ];
    let rendered = concat::concatenate(temp.path(), &files, true);

    assert_snapshot!("numbered_concatenation", rendered.trim_end());
}
