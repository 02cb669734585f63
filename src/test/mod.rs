use std::fs::DirBuilder;
use std::path::PathBuf;
use tempdir::TempDir;

/// Creates empty `input` and `output` directories below a fresh temp
/// directory and hands them to the test body.
pub fn with_input_and_output_paths(f: impl FnOnce(PathBuf, PathBuf)) {
    let dir = TempDir::new("terratile-test").unwrap();
    let input_path = dir.path().join("input");
    let output_path = dir.path().join("output");
    DirBuilder::new().create(&input_path).unwrap();
    DirBuilder::new().create(&output_path).unwrap();

    f(input_path, output_path);

    dir.close().unwrap();
}
