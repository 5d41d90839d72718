use std::{fs, path::Path};

use omlink_core::{
    DiagSeverity, LinkOptions, check_paths, diag::has_errors, format_path, link_paths,
};
use tempfile::tempdir;

fn write_file(path: impl AsRef<Path>, text: &str) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, text).expect("write file");
}

#[test]
fn links_files_and_writes_output() {
    let temp = tempdir().expect("create tempdir");
    write_file(
        temp.path().join("top.om"),
        "module @top {\n  hw.module.extern @Core(in clk: i1)\n  hw.module @Soc(in clk: i1) {\n    hw.instance(%clk) [module = @Core]\n  }\n}\n",
    );
    write_file(
        temp.path().join("lib/core.om"),
        "module @core {\n  hw.module private @Core(in clk: i1) {}\n}\n",
    );

    let out_path = temp.path().join("linked.om");
    let inputs = vec![temp.path().join("top.om"), temp.path().join("lib/core.om")];
    let output = link_paths(&inputs, Some(out_path.as_path()), &LinkOptions { jobs: 2 })
        .expect("link should succeed");

    let written = fs::read_to_string(&out_path).expect("read linked output");
    assert_eq!(written, output.text);
    assert_eq!(
        written,
        "module {\n  hw.module @Soc(in clk: i1) {\n    hw.instance(%clk) [module = @Core]\n  }\n  hw.module private @Core(in clk: i1) {}\n}\n"
    );
    assert!(output.warnings.diags.is_empty());
}

#[test]
fn check_reports_link_errors() {
    let temp = tempdir().expect("create tempdir");
    write_file(
        temp.path().join("a.om"),
        "module {\n  extern class @Config(%w: i8) {\n    field @width: i8\n  }\n}\n",
    );
    write_file(
        temp.path().join("b.om"),
        "module {\n  class @Config(%w: i8) {\n    field @depth: i8 = %w\n  }\n}\n",
    );

    let inputs = vec![temp.path().join("a.om"), temp.path().join("b.om")];
    let diags = check_paths(&inputs, &LinkOptions::default()).expect_err("check should fail");

    assert!(has_errors(&diags));
    assert_eq!(
        diags[0].message,
        "failed to link class Config since declaration doesn't match the definition: declaration has a field width but not found in its definition"
    );
}

#[test]
fn check_passes_with_dropped_entry_warnings() {
    let temp = tempdir().expect("create tempdir");
    write_file(
        temp.path().join("a.om"),
        "module {\n  sv.verbatim() [text = \"// header\"]\n  class @A() {}\n}\n",
    );

    let warnings = check_paths(&[temp.path().join("a.om")], &LinkOptions::default())
        .expect("check should pass");
    assert_eq!(warnings.diags.len(), 1);
    assert_eq!(warnings.diags[0].severity, DiagSeverity::Warning);
    assert_eq!(
        warnings.diags[0].message,
        "`sv.verbatim` is neither a class nor an hw.module and is dropped"
    );
}

#[test]
fn missing_input_file_is_a_diagnostic() {
    let temp = tempdir().expect("create tempdir");
    let inputs = vec![temp.path().join("absent.om")];

    let diags = check_paths(&inputs, &LinkOptions::default()).expect_err("check should fail");
    assert!(diags[0].message.starts_with("failed to read input file"));
}

#[test]
fn failed_link_writes_nothing() {
    let temp = tempdir().expect("create tempdir");
    write_file(
        temp.path().join("a.om"),
        "module {\n  hw.module @Top() {}\n}\nmodule {\n  hw.module @Top() {}\n}\n",
    );

    let out_path = temp.path().join("out.om");
    let result = link_paths(
        &[temp.path().join("a.om")],
        Some(out_path.as_path()),
        &LinkOptions::default(),
    );

    assert!(result.is_err());
    assert!(!out_path.exists());
}

#[test]
fn formats_a_file() {
    let temp = tempdir().expect("create tempdir");
    write_file(
        temp.path().join("messy.om"),
        "module{class @A(%x:i1){field @x:i1=%x}}\n",
    );

    let formatted = format_path(&temp.path().join("messy.om")).expect("format");
    assert_eq!(
        formatted,
        "module {\n  class @A(%x: i1) {\n    field @x: i1 = %x\n  }\n}\n"
    );
}
