// Whole-tree compilation tests over scratch project directories.

use miette::{GraphicalReportHandler, GraphicalTheme, Report};
use resource_compiler::{compile, CompileError, CompileOptions, Compiler, ResourceBundle};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn compile_ok(root: &Path) -> ResourceBundle {
    match compile(root) {
        Ok(bundle) => bundle,
        Err(err) => panic!("{:?}", Report::new(err)),
    }
}

fn paths(bundle: &ResourceBundle) -> Vec<(String, usize)> {
    bundle
        .origins()
        .iter()
        .map(|o| (o.path.clone(), o.document))
        .collect()
}

#[test]
fn test_compiling_twice_gives_the_same_bundle() {
    let dir = project(&[
        ("z.yaml", "name: z\n"),
        ("b/two.yml", "name: b1\n---\nname: b2\n"),
        ("a.yaml", "name: a\n"),
        ("b/a/one.yaml", "name: ba\n"),
    ]);
    let first = compile_ok(dir.path());
    let second = compile_ok(dir.path());
    assert_eq!(first, second);
    assert_eq!(
        paths(&first),
        [
            ("a.yaml".to_string(), 1),
            ("b/a/one.yaml".to_string(), 1),
            ("b/two.yml".to_string(), 1),
            ("b/two.yml".to_string(), 2),
            ("z.yaml".to_string(), 1),
        ]
    );
}

#[test]
fn test_specs_and_origins_describe_the_same_document() {
    let dir = project(&[
        ("one.yaml", "file: one.yaml\ndoc: 1\n---\nfile: one.yaml\ndoc: 2\n"),
        ("sub/two.yaml", "file: sub/two.yaml\ndoc: 1\n"),
    ]);
    let bundle = compile_ok(dir.path());
    assert_eq!(bundle.specs().len(), bundle.origins().len());
    for (origin, spec) in bundle.iter() {
        let json = serde_json::to_value(spec).unwrap();
        assert_eq!(json["file"], origin.path.as_str());
        assert_eq!(json["doc"], origin.document);
    }
}

#[test]
fn test_ignore_file_is_honored() {
    let files = [
        ("a/b/c.yaml", "x: 1\n"),
        ("a/d.yaml", "x: 2\n"),
        ("e.yaml", "x: 3\n"),
    ];

    let dir = project(&[files[0], files[1], files[2], (".evcli-ignore", "b/\n")]);
    assert_eq!(
        paths(&compile_ok(dir.path())),
        [("a/d.yaml".to_string(), 1), ("e.yaml".to_string(), 1)]
    );

    let dir = project(&[files[0], files[1], files[2], (".evcli-ignore", "/a/b/c.yaml\n")]);
    assert_eq!(compile_ok(dir.path()).len(), 2);

    let dir = project(&[files[0], files[1], files[2], (".evcli-ignore", "*.yaml\n")]);
    assert!(compile_ok(dir.path()).is_empty());
}

#[test]
fn test_extra_ignore_patterns_from_options() {
    let dir = project(&[("keep.yaml", "x: 1\n"), ("tmp/skip.yaml", "x: 2\n")]);
    let compiler = Compiler::new(dir.path())
        .with_options(CompileOptions::default().with_extra_ignore("tmp/"));
    assert_eq!(compiler.find_files().unwrap(), ["keep.yaml"]);
    assert_eq!(compiler.compile().unwrap().len(), 1);
}

#[test]
fn test_custom_ignore_file_name() {
    let dir = project(&[("a.yaml", "x: 1\n"), ("b.yaml", "x: 2\n"), ("ignored.txt", "/b.yaml\n")]);
    let compiler = Compiler::new(dir.path())
        .with_options(CompileOptions::default().with_ignore_file("ignored.txt"));
    assert_eq!(compiler.find_files().unwrap(), ["a.yaml"]);
}

#[test]
fn test_integer_key_aborts_the_whole_compilation() {
    let dir = project(&[
        ("a.yaml", "name: fine\n"),
        ("b.yaml", "name: fine\n---\ndata:\n  1: one\n"),
        ("c.yaml", "name: never reached\n"),
    ]);
    let err = compile(dir.path()).unwrap_err();
    match &err {
        CompileError::Normalize { path, document, .. } => {
            assert_eq!(path, "b.yaml");
            assert_eq!(*document, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "b.yaml: document 2 is not a valid json value");
}

#[test]
fn test_syntax_error_aborts_and_renders_with_source() {
    let dir = project(&[("ok.yaml", "a: 1\n"), ("bad.yaml", "a: 1\n---\nb: [1, 2\n")]);
    let err = compile(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Syntax { ref path, document: 2, .. } if path == "bad.yaml"
    ));

    let mut rendered = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .render_report(&mut rendered, &err)
        .unwrap();
    assert!(rendered.contains("bad.yaml"), "{rendered}");
}

#[test]
fn test_invalid_ignore_pattern_is_reported() {
    let dir = project(&[("a.yaml", "x: 1\n"), (".evcli-ignore", "ok/\n{unclosed\n")]);
    let err = compile(dir.path()).unwrap_err();
    match err {
        CompileError::Ignore(resource_compiler::error::IgnoreError::InvalidPattern {
            line, pattern, ..
        }) => {
            assert_eq!(line, 2);
            assert_eq!(pattern, "{unclosed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_task_sources_are_inlined_from_the_root() {
    let dir = project(&[
        ("scripts/hello.sh", "echo hello\n"),
        (
            "tasks/nested/hello.yaml",
            "type: task\nname: hello\ndata:\n  steps:\n    - source: scripts/hello.sh\n",
        ),
    ]);
    let bundle = compile_ok(dir.path());
    let json = serde_json::to_value(&bundle).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "specs": [{
                "type": "task",
                "name": "hello",
                "data": {"steps": [{"source": "scripts/hello.sh", "code": "echo hello\n"}]}
            }]
        })
    );
}

#[test]
fn test_missing_task_source_names_the_document() {
    let dir = project(&[(
        "task.yaml",
        "type: command\n---\ntype: task\ndata:\n  steps:\n    - source: gone.sh\n",
    )]);
    let err = compile(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::SourceUnreadable { ref path, document: 2, .. } if path == "task.yaml"
    ));
    assert!(err
        .to_string()
        .starts_with("task.yaml: cannot load task source for document 2"));
}

#[test]
fn test_empty_project() {
    let dir = project(&[("README.md", "nothing\n")]);
    let bundle = compile_ok(dir.path());
    assert!(bundle.is_empty());
    assert_eq!(bundle.to_json().unwrap(), r#"{"specs":[]}"#);
}

#[test]
fn test_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let err = compile(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, CompileError::Walk { .. }));
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_fails_when_read() {
    let dir = project(&[("a.yaml", "x: 1\n")]);
    std::os::unix::fs::symlink(dir.path().join("gone.yaml"), dir.path().join("b.yaml")).unwrap();
    let err = compile(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::ReadFile { ref path, .. } if path == &dir.path().join("b.yaml")
    ));
}

#[test]
fn test_merge_keys_are_expanded_in_the_bundle() {
    let dir = project(&[(
        "tasks.yaml",
        "type: task\nname: t\ndata:\n  defaults: &d\n    retries: 3\n  job:\n    <<: *d\n    name: x\n",
    )]);
    let json = serde_json::to_value(compile_ok(dir.path())).unwrap();
    assert_eq!(
        json["specs"][0]["data"]["job"],
        serde_json::json!({"retries": 3, "name": "x"})
    );
}
