use clap::Parser;
use dupfind::cli::Cli;
use dupfind::duplicates::FinderError;
use dupfind::error::{ExitCode, StructuredError};
use dupfind::run_with_output;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn sample_tree() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"X");
    let b = write(dir.path(), "b", b"X");
    write(dir.path(), "c", b"Y");
    (dir, a, b)
}

fn run(args: &[&str]) -> anyhow::Result<(ExitCode, String)> {
    let cli = Cli::try_parse_from(args)?;
    let mut out = Vec::new();
    let code = run_with_output(&cli, &mut out)?;
    Ok((code, String::from_utf8(out)?))
}

fn json_groups(output: &str) -> Vec<Vec<String>> {
    serde_json::from_str(output).unwrap()
}

#[test]
fn test_json_report_on_hash_path() {
    let (dir, a, b) = sample_tree();
    let root = dir.path().to_str().unwrap();

    let (code, output) = run(&["dupfind", "-p", root, "--no-runtime"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(
        json_groups(&output),
        vec![vec![a.display().to_string(), b.display().to_string()]]
    );
    assert!(output.starts_with("[["));
    assert!(output.ends_with("]]\n"));
}

#[test]
fn test_json_report_on_fast_path() {
    let (dir, a, b) = sample_tree();
    let root = dir.path().to_str().unwrap();

    let (_, fast) = run(&["dupfind", "-p", root, "--fast", "-q"]).unwrap();
    let (_, hashed) = run(&["dupfind", "-p", root, "-q"]).unwrap();

    assert_eq!(fast, hashed);
    assert_eq!(
        json_groups(&fast),
        vec![vec![a.display().to_string(), b.display().to_string()]]
    );
}

#[test]
fn test_one_group_per_line() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a1", b"aaa");
    write(dir.path(), "a2", b"aaa");
    write(dir.path(), "b1", b"bbbb");
    write(dir.path(), "b2", b"bbbb");
    let root = dir.path().to_str().unwrap();

    let (_, output) = run(&["dupfind", "-p", root, "--no-runtime"]).unwrap();

    assert_eq!(output.lines().count(), 2);
    assert!(output.lines().next().unwrap().starts_with("[["));
    assert!(output.lines().next().unwrap().ends_with("],"));
    assert_eq!(json_groups(&output).len(), 2);
}

#[test]
fn test_text_report() {
    let (dir, a, b) = sample_tree();
    let root = dir.path().to_str().unwrap();

    let (_, output) = run(&["dupfind", "-p", root, "-o", "text", "--no-runtime"]).unwrap();

    assert_eq!(output, format!("{}\n{}\n", a.display(), b.display()));
}

#[test]
fn test_no_duplicates_prints_nothing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one", b"1");
    write(dir.path(), "two", b"22");
    write(dir.path(), "empty1", b"");
    write(dir.path(), "empty2", b"");
    let root = dir.path().to_str().unwrap();

    for format in ["json", "text"] {
        let (code, output) = run(&["dupfind", "-p", root, "-o", format, "--no-runtime"]).unwrap();
        assert_eq!(code, ExitCode::Success);
        assert!(output.is_empty(), "{format}: {output:?}");
    }
}

#[test]
fn test_missing_path_is_general_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nowhere");

    let err = run(&["dupfind", "-p", missing.to_str().unwrap()]).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::PathNotFound(_))
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);

    let structured = StructuredError::new(&err, ExitCode::for_error(&err));
    assert_eq!(structured.exit_code, 1);
    assert!(!structured.interrupted);
    assert!(structured.message.contains("nowhere"));
}

#[test]
fn test_missing_path_flag_rejected() {
    assert!(Cli::try_parse_from(["dupfind"]).is_err());
    assert!(Cli::try_parse_from(["dupfind", "-p", ".", "--io-threads", "0"]).is_err());
    assert!(Cli::try_parse_from(["dupfind", "-p", ".", "--buffer-size", "0"]).is_err());
    assert!(Cli::try_parse_from(["dupfind", "-p", ".", "--buffer-size", "4TiB"]).is_err());
}

#[test]
fn test_config_file_sets_defaults() {
    let (dir, a, b) = sample_tree();
    let config_dir = tempdir().unwrap();
    let config_path = config_dir.path().join("dupfind.toml");
    fs::write(&config_path, "fast = true\noutput = \"text\"\nbuffer_size = 3\n").unwrap();

    let (_, output) = run(&[
        "dupfind",
        "-p",
        dir.path().to_str().unwrap(),
        "--config",
        config_path.to_str().unwrap(),
        "--no-runtime",
    ])
    .unwrap();

    assert_eq!(output, format!("{}\n{}\n", a.display(), b.display()));
}

#[test]
fn test_command_line_overrides_config_file() {
    let (dir, a, b) = sample_tree();
    let config_dir = tempdir().unwrap();
    let config_path = config_dir.path().join("dupfind.toml");
    fs::write(&config_path, "output = \"text\"\n").unwrap();

    let (_, output) = run(&[
        "dupfind",
        "-p",
        dir.path().to_str().unwrap(),
        "--config",
        config_path.to_str().unwrap(),
        "-o",
        "json",
        "--no-runtime",
    ])
    .unwrap();

    assert_eq!(
        json_groups(&output),
        vec![vec![a.display().to_string(), b.display().to_string()]]
    );
}

#[test]
fn test_missing_config_file_is_error() {
    let (dir, _, _) = sample_tree();
    let config_dir = tempdir().unwrap();
    let config_path = config_dir.path().join("absent.toml");

    let result = run(&[
        "dupfind",
        "-p",
        dir.path().to_str().unwrap(),
        "--config",
        config_path.to_str().unwrap(),
    ]);

    assert!(result.is_err());
}

#[test]
fn test_max_depth_flag() {
    let dir = tempdir().unwrap();
    write(dir.path(), "nested/a", b"deep");
    write(dir.path(), "nested/b", b"deep");
    let root = dir.path().to_str().unwrap();

    let (_, shallow) = run(&["dupfind", "-p", root, "--max-depth", "1", "-q"]).unwrap();
    let (_, deep) = run(&["dupfind", "-p", root, "-q"]).unwrap();

    assert!(shallow.is_empty());
    assert_eq!(json_groups(&deep).len(), 1);
}

#[test]
fn test_digest_and_thread_flags() {
    let (dir, a, b) = sample_tree();
    let root = dir.path().to_str().unwrap();

    for hash in ["blake3", "sha256", "md5"] {
        let (_, output) = run(&[
            "dupfind",
            "-p",
            root,
            "--hash",
            hash,
            "--io-threads",
            "2",
            "--buffer-size",
            "1KiB",
            "-q",
        ])
        .unwrap();
        assert_eq!(
            json_groups(&output),
            vec![vec![a.display().to_string(), b.display().to_string()]],
            "{hash}"
        );
    }
}

#[test]
fn test_relative_components_are_normalized() {
    let (dir, a, b) = sample_tree();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let dotted = dir.path().join("sub").join("..");

    let (_, output) = run(&["dupfind", "-p", dotted.to_str().unwrap(), "-q"]).unwrap();

    assert_eq!(
        json_groups(&output),
        vec![vec![a.display().to_string(), b.display().to_string()]]
    );
}
