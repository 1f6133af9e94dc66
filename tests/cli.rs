use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn blkcat(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blkcat"))
        .args(args)
        .output()
        .unwrap()
}

fn temp_file_with(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 4096) as u8).collect()
}

#[test]
fn test_copies_file_verbatim() {
    let data = pattern(2 * 1024 * 1024 + 17);
    let file = temp_file_with(&data);
    let path = file.path().to_str().unwrap();

    let output = blkcat(&[path]);
    assert!(output.status.success());
    assert_eq!(output.stdout, data);
}

#[test]
fn test_every_strategy_matches_input() {
    let data = pattern(3 * 4096 + 5);
    let file = temp_file_with(&data);
    let path = file.path().to_str().unwrap();

    for strategy in ["byte", "block", "aligned", "fs-aware"] {
        let output = blkcat(&["--strategy", strategy, path]);
        assert!(output.status.success(), "strategy={}", strategy);
        assert_eq!(output.stdout, data, "strategy={}", strategy);
    }
}

#[test]
fn test_one_page_of_pattern() {
    let data: Vec<u8> = b"blkcat".iter().copied().cycle().take(4096).collect();
    let file = temp_file_with(&data);
    let path = file.path().to_str().unwrap();

    for block_size in ["1", "1000", "4096", "262144"] {
        let output = blkcat(&["--block-size", block_size, path]);
        assert!(output.status.success());
        assert_eq!(output.stdout, data, "block_size={}", block_size);
    }
}

#[test]
fn test_empty_file() {
    let file = temp_file_with(&[]);
    let output = blkcat(&[file.path().to_str().unwrap()]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_no_arguments_is_usage_error() {
    let output = blkcat(&[]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_two_arguments_is_usage_error() {
    let a = temp_file_with(b"a");
    let b = temp_file_with(b"b");
    let output = blkcat(&[a.path().to_str().unwrap(), b.path().to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_zero_block_size_is_rejected() {
    let file = temp_file_with(b"data");
    let output = blkcat(&["--block-size", "0", file.path().to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_nonexistent_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let output = blkcat(&[missing.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("open"), "stderr: {}", stderr);
}

#[test]
fn test_directory_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = blkcat(&[dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("read"), "stderr: {}", stderr);
}

#[test]
fn test_verbose_reports_to_stderr_only() {
    let data = pattern(10000);
    let file = temp_file_with(&data);
    let output = blkcat(&["--verbose", "--fadvise", file.path().to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(output.stdout, data);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Page size:"));
    assert!(stderr.contains("Copied 10000 bytes"));
}

#[test]
fn test_byte_strategy_writes_one_byte_per_call() {
    let data = pattern(10000);
    let file = temp_file_with(&data);
    let output = blkcat(&["--strategy", "byte", "-v", file.path().to_str().unwrap()]);

    assert!(output.status.success());
    assert_eq!(output.stdout, data);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Copied 10000 bytes in 10000 read(s) and 10000 write(s)"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_chunks_reach_stdout_unsplit() {
    let data = pattern(10000);
    let file = temp_file_with(&data);
    let output = blkcat(&[
        "--strategy",
        "aligned",
        "--block-size",
        "1000",
        "-v",
        file.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    assert_eq!(output.stdout, data);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Copied 10000 bytes in 10 read(s) and 10 write(s)"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_verbose_reports_chosen_chunk_size_once() {
    let file = temp_file_with(&pattern(100));
    let output = blkcat(&[
        "--strategy",
        "block",
        "--block-size",
        "4000",
        "-v",
        file.path().to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Selected block size"), "stderr: {}", stderr);
    assert_eq!(stderr.matches("Chunk size: 4000").count(), 1, "stderr: {}", stderr);
}

#[test]
fn test_diagnostics_have_no_color_codes() {
    let file = temp_file_with(&pattern(100));
    let output = Command::new(env!("CARGO_BIN_EXE_blkcat"))
        .args(["-v", file.path().to_str().unwrap()])
        .env_remove("NO_COLOR")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(!output.stderr.contains(&0x1b), "stderr contains ANSI escapes");
}
