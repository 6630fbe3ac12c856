use std::process::Command;

#[test]
fn test_missing_input_reports_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_svm-cli"))
        .arg("comp-summary")
        .arg(dir.path().join("swot"))
        .arg(dir.path().join("meandrs"))
        .arg(dir.path().join("comp"))
        .arg(dir.path().join("comp_global.csv"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(22));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR - "));
    assert!(stderr.contains("invalid folder path"));
}
