use super::*;

#[test]
fn test_default_timeout() {
    let cmd = ToolCommand::new("sh");
    assert_eq!(cmd.timeout, DEFAULT_TOOL_TIMEOUT);
    assert_eq!(cmd.program(), "sh");
}

#[test]
fn test_locate_missing_tool() {
    let err = locate("dbx-surely-missing-tool-8c1f").unwrap_err();
    assert!(err.is_not_found());
    assert!(!is_available("dbx-surely-missing-tool-8c1f"));
}

#[tokio::test]
async fn test_output_captures_stdout() {
    let out = ToolCommand::new("sh")
        .args(["-c", "echo hello"])
        .output()
        .await
        .unwrap();
    assert_eq!(out.stdout_lossy().trim(), "hello");
}

#[tokio::test]
async fn test_output_missing_tool_fails_before_spawn() {
    let result = ToolCommand::new("dbx-surely-missing-tool-8c1f")
        .arg("--version")
        .output()
        .await;
    match result {
        Err(ToolError::NotFound { tool, .. }) => assert_eq!(tool, "dbx-surely-missing-tool-8c1f"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_output_failure_carries_stderr() {
    let result = ToolCommand::new("sh")
        .args(["-c", "echo 'access denied' >&2; exit 3"])
        .output()
        .await;
    match result {
        Err(ToolError::Failed { code, stderr, .. }) => {
            assert_eq!(code, 3);
            assert_eq!(stderr, "access denied");
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_output_timeout() {
    let result = ToolCommand::new("sh")
        .args(["-c", "sleep 10"])
        .timeout(Duration::from_millis(100))
        .output()
        .await;
    assert!(matches!(result, Err(ToolError::Timeout { .. })));
}

#[tokio::test]
async fn test_env_is_scoped_to_child() {
    let out = ToolCommand::new("sh")
        .args(["-c", "echo $DBX_TEST_SECRET"])
        .env("DBX_TEST_SECRET", "s3cret")
        .output()
        .await
        .unwrap();
    assert_eq!(out.stdout_lossy().trim(), "s3cret");
    assert!(std::env::var("DBX_TEST_SECRET").is_err());
}

#[tokio::test]
async fn test_stdin_bytes() {
    let out = ToolCommand::new("cat")
        .stdin_bytes("piped input")
        .output()
        .await
        .unwrap();
    assert_eq!(out.stdout_lossy(), "piped input");
}

#[tokio::test]
async fn test_stdin_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("dump.sql");
    std::fs::write(&path, "CREATE TABLE t (id INT);\n").unwrap();

    let out = ToolCommand::new("cat").stdin_file(&path).output().await.unwrap();
    assert!(out.stdout_lossy().contains("CREATE TABLE t"));
}
