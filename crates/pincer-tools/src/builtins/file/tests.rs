use super::*;
use serde_json::json;
use tempfile::TempDir;

fn tool_in(dir: &TempDir) -> FileManagerTool {
    FileManagerTool::new(FileSandbox::new(vec![dir.path().to_path_buf()]))
}

#[tokio::test]
async fn test_write_then_read() {
    let dir = TempDir::new().unwrap();
    let tool = tool_in(&dir);
    let path = dir.path().join("notes.txt");
    let path = path.to_str().unwrap();

    let out = tool
        .execute(json!({"action": "write", "path": path, "content": "hello world"}))
        .await
        .unwrap();
    assert!(out.text.contains("11 bytes"));

    let out = tool.execute(json!({"action": "read", "path": path})).await.unwrap();
    assert_eq!(out.text, "hello world");
}

#[tokio::test]
async fn test_read_is_default_action() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), "abc").unwrap();
    let tool = tool_in(&dir);

    let out = tool.execute(json!({"path": "a.txt"})).await.unwrap();
    assert_eq!(out.text, "abc");
}

#[tokio::test]
async fn test_read_truncates_large_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("big.txt"), "x".repeat(100)).unwrap();
    let tool = FileManagerTool::new(
        FileSandbox::new(vec![dir.path().to_path_buf()]).with_max_read_bytes(10),
    );

    let out = tool.execute(json!({"path": "big.txt"})).await.unwrap();
    assert!(out.text.starts_with("xxxxxxxxxx\n"));
    assert!(out.text.contains("[Truncated at 10 bytes of 100]"));
}

#[tokio::test]
async fn test_binary_file_is_summarized() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x01]).unwrap();
    let tool = tool_in(&dir);

    let out = tool.execute(json!({"path": "blob.bin"})).await.unwrap();
    assert_eq!(out.text, "Binary file, 4 bytes, not displayed");
}

#[tokio::test]
async fn test_directory_listing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("b.txt"), "").unwrap();
    std::fs::create_dir(dir.path().join("a")).unwrap();
    let tool = tool_in(&dir);

    let out = tool
        .execute(json!({"path": dir.path().to_str().unwrap()}))
        .await
        .unwrap();
    assert_eq!(out.text, "a/\nb.txt");
}

#[tokio::test]
async fn test_traversal_is_denied() {
    let dir = TempDir::new().unwrap();
    let tool = tool_in(&dir);

    let err = tool
        .execute(json!({"path": "../../etc/hostname"}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
}

#[tokio::test]
async fn test_outside_allowed_dirs_is_denied() {
    let allowed = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();
    std::fs::write(other.path().join("x.txt"), "secret").unwrap();
    let tool = tool_in(&allowed);

    let err = tool
        .execute(json!({"path": other.path().join("x.txt").to_str().unwrap()}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
}

#[tokio::test]
async fn test_sensitive_file_is_denied() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".env"), "TOKEN=1").unwrap();
    let tool = tool_in(&dir);

    let err = tool.execute(json!({"path": ".env"})).await.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
}

#[tokio::test]
async fn test_missing_file_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    let tool = tool_in(&dir);

    let err = tool.execute(json!({"path": "nope.txt"})).await.unwrap_err();
    assert!(err.is_invalid_input());
}

#[tokio::test]
async fn test_write_requires_content() {
    let dir = TempDir::new().unwrap();
    let tool = tool_in(&dir);

    let err = tool
        .execute(json!({"action": "write", "path": "a.txt"}))
        .await
        .unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn test_is_sensitive_file() {
    assert!(is_sensitive_file(std::path::Path::new("/tmp/.env")));
    assert!(is_sensitive_file(std::path::Path::new("id_rsa")));
    assert!(!is_sensitive_file(std::path::Path::new("/tmp/notes.txt")));
}

#[test]
fn test_spec_triggers_carry_action() {
    let dir = TempDir::new().unwrap();
    let tool = tool_in(&dir);
    let spec = tool.spec();

    assert_eq!(spec.arg_style, ArgStyle::Positional);
    assert_eq!(spec.triggers[0].fixed.get("action"), Some(&json!("read")));
    assert_eq!(spec.triggers[1].fixed.get("action"), Some(&json!("write")));
    assert!(spec.validate().is_ok());
}
