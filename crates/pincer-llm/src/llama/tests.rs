use super::*;
use crate::message::Message;
use std::time::Duration;

#[test]
fn test_chatml_prompt_layout() {
    let prompt = build_chatml_prompt(&[Message::system("Be brief."), Message::user("hi")]);
    assert_eq!(
        prompt,
        "<|im_start|>system\nBe brief.<|im_end|>\n<|im_start|>user\nhi<|im_end|>\n<|im_start|>assistant\n"
    );
}

#[test]
fn test_extract_strips_echoed_prompt() {
    let prompt = build_chatml_prompt(&[Message::user("2+2?")]);
    let stdout = format!("{}4<|im_end|>\n", prompt);
    assert_eq!(extract_completion(&stdout, &prompt), "4");
}

#[test]
fn test_extract_falls_back_to_last_assistant_marker() {
    let stdout = "noise<|im_start|>assistant\nHello there [end of text]\n";
    assert_eq!(extract_completion(stdout, "unrelated"), "Hello there");
}

#[test]
fn test_extract_plain_output() {
    assert_eq!(extract_completion("  just text \n", "prompt"), "just text");
}

#[test]
fn test_config_defaults() {
    let config = LlamaConfig::default();
    assert_eq!(config.binary, DEFAULT_BINARY);
    assert!(config.model_path.is_none());
    assert_eq!(config.threads, 4);
    assert_eq!(config.max_tokens, 512);
    assert_eq!(config.ctx_size, 2048);
    assert_eq!(config.timeout, Duration::from_secs(120));
}

#[test]
fn test_model_name_from_path() {
    let provider =
        LlamaCliProvider::new(LlamaConfig::new().with_model_path("/models/phi-3-mini.gguf"));
    assert_eq!(provider.default_model(), "phi-3-mini");
    assert_eq!(provider.name(), "llama-cli");
}

#[tokio::test]
async fn test_missing_model_path_is_not_configured() {
    let provider = LlamaCliProvider::new(LlamaConfig::new());
    let err = provider
        .complete(CompletionRequest::new("x").with_message(Message::user("hi")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotConfigured(_)));
}

#[tokio::test]
async fn test_missing_binary_is_unavailable() {
    let provider = LlamaCliProvider::new(
        LlamaConfig::new()
            .with_binary("/nonexistent/llama-cli-pincer")
            .with_model_path("/tmp/model.gguf"),
    );
    let err = provider
        .complete(CompletionRequest::new("x").with_message(Message::user("hi")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unavailable(_)));
}

// Scripts are written and executed in one test so no other test forks while
// a script file is still open for writing.
#[cfg(unix)]
#[tokio::test]
async fn test_subprocess_backends() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let write_script = |name: &str, body: &str| {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    };

    let echo = write_script(
        "echo-llama",
        r#"for a in "$@"; do last="$a"; done
printf '%s' "$last"
printf 'Paris<|im_end|>\n'"#,
    );
    let failing = write_script("failing-llama", "echo 'model load failed' >&2\nexit 3");
    let silent = write_script("silent-llama", "exit 0");
    let slow = write_script("slow-llama", "sleep 5");

    let request = CompletionRequest::new("")
        .with_message(Message::system("Be brief."))
        .with_message(Message::user("Capital of France?"));

    let provider = LlamaCliProvider::new(
        LlamaConfig::new()
            .with_binary(&echo)
            .with_model_path("/tmp/model.gguf"),
    );
    let response = provider.complete(request.clone()).await.unwrap();
    assert_eq!(response.content, "Paris");

    let provider = LlamaCliProvider::new(
        LlamaConfig::new()
            .with_binary(&failing)
            .with_model_path("/tmp/model.gguf"),
    );
    let err = provider.complete(request.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Backend(ref m) if m.contains("code 3")));

    let provider = LlamaCliProvider::new(
        LlamaConfig::new()
            .with_binary(&silent)
            .with_model_path("/tmp/model.gguf"),
    );
    let err = provider.complete(request.clone()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));

    let provider = LlamaCliProvider::new(
        LlamaConfig::new()
            .with_binary(&slow)
            .with_model_path("/tmp/model.gguf")
            .with_timeout(Duration::from_millis(200)),
    );
    let err = provider.complete(request).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(200)));
}
