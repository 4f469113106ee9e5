//! File manager tool - sandboxed read and write
//!
//! Only paths under the configured allowed directories are reachable.

mod security;

pub use security::{is_sensitive_file, FileSandbox, DEFAULT_MAX_READ_BYTES};

use crate::error::{Error, Result};
use crate::registry::{
    str_arg, ArgStyle, ParamKind, ParamSpec, RiskLevel, Tool, ToolCategory, ToolOutput, ToolSpec,
    Trigger,
};
use tracing::info;

const READ_PATTERN: &str = r"(?is)^(?:read|open|show)\s+file\s+(?P<args>.+)$";
const WRITE_PATTERN: &str = r"(?is)^(?:write|save)\s+file\s+(?P<args>.+)$";

/// File manager tool
pub struct FileManagerTool {
    spec: ToolSpec,
    sandbox: FileSandbox,
}

impl FileManagerTool {
    /// Create a new file manager over the given sandbox
    #[must_use]
    pub fn new(sandbox: FileSandbox) -> Self {
        let spec = ToolSpec::new(
            "file_manager",
            "Read or write text files inside the allowed directories",
        )
        .with_usage("read file <path> | write file <path> <content>")
        .with_category(ToolCategory::File)
        .with_risk_level(RiskLevel::Medium)
        .with_arg_style(ArgStyle::Positional)
        .with_param(ParamSpec::required("path", ParamKind::Path))
        .with_param(ParamSpec::optional("content", ParamKind::String))
        .with_trigger(
            Trigger::pattern(READ_PATTERN)
                .with_arg_style(ArgStyle::Raw)
                .with_fixed("action", "read"),
        )
        .with_trigger(Trigger::pattern(WRITE_PATTERN).with_fixed("action", "write"));

        Self { spec, sandbox }
    }

    async fn read(&self, path: &str) -> Result<ToolOutput> {
        let resolved = self.sandbox.resolve(path)?;
        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| Error::InvalidInput(format!("file not found: {}", path)))?;

        if metadata.is_dir() {
            let mut entries = Vec::new();
            let mut dir = tokio::fs::read_dir(&resolved).await?;
            while let Some(entry) = dir.next_entry().await? {
                let mut name = entry.file_name().to_string_lossy().to_string();
                if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                    name.push('/');
                }
                entries.push(name);
            }
            entries.sort();
            let text = if entries.is_empty() {
                format!("{} is empty", path)
            } else {
                entries.join("\n")
            };
            return Ok(ToolOutput::text(text));
        }

        let bytes = tokio::fs::read(&resolved).await?;
        let total = bytes.len();
        let cap = self.sandbox.max_read_bytes();
        let slice = &bytes[..total.min(cap)];

        let mut text = match std::str::from_utf8(slice) {
            Ok(s) => s.to_string(),
            // a multi-byte char may straddle the cap
            Err(e) if total > cap && e.error_len().is_none() => {
                String::from_utf8_lossy(&slice[..e.valid_up_to()]).to_string()
            }
            Err(_) => {
                return Ok(ToolOutput::text(format!(
                    "Binary file, {} bytes, not displayed",
                    total
                )))
            }
        };

        if total > cap {
            text.push_str(&format!("\n\n[Truncated at {} bytes of {}]", cap, total));
        }

        Ok(ToolOutput::text(text).with_data(serde_json::json!({
            "path": resolved.display().to_string(),
            "size": total,
            "truncated": total > cap,
        })))
    }

    async fn write(&self, path: &str, content: &str) -> Result<ToolOutput> {
        let resolved = self.sandbox.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&resolved, content).await?;
        info!(path = %resolved.display(), bytes = content.len(), "File written");

        Ok(ToolOutput::text(format!(
            "Wrote {} bytes to {}",
            content.len(),
            path
        )))
    }
}

#[async_trait::async_trait]
impl Tool for FileManagerTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput> {
        let action = input
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or("read");
        let path = str_arg(&input, "path")?;

        match action {
            "read" => self.read(path).await,
            "write" => {
                let content = input
                    .get("content")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Error::InvalidInput("missing 'content' parameter".to_string()))?;
                self.write(path, content).await
            }
            other => Err(Error::InvalidInput(format!("unknown action '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests;
