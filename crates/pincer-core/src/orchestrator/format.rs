//! Turning dispatch results into reply text

use crate::dispatcher::{FaultKind, ToolResult, ToolStatus};
use crate::error::{DenialReason, Error, UserFriendlyError};

pub(crate) const TOOL_UNAVAILABLE: &str = "That tool is not available.";
pub(crate) const NOT_PERMITTED: &str = "That action is not permitted.";
pub(crate) const NO_OUTPUT: &str = "(no output)";

/// Reply text for a dispatch result.
///
/// Only success returns tool-produced text; every other status maps to a
/// fixed message. `usage` is appended when the tool rejected its input.
pub(crate) fn format_tool_result(result: &ToolResult, usage: Option<&str>) -> String {
    match result.status {
        ToolStatus::Success => match result.payload.as_ref().map(|p| p.text.trim()) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => NO_OUTPUT.to_string(),
        },
        ToolStatus::Denied => {
            Error::AuthDenied(result.denial.unwrap_or(DenialReason::NotAllowlisted)).user_message()
        }
        ToolStatus::NotFound => TOOL_UNAVAILABLE.to_string(),
        ToolStatus::Timeout => Error::ToolTimeout {
            tool: result.tool.clone(),
            timeout_ms: result.duration_ms,
        }
        .user_message(),
        ToolStatus::ToolError => match result.fault {
            Some(FaultKind::InvalidInput) => match usage.filter(|u| !u.is_empty()) {
                Some(usage) => format!("I couldn't use that input.\nUsage: {}", usage),
                None => "I couldn't use that input.".to_string(),
            },
            Some(FaultKind::PermissionDenied) => NOT_PERMITTED.to_string(),
            Some(FaultKind::Inference) => {
                Error::InferenceUnavailable(String::new()).user_message()
            }
            _ => Error::ToolFault {
                tool: result.tool.clone(),
                detail: String::new(),
            }
            .user_message(),
        },
    }
}
