use crate::message::Message;

const IM_START: &str = "<|im_start|>";
const IM_END: &str = "<|im_end|>";

/// Render messages as a ChatML prompt ending with an open assistant turn
#[must_use]
pub fn build_chatml_prompt(messages: &[Message]) -> String {
    let mut parts: Vec<String> = messages
        .iter()
        .map(|m| format!("{}{}\n{}{}", IM_START, m.role.as_str(), m.content, IM_END))
        .collect();
    parts.push(format!("{}assistant\n", IM_START));
    parts.join("\n")
}

/// Strip the echoed prompt and trailing end markers from llama-cli stdout
#[must_use]
pub fn extract_completion(stdout: &str, prompt: &str) -> String {
    let marker = format!("{}assistant\n", IM_START);
    let body = if let Some(pos) = stdout.find(prompt) {
        &stdout[pos + prompt.len()..]
    } else if let Some(pos) = stdout.rfind(&marker) {
        &stdout[pos + marker.len()..]
    } else {
        stdout
    };

    let body = body.split(IM_END).next().unwrap_or(body);
    body.trim()
        .trim_end_matches("[end of text]")
        .trim()
        .to_string()
}
