//! Planner - maps raw text to an intent
//!
//! Enabled tools are walked in registry order and, within a tool, its
//! triggers in declared order. The first trigger that matches wins. The
//! planner is a pure function of the text and the compiled trigger table.

use crate::error::{Error, Result};
use pincer_tools::{ArgStyle, Matcher, ParamSpec, ToolSpec};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};


/// Which trigger produced an intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "trigger", rename_all = "lowercase")]
pub enum MatchBasis {
    /// A leading-word trigger
    Prefix(String),
    /// A regex trigger
    Pattern(String),
}

/// A resolved tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    /// Target tool
    pub tool_name: String,
    /// Arguments keyed by parameter name
    pub arguments: Map<String, Value>,
    /// How the match was made
    pub basis: MatchBasis,
}

/// Planner result
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// A tool should handle the message
    Intent(Intent),
    /// Free-form conversation
    NoMatch,
}

enum CompiledMatcher {
    Prefix { raw: String, lower: String },
    Pattern(Regex),
}

struct CompiledTrigger {
    matcher: CompiledMatcher,
    fixed: Map<String, Value>,
    arg_style: ArgStyle,
}

struct Entry {
    tool_name: String,
    parameters: Vec<ParamSpec>,
    triggers: Vec<CompiledTrigger>,
}

/// Compiled, ordered trigger table
pub struct Planner {
    entries: Vec<Entry>,
}

impl Planner {
    /// Compile the triggers of the enabled tools, in the given order.
    ///
    /// Disabled specs are skipped. An empty or invalid trigger is a
    /// configuration error.
    pub fn new(tools: &[&ToolSpec]) -> Result<Self> {
        let mut entries = Vec::new();
        for spec in tools.iter().filter(|s| s.enabled) {
            let mut triggers = Vec::with_capacity(spec.triggers.len());
            for trigger in &spec.triggers {
                let matcher = match &trigger.matcher {
                    Matcher::Prefix(p) => {
                        let raw = p.trim();
                        if raw.is_empty() {
                            return Err(Error::Config(format!(
                                "tool '{}' has an empty trigger",
                                spec.name
                            )));
                        }
                        CompiledMatcher::Prefix {
                            raw: raw.to_string(),
                            lower: raw.to_lowercase(),
                        }
                    }
                    Matcher::Pattern(p) => {
                        if p.trim().is_empty() {
                            return Err(Error::Config(format!(
                                "tool '{}' has an empty trigger pattern",
                                spec.name
                            )));
                        }
                        CompiledMatcher::Pattern(Regex::new(p).map_err(|e| {
                            Error::Config(format!("tool '{}' trigger pattern: {}", spec.name, e))
                        })?)
                    }
                };
                triggers.push(CompiledTrigger {
                    matcher,
                    fixed: trigger.fixed.clone(),
                    arg_style: trigger.arg_style.unwrap_or(spec.arg_style),
                });
            }
            entries.push(Entry {
                tool_name: spec.name.clone(),
                parameters: spec.parameters.clone(),
                triggers,
            });
        }
        Ok(Self { entries })
    }

    /// Names of the tools the planner can route to, in order
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tool_name.as_str()).collect()
    }

    /// Classify one message
    #[must_use]
    pub fn plan(&self, raw_text: &str) -> PlanOutcome {
        let text = raw_text.trim();
        if text.is_empty() {
            return PlanOutcome::NoMatch;
        }

        for entry in &self.entries {
            for trigger in &entry.triggers {
                if let Some((remainder, basis)) = trigger.matcher.matches(text) {
                    let mut arguments =
                        build_arguments(&entry.parameters, trigger.arg_style, remainder.trim());
                    for (key, value) in &trigger.fixed {
                        arguments.insert(key.clone(), value.clone());
                    }
                    return PlanOutcome::Intent(Intent {
                        tool_name: entry.tool_name.clone(),
                        arguments,
                        basis,
                    });
                }
            }
        }
        PlanOutcome::NoMatch
    }
}

/// One-shot planning against an explicit tool list
pub fn plan(raw_text: &str, enabled_tools: &[&ToolSpec]) -> Result<PlanOutcome> {
    Ok(Planner::new(enabled_tools)?.plan(raw_text))
}

impl CompiledMatcher {
    fn matches<'t>(&self, text: &'t str) -> Option<(&'t str, MatchBasis)> {
        match self {
            Self::Prefix { raw, lower } => {
                let head = text.get(..lower.len())?;
                if head.to_lowercase() != *lower {
                    return None;
                }
                let rest = &text[lower.len()..];
                let word_like = lower.chars().last().is_some_and(char::is_alphanumeric);
                let boundary = rest.is_empty()
                    || !word_like
                    || rest.starts_with(|c: char| c.is_whitespace() || c == ':');
                if !boundary {
                    return None;
                }
                let rest = rest.trim_start();
                let rest = rest.strip_prefix(':').unwrap_or(rest);
                Some((rest, MatchBasis::Prefix(raw.clone())))
            }
            Self::Pattern(re) => {
                let caps = re.captures(text)?;
                let args = caps
                    .name("args")
                    .or_else(|| caps.get(1))
                    .map_or(text, |m| m.as_str());
                Some((args, MatchBasis::Pattern(re.as_str().to_string())))
            }
        }
    }
}

/// Turn argument text into named arguments per the tool's convention
fn build_arguments(params: &[ParamSpec], style: ArgStyle, text: &str) -> Map<String, Value> {
    let mut args = Map::new();
    if text.is_empty() {
        return args;
    }
    let Some(first) = params.first() else {
        args.insert("input".to_string(), Value::String(text.to_string()));
        return args;
    };

    match style {
        ArgStyle::Raw => {
            args.insert(first.name.clone(), first.kind.coerce(text));
        }
        ArgStyle::Positional => {
            let mut rest = text;
            let last = params.len() - 1;
            for (i, param) in params.iter().enumerate() {
                rest = rest.trim_start();
                if rest.is_empty() {
                    break;
                }
                if i == last {
                    args.insert(param.name.clone(), param.kind.coerce(rest.trim_end()));
                    break;
                }
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                args.insert(param.name.clone(), param.kind.coerce(&rest[..end]));
                rest = &rest[end..];
            }
        }
    }
    args
}
