//! Registry - Tool registration and lookup
//!
//! Tools are registered once at startup in a fixed order. Each tool carries a
//! [`ToolSpec`] describing its parameters, the triggers the planner matches
//! against, and whether it is enabled. After startup the registry is only read.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Risk level of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low risk - pure computation, read-only lookups
    Low,
    /// Medium risk - filesystem writes inside the sandbox
    Medium,
    /// High risk - command execution, needs elevated capability
    High,
}

impl RiskLevel {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Whether the tool needs elevated capability (e.g. shell access)
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tool category for organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Arithmetic
    Math,
    /// File operations
    File,
    /// Command execution
    Exec,
    /// Search operations
    Search,
    /// Backed by the inference collaborator
    Inference,
    /// Anything else
    Utility,
}

impl ToolCategory {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::File => "file",
            Self::Exec => "exec",
            Self::Search => "search",
            Self::Inference => "inference",
            Self::Utility => "utility",
        }
    }
}

/// Semantic type of a declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Free text
    String,
    /// Floating point number
    Number,
    /// Whole number
    Integer,
    /// true / false
    Boolean,
    /// Filesystem path
    Path,
}

impl ParamKind {
    /// Convert a raw text token into a JSON value of this kind.
    ///
    /// Tokens that do not parse are kept as strings so the tool can report
    /// a precise input error.
    #[must_use]
    pub fn coerce(&self, raw: &str) -> Value {
        match self {
            Self::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            Self::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string())),
            Self::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Value::Bool(true),
                "false" | "no" | "off" | "0" => Value::Bool(false),
                _ => Value::String(raw.to_string()),
            },
            Self::String | Self::Path => Value::String(raw.to_string()),
        }
    }
}

/// A declared tool parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Expected semantic type
    pub kind: ParamKind,
    /// Whether the tool rejects a call without it
    pub required: bool,
}

impl ParamSpec {
    /// A required parameter
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// An optional parameter
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// How the text following a trigger is turned into arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgStyle {
    /// The whole remainder becomes the first declared parameter
    #[default]
    Raw,
    /// Whitespace tokens fill declared parameters in order; unmapped
    /// trailing text becomes the value of the last parameter
    Positional,
}

/// What a trigger matches against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Matcher {
    /// Case-insensitive leading word or fixed prefix
    Prefix(String),
    /// Regular expression; the `args` group (or group 1) is the argument text
    Pattern(String),
}

/// A planner trigger plus the arguments it always implies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// The matcher
    pub matcher: Matcher,
    /// Arguments merged into every intent produced by this trigger
    #[serde(default)]
    pub fixed: Map<String, Value>,
    /// Overrides the tool's argument style for this trigger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg_style: Option<ArgStyle>,
}

impl Trigger {
    /// A prefix trigger
    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Prefix(prefix.into()),
            fixed: Map::new(),
            arg_style: None,
        }
    }

    /// A regex trigger
    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Pattern(pattern.into()),
            fixed: Map::new(),
            arg_style: None,
        }
    }

    /// Add a fixed argument
    #[must_use]
    pub fn with_fixed(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fixed.insert(key.into(), value.into());
        self
    }

    /// Split this trigger's argument text differently from the rest of the tool
    #[must_use]
    pub fn with_arg_style(mut self, style: ArgStyle) -> Self {
        self.arg_style = Some(style);
        self
    }

    fn validate(&self, tool: &str) -> Result<()> {
        let invalid = |reason: String| Error::InvalidSpec {
            tool: tool.to_string(),
            reason,
        };
        match &self.matcher {
            Matcher::Prefix(p) if p.trim().is_empty() => {
                Err(invalid("empty trigger prefix".to_string()))
            }
            Matcher::Pattern(p) if p.trim().is_empty() => {
                Err(invalid("empty trigger pattern".to_string()))
            }
            Matcher::Pattern(p) => Regex::new(p)
                .map(|_| ())
                .map_err(|e| invalid(format!("bad trigger pattern: {}", e))),
            Matcher::Prefix(_) => Ok(()),
        }
    }
}

/// Tool metadata: what it is called, how the planner reaches it, how it is run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// One-line usage shown when a call is rejected for bad input
    pub usage: String,
    /// Declared parameters, in positional order
    pub parameters: Vec<ParamSpec>,
    /// Planner triggers, in evaluation order
    pub triggers: Vec<Trigger>,
    /// Argument splitting convention
    pub arg_style: ArgStyle,
    /// Whether the tool is enabled
    pub enabled: bool,
    /// Risk level
    pub risk_level: RiskLevel,
    /// Tool category
    pub category: ToolCategory,
    /// Execution budget; the dispatcher default applies when `None`
    #[serde(default, with = "opt_secs")]
    pub timeout: Option<Duration>,
}

impl ToolSpec {
    /// Create a new tool spec
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            usage: String::new(),
            parameters: Vec::new(),
            triggers: Vec::new(),
            arg_style: ArgStyle::Raw,
            enabled: true,
            risk_level: RiskLevel::Low,
            category: ToolCategory::Utility,
            timeout: None,
        }
    }

    /// Set the usage line
    #[must_use]
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Declare a parameter
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Add a trigger
    #[must_use]
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Set the argument style
    #[must_use]
    pub fn with_arg_style(mut self, style: ArgStyle) -> Self {
        self.arg_style = style;
        self
    }

    /// Set the risk level
    #[must_use]
    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    /// Set the category
    #[must_use]
    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }

    /// Set enabled status
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the execution budget
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check the spec for startup-time configuration errors
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidSpec {
                tool: self.name.clone(),
                reason: "empty tool name".to_string(),
            });
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::InvalidSpec {
                tool: self.name.clone(),
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        for trigger in &self.triggers {
            trigger.validate(&self.name)?;
        }
        Ok(())
    }
}

mod opt_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_secs_f64()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.map(Duration::from_secs_f64))
    }
}

/// Output of a successful tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text shown to the user
    pub text: String,
    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolOutput {
    /// Plain text output
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: None,
        }
    }

    /// Attach structured data
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Trait for tool implementations
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool spec
    fn spec(&self) -> &ToolSpec;

    /// Execute the tool with a JSON object of arguments
    async fn execute(&self, input: Value) -> Result<ToolOutput>;
}

/// Fetch a required string argument
pub fn str_arg<'a>(input: &'a Value, key: &str) -> Result<&'a str> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidInput(format!("missing '{}' parameter", key)))
}

/// Per-tool settings read from configuration at startup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Overrides the tool's default enabled flag
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Overrides the tool's execution budget (seconds)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Extra prefix triggers appended after the built-in ones
    #[serde(default, alias = "triggers")]
    pub aliases: Vec<String>,
}

impl ToolSettings {
    /// Apply these settings on top of a tool's own spec
    #[must_use]
    pub fn apply(&self, mut spec: ToolSpec) -> ToolSpec {
        if let Some(enabled) = self.enabled {
            spec.enabled = enabled;
        }
        if let Some(secs) = self.timeout_secs {
            spec.timeout = Some(Duration::from_secs(secs));
        }
        for alias in &self.aliases {
            spec.triggers.push(Trigger::prefix(alias.clone()));
        }
        spec
    }
}

/// A registered tool: its effective spec and the handler behind it
#[derive(Clone)]
pub struct RegisteredTool {
    /// Effective spec (after settings were applied)
    pub spec: ToolSpec,
    /// The handler
    pub handler: Arc<dyn Tool>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Registry for managing available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with its own spec
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        self.register_with(tool, &ToolSettings::default())
    }

    /// Register a tool, applying configured settings to its spec.
    ///
    /// Fails on a duplicate name (case-insensitive) or an invalid spec;
    /// nothing is ever overwritten.
    pub fn register_with(&mut self, tool: Arc<dyn Tool>, settings: &ToolSettings) -> Result<()> {
        let spec = settings.apply(tool.spec().clone());
        spec.validate()?;

        let key = spec.name.to_lowercase();
        if self.index.contains_key(&key) {
            return Err(Error::DuplicateTool(spec.name));
        }

        debug!(tool = %spec.name, enabled = spec.enabled, risk = %spec.risk_level, "Registering tool");
        self.index.insert(key, self.tools.len());
        self.tools.push(RegisteredTool {
            spec,
            handler: tool,
        });
        Ok(())
    }

    /// Get a tool by name (case-insensitive), enabled or not
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index
            .get(&name.trim().to_lowercase())
            .and_then(|&i| self.tools.get(i))
    }

    /// Check if a tool exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Specs of enabled tools, in registration order
    #[must_use]
    pub fn list_enabled(&self) -> Vec<&ToolSpec> {
        self.tools
            .iter()
            .map(|t| &t.spec)
            .filter(|s| s.enabled)
            .collect()
    }

    /// Specs of all tools, in registration order
    #[must_use]
    pub fn list(&self) -> Vec<&ToolSpec> {
        self.tools.iter().map(|t| &t.spec).collect()
    }

    /// Get the number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
