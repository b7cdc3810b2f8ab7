//! Prompt library for the reasoning service
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/munger/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! This allows users to tune the wording sent to the model without rebuilding,
//! while automatically getting new default prompts on upgrade.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const INFER_CONTEXT: &str = include_str!("../../../prompts/infer_context.md");
    pub const SCORE_FACTORS: &str = include_str!("../../../prompts/score_factors.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Guess the buyer's financial context from item name and cost
    InferContext,
    /// Score the five decision factors
    ScoreFactors,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InferContext => "infer_context",
            Self::ScoreFactors => "score_factors",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[Self::InferContext, Self::ScoreFactors]
    }

    /// Get the default embedded content for this prompt
    fn default_content(&self) -> &'static str {
        match self {
            Self::InferContext => defaults::INFER_CONTEXT,
            Self::ScoreFactors => defaults::SCORE_FACTORS,
        }
    }
}

impl std::str::FromStr for PromptId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PromptId::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
                Error::InvalidData(format!(
                    "Unknown prompt '{}' (known: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    /// Unique identifier
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    #[serde(default)]
    pub description: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Metadata from frontmatter
    pub metadata: PromptMetadata,
    /// The prompt body (everything after the frontmatter)
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
    /// Path to override file (if any)
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// Get the user section of the prompt
    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the whole body with template variables replaced
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        render_template(&self.content, vars)
    }

    /// Render just the user section with variables
    ///
    /// Prompts without a `# User` header render their whole body.
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        match self.user_section() {
            Some(user) => render_template(user, vars),
            None => self.render(vars),
        }
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    /// Override directory path
    override_dir: Option<PathBuf>,
    /// Cached parsed prompts
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        match self.cache.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let prompt = load(self.override_dir.as_ref(), id)?;
                Ok(entry.insert(prompt))
            }
        }
    }

    /// List all prompts with their override status
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let override_path = self.override_path(id).filter(|p| p.exists());
                let prompt = self.get(id).ok();
                PromptInfo {
                    id: id.as_str().to_string(),
                    version: prompt.map(|p| p.metadata.version).unwrap_or(0),
                    description: prompt
                        .map(|p| p.metadata.description.clone())
                        .unwrap_or_default(),
                    has_override: override_path.is_some(),
                    override_path,
                }
            })
            .collect()
    }

    /// Check if a prompt has an override file
    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_path(id).is_some_and(|p| p.exists())
    }

    /// Where an override for `id` would live
    pub fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }

    /// Get the override directory path
    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    /// Clear the cache (useful after editing override files)
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub description: String,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

/// The prompts one pipeline needs, loaded once up front
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub infer_context: Prompt,
    pub score_factors: Prompt,
}

impl PromptSet {
    /// Load both prompts through a library (overrides honored)
    pub fn load(library: &mut PromptLibrary) -> Result<Self> {
        Ok(Self {
            infer_context: library.get(PromptId::InferContext)?.clone(),
            score_factors: library.get(PromptId::ScoreFactors)?.clone(),
        })
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        Self::load(&mut PromptLibrary::embedded_only())
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("munger").join("prompts").join("overrides"))
}

/// Load a prompt (checking override first, then default)
fn load(override_dir: Option<&PathBuf>, id: PromptId) -> Result<Prompt> {
    if let Some(dir) = override_dir {
        let override_path = dir.join(format!("{}.md", id.as_str()));
        if override_path.exists() {
            let content = fs::read_to_string(&override_path).map_err(|e| {
                Error::InvalidData(format!("Failed to read prompt override: {}", e))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            check_id(&metadata, id)?;
            return Ok(Prompt {
                metadata,
                content: body,
                is_override: true,
                override_path: Some(override_path),
            });
        }
    }

    let (metadata, body) = parse_prompt(id.default_content())?;
    Ok(Prompt {
        metadata,
        content: body,
        is_override: false,
        override_path: None,
    })
}

fn check_id(metadata: &PromptMetadata, id: PromptId) -> Result<()> {
    if metadata.id != id.as_str() {
        return Err(Error::InvalidData(format!(
            "Prompt override declares id '{}', expected '{}'",
            metadata.id,
            id.as_str()
        )));
    }
    Ok(())
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("\n---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 4..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Extract a section from the prompt content
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];

    // Runs to the next top-level header or end of content
    let end = after_header.find("\n# ").unwrap_or(after_header.len());

    Some(after_header[..end].trim())
}

/// Resolve conditionals, then substitute `{{var}}` in one pass
///
/// Substituted values are never rescanned, so user text containing braces
/// cannot inject template syntax.
fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let resolved = resolve_conditionals(template, vars);
    let mut out = String::with_capacity(resolved.len());
    let mut rest = resolved.as_str();

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let name = after[..close].trim();
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    // Unknown placeholders are left as written
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Keep `{{#if var}}...{{/if}}` bodies only when `var` is present and non-empty
fn resolve_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = result[var_start..var_start + var_end].trim().to_string();
        let block_start = var_start + var_end + 2;

        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block_end = block_start + endif_pos;
        let full_end = block_end + 7;

        let keep = vars
            .get(var_name.as_str())
            .is_some_and(|v| !v.trim().is_empty());

        result = if keep {
            format!(
                "{}{}{}",
                &result[..if_start],
                &result[block_start..block_end],
                &result[full_end..]
            )
        } else {
            format!("{}{}", &result[..if_start], &result[full_end..])
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 3
description: A test
---

# User
Test user prompt with {{variable}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 3);
        assert_eq!(metadata.description, "A test");
        assert!(body.starts_with("# User"));
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("# User\nhello").is_err());
        assert!(parse_prompt("---\nid: x\nversion: 1\n# User\nhello").is_err());
    }

    #[test]
    fn test_extract_section() {
        let content = "# System\nSystem content here.\n\n# User\nUser content here.";

        assert_eq!(
            extract_section(content, "# System"),
            Some("System content here.")
        );
        assert_eq!(
            extract_section(content, "# User"),
            Some("User content here.")
        );
        assert_eq!(extract_section(content, "# Missing"), None);
    }

    #[test]
    fn test_render_replaces_variables() {
        let mut vars = HashMap::new();
        vars.insert("name", "World");
        vars.insert("value", "42");

        let rendered = render_template("Hello {{name}}, your value is {{value}}.", &vars);
        assert_eq!(rendered, "Hello World, your value is 42.");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let mut vars = HashMap::new();
        vars.insert("item", "{{cost}}");
        vars.insert("cost", "100");

        let rendered = render_template("{{item}} costs {{cost}} {{unknown}}", &vars);
        assert_eq!(rendered, "{{cost}} costs 100 {{unknown}}");
    }

    #[test]
    fn test_conditional_blocks() {
        let content = "Start{{#if extra}}\nExtra: {{extra}}{{/if}}\nEnd";

        let mut vars = HashMap::new();
        vars.insert("extra", "Needed for work");
        assert_eq!(
            render_template(content, &vars),
            "Start\nExtra: Needed for work\nEnd"
        );

        let mut blank = HashMap::new();
        blank.insert("extra", "   ");
        assert_eq!(render_template(content, &blank), "Start\nEnd");

        let empty_vars: HashMap<&str, &str> = HashMap::new();
        assert_eq!(render_template(content, &empty_vars), "Start\nEnd");
    }

    #[test]
    fn test_prompt_library_embedded() {
        let mut lib = PromptLibrary::embedded_only();

        for id in PromptId::all() {
            let prompt = lib.get(*id).unwrap();
            assert!(!prompt.is_override);
            assert!(prompt.override_path.is_none());
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_default_prompts_parse() {
        for id in PromptId::all() {
            let (metadata, _) = parse_prompt(id.default_content()).unwrap();
            assert_eq!(metadata.id, id.as_str(), "Prompt ID mismatch");
        }
    }

    #[test]
    fn test_default_prompts_ask_for_required_keys() {
        let set = PromptSet::embedded().unwrap();
        let context = set.infer_context.user_section().unwrap();
        for key in [
            "leftover_income",
            "has_high_interest_debt",
            "main_financial_goal",
            "purchase_urgency",
        ] {
            assert!(context.contains(key), "infer_context missing {}", key);
        }

        let factors = set.score_factors.user_section().unwrap();
        for key in ["\"D\"", "\"O\"", "\"G\"", "\"L\"", "\"B\"", "D_explanation"] {
            assert!(factors.contains(key), "score_factors missing {}", key);
        }
    }

    #[test]
    fn test_prompt_id_from_str() {
        assert_eq!(
            "score_factors".parse::<PromptId>().unwrap(),
            PromptId::ScoreFactors
        );
        assert!("classify_merchant".parse::<PromptId>().is_err());
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("infer_context.md"),
            "---\nid: infer_context\nversion: 7\n---\n\n# User\nCustom {{item_name}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(lib.has_override(PromptId::InferContext));
        assert!(!lib.has_override(PromptId::ScoreFactors));

        let prompt = lib.get(PromptId::InferContext).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 7);

        let mut vars = HashMap::new();
        vars.insert("item_name", "Desk");
        assert_eq!(prompt.render_user(&vars), "Custom Desk");

        let listed = lib.list();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].has_override);
        assert!(listed[0].override_path.is_some());
        assert!(!listed[1].has_override);
    }

    #[test]
    fn test_override_with_wrong_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("score_factors.md"),
            "---\nid: something_else\nversion: 1\n---\nbody",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(PromptSet::load(&mut lib).is_err());
    }
}
