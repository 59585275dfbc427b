use anyhow::{Context, Result};
use std::path::Path;

/// Built-in role description, used when no prompt file is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a counsellor trained in cognitive behavioural therapy and transactional analysis.

TASK: Read the user's thought and identify the psychological game (in Eric Berne's sense) the user is caught in.
Explain how it starts, how it usually ends, and what the user can do instead.

RULES:
- Be concrete and kind. Never diagnose illnesses.
- Write every value in the same language as the user's thought.
- Output a single JSON object and nothing else. No markdown, no commentary."#;

const SHAPE: &str = r#"OUTPUT FORMAT (JSON only):
{
  "game_name": "name of the game being played",
  "definition": "one or two sentences describing the game",
  "subject_name": "what to call the user in this situation (optional)",
  "target_name": "who the game is played with (optional)",
  "position_start": {
    "self": "life position towards self at the start: OK or not OK",
    "others": "life position towards others at the start: OK or not OK",
    "description": "how the user feels when the game begins"
  },
  "position_end": {
    "self": "life position towards self at the payoff",
    "others": "life position towards others at the payoff",
    "description": "how the user feels when the game ends"
  },
  "prediction": "how this situation is likely to play out if nothing changes",
  "hidden_motive": "the unspoken need the game is trying to satisfy",
  "advice": "a concrete step to leave the game"
}"#;

const STRICT_CLAUSE: &str = "NAMING: game_name MUST be one of the canonical game names from transactional analysis literature \
(for example \"Why Don't You - Yes But\", \"Kick Me\", \"Now I've Got You\", \"Poor Me\"). Do not invent names.";

const FREE_CLAUSE: &str = "NAMING: game_name may be a short, original name that fits the situation when no canonical game matches well.";

/// Prompt variant selected by the optional `mode` request field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Canonical terminology only.
    Strict,
    #[default]
    Free,
}

impl Mode {
    /// Unknown or missing values fall back to [`Mode::Free`].
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "strict" => Mode::Strict,
            _ => Mode::Free,
        }
    }

    fn clause(self) -> &'static str {
        match self {
            Mode::Strict => STRICT_CLAUSE,
            Mode::Free => FREE_CLAUSE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PromptBuilder {
    system_prompt: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self { system_prompt: system_prompt.into() }
    }

    /// Load the role description from a template file. Blank files are rejected.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?;
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("Prompt file {} is empty", path.display());
        }
        Ok(Self::new(text))
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn build(&self, thought: &str, mode: Mode) -> String {
        format!(
            "{}\n\n{}\n\n{}\n\nUser's thought: {}",
            self.system_prompt,
            SHAPE,
            mode.clause(),
            thought
        )
    }
}
