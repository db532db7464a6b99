//! Generation styles and their persona prompts.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Suffix appended to the persona when search context is supplied.
const CONTEXT_SUFFIX: &str = " When provided with recent news context, incorporate those current events into your hot take to make it timely and relevant. Use the news to support your perspective or provide counterpoints.";

/// The recognized generation styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Controversial,
    Sarcastic,
    Optimistic,
    Pessimistic,
    Absurd,
    Analytical,
    Philosophical,
    Witty,
    Contrarian,
}

impl Style {
    pub const ALL: [Style; 9] = [
        Style::Controversial,
        Style::Sarcastic,
        Style::Optimistic,
        Style::Pessimistic,
        Style::Absurd,
        Style::Analytical,
        Style::Philosophical,
        Style::Witty,
        Style::Contrarian,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Controversial => "controversial",
            Self::Sarcastic => "sarcastic",
            Self::Optimistic => "optimistic",
            Self::Pessimistic => "pessimistic",
            Self::Absurd => "absurd",
            Self::Analytical => "analytical",
            Self::Philosophical => "philosophical",
            Self::Witty => "witty",
            Self::Contrarian => "contrarian",
        }
    }

    /// Style names in alphabetical order.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<_> = Self::ALL.iter().map(Style::as_str).collect();
        names.sort_unstable();
        names
    }

    fn persona(&self) -> &'static str {
        match self {
            Self::Controversial => "You are a provocative opinion generator. Create bold, controversial takes that challenge conventional wisdom. Be edgy but thoughtful.",
            Self::Sarcastic => "You are a sarcastic commentator. Generate witty, sarcastic hot takes with a sharp sense of humor.",
            Self::Optimistic => "You are an optimistic contrarian. Generate positive, uplifting hot takes that find the good in everything.",
            Self::Pessimistic => "You are a cynical realist. Generate pessimistic hot takes that highlight the worst-case scenarios.",
            Self::Absurd => "You are an absurdist philosopher. Generate completely ridiculous and absurd hot takes that make people laugh.",
            Self::Analytical => "You are a deep analytical thinker. Generate hot takes that break down complex topics with nuanced analysis.",
            Self::Philosophical => "You are a modern philosopher. Generate hot takes that question fundamental assumptions about life and society.",
            Self::Witty => "You are a clever wordsmith. Generate hot takes that are clever, punchy, and memorable.",
            Self::Contrarian => "You are a professional contrarian. Always take the opposite stance from popular opinion, but back it up with reasoning.",
        }
    }

    /// The system prompt for this style.
    pub fn system_prompt(&self, with_context: bool) -> String {
        if with_context {
            format!("{}{}", self.persona(), CONTEXT_SUFFIX)
        } else {
            self.persona().to_string()
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown style name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown style '{0}'")]
pub struct UnknownStyle(pub String);

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == wanted)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}
