use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Affirmative,
    Confirm,
    Reject,
}

/// Phrases that signal each intent. Matching is case-insensitive substring
/// containment, so "Sí, claro" counts as affirmative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Vocabulary {
    pub affirmative: Vec<String>,
    pub confirm: Vec<String>,
    pub reject: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            affirmative: words(&["si", "sí", "yes"]),
            confirm: words(&["confirma", "confirm"]),
            reject: words(&["rechaza", "cancelar", "no"]),
        }
    }
}

impl Vocabulary {
    pub fn tokens(&self, intent: Intent) -> &[String] {
        match intent {
            Intent::Affirmative => &self.affirmative,
            Intent::Confirm => &self.confirm,
            Intent::Reject => &self.reject,
        }
    }

    pub fn matches(&self, intent: Intent, text: &str) -> bool {
        let text = text.to_lowercase();
        self.tokens(intent)
            .iter()
            .filter(|token| !token.is_empty())
            .any(|token| text.contains(&token.to_lowercase()))
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}
