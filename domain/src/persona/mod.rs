//! Persona entities
//!
//! A persona is a configured digital-twin identity driving one simulated
//! participant. Personas are loaded once at startup and shared read-only
//! across groups.

use serde::{Deserialize, Serialize};

/// Identifier of a persona (Value Object)
///
/// Sanitized at load time to `[A-Za-z0-9_]` so it is safe to use as a
/// speaker name in prompts and as a database key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonaId(String);

impl PersonaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PersonaId {
    fn from(s: &str) -> Self {
        PersonaId::new(s)
    }
}

impl From<String> for PersonaId {
    fn from(s: String) -> Self {
        PersonaId::new(s)
    }
}

/// A simulated discussion participant (Entity)
///
/// `prompt` is the free-text behavioral prompt that becomes the system
/// message for every utterance this persona generates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: PersonaId,
    pub display_name: String,
    pub prompt: String,
    /// Learning-style tags from the roster file (e.g. "visual", "verbal").
    #[serde(default)]
    pub learning_styles: Vec<String>,
}

impl Persona {
    pub fn new(
        id: impl Into<PersonaId>,
        display_name: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            prompt: prompt.into(),
            learning_styles: Vec::new(),
        }
    }

    pub fn with_learning_styles(mut self, styles: Vec<String>) -> Self {
        self.learning_styles = styles;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_creation() {
        let p = Persona::new("S001", "Alice", "You are a curious student.");
        assert_eq!(p.id.as_str(), "S001");
        assert_eq!(p.display_name, "Alice");
        assert!(p.learning_styles.is_empty());
    }

    #[test]
    fn test_persona_with_learning_styles() {
        let p = Persona::new("S002", "Bob", "You prefer diagrams.")
            .with_learning_styles(vec!["visual".to_string()]);
        assert_eq!(p.learning_styles, vec!["visual"]);
    }

    #[test]
    fn test_persona_id_display() {
        let id: PersonaId = "S003".into();
        assert_eq!(id.to_string(), "S003");
    }
}
