//! Persona and lesson-plan file loading

use seminar_domain::{LessonPlan, Persona};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors while loading roster files
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} contains no entries")]
    Empty { path: String },
}

/// Raw persona entry as authored in the JSON file
#[derive(Debug, Deserialize)]
struct RawPersona {
    name: String,
    llm_persona_prompt: String,
    #[serde(default)]
    learning_styles: Vec<String>,
}

/// Raw lesson-plan entry as authored in the JSON file
#[derive(Debug, Deserialize)]
struct RawLessonPlan {
    #[serde(default)]
    id: Option<String>,
    title: String,
    initial_prompt: String,
}

/// Make a raw persona name safe to use as an identifier.
///
/// Keeps `[A-Za-z0-9_]`; when nothing safe remains, or the result would
/// start with a digit, falls back to an index-based id.
pub fn sanitize_persona_id(index: usize, raw: &str) -> String {
    let base: String = raw.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect();
    match base.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => base,
        _ => format!("S{:03}", index),
    }
}

/// Loader for the persona and lesson-plan JSON files
pub struct RosterLoader;

impl RosterLoader {
    /// Load personas, capping the roster at `limit` when given.
    pub fn load_personas(path: &Path, limit: Option<usize>) -> Result<Vec<Persona>, RosterError> {
        let raw: Vec<RawPersona> = read_json(path)?;
        if raw.is_empty() {
            return Err(RosterError::Empty {
                path: path.display().to_string(),
            });
        }

        let take = limit.unwrap_or(raw.len());
        let personas: Vec<Persona> = raw
            .into_iter()
            .take(take)
            .enumerate()
            .map(|(i, p)| {
                Persona::new(sanitize_persona_id(i + 1, &p.name), p.name, p.llm_persona_prompt)
                    .with_learning_styles(p.learning_styles)
            })
            .collect();

        info!(count = personas.len(), path = %path.display(), "personas loaded");
        Ok(personas)
    }

    pub fn load_lesson_plans(path: &Path) -> Result<Vec<LessonPlan>, RosterError> {
        let raw: Vec<RawLessonPlan> = read_json(path)?;
        if raw.is_empty() {
            return Err(RosterError::Empty {
                path: path.display().to_string(),
            });
        }

        let plans: Vec<LessonPlan> = raw
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let id = p.id.unwrap_or_else(|| format!("plan-{}", i + 1));
                LessonPlan::new(id, p.title, p.initial_prompt)
            })
            .collect();

        info!(count = plans.len(), path = %path.display(), "lesson plans loaded");
        Ok(plans)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RosterError> {
    let content = std::fs::read_to_string(path).map_err(|e| RosterError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| RosterError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_sanitize_keeps_safe_names() {
        assert_eq!(sanitize_persona_id(1, "Alice_Wang"), "Alice_Wang");
        assert_eq!(sanitize_persona_id(1, "Bob-2"), "Bob2");
    }

    #[test]
    fn test_sanitize_falls_back_on_unsafe_names() {
        assert_eq!(sanitize_persona_id(7, "小美"), "S007");
        assert_eq!(sanitize_persona_id(12, "42nd"), "S012");
        assert_eq!(sanitize_persona_id(3, ""), "S003");
    }

    #[test]
    fn test_load_personas_with_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "personas.json",
            r#"[
                {"name": "Alice", "llm_persona_prompt": "You are Alice.", "learning_styles": ["visual"]},
                {"name": "Bob", "llm_persona_prompt": "You are Bob."},
                {"name": "Carol", "llm_persona_prompt": "You are Carol."}
            ]"#,
        );

        let personas = RosterLoader::load_personas(&path, Some(2)).unwrap();
        assert_eq!(personas.len(), 2);
        assert_eq!(personas[0].id.as_str(), "Alice");
        assert_eq!(personas[0].learning_styles, vec!["visual"]);
        assert_eq!(personas[1].display_name, "Bob");
    }

    #[test]
    fn test_load_lesson_plans_assigns_missing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "lesson_plans.json",
            r#"[
                {"id": "lp-frac", "title": "Fractions", "initial_prompt": "Split a pizza."},
                {"title": "Photosynthesis", "initial_prompt": "How do plants eat?"}
            ]"#,
        );

        let plans = RosterLoader::load_lesson_plans(&path).unwrap();
        assert_eq!(plans[0].id.as_str(), "lp-frac");
        assert_eq!(plans[1].id.as_str(), "plan-2");
    }

    #[test]
    fn test_empty_roster_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "personas.json", "[]");
        assert!(matches!(
            RosterLoader::load_personas(&path, None),
            Err(RosterError::Empty { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::path::Path::new("/nonexistent/personas.json");
        assert!(matches!(
            RosterLoader::load_personas(path, None),
            Err(RosterError::Io { .. })
        ));
    }
}
