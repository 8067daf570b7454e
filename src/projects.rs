//! Saved text projects
//!
//! Kept in memory for the session only, newest first.

use crate::voices::DEFAULT_VOICE_ID;
use crate::{Result, SpeechClipError};
use chrono::{DateTime, Local};
use log::debug;

const DEMO_NAME: &str = "Демо озвучка";
const DEMO_TEXT: &str = "Привет! Это демонстрация синтезатора речи.";

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Milliseconds since the epoch at save time
    pub id: i64,
    pub name: String,
    pub text: String,
    pub voice_id: String,
    pub created: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct ProjectList {
    projects: Vec<Project>,
}

impl ProjectList {
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding the demo project
    pub fn with_demo() -> Self {
        let created = Local::now();
        Self {
            projects: vec![Project {
                id: created.timestamp_millis(),
                name: DEMO_NAME.to_string(),
                text: DEMO_TEXT.to_string(),
                voice_id: DEFAULT_VOICE_ID.to_string(),
                created,
            }],
        }
    }

    /// Save `text` as a new project at the top of the list
    pub fn save(&mut self, text: &str, voice_id: &str) -> Result<&Project> {
        if text.trim().is_empty() {
            return Err(SpeechClipError::EmptyInput("no text to save".into()));
        }

        let created = Local::now();
        let project = Project {
            id: created.timestamp_millis(),
            name: format!("Project {}", self.projects.len() + 1),
            text: text.to_string(),
            voice_id: voice_id.to_string(),
            created,
        };
        debug!("Saved {} ({} chars)", project.name, project.text.len());

        self.projects.insert(0, project);
        Ok(&self.projects[0])
    }

    /// Project at `index`, 0 being the newest
    pub fn get(&self, index: usize) -> Option<&Project> {
        self.projects.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_project() {
        let list = ProjectList::with_demo();
        assert_eq!(list.len(), 1);
        let demo = list.get(0).unwrap();
        assert_eq!(demo.name, "Демо озвучка");
        assert_eq!(demo.text, "Привет! Это демонстрация синтезатора речи.");
        assert_eq!(demo.voice_id, DEFAULT_VOICE_ID);
    }

    #[test]
    fn test_save_newest_first() {
        let mut list = ProjectList::with_demo();
        list.save("first", "ru-2").unwrap();
        list.save("second", "en-1").unwrap();

        assert_eq!(list.len(), 3);
        let newest = list.get(0).unwrap();
        assert_eq!(newest.name, "Project 3");
        assert_eq!(newest.text, "second");
        assert_eq!(newest.voice_id, "en-1");
        assert_eq!(list.get(1).unwrap().name, "Project 2");
    }

    #[test]
    fn test_save_rejects_blank_text() {
        let mut list = ProjectList::new();
        assert!(matches!(
            list.save("   ", "ru-1"),
            Err(SpeechClipError::EmptyInput(_))
        ));
        assert!(list.is_empty());
    }
}
