//! Voice persona catalog
//!
//! Personas are presentation-level choices. The speech engine only receives
//! the persona's language; prosody comes from the user's sliders.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_VOICE_ID: &str = "ru-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Russian,
    English,
}

impl Language {
    /// BCP 47 tag passed to the speech engine
    pub fn tag(&self) -> &'static str {
        match self {
            Language::Russian => "ru-RU",
            Language::English => "en-US",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Russian => write!(f, "Russian"),
            Language::English => write!(f, "English"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn symbol(&self) -> char {
        match self {
            Gender::Male => '♂',
            Gender::Female => '♀',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub gender: Gender,
    pub language: Language,
    pub description: &'static str,
}

const fn voice(
    id: &'static str,
    name: &'static str,
    gender: Gender,
    language: Language,
    description: &'static str,
) -> VoiceProfile {
    VoiceProfile {
        id,
        name,
        gender,
        language,
        description,
    }
}

use Gender::{Female, Male};
use Language::{English, Russian};

pub static VOICES: [VoiceProfile; 20] = [
    voice("ru-1", "Александр", Male, Russian, "Confident male voice"),
    voice("ru-2", "Дмитрий", Male, Russian, "Deep velvety timbre"),
    voice("ru-3", "Михаил", Male, Russian, "Energetic and dynamic"),
    voice("ru-4", "Николай", Male, Russian, "Calm and measured"),
    voice("ru-5", "Сергей", Male, Russian, "Warm friendly voice"),
    voice("ru-6", "Анастасия", Female, Russian, "Soft female voice"),
    voice("ru-7", "Екатерина", Female, Russian, "Professional and clear"),
    voice("ru-8", "Мария", Female, Russian, "Gentle and pleasant"),
    voice("ru-9", "Ольга", Female, Russian, "Expressive and bright"),
    voice("ru-10", "Юлия", Female, Russian, "Young lively voice"),
    voice("en-1", "James", Male, English, "Authoritative British voice"),
    voice("en-2", "Michael", Male, English, "Warm American voice"),
    voice("en-3", "William", Male, English, "Professional narrator"),
    voice("en-4", "David", Male, English, "Deep resonant tone"),
    voice("en-5", "Robert", Male, English, "Friendly conversational"),
    voice("en-6", "Emma", Female, English, "Clear British accent"),
    voice("en-7", "Olivia", Female, English, "Soft American voice"),
    voice("en-8", "Sophia", Female, English, "Professional presenter"),
    voice("en-9", "Charlotte", Female, English, "Energetic and bright"),
    voice("en-10", "Isabella", Female, English, "Elegant and refined"),
];

static BY_ID: Lazy<HashMap<&'static str, &'static VoiceProfile>> =
    Lazy::new(|| VOICES.iter().map(|v| (v.id, v)).collect());

/// Look up a persona by id
pub fn find_voice(id: &str) -> Option<&'static VoiceProfile> {
    BY_ID.get(id).copied()
}

/// The persona used when nothing (or something unknown) is configured
pub fn default_voice() -> &'static VoiceProfile {
    &VOICES[0]
}

/// All personas for one language, in catalog order
pub fn voices_for(language: Language) -> impl Iterator<Item = &'static VoiceProfile> {
    VOICES.iter().filter(move |v| v.language == language)
}
