//! Script and cast models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line of dialogue in a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Character speaking this line
    pub speaker: String,
    /// The spoken line
    pub line: String,
}

/// An ordered sequence of scenes.
///
/// Immutable once the script stage completes; set exactly once per project
/// (retry re-runs the stage, which overwrites the whole script).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    pub scenes: Vec<Scene>,
    pub created_at: DateTime<Utc>,
}

impl Script {
    /// Create a script from scenes.
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self {
            scenes,
            created_at: Utc::now(),
        }
    }

    /// Distinct speakers in order of first appearance.
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for scene in &self.scenes {
            if !seen.contains(&scene.speaker.as_str()) {
                seen.push(scene.speaker.as_str());
            }
        }
        seen
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }
}

/// Voice settings assigned to one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VoiceAssignment {
    /// TTS voice identifier
    pub voice_id: String,
    /// Pitch adjustment, e.g. "+0Hz"
    #[serde(default = "default_pitch")]
    pub pitch: String,
    /// Rate adjustment, e.g. "+0%"
    #[serde(default = "default_rate")]
    pub rate: String,
}

fn default_pitch() -> String {
    "+0Hz".to_string()
}

fn default_rate() -> String {
    "+0%".to_string()
}

impl VoiceAssignment {
    /// Assignment with neutral pitch and rate.
    pub fn new(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            pitch: default_pitch(),
            rate: default_rate(),
        }
    }
}

/// Speaker -> voice assignments for a project.
///
/// BTreeMap keeps serialization order stable across round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CastList(pub BTreeMap<String, VoiceAssignment>);

impl CastList {
    pub fn get(&self, speaker: &str) -> Option<&VoiceAssignment> {
        self.0.get(speaker)
    }

    pub fn insert(&mut self, speaker: impl Into<String>, assignment: VoiceAssignment) {
        self.0.insert(speaker.into(), assignment);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that every speaker in the script has an assignment.
    pub fn covers(&self, script: &Script) -> bool {
        script.speakers().iter().all(|s| self.0.contains_key(*s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_script() -> Script {
        Script::new(vec![
            Scene {
                speaker: "Ana".into(),
                line: "Did you know Rust has no garbage collector?".into(),
            },
            Scene {
                speaker: "Ben".into(),
                line: "Then who takes out the trash?".into(),
            },
            Scene {
                speaker: "Ana".into(),
                line: "Ownership does.".into(),
            },
        ])
    }

    #[test]
    fn test_speakers_in_first_appearance_order() {
        let script = sample_script();
        assert_eq!(script.speakers(), vec!["Ana", "Ben"]);
    }

    #[test]
    fn test_cast_covers_script() {
        let script = sample_script();
        let mut cast = CastList::default();
        cast.insert("Ana", VoiceAssignment::new("en-US-JennyNeural"));
        assert!(!cast.covers(&script));

        cast.insert("Ben", VoiceAssignment::new("en-US-GuyNeural"));
        assert!(cast.covers(&script));
    }

    #[test]
    fn test_voice_assignment_defaults() {
        let parsed: VoiceAssignment =
            serde_json::from_str(r#"{"voice_id":"en-GB-RyanNeural"}"#).unwrap();
        assert_eq!(parsed.pitch, "+0Hz");
        assert_eq!(parsed.rate, "+0%");
    }
}
