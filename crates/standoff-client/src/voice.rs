//! Speaker to voice resolution.

use std::collections::HashMap;

use standoff_core::speech::VoiceProfile;

/// Language of the default voice.
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";
/// Name of the default voice.
pub const DEFAULT_VOICE_NAME: &str = "en-US-Standard-D";

/// Maps NPC speaker ids to synthesis voices. Unknown speakers get the
/// default voice.
#[derive(Debug, Clone)]
pub struct VoiceMap {
    voices: HashMap<String, VoiceProfile>,
    fallback: VoiceProfile,
}

impl Default for VoiceMap {
    fn default() -> Self {
        Self::new(VoiceProfile {
            language_code: DEFAULT_LANGUAGE_CODE.to_owned(),
            name: DEFAULT_VOICE_NAME.to_owned(),
        })
    }
}

impl VoiceMap {
    /// Creates a map where every speaker uses `fallback`.
    #[must_use]
    pub fn new(fallback: VoiceProfile) -> Self {
        Self {
            voices: HashMap::new(),
            fallback,
        }
    }

    /// Assigns a voice to `speaker_id`.
    #[must_use]
    pub fn with_voice(mut self, speaker_id: impl Into<String>, voice: VoiceProfile) -> Self {
        self.voices.insert(speaker_id.into(), voice);
        self
    }

    /// The voice for `speaker_id`.
    #[must_use]
    pub fn resolve(&self, speaker_id: &str) -> &VoiceProfile {
        self.voices.get(speaker_id).unwrap_or(&self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_speaker_gets_default_voice() {
        let voices = VoiceMap::default();
        let voice = voices.resolve("thug");
        assert_eq!(voice.language_code, "en-US");
        assert_eq!(voice.name, "en-US-Standard-D");
    }

    #[test]
    fn test_assigned_voice_wins() {
        let bouncer = VoiceProfile {
            language_code: "en-GB".into(),
            name: "en-GB-Standard-B".into(),
        };
        let voices = VoiceMap::default().with_voice("bouncer", bouncer.clone());
        assert_eq!(voices.resolve("bouncer"), &bouncer);
        assert_eq!(voices.resolve("thug").name, DEFAULT_VOICE_NAME);
    }
}
