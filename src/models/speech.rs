use serde::Serialize;

pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";

/// Raw synthesized audio. Decoding and playback are left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechAudio {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl SpeechAudio {
    /// Sample rate declared through a `rate=` MIME parameter, if any.
    pub fn sample_rate(&self) -> Option<u32> {
        self.mime_type
            .split(';')
            .map(str::trim)
            .find_map(|param| param.strip_prefix("rate="))
            .and_then(|rate| rate.parse().ok())
    }

    pub fn is_raw_pcm(&self) -> bool {
        let lower = self.mime_type.to_ascii_lowercase();
        lower.starts_with("audio/l16") || lower.contains("codec=pcm")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_from_mime() {
        let audio = SpeechAudio {
            data: vec![0, 1],
            mime_type: "audio/L16;codec=pcm;rate=24000".into(),
        };
        assert_eq!(audio.sample_rate(), Some(24000));
        assert!(audio.is_raw_pcm());

        let wav = SpeechAudio {
            data: vec![],
            mime_type: "audio/wav".into(),
        };
        assert_eq!(wav.sample_rate(), None);
        assert!(!wav.is_raw_pcm());
    }
}
