//! Tests for the eSpeak engine

#[cfg(test)]
mod tests {
    use crate::EspeakEngine;
    use std::path::Path;
    use voxchat_tts::types::{SynthesisOptions, TtsConfig};
    use voxchat_tts::TtsEngine;

    #[tokio::test]
    async fn engine_creation() {
        let engine = EspeakEngine::new();
        assert_eq!(engine.name(), "eSpeak");
    }

    #[tokio::test]
    async fn availability_probe_does_not_panic() {
        let engine = EspeakEngine::new();
        // Passes whether or not espeak is actually installed
        let _ = engine.is_available().await;
    }

    #[tokio::test]
    async fn synthesis_before_initialize_is_rejected() {
        let engine = EspeakEngine::new();
        let result = engine
            .synthesize_to_file(
                "Hello",
                Path::new("/tmp/never-written.wav"),
                &SynthesisOptions::default(),
            )
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn args_plain_text_at_native_rate() {
        let engine = EspeakEngine::new();
        let options = SynthesisOptions {
            voice: Some("en-us".to_string()),
            speech_rate: Some(1.0),
        };
        let args = engine.build_espeak_args("Hello world", Path::new("/tmp/0.wav"), &options);
        assert_eq!(args[0], "-w");
        assert_eq!(args[1], "/tmp/0.wav");
        assert!(args.windows(2).any(|w| w[0] == "-v" && w[1] == "en-us"));
        assert_eq!(args.last().unwrap(), "Hello world");
        assert!(!args.contains(&"-m".to_string()));
    }

    #[test]
    fn args_wrap_ssml_for_adjusted_rate() {
        let engine = EspeakEngine::new();
        let options = SynthesisOptions {
            voice: Some("en-us".to_string()),
            speech_rate: Some(1.25),
        };
        let args = engine.build_espeak_args("Hello", Path::new("/tmp/0.wav"), &options);
        assert!(args.contains(&"-m".to_string()));
        let doc = args.last().unwrap();
        assert!(doc.contains(r#"<prosody rate="25%">Hello</prosody>"#));
    }

    #[test]
    fn args_fall_back_to_config_defaults() {
        let mut engine = EspeakEngine::new();
        // Only the config carries voice and rate here
        let config = TtsConfig {
            default_voice: Some("de".to_string()),
            speech_rate: 0.8,
            ..TtsConfig::default()
        };
        // initialize() probes for the binary, so poke the config directly
        engine.config = config;
        let args = engine.build_espeak_args("Hallo", Path::new("/tmp/0.wav"), &SynthesisOptions::default());
        assert!(args.windows(2).any(|w| w[0] == "-v" && w[1] == "de"));
        assert!(args.last().unwrap().contains(r#"rate="-20%""#));
    }

    #[test]
    fn voice_list_parsing() {
        let sample = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  en             M  en                   (en 2)
 5  de             F  de                   --
";
        let voices = EspeakEngine::parse_voice_list(sample);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].language, "en");
        assert_eq!(voices[1].id, "de");
    }
}
