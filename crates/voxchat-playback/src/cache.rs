//! On-disk clip cache with deterministic addressing.
//!
//! Clips live at `<root>/<session>/<message>/<sentence>.wav`. The identity
//! key deliberately excludes voice and speech rate to match the reference
//! behavior; `include_voice_in_key` opts into a stricter key that encodes
//! both, invalidating cached clips when the session voice changes.

use crate::types::{MessageId, SessionId};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ClipCache {
    root: PathBuf,
    include_voice_in_key: bool,
}

impl ClipCache {
    pub fn new(root: impl Into<PathBuf>, include_voice_in_key: bool) -> Self {
        Self {
            root: root.into(),
            include_voice_in_key,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn message_dir(&self, session: SessionId, message: MessageId) -> PathBuf {
        self.root.join(session.to_string()).join(message.to_string())
    }

    /// Deterministic path for one sentence's clip.
    pub fn clip_path(
        &self,
        session: SessionId,
        message: MessageId,
        sentence_id: u32,
        voice: &str,
        speech_rate: f32,
    ) -> PathBuf {
        let file_name = if self.include_voice_in_key {
            // Rate encoded in thousandths so 1.25 and 1.2 stay distinct
            format!(
                "{}-{}-{}.wav",
                sentence_id,
                sanitize(voice),
                (speech_rate * 1000.0).round() as i64
            )
        } else {
            format!("{}.wav", sentence_id)
        };
        self.message_dir(session, message).join(file_name)
    }

    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }

    pub async fn ensure_message_dir(
        &self,
        session: SessionId,
        message: MessageId,
    ) -> io::Result<()> {
        tokio::fs::create_dir_all(self.message_dir(session, message)).await
    }

    /// Remove every cached clip for one message. A missing directory is Ok.
    pub async fn remove_message_audio(
        &self,
        session: SessionId,
        message: MessageId,
    ) -> io::Result<()> {
        match tokio::fs::remove_dir_all(self.message_dir(session, message)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_layout_excludes_voice_by_default() {
        let cache = ClipCache::new("/data/audio", false);
        let path = cache.clip_path(3, 14, 2, "en-US-Neural", 1.5);
        assert_eq!(path, PathBuf::from("/data/audio/3/14/2.wav"));
    }

    #[test]
    fn voice_keyed_layout_encodes_voice_and_rate() {
        let cache = ClipCache::new("/data/audio", true);
        let path = cache.clip_path(3, 14, 2, "en US:Neural", 1.25);
        assert_eq!(path, PathBuf::from("/data/audio/3/14/2-en_US_Neural-1250.wav"));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ClipCache::new(dir.path(), false);

        // Nothing cached yet: both calls are no-ops
        cache.remove_message_audio(1, 1).await.unwrap();
        cache.remove_message_audio(1, 1).await.unwrap();

        cache.ensure_message_dir(1, 1).await.unwrap();
        let clip = cache.clip_path(1, 1, 0, "v1", 1.0);
        tokio::fs::write(&clip, b"riff").await.unwrap();
        assert!(cache.exists(&clip).await);

        cache.remove_message_audio(1, 1).await.unwrap();
        assert!(!cache.exists(&clip).await);
        cache.remove_message_audio(1, 1).await.unwrap();
    }
}
