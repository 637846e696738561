//! Public entry point of the pipeline.
//!
//! Wires generation-worker output to the playback engine, forwards progress
//! events to the caller's sink, and applies the catch-up policy: when a run
//! drains before reaching its intended last sentence and the engine was not
//! deliberately stopped, playback restarts right after the last audible
//! sentence with the stale generation told to stand down.

use crate::cache::ClipCache;
use crate::engine::PlaybackEngine;
use crate::error::PlaybackError;
use crate::events::{EventSink, PlaybackEvent};
use crate::generator::{self, GenerationRequest, GenerationSummary};
use crate::types::{Epoch, MessageId, Sentence, SessionId};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use voxchat_tts::TtsEngine;

/// One playback request as supplied by the message-handling collaborator.
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub session_id: SessionId,
    pub message_id: MessageId,
    /// Ordered ascending by playback order; ids need not be dense
    pub sentences: Vec<Sentence>,
    pub voice: String,
    pub speech_rate: f32,
}

pub struct PlaybackOrchestrator {
    engine: Arc<PlaybackEngine>,
    tts: Arc<dyn TtsEngine>,
    cache: Arc<ClipCache>,
}

impl PlaybackOrchestrator {
    pub fn new(engine: Arc<PlaybackEngine>, tts: Arc<dyn TtsEngine>, cache: Arc<ClipCache>) -> Self {
        Self { engine, tts, cache }
    }

    pub fn engine(&self) -> &Arc<PlaybackEngine> {
        &self.engine
    }

    /// Play exactly one sentence of the message.
    pub async fn play_sentence(
        &self,
        request: PlayRequest,
        sentence_id: u32,
        sink: &dyn EventSink,
    ) -> Result<(), PlaybackError> {
        validate(&request)?;
        let sentence = request
            .sentences
            .iter()
            .find(|s| s.id == sentence_id)
            .cloned()
            .ok_or_else(|| {
                PlaybackError::Config(format!("sentence {} not in message", sentence_id))
            })?;
        self.play_range(&request, vec![sentence], sink).await
    }

    /// Play from `start_sentence_id` through the end of the message.
    pub async fn play_sentences(
        &self,
        request: PlayRequest,
        start_sentence_id: u32,
        sink: &dyn EventSink,
    ) -> Result<(), PlaybackError> {
        validate(&request)?;
        let start = request
            .sentences
            .partition_point(|s| s.id < start_sentence_id);
        let range = request.sentences[start..].to_vec();
        if range.is_empty() {
            return Err(PlaybackError::Config(format!(
                "no sentences at or after id {}",
                start_sentence_id
            )));
        }
        self.play_range(&request, range, sink).await
    }

    /// Resume if the engine holds a clip, otherwise start the message from
    /// its first sentence.
    pub async fn play_or_resume(
        &self,
        request: PlayRequest,
        sink: &dyn EventSink,
    ) -> Result<(), PlaybackError> {
        if self.engine.is_busy() {
            self.engine.resume();
            return Ok(());
        }
        validate(&request)?;
        let first_id = request.sentences[0].id;
        self.play_sentences(request, first_id, sink).await
    }

    pub fn pause(&self) {
        self.engine.pause();
    }

    pub fn resume(&self) {
        self.engine.resume();
    }

    pub fn stop(&self) {
        self.engine.stop();
    }

    pub fn is_busy(&self) -> bool {
        self.engine.is_busy()
    }

    /// Fill the clip cache for `[start_sentence_id, end_sentence_id]`
    /// without playing.
    pub fn pregenerate(
        &self,
        request: PlayRequest,
        start_sentence_id: u32,
        end_sentence_id: u32,
    ) -> Result<JoinHandle<GenerationSummary>, PlaybackError> {
        validate(&request)?;
        let sentences: Vec<Sentence> = request
            .sentences
            .iter()
            .filter(|s| s.id >= start_sentence_id && s.id <= end_sentence_id)
            .cloned()
            .collect();
        if sentences.is_empty() {
            return Err(PlaybackError::Config(format!(
                "no sentences in range {}..={}",
                start_sentence_id, end_sentence_id
            )));
        }
        Ok(generator::spawn_pregenerate(
            self.tts.clone(),
            self.cache.clone(),
            GenerationRequest {
                session_id: request.session_id,
                message_id: request.message_id,
                sentences,
                voice: request.voice,
                speech_rate: request.speech_rate,
            },
        ))
    }

    /// Invalidate every cached clip of a message (edit/delete). Idempotent.
    pub async fn remove_message_audio(
        &self,
        session_id: SessionId,
        message_id: MessageId,
    ) -> Result<(), PlaybackError> {
        self.cache
            .remove_message_audio(session_id, message_id)
            .await?;
        Ok(())
    }

    /// Core sequencing: Starting event, fresh epoch, worker spawn, first-clip
    /// wait, drain hand-off, catch-up restarts until the intended end
    /// sentence is reached or the caller stops deliberately.
    async fn play_range(
        &self,
        request: &PlayRequest,
        mut remaining: Vec<Sentence>,
        sink: &dyn EventSink,
    ) -> Result<(), PlaybackError> {
        let end_id = match remaining.last() {
            Some(s) => s.id,
            None => return Ok(()),
        };

        loop {
            sink.deliver(PlaybackEvent::Starting).await?;

            let epoch = Epoch::next();
            self.engine.begin(epoch);
            let queue = self.engine.queue();

            let worker = generator::spawn(
                self.tts.clone(),
                self.cache.clone(),
                queue.clone(),
                self.engine.new_generation_flag(),
                epoch,
                GenerationRequest {
                    session_id: request.session_id,
                    message_id: request.message_id,
                    sentences: remaining.clone(),
                    voice: request.voice.clone(),
                    speech_rate: request.speech_rate,
                },
            );

            // Cooperative wait for the first clip; also wakes on a caller
            // stop and on a worker that finished without producing anything
            // (every synthesis failed), so this can never hang the request.
            while queue.is_empty(epoch) {
                if self.engine.is_stopping() || worker.is_finished() {
                    break;
                }
                tokio::time::sleep(self.engine.poll_interval()).await;
            }

            if queue.is_empty(epoch) {
                info!(
                    session = request.session_id,
                    message = request.message_id,
                    "No clips to play; ending run"
                );
                sink.deliver(PlaybackEvent::Finished).await?;
                return Ok(());
            }

            let outcome = self.engine.run(epoch, sink).await?;

            let last = match outcome.last_played {
                // Queue was cleared out from under the run before its first
                // pop; the engine already emitted the terminal event
                None => return Ok(()),
                Some(last) => last,
            };

            if last == end_id || self.engine.is_stopping() {
                return Ok(());
            }

            // Stall: playback ran dry before the intended end. Abandon the
            // lagging generation and restart right after the last audible
            // sentence.
            warn!(
                session = request.session_id,
                message = request.message_id,
                "Playback stalled at sentence {}; catching up", last
            );
            self.engine.request_stop_generating();
            let resume_at = remaining.partition_point(|s| s.id <= last);
            remaining.drain(..resume_at);
            if remaining.is_empty() {
                return Ok(());
            }
        }
    }
}

fn validate(request: &PlayRequest) -> Result<(), PlaybackError> {
    if request.voice.trim().is_empty() {
        return Err(PlaybackError::Config("voice name is empty".to_string()));
    }
    if !request.speech_rate.is_finite() || request.speech_rate <= 0.0 {
        return Err(PlaybackError::Config(format!(
            "speech rate must be positive, got {}",
            request.speech_rate
        )));
    }
    if request.sentences.is_empty() {
        return Err(PlaybackError::Config("no sentences supplied".to_string()));
    }
    if request.sentences.windows(2).any(|w| w[0].id >= w[1].id) {
        return Err(PlaybackError::Config(
            "sentence ids must be strictly ascending".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ids: &[u32]) -> PlayRequest {
        PlayRequest {
            session_id: 1,
            message_id: 1,
            sentences: ids.iter().map(|&id| Sentence::new(id, "text")).collect(),
            voice: "v1".to_string(),
            speech_rate: 1.0,
        }
    }

    #[test]
    fn validation_rejects_bad_requests() {
        let mut r = request(&[0, 1]);
        r.voice = " ".to_string();
        assert!(validate(&r).is_err());

        let mut r = request(&[0, 1]);
        r.speech_rate = 0.0;
        assert!(validate(&r).is_err());

        let r = request(&[]);
        assert!(validate(&r).is_err());

        let r = request(&[0, 1, 2]);
        assert!(validate(&r).is_ok());
    }

    #[test]
    fn validation_rejects_unordered_sentences() {
        let mut r = request(&[0, 2]);
        r.sentences.push(Sentence::new(1, "late"));
        assert!(validate(&r).is_err());
    }
}
