//! Background clip generation.
//!
//! One worker task per playback request walks its sentence slice in order,
//! reuses cached clips, synthesizes the rest, and appends ready clips to
//! the epoch-guarded queue. A raised one-shot stop flag aborts the run and
//! clears itself; a rejected queue append means a newer run took over and
//! the worker winds down quietly. A single failed sentence is logged and
//! skipped, never fatal for the run.

use crate::cache::ClipCache;
use crate::queue::ClipQueue;
use crate::types::{Epoch, MessageId, ReadyClip, Sentence, SessionId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use voxchat_tts::{SynthesisOptions, TtsEngine};

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub session_id: SessionId,
    pub message_id: MessageId,
    pub sentences: Vec<Sentence>,
    pub voice: String,
    pub speech_rate: f32,
}

/// What a finished worker did, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    pub synthesized: usize,
    pub cached: usize,
    pub failed: usize,
    pub aborted: bool,
}

/// Spawn the generation worker for one playback run.
pub fn spawn(
    tts: Arc<dyn TtsEngine>,
    cache: Arc<ClipCache>,
    queue: Arc<ClipQueue>,
    stop_flag: Arc<AtomicBool>,
    epoch: Epoch,
    request: GenerationRequest,
) -> JoinHandle<GenerationSummary> {
    tokio::spawn(async move {
        let mut summary = GenerationSummary::default();

        for sentence in &request.sentences {
            // One-shot: a raised flag aborts this run and lowers itself
            if stop_flag.swap(false, Ordering::SeqCst) {
                info!(
                    epoch = epoch.value(),
                    "Generation aborted at sentence {}", sentence.id
                );
                summary.aborted = true;
                break;
            }

            let clip = match ensure_clip(&*tts, &cache, &request, sentence, &mut summary).await {
                Some(clip) => clip,
                None => continue,
            };

            if !queue.push(epoch, clip) {
                debug!(
                    epoch = epoch.value(),
                    "Generation superseded; discarding output from sentence {}", sentence.id
                );
                summary.aborted = true;
                break;
            }
        }

        debug!(
            epoch = epoch.value(),
            synthesized = summary.synthesized,
            cached = summary.cached,
            failed = summary.failed,
            aborted = summary.aborted,
            "Generation worker finished"
        );
        summary
    })
}

/// Fill the clip cache for a sentence range without playing anything.
pub fn spawn_pregenerate(
    tts: Arc<dyn TtsEngine>,
    cache: Arc<ClipCache>,
    request: GenerationRequest,
) -> JoinHandle<GenerationSummary> {
    tokio::spawn(async move {
        let mut summary = GenerationSummary::default();
        for sentence in &request.sentences {
            ensure_clip(&*tts, &cache, &request, sentence, &mut summary).await;
        }
        info!(
            session = request.session_id,
            message = request.message_id,
            synthesized = summary.synthesized,
            cached = summary.cached,
            failed = summary.failed,
            "Pregeneration finished"
        );
        summary
    })
}

/// Produce the clip for one sentence, reusing the cache when possible.
/// Returns `None` on synthesis failure (already logged and counted).
async fn ensure_clip(
    tts: &dyn TtsEngine,
    cache: &ClipCache,
    request: &GenerationRequest,
    sentence: &Sentence,
    summary: &mut GenerationSummary,
) -> Option<ReadyClip> {
    let path = cache.clip_path(
        request.session_id,
        request.message_id,
        sentence.id,
        &request.voice,
        request.speech_rate,
    );

    if cache.exists(&path).await {
        summary.cached += 1;
        return Some(ReadyClip {
            sentence_id: sentence.id,
            path,
        });
    }

    if let Err(e) = cache
        .ensure_message_dir(request.session_id, request.message_id)
        .await
    {
        warn!("Failed to create audio directory: {}", e);
        summary.failed += 1;
        return None;
    }

    let options = SynthesisOptions {
        voice: Some(request.voice.clone()),
        speech_rate: Some(request.speech_rate),
    };
    match tts.synthesize_to_file(&sentence.text, &path, &options).await {
        Ok(()) => {
            summary.synthesized += 1;
            Some(ReadyClip {
                sentence_id: sentence.id,
                path,
            })
        }
        Err(e) => {
            // Fatal for this sentence only; the run continues
            warn!("Synthesis failed for sentence {}: {}", sentence.id, e);
            summary.failed += 1;
            None
        }
    }
}
