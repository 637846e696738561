//! Real audio output backed by rodio.
//!
//! A dedicated OS thread owns the `OutputStream` and `Sink` (the stream is
//! `!Send`); device calls post commands over a channel and the thread
//! mirrors sink occupancy into atomics for the engine's polling. The sink is
//! recreated after every stop, which sidesteps reuse quirks of a stopped
//! sink.

use crate::device::PlaybackDevice;
use crate::error::DeviceError;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const REFRESH_INTERVAL: Duration = Duration::from_millis(10);

enum DeviceCmd {
    Play(PathBuf),
    Queue(PathBuf),
    Pause,
    Resume,
    Stop,
    Shutdown,
}

pub struct RodioDevice {
    cmd_tx: Sender<DeviceCmd>,
    busy: Arc<AtomicBool>,
    queued: Arc<AtomicBool>,
}

impl RodioDevice {
    /// Open the default output device and spawn the playback thread.
    pub fn open() -> Result<Self, DeviceError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (init_tx, init_rx) = mpsc::channel();
        let busy = Arc::new(AtomicBool::new(false));
        let queued = Arc::new(AtomicBool::new(false));

        let thread_busy = busy.clone();
        let thread_queued = queued.clone();
        std::thread::Builder::new()
            .name("voxchat-playback".into())
            .spawn(move || playback_thread(cmd_rx, init_tx, thread_busy, thread_queued))
            .map_err(|e| DeviceError::Output(format!("failed to spawn playback thread: {}", e)))?;

        init_rx
            .recv()
            .map_err(|_| DeviceError::Output("playback thread exited during init".to_string()))?
            .map_err(DeviceError::Output)?;

        info!("Audio output device opened");
        Ok(Self {
            cmd_tx,
            busy,
            queued,
        })
    }

    fn send(&self, cmd: DeviceCmd) -> Result<(), DeviceError> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| DeviceError::Output("playback thread gone".to_string()))
    }
}

impl PlaybackDevice for RodioDevice {
    fn play(&self, clip: &Path) -> Result<(), DeviceError> {
        // Mark busy up front so the drain loop entered right after this
        // call does not observe a not-yet-refreshed idle state
        self.busy.store(true, Ordering::SeqCst);
        self.queued.store(false, Ordering::SeqCst);
        self.send(DeviceCmd::Play(clip.to_path_buf()))
    }

    fn queue(&self, clip: &Path) -> Result<(), DeviceError> {
        self.queued.store(true, Ordering::SeqCst);
        self.send(DeviceCmd::Queue(clip.to_path_buf()))
    }

    fn has_queued(&self) -> bool {
        self.queued.load(Ordering::SeqCst)
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn pause(&self) {
        let _ = self.send(DeviceCmd::Pause);
    }

    fn resume(&self) {
        let _ = self.send(DeviceCmd::Resume);
    }

    fn stop(&self) {
        self.busy.store(false, Ordering::SeqCst);
        self.queued.store(false, Ordering::SeqCst);
        let _ = self.send(DeviceCmd::Stop);
    }
}

impl Drop for RodioDevice {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(DeviceCmd::Shutdown);
    }
}

fn playback_thread(
    cmd_rx: Receiver<DeviceCmd>,
    init_tx: Sender<Result<(), String>>,
    busy: Arc<AtomicBool>,
    queued: Arc<AtomicBool>,
) {
    let (_stream, handle) = match rodio::OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = init_tx.send(Err(format!("no audio output available: {}", e)));
            return;
        }
    };
    let mut sink = match rodio::Sink::try_new(&handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = init_tx.send(Err(format!("failed to create sink: {}", e)));
            return;
        }
    };
    let _ = init_tx.send(Ok(()));

    loop {
        let mut flow = match cmd_rx.recv_timeout(REFRESH_INTERVAL) {
            Ok(cmd) => apply_cmd(cmd, &mut sink, &handle, &busy),
            Err(RecvTimeoutError::Timeout) => ThreadFlow::Continue,
            Err(RecvTimeoutError::Disconnected) => ThreadFlow::Exit,
        };

        // Drain everything already posted before sampling the sink; a
        // refresh must not overwrite the eager busy flag of a play() that
        // is still sitting in the channel
        while matches!(flow, ThreadFlow::Continue) {
            match cmd_rx.try_recv() {
                Ok(cmd) => flow = apply_cmd(cmd, &mut sink, &handle, &busy),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => flow = ThreadFlow::Exit,
            }
        }
        if matches!(flow, ThreadFlow::Exit) {
            break;
        }

        busy.store(!sink.empty(), Ordering::SeqCst);
        queued.store(sink.len() > 1, Ordering::SeqCst);
    }
    debug!("Playback thread exiting");
}

enum ThreadFlow {
    Continue,
    Exit,
}

fn apply_cmd(
    cmd: DeviceCmd,
    sink: &mut rodio::Sink,
    handle: &rodio::OutputStreamHandle,
    busy: &AtomicBool,
) -> ThreadFlow {
    match cmd {
        DeviceCmd::Play(path) => {
            sink.stop();
            *sink = match rodio::Sink::try_new(handle) {
                Ok(s) => s,
                Err(e) => {
                    error!("Failed to recreate sink: {}", e);
                    busy.store(false, Ordering::SeqCst);
                    return ThreadFlow::Continue;
                }
            };
            append_clip(sink, &path);
            sink.play();
        }
        DeviceCmd::Queue(path) => append_clip(sink, &path),
        DeviceCmd::Pause => sink.pause(),
        DeviceCmd::Resume => sink.play(),
        DeviceCmd::Stop => {
            sink.stop();
            *sink = match rodio::Sink::try_new(handle) {
                Ok(s) => s,
                Err(e) => {
                    error!("Failed to recreate sink after stop: {}", e);
                    return ThreadFlow::Exit;
                }
            };
        }
        DeviceCmd::Shutdown => return ThreadFlow::Exit,
    }
    ThreadFlow::Continue
}

fn append_clip(sink: &rodio::Sink, path: &Path) {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to open clip {:?}: {}", path, e);
            return;
        }
    };
    match rodio::Decoder::new(BufReader::new(file)) {
        Ok(source) => sink.append(source),
        Err(e) => error!("Failed to decode clip {:?}: {}", path, e),
    }
}
