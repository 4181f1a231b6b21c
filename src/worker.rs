//! Background gesture worker.
//!
//! The worker thread owns the frame source, the landmark detector, the motion
//! state and the emission record. It talks to the rest of the application only
//! through channels: commands in, [`WorkerEvent`]s out. The event channel is
//! bounded and written with `try_send`, so a slow consumer costs dropped
//! gestures rather than a stalled camera loop.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use color_eyre::Result;
use tokio::sync::{mpsc, oneshot};

use crate::capture::{FrameSource, LandmarkDetector};
use crate::gesture::{
    classify, Cooldown, EmissionRecord, Gesture, HandLandmarks, MotionState, Point, Thresholds,
};

/// Worker lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Running = 0,
    Stopping = 1,
    Stopped = 2,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

/// Messages sent from the worker thread.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// A gesture passed the cooldown filter.
    Gesture(Gesture),
    /// The camera could not be opened or failed. Sent at most once, then the worker exits.
    Unavailable(String),
}

/// Messages sent to the worker thread.
#[derive(Debug)]
pub enum WorkerCommand {
    Stop,
    Snapshot(oneshot::Sender<WorkerSnapshot>),
}

/// Frame counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerStats {
    /// Frames acquired from the source
    pub frames: u64,
    /// Frames with a well-formed hand
    pub hands: u64,
    /// Gestures approved by the cooldown filter
    pub emitted: u64,
    /// Approved gestures lost because the event channel was full
    pub dropped: u64,
}

/// Copy of the worker's private state, taken on request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerSnapshot {
    pub motion: MotionState,
    pub record: EmissionRecord,
    pub stats: WorkerStats,
}

/// Tuning for the worker loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerSettings {
    pub thresholds: Thresholds,
    pub cooldown: Duration,
    /// Event channel size. One slot is held back for [`WorkerEvent::Unavailable`].
    pub channel_capacity: usize,
    /// Pause before asking the source again when no frame was ready.
    pub retry_interval: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            cooldown: Duration::from_secs(3),
            channel_capacity: 8,
            retry_interval: Duration::from_millis(10),
        }
    }
}

/// Handle to the gesture worker thread.
pub struct GestureWorker {
    command_tx: mpsc::UnboundedSender<WorkerCommand>,
    event_rx: mpsc::Receiver<WorkerEvent>,
    state: Arc<AtomicU8>,
    handle: Option<thread::JoinHandle<()>>,
}

impl GestureWorker {
    /// Spawn the worker. The source is opened on the worker thread.
    pub fn spawn<S, D>(source: S, detector: D, settings: WorkerSettings) -> Result<Self>
    where
        S: FrameSource + Send + 'static,
        D: LandmarkDetector<S::Frame> + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(settings.channel_capacity.max(2));
        let state = Arc::new(AtomicU8::new(WorkerState::Running as u8));
        let state_clone = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name("gesture-worker".to_string())
            .spawn(move || {
                run_worker(source, detector, settings, command_rx, event_tx, state_clone);
            })?;

        Ok(Self {
            command_tx,
            event_rx,
            state,
            handle: Some(handle),
        })
    }

    /// Try to receive a worker event (non-blocking).
    pub fn try_recv(&mut self) -> Option<WorkerEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait for the next worker event.
    ///
    /// `None` once the worker has exited and the channel is drained.
    #[cfg(test)]
    pub async fn recv(&mut self) -> Option<WorkerEvent> {
        self.event_rx.recv().await
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Ask the worker for a copy of its state. `None` if it has exited.
    pub async fn snapshot(&self) -> Option<WorkerSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx.send(WorkerCommand::Snapshot(reply_tx)).ok()?;
        reply_rx.await.ok()
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Returns once the thread has joined and the source has been released.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        let _ = self.state.compare_exchange(
            WorkerState::Running as u8,
            WorkerState::Stopping as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        let _ = self.command_tx.send(WorkerCommand::Stop);

        if handle.join().is_err() {
            tracing::error!("Gesture worker panicked");
            self.state.store(WorkerState::Stopped as u8, Ordering::SeqCst);
        }
    }
}

impl Drop for GestureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Classification and cooldown state carried from frame to frame.
struct Pipeline {
    thresholds: Thresholds,
    cooldown: Cooldown,
    motion: MotionState,
    record: EmissionRecord,
    stats: WorkerStats,
}

impl Pipeline {
    fn new(settings: &WorkerSettings) -> Self {
        Self {
            thresholds: settings.thresholds,
            cooldown: Cooldown::new(settings.cooldown),
            motion: MotionState::default(),
            record: EmissionRecord::default(),
            stats: WorkerStats::default(),
        }
    }

    /// Run one frame's detection result through the classifier and cooldown.
    ///
    /// Frames without a usable hand leave the motion state untouched.
    fn process(&mut self, hand: Option<Vec<Point>>, now: Instant) -> Option<Gesture> {
        self.stats.frames += 1;

        let gesture = match hand.map(HandLandmarks::try_from) {
            Some(Ok(hand)) => {
                self.stats.hands += 1;
                let (gesture, motion) = classify(&hand, self.motion, &self.thresholds);
                self.motion = motion;
                gesture
            }
            Some(Err(e)) => {
                tracing::debug!("Ignoring malformed hand: {}", e);
                Gesture::None
            }
            None => Gesture::None,
        };

        let (emit, record) = self.cooldown.should_emit(gesture, now, self.record);
        self.record = record;
        if emit {
            self.stats.emitted += 1;
            Some(gesture)
        } else {
            None
        }
    }

    fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            motion: self.motion,
            record: self.record,
            stats: self.stats,
        }
    }
}

enum Delivery {
    Sent,
    Dropped,
    Closed,
}

/// Hand a gesture to the consumer without waiting for it.
fn deliver(event_tx: &mpsc::Sender<WorkerEvent>, gesture: Gesture) -> Delivery {
    if event_tx.is_closed() {
        return Delivery::Closed;
    }
    // Keep the last slot free for the terminal notification
    if event_tx.capacity() <= 1 {
        return Delivery::Dropped;
    }
    match event_tx.try_send(WorkerEvent::Gesture(gesture)) {
        Ok(()) => Delivery::Sent,
        Err(mpsc::error::TrySendError::Full(_)) => Delivery::Dropped,
        Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
    }
}

/// Run the worker thread.
fn run_worker<S, D>(
    mut source: S,
    mut detector: D,
    settings: WorkerSettings,
    mut command_rx: mpsc::UnboundedReceiver<WorkerCommand>,
    event_tx: mpsc::Sender<WorkerEvent>,
    state: Arc<AtomicU8>,
) where
    S: FrameSource,
    D: LandmarkDetector<S::Frame>,
{
    if let Err(e) = source.open() {
        tracing::error!("Gesture camera unavailable: {}", e);
        let _ = event_tx.try_send(WorkerEvent::Unavailable(e.to_string()));
        state.store(WorkerState::Stopped as u8, Ordering::SeqCst);
        return;
    }
    tracing::info!(
        "Gesture worker running (cooldown {:?}, thresholds {:?})",
        settings.cooldown,
        settings.thresholds
    );

    let mut pipeline = Pipeline::new(&settings);

    'frames: loop {
        // Drain pending commands before touching the camera again
        loop {
            match command_rx.try_recv() {
                Ok(WorkerCommand::Snapshot(reply)) => {
                    let _ = reply.send(pipeline.snapshot());
                }
                Ok(WorkerCommand::Stop) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    state.store(WorkerState::Stopping as u8, Ordering::SeqCst);
                    break 'frames;
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
            }
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                if !settings.retry_interval.is_zero() {
                    thread::sleep(settings.retry_interval);
                }
                continue;
            }
            Err(e) => {
                tracing::error!("Gesture camera failed: {}", e);
                let _ = event_tx.try_send(WorkerEvent::Unavailable(e.to_string()));
                break;
            }
        };

        let now = Instant::now();
        let hand = detector.detect(&frame);
        let Some(gesture) = pipeline.process(hand, now) else {
            continue;
        };

        match deliver(&event_tx, gesture) {
            Delivery::Sent => tracing::debug!("Gesture emitted: {}", gesture),
            Delivery::Dropped => {
                pipeline.stats.dropped += 1;
                tracing::warn!("Event channel full, dropped gesture {}", gesture);
            }
            Delivery::Closed => {
                tracing::info!("Gesture consumer went away");
                break;
            }
        }
    }

    source.release();
    state.store(WorkerState::Stopped as u8, Ordering::SeqCst);
    tracing::info!("Gesture worker stopped ({:?})", pipeline.stats);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fixtures::ScriptedSource;
    use crate::capture::{PassthroughDetector, TraceFrame};
    use crate::gesture::landmarks::fixtures::{fist_at, palm_at};

    fn settings() -> WorkerSettings {
        WorkerSettings {
            cooldown: Duration::from_secs(60),
            retry_interval: Duration::from_millis(1),
            ..WorkerSettings::default()
        }
    }

    async fn next_event(worker: &mut GestureWorker) -> Option<WorkerEvent> {
        tokio::time::timeout(Duration::from_secs(2), worker.recv())
            .await
            .ok()
            .flatten()
    }

    async fn no_event(worker: &mut GestureWorker) -> bool {
        tokio::time::timeout(Duration::from_millis(100), worker.recv())
            .await
            .is_err()
    }

    /// Poll snapshots until the worker has consumed `frames` frames.
    async fn settled(worker: &GestureWorker, frames: u64) -> WorkerSnapshot {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let snapshot = worker.snapshot().await.unwrap();
            if snapshot.stats.frames >= frames || Instant::now() > deadline {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_dropout_keeps_motion_baseline() {
        let source = ScriptedSource::new(vec![
            TraceFrame::with_hand(fist_at(0.10, 0.6)),
            TraceFrame::empty(),
            TraceFrame::with_hand(fist_at(0.30, 0.6)),
        ]);
        let mut worker = GestureWorker::spawn(source, PassthroughDetector, settings()).unwrap();

        assert_eq!(
            next_event(&mut worker).await,
            Some(WorkerEvent::Gesture(Gesture::Next))
        );
        assert!(no_event(&mut worker).await);

        let snapshot = settled(&worker, 3).await;
        assert_eq!(snapshot.motion.prev_x, Some(0.30));
        assert_eq!(snapshot.stats.hands, 2);
        assert_eq!(snapshot.record.last_gesture(), Some(Gesture::Next));
    }

    #[tokio::test]
    async fn test_held_gesture_emits_once() {
        let frames = (0..30)
            .map(|_| TraceFrame::with_hand(palm_at(0.5, 0.7)))
            .collect();
        let mut worker =
            GestureWorker::spawn(ScriptedSource::new(frames), PassthroughDetector, settings())
                .unwrap();

        assert_eq!(
            next_event(&mut worker).await,
            Some(WorkerEvent::Gesture(Gesture::PlayPause))
        );
        let snapshot = settled(&worker, 30).await;
        assert_eq!(snapshot.stats.frames, 30);
        assert_eq!(snapshot.stats.emitted, 1);
        assert!(no_event(&mut worker).await);
    }

    #[tokio::test]
    async fn test_malformed_hand_is_ignored() {
        let source = ScriptedSource::new(vec![
            TraceFrame::with_hand(fist_at(0.10, 0.6)),
            TraceFrame::with_hand(vec![Point::new(0.9, 0.9); 5]),
            TraceFrame::with_hand(fist_at(0.30, 0.6)),
        ]);
        let mut worker = GestureWorker::spawn(source, PassthroughDetector, settings()).unwrap();

        assert_eq!(
            next_event(&mut worker).await,
            Some(WorkerEvent::Gesture(Gesture::Next))
        );
        let snapshot = settled(&worker, 3).await;
        assert_eq!(snapshot.stats.hands, 2);
        assert_eq!(worker.state(), WorkerState::Running);
    }

    #[tokio::test]
    async fn test_gestures_arrive_in_frame_order() {
        let source = ScriptedSource::new(vec![
            TraceFrame::with_hand(fist_at(0.30, 0.6)),
            TraceFrame::with_hand(fist_at(0.50, 0.6)),
            TraceFrame::with_hand(fist_at(0.30, 0.6)),
            TraceFrame::with_hand(fist_at(0.30, 0.4)),
            TraceFrame::with_hand(fist_at(0.30, 0.6)),
            TraceFrame::with_hand(palm_at(0.30, 0.6)),
        ]);
        let mut worker = GestureWorker::spawn(source, PassthroughDetector, settings()).unwrap();

        let mut seen = Vec::new();
        while seen.len() < 5 {
            match next_event(&mut worker).await {
                Some(WorkerEvent::Gesture(gesture)) => seen.push(gesture),
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert_eq!(
            seen,
            vec![
                Gesture::Next,
                Gesture::Prev,
                Gesture::VolumeUp,
                Gesture::VolumeDown,
                Gesture::PlayPause,
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_mid_frame_releases_once() {
        let frames = (0..1000)
            .map(|_| TraceFrame::with_hand(fist_at(0.5, 0.6)))
            .collect();
        let mut source = ScriptedSource::new(frames);
        source.frame_delay = Duration::from_millis(50);
        let releases = source.releases();

        let mut worker = GestureWorker::spawn(source, PassthroughDetector, settings()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        worker.stop();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(worker.state(), WorkerState::Stopped);

        worker.stop();
        drop(worker);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_snapshot_after_stop_is_none() {
        let mut worker =
            GestureWorker::spawn(ScriptedSource::new(Vec::new()), PassthroughDetector, settings())
                .unwrap();
        worker.stop();
        assert!(worker.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_open_failure_reports_unavailable() {
        let mut source = ScriptedSource::new(Vec::new());
        source.open_error = Some(String::from("no camera at index 0"));
        let releases = source.releases();

        let mut worker = GestureWorker::spawn(source, PassthroughDetector, settings()).unwrap();

        match next_event(&mut worker).await {
            Some(WorkerEvent::Unavailable(message)) => {
                assert!(message.contains("no camera at index 0"))
            }
            other => panic!("unexpected event: {other:?}"),
        }
        // Channel closes once the worker is gone
        assert_eq!(next_event(&mut worker).await, None);
        assert_eq!(worker.state(), WorkerState::Stopped);

        worker.stop();
        assert_eq!(releases.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_full_channel_drops_gestures_but_not_failure() {
        // Alternate left/right so every frame is a new gesture
        let mut source = ScriptedSource::new(
            (0..10)
                .map(|i| TraceFrame::with_hand(fist_at(if i % 2 == 0 { 0.2 } else { 0.6 }, 0.6)))
                .collect(),
        );
        source.push_failure();
        let releases = source.releases();

        let settings = WorkerSettings {
            channel_capacity: 2,
            ..settings()
        };
        let mut worker = GestureWorker::spawn(source, PassthroughDetector, settings).unwrap();

        // Let the worker run to the failure before draining anything
        let deadline = Instant::now() + Duration::from_secs(2);
        while worker.state() != WorkerState::Stopped && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(
            worker.try_recv(),
            Some(WorkerEvent::Gesture(Gesture::Next))
        );
        assert!(matches!(
            worker.try_recv(),
            Some(WorkerEvent::Unavailable(_))
        ));
        assert_eq!(worker.try_recv(), None);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropping_consumer_stops_worker() {
        let mut source = ScriptedSource::new(vec![
            TraceFrame::with_hand(fist_at(0.2, 0.6)),
            TraceFrame::with_hand(fist_at(0.6, 0.6)),
        ]);
        source.frame_delay = Duration::from_millis(20);
        let releases = source.releases();

        let mut worker = GestureWorker::spawn(source, PassthroughDetector, settings()).unwrap();
        worker.event_rx.close();

        let deadline = Instant::now() + Duration::from_secs(2);
        while worker.state() != WorkerState::Stopped && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(worker.state(), WorkerState::Stopped);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(WorkerState::from_u8(0), WorkerState::Running);
        assert_eq!(WorkerState::from_u8(1), WorkerState::Stopping);
        assert_eq!(WorkerState::from_u8(2), WorkerState::Stopped);
        assert_eq!(WorkerState::Stopping.label(), "stopping");
    }
}
