//! Session Controller Implementation

use std::sync::Arc;

use alerting::{AlarmActuator, AlarmController};
use camera_capture::FrameSource;
use dms::{ClassifierState, DrowsinessClassifier, FrameAnalysis, LandmarkModel, ModelLoader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::worker::{run_session, Devices, Publisher, Session};
use crate::{SessionConfig, SessionError};

/// Lifecycle phase of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    Stopped,
}

struct Running<S, A> {
    cancel: CancellationToken,
    handle: JoinHandle<Devices<S, A>>,
}

/// Starts and stops detection sessions.
///
/// Each `start` builds a fresh session (new model, new classifier), so
/// nothing carries over from a previous run. Observers read the published
/// state; only the loop mutates session state.
pub struct SessionController<S, L, A>
where
    S: FrameSource,
    L: ModelLoader,
    A: AlarmActuator,
{
    config: SessionConfig,
    loader: L,
    devices: Option<Devices<S, A>>,
    running: Option<Running<S, A>>,
    publisher: Arc<Publisher>,
    phase: SessionPhase,
}

impl<S, L, A> SessionController<S, L, A>
where
    S: FrameSource,
    L: ModelLoader,
    A: AlarmActuator,
{
    /// Create an idle controller
    pub fn new(config: SessionConfig, source: S, loader: L, actuator: A) -> Result<Self, SessionError> {
        config.validate()?;
        info!("Creating session controller with config: {:?}", config);

        Ok(Self {
            config,
            loader,
            devices: Some(Devices {
                source,
                alarm: AlarmController::new(actuator),
            }),
            running: None,
            publisher: Arc::new(Publisher::new()),
            phase: SessionPhase::Idle,
        })
    }

    /// Start a new detection session
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.loop_exited() {
            // reclaim the devices from a loop that ended on its own
            self.stop().await;
        }
        if self.running.is_some() {
            return Err(SessionError::AlreadyRunning);
        }

        let devices = match self.devices.take() {
            Some(devices) if devices.source.is_available() => devices,
            other => {
                self.devices = other;
                warn!("Cannot start detection: no frame source");
                return Err(SessionError::NoFrameSource);
            }
        };

        let model = match self.load_model() {
            Ok(model) => model,
            Err(e) => {
                self.devices = Some(devices);
                warn!("Cannot start detection: {}", e);
                return Err(e);
            }
        };

        let mut classifier = DrowsinessClassifier::new(self.config.dms.clone());
        classifier.begin();
        self.publisher.publish_state(classifier.state());
        self.publisher.analysis.send_replace(None);

        let cancel = CancellationToken::new();
        let session = Session {
            devices,
            model,
            classifier,
            frame_interval: Duration::from_millis(self.config.frame_interval_ms),
            publisher: Arc::clone(&self.publisher),
        };
        let handle = tokio::spawn(run_session(session, cancel.clone()));

        self.running = Some(Running { cancel, handle });
        self.phase = SessionPhase::Running;
        info!("Detection started");
        Ok(())
    }

    fn load_model(&self) -> Result<L::Model, SessionError> {
        let mut model = self
            .loader
            .load()
            .map_err(|e| SessionError::ModelUnavailable(e.to_string()))?;
        model
            .configure(&self.config.dms.face_mesh)
            .map_err(|e| SessionError::ModelUnavailable(e.to_string()))?;
        Ok(model)
    }

    /// Stop the running session; a no-op when nothing is running
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            debug!("Stop requested with no running session");
            return;
        };

        info!("Stopping detection");
        running.cancel.cancel();
        match running.handle.await {
            Ok(devices) => self.devices = Some(devices),
            Err(e) => error!("Detection loop failed to join: {}", e),
        }

        self.publisher.publish_state(ClassifierState::Stopped);
        self.phase = SessionPhase::Stopped;
    }

    pub fn phase(&self) -> SessionPhase {
        if self.loop_exited() {
            return SessionPhase::Stopped;
        }
        self.phase
    }

    fn loop_exited(&self) -> bool {
        self.running.as_ref().is_some_and(|r| r.handle.is_finished())
    }

    pub fn is_running(&self) -> bool {
        self.phase() == SessionPhase::Running
    }

    /// Latest published state
    pub fn state(&self) -> ClassifierState {
        *self.publisher.state.borrow()
    }

    /// Latest published per-frame analysis
    pub fn latest_analysis(&self) -> Option<FrameAnalysis> {
        self.publisher.analysis.borrow().clone()
    }

    /// Subscribe to state updates (latest wins)
    pub fn subscribe(&self) -> watch::Receiver<ClassifierState> {
        self.publisher.state.subscribe()
    }

    /// Subscribe to per-frame analyses (latest wins)
    pub fn subscribe_analysis(&self) -> watch::Receiver<Option<FrameAnalysis>> {
        self.publisher.analysis.subscribe()
    }

    /// Devices held while no session is running
    pub fn alarm(&self) -> Option<&AlarmController<A>> {
        self.devices.as_ref().map(|d| &d.alarm)
    }

    pub fn source(&self) -> Option<&S> {
        self.devices.as_ref().map(|d| &d.source)
    }
}

impl<S, L, A> Drop for SessionController<S, L, A>
where
    S: FrameSource,
    L: ModelLoader,
    A: AlarmActuator,
{
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::AlarmError;
    use camera_capture::VideoFrame;
    use dms::sketch::FaceSketch;
    use dms::{DmsError, FaceMeshOptions, LandmarkFrame};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    type Script = Arc<Mutex<Result<LandmarkFrame, String>>>;

    struct EndlessSource {
        available: bool,
        sequence: u32,
    }

    impl EndlessSource {
        fn new() -> Self {
            Self { available: true, sequence: 0 }
        }
    }

    impl FrameSource for EndlessSource {
        fn is_available(&self) -> bool {
            self.available
        }

        fn next_frame(&mut self) -> Option<VideoFrame> {
            self.sequence += 1;
            Some(VideoFrame::new(640, 480, 0, self.sequence))
        }
    }

    struct ScriptedModel {
        script: Script,
    }

    impl LandmarkModel for ScriptedModel {
        fn configure(&mut self, options: &FaceMeshOptions) -> Result<(), DmsError> {
            assert_eq!(options.max_faces, 1);
            Ok(())
        }

        async fn detect(&mut self, _frame: &VideoFrame) -> Result<LandmarkFrame, DmsError> {
            self.script.lock().unwrap().clone().map_err(DmsError::Inference)
        }
    }

    /// Returns `frame` on every call except `panic_on`, where it panics
    struct FlakyModel {
        calls: Arc<AtomicU32>,
        panic_on: u32,
        frame: LandmarkFrame,
    }

    impl LandmarkModel for FlakyModel {
        fn configure(&mut self, _options: &FaceMeshOptions) -> Result<(), DmsError> {
            Ok(())
        }

        async fn detect(&mut self, _frame: &VideoFrame) -> Result<LandmarkFrame, DmsError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.panic_on {
                panic!("landmark runtime crashed");
            }
            Ok(self.frame.clone())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingAlarm {
        calls: Arc<Mutex<Vec<&'static str>>>,
        panic_next_on: Arc<AtomicBool>,
    }

    impl RecordingAlarm {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AlarmActuator for RecordingAlarm {
        fn turn_on(&mut self) -> Result<(), AlarmError> {
            if self.panic_next_on.swap(false, Ordering::SeqCst) {
                panic!("audio driver crashed");
            }
            self.calls.lock().unwrap().push("on");
            Ok(())
        }

        fn turn_off(&mut self) -> Result<(), AlarmError> {
            self.calls.lock().unwrap().push("off");
            Ok(())
        }
    }

    fn config() -> SessionConfig {
        SessionConfig { frame_interval_ms: 100, ..Default::default() }
    }

    fn loader(script: &Script) -> impl ModelLoader<Model = ScriptedModel> {
        let script = Arc::clone(script);
        move || -> Result<ScriptedModel, DmsError> { Ok(ScriptedModel { script: Arc::clone(&script) }) }
    }

    fn controller(
        script: &Script,
        alarm: &RecordingAlarm,
    ) -> SessionController<EndlessSource, impl ModelLoader<Model = ScriptedModel>, RecordingAlarm> {
        SessionController::new(config(), EndlessSource::new(), loader(script), alarm.clone()).unwrap()
    }

    fn script(frame: LandmarkFrame) -> Script {
        Arc::new(Mutex::new(Ok(frame)))
    }

    fn set(script: &Script, frame: Result<LandmarkFrame, String>) {
        *script.lock().unwrap() = frame;
    }

    async fn advance_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test]
    async fn test_no_frame_source() {
        let source = EndlessSource { available: false, sequence: 0 };
        let loader = loader(&script(LandmarkFrame::empty()));
        let mut controller =
            SessionController::new(config(), source, loader, RecordingAlarm::default()).unwrap();

        assert!(matches!(controller.start().await, Err(SessionError::NoFrameSource)));
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert_eq!(controller.state(), ClassifierState::Idle);
        assert!(controller.source().is_some());
    }

    #[tokio::test]
    async fn test_model_unavailable() {
        let loader = || -> Result<ScriptedModel, DmsError> { Err(DmsError::ModelLoad("missing weights".into())) };
        let mut controller =
            SessionController::new(config(), EndlessSource::new(), loader, RecordingAlarm::default()).unwrap();

        assert!(matches!(controller.start().await, Err(SessionError::ModelUnavailable(_))));
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert!(controller.alarm().is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SessionConfig { frame_interval_ms: 0, ..Default::default() };
        let loader = loader(&script(LandmarkFrame::empty()));
        let result = SessionController::new(config, EndlessSource::new(), loader, RecordingAlarm::default());
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_eyes_closed_triggers_alarm() {
        let script = script(FaceSketch::default().eyes(0.20).to_frame());
        let alarm = RecordingAlarm::default();
        let mut controller = controller(&script, &alarm);

        controller.start().await.unwrap();
        assert_eq!(controller.state(), ClassifierState::Awake);

        // frames at 0..=1500ms: closed, but not longer than the dwell time
        advance_ms(1550).await;
        assert_eq!(controller.state(), ClassifierState::Awake);
        assert!(alarm.calls().is_empty());

        advance_ms(100).await;
        assert_eq!(controller.state(), ClassifierState::Drowsy);
        advance_ms(300).await;
        assert_eq!(alarm.calls(), vec!["on"]);

        let analysis = controller.latest_analysis().unwrap();
        assert!(analysis.sustained.eyes);

        controller.stop().await;
        assert_eq!(controller.state(), ClassifierState::Stopped);
        assert_eq!(controller.phase(), SessionPhase::Stopped);
        assert_eq!(alarm.calls(), vec!["on", "off"]);
        assert!(!controller.alarm().unwrap().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_failure_degrades_to_no_face() {
        let script = script(FaceSketch::default().to_frame());
        let alarm = RecordingAlarm::default();
        let mut controller = controller(&script, &alarm);
        controller.start().await.unwrap();

        set(&script, Err("runtime exploded".into()));
        advance_ms(250).await;
        assert_eq!(controller.state(), ClassifierState::NoFaceDetected);

        set(&script, Ok(FaceSketch::default().to_frame()));
        advance_ms(200).await;
        assert_eq!(controller.state(), ClassifierState::Awake);
        assert!(controller.is_running());

        controller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let alarm = RecordingAlarm::default();
        let mut controller = controller(&script(LandmarkFrame::empty()), &alarm);

        controller.stop().await;
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert_eq!(controller.state(), ClassifierState::Idle);

        controller.start().await.unwrap();
        advance_ms(150).await;
        assert_eq!(controller.state(), ClassifierState::NoFaceDetected);

        controller.stop().await;
        controller.stop().await;
        assert_eq!(controller.state(), ClassifierState::Stopped);
        assert!(alarm.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_running() {
        let alarm = RecordingAlarm::default();
        let mut controller = controller(&script(FaceSketch::default().to_frame()), &alarm);

        controller.start().await.unwrap();
        assert!(matches!(controller.start().await, Err(SessionError::AlreadyRunning)));
        controller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_baseline_and_timers() {
        let script = script(FaceSketch::default().nose(0.40).to_frame());
        let alarm = RecordingAlarm::default();
        let mut controller = controller(&script, &alarm);

        controller.start().await.unwrap();
        advance_ms(50).await;
        set(&script, Ok(FaceSketch::default().nose(0.55).to_frame()));
        advance_ms(1000).await;
        assert!(controller.latest_analysis().unwrap().metrics.unwrap().nose_drop > 0.1);

        controller.stop().await;
        controller.start().await.unwrap();

        // the lowered pose is now the baseline: never head-down
        advance_ms(2000).await;
        let analysis = controller.latest_analysis().unwrap();
        assert!(analysis.metrics.unwrap().nose_drop.abs() < 1e-6);
        assert!(!analysis.sustained.head);
        assert_eq!(controller.state(), ClassifierState::Awake);
        assert!(alarm.calls().is_empty());

        controller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_transitions() {
        let script = script(FaceSketch::default().mouth(0.9).to_frame());
        let alarm = RecordingAlarm::default();
        let mut controller = controller(&script, &alarm);
        let mut rx = controller.subscribe();

        controller.start().await.unwrap();
        let mut seen = Vec::new();
        while seen.last() != Some(&ClassifierState::Yawn) {
            rx.changed().await.unwrap();
            let state = *rx.borrow_and_update();
            if seen.last() != Some(&state) {
                seen.push(state);
            }
        }
        assert_eq!(seen, vec![ClassifierState::Awake, ClassifierState::Yawn]);

        controller.stop().await;
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ClassifierState::Stopped);
        assert_eq!(alarm.calls(), vec!["on", "off"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_panic_degrades_to_no_face() {
        let calls = Arc::new(AtomicU32::new(0));
        let loader = {
            let calls = Arc::clone(&calls);
            move || -> Result<FlakyModel, DmsError> {
                Ok(FlakyModel {
                    calls: Arc::clone(&calls),
                    panic_on: 3,
                    frame: FaceSketch::default().eyes(0.20).to_frame(),
                })
            }
        };
        let alarm = RecordingAlarm::default();
        let mut controller = SessionController::new(config(), EndlessSource::new(), loader, alarm.clone()).unwrap();
        controller.start().await.unwrap();

        // the panicking frame at 200ms resets the eyes timer; it restarts at
        // 300ms and is sustained from 1900ms
        advance_ms(2500).await;
        assert!(calls.load(Ordering::SeqCst) > 20);
        assert!(controller.is_running());
        assert_eq!(controller.state(), ClassifierState::Drowsy);
        assert_eq!(alarm.calls(), vec!["on"]);

        controller.stop().await;
        assert_eq!(alarm.calls(), vec!["on", "off"]);
        assert!(controller.source().is_some());

        controller.start().await.unwrap();
        assert!(controller.is_running());
        controller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_panic_keeps_devices() {
        let script = script(FaceSketch::default().eyes(0.20).to_frame());
        let alarm = RecordingAlarm::default();
        alarm.panic_next_on.store(true, Ordering::SeqCst);
        let mut controller = controller(&script, &alarm);

        controller.start().await.unwrap();
        advance_ms(2000).await;
        assert_eq!(controller.phase(), SessionPhase::Stopped);
        assert!(!controller.is_running());
        assert_eq!(controller.state(), ClassifierState::Stopped);

        // the next start reclaims the devices from the ended loop
        controller.start().await.unwrap();
        advance_ms(2000).await;
        assert_eq!(controller.state(), ClassifierState::Drowsy);
        assert_eq!(alarm.calls(), vec!["on"]);

        controller.stop().await;
        assert_eq!(alarm.calls(), vec!["on", "off"]);
    }
}
