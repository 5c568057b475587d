//! Per-frame classification loop

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use alerting::{AlarmActuator, AlarmController};
use camera_capture::FrameSource;
use dms::{ClassifierState, DrowsinessClassifier, FrameAnalysis, LandmarkFrame, LandmarkModel};
use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Devices that outlive a single session
pub(crate) struct Devices<S, A> {
    pub source: S,
    pub alarm: AlarmController<A>,
}

/// Observer channels, shared between the controller and its loop
pub(crate) struct Publisher {
    pub state: watch::Sender<ClassifierState>,
    pub analysis: watch::Sender<Option<FrameAnalysis>>,
}

impl Publisher {
    pub fn new() -> Self {
        Self {
            state: watch::channel(ClassifierState::Idle).0,
            analysis: watch::channel(None).0,
        }
    }

    pub fn publish_state(&self, state: ClassifierState) {
        self.state.send_replace(state);
    }

    fn publish(&self, analysis: FrameAnalysis) {
        self.state.send_replace(analysis.state);
        self.analysis.send_replace(Some(analysis));
    }
}

/// Everything one running session owns
pub(crate) struct Session<S, M, A> {
    pub devices: Devices<S, A>,
    pub model: M,
    pub classifier: DrowsinessClassifier,
    pub frame_interval: Duration,
    pub publisher: Arc<Publisher>,
}

/// Run until `cancel` fires, then switch the alarm off, reset the
/// classifier and hand the devices back.
///
/// A panic anywhere in the loop ends the session early but still goes
/// through the same cleanup, so the devices are never lost.
pub(crate) async fn run_session<S, M, A>(
    mut session: Session<S, M, A>,
    cancel: CancellationToken,
) -> Devices<S, A>
where
    S: FrameSource,
    M: LandmarkModel,
    A: AlarmActuator,
{
    let outcome = AssertUnwindSafe(detection_loop(&mut session, &cancel))
        .catch_unwind()
        .await;
    if outcome.is_err() {
        error!("Detection loop panicked, ending session");
        session.publisher.publish_state(ClassifierState::Stopped);
    }

    let alarm = &mut session.devices.alarm;
    if panic::catch_unwind(AssertUnwindSafe(|| alarm.shutdown())).is_err() {
        error!("Alarm actuator panicked while shutting down");
    }
    session.classifier.halt();
    info!("Detection loop exited");

    session.devices
}

async fn detection_loop<S, M, A>(session: &mut Session<S, M, A>, cancel: &CancellationToken)
where
    S: FrameSource,
    M: LandmarkModel,
    A: AlarmActuator,
{
    let mut ticker = tokio::time::interval(session.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let epoch = Instant::now();

    info!("Detection loop running every {:?}", session.frame_interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(frame) = session.devices.source.next_frame() else {
            debug!("No frame available this tick");
            continue;
        };

        let model = &mut session.model;
        let inference = AssertUnwindSafe(async { model.detect(&frame).await }).catch_unwind();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Discarding in-flight inference for frame {}", frame.sequence);
                break;
            }
            result = inference => result,
        };

        let landmarks = match result {
            Ok(Ok(landmarks)) => landmarks,
            Ok(Err(e)) => {
                warn!("Landmark model failed on frame {}: {}", frame.sequence, e);
                metrics::counter!("dms_model_failures_total").increment(1);
                LandmarkFrame::empty()
            }
            Err(_) => {
                warn!("Landmark model panicked on frame {}", frame.sequence);
                metrics::counter!("dms_model_failures_total").increment(1);
                LandmarkFrame::empty()
            }
        };

        let now_ms = epoch.elapsed().as_millis() as u64;
        let analysis = session.classifier.process(&landmarks, frame.sequence, now_ms);

        let was_active = session.devices.alarm.is_active();
        session.devices.alarm.on_state_change(analysis.state);
        if session.devices.alarm.is_active() && !was_active {
            metrics::counter!("dms_alarm_activations_total").increment(1);
        }

        metrics::counter!("dms_frames_processed_total").increment(1);
        if !analysis.face_detected() {
            metrics::counter!("dms_no_face_frames_total").increment(1);
        }

        session.publisher.publish(analysis);
    }
}
