//! Landmark model capability and a recorded-results implementation

use std::future::Future;
use std::sync::Arc;

use camera_capture::frame::VideoFrame;
use tracing::{debug, info};

use crate::config::FaceMeshOptions;
use crate::landmarks::{LandmarkFrame, RawFaceMeshResults};
use crate::DmsError;

/// External face-landmark model.
///
/// Payloads are validated into a [`LandmarkFrame`] before they leave the
/// implementation; an empty frame means no face.
pub trait LandmarkModel: Send + 'static {
    /// Apply model options; called once before the first frame
    fn configure(&mut self, options: &FaceMeshOptions) -> Result<(), DmsError>;

    /// Run the model on one frame
    fn detect(
        &mut self,
        frame: &VideoFrame,
    ) -> impl Future<Output = Result<LandmarkFrame, DmsError>> + Send;
}

/// Constructs a fresh model for each session
pub trait ModelLoader: Send + Sync + 'static {
    type Model: LandmarkModel;

    fn load(&self) -> Result<Self::Model, DmsError>;
}

impl<F, M> ModelLoader for F
where
    F: Fn() -> Result<M, DmsError> + Send + Sync + 'static,
    M: LandmarkModel,
{
    type Model = M;

    fn load(&self) -> Result<M, DmsError> {
        self()
    }
}

/// Model that answers from recorded results, indexed by frame sequence
#[derive(Debug, Clone)]
pub struct ReplayModel {
    results: Arc<[RawFaceMeshResults]>,
    options: Option<FaceMeshOptions>,
}

impl ReplayModel {
    pub fn new(results: Arc<[RawFaceMeshResults]>) -> Self {
        Self { results, options: None }
    }

    /// Options applied by the last `configure`
    pub fn options(&self) -> Option<&FaceMeshOptions> {
        self.options.as_ref()
    }
}

impl LandmarkModel for ReplayModel {
    fn configure(&mut self, options: &FaceMeshOptions) -> Result<(), DmsError> {
        info!("Replay model configured: {:?}", options);
        self.options = Some(*options);
        Ok(())
    }

    async fn detect(&mut self, frame: &VideoFrame) -> Result<LandmarkFrame, DmsError> {
        match self.results.get(frame.sequence as usize) {
            Some(results) => LandmarkFrame::from_results(results.clone()),
            None => {
                debug!("No recorded result for frame {}", frame.sequence);
                Ok(LandmarkFrame::empty())
            }
        }
    }
}

/// Loader handing out [`ReplayModel`]s over a shared recording
#[derive(Debug, Clone)]
pub struct ReplayLoader {
    results: Arc<[RawFaceMeshResults]>,
}

impl ReplayLoader {
    pub fn new(results: Vec<RawFaceMeshResults>) -> Self {
        Self { results: results.into() }
    }

    /// Number of recorded frames
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl ModelLoader for ReplayLoader {
    type Model = ReplayModel;

    fn load(&self) -> Result<ReplayModel, DmsError> {
        if self.results.is_empty() {
            return Err(DmsError::ModelLoad("recording contains no frames".into()));
        }
        Ok(ReplayModel::new(Arc::clone(&self.results)))
    }
}
