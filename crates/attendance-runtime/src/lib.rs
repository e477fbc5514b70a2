//! attendance-runtime — Store actor and the simulated capture, detection
//! and training loops that feed it.
//!
//! Every loop talks to the store only through a [`StoreHandle`]: it reads
//! snapshots and dispatches actions. Loops run as tokio tasks on a fixed
//! cadence and are cancelled by stopping or dropping their [`LoopHandle`].

pub mod camera;
pub mod capture;
pub mod detection;
pub mod engine;
pub mod looper;
pub mod training;

pub use camera::{CameraAvailability, CameraError, CameraStream, MediaRequest, SimulatedCamera};
pub use capture::{spawn_capture, CaptureProgress, CaptureSettings};
pub use detection::{spawn_detection, Detection, DetectionSettings, DetectionSummary};
pub use engine::{spawn_store, EngineError, StoreHandle};
pub use looper::{LoopError, LoopHandle};
pub use training::{spawn_training, TrainingPhase, TrainingProgress, TrainingReport, TrainingSettings};
