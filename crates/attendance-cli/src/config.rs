use std::path::PathBuf;
use std::time::Duration;

use attendance_core::{ClockPolicy, HmsDuration};
use attendance_runtime::{CameraAvailability, CaptureSettings, DetectionSettings, TrainingSettings};

/// CLI configuration, loaded from environment variables.
pub struct Config {
    pub capture: CaptureSettings,
    pub detection: DetectionSettings,
    pub training: TrainingSettings,
    pub policy: ClockPolicy,
    /// How the simulated camera answers acquisition requests.
    pub camera: CameraAvailability,
    /// Seed for the detection RNG. Random when unset.
    pub detection_seed: Option<u64>,
    /// Directory CSV exports are written to.
    pub export_dir: PathBuf,
}

impl Config {
    /// Load configuration from `ATTENDANCE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let capture_defaults = CaptureSettings::default();
        let detection_defaults = DetectionSettings::default();
        let training_defaults = TrainingSettings::default();

        let camera = match std::env::var("ATTENDANCE_CAMERA") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring ATTENDANCE_CAMERA");
                CameraAvailability::Available
            }),
            Err(_) => CameraAvailability::Available,
        };

        Self {
            capture: CaptureSettings {
                tick: env_millis("ATTENDANCE_CAPTURE_TICK_MS", capture_defaults.tick),
                target: env_u32("ATTENDANCE_CAPTURE_TARGET", capture_defaults.target),
            },
            detection: DetectionSettings {
                tick: env_millis("ATTENDANCE_DETECTION_TICK_MS", detection_defaults.tick),
                probability: env_f64(
                    "ATTENDANCE_DETECTION_PROBABILITY",
                    detection_defaults.probability,
                ),
                ..detection_defaults
            },
            training: TrainingSettings {
                step: env_millis("ATTENDANCE_TRAINING_STEP_MS", training_defaults.step),
                steps_per_person: env_u32(
                    "ATTENDANCE_TRAINING_STEPS",
                    training_defaults.steps_per_person,
                ),
                finalize: env_millis("ATTENDANCE_TRAINING_FINALIZE_MS", training_defaults.finalize),
            },
            policy: ClockPolicy {
                late_grace: HmsDuration::from_mins(env_u32("ATTENDANCE_LATE_GRACE_MINS", 15)),
                lecture_tolerance: HmsDuration::from_mins(env_u32(
                    "ATTENDANCE_LECTURE_TOLERANCE_MINS",
                    5,
                )),
            },
            camera,
            detection_seed: std::env::var("ATTENDANCE_DETECTION_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
            export_dir: std::env::var("ATTENDANCE_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn env_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
