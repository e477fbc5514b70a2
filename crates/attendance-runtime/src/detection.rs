//! Simulated face detection while an attendance session is active.
//!
//! Stands in for a recognizer's per-frame output: on every tick a random
//! gate decides whether a face is "seen", and if so a roster member is
//! picked uniformly with a random confidence and blink flag.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tokio::sync::watch;

use crate::engine::StoreHandle;
use crate::looper::{ticker, LoopError, LoopHandle};

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSettings {
    pub tick: Duration,
    /// Chance that a tick produces a detection.
    pub probability: f64,
    pub min_confidence: u8,
    pub max_confidence: u8,
    /// Stop after this many ticks. `None` runs until the session ends.
    pub max_ticks: Option<u32>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(2000),
            probability: 0.7,
            min_confidence: 70,
            max_confidence: 100,
            max_ticks: None,
        }
    }
}

/// A simulated recognition result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub person_id: String,
    pub person_name: String,
    /// Confidence percentage.
    pub confidence: u8,
    pub blink: bool,
}

/// How a detection run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSummary {
    pub ticks: u32,
    pub detections: u32,
    pub session_ended: bool,
}

/// Start the detection loop. The current detection is published on the
/// returned receiver; `None` means no face in view.
pub fn spawn_detection<R>(
    store: StoreHandle,
    settings: DetectionSettings,
    mut rng: R,
) -> (LoopHandle<DetectionSummary>, watch::Receiver<Option<Detection>>)
where
    R: Rng + Send + 'static,
{
    let (detection_tx, detection_rx) = watch::channel(None);
    let probability = if settings.probability.is_finite() {
        settings.probability.clamp(0.0, 1.0)
    } else {
        tracing::warn!(probability = settings.probability, "non-finite detection probability, using default");
        DetectionSettings::default().probability
    };
    let (lo, hi) = if settings.min_confidence <= settings.max_confidence {
        (settings.min_confidence, settings.max_confidence)
    } else {
        (settings.max_confidence, settings.min_confidence)
    };

    let handle = LoopHandle::spawn(move |mut cancel| async move {
        tracing::info!(tick_ms = settings.tick.as_millis() as u64, probability, "detection started");
        let mut ticks = ticker(settings.tick);
        let mut summary = DetectionSummary {
            ticks: 0,
            detections: 0,
            session_ended: false,
        };

        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    detection_tx.send_replace(None);
                    tracing::info!(ticks = summary.ticks, "detection cancelled");
                    return Err(LoopError::Cancelled);
                }
                _ = ticks.tick() => {}
            }

            let state = store.snapshot();
            if !state.current_session.is_active {
                detection_tx.send_replace(None);
                summary.session_ended = true;
                break;
            }

            summary.ticks += 1;
            let detection = if !state.persons.is_empty() && rng.gen_bool(probability) {
                let person = &state.persons[rng.gen_range(0..state.persons.len())];
                Some(Detection {
                    person_id: person.id.clone(),
                    person_name: person.name.clone(),
                    confidence: rng.gen_range(lo..=hi),
                    blink: rng.gen_bool(0.5),
                })
            } else {
                None
            };

            if let Some(d) = &detection {
                summary.detections += 1;
                tracing::debug!(person = %d.person_id, confidence = d.confidence, blink = d.blink, "face detected");
            } else {
                tracing::debug!("no face detected");
            }
            detection_tx.send_replace(detection);

            if settings.max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }
        }

        tracing::info!(
            ticks = summary.ticks,
            detections = summary.detections,
            session_ended = summary.session_ended,
            "detection finished"
        );
        Ok(summary)
    });

    (handle, detection_rx)
}
