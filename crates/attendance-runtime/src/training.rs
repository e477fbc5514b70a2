//! Simulated model training.
//!
//! Walks the active roster one person at a time, advancing a fixed number
//! of steps per person on a fixed cadence, then finalizes. Every person
//! gets a training session record that ends `Completed`, or `Failed` if
//! the run is stopped while that person is in progress.

use std::time::Duration;

use attendance_core::{Action, Person, TrainingSession, TrainingSessionPatch, TrainingStatus};
use tokio::sync::watch;

use crate::engine::StoreHandle;
use crate::looper::{ticker, CancelSignal, LoopError, LoopHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSettings {
    pub step: Duration,
    pub steps_per_person: u32,
    pub finalize: Duration,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(200),
            steps_per_person: 10,
            finalize: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingPhase {
    Idle,
    Training {
        person_id: String,
        person_name: String,
    },
    Finalizing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingProgress {
    pub phase: TrainingPhase,
    pub completed_steps: u32,
    pub total_steps: u32,
}

impl TrainingProgress {
    /// Overall progress across all persons, 0.0–100.0.
    pub fn percent(&self) -> f64 {
        if self.total_steps == 0 {
            return if self.phase == TrainingPhase::Completed {
                100.0
            } else {
                0.0
            };
        }
        f64::from(self.completed_steps) / f64::from(self.total_steps) * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingReport {
    /// Training session ids, in roster order.
    pub sessions: Vec<String>,
    pub total_steps: u32,
}

/// Start a training run over every active person.
pub fn spawn_training(
    store: StoreHandle,
    settings: TrainingSettings,
) -> (LoopHandle<TrainingReport>, watch::Receiver<TrainingProgress>) {
    let persons: Vec<Person> = store.snapshot().active_persons().cloned().collect();
    let steps = settings.steps_per_person.max(1);
    let total_steps = persons.len() as u32 * steps;

    let (progress_tx, progress_rx) = watch::channel(TrainingProgress {
        phase: TrainingPhase::Idle,
        completed_steps: 0,
        total_steps,
    });

    let handle = LoopHandle::spawn(move |cancel| {
        run_training(store, settings, steps, persons, progress_tx, cancel)
    });

    (handle, progress_rx)
}

async fn run_training(
    store: StoreHandle,
    settings: TrainingSettings,
    steps: u32,
    persons: Vec<Person>,
    progress_tx: watch::Sender<TrainingProgress>,
    mut cancel: CancelSignal,
) -> Result<TrainingReport, LoopError> {
    let total_steps = persons.len() as u32 * steps;
    tracing::info!(persons = persons.len(), total_steps, "training started");

    let mut ticks = ticker(settings.step);
    let mut completed_steps = 0u32;
    let mut sessions = Vec::with_capacity(persons.len());

    for person in &persons {
        let session_id = uuid::Uuid::new_v4().to_string();
        store
            .dispatch(Action::StartTrainingSession(TrainingSession {
                id: session_id.clone(),
                person_id: person.id.clone(),
                person_name: person.name.clone(),
                images_captured: 0,
                total_images: person.images_captured,
                status: TrainingStatus::InProgress,
                started_at: store.now(),
                ended_at: None,
            }))
            .await?;
        progress_tx.send_replace(TrainingProgress {
            phase: TrainingPhase::Training {
                person_id: person.id.clone(),
                person_name: person.name.clone(),
            },
            completed_steps,
            total_steps,
        });

        for step in 1..=steps {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    store
                        .dispatch(Action::UpdateTrainingSession {
                            id: session_id.clone(),
                            patch: TrainingSessionPatch {
                                status: Some(TrainingStatus::Failed),
                                ended_at: Some(store.now()),
                                ..Default::default()
                            },
                        })
                        .await?;
                    tracing::info!(person = %person.id, completed_steps, "training cancelled");
                    return Err(LoopError::Cancelled);
                }
                _ = ticks.tick() => {}
            }

            completed_steps += 1;
            store
                .dispatch(Action::UpdateTrainingSession {
                    id: session_id.clone(),
                    patch: TrainingSessionPatch {
                        images_captured: Some(person.images_captured * step / steps),
                        ..Default::default()
                    },
                })
                .await?;
            progress_tx.send_modify(|p| p.completed_steps = completed_steps);
            tracing::debug!(person = %person.id, step, completed_steps, total_steps, "training step");
        }

        store
            .dispatch(Action::UpdateTrainingSession {
                id: session_id.clone(),
                patch: TrainingSessionPatch {
                    status: Some(TrainingStatus::Completed),
                    ended_at: Some(store.now()),
                    ..Default::default()
                },
            })
            .await?;
        tracing::info!(person = %person.id, "person trained");
        sessions.push(session_id);
    }

    progress_tx.send_modify(|p| p.phase = TrainingPhase::Finalizing);
    tokio::select! {
        biased;
        _ = &mut cancel => {
            tracing::info!("training cancelled while finalizing");
            return Err(LoopError::Cancelled);
        }
        _ = tokio::time::sleep(settings.finalize) => {}
    }
    progress_tx.send_modify(|p| p.phase = TrainingPhase::Completed);
    tracing::info!(persons = sessions.len(), "training completed");

    Ok(TrainingReport {
        sessions,
        total_steps,
    })
}
