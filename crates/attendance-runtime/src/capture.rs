//! Registration image capture.
//!
//! Counts simulated frames on a fixed tick and, once the target count is
//! reached, adds the registered person to the store exactly once.

use std::time::Duration;

use attendance_core::{Action, Person, RegistrationForm};
use tokio::sync::watch;

use crate::camera::CameraStream;
use crate::engine::StoreHandle;
use crate::looper::{ticker, LoopError, LoopHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub tick: Duration,
    /// Images to capture before registration completes.
    pub target: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            target: 101,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureProgress {
    pub captured: u32,
    pub target: u32,
}

impl CaptureProgress {
    pub fn percent(&self) -> u32 {
        if self.target == 0 {
            return 100;
        }
        self.captured * 100 / self.target
    }

    pub fn is_complete(&self) -> bool {
        self.captured >= self.target
    }
}

/// Start capturing images for a validated registration form.
///
/// The camera stream is held for the lifetime of the loop and released
/// when it finishes or is cancelled. A cancelled capture adds nobody.
pub fn spawn_capture(
    store: StoreHandle,
    form: RegistrationForm,
    mut stream: CameraStream,
    settings: CaptureSettings,
) -> (LoopHandle<Person>, watch::Receiver<CaptureProgress>) {
    let target = settings.target.max(1);
    let (progress_tx, progress_rx) = watch::channel(CaptureProgress {
        captured: 0,
        target,
    });

    let handle = LoopHandle::spawn(move |mut cancel| async move {
        tracing::info!(id = %form.id, target, "capture started");
        let mut ticks = ticker(settings.tick);
        let mut captured = 0u32;

        while captured < target {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    tracing::info!(id = %form.id, captured, "capture cancelled");
                    return Err(LoopError::Cancelled);
                }
                _ = ticks.tick() => {}
            }
            captured += 1;
            progress_tx.send_replace(CaptureProgress { captured, target });
            tracing::debug!(captured, target, "image captured");
        }

        stream.stop();

        let person = form.into_person(captured, store.now());
        store.dispatch(Action::AddPerson(person.clone())).await?;
        tracing::info!(id = %person.id, images = captured, "registration complete");
        Ok(person)
    });

    (handle, progress_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraAvailability, MediaRequest, SimulatedCamera};
    use crate::engine::spawn_store;
    use attendance_core::{FixedClock, Store};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn store() -> StoreHandle {
        let now = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        spawn_store(Store::seeded(Arc::new(FixedClock(now))))
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            id: "2001".into(),
            name: "Alan Turing".into(),
            email: String::new(),
            department: "Civil".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_registers_person_at_target() {
        let store = store();
        let camera = SimulatedCamera::new(CameraAvailability::Available);
        let stream = camera.acquire(MediaRequest::REGISTRATION).unwrap();
        let start = Instant::now();

        let (handle, progress) = spawn_capture(store.clone(), form(), stream, CaptureSettings::default());
        let person = handle.join().await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(10_100));
        assert_eq!(person.images_captured, 101);
        assert!(progress.borrow().is_complete());
        assert_eq!(progress.borrow().percent(), 100);
        assert_eq!(camera.live_tracks(), 0);

        let s = store.snapshot();
        assert_eq!(s.persons.len(), 4);
        assert_eq!(s.statistics.total_persons, 4);
        assert_eq!(s.persons.iter().filter(|p| p.id == "2001").count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic() {
        let store = store();
        let camera = SimulatedCamera::new(CameraAvailability::Available);
        let stream = camera.acquire(MediaRequest::REGISTRATION).unwrap();
        let settings = CaptureSettings {
            tick: Duration::from_millis(100),
            target: 5,
        };

        let (handle, mut progress) = spawn_capture(store, form(), stream, settings);
        let mut seen = Vec::new();
        while progress.changed().await.is_ok() {
            let p = *progress.borrow_and_update();
            seen.push(p.captured);
            if p.is_complete() {
                break;
            }
        }
        handle.join().await.unwrap();

        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.last(), Some(&5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_capture_adds_nobody() {
        let store = store();
        let camera = SimulatedCamera::new(CameraAvailability::Available);
        let stream = camera.acquire(MediaRequest::REGISTRATION).unwrap();

        let (mut handle, _progress) =
            spawn_capture(store.clone(), form(), stream, CaptureSettings::default());
        tokio::time::sleep(Duration::from_millis(550)).await;
        handle.stop();

        assert_eq!(handle.join().await, Err(LoopError::Cancelled));
        assert_eq!(store.snapshot().persons.len(), 3);
        assert_eq!(camera.live_tracks(), 0);
    }
}
