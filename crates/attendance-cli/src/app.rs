use std::sync::Arc;

use anyhow::{Context, Result};
use attendance_core::attendance::{clock_in, clock_out};
use attendance_core::export::write_csv;
use attendance_core::validation::validate_against;
use attendance_core::{
    roster, Action, AppState, AttendanceFilter, AttendanceRecord, PersonPatch, RegistrationForm,
    Store, SystemClock,
};
use attendance_runtime::{
    spawn_capture, spawn_detection, spawn_store, spawn_training, Detection, DetectionSettings,
    MediaRequest, SimulatedCamera, StoreHandle, TrainingPhase,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cli::{Commands, SessionCommand};
use crate::config::Config;

/// Everything one process knows: the store, the simulated camera and the
/// most recent detection.
pub struct App {
    config: Config,
    store: StoreHandle,
    camera: SimulatedCamera,
    rng: StdRng,
    last_detection: Option<Detection>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let store = spawn_store(Store::seeded(Arc::new(SystemClock)));
        let camera = SimulatedCamera::new(config.camera);
        let rng = match config.detection_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        tracing::info!(persons = store.snapshot().persons.len(), "store seeded");
        Self {
            config,
            store,
            camera,
            rng,
            last_detection: None,
        }
    }

    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Dashboard { json } => self.dashboard(json),
            Commands::People { json } => self.people(json),
            Commands::Add {
                id,
                name,
                email,
                department,
            } => {
                self.add(RegistrationForm {
                    id,
                    name,
                    email,
                    department,
                })
                .await
            }
            Commands::Edit {
                id,
                name,
                email,
                department,
                active,
            } => {
                self.edit(
                    id,
                    PersonPatch {
                        name,
                        email,
                        department,
                        is_active: active,
                        ..Default::default()
                    },
                )
                .await
            }
            Commands::Remove { id } => self.remove(id).await,
            Commands::Train => self.train().await,
            Commands::Session { action } => self.session(action).await,
            Commands::Detect { ticks, json } => self.detect(ticks, json).await,
            Commands::ClockIn => self.clock_in().await,
            Commands::ClockOut => self.clock_out().await,
            Commands::View {
                date,
                search,
                status,
                export,
                json,
            } => self.view(AttendanceFilter { date, search, status }, export, json),
        }
    }

    fn dashboard(&self, json: bool) -> Result<()> {
        let state = self.store.snapshot();
        if json {
            println!("{}", serde_json::to_string_pretty(&state.statistics)?);
            return Ok(());
        }

        let stats = &state.statistics;
        println!("Total persons:    {}", stats.total_persons);
        println!("Present today:    {}", stats.present_today);
        println!("Total clock-ins:  {}", stats.total_clock_ins);
        println!("Total clock-outs: {}", stats.total_clock_outs);
        println!("Session:          {}", describe_session(&state));

        let recent: Vec<_> = state.attendance_records.iter().rev().take(5).collect();
        if !recent.is_empty() {
            println!();
            println!("Recent attendance:");
            print_records(recent.into_iter().rev());
        }
        Ok(())
    }

    fn people(&self, json: bool) -> Result<()> {
        let state = self.store.snapshot();
        if json {
            println!("{}", serde_json::to_string_pretty(&state.persons)?);
            return Ok(());
        }
        if state.persons.is_empty() {
            println!("No people registered");
            return Ok(());
        }
        println!(
            "{:<8} {:<24} {:<28} {:<24} {:>6} {}",
            "ID", "Name", "Email", "Department", "Images", "Active"
        );
        for p in &state.persons {
            println!(
                "{:<8} {:<24} {:<28} {:<24} {:>6} {}",
                p.id,
                p.name,
                p.email.as_deref().unwrap_or("-"),
                p.department.as_deref().unwrap_or("-"),
                p.images_captured,
                if p.is_active { "yes" } else { "no" }
            );
        }
        Ok(())
    }

    async fn add(&mut self, form: RegistrationForm) -> Result<()> {
        let errors = validate_against(&form, &self.store.snapshot().persons);
        if !errors.is_empty() {
            for (field, message) in errors.iter() {
                println!("{field}: {message}");
            }
            return Ok(());
        }
        let department = form.department.trim();
        if !department.is_empty() && !roster::departments().iter().any(|d| d == department) {
            println!(
                "Note: {department} is not one of: {}",
                roster::departments().join(", ")
            );
        }

        let stream = match self.camera.acquire(MediaRequest::REGISTRATION) {
            Ok(s) => s,
            Err(e) => {
                println!("{}", e.user_message());
                return Ok(());
            }
        };

        println!("Capturing images for {}...", form.name.trim());
        let (handle, mut progress) =
            spawn_capture(self.store.clone(), form, stream, self.config.capture);
        let mut last_decile = 0;
        while progress.changed().await.is_ok() {
            let p = *progress.borrow_and_update();
            let decile = p.percent() / 10;
            if decile > last_decile {
                last_decile = decile;
                println!("  {}/{} images ({}%)", p.captured, p.target, p.percent());
            }
        }

        let person = handle.join().await.context("registration failed")?;
        println!(
            "Registered {} ({}) with {} images",
            person.name, person.id, person.images_captured
        );
        Ok(())
    }

    async fn edit(&mut self, id: String, patch: PersonPatch) -> Result<()> {
        if self.store.snapshot().person(&id).is_none() {
            println!("No person with ID {id}");
            return Ok(());
        }
        self.store
            .dispatch(Action::UpdatePerson {
                id: id.clone(),
                patch,
            })
            .await?;
        println!("Updated {id}");
        Ok(())
    }

    async fn remove(&mut self, id: String) -> Result<()> {
        let existed = self.store.snapshot().person(&id).is_some();
        let state = self.store.dispatch(Action::DeletePerson { id: id.clone() }).await?;
        if existed {
            println!("Removed {id}");
        } else {
            println!("No person with ID {id}");
        }
        println!("Total persons: {}", state.statistics.total_persons);
        Ok(())
    }

    async fn train(&mut self) -> Result<()> {
        let (handle, mut progress) = spawn_training(self.store.clone(), self.config.training);
        println!("Training LBPH model...");

        let mut last_phase = TrainingPhase::Idle;
        while progress.changed().await.is_ok() {
            let p = progress.borrow_and_update().clone();
            if p.phase != last_phase {
                match &p.phase {
                    TrainingPhase::Idle => {}
                    TrainingPhase::Training { person_name, .. } => {
                        println!("  [{:>5.1}%] training {person_name}", p.percent())
                    }
                    TrainingPhase::Finalizing => println!("  [{:>5.1}%] finalizing", p.percent()),
                    TrainingPhase::Completed => println!("  [100.0%] completed"),
                }
                last_phase = p.phase;
            }
        }

        let report = handle.join().await.context("training failed")?;
        println!("Trained {} people", report.sessions.len());
        Ok(())
    }

    async fn session(&mut self, action: SessionCommand) -> Result<()> {
        match action {
            SessionCommand::Start { lecture } => {
                if let Err(e) = lecture.parse::<attendance_core::HmsDuration>() {
                    println!("{e}");
                    return Ok(());
                }
                let state = self
                    .store
                    .dispatch(Action::StartAttendanceSession {
                        lecture_duration: lecture,
                    })
                    .await?;
                println!("Session: {}", describe_session(&state));
            }
            SessionCommand::End => {
                self.store.dispatch(Action::EndAttendanceSession).await?;
                self.last_detection = None;
                println!("Session ended");
            }
        }
        Ok(())
    }

    async fn detect(&mut self, ticks: u32, json: bool) -> Result<()> {
        if !self.store.snapshot().current_session.is_active {
            println!("No active session. Start one with `session start --lecture HH:MM:SS`.");
            return Ok(());
        }
        let _stream = match self.camera.acquire(MediaRequest::RECOGNITION) {
            Ok(s) => s,
            Err(e) => {
                println!("{}", e.user_message());
                return Ok(());
            }
        };

        let settings = DetectionSettings {
            max_ticks: Some(ticks),
            ..self.config.detection.clone()
        };
        let rng = StdRng::from_rng(&mut self.rng).context("seeding detection rng")?;
        let (handle, mut detection) = spawn_detection(self.store.clone(), settings, rng);

        while detection.changed().await.is_ok() {
            let current = detection.borrow_and_update().clone();
            if json {
                println!("{}", serde_json::to_string(&current)?);
            }
            match current {
                Some(d) => {
                    if !json {
                        println!(
                            "Face detected: {} ({}) confidence {}% {}",
                            d.person_name,
                            d.person_id,
                            d.confidence,
                            if d.blink { "blink detected" } else { "eyes open" }
                        );
                    }
                    self.last_detection = Some(d);
                }
                None if !json => println!("No face detected"),
                None => {}
            }
        }

        let summary = handle.join().await.context("detection failed")?;
        if summary.session_ended {
            self.last_detection = None;
            println!("Session ended");
        }
        Ok(())
    }

    async fn clock_in(&mut self) -> Result<()> {
        let Some(d) = self.last_detection.clone() else {
            println!("No face detected or recognized. Please position your face properly.");
            return Ok(());
        };
        let state = self.store.snapshot();
        match clock_in(
            &state,
            &d.person_id,
            Some(d.confidence),
            self.store.now(),
            &self.config.policy,
        ) {
            Ok(action) => {
                self.store.dispatch(action).await?;
                println!("Clocked IN successfully for {}", d.person_name);
            }
            Err(e) => println!("{e}"),
        }
        Ok(())
    }

    async fn clock_out(&mut self) -> Result<()> {
        let Some(d) = self.last_detection.clone() else {
            println!("No face detected or recognized. Please position your face properly.");
            return Ok(());
        };
        let state = self.store.snapshot();
        match clock_out(&state, &d.person_id, self.store.now(), &self.config.policy) {
            Ok(action) => {
                let state = self.store.dispatch(action).await?;
                println!("Clocked OUT successfully for {}", d.person_name);
                if let Some(r) = state
                    .attendance_records
                    .iter()
                    .rev()
                    .find(|r| r.person_id == d.person_id && !r.is_open())
                {
                    print_records([r]);
                }
            }
            Err(e) => println!("{e}"),
        }
        Ok(())
    }

    fn view(&self, filter: AttendanceFilter, export: bool, json: bool) -> Result<()> {
        let state = self.store.snapshot();
        let hits = filter.apply(&state.attendance_records);

        if json {
            println!("{}", serde_json::to_string_pretty(&hits)?);
        } else if hits.is_empty() {
            println!("No attendance records");
        } else {
            print_records(hits.iter().copied());
        }

        if export {
            let path = write_csv(&self.config.export_dir, self.store.now().date(), hits)?;
            println!("Exported to {}", path.display());
        }
        Ok(())
    }
}

fn describe_session(state: &AppState) -> String {
    let session = &state.current_session;
    if !session.is_active {
        return "inactive".to_string();
    }
    format!(
        "active since {} (lecture {})",
        session
            .started_at
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".into()),
        session.lecture_duration.as_deref().unwrap_or("-")
    )
}

fn print_records<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) {
    println!(
        "{:<8} {:<24} {:<10} {:<8} {:<8} {:<8} {:<7} {:>4}",
        "ID", "Name", "Date", "In", "Out", "Duration", "Status", "Conf"
    );
    for r in records {
        let time = |t: Option<chrono::NaiveTime>| {
            t.map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into())
        };
        println!(
            "{:<8} {:<24} {:<10} {:<8} {:<8} {:<8} {:<7} {:>4}",
            r.person_id,
            r.person_name,
            r.date.format("%Y-%m-%d").to_string(),
            time(r.clock_in),
            time(r.clock_out),
            r.duration.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            r.status.to_string(),
            r.confidence.map(|c| format!("{c}%")).unwrap_or_else(|| "-".into())
        );
    }
}
