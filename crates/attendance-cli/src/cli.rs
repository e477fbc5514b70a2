use attendance_core::AttendanceStatus;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "attendance",
    about = "Face-recognition attendance simulator",
    long_about = "Face-recognition attendance simulator.\n\n\
        Run without a command to start an interactive shell. State lives in \
        memory only and starts from the built-in roster on every launch."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// One line typed into the interactive shell.
#[derive(Parser)]
#[command(name = "attendance", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics, the current session and recent attendance
    Dashboard {
        #[arg(long)]
        json: bool,
    },
    /// List registered people
    People {
        #[arg(long)]
        json: bool,
    },
    /// Register a new person and capture training images
    Add {
        /// Numeric person ID
        #[arg(long)]
        id: String,
        /// Full name (letters and spaces)
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        department: String,
    },
    /// Update fields of a registered person
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Remove a registered person
    Remove { id: String },
    /// Train the recognition model on every active person
    Train,
    /// Start or end the attendance session
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },
    /// Run face detection for a number of ticks
    Detect {
        #[arg(long, default_value_t = 5)]
        ticks: u32,
        /// Print each tick as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// Clock in the most recently detected person
    ClockIn,
    /// Clock out the most recently detected person
    ClockOut,
    /// Browse and export attendance records
    View {
        /// Only records on this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Case-insensitive match on name or ID
        #[arg(long)]
        search: Option<String>,
        /// Present, Absent, Late or MCR
        #[arg(long)]
        status: Option<AttendanceStatus>,
        /// Write the filtered records to attendance_<date>.csv
        #[arg(long)]
        export: bool,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Start a session with the given lecture duration
    Start {
        /// Lecture duration, HH:MM:SS
        #[arg(long)]
        lecture: String,
    },
    /// End the active session
    End,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
        ShellLine::command().debug_assert();
    }

    #[test]
    fn test_parse_view_filters() {
        let line = ShellLine::try_parse_from([
            "view", "--date", "2024-05-06", "--status", "mcr", "--export",
        ])
        .unwrap();
        let Commands::View {
            date,
            status,
            export,
            search,
            json,
        } = line.command
        else {
            panic!("expected view");
        };
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 6));
        assert_eq!(status, Some(AttendanceStatus::Mcr));
        assert!(export);
        assert!(search.is_none());
        assert!(!json);
    }

    #[test]
    fn test_parse_detect_defaults() {
        let line = ShellLine::try_parse_from(["detect", "--json"]).unwrap();
        assert!(matches!(
            line.command,
            Commands::Detect {
                ticks: 5,
                json: true
            }
        ));
    }

    #[test]
    fn test_parse_session_start() {
        let line = ShellLine::try_parse_from(["session", "start", "--lecture", "01:00:00"]).unwrap();
        assert!(matches!(
            line.command,
            Commands::Session {
                action: SessionCommand::Start { ref lecture }
            } if lecture == "01:00:00"
        ));
    }
}
