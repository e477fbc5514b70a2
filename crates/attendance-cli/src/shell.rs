//! Interactive shell: one in-memory store, many commands.

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::App;
use crate::cli::ShellLine;

const PROMPT: &str = "attendance> ";

pub async fn run(app: &mut App) -> Result<()> {
    println!("Attendance shell. Type `help` for commands, `quit` to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_prompt();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let words = match split_words(&line) {
            Ok(words) => words,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        match words.first().map(String::as_str) {
            None => continue,
            Some("quit" | "exit") => break,
            _ => {}
        }

        match ShellLine::try_parse_from(&words) {
            Ok(parsed) => {
                if let Err(e) = app.run(parsed.command).await {
                    tracing::warn!(error = %e, "command failed");
                    println!("Error: {e:#}");
                }
            }
            Err(e) => {
                let _ = e.print();
            }
        }
    }

    tracing::info!("shell exiting");
    Ok(())
}

fn print_prompt() {
    use std::io::Write;
    print!("{PROMPT}");
    let _ = std::io::stdout().flush();
}

/// Split a command line on whitespace, keeping double-quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>, &'static str> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
