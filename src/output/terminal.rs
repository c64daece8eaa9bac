use crate::sandbox::Outcome;
use colored::*;

pub fn print_outcome(title: &str, outcome: &Outcome) {
    print_header(title);

    match outcome {
        Outcome::Success { transcript } => print_transcript(transcript),
        Outcome::Failure { message } => print_failure(message),
    }
}

/// Print a normalized snippet with line numbers.
pub fn print_stripped(body: &str) {
    for (i, line) in body.lines().enumerate() {
        println!("{} │ {}", format!("{:>4}", i + 1).bright_black(), line);
    }
}

fn print_header(title: &str) {
    println!("{}", "┌─────────────────────────────────────────────────────────────┐".bright_black());
    println!("│  {:<59}│", title.bold());
    println!("{}", "└─────────────────────────────────────────────────────────────┘".bright_black());
    println!();
}

fn print_transcript(transcript: &[String]) {
    println!("{}", "── Output ───────────────────────────────────────────────────".bright_black());

    if transcript.is_empty() {
        println!("  {}", "(no output)".bright_black());
    }

    for line in transcript {
        println!("{}", styled_line(line));
    }

    println!();
}

fn styled_line(line: &str) -> ColoredString {
    if line.starts_with("ERROR: ") {
        line.red()
    } else if line.starts_with("WARNING: ") {
        line.yellow()
    } else {
        line.normal()
    }
}

fn print_failure(message: &str) {
    println!("{}", "── Error ────────────────────────────────────────────────────".red());
    for line in message.lines() {
        println!("  {} {}", "✖".red(), line.red().bold());
    }
    println!();
}
