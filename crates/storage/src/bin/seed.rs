use std::fmt;

use chrono::{DateTime, Utc};
use prep_core::model::{Difficulty, Subject};
use prep_storage::repository::{NewQuestionRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    per_subject: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidPerSubject { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidPerSubject { raw } => {
                write!(f, "invalid --per-subject value: {raw}")
            }
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PREP_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut per_subject = std::env::var("PREP_SEED_PER_SUBJECT")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(10);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--per-subject" => {
                    let value = require_value(&mut args, "--per-subject")?;
                    per_subject = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidPerSubject { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            per_subject,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p prep-storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --per-subject <n>         Questions to insert per subject (default: 10)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  PREP_DB_URL, PREP_SEED_PER_SUBJECT");
}

struct SampleQuestion {
    topic: &'static str,
    difficulty: Difficulty,
    prompt: &'static str,
    options: [&'static str; 4],
    correct_answer: &'static str,
    explanation: &'static str,
}

fn math_samples() -> Vec<SampleQuestion> {
    vec![
        SampleQuestion {
            topic: "Algebra",
            difficulty: Difficulty::Easy,
            prompt: "If 3x + 5 = 20, what is the value of x?",
            options: ["3", "5", "7", "15"],
            correct_answer: "B",
            explanation: "Subtract 5 from both sides, then divide by 3: x = 5.",
        },
        SampleQuestion {
            topic: "Geometry",
            difficulty: Difficulty::Medium,
            prompt: "A circle has a circumference of 12\u{3c0}. What is its radius?",
            options: ["3", "6", "12", "24"],
            correct_answer: "B",
            explanation: "Circumference is 2\u{3c0}r, so r = 6.",
        },
        SampleQuestion {
            topic: "Data Analysis",
            difficulty: Difficulty::Hard,
            prompt: "The mean of five numbers is 14. Four of them are 10, 12, 16, and 18. What is the fifth?",
            options: ["12", "14", "16", "18"],
            correct_answer: "B",
            explanation: "The sum must be 70; the four known values sum to 56, so the fifth is 14.",
        },
    ]
}

fn reading_samples() -> Vec<SampleQuestion> {
    vec![
        SampleQuestion {
            topic: "Grammar",
            difficulty: Difficulty::Easy,
            prompt: "Choose the option that best completes the sentence: Neither of the essays ___ finished.",
            options: ["were", "was", "are", "have been"],
            correct_answer: "B",
            explanation: "\"Neither\" is singular and takes a singular verb.",
        },
        SampleQuestion {
            topic: "Vocabulary in Context",
            difficulty: Difficulty::Medium,
            prompt: "In the passage, \"tempered\" most nearly means:",
            options: ["hardened", "moderated", "heated", "annoyed"],
            correct_answer: "B",
            explanation: "The surrounding clause contrasts enthusiasm with restraint.",
        },
        SampleQuestion {
            topic: "Evidence",
            difficulty: Difficulty::Hard,
            prompt: "Which choice provides the best evidence for the answer to the previous question?",
            options: ["Lines 3-5", "Lines 12-14", "Lines 21-23", "Lines 30-32"],
            correct_answer: "C",
            explanation: "Lines 21-23 restate the author's qualified endorsement.",
        },
    ]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut inserted = 0u32;
    for (subject, samples) in [
        (Subject::Math, math_samples()),
        (Subject::ReadingWriting, reading_samples()),
    ] {
        for i in 0..args.per_subject {
            let sample = &samples[(i as usize) % samples.len()];
            let record = NewQuestionRecord {
                subject,
                topic: sample.topic.to_owned(),
                difficulty: sample.difficulty,
                prompt: sample.prompt.to_owned(),
                options: sample.options.iter().map(|&o| o.to_owned()).collect(),
                correct_answer: sample.correct_answer.to_owned(),
                explanation: sample.explanation.to_owned(),
                created_at: now,
            };
            storage.questions.insert_question(record).await?;
            inserted += 1;
        }
    }

    println!("Seeded {} questions into {}", inserted, args.db_url);

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
