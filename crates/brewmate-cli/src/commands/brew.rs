//! Interactive brewing.
//!
//! The session runs on a `tokio` timer; its notifications arrive here over a
//! channel and are printed on the main thread, which also reads commands
//! from stdin:
//!
//! - `s` / `skip`: end the current pour now
//! - `q` / `abort`: cancel the brew (nothing is recorded)
//!
//! Any other line typed while brewing is kept as type-ahead for the
//! evaluation prompts.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use brewmate_core::profile::{format_schedule, format_seconds};
use brewmate_core::{
    BrewEvent, BrewSession, ChannelObserver, Clock, Config, DataLayout, Evaluation, LogObserver,
    SystemClock, TastingRecord, TeaProfile,
};
use clap::Args;
use crossbeam_channel::{never, select, Receiver};

#[derive(Args)]
pub struct BrewArgs {
    /// Name of a saved tea
    pub name: String,
    /// Rating 1-10 (prompted when omitted)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub rating: Option<u8>,
    /// Tasting notes (prompted when omitted)
    #[arg(long)]
    pub notes: Option<String>,
    /// Photo to attach to the record
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Finish without recording a tasting
    #[arg(long)]
    pub no_record: bool,
    /// Hide the live countdown
    #[arg(long)]
    pub quiet: bool,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

pub fn run(layout: &DataLayout, config: &Config, args: BrewArgs) -> CliResult<()> {
    let profile = layout.profile_store().load(&args.name)?;
    check_flags(&args)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()?;
    let clock = Arc::new(
        SystemClock::new(runtime.handle().clone()).with_resolution(config.sleep_resolution()),
    );

    let session = BrewSession::new(clock.clone());
    let (observer, events) = ChannelObserver::new();
    let observer = if args.quiet {
        observer.without_ticks()
    } else {
        observer
    };
    session.subscribe(Arc::new(observer));
    session.subscribe(Arc::new(LogObserver));

    let mut input = Input::stdin();

    println!(
        "Brewing {} ({} pours: {})",
        profile.name,
        profile.pour_count,
        format_schedule(&profile.pour_intervals_seconds)
    );
    println!("Commands: s = skip pour, q = abort");
    session.start(profile)?;

    let Some(brewed) = drive(&session, &events, &mut input)? else {
        println!("Brew aborted; nothing recorded.");
        return Ok(());
    };
    let finished_at = clock.now();

    if args.no_record {
        println!("Finished {}; not recorded.", brewed.name);
    } else {
        let evaluation = match collect_evaluation(&args, &mut input)? {
            Some(evaluation) => evaluation,
            None => {
                println!("No evaluation given; nothing recorded.");
                session.reset();
                return Ok(());
            }
        };
        let record = TastingRecord::from_brew(&brewed, &evaluation, finished_at)?;
        let saved = layout
            .record_store()
            .append(record, evaluation.image.as_deref())?;
        println!("Record saved: {}", saved.id);
    }

    session.reset();
    Ok(())
}

/// Pump events and stdin until the session finishes (returns the profile)
/// or the user aborts (returns `None`).
fn drive(
    session: &BrewSession,
    events: &Receiver<BrewEvent>,
    input: &mut Input,
) -> CliResult<Option<TeaProfile>> {
    let mut shown_secs = None;

    loop {
        let lines = input.rx.clone().unwrap_or_else(never);
        select! {
            recv(events) -> event => match event {
                Ok(BrewEvent::PourStarted { pour_index, pour_count, deadline }) => {
                    shown_secs = None;
                    println!(
                        "Pour {pour_index}/{pour_count} steeping until {}",
                        deadline.with_timezone(&chrono::Local).format("%H:%M:%S")
                    );
                }
                Ok(BrewEvent::Tick { pour_index, remaining_ms }) => {
                    let secs = remaining_ms.div_ceil(1000);
                    if shown_secs != Some(secs) {
                        shown_secs = Some(secs);
                        print!("\r  pour {pour_index}: {} left   ", format_seconds(secs));
                        std::io::stdout().flush()?;
                    }
                }
                Ok(BrewEvent::PourCompleted { pour_index, pour_count, skipped, .. }) => {
                    if shown_secs.is_some() {
                        println!();
                    }
                    let note = if skipped { " (skipped)" } else { "" };
                    println!("\x07Pour {pour_index}/{pour_count} is ready, pour now{note}");
                }
                Ok(BrewEvent::SessionFinished { profile, .. }) => {
                    println!("All pours done for {}.", profile.name);
                    return Ok(Some(profile));
                }
                Err(_) => return Err("brew session ended unexpectedly".into()),
            },
            recv(lines) -> line => match line {
                Ok(line) => match line.trim() {
                    "s" | "skip" => {
                        let pour = session.snapshot().pour_index;
                        if !session.skip_pour(pour) {
                            println!("Nothing to skip.");
                        }
                    }
                    "q" | "abort" => {
                        session.abort();
                        return Ok(None);
                    }
                    "" => {}
                    other => input.typeahead.push_back(other.to_string()),
                },
                // stdin closed; keep brewing on the timer alone
                Err(_) => input.rx = None,
            },
        }
    }
}

/// Reject evaluation flags that could only fail once the brew is over.
fn check_flags(args: &BrewArgs) -> CliResult<()> {
    if args.notes.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err("--notes must not be blank".into());
    }
    if let Some(image) = &args.image {
        if !image.is_file() {
            return Err(format!("image '{}' not found", image.display()).into());
        }
    }
    Ok(())
}

fn collect_evaluation(
    args: &BrewArgs,
    input: &mut Input,
) -> CliResult<Option<Evaluation>> {
    let rating = match args.rating {
        Some(rating) => rating,
        None => loop {
            let Some(answer) = input.prompt("Rating (1-10): ") else {
                return Ok(None);
            };
            match answer.trim().parse::<u8>() {
                Ok(r) if (1..=10).contains(&r) => break r,
                _ => println!("Please enter a whole number from 1 to 10."),
            }
        },
    };

    let notes = match &args.notes {
        Some(notes) => notes.clone(),
        None => loop {
            let Some(answer) = input.prompt("Tasting notes: ") else {
                return Ok(None);
            };
            if !answer.trim().is_empty() {
                break answer;
            }
        },
    };

    let image = match &args.image {
        Some(image) => Some(image.clone()),
        None if args.rating.is_none() || args.notes.is_none() => loop {
            let Some(answer) = input.prompt("Photo path (empty for none): ") else {
                break None;
            };
            let answer = answer.trim();
            if answer.is_empty() {
                break None;
            }
            let path = PathBuf::from(answer);
            if path.is_file() {
                break Some(path);
            }
            println!("No file at {answer}; try again or leave empty.");
        },
        None => None,
    };

    let mut evaluation = Evaluation::new(rating, notes);
    evaluation.image = image;
    evaluation.validate()?;
    Ok(Some(evaluation))
}

/// Stdin lines from a reader thread, plus lines held back while brewing.
struct Input {
    rx: Option<Receiver<String>>,
    typeahead: VecDeque<String>,
}

impl Input {
    fn stdin() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self {
            rx: Some(rx),
            typeahead: VecDeque::new(),
        }
    }

    /// Ask `question`; `None` once input is exhausted.
    fn prompt(&mut self, question: &str) -> Option<String> {
        print!("{question}");
        let _ = std::io::stdout().flush();
        if let Some(line) = self.typeahead.pop_front() {
            println!("{line}");
            return Some(line);
        }
        let answer = self.rx.as_ref().and_then(|rx| rx.recv().ok());
        if answer.is_none() {
            self.rx = None;
            println!();
        }
        answer
    }
}
