#[macro_use]
extern crate log;

use std::{path::PathBuf, str::FromStr};

use anyhow::anyhow;
use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Utc};
use clap::{Args, CommandFactory, Parser, Subcommand};
use dotenv::dotenv;
use sleeptk::{DatabaseHandler, NightAnalysis, SessionRecorder, SleepTk};
use sleeptk_algos::{
    SleepConsistencyAnalyzer, TrackerSettings, VibrationPulse, WakeEventKind, WakePlan,
    helpers::format_hm::FormatHM, next_natural_wake, resolve_alarm, suggest_alarm,
};
use sleeptk_codec::{SleepLog, constants::LOG_DIR};

#[derive(Parser)]
pub struct SleepTkCli {
    #[arg(env, long)]
    pub database_url: Option<String>,
    #[arg(env = "SLEEP_LOG_DIR", long, default_value = LOG_DIR)]
    pub log_dir: PathBuf,
    #[clap(subcommand)]
    pub subcommand: SleepTkCommand,
}

#[derive(Subcommand)]
pub enum SleepTkCommand {
    ///
    /// Import every session log from the log directory
    ///
    Import {
        /// Directory to import instead of the log directory
        dir: Option<PathBuf>,
    },
    ///
    /// Summarise imported sessions that have no summary yet
    ///
    Summarize {
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    ///
    /// Print sleep statistics for all time and last week
    ///
    SleepStats,
    ///
    /// Fit sleep cycles to a log and suggest when to wake up
    ///
    Analyze {
        log: PathBuf,
        #[arg(long)]
        alarm: Option<AlarmTime>,
        /// Analyse as of this time instead of the end of the log
        #[arg(long)]
        at: Option<NaiveDateTime>,
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    ///
    /// Replay a raw `seconds,x,y,z[,bpm][,battery]` capture into a session log
    ///
    Record {
        capture: PathBuf,
        /// Unix time of the first reading, now when omitted
        #[arg(long)]
        start: Option<i64>,
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    ///
    /// Print the wake events for an alarm
    ///
    PlanAlarm {
        alarm_time: AlarmTime,
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    ///
    /// Suggest an alarm time from the sleep cycle goal
    ///
    SuggestAlarm {
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    ///
    /// Generate shell completions
    ///
    Completions { shell: clap_complete::Shell },
}

#[derive(Args, Clone, Debug)]
pub struct TrackerArgs {
    #[arg(long)]
    pub no_movement: bool,
    #[arg(long)]
    pub no_heart_rate: bool,
    #[arg(long)]
    pub no_gradual_wake: bool,
    #[arg(long)]
    pub natural_wake: bool,
    /// Minutes per sleep cycle
    #[arg(long, env, default_value_t = 90)]
    pub cycle_length: u32,
    #[arg(long, env, default_value_t = 5)]
    pub goal_cycles: u32,
}

impl TrackerArgs {
    fn settings(&self) -> TrackerSettings {
        TrackerSettings {
            movement: !self.no_movement,
            heart_rate: !self.no_heart_rate,
            gradual_wake: !self.no_gradual_wake,
            natural_wake: self.natural_wake,
            cycle_length: TimeDelta::minutes(i64::from(self.cycle_length.max(1))),
            goal_cycles: self.goal_cycles,
            ..Default::default()
        }
        .normalized()
    }
}

impl SleepTkCli {
    async fn database(&self) -> anyhow::Result<DatabaseHandler> {
        let url = self
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow!("DATABASE_URL is required for this command"))?;
        DatabaseHandler::new(url).await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(error) = dotenv() {
        println!("{}", error);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("sqlx::query", log::LevelFilter::Off)
        .filter_module("sea_orm_migration::migrator", log::LevelFilter::Off)
        .init();

    let cli = SleepTkCli::parse();
    let now = Utc::now().naive_utc();

    match &cli.subcommand {
        SleepTkCommand::Import { dir } => {
            let tk = SleepTk::new(cli.database().await?, TrackerSettings::default());
            let dir = dir.as_ref().unwrap_or(&cli.log_dir);
            let report = tk.import_logs(dir).await?;
            println!(
                "Imported {} logs from {}",
                report.imported,
                dir.display()
            );
            for path in report.skipped {
                println!("Skipped: {}", path.display());
            }
            Ok(())
        }
        SleepTkCommand::Summarize { tracker } => {
            let tk = SleepTk::new(cli.database().await?, tracker.settings());
            let created = tk.summarise().await?;
            println!("Created {} summaries", created);
            Ok(())
        }
        SleepTkCommand::SleepStats => {
            let db = cli.database().await?;
            let summaries = db.get_summaries(None).await?;
            let mut last_week = summaries.iter().rev().take(7).copied().collect::<Vec<_>>();
            last_week.reverse();

            let analyzer = SleepConsistencyAnalyzer::new(&summaries);
            let metrics = analyzer.calculate_consistency_metrics();
            println!("All time: \n{}", metrics);
            let analyzer = SleepConsistencyAnalyzer::new(&last_week);
            let metrics = analyzer.calculate_consistency_metrics();
            println!("\nWeek: \n{}", metrics);

            Ok(())
        }
        SleepTkCommand::Analyze {
            log,
            alarm,
            at,
            json,
            tracker,
        } => {
            let log = SleepLog::read(log)?;
            let now = at.unwrap_or_else(|| log.end());
            let alarm = alarm.map(|alarm| alarm.resolve(log.start()));

            let analysis = NightAnalysis::new(&log, alarm, now, &tracker.settings());

            if *json {
                println!("{}", serde_json::to_string_pretty(&analysis.to_json())?);
                return Ok(());
            }

            println!("Night: {} - {}", analysis.start, analysis.end);
            match analysis.estimate {
                Some(estimate) => println!(
                    "Cycle phase: {} (fit {:.2}), next light sleep at {}",
                    estimate.phase().format_hm(),
                    estimate.fit,
                    estimate.next_peak(now)
                ),
                None => println!("Not enough motion to fit sleep cycles"),
            }
            if let Some(wake) = analysis.wake {
                println!(
                    "Wake at {} ({} before the alarm)",
                    wake.time,
                    wake.earlier_by().format_hm()
                );
            }
            println!("{}", analysis.insight);
            Ok(())
        }
        SleepTkCommand::Record {
            capture,
            start,
            tracker,
        } => {
            let start = match start {
                Some(unix) => chrono::DateTime::from_timestamp(*unix, 0)
                    .ok_or_else(|| anyhow!("Invalid start time {}", unix))?
                    .naive_utc(),
                None => now,
            };

            let text = std::fs::read_to_string(capture)?;
            let readings = SessionRecorder::parse_capture(&text)?;
            let outcome =
                SessionRecorder::new(tracker.settings(), start, &cli.log_dir).record(&readings)?;

            match outcome.path {
                Some(path) => println!("Wrote {} rows to {}", outcome.rows, path.display()),
                None => println!("Movement tracking is off, no log written"),
            }
            if outcome.battery_low {
                warn!("Recording stopped early on low battery");
            }
            Ok(())
        }
        SleepTkCommand::PlanAlarm {
            alarm_time,
            json,
            tracker,
        } => {
            let settings = tracker.settings();
            let plan = WakePlan::new(&settings, now, alarm_time.resolve(now));

            if *json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }

            println!("Alarm set for: {}", plan.alarm);
            for event in &plan.events {
                let pulse = match event.kind {
                    WakeEventKind::TinyVibration => VibrationPulse::TINY,
                    WakeEventKind::NaturalWake => VibrationPulse::NATURAL,
                    WakeEventKind::Ring => VibrationPulse::ringing(0),
                };
                println!(
                    "{} {} ({}% for {}ms)",
                    event.time, event.kind, pulse.duty, pulse.ms
                );
            }
            if let Some(event) = plan.main_event() {
                if event.kind == WakeEventKind::NaturalWake {
                    let next = next_natural_wake(event.time, &settings, &mut rand::rng());
                    println!("Next natural wake pulse around {}", next);
                }
            }
            println!(
                "Snooze: {}, stop after {} attempts",
                settings.snooze.format_hm(),
                settings.stop_limit
            );
            Ok(())
        }
        SleepTkCommand::SuggestAlarm { tracker } => {
            let settings = tracker.settings();
            let alarm = suggest_alarm(now, &settings);
            println!(
                "Suggested alarm: {} ({} cycles of {})",
                alarm,
                settings.goal_cycles,
                settings.cycle_length.format_hm()
            );
            Ok(())
        }
        SleepTkCommand::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut SleepTkCli::command(),
                "sleeptk",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AlarmTime {
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    In(TimeDelta),
}

impl FromStr for AlarmTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(t) = s.parse() {
            return Ok(Self::DateTime(t));
        }

        if let Ok(t) = s.parse() {
            return Ok(Self::Time(t));
        }

        match s {
            "minute" | "1min" | "min" => Ok(Self::In(TimeDelta::minutes(1))),
            "5minute" | "5min" => Ok(Self::In(TimeDelta::minutes(5))),
            "10minute" | "10min" => Ok(Self::In(TimeDelta::minutes(10))),
            "15minute" | "15min" => Ok(Self::In(TimeDelta::minutes(15))),
            "30minute" | "30min" => Ok(Self::In(TimeDelta::minutes(30))),
            "hour" | "h" => Ok(Self::In(TimeDelta::hours(1))),
            _ => Err(anyhow!("Invalid alarm time")),
        }
    }
}

impl AlarmTime {
    pub fn resolve(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            AlarmTime::DateTime(dt) => dt,
            AlarmTime::Time(t) => resolve_alarm(now, t),
            AlarmTime::In(offset) => now + offset,
        }
    }
}
