use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use sleeptk_algos::{
    CycleEstimate, SleepCycleEstimator, SleepInsight, SleepSummary, TrackerSettings,
    WakeSuggestion,
};
use sleeptk_codec::{SleepLog, constants::LOG_EXTENSION};
use sleeptk_db::{DatabaseHandler, SearchSamples};
use uuid::Uuid;

pub struct SleepTk {
    pub database: DatabaseHandler,
    pub settings: TrackerSettings,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<PathBuf>,
}

/// Cycle fit, wake suggestion and insight for one night.
#[derive(Debug)]
pub struct NightAnalysis {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub estimate: Option<CycleEstimate>,
    pub wake: Option<WakeSuggestion>,
    pub insight: SleepInsight,
}

impl NightAnalysis {
    /// Analyses a night as seen at `now`. The wake suggestion needs both an
    /// alarm and a cycle fit.
    pub fn new(
        log: &SleepLog,
        alarm: Option<NaiveDateTime>,
        now: NaiveDateTime,
        settings: &TrackerSettings,
    ) -> Self {
        let estimator = SleepCycleEstimator::new(settings.cycle_length);
        let estimate = estimator.estimate(log.start(), &log.motion());
        let wake = estimate
            .zip(alarm)
            .map(|(estimate, alarm)| estimator.suggest_wake(&estimate, alarm, now, settings.anticipation));

        Self {
            start: log.start(),
            end: log.end(),
            estimate,
            wake,
            insight: SleepInsight::new(log.start(), now, alarm, settings.cycle_length),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "start": self.start,
            "end": self.end,
            "estimate": self.estimate,
            "wake": self.wake,
            "slept_minutes": self.insight.slept.num_minutes(),
            "cycles": self.insight.cycles,
            "alarm_progress": self.insight.alarm_progress,
            "well_rested": self.insight.well_rested,
        })
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>12} [{wide_bar:.cyan/dim}] {pos}/{len} ({eta} remaining)")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

impl SleepTk {
    pub fn new(database: DatabaseHandler, settings: TrackerSettings) -> Self {
        Self {
            database,
            settings: settings.normalized(),
        }
    }

    /// Imports every log in `dir`. Files that are not valid logs are skipped
    /// with a warning so one corrupt night does not block the rest.
    pub async fn import_logs(&self, dir: impl AsRef<Path>) -> anyhow::Result<ImportReport> {
        let mut paths = std::fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == LOG_EXTENSION))
            .collect::<Vec<_>>();
        paths.sort();

        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(bar_style());
        pb.set_prefix("Importing");

        let mut report = ImportReport::default();
        for path in paths {
            match SleepLog::read(&path) {
                Ok(log) => {
                    self.store_log(&log).await?;
                    report.imported += 1;
                }
                Err(error) => {
                    warn!("Skipping {}: {}", path.display(), error);
                    report.skipped.push(path);
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            "Imported {} logs, skipped {}",
            report.imported,
            report.skipped.len()
        );
        Ok(report)
    }

    pub async fn import_log(&self, path: impl AsRef<Path>) -> anyhow::Result<Uuid> {
        let log = SleepLog::read(path)?;
        self.store_log(&log).await
    }

    async fn store_log(&self, log: &SleepLog) -> anyhow::Result<Uuid> {
        let session = self.database.create_session(&log.name).await?;
        self.database.create_samples(session, &log.samples).await?;
        Ok(session)
    }

    /// Summarises every session that has none yet and returns how many
    /// summaries were created.
    pub async fn summarise(&self) -> anyhow::Result<usize> {
        let mut created = 0;
        for session in self.database.sessions_without_summary().await? {
            let samples = self
                .database
                .search_samples(SearchSamples::session(session.id))
                .await?;

            if samples.is_empty() {
                debug!("Session {} has no samples", session.file_name);
                continue;
            }

            let summary =
                SleepSummary::from_samples(session.start, &samples, self.settings.cycle_length);
            self.database.create_summary(session.id, &summary).await?;
            created += 1;
        }

        Ok(created)
    }

    pub fn analyze(
        &self,
        log: &SleepLog,
        alarm: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> NightAnalysis {
        NightAnalysis::new(log, alarm, now, &self.settings)
    }
}
