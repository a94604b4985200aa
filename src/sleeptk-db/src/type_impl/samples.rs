use chrono::NaiveDateTime;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sleeptk_codec::{HeartRate, Meta, ParsedSample};
use sleeptk_entities::samples;
use sleeptk_migration::OnConflict;
use uuid::Uuid;

use crate::DatabaseHandler;

/// Ten bound parameters per row keeps a chunk well under the SQLite limit.
const INSERT_CHUNK: usize = 1_000;

#[derive(Default, Debug)]
pub struct SearchSamples {
    pub session: Option<Uuid>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub limit: Option<u64>,
}

impl SearchSamples {
    pub fn session(id: Uuid) -> Self {
        Self {
            session: Some(id),
            ..Default::default()
        }
    }

    pub(crate) fn conditions(self) -> Condition {
        Condition::all()
            .add_option(self.session.map(|id| samples::Column::SessionId.eq(id)))
            .add_option(self.from.map(|from| samples::Column::Time.gte(from)))
            .add_option(self.to.map(|to| samples::Column::Time.lt(to)))
    }
}

impl DatabaseHandler {
    pub async fn create_samples(
        &self,
        session_id: Uuid,
        samples: &[ParsedSample],
    ) -> anyhow::Result<()> {
        for chunk in samples.chunks(INSERT_CHUNK) {
            let payloads = chunk
                .iter()
                .map(|sample| Self::sample_model(session_id, sample))
                .collect::<anyhow::Result<Vec<_>>>()?;

            samples::Entity::insert_many(payloads)
                .on_conflict(
                    OnConflict::columns([samples::Column::SessionId, samples::Column::Time])
                        .update_columns([
                            samples::Column::OffsetSecs,
                            samples::Column::Motion,
                            samples::Column::Bpm,
                            samples::Column::BpmFailed,
                            samples::Column::Meta,
                            samples::Column::Accel,
                            samples::Column::BatteryMv,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&self.db)
                .await?;
        }

        debug!("Stored {} samples for session {}", samples.len(), session_id);
        Ok(())
    }

    pub async fn search_samples(
        &self,
        options: SearchSamples,
    ) -> anyhow::Result<Vec<ParsedSample>> {
        let limit = options.limit;
        samples::Entity::find()
            .filter(options.conditions())
            .limit(limit)
            .order_by_asc(samples::Column::Time)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::parse_sample)
            .collect()
    }

    fn sample_model(session_id: Uuid, sample: &ParsedSample) -> anyhow::Result<samples::ActiveModel> {
        Ok(samples::ActiveModel {
            id: NotSet,
            session_id: Set(session_id),
            time: Set(sample.time),
            offset_secs: Set(sample.offset),
            motion: Set(sample.motion),
            bpm: Set(sample.heart_rate.bpm().map(i16::from)),
            bpm_failed: Set(sample.heart_rate == HeartRate::Unknown),
            meta: Set(i16::from(sample.meta as u8)),
            accel: Set(sample.accel.map(serde_json::to_value).transpose()?),
            battery_mv: Set(sample.battery_mv.map(i32::try_from).transpose()?),
        })
    }

    fn parse_sample(model: samples::Model) -> anyhow::Result<ParsedSample> {
        let heart_rate = match (model.bpm, model.bpm_failed) {
            (Some(bpm), _) => match u8::try_from(bpm) {
                Ok(bpm) => HeartRate::Bpm(bpm),
                Err(_) => {
                    warn!("Sample {} has bpm {} out of range, reading it as unknown", model.id, bpm);
                    HeartRate::Unknown
                }
            },
            (None, true) => HeartRate::Unknown,
            (None, false) => HeartRate::Missing,
        };

        let meta = u8::try_from(model.meta)
            .ok()
            .and_then(Meta::from_repr)
            .unwrap_or_else(|| {
                warn!("Sample {} has unknown meta code {}", model.id, model.meta);
                Meta::None
            });

        Ok(ParsedSample {
            time: model.time,
            offset: model.offset_secs,
            motion: model.motion,
            heart_rate,
            meta,
            accel: model.accel.map(serde_json::from_value).transpose()?,
            battery_mv: model.battery_mv.and_then(|mv| u32::try_from(mv).ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use sleeptk_codec::{AxisAverages, LogFileName, SleepLog};

    use super::*;

    const NIGHT: &str = "Timestamp,Motion,BPM,Meta\n,0.512,,\n,0.100,58,\n5,-0.250,?,1\n,0.000,,3";

    fn night() -> SleepLog {
        SleepLog::parse(LogFileName::compact(1735772400, 120), NIGHT).unwrap()
    }

    #[test]
    fn parse_sample_restores_heart_rate_states() {
        let time = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();

        let model = samples::Model {
            id: 1,
            session_id: Uuid::new_v4(),
            time,
            offset_secs: 0,
            motion: 0.25,
            bpm: None,
            bpm_failed: true,
            meta: 2,
            accel: None,
            battery_mv: Some(3900),
        };

        let sample = DatabaseHandler::parse_sample(model).unwrap();
        assert_eq!(sample.heart_rate, HeartRate::Unknown);
        assert_eq!(sample.meta, Meta::Vibrated);
        assert_eq!(sample.battery_mv, Some(3900));
    }

    #[test]
    fn parse_sample_ignores_unknown_meta() {
        let model = samples::Model {
            id: 1,
            session_id: Uuid::new_v4(),
            time: NaiveDateTime::default(),
            offset_secs: 0,
            motion: 0.0,
            bpm: Some(61),
            bpm_failed: false,
            meta: 42,
            accel: None,
            battery_mv: None,
        };

        let sample = DatabaseHandler::parse_sample(model).unwrap();
        assert_eq!(sample.heart_rate, HeartRate::Bpm(61));
        assert_eq!(sample.meta, Meta::None);
    }

    #[test]
    fn parse_sample_reads_impossible_bpm_as_unknown() {
        let model = samples::Model {
            id: 1,
            session_id: Uuid::new_v4(),
            time: NaiveDateTime::default(),
            offset_secs: 0,
            motion: 0.0,
            bpm: Some(300),
            bpm_failed: false,
            meta: 0,
            accel: None,
            battery_mv: None,
        };

        let sample = DatabaseHandler::parse_sample(model).unwrap();
        assert_eq!(sample.heart_rate, HeartRate::Unknown);

        let model = samples::Model {
            id: 2,
            session_id: Uuid::new_v4(),
            time: NaiveDateTime::default(),
            offset_secs: 0,
            motion: 0.0,
            bpm: Some(-5),
            bpm_failed: false,
            meta: 0,
            accel: None,
            battery_mv: None,
        };
        assert_eq!(
            DatabaseHandler::parse_sample(model).unwrap().heart_rate,
            HeartRate::Unknown
        );
    }

    #[tokio::test]
    async fn store_and_search_samples() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();
        let log = night();
        let session = db.create_session(&log.name).await.unwrap();

        db.create_samples(session, &log.samples).await.unwrap();
        let samples = db.search_samples(SearchSamples::session(session)).await.unwrap();
        assert_eq!(samples, log.samples);
    }

    #[tokio::test]
    async fn reimport_does_not_duplicate_samples() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();
        let log = night();
        let session = db.create_session(&log.name).await.unwrap();

        db.create_samples(session, &log.samples).await.unwrap();
        db.create_samples(session, &log.samples).await.unwrap();
        let samples = db.search_samples(SearchSamples::default()).await.unwrap();
        assert_eq!(samples.len(), 4);
    }

    #[tokio::test]
    async fn search_samples_by_time() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();
        let log = night();
        let session = db.create_session(&log.name).await.unwrap();
        db.create_samples(session, &log.samples).await.unwrap();

        let samples = db
            .search_samples(SearchSamples {
                from: Some(log.start() + TimeDelta::minutes(2)),
                to: Some(log.start() + TimeDelta::minutes(12)),
                ..Default::default()
            })
            .await
            .unwrap();
        let offsets = samples.iter().map(|s| s.offset).collect::<Vec<_>>();
        assert_eq!(offsets, vec![120, 600]);
    }

    #[tokio::test]
    async fn legacy_axes_round_trip_through_json() {
        let db = DatabaseHandler::new("sqlite::memory:").await.unwrap();
        let name = LogFileName::parse("1735772400.csv").unwrap();
        let log = SleepLog::parse(name, "0,0.1,0.2,-0.9,-86.5,3900\n300,0.1,0.2,-0.9,-86.5,3890\n")
            .unwrap();
        let session = db.create_session(&log.name).await.unwrap();
        db.create_samples(session, &log.samples).await.unwrap();

        let samples = db.search_samples(SearchSamples::session(session)).await.unwrap();
        assert_eq!(
            samples[1].accel,
            Some(AxisAverages {
                x: 0.1,
                y: 0.2,
                z: -0.9
            })
        );
        assert_eq!(samples[1].battery_mv, Some(3890));
    }
}
