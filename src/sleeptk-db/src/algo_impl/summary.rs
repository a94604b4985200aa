use chrono::NaiveDateTime;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
};
use sleeptk_algos::SleepSummary;
use sleeptk_entities::{sessions, sleep_summaries};
use sleeptk_migration::OnConflict;
use uuid::Uuid;

use crate::DatabaseHandler;

impl DatabaseHandler {
    pub async fn create_summary(
        &self,
        session_id: Uuid,
        summary: &SleepSummary,
    ) -> anyhow::Result<()> {
        let model = sleep_summaries::ActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id),
            sleep_id: Set(summary.id),
            start: Set(summary.start),
            end: Set(summary.end),
            min_bpm: Set(summary.min_bpm.map(i16::from)),
            max_bpm: Set(summary.max_bpm.map(i16::from)),
            avg_bpm: Set(summary.avg_bpm.map(i16::from)),
            mean_motion: Set(summary.mean_motion),
            cycles: Set(summary.cycles),
            touches: Set(i32::try_from(summary.touches)?),
            score: Set(summary.score),
        };

        sleep_summaries::Entity::insert(model)
            .on_conflict(
                OnConflict::column(sleep_summaries::Column::SessionId)
                    .update_columns([
                        sleep_summaries::Column::SleepId,
                        sleep_summaries::Column::Start,
                        sleep_summaries::Column::End,
                        sleep_summaries::Column::MinBpm,
                        sleep_summaries::Column::MaxBpm,
                        sleep_summaries::Column::AvgBpm,
                        sleep_summaries::Column::MeanMotion,
                        sleep_summaries::Column::Cycles,
                        sleep_summaries::Column::Touches,
                        sleep_summaries::Column::Score,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn get_summaries(
        &self,
        start: Option<NaiveDateTime>,
    ) -> anyhow::Result<Vec<SleepSummary>> {
        let filter =
            Condition::all().add_option(start.map(|s| sleep_summaries::Column::Start.gte(s)));

        Ok(sleep_summaries::Entity::find()
            .order_by_asc(sleep_summaries::Column::Start)
            .filter(filter)
            .all(&self.db)
            .await?
            .into_iter()
            .map(map_summary)
            .collect())
    }

    pub async fn sessions_without_summary(&self) -> anyhow::Result<Vec<sessions::Model>> {
        let sessions = sessions::Entity::find()
            .join(JoinType::LeftJoin, sessions::Relation::SleepSummaries.def())
            .filter(sleep_summaries::Column::Id.is_null())
            .order_by_asc(sessions::Column::Start)
            .all(&self.db)
            .await?;

        Ok(sessions)
    }
}

fn map_summary(value: sleep_summaries::Model) -> SleepSummary {
    let bpm = |v: Option<i16>| v.and_then(|v| u8::try_from(v).ok());
    SleepSummary {
        id: value.sleep_id,
        start: value.start,
        end: value.end,
        min_bpm: bpm(value.min_bpm),
        max_bpm: bpm(value.max_bpm),
        avg_bpm: bpm(value.avg_bpm),
        mean_motion: value.mean_motion,
        cycles: value.cycles,
        touches: u32::try_from(value.touches).unwrap_or_default(),
        score: value.score,
    }
}
