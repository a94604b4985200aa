use anyhow::anyhow;
use sea_orm::{
    ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use sleeptk_codec::LogFileName;
use sleeptk_entities::sessions;
use sleeptk_migration::{Migrator, MigratorTrait, OnConflict};
use uuid::Uuid;

#[derive(Clone)]
pub struct DatabaseHandler {
    pub(crate) db: DatabaseConnection,
}

impl DatabaseHandler {
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn new<C>(path: C) -> anyhow::Result<Self>
    where
        C: Into<ConnectOptions>,
    {
        let db = Database::connect(path).await?;
        Migrator::up(&db, None).await?;
        Ok(Self { db })
    }

    /// Registers the session a log belongs to and returns its id. A log
    /// imported twice keeps the id of the first import.
    pub async fn create_session(&self, name: &LogFileName) -> anyhow::Result<Uuid> {
        let start = name.start_time();
        let model = sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            start: Set(start),
            frequency: Set(i32::try_from(name.frequency)?),
            version: Set(name.version.tag().map_or(0, |tag| tag as i32)),
            file_name: Set(name.to_string()),
        };

        sessions::Entity::insert(model)
            .on_conflict(
                OnConflict::column(sessions::Column::Start)
                    .update_columns([
                        sessions::Column::Frequency,
                        sessions::Column::Version,
                        sessions::Column::FileName,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let session = sessions::Entity::find()
            .filter(sessions::Column::Start.eq(start))
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("Session {} missing after insert", name))?;

        debug!("Session {} for {}", session.id, name);
        Ok(session.id)
    }

    pub async fn get_sessions(&self) -> anyhow::Result<Vec<sessions::Model>> {
        let sessions = sessions::Entity::find()
            .order_by_asc(sessions::Column::Start)
            .all(&self.db)
            .await?;

        Ok(sessions)
    }

    pub async fn get_session(&self, id: Uuid) -> anyhow::Result<Option<sessions::Model>> {
        Ok(sessions::Entity::find_by_id(id).one(&self.db).await?)
    }
}
