pub use sea_orm_migration::prelude::*;

mod m20250105_081230_sessions;
mod m20250105_081945_samples;
mod m20250112_193310_sleep_summaries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250105_081230_sessions::Migration),
            Box::new(m20250105_081945_samples::Migration),
            Box::new(m20250112_193310_sleep_summaries::Migration),
        ]
    }
}
