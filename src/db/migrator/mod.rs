use sea_orm_migration::prelude::*;

mod m20250301_initial;
mod m20250315_add_share_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_initial::Migration),
            Box::new(m20250315_add_share_tokens::Migration),
        ]
    }
}
