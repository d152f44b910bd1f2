use sqlx::postgres::PgPoolOptions;
use url::Url;

pub use migrations::run_migrations;
pub use seeder::seed_development_data;

mod migrations;
mod seeder;

pub type Database = sqlx::Pool<sqlx::Postgres>;

pub async fn connect(url: &Url) -> Result<Database, sqlx::Error> {
    PgPoolOptions::new().connect(url.as_str()).await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CountRow {
    pub count: i64,
}
