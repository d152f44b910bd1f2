use super::Database;
use chrono::Utc;

pub async fn seed_development_data(db: &Database) {
    seed_test_user(db, "dev-user-1", 500).await;
    seed_test_user(db, "dev-user-2", 0).await;
}

async fn seed_test_user(db: &Database, user_id: &str, credits: i64) {
    sqlx::query(
        r#"INSERT INTO users (user_id, credits, created) VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING"#,
    )
    .bind(user_id)
    .bind(credits)
    .bind(Utc::now())
    .execute(db)
    .await
    .unwrap();
}
