use super::{Migration, SimpleSqlMigration};

pub fn migration() -> impl Migration {
    SimpleSqlMigration {
        serial_number: 0,
        sql: vec![
            // The CHECK is a last line of defense; the store only ever
            // decrements through the conditional update.
            r#"
            CREATE TABLE users (
                user_id TEXT PRIMARY KEY,
                credits BIGINT NOT NULL CHECK (credits >= 0),
                created TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            r#"
            CREATE TABLE subscription_allocations (
                id UUID PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users,
                transaction_id TEXT NOT NULL,
                product_id TEXT NOT NULL,
                credits_allocated BIGINT NOT NULL,
                created TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            // The idempotency arbiter: at most one allocation per external
            // transaction id.
            r#"CREATE UNIQUE INDEX allocation_transaction_id ON subscription_allocations (transaction_id)"#,
            r#"
            CREATE TABLE generations (
                id UUID PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users,
                prompt TEXT NOT NULL,
                image_url TEXT NOT NULL,
                credits_deducted BIGINT NOT NULL,
                created TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            r#"CREATE INDEX generation_user_id ON generations (user_id)"#,
        ],
    }
}
