use async_trait::async_trait;
use common::errors::AppError;
use common::models::Subscriber;
use sqlx::PgPool;
use tracing::info;

/// Read-only source of signup records. Iteration failures are the
/// collaborator's to report; they surface as [`AppError::DataAccess`].
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn all(&self) -> Result<Vec<Subscriber>, AppError>;
}

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPool::connect(database_url).await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS city (
            id SERIAL PRIMARY KEY,
            name VARCHAR(120) UNIQUE NOT NULL,
            state VARCHAR(2) NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // RFC 3696 errata: upper length of an email address is 254 chars.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS person (
            id SERIAL PRIMARY KEY,
            email VARCHAR(254) UNIQUE NOT NULL,
            city_id INTEGER NOT NULL REFERENCES city(id),
            time_created TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
            time_updated TIMESTAMP WITH TIME ZONE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    email: String,
    city: String,
    state: String,
}

/// Postgres-backed subscriber store joining signups to their chosen city.
pub struct PgSubscriberStore {
    pool: PgPool,
}

impl PgSubscriberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    async fn all(&self) -> Result<Vec<Subscriber>, AppError> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            r#"
            SELECT p.email, c.name AS city, c.state
            FROM person p
            INNER JOIN city c ON p.city_id = c.id
            ORDER BY p.email
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Subscriber {
                email: row.email,
                city: row.city,
                state: row.state,
            })
            .collect())
    }
}
