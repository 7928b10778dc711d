use crate::models::{Course, GodparentRelation, RawCandidate, RawRole};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// Eligible-pool row as returned by the user database
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct PoolRow {
    pub id: String,
    pub role: String,
    pub course: Option<String>,
    pub city: Option<String>,
    pub pronouns: Option<Vec<String>>,
    pub ethnicity: Option<Vec<String>>,
    pub lgbt: Option<Vec<String>>,
    pub hobby: Option<String>,
    pub music: Option<String>,
    pub games: Option<String>,
    pub sports: Option<String>,
    pub parties: Option<i32>,
    pub assigned: i64,
}

impl TryFrom<PoolRow> for RawCandidate {
    type Error = PostgresError;

    fn try_from(row: PoolRow) -> Result<Self, Self::Error> {
        let role: RawRole = row
            .role
            .parse()
            .map_err(|e| PostgresError::InvalidRow(format!("user {}: {}", row.id, e)))?;

        let course = row.course.as_deref().and_then(Course::parse_lenient);

        let assigned = u32::try_from(row.assigned).map_err(|_| {
            PostgresError::InvalidRow(format!("user {}: relation count {}", row.id, row.assigned))
        })?;

        Ok(RawCandidate {
            role,
            course,
            city: row.city,
            pronouns: row.pronouns,
            ethnicity: row.ethnicity,
            lgbt: row.lgbt,
            hobby: row.hobby,
            music: row.music,
            games: row.games,
            sports: row.sports,
            parties: row.parties.and_then(|p| u8::try_from(p).ok()),
            assigned: Some(assigned),
            id: row.id,
        })
    }
}

/// Approved veteranes and active admins with spare capacity, plus active
/// bixes without a godparent. Mentor rows carry their relation count.
const ELIGIBLE_POOL_QUERY: &str = r#"
    SELECT
        u.id::text AS id,
        u.role::text AS role,
        u.course::text AS course,
        u.city,
        u.pronouns,
        u.ethnicity,
        u.lgbt,
        u.hobby,
        u.music,
        u.games,
        u.sports,
        u.parties,
        CASE
            WHEN u.role::text = 'bixe' THEN 0::bigint
            ELSE (SELECT COUNT(*) FROM godparent_relations r WHERE r."godparentId" = u.id)
        END AS assigned
    FROM users u
    WHERE (
            u.role::text = 'veterane'
            AND u."approvalStatus"::text = 'APPROVED'
            AND (SELECT COUNT(*) FROM godparent_relations r WHERE r."godparentId" = u.id) < $1
        )
        OR (
            u.role::text = 'bixe'
            AND u.status = true
            AND (SELECT COUNT(*) FROM godparent_relations r WHERE r."godchildId" = u.id) = 0
        )
        OR (
            u.role::text = 'ADMIN'
            AND u.status = true
            AND (SELECT COUNT(*) FROM godparent_relations r WHERE r."godparentId" = u.id) < $1
        )
    ORDER BY u.id
"#;

/// PostgreSQL collaborator: reads the eligible pool, writes relations
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(5),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
        )
        .await
    }

    /// Load the current eligible pool
    ///
    /// `max_capacity` is the per-mentor limit; mentors already at it are
    /// left out.
    pub async fn fetch_eligible_pool(
        &self,
        max_capacity: u32,
    ) -> Result<Vec<RawCandidate>, PostgresError> {
        let rows = sqlx::query_as::<_, PoolRow>(ELIGIBLE_POOL_QUERY)
            .bind(i64::from(max_capacity))
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Fetched {} eligible users", rows.len());

        rows.into_iter().map(RawCandidate::try_from).collect()
    }

    /// Insert relation rows in one transaction
    ///
    /// Pairs that already exist are skipped. Returns the number of rows
    /// actually inserted.
    pub async fn insert_relations(
        &self,
        relations: &[GodparentRelation],
    ) -> Result<u64, PostgresError> {
        let query = r#"
            INSERT INTO godparent_relations ("godchildId", "godparentId")
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
        "#;

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for relation in relations {
            let result = sqlx::query(query)
                .bind(&relation.godchild_id)
                .bind(&relation.godparent_id)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        tracing::info!(
            "Inserted {} of {} godparent relations",
            inserted,
            relations.len()
        );

        Ok(inserted)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
