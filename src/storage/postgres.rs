use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::prediction::{
    PredictionAction, PredictionModel, PredictionRepository, PredictionStatus, ScoredPrediction,
};
use crate::scoring::{ScoreAggregator, UserAggregate};
use crate::shared::AppError;
use crate::telemetry::DriverCode;
use crate::user::{LeaderboardEntry, UserModel, UserRepository};

/// Transaction-scoped advisory lock key shared by every scoring commit, so
/// commits from separate server processes apply one after another
const SCORING_LOCK_KEY: i64 = 0x7069_746c_616e_65;

const PREDICTION_COLUMNS: &str = "id, user_id, race_id, driver, action, predicted_lap, confidence, status, points_earned, created_at";

fn db_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Database operation failed");
    AppError::DatabaseError(e.to_string())
}

fn user_from_row(row: &PgRow) -> UserModel {
    UserModel {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        total_score: row.get("total_score"),
        accuracy_rate: row.get("accuracy_rate"),
        created_at: row.get("created_at"),
    }
}

fn prediction_from_row(row: &PgRow) -> Result<PredictionModel, AppError> {
    let status: String = row.get("status");
    let status = status
        .parse::<PredictionStatus>()
        .map_err(|_| AppError::DatabaseError(format!("Unknown prediction status '{}'", status)))?;

    Ok(PredictionModel {
        id: row.get("id"),
        user_id: row.get("user_id"),
        race_id: row.get("race_id"),
        driver: DriverCode::from(row.get::<String, _>("driver")),
        action: PredictionAction::from(row.get::<String, _>("action")),
        predicted_lap: row.get("predicted_lap"),
        confidence: row.get("confidence"),
        status,
        points_earned: row.get("points_earned"),
        created_at: row.get("created_at"),
    })
}

/// PostgreSQL implementation of the user and prediction repositories
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates tables and indexes when missing
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                total_score BIGINT NOT NULL DEFAULT 0,
                accuracy_rate DOUBLE PRECISION NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS predictions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                race_id BIGINT,
                driver TEXT NOT NULL,
                action TEXT NOT NULL,
                predicted_lap INTEGER NOT NULL DEFAULT 0,
                confidence INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                points_earned BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_predictions_status ON predictions(status)",
            "CREATE INDEX IF NOT EXISTS idx_predictions_user ON predictions(user_id, created_at DESC)",
            "CREATE INDEX IF NOT EXISTS idx_predictions_race ON predictions(race_id)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        }

        info!("Database schema ready");
        Ok(())
    }

    async fn fetch_predictions(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Vec<PredictionModel>, AppError> {
        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(prediction_from_row).collect()
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, username = %user.username, "Creating user in database");

        sqlx::query(
            "INSERT INTO users (id, username, email, total_score, accuracy_rate, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.total_score)
        .bind(user.accuracy_rate)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    warn!(username = %user.username, "Username or email already registered");
                    return AppError::Conflict("Username or email already registered".to_string());
                }
            }
            db_error(e)
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, email, total_score, accuracy_rate, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self))]
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT u.username, u.total_score, u.accuracy_rate, COUNT(p.id) AS predictions_count
             FROM users u LEFT JOIN predictions p ON p.user_id = u.id
             GROUP BY u.id
             ORDER BY u.total_score DESC, u.created_at ASC
             LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .iter()
            .enumerate()
            .map(|(index, row)| LeaderboardEntry {
                rank: index as u32 + 1,
                username: row.get("username"),
                total_points: row.get("total_score"),
                accuracy: row.get("accuracy_rate"),
                predictions_count: row.get::<i64, _>("predictions_count").max(0) as u64,
            })
            .collect())
    }
}

#[async_trait]
impl PredictionRepository for PostgresRepository {
    #[instrument(skip(self, prediction))]
    async fn create_prediction(&self, prediction: &PredictionModel) -> Result<(), AppError> {
        debug!(prediction_id = %prediction.id, "Creating prediction in database");

        sqlx::query(&format!(
            "INSERT INTO predictions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            PREDICTION_COLUMNS
        ))
        .bind(&prediction.id)
        .bind(&prediction.user_id)
        .bind(prediction.race_id)
        .bind(prediction.driver.as_str())
        .bind(prediction.action.as_str())
        .bind(prediction.predicted_lap)
        .bind(prediction.confidence)
        .bind(prediction.status.to_string())
        .bind(prediction.points_earned)
        .bind(prediction.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PredictionModel>, AppError> {
        let sql = format!(
            "SELECT {} FROM predictions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            PREDICTION_COLUMNS
        );
        self.fetch_predictions(sqlx::query(&sql).bind(user_id).bind(limit as i64))
            .await
    }

    #[instrument(skip(self))]
    async fn list_for_race(&self, race_id: i64) -> Result<Vec<PredictionModel>, AppError> {
        let sql = format!(
            "SELECT {} FROM predictions WHERE race_id = $1 ORDER BY created_at DESC",
            PREDICTION_COLUMNS
        );
        self.fetch_predictions(sqlx::query(&sql).bind(race_id)).await
    }

    #[instrument(skip(self))]
    async fn list_by_status(
        &self,
        status: PredictionStatus,
    ) -> Result<Vec<PredictionModel>, AppError> {
        let sql = format!(
            "SELECT {} FROM predictions WHERE status = $1 ORDER BY created_at",
            PREDICTION_COLUMNS
        );
        self.fetch_predictions(sqlx::query(&sql).bind(status.to_string()))
            .await
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<PredictionModel>, AppError> {
        let sql = format!("SELECT {} FROM predictions", PREDICTION_COLUMNS);
        self.fetch_predictions(sqlx::query(&sql)).await
    }

    #[instrument(skip(self))]
    async fn count_by_status(&self) -> Result<HashMap<PredictionStatus, u64>, AppError> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM predictions GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        let mut counts = HashMap::new();
        for row in rows {
            let status: String = row.get("status");
            let count: i64 = row.get("count");
            match status.parse::<PredictionStatus>() {
                Ok(status) => {
                    counts.insert(status, count.max(0) as u64);
                }
                Err(_) => warn!(status = %status, "Ignoring unknown prediction status"),
            }
        }
        Ok(counts)
    }

    #[instrument(skip(self, outcomes), fields(outcomes = outcomes.len()))]
    async fn commit_scoring(
        &self,
        outcomes: Vec<ScoredPrediction>,
    ) -> Result<Vec<UserAggregate>, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCORING_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        for outcome in &outcomes {
            let result = sqlx::query(
                "UPDATE predictions SET status = $2, points_earned = $3 WHERE id = $1 AND status = 'pending'",
            )
            .bind(&outcome.prediction_id)
            .bind(outcome.status.to_string())
            .bind(outcome.points_earned)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            if result.rows_affected() == 0 {
                warn!(prediction_id = %outcome.prediction_id, "Prediction no longer pending, rolling back");
                tx.rollback().await.map_err(db_error)?;
                return Err(AppError::Conflict(format!(
                    "Prediction {} is no longer pending",
                    outcome.prediction_id
                )));
            }
        }

        // Read back under the lock; every statement from here sees all
        // earlier committed scoring runs plus this one's outcomes
        let rows = sqlx::query(&format!("SELECT {} FROM predictions", PREDICTION_COLUMNS))
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error)?;
        let mut history: HashMap<String, Vec<PredictionModel>> = HashMap::new();
        for row in &rows {
            let prediction = prediction_from_row(row)?;
            history
                .entry(prediction.user_id.clone())
                .or_default()
                .push(prediction);
        }

        let user_ids: Vec<String> = sqlx::query_scalar("SELECT id FROM users")
            .fetch_all(&mut *tx)
            .await
            .map_err(db_error)?;

        let mut aggregates = Vec::with_capacity(user_ids.len());
        for user_id in &user_ids {
            let owned = history.get(user_id).map(Vec::as_slice).unwrap_or(&[]);
            let aggregate = ScoreAggregator::aggregate(user_id, owned);

            sqlx::query("UPDATE users SET total_score = $2, accuracy_rate = $3 WHERE id = $1")
                .bind(&aggregate.user_id)
                .bind(aggregate.total_score)
                .bind(aggregate.accuracy_rate)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            aggregates.push(aggregate);
        }

        tx.commit().await.map_err(db_error)?;
        debug!(users = aggregates.len(), "Scoring commit applied in database");
        Ok(aggregates)
    }
}
