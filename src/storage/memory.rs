use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::prediction::{
    PredictionModel, PredictionRepository, PredictionStatus, ScoredPrediction,
};
use crate::scoring::{ScoreAggregator, UserAggregate};
use crate::shared::AppError;
use crate::user::{LeaderboardEntry, UserModel, UserRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<String, UserModel>,
    predictions: HashMap<String, PredictionModel>,
}

/// In-memory implementation of both repositories for development and testing
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }
}

fn newest_first(predictions: &mut [PredictionModel]) {
    predictions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError> {
        debug!(user_id = %user.id, username = %user.username, "Creating user in memory");

        let mut tables = self.tables.lock().unwrap();
        let taken = tables
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken {
            warn!(username = %user.username, "Username or email already registered");
            return Err(AppError::Conflict(
                "Username or email already registered".to_string(),
            ));
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.get(user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError> {
        let tables = self.tables.lock().unwrap();

        let mut users: Vec<&UserModel> = tables.users.values().collect();
        users.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let entries = users
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, user)| LeaderboardEntry {
                rank: index as u32 + 1,
                username: user.username.clone(),
                total_points: user.total_score,
                accuracy: user.accuracy_rate,
                predictions_count: tables
                    .predictions
                    .values()
                    .filter(|p| p.user_id == user.id)
                    .count() as u64,
            })
            .collect();

        Ok(entries)
    }
}

#[async_trait]
impl PredictionRepository for InMemoryRepository {
    #[instrument(skip(self, prediction))]
    async fn create_prediction(&self, prediction: &PredictionModel) -> Result<(), AppError> {
        debug!(prediction_id = %prediction.id, user_id = %prediction.user_id, "Storing prediction in memory");

        let mut tables = self.tables.lock().unwrap();
        if tables.predictions.contains_key(&prediction.id) {
            return Err(AppError::Conflict("Prediction already exists".to_string()));
        }
        tables
            .predictions
            .insert(prediction.id.clone(), prediction.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PredictionModel>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut predictions: Vec<PredictionModel> = tables
            .predictions
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut predictions);
        predictions.truncate(limit);
        Ok(predictions)
    }

    #[instrument(skip(self))]
    async fn list_for_race(&self, race_id: i64) -> Result<Vec<PredictionModel>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut predictions: Vec<PredictionModel> = tables
            .predictions
            .values()
            .filter(|p| p.race_id == Some(race_id))
            .cloned()
            .collect();
        newest_first(&mut predictions);
        Ok(predictions)
    }

    #[instrument(skip(self))]
    async fn list_by_status(
        &self,
        status: PredictionStatus,
    ) -> Result<Vec<PredictionModel>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut predictions: Vec<PredictionModel> = tables
            .predictions
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect();
        predictions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(predictions)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<PredictionModel>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.predictions.values().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn count_by_status(&self) -> Result<HashMap<PredictionStatus, u64>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut counts = HashMap::new();
        for prediction in tables.predictions.values() {
            *counts.entry(prediction.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    #[instrument(skip(self, outcomes), fields(outcomes = outcomes.len()))]
    async fn commit_scoring(
        &self,
        outcomes: Vec<ScoredPrediction>,
    ) -> Result<Vec<UserAggregate>, AppError> {
        let mut tables = self.tables.lock().unwrap();

        // Validate everything before the first write
        for outcome in &outcomes {
            match tables.predictions.get(&outcome.prediction_id) {
                Some(p) if p.is_pending() => {}
                Some(_) => {
                    warn!(prediction_id = %outcome.prediction_id, "Prediction already scored");
                    return Err(AppError::Conflict(format!(
                        "Prediction {} is no longer pending",
                        outcome.prediction_id
                    )));
                }
                None => {
                    return Err(AppError::NotFound(format!(
                        "Prediction {} not found",
                        outcome.prediction_id
                    )));
                }
            }
        }

        for outcome in outcomes {
            if let Some(prediction) = tables.predictions.get_mut(&outcome.prediction_id) {
                prediction.status = outcome.status;
                prediction.points_earned = outcome.points_earned;
            }
        }

        // Totals come from the table as it now stands, under the same lock
        let Tables { users, predictions } = &mut *tables;
        let mut history: HashMap<&str, Vec<&PredictionModel>> = HashMap::new();
        for prediction in predictions.values() {
            history
                .entry(prediction.user_id.as_str())
                .or_default()
                .push(prediction);
        }

        let mut aggregates = Vec::with_capacity(users.len());
        for user in users.values_mut() {
            let owned = history.get(user.id.as_str()).cloned().unwrap_or_default();
            let aggregate = ScoreAggregator::aggregate(&user.id, owned);
            user.total_score = aggregate.total_score;
            user.accuracy_rate = aggregate.accuracy_rate;
            aggregates.push(aggregate);
        }

        debug!(users = aggregates.len(), "Scoring commit applied in memory");
        Ok(aggregates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::PredictionAction;
    use crate::telemetry::DriverCode;

    fn user(name: &str) -> UserModel {
        UserModel::new(name.to_string(), format!("{}@pitlane.dev", name))
    }

    fn prediction(user_id: &str) -> PredictionModel {
        PredictionModel::new(
            user_id.to_string(),
            Some(1),
            DriverCode::new("SAI"),
            PredictionAction::PitSoft,
            0,
            40,
        )
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let repo = InMemoryRepository::new();
        repo.create_user(&user("boxbox")).await.unwrap();

        let result = repo.create_user(&user("boxbox")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    fn outcome(id: &str, status: PredictionStatus, points_earned: i64) -> ScoredPrediction {
        ScoredPrediction {
            prediction_id: id.to_string(),
            status,
            points_earned,
        }
    }

    #[tokio::test]
    async fn commit_updates_predictions_and_users_together() {
        let repo = InMemoryRepository::new();
        let u = user("alpha");
        let idle = user("idle");
        repo.create_user(&u).await.unwrap();
        repo.create_user(&idle).await.unwrap();
        let p = prediction(&u.id);
        repo.create_prediction(&p).await.unwrap();

        let aggregates = repo
            .commit_scoring(vec![outcome(&p.id, PredictionStatus::Correct, 60)])
            .await
            .unwrap();

        assert_eq!(aggregates.len(), 2);
        let stored = repo.get_user(&u.id).await.unwrap().unwrap();
        assert_eq!(stored.total_score, 60);
        assert_eq!(stored.accuracy_rate, 100.0);
        let counts = repo.count_by_status().await.unwrap();
        assert_eq!(counts.get(&PredictionStatus::Correct), Some(&1));
        assert_eq!(counts.get(&PredictionStatus::Pending), None);
    }

    #[tokio::test]
    async fn separate_commits_accumulate_into_totals() {
        let repo = InMemoryRepository::new();
        let u = user("gamma");
        repo.create_user(&u).await.unwrap();
        let first = prediction(&u.id);
        let second = prediction(&u.id);
        let third = prediction(&u.id);
        for p in [&first, &second, &third] {
            repo.create_prediction(p).await.unwrap();
        }

        repo.commit_scoring(vec![outcome(&first.id, PredictionStatus::Correct, 150)])
            .await
            .unwrap();
        repo.commit_scoring(vec![
            outcome(&second.id, PredictionStatus::Correct, 150),
            outcome(&third.id, PredictionStatus::Wrong, 0),
        ])
        .await
        .unwrap();

        let stored = repo.get_user(&u.id).await.unwrap().unwrap();
        assert_eq!(stored.total_score, 300);
        assert_eq!(stored.accuracy_rate, 66.7);
    }

    #[tokio::test]
    async fn commit_on_scored_prediction_writes_nothing() {
        let repo = InMemoryRepository::new();
        let u = user("beta");
        repo.create_user(&u).await.unwrap();
        let fresh = prediction(&u.id);
        let mut done = prediction(&u.id);
        done.status = PredictionStatus::Wrong;
        repo.create_prediction(&fresh).await.unwrap();
        repo.create_prediction(&done).await.unwrap();

        let result = repo
            .commit_scoring(vec![
                outcome(&fresh.id, PredictionStatus::Correct, 60),
                outcome(&done.id, PredictionStatus::Correct, 60),
            ])
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        let pending = repo.list_by_status(PredictionStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, fresh.id);
    }

    #[tokio::test]
    async fn leaderboard_ranks_by_score() {
        let repo = InMemoryRepository::new();
        let low = user("low");
        let mut high = user("high");
        high.total_score = 300;
        repo.create_user(&low).await.unwrap();
        repo.create_user(&high).await.unwrap();
        repo.create_prediction(&prediction(&high.id)).await.unwrap();

        let board = repo.leaderboard(10).await.unwrap();

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].username, "high");
        assert_eq!(board[0].predictions_count, 1);
        assert_eq!(board[1].rank, 2);
        assert_eq!(repo.leaderboard(1).await.unwrap().len(), 1);
    }
}
