use std::sync::Arc;
use std::time::Duration;

use pitlane::{
    prediction::{PredictionAction, PredictionModel, PredictionRepository},
    telemetry::{DriverCode, RaceDataProducer},
    user::{UserModel, UserRepository},
    AppState, ArtifactCache, CacheKey, InMemoryArtifactStore, InMemoryRepository, RaceDataService,
    RaceTelemetry,
};

use super::producers::CountingProducer;

pub const ADMIN_KEY: &str = "integration-admin-key";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub repository: Arc<InMemoryRepository>,
    pub cache: Arc<ArtifactCache>,
    pub state: AppState,
}

impl TestSetup {
    /// Publishes telemetry straight into the cache, as a warm run would
    pub async fn cache_race(&self, race: RaceTelemetry) {
        let key = CacheKey::telemetry(race.year, race.round);
        self.cache
            .refresh(&key, || async { Ok(race) })
            .await
            .unwrap();
    }

    pub async fn register(&self, username: &str) -> UserModel {
        let user = UserModel::new(username.to_string(), format!("{}@pitlane.dev", username));
        self.repository.create_user(&user).await.unwrap();
        user
    }

    pub async fn predict(
        &self,
        user: &UserModel,
        driver: &str,
        action: &str,
        lap: i32,
        confidence: i32,
    ) -> PredictionModel {
        let prediction = PredictionModel::new(
            user.id.clone(),
            None,
            DriverCode::new(driver),
            PredictionAction::from(action.to_string()),
            lap,
            confidence,
        );
        self.repository.create_prediction(&prediction).await.unwrap();
        prediction
    }

    pub async fn user(&self, user: &UserModel) -> UserModel {
        self.repository.get_user(&user.id).await.unwrap().unwrap()
    }
}

pub struct TestSetupBuilder {
    producer: Option<Arc<dyn RaceDataProducer>>,
    producer_timeout: Duration,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            producer: None,
            producer_timeout: Duration::from_secs(5),
        }
    }

    #[allow(dead_code)]
    pub fn with_producer(mut self, producer: Arc<dyn RaceDataProducer>) -> Self {
        self.producer = Some(producer);
        self
    }

    pub fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryRepository::new());
        let cache = Arc::new(ArtifactCache::new(Arc::new(InMemoryArtifactStore::new())));
        let producer = self
            .producer
            .unwrap_or_else(|| Arc::new(CountingProducer::new()));
        let race_data = Arc::new(RaceDataService::new(
            cache.clone(),
            producer,
            self.producer_timeout,
        ));
        let state = AppState::new(repository.clone(), repository.clone(), race_data, ADMIN_KEY);

        TestSetup {
            repository,
            cache,
            state,
        }
    }
}
