use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::{ConditionsSource, LocationResolver};
use crate::error::Result;
use crate::storage::{parse_timestamp, Journal, Reading, ReadingStore};

/// One fetch-and-store sequence for a fixed location.
///
/// Stage 2 runs only when stage 1 succeeded, and nothing is written unless
/// both stages and the timestamp parse succeed.
pub struct RefreshPipeline {
    location: String,
    resolver: Arc<dyn LocationResolver>,
    source: Arc<dyn ConditionsSource>,
    store: Arc<ReadingStore>,
    journal: Option<Arc<Journal>>,
}

impl RefreshPipeline {
    pub fn new(
        location: impl Into<String>,
        resolver: Arc<dyn LocationResolver>,
        source: Arc<dyn ConditionsSource>,
        store: Arc<ReadingStore>,
    ) -> Self {
        Self {
            location: location.into(),
            resolver,
            source,
            store,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Arc<Journal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub async fn run_cycle(&self) -> Result<Reading> {
        let coords = self.resolver.resolve_location(&self.location).await?;
        let current = self.source.fetch_current(coords).await?;
        let timestamp = parse_timestamp(&current.time)?;

        let reading = Reading::new(self.location.clone(), timestamp, current.temperature);

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append(&reading).await {
                warn!("journal append failed for {}: {}", self.location, e);
            }
        }
        self.store.append(&self.location, reading.clone()).await;

        info!(
            "Updated {}: {:.1}° at {}",
            self.location,
            reading.temperature(),
            current.time
        );
        Ok(reading)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::adapter::{ConditionsSource, Coordinates, CurrentConditions, LocationResolver};
    use crate::error::{Error, Result};

    /// Resolver that answers from a fixed table and counts calls.
    pub struct FixedResolver {
        pub coords: Option<Coordinates>,
        pub calls: Mutex<usize>,
    }

    impl FixedResolver {
        pub fn at(latitude: f64, longitude: f64) -> Self {
            Self {
                coords: Some(Coordinates { latitude, longitude }),
                calls: Mutex::new(0),
            }
        }

        pub fn failing() -> Self {
            Self { coords: None, calls: Mutex::new(0) }
        }
    }

    #[async_trait]
    impl LocationResolver for FixedResolver {
        async fn resolve_location(&self, name: &str) -> Result<Coordinates> {
            *self.calls.lock().unwrap() += 1;
            self.coords.ok_or_else(|| Error::Resolution {
                location: name.to_string(),
                message: "status code: 500".to_string(),
            })
        }
    }

    /// Source that replays scripted responses; `None` entries fail.
    pub struct ScriptedSource {
        pub script: Mutex<VecDeque<Option<(&'static str, f64)>>>,
        pub seen: Mutex<Vec<Coordinates>>,
    }

    impl ScriptedSource {
        pub fn new(script: impl IntoIterator<Item = Option<(&'static str, f64)>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ConditionsSource for ScriptedSource {
        async fn fetch_current(&self, coords: Coordinates) -> Result<CurrentConditions> {
            self.seen.lock().unwrap().push(coords);
            match self.script.lock().unwrap().pop_front().flatten() {
                Some((time, temperature)) => Ok(CurrentConditions {
                    time: time.to_string(),
                    temperature,
                }),
                None => Err(Error::Fetch("status code: 502".to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FixedResolver, ScriptedSource};
    use super::*;
    use crate::adapter::Coordinates;
    use crate::error::Error;

    fn pipeline(
        resolver: Arc<FixedResolver>,
        source: Arc<ScriptedSource>,
        store: Arc<ReadingStore>,
    ) -> RefreshPipeline {
        RefreshPipeline::new("Testville", resolver, source, store)
    }

    #[tokio::test]
    async fn successful_cycle_appends_reading() {
        let store = Arc::new(ReadingStore::new());
        let source = Arc::new(ScriptedSource::new([Some(("2024-01-01T00:00", 5.5))]));
        let p = pipeline(Arc::new(FixedResolver::at(10.0, 20.0)), source.clone(), store.clone());

        let reading = p.run_cycle().await.unwrap();
        assert_eq!(reading.temperature(), 5.5);
        assert_eq!(
            source.seen.lock().unwrap().as_slice(),
            &[Coordinates { latitude: 10.0, longitude: 20.0 }]
        );

        let history = store.get("Testville").await.unwrap();
        assert_eq!(history, vec![reading]);
        assert_eq!(history[0].timestamp(), parse_timestamp("2024-01-01T00:00").unwrap());
    }

    #[tokio::test]
    async fn history_grows_in_cycle_order() {
        let store = Arc::new(ReadingStore::new());
        let source = Arc::new(ScriptedSource::new([
            Some(("2024-01-01T00:00", 5.5)),
            Some(("2024-01-01T00:15", 6.0)),
        ]));
        let p = pipeline(Arc::new(FixedResolver::at(10.0, 20.0)), source, store.clone());

        p.run_cycle().await.unwrap();
        p.run_cycle().await.unwrap();

        let temps: Vec<f64> = store
            .get("Testville")
            .await
            .unwrap()
            .iter()
            .map(Reading::temperature)
            .collect();
        assert_eq!(temps, vec![5.5, 6.0]);
    }

    #[tokio::test]
    async fn resolve_failure_skips_fetch_and_write() {
        let store = Arc::new(ReadingStore::new());
        let source = Arc::new(ScriptedSource::new([
            Some(("2024-01-01T00:00", 5.5)),
            Some(("2024-01-01T00:15", 6.0)),
        ]));
        let good = pipeline(Arc::new(FixedResolver::at(10.0, 20.0)), source.clone(), store.clone());
        good.run_cycle().await.unwrap();

        let bad = pipeline(Arc::new(FixedResolver::failing()), source.clone(), store.clone());
        let err = bad.run_cycle().await.unwrap_err();

        assert!(matches!(err, Error::Resolution { .. }));
        assert_eq!(source.calls(), 1);
        assert_eq!(store.len("Testville").await, 1);
    }

    #[tokio::test]
    async fn fetch_failure_writes_nothing() {
        let store = Arc::new(ReadingStore::new());
        let resolver = Arc::new(FixedResolver::at(10.0, 20.0));
        let source = Arc::new(ScriptedSource::new([None]));
        let p = pipeline(resolver.clone(), source, store.clone());

        let err = p.run_cycle().await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        assert_eq!(*resolver.calls.lock().unwrap(), 1);
        assert!(store.get("Testville").await.is_none());
    }

    #[tokio::test]
    async fn bad_timestamp_writes_nothing() {
        let store = Arc::new(ReadingStore::new());
        let source = Arc::new(ScriptedSource::new([Some(("01/01/2024 00:00", 5.5))]));
        let p = pipeline(Arc::new(FixedResolver::at(10.0, 20.0)), source, store.clone());

        let err = p.run_cycle().await.unwrap_err();
        assert!(matches!(err, Error::Parse { ref text, .. } if text == "01/01/2024 00:00"));
        assert!(store.get("Testville").await.is_none());
    }

    #[tokio::test]
    async fn successful_cycle_is_journaled() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Arc::new(Journal::open(dir.path().join("readings.log")).await.unwrap());
        let store = Arc::new(ReadingStore::new());
        let source = Arc::new(ScriptedSource::new([Some(("2024-01-01T00:00", 5.5)), None]));
        let p = pipeline(Arc::new(FixedResolver::at(10.0, 20.0)), source, store)
            .with_journal(journal.clone());

        let reading = p.run_cycle().await.unwrap();
        assert!(p.run_cycle().await.is_err());

        assert_eq!(journal.replay().await.unwrap(), vec![reading]);
    }
}
