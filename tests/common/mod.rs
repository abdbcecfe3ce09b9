//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use ton_price_publisher::domain::price::PriceSample;
use ton_price_publisher::domain::schedule::Clock;
use ton_price_publisher::ports::notifier::{NotificationSink, PublishError, RenderMode};
use ton_price_publisher::ports::quote_source::{QuoteSource, SourceUnavailable};

/// What a scripted source does on one call.
#[derive(Debug, Clone)]
pub enum Step {
    Price(Decimal),
    /// Price stamped with an explicit acquisition time.
    PriceAt(Decimal, DateTime<Utc>),
    Fail(SourceUnavailable),
    /// Sleep this long before failing; longer than the timeout means "hang".
    Hang(Duration),
    Panic,
}

/// Quote source that replays a script, then repeats `fallback` forever.
pub struct ScriptedSource {
    name: String,
    priority: u32,
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(name: &str, priority: u32, script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            priority,
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(name: &str, priority: u32, step: Step) -> Arc<Self> {
        Self::new(name, priority, Vec::new(), step)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn fetch(&self, timeout: Duration) -> Result<PriceSample, SourceUnavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            Step::Price(value) => Ok(PriceSample::new(value, self.name.clone())),
            Step::PriceAt(value, at) => Ok(PriceSample::at(value, self.name.clone(), at)),
            Step::Fail(reason) => Err(reason),
            Step::Hang(d) => {
                tokio::time::sleep(d).await;
                Err(SourceUnavailable::Timeout(timeout))
            }
            Step::Panic => panic!("{} exploded", self.name),
        }
    }
}

/// Sink that records every message and optionally fails.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(String, String, RenderMode)>>,
    pub failure: Mutex<Option<PublishError>>,
}

impl RecordingSink {
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text, _)| text.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(
        &self,
        channel: &str,
        text: &str,
        mode: RenderMode,
    ) -> Result<(), PublishError> {
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string(), mode));
        Ok(())
    }
}

/// Clock frozen at one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// 2024-05-17 12:30:<second> UTC.
    pub fn at_second(second: u32) -> Arc<Self> {
        Arc::new(Self(
            Utc.with_ymd_and_hms(2024, 5, 17, 12, 30, second)
                .single()
                .unwrap(),
        ))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
