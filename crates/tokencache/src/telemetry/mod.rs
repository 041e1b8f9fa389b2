// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured logs and optional OpenTelemetry metrics for token-cache operations.
//!
//! Events are always available as `tracing` logs. With the `metrics` feature, the same
//! events also feed an event counter, an operation duration histogram and a size gauge.

use std::sync::Arc;
use std::time::Duration;

#[cfg(any(feature = "metrics", test))]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Gauge, Histogram, MeterProvider},
};
use tracing::Level;

pub(crate) mod attributes;
pub(crate) mod ext;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

/// Names the process-local tier in telemetry.
pub(crate) const LOCAL_TIER: &str = "tokencache.l1";
/// Names the shared tier in telemetry.
pub(crate) const SHARED_TIER: &str = "tokencache.l2";
/// Names the provider facade in telemetry.
pub(crate) const PROVIDER: &str = "tokencache";

/// Telemetry sink for token-cache operations.
///
/// The default sink emits logs and records no metrics. Pass it to the provider
/// builder via `.telemetry()`.
///
/// # Examples
///
/// ```
/// use tokencache::CacheTelemetry;
///
/// let quiet = CacheTelemetry::disabled();
/// let verbose = CacheTelemetry::default();
/// # let _ = (quiet, verbose);
/// ```
#[derive(Clone, Debug)]
pub struct CacheTelemetry {
    inner: Arc<CacheTelemetryInner>,
}

#[derive(Debug, Default)]
struct CacheTelemetryInner {
    logging_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    instruments: Option<Instruments>,
}

#[cfg(any(feature = "metrics", test))]
#[derive(Debug)]
struct Instruments {
    event_counter: Counter<u64>,
    operation_duration: Histogram<f64>,
    cache_size: Gauge<u64>,
}

impl Default for CacheTelemetry {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CacheTelemetry {
    /// Creates a telemetry sink that logs cache events when `logging_enabled` is set.
    #[must_use]
    pub fn new(logging_enabled: bool) -> Self {
        Self {
            inner: Arc::new(CacheTelemetryInner {
                logging_enabled,
                ..CacheTelemetryInner::default()
            }),
        }
    }

    /// Creates a sink that records nothing.
    ///
    /// Shared-tier failures are still logged as warnings; they are not cache events.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Returns a copy of this sink that also records metrics through `meter_provider`.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn with_meter_provider(&self, meter_provider: &dyn MeterProvider) -> Self {
        let meter = metrics::create_meter(meter_provider);
        Self {
            inner: Arc::new(CacheTelemetryInner {
                logging_enabled: self.inner.logging_enabled,
                instruments: Some(Instruments {
                    event_counter: metrics::create_event_counter(&meter),
                    operation_duration: metrics::create_operation_duration_histogram(&meter),
                    cache_size: metrics::create_cache_size_gauge(&meter),
                }),
            }),
        }
    }

    /// Records one cache event.
    pub(crate) fn record(&self, cache_name: &'static str, operation: CacheOperation, activity: CacheActivity, duration: Option<Duration>) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(instruments) = &self.inner.instruments {
            let attrs = [
                KeyValue::new(attributes::CACHE_NAME, cache_name),
                KeyValue::new(attributes::CACHE_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::CACHE_ACTIVITY_NAME, activity.as_str()),
            ];
            instruments.event_counter.add(1, &attrs);
            if let Some(d) = duration {
                instruments.operation_duration.record(d.as_secs_f64(), &attrs);
            }
        }

        if self.inner.logging_enabled {
            Self::emit(cache_name, operation, activity, duration);
        }
    }

    /// Records the number of entries held by a tier.
    #[cfg_attr(not(any(feature = "metrics", test)), expect(unused_variables, reason = "no-op without metrics"))]
    pub(crate) fn record_size(&self, cache_name: &'static str, size: u64) {
        #[cfg(any(feature = "metrics", test))]
        if let Some(instruments) = &self.inner.instruments {
            instruments
                .cache_size
                .record(size, &[KeyValue::new(attributes::CACHE_NAME, cache_name)]);
        }
    }

    fn emit(cache_name: &'static str, operation: CacheOperation, activity: CacheActivity, duration: Option<Duration>) {
        let op = operation.as_str();
        let ev = activity.as_str();
        let duration_ns = duration.map(|d| d.as_nanos());

        // Tracing levels must be constant. Field names match attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cache.name = cache_name,
                    cache.operation = op,
                    cache.activity = ev,
                    cache.duration_ns = ?duration_ns,
                    "cache.event"
                )
            };
        }

        let level = activity.level();
        if level == Level::ERROR {
            emit_event!(error);
        } else if level == Level::WARN {
            emit_event!(warn);
        } else if level == Level::INFO {
            emit_event!(info);
        } else {
            emit_event!(debug);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Get,
    Set,
    Delete,
}

impl CacheOperation {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Set => "cache.set",
            Self::Delete => "cache.delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    Miss,
    Written,
    Removed,
    /// A shared-tier hit was copied into the local tier.
    Promoted,
    Retried,
    /// A shared-tier failure was absorbed and the operation continued without it.
    Degraded,
    Error,
}

impl CacheActivity {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Written => "cache.written",
            Self::Removed => "cache.removed",
            Self::Promoted => "cache.promoted",
            Self::Retried => "cache.retried",
            Self::Degraded => "cache.degraded",
            Self::Error => "cache.error",
        }
    }

    pub(crate) fn level(self) -> Level {
        match self {
            Self::Hit | Self::Miss => Level::DEBUG,
            Self::Written | Self::Removed | Self::Promoted => Level::INFO,
            Self::Retried | Self::Degraded => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::testing::{LogCapture, MetricTester};

    #[test]
    fn operation_names() {
        assert_eq!(CacheOperation::Get.as_str(), "cache.get");
        assert_eq!(CacheOperation::Set.as_str(), "cache.set");
        assert_eq!(CacheOperation::Delete.as_str(), "cache.delete");
    }

    #[test]
    fn activity_levels() {
        assert_eq!(CacheActivity::Hit.level(), Level::DEBUG);
        assert_eq!(CacheActivity::Miss.level(), Level::DEBUG);
        assert_eq!(CacheActivity::Written.level(), Level::INFO);
        assert_eq!(CacheActivity::Promoted.level(), Level::INFO);
        assert_eq!(CacheActivity::Retried.level(), Level::WARN);
        assert_eq!(CacheActivity::Degraded.level(), Level::WARN);
        assert_eq!(CacheActivity::Error.level(), Level::ERROR);
    }

    #[test]
    fn logs_contain_all_fields() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        CacheTelemetry::emit(
            SHARED_TIER,
            CacheOperation::Delete,
            CacheActivity::Degraded,
            Some(Duration::from_nanos(12345)),
        );

        capture.assert_contains(attributes::CACHE_NAME);
        capture.assert_contains(attributes::CACHE_OPERATION_NAME);
        capture.assert_contains(attributes::CACHE_ACTIVITY_NAME);
        capture.assert_contains(attributes::CACHE_DURATION_NAME);
        capture.assert_contains(attributes::CACHE_EVENT_NAME);
        capture.assert_contains(SHARED_TIER);
        capture.assert_contains("cache.degraded");
        capture.assert_contains("WARN");
    }

    #[test]
    fn disabled_telemetry_emits_nothing() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());

        CacheTelemetry::disabled().record(LOCAL_TIER, CacheOperation::Get, CacheActivity::Hit, None);

        assert!(capture.output().is_empty());
    }

    #[test]
    fn metrics_carry_cache_attributes() {
        let tester = MetricTester::new();
        let telemetry = CacheTelemetry::disabled().with_meter_provider(tester.meter_provider());

        telemetry.record(LOCAL_TIER, CacheOperation::Get, CacheActivity::Hit, Some(Duration::from_millis(2)));
        telemetry.record_size(LOCAL_TIER, 3);

        tester.assert_attributes_contain(&[
            KeyValue::new(attributes::CACHE_NAME, LOCAL_TIER),
            KeyValue::new(attributes::CACHE_OPERATION_NAME, "cache.get"),
            KeyValue::new(attributes::CACHE_ACTIVITY_NAME, "cache.hit"),
        ]);
    }
}
