// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Logging setup
//!
//! Components log through `tracing`. An optional [`LogSink`] observes every
//! event as `(level, message, timestamp)` through [`SinkLayer`].

use chrono::{DateTime, Local};
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt as fmt_layer, EnvFilter};

/// Receives formatted log events
pub trait LogSink: Send + Sync {
    fn record(&self, level: Level, message: &str, timestamp: DateTime<Local>);
}

/// Subscriber layer forwarding events to a [`LogSink`]
pub struct SinkLayer {
    sink: Arc<dyn LogSink>,
}

impl SinkLayer {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.sink
            .record(*event.metadata().level(), &visitor.finish(), Local::now());
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

/// Install the global subscriber
///
/// Filter comes from `RUST_LOG` (default `info`). Human-readable output goes
/// to stderr so stdout stays free for converted documents.
pub fn init_logging(sink: Option<Arc<dyn LogSink>>) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer::layer().with_writer(std::io::stderr))
        .with(sink.map(SinkLayer::new))
        .try_init()
}
