//! Shared helpers for the transport integration tests.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use tuio_server::{
    domain::{Observation, Point, TuioTime},
    infrastructure::{
        encoder::{Dimension, SourceDescriptor, Tuio2Encoder},
        sender::{StreamProtocol, StreamSender},
    },
    usecase::{SessionManager, SessionOptions},
};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn create_manager() -> SessionManager {
    let encoder = Tuio2Encoder::new(
        SourceDescriptor::new("integration"),
        Dimension::default(),
        tuio_shared::time::now_utc(),
    );
    SessionManager::new(Arc::new(encoder), SessionOptions::default())
}

pub fn token_at(secs: f64, symbol_id: u32, x: f32, y: f32) -> Observation {
    Observation::token(TuioTime::from_secs_f64(secs), symbol_id, Point::new(x, y), 0.0)
}

/// Poll until the sender has `expected` open clients
pub async fn wait_for_clients<P: StreamProtocol>(sender: &StreamSender<P>, expected: usize) {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if sender.client_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {expected} client(s), got {}",
        sender.client_count().await
    );
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
