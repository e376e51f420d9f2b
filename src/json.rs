//! JSON Lines support: one `serde_json` document per record.

use std::path::PathBuf;

use serde::Serialize;

use crate::writer::{LineSink, LineSinkBuilder};

impl LineSinkBuilder {
    /// Terminal: serialize each record with [`serde_json::to_string`],
    /// producing a JSON Lines file at `destination`.
    ///
    /// A record that fails to serialize surfaces as
    /// [`SinkError::Serialize`](crate::SinkError::Serialize).
    pub fn from_serde<T: Serialize>(self, destination: impl Into<PathBuf>) -> LineSink<T> {
        self.from_try_fn(destination, |item: &T| serde_json::to_string(item))
    }
}
