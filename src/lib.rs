//! # Linesink
//!
//! A **transactional, streaming line sink**: records arrive in batches from a
//! batch-processing pipeline, each is serialized to one line of text, and the
//! complete file appears at its destination atomically when the enclosing
//! transaction commits — never a partial or corrupt file.
//!
//! Output is streamed through a fixed-size buffer into a *work file*, so the
//! payload is never held in memory; that makes the sink suited for large
//! outputs where buffering the whole content first is infeasible.
//!
//! ## Key Features
//!
//! - **All-or-nothing publish** - the destination holds either its prior
//!   content or the complete new file, published by atomic rename
//! - **Lazy open** - a run that writes no records creates no file at all
//! - **Streaming** - buffered incremental writes, constant memory
//! - **Header/footer injection** - optional preamble/postamble callbacks,
//!   each run exactly once
//! - **Pluggable serialization** - closure, `Display`, or Serde/JSON Lines
//!   (feature `json`)
//! - **Transaction integration** - one-shot pre-commit registration against
//!   any host transaction manager via [`TransactionNotifier`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use linesink::LineSinkBuilder;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut sink = LineSinkBuilder::new()
//!     .header(|out| out.write_str("# one item per line"))
//!     .from_display("out/items.txt");
//!
//! for batch in [&[1u32, 2, 3][..], &[4, 5][..]] {
//!     sink.write(batch)?;
//! }
//! sink.close()?; // flush, then publish out/items.txt atomically
//! # Ok(())
//! # }
//! ```
//!
//! ## Transactions
//!
//! The sink registers a one-shot callback with a [`TransactionNotifier`] on
//! its first write; the host invokes it at the transaction's pre-commit
//! phase, which commits and publishes the file. [`Transaction`] is a minimal
//! in-process notifier for standalone jobs:
//!
//! ```no_run
//! use std::sync::Arc;
//! use linesink::{LineSinkBuilder, Transaction};
//!
//! # fn main() -> anyhow::Result<()> {
//! let txn = Arc::new(Transaction::new());
//! let mut sink = LineSinkBuilder::new()
//!     .transaction(txn.clone())
//!     .from_display("out/items.txt");
//!
//! sink.write(&[1u32, 2, 3])?;
//! txn.commit()?; // runs the sink's pre-commit callback
//! # Ok(())
//! # }
//! ```
//!
//! Without a notifier, call [`LineSink::close`] explicitly.
//!
//! ## JSON Lines (feature: `json`)
//!
//! ```ignore
//! use linesink::LineSinkBuilder;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Record { id: u32, name: String }
//!
//! let mut sink = LineSinkBuilder::new().from_serde::<Record>("out/records.jsonl");
//! sink.write(&records)?;
//! sink.close()?;
//! ```
//!
//! ## Failure Semantics
//!
//! Every error propagates to the caller; nothing is retried beyond the single
//! rename-to-copy substitution when the work and destination paths span
//! filesystems (see [`publish::move_file`]). A failed write or commit leaves
//! the destination untouched and the work file in place for inspection; the
//! sink must then be discarded and the run restarted — resuming is not
//! supported. A sink is for one caller: concurrent `write`s on one instance,
//! or two sinks sharing a destination, are unsupported.
//!
//! ## Module Overview
//!
//! - [`writer`] - the sink engine: lifecycle, lazy open, commit protocol
//! - [`stream`] - buffered, encoding-aware output over the work file
//! - [`publish`] - atomic rename with cross-device fallback
//! - [`txn`] - pre-commit notification boundary
//! - [`error`] - error types

pub mod error;
pub mod publish;
pub mod stream;
pub mod txn;
pub mod writer;

#[cfg_attr(docsrs, doc(cfg(feature = "json")))]
#[cfg(feature = "json")]
pub mod json;

// General re-exports
pub use error::{SinkError, SinkResult};
pub use publish::MoveKind;
pub use stream::{Encoding, TextStream};
pub use txn::{PreCommit, Transaction, TransactionNotifier};
pub use writer::{
    DEFAULT_BUFFER_SIZE, DEFAULT_LINE_SEPARATOR, LineSink, LineSinkBuilder, SinkState,
    default_work_path,
};
