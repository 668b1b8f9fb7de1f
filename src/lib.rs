//! TailorFlow - resume tailoring terminal client
//!
//! This library provides the core functionality for TailorFlow, a terminal UI
//! for tailoring a resume to a job description. The heavy lifting (parsing,
//! scoring, rewriting, DOCX rendering) happens on a remote backend; this
//! client owns the session state, the resilient HTTP plumbing, and the local
//! history/settings persistence.
//!
//! ## Architecture
//!
//! View layer (`app` + `ui`) → typed facade (`api`) → retrying sender (`net`)
//! → remote backend, with `history`/`settings` persisting snapshots to disk.

// Wire data model and event-loop messages
pub mod models;

// Resilient request sending (request ids, timeout, retry/backoff)
pub mod net;

// Typed per-endpoint facade with shared error decoding
pub mod api;

// Local persistence (JSON files under the data dir)
pub mod history;
pub mod settings;

// Pre-network input checks
pub mod validation;

// Startup configuration (CLI args > env vars > defaults)
pub mod config;

// Application state tree and rendering
pub mod app;
pub mod theme;
pub mod ui;

// Deep link router
pub mod router;

// DOCX download analog
pub mod export;

// Re-export commonly used types
pub use api::{ApiClient, ApiError};
pub use app::{App, InputMode, Tab};
pub use config::Config;
pub use models::{AnalysisResult, AppEvent, Jd, Resume};
