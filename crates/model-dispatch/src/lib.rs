//! Ordered-fallback dispatcher for hosted chat-completion models.
//!
//! Wraps a single hosted chat-completion endpoint behind a short,
//! deterministic retry chain: a task category selects a fixed ordered list
//! of model candidates, each candidate gets at most one attempt with its
//! own output-token cap and context budget applied, and recognized
//! failures advance to the next candidate until one answers or the list is
//! exhausted.
//!
//! ## Modules
//!
//! | Module         | Provides                                            |
//! |----------------|-----------------------------------------------------|
//! | `catalog`      | `ModelCandidate`, `TaskCategory`, `CandidateCatalog` |
//! | `conversation` | turns, token estimation, budget truncation          |
//! | `config`       | `DispatchConfig` (credential, endpoint, headers)    |
//! | `error`        | failure taxonomy and classification                 |
//! | `wire`         | request/response types for the chat endpoint        |
//! | `transport`    | `CompletionTransport` seam + reqwest implementation |
//! | `observer`     | `DispatchEvent` + injectable `AttemptObserver`      |
//! | `dispatcher`   | the fallback loop itself                            |
//! | `preflight`    | per-candidate connectivity probe                    |

pub mod catalog;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod observer;
pub mod preflight;
pub mod transport;
pub mod wire;

pub use catalog::{CandidateCatalog, ModelCandidate, TaskCategory};
pub use config::DispatchConfig;
pub use conversation::{ConversationTurn, Role};
pub use dispatcher::{CallOutcome, Dispatcher};
pub use error::{AttemptFailure, DispatchError, FailureKind, TransportError};
pub use observer::{AttemptObserver, DispatchEvent, NullObserver, TracingObserver};
pub use preflight::{probe_catalog, PreflightReport, ProbeResult};
pub use transport::{CompletionTransport, HttpTransport};
pub use wire::{ChatCompletion, CompletionRequest};
