//! Nova Relay - Outbound voice-call relay backend
//!
//! Nova Relay sits between clients and a third-party voice-AI calling
//! provider (Vapi). It accepts call task requests, renders them into a
//! natural-language system prompt for the "Nova" assistant persona,
//! dispatches a call-creation request to the provider, and fans provider
//! webhook notifications out to live WebSocket subscribers.
//!
//! ```text
//! client ──POST /calls──▶ PromptBuilder ──▶ CallDispatcher ──HTTP──▶ provider
//!                                                                      │
//! subscribers ◀──WebSocket /updates── SubscriberRegistry ◀── /webhook ─┘
//! ```
//!
//! ## Modules
//!
//! - [`prompt`]: task request model and system-prompt rendering
//! - [`dispatch`]: outbound call creation against the provider API
//! - [`updates`]: live-subscriber registry and WebSocket endpoint
//! - [`webhook`]: tolerant ingestion of provider callbacks
//! - [`api`]: HTTP router tying the pipeline together
//! - [`config`]: environment-sourced configuration

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod prompt;
pub mod updates;
pub mod webhook;

pub use api::{build_app, AppState};
pub use config::{ProviderConfig, RelayConfig};
pub use dispatch::{CallDispatchResult, CallDispatcher};
pub use error::{Error, Result};
pub use prompt::TaskRequest;
pub use updates::SubscriberRegistry;
pub use webhook::CallUpdate;
