//! Chat funnel — the guided lead-qualification conversation.
//!
//! A prospect answers a fixed set of questions; each answer lands in a
//! `UserProfile`, which drives the package recommendation and finally the
//! checkout hand-off. Each conversation is an explicit `ChatSession`,
//! persisted as a JSON slot between requests.

pub mod events;
pub mod manager;
pub mod model;
pub mod prompts;
pub mod recommendation;
pub mod routes;
pub mod session;
pub mod state;
pub mod transcript;
pub mod typing;

pub use events::{FunnelEvent, SessionView};
pub use manager::{FunnelConfig, FunnelManager, RecommendationView, spawn_eviction_task};
pub use model::{ContactInfo, Message, MessageType, ProfileUpdate, UserProfile};
pub use recommendation::{Recommendation, get_recommendation};
pub use routes::{FunnelRouteState, funnel_routes};
pub use session::{ChatSession, PersistedSession};
pub use state::{ConversationStep, StepController};
pub use transcript::MessageLog;
