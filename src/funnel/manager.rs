//! FunnelManager — owns live conversations, drives the typing delay,
//! persists session slots, and performs the checkout hand-off.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::checkout::{CheckoutBridge, CheckoutRequest, CheckoutSession, OrderDescriptor, Quote, quote};
use crate::error::{CheckoutError, FunnelError};
use crate::notify::LeadNotifier;
use crate::store::SessionStore;

use super::events::{FunnelEvent, SessionView};
use super::model::{Message, ProfileUpdate};
use super::prompts::step_prompt;
use super::recommendation::Recommendation;
use super::session::ChatSession;
use super::state::{ConversationStep, validate_contact};
use super::typing::TypingTimer;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// How often the eviction task sweeps idle conversations.
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Runtime settings for the funnel.
#[derive(Debug, Clone)]
pub struct FunnelConfig {
    pub typing_delay: Duration,
    pub currency: String,
    /// Live conversations untouched for this long are dropped from memory.
    /// Their slots stay, so the next request restores them.
    pub idle_timeout: Duration,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            typing_delay: Duration::from_millis(1200),
            currency: "eur".to_string(),
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Recommendation plus the priced order it leads to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationView {
    pub recommendation: Recommendation,
    pub title: String,
    pub explanation: String,
    pub quote: Quote,
}

/// A live conversation and its pending typing timer.
struct SessionEntry {
    session: ChatSession,
    typing: TypingTimer,
    last_active: Instant,
    /// Set when the entry is dropped from the live map. A request that
    /// was already waiting on it must look the id up again.
    evicted: bool,
}

impl SessionEntry {
    fn new(session: ChatSession) -> Self {
        Self {
            session,
            typing: TypingTimer::new(),
            last_active: Instant::now(),
            evicted: false,
        }
    }
}

type SharedEntry = Arc<Mutex<SessionEntry>>;
type EntryGuard = OwnedMutexGuard<SessionEntry>;

pub struct FunnelManager {
    store: Arc<dyn SessionStore>,
    checkout: Option<Arc<dyn CheckoutBridge>>,
    notifier: Option<Arc<dyn LeadNotifier>>,
    config: FunnelConfig,
    sessions: RwLock<HashMap<Uuid, SharedEntry>>,
    tx: broadcast::Sender<FunnelEvent>,
}

impl FunnelManager {
    pub fn new(store: Arc<dyn SessionStore>, config: FunnelConfig) -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Self {
            store,
            checkout: None,
            notifier: None,
            config,
            sessions: RwLock::new(HashMap::new()),
            tx,
        }
    }

    pub fn with_checkout(mut self, checkout: Arc<dyn CheckoutBridge>) -> Self {
        self.checkout = Some(checkout);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn LeadNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Subscribe to funnel events. Each WS client calls this.
    pub fn subscribe(&self) -> broadcast::Receiver<FunnelEvent> {
        self.tx.subscribe()
    }

    /// Start a new conversation. The welcome prompt follows after the
    /// typing delay.
    pub async fn create_session(&self) -> SessionView {
        let session = ChatSession::new();
        let id = session.conversation_id();
        let shared = Arc::new(Mutex::new(SessionEntry::new(session)));
        self.sessions.write().await.insert(id, Arc::clone(&shared));

        let mut entry = shared.lock().await;
        self.persist(&entry.session).await;
        self.schedule_prompt(&shared, &mut entry);

        info!(conversation_id = %id, "Conversation started");
        SessionView::from(&entry.session)
    }

    /// View a conversation, restoring it from its slot if it is not live.
    /// A missing or corrupt slot starts a fresh conversation instead.
    pub async fn resume(&self, id: Uuid) -> SessionView {
        if let Ok((_, entry)) = self.lock_entry(id).await {
            return SessionView::from(&entry.session);
        }

        info!(requested = %id, "No usable session slot, starting fresh");
        self.create_session().await
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<SessionView, FunnelError> {
        let (_, mut entry) = self.lock_entry(id).await?;
        entry.session.update_profile(update);
        self.persist(&entry.session).await;
        Ok(SessionView::from(&entry.session))
    }

    /// Move to `step` and schedule its prompt. Entering checkout without
    /// valid contact details fails and changes nothing.
    pub async fn set_step(
        &self,
        id: Uuid,
        step: ConversationStep,
    ) -> Result<SessionView, FunnelError> {
        let (shared, mut entry) = self.lock_entry(id).await?;
        self.enter_step(&shared, &mut entry, step).await?;
        Ok(SessionView::from(&entry.session))
    }

    /// Move to the next step in the conventional order. At the last step
    /// the current step is re-entered.
    pub async fn advance(&self, id: Uuid) -> Result<SessionView, FunnelError> {
        let (shared, mut entry) = self.lock_entry(id).await?;
        let current = entry.session.current_step();
        let next = current.next().unwrap_or(current);
        self.enter_step(&shared, &mut entry, next).await?;
        Ok(SessionView::from(&entry.session))
    }

    /// Append a reply written by the prospect.
    pub async fn add_user_message(
        &self,
        id: Uuid,
        content: String,
    ) -> Result<SessionView, FunnelError> {
        let (_, mut entry) = self.lock_entry(id).await?;

        let message = Message::user(content);
        entry.session.add_message(message.clone());
        let _ = self.tx.send(FunnelEvent::MessageAppended {
            conversation_id: id,
            message,
        });
        self.persist(&entry.session).await;

        Ok(SessionView::from(&entry.session))
    }

    /// Reset the conversation under a new id. The old slot is removed.
    pub async fn clear(&self, id: Uuid) -> Result<SessionView, FunnelError> {
        let (shared, mut entry) = self.lock_entry(id).await?;

        entry.typing.cancel();
        entry.session.clear_chat();
        let new_id = entry.session.conversation_id();

        {
            let mut sessions = self.sessions.write().await;
            sessions.remove(&id);
            sessions.insert(new_id, Arc::clone(&shared));
        }

        if let Err(e) = self.store.delete_session(id).await {
            warn!(conversation_id = %id, "Failed to delete session slot: {}", e);
        }
        self.persist(&entry.session).await;

        let _ = self.tx.send(FunnelEvent::SessionCleared {
            previous_id: id,
            conversation_id: new_id,
        });
        self.schedule_prompt(&shared, &mut entry);

        info!(previous = %id, conversation_id = %new_id, "Conversation cleared");
        Ok(SessionView::from(&entry.session))
    }

    pub async fn recommendation(&self, id: Uuid) -> Result<RecommendationView, FunnelError> {
        let (_, entry) = self.lock_entry(id).await?;
        let recommendation = entry.session.recommendation();

        Ok(RecommendationView {
            recommendation,
            title: recommendation.title().to_string(),
            explanation: recommendation.explanation().to_string(),
            quote: quote(recommendation, entry.session.profile().quantity),
        })
    }

    /// Hand the conversation off to the payment provider.
    ///
    /// Works on a snapshot of the profile; neither the profile nor the
    /// transcript is modified, whether the provider call succeeds or not.
    /// The sales notification runs in the background and never delays
    /// the returned checkout URL.
    pub async fn start_checkout(&self, id: Uuid) -> Result<CheckoutSession, FunnelError> {
        let (request, summary) = {
            let (_, entry) = self.lock_entry(id).await?;
            let profile = entry.session.profile().clone();
            let contact = validate_contact(profile.contact_info.as_ref())?.clone();
            let recommendation = entry.session.recommendation();
            let quote = quote(recommendation, profile.quantity);

            let request = CheckoutRequest {
                amount: quote.amount_minor,
                currency: self.config.currency.clone(),
                customer: contact,
                order: OrderDescriptor {
                    package: recommendation,
                    quantity: quote.quantity,
                    industry: profile.industry,
                    conversation_id: id,
                },
            };
            (request, profile.summary())
        };

        let bridge = self
            .checkout
            .as_ref()
            .ok_or(FunnelError::Checkout(CheckoutError::NotConfigured))?;

        let session = match bridge.create_session(&request).await {
            Ok(session) => session,
            Err(e) => {
                warn!(
                    conversation_id = %id,
                    provider = bridge.name(),
                    "Checkout hand-off failed: {}",
                    e
                );
                return Err(e.into());
            }
        };

        info!(
            conversation_id = %id,
            session_id = %session.session_id,
            amount = request.amount,
            "Checkout started"
        );
        let _ = self.tx.send(FunnelEvent::CheckoutStarted {
            conversation_id: id,
            url: session.url.clone(),
        });

        if let Some(ref notifier) = self.notifier {
            let text = format!(
                "Nieuwe checkout gestart: {} (€{})\n{}",
                request.order.product_name(),
                quote(request.order.package, Some(request.order.quantity)).total,
                summary
            );
            let notifier = Arc::clone(notifier);
            tokio::spawn(async move {
                if let Err(e) = notifier.notify(&text).await {
                    warn!(notifier = notifier.name(), "Lead notification failed: {}", e);
                }
            });
        }

        Ok(session)
    }

    /// Current view of a live or restorable conversation.
    pub async fn view(&self, id: Uuid) -> Result<SessionView, FunnelError> {
        let (_, entry) = self.lock_entry(id).await?;
        Ok(SessionView::from(&entry.session))
    }

    /// Drop live conversations idle for longer than the configured timeout.
    /// Entries that are locked or still waiting on a prompt are kept.
    /// Returns the number of conversations evicted.
    pub async fn evict_idle(&self) -> usize {
        let idle_timeout = self.config.idle_timeout;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, shared| {
            let Ok(mut entry) = shared.try_lock() else {
                return true;
            };
            if entry.typing.is_pending() || entry.last_active.elapsed() < idle_timeout {
                return true;
            }
            entry.typing.cancel();
            entry.evicted = true;
            debug!(conversation_id = %id, "Idle conversation evicted");
            false
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, live = sessions.len(), "Evicted idle conversations");
        }
        evicted
    }

    /// Lock the live entry for `id`, restoring it from its slot if needed.
    ///
    /// Fails with `SessionNotFound` when the entry was re-keyed by a
    /// concurrent clear while this request waited for the lock.
    async fn lock_entry(&self, id: Uuid) -> Result<(SharedEntry, EntryGuard), FunnelError> {
        loop {
            let shared = self
                .lookup(id)
                .await
                .ok_or(FunnelError::SessionNotFound(id))?;
            let mut entry = Arc::clone(&shared).lock_owned().await;

            if entry.evicted {
                // Evicted while we waited; the slot is current, look again.
                continue;
            }
            if entry.session.conversation_id() != id {
                return Err(FunnelError::SessionNotFound(id));
            }

            entry.last_active = Instant::now();
            return Ok((shared, entry));
        }
    }

    /// Find a live conversation, or restore it from its slot.
    async fn lookup(&self, id: Uuid) -> Option<SharedEntry> {
        if let Some(shared) = self.sessions.read().await.get(&id) {
            return Some(Arc::clone(shared));
        }

        let session = match self.store.load_session(id).await {
            Ok(Some(value)) => {
                ChatSession::from_slot(value).filter(|s| s.conversation_id() == id)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(conversation_id = %id, "Failed to load session slot: {}", e);
                None
            }
        }?;

        let mut sessions = self.sessions.write().await;
        if let Some(shared) = sessions.get(&id) {
            // Restored concurrently by another request.
            return Some(Arc::clone(shared));
        }

        let shared = Arc::new(Mutex::new(SessionEntry::new(session)));
        sessions.insert(id, Arc::clone(&shared));
        drop(sessions);

        // The transcript is not persisted; re-show the active step's prompt.
        {
            let mut entry = shared.lock().await;
            self.schedule_prompt(&shared, &mut entry);
        }

        info!(conversation_id = %id, "Conversation restored from slot");
        Some(shared)
    }

    /// Apply a step transition on a locked entry: validate, announce,
    /// persist, and schedule the new step's prompt.
    async fn enter_step(
        &self,
        shared: &SharedEntry,
        entry: &mut SessionEntry,
        step: ConversationStep,
    ) -> Result<(), FunnelError> {
        let id = entry.session.conversation_id();
        if let Err(e) = entry.session.set_current_step(step) {
            debug!(conversation_id = %id, step = %step, "Step rejected: {}", e);
            return Err(e.into());
        }

        let _ = self.tx.send(FunnelEvent::StepChanged {
            conversation_id: id,
            step,
        });
        self.persist(&entry.session).await;
        self.schedule_prompt(shared, entry);
        Ok(())
    }

    /// Cancel any pending prompt and schedule the active step's prompt.
    fn schedule_prompt(&self, shared: &SharedEntry, entry: &mut SessionEntry) {
        let generation = entry.typing.cancel();
        let step = entry.session.current_step();
        let conversation_id = entry.session.conversation_id();

        entry.session.set_typing(true);
        let _ = self.tx.send(FunnelEvent::TypingStarted {
            conversation_id,
            step,
        });

        let delay = self.config.typing_delay;
        let shared = Arc::clone(shared);
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut entry = shared.lock().await;
            if !entry.typing.is_current(generation) {
                return;
            }

            let prompt = step_prompt(step, entry.session.profile());
            entry.session.add_message(prompt.clone());
            entry.session.set_typing(false);
            entry.typing.finish(generation);

            debug!(conversation_id = %conversation_id, step = %step, "Prompt appended");
            let _ = tx.send(FunnelEvent::MessageAppended {
                conversation_id,
                message: prompt,
            });
        });
        entry.typing.arm(handle);
    }

    /// Write the session slot. Failures are logged, never surfaced.
    async fn persist(&self, session: &ChatSession) {
        let id = session.conversation_id();
        let value = match serde_json::to_value(session.snapshot()) {
            Ok(v) => v,
            Err(e) => {
                warn!(conversation_id = %id, "Failed to serialize session: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.save_session(id, &value).await {
            warn!(conversation_id = %id, "Failed to persist session: {}", e);
        }
    }
}

/// Spawn a background task that periodically evicts idle conversations.
pub fn spawn_eviction_task(manager: Arc<FunnelManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            manager.evict_idle().await;
        }
    })
}
