//! Room session aggregate.
//!
//! One `RoomSession` per room membership, explicitly owned by the host
//! application and handed to collaborators by reference, with no
//! ambient globals. All mutating state lives behind a single lock; the join
//! negotiation releases it across the transport await so concurrent
//! callers are rejected, not queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::chat::{ChatMessage, ChatTimeline, TimelineConfig};
use crate::entry::{self, MediaPlan};
use crate::errors::SessionError;
use crate::events::{EventEmitter, MediaAction, SessionEvent, SessionEventListener};
use crate::media::MediaEngine;
use crate::participants::Roster;
use crate::role::Role;
use crate::transport::{Transport, TransportEvent};

/// Identity of a live classroom. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub name: String,
}

impl Room {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// A participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// A locally-created user with a fresh UUID v4 id.
    pub fn with_generated_id(name: &str) -> Self {
        Self::new(&uuid::Uuid::new_v4().to_string(), name)
    }
}

/// Join intent: room identity, the joining user, its role, and the
/// media auto-flags. Flags default to false: joining never implicitly
/// exposes or consumes media. Immutable once submitted; a new attempt
/// takes a new value.
#[derive(Debug, Clone)]
pub struct EnterRoomParam {
    pub room: Room,
    pub user: User,
    pub role: Role,
    pub auto_publish: bool,
    pub auto_subscribe_video: bool,
    pub auto_subscribe_audio: bool,
}

impl EnterRoomParam {
    pub fn new(room: Room, user: User, role: Role) -> Self {
        Self {
            room,
            user,
            role,
            auto_publish: false,
            auto_subscribe_video: false,
            auto_subscribe_audio: false,
        }
    }
}

/// Session lifecycle. Only `Joined` permits chat and media operations;
/// `enter_room` is legal only from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Joining,
    Joined,
    Left,
    Failed,
}

#[derive(Debug)]
struct SessionInner {
    phase: SessionPhase,
    room: Option<Room>,
    local_user: Option<User>,
    role: Option<Role>,
    roster: Roster,
    timeline: ChatTimeline,
    published: bool,
    subscriptions: Vec<String>, // remote user ids with an active subscription
}

/// Aggregate root for one room membership.
pub struct RoomSession {
    transport: Arc<dyn Transport>,
    media: Arc<dyn MediaEngine>,
    emitter: EventEmitter,
    inner: Mutex<SessionInner>,
    cancel_requested: AtomicBool,
}

impl RoomSession {
    pub fn new(transport: Arc<dyn Transport>, media: Arc<dyn MediaEngine>) -> Self {
        Self::with_timeline_config(transport, media, TimelineConfig::default())
    }

    pub fn with_timeline_config(
        transport: Arc<dyn Transport>,
        media: Arc<dyn MediaEngine>,
        config: TimelineConfig,
    ) -> Self {
        Self {
            transport,
            media,
            emitter: EventEmitter::new(),
            inner: Mutex::new(SessionInner {
                phase: SessionPhase::Idle,
                room: None,
                local_user: None,
                role: None,
                roster: Roster::new(),
                timeline: ChatTimeline::new(config),
                published: false,
                subscriptions: Vec::new(),
            }),
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// Register a listener for session events.
    pub fn add_listener(&self, listener: Arc<dyn SessionEventListener>) {
        self.emitter.add_listener(listener);
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase
    }

    pub async fn room(&self) -> Option<Room> {
        self.inner.lock().await.room.clone()
    }

    pub async fn local_user(&self) -> Option<User> {
        self.inner.lock().await.local_user.clone()
    }

    pub async fn role(&self) -> Option<Role> {
        self.inner.lock().await.role
    }

    /// Snapshot of the current membership.
    pub async fn participants(&self) -> Vec<User> {
        self.inner.lock().await.roster.users().to_vec()
    }

    /// Snapshot of the display-ordered chat sequence. Idempotent; stays
    /// readable after the session has left the room.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().await.timeline.entries().to_vec()
    }

    /// Join a room.
    ///
    /// Validation and the capability check run before any side effect;
    /// the transport join is all-or-nothing for membership; the media
    /// plan afterwards is best-effort and never fails the join.
    pub async fn enter_room(&self, param: EnterRoomParam) -> Result<(), SessionError> {
        entry::validate(&param)?;
        let plan = entry::plan_media(&param)?;

        {
            let mut inner = self.inner.lock().await;
            if inner.phase != SessionPhase::Idle {
                return Err(SessionError::InvalidState(format!(
                    "enter_room while {:?}",
                    inner.phase
                )));
            }
            inner.phase = SessionPhase::Joining;
        }
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.emitter
            .emit(SessionEvent::PhaseChanged(SessionPhase::Joining));
        tracing::info!("joining room {} as {}", param.room.id, param.role);

        // The lock is not held across this await: while Joining, every
        // other session operation observes the phase and is rejected.
        let snapshot = match self
            .transport
            .request_join(&param.room.id, &param.user.id, &param.user.name)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("join rejected for room {}: {e}", param.room.id);
                self.set_phase(SessionPhase::Failed).await;
                return Err(SessionError::JoinRejected(e.to_string()));
            }
        };

        if self.cancel_requested.load(Ordering::SeqCst) {
            // Membership was established on the server side; undo it.
            self.rollback(&param.room.id).await;
            return Err(SessionError::Cancelled);
        }

        let joined_users = {
            let mut inner = self.inner.lock().await;
            inner.room = Some(param.room.clone());
            inner.local_user = Some(param.user.clone());
            inner.role = Some(param.role);
            inner.roster.set_local_id(param.user.id.clone());
            inner.roster.add(param.user.clone());
            let mut added = Vec::new();
            for user in snapshot.users {
                if inner.roster.add(user.clone()) {
                    added.push(user);
                }
            }
            inner.phase = SessionPhase::Joined;
            added
        };
        for user in joined_users {
            self.emitter.emit(SessionEvent::UserJoined(user));
        }
        self.emitter
            .emit(SessionEvent::PhaseChanged(SessionPhase::Joined));
        tracing::info!("joined room {}", param.room.id);

        self.execute_media_plan(&plan).await;

        if self.cancel_requested.load(Ordering::SeqCst) {
            self.rollback(&param.room.id).await;
            return Err(SessionError::Cancelled);
        }

        Ok(())
    }

    /// Request cancellation of a join in progress. The negotiation rolls
    /// back any membership and media commands already issued before it
    /// completes with `Cancelled`. A no-op once the join has returned.
    pub fn cancel_join(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Send a chat message and append it to the timeline as our own.
    pub async fn send_chat(&self, content: &str) -> Result<ChatMessage, SessionError> {
        let author = {
            let inner = self.inner.lock().await;
            if inner.phase != SessionPhase::Joined {
                return Err(SessionError::InvalidState(format!(
                    "send_chat while {:?}",
                    inner.phase
                )));
            }
            inner
                .local_user
                .as_ref()
                .map(|u| u.name.clone())
                .unwrap_or_default()
        };

        self.transport.send_chat_text(content).await?;

        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let msg = {
            let mut inner = self.inner.lock().await;
            if inner.phase != SessionPhase::Joined {
                // Left while the send was in flight.
                return Err(SessionError::InvalidState(format!(
                    "send_chat while {:?}",
                    inner.phase
                )));
            }
            inner.timeline.append(&author, content, true, timestamp_ms)
        };
        self.emitter.emit(SessionEvent::ChatAppended(msg.clone()));
        Ok(msg)
    }

    /// Apply an inbound chat event from the transport.
    pub async fn on_chat_received(
        &self,
        author: &str,
        content: &str,
        timestamp_ms: i64,
    ) -> Result<ChatMessage, SessionError> {
        let msg = {
            let mut inner = self.inner.lock().await;
            if inner.phase != SessionPhase::Joined {
                return Err(SessionError::InvalidState(format!(
                    "chat received while {:?}",
                    inner.phase
                )));
            }
            inner.timeline.append(author, content, false, timestamp_ms)
        };
        tracing::debug!("chat from {author}: {} chars", content.len());
        self.emitter.emit(SessionEvent::ChatAppended(msg.clone()));
        Ok(msg)
    }

    /// Apply a membership join event from the transport.
    pub async fn on_user_joined(&self, user: User) -> Result<(), SessionError> {
        let added = {
            let mut inner = self.inner.lock().await;
            if inner.phase != SessionPhase::Joined {
                return Err(SessionError::InvalidState(format!(
                    "user joined while {:?}",
                    inner.phase
                )));
            }
            inner.roster.add(user.clone())
        };
        if added {
            tracing::info!("user joined: {}", user.id);
            self.emitter.emit(SessionEvent::UserJoined(user));
        }
        Ok(())
    }

    /// Apply a membership leave event from the transport. Any active
    /// subscription to the departed user is dropped.
    pub async fn on_user_left(&self, user_id: &str) -> Result<(), SessionError> {
        let (removed, was_subscribed) = {
            let mut inner = self.inner.lock().await;
            if inner.phase != SessionPhase::Joined {
                return Err(SessionError::InvalidState(format!(
                    "user left while {:?}",
                    inner.phase
                )));
            }
            let removed = inner.roster.remove(user_id);
            let before = inner.subscriptions.len();
            inner.subscriptions.retain(|id| id != user_id);
            (removed, inner.subscriptions.len() != before)
        };
        if was_subscribed {
            if let Err(e) = self.media.unsubscribe(user_id).await {
                tracing::warn!("unsubscribe after departure of {user_id} failed: {e}");
            }
        }
        if removed {
            tracing::info!("user left: {user_id}");
            self.emitter.emit(SessionEvent::UserLeft(user_id.to_string()));
        }
        Ok(())
    }

    /// Leave the room: tear down every active media stream, clear the
    /// membership, and freeze the timeline (still readable).
    pub async fn leave(&self) -> Result<(), SessionError> {
        let (room_id, published, subscriptions) = {
            let mut inner = self.inner.lock().await;
            if inner.phase != SessionPhase::Joined {
                return Err(SessionError::InvalidState(format!(
                    "leave while {:?}",
                    inner.phase
                )));
            }
            inner.phase = SessionPhase::Left;
            inner.roster.clear();
            inner.timeline.freeze();
            let room_id = inner.room.as_ref().map(|r| r.id.clone()).unwrap_or_default();
            (
                room_id,
                std::mem::take(&mut inner.published),
                std::mem::take(&mut inner.subscriptions),
            )
        };

        self.teardown_media(published, &subscriptions).await;
        if let Err(e) = self.transport.leave().await {
            tracing::warn!("transport leave failed: {e}");
        }
        tracing::info!("left room {room_id}");
        self.emitter
            .emit(SessionEvent::PhaseChanged(SessionPhase::Left));
        Ok(())
    }

    /// Run the transport event pump: drains push events and applies them
    /// strictly in arrival order. Ends when the sender side is dropped.
    pub fn spawn_event_pump(
        self: &Arc<Self>,
        mut events: UnboundedReceiver<TransportEvent>,
    ) -> tokio::task::JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                session.apply_transport_event(event).await;
            }
            tracing::debug!("transport event pump ended");
        })
    }

    async fn apply_transport_event(&self, event: TransportEvent) {
        let result = match event {
            TransportEvent::UserJoined(user) => self.on_user_joined(user).await,
            TransportEvent::UserLeft(id) => self.on_user_left(&id).await,
            TransportEvent::ChatReceived {
                author,
                content,
                timestamp_ms,
            } => self
                .on_chat_received(&author, &content, timestamp_ms)
                .await
                .map(|_| ()),
        };
        if let Err(e) = result {
            tracing::debug!("transport event dropped: {e}");
        }
    }

    /// Best-effort execution of the post-join media plan. Failures
    /// degrade the session; they never fail the join.
    async fn execute_media_plan(&self, plan: &MediaPlan) {
        if plan.wants_publish() {
            match self
                .media
                .publish(plan.publish_audio, plan.publish_video)
                .await
            {
                Ok(()) => {
                    self.inner.lock().await.published = true;
                    tracing::info!(
                        "published local media (audio={}, video={})",
                        plan.publish_audio,
                        plan.publish_video
                    );
                }
                Err(e) => {
                    tracing::warn!("auto-publish failed: {e}");
                    self.emitter.emit(SessionEvent::MediaDegraded {
                        action: MediaAction::Publish,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if plan.wants_subscribe() {
            let targets = self.inner.lock().await.roster.remote_ids();
            for target in targets {
                match self
                    .media
                    .subscribe(&target, plan.subscribe_audio, plan.subscribe_video)
                    .await
                {
                    Ok(()) => self.inner.lock().await.subscriptions.push(target),
                    Err(e) => {
                        tracing::warn!("auto-subscribe to {target} failed: {e}");
                        self.emitter.emit(SessionEvent::MediaDegraded {
                            action: MediaAction::Subscribe,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Undo a cancelled join: release any media already set up, leave
    /// the room, and reset the session to a terminal `Failed` phase.
    async fn rollback(&self, room_id: &str) {
        let (published, subscriptions) = {
            let mut inner = self.inner.lock().await;
            inner.room = None;
            inner.local_user = None;
            inner.role = None;
            inner.roster.clear();
            inner.phase = SessionPhase::Failed;
            (
                std::mem::take(&mut inner.published),
                std::mem::take(&mut inner.subscriptions),
            )
        };
        self.teardown_media(published, &subscriptions).await;
        if let Err(e) = self.transport.leave().await {
            tracing::warn!("rollback leave failed: {e}");
        }
        tracing::info!("join to room {room_id} cancelled and rolled back");
        self.emitter
            .emit(SessionEvent::PhaseChanged(SessionPhase::Failed));
    }

    async fn teardown_media(&self, published: bool, subscriptions: &[String]) {
        if published {
            if let Err(e) = self.media.unpublish().await {
                tracing::warn!("unpublish failed: {e}");
            }
        }
        for target in subscriptions {
            if let Err(e) = self.media.unsubscribe(target).await {
                tracing::warn!("unsubscribe from {target} failed: {e}");
            }
        }
    }

    async fn set_phase(&self, phase: SessionPhase) {
        self.inner.lock().await.phase = phase;
        self.emitter.emit(SessionEvent::PhaseChanged(phase));
    }
}
