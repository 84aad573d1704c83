//! Room entry negotiation: parameter validation and the post-join media
//! plan.
//!
//! Both halves are pure functions so the join's side effects stay
//! auditable: the session computes the plan once, before any command is
//! issued, and `PermissionDenied` fires before the transport is touched.

use crate::errors::SessionError;
use crate::role::capabilities_for;
use crate::room::EnterRoomParam;

/// The media commands to issue after a successful join, computed once
/// from the join intent and the role's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaPlan {
    pub publish_audio: bool,
    pub publish_video: bool,
    pub subscribe_audio: bool,
    pub subscribe_video: bool,
}

impl MediaPlan {
    pub fn wants_publish(&self) -> bool {
        self.publish_audio || self.publish_video
    }

    pub fn wants_subscribe(&self) -> bool {
        self.subscribe_audio || self.subscribe_video
    }

    pub fn is_empty(&self) -> bool {
        !self.wants_publish() && !self.wants_subscribe()
    }
}

/// Reject malformed join parameters before anything else runs.
pub fn validate(param: &EnterRoomParam) -> Result<(), SessionError> {
    if param.room.id.trim().is_empty() {
        return Err(SessionError::InvalidParam("room id is empty".into()));
    }
    if param.user.id.trim().is_empty() {
        return Err(SessionError::InvalidParam("user id is empty".into()));
    }
    if param.user.name.trim().is_empty() {
        return Err(SessionError::InvalidParam("user name is empty".into()));
    }
    Ok(())
}

/// Reconcile the auto-publish/subscribe intent with the role's
/// capabilities. Publish scope (audio, video, or both) is whatever the
/// role permits.
pub fn plan_media(param: &EnterRoomParam) -> Result<MediaPlan, SessionError> {
    let caps = capabilities_for(param.role);
    let mut plan = MediaPlan::default();

    if param.auto_publish {
        if !caps.can_publish() {
            return Err(SessionError::PermissionDenied(format!(
                "role {} cannot publish media",
                param.role
            )));
        }
        plan.publish_audio = caps.can_publish_audio;
        plan.publish_video = caps.can_publish_video;
    }

    if (param.auto_subscribe_audio || param.auto_subscribe_video) && !caps.can_subscribe {
        return Err(SessionError::PermissionDenied(format!(
            "role {} cannot subscribe",
            param.role
        )));
    }
    plan.subscribe_audio = param.auto_subscribe_audio;
    plan.subscribe_video = param.auto_subscribe_video;

    Ok(plan)
}
