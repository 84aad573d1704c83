use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SessionError;

/// A participant's permission class within a classroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Assistant,
    Student,
    Observer,
}

/// The set of actions a role is allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub can_publish_audio: bool,
    pub can_publish_video: bool,
    pub can_subscribe: bool,
    pub can_moderate: bool,
}

impl Capabilities {
    /// Whether the role may publish any media at all.
    pub fn can_publish(&self) -> bool {
        self.can_publish_audio || self.can_publish_video
    }
}

/// Pure lookup from role to capability set. Total over the enum.
pub fn capabilities_for(role: Role) -> Capabilities {
    match role {
        Role::Host | Role::Assistant => Capabilities {
            can_publish_audio: true,
            can_publish_video: true,
            can_subscribe: true,
            can_moderate: true,
        },
        Role::Student => Capabilities {
            can_publish_audio: true,
            can_publish_video: true,
            can_subscribe: true,
            can_moderate: false,
        },
        Role::Observer => Capabilities {
            can_publish_audio: false,
            can_publish_video: false,
            can_subscribe: true,
            can_moderate: false,
        },
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Assistant => "assistant",
            Role::Student => "student",
            Role::Observer => "observer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Role::Host),
            "assistant" => Ok(Role::Assistant),
            "student" => Ok(Role::Student),
            "observer" => Ok(Role::Observer),
            other => Err(SessionError::UnknownRole(other.to_string())),
        }
    }
}
