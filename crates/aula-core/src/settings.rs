use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::TimelineConfig;
use crate::role::Role;
use crate::room::{EnterRoomParam, Room, User};

/// Persisted join preferences.
///
/// Lets an app remember the user's last join intent. The media flags
/// default to off, matching the join contract: media is never exposed
/// or consumed without an explicit request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JoinPreferences {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub publish_on_join: bool,
    #[serde(default)]
    pub subscribe_video_on_join: bool,
    #[serde(default)]
    pub subscribe_audio_on_join: bool,
    /// Override for the chat separator gap, in seconds.
    #[serde(default)]
    pub separator_gap_secs: Option<u64>,
}

impl Default for JoinPreferences {
    fn default() -> Self {
        Self {
            display_name: None,
            role: None,
            publish_on_join: false,
            subscribe_video_on_join: false,
            subscribe_audio_on_join: false,
            separator_gap_secs: None,
        }
    }
}

impl JoinPreferences {
    /// Build an `EnterRoomParam` carrying the stored intent.
    /// `fallback_role` applies when no role preference is stored; a
    /// stored display name overrides the user's.
    pub fn enter_param(&self, room: Room, mut user: User, fallback_role: Role) -> EnterRoomParam {
        if let Some(name) = &self.display_name {
            user.name = name.clone();
        }
        let mut param = EnterRoomParam::new(room, user, self.role.unwrap_or(fallback_role));
        param.auto_publish = self.publish_on_join;
        param.auto_subscribe_video = self.subscribe_video_on_join;
        param.auto_subscribe_audio = self.subscribe_audio_on_join;
        param
    }

    /// Timeline configuration with the stored gap override applied.
    pub fn timeline_config(&self) -> TimelineConfig {
        let mut config = TimelineConfig::default();
        if let Some(secs) = self.separator_gap_secs {
            config.separator_gap = Duration::from_secs(secs);
        }
        config
    }
}

pub struct PreferencesStore {
    preferences: Mutex<JoinPreferences>,
    file_path: PathBuf,
}

impl PreferencesStore {
    pub fn new(data_dir: &str) -> Self {
        let file_path = PathBuf::from(data_dir).join("preferences.json");
        let preferences = Self::load(&file_path);
        Self {
            preferences: Mutex::new(preferences),
            file_path,
        }
    }

    pub fn get(&self) -> JoinPreferences {
        self.preferences.lock().unwrap().clone()
    }

    pub fn set_display_name(&self, name: Option<String>) {
        self.preferences.lock().unwrap().display_name = name;
        self.save();
    }

    pub fn set_role(&self, role: Option<Role>) {
        self.preferences.lock().unwrap().role = role;
        self.save();
    }

    pub fn set_publish_on_join(&self, enabled: bool) {
        self.preferences.lock().unwrap().publish_on_join = enabled;
        self.save();
    }

    pub fn set_subscribe_on_join(&self, video: bool, audio: bool) {
        {
            let mut prefs = self.preferences.lock().unwrap();
            prefs.subscribe_video_on_join = video;
            prefs.subscribe_audio_on_join = audio;
        }
        self.save();
    }

    pub fn set_separator_gap_secs(&self, secs: Option<u64>) {
        self.preferences.lock().unwrap().separator_gap_secs = secs;
        self.save();
    }

    fn save(&self) {
        let preferences = self.preferences.lock().unwrap().clone();
        if let Some(parent) = self.file_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(&preferences) {
            let _ = std::fs::write(&self.file_path, json);
        }
    }

    fn load(path: &PathBuf) -> JoinPreferences {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => JoinPreferences::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn default_preferences_request_no_media() {
        let prefs = JoinPreferences::default();
        assert!(!prefs.publish_on_join);
        assert!(!prefs.subscribe_video_on_join);
        assert!(!prefs.subscribe_audio_on_join);
        assert_eq!(prefs.separator_gap_secs, None);
    }

    #[test]
    fn new_creates_defaults_when_no_file() {
        let dir = temp_dir();
        let store = PreferencesStore::new(dir.path().to_str().unwrap());
        assert_eq!(store.get(), JoinPreferences::default());
    }

    #[test]
    fn set_display_name_persists() {
        let dir = temp_dir();
        let path = dir.path().to_str().unwrap();
        {
            let store = PreferencesStore::new(path);
            store.set_display_name(Some("Alice".to_string()));
        }
        let store = PreferencesStore::new(path);
        assert_eq!(store.get().display_name, Some("Alice".to_string()));
    }

    #[test]
    fn set_role_and_flags_persist() {
        let dir = temp_dir();
        let path = dir.path().to_str().unwrap();
        {
            let store = PreferencesStore::new(path);
            store.set_role(Some(Role::Assistant));
            store.set_publish_on_join(true);
            store.set_subscribe_on_join(true, false);
        }
        let store = PreferencesStore::new(path);
        let prefs = store.get();
        assert_eq!(prefs.role, Some(Role::Assistant));
        assert!(prefs.publish_on_join);
        assert!(prefs.subscribe_video_on_join);
        assert!(!prefs.subscribe_audio_on_join);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = temp_dir();
        fs::write(dir.path().join("preferences.json"), "not json!!!").unwrap();
        let store = PreferencesStore::new(dir.path().to_str().unwrap());
        assert_eq!(store.get(), JoinPreferences::default());
    }

    #[test]
    fn partial_json_uses_serde_defaults() {
        let dir = temp_dir();
        fs::write(
            dir.path().join("preferences.json"),
            r#"{"display_name":"Eve","role":"observer"}"#,
        )
        .unwrap();
        let store = PreferencesStore::new(dir.path().to_str().unwrap());
        let prefs = store.get();
        assert_eq!(prefs.display_name, Some("Eve".to_string()));
        assert_eq!(prefs.role, Some(Role::Observer));
        assert!(!prefs.publish_on_join);
    }

    #[test]
    fn enter_param_applies_stored_intent() {
        let prefs = JoinPreferences {
            display_name: Some("Prof. Lang".to_string()),
            role: Some(Role::Host),
            publish_on_join: true,
            subscribe_audio_on_join: true,
            ..JoinPreferences::default()
        };
        let param = prefs.enter_param(
            Room::new("room-1", "Algebra"),
            User::new("u1", "ignored"),
            Role::Student,
        );
        assert_eq!(param.user.name, "Prof. Lang");
        assert_eq!(param.role, Role::Host);
        assert!(param.auto_publish);
        assert!(param.auto_subscribe_audio);
        assert!(!param.auto_subscribe_video);
    }

    #[test]
    fn timeline_config_honors_gap_override() {
        let mut prefs = JoinPreferences::default();
        assert_eq!(
            prefs.timeline_config().separator_gap,
            Duration::from_secs(300)
        );
        prefs.separator_gap_secs = Some(60);
        assert_eq!(
            prefs.timeline_config().separator_gap,
            Duration::from_secs(60)
        );
    }
}
