use crate::room::User;

/// Membership roster for a room.
///
/// Seeded from the join snapshot, then updated by the transport event
/// pump. Read by the UI layer through session snapshots.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    users: Vec<User>,
    local_id: Option<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_local_id(&mut self, id: String) {
        self.local_id = Some(id);
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    /// Add a user; duplicates (by id) are suppressed. Returns whether
    /// the user was actually inserted.
    pub fn add(&mut self, user: User) -> bool {
        if self.users.iter().any(|u| u.id == user.id) {
            return false;
        }
        self.users.push(user);
        true
    }

    /// Remove a user by id. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        self.users.len() != before
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn get(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Ids of every member except the local user.
    pub fn remote_ids(&self) -> Vec<String> {
        self.users
            .iter()
            .filter(|u| Some(u.id.as_str()) != self.local_id.as_deref())
            .map(|u| u.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn clear(&mut self) {
        self.users.clear();
        self.local_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str) -> User {
        User::new(id, name)
    }

    #[test]
    fn add_and_retrieve_user() {
        let mut roster = Roster::new();
        assert!(roster.add(user("u1", "Alice")));
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get("u1").unwrap().name, "Alice");
    }

    #[test]
    fn no_duplicate_users() {
        let mut roster = Roster::new();
        assert!(roster.add(user("u1", "Alice")));
        assert!(!roster.add(user("u1", "Alice")));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn remove_user() {
        let mut roster = Roster::new();
        roster.add(user("u1", "Alice"));
        roster.add(user("u2", "Bob"));
        assert!(roster.remove("u1"));
        assert!(!roster.remove("u1"));
        assert_eq!(roster.len(), 1);
        assert!(roster.get("u1").is_none());
        assert!(roster.get("u2").is_some());
    }

    #[test]
    fn remote_ids_exclude_local_user() {
        let mut roster = Roster::new();
        roster.set_local_id("me".to_string());
        roster.add(user("me", "Me"));
        roster.add(user("u1", "Alice"));
        roster.add(user("u2", "Bob"));
        let mut remotes = roster.remote_ids();
        remotes.sort();
        assert_eq!(remotes, ["u1", "u2"]);
    }

    #[test]
    fn clear_resets_everything() {
        let mut roster = Roster::new();
        roster.set_local_id("me".to_string());
        roster.add(user("me", "Me"));
        roster.clear();
        assert!(roster.is_empty());
        assert!(roster.local_id().is_none());
    }
}
