use std::collections::HashSet;

/// Set of usernames currently online, excluding the local user (the view
/// renders "You" separately). Mutated only by the sync engine, via join and
/// leave events or full snapshots.
#[derive(Debug, Clone)]
pub struct Roster {
    local_user: String,
    online: HashSet<String>,
}

impl Roster {
    pub fn new(local_user: &str) -> Self {
        Self {
            local_user: local_user.to_string(),
            online: HashSet::new(),
        }
    }

    /// Replace the roster wholesale with a server snapshot.
    /// Returns true when the set actually changed.
    pub fn set_all(&mut self, names: Vec<String>) -> bool {
        let next: HashSet<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && *n != self.local_user)
            .collect();
        if next == self.online {
            return false;
        }
        self.online = next;
        true
    }

    /// Incremental join. The local user and already-known names are no-ops.
    pub fn add(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || name == self.local_user {
            return false;
        }
        self.online.insert(name.to_string())
    }

    /// Incremental leave. Unknown names are a no-op.
    pub fn remove(&mut self, name: &str) -> bool {
        self.online.remove(name.trim())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.online.contains(name)
    }

    pub fn len(&self) -> usize {
        self.online.len()
    }

    pub fn is_empty(&self) -> bool {
        self.online.is_empty()
    }

    /// Stable ordering for display.
    pub fn names_sorted(&self) -> Vec<String> {
        let mut names: Vec<String> = self.online.iter().cloned().collect();
        names.sort();
        names
    }
}
