use dashmap::DashSet;
use std::sync::Arc;
use uuid::Uuid;

/// In-process exclusion for concurrent cleanups of the same resource
#[derive(Debug, Default, Clone)]
pub struct CleanupLeases {
    held: Arc<DashSet<Uuid>>,
}

impl CleanupLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when another cleanup in this process holds the resource
    pub fn try_acquire(&self, resource_id: Uuid) -> Option<LeaseGuard> {
        self.held.insert(resource_id).then(|| LeaseGuard {
            held: Arc::clone(&self.held),
            resource_id,
        })
    }

    pub fn is_held(&self, resource_id: Uuid) -> bool {
        self.held.contains(&resource_id)
    }
}

/// Releases the lease on drop
#[derive(Debug)]
pub struct LeaseGuard {
    held: Arc<DashSet<Uuid>>,
    resource_id: Uuid,
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        self.held.remove(&self.resource_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lease_is_exclusive_until_dropped() {
        let leases = CleanupLeases::new();
        let id = Uuid::new_v4();

        let guard = leases.try_acquire(id).expect("first acquire");
        assert!(leases.try_acquire(id).is_none());
        assert!(leases.is_held(id));

        drop(guard);
        assert!(!leases.is_held(id));
        assert!(leases.try_acquire(id).is_some());
    }
}
