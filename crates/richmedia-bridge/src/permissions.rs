// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Permission oracle: the host's view of granted OS permissions.
//
// Permissions can change between sessions, so the bridge queries the oracle
// on every use and never caches the answer.

use std::sync::Mutex;

use richmedia_core::types::{Permission, PermissionSet};

use crate::listener::lock;

pub trait PermissionOracle: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;

    /// Query every known permission.
    fn snapshot(&self) -> PermissionSet {
        Permission::ALL
            .into_iter()
            .filter(|p| self.is_granted(*p))
            .collect()
    }
}

/// Oracle backed by an in-memory set the host can change at runtime.
#[derive(Debug, Default)]
pub struct GrantedPermissions {
    granted: Mutex<PermissionSet>,
}

impl GrantedPermissions {
    pub fn new(granted: PermissionSet) -> Self {
        Self {
            granted: Mutex::new(granted),
        }
    }

    pub fn replace(&self, granted: PermissionSet) {
        *lock(&self.granted) = granted;
    }

    pub fn grant(&self, permission: Permission) {
        lock(&self.granted).grant(permission);
    }
}

impl PermissionOracle for GrantedPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        lock(&self.granted).contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_runtime_changes() {
        let oracle = GrantedPermissions::default();
        assert_eq!(oracle.snapshot(), PermissionSet::new());

        oracle.grant(Permission::SendSms);
        assert!(oracle.snapshot().contains(Permission::SendSms));

        oracle.replace(PermissionSet::new());
        assert!(!oracle.snapshot().contains(Permission::SendSms));
    }
}
