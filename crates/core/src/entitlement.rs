//! Resource-scoped entitlements carried in access tokens.
//!
//! A caller may perform an operation on a resource only if one of its
//! [`Grant`]s names that resource (or the wildcard [`ANY_RESOURCE`]) and
//! lists the required [`Entitlement`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Grant resource name that matches every resource.
pub const ANY_RESOURCE: &str = "*";

/// A named permission on a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entitlement {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Entitlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entitlement::Create => "Create",
            Entitlement::Read => "Read",
            Entitlement::Update => "Update",
            Entitlement::Delete => "Delete",
        };
        f.write_str(name)
    }
}

/// The entitlements a principal holds on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub resource: String,
    pub entitlements: Vec<Entitlement>,
}

impl Grant {
    pub fn new(resource: impl Into<String>, entitlements: &[Entitlement]) -> Self {
        Self {
            resource: resource.into(),
            entitlements: entitlements.to_vec(),
        }
    }

    /// Whether this grant covers `entitlement` on `resource`.
    ///
    /// Resource names compare case-insensitively.
    pub fn allows(&self, resource: &str, entitlement: Entitlement) -> bool {
        let resource_matches =
            self.resource == ANY_RESOURCE || self.resource.eq_ignore_ascii_case(resource);
        resource_matches && self.entitlements.contains(&entitlement)
    }
}

/// Whether any of `grants` covers `entitlement` on `resource`.
pub fn is_entitled(grants: &[Grant], resource: &str, entitlement: Entitlement) -> bool {
    grants.iter().any(|g| g.allows(resource, entitlement))
}
