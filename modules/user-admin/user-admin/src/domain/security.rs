//! Caller identity and capability checks.
//!
//! A `SecurityContext` is built once per request (see `api::rest::auth`) and passed
//! explicitly into every service entry point. Services call [`SecurityContext::ensure`]
//! before doing any work.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::domain::error::DomainError;

/// Role name that is granted every action on every resource.
pub const ADMIN_ROLE: &str = "ADMIN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Implies every other action.
    Manage,
}

impl Action {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Manage => "manage",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "manage" | "*" => Ok(Self::Manage),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    User,
    Role,
    /// Matches every resource.
    All,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Role => "role",
            Self::All => "all",
        })
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(Self::User),
            "role" | "roles" => Ok(Self::Role),
            "all" | "*" => Ok(Self::All),
            other => Err(format!("unknown resource '{other}'")),
        }
    }
}

/// A grant of one or more actions on a resource.
/// Parses from `"{resource}:{action}[|{action}...]"`, e.g. `"user:read|update"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    resource: Resource,
    actions: Vec<Action>,
}

impl Permission {
    #[must_use]
    pub fn new(resource: Resource, actions: Vec<Action>) -> Self {
        Self { resource, actions }
    }

    #[must_use]
    pub fn allows(&self, action: Action, resource: Resource) -> bool {
        let resource_ok = self.resource == Resource::All || self.resource == resource;
        resource_ok
            && self
                .actions
                .iter()
                .any(|a| *a == Action::Manage || *a == action)
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, actions) = s
            .split_once(':')
            .ok_or_else(|| format!("expected 'resource:action', got '{s}'"))?;
        let resource = resource.parse()?;
        let actions = actions
            .split('|')
            .filter(|a| !a.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Action>, _>>()?;
        if actions.is_empty() {
            return Err(format!("permission '{s}' grants no actions"));
        }
        Ok(Self { resource, actions })
    }
}

/// `SecurityContext` carries the acting session's identity and capabilities.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    subject_id: Uuid,
    email: Option<String>,
    role: Option<String>,
    permissions: Vec<Permission>,
}

impl SecurityContext {
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case(ADMIN_ROLE))
    }

    /// Ability check: may this session perform `action` on `resource`?
    #[must_use]
    pub fn can(&self, action: Action, resource: Resource) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p.allows(action, resource))
    }

    /// Fail with `Forbidden` unless the ability check passes.
    ///
    /// # Errors
    /// Returns [`DomainError::Forbidden`] when the session lacks the capability.
    pub fn ensure(&self, action: Action, resource: Resource) -> Result<(), DomainError> {
        if self.can(action, resource) {
            Ok(())
        } else {
            tracing::warn!(
                subject_id = %self.subject_id,
                %action,
                %resource,
                "permission denied"
            );
            Err(DomainError::forbidden(action, resource))
        }
    }
}

#[derive(Debug, Default)]
pub struct SecurityContextBuilder {
    subject_id: Option<Uuid>,
    email: Option<String>,
    role: Option<String>,
    permissions: Vec<Permission>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, id: Uuid) -> Self {
        self.subject_id = Some(id);
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    #[must_use]
    pub fn permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: Vec<Permission>) -> Self {
        self.permissions = permissions;
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id.unwrap_or_default(),
            email: self.email,
            role: self.role,
            permissions: self.permissions,
        }
    }
}
