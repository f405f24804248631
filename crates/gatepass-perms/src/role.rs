//! Roles and callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PermsError;

/// The closed set of operator roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control: generation, assignment, pricing, resets, ledger writes.
    MainAdmin,
    /// Desk helper. Read access only.
    SubAdmin,
    /// Gate device or volunteer.
    Scanner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MainAdmin => "main_admin",
            Role::SubAdmin => "sub_admin",
            Role::Scanner => "scanner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PermsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "main_admin" => Ok(Role::MainAdmin),
            "sub_admin" => Ok(Role::SubAdmin),
            "scanner" => Ok(Role::Scanner),
            other => Err(PermsError::UnknownRole(other.to_string())),
        }
    }
}

/// Who is making a request, as established by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "role", rename_all = "snake_case")]
pub enum Caller {
    Anonymous,
    Authenticated(Role),
}

impl Caller {
    pub fn main_admin() -> Self {
        Caller::Authenticated(Role::MainAdmin)
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(role) => Some(*role),
        }
    }

    /// Build a caller from an optional role name, as decoded from a
    /// credential. `None` means the request carried no credential.
    pub fn from_role_name(name: Option<&str>) -> Result<Self, PermsError> {
        match name {
            None => Ok(Caller::Anonymous),
            Some(name) => name.parse().map(Caller::Authenticated),
        }
    }
}

impl From<Role> for Caller {
    fn from(role: Role) -> Self {
        Caller::Authenticated(role)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Anonymous => f.write_str("anonymous"),
            Caller::Authenticated(role) => write!(f, "{}", role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip_names() {
        for role in [Role::MainAdmin, Role::SubAdmin, Role::Scanner] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!(
            "admin".parse::<Role>(),
            Err(PermsError::UnknownRole("admin".into()))
        );
    }

    #[test]
    fn test_caller_from_role_name() {
        assert_eq!(Caller::from_role_name(None).unwrap(), Caller::Anonymous);
        assert_eq!(
            Caller::from_role_name(Some("scanner")).unwrap(),
            Caller::Authenticated(Role::Scanner)
        );
        assert!(Caller::from_role_name(Some("root")).is_err());
    }

    #[test]
    fn test_caller_serde() {
        let json = serde_json::to_string(&Caller::main_admin()).unwrap();
        assert_eq!(json, r#"{"kind":"authenticated","role":"main_admin"}"#);
        let back: Caller = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Caller::main_admin());

        let anon: Caller = serde_json::from_str(r#"{"kind":"anonymous"}"#).unwrap();
        assert_eq!(anon, Caller::Anonymous);
    }
}
