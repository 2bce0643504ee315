use std::borrow::Cow;
use std::fmt;

/// Logical identity selecting which connection pool and credentials a call uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Back-office access: tokens, users, reporting.
    pub const ADMIN: Role = Role::from_static("admin");
    /// Driver-facing access: shifts and vehicle status.
    pub const DRIVER: Role = Role::from_static("driver");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Role {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::Role;
    use std::collections::HashMap;

    #[test]
    fn static_and_owned_roles_are_equal() {
        assert_eq!(Role::ADMIN, Role::new("admin"));
        let mut map = HashMap::new();
        map.insert(Role::new("driver"), 1);
        assert_eq!(map.get(&Role::DRIVER), Some(&1));
    }
}
