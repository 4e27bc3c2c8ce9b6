use std::collections::{BTreeSet, HashMap};

use lombok::AllArgsConstructor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    /// Create and edit recipes, including their ingredient rows.
    ChangeRecipe,
    DeleteRecipe,
}

impl Permission {
    pub fn code(&self) -> &'static str {
        match self {
            Permission::ChangeRecipe => "recipes.change_recipe",
            Permission::DeleteRecipe => "recipes.delete_recipe",
        }
    }
}

/// The acting user of a request. Anonymous principals hold no permissions.
#[derive(AllArgsConstructor, Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub name: Option<String>,
    pub permissions: BTreeSet<Permission>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn has_perm(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Maps principal names to the permissions they were granted.
#[derive(Debug, Clone, Default)]
pub struct Grants {
    inner: HashMap<String, BTreeSet<Permission>>,
}

impl Grants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editors may create and change recipes; admins may also delete them.
    pub fn from_roles<E, A>(editors: E, admins: A) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        let mut grants = Self::new();
        for editor in editors {
            grants.grant(editor.as_ref(), Permission::ChangeRecipe);
        }
        for admin in admins {
            grants.grant(admin.as_ref(), Permission::ChangeRecipe);
            grants.grant(admin.as_ref(), Permission::DeleteRecipe);
        }
        grants
    }

    pub fn grant(&mut self, name: &str, permission: Permission) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.inner
            .entry(name.to_owned())
            .or_default()
            .insert(permission);
    }

    pub fn principal(&self, name: Option<&str>) -> Principal {
        let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) else {
            return Principal::anonymous();
        };

        Principal::new(
            Some(name.to_owned()),
            self.inner.get(name).cloned().unwrap_or_default(),
        )
    }
}
