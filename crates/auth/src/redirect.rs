use aulanet_shared::Role;
use std::collections::HashMap;

/// Role to panel target. A role outside the map cannot be routed and
/// sign-in refuses it.
#[derive(Clone, Debug)]
pub struct RedirectMap {
    targets: HashMap<Role, String>,
}

impl RedirectMap {
    pub fn empty() -> Self {
        Self {
            targets: HashMap::new(),
        }
    }

    pub fn set(&mut self, role: Role, target: impl Into<String>) {
        self.targets.insert(role, target.into());
    }

    pub fn target(&self, role: Role) -> Option<&str> {
        self.targets.get(&role).map(String::as_str)
    }
}

impl Default for RedirectMap {
    /// The stock panel pages.
    fn default() -> Self {
        let mut map = Self::empty();
        map.set(Role::Alumno, "/paneles/alumno.html");
        map.set(Role::Docente, "/paneles/docente.html");
        map.set(Role::Admin, "/paneles/admin.html");
        map.set(Role::Padre, "/paneles/padre.html");
        map
    }
}
