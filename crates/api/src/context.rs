use dentiva_auth::Principal;

/// Authenticated-caller context for a request.
///
/// Present on every route behind the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn subject(&self) -> &str {
        &self.principal.subject
    }

    pub fn email(&self) -> &str {
        &self.principal.email
    }
}
