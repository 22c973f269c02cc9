use warden_auth::ValidatedCredential;

/// Credential attached to a request by the auth middleware.
///
/// `None` for anonymous requests; whether that is acceptable is the
/// operation's role policy to decide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCredential {
    credential: Option<ValidatedCredential>,
}

impl RequestCredential {
    pub fn new(credential: Option<ValidatedCredential>) -> Self {
        Self { credential }
    }

    pub fn get(&self) -> Option<&ValidatedCredential> {
        self.credential.as_ref()
    }
}
