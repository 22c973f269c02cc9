//! Read-only user lookups (public, not audited).

use warden_auth::{UserStore, UserView};
use warden_core::{Email, UserId};

use crate::pipeline::PipelineError;

#[derive(Debug, Clone)]
pub struct UserDirectory<U> {
    users: U,
    page_limit: usize,
}

impl<U> UserDirectory<U> {
    pub fn new(users: U, page_limit: usize) -> Self {
        Self { users, page_limit }
    }

    pub fn page_limit(&self) -> usize {
        self.page_limit
    }
}

impl<U> UserDirectory<U>
where
    U: UserStore,
{
    /// One page of users in creation order. Missing `limit` uses the
    /// configured page size.
    pub async fn list(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<UserView>, PipelineError> {
        let limit = limit.unwrap_or(self.page_limit);
        let offset = offset.unwrap_or(0);
        let users = self.users.list(limit, offset).await?;
        Ok(users.iter().map(UserView::from).collect())
    }

    /// Look a user up by id, or by email when the term is not an id.
    pub async fn find(&self, term: &str) -> Result<UserView, PipelineError> {
        let found = if let Ok(id) = term.parse::<UserId>() {
            self.users.find_by_id(id).await?
        } else if let Ok(email) = Email::parse(term) {
            self.users.find_by_email(&email).await?
        } else {
            None
        };

        found
            .as_ref()
            .map(UserView::from)
            .ok_or_else(|| PipelineError::not_found(term.trim()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use warden_auth::{NewUser, PasswordHash, Role};

    use super::*;
    use crate::user_store::InMemoryUserStore;

    async fn directory_with(n: usize) -> (UserDirectory<Arc<InMemoryUserStore>>, Vec<UserId>) {
        let store = Arc::new(InMemoryUserStore::new());
        let mut ids = Vec::new();
        for i in 0..n {
            let user = store
                .create(NewUser {
                    id: UserId::new(),
                    name: format!("User{i}"),
                    lastname: "Test".to_string(),
                    email: Email::parse(&format!("user{i}@example.com")).unwrap(),
                    password_hash: PasswordHash::from_phc("$argon2id$stub"),
                    roles: vec![Role::USER],
                    is_active: true,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        (UserDirectory::new(store, 3), ids)
    }

    #[tokio::test]
    async fn list_uses_configured_page_limit() {
        let (directory, ids) = directory_with(5).await;

        let first = directory.list(None, None).await.unwrap();
        assert_eq!(first.iter().map(|u| u.id).collect::<Vec<_>>(), ids[..3].to_vec());

        let rest = directory.list(Some(10), Some(3)).await.unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[tokio::test]
    async fn find_by_id_or_email() {
        let (directory, ids) = directory_with(2).await;

        let by_id = directory.find(&ids[1].to_string()).await.unwrap();
        assert_eq!(by_id.email.as_str(), "user1@example.com");

        let by_email = directory.find(" USER0@example.com ").await.unwrap();
        assert_eq!(by_email.id, ids[0]);
    }

    #[tokio::test]
    async fn unknown_term_is_not_found() {
        let (directory, _) = directory_with(1).await;

        let err = directory.find("nobody@example.com").await.unwrap_err();
        assert_eq!(err.reason_code(), "not_found");
        assert_eq!(err.to_string(), "failed: user nobody@example.com not found");

        assert_eq!(directory.find("not an email").await.unwrap_err().reason_code(), "not_found");
    }
}
