pub mod memory;

use crate::{
    domains::{Contact, ContactForm, ContactId},
    error::RepositoryError,
};

pub type Result<T, E = RepositoryError> = std::result::Result<T, E>;

#[async_trait::async_trait]
pub trait ContactRepository {
    /// Loads the seed contacts. Fails if called more than once.
    async fn initialize(&self) -> Result<()>;
    async fn insert(&self, contact: ContactForm) -> Result<ContactId>;
    /// An empty query returns every contact in storage order.
    async fn search(&self, query: &str) -> Result<Vec<Contact>>;
    async fn find_one(&self, id: ContactId) -> Result<Contact>;
    async fn update(&self, contact: &Contact) -> Result<()>;
    async fn delete(&self, id: ContactId) -> Result<()>;
}
