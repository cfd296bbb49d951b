use tokio::sync::RwLock;

use crate::domains::{Contact, ContactForm, ContactId};

use super::{ContactRepository, RepositoryError, Result};

/// Contacts kept in insertion order behind a single reader/writer lock.
#[derive(Default)]
pub struct MemoryContactRepository {
    store: RwLock<Store>,
}

#[derive(Default)]
struct Store {
    contacts: Vec<Contact>,
    last_id: u64,
}

impl Store {
    fn position(&self, id: ContactId) -> Result<usize> {
        self.contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or(RepositoryError::NotFound(id))
    }
}

fn seed() -> [Contact; 2] {
    let contact = |id, first: &str, last: &str, phone: &str, email: &str| Contact {
        id: ContactId(id),
        first: first.into(),
        last: last.into(),
        phone: phone.into(),
        email: email.into(),
    };

    [
        contact(1, "joe", "smith", "512-111-2222", "joe.smith@somewhere.com"),
        contact(2, "mary", "jones", "512-111-3333", "mary.jones@somewhere.com"),
    ]
}

impl MemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ContactRepository for MemoryContactRepository {
    async fn initialize(&self) -> Result<()> {
        let mut store = self.store.write().await;
        if store.last_id != 0 || !store.contacts.is_empty() {
            return Err(RepositoryError::AlreadyInitialized);
        }

        store.contacts.extend(seed());
        store.last_id = 2;
        tracing::debug!(count = store.contacts.len(), "seeded contacts");

        Ok(())
    }

    async fn insert(&self, contact: ContactForm) -> Result<ContactId> {
        let mut store = self.store.write().await;
        store.last_id += 1;
        let id = ContactId(store.last_id);
        store.contacts.push(contact.into_contact(id));

        Ok(id)
    }

    async fn search(&self, query: &str) -> Result<Vec<Contact>> {
        let store = self.store.read().await;
        if query.is_empty() {
            return Ok(store.contacts.clone());
        }

        Ok(store
            .contacts
            .iter()
            .filter(|c| c.matches(query))
            .cloned()
            .collect())
    }

    async fn find_one(&self, id: ContactId) -> Result<Contact> {
        let store = self.store.read().await;
        let index = store.position(id)?;

        Ok(store.contacts[index].clone())
    }

    async fn update(&self, contact: &Contact) -> Result<()> {
        let mut store = self.store.write().await;
        let index = store.position(contact.id)?;
        store.contacts[index] = contact.clone();

        Ok(())
    }

    async fn delete(&self, id: ContactId) -> Result<()> {
        let mut store = self.store.write().await;
        let index = store.position(id)?;
        store.contacts.remove(index);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn seeded() -> MemoryContactRepository {
        let repository = MemoryContactRepository::new();
        repository.initialize().await.unwrap();
        repository
    }

    fn form(first: &str, last: &str, phone: &str, email: &str) -> ContactForm {
        ContactForm {
            first: first.into(),
            last: last.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }

    fn ids(contacts: &[Contact]) -> Vec<u64> {
        contacts.iter().map(|c| c.id.0).collect()
    }

    #[tokio::test]
    async fn starts_with_seed_contacts() {
        let repository = seeded().await;
        let all = repository.search("").await.unwrap();

        assert_eq!(ids(&all), [1, 2]);
        assert_eq!(all[0].first, "joe");
        assert_eq!(all[1].email, "mary.jones@somewhere.com");
    }

    #[tokio::test]
    async fn initialize_runs_once() {
        let repository = seeded().await;
        assert_eq!(
            repository.initialize().await,
            Err(RepositoryError::AlreadyInitialized)
        );
        assert_eq!(repository.search("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_then_search_by_first_name() {
        let repository = seeded().await;
        let id = repository
            .insert(form("ann", "lee", "512-1", "a@x.com"))
            .await
            .unwrap();
        assert_eq!(id, ContactId(3));

        let found = repository.search("ann").await.unwrap();
        assert_eq!(ids(&found), [3]);
    }

    #[tokio::test]
    async fn ids_increase_and_are_never_reused() {
        let repository = seeded().await;
        let mut assigned = Vec::new();
        for n in 0..5 {
            let id = repository
                .insert(form(&format!("p{n}"), "x", "", ""))
                .await
                .unwrap();
            assigned.push(id.0);
        }
        assert_eq!(assigned, [3, 4, 5, 6, 7]);

        repository.delete(ContactId(7)).await.unwrap();
        let id = repository.insert(form("again", "", "", "")).await.unwrap();
        assert_eq!(id, ContactId(8));
    }

    #[tokio::test]
    async fn concurrent_inserts_get_distinct_ids() {
        let repository = Arc::new(seeded().await);
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let repository = Arc::clone(&repository);
                tokio::spawn(async move { repository.insert(ContactForm::default()).await })
            })
            .collect();

        let mut assigned = Vec::new();
        for task in tasks {
            assigned.push(task.await.unwrap().unwrap().0);
        }
        assigned.sort_unstable();
        assert_eq!(assigned, (3..35).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn search_is_exact_on_every_field() {
        let repository = seeded().await;

        assert_eq!(ids(&repository.search("smith").await.unwrap()), [1]);
        assert_eq!(ids(&repository.search("512-111-3333").await.unwrap()), [2]);
        assert_eq!(
            ids(&repository.search("joe.smith@somewhere.com").await.unwrap()),
            [1]
        );
        assert!(repository.search("Joe").await.unwrap().is_empty());
        assert!(repository.search("512").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn created_contact_round_trips() {
        let repository = seeded().await;
        let new = form("ann", "lee", "512-1", "a@x.com");
        let id = repository.insert(new.clone()).await.unwrap();

        let loaded = repository.find_one(id).await.unwrap();
        assert_eq!(loaded, new.into_contact(id));
    }

    #[tokio::test]
    async fn find_missing_id() {
        let repository = seeded().await;
        assert_eq!(
            repository.find_one(ContactId(99)).await,
            Err(RepositoryError::NotFound(ContactId(99)))
        );
    }

    #[tokio::test]
    async fn update_replaces_fields_in_place() {
        let repository = seeded().await;
        let mut contact = repository.find_one(ContactId(1)).await.unwrap();
        contact.apply(form(
            "joseph",
            "smith",
            "512-111-2222",
            "joe.smith@somewhere.com",
        ));
        repository.update(&contact).await.unwrap();

        let loaded = repository.find_one(ContactId(1)).await.unwrap();
        assert_eq!(loaded.first, "joseph");
        assert_eq!(loaded.id, ContactId(1));
        assert_eq!(ids(&repository.search("").await.unwrap()), [1, 2]);
    }

    #[tokio::test]
    async fn returned_contacts_are_copies() {
        let repository = seeded().await;
        let mut contact = repository.find_one(ContactId(2)).await.unwrap();
        contact.first = "changed".into();

        assert_eq!(repository.find_one(ContactId(2)).await.unwrap().first, "mary");
    }

    #[tokio::test]
    async fn missing_ids_leave_store_untouched() {
        let repository = seeded().await;
        let before = repository.search("").await.unwrap();

        let ghost = form("x", "y", "z", "w").into_contact(ContactId(42));
        assert_eq!(
            repository.update(&ghost).await,
            Err(RepositoryError::NotFound(ContactId(42)))
        );
        assert_eq!(
            repository.delete(ContactId(42)).await,
            Err(RepositoryError::NotFound(ContactId(42)))
        );

        assert_eq!(repository.search("").await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_keeps_the_others_in_order() {
        let repository = seeded().await;
        repository.insert(form("ann", "", "", "")).await.unwrap();
        repository.insert(form("bob", "", "", "")).await.unwrap();

        repository.delete(ContactId(2)).await.unwrap();
        assert_eq!(ids(&repository.search("").await.unwrap()), [1, 3, 4]);
    }

    #[tokio::test]
    async fn delete_second_seed_contact() {
        let repository = seeded().await;
        repository.delete(ContactId(2)).await.unwrap();
        assert_eq!(ids(&repository.search("").await.unwrap()), [1]);
    }
}
