use std::{fmt, str::FromStr};

use crate::error::InvalidId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactId(pub u64);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ContactId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(ContactId)
            .map_err(|source| InvalidId {
                token: s.to_owned(),
                source,
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub first: String,
    pub last: String,
    pub phone: String,
    pub email: String,
}

impl Contact {
    /// Replaces every field but the id.
    pub fn apply(&mut self, form: ContactForm) {
        self.first = form.first;
        self.last = form.last;
        self.phone = form.phone;
        self.email = form.email;
    }

    pub fn matches(&self, query: &str) -> bool {
        query == self.first || query == self.last || query == self.phone || query == self.email
    }
}

/// The user-editable part of a contact, before an id is assigned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub first: String,
    pub last: String,
    pub phone: String,
    pub email: String,
}

impl ContactForm {
    /// Field names posted by the new and edit forms.
    const BODY_KEYS: [&'static str; 4] = ["first_name", "last_name", "phone", "email"];
    /// Field names accepted as prefill on the new-contact form.
    const PREFILL_KEYS: [&'static str; 4] = ["first", "last", "phone", "email"];

    pub fn from_body(body: &[u8]) -> Self {
        Self::from_pairs(body, Self::BODY_KEYS)
    }

    pub fn from_prefill(query: Option<&str>) -> Self {
        Self::from_pairs(query.unwrap_or_default().as_bytes(), Self::PREFILL_KEYS)
    }

    pub fn into_contact(self, id: ContactId) -> Contact {
        Contact {
            id,
            first: self.first,
            last: self.last,
            phone: self.phone,
            email: self.email,
        }
    }

    fn from_pairs(input: &[u8], [first, last, phone, email]: [&str; 4]) -> Self {
        let mut form = Self::default();
        for (key, value) in url::form_urlencoded::parse(input) {
            let slot = match &*key {
                k if k == first => &mut form.first,
                k if k == last => &mut form.last,
                k if k == phone => &mut form.phone,
                k if k == email => &mut form.email,
                _ => continue,
            };
            // first non-empty value wins
            if slot.is_empty() {
                *slot = value.into_owned();
            }
        }
        form
    }
}

/// Reads a single query parameter, decoded.
pub fn query_param(query: Option<&str>, name: &str) -> String {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()))
        .and_then(|mut pairs| pairs.find(|(key, _)| key == name))
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
