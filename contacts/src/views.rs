//! Pages rendered from `templates/`. Every page extends `base.html`, which
//! carries the shared header and footer; askama checks each struct's fields
//! against its template when the crate is built and escapes them as HTML.

use askama::Template;

use crate::domains::{Contact, ContactForm};

#[derive(Template)]
#[template(path = "contacts.html")]
pub struct ContactsView<'a> {
    pub contacts: &'a [Contact],
    pub query: &'a str,
}

#[derive(Template)]
#[template(path = "new_contact.html")]
pub struct NewContactView<'a> {
    pub form: &'a ContactForm,
}

#[derive(Template)]
#[template(path = "view_contact.html")]
pub struct ViewContactView<'a> {
    pub contact: &'a Contact,
}

#[derive(Template)]
#[template(path = "edit_contact.html")]
pub struct EditContactView<'a> {
    pub contact: &'a Contact,
}

#[derive(Template)]
#[template(path = "contact_created.html")]
pub struct ContactCreatedView<'a> {
    pub contact: &'a Contact,
}

#[derive(Template)]
#[template(path = "contact_edited.html")]
pub struct ContactEditedView<'a> {
    pub contact: &'a Contact,
}

#[derive(Template)]
#[template(path = "contact_deleted.html")]
pub struct ContactDeletedView<'a> {
    pub contact: &'a Contact,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorView {
    pub message: String,
}
