use askama::Template;
use http::{Method, StatusCode};

use crate::{
    domains::{query_param, ContactForm, ContactId},
    http::{Html, IntoResponse, Redirect, Request, Response},
    views, AppState,
};

pub async fn route_request(request: Request, app_state: AppState) -> Response {
    macro_rules! routes {
        (@match $path:ident, $p:literal, $v:ident) => { $path.strip_prefix($p) };
        (@match $path:ident, $p:literal) => {
            ($path.trim_end_matches('/') == $p.trim_end_matches('/')).then_some("")
        };
        (@nested $v:ident) => { true };
        (@nested) => { false };
        (
            $($m:ident $p:literal $($v:ident)? => $f:expr),*
            $(, _ => $wc:expr)?
        ) => {
            const ROUTES: &[Route] = &[$(Route {
                method: stringify!($m),
                path: $p,
                nested: routes!(@nested $($v)?),
            }),*];

            let path = request.uri().path();
            $(if request.method() == Method::$m {
                if let Some(_rest) = routes!(@match path, $p $(, $v)?) {
                    $(let $v = _rest;)?
                    return $f;
                }
            })*
            $(return $wc;)?
        };
    }

    routes!(
        GET "/" => Redirect("/contacts").into_response(),
        GET "/contacts" => search_contacts(app_state, &request).await,
        GET "/contacts/new" => new_contact_form(&request),
        POST "/contacts/new" => create_contact(app_state, request).await,
        GET "/contacts/view/" id => view_contact(app_state, id).await,
        GET "/contacts/edit/" id => edit_contact_form(app_state, id).await,
        POST "/contacts/edit/" id => edit_contact(app_state, id, &request).await,
        POST "/contacts/delete/" id => delete_contact(app_state, id).await,
        _ => fallback(&request, ROUTES)
    );
}

/// One entry of the route table; `nested` routes take an id segment.
struct Route {
    method: &'static str,
    path: &'static str,
    nested: bool,
}

impl Route {
    fn base(&self) -> &'static str {
        match self.path.trim_end_matches('/') {
            "" => "/",
            base => base,
        }
    }

    fn covers(&self, path: &str) -> bool {
        let trimmed = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        trimmed == self.base() || (self.nested && path.starts_with(self.path))
    }
}

/// Picks the error for requests no route accepted.
fn fallback(request: &Request, routes: &[Route]) -> Response {
    let path = request.uri().path();
    let method = request.method().as_str();

    let known: Vec<&Route> = routes.iter().filter(|r| r.covers(path)).collect();
    if let Some(route) = known.first() {
        if !known.iter().any(|r| r.method == method) {
            let mut methods: Vec<&str> = known.iter().map(|r| r.method).collect();
            methods.dedup();
            return user_error(format!(
                "Must use {} for {}",
                methods.join(" or "),
                route.base()
            ));
        }

        if route.nested {
            let base = route.base();
            let action = base.rsplit('/').next().unwrap_or(base);
            return user_error(missing_id(&capitalize(action), base));
        }
    }

    tracing::debug!(method, path, "unknown route");
    let mut response = user_error(format!("Unknown route {method} {path}"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn missing_id(action: &str, path: &str) -> String {
    format!("{action} requires an id like {path}/CONTACT_ID")
}

async fn search_contacts(app_state: AppState, request: &Request) -> Response {
    let query = query_param(request.uri().query(), "q");

    match app_state.repository.search(&query).await {
        Ok(contacts) => page(&views::ContactsView {
            contacts: &contacts,
            query: &query,
        }),
        Err(err) => user_error(format!("Error searching contacts: {err}")),
    }
}

fn new_contact_form(request: &Request) -> Response {
    let form = ContactForm::from_prefill(request.uri().query());
    page(&views::NewContactView { form: &form })
}

async fn create_contact(app_state: AppState, request: Request) -> Response {
    let form = form_body(&request);

    match app_state.repository.insert(form.clone()).await {
        Ok(id) => {
            tracing::info!(%id, "created contact");
            let contact = form.into_contact(id);
            page(&views::ContactCreatedView { contact: &contact })
        }
        Err(err) => user_error(format!("Error creating new contact: {err}")),
    }
}

async fn view_contact(app_state: AppState, id: &str) -> Response {
    if id.is_empty() {
        return user_error(missing_id("View", "/contacts/view"));
    }

    let id = match id.parse::<ContactId>() {
        Ok(id) => id,
        Err(err) => return user_error(format!("contact ID error: {err}")),
    };

    match app_state.repository.find_one(id).await {
        Ok(contact) => page(&views::ViewContactView { contact: &contact }),
        Err(err) => user_error(format!("contact ID error: {err}")),
    }
}

async fn edit_contact_form(app_state: AppState, id: &str) -> Response {
    if id.is_empty() {
        return user_error(missing_id("Edit", "/contacts/edit"));
    }

    let id = match id.parse::<ContactId>() {
        Ok(id) => id,
        Err(err) => return user_error(format!("Error with contact ID: {err}")),
    };

    match app_state.repository.find_one(id).await {
        Ok(contact) => page(&views::EditContactView { contact: &contact }),
        Err(err) => user_error(format!("Error with contact ID: {err}")),
    }
}

async fn edit_contact(app_state: AppState, id: &str, request: &Request) -> Response {
    if id.is_empty() {
        return user_error(missing_id("Edit", "/contacts/edit"));
    }

    let id = match id.parse::<ContactId>() {
        Ok(id) => id,
        Err(err) => return user_error(format!("Error with contact ID: {err}")),
    };

    let mut contact = match app_state.repository.find_one(id).await {
        Ok(contact) => contact,
        Err(err) => return user_error(format!("Error with contact ID: {err}")),
    };

    contact.apply(form_body(request));
    match app_state.repository.update(&contact).await {
        Ok(()) => {
            tracing::info!(%id, "edited contact");
            page(&views::ContactEditedView { contact: &contact })
        }
        Err(err) => user_error(format!("Error: {err}")),
    }
}

async fn delete_contact(app_state: AppState, id: &str) -> Response {
    if id.is_empty() {
        return user_error(missing_id("Delete", "/contacts/delete"));
    }

    let id = match id.parse::<ContactId>() {
        Ok(id) => id,
        Err(err) => return user_error(format!("Error in contact ID: {err}")),
    };

    let contact = match app_state.repository.find_one(id).await {
        Ok(contact) => contact,
        Err(err) => return user_error(format!("Error in contact ID: {err}")),
    };

    match app_state.repository.delete(id).await {
        Ok(()) => {
            tracing::info!(%id, "deleted contact");
            page(&views::ContactDeletedView { contact: &contact })
        }
        Err(err) => user_error(format!("Error deleting contact: {err}")),
    }
}

fn form_body(request: &Request) -> ContactForm {
    ContactForm::from_body(request.body().as_deref().unwrap_or_default())
}

/// Renders a page; a failed render costs this request a 500, not the server.
fn page<V: Template>(view: &V) -> Response {
    match view.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!(%err, "failed to render view");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error rendering page").into_response()
        }
    }
}

fn user_error(message: impl Into<String>) -> Response {
    let view = views::ErrorView {
        message: message.into(),
    };
    tracing::warn!(message = %view.message, "user error");
    page(&view)
}
