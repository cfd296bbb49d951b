use std::{fmt, io, num::ParseIntError, str::Utf8Error};

use http::header::ToStrError;

use crate::domains::ContactId;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request is not valid utf-8: {0}")]
    Utf8(#[from] Utf8Error),
    #[error("malformed request head")]
    InvalidFormat,
    #[error("unsupported http version")]
    UnsupportedVersion,
    #[error(transparent)]
    HttpError(#[from] http::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] ToStrError),
    #[error("invalid content length: {0}")]
    InvalidContentLength(#[from] ParseIntError),
    #[error("client sent a body larger than reported ({received} > {declared})")]
    BodyTooLarge { received: usize, declared: usize },
    #[error("declared body of {declared} bytes exceeds the {limit} byte limit")]
    BodyOverLimit { declared: usize, limit: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("failed to format response head")]
    Fmt(#[from] fmt::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] ToStrError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Contact with ID {0} not found")]
    NotFound(ContactId),
    #[error("contacts were already loaded")]
    AlreadyInitialized,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid contact ID {token:?}: {source}")]
pub struct InvalidId {
    pub token: String,
    pub source: ParseIntError,
}
