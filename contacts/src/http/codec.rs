use std::{fmt::Write, str::from_utf8};

use bytes::{Buf, BytesMut};
use http::{header::CONTENT_LENGTH, request::Builder, Error as HttpError, Method, Uri, Version};
use memchr::memmem;
use once_cell::sync::Lazy;
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    error::{RequestError, ResponseError},
    http::{LINE_DELIMITER, REQUEST_DELIMITER},
};

use super::{Request, Response};

static FINDER: Lazy<memmem::Finder> = Lazy::new(|| memmem::Finder::new(LINE_DELIMITER));

/// Largest body a request may declare. Form posts are a few hundred bytes.
pub const MAX_BODY_LEN: usize = 64 * 1024;

/// Frames one HTTP/1.x request per connection and writes the response back.
#[derive(Default)]
pub struct ConnectionCodec {
    /// Parsed head waiting for `usize` body bytes.
    req: Option<(Builder, usize)>,
}

impl Decoder for ConnectionCodec {
    type Item = Request;

    type Error = RequestError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (req, len) = match self.req.take() {
            Some(req) => req,
            None => {
                let Some(position) = memmem::find(&src[..], REQUEST_DELIMITER) else {
                    return Ok(None);
                };

                let head = src.split_to(position);
                let req = request_from_slice(&head)?;
                src.advance(REQUEST_DELIMITER.len());

                let content_length = req.headers_ref().and_then(|map| map.get(CONTENT_LENGTH));
                let Some(content_length) = content_length else {
                    return req.body(None).map(Some).map_err(RequestError::HttpError);
                };

                let content_length = content_length.to_str()?.trim().parse::<usize>()?;
                if content_length > MAX_BODY_LEN {
                    return Err(RequestError::BodyOverLimit {
                        declared: content_length,
                        limit: MAX_BODY_LEN,
                    });
                }

                (req, content_length)
            }
        };

        if src.len() < len {
            src.reserve((len - src.len()).min(MAX_BODY_LEN));
            self.req = Some((req, len));
            return Ok(None);
        }

        if src.len() > len {
            return Err(RequestError::BodyTooLarge {
                received: src.len(),
                declared: len,
            });
        }

        req.body(Some(src.split().freeze()))
            .map(Some)
            .map_err(RequestError::HttpError)
    }
}

#[inline]
fn request_from_slice(buf: &[u8]) -> Result<Builder, RequestError> {
    let mut buf = from_utf8(buf)?;
    let mut request_line = split_to_delimiter(&mut buf)?;

    // request line = "METHOD PATH HTTP/VERSION\r\n"
    let method = split_to_byte(&mut request_line, b' ')?;
    let path = split_to_byte(&mut request_line, b' ')?;
    let version = request_line;

    let mut builder = http::Request::builder()
        .method(Method::try_from(method).map_err(HttpError::from)?)
        .uri(Uri::try_from(path).map_err(HttpError::from)?)
        .version(match version {
            "HTTP/1.0" => Version::HTTP_10,
            "HTTP/1.1" => Version::HTTP_11,
            _ => return Err(RequestError::UnsupportedVersion),
        });

    // header = "Name: Value\r\n"
    while let Ok(mut header) = split_to_delimiter(&mut buf) {
        let key = split_to_byte(&mut header, b':')?;
        builder = builder.header(key, header.trim());
    }

    Ok(builder)
}

#[inline]
fn split_to_byte<'a>(buf: &mut &'a str, byte: u8) -> Result<&'a str, RequestError> {
    memchr::memchr(byte, buf.as_bytes())
        .map(|e| {
            let part = &buf[..e];
            *buf = &buf[e + 1..];
            part
        })
        .ok_or(RequestError::InvalidFormat)
}

#[inline]
fn split_to_delimiter<'a>(buf: &mut &'a str) -> Result<&'a str, RequestError> {
    if buf.is_empty() {
        return Err(RequestError::InvalidFormat);
    }

    match FINDER.find(buf.as_bytes()) {
        Some(pos) => {
            let part = &buf[..pos];
            *buf = &buf[pos + LINE_DELIMITER.len()..];
            Ok(part)
        }
        None => {
            let part = *buf;
            *buf = "";
            Ok(part)
        }
    }
}

impl Encoder<Response> for ConnectionCodec {
    type Error = ResponseError;

    fn encode(&mut self, response: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let status = response.status();
        write!(
            dst,
            "{:?} {} {}\r\n",
            response.version(),
            status.as_str(),
            status.canonical_reason().unwrap_or_default()
        )?;

        for (key, value) in response.headers() {
            let value = value.to_str()?;
            write!(dst, "{key}: {value}\r\n")?;
        }

        if response.headers().get(CONTENT_LENGTH).is_none() {
            let len = response.body().as_ref().map(|b| b.len()).unwrap_or_default();
            write!(dst, "{CONTENT_LENGTH}: {len}\r\n")?;
        }

        dst.extend_from_slice(LINE_DELIMITER);

        if let Some(body) = response.body() {
            dst.extend_from_slice(body);
        }

        Ok(())
    }
}
