use std::io::{BufReader, Read};

use serde::Serialize;

use crate::api::ErrorBody;
use crate::errors::{Error, Result};
use crate::http::{collect_headers, content_length, read_body, READ_BUF_SIZE};

/// An HTTP response to be sent to a client
#[derive(Debug)]
pub struct Response {
    /// Status code of the response. Optional because that's what httparse
    /// returns, but it shouldn't happen in practice since we control the
    /// responses.
    pub status: Option<u16>,
    /// Headers for the response. It is not necessary to add Content-Length to
    /// it, this is done automatically on serialization.
    pub headers: Vec<(String, String)>,
    /// Body of the response. Give an empty string for an empty body
    pub body: String,
}

impl Response {
    /// Creates an empty OK response (204)
    pub fn ok() -> Response {
        Response {
            status: Some(204),
            headers: vec![],
            body: "".to_string(),
        }
    }

    /// Creates an OK (200) response with the given body
    pub fn ok_with_body(str: String) -> Response {
        Response {
            status: Some(200),
            headers: vec![],
            body: str,
        }
    }

    /// Creates a response with the given status and a JSON body
    pub fn json<T: Serialize>(status: u16, body: &T) -> Result<Response> {
        Ok(Response {
            status: Some(status),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: serde_json::to_string(body)
                .map_err(|err| Error::Persistence(format!("response serialization: {}", err)))?,
        })
    }

    /// Turn an error into the response the client should see.
    ///
    /// Validation and not-found errors carry their message verbatim; anything
    /// else is logged here and reported as a generic internal error so no
    /// storage detail leaks out.
    pub fn from_error(err: &Error) -> Response {
        let status = err.status_code();
        let message = if status == 500 {
            tracing::error!(error = %err, "internal error while handling request");
            "Internal server error".to_string()
        } else {
            err.to_string()
        };
        let body = serde_json::to_string(&ErrorBody { error: message })
            .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());
        Response {
            status: Some(status),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }
}

/// Parse an HTTP response from a byte stream.
///
/// Reads until the head parses completely, then hands over to the shared body
/// reader for the remaining Content-Length bytes.
pub fn parse_response<T>(mut buf_reader: BufReader<T>) -> Result<Response>
where
    T: Sized + Read,
{
    let mut buf = [0; READ_BUF_SIZE];
    let mut buf_str = String::new();

    let (body_len, parsed_len, mut response) = loop {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut resp = httparse::Response::new(&mut headers);
        let bytes_read = buf_reader.read(&mut buf)?;

        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }

        buf_str.push_str(&String::from_utf8_lossy(&buf[..bytes_read]));

        match resp.parse(buf_str.as_bytes()) {
            Ok(httparse::Status::Complete(parsed_len)) => {
                break (
                    content_length(resp.headers),
                    parsed_len,
                    Response {
                        status: resp.code,
                        headers: collect_headers(resp.headers),
                        body: "".to_string(),
                    },
                );
            }
            Ok(httparse::Status::Partial) => continue,
            Err(err) => return Err(err.into()),
        }
    };

    response.body = read_body(&mut buf_reader, &mut buf_str, parsed_len, body_len)?;
    Ok(response)
}
