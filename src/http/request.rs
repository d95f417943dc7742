use std::io::{BufReader, Read};

use crate::errors::{Error, Result};
use crate::http::{collect_headers, content_length, read_body, READ_BUF_SIZE};

/// Represents an HTTP request.
#[derive(Debug)]
pub struct Request {
    /// The HTTP method used in the request
    pub method: String,
    /// The full path of the request, query string included
    pub path: String,
    /// Headers of the request
    pub headers: Vec<(String, String)>,
    /// Body of the request
    pub body: String,
}

impl Request {
    /// Create a new GET request for the given path, with an empty body
    pub fn get(path: &str) -> Request {
        Request {
            method: "GET".to_string(),
            body: "".to_string(),
            headers: vec![],
            path: path.to_string(),
        }
    }

    /// Create a new POST request for the given path, with the given body
    pub fn post(path: &str, body: String) -> Request {
        Request {
            method: "POST".to_string(),
            body,
            headers: vec![],
            path: path.to_string(),
        }
    }

    /// Create a new PATCH request for the given path, with the given body
    pub fn patch(path: &str, body: String) -> Request {
        Request {
            method: "PATCH".to_string(),
            body,
            headers: vec![],
            path: path.to_string(),
        }
    }
}

/// Parse an HTTP request from a byte stream.
///
/// Reads until the head parses completely, then hands over to the shared body
/// reader for the remaining Content-Length bytes.
pub fn parse_request<T>(mut buf_reader: BufReader<T>) -> Result<Request>
where
    T: Sized + Read,
{
    let mut buf = [0; READ_BUF_SIZE];
    let mut buf_str = String::new();

    let (body_len, parsed_len, mut request) = loop {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut req = httparse::Request::new(&mut headers);
        let bytes_read = buf_reader.read(&mut buf)?;

        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }

        buf_str.push_str(&String::from_utf8_lossy(&buf[..bytes_read]));

        match req.parse(buf_str.as_bytes()) {
            Ok(httparse::Status::Complete(parsed_len)) => {
                break (
                    content_length(req.headers),
                    parsed_len,
                    Request {
                        method: req.method.unwrap_or("GET").to_string(),
                        path: req.path.unwrap_or("/").to_string(),
                        headers: collect_headers(req.headers),
                        body: "".to_string(),
                    },
                );
            }
            Ok(httparse::Status::Partial) => continue,
            Err(err) => return Err(err.into()),
        }
    };

    request.body = read_body(&mut buf_reader, &mut buf_str, parsed_len, body_len)?;
    Ok(request)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_parse_simple_request() {
        let req_str = b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*\r\n\r\n";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_request(buf_reader).unwrap();

        assert_eq!(parsed_req.method, "GET");
        assert_eq!(parsed_req.path, "/");
        assert_eq!(parsed_req.headers.len(), 3);
        assert_eq!(parsed_req.body, "");
    }

    #[test]
    fn test_parse_incomplete_request() {
        let req_str =
            b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_request(buf_reader);

        assert!(parsed_req.is_err());
    }

    #[test]
    fn test_parse_request_with_body() {
        let body = "{ \"content\": \"Hello, world!\" }";
        let req_str = format!(
            "POST /orders HTTP/1.1\r\nHost: localhost:8080\r\nAccept: */*\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );

        let buf_reader = BufReader::new(req_str.as_bytes());

        let parsed_req = parse_request(buf_reader).unwrap();

        assert_eq!(parsed_req.method, "POST");
        assert_eq!(parsed_req.path, "/orders");
        assert_eq!(parsed_req.headers.len(), 3);
        assert_eq!(parsed_req.body, body);
    }

    #[test]
    fn test_parse_request_keeps_query_string() {
        let req_str = b"GET /orders?phone=0123456789 HTTP/1.1\r\n\r\n";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_request(buf_reader).unwrap();
        assert_eq!(parsed_req.path, "/orders?phone=0123456789");
    }

    #[test]
    fn test_parse_request_with_large_body_and_header() {
        let mut rng = rand::thread_rng();
        let mut buffer = [0; 40960];
        for c in buffer.iter_mut() {
            *c = rng.gen_range(b'a'..=b'z')
        }
        let body = String::from_utf8_lossy(&buffer).to_string();
        let mut buffer = [0; 40960];
        for c in buffer.iter_mut() {
            *c = rng.gen_range(b'a'..=b'z')
        }
        let x_test_header = String::from_utf8_lossy(&buffer).to_string();

        let req_str = format!(
            "POST / HTTP/1.1\r\nContent-Length: {}\r\nX-TEST: {}\r\n\r\n{}",
            body.len(),
            x_test_header,
            body
        );

        let buf_reader = BufReader::new(req_str.as_bytes());
        let parsed_req = parse_request(buf_reader).unwrap();

        assert_eq!(parsed_req.method, "POST");
        assert_eq!(parsed_req.headers.len(), 2);
        assert_eq!(parsed_req.body, body);
        let x_test = parsed_req
            .headers
            .iter()
            .find(|(k, _)| k == "X-TEST")
            .unwrap();
        assert_eq!(x_test.1, x_test_header);
    }
}
