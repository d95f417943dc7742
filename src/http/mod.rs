use std::io::{BufReader, Read};

use crate::errors::{Error, Result};

pub mod server;
pub use server::*;

pub mod request;
pub use request::*;

pub mod response;
pub use response::*;

pub mod client;
pub use client::*;

const READ_BUF_SIZE: usize = 4096;

/// Body length announced by the peer, 0 when absent
fn content_length(headers: &[httparse::Header]) -> usize {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("Content-Length"))
        .and_then(|length| String::from_utf8_lossy(length.value).parse::<usize>().ok())
        .unwrap_or(0)
}

/// Copy parsed httparse headers into owned pairs
fn collect_headers(headers: &[httparse::Header]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect()
}

/// Keep reading from the stream until the announced body is complete, then
/// return the body.
///
/// This should be fine for HTTP/1.1 since requests are not meant to be sent
/// before the response from the last is received; multiplexed HTTP/2 style
/// traffic would lose data here, but nothing in this application speaks it.
fn read_body<T>(
    buf_reader: &mut BufReader<T>,
    buf_str: &mut String,
    parsed_len: usize,
    body_len: usize,
) -> Result<String>
where
    T: Sized + Read,
{
    let mut buf = [0; READ_BUF_SIZE];
    while body_len > buf_str.len() - parsed_len {
        let bytes_read = buf_reader.read(&mut buf)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        buf_str.push_str(&String::from_utf8_lossy(&buf[..bytes_read]));
    }
    Ok(buf_str[parsed_len..parsed_len + body_len].to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_simple_http_request() {
        // It may fail if started several times in a row since the OS may take
        // some time to make the port available again (or if it is already in
        // use by something else).
        static ADDR: &str = "127.0.0.1:18422";

        let handle = std::thread::spawn(|| {
            let server = HttpServer::new(ADDR);
            match server {
                Ok(s) => s.serve_once(|_| Response::ok()),
                Err(err) => eprintln!("Failed to spawn server: {}", err),
            }
        });

        let mut client = (|| {
            for _ in 1..10 {
                match HttpClient::new(ADDR) {
                    Ok(c) => return Some(c),
                    Err(err) => {
                        eprintln!("Trying to connect to {}: {}", ADDR, err);
                        std::thread::sleep(std::time::Duration::from_millis(10));
                    }
                }
            }
            None
        })()
        .expect("Failed to connect client");

        let resp = client
            .send("POST", "/", "{\"content\": \"Hello\"}")
            .expect("Failed to communicate with server");

        assert_eq!(resp.status.unwrap(), 204);

        handle.join().unwrap();
    }
}
