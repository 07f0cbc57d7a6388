//! HTTP client adapter.
//!
//! Implements [`HttpTransport`] over `esp_http_client`: every call opens a
//! fresh connection, writes the optional body, reads at most the caller's
//! buffer of response body, then closes.  The client's own timeout is the
//! only deadline; there are no retries.
//!
//! The simulation backend has no network and fails every request with
//! [`TransportError::Connect`].

#[cfg(not(target_os = "espidf"))]
use log::debug;

use crate::app::ports::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::TransportError;

#[cfg(target_os = "espidf")]
use crate::app::ports::HttpMethod;

#[cfg(target_os = "espidf")]
use embedded_svc::{
    http::{Method, client::Client as HttpClient},
    io::{Read, Write},
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    http::client::{Configuration as HttpClientConfiguration, EspHttpConnection},
    io::EspIOError,
    sys::{ESP_ERR_HTTP_EAGAIN, ESP_ERR_TIMEOUT, EspError},
};

const JSON: &str = "application/json";

/// Headers sent with a POST; GET requests carry none.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn post_headers<'a>(
    content_type: Option<&'a str>,
    content_length: &'a str,
) -> [(&'a str, &'a str); 2] {
    [
        ("Content-Type", content_type.unwrap_or(JSON)),
        ("Content-Length", content_length),
    ]
}

pub struct EspHttpTransport {
    timeout_ms: u32,
}

impl EspHttpTransport {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

#[cfg(target_os = "espidf")]
fn classify(e: EspError, connecting: bool) -> TransportError {
    let code = e.code();
    if code == ESP_ERR_TIMEOUT as i32 || code == ESP_ERR_HTTP_EAGAIN as i32 {
        TransportError::Timeout
    } else if connecting {
        TransportError::Connect(code)
    } else {
        TransportError::Protocol(code)
    }
}

#[cfg(target_os = "espidf")]
fn io_error(e: EspIOError) -> TransportError {
    classify(e.0, false)
}

#[cfg(target_os = "espidf")]
impl HttpTransport for EspHttpTransport {
    fn perform(
        &mut self,
        request: &HttpRequest<'_>,
        body: &mut [u8],
    ) -> Result<HttpResponse, TransportError> {
        let conf = HttpClientConfiguration {
            timeout: Some(core::time::Duration::from_millis(u64::from(self.timeout_ms))),
            ..Default::default()
        };
        let connection = EspHttpConnection::new(&conf).map_err(|e| classify(e, true))?;
        let mut client = HttpClient::wrap(connection);

        let content_length = request.body.len().to_string();
        let post = post_headers(request.content_type, &content_length);
        let (method, headers): (Method, &[(&str, &str)]) = match request.method {
            HttpMethod::Get => (Method::Get, &[]),
            HttpMethod::Post => (Method::Post, &post),
        };

        let mut req = client
            .request(method, request.url, headers)
            .map_err(|e| classify(e.0, true))?;
        if !request.body.is_empty() {
            req.write_all(request.body).map_err(io_error)?;
            req.flush().map_err(io_error)?;
        }
        let mut resp = req.submit().map_err(io_error)?;
        let status = resp.status();

        let mut filled = 0;
        while filled < body.len() {
            let n = resp.read(&mut body[filled..]).map_err(io_error)?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(HttpResponse {
            status,
            body_len: filled,
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpTransport for EspHttpTransport {
    fn perform(
        &mut self,
        request: &HttpRequest<'_>,
        _body: &mut [u8],
    ) -> Result<HttpResponse, TransportError> {
        debug!(
            "HTTP(sim): {:?} {} refused, no network",
            request.method, request.url
        );
        Err(TransportError::Connect(-1))
    }
}
