// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal IPP (Internet Printing Protocol, RFC 8010/8011) client: just
//! enough of the binary encoding to issue Get-Printer-Attributes and parse
//! the reply. Treated as an in-tree library boundary — no `ipp` crate exists
//! in the reference corpus, and the upstream project implements this itself
//! too.

use std::time::Duration;

use anyhow::{bail, Context};
use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

const IPP_VERSION: u16 = 0x0101;
const OP_GET_PRINTER_ATTRIBUTES: u16 = 0x000b;

// Delimiter tags (RFC 8010 §3.5.1).
const TAG_OPERATION_ATTRIBUTES: u8 = 0x01;
const TAG_JOB_ATTRIBUTES: u8 = 0x02;
const TAG_END_OF_ATTRIBUTES: u8 = 0x03;
const TAG_PRINTER_ATTRIBUTES: u8 = 0x04;
const TAG_UNSUPPORTED_ATTRIBUTES: u8 = 0x05;

// Value tags used by the attributes we read.
const TAG_ENUM: u8 = 0x23;
const TAG_CHARSET: u8 = 0x47;
const TAG_NATURAL_LANGUAGE: u8 = 0x48;
const TAG_URI: u8 = 0x45;
const TAG_KEYWORD: u8 = 0x44;

const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(90);

/// Attributes extracted from the first `printer-attributes-group` in a
/// Get-Printer-Attributes response.
#[derive(Debug, Default, Clone)]
pub struct PrinterAttributes {
    pub name: Option<String>,
    pub make_model: Option<String>,
    pub info: Option<String>,
    pub state: Option<String>,
}

/// Outcome of probing one IPP endpoint.
pub enum ProbeOutcome {
    /// The printer answered with an authentication challenge.
    AuthRequired,
    /// The printer answered with attributes.
    Attributes(PrinterAttributes),
}

/// Map an IPP `printer-state` enum value to its textual name (RFC 8011 §5.4.12).
fn printer_state_text(code: i32) -> &'static str {
    match code {
        3 => "idle",
        4 => "processing",
        5 => "stopped",
        _ => "unknown",
    }
}

/// A narrow client bound to one host/port/TLS combination.
pub struct IppClient {
    host: String,
    port: u16,
    tls: bool,
}

impl IppClient {
    pub fn new(host: impl Into<String>, port: u16, tls: bool) -> Self {
        Self { host: host.into(), port, tls }
    }

    /// Issue Get-Printer-Attributes against `path` and parse the response.
    /// A non-auth failure (connection reset, malformed response, non-2xx
    /// status) is returned as `Err`; callers fall back to the next endpoint.
    pub async fn get_printer_attributes(&self, path: &str) -> anyhow::Result<ProbeOutcome> {
        let scheme = if self.tls { "ipps" } else { "ipp" };
        let uri = format!("{scheme}://{}:{}{path}", self.host, self.port);
        let body = build_request(&uri);

        let request = format!(
            "POST {path} HTTP/1.1\r\n\
             Host: {host}:{port}\r\n\
             Content-Type: application/ipp\r\n\
             Content-Length: {len}\r\n\
             Connection: close\r\n\r\n",
            path = path,
            host = self.host,
            port = self.port,
            len = body.len(),
        );

        let response = timeout(HEADER_READ_TIMEOUT, self.roundtrip(request.as_bytes(), &body))
            .await
            .context("timed out waiting for printer response")??;

        if response.status == 401 {
            return Ok(ProbeOutcome::AuthRequired);
        }
        if !(200..300).contains(&response.status) {
            bail!("printer responded with HTTP {}", response.status);
        }

        parse_attributes(&response.body).map(ProbeOutcome::Attributes)
    }

    async fn roundtrip(&self, head: &[u8], body: &[u8]) -> anyhow::Result<HttpResponse> {
        if self.tls {
            let stream = TcpStream::connect((self.host.as_str(), self.port))
                .await
                .context("TCP connect failed")?;
            let connector = tls_connector()?;
            let server_name = rustls::pki_types::ServerName::try_from(self.host.clone())
                .context("invalid host name for TLS")?;
            let mut tls_stream = connector.connect(server_name, stream).await.context("TLS handshake failed")?;
            tls_stream.write_all(head).await?;
            tls_stream.write_all(body).await?;
            read_http_response(tls_stream).await
        } else {
            let mut stream = TcpStream::connect((self.host.as_str(), self.port))
                .await
                .context("TCP connect failed")?;
            stream.write_all(head).await?;
            stream.write_all(body).await?;
            read_http_response(stream).await
        }
    }
}

fn tls_connector() -> anyhow::Result<tokio_rustls::TlsConnector> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().certs {
        let _ = roots.add(cert);
    }
    let config = rustls::ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();
    Ok(tokio_rustls::TlsConnector::from(std::sync::Arc::new(config)))
}

struct HttpResponse {
    status: u16,
    body: Vec<u8>,
}

async fn read_http_response<S>(stream: S) -> anyhow::Result<HttpResponse>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(stream);

    let mut status_line = String::new();
    reader.read_line(&mut status_line).await.context("failed to read status line")?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .context("malformed HTTP status line")?;

    let mut content_length: Option<usize> = None;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await.context("failed to read response headers")?;
        if n == 0 || line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().ok();
            } else if name.eq_ignore_ascii_case("transfer-encoding")
                && value.eq_ignore_ascii_case("chunked")
            {
                chunked = true;
            }
        }
    }

    let body = if chunked {
        read_chunked_body(&mut reader).await.context("failed to read chunked response body")?
    } else {
        let mut body = Vec::new();
        match content_length {
            Some(len) => {
                body.resize(len, 0);
                reader.read_exact(&mut body).await.context("short read on response body")?;
            }
            None => {
                reader.read_to_end(&mut body).await.context("failed to read response body")?;
            }
        }
        body
    };

    Ok(HttpResponse { status, body })
}

/// Decode an `application/ipp` body sent with `Transfer-Encoding: chunked`
/// (RFC 9112 §7.1): a sequence of `<hex-size>\r\n<data>\r\n` chunks
/// terminated by a zero-size chunk, optionally followed by trailer headers.
async fn read_chunked_body<S>(reader: &mut BufReader<S>) -> anyhow::Result<Vec<u8>>
where
    S: tokio::io::AsyncRead + Unpin,
{
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).await.context("failed to read chunk size")?;
        let size_str = size_line.trim().split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_str, 16).context("malformed chunk size")?;

        if size == 0 {
            // Drain trailer headers up to the terminating blank line.
            loop {
                let mut line = String::new();
                let n = reader.read_line(&mut line).await.context("failed to read chunk trailer")?;
                if n == 0 || line.trim().is_empty() {
                    break;
                }
            }
            break;
        }

        let mut chunk = vec![0u8; size];
        reader.read_exact(&mut chunk).await.context("short read on chunk data")?;
        body.extend_from_slice(&chunk);

        // Each chunk is followed by a trailing CRLF.
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await.context("missing chunk terminator")?;
    }
    Ok(body)
}

fn build_request(printer_uri: &str) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u16(IPP_VERSION);
    buf.put_u16(OP_GET_PRINTER_ATTRIBUTES);
    buf.put_u32(1); // request-id

    buf.put_u8(TAG_OPERATION_ATTRIBUTES);
    put_attribute(&mut buf, TAG_CHARSET, "attributes-charset", "utf-8");
    put_attribute(&mut buf, TAG_NATURAL_LANGUAGE, "attributes-natural-language", "en");
    put_attribute(&mut buf, TAG_URI, "printer-uri", printer_uri);

    let requested = [
        "printer-name",
        "printer-info",
        "printer-make-and-model",
        "printer-state",
        "printer-state-reasons",
    ];
    for (i, name) in requested.iter().enumerate() {
        if i == 0 {
            put_attribute(&mut buf, TAG_KEYWORD, "requested-attributes", name);
        } else {
            put_additional_value(&mut buf, TAG_KEYWORD, name);
        }
    }

    buf.put_u8(TAG_END_OF_ATTRIBUTES);
    buf.to_vec()
}

fn put_attribute(buf: &mut BytesMut, tag: u8, name: &str, value: &str) {
    buf.put_u8(tag);
    buf.put_u16(name.len() as u16);
    buf.put_slice(name.as_bytes());
    buf.put_u16(value.len() as u16);
    buf.put_slice(value.as_bytes());
}

/// An additional value for the most recently named multi-valued attribute
/// (empty name-length signals "same attribute as before", RFC 8010 §3.1.3).
fn put_additional_value(buf: &mut BytesMut, tag: u8, value: &str) {
    buf.put_u8(tag);
    buf.put_u16(0);
    buf.put_u16(value.len() as u16);
    buf.put_slice(value.as_bytes());
}

fn parse_attributes(body: &[u8]) -> anyhow::Result<PrinterAttributes> {
    if body.len() < 8 {
        bail!("response too short to be a valid IPP message");
    }
    let mut cursor = &body[8..]; // skip version + status-code + request-id

    let mut group = None;
    let mut current_name = String::new();
    let mut attrs = PrinterAttributes::default();
    let mut seen_printer_group = false;

    while !cursor.is_empty() {
        let tag = cursor.get_u8();
        match tag {
            TAG_OPERATION_ATTRIBUTES | TAG_JOB_ATTRIBUTES | TAG_UNSUPPORTED_ATTRIBUTES => {
                group = Some(tag);
                continue;
            }
            TAG_PRINTER_ATTRIBUTES => {
                if seen_printer_group {
                    break; // only the first printer-attributes group matters
                }
                group = Some(tag);
                seen_printer_group = true;
                continue;
            }
            TAG_END_OF_ATTRIBUTES => break,
            _ => {}
        }

        if cursor.len() < 2 {
            break;
        }
        let name_len = cursor.get_u16() as usize;
        if cursor.len() < name_len {
            break;
        }
        if name_len > 0 {
            current_name = String::from_utf8_lossy(&cursor[..name_len]).into_owned();
        }
        cursor.advance(name_len);

        if cursor.len() < 2 {
            break;
        }
        let value_len = cursor.get_u16() as usize;
        if cursor.len() < value_len {
            break;
        }
        let value = &cursor[..value_len];

        if group == Some(TAG_PRINTER_ATTRIBUTES) {
            match current_name.as_str() {
                "printer-name" => attrs.name = Some(String::from_utf8_lossy(value).into_owned()),
                "printer-make-and-model" => {
                    attrs.make_model = Some(String::from_utf8_lossy(value).into_owned())
                }
                "printer-info" => attrs.info = Some(String::from_utf8_lossy(value).into_owned()),
                "printer-state" if tag == TAG_ENUM && value.len() == 4 => {
                    let code = i32::from_be_bytes([value[0], value[1], value[2], value[3]]);
                    attrs.state = Some(printer_state_text(code).to_string());
                }
                _ => {}
            }
        }

        cursor.advance(value_len);
    }

    if !seen_printer_group {
        bail!("response carried no printer-attributes group");
    }
    Ok(attrs)
}

#[cfg(test)]
#[path = "ipp_tests.rs"]
mod tests;
