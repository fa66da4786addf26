// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn printer_state_maps_known_codes() {
    assert_eq!(printer_state_text(3), "idle");
    assert_eq!(printer_state_text(4), "processing");
    assert_eq!(printer_state_text(5), "stopped");
    assert_eq!(printer_state_text(99), "unknown");
}

#[test]
fn build_request_starts_with_version_and_operation_id() {
    let req = build_request("ipp://printer.local:631/ipp/print");
    assert_eq!(&req[0..2], &IPP_VERSION.to_be_bytes());
    assert_eq!(&req[2..4], &OP_GET_PRINTER_ATTRIBUTES.to_be_bytes());
    assert_eq!(*req.last().unwrap(), TAG_END_OF_ATTRIBUTES);
}

#[test]
fn parse_attributes_reads_printer_group() {
    let mut buf = BytesMut::new();
    buf.put_u16(IPP_VERSION);
    buf.put_u16(0); // status-code: successful-ok
    buf.put_u32(1); // request-id
    buf.put_u8(TAG_OPERATION_ATTRIBUTES);
    put_attribute(&mut buf, TAG_CHARSET, "attributes-charset", "utf-8");
    buf.put_u8(TAG_PRINTER_ATTRIBUTES);
    put_attribute(&mut buf, 0x42, "printer-name", "office-printer");
    put_attribute(&mut buf, 0x41, "printer-make-and-model", "Example MFP 4200");
    put_attribute(&mut buf, 0x41, "printer-info", "2nd floor");
    buf.put_u8(TAG_ENUM);
    buf.put_u16("printer-state".len() as u16);
    buf.put_slice(b"printer-state");
    buf.put_u16(4);
    buf.put_i32(4);
    buf.put_u8(TAG_END_OF_ATTRIBUTES);

    let attrs = parse_attributes(&buf).unwrap();
    assert_eq!(attrs.name.as_deref(), Some("office-printer"));
    assert_eq!(attrs.make_model.as_deref(), Some("Example MFP 4200"));
    assert_eq!(attrs.info.as_deref(), Some("2nd floor"));
    assert_eq!(attrs.state.as_deref(), Some("processing"));
}

#[test]
fn parse_attributes_rejects_a_response_with_no_printer_group() {
    let mut buf = BytesMut::new();
    buf.put_u16(IPP_VERSION);
    buf.put_u16(0);
    buf.put_u32(1);
    buf.put_u8(TAG_OPERATION_ATTRIBUTES);
    put_attribute(&mut buf, TAG_CHARSET, "attributes-charset", "utf-8");
    buf.put_u8(TAG_END_OF_ATTRIBUTES);

    assert!(parse_attributes(&buf).is_err());
}

#[tokio::test]
async fn read_chunked_body_reassembles_chunks_and_stops_at_zero_chunk() {
    let wire = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n".to_vec();
    let mut reader = BufReader::new(std::io::Cursor::new(wire));
    let body = read_chunked_body(&mut reader).await.unwrap();
    assert_eq!(body, b"Wikipedia");
}

#[tokio::test]
async fn read_chunked_body_drains_trailer_headers() {
    let wire = b"3\r\nfoo\r\n0\r\nX-Trailer: done\r\n\r\n".to_vec();
    let mut reader = BufReader::new(std::io::Cursor::new(wire));
    let body = read_chunked_body(&mut reader).await.unwrap();
    assert_eq!(body, b"foo");
}
