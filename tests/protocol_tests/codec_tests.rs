//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;

use aofkv::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_frame,
    read_response, write_command, write_response, Command, Response, Status, MAX_PAYLOAD_SIZE,
};

fn roundtrip(cmd: Command) -> Command {
    decode_command(&encode_command(&cmd)).unwrap()
}

fn next_command(cursor: &mut Cursor<Vec<u8>>) -> aofkv::Result<Command> {
    decode_command(&read_frame(cursor)?)
}

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_each_command() {
    let commands = vec![
        Command::Get { key: b"hello".to_vec() },
        Command::Set { key: b"mykey".to_vec(), value: b"myvalue".to_vec() },
        Command::Delete { key: b"todelete".to_vec() },
        Command::Ping,
    ];

    for cmd in commands {
        assert_eq!(roundtrip(cmd.clone()), cmd);
    }
}

#[test]
fn test_encode_decode_empty_key_and_value() {
    let cmd = Command::Set { key: vec![], value: vec![] };
    assert_eq!(roundtrip(cmd.clone()), cmd);
}

#[test]
fn test_encode_decode_binary_data() {
    // Null bytes and high bytes must survive; the key length prefix, not a
    // delimiter, separates key from value
    let cmd = Command::Set {
        key: vec![0x00, 0x01, 0xFF, 0xFE, 0x80],
        value: (0..=255).collect(),
    };
    assert_eq!(roundtrip(cmd.clone()), cmd);
}

#[test]
fn test_mutation_classification() {
    assert!(Command::Set { key: vec![], value: vec![] }.is_mutation());
    assert!(Command::Delete { key: vec![] }.is_mutation());
    assert!(!Command::Get { key: vec![] }.is_mutation());
    assert!(!Command::Ping.is_mutation());
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_responses() {
    let cases = vec![
        (Response::ok(Some(b"value".to_vec())), Status::Ok, Some(b"value".to_vec())),
        (Response::ok(None), Status::Ok, None),
        (Response::not_found(), Status::NotFound, None),
        (
            Response::error("something went wrong"),
            Status::Error,
            Some(b"something went wrong".to_vec()),
        ),
    ];

    for (resp, status, payload) in cases {
        let decoded = decode_response(&encode_response(&resp)).unwrap();
        assert_eq!(decoded.status, status);
        assert_eq!(decoded.payload, payload);
    }
}

#[test]
fn test_error_message_only_for_errors() {
    assert_eq!(Response::error("bad").error_message(), Some("bad".to_string()));
    assert_eq!(Response::ok(Some(b"x".to_vec())).error_message(), None);
    assert_eq!(Response::not_found().error_message(), None);
}

#[test]
fn test_lookup_responses() {
    assert_eq!(Response::value(Some(b"v".to_vec())), Response::ok(Some(b"v".to_vec())));
    assert_eq!(Response::value(None), Response::not_found());
    assert_eq!(Response::pong().payload, Some(b"PONG".to_vec()));
    assert!(Response::pong().is_ok());
    assert!(!Response::not_found().is_ok());
}

#[test]
fn test_response_from_error_carries_message() {
    let err = aofkv::KvError::Persistence("disk full".to_string());
    let resp = Response::from(&err);

    assert_eq!(resp.status, Status::Error);
    assert!(resp.error_message().unwrap().contains("disk full"));
}

#[test]
fn test_status_from_byte() {
    assert_eq!(Status::from_byte(0x00), Some(Status::Ok));
    assert_eq!(Status::from_byte(0x01), Some(Status::NotFound));
    assert_eq!(Status::from_byte(0x02), Some(Status::Error));
    assert_eq!(Status::from_byte(0x03), None);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_incomplete_header() {
    let bytes = [0x01, 0x00, 0x00]; // Only 3 bytes, need 5
    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("Incomplete header"));
}

#[test]
fn test_incomplete_payload() {
    // Header says 10 bytes payload, but only 5 provided
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x05, 0x68];
    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("Incomplete"));
}

#[test]
fn test_unknown_command_type() {
    let bytes = [0xFF, 0x00, 0x00, 0x00, 0x00];
    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("Unknown command type"));
}

#[test]
fn test_unknown_response_status() {
    let bytes = [0xFF, 0x00, 0x00, 0x00, 0x00];
    let err = decode_response(&bytes).unwrap_err();
    assert!(err.to_string().contains("Unknown response status"));
}

#[test]
fn test_get_missing_key_length() {
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00]; // Only 2 bytes payload
    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("missing key length"));
}

#[test]
fn test_key_length_beyond_payload() {
    // DELETE claims a 9 byte key but carries 2
    let bytes = [0x03, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x09, b'a', b'b'];
    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("incomplete key"));
}

#[test]
fn test_get_with_trailing_bytes() {
    let mut bytes = encode_command(&Command::Get { key: b"k".to_vec() });
    bytes.push(0xAA);
    bytes[4] += 1;
    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("trailing bytes"));
}

#[test]
fn test_ping_with_unexpected_payload() {
    let bytes = [0x04, 0x00, 0x00, 0x00, 0x05, 0x68, 0x65, 0x6C, 0x6C, 0x6F];
    let err = decode_command(&bytes).unwrap_err();
    assert!(err.to_string().contains("unexpected payload"));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_multiple_commands() {
    let commands = vec![
        Command::Ping,
        Command::Set { key: b"k1".to_vec(), value: b"v1".to_vec() },
        Command::Get { key: b"k1".to_vec() },
        Command::Delete { key: b"k1".to_vec() },
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &commands {
        assert_eq!(&next_command(&mut cursor).unwrap(), expected);
    }
}

#[test]
fn test_stream_multiple_responses() {
    let responses = vec![
        Response::ok(Some(b"data".to_vec())),
        Response::not_found(),
        Response::error("oops"),
        Response::ok(None),
    ];

    let mut buffer = Vec::new();
    for resp in &responses {
        write_response(&mut buffer, resp).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &responses {
        assert_eq!(&read_response(&mut cursor).unwrap(), expected);
    }
}

#[test]
fn test_read_frame_keeps_malformed_frame_whole() {
    // Unknown command type, but correctly framed: the next frame is intact
    let mut buffer = vec![0x7F, 0x00, 0x00, 0x00, 0x02, 0x01, 0x02];
    write_command(&mut buffer, &Command::Ping).unwrap();

    let mut cursor = Cursor::new(buffer);
    let bad = read_frame(&mut cursor).unwrap();
    assert!(decode_command(&bad).is_err());
    assert_eq!(next_command(&mut cursor).unwrap(), Command::Ping);
}

#[test]
fn test_read_frame_rejects_oversized_payload() {
    let mut buffer = vec![0x02];
    buffer.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());

    let err = read_frame(&mut Cursor::new(buffer)).unwrap_err();
    assert!(err.to_string().contains("too large"));
}

#[test]
fn test_read_from_truncated_stream_is_io_error() {
    let bytes = encode_command(&Command::Get { key: b"abc".to_vec() });
    let mut cursor = Cursor::new(bytes[..bytes.len() - 1].to_vec());

    let err = read_frame(&mut cursor).unwrap_err();
    assert!(matches!(err, aofkv::KvError::Io(_)));
}

// =============================================================================
// Wire Format Verification Tests
// =============================================================================

#[test]
fn test_wire_format_set() {
    let cmd = Command::Set { key: b"ab".to_vec(), value: b"xyz".to_vec() };
    let encoded = encode_command(&cmd);

    // [0x02][0 0 0 9][0 0 0 2][a b][x y z]
    //  cmd   payload  key_len  key  value
    assert_eq!(encoded[0], 0x02);
    assert_eq!(&encoded[1..5], &[0x00, 0x00, 0x00, 0x09]);
    assert_eq!(&encoded[5..9], &[0x00, 0x00, 0x00, 0x02]);
    assert_eq!(&encoded[9..11], b"ab");
    assert_eq!(&encoded[11..14], b"xyz");
}

#[test]
fn test_wire_format_response_not_found() {
    let encoded = encode_response(&Response::not_found());

    assert_eq!(encoded, vec![0x01, 0x00, 0x00, 0x00, 0x00]);
}
