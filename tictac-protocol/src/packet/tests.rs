use super::*;
use crate::authentication::{Action, Reply, ReplyFlags, Start, Status};
use crate::{
    AuthenticationContext, AuthenticationService, AuthenticationType, MajorVersion, MinorVersion,
    PrivilegeLevel, UserInformation, Version,
};

const SESSION_ID: u32 = 0x5e556999;

fn default_header(sequence_number: u8) -> HeaderInfo {
    HeaderInfo::new(
        Version::new(MajorVersion::RFC8907, MinorVersion::Default),
        sequence_number,
        PacketFlags::empty(),
        SESSION_ID,
    )
}

fn password_prompt() -> Reply<'static> {
    Reply::new(Status::GetPassword, ReplyFlags::NO_ECHO, b"Password: ", b"")
        .expect("reply construction should have succeeded")
}

#[test]
fn serialize_header() {
    let header = HeaderInfo::new(
        Version::new(MajorVersion::RFC8907, MinorVersion::V1),
        1,
        PacketFlags::SINGLE_CONNECTION,
        SESSION_ID,
    );

    let mut buffer = [0; HeaderInfo::HEADER_SIZE_BYTES];
    let written = header
        .serialize(&mut buffer, PacketType::Authentication, 5)
        .expect("buffer should fit header");

    assert_eq!(written, HeaderInfo::HEADER_SIZE_BYTES);
    assert_eq!(
        buffer,
        [
            0xc1, // version
            1,    // authentication packet
            1,    // sequence number
            4,    // single connection flag
            0x5e, 0x55, 0x69, 0x99, // session id
            0, 0, 0, 5, // body length
        ]
    );

    let parsed = HeaderInfo::try_from(buffer.as_slice()).expect("header should parse back");
    assert_eq!(parsed, header);
    assert!(parsed.single_connection());
    assert!(!default_header(1).single_connection());
    assert_eq!(
        HeaderInfo::extract_packet_type(&buffer),
        Ok(PacketType::Authentication)
    );
    assert_eq!(HeaderInfo::extract_body_length(&buffer), Ok(5));
}

#[test]
fn deserialize_header_bad_major_version() {
    let raw = [0xd0, 1, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0];
    assert_eq!(
        HeaderInfo::try_from(raw.as_slice()),
        Err(DeserializeError::BadMajorVersion(0xd0))
    );
}

#[test]
fn unassigned_minor_version_kept() {
    let raw = [0xc2, 1, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0];
    let header = HeaderInfo::try_from(raw.as_slice()).expect("any minor version should be accepted");
    assert_eq!(header.version().minor(), MinorVersion::Other(2));

    let mut buffer = [0; 12];
    header
        .serialize(&mut buffer, PacketType::Authentication, 0)
        .expect("header should fit in buffer");
    assert_eq!(buffer, raw);
}

#[test]
fn deserialize_header_bad_flags() {
    let raw = [0xc0, 1, 1, 0b10, 0, 0, 0, 1, 0, 0, 0, 0];
    assert_eq!(
        HeaderInfo::try_from(raw.as_slice()),
        Err(DeserializeError::InvalidHeaderFlags(0b10))
    );
}

#[test]
fn deserialize_header_too_short() {
    let raw = [0xc0, 1, 1, 0, 0, 0];
    assert_eq!(
        HeaderInfo::try_from(raw.as_slice()),
        Err(DeserializeError::UnexpectedEnd)
    );
}

#[test]
fn start_packet_sets_minor_version() {
    let user_information =
        UserInformation::new(b"operator", b"", b"").expect("user information should be valid");
    let start = Start::new(
        Action::Login,
        AuthenticationContext {
            privilege_level: PrivilegeLevel::default(),
            authentication_type: AuthenticationType::Pap,
            service: AuthenticationService::Ppp,
        },
        user_information,
        b"pap-password",
    )
    .expect("start construction should have succeeded");

    let packet = Packet::new(default_header(1), start);
    assert_eq!(packet.header().version().minor(), MinorVersion::V1);
}

#[test]
fn obfuscated_packet_round_trip() {
    let mut buffer = [0; 40];
    let packet = Packet::new(default_header(2), password_prompt());
    let expected_length = packet.wire_size();

    let length = packet
        .serialize("right key", &mut buffer)
        .expect("packet serialization should succeed");
    assert_eq!(length, expected_length);

    // body is not cleartext on the wire
    assert_ne!(&buffer[HeaderInfo::HEADER_SIZE_BYTES..length], {
        let mut clear = [0; 16];
        password_prompt()
            .serialize_into_buffer(&mut clear)
            .expect("body should fit");
        clear
    });

    let parsed: Packet<Reply<'_>> = Packet::deserialize("right key", &mut buffer[..length])
        .expect("packet should deserialize with the right key");

    assert_eq!(parsed.header(), &default_header(2));
    assert_eq!(parsed.body().status(), Status::GetPassword);
    assert_eq!(parsed.body().flags(), ReplyFlags::NO_ECHO);
    assert_eq!(parsed.body().server_message(), b"Password: ");
}

#[test]
fn deserialize_with_wrong_key_is_length_mismatch() {
    let mut buffer = [0; 40];
    let length = Packet::new(default_header(2), password_prompt())
        .serialize("right key", &mut buffer)
        .expect("packet serialization should succeed");

    let result = Packet::<Reply<'_>>::deserialize("wrong key", &mut buffer[..length]);
    assert_eq!(
        result,
        Err(DeserializeError::WrongBodyBufferSize {
            expected: 27275,
            buffer_size: 16
        })
    );
}

#[test]
fn unencrypted_flag_checked() {
    let mut buffer = [0; 40];
    let length = Packet::new(default_header(2), password_prompt())
        .serialize_unobfuscated(&mut buffer)
        .expect("packet serialization should succeed");

    assert_eq!(buffer[3], PacketFlags::UNENCRYPTED.bits());

    let cleartext = Packet::<Reply<'_>>::deserialize_unobfuscated(&buffer[..length])
        .expect("cleartext packet should deserialize");
    assert_eq!(cleartext.body().server_message(), b"Password: ");

    let mut copy = buffer;
    assert_eq!(
        Packet::<Reply<'_>>::deserialize("key", &mut copy[..length]),
        Err(DeserializeError::IncorrectUnencryptedFlag)
    );
}

#[test]
fn packet_type_mismatch() {
    let mut buffer = [0; 40];
    let length = Packet::new(default_header(2), password_prompt())
        .serialize_unobfuscated(&mut buffer)
        .expect("packet serialization should succeed");

    // authorization type
    buffer[1] = 2;

    assert_eq!(
        Packet::<Reply<'_>>::deserialize_unobfuscated(&buffer[..length]),
        Err(DeserializeError::PacketTypeMismatch {
            expected: PacketType::Authentication,
            actual: PacketType::Authorization
        })
    );
}

#[test]
fn declared_body_length_exceeds_buffer() {
    let mut buffer = [0; 40];
    let length = Packet::new(default_header(2), password_prompt())
        .serialize_unobfuscated(&mut buffer)
        .expect("packet serialization should succeed");

    assert_eq!(
        Packet::<Reply<'_>>::deserialize_unobfuscated(&buffer[..length - 1]),
        Err(DeserializeError::UnexpectedEnd)
    );
}

#[test]
fn serialize_buffer_too_small() {
    let mut buffer = [0; 20];
    assert_eq!(
        Packet::new(default_header(2), password_prompt()).serialize("key", &mut buffer),
        Err(SerializeError::NotEnoughSpace)
    );
}
