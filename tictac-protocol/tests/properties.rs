//! Property-based tests using proptest
//!
//! These check the codec invariants across randomly generated packets: the body
//! cipher undoes itself, every body survives a serialize/deserialize round trip and
//! a body whose length disagrees with its length fields is never accepted.

#![allow(clippy::expect_used, clippy::unwrap_used, deprecated)]

use proptest::prelude::*;
use tictac_protocol::authentication::{
    Action, ContinueFlags, ContinueOwned, ReplyFlags, ReplyOwned, StartOwned, Status,
};
use tictac_protocol::{
    obfuscate_body, AuthenticationContext, AuthenticationService, AuthenticationType,
    Deserialize, DeserializeError, HeaderInfo, MajorVersion, MinorVersion, PacketFlags,
    PacketType, PrivilegeLevel, Version,
};

fn bytes(max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max)
}

fn is_length_mismatch<T>(result: Result<T, DeserializeError>) -> bool {
    matches!(result, Err(DeserializeError::WrongBodyBufferSize { .. }))
}

prop_compose! {
    fn header()(
        minor in 0u8..=0xf,
        sequence_number in any::<u8>(),
        session_id in any::<u32>(),
    ) -> HeaderInfo {
        HeaderInfo::new(
            Version::new(MajorVersion::RFC8907, MinorVersion::from_nibble(minor)),
            sequence_number,
            PacketFlags::empty(),
            session_id,
        )
    }
}

prop_compose! {
    fn authentication_context()(
        level in 0u8..=15,
        authentication_type in prop::sample::select(vec![
            AuthenticationType::Ascii,
            AuthenticationType::Pap,
            AuthenticationType::Chap,
            AuthenticationType::Arap,
            AuthenticationType::MsChap,
            AuthenticationType::MsChapV2,
        ]),
        service in (0u8..=9).prop_map(|service| AuthenticationService::try_from(service).unwrap()),
    ) -> AuthenticationContext {
        AuthenticationContext {
            privilege_level: PrivilegeLevel::new(level).unwrap(),
            authentication_type,
            service,
        }
    }
}

prop_compose! {
    fn start()(
        action in prop::sample::select(vec![
            Action::Login,
            Action::ChangePassword,
            Action::SendPassword,
            Action::SendAuth,
        ]),
        authentication in authentication_context(),
        user in bytes(255),
        port in bytes(255),
        remote_address in bytes(255),
        data in bytes(255),
    ) -> StartOwned {
        StartOwned { action, authentication, user, port, remote_address, data }
    }
}

prop_compose! {
    fn reply()(
        status in prop::sample::select(vec![
            Status::Pass,
            Status::Fail,
            Status::GetData,
            Status::GetUser,
            Status::GetPassword,
            Status::Restart,
            Status::Error,
            Status::Follow,
        ]),
        no_echo in any::<bool>(),
        server_message in bytes(1024),
        data in bytes(1024),
    ) -> ReplyOwned {
        let flags = if no_echo { ReplyFlags::NO_ECHO } else { ReplyFlags::empty() };
        ReplyOwned { status, flags, server_message, data }
    }
}

prop_compose! {
    fn continue_body()(
        abort in any::<bool>(),
        user_message in bytes(1024),
        data in bytes(1024),
    ) -> ContinueOwned {
        let flags = if abort { ContinueFlags::ABORT } else { ContinueFlags::empty() };
        ContinueOwned { user_message, data, flags }
    }
}

// Property: obfuscating twice with the same inputs restores the body
proptest! {
    #[test]
    fn prop_obfuscation_involution(
        header in header(),
        key in bytes(64),
        body in bytes(2048),
    ) {
        let mut buffer = body.clone();

        obfuscate_body(&header, &key, &mut buffer);
        obfuscate_body(&header, &key, &mut buffer);

        prop_assert_eq!(buffer, body);
    }
}

// Property: start bodies survive a round trip through the wire format
proptest! {
    #[test]
    fn prop_start_roundtrip(start in start()) {
        let serialized = start.to_bytes().expect("Serialization should not fail");
        let deserialized = StartOwned::deserialize_from_buffer(&serialized)
            .expect("Deserialization should not fail");

        prop_assert_eq!(deserialized, start);
    }
}

// Property: reply bodies survive a round trip through the wire format
proptest! {
    #[test]
    fn prop_reply_roundtrip(reply in reply()) {
        let serialized = reply.to_bytes().expect("Serialization should not fail");
        let deserialized = ReplyOwned::deserialize_from_buffer(&serialized)
            .expect("Deserialization should not fail");

        prop_assert_eq!(deserialized, reply);
    }
}

// Property: continue bodies survive a round trip through the wire format
proptest! {
    #[test]
    fn prop_continue_roundtrip(continue_body in continue_body()) {
        let serialized = continue_body.to_bytes().expect("Serialization should not fail");
        let deserialized = ContinueOwned::deserialize_from_buffer(&serialized)
            .expect("Deserialization should not fail");

        prop_assert_eq!(deserialized, continue_body);
    }
}

// Property: padding a valid body by any number of bytes is a length mismatch
proptest! {
    #[test]
    fn prop_padded_bodies_rejected(
        start in start(),
        reply in reply(),
        continue_body in continue_body(),
        padding in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let mut start_bytes = start.to_bytes().unwrap();
        start_bytes.extend_from_slice(&padding);
        let rejected = is_length_mismatch(StartOwned::deserialize_from_buffer(&start_bytes));
        prop_assert!(rejected, "padded start body was accepted");

        let mut reply_bytes = reply.to_bytes().unwrap();
        reply_bytes.extend_from_slice(&padding);
        let rejected = is_length_mismatch(ReplyOwned::deserialize_from_buffer(&reply_bytes));
        prop_assert!(rejected, "padded reply body was accepted");

        let mut continue_bytes = continue_body.to_bytes().unwrap();
        continue_bytes.extend_from_slice(&padding);
        let rejected = is_length_mismatch(ContinueOwned::deserialize_from_buffer(&continue_bytes));
        prop_assert!(rejected, "padded continue body was accepted");
    }
}

// Property: truncating a valid body by any number of bytes is a length mismatch
proptest! {
    #[test]
    fn prop_truncated_bodies_rejected(
        start in start(),
        reply in reply(),
        continue_body in continue_body(),
        cut in 1usize..2048,
    ) {
        let start_bytes = start.to_bytes().unwrap();
        let kept = start_bytes.len().saturating_sub(cut);
        let rejected = is_length_mismatch(StartOwned::deserialize_from_buffer(&start_bytes[..kept]));
        prop_assert!(rejected, "start body cut to {} bytes was accepted", kept);

        let reply_bytes = reply.to_bytes().unwrap();
        let kept = reply_bytes.len().saturating_sub(cut);
        let rejected = is_length_mismatch(ReplyOwned::deserialize_from_buffer(&reply_bytes[..kept]));
        prop_assert!(rejected, "reply body cut to {} bytes was accepted", kept);

        let continue_bytes = continue_body.to_bytes().unwrap();
        let kept = continue_bytes.len().saturating_sub(cut);
        let rejected =
            is_length_mismatch(ContinueOwned::deserialize_from_buffer(&continue_bytes[..kept]));
        prop_assert!(rejected, "continue body cut to {} bytes was accepted", kept);
    }
}

// Property: any version byte with the RFC8907 major version parses and reserializes unchanged
proptest! {
    #[test]
    fn prop_header_version_round_trip(minor in 0u8..=0xf, header in header()) {
        let version_byte = 0xc0 | minor;
        let mut raw = [0; HeaderInfo::HEADER_SIZE_BYTES];
        header
            .serialize(&mut raw, PacketType::Authentication, 0)
            .expect("header should fit in buffer");
        raw[0] = version_byte;

        let parsed = HeaderInfo::try_from(raw.as_slice()).expect("header should parse");
        prop_assert_eq!(u8::from(parsed.version()), version_byte);
    }
}
