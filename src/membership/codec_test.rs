use maplit::btreeset;

use crate::membership::codec;
use crate::testing::mid;
use crate::MemberId;
use crate::MembershipState;

#[test]
fn test_state_record_layout_is_stable() -> anyhow::Result<()> {
    let mut state = MembershipState::new();
    assert!(state.append(5, btreeset! {MemberId::new(0x01, 0x02)}));
    assert!(state.commit(5));

    let buf = codec::encode_state(&state)?;

    #[rustfmt::skip]
    let expected: Vec<u8> = vec![
        0, 0, 0, 0, 0, 0, 0, 2,             // ordinal = 2
        0, 0, 0, 1,                         // committed: present
        0, 0, 0, 0, 0, 0, 0, 5,             // log_index = 5
        0, 0, 0, 1,                         // member count = 1
        0, 0, 0, 0, 0, 0, 0, 1,             // member high
        0, 0, 0, 0, 0, 0, 0, 2,             // member low
        0, 0, 0, 0,                         // appended: absent
    ];
    assert_eq!(expected, buf);
    Ok(())
}

#[test]
fn test_state_record_survives_restart() -> anyhow::Result<()> {
    let mut state = MembershipState::new();
    assert!(state.append(4, btreeset! {mid(1), mid(2)}));
    assert!(state.commit(4));
    assert!(state.append(9, btreeset! {mid(1), mid(2), mid(3)}));

    let decoded = codec::decode_state(&codec::encode_state(&state)?)?;
    assert_eq!(state, decoded);
    Ok(())
}

#[test]
fn test_member_set_payload() -> anyhow::Result<()> {
    let members = btreeset! {mid(7), MemberId::new(u64::MAX, u64::MAX)};

    let buf = codec::encode_member_set(&members)?;
    assert_eq!(4 + 2 * 16, buf.len());

    assert_eq!(members, codec::decode_member_set(&buf)?);
    Ok(())
}

#[test]
fn test_decode_rejects_bad_presence_flag() {
    let mut buf = vec![0u8; 8];
    buf.extend_from_slice(&7i32.to_be_bytes());

    let res = codec::decode_state(&buf);
    assert!(res.is_err());
}

#[test]
fn test_decode_rejects_truncated_record() {
    let res = codec::decode_state(&[0, 0, 0]);
    assert!(res.is_err());
}
