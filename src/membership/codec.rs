//! Fixed binary layout for durable membership state.
//!
//! The layout must stay stable across restarts:
//!
//! ```text
//! state record:  [ordinal:i64][committed entry][appended entry]
//! entry:         [present:i32][log_index:i64][count:i32][member:16B ...]
//! member:        [high:i64][low:i64]          (big endian throughout)
//! member set:    [count:i32][member:16B ...]  (standalone proposal payload)
//! ```

use std::collections::BTreeSet;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;

use anyerror::AnyError;
use byteorder::BigEndian;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;

use crate::error::StorageError;
use crate::MemberId;
use crate::MembershipEntry;
use crate::MembershipState;

/// Serialize a state record as `[ordinal][committed][appended]`.
pub fn encode_state(state: &MembershipState) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    buf.write_u64::<BigEndian>(state.ordinal()).map_err(write_err)?;
    write_entry(&mut buf, state.committed()).map_err(write_err)?;
    write_entry(&mut buf, state.appended()).map_err(write_err)?;
    Ok(buf)
}

/// Deserialize a state record produced by [`encode_state`].
pub fn decode_state(buf: &[u8]) -> Result<MembershipState, StorageError> {
    let mut cur = Cursor::new(buf);
    let ordinal = cur.read_u64::<BigEndian>().map_err(read_err)?;
    let committed = read_entry(&mut cur)?;
    let appended = read_entry(&mut cur)?;
    Ok(MembershipState::restore(committed, appended, ordinal))
}

/// Serialize a standalone member set, the payload of a membership-change
/// proposal.
pub fn encode_member_set(members: &BTreeSet<MemberId>) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    write_member_set(&mut buf, members).map_err(write_err)?;
    Ok(buf)
}

/// Deserialize a standalone member set.
pub fn decode_member_set(buf: &[u8]) -> Result<BTreeSet<MemberId>, StorageError> {
    let mut cur = Cursor::new(buf);
    read_member_set(&mut cur)
}

fn write_entry(w: &mut impl Write, entry: Option<&MembershipEntry>) -> std::io::Result<()> {
    match entry {
        None => w.write_i32::<BigEndian>(0),
        Some(e) => {
            w.write_i32::<BigEndian>(1)?;
            w.write_u64::<BigEndian>(e.log_index())?;
            write_member_set(w, e.members())
        }
    }
}

fn read_entry(r: &mut impl Read) -> Result<Option<MembershipEntry>, StorageError> {
    let present = r.read_i32::<BigEndian>().map_err(read_err)?;
    match present {
        0 => Ok(None),
        1 => {
            let log_index = r.read_u64::<BigEndian>().map_err(read_err)?;
            let members = read_member_set(r)?;
            Ok(Some(MembershipEntry::new(log_index, members)))
        }
        other => Err(StorageError::read_state(AnyError::error(format!(
            "invalid membership entry presence flag: {}",
            other
        )))),
    }
}

fn write_member_set(w: &mut impl Write, members: &BTreeSet<MemberId>) -> std::io::Result<()> {
    w.write_i32::<BigEndian>(members.len() as i32)?;
    for m in members {
        w.write_u64::<BigEndian>(m.high())?;
        w.write_u64::<BigEndian>(m.low())?;
    }
    Ok(())
}

fn read_member_set(r: &mut impl Read) -> Result<BTreeSet<MemberId>, StorageError> {
    let count = r.read_i32::<BigEndian>().map_err(read_err)?;
    if count < 0 {
        return Err(StorageError::read_state(AnyError::error(format!(
            "invalid member count: {}",
            count
        ))));
    }

    let mut members = BTreeSet::new();
    for _ in 0..count {
        let high = r.read_u64::<BigEndian>().map_err(read_err)?;
        let low = r.read_u64::<BigEndian>().map_err(read_err)?;
        members.insert(MemberId::new(high, low));
    }
    Ok(members)
}

fn read_err(e: std::io::Error) -> StorageError {
    StorageError::read_state(AnyError::new(&e))
}

fn write_err(e: std::io::Error) -> StorageError {
    StorageError::write_state(AnyError::new(&e))
}
