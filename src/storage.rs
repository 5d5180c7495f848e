use std::sync::Arc;

use crate::error::StorageError;
use crate::MembershipState;

/// Durable storage for the membership state record.
///
/// Implementations typically write the [`codec`](crate::membership::codec)
/// encoding of the state. Saves are ordered by the state's ordinal, so an
/// implementation may safely keep the record in a rotating pair of files.
pub trait MembershipStorage {
    fn save(&self, state: &MembershipState) -> Result<(), StorageError>;

    /// Load the last persisted record, or `None` on first start.
    fn load(&self) -> Result<Option<MembershipState>, StorageError>;
}

impl<T: MembershipStorage + ?Sized> MembershipStorage for Arc<T> {
    fn save(&self, state: &MembershipState) -> Result<(), StorageError> {
        self.as_ref().save(state)
    }

    fn load(&self) -> Result<Option<MembershipState>, StorageError> {
        self.as_ref().load()
    }
}
