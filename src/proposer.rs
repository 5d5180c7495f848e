use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::ProposeError;
use crate::MemberId;

/// Submits a proposed voting set to the replication engine.
///
/// The proposal is an ordinary replicated command; consensus on it is
/// reached through the normal log-commit path, which reports back through
/// [`LogCommand`](crate::LogCommand) processing.
pub trait MembershipProposer {
    fn propose(&self, members: &BTreeSet<MemberId>) -> Result<(), ProposeError>;
}

impl<T: MembershipProposer + ?Sized> MembershipProposer for Arc<T> {
    fn propose(&self, members: &BTreeSet<MemberId>) -> Result<(), ProposeError> {
        self.as_ref().propose(members)
    }
}
