use anoncreds_types::data_types::ledger::rev_reg_delta::RevocationRegistryDelta;

use crate::{
    anoncreds::AnonCreds,
    errors::error::{RevocationError, RevocationResult},
};

impl AnonCreds {
    /// Chains `first` (A -> B) with `second` (B -> C) into A -> C.
    ///
    /// Only adjacent transitions merge: `second` must start at the accumulator `first` ends
    /// at. The result applies to a witness exactly like `first` followed by `second`.
    pub fn merge_revocation_registry_deltas(
        &self,
        first: &RevocationRegistryDelta,
        second: &RevocationRegistryDelta,
    ) -> RevocationResult<RevocationRegistryDelta> {
        let first_view = first.view()?;
        let second_view = second.view()?;
        trace!(
            "merge_revocation_registry_deltas >>> first: {first_view:?}, second: {second_view:?}"
        );

        match &second_view.prev_accum {
            Some(prev_accum) if prev_accum == &first_view.accum => {}
            Some(_) => {
                return Err(RevocationError::IncompatibleDelta(
                    "second delta does not start at the accumulator the first one ends at".into(),
                ))
            }
            None => {
                return Err(RevocationError::IncompatibleDelta(
                    "second delta starts at genesis and cannot follow another delta".into(),
                ))
            }
        }

        let merged = self.engine().merge_diff(first, second)?;
        trace!("merge_revocation_registry_deltas <<< merged: {merged:?}");
        Ok(merged)
    }

    /// Folds a sequence of adjacent deltas into one.
    pub fn merge_revocation_registry_delta_chain(
        &self,
        deltas: &[RevocationRegistryDelta],
    ) -> RevocationResult<RevocationRegistryDelta> {
        let (first, rest) = deltas.split_first().ok_or_else(|| {
            RevocationError::InvalidArgument("No revocation registry deltas to merge".into())
        })?;
        rest.iter().try_fold(first.clone(), |merged, next| {
            self.merge_revocation_registry_deltas(&merged, next)
        })
    }
}
