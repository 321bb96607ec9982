use std::path::Path;

use anoncreds_types::{
    data_types::{
        ledger::{
            rev_reg::RevocationRegistry, rev_reg_def::RevocationRegistryDefinition,
            rev_reg_delta::RevocationRegistryDelta,
        },
        messages::revocation_state::CredentialRevocationState,
    },
    utils::validation::Validatable,
};

use crate::{
    anoncreds::AnonCreds,
    errors::error::{RevocationError, RevocationResult},
    tails::TailsFileReader,
};

fn check_index(reg_def: &RevocationRegistryDefinition, index: u32) -> RevocationResult<()> {
    if reg_def.contains_index(index) {
        Ok(())
    } else {
        Err(RevocationError::index_out_of_range(
            index,
            reg_def.max_cred_num(),
        ))
    }
}

fn open_tails(
    reg_def: &RevocationRegistryDefinition,
    tails_path: Option<&Path>,
) -> RevocationResult<TailsFileReader> {
    let path = tails_path.unwrap_or_else(|| Path::new(&reg_def.value.tails_location));
    TailsFileReader::open(path, &reg_def.value.tails_hash)
}

impl AnonCreds {
    /// Computes the witness of `index` from a delta that starts at genesis.
    pub fn create_revocation_state(
        &self,
        reg_def: &RevocationRegistryDefinition,
        delta: &RevocationRegistryDelta,
        index: u32,
        timestamp: u64,
    ) -> RevocationResult<CredentialRevocationState> {
        trace!(
            "create_revocation_state >>> rev_reg_def_id: {}, index: {index}, timestamp: {timestamp}",
            reg_def.id
        );

        check_index(reg_def, index)?;
        if !delta.is_genesis()? {
            return Err(RevocationError::IncompatibleDelta(
                "a revocation state can only be created from a delta starting at genesis".into(),
            ));
        }
        let tails = open_tails(reg_def, None)?;
        let state = self.fresh_state(reg_def, delta, index, timestamp, &tails)?;

        trace!("create_revocation_state <<< rev_reg: {:?}", state.rev_reg);
        Ok(state)
    }

    /// Advances `state` by `delta` and stamps it with `timestamp`. The prior state is not
    /// modified.
    ///
    /// A delta ending at the accumulator the state already holds only refreshes the timestamp,
    /// which makes repeated updates with the same delta harmless. A genesis delta recomputes
    /// the witness from scratch. Any other delta must start where the state is.
    pub fn update_revocation_state(
        &self,
        state: &CredentialRevocationState,
        reg_def: &RevocationRegistryDefinition,
        delta: &RevocationRegistryDelta,
        index: u32,
        timestamp: u64,
        tails_path: Option<&Path>,
    ) -> RevocationResult<CredentialRevocationState> {
        trace!(
            "update_revocation_state >>> rev_reg_def_id: {}, index: {index}, \
             from timestamp: {} to {timestamp}, tails_path: {tails_path:?}",
            reg_def.id,
            state.timestamp
        );

        check_index(reg_def, index)?;
        let view = delta.view()?;
        let current = RevocationRegistry::from(state.rev_reg.clone());

        if view.accum == current {
            debug!("update_revocation_state: state already at the delta's accumulator");
            return self.stamped(state.clone(), timestamp);
        }

        let next = match &view.prev_accum {
            None => {
                let tails = open_tails(reg_def, tails_path)?;
                self.fresh_state(reg_def, delta, index, timestamp, &tails)?
            }
            Some(prev) if prev == &current => {
                let tails = open_tails(reg_def, tails_path)?;
                let witness = self.engine().update_witness(
                    &state.witness,
                    index,
                    reg_def.max_cred_num(),
                    delta,
                    &tails,
                )?;
                self.stamped(
                    CredentialRevocationState {
                        witness,
                        rev_reg: view.accum.value,
                        timestamp,
                    },
                    timestamp,
                )?
            }
            Some(_) => {
                return Err(RevocationError::IncompatibleDelta(
                    "delta does not start at the accumulator of the revocation state".into(),
                ))
            }
        };

        trace!("update_revocation_state <<< rev_reg: {:?}", next.rev_reg);
        Ok(next)
    }

    fn fresh_state(
        &self,
        reg_def: &RevocationRegistryDefinition,
        delta: &RevocationRegistryDelta,
        index: u32,
        timestamp: u64,
        tails: &TailsFileReader,
    ) -> RevocationResult<CredentialRevocationState> {
        let witness = self.engine().compute_witness(
            index,
            reg_def.max_cred_num(),
            reg_def.issuance_type().to_bool(),
            delta,
            tails,
        )?;
        self.stamped(
            CredentialRevocationState {
                witness,
                rev_reg: delta.target_registry().value,
                timestamp,
            },
            timestamp,
        )
    }

    fn stamped(
        &self,
        mut state: CredentialRevocationState,
        timestamp: u64,
    ) -> RevocationResult<CredentialRevocationState> {
        state.timestamp = timestamp;
        state.validate()?;
        Ok(state)
    }
}
