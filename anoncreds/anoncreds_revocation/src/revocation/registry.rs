use std::collections::BTreeSet;

use anoncreds_types::{
    data_types::{
        identifiers::{issuer_id::IssuerId, rev_reg_def_id::RevocationRegistryDefinitionId},
        ledger::{
            cred_def::CredentialDefinition,
            rev_reg::RevocationRegistry,
            rev_reg_def::{
                IssuanceType, RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate,
                RevocationRegistryDefinitionValue, RevocationRegistryDefinitionValuePublicKeys,
            },
            rev_reg_delta::RevocationRegistryDelta,
            rev_status_list::RevocationStatusList,
        },
        messages::rev_reg_config::RevocationRegistryConfig,
    },
    utils::validation::Validatable,
};

use crate::{
    anoncreds::AnonCreds,
    errors::error::{RevocationError, RevocationResult},
    tails::TailsFileWriter,
};

fn check_indices(
    reg_def: &RevocationRegistryDefinition,
    indices: &BTreeSet<u32>,
) -> RevocationResult<()> {
    match indices.iter().find(|index| !reg_def.contains_index(**index)) {
        Some(index) => Err(RevocationError::index_out_of_range(
            *index,
            reg_def.max_cred_num(),
        )),
        None => Ok(()),
    }
}

/// Checks a transition against the slots' current status. A revoked index must be inside the
/// accumulator and an issued one outside it; on demand, only slots already handed to a
/// credential can be issued.
fn check_transition(
    reg_def: &RevocationRegistryDefinition,
    status: &RevocationStatusList,
    issued: &BTreeSet<u32>,
    revoked: &BTreeSet<u32>,
) -> RevocationResult<()> {
    if status.rev_reg_def_id() != &reg_def.id || status.max_cred_num() != reg_def.max_cred_num() {
        return Err(RevocationError::InvalidArgument(format!(
            "Status list does not describe revocation registry {}",
            reg_def.id
        )));
    }
    if let Some(index) = issued.intersection(revoked).next() {
        return Err(RevocationError::InvalidArgument(format!(
            "Index {index} cannot be issued and revoked in the same update"
        )));
    }
    check_indices(reg_def, issued)?;
    check_indices(reg_def, revoked)?;

    if let Some(index) = revoked.iter().find(|index| status.is_active(**index) != Some(true)) {
        return Err(RevocationError::InvalidArgument(format!(
            "Index {index} is not currently in the accumulator"
        )));
    }
    if let Some(index) = issued.iter().find(|index| status.is_active(**index) != Some(false)) {
        return Err(RevocationError::InvalidArgument(format!(
            "Index {index} is already in the accumulator"
        )));
    }
    let on_demand = reg_def.issuance_type() == IssuanceType::ISSUANCE_ON_DEMAND;
    if let Some(index) = issued
        .iter()
        .find(|index| on_demand && status.is_used(**index) != Some(true))
    {
        return Err(RevocationError::InvalidArgument(format!(
            "Index {index} was never assigned to a credential"
        )));
    }
    Ok(())
}

impl AnonCreds {
    /// Creates the public definition, the private key, the initial registry value and the
    /// genesis delta leading to it. The tails file is written into `config.tails_dir`.
    pub fn create_revocation_registry(
        &self,
        issuer_id: &IssuerId,
        cred_def: &CredentialDefinition,
        config: &RevocationRegistryConfig,
    ) -> RevocationResult<(
        RevocationRegistryDefinition,
        RevocationRegistryDefinitionPrivate,
        RevocationRegistry,
        RevocationRegistryDelta,
    )> {
        trace!(
            "create_revocation_registry >>> issuer_id: {issuer_id}, cred_def_id: {}, \
             config: {config:?}",
            cred_def.id
        );

        issuer_id.validate()?;
        config.validate()?;
        if issuer_id != &cred_def.issuer_id {
            return Err(RevocationError::InvalidArgument(format!(
                "Issuer {issuer_id} does not own credential definition {}",
                cred_def.id
            )));
        }
        if !cred_def.supports_revocation() {
            return Err(RevocationError::InvalidArgument(format!(
                "Credential definition {} does not support revocation",
                cred_def.id
            )));
        }

        let max_cred_num = config.max_cred_num;
        let mut accumulator = self.engine().create_accumulator(cred_def, max_cred_num)?;
        let (tails_location, tails_hash) =
            TailsFileWriter::new(&config.tails_dir).write(&mut accumulator.tails)?;

        let reg_def = RevocationRegistryDefinition {
            id: RevocationRegistryDefinitionId::from_parts(
                issuer_id,
                &cred_def.id,
                config.registry_type,
                &config.tag,
            )?,
            issuer_id: issuer_id.clone(),
            revoc_def_type: config.registry_type,
            tag: config.tag.clone(),
            cred_def_id: cred_def.id.clone(),
            value: RevocationRegistryDefinitionValue {
                issuance_type: config.issuance_type,
                max_cred_num,
                public_keys: RevocationRegistryDefinitionValuePublicKeys {
                    accum_key: accumulator.public_key,
                },
                tails_hash,
                tails_location,
            },
        };
        let reg_def_private = RevocationRegistryDefinitionPrivate {
            value: accumulator.private_key,
        };

        let registry = match config.issuance_type {
            IssuanceType::ISSUANCE_BY_DEFAULT => self.engine().update_accumulator(
                cred_def,
                &accumulator.registry,
                &reg_def_private.value,
                max_cred_num,
                &(1..=max_cred_num).collect(),
                &BTreeSet::new(),
            )?,
            IssuanceType::ISSUANCE_ON_DEMAND => accumulator.registry,
        };
        // The issuance type already tells which indices the genesis accumulator holds.
        let delta =
            self.engine()
                .diff_accumulator(None, &registry, &BTreeSet::new(), &BTreeSet::new());

        info!(
            "create_revocation_registry: created {} ({}, max_cred_num: {max_cred_num})",
            reg_def.id,
            reg_def.issuance_type().as_str()
        );
        trace!(
            "create_revocation_registry <<< reg_def: {reg_def:?}, private: {:?}, \
             registry: {registry:?}",
            secret!(&reg_def_private)
        );
        Ok((reg_def, reg_def_private, registry, delta))
    }

    /// Moves `issued` into and `revoked` out of the accumulator. `status` must describe
    /// `registry`. Returns the new registry value, the status list after the move and the
    /// delta from `registry` to the new value; the inputs are left as they are.
    ///
    /// By default every slot starts inside the accumulator, so a slot can be revoked before
    /// it is handed to a credential. Issuing into it later puts it back.
    #[allow(clippy::type_complexity)]
    pub fn update_revocation_registry(
        &self,
        cred_def: &CredentialDefinition,
        reg_def: &RevocationRegistryDefinition,
        reg_def_private: &RevocationRegistryDefinitionPrivate,
        registry: &RevocationRegistry,
        status: &RevocationStatusList,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
    ) -> RevocationResult<(
        RevocationRegistry,
        RevocationStatusList,
        RevocationRegistryDelta,
    )> {
        trace!(
            "update_revocation_registry >>> rev_reg_def_id: {}, issued: {issued:?}, \
             revoked: {revoked:?}",
            reg_def.id
        );

        if reg_def.cred_def_id != cred_def.id {
            return Err(RevocationError::InvalidArgument(format!(
                "Revocation registry {} belongs to credential definition {}, not {}",
                reg_def.id, reg_def.cred_def_id, cred_def.id
            )));
        }
        check_transition(reg_def, status, issued, revoked)?;

        let next = self.engine().update_accumulator(
            cred_def,
            registry,
            &reg_def_private.value,
            reg_def.max_cred_num(),
            issued,
            revoked,
        )?;
        let delta = self
            .engine()
            .diff_accumulator(Some(registry), &next, issued, revoked);
        let mut next_status = status.clone();
        next_status.apply(issued, revoked);

        trace!("update_revocation_registry <<< registry: {next:?}");
        Ok((next, next_status, delta))
    }

    #[allow(clippy::type_complexity)]
    pub fn revoke_credential(
        &self,
        cred_def: &CredentialDefinition,
        reg_def: &RevocationRegistryDefinition,
        reg_def_private: &RevocationRegistryDefinitionPrivate,
        registry: &RevocationRegistry,
        status: &RevocationStatusList,
        index: u32,
    ) -> RevocationResult<(
        RevocationRegistry,
        RevocationStatusList,
        RevocationRegistryDelta,
    )> {
        debug!("revoke_credential: rev_reg_def_id: {}, index: {index}", reg_def.id);
        self.update_revocation_registry(
            cred_def,
            reg_def,
            reg_def_private,
            registry,
            status,
            &BTreeSet::new(),
            &BTreeSet::from([index]),
        )
    }

    /// Puts a revoked index back into the accumulator.
    #[allow(clippy::type_complexity)]
    pub fn recover_credential(
        &self,
        cred_def: &CredentialDefinition,
        reg_def: &RevocationRegistryDefinition,
        reg_def_private: &RevocationRegistryDefinitionPrivate,
        registry: &RevocationRegistry,
        status: &RevocationStatusList,
        index: u32,
    ) -> RevocationResult<(
        RevocationRegistry,
        RevocationStatusList,
        RevocationRegistryDelta,
    )> {
        debug!("recover_credential: rev_reg_def_id: {}, index: {index}", reg_def.id);
        self.update_revocation_registry(
            cred_def,
            reg_def,
            reg_def_private,
            registry,
            status,
            &BTreeSet::from([index]),
            &BTreeSet::new(),
        )
    }
}
