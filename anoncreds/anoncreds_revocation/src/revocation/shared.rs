use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard},
};

use anoncreds_types::data_types::{
    identifiers::issuer_id::IssuerId,
    ledger::{
        cred_def::{CredentialDefinition, CredentialDefinitionPrivate},
        rev_reg::RevocationRegistry,
        rev_reg_def::{
            IssuanceType, RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate,
        },
        rev_reg_delta::RevocationRegistryDelta,
        rev_status_list::RevocationStatusList,
    },
    messages::{
        cred_offer::CredentialOffer,
        cred_request::CredentialRequest,
        credential::{Credential, CredentialValues},
        rev_reg_config::RevocationRegistryConfig,
    },
};

use crate::{
    anoncreds::AnonCreds,
    errors::error::{RevocationError, RevocationResult},
    issuer::CredentialRevocationConfig,
};

#[derive(Debug)]
struct LiveRegistry {
    registry: RevocationRegistry,
    status: RevocationStatusList,
}

/// Issuer-side owner of one revocation registry.
///
/// Every state transition (issuance into the registry, revocation, recovery, batch update)
/// runs under one lock, so the deltas it hands out always chain. A failed transition leaves
/// both the registry value and the status list as they were.
#[derive(Debug)]
pub struct SharedRevocationRegistry {
    anoncreds: AnonCreds,
    cred_def: CredentialDefinition,
    definition: RevocationRegistryDefinition,
    private: RevocationRegistryDefinitionPrivate,
    live: Mutex<LiveRegistry>,
}

impl SharedRevocationRegistry {
    pub fn new(
        anoncreds: AnonCreds,
        cred_def: CredentialDefinition,
        definition: RevocationRegistryDefinition,
        private: RevocationRegistryDefinitionPrivate,
        registry: RevocationRegistry,
        status: RevocationStatusList,
    ) -> RevocationResult<Self> {
        if status.rev_reg_def_id() != &definition.id
            || status.max_cred_num() != definition.max_cred_num()
            || status.issuance_type() != definition.issuance_type()
        {
            return Err(RevocationError::InvalidArgument(format!(
                "Status list does not describe revocation registry {}",
                definition.id
            )));
        }
        Ok(Self {
            anoncreds,
            cred_def,
            definition,
            private,
            live: Mutex::new(LiveRegistry { registry, status }),
        })
    }

    /// Creates a new registry for `cred_def` and takes ownership of it.
    pub fn create(
        anoncreds: AnonCreds,
        issuer_id: &IssuerId,
        cred_def: CredentialDefinition,
        config: &RevocationRegistryConfig,
    ) -> RevocationResult<Self> {
        let (definition, private, registry, _) =
            anoncreds.create_revocation_registry(issuer_id, &cred_def, config)?;
        let status = RevocationStatusList::new(
            definition.id.clone(),
            definition.issuance_type(),
            definition.max_cred_num(),
        );
        Self::new(anoncreds, cred_def, definition, private, registry, status)
    }

    pub fn definition(&self) -> &RevocationRegistryDefinition {
        &self.definition
    }

    pub fn cred_def(&self) -> &CredentialDefinition {
        &self.cred_def
    }

    fn lock(&self) -> RevocationResult<MutexGuard<'_, LiveRegistry>> {
        Ok(self.live.lock()?)
    }

    pub fn current(&self) -> RevocationResult<RevocationRegistry> {
        Ok(self.lock()?.registry.clone())
    }

    pub fn status_list(&self) -> RevocationResult<RevocationStatusList> {
        Ok(self.lock()?.status.clone())
    }

    /// Genesis delta leading to the current value, for holders that have no witness yet.
    pub fn delta_since_genesis(&self) -> RevocationResult<RevocationRegistryDelta> {
        let live = self.lock()?;
        let (issued, revoked) = match self.definition.issuance_type() {
            IssuanceType::ISSUANCE_BY_DEFAULT => {
                (BTreeSet::new(), live.status.inactive_indices())
            }
            IssuanceType::ISSUANCE_ON_DEMAND => (live.status.active_indices(), BTreeSet::new()),
        };
        Ok(self
            .anoncreds
            .engine()
            .diff_accumulator(None, &live.registry, &issued, &revoked))
    }

    /// Issues into the lowest slot never handed out before.
    pub fn issue_credential(
        &self,
        cred_def_private: &CredentialDefinitionPrivate,
        offer: &CredentialOffer,
        request: &CredentialRequest,
        values: CredentialValues,
    ) -> RevocationResult<(Credential, Option<RevocationRegistryDelta>)> {
        let mut live = self.lock()?;
        let index = live.status.next_unused().ok_or_else(|| {
            RevocationError::InvalidState(format!(
                "Revocation registry {} is full",
                self.definition.id
            ))
        })?;
        self.issue_locked(&mut live, index, cred_def_private, offer, request, values)
    }

    pub fn issue_credential_at(
        &self,
        index: u32,
        cred_def_private: &CredentialDefinitionPrivate,
        offer: &CredentialOffer,
        request: &CredentialRequest,
        values: CredentialValues,
    ) -> RevocationResult<(Credential, Option<RevocationRegistryDelta>)> {
        let mut live = self.lock()?;
        self.issue_locked(&mut live, index, cred_def_private, offer, request, values)
    }

    fn issue_locked(
        &self,
        live: &mut LiveRegistry,
        index: u32,
        cred_def_private: &CredentialDefinitionPrivate,
        offer: &CredentialOffer,
        request: &CredentialRequest,
        values: CredentialValues,
    ) -> RevocationResult<(Credential, Option<RevocationRegistryDelta>)> {
        let (credential, registry, delta) = self.anoncreds.create_credential(
            &self.cred_def,
            cred_def_private,
            offer,
            request,
            values,
            Some(CredentialRevocationConfig {
                reg_def: &self.definition,
                reg_def_private: &self.private,
                registry: &live.registry,
                status_list: &live.status,
                registry_idx: index,
            }),
        )?;

        if let Some(registry) = registry {
            live.registry = registry;
        }
        live.status.mark_used(index);
        if delta.is_some() {
            live.status.apply(&BTreeSet::from([index]), &BTreeSet::new());
        }
        debug!(
            "issue_credential: rev_reg_def_id: {}, index: {index}, used: {}/{}",
            self.definition.id,
            live.status.used_count(),
            self.definition.max_cred_num()
        );
        Ok((credential, delta))
    }

    pub fn revoke(&self, index: u32) -> RevocationResult<RevocationRegistryDelta> {
        self.update(&BTreeSet::new(), &BTreeSet::from([index]))
    }

    pub fn recover(&self, index: u32) -> RevocationResult<RevocationRegistryDelta> {
        self.update(&BTreeSet::from([index]), &BTreeSet::new())
    }

    /// Batch transition. Every revoked index must currently be in the accumulator and every
    /// issued index outside it; on demand, only slots already handed out can be issued.
    ///
    /// By default a slot that was never handed out is still inside the accumulator and can
    /// be revoked. [`Self::issue_credential`] may later pick that slot; issuing puts it back
    /// and returns the delta for it.
    pub fn update(
        &self,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
    ) -> RevocationResult<RevocationRegistryDelta> {
        let mut live = self.lock()?;
        let (registry, status, delta) = self.anoncreds.update_revocation_registry(
            &self.cred_def,
            &self.definition,
            &self.private,
            &live.registry,
            &live.status,
            issued,
            revoked,
        )?;
        live.registry = registry;
        live.status = status;

        info!(
            "update: rev_reg_def_id: {}, issued: {issued:?}, revoked: {revoked:?}",
            self.definition.id
        );
        Ok(delta)
    }
}
