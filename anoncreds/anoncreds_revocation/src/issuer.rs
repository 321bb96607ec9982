use std::collections::BTreeSet;

use anoncreds_types::{
    data_types::{
        identifiers::{cred_def_id::CredentialDefinitionId, issuer_id::IssuerId, schema_id::SchemaId},
        ledger::{
            cred_def::{
                CredentialDefinition, CredentialDefinitionData, CredentialDefinitionPrivate,
                CredentialKeyCorrectnessProof,
            },
            rev_reg::RevocationRegistry,
            rev_reg_def::{RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate},
            rev_reg_delta::RevocationRegistryDelta,
            rev_status_list::RevocationStatusList,
            schema::{AttributeNames, Schema},
        },
        messages::{
            cred_definition_config::CredentialDefinitionConfig,
            cred_offer::CredentialOffer,
            cred_request::CredentialRequest,
            credential::{Credential, CredentialValues},
        },
    },
    utils::validation::Validatable,
};

use crate::{
    anoncreds::AnonCreds,
    engine::{IssueRequest, IssueRevocation},
    errors::error::{RevocationError, RevocationResult},
};

/// Registry slot a revocable credential is issued into.
///
/// The status list is the issuer's record of which slots are already taken and which are
/// currently inside the accumulator.
#[derive(Debug, Clone, Copy)]
pub struct CredentialRevocationConfig<'a> {
    pub reg_def: &'a RevocationRegistryDefinition,
    pub reg_def_private: &'a RevocationRegistryDefinitionPrivate,
    pub registry: &'a RevocationRegistry,
    pub status_list: &'a RevocationStatusList,
    pub registry_idx: u32,
}

impl CredentialRevocationConfig<'_> {
    fn validate(&self, cred_def: &CredentialDefinition) -> RevocationResult<()> {
        if self.reg_def.cred_def_id != cred_def.id {
            return Err(RevocationError::InvalidArgument(format!(
                "Revocation registry {} belongs to credential definition {}, not {}",
                self.reg_def.id, self.reg_def.cred_def_id, cred_def.id
            )));
        }
        if self.status_list.rev_reg_def_id() != &self.reg_def.id {
            return Err(RevocationError::InvalidArgument(format!(
                "Status list tracks registry {}, not {}",
                self.status_list.rev_reg_def_id(),
                self.reg_def.id
            )));
        }
        if !self.reg_def.contains_index(self.registry_idx) {
            return Err(RevocationError::index_out_of_range(
                self.registry_idx,
                self.reg_def.max_cred_num(),
            ));
        }
        if self.status_list.is_used(self.registry_idx) == Some(true) {
            return Err(RevocationError::InvalidArgument(format!(
                "Registry index {} is already assigned to a credential",
                self.registry_idx
            )));
        }
        Ok(())
    }
}

impl AnonCreds {
    pub fn create_schema(
        &self,
        issuer_id: &IssuerId,
        name: &str,
        version: &str,
        attr_names: AttributeNames,
    ) -> RevocationResult<Schema> {
        trace!(
            "create_schema >>> issuer_id: {issuer_id}, name: {name}, version: {version}, \
             attr_names: {attr_names:?}"
        );

        issuer_id.validate()?;
        attr_names.validate()?;

        let schema = Schema {
            id: SchemaId::from_parts(issuer_id, name, version)?,
            name: name.to_owned(),
            version: version.to_owned(),
            attr_names,
            issuer_id: issuer_id.clone(),
        };

        trace!("create_schema <<< schema: {schema:?}");
        Ok(schema)
    }

    pub fn create_credential_definition(
        &self,
        issuer_id: &IssuerId,
        schema: &Schema,
        config: &CredentialDefinitionConfig,
    ) -> RevocationResult<(
        CredentialDefinition,
        CredentialDefinitionPrivate,
        CredentialKeyCorrectnessProof,
    )> {
        trace!(
            "create_credential_definition >>> issuer_id: {issuer_id}, schema: {schema:?}, \
             config: {config:?}"
        );

        issuer_id.validate()?;
        schema.validate()?;
        config.validate()?;

        let keys = self
            .engine()
            .new_credential_keys(&schema.attr_names, config.support_revocation)?;

        let cred_def = CredentialDefinition {
            id: CredentialDefinitionId::from_parts(issuer_id, &schema.id, &config.tag)?,
            schema_id: schema.id.clone(),
            signature_type: config.signature_type,
            tag: config.tag.clone(),
            value: CredentialDefinitionData {
                primary: keys.public_key.get_primary_key().try_clone()?,
                revocation: keys.public_key.get_revocation_key().cloned(),
            },
            issuer_id: issuer_id.clone(),
        };
        let cred_def_private = CredentialDefinitionPrivate {
            value: keys.private_key,
        };
        let correctness_proof = CredentialKeyCorrectnessProof {
            value: keys.correctness_proof,
        };

        trace!(
            "create_credential_definition <<< cred_def: {cred_def:?}, private: {:?}",
            secret!(&cred_def_private)
        );
        Ok((cred_def, cred_def_private, correctness_proof))
    }

    pub fn create_credential_offer(
        &self,
        cred_def: &CredentialDefinition,
        correctness_proof: &CredentialKeyCorrectnessProof,
    ) -> RevocationResult<CredentialOffer> {
        trace!("create_credential_offer >>> cred_def_id: {}", cred_def.id);

        let offer = CredentialOffer {
            schema_id: cred_def.schema_id.clone(),
            cred_def_id: cred_def.id.clone(),
            key_correctness_proof: correctness_proof.try_clone()?.value,
            nonce: self.engine().new_nonce()?,
            method_name: None,
        };

        trace!("create_credential_offer <<< offer: {offer:?}");
        Ok(offer)
    }

    /// Signs a credential for the holder's request.
    ///
    /// With a revocation config the credential is bound to the configured registry slot. The
    /// returned registry is the value after issuance, and the delta is present only when
    /// issuing moved the accumulator (a slot that was not in it yet).
    #[allow(clippy::type_complexity)]
    pub fn create_credential(
        &self,
        cred_def: &CredentialDefinition,
        cred_def_private: &CredentialDefinitionPrivate,
        offer: &CredentialOffer,
        request: &CredentialRequest,
        values: CredentialValues,
        revocation: Option<CredentialRevocationConfig<'_>>,
    ) -> RevocationResult<(
        Credential,
        Option<RevocationRegistry>,
        Option<RevocationRegistryDelta>,
    )> {
        trace!(
            "create_credential >>> cred_def_id: {}, private: {:?}, offer.nonce: {:?}, \
             request: {request:?}, values: {:?}, registry_idx: {:?}",
            cred_def.id,
            secret!(cred_def_private),
            offer.nonce,
            secret!(&values),
            revocation.map(|config| config.registry_idx)
        );

        offer.validate()?;
        request.validate()?;
        values.validate()?;
        if offer.cred_def_id != cred_def.id || request.cred_def_id != cred_def.id {
            return Err(RevocationError::InvalidArgument(format!(
                "Offer and request must both target credential definition {}",
                cred_def.id
            )));
        }

        if let Some(config) = &revocation {
            if !cred_def.supports_revocation() {
                return Err(RevocationError::InvalidArgument(format!(
                    "Credential definition {} does not support revocation",
                    cred_def.id
                )));
            }
            config.validate(cred_def)?;
        } else if cred_def.supports_revocation() {
            warn!(
                "create_credential: no revocation config for revocable credential definition {}; \
                 issuing a non-revocable credential",
                cred_def.id
            );
        }

        let already_issued = revocation
            .as_ref()
            .and_then(|config| config.status_list.is_active(config.registry_idx))
            .unwrap_or(false);

        let issued = self.engine().issue(IssueRequest {
            cred_def,
            cred_def_private,
            offer_nonce: &offer.nonce,
            request,
            values: &values,
            revocation: revocation.as_ref().map(|config| IssueRevocation {
                index: config.registry_idx,
                max_cred_num: config.reg_def.max_cred_num(),
                already_issued,
                registry: config.registry,
                private_key: &config.reg_def_private.value,
            }),
        })?;

        let delta = match (&revocation, &issued.registry) {
            (Some(config), Some(next)) if !already_issued => Some(self.engine().diff_accumulator(
                Some(config.registry),
                next,
                &BTreeSet::from([config.registry_idx]),
                &BTreeSet::new(),
            )),
            _ => None,
        };

        let credential = Credential {
            schema_id: offer.schema_id.clone(),
            cred_def_id: offer.cred_def_id.clone(),
            rev_reg_id: revocation.as_ref().map(|config| config.reg_def.id.clone()),
            rev_reg_index: revocation.as_ref().map(|config| config.registry_idx),
            values,
            signature: issued.signature,
            signature_correctness_proof: issued.correctness_proof,
            rev_reg: issued.registry.as_ref().map(|registry| registry.value.clone()),
            witness: issued.witness,
        };

        trace!(
            "create_credential <<< credential: {:?}, registry: {:?}, delta: {delta:?}",
            secret!(&credential),
            issued.registry
        );
        Ok((credential, issued.registry, delta))
    }
}

#[cfg(test)]
mod tests {
    use anoncreds_types::data_types::ledger::rev_reg_def::IssuanceType;

    use super::*;
    use crate::test_fixtures::{self, IssuerFixture};

    #[test]
    fn schema_id_is_derived_from_issuer() {
        let anoncreds = AnonCreds::default();
        let issuer_id = IssuerId::new(test_fixtures::ISSUER_DID).unwrap();
        let schema = anoncreds
            .create_schema(&issuer_id, "gvt", "1.0", vec!["name".to_owned()].into())
            .unwrap();
        assert_eq!(schema.id.0, format!("{}:2:gvt:1.0", test_fixtures::ISSUER_DID));
    }

    #[test]
    fn schema_rejects_duplicate_attributes() {
        let anoncreds = AnonCreds::default();
        let issuer_id = IssuerId::new(test_fixtures::ISSUER_DID).unwrap();
        let err = anoncreds
            .create_schema(
                &issuer_id,
                "gvt",
                "1.0",
                vec!["name".to_owned(), "name".to_owned()].into(),
            )
            .unwrap_err();
        assert!(matches!(err, RevocationError::InvalidArgument(_)));
    }

    #[test]
    fn credential_definition_carries_revocation_key_on_request() {
        let fixture = IssuerFixture::new(true);
        assert!(fixture.cred_def.supports_revocation());
        assert!(fixture.cred_def.id.is_legacy());

        let fixture = IssuerFixture::new(false);
        assert!(!fixture.cred_def.supports_revocation());
    }

    #[test]
    fn issues_non_revocable_credential() {
        let fixture = IssuerFixture::new(false);
        let (credential, registry, delta) = fixture.issue(None).unwrap();
        assert!(!credential.is_revocable());
        assert!(credential.witness.is_none());
        assert!(registry.is_none());
        assert!(delta.is_none());
    }

    #[test]
    fn issuing_by_default_leaves_accumulator_unchanged() {
        let fixture = IssuerFixture::new(true);
        let (reg_def, reg_def_private, registry, _) =
            fixture.registry(IssuanceType::ISSUANCE_BY_DEFAULT, 5);
        let status = RevocationStatusList::new(reg_def.id.clone(), reg_def.issuance_type(), 5);

        let (credential, next, delta) = fixture
            .issue(Some(CredentialRevocationConfig {
                reg_def: &reg_def,
                reg_def_private: &reg_def_private,
                registry: &registry,
                status_list: &status,
                registry_idx: 2,
            }))
            .unwrap();

        assert_eq!(credential.rev_reg_index, Some(2));
        assert_eq!(credential.rev_reg_id.as_ref(), Some(&reg_def.id));
        assert!(credential.witness.is_some());
        assert_eq!(next.unwrap(), registry);
        assert!(delta.is_none());
    }

    #[test]
    fn issuing_on_demand_returns_delta() {
        let fixture = IssuerFixture::new(true);
        let (reg_def, reg_def_private, registry, _) =
            fixture.registry(IssuanceType::ISSUANCE_ON_DEMAND, 5);
        let status = RevocationStatusList::new(reg_def.id.clone(), reg_def.issuance_type(), 5);

        let (_, next, delta) = fixture
            .issue(Some(CredentialRevocationConfig {
                reg_def: &reg_def,
                reg_def_private: &reg_def_private,
                registry: &registry,
                status_list: &status,
                registry_idx: 3,
            }))
            .unwrap();

        let next = next.unwrap();
        let delta = delta.unwrap().view().unwrap();
        assert_eq!(delta.prev_accum, Some(registry));
        assert_eq!(delta.accum, next);
        assert_eq!(delta.issued, [3].into());
        assert!(delta.revoked.is_empty());
    }

    #[test]
    fn rejects_used_or_out_of_range_index() {
        let fixture = IssuerFixture::new(true);
        let (reg_def, reg_def_private, registry, _) =
            fixture.registry(IssuanceType::ISSUANCE_BY_DEFAULT, 5);
        let mut status = RevocationStatusList::new(reg_def.id.clone(), reg_def.issuance_type(), 5);
        status.mark_used(1);

        let config = |registry_idx| CredentialRevocationConfig {
            reg_def: &reg_def,
            reg_def_private: &reg_def_private,
            registry: &registry,
            status_list: &status,
            registry_idx,
        };

        assert!(matches!(
            fixture.issue(Some(config(1))).unwrap_err(),
            RevocationError::InvalidArgument(_)
        ));
        assert!(matches!(
            fixture.issue(Some(config(0))).unwrap_err(),
            RevocationError::IndexOutOfRange { index: 0, max_cred_num: 5 }
        ));
        assert!(matches!(
            fixture.issue(Some(config(6))).unwrap_err(),
            RevocationError::IndexOutOfRange { index: 6, .. }
        ));
    }

    #[test]
    fn rejects_revocation_config_for_non_revocable_definition() {
        let revocable = IssuerFixture::new(true);
        let (reg_def, reg_def_private, registry, _) =
            revocable.registry(IssuanceType::ISSUANCE_BY_DEFAULT, 5);
        let status = RevocationStatusList::new(reg_def.id.clone(), reg_def.issuance_type(), 5);

        let plain = IssuerFixture::new(false);
        let err = plain
            .issue(Some(CredentialRevocationConfig {
                reg_def: &reg_def,
                reg_def_private: &reg_def_private,
                registry: &registry,
                status_list: &status,
                registry_idx: 1,
            }))
            .unwrap_err();
        assert!(matches!(err, RevocationError::InvalidArgument(_)));
    }
}
