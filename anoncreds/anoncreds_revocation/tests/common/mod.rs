#![allow(dead_code)]

use std::collections::HashMap;

use anoncreds_revocation::{
    prover::{CredentialEntry, CredentialProve},
    revocation::shared::SharedRevocationRegistry,
    verifier::RevocationEntry,
    AnonCreds,
};
use anoncreds_types::data_types::{
    identifiers::issuer_id::IssuerId,
    ledger::{
        cred_def::{CredentialDefinition, CredentialDefinitionPrivate, CredentialKeyCorrectnessProof},
        rev_reg_def::{IssuanceType, RevocationRegistryDefinition},
        rev_reg_delta::RevocationRegistryDelta,
        schema::Schema,
    },
    messages::{
        cred_definition_config::CredentialDefinitionConfig,
        credential::Credential,
        link_secret::LinkSecret,
        pres_request::{NonRevokedInterval, PresentationRequest},
        presentation::Presentation,
        rev_reg_config::RevocationRegistryConfig,
        revocation_state::CredentialRevocationState,
    },
};
use tempfile::TempDir;
use test_utils::{
    constants::{
        CRED_DEF_TAG, ISSUER_DID, LINK_SECRET_NAME, PROVER_DID, REV_REG_TAG, SCHEMA_NAME,
        SCHEMA_VERSION,
    },
    logger::init_logger,
    mockdata::mock_anoncreds,
};

pub struct Issuer {
    pub anoncreds: AnonCreds,
    pub issuer_id: IssuerId,
    pub schema: Schema,
    pub cred_def: CredentialDefinition,
    pub cred_def_private: CredentialDefinitionPrivate,
    pub kcp: CredentialKeyCorrectnessProof,
    tails_dir: TempDir,
}

pub struct Holder {
    pub link_secret: LinkSecret,
}

impl Issuer {
    pub fn setup() -> Self {
        init_logger();
        let anoncreds = AnonCreds::default();
        let issuer_id = IssuerId::new(ISSUER_DID).unwrap();
        let schema = anoncreds
            .create_schema(
                &issuer_id,
                SCHEMA_NAME,
                SCHEMA_VERSION,
                mock_anoncreds::schema_attrs(),
            )
            .unwrap();
        let (cred_def, cred_def_private, kcp) = anoncreds
            .create_credential_definition(
                &issuer_id,
                &schema,
                &CredentialDefinitionConfig {
                    support_revocation: true,
                    tag: CRED_DEF_TAG.to_owned(),
                    ..CredentialDefinitionConfig::default()
                },
            )
            .unwrap();
        Self {
            anoncreds,
            issuer_id,
            schema,
            cred_def,
            cred_def_private,
            kcp,
            tails_dir: mock_anoncreds::tails_dir().unwrap(),
        }
    }

    pub fn registry_config(&self, issuance_type: IssuanceType, max_cred_num: u32) -> RevocationRegistryConfig {
        RevocationRegistryConfig::builder()
            .tag(REV_REG_TAG)
            .issuance_type(issuance_type)
            .max_cred_num(max_cred_num)
            .tails_dir(self.tails_dir.path())
            .build()
    }

    pub fn shared_registry(
        &self,
        issuance_type: IssuanceType,
        max_cred_num: u32,
    ) -> SharedRevocationRegistry {
        SharedRevocationRegistry::create(
            self.anoncreds.clone(),
            &self.issuer_id,
            self.cred_def.try_clone().unwrap(),
            &self.registry_config(issuance_type, max_cred_num),
        )
        .unwrap()
    }

    /// Runs the offer/request/issue/process exchange with `holder` through `registry`, at
    /// `index` or at the next free slot.
    pub fn issue(
        &self,
        registry: &SharedRevocationRegistry,
        holder: &Holder,
        index: Option<u32>,
    ) -> (Credential, Option<RevocationRegistryDelta>) {
        let offer = self
            .anoncreds
            .create_credential_offer(&self.cred_def, &self.kcp)
            .unwrap();
        let (request, metadata) = self
            .anoncreds
            .create_credential_request(
                Some(PROVER_DID),
                &self.cred_def,
                &holder.link_secret,
                LINK_SECRET_NAME,
                &offer,
            )
            .unwrap();
        let values = mock_anoncreds::credential_values().unwrap();
        let (mut credential, delta) = match index {
            Some(index) => registry.issue_credential_at(
                index,
                &self.cred_def_private,
                &offer,
                &request,
                values,
            ),
            None => registry.issue_credential(&self.cred_def_private, &offer, &request, values),
        }
        .unwrap();
        self.anoncreds
            .process_credential(
                &mut credential,
                &metadata,
                &holder.link_secret,
                &self.cred_def,
                Some(registry.definition()),
            )
            .unwrap();
        (credential, delta)
    }
}

impl Holder {
    pub fn new(anoncreds: &AnonCreds) -> Self {
        Self {
            link_secret: anoncreds.create_link_secret().unwrap(),
        }
    }
}

/// Request whose referents all fall under a non-revocation interval ending at `to`.
pub fn revocation_request(anoncreds: &AnonCreds, to: u64) -> PresentationRequest {
    let nonce = anoncreds.generate_nonce().unwrap();
    mock_anoncreds::presentation_request(
        &nonce.to_string(),
        Some(NonRevokedInterval::new(None, Some(to))),
    )
    .unwrap()
}

pub fn present(
    issuer: &Issuer,
    holder: &Holder,
    request: &PresentationRequest,
    credential: &Credential,
    rev_state: &CredentialRevocationState,
) -> Presentation {
    issuer
        .anoncreds
        .create_presentation(
            request,
            &[CredentialEntry {
                credential,
                timestamp: None,
                rev_state: Some(rev_state),
            }],
            &[
                CredentialProve::attribute(0, "attr1_referent", true),
                CredentialProve::attribute(0, "attr2_referent", false),
                CredentialProve::predicate(0, "predicate1_referent"),
            ],
            HashMap::new(),
            &holder.link_secret,
            &[&issuer.schema],
            &[&issuer.cred_def],
        )
        .unwrap()
}

pub fn verify(
    issuer: &Issuer,
    presentation: &Presentation,
    request: &PresentationRequest,
    reg_def: &RevocationRegistryDefinition,
    entries: &[RevocationEntry],
) -> bool {
    issuer
        .anoncreds
        .verify_presentation(
            presentation,
            request,
            &[&issuer.schema],
            &[&issuer.cred_def],
            &[reg_def],
            entries,
        )
        .unwrap()
}

pub fn entry(registry: &SharedRevocationRegistry, timestamp: u64) -> RevocationEntry {
    RevocationEntry {
        def_entry_idx: 0,
        registry: registry.current().unwrap(),
        timestamp,
    }
}
