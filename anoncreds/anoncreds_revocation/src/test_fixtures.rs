use anoncreds_types::data_types::{
    identifiers::issuer_id::IssuerId,
    ledger::{
        cred_def::{CredentialDefinition, CredentialDefinitionPrivate, CredentialKeyCorrectnessProof},
        rev_reg::RevocationRegistry,
        rev_reg_def::{IssuanceType, RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate},
        rev_reg_delta::RevocationRegistryDelta,
        rev_status_list::RevocationStatusList,
        schema::Schema,
    },
    messages::{
        cred_definition_config::CredentialDefinitionConfig,
        cred_request::CredentialRequestMetadata,
        credential::Credential,
        link_secret::LinkSecret,
        rev_reg_config::RevocationRegistryConfig,
    },
};
pub use test_utils::constants::{ISSUER_DID, PROVER_DID};
use test_utils::{
    constants::{CRED_DEF_TAG, LINK_SECRET_NAME, REV_REG_TAG, SCHEMA_NAME, SCHEMA_VERSION},
    logger::init_logger,
    mockdata::mock_anoncreds,
};
use tempfile::TempDir;

use crate::{anoncreds::AnonCreds, errors::error::RevocationResult, issuer::CredentialRevocationConfig};

/// Status list of a registry nothing has been issued from yet.
pub fn status_list(reg_def: &RevocationRegistryDefinition) -> RevocationStatusList {
    RevocationStatusList::new(
        reg_def.id.clone(),
        reg_def.issuance_type(),
        reg_def.max_cred_num(),
    )
}

/// Issuer with a schema and a credential definition, and a holder link secret.
pub struct IssuerFixture {
    pub anoncreds: AnonCreds,
    pub issuer_id: IssuerId,
    pub schema: Schema,
    pub cred_def: CredentialDefinition,
    pub cred_def_private: CredentialDefinitionPrivate,
    pub kcp: CredentialKeyCorrectnessProof,
    pub link_secret: LinkSecret,
    tails_dir: TempDir,
}

impl IssuerFixture {
    pub fn new(support_revocation: bool) -> Self {
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
        let config = CredentialDefinitionConfig {
            support_revocation,
            tag: CRED_DEF_TAG.to_owned(),
            ..CredentialDefinitionConfig::default()
        };
        let (cred_def, cred_def_private, kcp) = anoncreds
            .create_credential_definition(&issuer_id, &schema, &config)
            .unwrap();
        let link_secret = anoncreds.create_link_secret().unwrap();

        Self {
            anoncreds,
            issuer_id,
            schema,
            cred_def,
            cred_def_private,
            kcp,
            link_secret,
            tails_dir: mock_anoncreds::tails_dir().unwrap(),
        }
    }

    /// Fresh registry over the fixture's credential definition. Every call gets its own tag.
    pub fn registry(
        &self,
        issuance_type: IssuanceType,
        max_cred_num: u32,
    ) -> (
        RevocationRegistryDefinition,
        RevocationRegistryDefinitionPrivate,
        RevocationRegistry,
        RevocationRegistryDelta,
    ) {
        let tag = format!("{REV_REG_TAG}_{}", self.anoncreds.generate_nonce().unwrap());
        let config = RevocationRegistryConfig::builder()
            .tag(tag)
            .issuance_type(issuance_type)
            .max_cred_num(max_cred_num)
            .tails_dir(self.tails_dir.path())
            .build();
        self.anoncreds
            .create_revocation_registry(&self.issuer_id, &self.cred_def, &config)
            .unwrap()
    }

    fn issue_with_metadata(
        &self,
        revocation: Option<CredentialRevocationConfig<'_>>,
    ) -> RevocationResult<(
        Credential,
        CredentialRequestMetadata,
        Option<RevocationRegistry>,
        Option<RevocationRegistryDelta>,
    )> {
        let offer = self
            .anoncreds
            .create_credential_offer(&self.cred_def, &self.kcp)?;
        let (request, metadata) = self.anoncreds.create_credential_request(
            Some(PROVER_DID),
            &self.cred_def,
            &self.link_secret,
            LINK_SECRET_NAME,
            &offer,
        )?;
        let (credential, registry, delta) = self.anoncreds.create_credential(
            &self.cred_def,
            &self.cred_def_private,
            &offer,
            &request,
            mock_anoncreds::credential_values().unwrap(),
            revocation,
        )?;
        Ok((credential, metadata, registry, delta))
    }

    /// Issues and processes a credential carrying the fixture's attribute values.
    pub fn issue(
        &self,
        revocation: Option<CredentialRevocationConfig<'_>>,
    ) -> RevocationResult<(
        Credential,
        Option<RevocationRegistry>,
        Option<RevocationRegistryDelta>,
    )> {
        let (mut credential, metadata, registry, delta) = self.issue_with_metadata(revocation)?;
        self.anoncreds.process_credential(
            &mut credential,
            &metadata,
            &self.link_secret,
            &self.cred_def,
            revocation.map(|config| config.reg_def),
        )?;
        Ok((credential, registry, delta))
    }

    fn revocable_setup(
        &self,
    ) -> (
        RevocationRegistryDefinition,
        RevocationRegistryDefinitionPrivate,
        RevocationRegistry,
        RevocationStatusList,
    ) {
        let (reg_def, reg_def_private, registry, _) =
            self.registry(IssuanceType::ISSUANCE_BY_DEFAULT, 5);
        let status = status_list(&reg_def);
        (reg_def, reg_def_private, registry, status)
    }

    /// Processed credential at `index` of a fresh by-default registry of five.
    pub fn issue_revocable(&self, index: u32) -> (Credential, RevocationRegistryDefinition) {
        let (reg_def, reg_def_private, registry, status) = self.revocable_setup();
        let (credential, _, _) = self
            .issue(Some(CredentialRevocationConfig {
                reg_def: &reg_def,
                reg_def_private: &reg_def_private,
                registry: &registry,
                status_list: &status,
                registry_idx: index,
            }))
            .unwrap();
        (credential, reg_def)
    }

    pub fn issue_unprocessed_revocable(&self, index: u32) -> (Credential, CredentialRequestMetadata) {
        let (reg_def, reg_def_private, registry, status) = self.revocable_setup();
        let (credential, metadata, _, _) = self
            .issue_with_metadata(Some(CredentialRevocationConfig {
                reg_def: &reg_def,
                reg_def_private: &reg_def_private,
                registry: &registry,
                status_list: &status,
                registry_idx: index,
            }))
            .unwrap();
        (credential, metadata)
    }
}
