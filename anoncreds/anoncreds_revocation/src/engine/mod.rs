pub mod cl;

use std::{
    collections::{BTreeSet, HashMap},
    fmt::Debug,
};

use anoncreds_types::{
    cl::{
        BlindedCredentialSecrets, BlindedCredentialSecretsCorrectnessProof,
        CredentialKeyCorrectnessProof as ClKeyCorrectnessProof, CredentialPrivateKey,
        CredentialPublicKey, CredentialSecretsBlindingFactors, CredentialSignature, Proof,
        RevocationKeyPrivate, RevocationKeyPublic, RevocationTailsGenerator,
        SignatureCorrectnessProof, Witness,
    },
    data_types::{
        ledger::{
            cred_def::{CredentialDefinition, CredentialDefinitionPrivate},
            rev_reg::RevocationRegistry,
            rev_reg_def::RevocationRegistryDefinition,
            rev_reg_delta::RevocationRegistryDelta,
            schema::{AttributeNames, Schema},
        },
        messages::{
            cred_request::{CredentialRequest, CredentialRequestMetadata},
            credential::{Credential, CredentialValues},
            link_secret::LinkSecret,
            nonce::Nonce,
            pres_request::PredicateInfo,
            revocation_state::CredentialRevocationState,
        },
    },
};

pub use self::cl::ClEngine;
use crate::{errors::error::RevocationResult, tails::TailsFileReader};

/// Key material of a fresh credential definition.
#[derive(Debug)]
pub struct CredentialKeys {
    pub public_key: CredentialPublicKey,
    pub private_key: CredentialPrivateKey,
    pub correctness_proof: ClKeyCorrectnessProof,
}

#[derive(Debug)]
pub struct BlindedLinkSecret {
    pub blinded: BlindedCredentialSecrets,
    pub blinding_factors: CredentialSecretsBlindingFactors,
    pub correctness_proof: BlindedCredentialSecretsCorrectnessProof,
}

/// Accumulator slot a credential is signed into.
#[derive(Debug)]
pub struct IssueRevocation<'a> {
    pub index: u32,
    pub max_cred_num: u32,
    /// Whether the index is already inside the accumulator. When it is not, signing adds it.
    pub already_issued: bool,
    pub registry: &'a RevocationRegistry,
    pub private_key: &'a RevocationKeyPrivate,
}

#[derive(Debug)]
pub struct IssueRequest<'a> {
    pub cred_def: &'a CredentialDefinition,
    pub cred_def_private: &'a CredentialDefinitionPrivate,
    pub offer_nonce: &'a Nonce,
    pub request: &'a CredentialRequest,
    pub values: &'a CredentialValues,
    pub revocation: Option<IssueRevocation<'a>>,
}

#[derive(Debug)]
pub struct IssuedSignature {
    pub signature: CredentialSignature,
    pub correctness_proof: SignatureCorrectnessProof,
    pub witness: Option<Witness>,
    /// Registry value after signing, present for revocable credentials.
    pub registry: Option<RevocationRegistry>,
}

#[derive(Debug)]
pub struct NewAccumulator {
    pub public_key: RevocationKeyPublic,
    pub private_key: RevocationKeyPrivate,
    /// Empty accumulator.
    pub registry: RevocationRegistry,
    pub tails: RevocationTailsGenerator,
}

/// One credential's share of a proof, as the holder builds it.
#[derive(Debug)]
pub struct SubProofInput<'a> {
    pub revealed: Vec<String>,
    pub predicates: Vec<PredicateInfo>,
    pub schema: &'a Schema,
    pub cred_def: &'a CredentialDefinition,
    pub credential: &'a Credential,
    pub rev_state: Option<&'a CredentialRevocationState>,
}

/// One credential's share of a proof, as the verifier re-derives it.
#[derive(Debug)]
pub struct SubProofCheck<'a> {
    pub revealed: Vec<String>,
    pub predicates: Vec<PredicateInfo>,
    pub schema: &'a Schema,
    pub cred_def: &'a CredentialDefinition,
    pub revocation: Option<(&'a RevocationRegistryDefinition, &'a RevocationRegistry)>,
}

/// Signature, accumulator and proof primitives the protocol layer is built on.
///
/// Implementations never mutate their inputs: every operation that advances a registry or a
/// witness returns the new value.
pub trait CryptoEngine: Debug + Send + Sync {
    fn new_nonce(&self) -> RevocationResult<Nonce>;

    fn new_credential_keys(
        &self,
        attr_names: &AttributeNames,
        support_revocation: bool,
    ) -> RevocationResult<CredentialKeys>;

    fn blind_link_secret(
        &self,
        cred_def: &CredentialDefinition,
        correctness_proof: &ClKeyCorrectnessProof,
        link_secret: &LinkSecret,
        nonce: &Nonce,
    ) -> RevocationResult<BlindedLinkSecret>;

    fn issue(&self, request: IssueRequest<'_>) -> RevocationResult<IssuedSignature>;

    /// Finishes a received credential: unblinds the signature and checks it, together with
    /// the witness of a revocable credential, against the issuer's keys.
    fn process(
        &self,
        credential: &mut Credential,
        metadata: &CredentialRequestMetadata,
        link_secret: &LinkSecret,
        cred_def: &CredentialDefinition,
        accum_key: Option<&RevocationKeyPublic>,
    ) -> RevocationResult<()>;

    fn create_accumulator(
        &self,
        cred_def: &CredentialDefinition,
        max_cred_num: u32,
    ) -> RevocationResult<NewAccumulator>;

    fn update_accumulator(
        &self,
        cred_def: &CredentialDefinition,
        registry: &RevocationRegistry,
        private_key: &RevocationKeyPrivate,
        max_cred_num: u32,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
    ) -> RevocationResult<RevocationRegistry>;

    /// Transition `from -> to`. Without `from` the delta starts at genesis.
    fn diff_accumulator(
        &self,
        from: Option<&RevocationRegistry>,
        to: &RevocationRegistry,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
    ) -> RevocationRegistryDelta;

    /// Chains two adjacent transitions. Adjacency is checked by the caller.
    fn merge_diff(
        &self,
        first: &RevocationRegistryDelta,
        second: &RevocationRegistryDelta,
    ) -> RevocationResult<RevocationRegistryDelta>;

    fn compute_witness(
        &self,
        index: u32,
        max_cred_num: u32,
        issuance_by_default: bool,
        delta: &RevocationRegistryDelta,
        tails: &TailsFileReader,
    ) -> RevocationResult<Witness>;

    fn update_witness(
        &self,
        witness: &Witness,
        index: u32,
        max_cred_num: u32,
        delta: &RevocationRegistryDelta,
        tails: &TailsFileReader,
    ) -> RevocationResult<Witness>;

    fn build_proof(
        &self,
        nonce: &Nonce,
        link_secret: &LinkSecret,
        sub_proofs: &[SubProofInput<'_>],
    ) -> RevocationResult<Proof>;

    /// A proof the engine rejects is reported as `Ok(false)`.
    fn verify_proof(
        &self,
        proof: &Proof,
        nonce: &Nonce,
        sub_proofs: &[SubProofCheck<'_>],
    ) -> RevocationResult<bool>;

    /// Encoded values the proof reveals for one sub-proof, keyed by attribute name.
    fn revealed_attrs(
        &self,
        proof: &Proof,
        sub_proof_index: usize,
    ) -> RevocationResult<HashMap<String, String>>;
}
