use std::collections::{BTreeSet, HashMap, HashSet};

use anoncreds_types::{
    cl::{
        CredentialKeyCorrectnessProof as ClKeyCorrectnessProof, CredentialSchema,
        CredentialValues as ClCredentialValues, ErrorKind as ClErrorKind, Issuer as ClIssuer,
        NonCredentialSchema, Proof, Prover as ClProver, RevocationKeyPrivate,
        RevocationKeyPublic, SubProofRequest, Verifier as ClVerifier, Witness,
    },
    data_types::{
        ledger::{
            cred_def::CredentialDefinition, rev_reg::RevocationRegistry,
            rev_reg_delta::RevocationRegistryDelta, schema::AttributeNames,
        },
        messages::{
            cred_request::CredentialRequestMetadata,
            credential::{Credential, CredentialValues},
            link_secret::{LinkSecret, LINK_SECRET_ATTRIBUTE},
            nonce::Nonce,
            pres_request::PredicateInfo,
        },
    },
    utils::encoding::attr_common_view,
};

use super::{
    BlindedLinkSecret, CredentialKeys, CryptoEngine, IssueRequest, IssuedSignature,
    NewAccumulator, SubProofCheck, SubProofInput,
};
use crate::{
    errors::error::{RevocationError, RevocationResult},
    tails::TailsFileReader,
};

/// [`CryptoEngine`] backed by CL signatures and the CL accumulator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClEngine;

fn build_credential_schema(attr_names: &AttributeNames) -> RevocationResult<CredentialSchema> {
    let mut builder = ClIssuer::new_credential_schema_builder()?;
    for attr in &attr_names.0 {
        builder.add_attr(&attr_common_view(attr))?;
    }
    Ok(builder.finalize()?)
}

fn build_non_credential_schema() -> RevocationResult<NonCredentialSchema> {
    let mut builder = ClIssuer::new_non_credential_schema_builder()?;
    builder.add_attr(LINK_SECRET_ATTRIBUTE)?;
    Ok(builder.finalize()?)
}

fn build_credential_values(
    values: &CredentialValues,
    link_secret: Option<&LinkSecret>,
) -> RevocationResult<ClCredentialValues> {
    let mut builder = ClIssuer::new_credential_values_builder()?;
    for (attr, value) in &values.0 {
        builder.add_dec_known(&attr_common_view(attr), &value.encoded)?;
    }
    if let Some(link_secret) = link_secret {
        builder.add_value_hidden(LINK_SECRET_ATTRIBUTE, link_secret.as_native())?;
    }
    Ok(builder.finalize()?)
}

fn build_sub_proof_request(
    revealed: &[String],
    predicates: &[PredicateInfo],
) -> RevocationResult<SubProofRequest> {
    let mut builder = ClVerifier::new_sub_proof_request_builder()?;
    for attr in revealed {
        builder.add_revealed_attr(&attr_common_view(attr))?;
    }
    for predicate in predicates {
        builder.add_predicate(
            &attr_common_view(&predicate.name),
            &predicate.p_type.to_string(),
            predicate.p_value,
        )?;
    }
    Ok(builder.finalize()?)
}

impl CryptoEngine for ClEngine {
    fn new_nonce(&self) -> RevocationResult<Nonce> {
        Ok(Nonce::new()?)
    }

    fn new_credential_keys(
        &self,
        attr_names: &AttributeNames,
        support_revocation: bool,
    ) -> RevocationResult<CredentialKeys> {
        let credential_schema = build_credential_schema(attr_names)?;
        let non_credential_schema = build_non_credential_schema()?;
        let (public_key, private_key, correctness_proof) = ClIssuer::new_credential_def(
            &credential_schema,
            &non_credential_schema,
            support_revocation,
        )?;
        Ok(CredentialKeys {
            public_key,
            private_key,
            correctness_proof,
        })
    }

    fn blind_link_secret(
        &self,
        cred_def: &CredentialDefinition,
        correctness_proof: &ClKeyCorrectnessProof,
        link_secret: &LinkSecret,
        nonce: &Nonce,
    ) -> RevocationResult<BlindedLinkSecret> {
        let public_key = cred_def.get_public_key()?;
        let mut builder = ClIssuer::new_credential_values_builder()?;
        builder.add_value_hidden(LINK_SECRET_ATTRIBUTE, link_secret.as_native())?;
        let values = builder.finalize()?;

        let (blinded, blinding_factors, correctness_proof) = ClProver::blind_credential_secrets(
            &public_key,
            correctness_proof,
            &values,
            nonce.as_native(),
        )?;
        Ok(BlindedLinkSecret {
            blinded,
            blinding_factors,
            correctness_proof,
        })
    }

    fn issue(&self, request: IssueRequest<'_>) -> RevocationResult<IssuedSignature> {
        let public_key = request.cred_def.get_public_key()?;
        let values = build_credential_values(request.values, None)?;
        let entropy = request.request.entropy()?;

        match request.revocation {
            Some(revocation) => {
                let mut registry = revocation.registry.value.clone();
                let (signature, correctness_proof, witness, _) =
                    ClIssuer::sign_credential_with_revoc(
                        &entropy,
                        &request.request.blinded_ms,
                        &request.request.blinded_ms_correctness_proof,
                        request.offer_nonce.as_native(),
                        request.request.nonce.as_native(),
                        &values,
                        &public_key,
                        &request.cred_def_private.value,
                        revocation.index,
                        revocation.max_cred_num,
                        revocation.already_issued,
                        &mut registry,
                        revocation.private_key,
                    )?;
                Ok(IssuedSignature {
                    signature,
                    correctness_proof,
                    witness: Some(witness),
                    registry: Some(registry.into()),
                })
            }
            None => {
                let (signature, correctness_proof) = ClIssuer::sign_credential(
                    &entropy,
                    &request.request.blinded_ms,
                    &request.request.blinded_ms_correctness_proof,
                    request.offer_nonce.as_native(),
                    request.request.nonce.as_native(),
                    &values,
                    &public_key,
                    &request.cred_def_private.value,
                )?;
                Ok(IssuedSignature {
                    signature,
                    correctness_proof,
                    witness: None,
                    registry: None,
                })
            }
        }
    }

    fn process(
        &self,
        credential: &mut Credential,
        metadata: &CredentialRequestMetadata,
        link_secret: &LinkSecret,
        cred_def: &CredentialDefinition,
        accum_key: Option<&RevocationKeyPublic>,
    ) -> RevocationResult<()> {
        let public_key = cred_def.get_public_key()?;
        let values = build_credential_values(&credential.values, Some(link_secret))?;
        ClProver::process_credential_signature(
            &mut credential.signature,
            &values,
            &credential.signature_correctness_proof,
            &metadata.link_secret_blinding_data,
            &public_key,
            metadata.nonce.as_native(),
            accum_key,
            credential.rev_reg.as_ref(),
            credential.witness.as_ref(),
        )?;
        Ok(())
    }

    fn create_accumulator(
        &self,
        cred_def: &CredentialDefinition,
        max_cred_num: u32,
    ) -> RevocationResult<NewAccumulator> {
        let public_key = cred_def.get_public_key()?;
        // Always starts empty; issuance by default is applied as a regular update.
        let (accum_key, private_key, registry, tails) =
            ClIssuer::new_revocation_registry_def(&public_key, max_cred_num, false)?;
        Ok(NewAccumulator {
            public_key: accum_key,
            private_key,
            registry: registry.into(),
            tails,
        })
    }

    fn update_accumulator(
        &self,
        cred_def: &CredentialDefinition,
        registry: &RevocationRegistry,
        private_key: &RevocationKeyPrivate,
        max_cred_num: u32,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
    ) -> RevocationResult<RevocationRegistry> {
        let public_key = cred_def.get_public_key()?;
        let mut next = registry.value.clone();
        ClIssuer::update_revocation_registry(
            &mut next,
            max_cred_num,
            issued.clone(),
            revoked.clone(),
            &public_key,
            private_key,
        )?;
        Ok(next.into())
    }

    fn diff_accumulator(
        &self,
        from: Option<&RevocationRegistry>,
        to: &RevocationRegistry,
        issued: &BTreeSet<u32>,
        revoked: &BTreeSet<u32>,
    ) -> RevocationRegistryDelta {
        let issued: HashSet<u32> = issued.iter().copied().collect();
        let revoked: HashSet<u32> = revoked.iter().copied().collect();
        RevocationRegistryDelta::from_parts(from, to, &issued, &revoked)
    }

    fn merge_diff(
        &self,
        first: &RevocationRegistryDelta,
        second: &RevocationRegistryDelta,
    ) -> RevocationResult<RevocationRegistryDelta> {
        let mut merged = first.value.clone();
        merged.merge(&second.value)?;
        Ok(merged.into())
    }

    fn compute_witness(
        &self,
        index: u32,
        max_cred_num: u32,
        issuance_by_default: bool,
        delta: &RevocationRegistryDelta,
        tails: &TailsFileReader,
    ) -> RevocationResult<Witness> {
        let witness = Witness::new(index, max_cred_num, issuance_by_default, &delta.value, tails)
            .map_err(|err| tails.take_error().unwrap_or_else(|| err.into()))?;
        Ok(witness)
    }

    fn update_witness(
        &self,
        witness: &Witness,
        index: u32,
        max_cred_num: u32,
        delta: &RevocationRegistryDelta,
        tails: &TailsFileReader,
    ) -> RevocationResult<Witness> {
        let mut next = witness.clone();
        next.update(index, max_cred_num, &delta.value, tails)
            .map_err(|err| tails.take_error().unwrap_or_else(|| err.into()))?;
        Ok(next)
    }

    fn build_proof(
        &self,
        nonce: &Nonce,
        link_secret: &LinkSecret,
        sub_proofs: &[SubProofInput<'_>],
    ) -> RevocationResult<Proof> {
        let mut proof_builder = ClProver::new_proof_builder()?;
        proof_builder.add_common_attribute(LINK_SECRET_ATTRIBUTE)?;
        let non_credential_schema = build_non_credential_schema()?;

        for sub_proof in sub_proofs {
            let credential_schema = build_credential_schema(&sub_proof.schema.attr_names)?;
            let values = build_credential_values(&sub_proof.credential.values, Some(link_secret))?;
            let sub_proof_request =
                build_sub_proof_request(&sub_proof.revealed, &sub_proof.predicates)?;
            let public_key = sub_proof.cred_def.get_public_key()?;

            proof_builder.add_sub_proof_request(
                &sub_proof_request,
                &credential_schema,
                &non_credential_schema,
                &sub_proof.credential.signature,
                &values,
                &public_key,
                sub_proof.rev_state.map(|state| &state.rev_reg),
                sub_proof.rev_state.map(|state| &state.witness),
            )?;
        }

        Ok(proof_builder.finalize(nonce.as_native())?)
    }

    fn verify_proof(
        &self,
        proof: &Proof,
        nonce: &Nonce,
        sub_proofs: &[SubProofCheck<'_>],
    ) -> RevocationResult<bool> {
        let mut proof_verifier = ClVerifier::new_proof_verifier()?;
        let non_credential_schema = build_non_credential_schema()?;

        for sub_proof in sub_proofs {
            let credential_schema = build_credential_schema(&sub_proof.schema.attr_names)?;
            let sub_proof_request =
                build_sub_proof_request(&sub_proof.revealed, &sub_proof.predicates)?;
            let public_key = sub_proof.cred_def.get_public_key()?;

            proof_verifier.add_sub_proof_request(
                &sub_proof_request,
                &credential_schema,
                &non_credential_schema,
                &public_key,
                sub_proof
                    .revocation
                    .map(|(def, _)| &def.value.public_keys.accum_key),
                sub_proof.revocation.map(|(_, registry)| &registry.value),
            )?;
        }

        match proof_verifier.verify(proof, nonce.as_native()) {
            Ok(valid) => Ok(valid),
            Err(err) if matches!(err.kind(), ClErrorKind::ProofRejected) => {
                debug!("verify_proof: proof rejected: {err}");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn revealed_attrs(
        &self,
        proof: &Proof,
        sub_proof_index: usize,
    ) -> RevocationResult<HashMap<String, String>> {
        let sub_proof = proof.proofs.get(sub_proof_index).ok_or_else(|| {
            RevocationError::InvalidArgument(format!(
                "Proof carries no sub-proof at index {sub_proof_index}"
            ))
        })?;
        Ok(sub_proof
            .revealed_attrs()?
            .into_iter()
            .map(|(name, value)| (name, value.to_string()))
            .collect())
    }
}
