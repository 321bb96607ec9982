use std::collections::BTreeSet;

use bitvec::{bitvec, vec::BitVec};

use crate::data_types::{
    identifiers::rev_reg_def_id::RevocationRegistryDefinitionId,
    ledger::rev_reg_def::IssuanceType,
};

/// Issuer-side view of every slot of a registry.
///
/// Bit `index - 1` of `revocation_list` is set while the index is outside the accumulator
/// (revoked or never issued). Bit `index - 1` of `used_list` is set once the slot has been
/// handed to a credential, and is never cleared again.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatusList {
    rev_reg_def_id: RevocationRegistryDefinitionId,
    issuance_type: IssuanceType,
    #[serde(with = "serde_revocation_list")]
    revocation_list: BitVec,
    #[serde(with = "serde_revocation_list")]
    used_list: BitVec,
}

impl RevocationStatusList {
    pub fn new(
        rev_reg_def_id: RevocationRegistryDefinitionId,
        issuance_type: IssuanceType,
        max_cred_num: u32,
    ) -> Self {
        let size = max_cred_num as usize;
        let revocation_list = match issuance_type {
            IssuanceType::ISSUANCE_BY_DEFAULT => bitvec![0; size],
            IssuanceType::ISSUANCE_ON_DEMAND => bitvec![1; size],
        };
        Self {
            rev_reg_def_id,
            issuance_type,
            revocation_list,
            used_list: bitvec![0; size],
        }
    }

    pub fn rev_reg_def_id(&self) -> &RevocationRegistryDefinitionId {
        &self.rev_reg_def_id
    }

    pub const fn issuance_type(&self) -> IssuanceType {
        self.issuance_type
    }

    pub fn max_cred_num(&self) -> u32 {
        u32::try_from(self.revocation_list.len()).unwrap_or(u32::MAX)
    }

    fn slot(index: u32) -> Option<usize> {
        (index as usize).checked_sub(1)
    }

    /// `None` when the index is outside the registry.
    pub fn is_active(&self, index: u32) -> Option<bool> {
        let slot = Self::slot(index)?;
        self.revocation_list.get(slot).map(|bit| !*bit)
    }

    pub fn is_used(&self, index: u32) -> Option<bool> {
        let slot = Self::slot(index)?;
        self.used_list.get(slot).map(|bit| *bit)
    }

    /// Lowest slot that has never been handed out.
    pub fn next_unused(&self) -> Option<u32> {
        self.used_list
            .first_zero()
            .and_then(|slot| u32::try_from(slot + 1).ok())
    }

    pub fn used_count(&self) -> usize {
        self.used_list.count_ones()
    }

    pub fn used_indices(&self) -> BTreeSet<u32> {
        self.used_list
            .iter_ones()
            .filter_map(|slot| u32::try_from(slot + 1).ok())
            .collect()
    }

    pub fn mark_used(&mut self, index: u32) {
        if let Some(slot) = Self::slot(index) {
            if slot < self.used_list.len() {
                self.used_list.set(slot, true);
            }
        }
    }

    /// Applies an accumulator transition. Indices outside the registry are ignored; callers
    /// validate them before touching the accumulator.
    pub fn apply(&mut self, issued: &BTreeSet<u32>, revoked: &BTreeSet<u32>) {
        let len = self.revocation_list.len();
        for slot in issued.iter().filter_map(|index| Self::slot(*index)) {
            if slot < len {
                self.revocation_list.set(slot, false);
            }
        }
        for slot in revoked.iter().filter_map(|index| Self::slot(*index)) {
            if slot < len {
                self.revocation_list.set(slot, true);
            }
        }
    }

    /// Indices currently inside the accumulator.
    pub fn active_indices(&self) -> BTreeSet<u32> {
        self.revocation_list
            .iter_zeros()
            .filter_map(|slot| u32::try_from(slot + 1).ok())
            .collect()
    }

    /// Indices currently outside the accumulator.
    pub fn inactive_indices(&self) -> BTreeSet<u32> {
        self.revocation_list
            .iter_ones()
            .filter_map(|slot| u32::try_from(slot + 1).ok())
            .collect()
    }
}

pub mod serde_revocation_list {
    use bitvec::vec::BitVec;
    use serde::{
        de::{Deserializer, Error as DeError, SeqAccess, Visitor},
        ser::{SerializeSeq, Serializer},
    };

    pub fn serialize<S>(state: &BitVec, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = s.serialize_seq(Some(state.len()))?;
        for element in state {
            let e = i32::from(*element);
            seq.serialize_element(&e)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct JsonBitStringVisitor;

        impl<'de> Visitor<'de> for JsonBitStringVisitor {
            type Value = BitVec;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a seq containing revocation state, i.e. [1, 0, 1]")
            }

            fn visit_seq<S>(self, mut v: S) -> Result<Self::Value, S::Error>
            where
                S: SeqAccess<'de>,
            {
                let mut bv = BitVec::with_capacity(v.size_hint().unwrap_or_default());
                while let Some(ele) = v.next_element::<u8>()? {
                    match ele {
                        0 => bv.push(false),
                        1 => bv.push(true),
                        _ => {
                            return Err(S::Error::custom("invalid revocation state"));
                        }
                    }
                }
                Ok(bv)
            }
        }
        deserializer.deserialize_seq(JsonBitStringVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rev_reg_def_id() -> RevocationRegistryDefinitionId {
        RevocationRegistryDefinitionId::new_unchecked(
            "NcYxiDXkpYi6ov5FcYDi1e:4:NcYxiDXkpYi6ov5FcYDi1e:3:CL:NcYxiDXkpYi6ov5FcYDi1e:2:gvt:1.0:tag:CL_ACCUM:tag",
        )
    }

    #[test]
    fn by_default_list_starts_fully_active() {
        let list =
            RevocationStatusList::new(rev_reg_def_id(), IssuanceType::ISSUANCE_BY_DEFAULT, 5);
        assert_eq!(list.active_indices(), (1..=5).collect());
        assert!(list.inactive_indices().is_empty());
        assert_eq!(list.next_unused(), Some(1));
    }

    #[test]
    fn on_demand_list_starts_empty() {
        let list = RevocationStatusList::new(rev_reg_def_id(), IssuanceType::ISSUANCE_ON_DEMAND, 5);
        assert!(list.active_indices().is_empty());
        assert_eq!(list.is_active(3), Some(false));
        assert_eq!(list.is_active(0), None);
        assert_eq!(list.is_active(6), None);
    }

    #[test]
    fn apply_moves_indices_in_and_out() {
        let mut list =
            RevocationStatusList::new(rev_reg_def_id(), IssuanceType::ISSUANCE_BY_DEFAULT, 5);
        list.apply(&BTreeSet::new(), &BTreeSet::from([2, 4]));
        assert_eq!(list.inactive_indices(), BTreeSet::from([2, 4]));
        list.apply(&BTreeSet::from([2]), &BTreeSet::new());
        assert_eq!(list.inactive_indices(), BTreeSet::from([4]));
    }

    #[test]
    fn used_slots_are_skipped_when_allocating() {
        let mut list =
            RevocationStatusList::new(rev_reg_def_id(), IssuanceType::ISSUANCE_BY_DEFAULT, 3);
        list.mark_used(1);
        list.mark_used(2);
        assert_eq!(list.next_unused(), Some(3));
        list.mark_used(3);
        assert_eq!(list.next_unused(), None);
        assert_eq!(list.used_count(), 3);
    }

    #[test]
    fn serializes_lists_as_bit_arrays() {
        let mut list = RevocationStatusList::new(rev_reg_def_id(), IssuanceType::ISSUANCE_ON_DEMAND, 3);
        list.apply(&BTreeSet::from([1]), &BTreeSet::new());
        list.mark_used(1);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["revocationList"], json!([0, 1, 1]));
        assert_eq!(json["usedList"], json!([1, 0, 0]));
        let back: RevocationStatusList = serde_json::from_value(json).unwrap();
        assert_eq!(back, list);
    }
}
