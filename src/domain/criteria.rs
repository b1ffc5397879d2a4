//! Weighted scoring criteria.
//!
//! The criteria set is user configuration; the pipeline only reads the latest
//! value each time it builds a prompt.

use serde::{Deserialize, Deserializer, Serialize};

/// Largest weight a criterion can carry
pub const MAX_WEIGHT: u8 = 5;

/// One qualitative dimension. Weight 0 means inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub text: String,
    #[serde(deserialize_with = "clamp_weight")]
    pub weight: u8,
}

/// Weights read from config are clamped the same way `Criterion::new` clamps
fn clamp_weight<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let weight = u64::deserialize(deserializer)?;
    Ok(weight.min(u64::from(MAX_WEIGHT)) as u8)
}

impl Criterion {
    /// Create a criterion, clamping the weight into 0..=5
    pub fn new(text: impl Into<String>, weight: u8) -> Self {
        Self {
            text: text.into(),
            weight: weight.min(MAX_WEIGHT),
        }
    }

    pub fn is_active(&self) -> bool {
        self.weight > 0 && !self.text.trim().is_empty()
    }
}

/// Ordered sequence of criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaSet(Vec<Criterion>);

impl CriteriaSet {
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self(criteria)
    }

    /// Criteria with a positive weight, in configured order
    pub fn active(&self) -> impl Iterator<Item = &Criterion> {
        self.0.iter().filter(|c| c.is_active())
    }

    pub fn has_active(&self) -> bool {
        self.active().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Criterion>> for CriteriaSet {
    fn from(criteria: Vec<Criterion>) -> Self {
        Self(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_is_clamped() {
        assert_eq!(Criterion::new("depth", 9).weight, MAX_WEIGHT);
        assert_eq!(Criterion::new("depth", 3).weight, 3);
    }

    #[test]
    fn test_zero_weight_is_inactive() {
        let set = CriteriaSet::new(vec![Criterion::new("humor", 0), Criterion::new("evidence", 4)]);
        let active: Vec<_> = set.active().map(|c| c.text.as_str()).collect();
        assert_eq!(active, vec!["evidence"]);
        assert!(set.has_active());
    }

    #[test]
    fn test_blank_text_is_inactive() {
        let set = CriteriaSet::new(vec![Criterion::new("  ", 5)]);
        assert!(!set.has_active());
    }

    #[test]
    fn test_empty_set() {
        let set = CriteriaSet::default();
        assert!(set.is_empty());
        assert!(!set.has_active());
    }

    #[test]
    fn test_deserialize_as_plain_list() {
        let set: CriteriaSet =
            serde_yaml::from_str("- text: original insight\n  weight: 5\n- text: tone\n  weight: 0\n").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.active().count(), 1);
    }

    #[test]
    fn test_deserialized_weight_is_clamped() {
        let set: CriteriaSet =
            serde_yaml::from_str("- text: sources\n  weight: 9\n- text: depth\n  weight: 300\n").unwrap();
        let weights: Vec<u8> = set.active().map(|c| c.weight).collect();
        assert_eq!(weights, vec![MAX_WEIGHT, MAX_WEIGHT]);
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let result = serde_yaml::from_str::<CriteriaSet>("- text: sources\n  weight: -1\n");
        assert!(result.is_err());
    }
}
