//! Scoring prompt construction.
//!
//! One prompt carries the whole batch; posts are labelled by index so the
//! model can answer with a single comma-separated line.

use crate::domain::{CriteriaSet, WorkItem};

/// Instruction used when no criterion carries a positive weight
pub const DEFAULT_CRITERIA: &str =
    "Judge how well thought out each post is: clarity of reasoning, depth, and originality matter most.";

/// Build the scoring prompt for a batch
pub fn build_prompt(batch: &[WorkItem], criteria: &CriteriaSet) -> String {
    let mut prompt = format!(
        "Rate each of the following {} posts on a scale of 1-10 based on how well thought out it is.\n",
        batch.len()
    );

    prompt.push_str(&criteria_clause(criteria));
    prompt.push_str("\n\n");
    prompt.push_str(
        "Respond with only the numeric ratings, in the same order as the posts, separated by commas \
         (for example: 7, 3, 9). Do not include any other text.\n\n",
    );

    for (i, item) in batch.iter().enumerate() {
        prompt.push_str(&format!("Post {}: \"{}\"\n", i + 1, item.text.trim()));
    }

    prompt
}

/// Render the criteria part of the prompt
pub fn criteria_clause(criteria: &CriteriaSet) -> String {
    if !criteria.has_active() {
        return DEFAULT_CRITERIA.to_string();
    }

    let mut clause = String::from("Rank by the following criteria (higher weight matters more):");
    for criterion in criteria.active() {
        clause.push_str(&format!("\n- {} (weight {})", criterion.text.trim(), criterion.weight));
    }
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Criterion;

    fn items() -> Vec<WorkItem> {
        vec![
            WorkItem::new("a", "First post"),
            WorkItem::new("b", "  Second post  "),
        ]
    }

    #[test]
    fn test_prompt_labels_every_item() {
        let prompt = build_prompt(&items(), &CriteriaSet::default());
        assert!(prompt.contains("Post 1: \"First post\""));
        assert!(prompt.contains("Post 2: \"Second post\""));
        assert!(prompt.contains("following 2 posts"));
        assert!(prompt.contains("separated by commas"));
    }

    #[test]
    fn test_default_clause_without_active_criteria() {
        let criteria = CriteriaSet::new(vec![Criterion::new("humor", 0)]);
        let prompt = build_prompt(&items(), &criteria);
        assert!(prompt.contains(DEFAULT_CRITERIA));
        assert!(!prompt.contains("humor"));
    }

    #[test]
    fn test_weighted_clause() {
        let criteria = CriteriaSet::new(vec![
            Criterion::new("cites evidence", 5),
            Criterion::new("humor", 0),
            Criterion::new("novelty", 2),
        ]);
        let clause = criteria_clause(&criteria);
        assert!(clause.contains("higher weight matters more"));
        assert!(clause.contains("- cites evidence (weight 5)"));
        assert!(clause.contains("- novelty (weight 2)"));
        assert!(!clause.contains("humor"));
        assert!(!clause.contains(DEFAULT_CRITERIA));
    }

    #[test]
    fn test_criteria_order_preserved() {
        let criteria = CriteriaSet::new(vec![Criterion::new("zeta", 1), Criterion::new("alpha", 1)]);
        let clause = criteria_clause(&criteria);
        let zeta = clause.find("zeta").unwrap();
        let alpha = clause.find("alpha").unwrap();
        assert!(zeta < alpha);
    }
}
