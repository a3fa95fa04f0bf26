use std::collections::{BTreeSet, HashMap};

use super::MetadataCollection;
use crate::config::{RuleSet, TermRule};

/// Read-only lookup over a metadata collection, keyed by term.
///
/// Values keep the collection order inside each term bucket so messages built
/// from them are stable across evaluations.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    terms: HashMap<String, Vec<(Option<String>, String)>>,
    schemas: BTreeSet<String>,
    statements: usize,
}

impl MetadataIndex {
    pub fn build(collection: &MetadataCollection) -> Self {
        let mut terms: HashMap<String, Vec<(Option<String>, String)>> = HashMap::new();
        let mut schemas = BTreeSet::new();

        for statement in collection.statements() {
            terms
                .entry(statement.term.clone())
                .or_default()
                .push((statement.qualifier.clone(), statement.value.clone()));
            if !statement.schema.trim().is_empty() {
                schemas.insert(statement.schema.clone());
            }
        }

        Self {
            terms,
            schemas,
            statements: collection.len(),
        }
    }

    /// Non-empty values for `term`. A `None` qualifier matches every qualifier;
    /// matching is exact and case-sensitive.
    pub fn values_for(&self, term: &str, qualifier: Option<&str>) -> Vec<&str> {
        let Some(bucket) = self.terms.get(term) else {
            return Vec::new();
        };

        bucket
            .iter()
            .filter(|(stored, _)| match qualifier {
                None => true,
                Some(wanted) => stored.as_deref() == Some(wanted),
            })
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.trim().is_empty())
            .collect()
    }

    pub fn rule_values(&self, rule: &TermRule) -> Vec<&str> {
        self.values_for(&rule.term, rule.qualifier.as_deref())
    }

    /// Values of every rule in the set, rule by rule, skipping rules without values.
    pub fn values_by_rule<'r>(&self, rules: &'r RuleSet) -> Vec<(&'r TermRule, Vec<&str>)> {
        rules
            .iter()
            .filter_map(|rule| {
                let values = self.rule_values(rule);
                (!values.is_empty()).then_some((rule, values))
            })
            .collect()
    }

    /// All values found for the set, flattened in rule order.
    pub fn values_for_rules(&self, rules: &RuleSet) -> Vec<&str> {
        rules
            .iter()
            .flat_map(|rule| self.rule_values(rule))
            .collect()
    }

    pub fn has_any(&self, rules: &RuleSet) -> bool {
        rules.iter().any(|rule| !self.rule_values(rule).is_empty())
    }

    pub fn match_count(&self, rules: &RuleSet) -> usize {
        rules
            .iter()
            .filter(|rule| !self.rule_values(rule).is_empty())
            .count()
    }

    /// Every non-empty value of the record, sorted and deduplicated.
    pub fn all_values(&self) -> Vec<&str> {
        let values: BTreeSet<&str> = self
            .terms
            .values()
            .flatten()
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.trim().is_empty())
            .collect();
        values.into_iter().collect()
    }

    /// Distinct statement schemas, e.g. `dc`, `datacite`.
    pub fn schemas(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{HarvestInfo, MetadataStatement};

    fn index() -> MetadataIndex {
        let collection = MetadataCollection::new(
            HarvestInfo::new("10.1234/x", None),
            vec![
                MetadataStatement::new("dc", "identifier", Some("doi"), "10.1234/x"),
                MetadataStatement::new("dc", "identifier", Some("uri"), "http://hdl.handle.net/10261/1"),
                MetadataStatement::new("dc", "title", None, "FAIR EVA evaluation"),
                MetadataStatement::new("dc", "description", None, "   "),
                MetadataStatement::new("datacite", "creators.creator", Some("name"), "Alice Smith"),
            ],
        );
        MetadataIndex::build(&collection)
    }

    #[test]
    fn null_qualifier_matches_any_qualifier() {
        let index = index();
        assert_eq!(index.values_for("identifier", None).len(), 2);
        assert_eq!(index.values_for("identifier", Some("doi")), vec!["10.1234/x"]);
        assert!(index.values_for("identifier", Some("DOI")).is_empty());
        assert!(index.values_for("Identifier", None).is_empty());
    }

    #[test]
    fn blank_values_do_not_count_as_matches() {
        let index = index();
        let rules = RuleSet::from_rules([
            TermRule::new("description", None),
            TermRule::new("title", None),
            TermRule::new("subject", None),
            TermRule::new("creators.creator", Some("name")),
        ]);
        assert_eq!(index.match_count(&rules), 2);
        assert!(index.has_any(&rules));
        assert!(!index.has_any(&RuleSet::from_rules([TermRule::new("description", None)])));
    }

    #[test]
    fn schemas_are_distinct_and_sorted() {
        let index = index();
        assert_eq!(index.schemas().collect::<Vec<_>>(), vec!["datacite", "dc"]);
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn all_values_skip_blanks() {
        assert_eq!(
            index().all_values(),
            vec![
                "10.1234/x",
                "Alice Smith",
                "FAIR EVA evaluation",
                "http://hdl.handle.net/10261/1",
            ]
        );
    }
}
