// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Resolved rule sets and field permissions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::grant::Grant;
use crate::error::{AbilityError, AbilityResult};

// =============================================================================
// PermittedFields
// =============================================================================

/// The fields a subject may touch on one resource instance.
///
/// Unrestricted access and "no field at all" are distinct variants, so an
/// empty set always means nothing is permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "fields", rename_all = "lowercase")]
pub enum PermittedFields {
    /// Every field.
    All,
    /// Only the listed fields.
    Only(BTreeSet<String>),
    /// Every field except the listed ones.
    Except(BTreeSet<String>),
}

impl PermittedFields {
    /// No field permitted.
    pub fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    /// Returns `true` if the field is permitted.
    pub fn contains(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(fields) => fields.contains(field),
            Self::Except(fields) => !fields.contains(field),
        }
    }

    /// Returns `true` if no field is permitted.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::Only(fields) if fields.is_empty())
    }

    fn allow(self, attributes: Option<&[String]>) -> Self {
        match (self, attributes) {
            (_, None) => Self::All,
            (Self::All, Some(_)) => Self::All,
            (Self::Only(mut fields), Some(attrs)) => {
                fields.extend(attrs.iter().cloned());
                Self::Only(fields)
            }
            (Self::Except(mut fields), Some(attrs)) => {
                for attr in attrs {
                    fields.remove(attr);
                }
                if fields.is_empty() { Self::All } else { Self::Except(fields) }
            }
        }
    }

    fn forbid(self, attributes: Option<&[String]>) -> Self {
        match (self, attributes) {
            (_, None) => Self::none(),
            (Self::All, Some(attrs)) => Self::Except(attrs.iter().cloned().collect()),
            (Self::Only(mut fields), Some(attrs)) => {
                for attr in attrs {
                    fields.remove(attr);
                }
                Self::Only(fields)
            }
            (Self::Except(mut fields), Some(attrs)) => {
                fields.extend(attrs.iter().cloned());
                Self::Except(fields)
            }
        }
    }
}

// =============================================================================
// RuleSet
// =============================================================================

/// An ordered, immutable list of grants.
///
/// Later grants take priority. The serialized form is the plain grant list,
/// which is what access tokens embed; deserializing validates every grant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Grant>", into = "Vec<Grant>")]
pub struct RuleSet {
    rules: Vec<Grant>,
}

impl RuleSet {
    /// Creates a rule set, validating every grant.
    pub fn try_new(rules: Vec<Grant>) -> AbilityResult<Self> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over the rules in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.rules.iter()
    }

    /// Returns `true` if a `manage all` grant is present.
    pub fn is_absolute(&self) -> bool {
        self.rules.iter().any(Grant::is_absolute)
    }

    /// Rules covering the action and resource, highest priority first.
    pub fn rules_for<'a>(
        &'a self,
        action: &'a str,
        resource: &'a str,
    ) -> impl Iterator<Item = &'a Grant> + 'a {
        self.rules
            .iter()
            .rev()
            .filter(move |rule| rule.applies_to(action, resource))
    }

    /// Type-level check: may the subject perform the action on some
    /// instance of the resource?
    ///
    /// Conditions are not evaluated. A `manage all` grant always allows.
    pub fn can(&self, action: &str, resource: &str) -> bool {
        if self.is_absolute() {
            return true;
        }
        self.rules_for(action, resource)
            .find(|rule| rule.matches_type())
            .is_some_and(|rule| !rule.inverted)
    }

    /// Instance check: conditions are evaluated against `instance`.
    pub fn can_on(&self, action: &str, resource: &str, instance: &Value) -> bool {
        if self.is_absolute() {
            return true;
        }
        self.rules_for(action, resource)
            .find(|rule| rule.matches_instance(instance))
            .is_some_and(|rule| !rule.inverted)
    }

    /// Fields of `instance` the subject may use with the action.
    ///
    /// With no instance, inverted conditional rules are ignored and allowing
    /// conditional rules count as matching.
    pub fn permitted_fields(
        &self,
        action: &str,
        resource: &str,
        instance: Option<&Value>,
    ) -> PermittedFields {
        let mut matching: Vec<&Grant> = self
            .rules_for(action, resource)
            .filter(|rule| match instance {
                Some(instance) => rule.condition().is_none_or(|c| c.matches(instance)),
                None => !rule.inverted || rule.condition().is_none(),
            })
            .collect();

        // Apply lowest priority first so higher priority rules override.
        matching.reverse();
        matching
            .into_iter()
            .fold(PermittedFields::none(), |fields, rule| {
                let attrs = rule.attributes.as_deref();
                if rule.inverted {
                    fields.forbid(attrs)
                } else {
                    fields.allow(attrs)
                }
            })
    }

    /// Authorizes an update touching `requested` fields of `instance`.
    ///
    /// Fails with `Forbidden` if the instance is not accessible at all and
    /// with `FieldNotPermitted` on the first field outside the permitted set.
    pub fn authorize_fields<I, S>(
        &self,
        action: &str,
        resource: &str,
        instance: &Value,
        requested: I,
    ) -> AbilityResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.can_on(action, resource, instance) {
            return Err(AbilityError::forbidden(action, resource));
        }

        let permitted = self.permitted_fields(action, resource, Some(instance));
        for field in requested {
            let field = field.as_ref();
            if !permitted.contains(field) {
                return Err(AbilityError::field_not_permitted(field, action, resource));
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<Grant>> for RuleSet {
    type Error = AbilityError;

    fn try_from(rules: Vec<Grant>) -> Result<Self, Self::Error> {
        Self::try_new(rules)
    }
}

impl From<RuleSet> for Vec<Grant> {
    fn from(rule_set: RuleSet) -> Self {
        rule_set.rules
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Grant;
    type IntoIter = std::slice::Iter<'a, Grant>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{actions, resources};
    use serde_json::json;

    fn teacher_rules(uid: i64) -> RuleSet {
        RuleSet::try_new(vec![
            Grant::new(actions::GET, resources::COURSE).when("teacher.user.id", uid),
            Grant::new(actions::UPDATE, resources::COURSE)
                .when("teacher.user.id", uid)
                .fields(["description"]),
        ])
        .unwrap()
    }

    fn course(id: i64, teacher_uid: i64) -> Value {
        json!({
            "id": id,
            "name": "Algorithms",
            "description": "Sorting and searching",
            "teacher": { "user": { "id": teacher_uid } }
        })
    }

    fn fields(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_manage_all_is_absolute() {
        let conditional_admin = Grant::manage_all().when("id", 1);
        let rules = RuleSet::try_new(vec![conditional_admin]).unwrap();
        for action in ["get", "update", "delete", "archive"] {
            for resource in ["Course", "User", "Anything"] {
                assert!(rules.can(action, resource));
                assert!(rules.can_on(action, resource, &json!({ "id": 2 })));
            }
        }
    }

    #[test]
    fn test_can_is_type_level() {
        let rules = teacher_rules(2);
        assert!(rules.can(actions::GET, resources::COURSE));
        assert!(rules.can(actions::UPDATE, resources::COURSE));
        assert!(!rules.can(actions::DELETE, resources::COURSE));
        assert!(!rules.can(actions::GET, resources::USER));
    }

    #[test]
    fn test_can_on_evaluates_conditions() {
        let rules = teacher_rules(2);
        assert!(rules.can_on(actions::GET, resources::COURSE, &course(1, 2)));
        assert!(!rules.can_on(actions::GET, resources::COURSE, &course(1, 3)));
    }

    #[test]
    fn test_permitted_fields() {
        let rules = teacher_rules(2);
        assert_eq!(
            rules.permitted_fields(actions::UPDATE, resources::COURSE, Some(&course(1, 2))),
            PermittedFields::Only(fields(&["description"]))
        );
        assert_eq!(
            rules.permitted_fields(actions::GET, resources::COURSE, Some(&course(1, 2))),
            PermittedFields::All
        );
        assert!(rules
            .permitted_fields(actions::UPDATE, resources::COURSE, Some(&course(1, 3)))
            .is_none());
    }

    #[test]
    fn test_permitted_fields_union() {
        let rules = RuleSet::try_new(vec![
            Grant::new(actions::UPDATE, resources::COURSE).fields(["name"]),
            Grant::new(actions::UPDATE, resources::COURSE).fields(["description"]),
        ])
        .unwrap();
        assert_eq!(
            rules.permitted_fields(actions::UPDATE, resources::COURSE, None),
            PermittedFields::Only(fields(&["description", "name"]))
        );
    }

    #[test]
    fn test_authorize_fields_fails_closed() {
        let rules = teacher_rules(2);
        let own = course(1, 2);

        assert!(rules
            .authorize_fields(actions::UPDATE, resources::COURSE, &own, ["description"])
            .is_ok());

        let err = rules
            .authorize_fields(actions::UPDATE, resources::COURSE, &own, ["description", "name"])
            .unwrap_err();
        assert_eq!(
            err,
            AbilityError::field_not_permitted("name", actions::UPDATE, resources::COURSE)
        );

        let err = rules
            .authorize_fields(actions::UPDATE, resources::COURSE, &course(1, 3), ["description"])
            .unwrap_err();
        assert!(matches!(err, AbilityError::Forbidden { .. }));
    }

    #[test]
    fn test_inverted_rule_last_match_wins() {
        let rules = RuleSet::try_new(vec![
            Grant::new(actions::GET, resources::COURSE),
            Grant::new(actions::GET, resources::COURSE).inverted(),
        ])
        .unwrap();
        assert!(!rules.can(actions::GET, resources::COURSE));

        let rules = RuleSet::try_new(vec![
            Grant::new(actions::GET, resources::COURSE).inverted(),
            Grant::new(actions::GET, resources::COURSE),
        ])
        .unwrap();
        assert!(rules.can(actions::GET, resources::COURSE));
    }

    #[test]
    fn test_inverted_conditional_rule() {
        let rules = RuleSet::try_new(vec![
            Grant::new(actions::GET, resources::COURSE),
            Grant::new(actions::GET, resources::COURSE).when("archived", true).inverted(),
        ])
        .unwrap();

        assert!(rules.can(actions::GET, resources::COURSE));
        assert!(rules.can_on(actions::GET, resources::COURSE, &json!({ "archived": false })));
        assert!(!rules.can_on(actions::GET, resources::COURSE, &json!({ "archived": true })));
    }

    #[test]
    fn test_inverted_fields() {
        let rules = RuleSet::try_new(vec![
            Grant::new(actions::UPDATE, resources::COURSE),
            Grant::new(actions::UPDATE, resources::COURSE).fields(["code"]).inverted(),
        ])
        .unwrap();

        assert!(rules.can(actions::UPDATE, resources::COURSE));
        let permitted = rules.permitted_fields(actions::UPDATE, resources::COURSE, None);
        assert_eq!(permitted, PermittedFields::Except(fields(&["code"])));
        assert!(permitted.contains("name"));
        assert!(!permitted.contains("code"));
    }

    #[test]
    fn test_wire_round_trip_preserves_answers() {
        let rules = teacher_rules(2);
        let wire = serde_json::to_string(&rules).unwrap();
        let back: RuleSet = serde_json::from_str(&wire).unwrap();

        assert_eq!(back, rules);
        let own = course(1, 2);
        assert_eq!(
            back.permitted_fields(actions::UPDATE, resources::COURSE, Some(&own)),
            rules.permitted_fields(actions::UPDATE, resources::COURSE, Some(&own))
        );
        assert_eq!(
            back.can(actions::DELETE, resources::COURSE),
            rules.can(actions::DELETE, resources::COURSE)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let wire = r#"[{"action":"get","resource":"Course","condition":{"a":[1]}}]"#;
        assert!(serde_json::from_str::<RuleSet>(wire).is_err());
    }

    #[test]
    fn test_permitted_fields_serde() {
        let json = serde_json::to_value(PermittedFields::Only(fields(&["description"]))).unwrap();
        assert_eq!(json, json!({ "mode": "only", "fields": ["description"] }));
        let json = serde_json::to_value(PermittedFields::All).unwrap();
        assert_eq!(json, json!({ "mode": "all" }));
    }
}
