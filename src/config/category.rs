//! Category and group validation.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::error::{ResolveError, Staged, ValidationError};
use super::json::{rejects, CategoryJson, GroupsJson};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMember {
    pub id: String,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub name: String,
    pub description: String,
    /// Members in declaration order.
    pub audits: Vec<CategoryMember>,
}

impl Category {
    pub fn audit_ids(&self) -> impl Iterator<Item = &str> {
        self.audits.iter().map(|m| m.id.as_str())
    }
}

/// Build the group map. List-form groups must have unique ids.
pub fn resolve_groups(
    json: Option<&GroupsJson>,
) -> Result<BTreeMap<String, Group>, Vec<ResolveError>> {
    resolve_groups_staged(json).into_result()
}

pub(crate) fn resolve_groups_staged(json: Option<&GroupsJson>) -> Staged<BTreeMap<String, Group>> {
    let mut groups = BTreeMap::new();
    let mut errors = Vec::new();

    match json {
        None => {}
        Some(GroupsJson::Map(map)) => {
            for (id, group) in map {
                groups.insert(
                    id.clone(),
                    Group {
                        title: group.title.clone(),
                        description: group.description.clone(),
                    },
                );
            }
        }
        Some(GroupsJson::List(list)) => {
            for keyed in list {
                if groups.contains_key(&keyed.id) {
                    errors.push(
                        ValidationError::DuplicateGroup {
                            group: keyed.id.clone(),
                        }
                        .into(),
                    );
                    continue;
                }
                groups.insert(
                    keyed.id.clone(),
                    Group {
                        title: keyed.group.title.clone(),
                        description: keyed.group.description.clone(),
                    },
                );
            }
        }
    }

    Staged::new(groups, errors)
}

/// Check every category member against the resolved audits and groups.
///
/// Every dangling reference is reported.
pub fn validate_categories(
    json: Option<&BTreeMap<String, CategoryJson>>,
    audit_ids: &BTreeSet<String>,
    groups: &BTreeMap<String, Group>,
) -> Result<BTreeMap<String, Category>, Vec<ResolveError>> {
    validate_categories_staged(json, audit_ids, groups).into_result()
}

pub(crate) fn validate_categories_staged(
    json: Option<&BTreeMap<String, CategoryJson>>,
    audit_ids: &BTreeSet<String>,
    groups: &BTreeMap<String, Group>,
) -> Staged<BTreeMap<String, Category>> {
    let mut categories = BTreeMap::new();
    let mut errors: Vec<ResolveError> = Vec::new();

    for (category_id, category) in json.into_iter().flatten() {
        for rejected in &category.rejected {
            errors.push(
                ValidationError::InvalidCategoryField {
                    category: category_id.clone(),
                    field: rejected.field.clone(),
                    reason: rejected.reason.clone(),
                }
                .into(),
            );
        }

        for (index, member) in category.audits.iter().enumerate() {
            let has_id = !member.id.trim().is_empty();
            for rejected in &member.rejected {
                errors.push(
                    ValidationError::InvalidMemberField {
                        category: category_id.clone(),
                        member: if has_id {
                            member.id.clone()
                        } else {
                            format!("#{}", index)
                        },
                        field: rejected.field.clone(),
                        reason: rejected.reason.clone(),
                    }
                    .into(),
                );
            }

            if !has_id {
                if !rejects(&member.rejected, "id") {
                    errors.push(
                        ValidationError::MissingAuditId {
                            category: category_id.clone(),
                            index,
                        }
                        .into(),
                    );
                }
                continue;
            }
            if !audit_ids.contains(&member.id) {
                errors.push(
                    ValidationError::UnknownAudit {
                        category: category_id.clone(),
                        audit_id: member.id.clone(),
                    }
                    .into(),
                );
            }
            if let Some(group) = &member.group {
                if !groups.contains_key(group) {
                    errors.push(
                        ValidationError::UnknownGroup {
                            category: category_id.clone(),
                            audit_id: member.id.clone(),
                            group: group.clone(),
                        }
                        .into(),
                    );
                }
            }
            if !member.weight.is_finite() || member.weight < 0.0 {
                errors.push(
                    ValidationError::InvalidWeight {
                        category: category_id.clone(),
                        audit_id: member.id.clone(),
                        weight: member.weight,
                    }
                    .into(),
                );
            }
        }

        categories.insert(
            category_id.clone(),
            Category {
                name: category.name.clone(),
                description: category.description.clone(),
                audits: category
                    .audits
                    .iter()
                    .map(|m| CategoryMember {
                        id: m.id.clone(),
                        weight: m.weight,
                        group: m.group.clone(),
                    })
                    .collect(),
            },
        );
    }

    Staged::new(categories, errors)
}
