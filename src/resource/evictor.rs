//! Schema-shaped evictor advanced config
//!
//! This is the loose, declaration-friendly form: selector blocks may arrive
//! as a map or as a single-element list, booleans default to `false`, and
//! empty strings or maps mean "not set".

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct EvictionRuleSpec {
    #[serde(
        default,
        deserialize_with = "one_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub pod_selector: Option<PodSelectorSpec>,

    #[serde(
        default,
        deserialize_with = "one_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_selector: Option<NodeSelectorSpec>,

    #[serde(default)]
    pub aggressive: bool,

    #[serde(default)]
    pub disposable: bool,

    #[serde(default)]
    pub removal_disabled: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PodSelectorSpec {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub match_expressions: Vec<MatchExpressionSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NodeSelectorSpec {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub match_expressions: Vec<MatchExpressionSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MatchExpressionSpec {
    pub key: String,
    /// One of In, NotIn, Exists, DoesNotExist; checked on translation
    pub operator: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Accept `null`, a single block, or a list holding at most one block
fn one_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Block<T> {
        Many(Vec<T>),
        One(T),
    }

    match Option::<Block<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Block::One(block)) => Ok(Some(block)),
        Some(Block::Many(mut blocks)) => {
            if blocks.len() > 1 {
                return Err(D::Error::custom("at most one selector block is allowed"));
            }
            Ok(blocks.pop())
        }
    }
}
