//! Per-context cache of evaluation keys.
//!
//! Keys are filed by role, then by the key tag of the secret that produced
//! them, then by index. Inserting an existing index replaces that entry only.

use crate::error::{CoreError, CoreResult};
use crate::ids::KeyTag;
use crate::objects::EvalKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyRole {
    /// Relinearization, single key at index 0
    Mult,
    /// Slot rotation, indexed by normalized rotation amount
    Rotation,
    /// Summation, indexed by power-of-two rotation step
    Sum,
    /// Proxy re-encryption; never cached in a store
    ReEncrypt,
}

impl KeyRole {
    pub const CACHED: [KeyRole; 3] = [KeyRole::Mult, KeyRole::Rotation, KeyRole::Sum];
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Mult => write!(f, "EvalMult"),
            KeyRole::Rotation => write!(f, "EvalAutomorphism"),
            KeyRole::Sum => write!(f, "EvalSum"),
            KeyRole::ReEncrypt => write!(f, "ReEncrypt"),
        }
    }
}

/// Index -> key for one role and one key tag
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalKeyMap(BTreeMap<u32, EvalKey>);

impl EvalKeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the replaced key, if any
    pub fn insert(&mut self, key: EvalKey) -> Option<EvalKey> {
        self.0.insert(key.index(), key)
    }

    pub fn get(&self, index: u32) -> Option<&EvalKey> {
        self.0.get(&index)
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvalKey> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tag of the first entry; maps hold keys of a single tag
    pub fn key_tag(&self) -> Option<&KeyTag> {
        self.0.values().next().map(EvalKey::key_tag)
    }

    pub fn role(&self) -> Option<KeyRole> {
        self.0.values().next().map(EvalKey::role)
    }

    pub fn retagged(self, key_tag: &KeyTag) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|(i, k)| (i, k.retagged(key_tag)))
                .collect(),
        )
    }
}

impl FromIterator<EvalKey> for EvalKeyMap {
    fn from_iter<I: IntoIterator<Item = EvalKey>>(iter: I) -> Self {
        let mut map = EvalKeyMap::new();
        for key in iter {
            map.insert(key);
        }
        map
    }
}

impl fmt::Display for EvalKeyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indices: Vec<String> = self.indices().map(|i| i.to_string()).collect();
        match (self.role(), self.key_tag()) {
            (Some(role), Some(tag)) => {
                write!(f, "EvalKeyMap({role} tag={tag} indices=[{}])", indices.join(", "))
            }
            _ => write!(f, "EvalKeyMap(empty)"),
        }
    }
}

/// Combine two partial maps filed under `tag`.
///
/// Indices present in both maps are combined with `combine`; indices present in
/// only one are carried over. Given an associative and commutative `combine`,
/// so is the merge.
pub fn merge_maps<F>(
    a: &EvalKeyMap,
    b: &EvalKeyMap,
    tag: &KeyTag,
    mut combine: F,
) -> CoreResult<EvalKeyMap>
where
    F: FnMut(&EvalKey, &EvalKey) -> CoreResult<EvalKey>,
{
    if let (Some(ra), Some(rb)) = (a.role(), b.role()) {
        if ra != rb {
            return Err(CoreError::InvalidArgument(format!(
                "cannot merge {ra} keys with {rb} keys"
            )));
        }
    }

    let mut out = EvalKeyMap::new();
    for key in a.iter() {
        let merged = match b.get(key.index()) {
            Some(other) => combine(key, other)?,
            None => key.clone(),
        };
        out.insert(merged.retagged(tag));
    }
    for key in b.iter() {
        if a.get(key.index()).is_none() {
            out.insert(key.clone().retagged(tag));
        }
    }
    Ok(out)
}

#[derive(Debug, Default)]
pub struct KeyMaterialStore {
    roles: HashMap<KeyRole, BTreeMap<KeyTag, EvalKeyMap>>,
}

impl KeyMaterialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: EvalKey) -> Option<EvalKey> {
        self.roles
            .entry(key.role())
            .or_default()
            .entry(key.key_tag().clone())
            .or_default()
            .insert(key)
    }

    /// Entry-wise insert; existing indices outside `map` are kept
    pub fn insert_map(&mut self, map: &EvalKeyMap) {
        for key in map.iter() {
            self.insert(key.clone());
        }
    }

    pub fn get(&self, role: KeyRole, tag: &KeyTag, index: u32) -> Option<&EvalKey> {
        self.get_map(role, tag)?.get(index)
    }

    pub fn get_map(&self, role: KeyRole, tag: &KeyTag) -> Option<&EvalKeyMap> {
        self.roles.get(&role)?.get(tag)
    }

    pub fn key_tags(&self, role: KeyRole) -> Vec<KeyTag> {
        self.roles
            .get(&role)
            .map(|maps| maps.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self, role: KeyRole) {
        self.roles.remove(&role);
    }

    pub fn clear_tag(&mut self, role: KeyRole, tag: &KeyTag) -> bool {
        self.roles
            .get_mut(&role)
            .is_some_and(|maps| maps.remove(tag).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.roles.values().all(|maps| maps.values().all(EvalKeyMap::is_empty))
    }

    /// Merge `other` into the map stored under `tag`
    pub fn merge<F>(&mut self, role: KeyRole, tag: &KeyTag, other: &EvalKeyMap, combine: F) -> CoreResult<()>
    where
        F: FnMut(&EvalKey, &EvalKey) -> CoreResult<EvalKey>,
    {
        let current = self.get_map(role, tag).cloned().unwrap_or_default();
        let merged = merge_maps(&current, other, tag, combine)?;
        self.roles.entry(role).or_default().insert(tag.clone(), merged);
        Ok(())
    }

    /// Copy of every map of `role`, optionally restricted to one tag
    pub fn snapshot(&self, role: KeyRole, tag: Option<&KeyTag>) -> BTreeMap<KeyTag, EvalKeyMap> {
        let Some(maps) = self.roles.get(&role) else {
            return BTreeMap::new();
        };
        maps.iter()
            .filter(|(t, _)| tag.is_none_or(|wanted| *t == wanted))
            .map(|(t, m)| (t.clone(), m.clone()))
            .collect()
    }

    pub fn load(&mut self, maps: BTreeMap<KeyTag, EvalKeyMap>) {
        for map in maps.values() {
            self.insert_map(map);
        }
    }
}
