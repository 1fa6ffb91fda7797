//! Mutation rules for seed workload objects.
//!
//! Each rule is a guarded edit: a match predicate over the workload's kind,
//! name and namespace, and an edit applied to the pod template when the
//! predicate holds. A rule is only consulted when its name was enabled via
//! the `--mutations` flag; disabled rules never inspect the object.

pub mod gardener_resource_manager;
pub mod gardenlet;
pub mod nginx_ingress_controller;
pub mod single_node_seed;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::workload::Workload;

/// The closed set of mutations this webhook knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mutation {
    NginxIngressController,
    Gardenlet,
    SingleNodeSeed,
    GardenerResourceManager,
}

impl Mutation {
    /// All known mutations, in application order.
    pub const ALL: [Mutation; 4] = [
        Mutation::NginxIngressController,
        Mutation::Gardenlet,
        Mutation::SingleNodeSeed,
        Mutation::GardenerResourceManager,
    ];

    /// The name under which the mutation is enabled on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Mutation::NginxIngressController => "nginx-ingress-controller",
            Mutation::Gardenlet => "gardenlet",
            Mutation::SingleNodeSeed => "single-node-seed",
            Mutation::GardenerResourceManager => "gardener-resource-manager",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a configured mutation name is not part of the closed set.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown mutation: {0}")]
pub struct UnknownMutationError(pub String);

impl FromStr for Mutation {
    type Err = UnknownMutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mutation::ALL
            .iter()
            .copied()
            .find(|mutation| mutation.as_str() == s)
            .ok_or_else(|| UnknownMutationError(s.to_string()))
    }
}

/// The set of mutations enabled for the lifetime of the process.
///
/// Built once at startup from the `--mutations` flag and shared read-only
/// across all concurrent admission requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledMutations(BTreeSet<Mutation>);

impl EnabledMutations {
    /// Validate a list of configured mutation names.
    ///
    /// Fails on the first unrecognized entry, which aborts process startup.
    pub fn from_names<I>(names: I) -> Result<Self, UnknownMutationError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut enabled = BTreeSet::new();
        for name in names {
            enabled.insert(name.as_ref().parse::<Mutation>()?);
        }
        Ok(Self(enabled))
    }

    pub fn contains(&self, mutation: Mutation) -> bool {
        self.0.contains(&mutation)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Mutation> for EnabledMutations {
    fn from_iter<I: IntoIterator<Item = Mutation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for EnabledMutations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for mutation in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            f.write_str(mutation.as_str())?;
        }
        Ok(())
    }
}

/// Result of evaluating all enabled mutations against one workload.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// No enabled rule altered the object; respond without a patch.
    NoChange,
    /// At least one rule fired; carries the edited copy of the object.
    Mutated(Workload),
}

/// Evaluate every enabled mutation against the workload, in catalog order.
///
/// The input object is never modified; edits are applied to a request-scoped
/// copy which is returned only when a rule actually changed it. All enabled
/// rules are evaluated — several rules may fire on the same object.
pub fn apply_all(workload: &Workload, enabled: &EnabledMutations) -> MutationOutcome {
    let mut candidate = workload.clone();
    let mut changed = false;

    for mutation in Mutation::ALL {
        if !enabled.contains(mutation) {
            continue;
        }
        changed |= match mutation {
            Mutation::NginxIngressController => nginx_ingress_controller::mutate(&mut candidate),
            Mutation::Gardenlet => gardenlet::mutate(&mut candidate),
            Mutation::SingleNodeSeed => single_node_seed::mutate(&mut candidate),
            Mutation::GardenerResourceManager => gardener_resource_manager::mutate(&mut candidate),
        };
    }

    if changed {
        MutationOutcome::Mutated(candidate)
    } else {
        MutationOutcome::NoChange
    }
}
