//! Execution planner - turns configuration and state into ordered changes

use crate::config::{ConfigDocument, Reference, Resolved, ResourceConfig};
use crate::diff::{ChangeAction, Desired, DiffSummary, ResourceDiff};
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::provider::Provider;
use crate::state::State;
use crate::types::Address;
use std::collections::{BTreeMap, BTreeSet};

/// What a plan converges towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanMode {
    /// Make remote objects match the configuration
    #[default]
    Normal,
    /// Delete everything tracked in state
    Destroy,
}

/// Ordered set of changes.
///
/// Deletes run first, dependents before dependencies. Creates, updates and
/// replacements follow, dependencies first. Addresses within one level are
/// independent of each other.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub mode: PlanMode,
    diffs: BTreeMap<Address, ResourceDiff>,
    delete_levels: Vec<Vec<Address>>,
    apply_levels: Vec<Vec<Address>>,
}

impl Plan {
    pub fn get(&self, address: &Address) -> Option<&ResourceDiff> {
        self.diffs.get(address)
    }

    /// Delete levels in execution order
    pub fn delete_levels(&self) -> &[Vec<Address>] {
        &self.delete_levels
    }

    /// Create/update/replace levels in execution order
    pub fn apply_levels(&self) -> &[Vec<Address>] {
        &self.apply_levels
    }

    /// Diffs with changes, in execution order.
    pub fn changes(&self) -> impl Iterator<Item = &ResourceDiff> {
        self.delete_levels
            .iter()
            .chain(self.apply_levels.iter())
            .flatten()
            .filter_map(|addr| self.diffs.get(addr))
    }

    /// Every diff including no-ops, sorted by address.
    pub fn diffs(&self) -> impl Iterator<Item = &ResourceDiff> {
        self.diffs.values()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_diffs(self.diffs.values())
    }

    pub fn has_changes(&self) -> bool {
        self.summary().has_changes()
    }

    /// Keep only changes for `target` (`type` or `type.name`) and what they
    /// depend on in the same plan.
    pub fn filter_by_target(mut self, target: Option<&str>) -> Self {
        let Some(target) = target else {
            return self;
        };
        let keep: BTreeSet<Address> = self
            .diffs
            .keys()
            .filter(|addr| matches_target(addr, target))
            .cloned()
            .collect();
        for level in self
            .delete_levels
            .iter_mut()
            .chain(self.apply_levels.iter_mut())
        {
            level.retain(|addr| keep.contains(addr));
        }
        self.delete_levels.retain(|l| !l.is_empty());
        self.apply_levels.retain(|l| !l.is_empty());
        self.diffs.retain(|addr, _| keep.contains(addr));
        self
    }
}

fn matches_target(address: &Address, target: &str) -> bool {
    match target.split_once('.') {
        Some((t, n)) => address.resource_type == t && address.name == n,
        None => address.resource_type == target,
    }
}

/// Check every declaration against its schema without touching state.
///
/// References count as unknown values.
pub fn validate<M>(provider: &Provider<M>, config: &ConfigDocument) -> Result<()> {
    for rc in config.resources() {
        let resource = provider.resource(&rc.address.resource_type)?;
        let (attributes, unknown) = rc.resolve(&|_: &Reference| Resolved::Unknown);
        resource
            .schema()
            .validate(&rc.address.to_string(), &attributes, &unknown)?;
    }
    DependencyGraph::from_map(config.dependency_map()).levels()?;
    Ok(())
}

/// Build a plan.
pub fn plan<M>(
    provider: &Provider<M>,
    config: &ConfigDocument,
    state: &State,
    mode: PlanMode,
) -> Result<Plan> {
    let mut plan = Plan {
        mode,
        ..Default::default()
    };

    if mode == PlanMode::Normal {
        plan_declared(provider, config, state, &mut plan)?;
    }

    let mut teardown = DependencyGraph::new();
    for instance in state.resources.values() {
        let address = instance.address();
        if mode == PlanMode::Normal && config.get(&address).is_some() {
            continue;
        }
        let resource = provider.resource(&instance.resource_type)?;
        plan.diffs.insert(
            address.clone(),
            ResourceDiff::compute(address.clone(), resource.schema(), Some(instance), None),
        );
        teardown.add_node(address.clone());
        for dep in &instance.dependencies {
            if let Ok(dep) = dep.parse::<Address>()
                && state.contains(&dep)
                && (mode == PlanMode::Destroy || config.get(&dep).is_none())
            {
                teardown.add_edge(address.clone(), dep);
            }
        }
    }
    plan.delete_levels = teardown.reverse_levels()?;

    log::debug!("planned {}", plan.summary());
    Ok(plan)
}

fn plan_declared<M>(
    provider: &Provider<M>,
    config: &ConfigDocument,
    state: &State,
    plan: &mut Plan,
) -> Result<()> {
    let levels = DependencyGraph::from_map(config.dependency_map()).levels()?;
    let mut desired_by_address: BTreeMap<Address, Desired> = BTreeMap::new();

    for level in levels {
        let mut changed = Vec::new();
        for address in level {
            let Some(rc) = config.get(&address) else {
                continue;
            };
            let resource = provider.resource(&address.resource_type)?;
            let schema = resource.schema();

            let lookup = |r: &Reference| planned_value(r, state, &plan.diffs, &desired_by_address);
            let desired = desired_state(rc, schema, &lookup)?;
            let diff = ResourceDiff::compute(
                address.clone(),
                schema,
                state.get(&address),
                Some(&desired),
            );
            if diff.has_changes() {
                changed.push(address.clone());
            }
            plan.diffs.insert(address.clone(), diff);
            desired_by_address.insert(address, desired);
        }
        if !changed.is_empty() {
            plan.apply_levels.push(changed);
        }
    }
    Ok(())
}

fn desired_state(
    rc: &ResourceConfig,
    schema: &crate::schema::Schema,
    lookup: &dyn Fn(&Reference) -> Resolved,
) -> Result<Desired> {
    let (mut attributes, unknown) = rc.resolve(lookup);
    schema.validate(&rc.address.to_string(), &attributes, &unknown)?;
    schema.apply_defaults(&mut attributes);
    for key in &unknown {
        attributes.remove(key);
    }
    schema.normalize(&mut attributes);
    Ok(Desired {
        attributes,
        unknown,
    })
}

/// Value a reference will have once its target is applied.
///
/// A target with no pending change, or one whose attribute is not touched by
/// an update, is settled: a missing attribute there is absent rather than
/// unknown.
fn planned_value(
    reference: &Reference,
    state: &State,
    diffs: &BTreeMap<Address, ResourceDiff>,
    desired: &BTreeMap<Address, Desired>,
) -> Resolved {
    let Some(diff) = diffs.get(&reference.target) else {
        return Resolved::Unknown;
    };
    let attribute = reference.attribute.as_str();
    let declared = || {
        desired
            .get(&reference.target)
            .and_then(|d| d.attributes.get(attribute))
            .cloned()
    };
    match diff.action {
        ChangeAction::Create | ChangeAction::Replace if attribute == "id" => Resolved::Unknown,
        ChangeAction::Create | ChangeAction::Replace => Resolved::pending(declared()),
        ChangeAction::Update if diff.changes_attribute(attribute) => Resolved::pending(declared()),
        ChangeAction::Update | ChangeAction::NoOp => Resolved::settled(
            state
                .get(&reference.target)
                .and_then(|i| i.attribute(attribute)),
        ),
        ChangeAction::Delete => Resolved::Unknown,
    }
}
