//! Execution engine - refreshes, applies and imports resource instances
//!
//! Instances within one dependency level run on a bounded rayon pool. State
//! is only mutated between levels, on the calling thread. A level with a
//! failure stops the run; everything that succeeded so far stays in state.

use crate::config::{ConfigDocument, Reference, Resolved};
use crate::context::ProgressCallback;
use crate::data::ResourceData;
use crate::diff::ChangeAction;
use crate::error::{EngineError, Result};
use crate::planner::{self, Plan, PlanMode};
use crate::provider::Provider;
use crate::resource::Resource;
use crate::state::{InstanceState, State};
use crate::types::{Address, ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::{Context, anyhow};
use rayon::prelude::*;

/// Outcome of a refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    /// Instances that no longer exist remotely and were dropped
    pub removed: Vec<Address>,
}

enum StateUpdate {
    Put(InstanceState),
    Remove,
    Keep,
}

struct Outcome {
    address: Address,
    result: ApplyResult,
    update: StateUpdate,
}

/// Drives a provider's resources against remote objects.
pub struct Engine<'a, M> {
    provider: &'a Provider<M>,
    meta: &'a M,
    options: ExecuteOptions,
}

impl<'a, M: Sync> Engine<'a, M> {
    pub fn new(provider: &'a Provider<M>, meta: &'a M) -> Self {
        Self {
            provider,
            meta,
            options: ExecuteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecuteOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate a configuration against the provider's schemas.
    pub fn validate(&self, config: &ConfigDocument) -> Result<()> {
        planner::validate(self.provider, config)
    }

    /// Plan changes for a configuration.
    pub fn plan(&self, config: &ConfigDocument, state: &State, mode: PlanMode) -> Result<Plan> {
        planner::plan(self.provider, config, state, mode)
    }

    /// Re-read every tracked instance, dropping those that are gone.
    pub fn refresh(&self, state: &mut State) -> Result<RefreshSummary> {
        let instances: Vec<InstanceState> = state.resources.values().cloned().collect();
        let results = self.run_parallel(&instances, |instance| {
            (instance.address(), self.refresh_instance(instance))
        })?;

        let mut summary = RefreshSummary::default();
        for (address, result) in results {
            match result? {
                Some(instance) => {
                    summary.refreshed += 1;
                    state.insert(instance);
                }
                None => {
                    log::warn!("{address} no longer exists, removing it from state");
                    state.remove(&address);
                    summary.removed.push(address);
                }
            }
        }
        Ok(summary)
    }

    fn refresh_instance(&self, instance: &InstanceState) -> Result<Option<InstanceState>> {
        let address = instance.address();
        let resource = self.provider.resource(&instance.resource_type)?;
        let mut data = ResourceData::from_parts(instance.id.clone(), instance.attributes.clone());

        let exists = resource
            .exists(&data, self.meta)
            .map_err(|source| resource_error(&address, source))?;
        if !exists {
            return Ok(None);
        }

        resource
            .read(&mut data, self.meta)
            .map_err(|source| resource_error(&address, source))?;
        if !data.has_id() {
            return Ok(None);
        }

        let (id, mut attributes) = data.into_parts();
        resource.schema().normalize(&mut attributes);
        Ok(Some(InstanceState {
            id,
            attributes,
            ..instance.clone()
        }))
    }

    /// Execute a plan, updating `state` as instances complete.
    ///
    /// Failures are recorded in the summary rather than returned, so the
    /// caller can persist the state that was reached.
    pub fn apply<P: ProgressCallback>(
        &self,
        config: &ConfigDocument,
        plan: &Plan,
        state: &mut State,
        progress: &mut P,
    ) -> Result<ExecuteSummary> {
        let mut summary = ExecuteSummary::default();

        for level in plan.delete_levels() {
            self.run_level(level, plan, state, progress, &mut summary, |addr, state| {
                self.delete_instance(addr, state)
            })?;
            if !summary.is_success() {
                return Ok(summary);
            }
        }

        if plan.mode == PlanMode::Destroy {
            return Ok(summary);
        }

        for level in plan.apply_levels() {
            self.run_level(level, plan, state, progress, &mut summary, |addr, state| {
                let action = plan.get(addr).map_or(ChangeAction::NoOp, |d| d.action);
                self.apply_instance(config, addr, action, state)
            })?;
            if !summary.is_success() {
                break;
            }
        }

        Ok(summary)
    }

    fn run_level<P, F>(
        &self,
        level: &[Address],
        plan: &Plan,
        state: &mut State,
        progress: &mut P,
        summary: &mut ExecuteSummary,
        task: F,
    ) -> Result<()>
    where
        P: ProgressCallback,
        F: Fn(&Address, &State) -> Outcome + Sync,
    {
        progress.on_level_start(level.len());
        for address in level {
            let action = plan.get(address).map_or(ChangeAction::NoOp, |d| d.action);
            progress.on_resource_start(address, action);
        }

        let snapshot: &State = state;
        let outcomes = self.run_parallel(level, |addr| task(addr, snapshot))?;

        for outcome in outcomes {
            match outcome.update {
                StateUpdate::Put(instance) => state.insert(instance),
                StateUpdate::Remove => {
                    state.remove(&outcome.address);
                }
                StateUpdate::Keep => {}
            }
            let address = outcome.address.to_string();
            if let ApplyResult::Failed { error } = &outcome.result {
                log::error!("{address}: {error}");
            } else {
                log::info!("{address}: {:?}", outcome.result);
            }
            summary.add_result(&address, &outcome.result);
            progress.on_resource_complete(&outcome.address, &outcome.result);
        }
        progress.on_level_complete();
        Ok(())
    }

    /// Map items on the pool, preserving order.
    fn run_parallel<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if self.options.jobs <= 1 || items.len() <= 1 {
            return Ok(items.iter().map(f).collect());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build()
            .map_err(|e| EngineError::InvalidConfig(format!("failed to create thread pool: {e}")))?;
        Ok(pool.install(|| items.par_iter().map(f).collect()))
    }

    fn delete_instance(&self, address: &Address, state: &State) -> Outcome {
        let Some(prior) = state.get(address) else {
            return Outcome {
                address: address.clone(),
                result: ApplyResult::NoChange,
                update: StateUpdate::Keep,
            };
        };
        let result = self
            .provider
            .resource(&prior.resource_type)
            .map_err(anyhow::Error::from)
            .and_then(|resource| {
                let mut data =
                    ResourceData::from_parts(prior.id.clone(), prior.attributes.clone());
                resource.delete(&mut data, self.meta)
            });
        match result {
            Ok(()) => Outcome {
                address: address.clone(),
                result: ApplyResult::Deleted,
                update: StateUpdate::Remove,
            },
            Err(e) => failed(address, &e, StateUpdate::Keep),
        }
    }

    fn apply_instance(
        &self,
        config: &ConfigDocument,
        address: &Address,
        action: ChangeAction,
        state: &State,
    ) -> Outcome {
        let resource = match self.provider.resource(&address.resource_type) {
            Ok(r) => r,
            Err(e) => return failed(address, &anyhow::Error::from(e), StateUpdate::Keep),
        };
        let desired = match desired_data(resource, config, address, state) {
            Ok(d) => d,
            Err(e) => return failed(address, &e, StateUpdate::Keep),
        };
        let dependencies: Vec<String> = config
            .get(address)
            .map(|rc| rc.dependencies().iter().map(ToString::to_string).collect())
            .unwrap_or_default();

        let prior = state.get(address);
        let (mut data, result) = match (action, prior) {
            (ChangeAction::Update, Some(prior)) => {
                let mut data = ResourceData::from_parts(prior.id.clone(), prior.attributes.clone());
                for field in resource.schema().fields().filter(|f| f.is_configurable()) {
                    match desired.get(field.name) {
                        Some(v) => data.set(field.name, v.clone()),
                        None if !field.computed => {
                            data.remove(field.name);
                        }
                        None => {}
                    }
                }
                (data, ApplyResult::Updated)
            }
            (ChangeAction::Replace, Some(prior)) => {
                let mut old = ResourceData::from_parts(prior.id.clone(), prior.attributes.clone());
                if let Err(e) = resource.delete(&mut old, self.meta) {
                    return failed(address, &e.context("deleting for replacement"), StateUpdate::Keep);
                }
                (desired, ApplyResult::Replaced)
            }
            (ChangeAction::NoOp, _) => {
                return Outcome {
                    address: address.clone(),
                    result: ApplyResult::NoChange,
                    update: StateUpdate::Keep,
                };
            }
            _ => (desired, ApplyResult::Created),
        };

        let call = if result == ApplyResult::Updated {
            resource.update(&mut data, self.meta)
        } else {
            resource.create(&mut data, self.meta)
        };
        let on_failure = if result == ApplyResult::Replaced {
            StateUpdate::Remove
        } else {
            StateUpdate::Keep
        };
        if let Err(e) = call {
            return failed(address, &e, on_failure);
        }
        if !data.has_id() {
            return failed(
                address,
                &anyhow!("provider returned no id; the object may have been removed during apply"),
                on_failure,
            );
        }

        let (id, mut attributes) = data.into_parts();
        resource.schema().normalize(&mut attributes);
        Outcome {
            address: address.clone(),
            result,
            update: StateUpdate::Put(InstanceState {
                resource_type: address.resource_type.clone(),
                name: address.name.clone(),
                id,
                dependencies,
                attributes,
            }),
        }
    }

    /// Bring an existing remote object under management.
    pub fn import(&self, state: &mut State, address: &Address, import_id: &str) -> Result<()> {
        if state.contains(address) {
            return Err(EngineError::AlreadyManaged(address.to_string()));
        }
        let resource = self.provider.resource(&address.resource_type)?;
        let importer = resource
            .importer()
            .ok_or_else(|| EngineError::ImportNotSupported(address.resource_type.clone()))?;

        let mut data = importer
            .prepare(import_id)
            .map_err(|source| resource_error(address, source))?;
        resource
            .read(&mut data, self.meta)
            .map_err(|source| resource_error(address, source))?;
        if !data.has_id() {
            return Err(EngineError::ImportNotFound {
                address: address.to_string(),
                id: import_id.to_string(),
            });
        }

        let (id, mut attributes) = data.into_parts();
        resource.schema().normalize(&mut attributes);
        log::info!("imported {address} from {import_id:?}");
        state.insert(InstanceState {
            resource_type: address.resource_type.clone(),
            name: address.name.clone(),
            id,
            dependencies: Vec::new(),
            attributes,
        });
        Ok(())
    }
}

/// Resolve a declaration against current state into instance data.
fn desired_data<M>(
    resource: &dyn Resource<M>,
    config: &ConfigDocument,
    address: &Address,
    state: &State,
) -> anyhow::Result<ResourceData> {
    let rc = config
        .get(address)
        .with_context(|| format!("{address} is not declared"))?;
    // Dependencies are applied by now, so a missing attribute is absent
    let lookup = |r: &Reference| match state.get(&r.target) {
        Some(instance) => Resolved::settled(instance.attribute(&r.attribute)),
        None => Resolved::Unknown,
    };
    let (mut attributes, unknown) = rc.resolve(&lookup);
    if let Some(key) = unknown.first() {
        anyhow::bail!("argument {key:?} references a value that is not available after its dependencies were applied");
    }

    let schema = resource.schema();
    schema.validate(&address.to_string(), &attributes, &[])?;
    schema.apply_defaults(&mut attributes);
    schema.normalize(&mut attributes);
    Ok(ResourceData::from_parts("", attributes))
}

fn resource_error(address: &Address, source: anyhow::Error) -> EngineError {
    EngineError::Resource {
        address: address.to_string(),
        source,
    }
}

fn failed(address: &Address, error: &anyhow::Error, update: StateUpdate) -> Outcome {
    Outcome {
        address: address.clone(),
        result: ApplyResult::Failed {
            error: format!("{error:#}"),
        },
        update,
    }
}
