//! Acceptance test harness for declarative providers.
//!
//! A [`TestCase`] applies a sequence of configurations against one backend,
//! checks the state after each step, destroys everything it created, and
//! finally verifies that the server no longer has the objects.
//!
//! Steps run against an in-memory [`MockBackend`] unless `VAULT_ACC` is set,
//! in which case a real server is used (configured from `VAULT_ADDR`,
//! `VAULT_TOKEN` and `VAULT_NAMESPACE`).
//!
//! ```no_run
//! use acctest::{TestCase, TestStep, check};
//! # fn provider() -> declarative::Provider<vaultapi::Client> { declarative::Provider::new("vault") }
//!
//! TestCase::new(provider())
//!     .step(
//!         TestStep::new(r#"
//!             [resource.vault_auth_backend.gh]
//!             type = "github"
//!         "#)
//!         .check(check::attr("vault_auth_backend.gh", "path", "github")),
//!     )
//!     .run()
//!     .unwrap();
//! ```

#![warn(clippy::all)]

pub mod check;

pub use check::Check;

use anyhow::{Context, Result, anyhow, bail};
use declarative::{ConfigDocument, Engine, NoProgress, Plan, PlanMode, Provider, State};
use regex::Regex;
use vaultapi::{Client, ClientConfig, MockBackend};

/// Set to run against a real server.
pub const ENV_ACC: &str = "VAULT_ACC";

/// Cleanup verification: gets the state as it was before destroy.
pub type DestroyCheck = Box<dyn Fn(&State, &Client) -> Result<()>>;

/// Whether acceptance tests target a real server.
pub fn acceptance_enabled() -> bool {
    std::env::var(ENV_ACC).is_ok_and(|v| !v.trim().is_empty() && v != "0")
}

/// Client for the current mode.
pub fn client() -> Result<Client> {
    if acceptance_enabled() {
        let config = ClientConfig::from_env();
        log::info!("running acceptance tests against {}", config.base_url());
        Ok(Client::new(config)?)
    } else {
        Ok(Client::with_backend(MockBackend::new()))
    }
}

/// Fails when a real server is requested but not configured.
pub fn pre_check() -> Result<()> {
    if !acceptance_enabled() {
        return Ok(());
    }
    for key in ["VAULT_ADDR", "VAULT_TOKEN"] {
        if std::env::var(key).map_or(true, |v| v.trim().is_empty()) {
            bail!("{key} must be set for acceptance tests");
        }
    }
    Ok(())
}

/// Random name with a readable prefix, e.g. `my-entity-4f1c2a9e0b7d`.
pub fn random_with_prefix(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..12])
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One configuration to apply, and what to expect afterwards.
pub struct TestStep {
    config: String,
    checks: Vec<Check>,
    expect_error: Option<Regex>,
}

impl TestStep {
    pub fn new(config: impl Into<String>) -> Self {
        Self {
            config: config.into(),
            checks: Vec::new(),
            expect_error: None,
        }
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// The step must fail with an error matching `pattern`. State reached
    /// before the failure is kept for later steps.
    pub fn expect_error(mut self, pattern: Regex) -> Self {
        self.expect_error = Some(pattern);
        self
    }
}

/// A multi-step lifecycle test.
pub struct TestCase {
    provider: Provider<Client>,
    client: Option<Client>,
    pre_check: Option<Box<dyn Fn() -> Result<()>>>,
    steps: Vec<TestStep>,
    check_destroy: Option<DestroyCheck>,
}

impl TestCase {
    pub fn new(provider: Provider<Client>) -> Self {
        Self {
            provider,
            client: None,
            pre_check: None,
            steps: Vec::new(),
            check_destroy: None,
        }
    }

    /// Use this client instead of the one picked from the environment.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn pre_check(mut self, check: impl Fn() -> Result<()> + 'static) -> Self {
        self.pre_check = Some(Box::new(check));
        self
    }

    pub fn step(mut self, step: TestStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn check_destroy(mut self, check: impl Fn(&State, &Client) -> Result<()> + 'static) -> Self {
        self.check_destroy = Some(Box::new(check));
        self
    }

    /// Run every step, then destroy and verify cleanup.
    ///
    /// Destroy runs even when a step fails; the step error wins.
    pub fn run(self) -> Result<()> {
        init_logging();
        if let Some(pre_check) = &self.pre_check {
            pre_check().context("pre-check failed")?;
        }
        let client = match self.client {
            Some(client) => client,
            None => client()?,
        };
        let engine = Engine::new(&self.provider, &client);
        let mut state = State::new(uuid::Uuid::new_v4().to_string());

        let steps = self
            .steps
            .iter()
            .enumerate()
            .try_for_each(|(i, step)| run_step(&engine, &mut state, i + 1, step));

        let before_destroy = state.clone();
        let destroyed = destroy(&engine, &mut state);

        if let Err(err) = steps {
            if let Err(destroy_err) = destroyed {
                log::error!("destroy after failed step also failed: {destroy_err:#}");
            }
            return Err(err);
        }
        destroyed?;

        if let Some(check) = &self.check_destroy {
            check(&before_destroy, &client).context("destroy check failed")?;
        }
        Ok(())
    }
}

/// Run a test case, panicking with the full error chain on failure.
pub fn test(case: TestCase) {
    if let Err(err) = case.run() {
        panic!("{err:#}");
    }
}

fn apply_config(engine: &Engine<'_, Client>, state: &mut State, config: &ConfigDocument) -> Result<()> {
    if !state.is_empty() {
        engine.refresh(state)?;
    }
    let plan = engine.plan(config, state, PlanMode::Normal)?;
    engine
        .apply(config, &plan, state, &mut NoProgress)?
        .into_result()?;
    Ok(())
}

fn run_step(engine: &Engine<'_, Client>, state: &mut State, n: usize, step: &TestStep) -> Result<()> {
    log::debug!("step {n}: applying");
    let config = ConfigDocument::parse(&step.config).map_err(anyhow::Error::from);
    let outcome = config
        .as_ref()
        .map_err(|e| anyhow!("{e:#}"))
        .and_then(|config| apply_config(engine, state, config));

    match (outcome, &step.expect_error) {
        (Err(err), Some(pattern)) => {
            let message = format!("{err:#}");
            if pattern.is_match(&message) {
                log::debug!("step {n}: failed as expected: {message}");
                return Ok(());
            }
            bail!("step {n}: expected an error matching {pattern}, got: {message}")
        }
        (Err(err), None) => return Err(err.context(format!("step {n}: apply failed"))),
        (Ok(()), Some(pattern)) => {
            bail!("step {n}: expected an error matching {pattern}, but apply succeeded")
        }
        (Ok(()), None) => {}
    }

    for check in &step.checks {
        check(state).with_context(|| format!("step {n}: check failed"))?;
    }

    // A second plan over refreshed state must be empty
    let config = config?;
    engine.refresh(state)?;
    let plan = engine.plan(&config, state, PlanMode::Normal)?;
    if plan.has_changes() {
        bail!(
            "step {n}: plan after apply is not empty:\n{}",
            describe(&plan)
        );
    }
    Ok(())
}

fn describe(plan: &Plan) -> String {
    plan.changes()
        .map(|diff| {
            let attrs: Vec<&str> = diff.changes.iter().map(|c| c.name.as_str()).collect();
            format!("  {} {} ({})", diff.action.symbol(), diff.address, attrs.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn destroy(engine: &Engine<'_, Client>, state: &mut State) -> Result<()> {
    if state.is_empty() {
        return Ok(());
    }
    log::debug!("destroying {} instance(s)", state.len());
    let plan = engine.plan(&ConfigDocument::default(), state, PlanMode::Destroy)?;
    engine
        .apply(&ConfigDocument::default(), &plan, state, &mut NoProgress)?
        .into_result()
        .context("destroy failed")?;
    if !state.is_empty() {
        bail!(
            "destroy left instances in state: {}",
            state
                .addresses()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_with_prefix() {
        let a = random_with_prefix("my-entity");
        let b = random_with_prefix("my-entity");
        assert!(a.starts_with("my-entity-"));
        assert_eq!(a.len(), "my-entity-".len() + 12);
        assert_ne!(a, b);
    }

    #[test]
    fn test_step_builder() {
        let step = TestStep::new("")
            .check(check::attr_set("x.y", "id"))
            .expect_error(Regex::new("boom").unwrap());
        assert_eq!(step.checks.len(), 1);
        assert!(step.expect_error.is_some());
    }

    #[test]
    fn test_empty_case_runs() {
        let provider = Provider::new("empty");
        TestCase::new(provider)
            .with_client(Client::with_backend(MockBackend::new()))
            .run()
            .unwrap();
    }

    #[test]
    fn test_invalid_config_is_a_step_error() {
        let err = TestCase::new(Provider::new("empty"))
            .with_client(Client::with_backend(MockBackend::new()))
            .step(TestStep::new("[resource.nope.x]\n"))
            .run()
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("step 1"), "{message}");
        assert!(message.contains("nope"), "{message}");
    }

    #[test]
    fn test_expected_error_must_happen() {
        let err = TestCase::new(Provider::new("empty"))
            .with_client(Client::with_backend(MockBackend::new()))
            .step(TestStep::new("").expect_error(Regex::new("boom").unwrap()))
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("but apply succeeded"));
    }
}
