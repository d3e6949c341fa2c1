//! # Declarative
//!
//! A framework for declarative resource management against remote APIs.
//!
//! Resources declare a typed [`Schema`] and implement create/read/update/
//! delete callbacks over a presence-aware [`ResourceData`]. The engine reads
//! a TOML [`ConfigDocument`], orders instances by the references between
//! them, diffs declared against tracked [`State`], and applies the resulting
//! [`Plan`].
//!
//! ## Core Concepts
//!
//! - **Resource**: one kind of remote object, with a schema and callbacks
//! - **Provider**: a registry of resources sharing a `meta` value (the client)
//! - **State**: last known id and attributes of every managed instance
//! - **Plan**: ordered create/update/replace/delete changes
//! - **Engine**: refreshes, applies and imports, in parallel within a level
//!
//! ## Example
//!
//! ```
//! use declarative::{
//!     ConfigDocument, Engine, FieldSchema, NoProgress, PlanMode, Provider, Resource,
//!     ResourceData, Schema, State,
//! };
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! type Store = Mutex<HashMap<String, String>>;
//!
//! struct Note(Schema);
//!
//! impl Resource<Store> for Note {
//!     fn type_name(&self) -> &'static str { "note" }
//!     fn schema(&self) -> &Schema { &self.0 }
//!
//!     fn create(&self, data: &mut ResourceData, store: &Store) -> anyhow::Result<()> {
//!         let text = data.get_str("text").unwrap_or_default().to_string();
//!         store.lock().unwrap().insert("n1".into(), text);
//!         data.set_id("n1");
//!         Ok(())
//!     }
//!
//!     fn read(&self, data: &mut ResourceData, store: &Store) -> anyhow::Result<()> {
//!         if !store.lock().unwrap().contains_key(data.id()) {
//!             data.set_id("");
//!         }
//!         Ok(())
//!     }
//!
//!     fn delete(&self, data: &mut ResourceData, store: &Store) -> anyhow::Result<()> {
//!         store.lock().unwrap().remove(data.id());
//!         Ok(())
//!     }
//! }
//!
//! let provider = Provider::new("notes")
//!     .with_resource(Note(Schema::new(vec![FieldSchema::string("text").required()])));
//! let store = Store::default();
//! let engine = Engine::new(&provider, &store);
//!
//! let config = ConfigDocument::parse("[resource.note.hello]\ntext = \"hi\"\n")?;
//! let mut state = State::default();
//! let plan = engine.plan(&config, &state, PlanMode::Normal)?;
//! let summary = engine.apply(&config, &plan, &mut state, &mut NoProgress)?;
//! assert_eq!(summary.created, 1);
//! # Ok::<(), declarative::EngineError>(())
//! ```

pub mod config;
pub mod context;
pub mod data;
pub mod diff;
pub mod error;
pub mod executor;
pub mod graph;
pub mod planner;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod state;
pub mod types;
pub mod value;

// Re-export main types at crate root
pub use config::{ConfigDocument, Reference, Resolved, ResourceConfig};
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use data::ResourceData;
pub use diff::{AttributeChange, ChangeAction, DiffSummary, ResourceDiff};
pub use error::{EngineError, SchemaError};
pub use executor::{Engine, RefreshSummary};
pub use graph::DependencyGraph;
pub use planner::{Plan, PlanMode};
pub use provider::Provider;
pub use resource::{BoxedResource, ImportFn, Importer, Resource};
pub use schema::{FieldSchema, FieldType, Schema};
pub use state::{InstanceState, State};
pub use types::{Address, ApplyResult, ExecuteOptions, ExecuteSummary};
pub use value::Value;
