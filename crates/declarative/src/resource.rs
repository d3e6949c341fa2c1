//! Resource trait for declarative state management
//!
//! A Resource maps one kind of remote object onto create/read/update/delete
//! callbacks. Callbacks receive the instance's [`ResourceData`] and the
//! provider's shared `meta` value (usually an API client).

use crate::data::ResourceData;
use crate::schema::Schema;
use anyhow::Result;

/// Custom import parser: turns a user-supplied import id into instance data
/// (id plus any attributes needed for the first read).
pub type ImportFn = fn(&str, &mut ResourceData) -> Result<()>;

/// How `import` interprets the supplied id.
#[derive(Debug, Clone, Copy)]
pub enum Importer {
    /// The import id is the remote id.
    Passthrough,
    /// The import id is parsed by a resource-specific function.
    Custom(ImportFn),
}

impl Importer {
    /// Prepare instance data for the first read after import.
    pub fn prepare(&self, import_id: &str) -> Result<ResourceData> {
        let mut data = ResourceData::new();
        match self {
            Self::Passthrough => data.set_id(import_id),
            Self::Custom(parse) => parse(import_id, &mut data)?,
        }
        Ok(data)
    }
}

/// Core trait for declarative resources
///
/// # Example
///
/// ```
/// use declarative::{FieldSchema, Resource, ResourceData, Schema};
/// use std::collections::HashMap;
/// use std::sync::Mutex;
///
/// type Store = Mutex<HashMap<String, String>>;
///
/// struct Note {
///     schema: Schema,
/// }
///
/// impl Resource<Store> for Note {
///     fn type_name(&self) -> &'static str {
///         "note"
///     }
///
///     fn schema(&self) -> &Schema {
///         &self.schema
///     }
///
///     fn create(&self, data: &mut ResourceData, store: &Store) -> anyhow::Result<()> {
///         let text = data.get_str("text").unwrap_or_default().to_string();
///         store.lock().unwrap().insert("note".into(), text);
///         data.set_id("note");
///         self.read(data, store)
///     }
///
///     fn read(&self, data: &mut ResourceData, store: &Store) -> anyhow::Result<()> {
///         match store.lock().unwrap().get(data.id()) {
///             Some(text) => data.set("text", text.as_str()),
///             None => data.set_id(""),
///         }
///         Ok(())
///     }
///
///     fn delete(&self, data: &mut ResourceData, store: &Store) -> anyhow::Result<()> {
///         store.lock().unwrap().remove(data.id());
///         Ok(())
///     }
/// }
///
/// let note = Note { schema: Schema::new(vec![FieldSchema::string("text").required()]) };
/// let store = Store::default();
/// let mut data = ResourceData::new();
/// data.set("text", "hello");
/// note.create(&mut data, &store).unwrap();
/// assert_eq!(data.id(), "note");
/// ```
pub trait Resource<M>: Send + Sync {
    /// Resource type name used in configuration, e.g. `vault_identity_entity`
    fn type_name(&self) -> &'static str;

    /// Argument and attribute declarations
    fn schema(&self) -> &Schema;

    /// Create the remote object and set the id.
    fn create(&self, data: &mut ResourceData, meta: &M) -> Result<()>;

    /// Refresh attributes from the remote object.
    ///
    /// Clearing the id signals that the object is gone.
    fn read(&self, data: &mut ResourceData, meta: &M) -> Result<()>;

    /// Push changed configuration to the remote object.
    ///
    /// Defaults to a full rewrite through `create`.
    fn update(&self, data: &mut ResourceData, meta: &M) -> Result<()> {
        self.create(data, meta)
    }

    /// Remove the remote object. Removing an absent object succeeds.
    fn delete(&self, data: &mut ResourceData, meta: &M) -> Result<()>;

    /// Presence check run before `read` during refresh.
    fn exists(&self, _data: &ResourceData, _meta: &M) -> Result<bool> {
        Ok(true)
    }

    /// Import support, if any
    fn importer(&self) -> Option<Importer> {
        None
    }
}

/// A boxed resource for type-erased storage
pub type BoxedResource<M> = Box<dyn Resource<M>>;
