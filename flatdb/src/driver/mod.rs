use crate::config::Config;
use crate::document;
use crate::entity::{identifier_of, stored_identifier, Identifiable, Identity, IDENTIFIER_KEY};
use crate::error::{FlatDbError, Result};
use crate::query::{self, Clause, Operators, Query};
use crate::store::DocumentStore;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Per-driver query state: the bound entity, its pending clauses and the
/// loaded snapshots.
#[derive(Debug, Default)]
struct Session {
    identity: Option<Identity>,
    query: Query,
    /// Document as read from disk by the last open
    original: Value,
    /// `original` narrowed by the last get/first
    content: Value,
    errors: Vec<FlatDbError>,
}

impl Session {
    fn record(&mut self, error: FlatDbError) {
        log::warn!("{error}");
        self.errors.push(error);
    }

    fn set_snapshot(&mut self, document: Value) {
        self.content = document.clone();
        self.original = document;
    }
}

/// The main entry point: a chainable query and CRUD API over a
/// [`DocumentStore`].
///
/// ```no_run
/// # use flatdb::{Driver, Identifiable, Identity};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Serialize, Deserialize)]
/// # struct Customer { id: String, name: String }
/// # impl Identifiable for Customer {
/// #     fn identity() -> Identity { Identity::new("customer", "customers") }
/// #     fn identifier(&self) -> String { self.id.clone() }
/// # }
/// # fn main() -> flatdb::Result<()> {
/// let driver = Driver::new("data")?;
/// driver.insert(&Customer { id: "CUST1".into(), name: "sarouje".into() })?;
///
/// let customer: Customer = driver
///     .open::<Customer>()
///     .filter("id", "=", "CUST1")
///     .first()
///     .as_entity()?;
/// # Ok(())
/// # }
/// ```
///
/// Chained calls (`open`, `filter`, `or`, `get`, `first`) never fail; their
/// errors are collected and available from [`Driver::errors`]. Mutations
/// return their errors directly and are serialized by a driver-wide write
/// lock held across the whole read-modify-write.
pub struct Driver {
    store: DocumentStore,
    operators: Operators,
    session: Mutex<Session>,
    write_lock: Mutex<()>,
}

impl Driver {
    /// Create a driver over `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(Config::new(dir))
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_operators(config, Operators::default())
    }

    /// Create a driver that resolves query operators from `operators`
    pub fn with_operators(config: Config, operators: Operators) -> Result<Self> {
        let store = DocumentStore::open(config)?;
        Ok(Driver {
            store,
            operators,
            session: Mutex::new(Session::default()),
            write_lock: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn operators(&self) -> &Operators {
        &self.operators
    }

    /// Add or replace a query operator
    pub fn register_operator<F>(&mut self, tag: &str, predicate: F) -> &mut Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.operators.register(tag, predicate);
        self
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Chainable query API ─────────────────────────────────────────

    /// Bind the driver to entity type `T` and load its document.
    /// Pending clauses are discarded.
    pub fn open<T: Identifiable>(&self) -> &Self {
        self.open_identity(T::identity())
    }

    pub fn open_identity(&self, identity: Identity) -> &Self {
        let mut session = self.session();
        // A failed load is kept in the error list and leaves an empty snapshot
        let _ = self.bind(&mut session, identity);
        self
    }

    /// Add `key operator value` to the current clause group.
    pub fn filter(&self, key: &str, operator: &str, value: impl Into<Value>) -> &Self {
        self.session().query.push(Clause::new(key, operator, value));
        self
    }

    /// Start a new clause group; records matching either group are returned.
    pub fn or(&self) -> &Self {
        self.session().query.or();
        self
    }

    /// Apply the pending clauses to the loaded document. Without clauses the
    /// whole document is selected.
    pub fn get(&self) -> &Self {
        let mut session = self.session();
        self.run_query(&mut session);
        self
    }

    /// Like [`get`](Self::get), then narrow the result to its first record.
    pub fn first(&self) -> &Self {
        let mut session = self.session();
        if session.identity.is_none() {
            return self;
        }
        self.run_query(&mut session);

        let first = match &session.content {
            Value::Array(records) => records.first().cloned(),
            _ => None,
        };
        match first {
            Some(record) => session.content = record,
            None => session.record(FlatDbError::RecordNotFound),
        }
        self
    }

    /// Current result: an array after `get`, a single record after `first`.
    pub fn raw(&self) -> Value {
        self.session().content.clone()
    }

    /// Current result as records; empty unless the result is an array.
    pub fn raw_array(&self) -> Vec<Value> {
        match &self.session().content {
            Value::Array(records) => records.clone(),
            _ => Vec::new(),
        }
    }

    /// Number of records in the current result
    pub fn count(&self) -> usize {
        match &self.session().content {
            Value::Array(records) => records.len(),
            Value::Null => 0,
            _ => 1,
        }
    }

    /// Convert the current result into a caller type: a single entity after
    /// `first`, a `Vec` of entities after `get`.
    pub fn as_entity<T: DeserializeOwned>(&self) -> Result<T> {
        let session = self.session();
        if session.identity.is_none() {
            return Err(FlatDbError::NotOpened);
        }
        match &session.content {
            Value::Null => return Err(FlatDbError::RecordNotFound),
            Value::Array(records) if records.is_empty() => {
                return Err(FlatDbError::RecordNotFound)
            }
            _ => {}
        }
        Ok(serde_json::from_value(session.content.clone())?)
    }

    /// Errors collected by chained calls during the driver's lifetime.
    pub fn errors(&self) -> Vec<FlatDbError> {
        self.session().errors.clone()
    }

    pub fn has_errors(&self) -> bool {
        !self.session().errors.is_empty()
    }

    pub fn clear_errors(&self) {
        self.session().errors.clear();
    }

    fn bind(&self, session: &mut Session, identity: Identity) -> Result<()> {
        session.query.clear();
        session.identity = Some(identity);

        log::debug!("Opening {}", self.store.path_for(&identity).display());
        match self.store.load(&identity) {
            Ok(document) => {
                session.set_snapshot(document);
                Ok(())
            }
            Err(e) => {
                session.set_snapshot(Value::Null);
                session.record(e.clone());
                Err(e)
            }
        }
    }

    fn run_query(&self, session: &mut Session) {
        if session.identity.is_none() {
            return;
        }

        if session.query.is_empty() {
            session.content = session.original.clone();
        } else {
            let records: &[Value] = match &session.original {
                Value::Array(records) => records.as_slice(),
                _ => &[],
            };
            match query::process(records, &session.query, &self.operators) {
                Ok(matched) => session.content = Value::Array(matched),
                Err(e) => {
                    session.content = Value::Array(Vec::new());
                    session.record(e);
                }
            }
        }
        session.query.rewind();
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Append `entity` to its type's document, creating the file if needed.
    /// Identifiers are not checked for uniqueness.
    pub fn insert<T: Identifiable>(&self, entity: &T) -> Result<()> {
        let _guard = self.write_guard();
        self.insert_locked(entity)
    }

    /// Replace the stored record whose identifier matches `entity`'s.
    /// Fails with [`FlatDbError::UpdateFailed`] if there is none.
    pub fn update<T: Identifiable>(&self, entity: &T) -> Result<()> {
        let _guard = self.write_guard();
        self.update_locked(entity)
    }

    /// Update `entity`, inserting it instead if no record has its identifier.
    pub fn upsert<T: Identifiable>(&self, entity: &T) -> Result<()> {
        let _guard = self.write_guard();
        match self.update_locked(entity) {
            Err(FlatDbError::UpdateFailed) => self.insert_locked(entity),
            other => other,
        }
    }

    /// Remove every stored record whose identifier matches `entity`'s.
    pub fn delete<T: Identifiable>(&self, entity: &T) -> Result<()> {
        let _guard = self.write_guard();
        let identity = T::identity();
        let id = stored_identifier(entity)?;

        let mut session = self.session();
        let mut records = self.load_for_write(&mut session, identity)?;

        let before = records.len();
        records.retain(|record| identifier_of(record).as_deref() != Some(id.as_str()));
        if records.len() == before {
            return Err(FlatDbError::DeleteNotFound {
                entity: identity.name.to_string(),
                key: IDENTIFIER_KEY.to_string(),
                id,
            });
        }

        self.store.write_all(&identity, &records)?;
        log::debug!(
            "Deleted {} {} record(s) with {IDENTIFIER_KEY} {id}",
            before - records.len(),
            identity.name
        );
        session.set_snapshot(Value::Array(records));
        Ok(())
    }

    fn insert_locked<T: Identifiable>(&self, entity: &T) -> Result<()> {
        let identity = T::identity();
        let record = serde_json::to_value(entity)?;
        self.store.append(&identity, record)?;
        log::debug!("Inserted {} {}", identity.name, entity.identifier());
        Ok(())
    }

    fn update_locked<T: Identifiable>(&self, entity: &T) -> Result<()> {
        let identity = T::identity();
        let id = stored_identifier(entity)?;

        let mut session = self.session();
        let mut records = self.load_for_write(&mut session, identity)?;

        // Identifiers are expected to be unique; only the first match is replaced
        let index = records
            .iter()
            .position(|record| identifier_of(record).as_deref() == Some(id.as_str()))
            .ok_or(FlatDbError::UpdateFailed)?;
        records[index] = serde_json::to_value(entity)?;

        self.store.write_all(&identity, &records)?;
        log::debug!("Updated {} {id}", identity.name);
        session.set_snapshot(Value::Array(records));
        Ok(())
    }

    /// Rebind the session to `identity` and return its stored records.
    /// Load failures are both recorded and returned.
    fn load_for_write(&self, session: &mut Session, identity: Identity) -> Result<Vec<Value>> {
        self.bind(session, identity)?;
        let path = self.store.path_for(&identity);
        document::into_records(session.original.clone(), &path).map_err(|e| {
            session.record(e.clone());
            e
        })
    }
}
