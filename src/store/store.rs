//! The store: schema-aware CRUD over per-resource record logs, plus
//! authentication and authorization against the reserved resources.
//!
//! Individual CRUD operations take no store-level lock; each record log
//! serializes its own readers and writers. The store's own lock only guards
//! lifecycle transitions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task;
use tokio::time;

use crate::auth::verify_password;
use crate::observability::{Logger, Severity};
use crate::schema::{to_record, to_resource, FieldSchema, Resource, Value, ID_FIELD, VERSION_FIELD};
use crate::storage::RecordLog;

use super::errors::{StoreError, StoreResult};
use super::id::generate_id;

/// Reserved resource holding user records; the record id is the username.
pub const USERS_RESOURCE: &str = "_users";

/// Reserved resource holding the permission table.
pub const PERMISSIONS_RESOURCE: &str = "_permissions";

/// Grace window for draining the logs on shutdown.
const STOP_GRACE: Duration = Duration::from_secs(10);

/// Schema-driven record store over a set of named resource logs.
pub struct Store {
    schemas: HashMap<String, Vec<FieldSchema>>,
    logs: HashMap<String, RecordLog>,
    is_running: RwLock<bool>,
}

impl Store {
    /// Builds a store from a schema table and the matching logs.
    ///
    /// The two maps share keys; a resource missing from either map is
    /// reported as not-found on lookup.
    pub fn new(schemas: HashMap<String, Vec<FieldSchema>>, logs: HashMap<String, RecordLog>) -> Self {
        Self {
            schemas,
            logs,
            is_running: RwLock::new(false),
        }
    }

    /// Returns a resource's field schema, in column order.
    pub fn schema(&self, resource: &str) -> Option<&[FieldSchema]> {
        self.schemas.get(resource).map(Vec::as_slice)
    }

    // ----- lifecycle -----

    /// Marks the store running. Starting a running store is an error.
    pub fn start(&self) -> StoreResult<()> {
        let mut running = self.lifecycle_write()?;
        if *running {
            return Err(StoreError::Internal("store already started".into()));
        }
        *running = true;

        Logger::log(Severity::Info, "store.started", &[]);
        Ok(())
    }

    /// Runs the store until `stop` fires, then drains and closes the logs.
    pub async fn run(self: Arc<Self>, mut stop: watch::Receiver<()>) -> StoreResult<()> {
        if *self.lifecycle_read()? {
            return Err(StoreError::Internal("store already running".into()));
        }

        self.start()?;

        // Either a stop signal or a dropped sender ends the run.
        let _ = stop.changed().await;

        self.stop().await
    }

    /// Stops the store, closing every log sequentially with a bounded grace
    /// window. Overrunning the window reports an error; the detached drain
    /// keeps going regardless.
    pub async fn stop(self: Arc<Self>) -> StoreResult<()> {
        {
            let mut running = self.lifecycle_write()?;
            if !*running {
                return Err(StoreError::Internal("store not running".into()));
            }
            *running = false;
        }

        let store = Arc::clone(&self);
        let drain = task::spawn_blocking(move || {
            for (resource, log) in &store.logs {
                if let Err(e) = log.close() {
                    Logger::log_stderr(
                        Severity::Error,
                        "store.log.close_failed",
                        &[("resource", resource.as_str()), ("error", &e.to_string())],
                    );
                }
            }
        });

        match time::timeout(STOP_GRACE, drain).await {
            Ok(Ok(())) => {
                Logger::log(Severity::Info, "store.stopped", &[]);
                Ok(())
            }
            Ok(Err(join_err)) => Err(StoreError::Internal(format!(
                "log drain failed: {join_err}"
            ))),
            Err(_) => Err(StoreError::Internal("graceful stop timed out".into())),
        }
    }

    // ----- CRUD -----

    /// Creates a record, stamping a fresh id and version 1. Returns the id.
    pub fn create(&self, resource: &str, mut payload: Resource) -> StoreResult<String> {
        let schemas = self.schemas.get(resource).ok_or(StoreError::NotFound)?;
        let log = self.logs.get(resource).ok_or(StoreError::NotFound)?;

        let id = generate_id();
        payload.insert(ID_FIELD.to_string(), Value::Text(id.clone()));
        payload.insert(VERSION_FIELD.to_string(), Value::Number(1.0));

        let rec = to_record(schemas, &payload).map_err(StoreError::from_codec)?;
        log.create(rec).map_err(StoreError::from_log)?;

        Ok(id)
    }

    /// Updates a record with partial-update semantics: any schema field
    /// absent from the payload keeps its stored value.
    pub fn update(&self, resource: &str, mut payload: Resource) -> StoreResult<()> {
        let schemas = self.schemas.get(resource).ok_or(StoreError::NotFound)?;
        let log = self.logs.get(resource).ok_or(StoreError::NotFound)?;

        let id = match payload.get(ID_FIELD) {
            Some(Value::Text(id)) => id.clone(),
            _ => {
                return Err(StoreError::Validation(crate::schema::SchemaError::NotText {
                    field: ID_FIELD.to_string(),
                }))
            }
        };

        let old = self.read_one(resource, &id)?;

        for fs in schemas {
            if !payload.contains_key(&fs.field) {
                if let Some(v) = old.get(&fs.field) {
                    payload.insert(fs.field.clone(), v.clone());
                }
            }
        }

        let old_version = old
            .get(VERSION_FIELD)
            .and_then(Value::as_number)
            .ok_or_else(|| {
                StoreError::Internal(format!(
                    "'_v' field is missing or not a number in stored record {id}"
                ))
            })?;
        payload.insert(VERSION_FIELD.to_string(), Value::Number(old_version + 1.0));

        let rec = to_record(schemas, &payload).map_err(StoreError::from_codec)?;
        log.update(rec).map_err(StoreError::from_log)
    }

    /// Deletes a record by appending a tombstone.
    pub fn delete(&self, resource: &str, id: &str) -> StoreResult<()> {
        let log = self.logs.get(resource).ok_or(StoreError::NotFound)?;
        log.delete(id).map_err(StoreError::from_log)
    }

    /// Reads the latest live version of a record as a typed resource.
    pub fn read_one(&self, resource: &str, id: &str) -> StoreResult<Resource> {
        let schemas = self.schemas.get(resource).ok_or(StoreError::NotFound)?;
        let log = self.logs.get(resource).ok_or(StoreError::NotFound)?;

        let rec = log.read_one(id).map_err(StoreError::from_log)?;
        to_resource(schemas, &rec).map_err(StoreError::from_codec)
    }

    /// Lists the latest live version of every record, optionally sorted.
    pub fn list(&self, resource: &str, sort_by: &str) -> StoreResult<Vec<Resource>> {
        let schemas = self.schemas.get(resource).ok_or(StoreError::NotFound)?;
        let log = self.logs.get(resource).ok_or(StoreError::NotFound)?;

        let recs = log.list(sort_by).map_err(StoreError::from_log)?;

        let mut resources = Vec::with_capacity(recs.len());
        for rec in &recs {
            resources.push(to_resource(schemas, rec).map_err(StoreError::from_codec)?);
        }

        Ok(resources)
    }

    // ----- auth -----

    /// Authenticates a username/password pair against the `_users` resource.
    ///
    /// Every failure collapses into `Unauthenticated`; callers learn nothing
    /// about whether the user exists.
    pub fn authenticate(&self, username: &str, password: &str) -> StoreResult<Resource> {
        let user = match self.read_one(USERS_RESOURCE, username) {
            Ok(user) => user,
            Err(_) => {
                Logger::log(
                    Severity::Warn,
                    "store.authenticate.unknown_user",
                    &[("user.id", username)],
                );
                return Err(StoreError::Unauthenticated);
            }
        };

        let Some(salt) = user.get("salt").and_then(Value::as_text) else {
            Logger::log(
                Severity::Warn,
                "store.authenticate.bad_user_record",
                &[("user.id", username)],
            );
            return Err(StoreError::Unauthenticated);
        };
        let Some(stored) = user.get("password").and_then(Value::as_text) else {
            Logger::log(
                Severity::Warn,
                "store.authenticate.bad_user_record",
                &[("user.id", username)],
            );
            return Err(StoreError::Unauthenticated);
        };

        if !verify_password(password, salt, stored) {
            Logger::log(
                Severity::Warn,
                "store.authenticate.password_mismatch",
                &[("user.id", username)],
            );
            return Err(StoreError::Unauthenticated);
        }

        Ok(user)
    }

    /// Authorizes an action against the `_permissions` table.
    ///
    /// Rows are scanned in log order; the first rule matching the resource
    /// and action whose clauses succeed grants access. Within one rule the
    /// clauses are tried in order: public, role, owner field. Anonymous
    /// callers hitting any non-public matched rule get `Unauthenticated`;
    /// a scan with no allowing rule, or a failed permission listing, is
    /// `Unauthorized`.
    pub fn authorize(
        &self,
        resource: &str,
        id: &str,
        action: &str,
        user: Option<&Resource>,
    ) -> StoreResult<()> {
        let username = user
            .and_then(|u| u.get(ID_FIELD))
            .and_then(Value::as_text)
            .unwrap_or("");
        let roles = user
            .and_then(|u| u.get("roles"))
            .and_then(Value::as_list)
            .unwrap_or(&[]);

        let permissions = match self.list(PERMISSIONS_RESOURCE, "") {
            Ok(rows) => rows,
            Err(e) => {
                Logger::log_stderr(
                    Severity::Error,
                    "store.authorize.permissions_unavailable",
                    &[("error", &e.to_string())],
                );
                return Err(StoreError::Unauthorized);
            }
        };

        for p in &permissions {
            let p_resource = p.get("resource").and_then(Value::as_text);
            let p_action = p.get("action").and_then(Value::as_text);

            if p_resource != Some(resource) || (p_action != Some("*") && p_action != Some(action)) {
                continue;
            }

            let p_role = p.get("role").and_then(Value::as_text);
            let p_field = p.get("field").and_then(Value::as_text);

            if p_field == Some("") && p_role == Some("") {
                return Ok(()); // public
            }

            if user.is_none() {
                return Err(StoreError::Unauthenticated);
            }

            if let Some(role) = p_role {
                if role == "*" || roles.iter().any(|r| r == role) {
                    return Ok(()); // role match
                }
            }

            if !id.is_empty() {
                let target = self.read_one(resource, id)?;
                if let Some(field) = p_field {
                    match target.get(field) {
                        Some(Value::Text(owner)) if owner == username => return Ok(()),
                        Some(Value::List(owners)) if owners.iter().any(|o| o == username) => {
                            return Ok(()) // caller is in the owner list
                        }
                        _ => {}
                    }
                }
            }
        }

        Logger::log(
            Severity::Warn,
            "store.authorize.denied",
            &[
                ("resource.name", resource),
                ("record.id", id),
                ("action", action),
                ("user.id", username),
            ],
        );
        Err(StoreError::Unauthorized)
    }

    fn lifecycle_read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, bool>> {
        self.is_running
            .read()
            .map_err(|_| StoreError::Internal("lifecycle lock poisoned".into()))
    }

    fn lifecycle_write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, bool>> {
        self.is_running
            .write()
            .map_err(|_| StoreError::Internal("lifecycle lock poisoned".into()))
    }
}
