//! In-memory backend.
//!
//! Rows are kept as JSON objects per table and every collaborator call is
//! appended to a call log, so tests can assert on exactly what was sent and
//! in which order. Individual operations can be made to fail once.

use std::collections::{BTreeMap, HashSet};

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use smol_str::{SmolStr, ToSmolStr};
use tokio::sync::Mutex;
use url::Url;

use crate::backend::{AuthProvider, Database, ObjectStore};
use crate::error::BackendError;
use crate::types::User;

const PUBLIC_BASE: &str = "memory://storage/public";

/// One collaborator call, as recorded by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CurrentUser,
    SignOut,
    Upload {
        key: SmolStr,
        content_type: SmolStr,
        len: usize,
    },
    Insert {
        table: SmolStr,
    },
    Select {
        table: SmolStr,
        columns: Vec<SmolStr>,
    },
    SelectById {
        table: SmolStr,
        id: SmolStr,
    },
    Update {
        table: SmolStr,
        id: SmolStr,
    },
    Delete {
        table: SmolStr,
        id: SmolStr,
    },
}

impl BackendCall {
    /// Whether this call wrote to storage or the database.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Upload { .. } | Self::Insert { .. } | Self::Update { .. } | Self::Delete { .. }
        )
    }
}

/// Operations that can be set up to fail with [`MemoryBackend::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CurrentUser,
    Upload,
    Insert,
    Select,
    Update,
    Delete,
}

#[derive(Default)]
struct State {
    user: Option<User>,
    objects: BTreeMap<SmolStr, (SmolStr, Bytes)>,
    tables: BTreeMap<SmolStr, Vec<Map<String, Value>>>,
    next_id: u64,
    calls: Vec<BackendCall>,
    failures: HashSet<Operation>,
}

impl State {
    fn fail(&mut self, op: Operation) -> Result<(), BackendError> {
        if self.failures.remove(&op) {
            return Err(BackendError::Unavailable {
                message: format!("{:?} failed", op),
            });
        }
        Ok(())
    }

    fn row_index(&self, table: &str, id: &str) -> Option<usize> {
        self.tables
            .get(table)?
            .iter()
            .position(|row| row.get("id").is_some_and(|v| id_matches(v, id)))
    }
}

fn id_matches(value: &Value, id: &str) -> bool {
    match value {
        Value::String(s) => s == id,
        Value::Number(n) => n.to_string() == id,
        _ => false,
    }
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, BackendError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(BackendError::Unavailable {
            message: format!("expected an object, got {}", other),
        }),
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with a signed-in user.
    pub fn with_user(user: User) -> Self {
        Self {
            state: Mutex::new(State {
                user: Some(user),
                ..State::default()
            }),
        }
    }

    pub async fn set_user(&self, user: Option<User>) {
        self.state.lock().await.user = user;
    }

    /// Make the next call of `op` fail.
    pub async fn fail_next(&self, op: Operation) {
        self.state.lock().await.failures.insert(op);
    }

    /// Insert a row directly, bypassing the call log. Returns the assigned id.
    pub async fn seed<T: Serialize>(&self, table: &str, row: &T) -> Result<SmolStr, BackendError> {
        let mut state = self.state.lock().await;
        Self::insert_row(&mut state, table, to_object(row)?)
    }

    fn insert_row(
        state: &mut State,
        table: &str,
        mut row: Map<String, Value>,
    ) -> Result<SmolStr, BackendError> {
        let id = match row.get("id") {
            Some(Value::String(s)) => s.to_smolstr(),
            Some(Value::Number(n)) => n.to_smolstr(),
            _ => {
                state.next_id += 1;
                row.insert("id".into(), Value::from(state.next_id));
                state.next_id.to_smolstr()
            }
        };
        state.tables.entry(table.into()).or_default().push(row);
        Ok(id)
    }

    /// Every call made so far, oldest first.
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Raw rows of a table.
    pub async fn rows(&self, table: &str) -> Vec<Map<String, Value>> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Content type and bytes of a stored object.
    pub async fn object(&self, key: &str) -> Option<(SmolStr, Bytes)> {
        self.state.lock().await.objects.get(key).cloned()
    }
}

impl AuthProvider for MemoryBackend {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::CurrentUser);
        state.fail(Operation::CurrentUser)?;
        Ok(state.user.clone())
    }

    fn authorize_url(&self, provider: &str) -> Result<Url, BackendError> {
        let mut url = Url::parse("memory://auth/authorize").map_err(|e| {
            BackendError::Unavailable {
                message: e.to_string(),
            }
        })?;
        url.query_pairs_mut().append_pair("provider", provider);
        Ok(url)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::SignOut);
        state.user = None;
        Ok(())
    }
}

impl ObjectStore for MemoryBackend {
    async fn upload<'a>(
        &'a self,
        key: &'a str,
        data: Bytes,
        content_type: &'a str,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::Upload {
            key: key.into(),
            content_type: content_type.into(),
            len: data.len(),
        });
        state.fail(Operation::Upload)?;
        if state.objects.contains_key(key) {
            return Err(BackendError::Status {
                status: 409,
                message: "The resource already exists".into(),
            });
        }
        state.objects.insert(key.into(), (content_type.into(), data));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", PUBLIC_BASE, key)
    }
}

impl Database for MemoryBackend {
    async fn insert<'a, R>(&'a self, table: &'a str, record: &'a R) -> Result<(), BackendError>
    where
        R: Serialize + Sync,
    {
        let row = to_object(record)?;
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::Insert {
            table: table.into(),
        });
        state.fail(Operation::Insert)?;
        Self::insert_row(&mut state, table, row)?;
        Ok(())
    }

    async fn select<'a, R>(
        &'a self,
        table: &'a str,
        columns: &'a [&'a str],
    ) -> Result<Vec<R>, BackendError>
    where
        R: DeserializeOwned + Send + 'a,
    {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::Select {
            table: table.into(),
            columns: columns.iter().map(|c| c.to_smolstr()).collect(),
        });
        state.fail(Operation::Select)?;
        let rows = state.tables.get(table).map(Vec::as_slice).unwrap_or_default();
        rows.iter()
            .map(|row| -> Result<R, BackendError> {
                let projected: Map<String, Value> = row
                    .iter()
                    .filter(|(k, _)| columns.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Ok(serde_json::from_value(Value::Object(projected))?)
            })
            .collect()
    }

    async fn select_by_id<'a, R>(
        &'a self,
        table: &'a str,
        id: &'a str,
    ) -> Result<Option<R>, BackendError>
    where
        R: DeserializeOwned + Send + 'a,
    {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::SelectById {
            table: table.into(),
            id: id.into(),
        });
        state.fail(Operation::Select)?;
        let Some(index) = state.row_index(table, id) else {
            return Ok(None);
        };
        let row = state.tables[table][index].clone();
        Ok(Some(serde_json::from_value(Value::Object(row))?))
    }

    async fn update<'a, P>(
        &'a self,
        table: &'a str,
        patch: &'a P,
        id: &'a str,
    ) -> Result<(), BackendError>
    where
        P: Serialize + Sync,
    {
        let patch = to_object(patch)?;
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::Update {
            table: table.into(),
            id: id.into(),
        });
        state.fail(Operation::Update)?;
        let index = state.row_index(table, id).ok_or_else(|| BackendError::NotFound {
            table: table.into(),
            id: id.into(),
        })?;
        if let Some(row) = state.tables.get_mut(table).and_then(|rows| rows.get_mut(index)) {
            row.extend(patch);
        }
        Ok(())
    }

    async fn delete<'a>(&'a self, table: &'a str, id: &'a str) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::Delete {
            table: table.into(),
            id: id.into(),
        });
        state.fail(Operation::Delete)?;
        // Deleting a missing row matches nothing, like the REST filter.
        if let Some(index) = state.row_index(table, id) {
            if let Some(rows) = state.tables.get_mut(table) {
                rows.remove(index);
            }
        }
        Ok(())
    }
}
