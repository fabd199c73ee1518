//! Scripted sessions for engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;

use common::errors::{AppError, AppResult};
use common::models::PluginConfig;

use crate::session::{CatalogSession, CellValue, ParamValue, Row, SessionProvider, Statement};

/// What a fake session answers to one statement.
pub(crate) enum FakeResponse {
    Rows(Vec<Row>),
    Fail(AppError),
    RowsThenFail(Vec<Row>, AppError),
    /// Never yields.
    Hang,
}

type Handler = Arc<dyn Fn(&Statement) -> FakeResponse + Send + Sync>;

pub(crate) fn text_row(cells: &[&str]) -> Row {
    cells.iter().map(|c| CellValue::Text(c.to_string())).collect()
}

struct FakeSession {
    handler: Handler,
    log: Arc<Mutex<Vec<Statement>>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl CatalogSession for FakeSession {
    fn query<'a>(&'a mut self, statement: &'a Statement) -> BoxStream<'a, AppResult<Row>> {
        self.log.lock().unwrap().push(statement.clone());
        match (self.handler)(statement) {
            FakeResponse::Rows(rows) => {
                stream::iter(rows.into_iter().map(Ok::<Row, AppError>)).boxed()
            }
            FakeResponse::Fail(err) => stream::iter(vec![Err::<Row, AppError>(err)]).boxed(),
            FakeResponse::RowsThenFail(rows, err) => {
                stream::iter(rows.into_iter().map(Ok::<Row, AppError>))
                    .chain(stream::iter(vec![Err(err)]))
                    .boxed()
            }
            FakeResponse::Hang => stream::pending::<AppResult<Row>>().boxed(),
        }
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Counts acquires and releases; every session shares one handler.
pub(crate) struct FakeProvider {
    handler: Handler,
    refuse: bool,
    connects: AtomicUsize,
    closes: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<Statement>>>,
}

impl FakeProvider {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&Statement) -> FakeResponse + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            refuse: false,
            connects: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn for_catalog(catalog: FakeCatalog) -> Self {
        Self::new(move |stmt| catalog.answer(stmt))
    }

    /// A provider whose every acquire fails with `ConnectionFailure`.
    pub(crate) fn refusing() -> Self {
        let mut provider = Self::new(|_| FakeResponse::Rows(vec![]));
        provider.refuse = true;
        provider
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn statements(&self) -> Vec<Statement> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn acquire(&self, _config: &PluginConfig) -> AppResult<Box<dyn CatalogSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(AppError::ConnectionFailure("connection refused".into()));
        }
        Ok(Box::new(FakeSession {
            handler: self.handler.clone(),
            log: self.log.clone(),
            closes: self.closes.clone(),
        }))
    }
}

/// In-memory `information_schema` for one schema.
///
/// Statements are recognized by the catalog view or constraint type they
/// mention; statements bound to any other schema see an empty catalog.
#[derive(Clone, Default)]
pub(crate) struct FakeCatalog {
    schema: String,
    schemas: Vec<String>,
    tables: Vec<(String, String)>,
    foreign_keys: Vec<(String, String)>,
    primary_keys: Vec<(String, String)>,
    uniques: Vec<(String, String)>,
    junctions: Vec<(String, String)>,
    failing: Option<&'static str>,
}

impl FakeCatalog {
    pub(crate) fn new(schema: &str) -> Self {
        Self {
            schema: schema.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn schemas(mut self, names: &[&str]) -> Self {
        self.schemas = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub(crate) fn table(mut self, name: &str, table_type: &str) -> Self {
        self.tables.push((name.to_string(), table_type.to_string()));
        self
    }

    pub(crate) fn foreign_key(mut self, from: &str, to: &str) -> Self {
        self.foreign_keys.push((from.to_string(), to.to_string()));
        self
    }

    pub(crate) fn primary_key(mut self, from: &str, to: &str) -> Self {
        self.primary_keys.push((from.to_string(), to.to_string()));
        self
    }

    pub(crate) fn unique(mut self, from: &str, to: &str) -> Self {
        self.uniques.push((from.to_string(), to.to_string()));
        self
    }

    pub(crate) fn junction(mut self, from: &str, to: &str) -> Self {
        self.junctions.push((from.to_string(), to.to_string()));
        self
    }

    /// Makes statements containing `marker` fail with `QueryFailure`.
    pub(crate) fn failing_on(mut self, marker: &'static str) -> Self {
        self.failing = Some(marker);
        self
    }

    fn answer(&self, stmt: &Statement) -> FakeResponse {
        if let Some(marker) = self.failing {
            if stmt.sql.contains(marker) {
                return FakeResponse::Fail(AppError::QueryFailure(format!(
                    "catalog view unavailable: {}",
                    marker
                )));
            }
        }

        if stmt.sql.contains("information_schema.schemata") {
            let rows = self.schemas.iter().map(|s| text_row(&[s.as_str()])).collect();
            return FakeResponse::Rows(rows);
        }

        let in_schema =
            stmt.param("schema").and_then(ParamValue::as_text) == Some(self.schema.as_str());
        let pairs = |entries: &[(String, String)]| -> Vec<Row> {
            if in_schema {
                entries
                    .iter()
                    .map(|(a, b)| text_row(&[a.as_str(), b.as_str()]))
                    .collect()
            } else {
                Vec::new()
            }
        };

        let rows = if stmt.sql.contains("information_schema.tables") {
            pairs(&self.tables)
        } else if stmt.sql.contains("'FOREIGN KEY'") {
            pairs(&self.foreign_keys)
        } else if stmt.sql.contains("'PRIMARY KEY'") {
            pairs(&self.primary_keys)
        } else if stmt.sql.contains("'UNIQUE'") {
            pairs(&self.uniques)
        } else if stmt.sql.contains("referential_constraints") {
            pairs(&self.junctions)
        } else {
            return FakeResponse::Fail(AppError::QueryFailure(format!(
                "unexpected statement: {}",
                stmt.sql
            )));
        };
        FakeResponse::Rows(rows)
    }
}
