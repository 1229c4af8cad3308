//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a schema descriptor.

use crate::pagination::Pagination;
use crate::schema::{FieldKind, SchemaDescriptor};
use serde_json::{Map, Value};

/// Placeholder and paging syntax of the target database.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::Sqlite => format!("?{}", n),
        }
    }
}

/// Quote identifier (safe: only from validated descriptors).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// One bound value together with the kind of the column it targets.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundParam {
    pub value: Value,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BoundParam>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, value: Value, kind: FieldKind) -> usize {
        self.params.push(BoundParam { value, kind });
        self.params.len()
    }
}

/// Table name plus the descriptor of its rows.
#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    pub dialect: Dialect,
    pub name: &'a str,
    pub schema: &'a SchemaDescriptor,
}

impl<'a> Table<'a> {
    pub fn new(dialect: Dialect, name: &'a str, schema: &'a SchemaDescriptor) -> Self {
        Table { dialect, name, schema }
    }

    fn pk_kind(&self) -> FieldKind {
        self.schema
            .get(&self.schema.pk_field)
            .map(|f| f.kind)
            .unwrap_or(FieldKind::Integer)
    }
}

fn column_list(table: &Table<'_>) -> String {
    table
        .schema
        .fields
        .iter()
        .map(|f| quoted(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT page ordered by primary key. SQLite needs a LIMIT before OFFSET, so -1 stands for "no limit".
pub fn select_list(table: &Table<'_>, page: Pagination) -> QueryBuf {
    let mut q = QueryBuf::new();
    let limit_clause = match (page.limit, table.dialect) {
        (Some(n), _) => format!(" LIMIT {}", n),
        (None, Dialect::Sqlite) if page.skip > 0 => " LIMIT -1".to_string(),
        (None, _) => String::new(),
    };
    let offset_clause = if page.skip > 0 {
        format!(" OFFSET {}", page.skip)
    } else {
        String::new()
    };
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {}{}{}",
        column_list(table),
        quoted(table.name),
        quoted(&table.schema.pk_field),
        limit_clause,
        offset_clause
    );
    q
}

/// SELECT by primary key; id is the sole param.
pub fn select_by_id(table: &Table<'_>, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id.clone(), table.pk_kind());
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        column_list(table),
        quoted(table.name),
        quoted(&table.schema.pk_field),
        table.dialect.placeholder(n)
    );
    q
}

/// INSERT the body's known columns (the key only when the body carries it) and return the stored row.
pub fn insert(table: &Table<'_>, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in &table.schema.fields {
        let Some(v) = body.get(&f.name) else { continue };
        let n = q.push_param(v.clone(), f.kind);
        cols.push(quoted(&f.name));
        placeholders.push(table.dialect.placeholder(n));
    }
    let values = if cols.is_empty() {
        "DEFAULT VALUES".to_string()
    } else {
        format!("({}) VALUES ({})", cols.join(", "), placeholders.join(", "))
    };
    q.sql = format!(
        "INSERT INTO {} {} RETURNING {}",
        quoted(table.name),
        values,
        column_list(table)
    );
    q
}

/// UPDATE by id: SET only known, non-key columns present in body. None when nothing would change.
pub fn update(table: &Table<'_>, id: &Value, body: &Map<String, Value>) -> Option<QueryBuf> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for f in &table.schema.fields {
        if f.name == table.schema.pk_field {
            continue;
        }
        let Some(v) = body.get(&f.name) else { continue };
        let n = q.push_param(v.clone(), f.kind);
        sets.push(format!("{} = {}", quoted(&f.name), table.dialect.placeholder(n)));
    }
    if sets.is_empty() {
        return None;
    }
    let n = q.push_param(id.clone(), table.pk_kind());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quoted(table.name),
        sets.join(", "),
        quoted(&table.schema.pk_field),
        table.dialect.placeholder(n)
    );
    Some(q)
}

/// DELETE by id.
pub fn delete_by_id(table: &Table<'_>, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id.clone(), table.pk_kind());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        quoted(table.name),
        quoted(&table.schema.pk_field),
        table.dialect.placeholder(n)
    );
    q
}

pub fn delete_all(table: &Table<'_>) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("DELETE FROM {}", quoted(table.name));
    q
}
