//! CREATE TABLE from a schema descriptor for the SQL backends.

use crate::schema::{FieldDef, FieldKind, SchemaDescriptor};
use crate::sql::{quoted, Dialect};

fn column_type(dialect: Dialect, kind: FieldKind) -> &'static str {
    match (dialect, kind) {
        (Dialect::Postgres, FieldKind::Integer) => "BIGINT",
        (Dialect::Postgres, FieldKind::Float) => "DOUBLE PRECISION",
        (Dialect::Postgres, FieldKind::String) => "TEXT",
        (Dialect::Postgres, FieldKind::Boolean) => "BOOLEAN",
        (Dialect::Postgres, FieldKind::Uuid) => "UUID",
        (Dialect::Postgres, FieldKind::DateTime) => "TIMESTAMPTZ",
        (Dialect::Postgres, FieldKind::Json) => "JSONB",
        (Dialect::Sqlite, FieldKind::Integer | FieldKind::Boolean) => "INTEGER",
        (Dialect::Sqlite, FieldKind::Float) => "REAL",
        (Dialect::Sqlite, _) => "TEXT",
    }
}

fn column_def(dialect: Dialect, field: &FieldDef, is_pk: bool) -> String {
    let name = quoted(&field.name);
    if is_pk {
        return match (dialect, field.kind) {
            (Dialect::Postgres, FieldKind::Integer) => {
                format!("{} BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY", name)
            }
            // AUTOINCREMENT keeps SQLite from reusing ids of deleted rows.
            (Dialect::Sqlite, FieldKind::Integer) => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name),
            (_, kind) => format!("{} {} PRIMARY KEY", name, column_type(dialect, kind)),
        };
    }
    let mut def = format!("{} {}", name, column_type(dialect, field.kind));
    if !field.nullable {
        def.push_str(" NOT NULL");
    }
    if field.unique {
        def.push_str(" UNIQUE");
    }
    def
}

/// `CREATE TABLE IF NOT EXISTS` with one column per field; the key column is generated for integer keys.
/// Identifiers must already be validated.
pub fn create_table_sql(dialect: Dialect, table: &str, schema: &SchemaDescriptor) -> String {
    let cols: Vec<String> = schema
        .fields
        .iter()
        .map(|f| column_def(dialect, f, f.name == schema.pk_field))
        .collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({})", quoted(table), cols.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SchemaDescriptor {
        SchemaDescriptor::new("User")
            .field(FieldDef::integer("id"))
            .field(FieldDef::string("email").unique())
            .field(FieldDef::string("name").optional())
            .field(FieldDef::boolean("active"))
    }

    #[test]
    fn postgres_ddl() {
        assert_eq!(
            create_table_sql(Dialect::Postgres, "users", &user()),
            r#"CREATE TABLE IF NOT EXISTS "users" ("id" BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY, "email" TEXT NOT NULL UNIQUE, "name" TEXT, "active" BOOLEAN NOT NULL)"#
        );
    }

    #[test]
    fn sqlite_ddl() {
        assert_eq!(
            create_table_sql(Dialect::Sqlite, "users", &user()),
            r#"CREATE TABLE IF NOT EXISTS "users" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "email" TEXT NOT NULL UNIQUE, "name" TEXT, "active" INTEGER NOT NULL)"#
        );
    }

    #[test]
    fn uuid_key_is_a_plain_primary_key() {
        let schema = SchemaDescriptor::new("Doc")
            .field(FieldDef::uuid("id"))
            .field(FieldDef::json("body"));
        assert_eq!(
            create_table_sql(Dialect::Postgres, "docs", &schema),
            r#"CREATE TABLE IF NOT EXISTS "docs" ("id" UUID PRIMARY KEY, "body" JSONB NOT NULL)"#
        );
    }
}
