//! Table - CRUD helpers for one table
//!
//! Statements are built as templates (`{table}` token, backtick identifiers, `?`
//! markers) and compiled like any other query, so table mapping and dialect quoting
//! apply here too.

use crate::api::{FromRow, Param, Params, Row};
use crate::cache::{CacheOptions, CacheTime};
use crate::connection::Sql;
use crate::error::{DbalError, DbalResult};
use crate::result::ResultSet;
use crate::sql::Where;
use crate::sql::where_clause::quote_field;
use regex::Regex;
use std::sync::LazyLock;

static PLAIN_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("static regex")
});

/// INSERT variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    #[default]
    Insert,
    /// `REPLACE INTO`
    Replace,
    /// `INSERT IGNORE INTO`
    Ignore,
}

impl InsertMode {
    fn keyword(self) -> &'static str {
        match self {
            InsertMode::Insert => "INSERT",
            InsertMode::Replace => "REPLACE",
            InsertMode::Ignore => "INSERT IGNORE",
        }
    }
}

pub struct Table<'a> {
    sql: &'a mut Sql,
    name: String,
    /// Applied to the next statement only
    cache_next: Option<CacheOptions>,
}

fn select_fields(fields: &[&str]) -> String {
    if fields.is_empty() {
        return "*".to_string();
    }
    fields
        .iter()
        .map(|f| {
            if PLAIN_FIELD.is_match(f) {
                quote_field(f)
            } else {
                (*f).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl<'a> Table<'a> {
    pub fn new(sql: &'a mut Sql, name: impl Into<String>) -> Self {
        Self {
            sql,
            name: name.into(),
            cache_next: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn token(&self) -> String {
        format!("{{{}}}", self.name)
    }

    /// Serve the next statement from the cache for `time`.
    pub fn cache(&mut self, time: CacheTime) -> &mut Self {
        self.cache_next = Some(self.sql.cache_options().with_time(time));
        self
    }

    fn run(&mut self, template: &str, params: Vec<Param>) -> DbalResult<ResultSet> {
        let params = Params::Positional(params);
        match self.cache_next.take() {
            Some(options) => self.sql.cache(template, &params, &options),
            None => self.sql.query(template, &params),
        }
    }

    pub fn insert(&mut self, row: &Row, mode: InsertMode) -> DbalResult<ResultSet> {
        if row.is_empty() {
            return Err(DbalError::InvalidOperation {
                message: "no fields to insert".to_string(),
                context: format!("Table::insert({})", self.name),
            });
        }

        let fields: Vec<String> = row.columns().iter().map(|c| quote_field(c)).collect();
        let markers = vec!["?"; row.len()].join(", ");
        let template = format!(
            "{} INTO {} ({}) VALUES ({})",
            mode.keyword(),
            self.token(),
            fields.join(", "),
            markers
        );
        let params = row.values().iter().cloned().map(Param::Scalar).collect();
        self.run(&template, params)
    }

    /// Insert rows one statement at a time. Returns the number inserted.
    pub fn bulk_insert(&mut self, rows: &[Row], mode: InsertMode) -> DbalResult<usize> {
        tracing::debug!(table = %self.name, rows = rows.len(), "bulk insert");
        for row in rows {
            self.insert(row, mode)?;
        }
        Ok(rows.len())
    }

    pub fn update(&mut self, set: &Row, where_: &Where) -> DbalResult<ResultSet> {
        if set.is_empty() {
            return Err(DbalError::InvalidOperation {
                message: "no fields to update".to_string(),
                context: format!("Table::update({})", self.name),
            });
        }

        let assignments: Vec<String> = set
            .columns()
            .iter()
            .map(|c| format!("{}=?", quote_field(c)))
            .collect();
        let mut params: Vec<Param> = set.values().iter().cloned().map(Param::Scalar).collect();

        let mut template = format!("UPDATE {} SET {}", self.token(), assignments.join(","));
        if !where_.is_empty() {
            template.push_str(" WHERE ");
            template.push_str(&where_.render(&mut params));
        }
        self.run(&template, params)
    }

    /// Delete matching rows. An empty clause is refused; use [`Table::truncate`].
    pub fn delete(&mut self, where_: &Where) -> DbalResult<ResultSet> {
        if where_.is_empty() {
            return Err(DbalError::InvalidOperation {
                message: "no where clause was specified, use truncate() to empty a table"
                    .to_string(),
                context: format!("Table::delete({})", self.name),
            });
        }

        let mut params = Vec::new();
        let template = format!("DELETE FROM {} WHERE {}", self.token(), where_.render(&mut params));
        self.run(&template, params)
    }

    /// Empty the table. `TRUNCATE TABLE` is not transaction safe, so inside a
    /// transaction (or on engines without it) this issues a `DELETE` instead.
    pub fn truncate(&mut self) -> DbalResult<ResultSet> {
        let template = if !self.sql.in_transaction() && self.sql.server().can_truncate_tables() {
            format!("TRUNCATE TABLE {}", self.token())
        } else {
            format!("DELETE FROM {}", self.token())
        };
        self.run(&template, Vec::new())
    }

    fn select_template(
        &self,
        fields: &[&str],
        where_: &Where,
        order_by: Option<&str>,
        first_only: bool,
        params: &mut Vec<Param>,
    ) -> String {
        let supports_limit = self.sql.server().supports_limit();

        let mut template = String::from("SELECT ");
        if first_only && !supports_limit {
            template.push_str("TOP 1 ");
        }
        template.push_str(&select_fields(fields));
        template.push_str(" FROM ");
        template.push_str(&self.token());

        if !where_.is_empty() {
            template.push_str(" WHERE ");
            template.push_str(&where_.render(params));
        }
        if let Some(order) = order_by {
            template.push_str(" ORDER BY ");
            template.push_str(order);
        }
        if first_only && supports_limit {
            template.push_str(" LIMIT 1");
        }
        template
    }

    /// First matching row, all fields.
    pub fn select(&mut self, where_: &Where, order_by: Option<&str>) -> DbalResult<Option<Row>> {
        self.field_select(&["*"], where_, order_by)
    }

    /// First matching row, selected fields.
    pub fn field_select(
        &mut self,
        fields: &[&str],
        where_: &Where,
        order_by: Option<&str>,
    ) -> DbalResult<Option<Row>> {
        let mut params = Vec::new();
        let template = self.select_template(fields, where_, order_by, true, &mut params);
        self.run(&template, params)?.fetch()
    }

    pub fn select_as<T: FromRow>(
        &mut self,
        where_: &Where,
        order_by: Option<&str>,
    ) -> DbalResult<Option<T>> {
        self.select(where_, order_by)?
            .map(|row| T::from_row(&row))
            .transpose()
    }

    pub fn select_all(&mut self, where_: &Where, order_by: Option<&str>) -> DbalResult<ResultSet> {
        self.field_select_all(&["*"], where_, order_by)
    }

    pub fn field_select_all(
        &mut self,
        fields: &[&str],
        where_: &Where,
        order_by: Option<&str>,
    ) -> DbalResult<ResultSet> {
        let mut params = Vec::new();
        let template = self.select_template(fields, where_, order_by, false, &mut params);
        self.run(&template, params)
    }

    pub fn exists(&mut self, where_: &Where) -> DbalResult<bool> {
        Ok(self.field_select(&["1"], where_, None)?.is_some())
    }

    /// Update the matching row, or insert `where_`'s equalities plus `set` if none exists.
    pub fn insert_or_update(&mut self, set: &Row, where_: &Where) -> DbalResult<ResultSet> {
        if self.exists(where_)? {
            return self.update(set, where_);
        }

        let mut row: Row = where_.equalities().into_iter().collect();
        for (column, value) in set.iter() {
            row.push(column, value.clone());
        }
        self.insert(&row, InsertMode::Insert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_fields() {
        assert_eq!(select_fields(&["*"]), "*");
        assert_eq!(select_fields(&[]), "*");
        assert_eq!(select_fields(&["id", "t.name"]), "`id`, `t`.`name`");
        assert_eq!(select_fields(&["1", "COUNT(*) AS n"]), "1, COUNT(*) AS n");
    }

    #[test]
    fn test_insert_mode_keyword() {
        assert_eq!(InsertMode::default().keyword(), "INSERT");
        assert_eq!(InsertMode::Replace.keyword(), "REPLACE");
        assert_eq!(InsertMode::Ignore.keyword(), "INSERT IGNORE");
    }
}
