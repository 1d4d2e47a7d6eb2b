//! INSERT compilation, including the returned-column clauses.

use super::Statement;
use crate::ast::RenderContext;
use crate::dialect::Returning;
use crate::error::{QueryError, Result};

/// Name of the `index`-th output parameter of a `RETURNING ... INTO` clause.
pub(crate) fn output_parameter(index: usize) -> String {
    format!("par{index:02}")
}

impl Statement {
    pub(super) fn render_insert(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        let target = self.source()?.render(ctx)?;
        if self.columns.is_empty() {
            return Err(QueryError::NoAssignments("INSERT"));
        }

        let dialect = ctx.dialect();
        let returned = self.returned_columns(ctx)?;
        if dialect.returning() == Returning::LastInsertId && returned.len() > 1 {
            return Err(QueryError::UnsupportedReturning {
                dialect: dialect.name(),
                requested: returned.len(),
            });
        }

        let mut sql = format!("INSERT INTO {target} ({})", self.columns.join(", "));

        if dialect.returning() == Returning::OutputClause && !returned.is_empty() {
            let inserted: Vec<String> = returned.iter().map(|c| format!("INSERTED.[{c}]")).collect();
            sql.push_str(" OUTPUT ");
            sql.push_str(&inserted.join(", "));
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut values = Vec::with_capacity(self.columns.len());
            for index in 0..self.columns.len() {
                values.push(match row.get(index).and_then(Option::as_ref) {
                    Some(value) => value.render(ctx)?,
                    None => String::from("NULL"),
                });
            }
            rows.push(format!("({})", values.join(", ")));
        }
        sql.push_str(" VALUES ");
        sql.push_str(&rows.join(", "));

        if dialect.returning() == Returning::ReturningInto && !returned.is_empty() {
            let targets: Vec<String> = (0..returned.len())
                .map(|i| dialect.parameter_name(&output_parameter(i)))
                .collect();
            sql.push_str(" RETURNING ");
            sql.push_str(&returned.join(", "));
            sql.push_str(" INTO ");
            sql.push_str(&targets.join(", "));
        }

        Ok(sql)
    }

    fn returned_columns(&self, ctx: &RenderContext<'_>) -> Result<Vec<&str>> {
        self.select
            .iter()
            .map(|item| {
                item.expr.column_name().ok_or_else(|| {
                    let text = item.expr.render(&mut ctx.inlined()).unwrap_or_default();
                    QueryError::NotAColumn(text)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{SqlExpr, Table};
    use crate::builder::Statement;
    use crate::dialect::{OracleDialect, SqlServerDialect, SqliteDialect};
    use crate::error::QueryError;
    use crate::value::SqlValue;
    use pretty_assertions::assert_eq;

    fn users() -> (Table, Statement) {
        let users = Table::new("USERS");
        let insert = Statement::insert()
            .into(&users)
            .set(users.column::<String>("NAME").to("ann"))
            .set(users.column::<i64>("AGE").to(30_i64));
        (users, insert)
    }

    #[test]
    fn test_plain_insert() {
        let (_, insert) = users();
        let compiled = insert.compile(&SqliteDialect).unwrap();
        assert_eq!(compiled.sql, "INSERT INTO USERS (NAME, AGE) VALUES (:ph00, 30)");
        assert_eq!(compiled.params[0].value, SqlValue::Text("ann".into()));
    }

    #[test]
    fn test_output_clause() {
        let (users, mut insert) = users();
        let _id = insert.bind(&users.column::<i64>("ID"));
        assert_eq!(
            insert.compile(&SqlServerDialect).unwrap().sql,
            "INSERT INTO USERS (NAME, AGE) OUTPUT INSERTED.[ID] VALUES (@ph00, 30)"
        );
    }

    #[test]
    fn test_returning_into() {
        let (users, mut insert) = users();
        let _id = insert.bind(&users.column::<i64>("ID"));
        let _created = insert.bind(&users.column::<String>("CREATED"));
        assert_eq!(
            insert.compile(&OracleDialect).unwrap().sql,
            "INSERT INTO USERS (NAME, AGE) VALUES (:ph00, 30) RETURNING ID, CREATED INTO :par00, :par01"
        );
    }

    #[test]
    fn test_last_insert_id_is_single_column() {
        let (users, mut insert) = users();
        let _id = insert.bind(&users.column::<i64>("ID"));
        assert_eq!(
            insert.compile(&SqliteDialect).unwrap().sql,
            "INSERT INTO USERS (NAME, AGE) VALUES (:ph00, 30)"
        );

        let _created = insert.bind(&users.column::<String>("CREATED"));
        let err = insert.compile(&SqliteDialect).unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnsupportedReturning {
                dialect: "sqlite",
                requested: 2
            }
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_returned_expression_must_be_column() {
        let (users, mut insert) = users();
        let _max = insert.bind(&users.column::<i64>("ID").max());
        assert!(matches!(
            insert.compile(&SqlServerDialect),
            Err(QueryError::NotAColumn(text)) if text == "MAX(USERS.ID)"
        ));
    }

    #[test]
    fn test_insert_requires_assignments() {
        let insert = Statement::insert().into(&Table::new("T"));
        assert!(matches!(
            insert.compile(&SqliteDialect),
            Err(QueryError::NoAssignments("INSERT"))
        ));
    }
}
