//! UPDATE compilation.

use super::Statement;
use crate::ast::RenderContext;
use crate::error::{QueryError, Result};

impl Statement {
    pub(super) fn render_update(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        self.reject_returning()?;
        let target = self.source()?.render(ctx)?;
        if self.columns.is_empty() {
            return Err(QueryError::NoAssignments("UPDATE"));
        }
        let [row] = self.rows.as_slice() else {
            return Err(QueryError::UpdateRowCount(self.rows.len()));
        };

        let mut assignments = Vec::with_capacity(self.columns.len());
        for (index, column) in self.columns.iter().enumerate() {
            let value = match row.get(index).and_then(Option::as_ref) {
                Some(value) => value.render(ctx)?,
                None => String::from("NULL"),
            };
            assignments.push(format!("{column} = {value}"));
        }

        let mut sql = format!("UPDATE {target} SET {}", assignments.join(", "));
        self.render_where(&mut sql, ctx)?;
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{SqlExpr, Table};
    use crate::builder::Statement;
    use crate::dialect::{SqlServerDialect, SqliteDialect};
    use crate::error::QueryError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_with_expression() {
        let t = Table::new("STOCK");
        let qty = t.column::<i64>("QTY");
        let note = t.column::<String>("NOTE");
        let id = t.column::<i64>("ID");

        let update = Statement::update()
            .into(&t)
            .set(qty.to(qty.add(5_i64)))
            .set(note.to_null())
            .where_(id.eq(3_i64));

        assert_eq!(
            update.compile(&SqlServerDialect).unwrap().sql,
            "UPDATE STOCK SET QTY = (STOCK.QTY + 5), NOTE = NULL WHERE (STOCK.ID = 3)"
        );
    }

    #[test]
    fn test_update_requires_one_row() {
        let t = Table::new("T");
        let a = t.column::<i64>("A");
        let mut update = Statement::update().into(&t).set(a.to(1_i64));
        update.stage_row();
        update.assign(a.to(2_i64));

        assert!(matches!(
            update.compile(&SqliteDialect),
            Err(QueryError::UpdateRowCount(2))
        ));
        assert!(matches!(
            Statement::update().into(&t).compile(&SqliteDialect),
            Err(QueryError::NoAssignments("UPDATE"))
        ));
    }

    #[test]
    fn test_update_rejects_returned_columns() {
        let t = Table::new("T");
        let a = t.column::<i64>("A");
        let mut update = Statement::update().into(&t).set(a.to(1_i64));
        let _a = update.bind(&a);

        assert!(matches!(
            update.compile(&SqliteDialect),
            Err(QueryError::ReturningOnlyForInsert("UPDATE"))
        ));
    }
}
