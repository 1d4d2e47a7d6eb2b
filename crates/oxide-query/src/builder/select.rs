//! SELECT compilation.

use super::Statement;
use crate::ast::RenderContext;
use crate::dialect::Paging;
use crate::error::{QueryError, Result};

impl Statement {
    pub(super) fn render_select(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        if self.select.is_empty() {
            return Err(QueryError::EmptySelect);
        }

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        let columns = self
            .select
            .iter()
            .map(|item| item.expr.render_definition(ctx))
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(&columns.join(", "));

        sql.push_str(" FROM ");
        sql.push_str(&self.source()?.render(ctx)?);
        self.render_where(&mut sql, ctx)?;

        if self.select.iter().any(|item| item.expr.is_aggregate()) {
            let groups = self
                .select
                .iter()
                .filter(|item| item.expr.is_groupable())
                .map(|item| item.expr.render(ctx))
                .collect::<Result<Vec<_>>>()?;
            if !groups.is_empty() {
                sql.push_str(" GROUP BY ");
                sql.push_str(&groups.join(", "));
            }
        }

        if self.order.is_empty() {
            if self.offset > 0 || self.limit > 0 {
                return Err(QueryError::PagingWithoutOrder);
            }
            return Ok(sql);
        }

        let keys = self
            .order
            .iter()
            .map(|order| -> Result<String> {
                let key = match order.expr.select_alias(ctx) {
                    Some(alias) => String::from(&*alias),
                    None => order.expr.render(ctx)?,
                };
                Ok(if order.descending { key + " DESC" } else { key })
            })
            .collect::<Result<Vec<_>>>()?;
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys.join(", "));

        self.render_paging(&mut sql, ctx.dialect().paging());
        Ok(sql)
    }

    fn render_paging(&self, sql: &mut String, paging: Paging) {
        let (offset, limit) = (self.offset, self.limit);
        match paging {
            Paging::LimitOffset => {
                if limit > 0 {
                    sql.push_str(&format!(" LIMIT {limit}"));
                    if offset > 0 {
                        sql.push_str(&format!(" OFFSET {offset}"));
                    }
                } else if offset > 0 {
                    sql.push_str(&format!(" LIMIT -1 OFFSET {offset}"));
                }
            }
            Paging::OffsetFetch => {
                if offset > 0 || limit > 0 {
                    sql.push_str(&format!(" OFFSET {offset} ROWS"));
                }
                if limit > 0 {
                    sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
                }
            }
        }
    }
}
