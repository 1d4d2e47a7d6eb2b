//! DELETE compilation.

use super::Statement;
use crate::ast::RenderContext;
use crate::error::Result;

impl Statement {
    pub(super) fn render_delete(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        self.reject_returning()?;
        let source = self.source()?.render(ctx)?;
        if self.constraint.is_empty() {
            return Ok(format!("DELETE {source}"));
        }

        let mut sql = format!("DELETE FROM {source}");
        self.render_where(&mut sql, ctx)?;
        Ok(sql)
    }
}
