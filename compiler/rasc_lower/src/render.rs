//! Textual form of the IR, for `rasc ir` and debugging.

use std::fmt::{self, Write};

use crate::ir::{Expr, ExprKind, ImageIndex, ImageVarId, Stmt, Target};
use crate::CompiledScript;

const INDENT: &str = "    ";

struct Renderer<'a, 'f> {
    script: &'a CompiledScript,
    out: &'a mut fmt::Formatter<'f>,
    depth: usize,
}

impl Renderer<'_, '_> {
    fn image_name(&self, image: ImageIndex) -> &str {
        self.script
            .image_params
            .iter()
            .nth(image.index())
            .map_or("?", |(name, _)| name)
    }

    fn var_name(&self, var: ImageVarId) -> &str {
        self.script
            .image_vars
            .get(var.index())
            .map_or("?", |v| v.name.as_str())
    }

    fn line(&mut self, text: fmt::Arguments<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            self.out.write_str(INDENT)?;
        }
        self.out.write_fmt(text)?;
        self.out.write_char('\n')
    }

    fn expr(&self, expr: &Expr) -> String {
        let mut s = String::new();
        self.write_expr(&mut s, expr);
        s
    }

    fn write_expr(&self, s: &mut String, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(v) if v.is_nan() => s.push_str("null"),
            ExprKind::Literal(v) => {
                let _ = write!(s, "{v}");
            }
            ExprKind::List(items) => {
                s.push('[');
                self.write_list(s, items);
                s.push(']');
            }
            ExprKind::Range(start, end) => {
                self.write_expr(s, start);
                s.push(':');
                self.write_expr(s, end);
            }
            ExprKind::Local(slot) => {
                let _ = write!(s, "%{}", slot.0);
            }
            ExprKind::ImageVar(var) => s.push_str(self.var_name(*var)),
            ExprKind::ImageRead(read) => {
                s.push_str(self.image_name(read.image));
                if let Some(pos) = &read.pos {
                    s.push('[');
                    if pos.x_absolute {
                        s.push('$');
                    }
                    self.write_expr(s, &pos.x);
                    s.push_str(", ");
                    if pos.y_absolute {
                        s.push('$');
                    }
                    self.write_expr(s, &pos.y);
                    s.push(']');
                }
                if let Some(band) = &read.band {
                    s.push('[');
                    self.write_expr(s, band);
                    s.push(']');
                }
            }
            ExprKind::Call(call) => {
                s.push_str(call.func.name);
                s.push('(');
                self.write_list(s, &call.args);
                s.push(')');
            }
            ExprKind::Con(con) => {
                s.push_str("con(");
                self.write_expr(s, &con.cond);
                for branch in &con.branches {
                    s.push_str(", ");
                    self.write_expr(s, branch);
                }
                s.push(')');
            }
        }
    }

    fn write_list(&self, s: &mut String, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            self.write_expr(s, item);
        }
    }

    fn block(&mut self, stmts: &[Stmt]) -> fmt::Result {
        self.depth += 1;
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        self.depth -= 1;
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Assign { target, value } => {
                let target = match target {
                    Target::Local(slot) => format!("%{}", slot.0),
                    Target::ImageVar(var) => self.var_name(*var).to_string(),
                };
                let value = self.expr(value);
                self.line(format_args!("{target} = {value};"))
            }
            Stmt::WriteDest { image, value } => {
                let name = self.image_name(*image).to_string();
                let value = self.expr(value);
                self.line(format_args!("write {name} <- {value};"))
            }
            Stmt::Return(value) => {
                let value = self.expr(value);
                self.line(format_args!("return {value};"))
            }
            Stmt::Eval(value) => {
                let value = self.expr(value);
                self.line(format_args!("{value};"))
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.expr(cond);
                self.line(format_args!("if ({cond}) {{"))?;
                self.block(then_branch)?;
                if !else_branch.is_empty() {
                    self.line(format_args!("}} else {{"))?;
                    self.block(else_branch)?;
                }
                self.line(format_args!("}}"))
            }
            Stmt::While { cond, body } => {
                let cond = self.expr(cond);
                self.line(format_args!("while ({cond}) {{"))?;
                self.block(body)?;
                self.line(format_args!("}}"))
            }
            Stmt::Until { cond, body } => {
                let cond = self.expr(cond);
                self.line(format_args!("until ({cond}) {{"))?;
                self.block(body)?;
                self.line(format_args!("}}"))
            }
            Stmt::ForEach { var, source, body } => {
                let source = self.expr(source);
                self.line(format_args!("foreach (%{} in {source}) {{", var.0))?;
                self.block(body)?;
                self.line(format_args!("}}"))
            }
            Stmt::Break => self.line(format_args!("break;")),
            Stmt::BreakIf(cond) => {
                let cond = self.expr(cond);
                self.line(format_args!("breakif ({cond});"))
            }
        }
    }
}

/// ```text
/// model direct
/// image src: source
/// image out: destination
/// init k = 2
/// locals 1
/// write out <- _add(x(), y());
/// ```
impl fmt::Display for CompiledScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "model {}", self.model)?;
        for (name, role) in self.image_params.iter() {
            writeln!(f, "image {name}: {role}")?;
        }
        if let Some(outside) = self.options.outside {
            writeln!(f, "option outside = {outside}")?;
        }
        let mut renderer = Renderer {
            script: self,
            out: f,
            depth: 0,
        };
        for var in &self.image_vars {
            match &var.default {
                Some(default) => {
                    let default = renderer.expr(default);
                    renderer.line(format_args!("init {} = {default}", var.name))?;
                }
                None => renderer.line(format_args!("init {}", var.name))?,
            }
        }
        renderer.line(format_args!("locals {}", self.local_count))?;
        for stmt in &self.body {
            renderer.stmt(stmt)?;
        }
        Ok(())
    }
}
