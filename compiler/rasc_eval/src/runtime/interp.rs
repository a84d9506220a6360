//! Tree-walking interpreter over the lowered IR.

use rand::Rng;
use rasc_ir::ensure_sufficient_stack;
use rasc_lower::ir::{Call, Con, Expr, ExprKind, ImageRead, Stmt, Target};
use rasc_registry::{is_true, FunctionImpl, RandomFn, RuntimeField};

use super::{image_name, Runtime};
use crate::error::{RuntimeError, RuntimeResult};

/// A runtime value. Lists only live for the duration of an expression or a
/// list-typed local.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Value {
    Scalar(f64),
    List(Vec<f64>),
}

impl Value {
    pub(crate) fn scalar(self) -> RuntimeResult<f64> {
        match self {
            Value::Scalar(v) => Ok(v),
            Value::List(_) => Err(RuntimeError::internal(
                "list value where a scalar is required",
            )),
        }
    }

    /// A scalar is a one-element list.
    fn into_list(self) -> Vec<f64> {
        match self {
            Value::Scalar(v) => vec![v],
            Value::List(items) => items,
        }
    }

    fn map(self, f: fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(v) => Value::Scalar(f(v)),
            Value::List(items) => Value::List(items.into_iter().map(f).collect()),
        }
    }
}

/// How a statement finished.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Flow {
    Normal,
    Break,
    /// Indirect model: the pixel value.
    Return(f64),
}

/// Per-pixel state: the position and the locals.
pub(crate) struct Frame {
    x: f64,
    y: f64,
    locals: Vec<Value>,
}

impl Frame {
    pub(crate) fn new(local_count: usize) -> Self {
        Frame {
            x: 0.0,
            y: 0.0,
            locals: vec![Value::Scalar(f64::NAN); local_count],
        }
    }

    /// Move to a new pixel; locals start out null.
    pub(crate) fn reset(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        for local in &mut self.locals {
            *local = Value::Scalar(f64::NAN);
        }
    }

    fn local_mut(&mut self, index: usize) -> RuntimeResult<&mut Value> {
        self.locals
            .get_mut(index)
            .ok_or_else(|| RuntimeError::internal("local slot out of range"))
    }
}

/// `1` above zero, `0` at zero, `-1` below zero or null.
fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x == 0.0 {
        0
    } else {
        -1
    }
}

/// Longest range that may be built as a list value. `foreach` steps its
/// range instead and has no limit.
const MAX_RANGE_LEN: u64 = 1 << 22;

/// Inclusive integer-stepped range, descending when `end < start`. Empty
/// when either bound is null or infinite.
#[derive(Clone, Debug)]
struct Steps {
    start: f64,
    step: f64,
    next: u64,
    count: u64,
}

impl Steps {
    fn new(start: f64, end: f64) -> Self {
        let (step, count) = if start.is_finite() && end.is_finite() {
            let step = if end >= start { 1.0 } else { -1.0 };
            // Saturates for spans beyond u64.
            let span = (end - start).abs().floor() as u64;
            (step, span.saturating_add(1))
        } else {
            (1.0, 0)
        };
        Steps {
            start,
            step,
            next: 0,
            count,
        }
    }
}

impl Iterator for Steps {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.count {
            return None;
        }
        let value = self.start + self.step * self.next as f64;
        self.next += 1;
        Some(value)
    }
}

/// A range as a list value, refused past [`MAX_RANGE_LEN`] elements.
fn range(start: f64, end: f64) -> RuntimeResult<Vec<f64>> {
    let steps = Steps::new(start, end);
    if steps.count > MAX_RANGE_LEN {
        return Err(RuntimeError::RangeTooLong {
            start,
            end,
            max: MAX_RANGE_LEN,
        });
    }
    Ok(steps.collect())
}

/// Apply a scalar function, broadcasting a scalar over a list.
fn broadcast(
    func: &'static str,
    f: fn(f64, f64) -> f64,
    a: Value,
    b: Value,
) -> RuntimeResult<Value> {
    Ok(match (a, b) {
        (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(f(a, b)),
        (Value::Scalar(a), Value::List(b)) => Value::List(b.into_iter().map(|b| f(a, b)).collect()),
        (Value::List(a), Value::Scalar(b)) => Value::List(a.into_iter().map(|a| f(a, b)).collect()),
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Err(RuntimeError::ListLengthMismatch {
                    func,
                    left: a.len(),
                    right: b.len(),
                });
            }
            Value::List(a.iter().zip(&b).map(|(&a, &b)| f(a, b)).collect())
        }
    })
}

impl Runtime {
    // Statements

    pub(super) fn exec_block(&mut self, frame: &mut Frame, stmts: &[Stmt]) -> RuntimeResult<Flow> {
        for stmt in stmts {
            match self.exec(frame, stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run a loop body once; `Some` when the loop must stop with that flow.
    fn loop_body(&mut self, frame: &mut Frame, body: &[Stmt]) -> RuntimeResult<Option<Flow>> {
        Ok(match self.exec_block(frame, body)? {
            Flow::Normal => None,
            Flow::Break => Some(Flow::Normal),
            ret @ Flow::Return(_) => Some(ret),
        })
    }

    fn for_each(
        &mut self,
        frame: &mut Frame,
        var: usize,
        items: impl Iterator<Item = f64>,
        body: &[Stmt],
    ) -> RuntimeResult<Flow> {
        for item in items {
            *frame.local_mut(var)? = Value::Scalar(item);
            if let Some(flow) = self.loop_body(frame, body)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, frame: &mut Frame, stmt: &Stmt) -> RuntimeResult<Flow> {
        match stmt {
            Stmt::Assign { target, value } => {
                let value = self.eval(frame, value)?;
                match target {
                    Target::Local(slot) => *frame.local_mut(slot.index())? = value,
                    Target::ImageVar(var) => {
                        let value = value.scalar()?;
                        let Some(slot) = self.vars.get_mut(var.index()) else {
                            return Err(RuntimeError::internal("image-scope variable out of range"));
                        };
                        *slot = value;
                    }
                }
            }
            Stmt::WriteDest { image, value } => {
                let value = self.eval(frame, value)?.scalar()?;
                self.write_dest(*image, frame.x, frame.y, value)?;
            }
            Stmt::Return(value) => {
                let value = self.eval(frame, value)?.scalar()?;
                return Ok(Flow::Return(value));
            }
            Stmt::Eval(value) => {
                self.eval(frame, value)?;
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let branch = if self.truth(frame, cond)? {
                    then_branch
                } else {
                    else_branch
                };
                return self.exec_block(frame, branch);
            }
            Stmt::While { cond, body } => {
                while self.truth(frame, cond)? {
                    if let Some(flow) = self.loop_body(frame, body)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::Until { cond, body } => {
                while !self.truth(frame, cond)? {
                    if let Some(flow) = self.loop_body(frame, body)? {
                        return Ok(flow);
                    }
                }
            }
            Stmt::ForEach { var, source, body } => {
                // A range source is stepped in place, never built as a list.
                if let ExprKind::Range(start, end) = &source.kind {
                    let start = self.eval(frame, start)?.scalar()?;
                    let end = self.eval(frame, end)?.scalar()?;
                    return self.for_each(frame, var.index(), Steps::new(start, end), body);
                }
                let items = self.eval(frame, source)?.into_list();
                return self.for_each(frame, var.index(), items.into_iter(), body);
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::BreakIf(cond) => {
                if self.truth(frame, cond)? {
                    return Ok(Flow::Break);
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn truth(&mut self, frame: &mut Frame, cond: &Expr) -> RuntimeResult<bool> {
        Ok(is_true(self.eval(frame, cond)?.scalar()?))
    }

    // Expressions

    pub(super) fn eval(&mut self, frame: &mut Frame, expr: &Expr) -> RuntimeResult<Value> {
        ensure_sufficient_stack(|| self.eval_inner(frame, expr))
    }

    fn eval_inner(&mut self, frame: &mut Frame, expr: &Expr) -> RuntimeResult<Value> {
        match &expr.kind {
            ExprKind::Literal(v) => Ok(Value::Scalar(*v)),
            ExprKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(frame, item)?.scalar()?);
                }
                Ok(Value::List(values))
            }
            ExprKind::Range(start, end) => {
                let start = self.eval(frame, start)?.scalar()?;
                let end = self.eval(frame, end)?.scalar()?;
                Ok(Value::List(range(start, end)?))
            }
            ExprKind::Local(slot) => frame
                .locals
                .get(slot.index())
                .cloned()
                .ok_or_else(|| RuntimeError::internal("local slot out of range")),
            ExprKind::ImageVar(var) => self
                .vars
                .get(var.index())
                .map(|v| Value::Scalar(*v))
                .ok_or_else(|| RuntimeError::internal("image-scope variable out of range")),
            ExprKind::ImageRead(read) => self.read_image(frame, read).map(Value::Scalar),
            ExprKind::Call(call) => self.call(frame, call),
            ExprKind::Con(con) => self.con(frame, con),
        }
    }

    fn call(&mut self, frame: &mut Frame, call: &Call) -> RuntimeResult<Value> {
        let name = call.func.name;
        match (call.func.imp, call.args.as_slice()) {
            (FunctionImpl::Nullary(f), []) => Ok(Value::Scalar(f())),
            (FunctionImpl::Unary(f), [a]) => Ok(self.eval(frame, a)?.map(f)),
            (FunctionImpl::Binary(f), [a, b]) => {
                let a = self.eval(frame, a)?;
                let b = self.eval(frame, b)?;
                broadcast(name, f, a, b)
            }
            (FunctionImpl::Reduce(f), [list]) => {
                let items = self.eval(frame, list)?.into_list();
                Ok(Value::Scalar(f(&items)))
            }
            (FunctionImpl::Random(kind), [a]) => {
                let a = self.eval(frame, a)?.scalar()?;
                Ok(Value::Scalar(self.random(kind, a)))
            }
            (FunctionImpl::Proxy(field), []) => Ok(Value::Scalar(self.proxy(frame, field))),
            (_, args) => Err(RuntimeError::internal(format!(
                "`{name}` called with {} arguments",
                args.len()
            ))),
        }
    }

    fn random(&mut self, kind: RandomFn, x: f64) -> f64 {
        match kind {
            RandomFn::Uniform => self.rng.gen::<f64>() * x,
            RandomFn::Int => {
                if x.is_nan() || x.is_infinite() || x < 0.0 {
                    return f64::NAN;
                }
                self.rng.gen_range(0..=x.floor() as u64) as f64
            }
        }
    }

    fn proxy(&self, frame: &Frame, field: RuntimeField) -> f64 {
        let Some(world) = &self.world else {
            return f64::NAN;
        };
        let bounds = world.bounds();
        match field {
            RuntimeField::X => frame.x,
            RuntimeField::Y => frame.y,
            RuntimeField::Width => bounds.width,
            RuntimeField::Height => bounds.height,
            RuntimeField::XMin => bounds.min_x,
            RuntimeField::YMin => bounds.min_y,
            RuntimeField::XMax => bounds.max_x(),
            RuntimeField::YMax => bounds.max_y(),
            RuntimeField::XRes => world.x_step(),
            RuntimeField::YRes => world.y_step(),
        }
    }

    /// Push the sign of the condition once, pick a branch from the top of
    /// the stack, pop.
    fn con(&mut self, frame: &mut Frame, con: &Con) -> RuntimeResult<Value> {
        let cond = self.eval(frame, &con.cond)?.scalar()?;
        self.con_stack.push(sign(cond));
        let result = self.con_branch(frame, con);
        self.con_stack.pop();
        result
    }

    fn con_branch(&mut self, frame: &mut Frame, con: &Con) -> RuntimeResult<Value> {
        let Some(&sign) = self.con_stack.last() else {
            return Err(RuntimeError::internal("empty `con` stack"));
        };
        let chosen = match (con.branches.as_slice(), sign) {
            ([], s) => return Ok(Value::Scalar(if s > 0 { 1.0 } else { 0.0 })),
            ([a], 1) | ([a, _], 1) | ([a, _, _], 1) => a,
            ([_], _) => return Ok(Value::Scalar(0.0)),
            ([_, b], _) | ([_, b, _], 0) => b,
            ([_, _, c], _) => c,
            _ => return Err(RuntimeError::internal("`con` with more than three branches")),
        };
        self.eval(frame, chosen)
    }

    fn read_image(&mut self, frame: &mut Frame, read: &ImageRead) -> RuntimeResult<f64> {
        let (mut x, mut y) = (frame.x, frame.y);
        if let Some(pos) = &read.pos {
            let px = self.eval(frame, &pos.x)?.scalar()?;
            let py = self.eval(frame, &pos.y)?.scalar()?;
            x = if pos.x_absolute { px } else { frame.x + px };
            y = if pos.y_absolute { py } else { frame.y + py };
        }
        let band = match &read.band {
            Some(band) => self.eval(frame, band)?.scalar()?,
            None => 0.0,
        };

        let Some(binding) = self.sources.get(read.image.index()).and_then(Option::as_ref) else {
            return Err(RuntimeError::UnboundImage {
                name: image_name(&self.script, read.image),
            });
        };
        let image = &binding.image;
        let bands = image.bands();
        let valid_band = band >= 0.0 && band.fract() == 0.0 && band < f64::from(bands);
        if !valid_band {
            return Err(RuntimeError::BandOutOfRange {
                image: image_name(&self.script, read.image),
                band,
                bands,
            });
        }

        let pixel = binding.transform.world_to_pixel(x, y);
        if let Some((px, py)) = pixel.filter(|&(px, py)| image.contains(px, py)) {
            return Ok(image.get(px, py, band as u32));
        }
        match self.script.options.outside {
            Some(outside) => Ok(outside),
            None => Err(RuntimeError::OutsideImage {
                image: image_name(&self.script, read.image),
                x,
                y,
            }),
        }
    }
}
