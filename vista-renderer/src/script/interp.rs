//! Tree-walking interpreter over a [`RenderScope`].

use vista_core::{kind_name, to_text, Params, Value};

use super::ast::{Expr, Node, Stmt};
use crate::context::RenderScope;
use crate::error::ViewError;

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), ViewError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        };
        return Err(ViewError::eval(format!(
            "{name}() takes {expected} argument(s), {} given",
            args.len()
        )));
    }
    Ok(())
}

fn str_arg<'v>(name: &str, args: &'v [Value], index: usize) -> Result<&'v str, ViewError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ViewError::eval(format!(
            "{name}() expects argument {} to be a string, got {}",
            index + 1,
            kind_name(other)
        ))),
        None => Err(ViewError::eval(format!(
            "{name}() is missing argument {}",
            index + 1
        ))),
    }
}

pub(crate) struct Interpreter<'a, 's, 'r> {
    scope: &'s mut RenderScope<'r>,
    vars: &'a Params,
    locals: Vec<Params>,
}

impl<'a, 's, 'r> Interpreter<'a, 's, 'r> {
    pub(crate) fn new(scope: &'s mut RenderScope<'r>, vars: &'a Params) -> Self {
        Self {
            scope,
            vars,
            locals: vec![Params::new()],
        }
    }

    pub(crate) fn exec(&mut self, nodes: &[Node]) -> Result<(), ViewError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.scope.write(text),
                Node::Echo(expr) => {
                    let value = self.eval(expr)?;
                    self.scope.write(&to_text(&value));
                }
                Node::Exec(stmts) => {
                    for stmt in stmts {
                        match stmt {
                            Stmt::Expr(expr) => {
                                self.eval(expr)?;
                            }
                            Stmt::Let(name, expr) => {
                                let value = self.eval(expr)?;
                                if let Some(frame) = self.locals.last_mut() {
                                    frame.insert(name.clone(), value);
                                }
                            }
                        }
                    }
                }
                Node::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    let branch = if truthy(&self.eval(cond)?) { then } else { otherwise };
                    self.exec(branch)?;
                }
                Node::For { var, iter, body } => {
                    let items: Vec<Value> = match self.eval(iter)? {
                        Value::Array(items) => items,
                        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
                        Value::Null => Vec::new(),
                        other => {
                            return Err(ViewError::eval(format!(
                                "cannot iterate over a {}",
                                kind_name(&other)
                            )))
                        }
                    };
                    for item in items {
                        let mut frame = Params::new();
                        frame.insert(var.clone(), item);
                        self.locals.push(frame);
                        let result = self.exec(body);
                        self.locals.pop();
                        result?;
                    }
                }
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.vars.get(name))
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, ViewError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(name) => self
                .lookup(name)
                .cloned()
                .ok_or_else(|| ViewError::UndefinedVariable { name: name.clone() }),
            Expr::Member(base, field) => {
                let base = self.eval(base)?;
                member(&base, field)
            }
            Expr::Index(base, index) => {
                let base = self.eval(base)?;
                let index = self.eval(index)?;
                element(&base, &index)
            }
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Object(entries) => {
                let mut map = Params::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value)?);
                }
                Ok(Value::Object(map))
            }
            Expr::Not(inner) => Ok(Value::Bool(!truthy(&self.eval(inner)?))),
            Expr::Eq(left, right) => Ok(Value::Bool(self.eval(left)? == self.eval(right)?)),
            Expr::NotEq(left, right) => Ok(Value::Bool(self.eval(left)? != self.eval(right)?)),
            Expr::Coalesce(left, right) => match self.eval_soft(left)? {
                Some(value) if !value.is_null() => Ok(value),
                _ => self.eval(right),
            },
            Expr::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(name, args)
            }
        }
    }

    /// Like `eval`, but an undefined variable or an unreadable member yields `None`.
    fn eval_soft(&mut self, expr: &Expr) -> Result<Option<Value>, ViewError> {
        match expr {
            Expr::Var(name) => Ok(self.lookup(name).cloned()),
            Expr::Member(base, field) => Ok(match self.eval_soft(base)? {
                Some(base) => member(&base, field).ok(),
                None => None,
            }),
            Expr::Index(base, index) => {
                let Some(base) = self.eval_soft(base)? else {
                    return Ok(None);
                };
                let index = self.eval(index)?;
                Ok(element(&base, &index).ok())
            }
            other => self.eval(other).map(Some),
        }
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ViewError> {
        match name {
            "block" => {
                arity(name, &args, 2, 2)?;
                let block = str_arg(name, &args, 0)?;
                self.scope.block(block, to_text(&args[1]))?;
                Ok(Value::Null)
            }
            "begin_block" => {
                arity(name, &args, 1, 1)?;
                self.scope.begin_block(str_arg(name, &args, 0)?)?;
                Ok(Value::Null)
            }
            "end_block" => {
                arity(name, &args, 0, 0)?;
                self.scope.end_block()?;
                Ok(Value::Null)
            }
            "render_block" => {
                arity(name, &args, 1, 2)?;
                let block = str_arg(name, &args, 0)?;
                let default = args.get(1).map(to_text).unwrap_or_default();
                Ok(Value::String(self.scope.render_block(block, &default)))
            }
            "layout" => {
                arity(name, &args, 1, 1)?;
                self.scope.layout(str_arg(name, &args, 0)?);
                Ok(Value::Null)
            }
            "render" => {
                arity(name, &args, 1, 2)?;
                let view = str_arg(name, &args, 0)?;
                let params = match args.get(1) {
                    None | Some(Value::Null) => Params::new(),
                    Some(Value::Object(map)) => map.clone(),
                    Some(other) => {
                        return Err(ViewError::eval(format!(
                            "render() expects argument 2 to be a map, got {}",
                            kind_name(other)
                        )))
                    }
                };
                Ok(Value::String(self.scope.render(view, &params)?))
            }
            "esc" => {
                arity(name, &args, 1, 1)?;
                Ok(Value::String(self.scope.esc(&to_text(&args[0]))))
            }
            _ => self.scope.call(name, &args),
        }
    }
}

fn member(base: &Value, field: &str) -> Result<Value, ViewError> {
    match base {
        Value::Object(map) => Ok(map.get(field).cloned().unwrap_or(Value::Null)),
        other => Err(ViewError::eval(format!(
            "cannot read member \"{field}\" of a {}",
            kind_name(other)
        ))),
    }
}

fn element(base: &Value, index: &Value) -> Result<Value, ViewError> {
    match (base, index) {
        (Value::Array(items), Value::Number(n)) => Ok(n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Null)),
        (Value::Object(map), Value::String(key)) => Ok(map.get(key).cloned().unwrap_or(Value::Null)),
        (base, index) => Err(ViewError::eval(format!(
            "cannot index a {} with a {}",
            kind_name(base),
            kind_name(index)
        ))),
    }
}
