//! Tree-walking evaluator for the host language.
//!
//! Control flow (`return`, `break label`) propagates as a [`Flow`]
//! signal, not an error; the function boundary and labeled statements
//! are the handlers.

use std::rc::Rc;

use weft_tree::NodeRef;

use crate::ast::{ArrowBody, AssignTarget, BinaryOp, Block, Expr, Stmt, UnaryOp};
use crate::env::{LocalScope, Scope};
use crate::error::EvalError;
use crate::value::{FunctionValue, Value};

/// Result of executing a statement.
pub(crate) enum Flow {
    Normal,
    Return(Value),
    Break(Option<String>),
}

pub(crate) struct Interpreter;

impl Interpreter {
    /// Run a callable body to completion: `return` yields its value,
    /// falling off the end yields `Unit`, an unhandled `break` is a
    /// fault.
    pub fn run_body(
        &self,
        body: &Block,
        scope: &LocalScope<Scope>,
    ) -> Result<Value, EvalError> {
        match self.exec_block_in(body, scope)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Unit),
            Flow::Break(label) => Err(EvalError::UnmatchedBreak { label }),
        }
    }

    fn exec_block_in(
        &self,
        block: &Block,
        scope: &LocalScope<Scope>,
    ) -> Result<Flow, EvalError> {
        for stmt in &block.stmts {
            match self.exec_stmt(stmt, scope)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&self, stmt: &Stmt, scope: &LocalScope<Scope>) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Let { bindings } => {
                for (name, expr) in bindings {
                    let value = self.eval(expr, scope)?;
                    scope.borrow_mut().define(name.clone(), value);
                }
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, value } => {
                let value = self.eval(value, scope)?;
                match target {
                    AssignTarget::Name(name) => {
                        scope.borrow_mut().assign(name, value)?;
                    }
                    AssignTarget::Member { object, member } => {
                        let object = self.eval(object, scope)?;
                        self.assign_member(&object, member, value)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Unit,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break { label } => Ok(Flow::Break(label.clone())),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.eval(cond, scope)?;
                let Value::Bool(cond) = cond else {
                    return Err(EvalError::NonBoolCondition {
                        type_name: cond.type_name(),
                    });
                };
                if cond {
                    self.exec_stmt(then_branch, scope)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch, scope)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Block(block) => {
                let child = LocalScope::new(Scope::with_parent(scope.clone()));
                self.exec_block_in(block, &child)
            }
            Stmt::Labeled { label, body } => match self.exec_stmt(body, scope)? {
                Flow::Break(Some(broken)) if broken == *label => Ok(Flow::Normal),
                other => Ok(other),
            },
        }
    }

    fn assign_member(
        &self,
        object: &Value,
        member: &str,
        value: Value,
    ) -> Result<(), EvalError> {
        if let (Value::Node(node), "data") = (object, member) {
            if node.set_data(value.stringify()) {
                return Ok(());
            }
        }
        Err(EvalError::InvalidAssignment {
            member: member.to_string(),
            type_name: object.type_name(),
        })
    }

    fn eval(&self, expr: &Expr, scope: &LocalScope<Scope>) -> Result<Value, EvalError> {
        match expr {
            Expr::Str(s) => Ok(Value::string(s.as_str())),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Ident(name) => scope.borrow().lookup(name).ok_or_else(|| {
                EvalError::UndefinedVariable { name: name.clone() }
            }),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand, scope)?;
                eval_unary(*op, &operand)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                eval_binary(*op, &left, &right)
            }
            Expr::Member { object, member } => {
                let object = self.eval(object, scope)?;
                self.eval_member(&object, member)
            }
            Expr::Index { object, index } => {
                let object = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                self.eval_index(&object, &index)
            }
            Expr::Call { callee, args } => {
                // Method-call shape: dispatch node methods before falling
                // back to "read the member, then call it".
                if let Expr::Member { object, member } = callee.as_ref() {
                    let object = self.eval(object, scope)?;
                    if let Value::Node(node) = &object {
                        if is_node_method(member) {
                            let args = self.eval_args(args, scope)?;
                            return self.call_node_method(node, member, &args);
                        }
                    }
                    let callee = self.eval_member(&object, member)?;
                    let args = self.eval_args(args, scope)?;
                    return self.call(&callee, &args);
                }
                let callee = self.eval(callee, scope)?;
                let args = self.eval_args(args, scope)?;
                self.call(&callee, &args)
            }
            Expr::Arrow { params, body } => Ok(Value::Func(Rc::new(FunctionValue {
                params: params.clone(),
                body: body.clone(),
                captured: scope.clone(),
            }))),
        }
    }

    fn eval_args(
        &self,
        args: &[Expr],
        scope: &LocalScope<Scope>,
    ) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|arg| self.eval(arg, scope)).collect()
    }

    /// Call a function value. Missing arguments bind as `Unit`, extra
    /// arguments are ignored.
    pub fn call(&self, callee: &Value, args: &[Value]) -> Result<Value, EvalError> {
        match callee {
            Value::Func(func) => {
                let frame = LocalScope::new(Scope::with_parent(func.captured.clone()));
                for (i, param) in func.params.iter().enumerate() {
                    let value = args.get(i).cloned().unwrap_or(Value::Unit);
                    frame.borrow_mut().define(param.clone(), value);
                }
                match &func.body {
                    ArrowBody::Expr(expr) => self.eval(expr, &frame),
                    ArrowBody::Block(block) => self.run_body(block, &frame),
                }
            }
            Value::Native(native) => native(args),
            other => Err(EvalError::NotCallable {
                type_name: other.type_name(),
            }),
        }
    }

    fn eval_member(&self, object: &Value, member: &str) -> Result<Value, EvalError> {
        match (object, member) {
            (Value::Node(node), "data") => match node.data() {
                Some(data) => Ok(Value::string(data)),
                None => Err(no_member(member, object)),
            },
            (Value::Node(node), "tag") => match node.tag() {
                Some(tag) => Ok(Value::string(tag)),
                None => Err(no_member(member, object)),
            },
            (Value::Node(node), "children") => Ok(Value::List(Rc::new(
                node.children().into_iter().map(Value::Node).collect(),
            ))),
            _ => Err(no_member(member, object)),
        }
    }

    fn eval_index(&self, object: &Value, index: &Value) -> Result<Value, EvalError> {
        match object {
            Value::List(items) => {
                let Value::Int(i) = index else {
                    return Err(EvalError::CannotIndex {
                        type_name: index.type_name(),
                    });
                };
                usize::try_from(*i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or(EvalError::IndexOutOfBounds {
                        index: *i,
                        len: items.len(),
                    })
            }
            other => Err(EvalError::CannotIndex {
                type_name: other.type_name(),
            }),
        }
    }

    fn call_node_method(
        &self,
        node: &NodeRef,
        method: &str,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        match method {
            "set_attr" => {
                let [name, value] = args else {
                    return Err(EvalError::ArityMismatch {
                        method: method.to_string(),
                        expected: 2,
                        got: args.len(),
                    });
                };
                if node.set_attr(name.stringify(), value.stringify()) {
                    Ok(Value::Unit)
                } else {
                    Err(EvalError::NoSuchMethod {
                        method: method.to_string(),
                        type_name: "leaf node",
                    })
                }
            }
            "attr" => {
                let [name] = args else {
                    return Err(EvalError::ArityMismatch {
                        method: method.to_string(),
                        expected: 1,
                        got: args.len(),
                    });
                };
                Ok(node
                    .attr(&name.stringify())
                    .map_or(Value::Unit, Value::string))
            }
            _ => unreachable!("dispatched through is_node_method"),
        }
    }
}

fn is_node_method(member: &str) -> bool {
    matches!(member, "set_attr" | "attr")
}

fn no_member(member: &str, object: &Value) -> EvalError {
    EvalError::NoSuchMember {
        member: member.to_string(),
        type_name: object.type_name(),
    }
}

fn eval_unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or(EvalError::Overflow { op: "-" }),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        _ => Err(EvalError::InvalidUnaryOp {
            op: op.symbol(),
            type_name: operand.type_name(),
        }),
    }
}

fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => {
            // String on either side means concatenation, with the other
            // side stringified the way leaf payloads are.
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                let mut combined = left.stringify();
                combined.push_str(&right.stringify());
                return Ok(Value::string(combined));
            }
            numeric_op(op, left, right)
        }
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => numeric_op(op, left, right),
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::Ne => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, left, right),
    }
}

fn numeric_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => {
                    if b == 0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    a.checked_div(b)
                }
                _ => unreachable!("numeric_op only handles arithmetic"),
            };
            result
                .map(Value::Int)
                .ok_or(EvalError::Overflow { op: op.symbol() })
        }
        (Value::Float(_), Value::Float(_))
        | (Value::Int(_), Value::Float(_))
        | (Value::Float(_), Value::Int(_)) => {
            let (a, b) = (as_float(left), as_float(right));
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => unreachable!("numeric_op only handles arithmetic"),
            };
            Ok(Value::Float(result))
        }
        _ => Err(EvalError::InvalidBinaryOp {
            op: op.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        (Value::Float(_) | Value::Int(_), Value::Float(_) | Value::Int(_)) => {
            as_float(left).partial_cmp(&as_float(right))
        }
        _ => None,
    };
    let Some(ordering) = ordering else {
        return Err(EvalError::InvalidBinaryOp {
            op: op.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        });
    };
    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => unreachable!("compare only handles orderings"),
    };
    Ok(Value::Bool(result))
}

#[allow(clippy::cast_precision_loss)]
fn as_float(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(x) => *x,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> Result<Value, EvalError> {
        run_with(source, &[])
    }

    fn run_with(source: &str, bindings: &[(&str, Value)]) -> Result<Value, EvalError> {
        let block = parse(source).expect("test source must parse");
        let scope = LocalScope::new(Scope::new());
        for (name, value) in bindings {
            scope.borrow_mut().define(*name, value.clone());
        }
        Interpreter.run_body(&block, &scope)
    }

    #[test]
    fn return_yields_value_fallthrough_yields_unit() {
        assert_eq!(run("return 42;"), Ok(Value::int(42)));
        assert_eq!(run("1 + 1;"), Ok(Value::Unit));
    }

    #[test]
    fn string_concat_stringifies_both_sides() {
        assert_eq!(
            run("return 'n=' + 3 + '';"),
            Ok(Value::string("n=3"))
        );
        assert_eq!(run("return 1 + 2;"), Ok(Value::int(3)));
    }

    #[test]
    fn labeled_break_exits_the_label_only() {
        assert_eq!(
            run("let x = 1; lbl: if (true) { x = 2; break lbl; x = 3; } return x;"),
            Ok(Value::int(2))
        );
    }

    #[test]
    fn unmatched_break_is_a_fault() {
        assert_eq!(
            run("break missing;"),
            Err(EvalError::UnmatchedBreak {
                label: Some("missing".into())
            })
        );
    }

    #[test]
    fn arrow_captures_defining_scope() {
        assert_eq!(
            run("let a = 'x'; let f = () => a + '!'; let a = 'y'; return f();"),
            Ok(Value::string("y!"))
        );
    }

    #[test]
    fn arrow_params_bind_missing_as_unit() {
        assert_eq!(
            run("let f = (p) => '' + p; return f();"),
            Ok(Value::string(""))
        );
    }

    #[test]
    fn node_data_read_write() {
        let node = NodeRef::text("old");
        let result = run_with(
            "n.data = n.data + '!'; return n.data;",
            &[("n", Value::Node(node.clone()))],
        );
        assert_eq!(result, Ok(Value::string("old!")));
        assert_eq!(node.data().as_deref(), Some("old!"));
    }

    #[test]
    fn node_attr_methods_and_children() {
        let root = NodeRef::branch("div").with_child(NodeRef::text("t"));
        let result = run_with(
            "n.set_attr('class', 7); return n.attr('class') + n.children[0].data;",
            &[("n", Value::Node(root.clone()))],
        );
        assert_eq!(result, Ok(Value::string("7t")));
        assert_eq!(root.attr("class").as_deref(), Some("7"));
    }

    #[test]
    fn data_assignment_on_branch_is_a_fault() {
        let root = NodeRef::branch("div");
        let result = run_with("n.data = 'x';", &[("n", Value::Node(root))]);
        assert_eq!(
            result,
            Err(EvalError::InvalidAssignment {
                member: "data".into(),
                type_name: "branch node",
            })
        );
    }

    #[test]
    fn condition_must_be_bool() {
        assert_eq!(
            run("if (1) { return 2; }"),
            Err(EvalError::NonBoolCondition { type_name: "int" })
        );
    }

    #[test]
    fn undefined_variable() {
        assert_eq!(
            run("return ghost;"),
            Err(EvalError::UndefinedVariable {
                name: "ghost".into()
            })
        );
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(run("return 1 / 0;"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn native_functions_are_callable() {
        let double = Value::native(|args| match args {
            [Value::Int(n)] => Ok(Value::int(n * 2)),
            _ => Err(EvalError::native("expected one int")),
        });
        assert_eq!(
            run_with("return f(21);", &[("f", double)]),
            Ok(Value::int(42))
        );
    }

    #[test]
    fn comparisons() {
        assert_eq!(run("return 1 < 2;"), Ok(Value::Bool(true)));
        assert_eq!(run("return 'a' >= 'b';"), Ok(Value::Bool(false)));
        assert_eq!(run("return 2 == 2.0;"), Ok(Value::Bool(true)));
    }
}
