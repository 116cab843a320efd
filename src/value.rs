use crate::ast::Stmt;
use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// Arrays are shared: every binding of the same array sees element writes.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Number(f64),
    String(String),
    Boolean(bool),
    Array(ArrayRef),
    Function(Rc<Function>),
    NativeFunction(NativeFunction),
}

/// A user-defined function. It records no defining environment: free
/// variables resolve through the frame chain of the call site.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<[Stmt]>,
}

/// Host callable. Receives the evaluator's output sink and the already
/// evaluated arguments; an `Err` message becomes a runtime error at the call.
pub type NativeFn = fn(&mut dyn Write, &[Value]) -> Result<Value, String>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (prefix, n) = match *self {
            Arity::Exact(n) => ("exactly", n),
            Arity::AtLeast(n) => ("at least", n),
        };
        let noun = if n == 1 { "argument" } else { "arguments" };
        write!(f, "{} {} {}", prefix, n, noun)
    }
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Void => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.borrow().is_empty(),
            Value::Function(_) | Value::NativeFunction(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "Void",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::Array(_) => "Array",
            Value::Function(_) => "Function",
            Value::NativeFunction(_) => "NativeFunction",
        }
    }

    pub fn same_type(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Array(l), Value::Array(r)) => Rc::ptr_eq(l, r) || *l.borrow() == *r.borrow(),
            (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
            (Value::NativeFunction(l), Value::NativeFunction(r)) => l.name == r.name,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, item) in a.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Function(function) => write!(f, "<fn {}>", function.name),
            Value::NativeFunction(native) => write!(f, "<native fn {}>", native.name),
        }
    }
}
