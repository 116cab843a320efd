use crate::value::{Arity, NativeFn, NativeFunction, Value};
use std::io::Write;

/// Registry of host-provided functions. Built once by the host and handed to
/// the root environment; nothing here is global.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    functions: Vec<NativeFunction>,
}

impl Builtins {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// `print`, `len` and `type`.
    pub fn standard() -> Self {
        let mut builtins = Self::new();
        builtins.register("print", Arity::AtLeast(1), print);
        builtins.register("len", Arity::Exact(1), len);
        builtins.register("type", Arity::Exact(1), type_of);
        builtins
    }

    /// Adds a function, replacing any earlier one with the same name.
    pub fn register(&mut self, name: &'static str, arity: Arity, func: NativeFn) {
        self.functions.retain(|f| f.name != name);
        self.functions.push(NativeFunction { name, arity, func });
    }

    pub fn iter(&self) -> impl Iterator<Item = &NativeFunction> {
        self.functions.iter()
    }
}

fn print(out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    let line = args
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "{}", line).map_err(|e| format!("print failed: {}", e))?;
    Ok(Value::Void)
}

fn len(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match args {
        [Value::String(s)] => Ok(Value::Number(s.chars().count() as f64)),
        [Value::Array(a)] => Ok(Value::Number(a.borrow().len() as f64)),
        [other] => Err(format!("len() not supported for type {}", other.type_name())),
        _ => Err(format!("len() takes exactly 1 argument, got {}", args.len())),
    }
}

fn type_of(_out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match args {
        [value] => Ok(Value::String(value.type_name().to_string())),
        _ => Err(format!("type() takes exactly 1 argument, got {}", args.len())),
    }
}
