use super::{Args, Builtin};
use crate::engine::{Result, Value, ensure_string};

pub const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "CONCAT",
        min_args: 2,
        max_args: Some(2),
        description: "Join two values as text (the & operator)",
        main: concat,
    },
    Builtin {
        name: "CONCATENATE",
        min_args: 1,
        max_args: None,
        description: "Join every argument (and every cell of range arguments) as text",
        main: concatenate,
    },
    Builtin {
        name: "LEN",
        min_args: 1,
        max_args: Some(1),
        description: "Number of characters",
        main: len,
    },
    Builtin {
        name: "LENB",
        min_args: 1,
        max_args: Some(1),
        description: "Number of bytes (UTF-8)",
        main: lenb,
    },
];

fn concat(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Text(args.string(0)? + &args.string(1)?))
}

fn concatenate(args: &Args<'_, '_>) -> Result<Value> {
    let mut out = String::new();
    for i in 0..args.len() {
        for value in args.flatten(i)? {
            out.push_str(&ensure_string(&value)?);
        }
    }
    Ok(Value::Text(out))
}

fn len(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Number(args.string(0)?.chars().count() as f64))
}

fn lenb(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Number(args.string(0)?.len() as f64))
}
