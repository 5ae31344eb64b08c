use rand::Rng;

use super::{Args, Builtin, finite};
use crate::engine::{FormulaError, Result, Value};

pub const FUNCTIONS: &[Builtin] = &[
    Builtin {
        name: "ABS",
        min_args: 1,
        max_args: Some(1),
        description: "Absolute value",
        main: abs,
    },
    Builtin {
        name: "SQRT",
        min_args: 1,
        max_args: Some(1),
        description: "Square root; negative input is #NUM!",
        main: sqrt,
    },
    Builtin {
        name: "EXP",
        min_args: 1,
        max_args: Some(1),
        description: "e raised to a power",
        main: exp,
    },
    Builtin {
        name: "LN",
        min_args: 1,
        max_args: Some(1),
        description: "Natural logarithm",
        main: ln,
    },
    Builtin {
        name: "LOG",
        min_args: 1,
        max_args: Some(2),
        description: "Logarithm to a base (default 10)",
        main: log,
    },
    Builtin {
        name: "LOG10",
        min_args: 1,
        max_args: Some(1),
        description: "Base-10 logarithm",
        main: log10,
    },
    Builtin {
        name: "PI",
        min_args: 0,
        max_args: Some(0),
        description: "The constant pi",
        main: pi,
    },
    Builtin {
        name: "SIN",
        min_args: 1,
        max_args: Some(1),
        description: "Sine of an angle in radians",
        main: sin,
    },
    Builtin {
        name: "COS",
        min_args: 1,
        max_args: Some(1),
        description: "Cosine of an angle in radians",
        main: cos,
    },
    Builtin {
        name: "TAN",
        min_args: 1,
        max_args: Some(1),
        description: "Tangent of an angle in radians",
        main: tan,
    },
    Builtin {
        name: "ASIN",
        min_args: 1,
        max_args: Some(1),
        description: "Arcsine; input outside [-1, 1] is #NUM!",
        main: asin,
    },
    Builtin {
        name: "ACOS",
        min_args: 1,
        max_args: Some(1),
        description: "Arccosine; input outside [-1, 1] is #NUM!",
        main: acos,
    },
    Builtin {
        name: "ATAN",
        min_args: 1,
        max_args: Some(1),
        description: "Arctangent",
        main: atan,
    },
    Builtin {
        name: "ATAN2",
        min_args: 2,
        max_args: Some(2),
        description: "Angle of the point (x, y); ATAN2(x, y)",
        main: atan2,
    },
    Builtin {
        name: "RADIANS",
        min_args: 1,
        max_args: Some(1),
        description: "Degrees to radians",
        main: radians,
    },
    Builtin {
        name: "DEGREES",
        min_args: 1,
        max_args: Some(1),
        description: "Radians to degrees",
        main: degrees,
    },
    Builtin {
        name: "ROUND",
        min_args: 1,
        max_args: Some(2),
        description: "Round half away from zero to a number of digits",
        main: round,
    },
    Builtin {
        name: "ROUNDUP",
        min_args: 1,
        max_args: Some(2),
        description: "Round away from zero",
        main: roundup,
    },
    Builtin {
        name: "ROUNDDOWN",
        min_args: 1,
        max_args: Some(2),
        description: "Round toward zero",
        main: rounddown,
    },
    Builtin {
        name: "INT",
        min_args: 1,
        max_args: Some(1),
        description: "Round down to the nearest integer",
        main: int,
    },
    Builtin {
        name: "RAND",
        min_args: 0,
        max_args: Some(0),
        description: "Uniform random number in [0, 1)",
        main: rand_unit,
    },
];

fn abs(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Number(args.number(0)?.abs()))
}

fn sqrt(args: &Args<'_, '_>) -> Result<Value> {
    let n = args.number(0)?;
    if n < 0.0 {
        return Err(FormulaError::num("square root of a negative number"));
    }
    finite("SQRT", n.sqrt())
}

fn exp(args: &Args<'_, '_>) -> Result<Value> {
    finite("EXP", args.number(0)?.exp())
}

fn positive(name: &str, n: f64) -> Result<f64> {
    if n <= 0.0 {
        return Err(FormulaError::num(format!("{} needs a positive number", name)));
    }
    Ok(n)
}

fn ln(args: &Args<'_, '_>) -> Result<Value> {
    finite("LN", positive("LN", args.number(0)?)?.ln())
}

fn log(args: &Args<'_, '_>) -> Result<Value> {
    let n = positive("LOG", args.number(0)?)?;
    let base = positive("LOG", args.number_or(1, 10.0)?)?;
    if base == 1.0 {
        return Err(FormulaError::div_zero("logarithm base 1"));
    }
    if base == 10.0 {
        return finite("LOG", n.log10());
    }
    finite("LOG", n.log(base))
}

fn log10(args: &Args<'_, '_>) -> Result<Value> {
    finite("LOG10", positive("LOG10", args.number(0)?)?.log10())
}

fn pi(_args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Number(std::f64::consts::PI))
}

fn sin(args: &Args<'_, '_>) -> Result<Value> {
    finite("SIN", args.number(0)?.sin())
}

fn cos(args: &Args<'_, '_>) -> Result<Value> {
    finite("COS", args.number(0)?.cos())
}

fn tan(args: &Args<'_, '_>) -> Result<Value> {
    finite("TAN", args.number(0)?.tan())
}

fn unit_interval(name: &str, n: f64) -> Result<f64> {
    if !(-1.0..=1.0).contains(&n) {
        return Err(FormulaError::num(format!("{} is outside [-1, 1] for {}", n, name)));
    }
    Ok(n)
}

fn asin(args: &Args<'_, '_>) -> Result<Value> {
    finite("ASIN", unit_interval("ASIN", args.number(0)?)?.asin())
}

fn acos(args: &Args<'_, '_>) -> Result<Value> {
    finite("ACOS", unit_interval("ACOS", args.number(0)?)?.acos())
}

fn atan(args: &Args<'_, '_>) -> Result<Value> {
    finite("ATAN", args.number(0)?.atan())
}

fn atan2(args: &Args<'_, '_>) -> Result<Value> {
    let (x, y) = (args.number(0)?, args.number(1)?);
    if x == 0.0 && y == 0.0 {
        return Err(FormulaError::div_zero("ATAN2 of the origin"));
    }
    finite("ATAN2", y.atan2(x))
}

fn radians(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Number(args.number(0)?.to_radians()))
}

fn degrees(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Number(args.number(0)?.to_degrees()))
}

fn round_with(args: &Args<'_, '_>, name: &str, op: fn(f64) -> f64) -> Result<Value> {
    let n = args.number(0)?;
    let digits = args.number_or(1, 0.0)?.trunc();
    let scale = 10f64.powi(digits.abs() as i32);
    let rounded = if digits >= 0.0 {
        op(n * scale) / scale
    } else {
        op(n / scale) * scale
    };
    finite(name, rounded)
}

fn round(args: &Args<'_, '_>) -> Result<Value> {
    round_with(args, "ROUND", f64::round)
}

fn roundup(args: &Args<'_, '_>) -> Result<Value> {
    round_with(args, "ROUNDUP", |n| n.abs().ceil().copysign(n))
}

fn rounddown(args: &Args<'_, '_>) -> Result<Value> {
    round_with(args, "ROUNDDOWN", f64::trunc)
}

fn int(args: &Args<'_, '_>) -> Result<Value> {
    Ok(Value::Number(args.number(0)?.floor()))
}

fn rand_unit(_args: &Args<'_, '_>) -> Result<Value> {
    let mut rng = rand::thread_rng();
    Ok(Value::Number(rng.gen_range(0.0..1.0)))
}
