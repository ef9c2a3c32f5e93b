use serde::Deserialize;
use tracing::warn;

use crate::error::Result;
use crate::traits::Statement;
use crate::types::SqlValue;

/// How arguments are coerced before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingMode {
    /// Every value kind is bound at full width.
    #[default]
    Standard,
    /// Legacy-compatible binding: only text, int32, int64 and double are
    /// bound, int64 is narrowed to 32 bits, other kinds are skipped.
    Legacy,
}

/// An argument position that was not bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedArgument {
    /// 1-based parameter index
    pub index: usize,
    pub kind: &'static str,
}

/// Summary of one binding pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    pub bound: usize,
    pub skipped: Vec<SkippedArgument>,
}

/// Trait for coercing an ordered argument list into bound statement parameters.
///
/// Backends usually only pick a [`BindingMode`]; the provided `bind` walks the
/// arguments and binds each one at its 1-based position.
pub trait ParameterBinder {
    fn binding_mode(&self) -> BindingMode {
        BindingMode::Standard
    }

    fn bind(&self, statement: &mut dyn Statement, args: &[SqlValue]) -> Result<BindReport> {
        bind_positional(statement, args, self.binding_mode())
    }
}

/// Bind `args` at indices `1..=args.len()` in order.
/// A skipped argument still consumes its index.
pub fn bind_positional(
    statement: &mut dyn Statement,
    args: &[SqlValue],
    mode: BindingMode,
) -> Result<BindReport> {
    let mut report = BindReport::default();

    for (offset, arg) in args.iter().enumerate() {
        let index = offset + 1;
        match coerce(arg, mode) {
            Some(value) => {
                statement.bind(index, &value)?;
                report.bound += 1;
            }
            None => {
                warn!(index, kind = arg.kind(), "argument kind not bound in legacy mode, skipping");
                report.skipped.push(SkippedArgument {
                    index,
                    kind: arg.kind(),
                });
            }
        }
    }

    Ok(report)
}

fn coerce(arg: &SqlValue, mode: BindingMode) -> Option<SqlValue> {
    match mode {
        BindingMode::Standard => Some(arg.clone()),
        BindingMode::Legacy => match arg {
            SqlValue::Text(_) | SqlValue::Int32(_) | SqlValue::Double(_) => Some(arg.clone()),
            // wrapping narrow, matching the legacy behavior
            SqlValue::Int64(v) => Some(SqlValue::Int32(*v as i32)),
            _ => None,
        },
    }
}
