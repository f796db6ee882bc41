//! ABI encoding of calls made through a proxy, driven by the artifact's JSON ABI

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier},
    hex,
    json_abi::{Function, JsonAbi},
    primitives::Bytes,
};

use crate::errors::ScriptError;

/// Find the overload of `name` taking `num_args` arguments
pub fn find_function<'a>(
    abi: &'a JsonAbi,
    name: &str,
    num_args: usize,
) -> Result<&'a Function, ScriptError> {
    let overloads = abi
        .function(name)
        .ok_or_else(|| ScriptError::CalldataConstruction(format!("no function named {name}")))?;

    let mut candidates = overloads.iter().filter(|f| f.inputs.len() == num_args);
    match (candidates.next(), candidates.next()) {
        (Some(function), None) => Ok(function),
        (None, _) => Err(ScriptError::CalldataConstruction(format!(
            "no overload of {name} takes {num_args} arguments"
        ))),
        (Some(_), Some(_)) => Err(ScriptError::CalldataConstruction(format!(
            "{name} has several overloads taking {num_args} arguments"
        ))),
    }
}

/// Encode a call to `function`, parsing each argument as the matching parameter type
pub fn encode_call(function: &Function, args: &[String]) -> Result<Bytes, ScriptError> {
    if function.inputs.len() != args.len() {
        return Err(ScriptError::CalldataConstruction(format!(
            "{} takes {} arguments, got {}",
            function.signature(),
            function.inputs.len(),
            args.len()
        )));
    }

    let values = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
            ty.coerce_str(arg).map_err(|e| {
                ScriptError::CalldataConstruction(format!(
                    "invalid {} argument {arg:?}: {e}",
                    ty.sol_type_name()
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    function
        .abi_encode_input(&values)
        .map(Bytes::from)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Build the calldata the proxy calls its implementation with on deployment.
///
/// A missing initializer is only acceptable when no arguments were given for it,
/// in which case the proxy is deployed without initialization.
pub fn initializer_calldata(
    abi: &JsonAbi,
    initializer: Option<&str>,
    args: &[String],
) -> Result<Bytes, ScriptError> {
    let Some(name) = initializer else {
        if !args.is_empty() {
            return Err(ScriptError::CalldataConstruction(
                "initializer arguments given, but initialization is disabled".to_string(),
            ));
        }
        return Ok(Bytes::new());
    };

    if abi.function(name).is_none() && args.is_empty() {
        return Ok(Bytes::new());
    }

    let function = find_function(abi, name, args.len())?;
    encode_call(function, args)
}

/// Decode the return data of a call to `function`
pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>, ScriptError> {
    function
        .abi_decode_output(data)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Render a decoded value for logging
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Address(a) => a.to_checksum(None),
        DynSolValue::Function(f) => hex::encode_prefixed(f.as_slice()),
        DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..*size]),
        DynSolValue::Bytes(b) => hex::encode_prefixed(b),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            format!("[{}]", format_values(values))
        }
        DynSolValue::Tuple(values) => format!("({})", format_values(values)),
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}

/// Render a list of decoded values for logging
pub fn format_values(values: &[DynSolValue]) -> String {
    values.iter().map(format_value).collect::<Vec<_>>().join(", ")
}
