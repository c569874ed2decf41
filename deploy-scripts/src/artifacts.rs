//! Compiled contract artifacts, as emitted by the Solidity toolchain

use std::{fs, path::Path};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::{ContractObject, JsonAbi},
    primitives::{Bytes, I256},
};

use crate::errors::DeployError;

/// The parts of a compilation artifact needed to deploy and describe a contract
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    /// The contract name
    pub name: String,
    /// The contract's ABI, persisted alongside its address
    pub abi: JsonAbi,
    /// The creation bytecode
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Read an artifact JSON file (`abi` + `bytecode`)
    pub fn load(name: &str, path: &Path) -> Result<Self, DeployError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            DeployError::ArtifactParsing(format!("could not read {}: {}", path.display(), e))
        })?;

        Self::from_json(name, &contents)
    }

    /// Parse an artifact from its JSON representation
    pub fn from_json(name: &str, contents: &str) -> Result<Self, DeployError> {
        let object: ContractObject = serde_json::from_str(contents)
            .map_err(|e| DeployError::ArtifactParsing(format!("{}: {}", name, e)))?;

        let abi = object
            .abi
            .ok_or_else(|| DeployError::ArtifactParsing(format!("{}: artifact has no ABI", name)))?;

        // Abstract contracts and interfaces compile to empty bytecode
        let bytecode = object.bytecode.filter(|code| !code.is_empty()).ok_or_else(|| {
            DeployError::ArtifactParsing(format!("{}: artifact has no creation bytecode", name))
        })?;

        Ok(Self {
            name: name.to_string(),
            abi,
            bytecode,
        })
    }

    /// ABI-encode a call to the named function, selector included.
    ///
    /// The overload is picked by arity. Integer arguments are narrowed to the
    /// widths the function declares. A mismatch between the arguments and
    /// the function's declared inputs, or an integer that does not fit its
    /// declared width, is a configuration error.
    pub fn encode_call(&self, function: &str, args: &[DynSolValue]) -> Result<Bytes, DeployError> {
        let func = self
            .abi
            .function(function)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
            .ok_or_else(|| {
                DeployError::Configuration(format!(
                    "{} has no function `{}` taking {} arguments",
                    self.name,
                    function,
                    args.len()
                ))
            })?;

        let args = func
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let ty = param.resolve().map_err(|e| e.to_string())?;
                conform(arg, &ty).map_err(|e| format!("{} `{}`: {}", param.ty, param.name, e))
            })
            .collect::<Result<Vec<_>, String>>()
            .map_err(|e| {
                DeployError::Configuration(format!(
                    "arguments do not match {}.{}: {}",
                    self.name,
                    func.signature(),
                    e
                ))
            })?;

        func.abi_encode_input(&args).map(Bytes::from).map_err(|e| {
            DeployError::Configuration(format!(
                "arguments do not match {}.{}: {}",
                self.name,
                func.signature(),
                e
            ))
        })
    }
}

/// Rebuild a value at the integer widths of the declared type.
///
/// Only unsigned integers are narrowed, into `uintN` or `intN`; anything
/// else is passed through for the encoder to type-check.
fn conform(value: &DynSolValue, ty: &DynSolType) -> Result<DynSolValue, String> {
    let components = ty
        .as_tuple()
        .or_else(|| ty.as_custom_struct().map(|(_, _, tuple)| tuple));

    match (value, ty) {
        (DynSolValue::Uint(v, _), DynSolType::Uint(bits)) => {
            if v.bit_len() > *bits {
                return Err(format!("{} does not fit in uint{}", v, bits));
            }
            Ok(DynSolValue::Uint(*v, *bits))
        }
        (DynSolValue::Uint(v, _), DynSolType::Int(bits)) => {
            // The sign bit must stay clear
            if v.bit_len() >= *bits {
                return Err(format!("{} does not fit in int{}", v, bits));
            }
            Ok(DynSolValue::Int(I256::from_raw(*v), *bits))
        }
        (DynSolValue::Array(values), DynSolType::Array(inner)) => Ok(DynSolValue::Array(
            values.iter().map(|v| conform(v, inner)).collect::<Result<_, _>>()?,
        )),
        (DynSolValue::Array(values), DynSolType::FixedArray(inner, len)) if values.len() == *len => {
            Ok(DynSolValue::FixedArray(
                values.iter().map(|v| conform(v, inner)).collect::<Result<_, _>>()?,
            ))
        }
        (DynSolValue::Tuple(values), _) => match components {
            Some(types) if types.len() == values.len() => Ok(DynSolValue::Tuple(
                values
                    .iter()
                    .zip(types)
                    .map(|(v, t)| conform(v, t))
                    .collect::<Result<_, _>>()?,
            )),
            _ => Ok(value.clone()),
        }
        _ => Ok(value.clone()),
    }
}
