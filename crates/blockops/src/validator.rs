use crate::error::{CallError, ErrorCode, ValidationResult};
use crate::model::{Call, CallFile};
use crate::registry::registry;

const SUPPORTED_VERSION: u8 = 1;

/// Check a call file against the operator registry, collecting every
/// problem instead of stopping at the first.
pub fn validate_call_file(file: &CallFile) -> ValidationResult {
    let mut errors = Vec::new();

    if file.version != SUPPORTED_VERSION {
        errors.push(
            CallError::new(
                ErrorCode::InvalidVersion,
                format!("unsupported version {}, expected {}", file.version, SUPPORTED_VERSION),
            )
            .with_path("version"),
        );
    }

    if file.calls.is_empty() {
        errors.push(CallError::new(ErrorCode::EmptyCalls, "no calls defined").with_path("calls"));
    }

    for (index, call) in file.calls.iter().enumerate() {
        validate_call(call, &format!("calls[{}]", index), &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_call(call: &Call, base_path: &str, errors: &mut Vec<CallError>) {
    let spec = registry().get(&call.opcode);
    if spec.is_none() {
        errors.push(
            CallError::new(
                ErrorCode::UnknownOpcode,
                format!("unknown opcode '{}'", call.opcode),
            )
            .with_path(format!("{}.opcode", base_path)),
        );
    }

    for (name, value) in &call.inputs {
        let path = format!("{}.inputs.{}", base_path, name);
        if let Some(spec) = spec {
            if !spec.accepts_field(name) {
                errors.push(
                    CallError::new(
                        ErrorCode::UnknownField,
                        format!("{} has no input field '{}'", call.opcode, name),
                    )
                    .with_path(&path),
                );
            }
        }
        if value.is_object() {
            errors.push(
                CallError::new(ErrorCode::InvalidInputValue, "input values cannot be objects")
                    .with_path(&path),
            );
        }
    }

    if call.expect.as_ref().is_some_and(|v| v.is_object()) {
        errors.push(
            CallError::new(ErrorCode::InvalidInputValue, "expected values cannot be objects")
                .with_path(format!("{}.expect", base_path)),
        );
    }
}
