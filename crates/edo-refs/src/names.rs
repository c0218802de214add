//! Stage name validation.
//!
//! Valid stage names for refs:
//! - Must satisfy [`StageId`] shape rules (non-empty, no separators or whitespace)
//! - Must not be `remote`, which is the remote namespace directory
//! - Must not look like an object key, which would make the checkout
//!   pointer ambiguous
//! - Must not start with `.` or contain characters that are unsafe in file
//!   names on common filesystems

use edo_types::{ObjectKey, StageId};

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a stage ref name.
const FORBIDDEN_CHARS: &[char] = &[':', '*', '?', '"', '<', '>', '|'];

/// Validate a stage name for use as a ref, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use edo_refs::names::validate_stage_name;
/// use edo_types::StageId;
///
/// assert!(validate_stage_name(&StageId::parse("DEV-1-SYS-SUB").unwrap()).is_ok());
/// assert!(validate_stage_name(&StageId::parse("remote").unwrap()).is_err());
/// ```
pub fn validate_stage_name(stage: &StageId) -> Result<()> {
    let name = stage.as_str();
    let invalid = |reason: String| RefError::InvalidStageName {
        name: name.to_string(),
        reason,
    };

    if name == "remote" {
        return Err(invalid("'remote' is reserved for the remote namespace".into()));
    }
    if ObjectKey::looks_like_key(name) {
        return Err(invalid("must not look like an object key".into()));
    }
    if name.starts_with('.') {
        return Err(invalid("must not start with '.'".into()));
    }
    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str) -> Result<()> {
        validate_stage_name(&StageId::parse(name).unwrap())
    }

    #[test]
    fn conventional_names_are_valid() {
        assert!(check("DEV-1-FINANCE-PAYROLL").is_ok());
        assert!(check("PRD-2-SYS-SUB").is_ok());
    }

    #[test]
    fn reserved_and_ambiguous_names_are_rejected() {
        assert!(check("remote").is_err());
        assert!(check(&ObjectKey::digest(b"x").to_hex()).is_err());
        assert!(check(".hidden").is_err());
        assert!(check("DEV:1").is_err());
    }
}
