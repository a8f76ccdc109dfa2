//! Strategy hooks: user post-filters applied after the built-in shortlist.
//!
//! A hook receives the shortlisted symbols and returns the ones to keep.
//! Closures implement `StrategyHook` directly; named built-ins are loaded from
//! a `kind:arg` spec:
//!
//! | spec          | keeps                                  |
//! |---------------|----------------------------------------|
//! | `prefix:N`    | symbols starting with `N`              |
//! | `allow:A\|B`  | only `A` and `B`                       |
//! | `deny:A\|B`   | everything except `A` and `B`          |
//! | `limit:10`    | the first 10 symbols                   |

use std::collections::HashSet;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HookError {
    #[error("strategy spec '{0}' must be in kind:arg format")]
    MissingSeparator(String),

    #[error("unknown strategy kind '{0}' (expected prefix, allow, deny or limit)")]
    UnknownKind(String),

    #[error("invalid argument '{arg}' for strategy '{kind}'")]
    InvalidArgument { kind: String, arg: String },
}

/// Post-filter over candidate symbols.
pub trait StrategyHook: Send + Sync {
    fn name(&self) -> &str {
        "custom"
    }

    fn select(&self, candidates: &[String]) -> Vec<String>;
}

impl<F> StrategyHook for F
where
    F: Fn(&[String]) -> Vec<String> + Send + Sync,
{
    fn select(&self, candidates: &[String]) -> Vec<String> {
        self(candidates)
    }
}

/// Hooks shipped with the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinHook {
    Prefix(String),
    Allow(HashSet<String>),
    Deny(HashSet<String>),
    Limit(usize),
}

impl StrategyHook for BuiltinHook {
    fn name(&self) -> &str {
        match self {
            BuiltinHook::Prefix(_) => "prefix",
            BuiltinHook::Allow(_) => "allow",
            BuiltinHook::Deny(_) => "deny",
            BuiltinHook::Limit(_) => "limit",
        }
    }

    fn select(&self, candidates: &[String]) -> Vec<String> {
        let keep = |s: &&String| match self {
            BuiltinHook::Prefix(prefix) => s.starts_with(prefix.as_str()),
            BuiltinHook::Allow(set) => set.contains(s.as_str()),
            BuiltinHook::Deny(set) => !set.contains(s.as_str()),
            BuiltinHook::Limit(_) => true,
        };
        let limit = match self {
            BuiltinHook::Limit(n) => *n,
            _ => usize::MAX,
        };
        candidates.iter().filter(keep).take(limit).cloned().collect()
    }
}

fn symbol_set(kind: &str, arg: &str) -> Result<HashSet<String>, HookError> {
    let set: HashSet<String> = arg
        .split('|')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    if set.is_empty() {
        return Err(HookError::InvalidArgument {
            kind: kind.to_string(),
            arg: arg.to_string(),
        });
    }
    Ok(set)
}

/// Parse a `kind:arg` spec into a hook.
pub fn load_strategy(spec: &str) -> Result<Box<dyn StrategyHook>, HookError> {
    let (kind, arg) = spec
        .split_once(':')
        .ok_or_else(|| HookError::MissingSeparator(spec.to_string()))?;
    let kind = kind.trim().to_ascii_lowercase();
    let arg = arg.trim();
    let invalid = || HookError::InvalidArgument {
        kind: kind.clone(),
        arg: arg.to_string(),
    };

    let hook = match kind.as_str() {
        "prefix" if !arg.is_empty() => BuiltinHook::Prefix(arg.to_ascii_uppercase()),
        "prefix" => return Err(invalid()),
        "allow" => BuiltinHook::Allow(symbol_set(&kind, arg)?),
        "deny" => BuiltinHook::Deny(symbol_set(&kind, arg)?),
        "limit" => BuiltinHook::Limit(arg.parse().map_err(|_| invalid())?),
        _ => return Err(HookError::UnknownKind(kind.clone())),
    };
    Ok(Box::new(hook))
}

/// Run `hook` and keep only what it returned that was actually a candidate,
/// in candidate order.
pub fn apply_hook(hook: &dyn StrategyHook, candidates: &[String]) -> Vec<String> {
    let chosen: HashSet<String> = hook.select(candidates).into_iter().collect();
    let allowed: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    for extra in chosen.iter().filter(|s| !allowed.contains(s.as_str())) {
        warn!(
            hook = hook.name(),
            symbol = extra.as_str(),
            "hook returned a non-candidate, dropped"
        );
    }
    candidates
        .iter()
        .filter(|s| chosen.contains(s.as_str()))
        .cloned()
        .collect()
}
