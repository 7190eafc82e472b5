//! `conductor-assertions` — the turn/conversation assertion and validator
//! framework (§4.3). [`evaluator::evaluate`] is the single entry point:
//! given an [`Assertion`](conductor_domain::assertion::Assertion) and the
//! data it needs to inspect (a turn's response, the full message history,
//! the tool calls made), it returns `Ok(None)` on pass, `Ok(Some(violation))`
//! on a normal assertion failure, or `Err(_)` when the evaluation machinery
//! itself failed (a crashed custom validator constructor, an unreachable
//! judge provider, an unreachable REST endpoint) — a distinct error kind
//! from a failed assertion (§7).

pub mod evaluator;
pub mod judge;
pub mod rest_eval;
pub mod validator;

pub use evaluator::{evaluate, EvalInput};
pub use judge::JudgeVerdict;
pub use validator::{Validator, ValidatorConstructor, ValidatorRegistry};
