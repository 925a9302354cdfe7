//! Oracle reply parsing. The oracle is untrusted: anything that does not
//! resolve to a known action is an error, never a guess.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::OracleError;
use crate::kernel::action::ActionKind;
use crate::planner::types::{OracleAction, Recommendation, StatusPatch};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("static regex"));

/// Exhaustive mapping from the oracle's textual vocabulary.
pub fn parse_action(text: &str) -> Result<OracleAction, OracleError> {
    let normalized = text.trim().trim_end_matches('.').to_lowercase();
    let action = match normalized.as_str() {
        "put on the grill" | "load" => OracleAction::Act(ActionKind::Load),
        "turn over" | "flip" => OracleAction::Act(ActionKind::Flip),
        "season" | "seasoning" => OracleAction::Act(ActionKind::Season),
        "take off the grill" | "unload" => OracleAction::Act(ActionKind::Unload),
        "emergency stop" | "stop" => OracleAction::Act(ActionKind::EmergencyStop),
        "" | "no action" | "none" | "wait" | "hold" => OracleAction::Hold,
        _ => return Err(OracleError::UnknownAction(text.trim().to_string())),
    };
    Ok(action)
}

/// Raw JSON first, then the first Markdown code fence.
pub fn parse_reply(text: &str) -> Result<Recommendation, OracleError> {
    let value = match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => value,
        Err(direct) => {
            let fenced = CODE_FENCE
                .captures(text)
                .and_then(|caps| caps.get(1))
                .ok_or_else(|| OracleError::Malformed(direct.to_string()))?;
            serde_json::from_str::<Value>(fenced.as_str())
                .map_err(|e| OracleError::Malformed(e.to_string()))?
        }
    };
    parse_value(&value)
}

/// Accepts `{"action": .., "statusPatch": {..}}` and the long form
/// `{"Execution Information": {"Current Action": ..}, "System Status": {..}}`.
pub fn parse_value(value: &Value) -> Result<Recommendation, OracleError> {
    if !value.is_object() {
        return Err(OracleError::Malformed("reply is not a JSON object".to_string()));
    }

    let action_field = value
        .get("action")
        .or_else(|| value.pointer("/Execution Information/Current Action"))
        .or_else(|| value.get("Current Action"))
        .ok_or(OracleError::MissingAction)?;

    let action = match action_field {
        Value::Null => OracleAction::Hold,
        Value::String(text) => parse_action(text)?,
        other => return Err(OracleError::UnknownAction(other.to_string())),
    };

    Ok(Recommendation {
        action,
        patch: parse_patch(value),
    })
}

fn parse_patch(value: &Value) -> StatusPatch {
    let Some(patch) = value
        .get("statusPatch")
        .or_else(|| value.get("System Status"))
        .and_then(Value::as_object)
    else {
        return StatusPatch::default();
    };

    let mut out = StatusPatch::default();
    for (key, field) in patch {
        match key.as_str() {
            "expected_seasoning" | "Expected Seasoning Times" => {
                out.expected_seasoning = field
                    .as_u64()
                    .or_else(|| field.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u64))
                    .and_then(|v| u32::try_from(v).ok());
            }
            // Phase, side and counters are owned by the controller.
            _ => debug!("Ignored oracle patch field {:?}", key),
        }
    }
    out
}
