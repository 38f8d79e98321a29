//! Model verdict types and the validating parser for model replies.
//!
//! The model is asked for a JSON object:
//! `{"relevant": bool, "direction": "UP|DOWN|MENTIONED|NONE", "subjects": [..], "rationale": ".."}`.
//! Replies are checked field by field; anything that does not fit is a
//! [`ClassificationError::Parse`], never a guess.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ClassificationError;

pub const MAX_RATIONALE_CHARS: usize = 600;

/// Expected market direction for the subjects named in a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    /// Named but no clear direction.
    Mentioned,
    None,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Mentioned => "MENTIONED",
            Direction::None => "NONE",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            "MENTIONED" => Ok(Direction::Mentioned),
            "NONE" => Ok(Direction::None),
            other => Err(format!("unknown direction `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub relevant: bool,
    pub direction: Direction,
    /// Tickers or sectors, in the order the model listed them.
    pub subjects: Vec<String>,
    pub rationale: String,
}

impl ClassificationResult {
    pub fn not_relevant(rationale: impl Into<String>) -> Self {
        Self {
            relevant: false,
            direction: Direction::None,
            subjects: Vec::new(),
            rationale: rationale.into(),
        }
    }
}

fn parse_err(msg: impl Into<String>) -> ClassificationError {
    ClassificationError::Parse(msg.into())
}

/// Slice out the outermost `{...}` so code fences and chatter around it are ignored.
fn json_object_slice(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn field_relevant(obj: &Map<String, Value>) -> Result<bool, ClassificationError> {
    match obj.get("relevant") {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            other => Err(parse_err(format!("`relevant` is not a boolean: {other:?}"))),
        },
        Some(other) => Err(parse_err(format!("`relevant` is not a boolean: {other}"))),
        None => Err(parse_err("missing `relevant`")),
    }
}

fn field_direction(obj: &Map<String, Value>, relevant: bool) -> Result<Direction, ClassificationError> {
    match obj.get("direction") {
        Some(Value::String(s)) => s.parse().map_err(parse_err),
        Some(Value::Null) | None if !relevant => Ok(Direction::None),
        Some(Value::Null) | None => Err(parse_err("missing `direction` on a relevant verdict")),
        Some(other) => Err(parse_err(format!("`direction` is not a string: {other}"))),
    }
}

fn field_subjects(obj: &Map<String, Value>) -> Result<Vec<String>, ClassificationError> {
    let items = match obj.get("subjects") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(parse_err(format!("`subjects` is not a list: {other}"))),
    };

    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let s = it
            .as_str()
            .ok_or_else(|| parse_err(format!("`subjects` entry is not a string: {it}")))?
            .trim();
        if s.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(s)) {
            continue;
        }
        out.push(s.to_string());
    }
    Ok(out)
}

fn field_rationale(obj: &Map<String, Value>) -> Result<String, ClassificationError> {
    match obj.get("rationale") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(sanitize_rationale(s)),
        Some(other) => Err(parse_err(format!("`rationale` is not a string: {other}"))),
    }
}

/// Single line, folded whitespace, capped length.
pub fn sanitize_rationale(input: &str) -> String {
    let folded = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if folded.chars().count() <= MAX_RATIONALE_CHARS {
        return folded;
    }
    folded.chars().take(MAX_RATIONALE_CHARS).collect::<String>().trim_end().to_string()
}

/// Turn a raw model reply into a validated verdict.
pub fn parse_verdict(raw: &str) -> Result<ClassificationResult, ClassificationError> {
    if raw.trim().is_empty() {
        return Err(ClassificationError::EmptyResponse);
    }
    let slice = json_object_slice(raw).ok_or_else(|| parse_err("no JSON object in reply"))?;
    let value: Value =
        serde_json::from_str(slice).map_err(|e| parse_err(format!("invalid JSON: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| parse_err("reply is not a JSON object"))?;

    let relevant = field_relevant(obj)?;
    let direction = field_direction(obj, relevant)?;
    if relevant && direction == Direction::None {
        return Err(parse_err("relevant verdict with direction NONE"));
    }
    Ok(ClassificationResult {
        relevant,
        direction,
        subjects: field_subjects(obj)?,
        rationale: field_rationale(obj)?,
    })
}
