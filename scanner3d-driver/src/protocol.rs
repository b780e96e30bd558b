//! Device to host message grammar.
//!
//! One message per line, space separated, the first token naming the kind:
//!
//! | Line                          | Message                         |
//! |-------------------------------|---------------------------------|
//! | `POS <base> <height> <dist>`  | [`Message::Position`]           |
//! | `POSX <base> <height> <dist>` | [`Message::PositionSample`]     |
//! | `OK`                          | [`Message::Ok`]                 |
//! | `ERROR <text>`                | [`Message::Error`]              |
//! | `STATUS <text>`               | [`Message::Status`]             |
//! | `3D Scanner Controller Ready` | [`Message::Ready`]              |
//!
//! A `POS`/`POSX` line without exactly three integer fields is
//! [`Message::Malformed`]; any other line is [`Message::Unrecognized`].

use crate::constants::{
    MSG_ERROR, MSG_OK, MSG_POSITION, MSG_POSITION_SAMPLE, MSG_READY, MSG_STATUS,
    N_POSITION_FIELDS,
};

/// Raw rig position as reported by the firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    /// Turntable rotation in motor steps.
    pub base: i32,
    /// Sensor carriage position.
    pub height: i32,
    /// Distance reading.
    pub distance: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Position(Position),
    PositionSample(Position),
    Ok,
    Error(String),
    Status(String),
    Ready,
    Unrecognized(String),
    Malformed(String),
}

pub fn parse_line(line: &str) -> Message {
    let line = line.trim();
    if line == MSG_READY {
        return Message::Ready;
    }

    let (kind, rest) = match line.split_once(' ') {
        Some((kind, rest)) => (kind, rest.trim()),
        None => (line, ""),
    };

    match kind {
        MSG_POSITION => parse_position(rest)
            .map(Message::Position)
            .unwrap_or_else(|| Message::Malformed(line.to_string())),
        MSG_POSITION_SAMPLE => parse_position(rest)
            .map(Message::PositionSample)
            .unwrap_or_else(|| Message::Malformed(line.to_string())),
        MSG_OK if rest.is_empty() => Message::Ok,
        MSG_ERROR => Message::Error(rest.to_string()),
        MSG_STATUS => Message::Status(rest.to_string()),
        _ => Message::Unrecognized(line.to_string()),
    }
}

fn parse_position(fields: &str) -> Option<Position> {
    let values = fields
        .split_whitespace()
        .map(|token| token.parse::<i32>().ok())
        .collect::<Option<Vec<i32>>>()?;
    if values.len() != N_POSITION_FIELDS {
        return None;
    }
    Some(Position {
        base: values[0],
        height: values[1],
        distance: values[2],
    })
}
