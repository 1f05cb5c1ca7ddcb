//! Token parsing for the motion commands.
//!
//! Axis tokens are case-insensitive; `all` applies a value to all three
//! axes and short-circuits further parsing; a leading `-` on a run target
//! reverses direction. Parsing never mutates motor state: a malformed
//! command is rejected before any axis is touched.

use crate::axis::AxisId;
use crate::error::CommandError;

fn token_string(token: &str) -> heapless::String<16> {
    crate::error::bounded(token)
}

/// The axes a `run` or `stop` command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selection {
    /// One named axis.
    One(AxisId),
    /// All three axes.
    All,
}

impl Selection {
    /// Parse an axis-or-`all` token (case-insensitive).
    pub(crate) fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("all") {
            Some(Selection::All)
        } else {
            AxisId::from_token(token).map(Selection::One)
        }
    }

    pub(crate) fn contains(self, axis: AxisId) -> bool {
        match self {
            Selection::One(selected) => selected == axis,
            Selection::All => true,
        }
    }

    pub(crate) fn iter(self) -> impl Iterator<Item = AxisId> {
        AxisId::ALL.into_iter().filter(move |axis| self.contains(*axis))
    }

    pub(crate) fn is_all(self) -> bool {
        matches!(self, Selection::All)
    }

    /// Lower-case token for status lines.
    pub(crate) fn token(self) -> &'static str {
        match self {
            Selection::One(AxisId::X) => "x",
            Selection::One(AxisId::Y) => "y",
            Selection::One(AxisId::Z) => "z",
            Selection::All => "all",
        }
    }
}

/// Parsed `run` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunTarget {
    pub(crate) selection: Selection,
    pub(crate) reverse: bool,
}

/// Parse a `run` target token: `x|y|z|all` with an optional `-` prefix.
pub(crate) fn parse_run_target(token: &str) -> Result<RunTarget, CommandError> {
    let (reverse, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    match Selection::parse(rest) {
        Some(selection) => Ok(RunTarget { selection, reverse }),
        None => Err(CommandError::InvalidRunTarget(token_string(token))),
    }
}

/// Parse a `stop` target token; a missing token defaults to `all`.
pub(crate) fn parse_stop_target(token: Option<&str>) -> Result<Selection, CommandError> {
    match token {
        None => Ok(Selection::All),
        Some(token) => Selection::parse(token)
            .ok_or_else(|| CommandError::InvalidStopTarget(token_string(token))),
    }
}

/// Parsed `move` request: per-axis relative deltas in caller units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MoveRequest {
    pub(crate) deltas: [Option<f32>; 3],
    pub(crate) used_all: bool,
}

/// Parse `move` arguments: `(axis value)...` pairs or `all value`.
///
/// `all` short-circuits: any tokens after its value are ignored.
pub(crate) fn parse_move_args(args: &[&str]) -> Result<MoveRequest, CommandError> {
    let mut deltas: [Option<f32>; 3] = [None; 3];
    let mut used_all = false;

    let mut i = 0;
    while i < args.len() {
        let token = args[i];

        if token.eq_ignore_ascii_case("all") {
            let value = take_value(args, i, token)?;
            deltas = [Some(value); 3];
            used_all = true;
            break;
        }

        match AxisId::from_token(token) {
            Some(axis) => {
                deltas[axis.index()] = Some(take_value(args, i, token)?);
                i += 2;
            }
            None => return Err(CommandError::InvalidMoveToken(token_string(token))),
        }
    }

    if deltas.iter().all(Option::is_none) {
        return Err(CommandError::NoMoveAxes);
    }

    Ok(MoveRequest { deltas, used_all })
}

fn take_value(args: &[&str], index: usize, token: &str) -> Result<f32, CommandError> {
    let value = args
        .get(index + 1)
        .ok_or_else(|| CommandError::MissingMoveValue(token_string(token)))?;
    value
        .parse()
        .map_err(|_| CommandError::InvalidValue(token_string(value)))
}
