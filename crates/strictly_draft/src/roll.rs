//! Initial turn resolver: decides who picks first.

use crate::{CoreError, PlayerId};
use derive_getters::Getters;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Faces on the default die.
pub const DEFAULT_DIE_FACES: u8 = 6;

/// Recorded outcome of the first-turn roll. Stored once per draft attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct InitialRoll {
    /// Final roll of player 1.
    player1_roll: u8,
    /// Final roll of player 2.
    player2_roll: u8,
    /// Player who picks first.
    winner: PlayerId,
    /// Number of tied rounds that were thrown away.
    #[serde(default)]
    rerolls: u32,
}

/// Resolves the first player with fair dice, re-rolling both dice on a tie.
///
/// # Errors
///
/// Returns [`CoreError::InvalidRules`] if the die has fewer than two faces,
/// since such a die can never break a tie.
#[instrument(skip(rng))]
pub fn resolve_first_player<R: Rng + ?Sized>(
    player1: &PlayerId,
    player2: &PlayerId,
    faces: u8,
    rng: &mut R,
) -> Result<InitialRoll, CoreError> {
    if faces < 2 {
        return Err(CoreError::InvalidRules(format!(
            "a {}-faced die cannot break ties",
            faces
        )));
    }
    let throws = std::iter::repeat_with(|| (rng.gen_range(1..=faces), rng.gen_range(1..=faces)));
    let roll = resolve_from_throws(player1, player2, throws)
        .ok_or_else(|| CoreError::InvalidRules("dice stream ended on a tie".to_string()))?;
    info!(
        winner = %roll.winner,
        player1_roll = roll.player1_roll,
        player2_roll = roll.player2_roll,
        rerolls = roll.rerolls,
        "First turn resolved"
    );
    Ok(roll)
}

/// Resolves the first player from an explicit stream of paired throws.
///
/// Ties are discarded. Returns `None` if the stream runs out while tied.
pub fn resolve_from_throws(
    player1: &PlayerId,
    player2: &PlayerId,
    throws: impl IntoIterator<Item = (u8, u8)>,
) -> Option<InitialRoll> {
    let mut rerolls = 0;
    for (player1_roll, player2_roll) in throws {
        if player1_roll == player2_roll {
            debug!(roll = player1_roll, "Tie, rolling again");
            rerolls += 1;
            continue;
        }
        let winner = if player1_roll > player2_roll {
            player1.clone()
        } else {
            player2.clone()
        };
        return Some(InitialRoll {
            player1_roll,
            player2_roll,
            winner,
            rerolls,
        });
    }
    None
}
