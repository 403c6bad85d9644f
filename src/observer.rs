//! Fire-and-forget notifications for presentation layers.
//!
//! Audio cues and narration summaries are derived by diffing the state
//! before and after each accepted command. Observers never feed anything
//! back into the engine.

use serde::{Deserialize, Serialize};

use crate::cascade::PlacementReport;
use crate::core::{Color, CommandKind, CureStatus, GameState};
use crate::rules::GameResult;

/// A named moment worth a sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    Outbreak,
    Escalation,
    Cure(Color),
    Eradication(Color),
    EventPlayed,
    Victory,
    Defeat,
}

/// Structured description of one accepted command, for narration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub turn: u32,
    pub command: CommandKind,
    pub phase: String,
    pub placements: Vec<PlacementReport>,
    pub outbreaks: u8,
    pub outcome: Option<GameResult>,
}

/// Receiver of cues and summaries. Both methods default to doing nothing.
pub trait Observer {
    fn cue(&self, _cue: Cue) {}

    fn summarize(&self, _summary: &Summary) {}
}

/// Cues implied by the transition from `before` to `after`.
#[must_use]
pub fn cues(before: &GameState, after: &GameState, kind: CommandKind) -> Vec<Cue> {
    let mut cues = Vec::new();
    if after.outbreaks > before.outbreaks {
        cues.push(Cue::Outbreak);
    }
    if after.escalations_drawn > before.escalations_drawn {
        cues.push(Cue::Escalation);
    }
    for color in Color::ALL {
        let (was, now) = (before.cures[color], after.cures[color]);
        if was == CureStatus::Active && now.is_cured() {
            cues.push(Cue::Cure(color));
        }
        if was != CureStatus::Eradicated && now == CureStatus::Eradicated {
            cues.push(Cue::Eradication(color));
        }
    }
    if kind == CommandKind::PlayEvent {
        cues.push(Cue::EventPlayed);
    }
    if before.outcome.is_none() {
        match &after.outcome {
            Some(GameResult::Victory) => cues.push(Cue::Victory),
            Some(GameResult::Defeat { .. }) => cues.push(Cue::Defeat),
            None => {}
        }
    }
    cues
}

/// Send cues and a summary for one accepted command.
pub fn notify(observer: &dyn Observer, before: &GameState, after: &GameState, kind: CommandKind) {
    for cue in cues(before, after, kind) {
        observer.cue(cue);
    }
    observer.summarize(&Summary {
        turn: after.turn,
        command: kind,
        phase: after.phase.to_string(),
        placements: after.last_report.iter().cloned().collect(),
        outbreaks: after.outbreaks,
        outcome: after.outcome.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{load_board, BoardSource};
    use crate::core::{GameConfig, Variant};

    #[test]
    fn test_cues_from_diff() {
        let board = load_board(BoardSource::Embedded(Variant::Classic)).unwrap();
        let before = GameState::new(&GameConfig::new(Variant::Classic, 2), &board);
        let mut after = before.clone();
        after.outbreaks = 1;
        after.cures[Color::Red] = CureStatus::Eradicated;

        let cues = cues(&before, &after, CommandKind::Proceed);

        assert_eq!(
            cues,
            vec![Cue::Outbreak, Cue::Cure(Color::Red), Cue::Eradication(Color::Red)]
        );
    }
}
