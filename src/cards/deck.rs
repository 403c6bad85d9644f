//! Deck construction, escalation partitioning and intensify.
//!
//! The main deck is built once at setup: location cards plus a random
//! selection of events are shuffled, starting hands are dealt, and the
//! remainder is split into one sub-pile per escalation card. Each sub-pile
//! receives exactly one escalation card at a shuffled position, and the
//! sub-piles are stacked so the first pile is drawn first.

use im::Vector;

use super::{MutationCard, PlayerCard, ThreatCard, VirulentStrain};
use crate::board::Board;
use crate::core::{CommandError, GameConfig, GameRng};

/// Output of main deck construction.
#[derive(Clone, Debug)]
pub struct PlayerDeck {
    /// Starting hands, one per player.
    pub hands: Vec<Vec<PlayerCard>>,
    /// Sub-piles in draw order, before stacking.
    pub piles: Vec<Vec<PlayerCard>>,
    /// The stacked draw pile (top = back).
    pub draw_pile: Vector<PlayerCard>,
}

/// Build the main deck and deal starting hands.
pub fn build_player_deck(board: &Board, config: &GameConfig, rng: &mut GameRng) -> PlayerDeck {
    let mut cards: Vec<PlayerCard> = board
        .locations()
        .iter()
        .map(|loc| PlayerCard::Location {
            location: loc.id,
            color: loc.color,
        })
        .collect();

    let mut events = board.events.clone();
    rng.shuffle(&mut events);
    events.truncate(config.events_to_deal());
    cards.extend(events.into_iter().map(PlayerCard::Event));
    rng.shuffle(&mut cards);

    let hand_size = board.starting_hand_size(config.player_count);
    let mut hands = Vec::with_capacity(config.player_count);
    for _ in 0..config.player_count {
        let split = cards.len().saturating_sub(hand_size);
        hands.push(cards.split_off(split));
    }

    if config.mutation {
        cards.push(PlayerCard::Mutation(MutationCard::MutationSpreads));
        cards.push(PlayerCard::Mutation(MutationCard::MutationThreatens));
        rng.shuffle(&mut cards);
    }

    let escalations = escalation_cards(config, rng);
    let piles = partition_with_escalations(cards, escalations, rng);
    let draw_pile = assemble_draw_pile(&piles);

    PlayerDeck {
        hands,
        piles,
        draw_pile,
    }
}

fn escalation_cards(config: &GameConfig, rng: &mut GameRng) -> Vec<PlayerCard> {
    if !config.virulent_strain {
        return vec![PlayerCard::Escalation; config.escalation_cards];
    }
    let mut strains = VirulentStrain::ALL.to_vec();
    rng.shuffle(&mut strains);
    (0..config.escalation_cards)
        .map(|i| match strains.get(i) {
            Some(&s) => PlayerCard::Virulent(s),
            None => PlayerCard::Escalation,
        })
        .collect()
}

/// Split `cards` into `escalations.len()` nearly equal sub-piles and shuffle
/// one escalation card into each.
///
/// The first `cards.len() % n` piles carry one extra card.
pub fn partition_with_escalations(
    cards: Vec<PlayerCard>,
    escalations: Vec<PlayerCard>,
    rng: &mut GameRng,
) -> Vec<Vec<PlayerCard>> {
    let n = escalations.len();
    if n == 0 {
        return vec![cards];
    }

    let base = cards.len() / n;
    let extra = cards.len() % n;
    let mut rest = cards.into_iter();
    let mut piles = Vec::with_capacity(n);

    for (i, escalation) in escalations.into_iter().enumerate() {
        let size = base + usize::from(i < extra);
        let mut pile: Vec<PlayerCard> = rest.by_ref().take(size).collect();
        pile.push(escalation);
        rng.shuffle(&mut pile);
        piles.push(pile);
    }
    piles
}

/// Stack sub-piles so `piles[0]` is drawn first.
#[must_use]
pub fn assemble_draw_pile(piles: &[Vec<PlayerCard>]) -> Vector<PlayerCard> {
    piles.iter().rev().flatten().cloned().collect()
}

/// Shuffled threat deck with one card per location.
pub fn build_threat_deck(board: &Board, rng: &mut GameRng) -> Vector<ThreatCard> {
    let mut cards: Vec<ThreatCard> = board
        .locations()
        .iter()
        .map(|loc| ThreatCard::Location {
            location: loc.id,
            color: loc.color,
        })
        .collect();
    rng.shuffle(&mut cards);
    cards.into_iter().collect()
}

/// Shuffle `count` mutation wildcards into the remaining threat deck.
pub fn add_wildcards(deck: &mut Vector<ThreatCard>, count: usize, rng: &mut GameRng) {
    let mut cards: Vec<ThreatCard> = deck.iter().copied().collect();
    cards.extend(std::iter::repeat(ThreatCard::Mutation).take(count));
    rng.shuffle(&mut cards);
    *deck = cards.into_iter().collect();
}

/// Reshuffle the discard pile and stack it on top of the draw pile.
pub fn intensify(draw: &mut Vector<ThreatCard>, discard: &mut Vector<ThreatCard>, rng: &mut GameRng) {
    let mut cards: Vec<ThreatCard> = discard.iter().copied().collect();
    rng.shuffle(&mut cards);
    discard.clear();
    draw.extend(cards);
}

/// Rearrange the top `count` cards of a threat deck.
///
/// `order` lists the revealed cards by reveal index (0 = current top), new
/// top first. With `may_bury`, one revealed card may be left out of
/// `order`; it goes to the bottom of the deck.
pub fn rearrange_top(
    deck: &mut Vector<ThreatCard>,
    count: usize,
    order: &[usize],
    may_bury: bool,
) -> Result<(), CommandError> {
    let buried = count.saturating_sub(order.len());
    if buried > usize::from(may_bury) || !is_partial_permutation(order, count) {
        return Err(CommandError::not_allowed(format!(
            "order must list the {count} revealed cards"
        )));
    }

    let revealed: Vec<_> = (0..count).filter_map(|_| deck.pop_back()).collect();
    if revealed.len() != count {
        return Err(CommandError::Internal("threat deck shrank during a preview".to_string()));
    }
    if buried == 1 {
        if let Some(i) = (0..count).find(|i| !order.contains(i)) {
            deck.push_front(revealed[i]);
        }
    }
    for &i in order.iter().rev() {
        deck.push_back(revealed[i]);
    }
    Ok(())
}

/// Check that `order` holds distinct indices below `count`.
#[must_use]
pub fn is_partial_permutation(order: &[usize], count: usize) -> bool {
    order.len() <= count
        && order.iter().all(|&i| i < count)
        && order
            .iter()
            .enumerate()
            .all(|(pos, i)| !order[..pos].contains(i))
}
