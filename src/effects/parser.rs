//! Effect text interpreter.
//!
//! Turns designer text such as "Deal 2 damage to all enemies. Draw a card."
//! into [`EffectAction`]s. Low confidence by nature: each sentence is matched
//! against a handful of verb patterns and anything unrecognised is dropped
//! with a warning. An empty result is a valid no-op.
//!
//! Recognised forms (case-insensitive, one per sentence):
//!
//! - `deal N damage to <scope>`
//! - `heal <scope> for N`, `heal N`, `restore N health to <scope>`
//! - `draw N cards`, `draw a card`
//! - `gain N mana`, `gain N health`
//! - `give <scope> +A/+H [until end of turn]`
//! - `give|grant <scope> <keyword>`
//! - `destroy <scope>`

use tracing::warn;

use super::action::{EffectAction, TargetScope};
use super::persistent::{EffectDuration, StatModifiers};
use crate::cards::Keyword;

/// Scope phrases, longest first within each group so prefixes do not shadow.
const SCOPE_PHRASES: &[(&str, TargetScope)] = &[
    ("all enemy units", TargetScope::AllEnemies),
    ("all enemies", TargetScope::AllEnemies),
    ("all allied units", TargetScope::AllAllies),
    ("all friendly units", TargetScope::AllAllies),
    ("all allies", TargetScope::AllAllies),
    ("your units", TargetScope::AllAllies),
    ("all units", TargetScope::AllUnits),
    ("a random enemy unit", TargetScope::RandomEnemy),
    ("a random enemy", TargetScope::RandomEnemy),
    ("the enemy nexus", TargetScope::EnemyNexus),
    ("enemy nexus", TargetScope::EnemyNexus),
    ("the opponent", TargetScope::EnemyNexus),
    ("your opponent", TargetScope::EnemyNexus),
    ("your nexus", TargetScope::OwnNexus),
    ("you", TargetScope::OwnNexus),
    ("this unit", TargetScope::Source),
    ("itself", TargetScope::Source),
    ("target unit", TargetScope::Chosen),
    ("target enemy", TargetScope::Chosen),
    ("a unit", TargetScope::Chosen),
    ("target", TargetScope::Chosen),
];

/// Interpret effect text. Unrecognised sentences are skipped.
#[must_use]
pub fn parse_effect_text(text: &str) -> Vec<EffectAction> {
    text.split(['.', ';', '\n'])
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .filter_map(|clause| {
            let action = parse_clause(clause);
            if action.is_none() {
                warn!(clause, "unrecognised effect text, skipping");
            }
            action
        })
        .collect()
}

fn parse_clause(clause: &str) -> Option<EffectAction> {
    let lower = clause.to_ascii_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    let (&verb, rest) = words.split_first()?;

    match verb {
        "deal" => parse_damage(rest),
        "heal" | "restore" => parse_heal(rest),
        "draw" => parse_draw(rest),
        "gain" => parse_gain(rest),
        "give" | "grant" => parse_give(rest),
        "destroy" | "kill" => {
            let (scope, tail) = parse_scope(rest)?;
            tail.is_empty().then_some(EffectAction::Destroy { scope })
        }
        _ => None,
    }
}

// deal N damage to <scope>
fn parse_damage(words: &[&str]) -> Option<EffectAction> {
    let amount = number(words.first()?)?;
    if words.get(1) != Some(&"damage") {
        return None;
    }
    let rest = strip_word(&words[2..], "to");
    let (scope, tail) = parse_scope(rest)?;
    tail.is_empty().then_some(EffectAction::damage(amount, scope))
}

fn parse_heal(words: &[&str]) -> Option<EffectAction> {
    let amount = words.iter().find_map(|w| number(w))?;
    let scope_words: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| number(w).is_none() && !matches!(*w, "health" | "for" | "to"))
        .collect();

    let scope = if scope_words.is_empty() {
        TargetScope::OwnNexus
    } else {
        let (scope, tail) = parse_scope(&scope_words)?;
        if !tail.is_empty() {
            return None;
        }
        scope
    };
    Some(EffectAction::heal(amount, scope))
}

fn parse_draw(words: &[&str]) -> Option<EffectAction> {
    let count = number(words.first()?)?;
    match words.get(1) {
        Some(&"card") | Some(&"cards") if words.len() == 2 => Some(EffectAction::draw(count.max(0) as u32)),
        _ => None,
    }
}

fn parse_gain(words: &[&str]) -> Option<EffectAction> {
    let amount = number(words.first()?)?;
    match words.get(1..) {
        Some(["mana"]) => Some(EffectAction::GainMana { amount }),
        Some(["health"]) | Some(["life"]) => Some(EffectAction::heal(amount, TargetScope::OwnNexus)),
        _ => None,
    }
}

fn parse_give(words: &[&str]) -> Option<EffectAction> {
    let (words, duration) = match words {
        [head @ .., "until", "end", "of", "turn"] => (head, EffectDuration::EndOfTurn),
        [head @ .., "this", "turn"] => (head, EffectDuration::EndOfTurn),
        _ => (words, EffectDuration::Permanent),
    };

    // give <scope> +A/+H
    if let Some((&last, scope_words)) = words.split_last() {
        if let Some(modifiers) = stat_token(last) {
            let (scope, tail) = parse_scope(scope_words)?;
            return tail.is_empty().then_some(EffectAction::ModifyStats { modifiers, scope, duration });
        }
    }

    // give <scope> <keyword>
    let (scope, tail) = parse_scope(words)?;
    let keyword = Keyword::from_name(&tail.join("_"))?;
    Some(EffectAction::grant(keyword, scope))
}

/// Match the longest known scope phrase at the front of `words`.
fn parse_scope<'a, 'b>(words: &'a [&'b str]) -> Option<(TargetScope, &'a [&'b str])> {
    SCOPE_PHRASES
        .iter()
        .filter_map(|&(phrase, scope)| {
            let phrase: Vec<&str> = phrase.split(' ').collect();
            words.starts_with(&phrase).then_some((scope, phrase.len()))
        })
        .max_by_key(|&(_, len)| len)
        .map(|(scope, len)| (scope, &words[len..]))
}

fn strip_word<'a, 'b>(words: &'a [&'b str], word: &str) -> &'a [&'b str] {
    match words.split_first() {
        Some((&first, rest)) if first == word => rest,
        _ => words,
    }
}

fn number(word: &str) -> Option<i32> {
    match word {
        "a" | "an" | "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        _ => word.parse().ok(),
    }
}

/// `+2/+1`, `-1/+0`, `+3/3`.
fn stat_token(word: &str) -> Option<StatModifiers> {
    let (attack, health) = word.split_once('/')?;
    if !attack.starts_with(['+', '-']) {
        return None;
    }
    let attack: i32 = attack.trim_start_matches('+').parse().ok()?;
    let health: i32 = health.trim_start_matches('+').parse().ok()?;
    Some(StatModifiers::new(attack, health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage() {
        assert_eq!(
            parse_effect_text("Deal 2 damage to all enemies"),
            vec![EffectAction::damage(2, TargetScope::AllEnemies)]
        );
        assert_eq!(
            parse_effect_text("Deal 3 damage to the enemy nexus."),
            vec![EffectAction::damage_enemy_nexus(3)]
        );
        assert_eq!(
            parse_effect_text("deal 1 damage to a random enemy"),
            vec![EffectAction::damage(1, TargetScope::RandomEnemy)]
        );
    }

    #[test]
    fn test_heal_forms() {
        assert_eq!(
            parse_effect_text("Heal all allies for 2"),
            vec![EffectAction::heal(2, TargetScope::AllAllies)]
        );
        assert_eq!(
            parse_effect_text("Restore 4 health to your nexus"),
            vec![EffectAction::heal(4, TargetScope::OwnNexus)]
        );
        assert_eq!(parse_effect_text("Heal 3"), vec![EffectAction::heal(3, TargetScope::OwnNexus)]);
        assert_eq!(parse_effect_text("Gain 2 health"), vec![EffectAction::heal(2, TargetScope::OwnNexus)]);
    }

    #[test]
    fn test_draw_and_mana() {
        assert_eq!(parse_effect_text("Draw a card"), vec![EffectAction::draw(1)]);
        assert_eq!(parse_effect_text("Draw 2 cards"), vec![EffectAction::draw(2)]);
        assert_eq!(parse_effect_text("Gain 1 mana"), vec![EffectAction::GainMana { amount: 1 }]);
    }

    #[test]
    fn test_buffs() {
        assert_eq!(
            parse_effect_text("Give all allies +1/+1"),
            vec![EffectAction::buff(1, 1, TargetScope::AllAllies, EffectDuration::Permanent)]
        );
        assert_eq!(
            parse_effect_text("Give target unit +3/+0 until end of turn"),
            vec![EffectAction::buff(3, 0, TargetScope::Chosen, EffectDuration::EndOfTurn)]
        );
    }

    #[test]
    fn test_keyword_grant() {
        assert_eq!(
            parse_effect_text("Grant this unit divine shield"),
            vec![EffectAction::grant(Keyword::DivineShield, TargetScope::Source)]
        );
        assert_eq!(
            parse_effect_text("Give all allies taunt"),
            vec![EffectAction::grant(Keyword::Taunt, TargetScope::AllAllies)]
        );
    }

    #[test]
    fn test_multiple_sentences() {
        assert_eq!(
            parse_effect_text("Deal 1 damage to all units. Draw a card."),
            vec![EffectAction::damage(1, TargetScope::AllUnits), EffectAction::draw(1)]
        );
    }

    #[test]
    fn test_unrecognised_is_skipped() {
        assert!(parse_effect_text("Shuffle the stars into your soul").is_empty());
        assert!(parse_effect_text("Deal lots of damage").is_empty());
        assert!(parse_effect_text("Give all allies wings").is_empty());
        assert_eq!(
            parse_effect_text("Whisper to the moon. Destroy target unit"),
            vec![EffectAction::Destroy { scope: TargetScope::Chosen }]
        );
    }
}
