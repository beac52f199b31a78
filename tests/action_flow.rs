//! Integration tests for action dispatch and the life-state gates:
//! - boundary parsing with aliases; unknown input never reaches dispatch
//! - exploration and training grant XP and mutate the sheet
//! - dead characters can only resurrect, and recovery completes lazily

mod common;

use chrono::{Duration, Utc};
use common::{memory_engine, register, GUILD};
use nilfheim::actions::ActionKind;
use nilfheim::errors::GameError;
use nilfheim::model::character::LifeState;
use nilfheim::model::class::CharacterClass;
use nilfheim::storage::CharacterRepository;

#[test]
fn parsing_is_case_insensitive_with_aliases() {
    assert_eq!("Explore".parse::<ActionKind>().expect("parse"), ActionKind::Explore);
    assert_eq!("FIGHT".parse::<ActionKind>().expect("parse"), ActionKind::Battle);
    assert_eq!("revive".parse::<ActionKind>().expect("parse"), ActionKind::Resurrect);
    assert!("teleport".parse::<ActionKind>().is_err());
}

#[test]
fn explore_and_train_grant_xp() {
    let (engine, _repo) = memory_engine();
    register(&engine, "u", CharacterClass::Mage);

    let explored = engine
        .perform(GUILD, "u", ActionKind::Explore, None)
        .expect("explore");
    assert!(explored.xp_gained > 0);

    let trained = engine
        .perform(GUILD, "u", ActionKind::Train, None)
        .expect("train");
    assert!(trained.xp_gained > 0);

    let c = engine.character("u").expect("sheet");
    assert!(c.xp > 0 || c.level > 1);
    assert_eq!(c.charges, 1);
}

#[test]
fn duels_are_charge_free_and_rate_limited() {
    let (engine, _repo) = memory_engine();
    register(&engine, "a", CharacterClass::Rogue);
    register(&engine, "b", CharacterClass::Knight);

    for _ in 0..3 {
        engine
            .perform(GUILD, "a", ActionKind::Duel, Some("b"))
            .expect("duel");
    }
    // Neither side paid a charge.
    assert_eq!(engine.character("a").expect("sheet").charges, 3);
    assert_eq!(engine.character("b").expect("sheet").charges, 3);

    let err = engine
        .perform(GUILD, "a", ActionKind::Duel, Some("b"))
        .unwrap_err();
    assert!(matches!(err, GameError::ActionNotAllowed(_)));
}

#[test]
fn self_targeting_is_rejected() {
    let (engine, _repo) = memory_engine();
    register(&engine, "a", CharacterClass::Rogue);
    let err = engine
        .perform(GUILD, "a", ActionKind::Duel, Some("a"))
        .unwrap_err();
    assert!(matches!(err, GameError::ActionNotAllowed(_)));
}

#[test]
fn death_gates_everything_but_resurrection() {
    let (engine, repo) = memory_engine();
    register(&engine, "u", CharacterClass::Warrior);
    repo.update("u", &mut |c| {
        c.die(Utc::now());
        Ok(())
    })
    .expect("stage death");

    assert!(matches!(
        engine.perform(GUILD, "u", ActionKind::Explore, None),
        Err(GameError::CharacterDead)
    ));

    let revived = engine
        .perform(GUILD, "u", ActionKind::Resurrect, None)
        .expect("resurrect");
    assert!(revived.success);
    let c = engine.character("u").expect("sheet");
    assert_eq!(c.stats.current_hp, c.stats.max_hp / 2);
    assert!(matches!(c.life, LifeState::Recovering { .. }));

    // Still in the recovery window: actions are blocked with an ETA.
    assert!(matches!(
        engine.perform(GUILD, "u", ActionKind::Explore, None),
        Err(GameError::Recovering { .. })
    ));

    // Recovery completes lazily once the window has elapsed.
    repo.update("u", &mut |c| {
        c.life = LifeState::Recovering {
            until: Utc::now() - Duration::minutes(1),
        };
        Ok(())
    })
    .expect("stage elapsed recovery");
    engine
        .perform(GUILD, "u", ActionKind::Explore, None)
        .expect("recovered");
    assert!(engine.character("u").expect("sheet").is_alive());
}

#[test]
fn missing_partner_is_an_error() {
    let (engine, _repo) = memory_engine();
    register(&engine, "a", CharacterClass::Priest);
    assert!(engine.perform(GUILD, "a", ActionKind::Duel, None).is_err());
    assert!(engine
        .perform(GUILD, "a", ActionKind::Duel, Some("ghost"))
        .is_err());
}
