//! End-to-end super boss arc: three normal defeats queue a super, its
//! defeat pays catalysts, counts the kill, and crowns the top dealer with
//! the Song of Nilfheim.

mod common;

use common::{memory_engine, register, GUILD};
use nilfheim::aura::AuraType;
use nilfheim::model::boss::BossKind;
use nilfheim::model::class::CharacterClass;
use nilfheim::model::outcome::ItemDrop;
use nilfheim::storage::CharacterRepository;

#[test]
fn super_arc_crowns_the_top_dealer() {
    let (engine, repo) = memory_engine();
    register(&engine, "u", CharacterClass::Warrior);
    // High enough to one-shot a tier-1 super: damage floors at
    // 100 + level*50, well past 50,000 HP at level 2000.
    repo.update("u", &mut |c| {
        c.level = 2000;
        Ok(())
    })
    .expect("stage level");

    for round in 0..3 {
        let boss = engine.spawn_boss(GUILD).expect("spawn normal");
        assert_eq!(boss.kind, BossKind::Normal, "round {}", round);
        let report = engine.attack_boss(GUILD, "u").expect("attack");
        assert!(report.defeated, "round {}", round);
        repo.update("u", &mut |c| {
            c.charges = 3;
            Ok(())
        })
        .expect("refill charges");
    }

    let boss = engine.spawn_boss(GUILD).expect("spawn super");
    assert_eq!(boss.kind, BossKind::Super);
    assert!(boss.max_hp >= 50_000);

    let report = engine.attack_boss(GUILD, "u").expect("attack super");
    assert!(report.defeated);
    let reward = &report.rewards[0];
    assert!(reward.top_dealer);
    assert!(
        reward
            .drops
            .iter()
            .any(|d| matches!(d, ItemDrop::Catalyst(_))),
        "super contributors always receive a catalyst"
    );

    let c = engine.character("u").expect("sheet");
    assert_eq!(c.normal_boss_kills, 3);
    assert_eq!(c.super_boss_kills, 1);

    let auras = engine.aura_board().expect("aura board");
    assert!(auras.has(GUILD, "u", AuraType::SongOfNilfheim));
}
