//! Fixed-step scenario runner.
//!
//! Each step at time `t` first performs every action due at or before `t`
//! (in timeline order), then ticks every combatant once at `t`.

use std::fmt;

use aegis_common::{time, EntityId, EntityIdAllocator, Millis, SchemaVersion};
use aegis_effects::{
    Combatant, EffectCommand, EffectEvent, EffectKind, EffectSnapshot, TickReport,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::scenario::{ActionOp, ActionSpec, Scenario, SimSettings};

/// Running totals for one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityTotals {
    /// Damage taken from damage-over-time ticks
    pub dot_damage: f32,
    /// Damage taken from hits, after shields and vulnerability
    pub hit_damage: f32,
    /// Health restored
    pub healed: f32,
    /// Damage and heal ticks fired
    pub ticks: u32,
    /// Effects that ran out
    pub expired: usize,
    /// Mailbox commands delivered
    pub commands: usize,
    /// Time of death
    pub died_at: Option<Millis>,
}

impl EntityTotals {
    fn record_tick(&mut self, report: &TickReport, now: Millis) {
        self.dot_damage += report.damage_taken;
        self.healed += report.healed;
        self.ticks += report.update.ticks;
        self.expired += report.update.expired.len();
        self.commands += report.commands;
        if report.died {
            self.died_at.get_or_insert(now);
        }
    }
}

/// Final state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityReport {
    /// Scenario name
    pub name: String,
    /// Runtime identifier
    pub id: EntityId,
    /// Health at the end of the run
    pub health: f32,
    /// Maximum health
    pub max_health: f32,
    /// Whether the entity survived
    pub alive: bool,
    /// Movement speed at the end of the run
    pub move_speed: f32,
    /// Accumulated totals
    pub totals: EntityTotals,
    /// Effects still active at the end of the run
    pub effects: EffectSnapshot,
}

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimReport {
    /// Layout version of this report
    pub format: SchemaVersion,
    /// Last simulated timestamp
    pub end_ms: Millis,
    /// Steps executed
    pub steps: u64,
    /// One entry per entity, in scenario order
    pub entities: Vec<EntityReport>,
}

impl SimReport {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Report for the entity called `name`.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityReport> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Effects still running on `name`.
    #[must_use]
    pub fn active_kinds(&self, name: &str) -> Vec<EffectKind> {
        self.entity(name)
            .map(|e| e.effects.effects.iter().map(|a| a.kind).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Simulated {:.1} s in {} steps",
            time::as_secs_f32(self.end_ms),
            self.steps
        )?;
        for entity in &self.entities {
            let status = match entity.totals.died_at {
                Some(at) => format!("died at {:.1} s", time::as_secs_f32(at)),
                None => "alive".to_string(),
            };
            let effects: Vec<String> = entity
                .effects
                .effects
                .iter()
                .map(|e| format!("{} x{}", e.kind, e.stacks))
                .collect();
            writeln!(
                f,
                "{:<12} {:>7.1}/{:<7.1} {:<16} dot {:>6.1}  hit {:>6.1}  healed {:>6.1}  [{}]",
                entity.name,
                entity.health,
                entity.max_health,
                status,
                entity.totals.dot_damage,
                entity.totals.hit_damage,
                entity.totals.healed,
                effects.join(", ")
            )?;
        }
        Ok(())
    }
}

/// A scenario in progress.
#[derive(Debug)]
pub struct Simulation {
    settings: SimSettings,
    names: Vec<String>,
    combatants: Vec<Combatant>,
    totals: Vec<EntityTotals>,
    actions: Vec<ActionSpec>,
    next_action: usize,
    now: Millis,
    steps: u64,
    exhausted: bool,
}

impl Simulation {
    /// Spawns every entity of `scenario` at full health.
    #[must_use]
    pub fn new(scenario: &Scenario) -> Self {
        let mut ids = EntityIdAllocator::new();
        let combatants: Vec<Combatant> = scenario
            .entities
            .iter()
            .map(|entity| Combatant::new(ids.allocate(), entity.stats()))
            .collect();

        let mut actions = scenario.actions.clone();
        actions.sort_by_key(|a| a.at);

        Self {
            settings: scenario.settings.clone(),
            names: scenario.entities.iter().map(|e| e.name.clone()).collect(),
            totals: vec![EntityTotals::default(); combatants.len()],
            combatants,
            actions,
            next_action: 0,
            now: 0,
            steps: 0,
            exhausted: false,
        }
    }

    /// Time of the next step.
    #[must_use]
    pub const fn now(&self) -> Millis {
        self.now
    }

    /// Whether every step up to `end_ms` has run.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.exhausted || self.now > self.settings.end_ms
    }

    /// The combatant called `name`.
    #[must_use]
    pub fn combatant(&self, name: &str) -> Option<&Combatant> {
        self.index_of(name).map(|i| &self.combatants[i])
    }

    /// Runs one step and returns the time it ran at.
    pub fn step(&mut self) -> Millis {
        let now = self.now;

        while let Some(action) = self
            .actions
            .get(self.next_action)
            .filter(|a| a.at <= now)
            .cloned()
        {
            self.next_action += 1;
            self.perform(&action, now);
        }

        for (i, combatant) in self.combatants.iter_mut().enumerate() {
            let report = combatant.tick(now);
            self.totals[i].record_tick(&report, now);
            for event in &report.events {
                log_event(&self.names[i], event, now);
            }
            if report.died {
                info!("[{}ms] {} died", now, self.names[i]);
            }
        }

        self.steps += 1;
        match now.checked_add(self.settings.step_ms) {
            Some(next) => self.now = next,
            None => self.exhausted = true,
        }
        now
    }

    /// Runs to `end_ms` and reports the final state.
    #[must_use]
    pub fn run(mut self) -> SimReport {
        info!(
            "Running {} entities for {} ms (step {} ms)",
            self.combatants.len(),
            self.settings.end_ms,
            self.settings.step_ms
        );
        while !self.is_finished() {
            self.step();
        }
        self.report()
    }

    /// Current state of every entity.
    #[must_use]
    pub fn report(&self) -> SimReport {
        let taken_at = if self.exhausted {
            self.now
        } else {
            self.now.saturating_sub(self.settings.step_ms)
        };
        let entities = self
            .combatants
            .iter()
            .zip(&self.names)
            .zip(&self.totals)
            .map(|((c, name), totals)| EntityReport {
                name: name.clone(),
                id: c.id(),
                health: c.health(),
                max_health: c.stats().max_health,
                alive: !c.is_dead(),
                move_speed: c.move_speed(),
                totals: totals.clone(),
                effects: c.effects().snapshot(taken_at),
            })
            .collect();

        SimReport {
            format: SchemaVersion::SIM_REPORT,
            end_ms: self.settings.end_ms,
            steps: self.steps,
            entities,
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn perform(&mut self, action: &ActionSpec, now: Millis) {
        let Some(target) = self.index_of(&action.entity) else {
            warn!("Skipping action on unknown entity {:?}", action.entity);
            return;
        };
        let source = action.source.as_deref().and_then(|name| self.index_of(name));
        let source_id = source.map(|i| self.combatants[i].id());

        match (action.op, action.kind) {
            (ActionOp::Apply, Some(kind)) => match source_id {
                Some(source_id) => self.post(
                    target,
                    EffectCommand::Apply {
                        kind,
                        source: Some(source_id),
                    },
                ),
                None => {
                    self.combatants[target].apply_effect(kind, None, now);
                },
            },
            (ActionOp::Remove, Some(kind)) => {
                if source_id.is_some() {
                    self.post(target, EffectCommand::Remove { kind });
                } else {
                    self.combatants[target].effects_mut().remove(kind);
                }
            },
            (ActionOp::Clear, _) => {
                if source_id.is_some() {
                    self.post(target, EffectCommand::ClearAll);
                } else {
                    let cleared = self.combatants[target].effects_mut().clear_all();
                    debug!("[{}ms] cleared {} effects on {}", now, cleared, action.entity);
                }
            },
            (ActionOp::Cleanse, _) => {
                if source_id.is_some() {
                    self.post(target, EffectCommand::Cleanse);
                } else {
                    let cleansed = self.combatants[target].effects_mut().cleanse();
                    debug!("[{}ms] cleansed {} effects on {}", now, cleansed, action.entity);
                }
            },
            (ActionOp::Hit, _) => {
                let base = action.amount.unwrap_or(0.0);
                let amount = source.map_or(base, |i| self.combatants[i].outgoing_damage(base));
                let dealt = self.combatants[target].take_hit(amount);
                self.totals[target].hit_damage += dealt;
                info!(
                    "[{}ms] {} hit for {:.1} ({:.1} after shields)",
                    now, action.entity, amount, dealt
                );
                if self.combatants[target].is_dead() && self.totals[target].died_at.is_none() {
                    self.totals[target].died_at = Some(now);
                    info!("[{}ms] {} died", now, action.entity);
                }
            },
            (op, None) => {
                warn!("Skipping {:?} on {} without an effect kind", op, action.entity);
            },
        }

        for event in self.combatants[target].drain_events() {
            log_event(&action.entity, &event, now);
        }
    }

    fn post(&self, target: usize, command: EffectCommand) {
        if let Err(e) = self.combatants[target].mailbox().send(command) {
            warn!("Dropped {:?} for {}: {}", command, self.names[target], e);
        }
    }
}

fn log_event(name: &str, event: &EffectEvent, now: Millis) {
    match event {
        EffectEvent::DamageTick { kind, amount, .. } => {
            debug!("[{}ms] {} takes {:.1} from {}", now, name, amount, kind);
        },
        EffectEvent::HealTick { kind, amount, .. } => {
            debug!("[{}ms] {} heals {:.1} from {}", now, name, amount, kind);
        },
        EffectEvent::StatusAdded { kind, source, .. } => match source {
            Some(source) => info!("[{}ms] {} gains {} from {}", now, name, kind, source),
            None => info!("[{}ms] {} gains {}", now, name, kind),
        },
        EffectEvent::StatusRemoved { kind, reason, .. } => {
            info!("[{}ms] {} loses {} ({:?})", now, name, kind, reason);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(body: &str) -> SimReport {
        let text = format!("format = \"1.0\"\n{body}");
        let scenario = Scenario::from_toml_str(&text).expect("valid scenario");
        Simulation::new(&scenario).run()
    }

    #[test]
    fn test_poison_runs_its_course() {
        let report = run(r#"
[settings]
step_ms = 500
end_ms = 5000

[[entities]]
name = "knight"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "poison"
"#);

        assert_eq!(report.steps, 11);
        let knight = report.entity("knight").expect("knight");
        assert_eq!(knight.health, 73.0);
        assert_eq!(knight.totals.dot_damage, 27.0);
        assert_eq!(knight.totals.ticks, 9);
        assert_eq!(knight.totals.expired, 1);
        assert!(knight.alive);
        assert!(report.active_kinds("knight").is_empty());
    }

    #[test]
    fn test_sourced_apply_goes_through_mailbox() {
        let report = run(r#"
[settings]
end_ms = 0

[[entities]]
name = "knight"

[[entities]]
name = "witch"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "bleed"
source = "witch"
"#);

        let knight = report.entity("knight").expect("knight");
        let witch_id = report.entity("witch").expect("witch").id;
        assert_eq!(knight.totals.commands, 1);
        assert_eq!(knight.effects.effects.len(), 1);
        assert_eq!(knight.effects.effects[0].kind, EffectKind::Bleed);
        assert_eq!(knight.effects.effects[0].source, Some(witch_id));
    }

    #[test]
    fn test_hit_scaled_by_attacker() {
        let report = run(r#"
[settings]
end_ms = 0

[[entities]]
name = "knight"

[[entities]]
name = "witch"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "damage_boost"

[[actions]]
at = 0
entity = "witch"
op = "hit"
amount = 20
source = "knight"
"#);

        let witch = report.entity("witch").expect("witch");
        assert_eq!(witch.totals.hit_damage, 25.0);
        assert_eq!(witch.health, 75.0);
    }

    #[test]
    fn test_shield_absorbs_hits() {
        let report = run(r#"
[settings]
end_ms = 0

[[entities]]
name = "knight"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "shield"

[[actions]]
at = 0
entity = "knight"
op = "hit"
amount = 30

[[actions]]
at = 0
entity = "knight"
op = "hit"
amount = 25
"#);

        let knight = report.entity("knight").expect("knight");
        assert_eq!(knight.health, 95.0);
        assert_eq!(knight.totals.hit_damage, 5.0);
        assert!(!report.active_kinds("knight").contains(&EffectKind::Shield));
    }

    #[test]
    fn test_lethal_hit_records_death() {
        let report = run(r#"
[settings]
step_ms = 100
end_ms = 300

[[entities]]
name = "squire"
health = 10

[[actions]]
at = 200
entity = "squire"
op = "hit"
amount = 15
"#);

        let squire = report.entity("squire").expect("squire");
        assert!(!squire.alive);
        assert_eq!(squire.health, 0.0);
        assert_eq!(squire.totals.died_at, Some(200));
        assert!(report.to_string().contains("died at 0.2 s"));
    }

    #[test]
    fn test_cleanse_keeps_buffs() {
        let report = run(r#"
[settings]
end_ms = 100

[[entities]]
name = "knight"

[[entities]]
name = "cleric"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "poison"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "stun"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "haste"

[[actions]]
at = 100
entity = "knight"
op = "cleanse"
source = "cleric"
"#);

        assert_eq!(report.active_kinds("knight"), vec![EffectKind::Haste]);
        assert_eq!(report.entity("knight").expect("knight").totals.commands, 1);
    }

    #[test]
    fn test_actions_run_in_time_order() {
        let report = run(r#"
[settings]
end_ms = 0

[[entities]]
name = "knight"

[[actions]]
at = 500
entity = "knight"
op = "hit"
amount = 50

[[actions]]
at = 0
entity = "knight"
op = "hit"
amount = 10
"#);

        assert_eq!(report.entity("knight").expect("knight").health, 90.0);
    }

    #[test]
    fn test_clear_and_remove() {
        let report = run(r#"
[settings]
end_ms = 100

[[entities]]
name = "knight"

[[entities]]
name = "cleric"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "slow"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "weakness"

[[actions]]
at = 0
entity = "knight"
op = "apply"
kind = "haste"

[[actions]]
at = 100
entity = "knight"
op = "remove"
kind = "haste"

[[actions]]
at = 100
entity = "knight"
op = "clear"
source = "cleric"
"#);

        let knight = report.entity("knight").expect("knight");
        assert!(knight.effects.effects.is_empty());
        assert_eq!(knight.move_speed, 1.0);
        assert_eq!(knight.totals.commands, 1);
    }

    #[test]
    fn test_report_json() {
        let report = run(r#"
[settings]
end_ms = 0

[[entities]]
name = "knight"
"#);

        let value: serde_json::Value =
            serde_json::from_str(&report.to_json().expect("serialize report")).expect("json");
        assert_eq!(value["format"], SchemaVersion::SIM_REPORT.to_string());
        assert_eq!(value["entities"][0]["name"], "knight");
        assert_eq!(value["entities"][0]["alive"], true);

        let text = report.to_string();
        assert!(text.starts_with("Simulated 0.0 s in 1 steps"));
        assert!(text.contains("knight"));
        assert!(text.contains("alive"));
    }
}
