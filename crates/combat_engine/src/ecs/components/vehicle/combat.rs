//! Health, damage and timed power-up state of a vehicle
//!
//! Power-ups expire lazily: reads take the current time and report the
//! configured values once the power-up life has passed, and
//! [`CombatState::expire`] (run once per step) resets the stored values.

use crate::foundation::math::Vec3;
use crate::foundation::time::Time;
use crate::physics::DamageOutcome;

/// Seconds a power-up stays active
pub const POWER_UP_DURATION: f64 = 10.0;

/// Gameplay state of one vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct CombatState {
    health: f32,
    max_health: f32,
    configured_resistance: f32,
    configured_base_damage: f32,
    resistance: f32,
    base_damage: f32,
    speed_multiplier: f32,
    defence_multiplier: f32,
    power_up_life: Option<Time>,
    boost_power: f32,
    boost_cooldown: f64,
    boost_direction: Vec3,
    last_boost: Option<Time>,
}

impl CombatState {
    /// Full health with the configured resistance and damage
    pub fn new(health: f32, max_health: f32, resistance: f32, base_damage: f32) -> Self {
        let max_health = max_health.max(0.0);
        Self {
            health: health.clamp(0.0, max_health),
            max_health,
            configured_resistance: resistance,
            configured_base_damage: base_damage,
            resistance,
            base_damage,
            speed_multiplier: 1.0,
            defence_multiplier: 1.0,
            power_up_life: None,
            boost_power: 0.0,
            boost_cooldown: 0.0,
            boost_direction: Vec3::zeros(),
            last_boost: None,
        }
    }

    /// Builder pattern: boost strength and cooldown
    pub fn with_boost(mut self, power: f32, cooldown: f64) -> Self {
        self.boost_power = power;
        self.boost_cooldown = cooldown;
        self
    }

    fn power_up_active(&self, now: Time) -> bool {
        self.power_up_life.map_or(false, |life| now < life)
    }

    /// Reset power-up effects whose life has passed; true if something expired
    pub fn expire(&mut self, now: Time) -> bool {
        match self.power_up_life {
            Some(life) if now >= life => {
                self.power_up_life = None;
                self.resistance = self.configured_resistance;
                self.base_damage = self.configured_base_damage;
                self.speed_multiplier = 1.0;
                self.defence_multiplier = 1.0;
                true
            }
            _ => false,
        }
    }

    fn stamp_power_up(&mut self, now: Time) {
        self.power_up_life = Some(now + POWER_UP_DURATION);
    }

    /// Current health
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Health ceiling
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Overwrite health, clamped to [0, max]
    pub fn set_health(&mut self, health: f32) {
        if health.is_finite() {
            self.health = health.clamp(0.0, self.max_health);
        }
    }

    /// Whether health reached zero
    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// Fraction of incoming damage taken, including an active defence power-up
    pub fn resistance(&self, now: Time) -> f32 {
        if self.power_up_active(now) {
            self.resistance * self.defence_multiplier
        } else {
            self.configured_resistance
        }
    }

    /// Damage dealt on contact
    pub fn base_damage(&self, now: Time) -> f32 {
        if self.power_up_active(now) {
            self.base_damage
        } else {
            self.configured_base_damage
        }
    }

    /// Engine force scale
    pub fn speed_multiplier(&self, now: Time) -> f32 {
        if self.power_up_active(now) {
            self.speed_multiplier
        } else {
            1.0
        }
    }

    /// Incoming damage scale
    pub fn defence_multiplier(&self, now: Time) -> f32 {
        if self.power_up_active(now) {
            self.defence_multiplier
        } else {
            1.0
        }
    }

    /// When the active power-up runs out
    pub fn power_up_life(&self) -> Option<Time> {
        self.power_up_life
    }

    /// Apply `damage` scaled by the current resistance
    pub fn take_damage(&mut self, damage: f32, now: Time) -> DamageOutcome {
        if !(damage > 0.0) || self.is_destroyed() {
            log::trace!("Ignoring damage {} at health {}", damage, self.health);
            return DamageOutcome::default();
        }
        let applied = (damage * self.resistance(now)).min(self.health).max(0.0);
        self.health -= applied;
        let destroyed = self.health <= 0.0;
        if destroyed {
            self.health = 0.0;
        }
        DamageOutcome { applied, destroyed }
    }

    /// Heal, clamped to the maximum
    pub fn add_health(&mut self, amount: f32) {
        if !(amount > 0.0) {
            return;
        }
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Override resistance for the power-up duration
    pub fn set_resistance(&mut self, value: f32, now: Time) {
        self.expire(now);
        self.resistance = value;
        self.stamp_power_up(now);
    }

    /// Override contact damage for the power-up duration
    pub fn set_base_damage(&mut self, value: f32, now: Time) {
        self.expire(now);
        self.base_damage = value;
        self.stamp_power_up(now);
    }

    /// Scale engine force for the power-up duration
    pub fn apply_speed_multiplier(&mut self, value: f32, now: Time) {
        self.expire(now);
        self.speed_multiplier = value;
        self.stamp_power_up(now);
    }

    /// Scale incoming damage for the power-up duration
    pub fn apply_defence_multiplier(&mut self, value: f32, now: Time) {
        self.expire(now);
        self.defence_multiplier = value;
        self.stamp_power_up(now);
    }

    /// Velocity change of a boost
    pub fn boost_power(&self) -> f32 {
        self.boost_power
    }

    /// Seconds between boosts
    pub fn boost_cooldown(&self) -> f64 {
        self.boost_cooldown
    }

    /// Direction of the last boost
    pub fn boost_direction(&self) -> Vec3 {
        self.boost_direction
    }

    /// Time of the last boost
    pub fn last_boost(&self) -> Option<Time> {
        self.last_boost
    }

    /// Seconds since the last boost, `None` if never boosted
    pub fn time_since_boost(&self, now: Time) -> Option<f64> {
        self.last_boost.map(|last| now.since(last))
    }

    /// Whether the cooldown allows a boost now
    pub fn can_boost(&self, now: Time) -> bool {
        self.time_since_boost(now).map_or(true, |elapsed| elapsed >= self.boost_cooldown)
    }

    /// Record a boost fired at `now`
    pub fn record_boost(&mut self, direction: Vec3, now: Time) {
        self.boost_direction = direction;
        self.last_boost = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn at(seconds: f64) -> Time {
        Time::from_seconds(seconds)
    }

    #[test]
    fn test_damage_is_scaled_by_resistance() {
        let mut state = CombatState::new(1000.0, 1000.0, 0.5, 1.0);

        let outcome = state.take_damage(200.0, at(0.0));

        assert_relative_eq!(state.health(), 900.0);
        assert_eq!(outcome, DamageOutcome { applied: 100.0, destroyed: false });
    }

    #[test]
    fn test_health_never_goes_negative() {
        let mut state = CombatState::new(50.0, 100.0, 1.0, 1.0);

        let outcome = state.take_damage(80.0, at(0.0));
        assert_eq!(state.health(), 0.0);
        assert!(outcome.destroyed);
        assert_relative_eq!(outcome.applied, 50.0);

        let again = state.take_damage(10.0, at(1.0));
        assert_eq!(again, DamageOutcome::default());
        assert_eq!(state.health(), 0.0);
    }

    #[test]
    fn test_healing_is_clamped() {
        let mut state = CombatState::new(900.0, 1000.0, 0.5, 1.0);
        state.add_health(250.0);
        assert_eq!(state.health(), 1000.0);

        state.add_health(-100.0);
        assert_eq!(state.health(), 1000.0);
    }

    #[test]
    fn test_power_up_expires_lazily() {
        let mut state = CombatState::new(1000.0, 1000.0, 0.5, 1.0);
        state.apply_defence_multiplier(0.5, at(2.0));
        state.set_base_damage(4.0, at(3.0));
        state.apply_speed_multiplier(1.5, at(3.0));

        assert_relative_eq!(state.resistance(at(5.0)), 0.25);
        assert_relative_eq!(state.base_damage(at(5.0)), 4.0);
        assert_relative_eq!(state.speed_multiplier(at(12.9)), 1.5);

        // reads past the life already see configured values
        assert_relative_eq!(state.resistance(at(13.0)), 0.5);
        assert_relative_eq!(state.speed_multiplier(at(13.0)), 1.0);
        assert_eq!(state.power_up_life(), Some(at(13.0)));

        assert!(state.expire(at(13.0)));
        assert_eq!(state.power_up_life(), None);
        assert!(!state.expire(at(14.0)));
        assert_relative_eq!(state.base_damage(at(14.0)), 1.0);
    }

    #[test]
    fn test_boost_cooldown() {
        let mut state = CombatState::new(1000.0, 1000.0, 0.5, 1.0).with_boost(8.0, 3.0);
        assert!(state.can_boost(at(0.0)));
        assert_eq!(state.time_since_boost(at(0.0)), None);

        state.record_boost(Vec3::z(), at(1.0));

        assert!(!state.can_boost(at(3.5)));
        assert!(state.can_boost(at(4.0)));
        assert_relative_eq!(state.time_since_boost(at(4.0)).unwrap(), 3.0);
    }
}
