use super::*;
use crate::collision;
use crate::constants::AGENT_HEIGHT;
use crate::control::{apply_action, decode_action, observe, Observation};
use crate::fitness::{shape, Transition};

/// One agent's body plus its landing history, stepped one tick at a time.
#[derive(Clone, Debug)]
pub struct AgentSim {
    body: AgentBody,
    ledger: PadLedger,
    ticks: u32,
    terminal: Option<Terminal>,
}

impl AgentSim {
    /// Fresh agent standing on the level's start platform.
    pub fn spawn(level: &Level) -> Self {
        let (x, y) = level.spawn_point(AGENT_HEIGHT);
        let mut body = AgentBody::new(x, y);
        body.grounded = true;
        Self::with_body(body)
    }

    pub fn with_body(body: AgentBody) -> Self {
        Self {
            body,
            ledger: PadLedger::new(),
            ticks: 0,
            terminal: None,
        }
    }

    #[inline]
    pub fn body(&self) -> &AgentBody {
        &self.body
    }

    #[inline]
    pub fn ledger(&self) -> &PadLedger {
        &self.ledger
    }

    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    #[inline]
    pub fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    pub fn observe(&self, level: &Level, control: &ControlConfig) -> Observation {
        observe(&self.body, level, control.observation)
    }

    /// Ends the agent from outside the tick (cull, timeout). A terminal agent
    /// keeps its first terminal state.
    pub fn terminate(&mut self, terminal: Terminal) {
        if self.terminal.is_none() {
            self.terminal = Some(terminal);
        }
    }

    /// Advances one tick with the controller's raw output. Malformed output
    /// ends the agent as out of bounds before any physics runs.
    pub fn step(&mut self, raw_action: &[f64], level: &Level, params: &SimParams) -> StepOutcome {
        debug_assert!(self.terminal.is_none(), "stepping a terminated agent");
        self.ticks += 1;

        let action = match decode_action(raw_action) {
            Ok(action) => action,
            Err(err) => {
                let reward = -params.reward.out_of_bounds_penalty;
                self.terminal = Some(Terminal::OutOfBounds);
                return StepOutcome::rejected(reward, err);
            }
        };

        let launched = apply_action(&mut self.body, action, &params.control, &params.aim);

        let prev_x = self.body.x;
        self.body
            .apply_gravity(params.physics.gravity, params.physics.terminal_velocity);
        self.body.integrate();

        let collision = collision::resolve(
            &mut self.body,
            level,
            params.physics.land_tolerance_px,
            params.physics.slide_friction,
        );

        let bounds = level.bounds();
        let shaped = shape(
            &params.reward,
            &mut self.ledger,
            &Transition {
                prev_x,
                body: &self.body,
                collision,
                level,
                bounds: &bounds,
            },
        );

        if shaped.terminal.is_some() {
            self.terminal = shaped.terminal;
        }

        StepOutcome {
            reward: shaped.reward,
            collision,
            launched,
            new_pad: shaped.new_pad,
            terminal: shaped.terminal,
            rejected: None,
        }
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot::capture(self.ticks, &self.body, &self.ledger, self.terminal)
    }

    pub fn result(&self, fitness: f64) -> ReplayResult {
        ReplayResult {
            ticks: self.ticks,
            fitness,
            pads_credited: self.ledger.credited_count(),
            terminal: self.terminal,
        }
    }
}

#[cfg(test)]
mod tests;
