//! A headless obstacle course implementing [Environment]. Agents fall under gravity, may flap
//! upwards, and must pass through gaps in obstacles scrolling towards them. Nothing is
//! rendered; the owning loop calls [GapRunner::advance] once per tick.

use crate::{
    environment::{Decision, Environment, Reading, Sensors, Spawn},
    random::WyRng,
};
use rand::{Rng, SeedableRng};

pub const WIDTH: f64 = 576.;
pub const HEIGHT: f64 = 512.;
const GROUND: f64 = 100.;
const GRAVITY: f64 = 900.;
const FLAP_IMPULSE: f64 = -300.;
const GAP_SPEED: f64 = -120.;
const GAP_SIZE: f64 = 100.;
const GAP_SPACING: f64 = 120.;
const OBSTACLE_WIDTH: f64 = 52.;
const OBSTACLE_HEIGHT: f64 = 320.;
const AGENT_WIDTH: f64 = 34.;
const AGENT_HEIGHT: f64 = 24.;

#[derive(Debug, Clone)]
struct Agent {
    x: f64,
    y: f64,
    vy: f64,
    /// Ticks survived, once dead
    dead: Option<f64>,
}

impl Agent {
    fn top(&self) -> f64 {
        self.y - AGENT_HEIGHT / 2.
    }

    fn bottom(&self) -> f64 {
        self.y + AGENT_HEIGHT / 2.
    }

    fn left(&self) -> f64 {
        self.x - AGENT_WIDTH / 2.
    }
}

#[derive(Debug, Clone)]
struct Gap {
    x: f64,
    center: f64,
    size: f64,
}

impl Gap {
    fn top(&self) -> f64 {
        self.center - self.size / 2.
    }

    fn bottom(&self) -> f64 {
        self.center + self.size / 2.
    }

    fn collides(&self, agent: &Agent) -> bool {
        let overlap = |x: f64, y: f64, w: f64, h: f64| {
            !(agent.left() + AGENT_WIDTH <= x
                || agent.left() >= x + w
                || agent.top() + AGENT_HEIGHT <= y
                || agent.top() >= y + h)
        };
        overlap(self.x, self.top() - OBSTACLE_HEIGHT, OBSTACLE_WIDTH, OBSTACLE_HEIGHT)
            || overlap(self.x, self.bottom(), OBSTACLE_WIDTH, OBSTACLE_HEIGHT)
    }
}

#[derive(Debug)]
pub struct GapRunner {
    rng: WyRng,
    agents: Vec<Agent>,
    gaps: Vec<Gap>,
    ticks: u64,
    tick_limit: Option<u64>,
}

impl GapRunner {
    pub fn new(seed: u64) -> Self {
        let mut runner = Self {
            rng: WyRng::seed_from_u64(seed),
            agents: Vec::new(),
            gaps: Vec::new(),
            ticks: 0,
            tick_limit: None,
        };
        runner.restart();
        runner
    }

    /// End every generation after `limit` ticks, scoring survivors with the limit
    pub fn with_tick_limit(mut self, limit: u64) -> Self {
        self.tick_limit = Some(limit);
        self
    }

    /// Ticks elapsed this generation
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn alive(&self) -> usize {
        self.agents.iter().filter(|a| a.dead.is_none()).count()
    }

    fn floor() -> f64 {
        HEIGHT - GROUND
    }

    fn spawn_gap(&mut self, x: f64) {
        let min = 80.;
        let max = HEIGHT - 160. - GROUND;
        self.gaps.push(Gap {
            x,
            center: self.rng.random_range(min..max),
            size: GAP_SIZE,
        });
    }

    /// The nearest gap whose obstacle hasn't yet been fully passed
    fn next_gap(&self, x: f64) -> Option<&Gap> {
        self.gaps
            .iter()
            .filter(|g| g.x + OBSTACLE_WIDTH >= x)
            .min_by(|l, r| l.x.total_cmp(&r.x))
    }

    /// Simulate `dt` seconds of the world
    pub fn advance(&mut self, dt: f64) {
        self.ticks += 1;
        let survival = self.ticks as f64;

        for agent in self.agents.iter_mut().filter(|a| a.dead.is_none()) {
            agent.vy += GRAVITY * dt;
            agent.y += agent.vy * dt;
            if agent.top() <= 0. || agent.bottom() >= Self::floor() {
                agent.dead = Some(survival);
            }
        }

        if self
            .gaps
            .last()
            .map_or(true, |g| g.x < WIDTH - (GAP_SPACING + OBSTACLE_WIDTH))
        {
            self.spawn_gap(WIDTH + 50.);
        }

        for gap in self.gaps.iter_mut() {
            gap.x += GAP_SPEED * dt;
        }
        self.gaps.retain(|g| g.x + OBSTACLE_WIDTH >= -100.);

        for agent in self.agents.iter_mut().filter(|a| a.dead.is_none()) {
            if self.gaps.iter().any(|g| g.collides(agent)) {
                agent.dead = Some(survival);
            }
        }

        if self.tick_limit.is_some_and(|limit| self.ticks >= limit) {
            for agent in self.agents.iter_mut().filter(|a| a.dead.is_none()) {
                agent.dead = Some(survival);
            }
        }
    }
}

impl Environment for GapRunner {
    fn spawn(&mut self, spawns: &[Spawn]) {
        self.agents = spawns
            .iter()
            .map(|s| Agent {
                x: WIDTH * 0.25 + s.dx,
                y: HEIGHT * 0.45 + s.dy,
                vy: 0.,
                dead: None,
            })
            .collect();
    }

    fn sense(&self, index: usize) -> Reading {
        let Some(agent) = self.agents.get(index) else {
            return Reading::Dead { survival: 0. };
        };
        if let Some(survival) = agent.dead {
            return Reading::Dead { survival };
        }
        match self.next_gap(agent.x) {
            Some(gap) => Reading::Sensing(Sensors {
                horizontal_distance: gap.x + OBSTACLE_WIDTH / 2. - agent.x,
                vertical_offset: gap.center - agent.y,
                vertical_velocity: agent.vy,
                gap_size: gap.size,
            }),
            None => Reading::Blind,
        }
    }

    fn apply(&mut self, index: usize, decision: Decision) {
        if let (Some(agent), Decision::Act) = (self.agents.get_mut(index), decision) {
            if agent.dead.is_none() {
                agent.vy = FLAP_IMPULSE;
            }
        }
    }

    fn restart(&mut self) {
        self.gaps.clear();
        self.ticks = 0;
        for i in 0..3 {
            self.spawn_gap(WIDTH + 50. + i as f64 * (GAP_SPACING + OBSTACLE_WIDTH));
        }
    }
}
