//! Sessions and the engine handle.
//!
//! The [`Engine`] owns everything shared: configuration, the loaded
//! blueprint prior, the equity cache, diagnostic counters, and the session
//! table. Each session is a serial state machine over one live hand at a
//! time; the bot plays its turns automatically until the human must act or
//! the hand ends.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::belief::RangeBelief;
use crate::blueprint::PriorStore;
use crate::cards::{card_label, HandContext};
use crate::config::{EngineConfig, ABSTRACTION_VERSION, CHIP_EPSILON};
use crate::decide;
use crate::diag::DiagCounters;
use crate::equity::EquityCache;
use crate::error::EngineError;
use crate::game::{other, Action, HandState, Seat, Street};
use crate::stats::OpponentStats;

/// Session win/loss ledger, from the human's perspective.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Score {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    /// Accumulated human payoff in chips.
    pub net: f64,
}

/// One bot move, for narration by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct BotStep {
    pub seat: Seat,
    pub action: Action,
    /// Chips the bot put in with this action.
    pub paid: f64,
    pub street_after: Street,
    pub used_subgame: bool,
}

/// Terminal outcome of a hand.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HandResult {
    /// Winning seat; `None` for a chopped showdown.
    pub winner: Option<Seat>,
    pub human_payoff: f64,
}

/// Serializable view of the public state plus the human's private cards.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub hand_index: u32,
    pub street: Street,
    pub pot: f64,
    pub to_call: f64,
    pub stacks: [f64; 2],
    pub to_act: Seat,
    pub terminal: bool,
    pub board: Vec<String>,
    pub human_hole: Vec<String>,
    /// Action symbols for this hand so far, in order (e.g. `"c"`, `"r50"`).
    pub history: Vec<String>,
    /// Legal actions for the seat to act, in wire order.
    pub legal: Vec<Action>,
    pub score: Score,
}

/// Static configuration snapshot for `health()`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub small_blind: f64,
    pub big_blind: f64,
    pub start_stack: f64,
    pub max_raises: u8,
    pub equity_trials: u32,
    pub rt_subgame_ms: u64,
    pub abstraction_version: &'static str,
    pub prior_infosets: usize,
    pub sessions: usize,
}

/// Result of advancing a session by one human action.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub snapshot: StateSnapshot,
    pub bot_steps: Vec<BotStep>,
    pub result: Option<HandResult>,
}

struct Session {
    human_seat: Seat,
    hand_index: u32,
    score: Score,
    /// Observed tendencies of the human seat; persists across hands.
    stats: OpponentStats,
    /// Per-seat range beliefs; reset each hand.
    belief: [RangeBelief; 2],
    hand: HandState,
    ctx: HandContext,
    settled: bool,
    rng: StdRng,
}

impl Session {
    fn new(human_seat: Seat, config: &EngineConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let ctx = HandContext::deal(&mut rng);
        Self {
            human_seat,
            hand_index: 1,
            score: Score::default(),
            stats: OpponentStats::default(),
            belief: [RangeBelief::default(), RangeBelief::default()],
            hand: HandState::new(config),
            ctx,
            settled: false,
            rng,
        }
    }

    fn deal_next(&mut self, config: &EngineConfig) {
        self.ctx = HandContext::deal(&mut self.rng);
        self.hand = HandState::new(config);
        self.belief = [RangeBelief::default(), RangeBelief::default()];
        self.settled = false;
        self.hand_index += 1;
    }
}

/// The decision engine: session table plus all shared state.
pub struct Engine {
    config: EngineConfig,
    prior: PriorStore,
    cache: EquityCache,
    diag: DiagCounters,
    sessions: FxHashMap<u64, Session>,
    next_id: u64,
    rng: StdRng,
}

impl Engine {
    /// Engine with no blueprint loaded; decisions fall back to EV scoring.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_prior(config, PriorStore::empty())
    }

    /// Engine with a loaded blueprint prior.
    #[must_use]
    pub fn with_prior(config: EngineConfig, prior: PriorStore) -> Self {
        let cache = EquityCache::new(config.equity_cache_entries);
        Self {
            config,
            prior,
            cache,
            diag: DiagCounters::default(),
            sessions: FxHashMap::default(),
            next_id: 1,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seed the session-dealing RNG, for reproducible tests.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Static configuration view.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        HealthReport {
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            start_stack: self.config.start_stack,
            max_raises: self.config.max_raises,
            equity_trials: self.config.equity_trials,
            rt_subgame_ms: self.config.rt_subgame_ms,
            abstraction_version: ABSTRACTION_VERSION,
            prior_infosets: self.prior.len(),
            sessions: self.sessions.len(),
        }
    }

    /// Diagnostic counter snapshot, cache statistics included.
    #[must_use]
    pub fn diag(&self) -> DiagCounters {
        let mut snapshot = self.diag.clone();
        snapshot.equity_cache_hits = self.cache.hits();
        snapshot.equity_cache_rollouts = self.cache.rollouts();
        snapshot
    }

    /// Create a session and deal its first hand. The bot plays through its
    /// turns; the outcome carries the session handle.
    pub fn new_hand(&mut self, human_seat: Seat) -> (u64, TurnOutcome) {
        let id = self.next_id;
        self.next_id += 1;
        let seed = self.rng.gen();
        let session = Session::new(human_seat & 1, &self.config, seed);
        self.sessions.insert(id, session);
        let outcome = self.advance(id);
        (id, outcome)
    }

    /// Deal the next hand in an existing session, keeping score and stats.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownSession`] for a bad handle.
    pub fn next_hand(&mut self, session_id: u64) -> Result<TurnOutcome, EngineError> {
        let config = self.config.clone();
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(EngineError::UnknownSession(session_id))?;
        session.deal_next(&config);
        Ok(self.advance(session_id))
    }

    /// Apply the human's action (an index into the current legal set), then
    /// let the bot play until the human's turn or the end of the hand.
    ///
    /// # Errors
    ///
    /// Rejects unknown sessions and out-of-range action indices; the state
    /// is unchanged on error.
    pub fn apply_human_action(
        &mut self,
        session_id: u64,
        action_index: usize,
    ) -> Result<TurnOutcome, EngineError> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(EngineError::UnknownSession(session_id))?;

        let legal = session.hand.legal_actions();
        let Some(&action) = legal.get(action_index) else {
            return Err(EngineError::InvalidAction {
                index: action_index,
                legal: legal.len(),
            });
        };

        let facing_bet = session.hand.to_call() > CHIP_EPSILON;
        if session.hand.street == Street::Preflop && session.hand.raises > 0 {
            session.stats.record_preflop_vs_raise(action);
        } else if session.hand.street != Street::Preflop && facing_bet {
            session.stats.record_postflop_vs_bet(session.hand.street, action);
        }

        let human = session.human_seat;
        let report = session.hand.apply(action);
        if report.clamped {
            self.diag.illegal_state_warnings += 1;
        }
        session.belief[human].observe(action, facing_bet);

        Ok(self.advance(session_id))
    }

    /// Drop a session.
    pub fn end_session(&mut self, session_id: u64) {
        self.sessions.remove(&session_id);
    }

    /// Run bot turns until the human acts or the hand ends, then snapshot.
    fn advance(&mut self, session_id: u64) -> TurnOutcome {
        let mut bot_steps = Vec::new();
        let config = self.config.clone();

        let result = loop {
            let Some(session) = self.sessions.get_mut(&session_id) else {
                break None;
            };
            let bot_seat = other(session.human_seat);

            if session.hand.terminal {
                break Self::settle_hand(session, &config, &mut self.diag);
            }
            if session.hand.to_act != bot_seat {
                break None;
            }

            let decision = decide::decide(
                &session.hand,
                &session.ctx,
                &session.belief[session.human_seat],
                &session.stats,
                &self.prior,
                &self.cache,
                &config,
                &mut self.diag,
                &mut session.rng,
            );

            let facing_bet = session.hand.to_call() > CHIP_EPSILON;
            let report = session.hand.apply(decision.action);
            if report.clamped {
                self.diag.illegal_state_warnings += 1;
            }
            session.belief[bot_seat].observe(decision.action, facing_bet);

            bot_steps.push(BotStep {
                seat: bot_seat,
                action: decision.action,
                paid: report.paid,
                street_after: session.hand.street,
                used_subgame: decision.used_subgame,
            });
        };

        let snapshot = self.snapshot(session_id);
        TurnOutcome {
            snapshot,
            bot_steps,
            result,
        }
    }

    /// Settle a terminal hand once, updating the session score.
    fn settle_hand(
        session: &mut Session,
        config: &EngineConfig,
        diag: &mut DiagCounters,
    ) -> Option<HandResult> {
        let board_len = session.hand.street.board_len();
        if session.ctx.board_for(session.hand.street).len() != board_len {
            // Unreachable with a pre-dealt board, but counted if it ever is.
            diag.board_invariant_warnings += 1;
        }

        let settlement = session.hand.settle(&session.ctx, config);
        let human_payoff = settlement.payoffs[session.human_seat];
        if !session.settled {
            session.settled = true;
            session.score.net += human_payoff;
            if human_payoff > CHIP_EPSILON {
                session.score.wins += 1;
            } else if human_payoff < -CHIP_EPSILON {
                session.score.losses += 1;
            } else {
                session.score.ties += 1;
            }
        }
        Some(HandResult {
            winner: settlement.winner,
            human_payoff,
        })
    }

    fn snapshot(&self, session_id: u64) -> StateSnapshot {
        let session = &self.sessions[&session_id];
        let hand = &session.hand;
        StateSnapshot {
            hand_index: session.hand_index,
            street: hand.street,
            pot: hand.pot,
            to_call: hand.to_call(),
            stacks: hand.stack,
            to_act: hand.to_act,
            terminal: hand.terminal,
            board: session
                .ctx
                .board_for(hand.street)
                .iter()
                .map(|&c| card_label(c))
                .collect(),
            human_hole: session.ctx.holes[session.human_seat]
                .iter()
                .map(|&c| card_label(c))
                .collect(),
            history: hand
                .history
                .iter()
                .map(|&(_, action)| action.symbol().to_string())
                .collect(),
            legal: hand.legal_actions().to_vec(),
            score: session.score,
        }
    }
}
