//! Scheduled command source emitting one tick per group and period.

use std::time::Duration;

use bus::{Capabilities, Component};
use chrono::Utc;
use common::TableId;
use domain::{CommandSource, CommandStream};
use futures_util::StreamExt;
use tokio::time::{Interval, MissedTickBehavior};

use crate::ticks::{TickCommand, TickEvent};

/// Emits a [`TickCommand::Tick`] for every configured group each period.
#[derive(Debug, Clone)]
pub struct Ticker {
    groups: Vec<String>,
    period: Duration,
    limit: Option<u64>,
}

impl Ticker {
    pub fn new(groups: Vec<String>, period: Duration) -> Self {
        Self {
            groups,
            period,
            limit: None,
        }
    }

    /// Stops the source after `rounds` periods.
    pub fn with_limit(mut self, rounds: u64) -> Self {
        self.limit = Some(rounds);
        self
    }
}

struct Round {
    interval: Interval,
    done: u64,
}

impl CommandSource<TickCommand> for Ticker {
    fn commands(self: Box<Self>) -> CommandStream<TickCommand> {
        let Ticker {
            groups,
            period,
            limit,
        } = *self;

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let state = Round { interval, done: 0 };

        let rounds = futures_util::stream::unfold(state, move |mut state| async move {
            if limit.is_some_and(|limit| state.done >= limit) {
                return None;
            }
            state.interval.tick().await;
            state.done += 1;
            Some((Utc::now(), state))
        });

        Box::pin(rounds.flat_map(move |at| {
            let commands: Vec<TickCommand> = groups
                .iter()
                .map(|group| TickCommand::tick(TableId::for_group(group.as_str()), at))
                .collect();
            futures_util::stream::iter(commands)
        }))
    }
}

impl Component<TickCommand, TickEvent> for Ticker {
    fn capabilities(self) -> Capabilities<TickCommand, TickEvent> {
        Capabilities::new().source(self)
    }
}
