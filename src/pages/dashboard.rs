//! Dashboard tiles, recent orders and today's cashier leaderboard.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::PosResult;
use crate::fetch::RequestTracker;
use crate::models::Order;
use crate::session::{self, Session};
use crate::stats::{self, DashboardStats, LeaderboardEntry};
use crate::store::{OrderQuery, PosData};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub recent: Vec<Order>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

pub struct DashboardPage<Tz: TimeZone> {
    data: PosData,
    tracker: RequestTracker,
    tz: Tz,
    view: DashboardView,
}

impl<Tz: TimeZone> DashboardPage<Tz> {
    pub fn open(data: PosData, session: Option<&Session>, tz: Tz) -> PosResult<Self> {
        session::require_session(session)?;
        Ok(Self {
            data,
            tracker: RequestTracker::new("dashboard"),
            tz,
            view: DashboardView::default(),
        })
    }

    pub async fn load(&mut self, now: DateTime<Utc>) -> PosResult<()> {
        let ticket = self.tracker.begin();
        let all = OrderQuery {
            with_cashier: true,
            newest_first: true,
            ..OrderQuery::default()
        };
        let today = OrderQuery {
            since: Some(stats::local_midnight(&self.tz, now)),
            ..OrderQuery::default()
        };
        let data = self.data.clone();
        let fetch = async move {
            tokio::try_join!(
                data.orders(&all),
                data.orders(&today),
                data.active_cashiers(),
                data.available_foods(),
            )
        };
        if let Some((all, today, cashiers, foods)) = self.tracker.run(ticket, fetch).await? {
            debug!(orders = all.len(), today = today.len(), "dashboard loaded");
            self.view = DashboardView {
                stats: DashboardStats::new(&all, &today, cashiers.len(), foods.len()),
                recent: stats::recent_orders(&all, stats::RECENT_ORDERS),
                leaderboard: stats::leaderboard(&cashiers, &today),
            };
        }
        Ok(())
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn leave(&self) {
        self.tracker.leave();
    }
}
