//! Page controllers.
//!
//! Each page owns a snapshot of the rows it shows, a [`RequestTracker`] so a
//! late response never overwrites a newer one, and the guard that decides
//! who may open it. Mutations reload the snapshot they invalidate.
//!
//! [`RequestTracker`]: crate::fetch::RequestTracker

pub mod cashiers;
pub mod dashboard;
pub mod foods;
pub mod login;
pub mod my_orders;
pub mod new_order;
pub mod orders;

use crate::error::PosResult;
use crate::session::{self, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Cashiers,
    Foods,
    AllOrders,
    MyOrders,
    NewOrder,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Dashboard,
        Page::Cashiers,
        Page::Foods,
        Page::AllOrders,
        Page::MyOrders,
        Page::NewOrder,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Dashboard => "/dashboard",
            Self::Cashiers => "/cashiers",
            Self::Foods => "/foods",
            Self::AllOrders => "/orders",
            Self::MyOrders => "/cashier-orders",
            Self::NewOrder => "/new-order",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Cashiers => "Cashiers",
            Self::Foods => "Foods",
            Self::AllOrders => "All Orders",
            Self::MyOrders => "My Orders",
            Self::NewOrder => "New Order",
        }
    }

    pub fn admin_only(&self) -> bool {
        matches!(self, Self::Cashiers | Self::Foods | Self::AllOrders)
    }

    pub fn cashier_only(&self) -> bool {
        matches!(self, Self::MyOrders | Self::NewOrder)
    }

    /// Check that `session` may open this page.
    pub fn guard(&self, session: Option<&Session>) -> PosResult<()> {
        if self.admin_only() {
            session::require_admin(session)
        } else if self.cashier_only() {
            session::require_cashier(session).map(|_| ())
        } else {
            session::require_session(session).map(|_| ())
        }
    }
}

/// Pages listed in the navigation for `session`.
pub fn nav_items(session: &Session) -> Vec<Page> {
    Page::ALL
        .into_iter()
        .filter(|p| p.guard(Some(session)).is_ok())
        .collect()
}

/// Where a fresh login lands.
pub fn landing_page(session: &Session) -> Page {
    match session {
        Session::Administrator => Page::Dashboard,
        Session::Cashier(_) => Page::MyOrders,
    }
}
