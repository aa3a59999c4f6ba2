//! Application layer of the Invitono referral client.
//!
//! Composes the query layer and the wallet session machine into an
//! application controller, and renders its state for the terminal.

pub mod app;
pub mod view;

pub use app::{App, BusyAction, CancelFlag, Dashboard};
