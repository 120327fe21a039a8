//! barber-core: headless game core for Undercover Barber.
//!
//! An undercover cop runs a barbershop, questions a lineup of customers to
//! find the one matching a suspect briefing, then chases them on foot and
//! by car. This crate holds the rules; presentation layers consume the
//! `GameEvent` stream.

pub mod car_chase;
pub mod chase;
pub mod chatbot;
pub mod clock;
pub mod config;
pub mod content;
pub mod customer;
pub mod deduction;
pub mod dialogue;
pub mod error;
pub mod event;
pub mod game;
pub mod haircut;
pub mod lineup;
pub mod outcome;
pub mod rng;
pub mod street_chase;
pub mod types;
