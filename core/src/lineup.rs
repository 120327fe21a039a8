//! Suspect assignment — builds a session lineup and binds the suspect.
//!
//! One SuspectProfile is drawn uniformly, `count` distinct customer
//! templates are drawn without replacement, and one slot is chosen
//! uniformly to carry the profile.

use crate::{
    content::{ContentCatalog, SuspectProfile},
    customer::CustomerInstance,
    error::{GameError, GameResult},
    rng::StreamRng,
    types::LineupIndex,
};
use serde::{Deserialize, Serialize};

/// What to do when fewer templates exist than the requested lineup size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineupPolicy {
    /// Use every available template and log a warning.
    #[default]
    Clamp,
    /// Refuse with `GameError::InsufficientTemplates`.
    Strict,
}

#[derive(Debug, Clone)]
pub struct Lineup {
    pub suspect:       SuspectProfile,
    pub customers:     Vec<CustomerInstance>,
    pub suspect_index: LineupIndex,
}

impl Lineup {
    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

pub struct SuspectAssignment<'a> {
    catalog: &'a ContentCatalog,
    policy:  LineupPolicy,
}

impl<'a> SuspectAssignment<'a> {
    pub fn new(catalog: &'a ContentCatalog, policy: LineupPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn generate(&self, count: usize, rng: &mut StreamRng) -> GameResult<Lineup> {
        let suspect = rng
            .pick(&self.catalog.suspects)
            .cloned()
            .ok_or(GameError::NoSuspects)?;

        let available = self.catalog.customers.len();
        if count == 0 || available == 0 {
            return Err(GameError::InsufficientTemplates { requested: count, available });
        }

        let size = if available < count {
            match self.policy {
                LineupPolicy::Strict => {
                    return Err(GameError::InsufficientTemplates { requested: count, available });
                }
                LineupPolicy::Clamp => {
                    log::warn!("Lineup clamped: requested {count}, only {available} templates");
                    available
                }
            }
        } else {
            count
        };

        // Partial Fisher–Yates: the first `size` slots are a uniform draw without replacement.
        let mut order: Vec<usize> = (0..available).collect();
        for i in 0..size {
            let j = i + rng.index_below(available - i);
            order.swap(i, j);
        }

        let mut customers: Vec<CustomerInstance> = order[..size]
            .iter()
            .map(|&i| CustomerInstance::new(self.catalog.customers[i].clone()))
            .collect();

        let suspect_index = rng.index_below(size);
        customers[suspect_index].bind_suspect(suspect.clone());

        log::debug!(
            "Lineup generated from stream '{}': {size} customers, suspect '{}' in slot {suspect_index}",
            rng.name,
            suspect.codename
        );

        Ok(Lineup {
            suspect,
            customers,
            suspect_index,
        })
    }
}
