//! The single place section state is replaced.
//!
//! Every change goes through [`update_and_render`]: the new section values are
//! merged in, outstanding data needs are re-planned, and the shell is told to
//! repaint. Merging keeps what must never go backwards (known images, disabled
//! dates, how far the scan got, derived rover manifests) even when a caller
//! hands in an older snapshot.

use tracing::{debug, warn};

use crate::app::App;
use crate::capabilities::Capabilities;
use crate::dates::CalendarDate;
use crate::model::{ApodState, EpicState, Model, RoverState, Section};

/// A replacement value for one slice of the model.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Menu(Section),
    Apod(ApodState),
    Epic(EpicState),
    Rover(RoverState),
    Today(CalendarDate),
}

impl StateUpdate {
    #[must_use]
    pub const fn slice(&self) -> &'static str {
        match self {
            Self::Menu(_) => "menu",
            Self::Apod(_) => "apod",
            Self::Epic(_) => "epic",
            Self::Rover(_) => "rover",
            Self::Today(_) => "today",
        }
    }
}

fn merge_apod(current: &ApodState, mut next: ApodState) -> ApodState {
    next.checked_until = next.checked_until.max(current.checked_until);
    next.disabled_dates
        .extend(current.disabled_dates.iter().copied());
    for (date, image) in &current.cached_images {
        next.cached_images
            .entry(*date)
            .or_insert_with(|| image.clone());
    }
    next
}

fn merge_rovers(current: &RoverState, mut next: RoverState) -> RoverState {
    for (rover, info) in &current.manifests {
        // Already-derived manifests are never replaced.
        next.manifests.insert(*rover, info.clone());
    }
    for (key, urls) in &current.photo_sets {
        next.photo_sets.entry(*key).or_insert_with(|| urls.clone());
    }
    next
}

/// Merges `update` into `model`.
pub fn apply(model: &mut Model, update: StateUpdate) {
    debug!(slice = update.slice(), "applying state update");
    match update {
        StateUpdate::Menu(section) => model.active_section = section,
        StateUpdate::Apod(next) => model.apod = merge_apod(&model.apod, next),
        StateUpdate::Epic(next) => {
            if model.epic.date.is_some() && model.epic != next {
                warn!("epic set is already loaded; replacement ignored");
            } else {
                model.epic = next;
            }
        }
        StateUpdate::Rover(next) => model.rovers = merge_rovers(&model.rovers, next),
        StateUpdate::Today(today) => {
            if today < model.today {
                warn!(%today, current = %model.today, "ignoring clock moving backwards");
            } else {
                model.today = today;
            }
        }
    }
}

/// Applies `updates` in order, starts whatever the new state still needs, then
/// asks the shell to render.
pub fn update_and_render<I>(model: &mut Model, caps: &Capabilities, updates: I)
where
    I: IntoIterator<Item = StateUpdate>,
{
    for update in updates {
        apply(model, update);
    }
    App::reconcile(model, caps);
    caps.render.render();
}
