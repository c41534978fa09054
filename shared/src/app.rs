use crux_core::App as CruxApp;
use tracing::{debug, info, warn};

use crate::cache;
use crate::capabilities::Capabilities;
use crate::dates::CalendarDate;
use crate::event::Event;
use crate::gateway::{self, GatewayError};
use crate::model::{ApodState, FetchRequest, Model, Rover, RoverState};
use crate::store::{self, StateUpdate};
use crate::view::{self, ViewModel};
use crate::FALLBACK_ASPECT_RATIO;

#[derive(Default)]
pub struct App;

impl App {
    /// Plans the fetches the active section still needs and starts them.
    /// A request that cannot even be built is dropped from the in-flight set
    /// so the next reconcile can try again.
    pub(crate) fn reconcile(model: &mut Model, caps: &Capabilities) {
        for request in cache::plan_refills(model) {
            info!(?request, "starting fetch");
            if let Err(error) = gateway::dispatch(&request, &model.config, &caps.http) {
                warn!(?request, kind = error.kind().code(), %error, "fetch could not be started");
                model.in_flight.finish(&request);
            }
        }
    }

    /// A failed fetch leaves the section as it was. No re-plan happens here, so
    /// a dead proxy is only retried on the next user action or repaint.
    fn fetch_failed(caps: &Capabilities, source: &'static str, error: &GatewayError) {
        warn!(source, kind = error.kind().code(), %error, "fetch failed");
        caps.render.render();
    }

    fn select_rover(rovers: &RoverState, rover: Rover, today: CalendarDate) -> RoverState {
        let mut next = rovers.clone();
        next.selected_rover = rover;
        next.selected_rover_info = rovers.manifests.get(&rover).cloned();
        next.photos = next.photos_for(rover.default_photo_date(today));
        next
    }

    fn select_apod_date(apod: &ApodState, date: CalendarDate) -> ApodState {
        let mut next = apod.clone();
        next.requested_date = date;
        next.current_image = apod.cached_images.get(&date).cloned();
        next
    }
}

impl CruxApp for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    #[allow(clippy::too_many_lines)]
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if event.is_user_initiated() {
            info!(event = event.name(), "user action");
        } else {
            debug!(event = event.name(), "event");
        }

        match event {
            Event::Noop => {}

            Event::AppStarted { today, config } => {
                model.config = *config;
                model.today = today;
                let apod = ApodState::new(today, model.config.apod_scan_start);
                let rovers = Self::select_rover(&model.rovers, model.rovers.selected_rover, today);
                store::update_and_render(
                    model,
                    caps,
                    [StateUpdate::Apod(apod), StateUpdate::Rover(rovers)],
                );
            }

            Event::DayChanged { today } => {
                store::update_and_render(model, caps, [StateUpdate::Today(today)]);
            }

            Event::Repaint => store::update_and_render(model, caps, []),

            Event::SectionSelected { section, rover } => {
                let mut updates = vec![StateUpdate::Menu(section)];
                if let Some(rover) = rover {
                    if section != model.active_section || rover != model.rovers.selected_rover {
                        updates.push(StateUpdate::Rover(Self::select_rover(
                            &model.rovers,
                            rover,
                            model.today,
                        )));
                    }
                }
                store::update_and_render(model, caps, updates);
            }

            Event::ApodDateSelected { date } => {
                if date < CalendarDate::apod_epoch() || date > model.today {
                    warn!(%date, "apod date outside the archive");
                    caps.render.render();
                    return;
                }
                let updates = (date != model.apod.requested_date)
                    .then(|| StateUpdate::Apod(Self::select_apod_date(&model.apod, date)));
                store::update_and_render(model, caps, updates);
            }

            Event::RoverDateSelected { date } => {
                let updates = (date != model.rovers.photos.requested_date).then(|| {
                    let mut next = model.rovers.clone();
                    next.photos = next.photos_for(date);
                    StateUpdate::Rover(next)
                });
                store::update_and_render(model, caps, updates);
            }

            Event::ApodImageFetched { date, result } => {
                model.in_flight.finish(&FetchRequest::ApodImage(date));
                match *result {
                    Ok(record) => {
                        let update = cache::absorb_apod_image(&model.apod, date, record);
                        store::update_and_render(model, caps, [update]);
                    }
                    Err(error) => Self::fetch_failed(caps, "apod_image", &error),
                }
            }

            Event::ApodRangeFetched { start, end, result } => {
                model.in_flight.finish(&FetchRequest::ApodRange { start, end });
                match *result {
                    Ok(records) => {
                        let update = cache::absorb_apod_range(&model.apod, end, &records);
                        store::update_and_render(model, caps, [update]);
                    }
                    Err(error) => Self::fetch_failed(caps, "apod_range", &error),
                }
            }

            Event::ApodImageMeasured { date, url, result } => {
                model.in_flight.finish(&FetchRequest::ApodDimensions {
                    date,
                    url: url.clone(),
                });
                let ratio = match *result {
                    Ok(ratio) => ratio,
                    Err(error) => {
                        warn!(%date, kind = error.kind().code(), %error, "image probe failed, using square frame");
                        FALLBACK_ASPECT_RATIO
                    }
                };
                let update = cache::absorb_image_dimensions(&model.apod, date, &url, ratio);
                store::update_and_render(model, caps, update);
            }

            Event::EpicFetched(result) => {
                model.in_flight.finish(&FetchRequest::EpicLatest);
                let absorbed =
                    (*result).and_then(|records| cache::absorb_epic(&model.epic, &records));
                match absorbed {
                    Ok(update) => store::update_and_render(model, caps, update),
                    Err(error) => Self::fetch_failed(caps, "epic", &error),
                }
            }

            Event::RoverManifestFetched { rover, result } => {
                model.in_flight.finish(&FetchRequest::RoverManifest(rover));
                let absorbed = (*result).and_then(|envelope| {
                    cache::absorb_rover_manifest(&model.rovers, rover, &envelope)
                });
                match absorbed {
                    Ok(update) => store::update_and_render(model, caps, [update]),
                    Err(error) => Self::fetch_failed(caps, "rover_manifest", &error),
                }
            }

            Event::RoverPhotosFetched { rover, date, result } => {
                model.in_flight.finish(&FetchRequest::RoverPhotos { rover, date });
                match *result {
                    Ok(envelope) => {
                        let update = cache::absorb_rover_photos(
                            &model.rovers,
                            &model.config,
                            &mut model.rng,
                            rover,
                            date,
                            &envelope,
                        );
                        store::update_and_render(model, caps, [update]);
                    }
                    Err(error) => Self::fetch_failed(caps, "rover_photos", &error),
                }
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::render(model)
    }
}
