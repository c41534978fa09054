use std::collections::BTreeSet;

use beyond_core::config::CoreConfig;
use beyond_core::model::{Rover, Section};
use beyond_core::view::Widget;
use beyond_core::{App, CalendarDate, Effect, Event, Model};
use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse};
use serde_json::json;

fn date(s: &str) -> CalendarDate {
    CalendarDate::parse(s).unwrap()
}

fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            Effect::Render(_) => None,
        })
        .collect()
}

fn url_of(request: &Request<HttpRequest>) -> String {
    request.operation.url.clone()
}

fn json_body(value: &serde_json::Value) -> HttpResponse {
    HttpResponse::ok().body(serde_json::to_vec(value).unwrap()).build()
}

fn resolve_and_apply(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    request: &mut Request<HttpRequest>,
    response: HttpResponse,
) -> Vec<Request<HttpRequest>> {
    let resolved = app.resolve(request, crux_http::protocol::HttpResult::Ok(response)).expect("request resolves");
    let mut started = Vec::new();
    for event in resolved.events {
        started.extend(http_requests(app.update(event, model).effects));
    }
    started
}

fn start(app: &AppTester<App, Effect>, model: &mut Model, config: CoreConfig) -> Vec<Request<HttpRequest>> {
    http_requests(
        app.update(
            Event::AppStarted {
                today: date("2024-03-10"),
                config: Box::new(config),
            },
            model,
        )
        .effects,
    )
}

fn curiosity_manifest() -> serde_json::Value {
    json!({
        "photo_manifest": {
            "name": "Curiosity",
            "landing_site": "Gale Crater",
            "launch_date": "2011-11-26",
            "landing_date": "2012-08-06",
            "status": "active",
            "max_sol": 4102,
            "total_photos": 695_670,
            "photos": [
                {"sol": 0, "earth_date": "2012-08-06", "total_photos": 3702, "cameras": ["CHEMCAM"]},
                {"sol": 1, "earth_date": "2012-08-07", "total_photos": 16, "cameras": ["MAHLI"]},
                {"sol": 3, "earth_date": "2012-08-09", "total_photos": 338, "cameras": ["NAVCAM"]},
                {"sol": 4102, "earth_date": "2024-03-04", "total_photos": 120, "cameras": ["FHAZ"]}
            ]
        }
    })
}

fn photos_for(count: usize) -> serde_json::Value {
    let cameras = ["FHAZ", "NAVCAM", "MAHLI", "CHEMCAM", "RHAZ", "MAST"];
    let photos: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            json!({
                "id": i,
                "sol": 4102,
                "img_src": format!("https://mars.nasa.gov/msl/{}.jpg", i % (count / 2).max(1)),
                "earth_date": "2024-03-04",
                "camera": {"id": 20, "name": cameras[i % cameras.len()]}
            })
        })
        .collect();
    json!({ "photos": photos })
}

#[test]
fn test_startup_lands_on_earth_and_loads_epic() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::seeded(date("2024-03-10"), 3);

    let mut requests = start(&app, &mut model, CoreConfig::default());
    assert_eq!(requests.len(), 1);
    assert_eq!(url_of(&requests[0]), "http://localhost:3000/epic/get_latest");
    assert!(app.view(&model).content_html.is_empty());

    let follow_up = resolve_and_apply(
        &app,
        &mut model,
        &mut requests[0],
        json_body(&json!([
            {"identifier": "20240308003633", "image": "epic_1b_20240308003633", "date": "2024-03-08 00:31:45"},
            {"identifier": "20240308022436", "image": "epic_1b_20240308022436", "date": "2024-03-08 02:20:03"}
        ])),
    );
    assert!(follow_up.is_empty());
    assert_eq!(model.epic.date, Some(date("2024-03-08")));

    let view = app.view(&model);
    assert!(view.content_html.contains(
        "https://epic.gsfc.nasa.gov/archive/natural/2024/03/08/png/epic_1b_20240308003633.png"
    ));
    assert!(view.widgets.iter().any(|w| matches!(w, Widget::Carousel { .. })));

    assert!(http_requests(app.update(Event::Repaint, &mut model).effects).is_empty());
}

#[test]
fn test_custom_proxy_base_is_used() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::seeded(date("2024-03-10"), 3);
    let config = CoreConfig {
        proxy_base_url: "https://beyond.example.org/api/".into(),
        ..CoreConfig::default()
    };
    let requests = start(&app, &mut model, config);
    assert_eq!(url_of(&requests[0]), "https://beyond.example.org/api/epic/get_latest");
}

#[test]
fn test_mars_flow_samples_allowed_cameras() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::seeded(date("2024-03-10"), 42);

    let update = app.update(
        Event::SectionSelected {
            section: Section::Mars,
            rover: Some(Rover::Curiosity),
        },
        &mut model,
    );
    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 2);
    let (manifest_at, photos_at) = if url_of(&requests[0]).contains("/manifest/") {
        (0, 1)
    } else {
        (1, 0)
    };
    assert!(url_of(&requests[photos_at]).ends_with("/mars-photos/rovers/curiosity/2024-03-04"));

    resolve_and_apply(&app, &mut model, &mut requests[manifest_at], json_body(&curiosity_manifest()));
    assert!(app.view(&model).pending);
    let info = model.rovers.selected_rover_info.clone().unwrap();
    assert_eq!(info.min_date, date("2012-08-06"));
    assert_eq!(info.max_date, date("2024-03-04"));
    assert!(info.disabled_dates.contains(&date("2012-08-08")));

    resolve_and_apply(&app, &mut model, &mut requests[photos_at], json_body(&photos_for(120)));
    let photos = &model.rovers.photos;
    assert!(photos.is_delivered());
    assert!(photos.urls.len() <= 25);
    let unique: BTreeSet<_> = photos.urls.iter().collect();
    assert_eq!(unique.len(), photos.urls.len());

    let view = app.view(&model);
    assert!(!view.pending);
    assert!(view.content_html.contains("Photos from the Curiosity Rover"));
    assert!(view.content_html.contains("still active on Mars"));
    assert!(view.content_html.contains("695670"));
}

#[test]
fn test_same_seed_gives_same_sample() {
    let run = || {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model::seeded(date("2024-03-10"), 7);
        let mut requests = http_requests(
            app.update(
                Event::SectionSelected {
                    section: Section::Mars,
                    rover: Some(Rover::Curiosity),
                },
                &mut model,
            )
            .effects,
        );
        let photos_at = requests
            .iter()
            .position(|r| url_of(r).contains("/rovers/"))
            .unwrap();
        resolve_and_apply(&app, &mut model, &mut requests[photos_at], json_body(&photos_for(200)));
        model.rovers.photos.urls
    };
    assert_eq!(run(), run());
}

#[test]
fn test_switching_back_to_a_rover_reuses_its_manifest() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::seeded(date("2024-03-10"), 1);

    let mut requests = http_requests(
        app.update(
            Event::SectionSelected {
                section: Section::Mars,
                rover: Some(Rover::Curiosity),
            },
            &mut model,
        )
        .effects,
    );
    let manifest_at = requests
        .iter()
        .position(|r| url_of(r).contains("/manifest/"))
        .unwrap();
    resolve_and_apply(&app, &mut model, &mut requests[manifest_at], json_body(&curiosity_manifest()));
    let first_info = model.rovers.selected_rover_info.clone().unwrap();

    app.update(
        Event::SectionSelected {
            section: Section::Mars,
            rover: Some(Rover::Spirit),
        },
        &mut model,
    );
    let back = http_requests(
        app.update(
            Event::SectionSelected {
                section: Section::Mars,
                rover: Some(Rover::Curiosity),
            },
            &mut model,
        )
        .effects,
    );
    assert!(back.iter().all(|r| !url_of(r).contains("/manifest/")));
    assert_eq!(model.rovers.selected_rover_info, Some(first_info));
}

#[test]
fn test_proxy_error_is_logged_and_section_stays_empty() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::seeded(date("2024-03-10"), 1);

    let mut requests = start(&app, &mut model, CoreConfig::default());
    let failure = HttpResponse::status(502).body("bad gateway").build();
    let follow_up = resolve_and_apply(&app, &mut model, &mut requests[0], failure);

    assert!(follow_up.is_empty());
    assert!(model.in_flight.is_empty());
    assert_eq!(model.epic.date, None);
    assert!(app.view(&model).content_html.is_empty());

    let retry = http_requests(app.update(Event::Repaint, &mut model).effects);
    assert_eq!(retry.len(), 1);
}

#[test]
fn test_malformed_manifest_leaves_mars_pending() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::seeded(date("2024-03-10"), 1);
    let mut requests = http_requests(
        app.update(
            Event::SectionSelected {
                section: Section::Mars,
                rover: Some(Rover::Opportunity),
            },
            &mut model,
        )
        .effects,
    );
    let manifest_at = requests
        .iter()
        .position(|r| url_of(r).contains("/manifest/"))
        .unwrap();
    let follow_up = resolve_and_apply(
        &app,
        &mut model,
        &mut requests[manifest_at],
        json_body(&json!({"errors": "No such rover"})),
    );
    assert!(follow_up.is_empty());
    assert!(model.rovers.selected_rover_info.is_none());
    assert!(model.rovers.manifests.is_empty());
    assert!(app.view(&model).pending);
}

#[test]
fn test_about_page_is_static() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::seeded(date("2024-03-10"), 1);
    let update = app.update(
        Event::SectionSelected {
            section: Section::About,
            rover: None,
        },
        &mut model,
    );
    assert!(http_requests(update.effects).is_empty());
    let view = app.view(&model);
    assert!(view.content_html.contains("About Earth, Mars, and Beyond"));
    assert!(view.navbar_html.contains("menu-item about is-active"));
}
