mod common;

use common::{loaded, now, point, trip, Fixture};
use trip_shared::{Event, FilterType, HeadlessSurface, HeaderPresenter, PointId};

fn header(fixture: &Fixture) -> HeaderPresenter<HeadlessSurface> {
    HeaderPresenter::new(HeadlessSurface::new(), fixture.models.clone()).with_clock(now)
}

fn counts(header: &HeaderPresenter<HeadlessSurface>) -> Vec<(FilterType, usize, bool, bool)> {
    header
        .surface()
        .filter_bar()
        .unwrap()
        .items
        .iter()
        .map(|item| (item.filter, item.count, item.checked, item.disabled))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn filter_bar_counts_and_disables() {
    let fixture = Fixture::new(trip());
    let mut header = header(&fixture);
    header.init();
    fixture.models.load().await;
    header.process_changes();

    assert_eq!(
        counts(&header),
        vec![
            (FilterType::Everything, 2, true, false),
            (FilterType::Future, 1, false, false),
            (FilterType::Present, 0, false, true),
            (FilterType::Past, 1, false, false),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn trip_info_summarises_the_route() {
    let mut points = trip();
    points[0].offers = vec![trip_shared::OfferId::new("o-1")];
    let fixture = Fixture::new(points);
    let mut header = header(&fixture);
    header.init();
    assert!(header.surface().trip_info().is_none());

    fixture.models.load().await;
    header.process_changes();

    let info = header.surface().trip_info().unwrap();
    assert_eq!(info.title, "Amsterdam — Geneva");
    assert_eq!(info.dates, "MAR 19 — MAR 21");
    assert_eq!(info.total_cost, 100 + 20 + 50);
}

#[tokio::test(start_paused = true)]
async fn header_follows_list_actions() {
    let (fixture, mut list) = loaded(trip()).await;
    let mut header = header(&fixture);
    header.init();

    list.handle(Event::FilterChanged { filter: FilterType::Past }).await;
    header.process_changes();
    let checked: Vec<_> = counts(&header)
        .into_iter()
        .filter(|(_, _, checked, _)| *checked)
        .map(|(filter, ..)| filter)
        .collect();
    assert_eq!(checked, vec![FilterType::Past]);

    list.handle(Event::FilterChanged { filter: FilterType::Everything }).await;
    list.handle(Event::OpenEdit { id: PointId::new("b") }).await;
    list.handle(Event::DeletePoint { id: PointId::new("b") }).await;
    header.process_changes();

    assert_eq!(counts(&header)[0].1, 1);
    assert_eq!(header.surface().trip_info().unwrap().title, "Amsterdam");
}

#[tokio::test(start_paused = true)]
async fn emptied_trip_drops_the_summary() {
    let (fixture, mut list) = loaded(vec![point("solo", 1, 1, 10, "d-1")]).await;
    let mut header = header(&fixture);
    header.init();
    assert!(header.surface().trip_info().is_some());

    list.handle(Event::OpenEdit { id: PointId::new("solo") }).await;
    list.handle(Event::DeletePoint { id: PointId::new("solo") }).await;
    header.process_changes();

    assert!(header.surface().trip_info().is_none());
    assert!(counts(&header).iter().all(|(_, count, _, disabled)| *count == 0 && *disabled));
}
