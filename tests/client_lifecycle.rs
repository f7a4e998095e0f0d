//! End to end checks of the public model API over a realistic session:
//! several clients spread over desktops and monitors, minimized, dragged,
//! stuck and destroyed, with the change stream checked at each step.
use driftwm::{
    pure::{
        model::{InitialVisibility, DEF_LAYER},
        Change, ClientModel, Corner, Desktop, Direction, Point, Rect,
    },
    Xid,
};

fn xid(n: u32) -> Xid {
    Xid::from(n)
}

fn two_monitor_model() -> ClientModel {
    ClientModel::new(
        4,
        vec![Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1920, 1080)],
    )
}

fn add_visible(model: &mut ClientModel, w: Xid, location: Point, size: (u32, u32)) {
    model.add_client(w, InitialVisibility::Visible, location, size, true);
}

#[test]
fn a_session_worth_of_mutations_keeps_the_model_consistent() {
    let mut model = two_monitor_model();
    let (term, browser, dialog) = (xid(10), xid(20), xid(21));

    add_visible(&mut model, term, Point::new(100, 100), (800, 600));
    add_visible(&mut model, browser, Point::new(50, 50), (1200, 900));
    model.add_child(browser, dialog);

    // the dialog took focus from its autofocus parent
    assert_eq!(model.get_focused(), Some(dialog));
    assert_eq!(model.get_parent_of(dialog), Some(browser));
    model.flush_changes();

    // browser family moves off to desktop 1, dropping focus on the way
    model.client_next_desktop(browser);
    assert_eq!(
        model.drain_changes(),
        vec![
            Change::Focus {
                prev: Some(dialog),
                next: None
            },
            Change::ClientDesktop {
                window: browser,
                prev: Some(Desktop::User(0)),
                next: Desktop::User(1)
            },
        ]
    );
    assert!(!model.is_visible(browser));
    assert!(!model.is_visible(dialog));

    // following it restores nothing (focus memory was for desktop 0) but
    // the family becomes focusable again
    model.next_desktop();
    model.flush_changes();
    model.focus(dialog);
    assert_eq!(model.get_focused(), Some(dialog));

    // drag the browser around on its new desktop
    model.start_moving(browser);
    model.stop_moving(browser, Point::new(2000, 80));
    assert_eq!(model.get_location(browser), Some(Point::new(2000, 80)));

    // the drop crossed onto the second monitor
    assert_eq!(
        model.get_screen(browser),
        Some(Rect::new(1920, 0, 1920, 1080))
    );

    // and can be pushed back to the first monitor explicitly
    model.send_to_relative_screen(browser, Direction::Left);
    assert_eq!(model.get_screen(browser), Some(Rect::new(0, 0, 1920, 1080)));

    // terminal is still back on desktop 0, untouched
    assert_eq!(model.find_desktop(term), Some(Desktop::User(0)));
    assert_eq!(model.find_layer(term), Some(DEF_LAYER));
}

#[test]
fn sticky_round_trip_survives_desktop_traffic_and_iconification() {
    let mut model = two_monitor_model();
    let term = xid(10);
    add_visible(&mut model, term, Point::new(0, 0), (400, 300));

    model.toggle_stick(term);
    model.next_desktop();
    model.next_desktop();
    assert!(model.is_visible(term));

    model.iconify(term);
    model.prev_desktop();
    model.deiconify(term);

    // sticky is retained across the icon round trip
    assert_eq!(model.find_desktop(term), Some(Desktop::AllDesktops));
    assert!(model.is_visible(term));
    assert_eq!(model.get_focused(), Some(term));
}

#[test]
fn destroying_a_parent_cleans_up_the_whole_family() {
    let mut model = two_monitor_model();
    let (browser, dialog) = (xid(20), xid(21));
    add_visible(&mut model, browser, Point::new(0, 0), (400, 300));
    model.add_child(browser, dialog);
    model.flush_changes();

    model.remove_client(browser);

    assert_eq!(
        model.drain_changes(),
        vec![
            Change::Focus {
                prev: Some(dialog),
                next: None
            },
            Change::ChildRemove {
                parent: browser,
                child: dialog
            },
            Change::Destroy {
                window: browser,
                last_desktop: Desktop::User(0),
                last_layer: DEF_LAYER
            },
        ]
    );
    assert!(!model.is_client(browser));
    assert!(!model.is_child(dialog));
    assert_eq!(model.get_focused(), None);
}

#[test]
fn packed_clients_reflow_deterministically_after_removal() {
    let mut model = two_monitor_model();
    for (i, w) in [xid(1), xid(2), xid(3)].into_iter().enumerate() {
        model.add_client(
            w,
            InitialVisibility::Visible,
            Point::new(5, 5),
            (100, 50),
            false,
        );
        model.pack_client(w, Corner::NorthWest, i as u64);
    }
    model.repack_corner(Corner::NorthWest);
    model.flush_changes();

    // dropping the middle client shifts the later one left on repack
    model.remove_client(xid(2));
    model.flush_changes();
    model.repack_corner(Corner::NorthWest);

    assert_eq!(
        model.drain_changes(),
        vec![Change::Location {
            window: xid(3),
            x: 100,
            y: 0
        }]
    );
}

#[test]
fn the_dump_is_screens_then_clients() {
    let mut model = two_monitor_model();
    let term = xid(10);
    add_visible(&mut model, term, Point::new(30, 40), (640, 480));
    model.next_desktop();

    let mut out = Vec::new();
    model.dump(&mut out).unwrap();
    let dump = String::from_utf8(out).unwrap();

    let lines: Vec<&str> = dump.lines().collect();
    assert_eq!(
        lines,
        vec![
            "box 0 0 1920 1080",
            "box 1920 0 1920 1080",
            "client 10 user(0) 5 30 40 640 480 floating",
        ]
    );
}
