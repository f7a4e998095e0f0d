//! driftwm: a floating, multi-desktop window manager for X11.
use driftwm::{
    dispatch::handle_queued_changes,
    pure::ClientModel,
    x::{conn::RbConnection, EventAdapter, XConn, XModel},
    Error, WmConfig,
};
use nix::sys::signal::{signal, SigHandler, Signal};
use std::{
    fs::OpenOptions,
    io::Write,
    process::exit,
    sync::atomic::{AtomicBool, Ordering},
    sync::Mutex,
};
use tracing::{error, info, warn};

static DUMP_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn request_dump(_: i32) {
    DUMP_REQUESTED.store(true, Ordering::SeqCst);
}

fn init_logging(config: &WmConfig) {
    let builder = tracing_subscriber::fmt().with_max_level(config.log_level());

    if config.log_file == "syslog" {
        // run under a supervisor that forwards stderr to the system log
        builder.with_writer(std::io::stderr).init();
        return;
    }

    match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
    {
        Ok(file) => builder.with_writer(Mutex::new(file)).init(),
        Err(e) => {
            tracing_subscriber::fmt()
                .with_max_level(config.log_level())
                .with_writer(std::io::stderr)
                .init();
            warn!(%e, path = %config.log_file, "could not open log file, logging to stderr");
        }
    }
}

fn write_dump(config: &WmConfig, model: &ClientModel) {
    info!(path = %config.dump_file, "dumping model state");

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.dump_file);

    let mut file = match file {
        Ok(f) => f,
        Err(e) => {
            error!(%e, path = %config.dump_file, "could not open dump file for writing");
            return;
        }
    };

    let result = writeln!(file, "#BEGIN DUMP")
        .and_then(|_| model.dump(&mut file))
        .and_then(|_| writeln!(file, "#END DUMP"));

    if let Err(e) = result {
        error!(%e, path = %config.dump_file, "could not write dump");
    }
}

fn main() {
    let config = WmConfig::load();
    init_logging(&config);

    // Children must not turn into zombies, and SIGUSR1 requests a state
    // dump after the current batch of events.
    unsafe {
        let _ = signal(Signal::SIGCHLD, SigHandler::SigIgn);
        let _ = signal(Signal::SIGUSR1, SigHandler::Handler(request_dump));
    }

    let conn = match RbConnection::new() {
        Ok(conn) => conn,
        Err(Error::NoRandR) => {
            error!("the display server cannot report monitor layouts (no RandR)");
            exit(1);
        }
        Err(e) => {
            error!(%e, "could not open the display");
            exit(2);
        }
    };

    let monitors = match conn.monitors() {
        Ok(m) if !m.is_empty() => m,
        Ok(_) => {
            error!("the display reports no monitors");
            exit(2);
        }
        Err(e) => {
            error!(%e, "could not query the monitor layout");
            exit(2);
        }
    };

    info!(?monitors, num_desktops = config.num_desktops, "starting");

    let mut model = ClientModel::new(config.num_desktops, monitors);
    let mut xmodel = XModel::default();
    let mut adapter = EventAdapter::new(&config);

    if let Err(e) = adapter.grab_inputs(&conn) {
        error!(%e, "could not install input grabs");
        exit(2);
    }

    if let Err(e) = adapter.adopt_existing(&conn, &mut model) {
        warn!(%e, "could not adopt all existing windows");
    }

    handle_queued_changes(&conn, &config, &mut model, &mut xmodel);
    conn.flush();

    loop {
        match adapter.step(&conn, &mut model, &mut xmodel) {
            Ok(true) => (),
            Ok(false) => break,
            Err(e @ Error::Display(_)) => {
                error!(%e, "lost the connection to the display");
                exit(2);
            }
            Err(e) => warn!(%e, "error handling event"),
        }

        if DUMP_REQUESTED.swap(false, Ordering::SeqCst) {
            write_dump(&config, &model);
        }

        handle_queued_changes(&conn, &config, &mut model, &mut xmodel);
        conn.flush();
    }

    info!("exiting cleanly");
}
