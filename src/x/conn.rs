//! Helpers and utilities for using x11rb as the back end.
use crate::{
    pure::geometry::{Point, Rect},
    x::{WindowAttributes, XConn, XEvent},
    Error, Result, Xid,
};
use x11rb::{
    connection::{Connection, RequestConnection},
    protocol::{
        randr::{self, ConnectionExt as _, NotifyMask},
        xproto::{
            AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
            ConfigureWindowAux, ConnectionExt as _, CreateGCAux, CreateWindowAux, EventMask,
            GrabMode, InputFocus, MapState, ModMask, StackMode, WindowClass,
        },
        Event,
    },
    rust_connection::RustConnection,
    COPY_DEPTH_FROM_PARENT, CURRENT_TIME, NONE,
};

// Keyboard modifier state without the pointer button bits.
const MODIFIER_BITS: u16 = 0x00ff;

/// An [XConn] backed by a x11rb [RustConnection].
#[derive(Debug)]
pub struct RbConnection {
    conn: RustConnection,
    root: u32,
    black: u32,
    white: u32,
    wm_protocols: u32,
    wm_delete_window: u32,
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<u32>,
}

impl RbConnection {
    /// Connect to the display named by `$DISPLAY` and take on the window
    /// manager role: select substructure redirection on the root window and
    /// subscribe to monitor changes.
    ///
    /// # Errors
    /// [Error::Display] when the display cannot be opened and
    /// [Error::NoRandR] when the server lacks the RandR extension.
    pub fn new() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;

        let setup = conn.setup();
        let screen = &setup.roots[screen_num];
        let root = screen.root;
        let black = screen.black_pixel;
        let white = screen.white_pixel;
        let (min_keycode, max_keycode) = (setup.min_keycode, setup.max_keycode);

        if conn.extension_information(randr::X11_EXTENSION_NAME)?.is_none() {
            return Err(Error::NoRandR);
        }
        conn.randr_query_version(1, 4)?.reply()?;
        conn.randr_select_input(root, NotifyMask::SCREEN_CHANGE)?;

        let root_mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::POINTER_MOTION;
        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().event_mask(root_mask),
        )?
        .check()?;

        let wm_protocols = conn.intern_atom(false, b"WM_PROTOCOLS")?.reply()?.atom;
        let wm_delete_window = conn.intern_atom(false, b"WM_DELETE_WINDOW")?.reply()?.atom;

        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;

        Ok(Self {
            conn,
            root,
            black,
            white,
            wm_protocols,
            wm_delete_window,
            min_keycode,
            keysyms_per_keycode: mapping.keysyms_per_keycode,
            keysyms: mapping.keysyms,
        })
    }

    fn keysym_for_keycode(&self, code: u8) -> u32 {
        let index = code.saturating_sub(self.min_keycode) as usize * self.keysyms_per_keycode as usize;
        self.keysyms.get(index).copied().unwrap_or(0)
    }

    fn keycode_for_keysym(&self, keysym: u32) -> Option<u8> {
        let per = self.keysyms_per_keycode as usize;
        self.keysyms
            .chunks(per)
            .position(|syms| syms.first() == Some(&keysym))
            .map(|i| self.min_keycode + i as u8)
    }

    // Button presses on the root carry the clicked application window as
    // the child; presses on grabbed client windows report the grab window.
    fn press_target(&self, event_window: u32, child: u32) -> Xid {
        if event_window == self.root && child != NONE {
            Xid(child)
        } else {
            Xid(event_window)
        }
    }
}

fn button_index(button: u8) -> ButtonIndex {
    match button {
        1 => ButtonIndex::M1,
        2 => ButtonIndex::M2,
        3 => ButtonIndex::M3,
        4 => ButtonIndex::M4,
        5 => ButtonIndex::M5,
        _ => ButtonIndex::ANY,
    }
}

impl XConn for RbConnection {
    fn root(&self) -> Xid {
        Xid(self.root)
    }

    fn monitors(&self) -> Result<Vec<Rect>> {
        let reply = self.conn.randr_get_monitors(self.root, true)?.reply()?;

        let rects = reply
            .monitors
            .iter()
            .map(|m| Rect::new(m.x as i32, m.y as i32, m.width as u32, m.height as u32))
            .collect();

        Ok(rects)
    }

    fn cursor_position(&self) -> Result<Point> {
        let reply = self.conn.query_pointer(self.root)?.reply()?;

        Ok(Point::new(reply.root_x as i32, reply.root_y as i32))
    }

    fn next_event(&self) -> Result<XEvent> {
        let event = self.conn.wait_for_event()?;

        let translated = match event {
            Event::KeyPress(e) => XEvent::KeyPress {
                keysym: self.keysym_for_keycode(e.detail),
                modifiers: u16::from(e.state) & MODIFIER_BITS,
            },
            Event::ButtonPress(e) => XEvent::ButtonPress {
                window: self.press_target(e.event, e.child),
                button: e.detail,
                modifiers: u16::from(e.state) & MODIFIER_BITS,
            },
            Event::ButtonRelease(e) => XEvent::ButtonRelease { button: e.detail },
            Event::MotionNotify(e) => XEvent::Motion {
                point: Point::new(e.root_x as i32, e.root_y as i32),
            },
            Event::MapRequest(e) => XEvent::MapRequest {
                window: Xid(e.window),
            },
            Event::MapNotify(e) => XEvent::MapNotify {
                window: Xid(e.window),
            },
            Event::UnmapNotify(e) => XEvent::UnmapNotify {
                window: Xid(e.window),
            },
            Event::DestroyNotify(e) => XEvent::DestroyNotify {
                window: Xid(e.window),
            },
            Event::ConfigureRequest(e) => XEvent::ConfigureRequest {
                window: Xid(e.window),
                rect: Rect::new(e.x as i32, e.y as i32, e.width as u32, e.height as u32),
            },
            Event::Expose(e) => XEvent::Expose {
                window: Xid(e.window),
            },
            Event::RandrScreenChangeNotify(_) | Event::RandrNotify(_) => XEvent::MonitorsChanged,
            _ => XEvent::Ignored,
        };

        Ok(translated)
    }

    fn flush(&self) {
        let _ = self.conn.flush();
    }

    fn create_window(&self, r: Rect) -> Result<Xid> {
        let id = self.conn.generate_id()?;
        let aux = CreateWindowAux::new()
            .override_redirect(1)
            .background_pixel(self.white)
            .event_mask(EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::EXPOSURE);

        self.conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            id,
            self.root,
            r.x as i16,
            r.y as i16,
            r.w as u16,
            r.h as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &aux,
        )?;

        Ok(Xid(id))
    }

    fn destroy_window(&self, w: Xid) -> Result<()> {
        self.conn.destroy_window(w.raw())?;
        Ok(())
    }

    fn map(&self, w: Xid) -> Result<()> {
        self.conn.map_window(w.raw())?;
        Ok(())
    }

    fn unmap(&self, w: Xid) -> Result<()> {
        self.conn.unmap_window(w.raw())?;
        Ok(())
    }

    fn move_window(&self, w: Xid, x: i32, y: i32) -> Result<()> {
        self.conn
            .configure_window(w.raw(), &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn resize_window(&self, w: Xid, width: u32, height: u32) -> Result<()> {
        self.conn
            .configure_window(w.raw(), &ConfigureWindowAux::new().width(width).height(height))?;
        Ok(())
    }

    fn raise(&self, w: Xid) -> Result<()> {
        self.conn
            .configure_window(w.raw(), &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        Ok(())
    }

    fn set_input_focus(&self, w: Xid) -> Result<()> {
        // checked so a refusal surfaces here rather than asynchronously
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, w.raw(), CURRENT_TIME)?
            .check()?;
        Ok(())
    }

    fn focus_root(&self) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, self.root, CURRENT_TIME)?;
        Ok(())
    }

    fn grab_mouse(&self, w: Xid) -> Result<()> {
        self.conn.grab_button(
            false,
            w.raw(),
            EventMask::BUTTON_PRESS,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            NONE,
            NONE,
            ButtonIndex::ANY,
            ModMask::ANY,
        )?;
        Ok(())
    }

    fn ungrab_mouse(&self, w: Xid) -> Result<()> {
        self.conn.ungrab_button(ButtonIndex::ANY, w.raw(), ModMask::ANY)?;
        Ok(())
    }

    fn confine_pointer(&self, w: Xid) -> Result<()> {
        self.conn
            .grab_pointer(
                false,
                w.raw(),
                EventMask::POINTER_MOTION | EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                w.raw(),
                NONE,
                CURRENT_TIME,
            )?
            .reply()?;
        Ok(())
    }

    fn release_pointer(&self) -> Result<()> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        Ok(())
    }

    fn set_border_color(&self, w: Xid, pixel: u32) -> Result<()> {
        self.conn
            .change_window_attributes(w.raw(), &ChangeWindowAttributesAux::new().border_pixel(pixel))?;
        Ok(())
    }

    fn set_border_width(&self, w: Xid, width: u32) -> Result<()> {
        self.conn
            .configure_window(w.raw(), &ConfigureWindowAux::new().border_width(width))?;
        Ok(())
    }

    fn create_gc(&self, w: Xid) -> Result<Xid> {
        let id = self.conn.generate_id()?;
        let aux = CreateGCAux::new().foreground(self.black).background(self.white);
        self.conn.create_gc(id, w.raw(), &aux)?;

        Ok(Xid(id))
    }

    fn free_gc(&self, gc: Xid) -> Result<()> {
        self.conn.free_gc(gc.raw())?;
        Ok(())
    }

    fn draw_icon(&self, w: Xid, gc: Xid, title: &str) -> Result<()> {
        self.conn.clear_area(false, w.raw(), 0, 0, 0, 0)?;
        self.conn.image_text8(w.raw(), gc.raw(), 2, 14, title.as_bytes())?;
        Ok(())
    }

    fn get_geometry(&self, w: Xid) -> Result<Rect> {
        let reply = self.conn.get_geometry(w.raw())?.reply()?;

        Ok(Rect::new(
            reply.x as i32,
            reply.y as i32,
            reply.width as u32,
            reply.height as u32,
        ))
    }

    fn window_attributes(&self, w: Xid) -> Result<WindowAttributes> {
        let reply = self.conn.get_window_attributes(w.raw())?.reply()?;

        Ok(WindowAttributes {
            override_redirect: reply.override_redirect,
            viewable: reply.map_state == MapState::VIEWABLE,
        })
    }

    fn window_title(&self, w: Xid) -> Result<String> {
        let reply = self
            .conn
            .get_property(false, w.raw(), AtomEnum::WM_NAME, AtomEnum::STRING, 0, 1024)?
            .reply()?;

        Ok(String::from_utf8_lossy(&reply.value).into_owned())
    }

    fn transient_for(&self, w: Xid) -> Result<Option<Xid>> {
        let reply = self
            .conn
            .get_property(
                false,
                w.raw(),
                AtomEnum::WM_TRANSIENT_FOR,
                AtomEnum::WINDOW,
                0,
                1,
            )?
            .reply()?;

        let parent = reply
            .value32()
            .and_then(|mut it| it.next())
            .filter(|&id| id != NONE)
            .map(Xid);

        Ok(parent)
    }

    fn existing_windows(&self) -> Result<Vec<Xid>> {
        let reply = self.conn.query_tree(self.root)?.reply()?;

        Ok(reply.children.into_iter().map(Xid).collect())
    }

    fn grab_key(&self, keysym: u32, modifiers: u16) -> Result<()> {
        let code = match self.keycode_for_keysym(keysym) {
            Some(code) => code,
            None => {
                tracing::warn!(keysym, "no keycode maps to keysym, skipping grab");
                return Ok(());
            }
        };

        self.conn.grab_key(
            false,
            self.root,
            ModMask::from(modifiers),
            code,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;

        Ok(())
    }

    fn grab_button(&self, button: u8, modifiers: u16) -> Result<()> {
        self.conn.grab_button(
            false,
            self.root,
            EventMask::BUTTON_PRESS,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            NONE,
            NONE,
            button_index(button),
            ModMask::from(modifiers),
        )?;

        Ok(())
    }

    fn send_delete(&self, w: Xid) -> Result<()> {
        let data = [self.wm_delete_window, CURRENT_TIME, 0, 0, 0];
        let event = ClientMessageEvent::new(32, w.raw(), self.wm_protocols, data);
        self.conn
            .send_event(false, w.raw(), EventMask::NO_EVENT, event)?;

        Ok(())
    }
}
