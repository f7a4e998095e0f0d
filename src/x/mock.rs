//! A recording implementation of XConn for use in tests.
//! This module and its contents are only available when testing.
use crate::{
    pure::geometry::{Point, Rect},
    x::{WindowAttributes, XConn, XEvent},
    Error, Result, Xid,
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

/// A single request issued against the [MockConn].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XCall {
    CreateWindow(Xid),
    DestroyWindow(Xid),
    Map(Xid),
    Unmap(Xid),
    Move(Xid, i32, i32),
    Resize(Xid, u32, u32),
    Raise(Xid),
    SetInputFocus(Xid),
    FocusRoot,
    GrabMouse(Xid),
    UngrabMouse(Xid),
    ConfinePointer(Xid),
    ReleasePointer,
    BorderColor(Xid, u32),
    BorderWidth(Xid, u32),
    CreateGc(Xid),
    FreeGc(Xid),
    DrawIcon(Xid),
    GrabKey(u32, u16),
    GrabButton(u8, u16),
    SendDelete(Xid),
}

/// An in-memory [XConn] that records every request for later assertions.
#[derive(Debug)]
pub struct MockConn {
    calls: RefCell<Vec<XCall>>,
    geometry: RefCell<HashMap<Xid, Rect>>,
    next_id: Cell<u32>,
    monitors: Vec<Rect>,
    /// Requests to focus this window will fail, exercising the dispatcher's
    /// fallback path.
    pub focus_fails_for: Option<Xid>,
}

impl Default for MockConn {
    fn default() -> Self {
        Self::new(vec![Rect::new(0, 0, 1000, 1000)])
    }
}

impl MockConn {
    /// Create a mock reporting the given monitor boxes.
    pub fn new(monitors: Vec<Rect>) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            geometry: RefCell::new(HashMap::new()),
            next_id: Cell::new(0x0100_0000),
            monitors,
            focus_fails_for: None,
        }
    }

    /// All requests issued so far, in order.
    pub fn calls(&self) -> Vec<XCall> {
        self.calls.borrow().clone()
    }

    /// Drop the recorded requests.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Pretend the server knows this geometry for the given window.
    pub fn set_geometry(&self, w: Xid, r: Rect) {
        self.geometry.borrow_mut().insert(w, r);
    }

    fn record(&self, call: XCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl XConn for MockConn {
    fn root(&self) -> Xid {
        Xid(0)
    }

    fn monitors(&self) -> Result<Vec<Rect>> {
        Ok(self.monitors.clone())
    }

    fn cursor_position(&self) -> Result<Point> {
        Ok(Point::new(0, 0))
    }

    fn next_event(&self) -> Result<XEvent> {
        Ok(XEvent::Ignored)
    }

    fn flush(&self) {}

    fn create_window(&self, r: Rect) -> Result<Xid> {
        let id = Xid(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.geometry.borrow_mut().insert(id, r);
        self.record(XCall::CreateWindow(id));

        Ok(id)
    }

    fn destroy_window(&self, w: Xid) -> Result<()> {
        self.record(XCall::DestroyWindow(w));
        Ok(())
    }

    fn map(&self, w: Xid) -> Result<()> {
        self.record(XCall::Map(w));
        Ok(())
    }

    fn unmap(&self, w: Xid) -> Result<()> {
        self.record(XCall::Unmap(w));
        Ok(())
    }

    fn move_window(&self, w: Xid, x: i32, y: i32) -> Result<()> {
        let mut geometry = self.geometry.borrow_mut();
        let r = geometry.entry(w).or_insert_with(|| Rect::new(0, 0, 1, 1));
        r.x = x;
        r.y = y;
        drop(geometry);
        self.record(XCall::Move(w, x, y));

        Ok(())
    }

    fn resize_window(&self, w: Xid, width: u32, height: u32) -> Result<()> {
        let mut geometry = self.geometry.borrow_mut();
        let r = geometry.entry(w).or_insert_with(|| Rect::new(0, 0, 1, 1));
        r.w = width;
        r.h = height;
        drop(geometry);
        self.record(XCall::Resize(w, width, height));

        Ok(())
    }

    fn raise(&self, w: Xid) -> Result<()> {
        self.record(XCall::Raise(w));
        Ok(())
    }

    fn set_input_focus(&self, w: Xid) -> Result<()> {
        if self.focus_fails_for == Some(w) {
            return Err(Error::UnknownClient(w));
        }
        self.record(XCall::SetInputFocus(w));

        Ok(())
    }

    fn focus_root(&self) -> Result<()> {
        self.record(XCall::FocusRoot);
        Ok(())
    }

    fn grab_mouse(&self, w: Xid) -> Result<()> {
        self.record(XCall::GrabMouse(w));
        Ok(())
    }

    fn ungrab_mouse(&self, w: Xid) -> Result<()> {
        self.record(XCall::UngrabMouse(w));
        Ok(())
    }

    fn confine_pointer(&self, w: Xid) -> Result<()> {
        self.record(XCall::ConfinePointer(w));
        Ok(())
    }

    fn release_pointer(&self) -> Result<()> {
        self.record(XCall::ReleasePointer);
        Ok(())
    }

    fn set_border_color(&self, w: Xid, pixel: u32) -> Result<()> {
        self.record(XCall::BorderColor(w, pixel));
        Ok(())
    }

    fn set_border_width(&self, w: Xid, width: u32) -> Result<()> {
        self.record(XCall::BorderWidth(w, width));
        Ok(())
    }

    fn create_gc(&self, w: Xid) -> Result<Xid> {
        self.record(XCall::CreateGc(w));
        Ok(Xid(w.raw() + 0x0200_0000))
    }

    fn free_gc(&self, gc: Xid) -> Result<()> {
        self.record(XCall::FreeGc(gc));
        Ok(())
    }

    fn draw_icon(&self, w: Xid, _gc: Xid, _title: &str) -> Result<()> {
        self.record(XCall::DrawIcon(w));
        Ok(())
    }

    fn get_geometry(&self, w: Xid) -> Result<Rect> {
        Ok(self
            .geometry
            .borrow()
            .get(&w)
            .copied()
            .unwrap_or_else(|| Rect::new(0, 0, 1, 1)))
    }

    fn window_attributes(&self, _w: Xid) -> Result<WindowAttributes> {
        Ok(WindowAttributes {
            override_redirect: false,
            viewable: true,
        })
    }

    fn window_title(&self, _w: Xid) -> Result<String> {
        Ok("mock window".to_owned())
    }

    fn transient_for(&self, _w: Xid) -> Result<Option<Xid>> {
        Ok(None)
    }

    fn existing_windows(&self) -> Result<Vec<Xid>> {
        Ok(vec![])
    }

    fn grab_key(&self, keysym: u32, modifiers: u16) -> Result<()> {
        self.record(XCall::GrabKey(keysym, modifiers));
        Ok(())
    }

    fn grab_button(&self, button: u8, modifiers: u16) -> Result<()> {
        self.record(XCall::GrabButton(button, modifiers));
        Ok(())
    }

    fn send_delete(&self, w: Xid) -> Result<()> {
        self.record(XCall::SendDelete(w));
        Ok(())
    }
}
