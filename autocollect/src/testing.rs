//! Scripted stand-ins for the desktop used by unit tests.

use {
    crate::{
        capture::Snapshot,
        geometry::{Point, Region},
        platform::{Pointer, ScreenSource},
    },
    image::{imageops, Rgb, RgbImage},
    std::cell::{Cell, RefCell},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    MoveTo(Point),
    Click(Point),
}

pub struct FakePointer {
    position: Cell<Point>,
    reads: Cell<usize>,
    jumps: RefCell<Vec<(usize, Point)>>,
    actions: RefCell<Vec<PointerAction>>,
}

impl FakePointer {
    pub fn at(position: Point) -> Self {
        Self {
            position: Cell::new(position),
            reads: Cell::new(0),
            jumps: RefCell::new(Vec::new()),
            actions: RefCell::new(Vec::new()),
        }
    }

    /// Moves the pointer to `to` "by hand" right before the `read`-th
    /// position query (counting from 1).
    pub fn jump_before_read(self, read: usize, to: Point) -> Self {
        self.jumps.borrow_mut().push((read, to));
        self
    }

    pub fn actions(&self) -> Vec<PointerAction> {
        self.actions.borrow().clone()
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.actions
            .borrow()
            .iter()
            .filter_map(|action| match action {
                PointerAction::Click(point) => Some(*point),
                PointerAction::MoveTo(_) => None,
            })
            .collect()
    }

    pub fn current(&self) -> Point {
        self.position.get()
    }
}

impl Pointer for FakePointer {
    fn position(&self) -> anyhow::Result<Point> {
        let read = self.reads.get() + 1;
        self.reads.set(read);
        if let Some(&(_, to)) = self.jumps.borrow().iter().find(|(at, _)| *at == read) {
            self.position.set(to);
        }
        Ok(self.position.get())
    }

    fn move_to(&self, point: Point) -> anyhow::Result<()> {
        self.actions.borrow_mut().push(PointerAction::MoveTo(point));
        self.position.set(point);
        Ok(())
    }

    fn click(&self, point: Point) -> anyhow::Result<()> {
        self.actions.borrow_mut().push(PointerAction::Click(point));
        self.position.set(point);
        Ok(())
    }
}

pub struct FakeScreen {
    image: RgbImage,
    grabs: Cell<usize>,
}

impl FakeScreen {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            grabs: Cell::new(0),
        }
    }

    pub fn grabs(&self) -> usize {
        self.grabs.get()
    }
}

impl ScreenSource for FakeScreen {
    fn grab(&self, region: Option<Region>) -> anyhow::Result<Snapshot> {
        self.grabs.set(self.grabs.get() + 1);
        let origin = region.map(|region| region.origin()).unwrap_or_default();
        Ok(Snapshot::new(self.image.clone(), origin))
    }
}

pub fn solid_marker(size: u32) -> RgbImage {
    RgbImage::from_pixel(size, size, Rgb([255, 220, 0]))
}

/// Black scene with `marker` pasted at each top-left position.
pub fn scene(width: u32, height: u32, marker: &RgbImage, positions: &[(i64, i64)]) -> RgbImage {
    let mut scene = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
    for &(x, y) in positions {
        imageops::replace(&mut scene, marker, x, y);
    }
    scene
}
