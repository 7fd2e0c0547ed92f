use {
    crate::Context,
    xcap::XCapResult,
};

#[derive(Clone)]
pub struct Window {
    id: u32,
    inner: xcap::Window,
    context: Context,
}

impl Window {
    pub(crate) fn new(context: Context, inner: xcap::Window) -> anyhow::Result<Self> {
        Ok(Self {
            id: inner.id()?,
            inner,
            context,
        })
    }

    /// The window id
    pub fn id(&self) -> u32 {
        self.id
    }
    /// The window app name
    pub fn app_name(&self) -> XCapResult<String> {
        self.inner.app_name()
    }
    /// The window title
    pub fn title(&self) -> XCapResult<String> {
        self.inner.title()
    }
    /// The window x coordinate.
    pub fn x(&self) -> XCapResult<i32> {
        self.inner.x()
    }
    /// The window y coordinate.
    pub fn y(&self) -> XCapResult<i32> {
        self.inner.y()
    }
    /// The window pixel width.
    pub fn width(&self) -> XCapResult<u32> {
        self.inner.width()
    }
    /// The window pixel height.
    pub fn height(&self) -> XCapResult<u32> {
        self.inner.height()
    }
    /// The window is minimized.
    pub fn is_minimized(&self) -> XCapResult<bool> {
        self.inner.is_minimized()
    }

    /// Brings the window to the foreground.
    pub fn activate(&self) -> anyhow::Result<()> {
        self.context.0.imp.activate_window(self)
    }

    pub fn maximize(&self) -> anyhow::Result<()> {
        self.context.0.imp.maximize_window(self)
    }
}
