/// Edge-based axis aligned rectangle : (left, top, right, bottom)
/// - origin is top left, y grows downward (canvas space)
/// - a rect is empty when `left >= right || top >= bottom`, degenerate rects
///   are allowed while they are being edited
///
/// Methods that take "another rect" accept anything `Into<Rect>` so callers
/// can pass a `Rect`, a `[l, t, r, b]` array or an `(l, t, r, b)` tuple.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl From<[f32; 4]> for Rect {
    fn from([left, top, right, bottom]: [f32; 4]) -> Self {
        Rect::new(left, top, right, bottom)
    }
}

impl From<(f32, f32, f32, f32)> for Rect {
    fn from((left, top, right, bottom): (f32, f32, f32, f32)) -> Self {
        Rect::new(left, top, right, bottom)
    }
}

impl From<&Rect> for Rect {
    fn from(rect: &Rect) -> Self {
        *rect
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect::new(x, y, x + width, y + height)
    }

    pub fn set(&mut self, other: impl Into<Rect>) {
        *self = other.into();
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) * 0.5
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) * 0.5
    }

    pub fn offset(&mut self, dx: f32, dy: f32) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }

    /// Move the origin to (x, y), keeping width and height
    pub fn offset_to(&mut self, x: f32, y: f32) {
        self.right += x - self.left;
        self.bottom += y - self.top;
        self.left = x;
        self.top = y;
    }

    /// Shrink each edge by the matching field of `insets`
    /// - left/top move inward by `insets.left`/`insets.top`
    /// - right/bottom move inward by `insets.right`/`insets.bottom`
    pub fn inset(&mut self, insets: impl Into<Rect>) {
        let insets = insets.into();
        self.left += insets.left;
        self.top += insets.top;
        self.right -= insets.right;
        self.bottom -= insets.bottom;
    }

    /// Same inset on both horizontal edges and both vertical edges
    pub fn inset_xy(&mut self, dx: f32, dy: f32) {
        self.inset([dx, dy, dx, dy]);
    }

    /// Copy of this rect shrunk by `insets`
    pub fn inset_by(&self, insets: impl Into<Rect>) -> Rect {
        let mut rect = *self;
        rect.inset(insets);
        rect
    }

    pub fn equals(&self, other: impl Into<Rect>) -> bool {
        *self == other.into()
    }

    /// True when `other` lies inside this rect or is equal to it
    pub fn contains(&self, other: impl Into<Rect>) -> bool {
        let other = other.into();
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.contains([x, y, x, y])
    }

    /// Strict overlap test : touching edges do not intersect
    pub fn intersects(&self, other: impl Into<Rect>) -> bool {
        let other = other.into();
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Clip this rect to `other`
    /// - returns false and leaves self untouched when they do not overlap
    pub fn set_intersect(&mut self, other: impl Into<Rect>) -> bool {
        let other = other.into();
        if !self.intersects(other) {
            return false;
        }
        self.left = self.left.max(other.left);
        self.top = self.top.max(other.top);
        self.right = self.right.min(other.right);
        self.bottom = self.bottom.min(other.bottom);
        true
    }

    /// Grow this rect to enclose `other`
    pub fn union(&mut self, other: impl Into<Rect>) {
        let other = other.into();
        self.left = self.left.min(other.left);
        self.top = self.top.min(other.top);
        self.right = self.right.max(other.right);
        self.bottom = self.bottom.max(other.bottom);
    }

    /// Union with the degenerate rect (x, y, x, y)
    pub fn union_point(&mut self, x: f32, y: f32) {
        self.union([x, y, x, y]);
    }

    pub fn scale(&mut self, factor: f32) {
        if factor != 1.0 {
            self.left *= factor;
            self.top *= factor;
            self.right *= factor;
            self.bottom *= factor;
        }
    }

    /// Swap flipped edges so that left <= right and top <= bottom
    pub fn sort(&mut self) {
        if self.left > self.right {
            std::mem::swap(&mut self.left, &mut self.right);
        }
        if self.top > self.bottom {
            std::mem::swap(&mut self.top, &mut self.bottom);
        }
    }

    /// Union of every rect in `rects`, starting from the empty rect at origin
    pub fn union_of<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Rect {
        rects.into_iter().fold(Rect::default(), |mut acc, rect| {
            acc.union(rect);
            acc
        })
    }

    /// Overlap of `a` and `b`, or the empty rect when they are disjoint
    pub fn intersection(a: &Rect, b: &Rect) -> Rect {
        let mut rect = *a;
        if rect.set_intersect(b) {
            rect
        } else {
            Rect::default()
        }
    }
}
