use crate::image::ImageView;

/// Periodic channel arrangement of a multi-tap sensor.
///
/// `channel_count` channels are laid out on a `stride × stride` lattice, so
/// channel `(y_off, x_off)` owns every pixel with `y % stride == y_off` and
/// `x % stride == x_off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    stride: usize,
}

impl ChannelLayout {
    /// Returns `None` unless `channel_count` is a non-zero perfect square.
    pub fn from_count(channel_count: usize) -> Option<Self> {
        if channel_count == 0 {
            return None;
        }
        let stride = channel_count.isqrt();
        (stride * stride == channel_count).then_some(Self { stride })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn channel_count(&self) -> usize {
        self.stride * self.stride
    }

    /// Channel offsets in id order (row-major over the lattice).
    pub fn offsets(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let s = self.stride;
        (0..s).flat_map(move |y| (0..s).map(move |x| (y, x)))
    }
}

/// Strided view of one channel. Borrows the parent image; no pixels are copied.
#[derive(Debug, Clone, Copy)]
pub struct Channel<'a, T> {
    src: ImageView<'a, T>,
    id: usize,
    stride: usize,
    y_off: usize,
    x_off: usize,
    width: usize,
    height: usize,
}

impl<'a, T: Copy> Channel<'a, T> {
    pub fn new(src: ImageView<'a, T>, layout: ChannelLayout, y_off: usize, x_off: usize) -> Self {
        let stride = layout.stride();
        assert!(y_off < stride && x_off < stride, "channel offset outside lattice");
        Self {
            src,
            id: y_off * stride + x_off,
            stride,
            y_off,
            x_off,
            width: decimated_len(src.width(), x_off, stride),
            height: decimated_len(src.height(), y_off, stride),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn y_off(&self) -> usize {
        self.y_off
    }

    pub fn x_off(&self) -> usize {
        self.x_off
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Full-image row index of local row `y`.
    pub fn global_row(&self, y: usize) -> usize {
        y * self.stride + self.y_off
    }

    /// Full-image column index of local column `x`.
    pub fn global_col(&self, x: usize) -> usize {
        x * self.stride + self.x_off
    }

    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.src
            .get(self.global_col(x), self.global_row(y))
            .copied()
    }

    /// Samples of local row `y`.
    pub fn row(&self, y: usize) -> impl Iterator<Item = T> + 'a {
        assert!(y < self.height, "row index out of bounds");
        let line = self.src.row(self.global_row(y));
        line.get(self.x_off..)
            .unwrap_or(&[])
            .iter()
            .step_by(self.stride)
            .copied()
    }

    /// Samples of local column `x`.
    pub fn col(&self, x: usize) -> impl Iterator<Item = T> + 'a {
        assert!(x < self.width, "column index out of bounds");
        let src = self.src;
        let gx = self.global_col(x);
        let (stride, y_off) = (self.stride, self.y_off);
        (0..self.height).map(move |y| src.row(y * stride + y_off)[gx])
    }
}

fn decimated_len(len: usize, offset: usize, stride: usize) -> usize {
    if offset >= len {
        0
    } else {
        (len - offset).div_ceil(stride)
    }
}

/// Splits an image into its `layout.channel_count()` channels in id order.
pub fn decompose<'a, T: Copy>(
    img: &ImageView<'a, T>,
    layout: ChannelLayout,
) -> Vec<Channel<'a, T>> {
    layout
        .offsets()
        .map(|(y_off, x_off)| Channel::new(*img, layout, y_off, x_off))
        .collect()
}
